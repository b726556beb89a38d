//! Device-backed audio resource.
//!
//! `DeviceAudio` plays one bound file at a time. Decoding runs on its own
//! thread; the cpal stream stays on the thread that owns the session.
//! When a file plays out the decode thread posts `Event::TrackEnded` to the
//! session queue.

use std::path::{ Path, PathBuf };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rubato::{ FastFixedOut, PolynomialDegree, Resampler };
use tokio::sync::mpsc::UnboundedSender;

use crate::decoder::{ Decoder, DecoderError };
use crate::output::{ AudioOutput, SampleBuffer };
use crate::playback::{ AudioResource, PlaybackError };
use crate::session::Event;


/// Source of interleaved sample packets for the decode thread.
trait PacketSource: Send + 'static {
    fn sample_rate( &self ) -> u32;
    fn channels( &self ) -> usize;
    fn next_packet( &mut self ) -> Result<Option<Vec<f32>>, DecoderError>;
}


impl PacketSource for Decoder {
    fn sample_rate( &self ) -> u32 {
        Decoder::sample_rate( self )
    }


    fn channels( &self ) -> usize {
        Decoder::channels( self )
    }


    fn next_packet( &mut self ) -> Result<Option<Vec<f32>>, DecoderError> {
        self.decode_next()
    }
}


/// Live stream for the bound source.
struct PlaybackHandle {
    stop_flag: Arc<AtomicBool>,
    sample_buffer: Arc<SampleBuffer>,
    // Dropping the output stops the cpal stream.
    output: AudioOutput,
    thread: Option<thread::JoinHandle<()>>,
}


impl PlaybackHandle {
    fn is_finished( &self ) -> bool {
        self.thread.as_ref().map_or( true, thread::JoinHandle::is_finished )
    }


    fn stop( mut self ) {
        self.stop_flag.store( true, Ordering::Relaxed );
        self.sample_buffer.clear();
        if let Some( thread ) = self.thread.take() {
            let _ = thread.join();
        }
    }
}


/// Audio resource playing files on the default output device.
pub struct DeviceAudio {
    events: UnboundedSender<Event>,
    source: Option<String>,
    playback: Option<PlaybackHandle>,
}


impl DeviceAudio {
    /// Creates an unbound resource reporting end of track on `events`.
    pub fn new( events: UnboundedSender<Event> ) -> Self {
        Self {
            events,
            source: None,
            playback: None,
        }
    }


    fn open_stream( &self, source: &str ) -> Result<PlaybackHandle, PlaybackError> {
        let unavailable = |e: &dyn std::fmt::Display| PlaybackError::Unavailable( e.to_string() );

        let decoder = Decoder::open( Path::new( source ) ).map_err( |e| unavailable( &e ) )?;
        let source_rate = decoder.sample_rate();
        let channels = decoder.channels();

        let ( output, sample_buffer ) = AudioOutput::new( source_rate, channels )
            .map_err( |e| unavailable( &e ) )?;

        let resampler = if output.sample_rate() != source_rate {
            let resampler = FastFixedOut::<f32>::new(
                output.sample_rate() as f64 / source_rate as f64,
                2.0,
                PolynomialDegree::Cubic,
                1024,
                channels,
            ).map_err( |e| unavailable( &e ) )?;
            Some( resampler )
        } else {
            None
        };

        output.play().map_err( |e| unavailable( &e ) )?;

        let stop_flag = Arc::new( AtomicBool::new( false ) );
        let worker = DecodeWorker {
            decoder,
            resampler,
            sample_buffer: Arc::clone( &sample_buffer ),
            stop_flag: Arc::clone( &stop_flag ),
            events: self.events.clone(),
            source: source.to_string(),
        };
        let thread = thread::spawn( move || worker.run() );

        Ok( PlaybackHandle {
            stop_flag,
            sample_buffer,
            output,
            thread: Some( thread ),
        })
    }
}


impl AudioResource for DeviceAudio {
    fn bind( &mut self, source: &str ) {
        if let Some( handle ) = self.playback.take() {
            handle.stop();
        }
        self.source = Some( source.to_string() );
    }


    fn start( &mut self ) -> Result<(), PlaybackError> {
        // A finished decode thread means the track played out; start over.
        if self.playback.as_ref().is_some_and( PlaybackHandle::is_finished ) {
            if let Some( handle ) = self.playback.take() {
                handle.stop();
            }
        }

        if let Some( handle ) = &self.playback {
            handle.sample_buffer.set_paused( false );
            return handle.output.play().map_err( |e| PlaybackError::Unavailable( e.to_string() ) );
        }

        let source = self.source.clone()
            .ok_or_else( || PlaybackError::Unavailable( "no source bound".into() ) )?;
        self.playback = Some( self.open_stream( &source )? );
        Ok(())
    }


    fn pause( &mut self ) {
        if let Some( handle ) = &self.playback {
            handle.sample_buffer.set_paused( true );
            if let Err( e ) = handle.output.pause() {
                tracing::warn!( "{}", e );
            }
        }
    }
}


impl Drop for DeviceAudio {
    fn drop( &mut self ) {
        if let Some( handle ) = self.playback.take() {
            handle.stop();
        }
    }
}


/// State moved onto the decode thread.
struct DecodeWorker<S: PacketSource> {
    decoder: S,
    resampler: Option<FastFixedOut<f32>>,
    sample_buffer: Arc<SampleBuffer>,
    stop_flag: Arc<AtomicBool>,
    events: UnboundedSender<Event>,
    source: String,
}


impl<S: PacketSource> DecodeWorker<S> {
    fn stopped( &self ) -> bool {
        self.stop_flag.load( Ordering::Relaxed )
    }


    fn run( mut self ) {
        let channels = self.decoder.channels();
        let mut pending: Vec<Vec<f32>> = vec![ Vec::new(); channels ];
        // Keep about 100ms queued ahead of the device.
        let target = self.decoder.sample_rate() as usize * channels / 10;

        while !self.stopped() {
            if self.sample_buffer.is_paused() || self.sample_buffer.len() > target {
                thread::sleep( Duration::from_millis( 10 ) );
                continue;
            }

            match self.decoder.next_packet() {
                Ok( Some( samples ) ) => {
                    let samples = self.resample( samples, &mut pending, channels );
                    self.push_all( &samples );
                }
                Ok( None ) => {
                    self.finish();
                    return;
                }
                Err( e ) => {
                    // The session must not keep showing a dead track as playing.
                    tracing::error!( "Decode error in {}: {}", self.source, e );
                    self.sample_buffer.clear();
                    self.report_end();
                    return;
                }
            }
        }

        tracing::debug!( "Decode thread for {} stopped", self.source );
    }


    /// Passes samples through the resampler if there is one.
    fn resample( &mut self, samples: Vec<f32>, pending: &mut [Vec<f32>], channels: usize ) -> Vec<f32> {
        let Some( resampler ) = self.resampler.as_mut() else {
            return samples;
        };

        for frame in samples.chunks( channels ) {
            for ( ch, sample ) in frame.iter().enumerate() {
                pending[ ch ].push( *sample );
            }
        }

        let mut out = Vec::new();
        while pending[ 0 ].len() >= resampler.input_frames_next() {
            let needed = resampler.input_frames_next();
            let chunk: Vec<Vec<f32>> = pending.iter_mut().map( |ch| ch.drain( ..needed ).collect() ).collect();
            match resampler.process( &chunk, None ) {
                Ok( planar ) => out.extend( interleave( &planar ) ),
                Err( e ) => {
                    tracing::error!( "Resample error: {}", e );
                    break;
                }
            }
        }
        out
    }


    fn push_all( &self, samples: &[f32] ) {
        let mut offset = 0;
        while offset < samples.len() && !self.stopped() {
            let pushed = self.sample_buffer.push( &samples[ offset.. ] );
            offset += pushed;
            if pushed == 0 {
                thread::sleep( Duration::from_millis( 5 ) );
            }
        }
    }


    /// Waits for the device to drain, then reports the end of the track.
    fn finish( &self ) {
        while !self.sample_buffer.is_empty() && !self.stopped() {
            thread::sleep( Duration::from_millis( 10 ) );
        }
        self.report_end();
    }


    /// Posts `TrackEnded` unless the stream was stopped from outside.
    fn report_end( &self ) {
        if !self.stopped() {
            tracing::info!( "Reached end of {}", self.source );
            let _ = self.events.send( Event::TrackEnded { source: self.source.clone() } );
        }
    }
}


/// [[L0, L1, ...], [R0, R1, ...]] → [L0, R0, L1, R1, ...]
fn interleave( channels: &[Vec<f32>] ) -> Vec<f32> {
    let frames = channels.first().map_or( 0, Vec::len );
    let mut out = Vec::with_capacity( frames * channels.len() );
    for frame in 0..frames {
        out.extend( channels.iter().map( |ch| ch[ frame ] ) );
    }
    out
}


/// Resolves a configured track source to a path, relative to `base`.
pub fn resolve_source( base: &Path, source: &str ) -> PathBuf {
    let path = Path::new( source );
    if path.is_absolute() { path.to_path_buf() } else { base.join( path ) }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_interleave() {
        let planar = vec![ vec![ 1.0, 2.0 ], vec![ 3.0, 4.0 ] ];
        assert_eq!( interleave( &planar ), [ 1.0, 3.0, 2.0, 4.0 ] );
        assert!( interleave( &[] ).is_empty() );
    }


    #[test]
    fn test_resolve_source() {
        let base = Path::new( "/music" );
        assert_eq!( resolve_source( base, "lofi.mp3" ), PathBuf::from( "/music/lofi.mp3" ) );
        assert_eq!( resolve_source( base, "/tmp/a.ogg" ), PathBuf::from( "/tmp/a.ogg" ) );
    }


    /// Yields `packets` short packets, then fails.
    struct FailingSource {
        packets: usize,
    }


    impl PacketSource for FailingSource {
        fn sample_rate( &self ) -> u32 {
            44_100
        }


        fn channels( &self ) -> usize {
            2
        }


        fn next_packet( &mut self ) -> Result<Option<Vec<f32>>, DecoderError> {
            if self.packets == 0 {
                return Err( DecoderError::Decode( "corrupt frame".into() ) );
            }
            self.packets -= 1;
            Ok( Some( vec![ 0.1; 4 ] ) )
        }
    }


    fn worker( stopped: bool ) -> ( DecodeWorker<FailingSource>, tokio::sync::mpsc::UnboundedReceiver<Event> ) {
        let ( tx, rx ) = tokio::sync::mpsc::unbounded_channel();
        let worker = DecodeWorker {
            decoder: FailingSource { packets: 1 },
            resampler: None,
            sample_buffer: Arc::new( SampleBuffer::new( 1024, 2, 2 ) ),
            stop_flag: Arc::new( AtomicBool::new( stopped ) ),
            events: tx,
            source: "broken.mp3".to_string(),
        };
        ( worker, rx )
    }


    #[test]
    fn test_decode_failure_reports_end() {
        let ( worker, mut rx ) = worker( false );
        let buffer = Arc::clone( &worker.sample_buffer );
        worker.run();

        assert_eq!( rx.try_recv().ok(), Some( Event::TrackEnded { source: "broken.mp3".to_string() } ) );
        assert!( buffer.is_empty() );
    }


    #[test]
    fn test_stopped_worker_stays_quiet() {
        let ( worker, mut rx ) = worker( true );
        worker.run();
        assert!( rx.try_recv().is_err() );
    }


    #[test]
    fn test_missing_file_is_unavailable() {
        let ( tx, _rx ) = tokio::sync::mpsc::unbounded_channel();
        let mut audio = DeviceAudio::new( tx );
        audio.bind( "/definitely/not/here.mp3" );
        assert!( matches!( audio.start(), Err( PlaybackError::Unavailable( _ ) ) ) );
    }
}
