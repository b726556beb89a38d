//! Audio output via cpal
//!
//! Sends decoded PCM samples to the default output device.

use std::collections::VecDeque;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex, PoisonError };

use cpal::traits::{ DeviceTrait, HostTrait, StreamTrait };
use thiserror::Error;


/// Errors that can occur with audio output.
#[derive( Debug, Error )]
pub enum OutputError {
    #[error( "No output device available" )]
    NoDevice,

    #[error( "Failed to get stream config: {0}" )]
    StreamConfig( String ),

    #[error( "Failed to build output stream: {0}" )]
    BuildStream( String ),

    #[error( "Failed to play stream: {0}" )]
    PlayStream( String ),
}


/// Sample queue shared by the decode thread and the device callback.
///
/// Samples are stored in the source channel layout and remapped to the
/// device layout on the way out.
pub struct SampleBuffer {
    buffer: Mutex<VecDeque<f32>>,
    capacity: usize,
    paused: AtomicBool,
    source_channels: usize,
    output_channels: usize,
}


impl SampleBuffer {
    pub fn new( capacity: usize, source_channels: usize, output_channels: usize ) -> Self {
        Self {
            buffer: Mutex::new( VecDeque::with_capacity( capacity ) ),
            capacity,
            paused: AtomicBool::new( false ),
            source_channels: source_channels.max( 1 ),
            output_channels: output_channels.max( 1 ),
        }
    }


    fn queue( &self ) -> std::sync::MutexGuard<'_, VecDeque<f32>> {
        self.buffer.lock().unwrap_or_else( PoisonError::into_inner )
    }


    /// Pushes samples; returns how many fit.
    pub fn push( &self, samples: &[f32] ) -> usize {
        let mut buf = self.queue();
        let to_push = samples.len().min( self.capacity.saturating_sub( buf.len() ) );
        buf.extend( &samples[ ..to_push ] );
        to_push
    }


    /// Fills `output` with whole frames, padding with silence.
    pub fn pop( &self, output: &mut [f32] ) {
        output.fill( 0.0 );
        if self.paused.load( Ordering::Relaxed ) {
            return;
        }

        let src = self.source_channels;
        let out = self.output_channels;
        let mut buf = self.queue();
        let frames = ( output.len() / out ).min( buf.len() / src );

        let mut frame = vec![ 0.0; src ];
        for index in 0..frames {
            for sample in frame.iter_mut() {
                *sample = buf.pop_front().unwrap_or( 0.0 );
            }

            let target = &mut output[ index * out..( index + 1 ) * out ];
            if src == 2 && out == 1 {
                target[ 0 ] = ( frame[ 0 ] + frame[ 1 ] ) * 0.5;
            } else {
                // Extra device channels repeat the last source channel.
                for ( ch, slot ) in target.iter_mut().enumerate() {
                    *slot = frame[ ch.min( src - 1 ) ];
                }
            }
        }
    }


    pub fn len( &self ) -> usize {
        self.queue().len()
    }


    pub fn is_empty( &self ) -> bool {
        self.queue().is_empty()
    }


    pub fn clear( &self ) {
        self.queue().clear();
    }


    pub fn set_paused( &self, paused: bool ) {
        self.paused.store( paused, Ordering::Relaxed );
    }


    pub fn is_paused( &self ) -> bool {
        self.paused.load( Ordering::Relaxed )
    }
}


/// Output stream on the default device.
///
/// Not Send: `cpal::Stream` must stay on the thread that created it.
pub struct AudioOutput {
    stream: cpal::Stream,
    sample_rate: u32,
}


impl AudioOutput {
    /// Opens the default device, preferring a config at the source rate.
    ///
    /// Returns the output and the buffer the decoder feeds.
    pub fn new(
        source_sample_rate: u32,
        source_channels: usize,
    ) -> Result<( Self, Arc<SampleBuffer> ), OutputError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or( OutputError::NoDevice )?;

        tracing::info!( "Using output device: {:?}", device.name() );

        let matching = device
            .supported_output_configs()
            .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?
            .filter( |c| {
                c.min_sample_rate().0 <= source_sample_rate && c.max_sample_rate().0 >= source_sample_rate
            })
            .max_by_key( |c| c.channels() as usize == source_channels );

        let config = match matching {
            Some( supported ) => supported.with_sample_rate( cpal::SampleRate( source_sample_rate ) ).config(),
            None => {
                let default_config = device
                    .default_output_config()
                    .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?;
                tracing::info!(
                    "Device does not support {} Hz, resampling to {} Hz",
                    source_sample_rate,
                    default_config.sample_rate().0
                );
                default_config.config()
            }
        };

        // ~500ms of audio
        let capacity = config.sample_rate.0 as usize * source_channels / 2;
        let sample_buffer = Arc::new( SampleBuffer::new( capacity, source_channels, config.channels as usize ) );
        let callback_buffer = Arc::clone( &sample_buffer );

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback_buffer.pop( data ),
                |err| tracing::error!( "Audio output error: {}", err ),
                None,
            )
            .map_err( |e| OutputError::BuildStream( e.to_string() ) )?;

        Ok(( Self { stream, sample_rate: config.sample_rate.0 }, sample_buffer ))
    }


    pub fn play( &self ) -> Result<(), OutputError> {
        self.stream.play().map_err( |e| OutputError::PlayStream( e.to_string() ) )
    }


    pub fn pause( &self ) -> Result<(), OutputError> {
        self.stream.pause().map_err( |e| OutputError::PlayStream( e.to_string() ) )
    }


    /// Device sample rate.
    pub fn sample_rate( &self ) -> u32 {
        self.sample_rate
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_push_respects_capacity() {
        let buffer = SampleBuffer::new( 4, 2, 2 );
        assert_eq!( buffer.push( &[ 0.1; 6 ] ), 4 );
        assert_eq!( buffer.len(), 4 );
    }


    #[test]
    fn test_mono_to_stereo() {
        let buffer = SampleBuffer::new( 16, 1, 2 );
        buffer.push( &[ 0.25, 0.5 ] );
        let mut out = [ 1.0; 6 ];
        buffer.pop( &mut out );
        assert_eq!( out, [ 0.25, 0.25, 0.5, 0.5, 0.0, 0.0 ] );
    }


    #[test]
    fn test_stereo_to_mono() {
        let buffer = SampleBuffer::new( 16, 2, 1 );
        buffer.push( &[ 0.2, 0.4 ] );
        let mut out = [ 0.0; 1 ];
        buffer.pop( &mut out );
        assert!( ( out[ 0 ] - 0.3 ).abs() < 1e-6 );
    }


    #[test]
    fn test_paused_outputs_silence() {
        let buffer = SampleBuffer::new( 16, 2, 2 );
        buffer.push( &[ 0.5; 4 ] );
        buffer.set_paused( true );
        let mut out = [ 1.0; 4 ];
        buffer.pop( &mut out );
        assert_eq!( out, [ 0.0; 4 ] );
        assert_eq!( buffer.len(), 4 );
    }
}
