//! Background music playback control.
//!
//! The controller owns exactly one audio resource and a fixed track list.
//! Track indices wrap in both directions. The resource reports natural
//! end of track through the session event queue, which calls `on_ended`.

use thiserror::Error;


/// Errors that can occur with the playback controller or its resource.
#[derive( Debug, Error )]
pub enum PlaybackError {
    #[error( "No tracks configured" )]
    NoTracks,

    #[error( "Audio resource unavailable: {0}" )]
    Unavailable( String ),
}


/// Playable audio resource driven by the controller.
///
/// `start` and `pause` return as soon as the request is issued; the
/// resource sends its own end-of-track notification when a bound source
/// plays out.
pub trait AudioResource {
    /// Binds the resource to a source, stopping anything bound before.
    fn bind( &mut self, source: &str );

    /// Starts or resumes the bound source.
    fn start( &mut self ) -> Result<(), PlaybackError>;

    /// Pauses without unbinding.
    fn pause( &mut self );
}


/// A background music track.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Track {
    pub name: String,
    pub source: String,
}


impl Track {
    pub fn new( name: impl Into<String>, source: impl Into<String> ) -> Self {
        Self { name: name.into(), source: source.into() }
    }
}


/// Snapshot of the playback state.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct PlaybackState {
    pub current_track: usize,
    pub is_playing: bool,
}


/// Owns the audio resource, the track list and the play state.
pub struct PlaybackController<R: AudioResource> {
    resource: R,
    tracks: Vec<Track>,
    current: usize,
    playing: bool,
    /// Index of the track the resource is currently bound to
    bound: Option<usize>,
}


impl<R: AudioResource> PlaybackController<R> {
    /// Creates a controller. The track list must not be empty.
    pub fn new( resource: R, tracks: Vec<Track> ) -> Result<Self, PlaybackError> {
        if tracks.is_empty() {
            return Err( PlaybackError::NoTracks );
        }

        Ok( Self {
            resource,
            tracks,
            current: 0,
            playing: false,
            bound: None,
        })
    }


    /// Starts playback of the current track, binding it first if needed.
    ///
    /// A resource failure leaves the controller stopped.
    pub fn play( &mut self ) {
        if self.bound != Some( self.current ) {
            self.resource.bind( &self.tracks[ self.current ].source );
            self.bound = Some( self.current );
        }

        match self.resource.start() {
            Ok(()) => {
                self.playing = true;
                tracing::info!( "Playing: {}", self.tracks[ self.current ].name );
            }
            Err( e ) => {
                self.playing = false;
                tracing::warn!( "Failed to start playback: {}", e );
            }
        }
    }


    /// Pauses playback, keeping the current binding.
    pub fn stop( &mut self ) {
        self.resource.pause();
        self.playing = false;
        tracing::info!( "Stopped" );
    }


    /// Switches to the next track, wrapping at the end.
    pub fn next( &mut self ) -> &Track {
        let index = ( self.current + 1 ) % self.tracks.len();
        self.switch_to( index )
    }


    /// Switches to the previous track, wrapping at the start.
    pub fn prev( &mut self ) -> &Track {
        let count = self.tracks.len();
        let index = ( self.current + count - 1 ) % count;
        self.switch_to( index )
    }


    /// Switches to a specific track.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn select_track( &mut self, index: usize ) -> &Track {
        assert!(
            index < self.tracks.len(),
            "track index {} out of range ({} tracks)",
            index,
            self.tracks.len()
        );
        self.switch_to( index )
    }


    /// Handles the resource's end-of-track notification.
    ///
    /// Notifications for a source other than the bound one are stale and
    /// ignored. The track index does not advance.
    pub fn on_ended( &mut self, source: &str ) {
        let is_bound = self.bound
            .map( |i| self.tracks[ i ].source == source )
            .unwrap_or( false );

        if !is_bound {
            tracing::debug!( "Ignoring stale end-of-track for {}", source );
            return;
        }

        self.playing = false;
        tracing::info!( "Track ended: {}", self.tracks[ self.current ].name );
    }


    /// Stops, rebinds and resumes if playback was active.
    fn switch_to( &mut self, index: usize ) -> &Track {
        let was_playing = self.playing;

        self.resource.pause();
        self.playing = false;

        self.current = index;
        self.resource.bind( &self.tracks[ index ].source );
        self.bound = Some( index );

        if was_playing {
            self.play();
        }

        &self.tracks[ self.current ]
    }


    /// Returns the current track.
    pub fn current_track( &self ) -> &Track {
        &self.tracks[ self.current ]
    }


    /// Returns all tracks.
    pub fn tracks( &self ) -> &[Track] {
        &self.tracks
    }


    /// Returns true while the resource is playing.
    pub fn is_playing( &self ) -> bool {
        self.playing
    }


    /// Returns a copy of the current state.
    pub fn state( &self ) -> PlaybackState {
        PlaybackState {
            current_track: self.current,
            is_playing: self.playing,
        }
    }


    /// Gets a reference to the underlying resource.
    pub fn resource( &self ) -> &R {
        &self.resource
    }
}


#[cfg( test )]
pub( crate ) mod testing {
    use super::*;


    /// Call recorded by `FakeAudio`.
    #[derive( Debug, Clone, PartialEq, Eq )]
    pub enum AudioCall {
        Bind( String ),
        Start,
        Pause,
    }


    /// In-memory resource recording every call.
    #[derive( Debug, Default )]
    pub struct FakeAudio {
        pub calls: Vec<AudioCall>,
        pub unavailable: bool,
    }


    impl AudioResource for FakeAudio {
        fn bind( &mut self, source: &str ) {
            self.calls.push( AudioCall::Bind( source.to_string() ) );
        }


        fn start( &mut self ) -> Result<(), PlaybackError> {
            self.calls.push( AudioCall::Start );
            if self.unavailable {
                Err( PlaybackError::Unavailable( "no device".into() ) )
            } else {
                Ok(())
            }
        }


        fn pause( &mut self ) {
            self.calls.push( AudioCall::Pause );
        }
    }


    pub fn tracks() -> Vec<Track> {
        vec![
            Track::new( "Lofi Dreams", "lofi.mp3" ),
            Track::new( "Synthwave", "synth.mp3" ),
            Track::new( "Ambient", "ambient.mp3" ),
        ]
    }
}


#[cfg( test )]
mod tests {
    use super::testing::{ tracks, AudioCall, FakeAudio };
    use super::*;


    fn controller() -> PlaybackController<FakeAudio> {
        PlaybackController::new( FakeAudio::default(), tracks() ).unwrap()
    }


    #[test]
    fn test_empty_track_list() {
        let result = PlaybackController::new( FakeAudio::default(), Vec::new() );
        assert!( matches!( result, Err( PlaybackError::NoTracks ) ) );
    }


    #[test]
    fn test_play_binds_once() {
        let mut player = controller();
        player.play();
        player.stop();
        player.play();

        assert!( player.is_playing() );
        let binds = player.resource().calls.iter()
            .filter( |c| matches!( c, AudioCall::Bind( _ ) ) )
            .count();
        assert_eq!( binds, 1 );
    }


    #[test]
    fn test_next_prev_are_inverse() {
        let mut player = controller();
        for start in 0..player.tracks().len() {
            player.select_track( start );
            player.next();
            player.prev();
            assert_eq!( player.state().current_track, start );
        }
    }


    #[test]
    fn test_wraparound() {
        let mut player = controller();
        player.prev();
        assert_eq!( player.state().current_track, 2 );
        player.next();
        assert_eq!( player.state().current_track, 0 );
    }


    #[test]
    fn test_next_keeps_playing() {
        let mut player = controller();
        player.play();
        player.next();
        assert_eq!( player.state(), PlaybackState { current_track: 1, is_playing: true } );

        let calls = &player.resource().calls;
        assert_eq!( &calls[ calls.len() - 3.. ], &[
            AudioCall::Pause,
            AudioCall::Bind( "synth.mp3".into() ),
            AudioCall::Start,
        ]);
    }


    #[test]
    fn test_next_stays_stopped() {
        let mut player = controller();
        player.next();
        assert_eq!( player.state(), PlaybackState { current_track: 1, is_playing: false } );
        assert!( !player.resource().calls.contains( &AudioCall::Start ) );
    }


    #[test]
    fn test_end_of_track_does_not_advance() {
        let mut player = controller();
        player.select_track( 1 );
        player.play();
        player.on_ended( "synth.mp3" );
        assert_eq!( player.state(), PlaybackState { current_track: 1, is_playing: false } );
    }


    #[test]
    fn test_stale_end_of_track_ignored() {
        let mut player = controller();
        player.play();
        player.next();
        player.on_ended( "lofi.mp3" );
        assert!( player.is_playing() );
    }


    #[test]
    fn test_unavailable_resource() {
        let audio = FakeAudio { unavailable: true, ..Default::default() };
        let mut player = PlaybackController::new( audio, tracks() ).unwrap();
        player.play();
        assert!( !player.is_playing() );
    }


    #[test]
    #[should_panic]
    fn test_select_out_of_range() {
        controller().select_track( 3 );
    }
}
