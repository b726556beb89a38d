//! Session state and the single event queue.
//!
//! Every mutation of session state goes through `Session::handle`, called
//! by the one consumer of the event queue. Background producers (boot
//! timers, the glitch pulse, the terminal input thread, the audio decode
//! thread) only ever send events.

use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };

use crate::boot::{ self, BootEvent, BootSequence, BootState };
use crate::command::MusicAction;
use crate::interpreter::{ Interpreter, Navigator };
use crate::playback::{ AudioResource, PlaybackState };
use crate::tasks::TaskSet;
use crate::theme::ThemeState;
use crate::window::{ GeometryState, Position, Size, WindowController };


/// Inbound event processed by the session.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Event {
    // Prompt editing
    InputChar( char ),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    SubmitInput,
    Submit( String ),

    // Direct controller calls
    ToggleMinimize,
    Drag( Position ),
    DragBy { dx: i32, dy: i32 },
    Close,
    Open,
    Resize( Size ),
    Music( MusicAction ),
    SelectTrack( usize ),
    SetTheme( String ),
    CycleFont,

    // Background notifications
    TrackEnded { source: String },
    Boot( BootEvent ),
    SkipBoot,
}


/// Read-only copy of everything the presentation layer paints.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Snapshot {
    pub transcript: Vec<String>,
    pub input: String,
    pub cursor: usize,
    pub playback: PlaybackState,
    pub track_name: String,
    pub geometry: GeometryState,
    pub theme: ThemeState,
    pub font_key: &'static str,
    pub boot: BootState,
}


/// Creates the session event queue.
pub fn event_channel() -> ( UnboundedSender<Event>, UnboundedReceiver<Event> ) {
    mpsc::unbounded_channel()
}


/// Owns all session state, the event queue sender and background tasks.
pub struct Session<R: AudioResource, N: Navigator> {
    interpreter: Interpreter<R, N>,
    window: WindowController,
    boot: BootSequence,
    tasks: TaskSet,
    tx: UnboundedSender<Event>,
}


impl<R: AudioResource, N: Navigator> Session<R, N> {
    /// Creates a session posting background events to `tx`.
    ///
    /// `tx` is the sending half of `event_channel()`; producers created
    /// before the session (such as the audio resource) share it.
    pub fn new(
        interpreter: Interpreter<R, N>,
        window: WindowController,
        boot: BootSequence,
        tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            interpreter,
            window,
            boot,
            tasks: TaskSet::new(),
            tx,
        }
    }


    /// Spawns the boot timeline and, if enabled, the glitch noise task.
    ///
    /// Must be called from within a tokio runtime. Does nothing once the
    /// boot phase has ended.
    pub fn start_boot( &mut self, glitch: bool ) {
        if !self.boot.is_booting() {
            return;
        }

        self.tasks.spawn( boot::run_timeline( self.tx.clone(), self.boot.timeline() ) );
        if glitch {
            self.tasks.spawn( boot::run_glitch_noise( self.tx.clone() ) );
        }
    }


    /// Applies one event.
    ///
    /// While booting, only boot events are accepted.
    pub fn handle( &mut self, event: Event ) {
        match event {
            Event::Boot( boot_event ) => {
                self.boot.apply( boot_event );
                self.stop_boot_tasks_if_done();
                return;
            }
            Event::SkipBoot => {
                self.boot.skip();
                self.stop_boot_tasks_if_done();
                return;
            }
            Event::TrackEnded { ref source } => {
                self.interpreter.playback_mut().on_ended( source );
                return;
            }
            Event::Resize( bounds ) => {
                self.window.set_bounds( bounds );
                return;
            }
            _ if self.boot.is_booting() => {
                tracing::trace!( "Ignoring {:?} while booting", event );
                return;
            }
            _ => {}
        }

        match event {
            Event::InputChar( c ) => self.interpreter.input_mut().insert( c ),
            Event::Backspace => self.interpreter.input_mut().backspace(),
            Event::Delete => self.interpreter.input_mut().delete(),
            Event::CursorLeft => self.interpreter.input_mut().move_left(),
            Event::CursorRight => self.interpreter.input_mut().move_right(),
            Event::CursorHome => self.interpreter.input_mut().move_home(),
            Event::CursorEnd => self.interpreter.input_mut().move_end(),
            Event::SubmitInput => self.interpreter.submit_input(),
            Event::Submit( line ) => self.interpreter.submit( &line ),
            Event::ToggleMinimize => self.window.toggle_minimize(),
            Event::Drag( position ) => self.window.drag( position ),
            Event::DragBy { dx, dy } => self.window.drag_by( dx, dy ),
            Event::Close => self.window.close(),
            Event::Open => self.window.open(),
            Event::Music( action ) => {
                let playback = self.interpreter.playback_mut();
                match action {
                    MusicAction::Play => playback.play(),
                    MusicAction::Stop => playback.stop(),
                    MusicAction::Next => { playback.next(); }
                    MusicAction::Prev => { playback.prev(); }
                }
            }
            Event::SelectTrack( index ) => {
                let playback = self.interpreter.playback_mut();
                // Indices come from UI hit-testing; drop anything stale.
                if index < playback.tracks().len() {
                    playback.select_track( index );
                }
            }
            Event::SetTheme( key ) => {
                if let Err( e ) = self.interpreter.theme_cycler_mut().set_theme( &key ) {
                    tracing::warn!( "{}", e );
                }
            }
            Event::CycleFont => { self.interpreter.theme_cycler_mut().cycle_font(); }
            Event::Boot( _ )
            | Event::SkipBoot
            | Event::TrackEnded { .. }
            | Event::Resize( _ ) => {}
        }
    }


    fn stop_boot_tasks_if_done( &mut self ) {
        if !self.boot.is_booting() && !self.tasks.is_empty() {
            self.tasks.abort_all();
            tracing::debug!( "Boot tasks cancelled" );
        }
    }


    /// Cancels every background task.
    pub fn shutdown( &mut self ) {
        self.tasks.abort_all();
    }


    /// Copies out the state the presentation layer needs.
    pub fn snapshot( &self ) -> Snapshot {
        let playback = self.interpreter.playback();
        let theme = self.interpreter.theme_cycler();
        let input = self.interpreter.input();

        Snapshot {
            transcript: self.interpreter.transcript().to_vec(),
            input: input.content().to_string(),
            cursor: input.cursor_char_pos(),
            playback: playback.state(),
            track_name: playback.current_track().name.clone(),
            geometry: self.window.state(),
            theme: theme.state(),
            font_key: theme.font_key(),
            boot: self.boot.state(),
        }
    }


    pub fn is_booting( &self ) -> bool {
        self.boot.is_booting()
    }


    pub fn window( &self ) -> &WindowController {
        &self.window
    }


    pub fn interpreter( &self ) -> &Interpreter<R, N> {
        &self.interpreter
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::boot::BOOT_STEPS;
    use crate::interpreter::testing::RecordingNavigator;
    use crate::playback::testing::{ tracks, FakeAudio };
    use crate::playback::PlaybackController;
    use crate::theme::{ Theme, ThemeCycler };


    type TestSession = Session<FakeAudio, RecordingNavigator>;


    fn session( boot: BootSequence ) -> ( TestSession, UnboundedReceiver<Event> ) {
        let playback = PlaybackController::new( FakeAudio::default(), tracks() ).unwrap();
        let interpreter = Interpreter::new( ThemeCycler::default(), playback, RecordingNavigator::default() );
        let ( tx, rx ) = event_channel();
        ( Session::new( interpreter, WindowController::new( Size::new( 120, 40 ) ), boot, tx ), rx )
    }


    fn booted() -> TestSession {
        session( BootSequence::finished( BOOT_STEPS ) ).0
    }


    #[test]
    fn test_typing_and_submit() {
        let mut session = booted();
        for c in "theme light".chars() {
            session.handle( Event::InputChar( c ) );
        }
        session.handle( Event::SubmitInput );

        let snapshot = session.snapshot();
        assert_eq!( snapshot.theme.theme, Theme::Light );
        assert_eq!( snapshot.transcript, [ "> theme light", "Theme set to light" ] );
        assert!( snapshot.input.is_empty() );
    }


    #[test]
    fn test_input_ignored_while_booting() {
        let ( mut session, _rx ) = session( BootSequence::new( BOOT_STEPS ) );
        session.handle( Event::Submit( "help".into() ) );
        session.handle( Event::ToggleMinimize );
        assert!( session.snapshot().transcript.is_empty() );
        assert!( !session.snapshot().geometry.minimized );

        session.handle( Event::SkipBoot );
        session.handle( Event::Submit( "help".into() ) );
        assert_eq!( session.snapshot().transcript.len(), 2 );
    }


    #[test]
    fn test_close_keeps_state() {
        let mut session = booted();
        session.handle( Event::Submit( "theme amber".into() ) );
        session.handle( Event::Music( MusicAction::Next ) );
        session.handle( Event::Close );
        assert!( !session.snapshot().geometry.visible );

        session.handle( Event::Open );
        let snapshot = session.snapshot();
        assert!( snapshot.geometry.visible );
        assert_eq!( snapshot.theme.theme, Theme::Amber );
        assert_eq!( snapshot.playback.current_track, 1 );
        assert_eq!( snapshot.transcript.len(), 2 );
    }


    #[test]
    fn test_track_ended_event() {
        let mut session = booted();
        session.handle( Event::Music( MusicAction::Play ) );
        session.handle( Event::TrackEnded { source: "lofi.mp3".into() } );
        assert_eq!( session.snapshot().playback, PlaybackState { current_track: 0, is_playing: false } );
    }


    #[test]
    fn test_select_track_out_of_range_is_dropped() {
        let mut session = booted();
        session.handle( Event::SelectTrack( 2 ) );
        session.handle( Event::SelectTrack( 42 ) );
        assert_eq!( session.snapshot().playback.current_track, 2 );
        assert_eq!( session.snapshot().track_name, "Ambient" );
    }


    #[test]
    fn test_resize_clamps_window() {
        let mut session = booted();
        session.handle( Event::Drag( Position { x: 999, y: 999 } ) );
        session.handle( Event::Resize( Size::new( 80, 24 ) ) );
        assert_eq!( session.snapshot().geometry.position, Position { x: 8, y: 4 } );
    }


    #[tokio::test( start_paused = true )]
    async fn test_boot_runs_to_completion() {
        let ( mut session, mut rx ) = session( BootSequence::new( BOOT_STEPS ) );
        session.start_boot( true );

        let mut last_progress = 0;
        while session.is_booting() {
            let event = rx.recv().await.unwrap();
            session.handle( event );
            let progress = session.snapshot().boot.progress;
            assert!( progress >= last_progress );
            last_progress = progress;
        }

        let boot = session.snapshot().boot;
        assert_eq!( boot.progress, 100 );
        assert_eq!( boot.message, "System ready." );
        assert!( !boot.glitch_active );

        // Late events from aborted tasks never revive the boot phase.
        session.handle( Event::Boot( BootEvent::Noise( true ) ) );
        assert!( !session.snapshot().boot.glitch_active );
        assert!( !session.is_booting() );
    }
}
