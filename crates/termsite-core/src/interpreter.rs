//! Command interpreter.
//!
//! Owns the transcript and the prompt buffer, parses submitted lines and
//! dispatches them to the theme cycler, the playback controller or the
//! navigator. Every user error becomes a response line; nothing here
//! fails.

use crate::command::{ Command, CommandError, MusicAction };
use crate::input::InputBuffer;
use crate::playback::{ AudioResource, PlaybackController };
use crate::registry::{ self, CommandSpec };
use crate::theme::{ Theme, ThemeCycler };


/// Response to names missing from the registry.
pub const NOT_RECOGNIZED: &str = "Command not recognized. Type 'help' for a list of commands.";


/// Opens external links on behalf of `goto`.
pub trait Navigator {
    fn open( &mut self, url: &str );
}


/// Interprets console input and keeps the transcript.
pub struct Interpreter<R: AudioResource, N: Navigator> {
    transcript: Vec<String>,
    input: InputBuffer,
    theme: ThemeCycler,
    playback: PlaybackController<R>,
    navigator: N,
}


impl<R: AudioResource, N: Navigator> Interpreter<R, N> {
    pub fn new( theme: ThemeCycler, playback: PlaybackController<R>, navigator: N ) -> Self {
        Self {
            transcript: Vec::new(),
            input: InputBuffer::new(),
            theme,
            playback,
            navigator,
        }
    }


    /// Submits the content of the prompt buffer.
    pub fn submit_input( &mut self ) {
        let line = self.input.take();
        self.submit( &line );
    }


    /// Runs one line of input.
    ///
    /// Blank lines do nothing, `clear` empties the transcript without an
    /// echo, and everything else appends the echoed line and the response.
    pub fn submit( &mut self, raw_line: &str ) {
        self.input.clear();

        let response = match Command::parse( raw_line ) {
            Ok( command ) => match self.run( command ) {
                Some( response ) => response,
                None => return,
            },
            Err( CommandError::Empty ) => return,
            Err( e ) => {
                tracing::debug!( "{}", e );
                NOT_RECOGNIZED.to_string()
            }
        };

        self.transcript.push( format!( "> {}", raw_line ) );
        self.transcript.push( response );
    }


    /// Executes a command. `None` means nothing is echoed.
    fn run( &mut self, command: Command ) -> Option<String> {
        let response = match command {
            Command::Help => help(),
            Command::Theme { name } => self.theme( name.as_deref() ),
            Command::Font => format!( "Font changed to {}", self.theme.cycle_font() ),
            Command::Clear => {
                self.transcript.clear();
                return None;
            }
            Command::About => about(),
            Command::Music { action } => self.music( action.as_deref() ),
            Command::Goto { destination } => self.goto( destination.as_deref() ),
            Command::Man { target } => man( target.as_deref() ),
        };
        Some( response )
    }


    fn theme( &mut self, name: Option<&str> ) -> String {
        match name.map( |n| self.theme.set_theme( n ) ) {
            Some( Ok( theme ) ) => format!( "Theme set to {}", theme ),
            _ => format!( "Invalid theme. Available themes: {}", Theme::key_list() ),
        }
    }


    fn music( &mut self, action: Option<&str> ) -> String {
        let action = match action.map( str::parse::<MusicAction> ) {
            Some( Ok( action ) ) => action,
            _ => {
                return format!(
                    "Invalid music command. Available subcommands: {}",
                    registry::MUSIC_SUBCOMMANDS.join( ", " )
                );
            }
        };

        match action {
            MusicAction::Play => {
                self.playback.play();
                let name = &self.playback.current_track().name;
                if self.playback.is_playing() {
                    format!( "Playing: {}", name )
                } else {
                    format!( "Unable to play {}: audio is unavailable", name )
                }
            }
            MusicAction::Stop => {
                self.playback.stop();
                "Music stopped".to_string()
            }
            MusicAction::Next => format!( "Next track: {}", self.playback.next().name ),
            MusicAction::Prev => format!( "Previous track: {}", self.playback.prev().name ),
        }
    }


    fn goto( &mut self, destination: Option<&str> ) -> String {
        match destination.and_then( |d| registry::destination( d ).map( |url| ( d, url ) ) ) {
            Some(( name, url )) => {
                tracing::info!( "Opening {}", url );
                self.navigator.open( url );
                format!( "Opening {}...", name )
            }
            None => format!(
                "Invalid destination. Available destinations: {}",
                registry::destination_names().collect::<Vec<_>>().join( ", " )
            ),
        }
    }


    pub fn transcript( &self ) -> &[String] {
        &self.transcript
    }


    pub fn input( &self ) -> &InputBuffer {
        &self.input
    }


    pub fn input_mut( &mut self ) -> &mut InputBuffer {
        &mut self.input
    }


    pub fn theme_cycler( &self ) -> &ThemeCycler {
        &self.theme
    }


    pub fn theme_cycler_mut( &mut self ) -> &mut ThemeCycler {
        &mut self.theme
    }


    pub fn playback( &self ) -> &PlaybackController<R> {
        &self.playback
    }


    pub fn playback_mut( &mut self ) -> &mut PlaybackController<R> {
        &mut self.playback
    }
}


fn help() -> String {
    format!(
        "Available commands: {}",
        registry::command_names().collect::<Vec<_>>().join( ", " )
    )
}


fn about() -> String {
    format!(
        "The Enthusiast Terminal v{}\n\
         An interactive console for a privacy-first, open source community.\n\
         Type 'help' to see what it can do.",
        env!( "CARGO_PKG_VERSION" )
    )
}


fn man( target: Option<&str> ) -> String {
    let Some( target ) = target else {
        return "What manual page do you want? Usage: man <command>".to_string();
    };

    match registry::lookup( target ) {
        Some( spec ) => manual_page( spec ),
        None => format!( "No manual entry for {}", target ),
    }
}


fn manual_page( spec: &CommandSpec ) -> String {
    let mut page = format!(
        "NAME\n    {} - {}\n\nSYNOPSIS\n    {}\n\nDESCRIPTION\n    {}",
        spec.name, spec.description, spec.usage, spec.description
    );

    if !spec.subcommands.is_empty() {
        page.push_str( "\n\nSUBCOMMANDS\n    " );
        page.push_str( &spec.subcommands.join( ", " ) );
    }

    page
}


#[cfg( test )]
pub( crate ) mod testing {
    use super::Navigator;


    /// Navigator that records opened URLs.
    #[derive( Debug, Default )]
    pub struct RecordingNavigator {
        pub opened: Vec<String>,
    }


    impl Navigator for RecordingNavigator {
        fn open( &mut self, url: &str ) {
            self.opened.push( url.to_string() );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::testing::RecordingNavigator;
    use super::*;
    use crate::playback::testing::{ tracks, FakeAudio };


    type TestInterpreter = Interpreter<FakeAudio, RecordingNavigator>;


    fn interpreter() -> TestInterpreter {
        let playback = PlaybackController::new( FakeAudio::default(), tracks() ).unwrap();
        Interpreter::new( ThemeCycler::default(), playback, RecordingNavigator::default() )
    }


    fn last_response( interp: &TestInterpreter ) -> &str {
        interp.transcript().last().map( String::as_str ).unwrap_or_default()
    }


    #[test]
    fn test_unknown_command() {
        for name in [ "ls", "sudo", "exit", "HELPME" ] {
            let mut interp = interpreter();
            interp.submit( name );
            assert_eq!( interp.transcript(), [ format!( "> {}", name ), NOT_RECOGNIZED.to_string() ] );
        }
    }


    #[test]
    fn test_blank_line_is_ignored() {
        let mut interp = interpreter();
        interp.submit( "   " );
        assert!( interp.transcript().is_empty() );
    }


    #[test]
    fn test_clear() {
        let mut interp = interpreter();
        interp.submit( "help" );
        interp.submit( "about" );
        interp.input_mut().insert( 'x' );
        interp.submit( "clear" );
        assert!( interp.transcript().is_empty() );
        assert!( interp.input().is_empty() );

        interp.submit( "  CLEAR  " );
        assert!( interp.transcript().is_empty() );
    }


    #[test]
    fn test_help_lists_registry() {
        let mut interp = interpreter();
        interp.submit( "help" );
        assert_eq!(
            last_response( &interp ),
            "Available commands: help, theme, font, clear, about, music, goto, man"
        );
    }


    #[test]
    fn test_echo_keeps_raw_line() {
        let mut interp = interpreter();
        interp.submit( "Help" );
        assert_eq!( interp.transcript()[ 0 ], "> Help" );
    }


    #[test]
    fn test_repeated_commands_are_recorded() {
        let mut interp = interpreter();
        interp.submit( "about" );
        interp.submit( "about" );
        assert_eq!( interp.transcript().len(), 4 );
    }


    #[test]
    fn test_theme_valid() {
        for theme in Theme::ALL {
            let mut interp = interpreter();
            interp.submit( &format!( "theme {}", theme.key().to_uppercase() ) );
            assert_eq!( interp.theme_cycler().theme(), theme );
            assert_eq!( last_response( &interp ), format!( "Theme set to {}", theme.key() ) );
        }
    }


    #[test]
    fn test_theme_invalid() {
        for arg in [ "theme solarized", "theme" ] {
            let mut interp = interpreter();
            interp.submit( "theme matrix" );
            interp.submit( arg );
            assert_eq!( interp.theme_cycler().theme(), Theme::Matrix );
            assert_eq!(
                last_response( &interp ),
                "Invalid theme. Available themes: dark, light, matrix, amber"
            );
        }
    }


    #[test]
    fn test_font_cycles() {
        let mut interp = interpreter();
        interp.submit( "font" );
        assert_eq!( last_response( &interp ), "Font changed to JetBrains Mono" );
        for _ in 1..crate::theme::FONTS.len() {
            interp.submit( "font" );
        }
        assert_eq!( interp.theme_cycler().state().font_index, 0 );
    }


    #[test]
    fn test_about() {
        let mut interp = interpreter();
        interp.submit( "about" );
        assert!( last_response( &interp ).contains( env!( "CARGO_PKG_VERSION" ) ) );
    }


    #[test]
    fn test_music() {
        let mut interp = interpreter();
        interp.submit( "music play" );
        assert_eq!( last_response( &interp ), "Playing: Lofi Dreams" );
        assert!( interp.playback().is_playing() );

        interp.submit( "music next" );
        assert_eq!( last_response( &interp ), "Next track: Synthwave" );
        assert!( interp.playback().is_playing() );

        interp.submit( "music prev" );
        assert_eq!( last_response( &interp ), "Previous track: Lofi Dreams" );

        interp.submit( "music stop" );
        assert_eq!( last_response( &interp ), "Music stopped" );
        assert!( !interp.playback().is_playing() );
    }


    #[test]
    fn test_music_play_without_audio() {
        let audio = FakeAudio { unavailable: true, ..FakeAudio::default() };
        let playback = PlaybackController::new( audio, tracks() ).unwrap();
        let mut interp = Interpreter::new( ThemeCycler::default(), playback, RecordingNavigator::default() );

        interp.submit( "music play" );
        assert_eq!( last_response( &interp ), "Unable to play Lofi Dreams: audio is unavailable" );
        assert!( !interp.playback().is_playing() );
    }


    #[test]
    fn test_music_invalid() {
        let mut interp = interpreter();
        interp.submit( "music shuffle" );
        assert_eq!(
            last_response( &interp ),
            "Invalid music command. Available subcommands: play, stop, next, prev"
        );
        interp.submit( "music" );
        assert!( last_response( &interp ).starts_with( "Invalid music command" ) );
    }


    #[test]
    fn test_goto() {
        let mut interp = interpreter();
        interp.submit( "goto GitHub" );
        assert_eq!( last_response( &interp ), "Opening github..." );
        assert_eq!( interp.navigator.opened, [ "https://github.com/The-Enthusiast-404" ] );

        interp.submit( "goto myspace" );
        assert_eq!(
            last_response( &interp ),
            "Invalid destination. Available destinations: github, twitter"
        );
        assert_eq!( interp.navigator.opened.len(), 1 );
    }


    #[test]
    fn test_man_music() {
        let mut interp = interpreter();
        interp.submit( "man music" );
        let page = last_response( &interp );
        assert!( page.contains( "music <subcommand>" ) );
        assert!( page.contains( "SUBCOMMANDS\n    play, stop, next, prev" ) );
    }


    #[test]
    fn test_man_without_subcommands() {
        let mut interp = interpreter();
        interp.submit( "man help" );
        let page = last_response( &interp );
        assert!( page.starts_with( "NAME\n    help - List all available commands" ) );
        assert!( !page.contains( "SUBCOMMANDS" ) );
    }


    #[test]
    fn test_man_unknown() {
        let mut interp = interpreter();
        interp.submit( "man vim" );
        assert_eq!( last_response( &interp ), "No manual entry for vim" );
        interp.submit( "man" );
        assert!( last_response( &interp ).starts_with( "What manual page" ) );
    }


    #[test]
    fn test_submit_input_clears_buffer() {
        let mut interp = interpreter();
        "help".chars().for_each( |c| interp.input_mut().insert( c ) );
        interp.submit_input();
        assert!( interp.input().is_empty() );
        assert_eq!( interp.transcript().len(), 2 );
    }
}
