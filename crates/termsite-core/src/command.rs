//! Console command parsing.
//!
//! Raw input lines are parsed into a closed `Command` enum. Only the
//! command name is validated here; argument validation (theme names,
//! destinations, manual targets) belongs to the interpreter, which
//! reports invalid values together with the list of valid ones.

use std::str::FromStr;

use thiserror::Error;

use crate::registry;


/// Errors that can occur during command parsing.
#[derive( Debug, Clone, PartialEq, Eq, Error )]
pub enum CommandError {
    #[error( "empty command" )]
    Empty,

    #[error( "Unknown command: {0}" )]
    Unknown( String ),

    #[error( "Invalid argument: {0}" )]
    InvalidArgument( String ),
}


/// Parsed console command.
///
/// Arguments are lower-cased; anything past the first argument is dropped.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Command {
    Help,
    Theme { name: Option<String> },
    Font,
    Clear,
    About,
    Music { action: Option<String> },
    Goto { destination: Option<String> },
    Man { target: Option<String> },
}


/// Subcommand of `music`.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum MusicAction {
    Play,
    Stop,
    Next,
    Prev,
}


impl FromStr for MusicAction {
    type Err = CommandError;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok( MusicAction::Play ),
            "stop" => Ok( MusicAction::Stop ),
            "next" => Ok( MusicAction::Next ),
            "prev" => Ok( MusicAction::Prev ),
            other => Err( CommandError::InvalidArgument( other.to_string() ) ),
        }
    }
}


impl Command {
    /// Parses a raw input line.
    ///
    /// @param input - The line as typed by the user
    ///
    /// @returns The parsed command, `CommandError::Empty` for blank input,
    /// or `CommandError::Unknown` for names missing from the registry
    pub fn parse( input: &str ) -> Result<Self, CommandError> {
        let normalized = input.trim().to_lowercase();
        let mut parts = normalized.split_whitespace();
        let cmd = parts.next().unwrap_or( "" );
        let arg = parts.next().map( str::to_string );

        let command = match cmd {
            "" => return Err( CommandError::Empty ),
            "help" => Command::Help,
            "theme" => Command::Theme { name: arg },
            "font" => Command::Font,
            "clear" => Command::Clear,
            "about" => Command::About,
            "music" => Command::Music { action: arg },
            "goto" => Command::Goto { destination: arg },
            "man" => Command::Man { target: arg },
            other => return Err( CommandError::Unknown( other.to_string() ) ),
        };

        debug_assert!( registry::lookup( command.name() ).is_some() );
        Ok( command )
    }


    /// Returns the registry name of the command.
    pub fn name( &self ) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Theme { .. } => "theme",
            Command::Font => "font",
            Command::Clear => "clear",
            Command::About => "about",
            Command::Music { .. } => "music",
            Command::Goto { .. } => "goto",
            Command::Man { .. } => "man",
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_every_registered_name() {
        for name in registry::command_names() {
            let cmd = Command::parse( name ).unwrap();
            assert_eq!( cmd.name(), name );
        }
    }


    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            Command::parse( "  THEME Matrix " ).unwrap(),
            Command::Theme { name: Some( "matrix".into() ) }
        );
    }


    #[test]
    fn test_parse_ignores_extra_args() {
        assert_eq!(
            Command::parse( "music play loud now" ).unwrap(),
            Command::Music { action: Some( "play".into() ) }
        );
    }


    #[test]
    fn test_parse_empty() {
        assert_eq!( Command::parse( "   " ), Err( CommandError::Empty ) );
    }


    #[test]
    fn test_parse_unknown() {
        let result = Command::parse( "sudo rm" );
        assert!( matches!( result, Err( CommandError::Unknown( ref name ) ) if name == "sudo" ) );
    }


    #[test]
    fn test_music_action() {
        assert_eq!( "prev".parse::<MusicAction>(), Ok( MusicAction::Prev ) );
        assert!( "shuffle".parse::<MusicAction>().is_err() );
    }
}
