//! Command-line argument parsing for termsite.

use std::path::PathBuf;

use clap::Parser;


/// termsite - an interactive terminal overlay.
#[derive( Parser, Debug )]
#[command( name = "termsite" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Skip the boot sequence.
    #[arg( long )]
    pub skip_boot: bool,

    /// Theme to start with (dark, light, matrix, amber).
    #[arg( short, long )]
    pub theme: Option<String>,

    /// Disable the glitch effect during boot.
    #[arg( long )]
    pub no_glitch: bool,

    /// Settings file to read instead of the default location.
    #[arg( short, long )]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg( short, long, action = clap::ArgAction::Count )]
    pub verbose: u8,
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([ "termsite" ]).unwrap();
        assert!( !args.skip_boot );
        assert!( args.theme.is_none() );
        assert_eq!( args.verbose, 0 );
    }


    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([ "termsite", "--skip-boot", "-t", "matrix", "-vv" ]).unwrap();
        assert!( args.skip_boot );
        assert_eq!( args.theme.as_deref(), Some( "matrix" ) );
        assert_eq!( args.verbose, 2 );
    }
}
