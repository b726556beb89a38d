//! Static command registry.
//!
//! The registry is the single source of truth for command names, their
//! one-line descriptions, usage strings and subcommand lists. `help` and
//! `man` render straight from this table.


/// Registry entry describing one console command.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub subcommands: &'static [&'static str],
}


/// Subcommands accepted by `music`.
pub const MUSIC_SUBCOMMANDS: &[&str] = &[ "play", "stop", "next", "prev" ];


/// All registered commands, in definition order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        description: "List all available commands",
        usage: "help",
        subcommands: &[],
    },
    CommandSpec {
        name: "theme",
        description: "Switch the color theme",
        usage: "theme <name>",
        subcommands: &[],
    },
    CommandSpec {
        name: "font",
        description: "Cycle to the next terminal font",
        usage: "font",
        subcommands: &[],
    },
    CommandSpec {
        name: "clear",
        description: "Clear the terminal output",
        usage: "clear",
        subcommands: &[],
    },
    CommandSpec {
        name: "about",
        description: "Show information about this terminal",
        usage: "about",
        subcommands: &[],
    },
    CommandSpec {
        name: "music",
        description: "Control the background music",
        usage: "music <subcommand>",
        subcommands: MUSIC_SUBCOMMANDS,
    },
    CommandSpec {
        name: "goto",
        description: "Open an external link in a new window",
        usage: "goto <destination>",
        subcommands: &[],
    },
    CommandSpec {
        name: "man",
        description: "Show the manual page for a command",
        usage: "man <command>",
        subcommands: &[],
    },
];


/// External destinations reachable through `goto`.
pub const DESTINATIONS: &[( &str, &str )] = &[
    ( "github", "https://github.com/The-Enthusiast-404" ),
    ( "twitter", "https://x.com/introvertedbot" ),
];


/// Looks up a command by its (already lower-cased) name.
pub fn lookup( name: &str ) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find( |spec| spec.name == name )
}


/// Looks up the URL for a `goto` destination.
pub fn destination( name: &str ) -> Option<&'static str> {
    DESTINATIONS.iter()
        .find( |( key, _ )| *key == name )
        .map( |( _, url )| *url )
}


/// Returns the registered command names in definition order.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map( |spec| spec.name )
}


/// Returns the `goto` destination names in table order.
pub fn destination_names() -> impl Iterator<Item = &'static str> {
    DESTINATIONS.iter().map( |( name, _ )| *name )
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_registry_order() {
        let names: Vec<_> = command_names().collect();
        assert_eq!( names, [ "help", "theme", "font", "clear", "about", "music", "goto", "man" ] );
    }


    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = command_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!( names.len(), COMMANDS.len() );
    }


    #[test]
    fn test_lookup() {
        assert_eq!( lookup( "music" ).map( |s| s.usage ), Some( "music <subcommand>" ) );
        assert!( lookup( "ls" ).is_none() );
    }


    #[test]
    fn test_destination() {
        assert_eq!( destination( "github" ), Some( "https://github.com/The-Enthusiast-404" ) );
        assert!( destination( "gitlab" ).is_none() );
    }
}
