//! Theme and font cycling.
//!
//! Both are small fixed enumerations. Themes are selected by name,
//! fonts rotate round-robin.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;


/// Error returned when a theme name is not recognized.
#[derive( Debug, Clone, PartialEq, Eq, Error )]
#[error( "Unknown theme: {0}" )]
pub struct ThemeError( pub String );


/// Visual theme of the overlay.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Matrix,
    Amber,
}


impl Theme {
    /// All themes, in the order they are listed to the user.
    pub const ALL: [Theme; 4] = [ Theme::Dark, Theme::Light, Theme::Matrix, Theme::Amber ];


    /// Returns the key used to select the theme.
    pub fn key( &self ) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Matrix => "matrix",
            Theme::Amber => "amber",
        }
    }


    /// Returns the palette the presentation layer paints with.
    pub fn palette( &self ) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: ( 17, 24, 39 ),
                foreground: ( 229, 231, 235 ),
                accent: ( 129, 140, 248 ),
            },
            Theme::Light => Palette {
                background: ( 249, 250, 251 ),
                foreground: ( 17, 24, 39 ),
                accent: ( 79, 70, 229 ),
            },
            Theme::Matrix => Palette {
                background: ( 0, 0, 0 ),
                foreground: ( 34, 197, 94 ),
                accent: ( 134, 239, 172 ),
            },
            Theme::Amber => Palette {
                background: ( 28, 18, 4 ),
                foreground: ( 251, 191, 36 ),
                accent: ( 253, 230, 138 ),
            },
        }
    }


    /// Comma-separated list of valid theme keys.
    pub fn key_list() -> String {
        Self::ALL.iter().map( Theme::key ).collect::<Vec<_>>().join( ", " )
    }
}


impl FromStr for Theme {
    type Err = ThemeError;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find( |theme| theme.key() == s )
            .ok_or_else( || ThemeError( s.to_string() ) )
    }
}


impl fmt::Display for Theme {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        f.write_str( self.key() )
    }
}


/// RGB colors for one theme.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct Palette {
    pub background: ( u8, u8, u8 ),
    pub foreground: ( u8, u8, u8 ),
    pub accent: ( u8, u8, u8 ),
}


/// Font keys in cycling order.
pub const FONTS: &[&str] = &[
    "font-[Fira_Code]",
    "font-[JetBrains_Mono]",
    "font-[Source_Code_Pro]",
    "font-[IBM_Plex_Mono]",
];


/// Strips the `font-[...]` wrapping from a font key for display.
pub fn font_display_name( key: &str ) -> String {
    key.strip_prefix( "font-[" )
        .and_then( |rest| rest.strip_suffix( ']' ) )
        .unwrap_or( key )
        .replace( '_', " " )
}


/// Snapshot of the theme/font state.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ThemeState {
    pub theme: Theme,
    pub font_index: usize,
}


/// Owns the current theme and font.
#[derive( Debug, Default )]
pub struct ThemeCycler {
    state: ThemeState,
}


impl ThemeCycler {
    /// Creates a cycler starting at the given theme and the first font.
    pub fn new( theme: Theme ) -> Self {
        Self {
            state: ThemeState { theme, font_index: 0 },
        }
    }


    /// Switches theme by key. State is unchanged on error.
    pub fn set_theme( &mut self, key: &str ) -> Result<Theme, ThemeError> {
        let theme: Theme = key.parse()?;
        self.state.theme = theme;
        tracing::info!( "Theme: {}", theme );
        Ok( theme )
    }


    /// Advances to the next font and returns its display name.
    pub fn cycle_font( &mut self ) -> String {
        self.state.font_index = ( self.state.font_index + 1 ) % FONTS.len();
        let name = font_display_name( self.font_key() );
        tracing::info!( "Font: {}", name );
        name
    }


    /// Key of the current font.
    pub fn font_key( &self ) -> &'static str {
        FONTS[ self.state.font_index ]
    }


    /// Current theme.
    pub fn theme( &self ) -> Theme {
        self.state.theme
    }


    /// Returns a copy of the current state.
    pub fn state( &self ) -> ThemeState {
        self.state
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_set_valid_theme() {
        let mut cycler = ThemeCycler::default();
        for theme in Theme::ALL {
            assert_eq!( cycler.set_theme( theme.key() ), Ok( theme ) );
            assert_eq!( cycler.theme(), theme );
        }
    }


    #[test]
    fn test_set_invalid_theme_keeps_state() {
        let mut cycler = ThemeCycler::new( Theme::Matrix );
        let before = cycler.state();
        assert!( cycler.set_theme( "solarized" ).is_err() );
        assert_eq!( cycler.state(), before );
    }


    #[test]
    fn test_font_round_robin() {
        let mut cycler = ThemeCycler::default();
        let start = cycler.state().font_index;
        for _ in 0..FONTS.len() {
            cycler.cycle_font();
        }
        assert_eq!( cycler.state().font_index, start );
    }


    #[test]
    fn test_font_display_name() {
        assert_eq!( font_display_name( "font-[JetBrains_Mono]" ), "JetBrains Mono" );
        assert_eq!( font_display_name( "monospace" ), "monospace" );
    }


    #[test]
    fn test_key_list() {
        assert_eq!( Theme::key_list(), "dark, light, matrix, amber" );
    }
}
