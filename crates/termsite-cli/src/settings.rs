//! Application settings
//!
//! Settings are read once at startup and never written back; the session
//! itself keeps no state between runs.

use std::fs;
use std::path::{ Path, PathBuf };

use serde::Deserialize;

use termsite_core::audio::resolve_source;
use termsite_core::Track;


/// A configured background music track.
#[derive( Debug, Clone, PartialEq, Eq, Deserialize )]
pub struct TrackSetting {
    pub name: String,
    pub source: String,
}


/// Application settings.
#[derive( Debug, Clone, Deserialize )]
#[serde( default )]
pub struct Settings {
    /// Initial theme key
    pub theme: String,

    /// Start without the boot sequence
    pub skip_boot: bool,

    /// Show the glitch effect during boot
    pub glitch: bool,

    /// Directory relative track sources are resolved against
    pub music_dir: Option<PathBuf>,

    pub tracks: Vec<TrackSetting>,
}


impl Default for Settings {
    fn default() -> Self {
        let track = |name: &str, source: &str| TrackSetting {
            name: name.to_string(),
            source: source.to_string(),
        };

        Self {
            theme: "dark".to_string(),
            skip_boot: false,
            glitch: true,
            music_dir: None,
            tracks: vec![
                track( "Lofi Study", "lofi-study.mp3" ),
                track( "Synthwave Drive", "synthwave-drive.mp3" ),
                track( "Ambient Space", "ambient-space.mp3" ),
            ],
        }
    }
}


impl Settings {
    /// Returns the path to the default settings file.
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( "termsite" ).join( "settings.json" ) )
    }


    /// Loads settings from `path` (or the default location), falling back
    /// to defaults if the file is missing or malformed.
    pub fn load( path: Option<&Path> ) -> Self {
        let path = match path.map( Path::to_path_buf ).or_else( Self::settings_path ) {
            Some( p ) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string( &path ) {
            Ok( contents ) => Self::from_json( &contents ).unwrap_or_else( |e| {
                tracing::warn!( "Invalid settings in {:?}: {}", path, e );
                Self::default()
            }),
            Err( e ) => {
                tracing::warn!( "Failed to read settings: {}", e );
                Self::default()
            }
        }
    }


    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json( contents: &str ) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str( contents )?;
        if settings.tracks.is_empty() {
            settings.tracks = Self::default().tracks;
        }
        Ok( settings )
    }


    /// Directory relative track sources live in.
    pub fn music_dir( &self ) -> PathBuf {
        self.music_dir.clone()
            .or_else( || dirs::audio_dir().map( |d| d.join( "termsite" ) ) )
            .unwrap_or_else( || PathBuf::from( "." ) )
    }


    /// Builds the playback track list with resolved sources.
    pub fn tracks( &self ) -> Vec<Track> {
        let base = self.music_dir();
        self.tracks.iter()
            .map( |t| Track::new( &t.name, resolve_source( &base, &t.source ).to_string_lossy() ) )
            .collect()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json( r#"{ "theme": "matrix" }"# ).unwrap();
        assert_eq!( settings.theme, "matrix" );
        assert!( settings.glitch );
        assert_eq!( settings.tracks.len(), 3 );
    }


    #[test]
    fn test_tracks_resolve_against_music_dir() {
        let settings = Settings::from_json(
            r#"{ "music_dir": "/srv/music", "tracks": [ { "name": "One", "source": "one.ogg" } ] }"#
        ).unwrap();
        let tracks = settings.tracks();
        assert_eq!( tracks.len(), 1 );
        assert_eq!( tracks[ 0 ].name, "One" );
        assert_eq!( Path::new( &tracks[ 0 ].source ), Path::new( "/srv/music/one.ogg" ) );
    }


    #[test]
    fn test_empty_track_list_falls_back() {
        let settings = Settings::from_json( r#"{ "tracks": [] }"# ).unwrap();
        assert_eq!( settings.tracks, Settings::default().tracks );
    }


    #[test]
    fn test_malformed_json() {
        assert!( Settings::from_json( "{ theme: " ).is_err() );
    }


    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load( Some( Path::new( "/no/such/settings.json" ) ) );
        assert_eq!( settings.theme, "dark" );
    }
}
