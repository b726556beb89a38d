//! termsite core - command console and overlay state machines
//!
//! This crate provides the command interpreter, the controllers it drives
//! (playback, theme/font, window geometry), the boot sequence and the
//! session that serializes every mutation through one event queue.

pub mod audio;
pub mod boot;
pub mod command;
pub mod decoder;
pub mod input;
pub mod interpreter;
pub mod output;
pub mod playback;
pub mod registry;
pub mod session;
pub mod tasks;
pub mod theme;
pub mod window;

pub use audio::DeviceAudio;
pub use boot::{ BootSequence, BootState };
pub use command::{ Command, CommandError, MusicAction };
pub use interpreter::{ Interpreter, Navigator };
pub use playback::{ AudioResource, PlaybackController, PlaybackError, PlaybackState, Track };
pub use session::{ event_channel, Event, Session, Snapshot };
pub use theme::{ Theme, ThemeCycler, ThemeState };
pub use window::{ GeometryState, Position, Size, WindowController };
