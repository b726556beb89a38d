//! Key bindings.
//!
//! Maps terminal key presses to session events. Which keys apply depends on
//! whether the boot sequence is running and whether the window is open.

use crossterm::event::{ KeyCode, KeyEvent, KeyModifiers };

use termsite_core::{ Event, MusicAction };


/// What a key press asks the application to do.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Action {
    Quit,
    Session( Event ),
}


/// Session facts the bindings depend on.
#[derive( Debug, Clone, Copy, Default )]
pub struct KeyContext {
    pub booting: bool,
    pub visible: bool,
    pub playing: bool,
}


/// Status bar hint for the current context.
pub fn hint( ctx: KeyContext ) -> &'static str {
    if ctx.booting {
        " [Esc]Skip [Ctrl+Q]Quit "
    } else if !ctx.visible {
        " [Enter]Open terminal [q]Quit "
    } else {
        " [F2]Minimize [F3]Font [F5]Music [F6/F7]Prev/Next [Alt+1-9]Track [Ctrl+Arrows]Move [Esc]Close [Ctrl+Q]Quit "
    }
}


/// Maps a key press to an action.
pub fn map_key( key: KeyEvent, ctx: KeyContext ) -> Option<Action> {
    let ctrl = key.modifiers.contains( KeyModifiers::CONTROL );
    let alt = key.modifiers.contains( KeyModifiers::ALT );

    if ctrl && matches!( key.code, KeyCode::Char( 'c' ) | KeyCode::Char( 'q' ) ) {
        return Some( Action::Quit );
    }

    if ctx.booting {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char( ' ' ) => Some( Action::Session( Event::SkipBoot ) ),
            _ => None,
        };
    }

    if !ctx.visible {
        return match key.code {
            KeyCode::Enter => Some( Action::Session( Event::Open ) ),
            KeyCode::Char( 'q' ) => Some( Action::Quit ),
            _ => None,
        };
    }

    let event = match key.code {
        KeyCode::Left if ctrl => Event::DragBy { dx: -1, dy: 0 },
        KeyCode::Right if ctrl => Event::DragBy { dx: 1, dy: 0 },
        KeyCode::Up if ctrl => Event::DragBy { dx: 0, dy: -1 },
        KeyCode::Down if ctrl => Event::DragBy { dx: 0, dy: 1 },
        KeyCode::Char( c @ '1'..='9' ) if alt => Event::SelectTrack( c as usize - '1' as usize ),

        KeyCode::Esc => Event::Close,
        KeyCode::F( 2 ) => Event::ToggleMinimize,
        KeyCode::F( 3 ) => Event::CycleFont,
        KeyCode::F( 5 ) if ctx.playing => Event::Music( MusicAction::Stop ),
        KeyCode::F( 5 ) => Event::Music( MusicAction::Play ),
        KeyCode::F( 6 ) => Event::Music( MusicAction::Prev ),
        KeyCode::F( 7 ) => Event::Music( MusicAction::Next ),

        KeyCode::Enter => Event::SubmitInput,
        KeyCode::Backspace => Event::Backspace,
        KeyCode::Delete => Event::Delete,
        KeyCode::Left => Event::CursorLeft,
        KeyCode::Right => Event::CursorRight,
        KeyCode::Home => Event::CursorHome,
        KeyCode::End => Event::CursorEnd,
        KeyCode::Char( c ) if !ctrl && !alt => Event::InputChar( c ),
        _ => return None,
    };

    Some( Action::Session( event ) )
}


#[cfg( test )]
mod tests {
    use super::*;


    fn key( code: KeyCode ) -> KeyEvent {
        KeyEvent::new( code, KeyModifiers::NONE )
    }


    fn open() -> KeyContext {
        KeyContext { booting: false, visible: true, playing: false }
    }


    #[test]
    fn test_quit_always_available() {
        let quit = KeyEvent::new( KeyCode::Char( 'q' ), KeyModifiers::CONTROL );
        assert_eq!( map_key( quit, KeyContext { booting: true, ..open() } ), Some( Action::Quit ) );
        assert_eq!( map_key( quit, open() ), Some( Action::Quit ) );
    }


    #[test]
    fn test_booting_only_skips() {
        let ctx = KeyContext { booting: true, ..open() };
        assert_eq!( map_key( key( KeyCode::Esc ), ctx ), Some( Action::Session( Event::SkipBoot ) ) );
        assert_eq!( map_key( key( KeyCode::Char( 'a' ) ), ctx ), None );
    }


    #[test]
    fn test_typing_goes_to_prompt() {
        assert_eq!(
            map_key( key( KeyCode::Char( 'q' ) ), open() ),
            Some( Action::Session( Event::InputChar( 'q' ) ) )
        );
        assert_eq!( map_key( key( KeyCode::Enter ), open() ), Some( Action::Session( Event::SubmitInput ) ) );
    }


    #[test]
    fn test_music_toggle_follows_state() {
        let playing = KeyContext { playing: true, ..open() };
        assert_eq!(
            map_key( key( KeyCode::F( 5 ) ), playing ),
            Some( Action::Session( Event::Music( MusicAction::Stop ) ) )
        );
        assert_eq!(
            map_key( key( KeyCode::F( 5 ) ), open() ),
            Some( Action::Session( Event::Music( MusicAction::Play ) ) )
        );
    }


    #[test]
    fn test_alt_digit_selects_track() {
        let alt_two = KeyEvent::new( KeyCode::Char( '2' ), KeyModifiers::ALT );
        assert_eq!( map_key( alt_two, open() ), Some( Action::Session( Event::SelectTrack( 1 ) ) ) );
    }


    #[test]
    fn test_hidden_window() {
        let hidden = KeyContext { visible: false, ..open() };
        assert_eq!( map_key( key( KeyCode::Enter ), hidden ), Some( Action::Session( Event::Open ) ) );
        assert_eq!( map_key( key( KeyCode::Char( 'q' ) ), hidden ), Some( Action::Quit ) );
        assert_eq!( map_key( key( KeyCode::Char( 'x' ) ), hidden ), None );
    }


    #[test]
    fn test_ctrl_arrows_move_window() {
        let left = KeyEvent::new( KeyCode::Left, KeyModifiers::CONTROL );
        assert_eq!( map_key( left, open() ), Some( Action::Session( Event::DragBy { dx: -1, dy: 0 } ) ) );
    }
}
