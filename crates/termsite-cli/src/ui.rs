//! Rendering.
//!
//! Everything here paints a `Snapshot`; nothing reads or mutates the
//! session directly.

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{ Block, Borders, Clear, Gauge, Paragraph },
};

use termsite_core::theme::{ font_display_name, Palette };
use termsite_core::{ GeometryState, Size, Snapshot };

use crate::keys::{ self, KeyContext };


/// Width of the boot panel.
const BOOT_WIDTH: u16 = 52;

/// Characters swapped into text while the glitch pulse is active.
const GLITCH_CHARS: &[char] = &[ '#', '%', '&', '@', '$', '?' ];

const PROMPT: &str = "$ ";

/// Rows taken by the status bar at the bottom of the screen.
const STATUS_HEIGHT: u16 = 1;


/// Button on the window title bar.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum TitleButton {
    Minimize,
    Close,
}


fn rgb( ( r, g, b ): ( u8, u8, u8 ) ) -> Color {
    Color::Rgb( r, g, b )
}


/// Area the window may occupy on a terminal of the given size.
///
/// This is everything above the status bar, the same area `draw` paints
/// the window into.
pub fn window_bounds( width: u16, height: u16 ) -> Size {
    Size::new( width as i32, height.saturating_sub( STATUS_HEIGHT ) as i32 )
}


/// Converts window geometry to a screen rect, clipped to `area`.
pub fn window_rect( geometry: &GeometryState, area: Rect ) -> Rect {
    let cell = |v: i32| v.clamp( 0, u16::MAX as i32 ) as u16;
    Rect::new(
        cell( geometry.position.x ),
        cell( geometry.position.y ),
        cell( geometry.size.width ),
        cell( geometry.size.height ),
    ).intersection( area )
}


/// Returns the title bar button under column `x`, if any.
///
/// Buttons are drawn right-aligned as `[_][x]` just inside the top-right
/// border corner.
pub fn title_button( geometry: &GeometryState, x: i32 ) -> Option<TitleButton> {
    let right = geometry.position.x + geometry.size.width - 1;
    if ( right - 6..right - 3 ).contains( &x ) {
        Some( TitleButton::Minimize )
    } else if ( right - 3..right ).contains( &x ) {
        Some( TitleButton::Close )
    } else {
        None
    }
}


/// Scrambles part of `text` for the glitch effect.
///
/// Deterministic for a given `seed` so a pulse does not flicker between
/// frames.
pub fn glitch_text( text: &str, seed: usize ) -> String {
    text.chars()
        .enumerate()
        .map( |( i, c )| {
            if c != ' ' && ( i + seed ) % 5 == 0 {
                GLITCH_CHARS[ ( i + seed ) % GLITCH_CHARS.len() ]
            } else {
                c
            }
        })
        .collect()
}


/// Draws the whole screen.
pub fn draw( frame: &mut Frame, snapshot: &Snapshot ) {
    let area = frame.area();
    let palette = snapshot.theme.theme.palette();

    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Min( 0 ),     // Backdrop
            Constraint::Length( STATUS_HEIGHT ),  // Status bar
        ])
        .split( area );

    draw_backdrop( frame, &palette, chunks[0] );

    if snapshot.boot.is_booting {
        draw_boot( frame, snapshot, &palette, chunks[0] );
    } else if snapshot.geometry.visible {
        draw_window( frame, snapshot, &palette, chunks[0] );
    }

    draw_status_bar( frame, snapshot, &palette, chunks[1] );
}


fn draw_backdrop( frame: &mut Frame, palette: &Palette, area: Rect ) {
    let style = Style::default().bg( rgb( palette.background ) ).fg( rgb( palette.foreground ) );
    frame.render_widget( Block::default().style( style ), area );

    let lines = vec![
        Line::from( "The Enthusiast" ).style( Style::default().fg( rgb( palette.accent ) ).bold() ),
        Line::from( "" ),
        Line::from( "Building things for the terminal and the web." ),
    ];
    let top = area.height.saturating_sub( lines.len() as u16 ) / 2;
    let text_area = Rect::new( area.x, area.y + top, area.width, ( lines.len() as u16 ).min( area.height ) );
    frame.render_widget( Paragraph::new( lines ).alignment( Alignment::Center ).style( style ), text_area );
}


fn draw_boot( frame: &mut Frame, snapshot: &Snapshot, palette: &Palette, area: Rect ) {
    let boot = &snapshot.boot;
    let width = BOOT_WIDTH.min( area.width );
    let height = 6.min( area.height );
    let panel = Rect::new(
        area.x + ( area.width - width ) / 2,
        area.y + ( area.height - height ) / 2,
        width,
        height,
    );

    let base = Style::default().bg( rgb( palette.background ) ).fg( rgb( palette.foreground ) );
    let accent = Style::default().fg( rgb( palette.accent ) );

    let block = Block::default()
        .borders( Borders::ALL )
        .title( " termsite " )
        .style( base )
        .border_style( accent );
    let inner = block.inner( panel );
    frame.render_widget( Clear, panel );
    frame.render_widget( block, panel );

    let rows = Layout::default()
        .direction( Direction::Vertical )
        .constraints([ Constraint::Length( 2 ), Constraint::Length( 1 ), Constraint::Min( 0 ) ])
        .split( inner );

    let ( message, message_style ) = if boot.glitch_active {
        (
            glitch_text( &boot.message, boot.step_index ),
            accent.add_modifier( Modifier::REVERSED ),
        )
    } else {
        ( boot.message.clone(), base )
    };
    frame.render_widget( Paragraph::new( message ).style( message_style ), rows[0] );

    let gauge = Gauge::default()
        .gauge_style( accent.bg( rgb( palette.background ) ) )
        .percent( u16::from( boot.progress.min( 100 ) ) );
    frame.render_widget( gauge, rows[1] );
}


fn draw_window( frame: &mut Frame, snapshot: &Snapshot, palette: &Palette, area: Rect ) {
    let rect = window_rect( &snapshot.geometry, area );
    if rect.width < 3 || rect.height < 3 {
        return;
    }

    let base = Style::default().bg( rgb( palette.background ) ).fg( rgb( palette.foreground ) );
    let accent = Style::default().fg( rgb( palette.accent ) );

    let note = if snapshot.playback.is_playing { " \u{266a}" } else { "" };
    let title = format!( " termsite: {}{} ", snapshot.track_name, note );

    let mut block = Block::default()
        .borders( Borders::ALL )
        .title( Line::from( title ) )
        .title( Line::from( "[_][x]" ).right_aligned() )
        .style( base )
        .border_style( accent );

    if !snapshot.geometry.minimized {
        let footer = format!(
            " {} | {} ",
            snapshot.theme.theme.key(),
            font_display_name( snapshot.font_key )
        );
        block = block.title_bottom( Line::from( footer ).right_aligned() );
    }

    let inner = block.inner( rect );
    frame.render_widget( Clear, rect );
    frame.render_widget( block, rect );

    if snapshot.geometry.minimized || inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction( Direction::Vertical )
        .constraints([ Constraint::Min( 0 ), Constraint::Length( 1 ) ])
        .split( inner );

    // Show the tail of the transcript that fits.
    let lines: Vec<Line> = snapshot.transcript.iter()
        .flat_map( |entry| entry.lines() )
        .map( |line| {
            if line.starts_with( "> " ) {
                Line::from( line.to_string() ).style( accent )
            } else {
                Line::from( line.to_string() )
            }
        })
        .collect();
    let skip = lines.len().saturating_sub( rows[0].height as usize );
    let visible: Vec<Line> = lines.into_iter().skip( skip ).collect();
    frame.render_widget( Paragraph::new( visible ).style( base ), rows[0] );

    let prompt = Line::from( vec![
        Span::styled( PROMPT, accent ),
        Span::raw( snapshot.input.clone() ),
    ]);
    frame.render_widget( Paragraph::new( prompt ).style( base ), rows[1] );

    let cursor_x = rows[1].x + PROMPT.len() as u16 + snapshot.cursor as u16;
    if cursor_x < rows[1].right() {
        frame.set_cursor_position(( cursor_x, rows[1].y ));
    }
}


fn draw_status_bar( frame: &mut Frame, snapshot: &Snapshot, palette: &Palette, area: Rect ) {
    let ctx = KeyContext {
        booting: snapshot.boot.is_booting,
        visible: snapshot.geometry.visible,
        playing: snapshot.playback.is_playing,
    };
    let status = Paragraph::new( keys::hint( ctx ) )
        .style( Style::default().bg( rgb( palette.background ) ).fg( Color::DarkGray ) );
    frame.render_widget( status, area );
}


#[cfg( test )]
mod tests {
    use super::*;

    use ratatui::backend::TestBackend;
    use termsite_core::{ BootState, PlaybackState, Position, Theme, ThemeState, WindowController };


    fn geometry( x: i32, y: i32, width: i32, height: i32 ) -> GeometryState {
        GeometryState {
            position: Position { x, y },
            size: Size::new( width, height ),
            minimized: false,
            visible: true,
        }
    }


    fn snapshot( booting: bool ) -> Snapshot {
        Snapshot {
            transcript: vec![ "> help".to_string(), "Available commands:".to_string() ],
            input: "the".to_string(),
            cursor: 3,
            playback: PlaybackState::default(),
            track_name: "Lofi Study".to_string(),
            geometry: geometry( 4, 2, 60, 14 ),
            theme: ThemeState { theme: Theme::Matrix, font_index: 0 },
            font_key: "font-[Fira_Code]",
            boot: BootState {
                step_index: 2,
                progress: 42,
                message: "Loading modules...".to_string(),
                is_booting: booting,
                glitch_active: false,
            },
        }
    }


    fn render_buffer( snapshot: &Snapshot ) -> Buffer {
        let mut terminal = Terminal::new( TestBackend::new( 80, 24 ) ).unwrap();
        terminal.draw( |frame| draw( frame, snapshot ) ).unwrap();
        terminal.backend().buffer().clone()
    }


    fn render( snapshot: &Snapshot ) -> String {
        render_buffer( snapshot ).content.iter().map( |cell| cell.symbol() ).collect()
    }


    fn symbol_at( buffer: &Buffer, x: i32, y: i32 ) -> String {
        buffer.content[ buffer.index_of( x as u16, y as u16 ) ].symbol().to_string()
    }


    /// Window pushed into the bottom-right corner of an 80x24 terminal.
    fn cornered( minimized: bool ) -> Snapshot {
        let mut window = WindowController::new( window_bounds( 80, 24 ) );
        if minimized {
            window.toggle_minimize();
        }
        window.drag( Position { x: 999, y: 999 } );

        let mut snap = snapshot( false );
        snap.geometry = window.state();
        snap
    }


    #[test]
    fn test_window_rect_clips() {
        let area = Rect::new( 0, 0, 40, 10 );
        let rect = window_rect( &geometry( 30, 5, 72, 20 ), area );
        assert_eq!( rect, Rect::new( 30, 5, 10, 5 ) );
    }


    #[test]
    fn test_window_bounds_exclude_status_bar() {
        assert_eq!( window_bounds( 80, 24 ), Size::new( 80, 23 ) );
        assert_eq!( window_bounds( 80, 0 ), Size::new( 80, 0 ) );
    }


    #[test]
    fn test_cornered_window_is_fully_painted() {
        for minimized in [ false, true ] {
            let snap = cornered( minimized );
            let GeometryState { position, size, .. } = snap.geometry;
            let bottom = position.y + size.height - 1;
            let right = position.x + size.width - 1;
            // Last row above the status bar.
            assert_eq!( bottom, 22 );

            let buffer = render_buffer( &snap );
            assert_eq!( symbol_at( &buffer, position.x, position.y ), "┌" );
            assert_eq!( symbol_at( &buffer, position.x, bottom ), "└" );
            assert_eq!( symbol_at( &buffer, right, bottom ), "┘" );
        }
    }


    #[test]
    fn test_title_buttons() {
        let g = geometry( 10, 0, 20, 10 );
        // Right border at column 29; buttons occupy 23..29.
        assert_eq!( title_button( &g, 23 ), Some( TitleButton::Minimize ) );
        assert_eq!( title_button( &g, 26 ), Some( TitleButton::Close ) );
        assert_eq!( title_button( &g, 29 ), None );
        assert_eq!( title_button( &g, 12 ), None );
    }


    #[test]
    fn test_glitch_text_keeps_length_and_spaces() {
        let text = "Loading modules...";
        let glitched = glitch_text( text, 3 );
        assert_eq!( glitched.chars().count(), text.chars().count() );
        assert_ne!( glitched, text );
        assert_eq!( glitched.find( ' ' ), text.find( ' ' ) );
        assert_eq!( glitch_text( text, 3 ), glitched );
    }


    #[test]
    fn test_draw_boot_screen() {
        let screen = render( &snapshot( true ) );
        assert!( screen.contains( "Loading modules..." ) );
        assert!( screen.contains( "42%" ) );
    }


    #[test]
    fn test_draw_window() {
        let screen = render( &snapshot( false ) );
        assert!( screen.contains( "termsite: Lofi Study" ) );
        assert!( screen.contains( "Available commands:" ) );
        assert!( screen.contains( "$ the" ) );
        assert!( screen.contains( "matrix | Fira Code" ) );
    }


    #[test]
    fn test_hidden_window_shows_backdrop() {
        let mut snap = snapshot( false );
        snap.geometry.visible = false;
        let screen = render( &snap );
        assert!( !screen.contains( "Available commands:" ) );
        assert!( screen.contains( "The Enthusiast" ) );
        assert!( screen.contains( "[Enter]Open terminal" ) );
    }
}
