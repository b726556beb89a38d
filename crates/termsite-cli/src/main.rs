//! termsite - interactive terminal overlay with a command console

mod cli;
mod keys;
mod navigator;
mod settings;
mod ui;

use std::fs::{ self, OpenOptions };
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::Parser;
use crossterm::{
    event::{ self, KeyEvent, KeyEventKind, MouseButton, MouseEventKind },
    terminal::{ disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen },
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };

use cli::Args;
use keys::{ Action, KeyContext };
use navigator::SystemNavigator;
use settings::Settings;
use ui::TitleButton;

use termsite_core::boot::BOOT_STEPS;
use termsite_core::{
    event_channel, BootSequence, DeviceAudio, Event, Interpreter, PlaybackController, Position, Session,
    Theme, ThemeCycler, WindowController,
};


/// How often the screen is repainted when nothing else happens.
const FRAME_INTERVAL: Duration = Duration::from_millis( 50 );


type AppSession = Session<DeviceAudio, SystemNavigator>;


/// Terminal-side state layered over the session.
struct App {
    session: AppSession,

    /// Offset of the mouse from the window origin while dragging the title bar
    drag_anchor: Option<( i32, i32 )>,

    should_quit: bool,
}


impl App {
    fn new( session: AppSession ) -> Self {
        Self {
            session,
            drag_anchor: None,
            should_quit: false,
        }
    }


    fn key_context( &self ) -> KeyContext {
        KeyContext {
            booting: self.session.is_booting(),
            visible: self.session.window().state().visible,
            playing: self.session.interpreter().playback().is_playing(),
        }
    }


    fn handle_terminal( &mut self, event: event::Event ) {
        match event {
            event::Event::Key( key ) if key.kind == KeyEventKind::Press => self.handle_key( key ),
            event::Event::Mouse( mouse ) => self.handle_mouse( mouse.column, mouse.row, mouse.kind ),
            event::Event::Resize( width, height ) => {
                self.session.handle( Event::Resize( ui::window_bounds( width, height ) ) );
            }
            _ => {}
        }
    }


    fn handle_key( &mut self, key: KeyEvent ) {
        match keys::map_key( key, self.key_context() ) {
            Some( Action::Quit ) => self.should_quit = true,
            Some( Action::Session( event ) ) => self.session.handle( event ),
            None => {}
        }
    }


    fn handle_mouse( &mut self, column: u16, row: u16, kind: MouseEventKind ) {
        if self.session.is_booting() {
            return;
        }

        let ( x, y ) = ( column as i32, row as i32 );
        let geometry = self.session.window().state();

        match kind {
            MouseEventKind::Down( MouseButton::Left ) => {
                if !geometry.visible {
                    self.session.handle( Event::Open );
                    return;
                }
                if !self.session.window().title_bar_contains( x, y ) {
                    return;
                }

                match ui::title_button( &geometry, x ) {
                    Some( TitleButton::Minimize ) => self.session.handle( Event::ToggleMinimize ),
                    Some( TitleButton::Close ) => self.session.handle( Event::Close ),
                    None => self.drag_anchor = Some(( x - geometry.position.x, y - geometry.position.y )),
                }
            }
            MouseEventKind::Drag( MouseButton::Left ) => {
                if let Some(( ax, ay )) = self.drag_anchor {
                    self.session.handle( Event::Drag( Position { x: x - ax, y: y - ay } ) );
                }
            }
            MouseEventKind::Up( MouseButton::Left ) => self.drag_anchor = None,
            _ => {}
        }
    }
}


/// Returns the log file location.
fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else( std::env::temp_dir )
        .join( "termsite" )
        .join( "termsite.log" )
}


/// Logs to a file; the terminal belongs to the UI.
fn init_logging( verbose: u8 ) -> Result<()> {
    let path = log_path();
    if let Some( parent ) = path.parent() {
        fs::create_dir_all( parent )
            .with_context( || format!( "Failed to create log directory {:?}", parent ) )?;
    }

    let file = OpenOptions::new()
        .create( true )
        .append( true )
        .open( &path )
        .with_context( || format!( "Failed to open log file {:?}", path ) )?;

    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level( level )
        .with_writer( file )
        .with_ansi( false )
        .init();

    Ok(())
}


/// Picks the starting theme: command line first, then settings.
fn initial_theme( args: &Args, settings: &Settings ) -> Theme {
    let key = args.theme.as_deref().unwrap_or( &settings.theme );
    key.parse().unwrap_or_else( |e| {
        tracing::warn!( "{}; using dark", e );
        Theme::Dark
    })
}


/// Reads terminal events on a plain thread and forwards them.
fn spawn_input_thread( tx: UnboundedSender<event::Event>, stop: Arc<AtomicBool> ) -> thread::JoinHandle<()> {
    thread::spawn( move || {
        while !stop.load( Ordering::Relaxed ) {
            match event::poll( Duration::from_millis( 100 ) ) {
                Ok( true ) => match event::read() {
                    Ok( ev ) => {
                        if tx.send( ev ).is_err() {
                            break;
                        }
                    }
                    Err( e ) => {
                        tracing::error!( "Failed to read terminal event: {}", e );
                        break;
                    }
                },
                Ok( false ) => {}
                Err( e ) => {
                    tracing::error!( "Failed to poll terminal: {}", e );
                    break;
                }
            }
        }
    })
}


/// Runs until the user quits.
///
/// This loop is the only consumer of session events: background events and
/// terminal input are both applied here, one at a time.
async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: UnboundedReceiver<Event>,
    mut input: UnboundedReceiver<event::Event>,
) -> Result<()> {
    let mut frame_timer = tokio::time::interval( FRAME_INTERVAL );

    loop {
        let snapshot = app.session.snapshot();
        terminal.draw( |frame| ui::draw( frame, &snapshot ) )?;

        tokio::select! {
            Some( event ) = events.recv() => app.session.handle( event ),
            Some( event ) = input.recv() => app.handle_terminal( event ),
            _ = frame_timer.tick() => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}


#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging( args.verbose )?;

    let settings = Settings::load( args.config.as_deref() );
    let theme = initial_theme( &args, &settings );
    let skip_boot = args.skip_boot || settings.skip_boot;
    let glitch = settings.glitch && !args.no_glitch;

    tracing::info!( "Starting termsite {}", env!( "CARGO_PKG_VERSION" ) );

    let ( tx, rx ) = event_channel();

    let audio = DeviceAudio::new( tx.clone() );
    let playback = PlaybackController::new( audio, settings.tracks() )?;
    let interpreter = Interpreter::new( ThemeCycler::new( theme ), playback, SystemNavigator );

    let ( width, height ) = crossterm::terminal::size()?;
    let window = WindowController::new( ui::window_bounds( width, height ) );

    let boot = if skip_boot {
        BootSequence::finished( BOOT_STEPS )
    } else {
        BootSequence::new( BOOT_STEPS )
    };

    let mut app = App::new( Session::new( interpreter, window, boot, tx ) );

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute( EnterAlternateScreen )?;
    io::stdout().execute( crossterm::event::EnableMouseCapture )?;

    let mut terminal = Terminal::new( CrosstermBackend::new( io::stdout() ) )?;

    let ( input_tx, input_rx ) = mpsc::unbounded_channel();
    let stop = Arc::new( AtomicBool::new( false ) );
    let input_thread = spawn_input_thread( input_tx, Arc::clone( &stop ) );

    app.session.start_boot( glitch );
    let result = run( &mut terminal, &mut app, rx, input_rx ).await;

    app.session.shutdown();
    stop.store( true, Ordering::Relaxed );
    let _ = input_thread.join();

    // Cleanup
    io::stdout().execute( crossterm::event::DisableMouseCapture )?;
    disable_raw_mode()?;
    io::stdout().execute( LeaveAlternateScreen )?;

    if let Err( ref e ) = result {
        tracing::error!( "{:#}", e );
    }
    result
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_initial_theme_prefers_command_line() {
        let args = Args::try_parse_from([ "termsite", "--theme", "amber" ]).unwrap();
        let settings = Settings::from_json( r#"{ "theme": "light" }"# ).unwrap();
        assert_eq!( initial_theme( &args, &settings ), Theme::Amber );
    }


    #[test]
    fn test_initial_theme_falls_back_to_dark() {
        let args = Args::try_parse_from([ "termsite" ]).unwrap();
        let settings = Settings::from_json( r#"{ "theme": "neon" }"# ).unwrap();
        assert_eq!( initial_theme( &args, &settings ), Theme::Dark );
    }
}
