//! Opens destination URLs with the platform's default handler.

use std::io;
use std::process::{ Command, ExitStatus, Stdio };
use std::thread;

use termsite_core::Navigator;


/// Navigator backed by the system URL opener.
#[derive( Debug, Default )]
pub struct SystemNavigator;


impl SystemNavigator {
    fn opener( url: &str ) -> Command {
        if cfg!( target_os = "windows" ) {
            let mut cmd = Command::new( "cmd" );
            cmd.args([ "/C", "start", "", url ]);
            cmd
        } else if cfg!( target_os = "macos" ) {
            let mut cmd = Command::new( "open" );
            cmd.arg( url );
            cmd
        } else {
            let mut cmd = Command::new( "xdg-open" );
            cmd.arg( url );
            cmd
        }
    }
}


/// Spawns `cmd` with null stdio and waits for it on a detached thread, so
/// no zombie is left behind.
fn spawn_reaped( mut cmd: Command ) -> io::Result<thread::JoinHandle<io::Result<ExitStatus>>> {
    // The opener must not write into the alternate screen.
    let mut child = cmd
        .stdin( Stdio::null() )
        .stdout( Stdio::null() )
        .stderr( Stdio::null() )
        .spawn()?;

    let pid = child.id();
    tracing::debug!( "Spawned opener pid {}", pid );

    Ok( thread::spawn( move || {
        let status = child.wait();
        match &status {
            Ok( status ) if !status.success() => tracing::warn!( "Opener pid {} exited with {}", pid, status ),
            Ok( _ ) => {}
            Err( e ) => tracing::warn!( "Failed to wait for opener pid {}: {}", pid, e ),
        }
        status
    }))
}


impl Navigator for SystemNavigator {
    fn open( &mut self, url: &str ) {
        match spawn_reaped( Self::opener( url ) ) {
            Ok( _ ) => tracing::info!( "Opened {}", url ),
            Err( e ) => tracing::warn!( "Failed to open {}: {}", url, e ),
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_opener_passes_url() {
        let cmd = SystemNavigator::opener( "https://example.com" );
        let args: Vec<_> = cmd.get_args().map( |a| a.to_string_lossy().into_owned() ).collect();
        assert_eq!( args.last().map( String::as_str ), Some( "https://example.com" ) );
    }


    #[cfg( unix )]
    #[test]
    fn test_opener_is_reaped() {
        let reaper = spawn_reaped( Command::new( "true" ) ).unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert!( status.success() );
    }


    #[test]
    fn test_missing_opener_is_an_error() {
        assert!( spawn_reaped( Command::new( "/definitely/not/an/opener" ) ).is_err() );
    }
}
