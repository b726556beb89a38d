//! Boot sequence shown before the console becomes interactive.
//!
//! Two channels feed the boot state:
//! - a scripted timeline, fully deterministic, that walks the steps and
//!   finally ends the boot phase;
//! - a cosmetic glitch pulse fired at jittered intervals while booting.
//!
//! Both run as tokio tasks that only send events; `BootSequence::apply`
//! is the only place that mutates the state.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{ sleep, sleep_until, Instant };

use crate::session::Event;


/// One scripted boot step.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct BootStep {
    pub message: &'static str,
    pub duration: Duration,
}


const fn step( message: &'static str, millis: u64 ) -> BootStep {
    BootStep { message, duration: Duration::from_millis( millis ) }
}


/// The default boot script.
pub const BOOT_STEPS: &[BootStep] = &[
    step( "Initializing system...", 800 ),
    step( "Loading kernel modules...", 600 ),
    step( "Mounting privacy filesystem...", 700 ),
    step( "Starting encryption services...", 900 ),
    step( "Connecting to open source network...", 800 ),
    step( "Establishing secure session...", 600 ),
    step( "System ready.", 500 ),
];

/// Delay between the last step and the end of the boot phase.
pub const GRACE: Duration = Duration::from_millis( 500 );

/// Length of the glitch pulse that accompanies each step.
pub const STEP_GLITCH: Duration = Duration::from_millis( 150 );

const NOISE_MIN_INTERVAL: Duration = Duration::from_millis( 2000 );
const NOISE_MAX_INTERVAL: Duration = Duration::from_millis( 5000 );
const NOISE_MIN_PULSE: Duration = Duration::from_millis( 50 );
const NOISE_MAX_PULSE: Duration = Duration::from_millis( 200 );


/// Transition delivered to the boot state.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum BootEvent {
    /// Step `k` is entered.
    Step( usize ),
    /// The pulse started by the last step ends.
    PulseEnd,
    /// The boot phase is over.
    Finished,
    /// Cosmetic glitch noise toggled on or off.
    Noise( bool ),
}


/// Snapshot of the boot state.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct BootState {
    pub step_index: usize,
    pub progress: u8,
    pub message: String,
    pub is_booting: bool,
    pub glitch_active: bool,
}


/// Boot state machine.
#[derive( Debug )]
pub struct BootSequence {
    steps: &'static [BootStep],
    state: BootState,
    /// Highest step entered so far
    entered: Option<usize>,
}


impl BootSequence {
    /// Creates a sequence at step 0 with no progress.
    pub fn new( steps: &'static [BootStep] ) -> Self {
        Self {
            steps,
            state: BootState {
                step_index: 0,
                progress: 0,
                message: steps.first().map( |s| s.message ).unwrap_or_default().to_string(),
                is_booting: true,
                glitch_active: false,
            },
            entered: None,
        }
    }


    /// Creates a sequence that has already finished.
    pub fn finished( steps: &'static [BootStep] ) -> Self {
        let mut boot = Self::new( steps );
        boot.skip();
        boot
    }


    /// Applies one transition. Returns true if the state changed.
    ///
    /// Nothing is applied once booting has ended, and step events that
    /// would move backwards are dropped.
    pub fn apply( &mut self, event: BootEvent ) -> bool {
        if !self.state.is_booting {
            return false;
        }

        match event {
            BootEvent::Step( index ) => {
                if index >= self.steps.len() || self.entered.is_some_and( |e| index <= e ) {
                    return false;
                }
                self.entered = Some( index );
                self.state.step_index = index;
                self.state.message = self.steps[ index ].message.to_string();
                self.state.progress = progress_for( index, self.steps.len() );
                self.state.glitch_active = true;
                tracing::debug!( "Boot step {}: {}", index, self.state.message );
            }
            BootEvent::PulseEnd | BootEvent::Noise( false ) => {
                self.state.glitch_active = false;
            }
            BootEvent::Noise( true ) => {
                self.state.glitch_active = true;
            }
            BootEvent::Finished => self.finish(),
        }
        true
    }


    /// Ends the boot phase immediately.
    pub fn skip( &mut self ) {
        if self.state.is_booting {
            self.finish();
        }
    }


    fn finish( &mut self ) {
        self.state.is_booting = false;
        self.state.glitch_active = false;
        self.state.progress = 100;
        tracing::debug!( "Boot finished" );
    }


    /// Returns the scripted transitions sorted by offset from boot start.
    pub fn timeline( &self ) -> Vec<( Duration, BootEvent )> {
        let mut events = Vec::with_capacity( self.steps.len() * 2 + 1 );
        let mut elapsed = Duration::ZERO;

        for ( index, step ) in self.steps.iter().enumerate() {
            elapsed += step.duration;
            events.push(( elapsed, BootEvent::Step( index ) ));
            events.push(( elapsed + STEP_GLITCH, BootEvent::PulseEnd ));
        }
        events.push(( elapsed + GRACE, BootEvent::Finished ));

        // Stable, so a step keeps its place ahead of a pulse end at the same instant.
        events.sort_by_key( |( offset, _ )| *offset );
        events
    }


    pub fn is_booting( &self ) -> bool {
        self.state.is_booting
    }


    /// Returns a copy of the current state.
    pub fn state( &self ) -> BootState {
        self.state.clone()
    }
}


fn progress_for( index: usize, count: usize ) -> u8 {
    ( ( index + 1 ) * 100 / count ).min( 100 ) as u8
}


/// Replays a timeline onto the event queue.
///
/// Offsets are measured from the moment the task starts, so a slow
/// consumer never stretches the total boot time.
pub async fn run_timeline( tx: UnboundedSender<Event>, timeline: Vec<( Duration, BootEvent )> ) {
    let start = Instant::now();

    for ( offset, event ) in timeline {
        sleep_until( start + offset ).await;
        if tx.send( Event::Boot( event ) ).is_err() {
            break;
        }
    }
}


/// Emits glitch noise at random intervals until the queue closes or the
/// task is aborted.
pub async fn run_glitch_noise( tx: UnboundedSender<Event> ) {
    loop {
        sleep( jitter( NOISE_MIN_INTERVAL, NOISE_MAX_INTERVAL ) ).await;
        if tx.send( Event::Boot( BootEvent::Noise( true ) ) ).is_err() {
            break;
        }

        sleep( jitter( NOISE_MIN_PULSE, NOISE_MAX_PULSE ) ).await;
        if tx.send( Event::Boot( BootEvent::Noise( false ) ) ).is_err() {
            break;
        }
    }
}


fn jitter( min: Duration, max: Duration ) -> Duration {
    min + ( max - min ).mul_f64( rand::random::<f64>() )
}


#[cfg( test )]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::tasks::TaskSet;


    #[test]
    fn test_initial_state() {
        let boot = BootSequence::new( BOOT_STEPS );
        let state = boot.state();
        assert_eq!( state.step_index, 0 );
        assert_eq!( state.progress, 0 );
        assert_eq!( state.message, "Initializing system..." );
        assert!( state.is_booting );
    }


    #[test]
    fn test_timeline_shape() {
        let boot = BootSequence::new( BOOT_STEPS );
        let timeline = boot.timeline();

        assert_eq!( timeline.len(), BOOT_STEPS.len() * 2 + 1 );
        assert_eq!( timeline[ 0 ], ( Duration::from_millis( 800 ), BootEvent::Step( 0 ) ) );
        assert_eq!( timeline[ 1 ], ( Duration::from_millis( 950 ), BootEvent::PulseEnd ) );

        let total: Duration = BOOT_STEPS.iter().map( |s| s.duration ).sum();
        assert_eq!( timeline.last(), Some( &( total + GRACE, BootEvent::Finished ) ) );
        assert!( timeline.windows( 2 ).all( |w| w[ 0 ].0 <= w[ 1 ].0 ) );
    }


    #[test]
    fn test_progress_monotonic_and_terminal() {
        let mut boot = BootSequence::new( BOOT_STEPS );
        let mut last_progress = 0;
        let mut hundreds = 0;
        let mut finishes = 0;

        for ( _, event ) in boot.timeline() {
            let was_booting = boot.is_booting();
            boot.apply( event );
            let state = boot.state();

            assert!( state.progress >= last_progress );
            if state.progress == 100 && last_progress < 100 {
                hundreds += 1;
            }
            if was_booting && !state.is_booting {
                finishes += 1;
            }
            last_progress = state.progress;
        }

        assert_eq!( hundreds, 1 );
        assert_eq!( finishes, 1 );
        assert_eq!( boot.state().message, "System ready." );

        assert!( !boot.apply( BootEvent::Step( 0 ) ) );
        assert!( !boot.apply( BootEvent::Noise( true ) ) );
        assert!( !boot.state().is_booting );
        assert!( !boot.state().glitch_active );
    }


    #[test]
    fn test_step_pulses_glitch() {
        let mut boot = BootSequence::new( BOOT_STEPS );
        boot.apply( BootEvent::Step( 0 ) );
        assert!( boot.state().glitch_active );
        boot.apply( BootEvent::PulseEnd );
        assert!( !boot.state().glitch_active );
    }


    #[test]
    fn test_out_of_order_step_ignored() {
        let mut boot = BootSequence::new( BOOT_STEPS );
        boot.apply( BootEvent::Step( 2 ) );
        assert!( !boot.apply( BootEvent::Step( 1 ) ) );
        assert!( !boot.apply( BootEvent::Step( 99 ) ) );
        assert_eq!( boot.state().step_index, 2 );
    }


    #[test]
    fn test_skip() {
        let mut boot = BootSequence::new( BOOT_STEPS );
        boot.skip();
        assert!( !boot.is_booting() );
        assert_eq!( boot.state().progress, 100 );
        assert!( !BootSequence::finished( BOOT_STEPS ).is_booting() );
    }


    #[tokio::test( start_paused = true )]
    async fn test_run_timeline_delivers_in_order() {
        let boot = BootSequence::new( BOOT_STEPS );
        let expected: Vec<_> = boot.timeline().into_iter().map( |( _, e )| Event::Boot( e ) ).collect();

        let ( tx, mut rx ) = unbounded_channel();
        let mut tasks = TaskSet::new();
        tasks.spawn( run_timeline( tx, boot.timeline() ) );

        let mut received = Vec::new();
        while let Some( event ) = rx.recv().await {
            received.push( event );
        }
        assert_eq!( received, expected );
    }


    #[tokio::test( start_paused = true )]
    async fn test_abort_stops_timeline() {
        let boot = BootSequence::new( BOOT_STEPS );
        let ( tx, mut rx ) = unbounded_channel();
        let mut tasks = TaskSet::new();
        tasks.spawn( run_timeline( tx.clone(), boot.timeline() ) );
        tasks.spawn( run_glitch_noise( tx ) );

        assert_eq!( rx.recv().await, Some( Event::Boot( BootEvent::Step( 0 ) ) ) );
        tasks.abort_all();
        assert!( tasks.is_empty() );
        assert_eq!( rx.recv().await, None );
    }
}
