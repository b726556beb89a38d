//! Cancellable background tasks.

use std::future::Future;

use tokio::task::JoinHandle;


/// Set of spawned tasks that are aborted together.
///
/// Dropping the set aborts every task still running, so no background
/// timer outlives the session that owns it.
#[derive( Debug, Default )]
pub struct TaskSet {
    handles: Vec<JoinHandle<()>>,
}


impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }


    /// Spawns a task on the current tokio runtime and keeps its handle.
    pub fn spawn<F>( &mut self, future: F )
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.retain( |h| !h.is_finished() );
        self.handles.push( tokio::spawn( future ) );
    }


    /// Aborts every task in the set.
    pub fn abort_all( &mut self ) {
        for handle in self.handles.drain( .. ) {
            handle.abort();
        }
    }


    /// Returns true if no task is tracked.
    pub fn is_empty( &self ) -> bool {
        self.handles.is_empty()
    }
}


impl Drop for TaskSet {
    fn drop( &mut self ) {
        self.abort_all();
    }
}


#[cfg( test )]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;


    #[tokio::test( start_paused = true )]
    async fn test_drop_aborts() {
        let ( tx, rx ) = oneshot::channel::<()>();
        let mut tasks = TaskSet::new();
        tasks.spawn( async move {
            tokio::time::sleep( Duration::from_secs( 60 ) ).await;
            let _ = tx.send(());
        });

        drop( tasks );
        assert!( rx.await.is_err() );
    }
}
