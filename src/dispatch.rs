//! The single consumer that drains the queue into the level files.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, select};

use crate::record::LogRecord;
use crate::router::LevelRouter;

/// Drains the message queue in order and routes each record to its level.
pub struct Dispatcher {
    queue: Receiver<LogRecord>,
    shutdown: Receiver<()>,
    router: Arc<LevelRouter>,
}

impl Dispatcher {
    pub fn new(
        queue: Receiver<LogRecord>,
        shutdown: Receiver<()>,
        router: Arc<LevelRouter>,
    ) -> Self {
        Self {
            queue,
            shutdown,
            router,
        }
    }

    /// Run on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("levelsplit-dispatch".to_string())
            .spawn(move || self.run())
    }

    /// Route records until shutdown is signaled or every producer is gone.
    ///
    /// On shutdown, records already queued are still written.
    pub fn run(self) {
        loop {
            select! {
                recv(self.queue) -> msg => match msg {
                    Ok(record) => self.dispatch(&record),
                    Err(_) => break,
                },
                recv(self.shutdown) -> _ => {
                    let drained = self.drain();
                    tracing::debug!(drained, "dispatcher shutting down");
                    break;
                }
            }
        }
        if let Err(e) = self.router.flush_all() {
            tracing::warn!(error = %e, "failed to flush level files");
        }
    }

    fn drain(&self) -> usize {
        let mut count = 0;
        while let Ok(record) = self.queue.try_recv() {
            self.dispatch(&record);
            count += 1;
        }
        count
    }

    fn dispatch(&self, record: &LogRecord) {
        match self.router.route(record) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(level = %record.level, "dropping record without a level file")
            }
            Err(e) => {
                tracing::warn!(level = %record.level, error = %e, "failed to write log record")
            }
        }
    }
}
