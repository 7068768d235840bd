//! Bounded multi-producer queue feeding the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::record::LogRecord;
use crate::{Error, Result};

/// What a producer does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait until the dispatcher makes room.
    #[default]
    Block,
    /// Evict the oldest queued record to make room.
    DropOldest,
}

/// Outcome of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// The record was queued after evicting the oldest one.
    DisplacedOldest,
}

// Eviction can lose races against other producers refilling the slot.
const EVICTION_ATTEMPTS: usize = 4;

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: Sender<LogRecord>,
    // Only DropOldest keeps a receiver, to pop from the front. Shared by
    // clones and released by `close`.
    evictor: Arc<Mutex<Option<Receiver<LogRecord>>>>,
    policy: OverflowPolicy,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

/// Create a queue holding at most `capacity` records.
pub fn bounded(capacity: usize, policy: OverflowPolicy) -> (QueueProducer, Receiver<LogRecord>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let producer = QueueProducer {
        tx,
        evictor: Arc::new(Mutex::new(match policy {
            OverflowPolicy::Block => None,
            OverflowPolicy::DropOldest => Some(rx.clone()),
        })),
        policy,
        capacity,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (producer, rx)
}

impl QueueProducer {
    /// Push a record according to the overflow policy.
    pub fn push(&self, record: LogRecord) -> Result<Admission> {
        match self.policy {
            OverflowPolicy::Block => {
                self.tx.send(record).map_err(|_| Error::Closed)?;
                Ok(Admission::Queued)
            }
            OverflowPolicy::DropOldest => {
                let evictor = self
                    .evictor
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                match evictor.as_ref() {
                    Some(evictor) => self.push_evicting(evictor, record),
                    None => self.try_push(record),
                }
            }
        }
    }

    /// Release the eviction handle.
    ///
    /// Afterwards a `DropOldest` producer no longer evicts: a full queue is
    /// reported as overflow and a departed consumer as [`Error::Closed`].
    pub fn close(&self) {
        self.evictor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    fn try_push(&self, record: LogRecord) -> Result<Admission> {
        match self.tx.try_send(record) {
            Ok(()) => Ok(Admission::Queued),
            Err(TrySendError::Full(_)) => Err(Error::QueueOverflow {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(Error::Closed),
        }
    }

    fn push_evicting(
        &self,
        evictor: &Receiver<LogRecord>,
        mut record: LogRecord,
    ) -> Result<Admission> {
        let mut admission = Admission::Queued;
        for _ in 0..EVICTION_ATTEMPTS {
            match self.tx.try_send(record) {
                Ok(()) => return Ok(admission),
                Err(TrySendError::Disconnected(_)) => return Err(Error::Closed),
                Err(TrySendError::Full(rejected)) => {
                    record = rejected;
                    if evictor.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        admission = Admission::DisplacedOldest;
                    }
                }
            }
        }
        Err(Error::QueueOverflow {
            capacity: self.capacity,
        })
    }

    /// Records evicted so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Caller;
    use crate::level::Level;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn record(text: &str) -> LogRecord {
        LogRecord::new(
            OffsetDateTime::UNIX_EPOCH,
            Level::Info,
            Caller::here(),
            format_args!("{}", text),
        )
    }

    fn texts(rx: &Receiver<LogRecord>) -> Vec<String> {
        rx.try_iter()
            .map(|r| r.text.rsplit(": ").next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_drop_oldest_evicts_front() {
        let (producer, rx) = bounded(2, OverflowPolicy::DropOldest);

        assert_eq!(producer.push(record("a")).unwrap(), Admission::Queued);
        assert_eq!(producer.push(record("b")).unwrap(), Admission::Queued);
        assert_eq!(
            producer.push(record("c")).unwrap(),
            Admission::DisplacedOldest
        );

        assert_eq!(producer.dropped(), 1);
        assert_eq!(texts(&rx), vec!["b", "c"]);
    }

    #[test]
    fn test_block_waits_for_room() {
        let (producer, rx) = bounded(2, OverflowPolicy::Block);

        let handles: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|text| {
                let producer = producer.clone();
                std::thread::spawn(move || producer.push(record(text)).unwrap())
            })
            .collect();

        // Two fit, the third producer stays blocked until something is taken.
        while producer.len() < 2 {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(producer.len(), 2);

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Admission::Queued);
        }

        assert_eq!(received.len(), 3);
        assert_eq!(producer.dropped(), 0);
    }

    #[test]
    fn test_push_after_consumer_gone_fails() {
        let (producer, rx) = bounded(1, OverflowPolicy::Block);
        drop(rx);
        assert!(matches!(producer.push(record("a")), Err(Error::Closed)));
    }

    #[test]
    fn test_drop_oldest_reports_closed_after_close() {
        let (producer, rx) = bounded(2, OverflowPolicy::DropOldest);
        let clone = producer.clone();
        drop(rx);

        // The eviction handle keeps the channel open until released.
        assert_eq!(producer.push(record("a")).unwrap(), Admission::Queued);
        clone.close();
        assert!(matches!(producer.push(record("b")), Err(Error::Closed)));
    }

    #[test]
    fn test_drop_oldest_overflows_when_nothing_can_be_evicted() {
        // A zero-capacity channel never holds a record to evict.
        let (producer, _rx) = bounded(0, OverflowPolicy::DropOldest);

        let err = producer.push(record("a")).unwrap_err();
        assert!(matches!(err, Error::QueueOverflow { capacity: 0 }));
        assert_eq!(producer.dropped(), 0);
    }

    #[test]
    fn test_closed_drop_oldest_overflows_when_full() {
        let (producer, rx) = bounded(1, OverflowPolicy::DropOldest);
        producer.push(record("a")).unwrap();
        producer.close();

        assert!(matches!(
            producer.push(record("b")),
            Err(Error::QueueOverflow { capacity: 1 })
        ));
        assert_eq!(texts(&rx), vec!["a"]);
    }
}
