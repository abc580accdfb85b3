//! Single-writer / single-reader handoff between a GPS transport thread and
//! the tick loop. The transport never blocks: when the tick loop falls behind
//! the newest fixes are dropped, mirroring how the sensor loops shed samples.
use crate::types::GeoFix;
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct FixSender {
    tx: Sender<GeoFix>,
    dropped: Arc<AtomicU64>,
    sent: u64,
}

pub struct FixReceiver {
    rx: Receiver<GeoFix>,
    dropped: Arc<AtomicU64>,
}

/// Bounded channel for raw fixes (capacity is raised to at least 1)
pub fn fix_channel(capacity: usize) -> (FixSender, FixReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FixSender {
            tx,
            dropped: dropped.clone(),
            sent: 0,
        },
        FixReceiver { rx, dropped },
    )
}

impl FixSender {
    /// Queue a fix without blocking; false if it was dropped
    pub fn offer(&mut self, fix: GeoFix) -> bool {
        match self.tx.try_send(fix) {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped % 100 == 1 {
                    log::warn!("[handoff] tick loop behind, {} fixes dropped", dropped);
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("[handoff] receiver closed after {} fixes", self.sent);
                false
            }
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl FixReceiver {
    /// All pending fixes in arrival order
    pub fn drain(&self) -> Vec<GeoFix> {
        self.rx.try_iter().collect()
    }

    /// Newest pending fix, discarding older ones
    pub fn latest(&self) -> Option<GeoFix> {
        self.rx.try_iter().last()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
