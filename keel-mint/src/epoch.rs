use std::sync::{Arc, Mutex};

use keel_types::primitives::Epoch;

/// Receives epoch boundary confirmations.
pub trait EpochSubscriber: Send + Sync {
    fn epoch_confirmed(&self, epoch: Epoch);
}

/// Explicit observer list for epoch boundaries.
///
/// Components that gate features on an activation epoch register here at
/// construction; the epoch authority calls [`confirm`] once per boundary.
///
/// [`confirm`]: EpochNotifier::confirm
#[derive(Default)]
pub struct EpochNotifier {
    subscribers: Mutex<Vec<Arc<dyn EpochSubscriber>>>,
}

impl EpochNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for all future confirmations.
    pub fn register(&self, subscriber: Arc<dyn EpochSubscriber>) {
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(subscriber);
    }

    /// Notify every subscriber that `epoch` has been confirmed.
    pub fn confirm(&self, epoch: Epoch) {
        let subscribers = self
            .subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .clone();
        for subscriber in &subscribers {
            subscriber.epoch_confirmed(epoch);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .len()
    }
}
