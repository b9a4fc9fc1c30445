use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use keel_types::primitives::ShardId;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::BeaconError;

/// Point-in-time copy of a peer's liveness bookkeeping, for reporting
/// collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessSnapshot {
    pub is_active: bool,
    pub total_up_time: Duration,
    pub total_down_time: Duration,
    pub max_inactive_gap: Duration,
    pub last_message: SystemTime,
    pub received_shard: ShardId,
    pub computed_shard: ShardId,
    pub version: String,
    pub display_name: String,
    pub is_validator: bool,
}

struct LivenessState {
    last_message: SystemTime,
    is_active: bool,
    max_inactive_gap: Duration,
    total_up_time: Duration,
    total_down_time: Duration,
    last_settlement: SystemTime,
    received_shard: ShardId,
    computed_shard: ShardId,
    version: String,
    display_name: String,
}

/// Per-peer liveness bookkeeping.
///
/// Two entry points mutate a record: [`on_message_received`] when the peer
/// proves liveness, and [`reevaluate`] when the periodic sweep checks for
/// silence. Both run under the same exclusive lock, so every elapsed
/// interval is settled exactly once as up-time or down-time.
///
/// [`on_message_received`]: PeerLivenessRecord::on_message_received
/// [`reevaluate`]: PeerLivenessRecord::reevaluate
pub struct PeerLivenessRecord {
    max_unresponsive: Duration,
    genesis: SystemTime,
    is_validator: bool,
    clock: Arc<dyn Clock>,
    state: Mutex<LivenessState>,
}

impl PeerLivenessRecord {
    /// Create a record for a newly seen peer.
    ///
    /// `max_unresponsive` is the silence threshold after which a peer is
    /// considered inactive; zero is rejected. No up/down time is ever
    /// accounted before `genesis`.
    pub fn new(
        max_unresponsive: Duration,
        is_validator: bool,
        genesis: SystemTime,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BeaconError> {
        if max_unresponsive.is_zero() {
            return Err(BeaconError::InvalidThreshold);
        }

        let now = clock.now();
        Ok(Self {
            max_unresponsive,
            genesis,
            is_validator,
            clock,
            state: Mutex::new(LivenessState {
                last_message: genesis,
                is_active: false,
                max_inactive_gap: Duration::ZERO,
                total_up_time: Duration::ZERO,
                total_down_time: Duration::ZERO,
                last_settlement: now,
                received_shard: 0,
                computed_shard: 0,
                version: String::new(),
                display_name: String::new(),
            }),
        })
    }

    /// Process one inbound message from the peer.
    ///
    /// The message proves the peer is alive right now, so `is_active` is
    /// set unconditionally. Whether the interval since the previous message
    /// counts as up-time depends on that previous window still being
    /// within the unresponsive threshold.
    pub fn on_message_received(
        &self,
        computed_shard: ShardId,
        received_shard: ShardId,
        version: &str,
        display_name: &str,
    ) {
        let now = self.clock.now();
        let mut st = self.state.lock().expect("liveness state lock poisoned");

        let valid = self.within_threshold(&st, now);
        let previously_active = st.is_active && valid;
        st.is_active = true;
        self.update_times(&mut st, now, previously_active);

        st.computed_shard = computed_shard;
        st.received_shard = received_shard;
        st.last_message = now;
        st.version = version.to_string();
        st.display_name = display_name.to_string();
    }

    /// Re-check activity against elapsed silence, independent of message
    /// arrival. A peer that has been silent for longer than the threshold
    /// is downgraded to inactive here, and the elapsed interval is settled.
    pub fn reevaluate(&self, now: SystemTime) {
        let mut st = self.state.lock().expect("liveness state lock poisoned");

        let valid = self.within_threshold(&st, now);
        st.is_active = st.is_active && valid;
        let previously_active = st.is_active;
        self.update_times(&mut st, now, previously_active);
    }

    /// Copy all fields out for reporting.
    pub fn snapshot(&self) -> LivenessSnapshot {
        let st = self.state.lock().expect("liveness state lock poisoned");
        LivenessSnapshot {
            is_active: st.is_active,
            total_up_time: st.total_up_time,
            total_down_time: st.total_down_time,
            max_inactive_gap: st.max_inactive_gap,
            last_message: st.last_message,
            received_shard: st.received_shard,
            computed_shard: st.computed_shard,
            version: st.version.clone(),
            display_name: st.display_name.clone(),
            is_validator: self.is_validator,
        }
    }

    /// Whether the peer is currently considered active.
    pub fn is_active(&self) -> bool {
        self.state
            .lock()
            .expect("liveness state lock poisoned")
            .is_active
    }

    /// Cumulative time the peer has been considered active.
    pub fn total_up_time(&self) -> Duration {
        self.state
            .lock()
            .expect("liveness state lock poisoned")
            .total_up_time
    }

    /// Cumulative time the peer has been considered inactive.
    pub fn total_down_time(&self) -> Duration {
        self.state
            .lock()
            .expect("liveness state lock poisoned")
            .total_down_time
    }

    /// Largest silence gap ever observed. Monotonic non-decreasing.
    pub fn max_inactive_gap(&self) -> Duration {
        self.state
            .lock()
            .expect("liveness state lock poisoned")
            .max_inactive_gap
    }

    pub fn is_validator(&self) -> bool {
        self.is_validator
    }

    pub fn max_unresponsive(&self) -> Duration {
        self.max_unresponsive
    }

    pub fn genesis(&self) -> SystemTime {
        self.genesis
    }

    fn within_threshold(&self, st: &LivenessState, now: SystemTime) -> bool {
        elapsed_since(now, st.last_message) <= self.max_unresponsive
    }

    /// Settle bookkeeping for the interval ending at `now`. Skipped
    /// entirely while the clock is before genesis.
    fn update_times(&self, st: &mut LivenessState, now: SystemTime, previously_active: bool) {
        if now < self.genesis {
            return;
        }
        self.update_max_inactive_gap(st, now);
        self.settle_up_down(st, now, previously_active);
    }

    fn update_max_inactive_gap(&self, st: &mut LivenessState, now: SystemTime) {
        let gap = elapsed_since(now, st.last_message);
        if gap > st.max_inactive_gap && now > self.genesis {
            st.max_inactive_gap = gap;
        }
    }

    /// Credit the interval `[last_settlement, now)` to up-time only when
    /// the peer was active on both sides of it; any transition edge counts
    /// the whole interval as down-time.
    fn settle_up_down(&self, st: &mut LivenessState, now: SystemTime, previously_active: bool) {
        if st.last_settlement < self.genesis {
            st.last_settlement = self.genesis;
        }
        let elapsed = elapsed_since(now, st.last_settlement);

        if previously_active && st.is_active {
            st.total_up_time += elapsed;
        } else {
            st.total_down_time += elapsed;
        }

        st.last_settlement = now;
    }
}

/// Elapsed time from `earlier` to `now`, clamped to zero on regression.
fn elapsed_since(now: SystemTime, earlier: SystemTime) -> Duration {
    now.duration_since(earlier).unwrap_or(Duration::ZERO)
}
