use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use keel_types::primitives::{PublicKey, ShardId};

use crate::clock::Clock;
use crate::error::BeaconError;
use crate::record::{LivenessSnapshot, PeerLivenessRecord};

/// Configuration shared by every record the registry creates.
pub struct RegistryConfig {
    /// Silence threshold after which a peer is considered inactive.
    pub max_unresponsive: Duration,
    /// No up/down time is accounted before this instant.
    pub genesis: SystemTime,
    /// Public keys of the current validator set.
    pub validators: HashSet<PublicKey>,
}

/// Keyed collection of peer liveness records.
///
/// Records are created on first contact and kept for the lifetime of the
/// process; pruning is a policy of the owning component.
pub struct LivenessRegistry {
    records: RwLock<HashMap<PublicKey, Arc<PeerLivenessRecord>>>,
    max_unresponsive: Duration,
    genesis: SystemTime,
    validators: HashSet<PublicKey>,
    clock: Arc<dyn Clock>,
}

impl LivenessRegistry {
    /// Create an empty registry. Rejects a zero unresponsive threshold up
    /// front so record creation cannot fail later.
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self, BeaconError> {
        if config.max_unresponsive.is_zero() {
            return Err(BeaconError::InvalidThreshold);
        }

        Ok(Self {
            records: RwLock::new(HashMap::new()),
            max_unresponsive: config.max_unresponsive,
            genesis: config.genesis,
            validators: config.validators,
            clock,
        })
    }

    /// Ingest one inbound peer message, creating the record on first
    /// contact.
    pub fn on_message(
        &self,
        pubkey: PublicKey,
        computed_shard: ShardId,
        received_shard: ShardId,
        version: &str,
        display_name: &str,
    ) -> Result<(), BeaconError> {
        let record = self.get_or_create(pubkey)?;
        record.on_message_received(computed_shard, received_shard, version, display_name);
        Ok(())
    }

    /// Re-evaluate every record against `now`. Silent peers transition to
    /// inactive here without waiting for a new message.
    pub fn reevaluate_all(&self, now: SystemTime) {
        let records: Vec<Arc<PeerLivenessRecord>> = self
            .records
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect();

        for record in records {
            record.reevaluate(now);
        }
    }

    /// Snapshot of a single peer, if known.
    pub fn snapshot(&self, pubkey: &PublicKey) -> Option<LivenessSnapshot> {
        self.records
            .read()
            .expect("registry lock poisoned")
            .get(pubkey)
            .map(|r| r.snapshot())
    }

    /// Snapshots of every tracked peer.
    pub fn snapshots(&self) -> Vec<(PublicKey, LivenessSnapshot)> {
        self.records
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|(pk, r)| (*pk, r.snapshot()))
            .collect()
    }

    /// Number of peers currently tracked.
    pub fn peer_count(&self) -> usize {
        self.records.read().expect("registry lock poisoned").len()
    }

    /// Spawn a tokio task that sweeps every record on a fixed period.
    ///
    /// The handle can be aborted to stop the sweeper; the registry itself
    /// stays usable either way.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let now = registry.clock.now();
                registry.reevaluate_all(now);
                tracing::trace!(peers = registry.peer_count(), "liveness sweep");
            }
        })
    }

    fn get_or_create(&self, pubkey: PublicKey) -> Result<Arc<PeerLivenessRecord>, BeaconError> {
        {
            let records = self.records.read().expect("registry lock poisoned");
            if let Some(record) = records.get(&pubkey) {
                return Ok(record.clone());
            }
        }

        let mut records = self.records.write().expect("registry lock poisoned");
        // Another thread may have inserted between the read and the write.
        if let Some(record) = records.get(&pubkey) {
            return Ok(record.clone());
        }

        let is_validator = self.validators.contains(&pubkey);
        let record = Arc::new(PeerLivenessRecord::new(
            self.max_unresponsive,
            is_validator,
            self.genesis,
            self.clock.clone(),
        )?);
        tracing::debug!(validator = is_validator, "tracking new peer");
        records.insert(pubkey, record.clone());
        Ok(record)
    }
}
