//! Eviction bookkeeping.
//!
//! The ledger only decides *which* sequence ids to drop. Removing the
//! matching entries and rebuilding the vector index is the cache's job,
//! so a new ordering policy never has to know about the index.

use std::collections::VecDeque;
use std::fmt::Debug;

use crate::config::EvictionPolicyKind;

/// An ordering over cached entries that picks eviction victims.
pub trait EvictionPolicy: Debug + Send + Sync {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    /// Track a newly inserted entry.
    fn record(&mut self, sequence_id: u64);

    /// Whether [`touch`](Self::touch) should be called on every hit.
    fn tracks_access(&self) -> bool {
        false
    }

    /// Note that an entry was served. Recency-based policies reorder here.
    fn touch(&mut self, _sequence_id: u64) {}

    /// Drop entries from tracking until at most `max_responses` remain and
    /// return the dropped ids, first victim first.
    fn evict(&mut self, max_responses: usize) -> Vec<u64>;

    /// Number of tracked entries.
    fn len(&self) -> usize;

    /// Check if nothing is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tracked sequence ids, next victim first.
    fn order(&self) -> Vec<u64>;

    /// Forget every tracked entry.
    fn clear(&mut self);

    /// Clone into a new box, so ledgers can be copied with the cache state.
    fn clone_box(&self) -> Box<dyn EvictionPolicy>;
}

/// First in, first out: the oldest sequence ids go first.
#[derive(Debug, Clone, Default)]
pub struct FifoPolicy {
    queue: VecDeque<u64>,
}

impl FifoPolicy {
    /// Create an empty FIFO policy.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn record(&mut self, sequence_id: u64) {
        self.queue.push_back(sequence_id);
    }

    fn evict(&mut self, max_responses: usize) -> Vec<u64> {
        let mut victims = Vec::new();
        while self.queue.len() > max_responses {
            match self.queue.pop_front() {
                Some(sequence_id) => victims.push(sequence_id),
                None => break,
            }
        }
        victims
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn order(&self) -> Vec<u64> {
        self.queue.iter().copied().collect()
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn clone_box(&self) -> Box<dyn EvictionPolicy> {
        Box::new(self.clone())
    }
}

/// Tracks order but never evicts.
#[derive(Debug, Clone, Default)]
pub struct UnboundedPolicy {
    order: Vec<u64>,
}

impl EvictionPolicy for UnboundedPolicy {
    fn name(&self) -> &'static str {
        "none"
    }

    fn record(&mut self, sequence_id: u64) {
        self.order.push(sequence_id);
    }

    fn evict(&mut self, _max_responses: usize) -> Vec<u64> {
        Vec::new()
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn order(&self) -> Vec<u64> {
        self.order.clone()
    }

    fn clear(&mut self) {
        self.order.clear();
    }

    fn clone_box(&self) -> Box<dyn EvictionPolicy> {
        Box::new(self.clone())
    }
}

/// A policy plus the capacity it enforces.
#[derive(Debug)]
pub struct EvictionLedger {
    policy: Box<dyn EvictionPolicy>,
    capacity: Option<usize>,
}

impl EvictionLedger {
    /// Create a ledger around any policy.
    pub fn new(policy: Box<dyn EvictionPolicy>, capacity: Option<usize>) -> Self {
        Self { policy, capacity }
    }

    /// Create the ledger matching a configured policy kind.
    pub fn from_kind(kind: EvictionPolicyKind, capacity: Option<usize>) -> Self {
        match kind {
            EvictionPolicyKind::Fifo => Self::new(Box::new(FifoPolicy::new()), capacity),
            EvictionPolicyKind::None => Self::new(Box::new(UnboundedPolicy::default()), None),
        }
    }

    /// Policy name.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Configured capacity; `None` means unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Track a newly inserted entry.
    pub fn record(&mut self, sequence_id: u64) {
        self.policy.record(sequence_id);
    }

    /// Whether hits need to be forwarded to the policy.
    pub fn tracks_access(&self) -> bool {
        self.policy.tracks_access()
    }

    /// Forward a hit to the policy.
    pub fn touch(&mut self, sequence_id: u64) {
        self.policy.touch(sequence_id);
    }

    /// Victims needed to get back within the configured capacity.
    pub fn evict(&mut self) -> Vec<u64> {
        match self.capacity {
            Some(max_responses) => self.evict_to(max_responses),
            None => Vec::new(),
        }
    }

    /// Victims needed to get down to `max_responses` entries.
    pub fn evict_to(&mut self, max_responses: usize) -> Vec<u64> {
        self.policy.evict(max_responses)
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.policy.len()
    }

    /// Check if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.policy.is_empty()
    }

    /// Tracked sequence ids, next victim first.
    pub fn order(&self) -> Vec<u64> {
        self.policy.order()
    }

    /// Forget every tracked entry.
    pub fn clear(&mut self) {
        self.policy.clear();
    }
}

impl Clone for EvictionLedger {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone_box(),
            capacity: self.capacity,
        }
    }
}
