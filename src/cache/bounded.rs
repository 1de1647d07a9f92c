//! Weight-bounded concurrent cache with approximate LRU eviction.
//!
//! # Responsibilities
//! - Lock-free-on-read lookups from many request threads
//! - Account every value by its [`Weighted::weight`]
//! - Evict approximately least-recently-used entries once over budget
//!
//! # Data Flow
//! ```text
//! get:    DashMap shard read → stamp last access → Arc clone
//! insert: ledger lock → DashMap insert → enqueue (key, ticket)
//!         → while over budget: pop queue head
//!               stale ticket            → skip
//!               touched since enqueued  → requeue once (second chance)
//!               otherwise               → remove
//! ```
//!
//! # Design Decisions
//! - Readers never take the ledger lock; writers serialize on it
//! - Racing inserts for the same key are allowed; the last write wins
//! - A value heavier than the whole budget is returned but not stored
//! - A budget of zero disables storage entirely

use std::borrow::Borrow;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::observability::metrics;

/// Approximate cost of a cached value.
pub trait Weighted {
    fn weight(&self) -> usize;
}

struct Slot<V> {
    value: Arc<V>,
    weight: usize,
    ticket: u64,
    last_access: AtomicU64,
}

struct QueueEntry<K> {
    key: K,
    ticket: u64,
    enqueued_at: u64,
}

struct Ledger<K> {
    queue: VecDeque<QueueEntry<K>>,
    weight: usize,
    next_ticket: u64,
}

/// A bounded, weighted, concurrent cache.
pub struct BoundedCache<K, V> {
    name: &'static str,
    max_weight: usize,
    map: DashMap<K, Slot<V>>,
    ledger: Mutex<Ledger<K>>,
    clock: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Weighted,
{
    /// Creates a cache holding at most `max_weight` total weight.
    pub fn new(name: &'static str, max_weight: usize) -> Self {
        Self {
            name,
            max_weight,
            map: DashMap::new(),
            ledger: Mutex::new(Ledger {
                queue: VecDeque::new(),
                weight: 0,
                next_ticket: 0,
            }),
            clock: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Looks up a value and marks it recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(slot) => {
                slot.last_access.store(self.tick(), Ordering::Relaxed);
                metrics::record_cache_hit(self.name);
                Some(Arc::clone(&slot.value))
            }
            None => {
                metrics::record_cache_miss(self.name);
                None
            }
        }
    }

    /// Stores a value, evicting older entries if needed, and returns it shared.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        self.insert_arc(key, Arc::new(value))
    }

    /// Stores an already shared value.
    pub fn insert_arc(&self, key: K, value: Arc<V>) -> Arc<V> {
        let weight = value.weight();
        if self.max_weight == 0 || weight > self.max_weight {
            return value;
        }

        let mut ledger = self.ledger.lock();
        let ticket = ledger.next_ticket;
        ledger.next_ticket += 1;
        let now = self.tick();

        let slot = Slot {
            value: Arc::clone(&value),
            weight,
            ticket,
            last_access: AtomicU64::new(now),
        };
        if let Some(previous) = self.map.insert(key.clone(), slot) {
            ledger.weight -= previous.weight;
        }
        ledger.weight += weight;
        ledger.queue.push_back(QueueEntry {
            key,
            ticket,
            enqueued_at: now,
        });

        self.evict(&mut ledger);
        if ledger.queue.len() > 2 * self.map.len() + 16 {
            self.compact(&mut ledger);
        }
        metrics::record_cache_weight(self.name, ledger.weight);
        value
    }

    fn evict(&self, ledger: &mut Ledger<K>) {
        let mut second_chances = ledger.queue.len();
        while ledger.weight > self.max_weight {
            let Some(head) = ledger.queue.pop_front() else {
                break;
            };

            let touched = match self.map.get(&head.key) {
                Some(slot) if slot.ticket == head.ticket => {
                    slot.last_access.load(Ordering::Relaxed) > head.enqueued_at
                }
                _ => continue,
            };

            if touched && second_chances > 0 {
                second_chances -= 1;
                let now = self.tick();
                ledger.queue.push_back(QueueEntry {
                    enqueued_at: now,
                    ..head
                });
                continue;
            }

            if let Some((_, slot)) = self.map.remove_if(&head.key, |_, s| s.ticket == head.ticket) {
                ledger.weight -= slot.weight;
                metrics::record_cache_eviction(self.name);
                tracing::trace!(cache = self.name, weight = slot.weight, "Evicted cache entry");
            }
        }
    }

    /// Drops queue entries whose key was overwritten or evicted.
    fn compact(&self, ledger: &mut Ledger<K>) {
        ledger
            .queue
            .retain(|e| self.map.get(&e.key).is_some_and(|s| s.ticket == e.ticket));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut ledger = self.ledger.lock();
        self.map.clear();
        ledger.queue.clear();
        ledger.weight = 0;
        metrics::record_cache_weight(self.name, 0);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total weight currently stored.
    pub fn weighted_size(&self) -> usize {
        self.ledger.lock().weight
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }
}

impl<K: Eq + Hash, V> std::fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("max_weight", &self.max_weight)
            .field("entries", &self.map.len())
            .finish()
    }
}
