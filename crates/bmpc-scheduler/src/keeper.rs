//! Reference-counted storage for wire values.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Mutex, MutexGuard,
};

use derive_builder::Builder;
use tracing::trace;

use crate::wire::{Boolean, Secrecy, WireId};

/// Default number of independently locked shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Wire keeper configuration.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct WireKeeperConfig {
    /// Number of shards the wire storage is split into. Wires in different shards never contend
    /// for the same lock.
    #[builder(default = "DEFAULT_SHARDS")]
    shards: usize,
}

impl WireKeeperConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.shards {
            return Err("wire keeper needs at least one shard".to_string());
        }
        Ok(())
    }
}

impl Default for WireKeeperConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
        }
    }
}

impl WireKeeperConfig {
    /// Creates a new builder for WireKeeperConfig.
    pub fn builder() -> WireKeeperConfigBuilder {
        WireKeeperConfigBuilder::default()
    }

    /// Number of shards the wire storage is split into.
    pub fn shards(&self) -> usize {
        self.shards
    }
}

/// Live and total wire counts of a keeper.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireStatistics {
    /// Wires currently holding a value.
    pub live: u64,
    /// Wires ever allocated.
    pub allocated: u64,
}

enum WireValue {
    Single(bool),
    Batch(Vec<bool>),
}

struct Wire {
    value: WireValue,
    secrecy: Secrecy,
    reference_count: u32,
}

#[derive(Default)]
struct Shard {
    slots: Vec<Option<Wire>>,
    free: Vec<usize>,
}

/// Owns every wire value of one scheduler.
///
/// Each operation is atomic with respect to other operations on the same wire. Storage is
/// sharded so that operations on unrelated wires do not serialize on one lock.
///
/// A newly allocated wire has a reference count of one. The slot is released as soon as the
/// count drops to zero and may then be handed out again.
///
/// # Panics
///
/// Every accessor panics when given a wire that is not live, or when a single-value accessor is
/// used on a batch wire and vice versa. Both indicate a bookkeeping defect in the caller.
pub struct WireKeeper {
    shards: Box<[Mutex<Shard>]>,
    next_shard: AtomicUsize,
    live: AtomicU64,
    allocated: AtomicU64,
}

opaque_debug::implement!(WireKeeper);

impl Default for WireKeeper {
    fn default() -> Self {
        Self::new(WireKeeperConfig::default())
    }
}

impl WireKeeper {
    /// Creates a new wire keeper.
    pub fn new(config: WireKeeperConfig) -> Self {
        let shards = (0..config.shards.max(1))
            .map(|_| Mutex::new(Shard::default()))
            .collect();

        Self {
            shards,
            next_shard: AtomicUsize::new(0),
            live: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
        }
    }

    /// Allocates a wire holding a single value.
    pub fn allocate_boolean_value(&self, v: bool, secrecy: Secrecy) -> WireId<Boolean> {
        self.allocate(WireValue::Single(v), secrecy)
    }

    /// Allocates a wire holding a batch of values.
    pub fn allocate_batch_boolean_value(&self, v: Vec<bool>, secrecy: Secrecy) -> WireId<Boolean> {
        self.allocate(WireValue::Batch(v), secrecy)
    }

    /// Returns the value of a single-value wire.
    pub fn get_boolean_value(&self, id: WireId<Boolean>) -> bool {
        self.with_wire(id, |wire| match &wire.value {
            WireValue::Single(v) => *v,
            WireValue::Batch(_) => panic!("{id:?} holds a batch, not a single value"),
        })
    }

    /// Returns a copy of the values of a batch wire.
    pub fn get_batch_boolean_value(&self, id: WireId<Boolean>) -> Vec<bool> {
        self.with_wire(id, |wire| match &wire.value {
            WireValue::Batch(v) => v.clone(),
            WireValue::Single(_) => panic!("{id:?} holds a single value, not a batch"),
        })
    }

    /// Overwrites the value of a single-value wire.
    pub fn set_boolean_value(&self, id: WireId<Boolean>, v: bool) {
        self.with_wire(id, |wire| match &mut wire.value {
            WireValue::Single(value) => *value = v,
            WireValue::Batch(_) => panic!("{id:?} holds a batch, not a single value"),
        })
    }

    /// Overwrites the values of a batch wire.
    pub fn set_batch_boolean_value(&self, id: WireId<Boolean>, v: Vec<bool>) {
        self.with_wire(id, |wire| match &mut wire.value {
            WireValue::Batch(value) => *value = v,
            WireValue::Single(_) => panic!("{id:?} holds a single value, not a batch"),
        })
    }

    /// Returns the secrecy of a wire.
    pub fn secrecy(&self, id: WireId<Boolean>) -> Secrecy {
        self.with_wire(id, |wire| wire.secrecy)
    }

    /// Returns the batch length of a batch wire.
    pub fn batch_size(&self, id: WireId<Boolean>) -> usize {
        self.with_wire(id, |wire| match &wire.value {
            WireValue::Batch(v) => v.len(),
            WireValue::Single(_) => panic!("{id:?} holds a single value, not a batch"),
        })
    }

    /// Returns the reference count of a wire.
    pub fn reference_count(&self, id: WireId<Boolean>) -> u32 {
        self.with_wire(id, |wire| wire.reference_count)
    }

    /// Returns whether `id` refers to a live wire.
    pub fn is_live(&self, id: WireId<Boolean>) -> bool {
        let (shard, slot) = self.locate(id);
        matches!(self.lock(shard).slots.get(slot), Some(Some(_)))
    }

    /// Registers an additional holder of a wire.
    pub fn increase_reference_count(&self, id: WireId<Boolean>) {
        self.with_wire(id, |wire| {
            wire.reference_count = wire
                .reference_count
                .checked_add(1)
                .unwrap_or_else(|| panic!("reference count of {id:?} overflowed"));
        })
    }

    /// Releases one holder of a wire, freeing it when no holder is left.
    pub fn decrease_reference_count(&self, id: WireId<Boolean>) {
        let (shard, slot) = self.locate(id);
        let mut shard = self.lock(shard);

        let wire = shard
            .slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id:?} is not a live wire"));

        wire.reference_count -= 1;
        if wire.reference_count == 0 {
            shard.slots[slot] = None;
            shard.free.push(slot);
            self.live.fetch_sub(1, Ordering::Relaxed);

            trace!(wire = id.index(), "freed wire");
        }
    }

    /// Returns the live and total wire counts.
    pub fn statistics(&self) -> WireStatistics {
        WireStatistics {
            live: self.live.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
        }
    }

    fn allocate(&self, value: WireValue, secrecy: Secrecy) -> WireId<Boolean> {
        let shard_count = self.shards.len();
        let shard_index = self.next_shard.fetch_add(1, Ordering::Relaxed) % shard_count;

        let wire = Wire {
            value,
            secrecy,
            reference_count: 1,
        };

        let slot = {
            let mut shard = self.lock(shard_index);
            match shard.free.pop() {
                Some(slot) => {
                    shard.slots[slot] = Some(wire);
                    slot
                }
                None => {
                    shard.slots.push(Some(wire));
                    shard.slots.len() - 1
                }
            }
        };

        self.live.fetch_add(1, Ordering::Relaxed);
        self.allocated.fetch_add(1, Ordering::Relaxed);

        WireId::new((slot * shard_count + shard_index) as u64)
    }

    fn with_wire<R>(&self, id: WireId<Boolean>, f: impl FnOnce(&mut Wire) -> R) -> R {
        let (shard, slot) = self.locate(id);
        let mut shard = self.lock(shard);

        let wire = shard
            .slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id:?} is not a live wire"));

        f(wire)
    }

    #[inline]
    fn locate(&self, id: WireId<Boolean>) -> (usize, usize) {
        let index = id.index() as usize;
        let shard_count = self.shards.len();
        (index % shard_count, index / shard_count)
    }

    fn lock(&self, shard: usize) -> MutexGuard<'_, Shard> {
        self.shards[shard]
            .lock()
            .expect("wire keeper shard lock is not poisoned")
    }
}
