use std::sync::atomic::{AtomicU64, Ordering};

use bmpc_comm::{PartyId, TrafficStatistics};
use derive_builder::Builder;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    keeper::{WireKeeper, WireKeeperConfig, WireStatistics},
    scheduler::{GateStatistics, Scheduler},
    wire::{Boolean, Secrecy, WireId},
    SchedulerError,
};

/// Batches at least this long are evaluated in parallel by default.
pub const DEFAULT_PARALLEL_BATCH_THRESHOLD: usize = 4096;

/// Plaintext scheduler configuration.
#[derive(Debug, Clone, Builder)]
pub struct PlaintextSchedulerConfig {
    /// Configuration of the wire keeper owned by the scheduler.
    #[builder(default)]
    pub(crate) keeper: WireKeeperConfig,
    /// Batch gates with at least this many values are evaluated on the rayon thread pool.
    #[builder(default = "DEFAULT_PARALLEL_BATCH_THRESHOLD")]
    pub(crate) parallel_batch_threshold: usize,
}

impl Default for PlaintextSchedulerConfig {
    fn default() -> Self {
        Self {
            keeper: WireKeeperConfig::default(),
            parallel_batch_threshold: DEFAULT_PARALLEL_BATCH_THRESHOLD,
        }
    }
}

impl PlaintextSchedulerConfig {
    /// Creates a new builder for PlaintextSchedulerConfig.
    pub fn builder() -> PlaintextSchedulerConfigBuilder {
        PlaintextSchedulerConfigBuilder::default()
    }

    /// Configuration of the wire keeper owned by the scheduler.
    pub fn keeper(&self) -> &WireKeeperConfig {
        &self.keeper
    }

    /// Batch gates with at least this many values are evaluated on the rayon thread pool.
    pub fn parallel_batch_threshold(&self) -> usize {
        self.parallel_batch_threshold
    }
}

/// A scheduler which evaluates every gate immediately on plaintext values.
///
/// Secrecy is recorded on each wire but never enforced, and no communication takes place. This
/// makes it a reference for the expected outputs of any secure backend, and a cheap way to test
/// circuit logic locally.
pub struct PlaintextScheduler {
    keeper: WireKeeper,
    parallel_batch_threshold: usize,
    non_free_gates: AtomicU64,
    free_gates: AtomicU64,
}

opaque_debug::implement!(PlaintextScheduler);

impl Default for PlaintextScheduler {
    fn default() -> Self {
        Self::new(PlaintextSchedulerConfig::default())
    }
}

impl PlaintextScheduler {
    /// Creates a new plaintext scheduler.
    pub fn new(config: PlaintextSchedulerConfig) -> Self {
        debug!(
            shards = config.keeper.shards(),
            parallel_batch_threshold = config.parallel_batch_threshold,
            "created plaintext scheduler"
        );

        Self {
            keeper: WireKeeper::new(config.keeper),
            parallel_batch_threshold: config.parallel_batch_threshold,
            non_free_gates: AtomicU64::new(0),
            free_gates: AtomicU64::new(0),
        }
    }

    /// Returns the secrecy recorded for a wire.
    pub fn wire_secrecy(&self, id: WireId<Boolean>) -> Secrecy {
        self.keeper.secrecy(id)
    }

    fn count_gates(&self, non_free: bool, count: usize) {
        let counter = if non_free {
            &self.non_free_gates
        } else {
            &self.free_gates
        };
        counter.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn unary(&self, src: WireId<Boolean>, secrecy: Secrecy) -> WireId<Boolean> {
        let v = !self.keeper.get_boolean_value(src);
        self.count_gates(false, 1);
        self.keeper.allocate_boolean_value(v, secrecy)
    }

    fn unary_batch(&self, src: WireId<Boolean>, secrecy: Secrecy) -> WireId<Boolean> {
        let values = self.keeper.get_batch_boolean_value(src);
        let result: Vec<bool> = if values.len() >= self.parallel_batch_threshold {
            values.par_iter().map(|v| !v).collect()
        } else {
            values.iter().map(|v| !v).collect()
        };
        self.count_gates(false, result.len());
        self.keeper.allocate_batch_boolean_value(result, secrecy)
    }

    fn binary(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
        op: fn(bool, bool) -> bool,
        secrecy: Secrecy,
        non_free: bool,
    ) -> WireId<Boolean> {
        let v = op(
            self.keeper.get_boolean_value(left),
            self.keeper.get_boolean_value(right),
        );
        self.count_gates(non_free, 1);
        self.keeper.allocate_boolean_value(v, secrecy)
    }

    fn binary_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
        op: fn(bool, bool) -> bool,
        secrecy: Secrecy,
        non_free: bool,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let left = self.keeper.get_batch_boolean_value(left);
        let right = self.keeper.get_batch_boolean_value(right);
        let result = self.zip_batch(&left, &right, op)?;
        self.count_gates(non_free, result.len());
        Ok(self.keeper.allocate_batch_boolean_value(result, secrecy))
    }

    fn zip_batch(
        &self,
        left: &[bool],
        right: &[bool],
        op: fn(bool, bool) -> bool,
    ) -> Result<Vec<bool>, SchedulerError> {
        if left.len() != right.len() {
            return Err(SchedulerError::BatchSizeMismatch {
                left: left.len(),
                right: right.len(),
            });
        }

        Ok(if left.len() >= self.parallel_batch_threshold {
            left.par_iter()
                .zip(right.par_iter())
                .map(|(l, r)| op(*l, *r))
                .collect()
        } else {
            left.iter().zip(right).map(|(l, r)| op(*l, *r)).collect()
        })
    }

    fn composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
        secrecy: Secrecy,
        non_free: bool,
    ) -> Vec<WireId<Boolean>> {
        let left = self.keeper.get_boolean_value(left);
        let result = rights
            .iter()
            .map(|right| {
                let v = left & self.keeper.get_boolean_value(*right);
                self.keeper.allocate_boolean_value(v, secrecy)
            })
            .collect();
        self.count_gates(non_free, rights.len());
        result
    }

    fn composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
        secrecy: Secrecy,
        non_free: bool,
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        let left = self.keeper.get_batch_boolean_value(left);

        // Evaluate everything before allocating so that a size mismatch leaves no wire behind.
        let results = rights
            .iter()
            .map(|right| {
                let right = self.keeper.get_batch_boolean_value(*right);
                self.zip_batch(&left, &right, |l, r| l & r)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.count_gates(non_free, left.len() * rights.len());

        Ok(results
            .into_iter()
            .map(|result| self.keeper.allocate_batch_boolean_value(result, secrecy))
            .collect())
    }
}

fn and(l: bool, r: bool) -> bool {
    l & r
}

fn xor(l: bool, r: bool) -> bool {
    l ^ r
}

impl Scheduler for PlaintextScheduler {
    fn private_boolean_input(
        &self,
        v: bool,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let id = self.keeper.allocate_boolean_value(v, Secrecy::Private);
        trace!(wire = id.index(), party, "private input");
        Ok(id)
    }

    fn private_boolean_input_batch(
        &self,
        v: &[bool],
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let id = self
            .keeper
            .allocate_batch_boolean_value(v.to_vec(), Secrecy::Private);
        trace!(wire = id.index(), party, len = v.len(), "private batch input");
        Ok(id)
    }

    fn public_boolean_input(&self, v: bool) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.keeper.allocate_boolean_value(v, Secrecy::Public))
    }

    fn public_boolean_input_batch(&self, v: &[bool]) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self
            .keeper
            .allocate_batch_boolean_value(v.to_vec(), Secrecy::Public))
    }

    fn recover_boolean_wire(&self, share: bool) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.keeper.allocate_boolean_value(share, Secrecy::Private))
    }

    fn recover_boolean_wire_batch(
        &self,
        shares: &[bool],
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self
            .keeper
            .allocate_batch_boolean_value(shares.to_vec(), Secrecy::Private))
    }

    fn open_boolean_value_to_party(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.keeper.get_boolean_value(src);
        let id = self.keeper.allocate_boolean_value(v, Secrecy::Public);
        trace!(src = src.index(), wire = id.index(), party, "opened value");
        Ok(id)
    }

    fn open_boolean_value_to_party_batch(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.keeper.get_batch_boolean_value(src);
        let id = self.keeper.allocate_batch_boolean_value(v, Secrecy::Public);
        trace!(src = src.index(), wire = id.index(), party, "opened batch");
        Ok(id)
    }

    fn extract_boolean_secret_share(&self, id: WireId<Boolean>) -> Result<bool, SchedulerError> {
        Ok(self.keeper.get_boolean_value(id))
    }

    fn extract_boolean_secret_share_batch(
        &self,
        id: WireId<Boolean>,
    ) -> Result<Vec<bool>, SchedulerError> {
        Ok(self.keeper.get_batch_boolean_value(id))
    }

    fn get_boolean_value(&self, id: WireId<Boolean>) -> Result<bool, SchedulerError> {
        Ok(self.keeper.get_boolean_value(id))
    }

    fn get_boolean_value_batch(&self, id: WireId<Boolean>) -> Result<Vec<bool>, SchedulerError> {
        Ok(self.keeper.get_batch_boolean_value(id))
    }

    fn private_and_private(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, and, Secrecy::Private, true))
    }

    fn private_and_private_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, and, Secrecy::Private, true)
    }

    fn private_and_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, and, Secrecy::Private, false))
    }

    fn private_and_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, and, Secrecy::Private, false)
    }

    fn public_and_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, and, Secrecy::Public, false))
    }

    fn public_and_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, and, Secrecy::Public, false)
    }

    fn private_and_private_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        Ok(self.composite(left, rights, Secrecy::Private, true))
    }

    fn private_and_private_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        self.composite_batch(left, rights, Secrecy::Private, true)
    }

    fn private_and_public_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        Ok(self.composite(left, rights, Secrecy::Private, false))
    }

    fn private_and_public_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        self.composite_batch(left, rights, Secrecy::Private, false)
    }

    fn public_and_public_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        Ok(self.composite(left, rights, Secrecy::Public, false))
    }

    fn public_and_public_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        self.composite_batch(left, rights, Secrecy::Public, false)
    }

    fn private_xor_private(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, xor, Secrecy::Private, false))
    }

    fn private_xor_private_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, xor, Secrecy::Private, false)
    }

    fn private_xor_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, xor, Secrecy::Private, false))
    }

    fn private_xor_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, xor, Secrecy::Private, false)
    }

    fn public_xor_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.binary(left, right, xor, Secrecy::Public, false))
    }

    fn public_xor_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.binary_batch(left, right, xor, Secrecy::Public, false)
    }

    fn not_private(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.unary(src, Secrecy::Private))
    }

    fn not_private_batch(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.unary_batch(src, Secrecy::Private))
    }

    fn not_public(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.unary(src, Secrecy::Public))
    }

    fn not_public_batch(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError> {
        Ok(self.unary_batch(src, Secrecy::Public))
    }

    fn increase_reference_count(&self, id: WireId<Boolean>) {
        self.keeper.increase_reference_count(id)
    }

    fn increase_reference_count_batch(&self, id: WireId<Boolean>) {
        self.keeper.increase_reference_count(id)
    }

    fn decrease_reference_count(&self, id: WireId<Boolean>) {
        self.keeper.decrease_reference_count(id)
    }

    fn decrease_reference_count_batch(&self, id: WireId<Boolean>) {
        self.keeper.decrease_reference_count(id)
    }

    fn batching_up(&self, src: &[WireId<Boolean>]) -> Result<WireId<Boolean>, SchedulerError> {
        if src.is_empty() {
            return Err(SchedulerError::EmptyBatching);
        }

        let mut values = Vec::new();
        let mut secrecy = Secrecy::Public;
        for id in src {
            values.extend(self.keeper.get_batch_boolean_value(*id));
            secrecy = secrecy.join(self.keeper.secrecy(*id));
        }

        let id = self.keeper.allocate_batch_boolean_value(values, secrecy);
        trace!(wire = id.index(), sources = src.len(), "batched up");
        Ok(id)
    }

    fn unbatching(
        &self,
        src: WireId<Boolean>,
        strategy: &[usize],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError> {
        let values = self.keeper.get_batch_boolean_value(src);
        let expected = strategy
            .iter()
            .try_fold(0usize, |acc, size| acc.checked_add(*size));
        if expected != Some(values.len()) {
            return Err(SchedulerError::InvalidUnbatching {
                expected: expected.unwrap_or(usize::MAX),
                actual: values.len(),
            });
        }

        let secrecy = self.keeper.secrecy(src);
        let mut rest = values.as_slice();
        let ids = strategy
            .iter()
            .map(|size| {
                let (head, tail) = rest.split_at(*size);
                rest = tail;
                self.keeper.allocate_batch_boolean_value(head.to_vec(), secrecy)
            })
            .collect();

        trace!(src = src.index(), parts = strategy.len(), "unbatched");
        Ok(ids)
    }

    fn traffic_statistics(&self) -> TrafficStatistics {
        TrafficStatistics::default()
    }

    fn wire_statistics(&self) -> WireStatistics {
        self.keeper.statistics()
    }

    fn gate_statistics(&self) -> GateStatistics {
        GateStatistics {
            non_free: self.non_free_gates.load(Ordering::Relaxed),
            free: self.free_gates.load(Ordering::Relaxed),
        }
    }
}
