//! The scheduler contract and its plaintext backends.

mod network_plaintext;
mod plaintext;

pub use network_plaintext::{
    NetworkPlaintextScheduler, NetworkPlaintextSchedulerConfig,
    NetworkPlaintextSchedulerConfigBuilder, NetworkPlaintextSchedulerConfigBuilderError,
};
pub use plaintext::{
    PlaintextScheduler, PlaintextSchedulerConfig, PlaintextSchedulerConfigBuilder,
    PlaintextSchedulerConfigBuilderError, DEFAULT_PARALLEL_BATCH_THRESHOLD,
};

use bmpc_comm::{PartyId, TrafficStatistics};

use crate::{Boolean, SchedulerError, WireId, WireStatistics};

/// Number of gates evaluated by a scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateStatistics {
    /// Gates that need interaction in a secure backend, i.e. AND gates with two private inputs.
    pub non_free: u64,
    /// All other gates.
    pub free: u64,
}

/// Builds and evaluates a boolean circuit one gate at a time.
///
/// Every party calls the same sequence of operations. Whether a gate is computed locally or
/// requires communication is up to the backend.
///
/// Wires returned by a scheduler start with a reference count of one, owned by the caller.
/// Operands are never consumed or mutated by a gate. Each holder must release a wire exactly once
/// with [`decrease_reference_count`](Self::decrease_reference_count).
///
/// Batch operations work on wires holding a sequence of values of equal length and apply the
/// operation element-wise.
///
/// # Panics
///
/// Passing a wire id that is not live, or a single-value wire to a batch operation (and vice
/// versa), panics.
pub trait Scheduler: Send + Sync {
    // ------ input ------

    /// Creates a private wire holding an input of `party`. Parties other than `party` pass a
    /// placeholder which secure backends ignore.
    fn private_boolean_input(
        &self,
        v: bool,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`private_boolean_input`](Self::private_boolean_input). The placeholder
    /// must have the same length as the real input.
    fn private_boolean_input_batch(
        &self,
        v: &[bool],
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Creates a public wire holding a value known to all parties.
    fn public_boolean_input(&self, v: bool) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`public_boolean_input`](Self::public_boolean_input).
    fn public_boolean_input_batch(&self, v: &[bool]) -> Result<WireId<Boolean>, SchedulerError>;

    /// Creates a private wire from a share obtained with
    /// [`extract_boolean_secret_share`](Self::extract_boolean_secret_share).
    fn recover_boolean_wire(&self, share: bool) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`recover_boolean_wire`](Self::recover_boolean_wire).
    fn recover_boolean_wire_batch(
        &self,
        shares: &[bool],
    ) -> Result<WireId<Boolean>, SchedulerError>;

    // ------ output ------

    /// Reveals `src` to `party`, returning a new public wire. Only `party` is guaranteed to see
    /// the real value.
    fn open_boolean_value_to_party(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`open_boolean_value_to_party`](Self::open_boolean_value_to_party).
    fn open_boolean_value_to_party_batch(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Returns this party's share of `id` without revealing the value.
    fn extract_boolean_secret_share(&self, id: WireId<Boolean>) -> Result<bool, SchedulerError>;

    /// Batch version of [`extract_boolean_secret_share`](Self::extract_boolean_secret_share).
    fn extract_boolean_secret_share_batch(
        &self,
        id: WireId<Boolean>,
    ) -> Result<Vec<bool>, SchedulerError>;

    /// Returns the value of a public wire.
    fn get_boolean_value(&self, id: WireId<Boolean>) -> Result<bool, SchedulerError>;

    /// Batch version of [`get_boolean_value`](Self::get_boolean_value).
    fn get_boolean_value_batch(&self, id: WireId<Boolean>) -> Result<Vec<bool>, SchedulerError>;

    // ------ AND ------

    /// Computes `left & right` for two private wires.
    fn private_and_private(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`private_and_private`](Self::private_and_private).
    fn private_and_private_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Computes `left & right` for a private `left` and a public `right`.
    fn private_and_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`private_and_public`](Self::private_and_public).
    fn private_and_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Computes `left & right` for two public wires.
    fn public_and_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`public_and_public`](Self::public_and_public).
    fn public_and_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    // ------ composite AND ------

    /// Computes `left & right` for every wire in `rights`, returning the results in the same
    /// order. All wires are private.
    ///
    /// Secure backends can evaluate the whole fan-out in a single round of communication.
    fn private_and_private_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    /// Batch version of [`private_and_private_composite`](Self::private_and_private_composite).
    fn private_and_private_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    /// Composite AND of a private `left` with public `rights`.
    fn private_and_public_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    /// Batch version of [`private_and_public_composite`](Self::private_and_public_composite).
    fn private_and_public_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    /// Composite AND of a public `left` with public `rights`.
    fn public_and_public_composite(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    /// Batch version of [`public_and_public_composite`](Self::public_and_public_composite).
    fn public_and_public_composite_batch(
        &self,
        left: WireId<Boolean>,
        rights: &[WireId<Boolean>],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    // ------ XOR ------

    /// Computes `left ^ right` for two private wires.
    fn private_xor_private(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`private_xor_private`](Self::private_xor_private).
    fn private_xor_private_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Computes `left ^ right` for a private `left` and a public `right`.
    fn private_xor_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`private_xor_public`](Self::private_xor_public).
    fn private_xor_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Computes `left ^ right` for two public wires.
    fn public_xor_public(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`public_xor_public`](Self::public_xor_public).
    fn public_xor_public_batch(
        &self,
        left: WireId<Boolean>,
        right: WireId<Boolean>,
    ) -> Result<WireId<Boolean>, SchedulerError>;

    // ------ NOT ------

    /// Computes `!src` for a private wire.
    fn not_private(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`not_private`](Self::not_private).
    fn not_private_batch(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

    /// Computes `!src` for a public wire.
    fn not_public(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

    /// Batch version of [`not_public`](Self::not_public).
    fn not_public_batch(&self, src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

    // ------ wire management ------

    /// Registers an additional holder of `id`.
    fn increase_reference_count(&self, id: WireId<Boolean>);

    /// Batch version of [`increase_reference_count`](Self::increase_reference_count).
    fn increase_reference_count_batch(&self, id: WireId<Boolean>);

    /// Releases one holder of `id`. The wire is freed once no holder is left.
    fn decrease_reference_count(&self, id: WireId<Boolean>);

    /// Batch version of [`decrease_reference_count`](Self::decrease_reference_count).
    fn decrease_reference_count_batch(&self, id: WireId<Boolean>);

    // ------ rebatching ------

    /// Concatenates the values of batch wires, in order, into one new batch wire.
    fn batching_up(&self, src: &[WireId<Boolean>]) -> Result<WireId<Boolean>, SchedulerError>;

    /// Splits a batch wire into consecutive slices of the given sizes. The sizes must add up to
    /// the batch length of `src`.
    fn unbatching(
        &self,
        src: WireId<Boolean>,
        strategy: &[usize],
    ) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

    // ------ statistics ------

    /// Returns the bytes sent and received by this scheduler.
    fn traffic_statistics(&self) -> TrafficStatistics;

    /// Returns the live and total wire counts.
    fn wire_statistics(&self) -> WireStatistics;

    /// Returns the number of gates evaluated so far.
    fn gate_statistics(&self) -> GateStatistics;
}
