use std::{marker::PhantomData, sync::Arc};

use bmpc_scheduler::{PartyId, Scheduler};

use crate::{
    types::{BatchKind, Joined, Public, Secret, SecrecyJoin, SecrecyKind},
    wire::{BitWire, Input},
    FrontendError,
};

/// A boolean value held by a scheduler.
///
/// `S` tracks whether the value is [`Secret`] or [`Public`], `B` whether it is a single value or
/// a batch. Gates combine the secrecy of their operands, so the result of a gate with a secret
/// operand is always secret.
#[derive(Debug)]
pub struct Bit<S, B> {
    wire: BitWire,
    _pd: PhantomData<(S, B)>,
}

impl<S, B> Clone for Bit<S, B> {
    fn clone(&self) -> Self {
        Self::from_wire(self.wire.clone())
    }
}

impl<S, B> Bit<S, B> {
    pub(crate) fn from_wire(wire: BitWire) -> Self {
        Self {
            wire,
            _pd: PhantomData,
        }
    }

    pub(crate) fn wire(&self) -> &BitWire {
        &self.wire
    }
}

impl<B: BatchKind> Bit<Public, B> {
    /// Creates a public bit known to every party.
    pub fn new_public(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<bool>,
    ) -> Result<Self, FrontendError> {
        let values = B::into_batch::<bool>(value);
        Ok(Self::from_wire(BitWire::input(
            scheduler,
            &values,
            B::BATCHED,
            Input::Public,
        )?))
    }

    /// Returns the plaintext value.
    pub fn get_value(&self) -> Result<B::Value<bool>, FrontendError> {
        Ok(B::from_batch(self.wire.values()?))
    }
}

impl<B: BatchKind> Bit<Secret, B> {
    /// Creates a secret bit holding an input of `party`. Other parties pass a placeholder.
    pub fn new_secret(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<bool>,
        party: PartyId,
    ) -> Result<Self, FrontendError> {
        let values = B::into_batch::<bool>(value);
        Ok(Self::from_wire(BitWire::input(
            scheduler,
            &values,
            B::BATCHED,
            Input::Private(party),
        )?))
    }

    /// Recreates a secret bit from a share returned by
    /// [`extract_bit_share`](Self::extract_bit_share).
    pub fn from_share(
        scheduler: &Arc<dyn Scheduler>,
        share: B::Value<bool>,
    ) -> Result<Self, FrontendError> {
        let shares = B::into_batch::<bool>(share);
        Ok(Self::from_wire(BitWire::input(
            scheduler,
            &shares,
            B::BATCHED,
            Input::Share,
        )?))
    }

    /// Returns this party's share of the value.
    pub fn extract_bit_share(&self) -> Result<B::Value<bool>, FrontendError> {
        Ok(B::from_batch(self.wire.shares()?))
    }

    /// Reveals the value to `party`.
    pub fn open_to_party(&self, party: PartyId) -> Result<Bit<Public, B>, FrontendError> {
        Ok(Bit::from_wire(self.wire.open_to_party(party)?))
    }
}

impl<S: SecrecyKind, B: BatchKind> Bit<S, B> {
    /// Computes `self & other`.
    pub fn and<O>(&self, other: &Bit<O, B>) -> Result<Bit<Joined<S, O>, B>, FrontendError>
    where
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        Ok(Bit::from_wire(self.wire.and(&other.wire)?))
    }

    /// Computes `self ^ other`.
    pub fn xor<O>(&self, other: &Bit<O, B>) -> Result<Bit<Joined<S, O>, B>, FrontendError>
    where
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        Ok(Bit::from_wire(self.wire.xor(&other.wire)?))
    }

    /// Computes `!self`.
    pub fn not(&self) -> Result<Self, FrontendError> {
        Ok(Self::from_wire(self.wire.not()?))
    }

    /// Returns `other` where `choice` is set and `self` elsewhere.
    pub fn mux<C, O>(
        &self,
        choice: &Bit<C, B>,
        other: &Bit<O, B>,
    ) -> Result<Bit<Joined<C, Joined<S, O>>, B>, FrontendError>
    where
        C: SecrecyKind + SecrecyJoin<Joined<S, O>>,
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        let diff = self.wire.xor(&other.wire)?;
        let masked = choice.wire.and(&diff)?;
        Ok(Bit::from_wire(self.wire.xor(&masked)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bmpc_scheduler::PlaintextScheduler;
    use rstest::*;

    use crate::types::{Batched, Single};

    #[fixture]
    fn scheduler() -> Arc<dyn Scheduler> {
        Arc::new(PlaintextScheduler::default())
    }

    #[rstest]
    fn test_gates(
        scheduler: Arc<dyn Scheduler>,
        #[values(false, true)] a: bool,
        #[values(false, true)] b: bool,
    ) {
        let x = Bit::<Secret, Single>::new_secret(&scheduler, a, 0).unwrap();
        let y = Bit::<Public, Single>::new_public(&scheduler, b).unwrap();

        let and: Bit<Secret, Single> = x.and(&y).unwrap();
        let xor: Bit<Secret, Single> = y.xor(&x).unwrap();
        let not = y.not().unwrap();

        assert_eq!(and.open_to_party(0).unwrap().get_value().unwrap(), a & b);
        assert_eq!(xor.open_to_party(0).unwrap().get_value().unwrap(), a ^ b);
        assert_eq!(not.get_value().unwrap(), !b);
    }

    #[rstest]
    fn test_mux(scheduler: Arc<dyn Scheduler>, #[values(false, true)] choice: bool) {
        let choice =
            Bit::<Secret, Batched>::new_secret(&scheduler, vec![choice, !choice], 1).unwrap();
        let zeros = Bit::<Public, Batched>::new_public(&scheduler, vec![false; 2]).unwrap();
        let ones = Bit::<Secret, Batched>::new_secret(&scheduler, vec![true; 2], 0).unwrap();

        let selected: Bit<Secret, Batched> = zeros.mux(&choice, &ones).unwrap();
        let expected = choice.open_to_party(0).unwrap().get_value().unwrap();

        assert_eq!(
            selected.open_to_party(0).unwrap().get_value().unwrap(),
            expected
        );
    }

    #[rstest]
    fn test_share_roundtrip(scheduler: Arc<dyn Scheduler>) {
        let x = Bit::<Secret, Batched>::new_secret(&scheduler, vec![true, false], 0).unwrap();
        let share = x.extract_bit_share().unwrap();
        let y = Bit::<Secret, Batched>::from_share(&scheduler, share).unwrap();

        assert_eq!(
            y.open_to_party(0).unwrap().get_value().unwrap(),
            vec![true, false]
        );
    }

    #[rstest]
    fn test_clone_and_drop_track_references(scheduler: Arc<dyn Scheduler>) {
        let x = Bit::<Public, Single>::new_public(&scheduler, true).unwrap();
        let y = x.clone();
        assert_eq!(scheduler.wire_statistics().live, 1);

        drop(x);
        assert!(y.get_value().unwrap());

        drop(y);
        assert_eq!(scheduler.wire_statistics().live, 0);
    }
}
