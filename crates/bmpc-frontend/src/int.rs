use std::{marker::PhantomData, sync::Arc};

use bmpc_scheduler::{PartyId, Scheduler};

use crate::{
    bit::Bit,
    types::{BatchKind, Joined, Public, Secret, SecrecyJoin, SecrecyKind},
    wire::{BitWire, Input},
    FrontendError,
};

/// Shares of an [`Int`], one per bit, least significant bit first.
pub type IntShare<B> = Vec<<B as BatchKind>::Value<bool>>;

/// A signed two's-complement integer of `WIDTH` bits held by a scheduler.
///
/// Each bit lives on its own wire, least significant bit first. `WIDTH` must be in `1..=64`.
#[derive(Debug)]
pub struct Int<const WIDTH: usize, S, B> {
    bits: Vec<BitWire>,
    _pd: PhantomData<(S, B)>,
}

impl<const WIDTH: usize, S, B> Clone for Int<WIDTH, S, B> {
    fn clone(&self) -> Self {
        Self::from_wires(self.bits.clone())
    }
}

impl<const WIDTH: usize, S, B> Int<WIDTH, S, B> {
    /// Workaround because `generic_const_exprs` is not available in stable.
    const IS_WIDTH_VALID: () = assert!(matches!(WIDTH, 1..=64), "width must be in 1..=64");

    fn from_wires(bits: Vec<BitWire>) -> Self {
        let _: () = Self::IS_WIDTH_VALID;
        debug_assert_eq!(bits.len(), WIDTH);
        Self {
            bits,
            _pd: PhantomData,
        }
    }

    /// Smallest and largest representable value.
    fn range() -> (i64, i64) {
        let half = 1i128 << (WIDTH - 1);
        ((-half) as i64, (half - 1) as i64)
    }

    /// Splits `values` into bit columns, checking every value before anything is allocated.
    fn encode(values: &[i64]) -> Result<Vec<Vec<bool>>, FrontendError> {
        let (min, max) = Self::range();
        if let Some(value) = values.iter().find(|v| !(min..=max).contains(*v)) {
            return Err(FrontendError::ValueOutOfRange {
                value: *value,
                width: WIDTH,
            });
        }

        Ok((0..WIDTH)
            .map(|i| values.iter().map(|v| (v >> i) & 1 == 1).collect())
            .collect())
    }

    fn decode(columns: Vec<Vec<bool>>) -> Vec<i64> {
        let len = columns.first().map_or(0, Vec::len);
        let shift = 64 - WIDTH;

        (0..len)
            .map(|j| {
                let raw = columns
                    .iter()
                    .enumerate()
                    .fold(0u64, |acc, (i, column)| acc | (u64::from(column[j]) << i));
                // Sign extend from WIDTH bits.
                ((raw << shift) as i64) >> shift
            })
            .collect()
    }

    pub(crate) fn input(
        scheduler: &Arc<dyn Scheduler>,
        values: &[i64],
        batched: bool,
        input: Input,
    ) -> Result<Self, FrontendError> {
        let columns = Self::encode(values)?;
        let bits = columns
            .iter()
            .map(|column| BitWire::input(scheduler, column, batched, input))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_wires(bits))
    }
}

impl<const WIDTH: usize, S, B: BatchKind> Int<WIDTH, S, B> {
    /// Plaintext values of the integer. Only meaningful for public integers.
    pub(crate) fn values(&self) -> Result<Vec<i64>, FrontendError> {
        let columns = self
            .bits
            .iter()
            .map(BitWire::values)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::decode(columns))
    }
}

impl<const WIDTH: usize, B: BatchKind> Int<WIDTH, Public, B> {
    /// Creates a public integer known to every party.
    pub fn new_public(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<i64>,
    ) -> Result<Self, FrontendError> {
        Self::input(scheduler, &B::into_batch::<i64>(value), B::BATCHED, Input::Public)
    }

    /// Returns the plaintext value.
    pub fn get_value(&self) -> Result<B::Value<i64>, FrontendError> {
        Ok(B::from_batch(self.values()?))
    }
}

impl<const WIDTH: usize, B: BatchKind> Int<WIDTH, Secret, B> {
    /// Creates a secret integer holding an input of `party`. Other parties pass a placeholder.
    pub fn new_secret(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<i64>,
        party: PartyId,
    ) -> Result<Self, FrontendError> {
        Self::input(
            scheduler,
            &B::into_batch::<i64>(value),
            B::BATCHED,
            Input::Private(party),
        )
    }

    /// Recreates a secret integer from shares returned by
    /// [`extract_int_share`](Self::extract_int_share).
    pub fn from_share(
        scheduler: &Arc<dyn Scheduler>,
        share: IntShare<B>,
    ) -> Result<Self, FrontendError> {
        if share.len() != WIDTH {
            return Err(FrontendError::InvalidShare {
                expected: WIDTH,
                actual: share.len(),
            });
        }

        let bits = share
            .into_iter()
            .map(|bit| {
                BitWire::input(
                    scheduler,
                    &B::into_batch::<bool>(bit),
                    B::BATCHED,
                    Input::Share,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_wires(bits))
    }

    /// Returns this party's shares of every bit.
    pub fn extract_int_share(&self) -> Result<IntShare<B>, FrontendError> {
        self.bits
            .iter()
            .map(|bit| Ok::<_, FrontendError>(B::from_batch(bit.shares()?)))
            .collect()
    }

    /// Reveals the value to `party`.
    pub fn open_to_party(&self, party: PartyId) -> Result<Int<WIDTH, Public, B>, FrontendError> {
        let bits = self
            .bits
            .iter()
            .map(|bit| bit.open_to_party(party))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Int::from_wires(bits))
    }
}

impl<const WIDTH: usize, S: SecrecyKind, B: BatchKind> Int<WIDTH, S, B> {
    /// Returns `other` where `choice` is set and `self` elsewhere.
    ///
    /// The choice bit is ANDed against all `WIDTH` bits at once, which a secure backend can do in
    /// a single round.
    pub fn mux<C, O>(
        &self,
        choice: &Bit<C, B>,
        other: &Int<WIDTH, O, B>,
    ) -> Result<Int<WIDTH, Joined<C, Joined<S, O>>, B>, FrontendError>
    where
        C: SecrecyKind + SecrecyJoin<Joined<S, O>>,
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        let diffs = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| a.xor(b))
            .collect::<Result<Vec<_>, _>>()?;

        let masked = choice.wire().composite_and(&diffs)?;

        let bits = self
            .bits
            .iter()
            .zip(&masked)
            .map(|(a, m)| a.xor(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Int::from_wires(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bmpc_scheduler::PlaintextScheduler;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::types::{Batched, Single};

    #[fixture]
    fn scheduler() -> Arc<dyn Scheduler> {
        Arc::new(PlaintextScheduler::default())
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(-1)]
    #[case(127)]
    #[case(-128)]
    fn test_roundtrip_8(scheduler: Arc<dyn Scheduler>, #[case] value: i64) {
        let x = Int::<8, Secret, Single>::new_secret(&scheduler, value, 0).unwrap();
        assert_eq!(x.open_to_party(0).unwrap().get_value().unwrap(), value);
    }

    #[rstest]
    fn test_extreme_widths(scheduler: Arc<dyn Scheduler>) {
        let x = Int::<64, Public, Batched>::new_public(&scheduler, vec![i64::MIN, i64::MAX, -7])
            .unwrap();
        assert_eq!(x.get_value().unwrap(), vec![i64::MIN, i64::MAX, -7]);

        let y = Int::<1, Public, Batched>::new_public(&scheduler, vec![0, -1]).unwrap();
        assert_eq!(y.get_value().unwrap(), vec![0, -1]);
    }

    #[rstest]
    #[case(128)]
    #[case(-129)]
    fn test_out_of_range(scheduler: Arc<dyn Scheduler>, #[case] value: i64) {
        let err = Int::<8, Public, Batched>::new_public(&scheduler, vec![1, value]).unwrap_err();

        assert!(matches!(err, FrontendError::ValueOutOfRange { width: 8, .. }));
        assert_eq!(err.kind(), bmpc_scheduler::ErrorKind::InvalidInput);
        assert_eq!(scheduler.wire_statistics().allocated, 0);
    }

    #[rstest]
    fn test_mux(scheduler: Arc<dyn Scheduler>) {
        let a = Int::<16, Secret, Batched>::new_secret(&scheduler, vec![100, -5, 7], 0).unwrap();
        let b = Int::<16, Public, Batched>::new_public(&scheduler, vec![-300, 42, 7]).unwrap();
        let choice =
            Bit::<Secret, Batched>::new_secret(&scheduler, vec![true, false, true], 1).unwrap();

        let c: Int<16, Secret, Batched> = a.mux(&choice, &b).unwrap();
        assert_eq!(
            c.open_to_party(0).unwrap().get_value().unwrap(),
            vec![-300, -5, 7]
        );

        // Public choice over secret operands takes the pairwise path.
        let public_choice = Bit::<Public, Batched>::new_public(&scheduler, vec![false, true, true])
            .unwrap();
        let d: Int<16, Secret, Batched> = b.mux(&public_choice, &a).unwrap();
        assert_eq!(
            d.open_to_party(0).unwrap().get_value().unwrap(),
            vec![-300, -5, 7]
        );
    }

    #[rstest]
    fn test_share_roundtrip(scheduler: Arc<dyn Scheduler>) {
        let x = Int::<12, Secret, Single>::new_secret(&scheduler, -1000, 1).unwrap();
        let share = x.extract_int_share().unwrap();
        assert_eq!(share.len(), 12);

        let y = Int::<12, Secret, Single>::from_share(&scheduler, share).unwrap();
        assert_eq!(y.open_to_party(1).unwrap().get_value().unwrap(), -1000);

        let err = Int::<12, Secret, Single>::from_share(&scheduler, vec![true; 3]).unwrap_err();
        assert!(matches!(
            err,
            FrontendError::InvalidShare {
                expected: 12,
                actual: 3
            }
        ));
    }
}
