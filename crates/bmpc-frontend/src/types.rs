//! Type-level markers for the secrecy and batching of a value.

use bmpc_scheduler::Secrecy;

/// Secrecy of a typed value, known at compile time.
pub trait SecrecyKind: sealed::Sealed + Send + Sync + 'static {
    /// Secrecy recorded on the underlying wires.
    const SECRECY: Secrecy;
}

/// A value only known as shares.
#[derive(Debug, Copy, Clone)]
pub struct Secret;

impl SecrecyKind for Secret {
    const SECRECY: Secrecy = Secrecy::Private;
}

/// A value known to every party.
#[derive(Debug, Copy, Clone)]
pub struct Public;

impl SecrecyKind for Public {
    const SECRECY: Secrecy = Secrecy::Public;
}

/// Secrecy of a value computed from `Self` and `Rhs`: public only if both are.
pub trait SecrecyJoin<Rhs: SecrecyKind>: SecrecyKind {
    /// Resulting secrecy.
    type Output: SecrecyKind;
}

impl SecrecyJoin<Public> for Public {
    type Output = Public;
}

impl SecrecyJoin<Secret> for Public {
    type Output = Secret;
}

impl SecrecyJoin<Public> for Secret {
    type Output = Secret;
}

impl SecrecyJoin<Secret> for Secret {
    type Output = Secret;
}

/// Shorthand for the secrecy of a value computed from `A` and `B`.
pub type Joined<A, B> = <A as SecrecyJoin<B>>::Output;

/// Whether a typed value holds one plaintext or a batch of them.
pub trait BatchKind: sealed::Sealed + Send + Sync + 'static {
    /// Whether the underlying wires are batch wires.
    const BATCHED: bool;

    /// Plaintext representation: `T` for single values, `Vec<T>` for batches.
    type Value<T>;

    /// Converts a plaintext into a list of values.
    fn into_batch<T>(value: Self::Value<T>) -> Vec<T>;

    /// Converts a list of values back into a plaintext.
    ///
    /// # Panics
    ///
    /// Panics for [`Single`] if `values` does not hold exactly one value.
    fn from_batch<T>(values: Vec<T>) -> Self::Value<T>;
}

/// One value per wire.
#[derive(Debug, Copy, Clone)]
pub struct Single;

impl BatchKind for Single {
    const BATCHED: bool = false;

    type Value<T> = T;

    fn into_batch<T>(value: Self::Value<T>) -> Vec<T> {
        vec![value]
    }

    fn from_batch<T>(values: Vec<T>) -> Self::Value<T> {
        let mut values = values.into_iter();
        match (values.next(), values.next()) {
            (Some(value), None) => value,
            _ => panic!("single wires hold exactly one value"),
        }
    }
}

/// A batch of values per wire, evaluated element-wise.
#[derive(Debug, Copy, Clone)]
pub struct Batched;

impl BatchKind for Batched {
    const BATCHED: bool = true;

    type Value<T> = Vec<T>;

    fn into_batch<T>(value: Self::Value<T>) -> Vec<T> {
        value
    }

    fn from_batch<T>(values: Vec<T>) -> Self::Value<T> {
        values
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Secret {}
    impl Sealed for super::Public {}
    impl Sealed for super::Single {}
    impl Sealed for super::Batched {}
}
