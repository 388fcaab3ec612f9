//! Scheduling and wire bookkeeping for boolean circuits evaluated by multiple parties.
//!
//! A [`Scheduler`] builds and evaluates a circuit one gate at a time, handing out [`WireId`]s that
//! refer to values stored in a [`WireKeeper`]. Secure backends implement the same trait as the
//! plaintext backends provided here, so circuit code can be tested against
//! [`PlaintextScheduler`] and run unchanged on a secure backend.

#![deny(missing_docs, unreachable_pub, unused_must_use)]

mod error;
mod keeper;
pub mod scheduler;
mod wire;

pub use error::SchedulerError;
pub use keeper::{
    WireKeeper, WireKeeperConfig, WireKeeperConfigBuilder, WireKeeperConfigBuilderError,
    WireStatistics, DEFAULT_SHARDS,
};
pub use scheduler::{
    GateStatistics, NetworkPlaintextScheduler, NetworkPlaintextSchedulerConfig, PlaintextScheduler,
    PlaintextSchedulerConfig, Scheduler,
};
pub use wire::{Boolean, Secrecy, WireId};

pub use bmpc_comm::{ErrorKind, PartyId, TrafficStatistics};
