//! Typed values on top of a [`Scheduler`](bmpc_scheduler::Scheduler).
//!
//! [`Bit`], [`Int`] and [`AsciiString`] carry their secrecy ([`Secret`] or [`Public`]) and
//! batching ([`Single`] or [`Batched`]) in their type, so that reading a secret value or mixing
//! single and batched operands is rejected at compile time. Every value owns references to its
//! wires and releases them when dropped.
//!
//! ```
//! use std::sync::Arc;
//!
//! use bmpc_frontend::{Bit, Public, Secret, Single};
//! use bmpc_scheduler::{PlaintextScheduler, Scheduler};
//!
//! let scheduler: Arc<dyn Scheduler> = Arc::new(PlaintextScheduler::default());
//!
//! let a = Bit::<Secret, Single>::new_secret(&scheduler, true, 0).unwrap();
//! let b = Bit::<Public, Single>::new_public(&scheduler, false).unwrap();
//!
//! let c: Bit<Secret, Single> = a.xor(&b).unwrap();
//! assert!(c.open_to_party(0).unwrap().get_value().unwrap());
//! ```

#![deny(missing_docs, unused_must_use)]

mod bit;
mod error;
mod int;
mod string;
pub mod types;
mod wire;

pub use bit::Bit;
pub use error::FrontendError;
pub use int::{Int, IntShare};
pub use string::{AsciiString, AsciiStringShare};
pub use types::{Batched, Public, Secret, Single};
