//! Ports: the seams between the queue logic and the outside world.
//!
//! - [`JobStore`]: persisted jobs, history and attempt log
//! - [`DeliveryClient`]: outbound email transport
//! - [`Clock`] / [`IdGenerator`]: injectable time and identities

pub mod clock;
pub mod delivery;
pub mod id_generator;
pub mod job_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery::{DeliveryClient, DeliveryError, DeliveryReceipt, EmailTag, OutboundEmail};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_store::{Completion, JobStore, StoreError};
