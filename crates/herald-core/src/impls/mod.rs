//! Port implementations.
//!
//! - [`InMemoryJobStore`]: tests and embedded use
//! - [`FileJobStore`]: JSON snapshot on disk, used by the CLI
//! - [`HttpDeliveryClient`]: HTTP email provider
//! - [`LogDeliveryClient`]: dry run

pub mod file_store;
pub mod http_delivery;
pub mod log_delivery;
pub mod memory_store;

pub use self::file_store::FileJobStore;
pub use self::http_delivery::HttpDeliveryClient;
pub use self::log_delivery::LogDeliveryClient;
pub use self::memory_store::InMemoryJobStore;
