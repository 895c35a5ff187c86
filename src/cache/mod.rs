//! Process-wide TTL cache over upstream data.
//!
//! Entries are replaced wholesale on refresh and expire by TTL only;
//! an expired entry remains readable through the stale-tolerant path
//! until the next successful refresh overwrites it.

pub mod entry;
mod lock;
pub mod store;

pub use entry::CacheEntry;
pub use store::CacheStore;
