//! Caching for forum data and rendered fragments.
//!
//! - `resource`: the TTL-keyed `ResourceCache` used for both the raw tier
//!   (decoded API responses) and the rendered tier (HTML fragments)
//! - `snapshot`: the persisted snapshot of non-automatic groups

pub mod resource;
pub mod snapshot;

pub use resource::{CacheKey, ResourceCache, ResourceKind};
pub use snapshot::{GroupSnapshotStore, JsonFileSnapshot, MemorySnapshot};
