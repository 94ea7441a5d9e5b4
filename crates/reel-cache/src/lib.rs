//! Content-addressed on-disk cache.
//!
//! Expensive collaborator calls (scene planning, TTS, image generation) are
//! cached under keys derived deterministically from their logical inputs, so
//! a re-run of the same story hits instead of recomputing. Entries are
//! created on first miss and read-only thereafter. Concurrent misses on the
//! same key collapse into a single producer invocation.

pub mod key;
pub mod store;

pub use key::{make_key, CACHE_VERSION};
pub use store::{Cache, CacheError, CacheResult};
