//! Map type backing the sparse tick, bitmap and position tables.
//!
//! `rustc-hash` wins when enabled (the default), then `ahash`; with neither
//! feature the std SipHash map is used.

#[cfg(feature = "rustc-hash")]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(feature = "ahash", not(feature = "rustc-hash")))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(not(any(feature = "rustc-hash", feature = "ahash")))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
