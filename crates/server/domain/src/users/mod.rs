//! Known-users membership cache.

pub mod cache;

pub use cache::KnownUsersCache;
