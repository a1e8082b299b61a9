//! # KcMapper Source
//!
//! Read-only extraction from the identity server admin API.
//!
//! Provides the [`IdentitySource`] trait consumed by the loaders, a REST
//! implementation backed by reqwest, and a snapshot implementation that
//! serves the same calls from a JSON document.

pub mod client;
pub mod error;
pub mod snapshot;
pub mod source;

pub use client::KeycloakClient;
pub use error::{SourceError, SourceResult};
pub use snapshot::{RealmSnapshot, Snapshot, SnapshotSource};
pub use source::IdentitySource;
