//! KcMapper Core Library
//!
//! Graph vocabulary, source record helpers and the property normalizer
//! shared by the extraction and loading crates.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod record;

pub use config::{GraphConfig, SourceConfig};
pub use error::{KcmError, KcmResult};
pub use model::{NodeLabel, RelType};
pub use normalize::{clean_properties, Properties};
pub use record::Record;
