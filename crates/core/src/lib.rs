pub mod batch;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod incident;

pub use batch::NdjsonBatch;
pub use config::Config;
pub use error::*;
pub use fingerprint::Fingerprint;
pub use incident::*;
