pub mod auth;
pub mod client;
pub mod job;
pub mod loader;

pub use auth::TokenSource;
pub use client::{BigQueryClient, PollPolicy, WarehouseError};
pub use job::{Job, JobState};
pub use loader::{LoadReport, Warehouse};
