//! Streaming MD5 / SHA-1 / SHA-256 / SHA-512 digests for text and files,
//! with concurrent file batches, polled progress and cancellation.

pub mod batch;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod hashers;
pub mod models;
pub mod utils;

pub use batch::{BatchCoordinator, Progress};
pub use config::HasherConfig;
pub use error::HashError;
pub use file_ops::FileHashTask;
pub use hashers::compute_text_hash;
pub use models::{Algorithm, HashRecord, HashStatus};
