//! Pushtrain - labeled training data from push history and build results
//!
//! A rate-limited, order-preserving fetch-and-aggregate pipeline:
//! - Discovers candidate changesets from a source-control pushlog
//! - Retrieves per-changeset build outcomes under API rate limits
//! - Detects backed-out changesets from free-text build annotations
//! - Normalizes noisy builder names into stable training labels
//! - Aggregates per-push file touch-sets into feature records
//!
//! # Architecture
//!
//! The pipeline is organized leaf-first:
//! - **types**: wire shapes and the persisted training record
//! - **normalize / backout**: pure text classification
//! - **remote**: pushlog and build-result HTTP clients
//! - **sequencer**: rate-limited lane execution
//! - **aggregate / resolve / pipeline**: merge semantics and orchestration
//! - **dataset**: atomic persistence and multi-file merging
//!
//! # Example
//!
//! ```ignore
//! use pushtrain::{pipeline, NoteScanPolicy, PipelineConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> pushtrain::Result<()> {
//!     let config = PipelineConfig {
//!         remote: "https://hg.example.org/mozilla-central".to_string(),
//!         builds_url: "https://builds.example.org/getRevisionBuilds".to_string(),
//!         start: 14000,
//!         end: 14100,
//!         lanes: 10,
//!         delay: Duration::from_secs(10),
//!         scan_policy: NoteScanPolicy::default(),
//!     };
//!     let records = pipeline::run(&config).await?;
//!     pushtrain::dataset::write_records("out.json".as_ref(), &records)?;
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod backout;
pub mod dataset;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod remote;
pub mod resolve;
pub mod sequencer;
pub mod types;

// Re-export commonly used types
pub use backout::NoteScanPolicy;
pub use error::{PushtrainError, Result};
pub use normalize::BuilderNormalizer;
pub use pipeline::PipelineConfig;
pub use types::{BuildRecord, Changeset, Note, Push, TrainingRecord};
