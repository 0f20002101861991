//! Encodewatch-Common: Shared types used across encodewatch.
//!
//! - **Typed IDs**: [`JobId`], a UUID wrapper identifying one supervised job
//! - **Media metadata**: the probe record ([`MediaMetadata`]) a job is built from
//! - **Progress**: the [`ProgressUpdate`] snapshots emitted while a job runs
//!
//! # Examples
//!
//! ```
//! use encodewatch_common::{JobId, MediaKind, MediaMetadata};
//!
//! let metadata: MediaMetadata = serde_json::from_str(
//!     r#"{"format": {"duration": "12.5"}, "streams": [{"codec_type": "audio"}]}"#,
//! ).unwrap();
//!
//! assert_eq!(metadata.duration_secs(), 12.5);
//! assert_eq!(metadata.media_kind(), MediaKind::Audio);
//! let _id = JobId::new();
//! ```

pub mod ids;
pub mod types;

pub use ids::*;
pub use types::*;
