//! # drivegate-store: upstream drive access
//!
//! Everything drivegate needs from the file-storage API behind it:
//!
//! - **Path-addressed lookups** selecting only the fields the gateway reads
//! - **Streaming downloads** of pre-signed URLs, released when dropped
//! - **Storage agnostic**: the gateway only sees the `DriveStore` trait;
//!   `GraphDriveStore` is the Microsoft Graph implementation
//!
//! ```text
//! ┌──────────────────┐
//! │ MetadataResolver │  ← file semantics (404 when no download URL)
//! ├──────────────────┤
//! │   DriveStore     │  ← storage primitives
//! └──────────────────┘
//! ```

mod config;
mod error;
pub mod graph;
mod resolver;
pub mod store;

pub use config::{StoreConfig, DEFAULT_DRIVE_API};
pub use error::{StoreError, StoreResult};
pub use graph::GraphDriveStore;
pub use resolver::{MetadataResolver, NOT_FOUND_MESSAGE};
pub use store::{ByteStream, Download, DriveItem, DriveStore, DOWNLOAD_URL_FIELD, METADATA_FIELDS};
