//! GeoLab Upload
//!
//! Thin wrapper over an S3-compatible object store for lab resources:
//! decode browser data URLs, sanitize filenames, enforce per-category MIME
//! allow-lists and size ceilings, and store under
//! `resources/<timestamp>-<filename>`.

pub mod data_url;
pub mod error;
pub mod filename;
pub mod policy;
pub mod store;
pub mod uploader;

pub use data_url::DataUrl;
pub use error::{UploadError, UploadResult};
pub use filename::{object_key, sanitize_filename};
pub use policy::{CategoryRule, FileCategory, UploadPolicy};
pub use store::{MemoryStore, ObjectStore, StoredObject};
pub use uploader::Uploader;
