//! Storage module
//!
//! Blob storage for uploaded product images and attachments, addressed by
//! paths relative to a storage root.

pub mod driver;
pub mod local;

pub use driver::StorageDriver;
pub use local::LocalStorageDriver;
