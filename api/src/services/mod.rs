//! Services module
//!
//! Business logic that coordinates the repository and blob storage.

pub mod file_resolver;
pub mod media;

pub use file_resolver::{FileKind, FileRecord, FileRecordStore, FileResolver, ResolvedFile};
pub use media::{MediaService, UploadPolicy, UploadedFile};
