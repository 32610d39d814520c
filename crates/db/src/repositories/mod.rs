//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async data-access
//! methods. Methods that read or write independently take `&PgPool`;
//! `*_in` primitives take `&mut PgConnection` so they can participate in
//! a caller-owned transaction.

pub mod content_repo;
pub mod metadata_repo;
pub mod tag_repo;
pub mod version_repo;

pub use content_repo::ContentRepo;
pub use metadata_repo::MetadataRepo;
pub use tag_repo::TagRepo;
pub use version_repo::VersionRepo;
