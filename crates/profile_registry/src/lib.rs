//! # Profile Registry
//!
//! Backend core for managing a fleet of Assetto Corsa Competizione dedicated
//! server profiles. Each profile is a directory of JSON documents (server
//! configuration, settings, event, event rules, entry list, balance of
//! performance, assist rules) named by its numeric id:
//!
//! ```text
//! <root>/
//!   1/
//!     configuration.json
//!     settings.json
//!     event.json
//!     ...
//!   2/
//!     ...
//! ```
//!
//! ## Components
//!
//! * [`DocumentStore`] - reads and writes whole documents inside a profile
//!   directory
//! * [`ServerRegistry`] - the lock-guarded, in-memory list of profiles loaded
//!   from the root at startup and kept in sync on every mutation
//! * [`archive`] - packs a profile into a `.tar.gz` and unpacks an upload into
//!   a new profile
//!
//! ## Usage
//!
//! ```no_run
//! use profile_registry::{archive, DocumentStore, ServerRegistry, SlotMode, Viewer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ServerRegistry::load_all(DocumentStore::new("config"), SlotMode::Extended)?;
//!
//! let copy_id = registry.copy(1)?;
//! let packed = archive::export(&registry, copy_id, Viewer::Admin)?;
//! std::fs::write(&packed.file_name, &packed.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! All operations are synchronous and block on filesystem I/O. Async callers
//! should run them on a blocking thread pool.

pub mod archive;
pub mod document;
pub mod error;
pub mod profile;
pub mod registry;
pub mod store;

pub use archive::{archive_name, export, import, ExportedArchive, UploadedFiles};
pub use error::{
    ArchiveError, ArchiveResult, ErrorKind, RegistryError, RegistryResult, StoreError, StoreResult,
};
pub use profile::{Profile, ProfileId, ServerStatus, Slot, SlotMode, Viewer};
pub use registry::ServerRegistry;
pub use store::DocumentStore;
