//! Archive transform: packs a profile's documents into a single `.tar.gz`
//! and unpacks an upload back into a new profile.
//!
//! Archive entries are flat and named exactly like the slot files on disk,
//! so an exported archive can be fed straight back into [`import`].
//!
//! Only gzip-compressed tar archives are read. Zip bundles are not; unpack
//! them first and import the directory with [`UploadedFiles::from_dir`].

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::{
    collections::HashMap,
    fs,
    io::Read,
    path::Path,
};
use tar::{Archive, Builder, Header};
use tracing::{debug, info, instrument};

use crate::error::{ArchiveError, ArchiveResult, RegistryError, StoreError};
use crate::profile::{ProfileId, Slot, Viewer};
use crate::registry::ServerRegistry;

/// File name of the archive exported for profile `id`
pub fn archive_name(id: ProfileId) -> String {
    format!("{}.tar.gz", id)
}

/// A packed profile ready to be handed to a client
#[derive(Debug, Clone)]
pub struct ExportedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Named byte streams making up an import, keyed by upload field name
/// (`configuration`, `settings`, `eventRules`, ...).
///
/// Fields that do not name a slot are kept but never read.
#[derive(Debug, Clone, Default)]
pub struct UploadedFiles {
    files: HashMap<String, Vec<u8>>,
}

impl UploadedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(field.into(), bytes);
    }

    pub fn with(mut self, field: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(field, bytes.into());
        self
    }

    /// Bytes uploaded for `slot`, if any.
    pub fn get(&self, slot: Slot) -> Option<&[u8]> {
        self.files.get(slot.field_name()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Unpack an archive produced by [`export`]. Entries that are not slot
    /// files are skipped.
    pub fn from_archive(bytes: &[u8]) -> ArchiveResult<Self> {
        let mut archive = Archive::new(GzDecoder::new(bytes));
        let mut uploads = Self::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            let slot = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(Slot::from_file_name);

            match slot {
                Some(slot) => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data)?;
                    uploads.insert(slot.field_name(), data);
                }
                None => debug!("Skipping archive entry {}", path.display()),
            }
        }

        Ok(uploads)
    }

    /// Collect the slot files present in `dir`.
    pub fn from_dir(dir: &Path) -> ArchiveResult<Self> {
        let mut uploads = Self::new();
        for slot in Slot::ALL {
            let path = dir.join(slot.file_name());
            if path.is_file() {
                uploads.insert(slot.field_name(), fs::read(&path)?);
            }
        }
        Ok(uploads)
    }
}

/// Pack every present slot file of profile `id`.
///
/// Admin exports carry the files exactly as stored. Guest exports replace
/// `settings.json` with a copy whose passwords are blanked.
#[instrument(skip(registry))]
pub fn export(registry: &ServerRegistry, id: ProfileId, viewer: Viewer) -> ArchiveResult<ExportedArchive> {
    let profile = registry.get_by_id(id).map_err(|e| match e {
        RegistryError::NotFound(id) => ArchiveError::NotFound(id),
        other => other.into(),
    })?;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for slot in profile.present_slots() {
        let path = registry.store().slot_path(id, slot);
        let data = match (viewer, slot) {
            (Viewer::Guest, Slot::Settings) => {
                serde_json::to_vec_pretty(&profile.redacted().settings)
                    .map_err(|e| StoreError::Serialize(path, e))?
            }
            _ => registry.store().read_raw(&path)?,
        };

        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, slot.file_name(), data.as_slice())?;
    }

    let bytes = builder.into_inner()?.finish()?;

    info!("Exported profile {} ({} bytes)", id, bytes.len());
    Ok(ExportedArchive {
        file_name: archive_name(id),
        bytes,
    })
}

/// Create a new profile from `files` and return its id.
///
/// Every slot the registry's mode requires must be present and non-empty,
/// and every provided slot must parse, before anything is written. The new
/// directory is removed again if writing or reloading it fails.
#[instrument(skip(registry, files), fields(uploads = files.len()))]
pub fn import(registry: &ServerRegistry, files: &UploadedFiles) -> ArchiveResult<ProfileId> {
    for slot in registry.mode().required_slots() {
        match files.get(*slot) {
            None => return Err(ArchiveError::MissingSlot(slot.field_name())),
            Some(bytes) if bytes.is_empty() => {
                return Err(ArchiveError::EmptyUpload(slot.field_name()))
            }
            Some(_) => {}
        }
    }

    let mut documents = Vec::new();
    for slot in Slot::ALL {
        let Some(bytes) = files.get(slot).filter(|bytes| !bytes.is_empty()) else {
            continue;
        };
        slot.validate(bytes)
            .map_err(|e| ArchiveError::Parse(slot.field_name(), e))?;
        documents.push((slot, bytes));
    }

    let id = registry.insert_with::<ArchiveError, _>(|store, id| {
        for (slot, bytes) in &documents {
            let path = store.slot_path(id, *slot);
            store.write_raw(&path, bytes).map_err(|e| match e {
                StoreError::Write(path, e) => ArchiveError::Write(path, e),
                other => ArchiveError::Store(other),
            })?;
        }
        Ok(())
    })?;

    info!("Imported profile {} ({} documents)", id, documents.len());
    Ok(id)
}
