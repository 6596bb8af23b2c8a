//! JSON document store backing the registry.
//!
//! Every profile lives in `<root>/<id>/`, one JSON file per slot. Documents
//! are read and written whole; there is no field-level merge.

use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::document::parse_document;
use crate::error::{StoreError, StoreResult};
use crate::profile::{Profile, ProfileId, Slot, SlotMode};

/// Filesystem store for profile documents
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `root`. The directory is not touched here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing profile `id`
    pub fn profile_dir(&self, id: ProfileId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Path of `slot` inside profile `id`
    pub fn slot_path(&self, id: ProfileId, slot: Slot) -> PathBuf {
        self.profile_dir(id).join(slot.file_name())
    }

    /// Load a single document
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        let data = self.read_raw(path)?;
        parse_document(&data).map_err(|e| StoreError::Parse(path.to_path_buf(), e))
    }

    /// Write a single document as pretty JSON, replacing any previous content.
    pub fn save<T: Serialize>(&self, path: &Path, document: &T) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::Serialize(path.to_path_buf(), e))?;
        self.write_raw(path, &json)
    }

    pub fn read_raw(&self, path: &Path) -> StoreResult<Vec<u8>> {
        debug!("Reading {}", path.display());
        fs::read(path).map_err(|e| StoreError::Read(path.to_path_buf(), e))
    }

    /// Write bytes through a sibling temp file so readers never see a
    /// half-written document.
    pub fn write_raw(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        debug!("Writing {} ({} bytes)", path.display(), data.len());
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, data).map_err(|e| StoreError::Write(temp_path.clone(), e))?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::Write(path.to_path_buf(), e)
        })
    }

    /// Ids of every profile directory under the root, ascending.
    ///
    /// Plain files directly under the root are skipped; a directory whose
    /// name is not a decimal id is an error.
    pub fn list_profile_dirs(&self) -> StoreResult<Vec<ProfileId>> {
        let entries =
            fs::read_dir(&self.root).map_err(|e| StoreError::DirectoryRead(self.root.clone(), e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::DirectoryRead(self.root.clone(), e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| StoreError::DirectoryRead(entry.path(), e))?;
            if !file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let id = name
                .parse::<ProfileId>()
                .map_err(|_| StoreError::InvalidProfileDir(name.clone()))?;
            ids.push(id);
        }

        ids.sort_unstable();
        Ok(ids)
    }

    /// Load every required slot of profile `id`, plus any optional slot whose
    /// file exists.
    #[instrument(skip(self))]
    pub fn load_profile(&self, id: ProfileId, mode: SlotMode) -> StoreResult<Profile> {
        let mut profile = Profile::new(id);
        profile.configuration = self.load(&self.slot_path(id, Slot::Configuration))?;
        profile.settings = self.load(&self.slot_path(id, Slot::Settings))?;
        profile.event = self.load(&self.slot_path(id, Slot::Event))?;
        profile.event_rules = self.load_slot(id, Slot::EventRules, mode)?;
        profile.entrylist = self.load_slot(id, Slot::EntryList, mode)?;
        profile.bop = self.load_slot(id, Slot::Bop, mode)?;
        profile.assist_rules = self.load_slot(id, Slot::AssistRules, mode)?;

        debug!("Loaded profile {} with {} slots", id, profile.present_slots().len());
        Ok(profile)
    }

    fn load_slot<T: DeserializeOwned>(
        &self,
        id: ProfileId,
        slot: Slot,
        mode: SlotMode,
    ) -> StoreResult<Option<T>> {
        let path = self.slot_path(id, slot);
        if !mode.is_required(slot) && !path.exists() {
            return Ok(None);
        }
        self.load(&path).map(Some)
    }

    /// Write every present slot of `profile` into its directory, creating the
    /// directory if needed. Files of empty optional slots are removed so the
    /// directory mirrors the profile.
    #[instrument(skip(self, profile), fields(id = profile.id))]
    pub fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        let dir = self.profile_dir(profile.id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::Write(dir.clone(), e))?;

        for slot in Slot::ALL {
            let path = self.slot_path(profile.id, slot);
            match profile.document_json(slot) {
                Some(json) => {
                    let json = json.map_err(|e| StoreError::Serialize(path.clone(), e))?;
                    self.write_raw(&path, &json)?;
                }
                None => match fs::remove_file(&path) {
                    Ok(()) => debug!("Removed stale {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StoreError::Write(path, e)),
                },
            }
        }

        info!("Saved profile {}", profile.id);
        Ok(())
    }

    /// Create the directory for a new profile. Fails if it already exists.
    pub fn create_profile_dir(&self, id: ProfileId) -> StoreResult<PathBuf> {
        let dir = self.profile_dir(id);
        fs::create_dir(&dir).map_err(|e| StoreError::Write(dir.clone(), e))?;
        Ok(dir)
    }

    /// Remove a profile directory and everything in it. A directory that is
    /// already gone is not an error.
    pub fn remove_profile_dir(&self, id: ProfileId) -> StoreResult<()> {
        let dir = self.profile_dir(id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write(dir, e)),
        }
    }
}
