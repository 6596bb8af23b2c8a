//! The server registry: every loaded profile, kept in sync with its
//! backing directory.
//!
//! One coarse lock guards the whole list. Lookups are linear scans, which is
//! fine for the tens to low hundreds of profiles an operator manages. Every
//! read hands out owned copies, so callers can never observe or mutate the
//! list outside the lock.

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::profile::{Profile, ProfileId, ServerStatus, SlotMode, Viewer};
use crate::store::DocumentStore;

/// In-memory registry of server profiles
#[derive(Debug)]
pub struct ServerRegistry {
    store: DocumentStore,
    mode: SlotMode,
    profiles: Mutex<Vec<Profile>>,
}

impl ServerRegistry {
    /// An empty registry over `store`. Nothing is read from disk.
    pub fn new(store: DocumentStore, mode: SlotMode) -> Self {
        Self {
            store,
            mode,
            profiles: Mutex::new(Vec::new()),
        }
    }

    /// Load every profile directory under the store root.
    ///
    /// Any unreadable directory or document aborts the whole load: the
    /// registry is never handed out partially populated, and callers are
    /// expected to treat the error as fatal.
    #[instrument(skip(store), fields(root = %store.root().display()))]
    pub fn load_all(store: DocumentStore, mode: SlotMode) -> RegistryResult<Self> {
        info!("Loading server list...");

        let mut profiles = Vec::new();
        for id in store.list_profile_dirs()? {
            let profile = store.load_profile(id, mode)?;
            profiles.push(profile);
        }

        info!("Server list loaded successfully ({} servers)", profiles.len());
        Ok(Self {
            store,
            mode,
            profiles: Mutex::new(profiles),
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn mode(&self) -> SlotMode {
        self.mode
    }

    /// Snapshot of every profile in insertion order.
    pub fn list(&self) -> Vec<Profile> {
        self.profiles.lock().clone()
    }

    /// Snapshot of every profile as `viewer` may see it.
    pub fn list_for(&self, viewer: Viewer) -> Vec<Profile> {
        self.profiles
            .lock()
            .iter()
            .map(|profile| profile.view(viewer))
            .collect()
    }

    /// Public summary of every profile.
    pub fn status(&self) -> Vec<ServerStatus> {
        self.profiles.lock().iter().map(Profile::status).collect()
    }

    pub fn ids(&self) -> Vec<ProfileId> {
        self.profiles.lock().iter().map(|profile| profile.id).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.lock().is_empty()
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.profiles.lock().iter().any(|profile| profile.id == id)
    }

    /// Copy of the profile with `id`.
    pub fn get_by_id(&self, id: ProfileId) -> RegistryResult<Profile> {
        self.profiles
            .lock()
            .iter()
            .find(|profile| profile.id == id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    pub fn get_by_id_for(&self, id: ProfileId, viewer: Viewer) -> RegistryResult<Profile> {
        self.profiles
            .lock()
            .iter()
            .find(|profile| profile.id == id)
            .map(|profile| profile.view(viewer))
            .ok_or(RegistryError::NotFound(id))
    }

    /// Persist `profile` and replace the entry with the same id, or append it
    /// when no such entry exists.
    ///
    /// Every slot the registry's mode requires must be present; otherwise
    /// nothing is written. The documents hit disk before the in-memory entry
    /// changes, so a failed write leaves the registry as it was.
    #[instrument(skip(self, profile), fields(id = profile.id))]
    pub fn save(&self, profile: Profile) -> RegistryResult<()> {
        if let Some(slot) = self
            .mode
            .required_slots()
            .iter()
            .find(|slot| !profile.has_slot(**slot))
        {
            warn!("Rejecting save of profile {} without {}", profile.id, slot.field_name());
            return Err(RegistryError::MissingSlot(profile.id, slot.field_name()));
        }

        let mut profiles = self.profiles.lock();

        self.store.save_profile(&profile)?;

        match profiles.iter_mut().find(|existing| existing.id == profile.id) {
            Some(existing) => {
                debug!("Replacing profile {}", profile.id);
                *existing = profile;
            }
            None => {
                info!("Adding profile {} through save", profile.id);
                profiles.push(profile);
            }
        }

        Ok(())
    }

    /// Duplicate profile `source_id` under a freshly allocated id and return
    /// that id.
    #[instrument(skip(self))]
    pub fn copy(&self, source_id: ProfileId) -> RegistryResult<ProfileId> {
        let mut profiles = self.profiles.lock();
        let source = profiles
            .iter()
            .find(|profile| profile.id == source_id)
            .cloned()
            .ok_or(RegistryError::NotFound(source_id))?;

        let id = self.insert_locked(&mut profiles, |store, id| {
            let mut copy = source.clone();
            copy.id = id;
            store.save_profile(&copy).map_err(RegistryError::from)
        })?;

        info!("Copied profile {} to {}", source_id, id);
        Ok(id)
    }

    /// Remove profile `id` from the registry and delete its directory.
    #[instrument(skip(self))]
    pub fn delete(&self, id: ProfileId) -> RegistryResult<()> {
        let mut profiles = self.profiles.lock();

        let index = profiles
            .iter()
            .position(|profile| profile.id == id)
            .ok_or(RegistryError::NotFound(id))?;

        self.store.remove_profile_dir(id)?;
        profiles.remove(index);

        info!("Deleted profile {}", id);
        Ok(())
    }

    /// Allocate the next id, let `populate` fill its new directory, then load
    /// the directory back exactly as [`ServerRegistry::load_all`] would and
    /// register the result.
    ///
    /// Runs entirely under the registry lock so concurrent callers can never
    /// allocate the same id. If `populate` or the reload fails the directory
    /// is removed again before the error is returned.
    pub(crate) fn insert_with<E, F>(&self, populate: F) -> Result<ProfileId, E>
    where
        E: From<RegistryError>,
        F: FnOnce(&DocumentStore, ProfileId) -> Result<(), E>,
    {
        let mut profiles = self.profiles.lock();
        self.insert_locked(&mut profiles, populate)
    }

    /// [`ServerRegistry::insert_with`] for a caller already holding the lock.
    fn insert_locked<E, F>(&self, profiles: &mut Vec<Profile>, populate: F) -> Result<ProfileId, E>
    where
        E: From<RegistryError>,
        F: FnOnce(&DocumentStore, ProfileId) -> Result<(), E>,
    {
        let id = next_id(profiles)?;
        if self.store.profile_dir(id).exists() {
            error!("Directory for unallocated profile {} already exists", id);
            return Err(RegistryError::ConflictingId(id).into());
        }

        self.store
            .create_profile_dir(id)
            .map_err(RegistryError::from)?;

        let loaded = populate(&self.store, id).and_then(|()| {
            self.store
                .load_profile(id, self.mode)
                .map_err(|e| E::from(RegistryError::from(e)))
        });

        match loaded {
            Ok(profile) => {
                profiles.push(profile);
                Ok(id)
            }
            Err(e) => {
                warn!("Rolling back partially written profile {}", id);
                if let Err(cleanup) = self.store.remove_profile_dir(id) {
                    error!("Failed to remove profile directory {}: {}", id, cleanup);
                }
                Err(e)
            }
        }
    }
}

/// `max(existing) + 1`, or 1 for an empty registry.
fn next_id(profiles: &[Profile]) -> RegistryResult<ProfileId> {
    match profiles.iter().map(|profile| profile.id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or(RegistryError::ConflictingId(max)),
    }
}
