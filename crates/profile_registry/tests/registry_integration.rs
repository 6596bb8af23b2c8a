//! End-to-end tests for the registry and archive transform
//!
//! These tests drive the public API against real profile directories in a
//! temporary root, the way the operator CLI does.

use profile_registry::document::{AssistRules, Bop, EntryList, EventRules};
use profile_registry::{
    archive, DocumentStore, ErrorKind, Profile, ProfileId, RegistryError, ServerRegistry, Slot,
    SlotMode, UploadedFiles, Viewer,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Write a complete seven-slot profile directory by hand.
fn write_profile_dir(root: &Path, id: ProfileId, server_name: &str) {
    let dir = root.join(id.to_string());
    fs::create_dir_all(&dir).unwrap();

    let files = [
        ("configuration.json", r#"{"udpPort": 9231, "tcpPort": 9232, "maxConnections": 85, "lanDiscovery": 1, "registerToLobby": 1, "configVersion": 1}"#.to_string()),
        ("settings.json", format!(r#"{{"serverName": "{}", "adminPassword": "admin", "carGroup": "GT3", "maxCarSlots": 30}}"#, server_name)),
        ("event.json", r#"{"track": "spa", "ambientTemp": 22, "cloudLevel": 0.3, "rain": 0.0, "sessions": [{"hourOfDay": 14, "dayOfWeekend": 3, "timeMultiplier": 1, "sessionType": "R", "sessionDurationMinutes": 30}]}"#.to_string()),
        ("eventRules.json", r#"{"pitWindowLengthSec": -1, "mandatoryPitstopCount": 1, "isRefuellingAllowedInRace": true}"#.to_string()),
        ("entrylist.json", r#"{"entries": [], "forceEntryList": 0}"#.to_string()),
        ("bop.json", r#"{"entries": [{"track": "spa", "carModel": 20, "ballastKg": 5}]}"#.to_string()),
        ("assistRules.json", r#"{"stabilityControlLevelMax": 0, "disableIdealLine": 1}"#.to_string()),
    ];

    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

fn seeded_registry(ids: &[ProfileId]) -> (TempDir, ServerRegistry) {
    let temp = TempDir::new().unwrap();
    for id in ids {
        write_profile_dir(temp.path(), *id, &format!("Server {}", id));
    }
    let registry =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    (temp, registry)
}

#[test]
fn test_copy_then_delete_scenario() {
    let (temp, registry) = seeded_registry(&[1, 2, 3]);

    let new_id = registry.copy(2).unwrap();
    assert_eq!(new_id, 4);

    let source = registry.get_by_id(2).unwrap();
    let copy = registry.get_by_id(4).unwrap();
    assert_eq!(copy.configuration, source.configuration);
    assert_eq!(copy.settings, source.settings);
    assert_eq!(copy.event, source.event);
    assert_eq!(copy.event_rules, source.event_rules);
    assert_eq!(copy.entrylist, source.entrylist);
    assert_eq!(copy.bop, source.bop);
    assert_eq!(copy.assist_rules, source.assist_rules);

    registry.delete(1).unwrap();
    assert_eq!(registry.ids(), vec![2, 3, 4]);
    assert!(matches!(registry.get_by_id(1), Err(RegistryError::NotFound(1))));
    assert!(!temp.path().join("1").exists());
    assert!(temp.path().join("4").is_dir());
}

#[test]
fn test_copy_id_exceeds_every_existing_id() {
    let (_temp, registry) = seeded_registry(&[2, 9, 4]);

    let before = registry.ids();
    let new_id = registry.copy(4).unwrap();
    assert!(before.iter().all(|id| new_id > *id));
}

#[test]
fn test_registry_survives_reload() {
    let (temp, registry) = seeded_registry(&[1]);

    let copy_id = registry.copy(1).unwrap();
    let mut edited = registry.get_by_id(copy_id).unwrap();
    edited.event.track = "imola".to_string();
    registry.save(edited.clone()).unwrap();

    let reloaded =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    assert_eq!(reloaded.list(), registry.list());
    assert_eq!(reloaded.get_by_id(copy_id).unwrap(), edited);
}

#[test]
fn test_export_import_round_trip_is_byte_identical() {
    let (temp, registry) = seeded_registry(&[1]);

    let packed = archive::export(&registry, 1, Viewer::Admin).unwrap();
    let uploads = UploadedFiles::from_archive(&packed.bytes).unwrap();
    let new_id = archive::import(&registry, &uploads).unwrap();
    assert_eq!(new_id, 2);

    for slot in Slot::ALL {
        let original = fs::read(temp.path().join("1").join(slot.file_name())).unwrap();
        let imported = fs::read(temp.path().join("2").join(slot.file_name())).unwrap();
        assert_eq!(original, imported, "{} differs after round trip", slot.file_name());
    }

    let mut original = registry.get_by_id(1).unwrap();
    original.id = new_id;
    assert_eq!(registry.get_by_id(new_id).unwrap(), original);
}

#[test]
fn test_import_matches_startup_load() {
    let (temp, registry) = seeded_registry(&[]);
    let source = TempDir::new().unwrap();
    write_profile_dir(source.path(), 1, "Uploaded");

    let uploads = UploadedFiles::from_dir(&source.path().join("1")).unwrap();
    let id = archive::import(&registry, &uploads).unwrap();

    let reloaded =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    assert_eq!(reloaded.get_by_id(id).unwrap(), registry.get_by_id(id).unwrap());
}

#[test]
fn test_import_with_missing_or_empty_slot_changes_nothing() {
    let (temp, registry) = seeded_registry(&[1]);
    let packed = archive::export(&registry, 1, Viewer::Admin).unwrap();
    let complete = UploadedFiles::from_archive(&packed.bytes).unwrap();

    for slot in Slot::ALL {
        let mut missing = UploadedFiles::new();
        let mut empty = UploadedFiles::new();
        for other in Slot::ALL {
            let bytes = complete.get(other).unwrap().to_vec();
            if other == slot {
                empty.insert(other.field_name(), Vec::new());
            } else {
                missing.insert(other.field_name(), bytes.clone());
                empty.insert(other.field_name(), bytes);
            }
        }

        let err = archive::import(&registry, &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingSlot);

        let err = archive::import(&registry, &empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyUpload);
    }

    assert_eq!(registry.ids(), vec![1]);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn test_startup_load_is_fail_fast() {
    let temp = TempDir::new().unwrap();
    write_profile_dir(temp.path(), 1, "Good");
    write_profile_dir(temp.path(), 2, "Broken");
    fs::remove_file(temp.path().join("2").join("bop.json")).unwrap();

    let err =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadError);

    // basic mode does not need the bop table
    let registry =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Basic).unwrap();
    assert_eq!(registry.ids(), vec![1, 2]);
    assert!(registry.get_by_id(2).unwrap().bop.is_none());
}

#[test]
fn test_concurrent_save_and_get_never_tear() {
    let (_temp, registry) = seeded_registry(&[1, 2, 3]);
    let registry = Arc::new(registry);

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for round in 0..50 {
                let mut profile = registry.get_by_id(1).unwrap();
                profile.settings.server_name = format!("Round {}", round);
                profile.settings.max_car_slots = round;
                registry.save(profile).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let profile = registry.get_by_id(1).unwrap();
                    let name = &profile.settings.server_name;
                    if let Some(round) = name.strip_prefix("Round ") {
                        // both fields come from the same save
                        assert_eq!(round.parse::<i32>().unwrap(), profile.settings.max_car_slots);
                    }
                    assert_eq!(registry.ids(), vec![1, 2, 3]);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(registry.get_by_id(1).unwrap().settings.server_name, "Round 49");
}

#[test]
fn test_concurrent_copies_allocate_distinct_ids() {
    let (_temp, registry) = seeded_registry(&[1]);
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.copy(1).unwrap())
        })
        .collect();

    let mut ids: Vec<ProfileId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (2..=9).collect::<Vec<_>>());
    assert_eq!(registry.len(), 9);
}

#[test]
fn test_save_without_required_slot_keeps_restart_working() {
    let (temp, registry) = seeded_registry(&[1]);

    let mut partial = registry.get_by_id(1).unwrap();
    partial.event_rules = None;
    let err = registry.save(partial).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingSlot);
    assert!(temp.path().join("1").join("eventRules.json").is_file());

    let reloaded =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    assert_eq!(reloaded.list(), registry.list());
}

#[test]
fn test_copy_racing_delete_matches_disk() {
    for _ in 0..20 {
        let (temp, registry) = seeded_registry(&[1]);
        let registry = Arc::new(registry);

        let copier = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.copy(1))
        };
        let deleter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.delete(1))
        };

        let copied = copier.join().unwrap();
        deleter.join().unwrap().unwrap();

        match copied {
            Ok(id) => assert_eq!(registry.ids(), vec![id]),
            Err(RegistryError::NotFound(1)) => assert!(registry.is_empty()),
            Err(e) => panic!("unexpected copy failure: {}", e),
        }

        let reloaded =
            ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
        assert_eq!(reloaded.list(), registry.list());
    }
}

#[test]
fn test_unknown_document_fields_survive_copy() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("1");
    write_profile_dir(temp.path(), 1, "Nations");
    fs::write(
        dir.join("entrylist.json"),
        r#"{"entries": [{"drivers": [{"firstName": "Ada", "nationality": 12, "helmetStyle": 4}], "raceNumber": 7}], "forceEntryList": 1}"#,
    )
    .unwrap();
    fs::write(
        dir.join("event.json"),
        r#"{"track": "spa", "metaData": "league-round-3", "postRaceSeconds": 15}"#,
    )
    .unwrap();

    let registry =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    let copy_id = registry.copy(1).unwrap();

    let copied = fs::read(temp.path().join(copy_id.to_string()).join("entrylist.json")).unwrap();
    let entrylist: serde_json::Value = serde_json::from_slice(&copied).unwrap();
    let driver = &entrylist["entries"][0]["drivers"][0];
    assert_eq!(driver["nationality"], 12);
    assert_eq!(driver["helmetStyle"], 4);

    let copy = registry.get_by_id(copy_id).unwrap();
    assert_eq!(copy.event.meta_data, "league-round-3");
    assert_eq!(copy.event.post_race_seconds, 15);
}

#[test]
fn test_import_rejects_array_documents() {
    let (temp, registry) = seeded_registry(&[]);
    let source = TempDir::new().unwrap();
    write_profile_dir(source.path(), 1, "Arrays");
    fs::write(source.path().join("1").join("bop.json"), "[]").unwrap();

    let uploads = UploadedFiles::from_dir(&source.path().join("1")).unwrap();
    let err = archive::import(&registry, &uploads).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    assert!(registry.is_empty());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_save_of_typed_profile_round_trips_through_disk() {
    let (temp, registry) = seeded_registry(&[]);

    let mut profile = Profile::new(3);
    profile.settings.server_name = "Typed".to_string();
    profile.event_rules = Some(EventRules {
        mandatory_pitstop_count: 2,
        ..Default::default()
    });
    profile.entrylist = Some(EntryList::default());
    profile.bop = Some(Bop::default());
    profile.assist_rules = Some(AssistRules::default());
    registry.save(profile.clone()).unwrap();

    let reloaded =
        ServerRegistry::load_all(DocumentStore::new(temp.path()), SlotMode::Extended).unwrap();
    assert_eq!(reloaded.get_by_id(3).unwrap(), profile);
}
