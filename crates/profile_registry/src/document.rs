//! Typed document shapes for every slot of a server profile.
//!
//! Field names follow the dedicated server's own JSON files (camelCase).
//! Fields without a typed counterpart are kept verbatim in `extra` and
//! written back out, and known fields that are absent fall back to their
//! defaults. ACC encodes many
//! switches as `0`/`1` integers rather than booleans; those stay integers
//! here so a document written back out keeps the shape the server expects.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unknown fields of a document, preserved across load and save.
pub type Extra = Map<String, Value>;

/// Parse `bytes` as a slot document. Anything but a JSON object is rejected.
pub fn parse_document<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    match serde_json::from_slice::<Value>(bytes)? {
        value @ Value::Object(_) => serde_json::from_value(value),
        _ => Err(serde::de::Error::custom("expected a JSON object")),
    }
}

/// `configuration.json`: network ports and lobby registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub udp_port: u16,
    pub tcp_port: u16,
    pub max_connections: i32,
    pub lan_discovery: i32,
    pub register_to_lobby: i32,
    pub config_version: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `settings.json`: server identity, access and rating requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server_name: String,
    pub admin_password: String,
    pub car_group: String,
    pub track_medals_requirement: i32,
    pub safety_rating_requirement: i32,
    pub racecraft_rating_requirement: i32,
    pub password: String,
    pub spectator_password: String,
    pub max_car_slots: i32,
    pub dump_leaderboards: i32,
    pub is_race_locked: i32,
    pub randomize_track_when_empty: i32,
    pub central_entry_list_path: String,
    #[serde(rename = "allowAutoDQ")]
    pub allow_auto_dq: i32,
    pub short_formation_lap: i32,
    pub dump_entry_list: i32,
    pub formation_lap_type: i32,
    pub ignore_premature_disconnects: i32,
    pub config_version: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Settings {
    /// Blank every password field.
    pub fn clear_secrets(&mut self) {
        self.admin_password.clear();
        self.password.clear();
        self.spectator_password.clear();
    }
}

/// One practice, qualifying or race session of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub hour_of_day: i32,
    pub day_of_weekend: i32,
    pub time_multiplier: i32,
    pub session_type: String,
    pub session_duration_minutes: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `event.json`: track, weather and the session schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub track: String,
    pub pre_race_waiting_time_seconds: i32,
    pub session_over_time_seconds: i32,
    pub ambient_temp: i32,
    pub cloud_level: f64,
    pub rain: f64,
    pub weather_randomness: i32,
    pub post_qualy_seconds: i32,
    pub post_race_seconds: i32,
    pub simracer_weather_conditions: i32,
    pub is_fixed_condition_qualification: i32,
    pub sessions: Vec<Session>,
    pub meta_data: String,
    pub config_version: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `eventRules.json`: pit window, stint and refuelling rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRules {
    pub qualify_standing_type: i32,
    pub pit_window_length_sec: i32,
    pub driver_stint_time_sec: i32,
    pub mandatory_pitstop_count: i32,
    pub max_total_driving_time: i32,
    pub max_drivers_count: i32,
    pub is_refuelling_allowed_in_race: bool,
    pub is_refuelling_time_fixed: bool,
    pub is_mandatory_pitstop_refuelling_required: bool,
    pub is_mandatory_pitstop_tyre_change_required: bool,
    pub is_mandatory_pitstop_swap_driver_required: bool,
    pub tyre_set_count: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Driver {
    pub first_name: String,
    pub last_name: String,
    pub short_name: String,
    pub driver_category: i32,
    pub nationality: i32,
    #[serde(rename = "playerID")]
    pub player_id: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One car of the entry list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entry {
    pub drivers: Vec<Driver>,
    pub race_number: i32,
    pub forced_car_model: i32,
    pub override_driver_info: i32,
    pub is_server_admin: i32,
    pub custom_car: String,
    pub override_car_model_for_custom_car: i32,
    pub ballast_kg: i32,
    pub restrictor: i32,
    pub default_grid_position: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `entrylist.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryList {
    pub entries: Vec<Entry>,
    pub force_entry_list: i32,
    pub config_version: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BopEntry {
    pub track: String,
    pub car_model: i32,
    pub ballast_kg: i32,
    pub restrictor: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `bop.json`: per track and car balance of performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bop {
    pub entries: Vec<BopEntry>,
    pub config_version: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `assistRules.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistRules {
    pub stability_control_level_max: i32,
    pub disable_autosteer: i32,
    pub disable_auto_lights: i32,
    pub disable_auto_wiper: i32,
    pub disable_auto_engine_start: i32,
    pub disable_auto_pit_limiter: i32,
    pub disable_auto_gear: i32,
    pub disable_auto_clutch: i32,
    pub disable_ideal_line: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_parses_server_field_names() {
        let json = r#"{
            "serverName": "Sunday Sprint",
            "adminPassword": "admin",
            "carGroup": "GT3",
            "allowAutoDQ": 1,
            "maxCarSlots": 30
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.server_name, "Sunday Sprint");
        assert_eq!(settings.admin_password, "admin");
        assert_eq!(settings.allow_auto_dq, 1);
        assert_eq!(settings.max_car_slots, 30);
        // absent fields take their defaults
        assert_eq!(settings.formation_lap_type, 0);
        assert!(settings.password.is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"udpPort": 9231, "tcpPort": 9232, "publicIP": "10.0.0.2"}"#;
        let config: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(config.udp_port, 9231);
        assert_eq!(config.tcp_port, 9232);
        assert_eq!(config.extra["publicIP"], "10.0.0.2");

        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out["publicIP"], "10.0.0.2");
        assert_eq!(out["udpPort"], 9231);
    }

    #[test]
    fn test_driver_nationality_and_extra_fields_kept() {
        let json = r#"{
            "entries": [{
                "drivers": [{"firstName": "Ada", "nationality": 12, "helmetStyle": 4}],
                "raceNumber": 7
            }]
        }"#;

        let list: EntryList = serde_json::from_str(json).unwrap();
        let driver = &list.entries[0].drivers[0];
        assert_eq!(driver.nationality, 12);

        let out = serde_json::to_value(&list).unwrap();
        assert_eq!(out["entries"][0]["drivers"][0]["nationality"], 12);
        assert_eq!(out["entries"][0]["drivers"][0]["helmetStyle"], 4);
    }

    #[test]
    fn test_parse_document_requires_object() {
        assert!(parse_document::<Configuration>(b"[9600, 9601]").is_err());
        assert!(parse_document::<Settings>(b"[]").is_err());
        assert!(parse_document::<Event>(b"\"race\"").is_err());

        let config: Configuration = parse_document(br#"{"udpPort": 9600}"#).unwrap();
        assert_eq!(config.udp_port, 9600);
    }

    #[test]
    fn test_entry_list_player_id_rename() {
        let json = r#"{
            "entries": [{
                "drivers": [{"firstName": "Ada", "playerID": "S76561198000000000"}],
                "raceNumber": 7
            }],
            "forceEntryList": 1
        }"#;

        let list: EntryList = serde_json::from_str(json).unwrap();
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].drivers[0].player_id, "S76561198000000000");

        let out = serde_json::to_value(&list).unwrap();
        assert_eq!(out["entries"][0]["drivers"][0]["playerID"], "S76561198000000000");
    }

    #[test]
    fn test_clear_secrets() {
        let mut settings = Settings {
            server_name: "Public".to_string(),
            admin_password: "a".to_string(),
            password: "b".to_string(),
            spectator_password: "c".to_string(),
            ..Default::default()
        };
        settings.clear_secrets();
        assert_eq!(settings.server_name, "Public");
        assert!(settings.admin_password.is_empty());
        assert!(settings.password.is_empty());
        assert!(settings.spectator_password.is_empty());
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let result: Result<Event, _> = serde_json::from_str(r#"{"track": 12"#);
        assert!(result.is_err());

        let result: Result<Event, _> = serde_json::from_str(r#"{"sessions": "none"}"#);
        assert!(result.is_err());
    }
}
