//! Profile model: the document slots of one dedicated server and the
//! deployment modes that decide which of them are required.

use serde::{Deserialize, Serialize};

use crate::document::{
    parse_document, AssistRules, Bop, Configuration, EntryList, Event, EventRules, Settings,
};

/// Numeric profile id, equal to the name of the backing directory.
pub type ProfileId = u32;

/// One named document slot of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Configuration,
    Settings,
    Event,
    EventRules,
    EntryList,
    Bop,
    AssistRules,
}

impl Slot {
    /// Every slot in canonical order.
    pub const ALL: [Slot; 7] = [
        Slot::Configuration,
        Slot::Settings,
        Slot::Event,
        Slot::EventRules,
        Slot::EntryList,
        Slot::Bop,
        Slot::AssistRules,
    ];

    /// File name of the slot inside a profile directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Slot::Configuration => "configuration.json",
            Slot::Settings => "settings.json",
            Slot::Event => "event.json",
            Slot::EventRules => "eventRules.json",
            Slot::EntryList => "entrylist.json",
            Slot::Bop => "bop.json",
            Slot::AssistRules => "assistRules.json",
        }
    }

    /// Name of the upload field carrying this slot on import.
    pub fn field_name(self) -> &'static str {
        match self {
            Slot::Configuration => "configuration",
            Slot::Settings => "settings",
            Slot::Event => "event",
            Slot::EventRules => "eventRules",
            Slot::EntryList => "entrylist",
            Slot::Bop => "bop",
            Slot::AssistRules => "assistRules",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.file_name() == name)
    }

    pub fn from_field_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.field_name() == name)
    }

    /// Checks that `bytes` decode into this slot's document shape.
    pub fn validate(self, bytes: &[u8]) -> serde_json::Result<()> {
        match self {
            Slot::Configuration => parse_document::<Configuration>(bytes).map(drop),
            Slot::Settings => parse_document::<Settings>(bytes).map(drop),
            Slot::Event => parse_document::<Event>(bytes).map(drop),
            Slot::EventRules => parse_document::<EventRules>(bytes).map(drop),
            Slot::EntryList => parse_document::<EntryList>(bytes).map(drop),
            Slot::Bop => parse_document::<Bop>(bytes).map(drop),
            Slot::AssistRules => parse_document::<AssistRules>(bytes).map(drop),
        }
    }
}

static BASIC_SLOTS: [Slot; 3] = [Slot::Configuration, Slot::Settings, Slot::Event];

/// Deployment mode deciding which slots every profile must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotMode {
    /// Configuration, settings and event only.
    Basic,
    /// All seven slots.
    #[default]
    Extended,
}

impl SlotMode {
    pub fn required_slots(self) -> &'static [Slot] {
        match self {
            SlotMode::Basic => &BASIC_SLOTS,
            SlotMode::Extended => &Slot::ALL,
        }
    }

    pub fn is_required(self, slot: Slot) -> bool {
        self.required_slots().contains(&slot)
    }
}

/// Who a read is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Sees every field, passwords included.
    Admin,
    /// Sees profiles with their passwords blanked.
    Guest,
}

/// The full configuration of one managed server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub configuration: Configuration,
    pub settings: Settings,
    pub event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_rules: Option<EventRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrylist: Option<EntryList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bop: Option<Bop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist_rules: Option<AssistRules>,
}

impl Profile {
    pub fn new(id: ProfileId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Whether the document for `slot` is held by this profile.
    pub fn has_slot(&self, slot: Slot) -> bool {
        match slot {
            Slot::Configuration | Slot::Settings | Slot::Event => true,
            Slot::EventRules => self.event_rules.is_some(),
            Slot::EntryList => self.entrylist.is_some(),
            Slot::Bop => self.bop.is_some(),
            Slot::AssistRules => self.assist_rules.is_some(),
        }
    }

    /// Slots held by this profile, in canonical order.
    pub fn present_slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|slot| self.has_slot(*slot))
            .collect()
    }

    /// Serializes the document held in `slot`, or `None` if the slot is empty.
    pub fn document_json(&self, slot: Slot) -> Option<serde_json::Result<Vec<u8>>> {
        match slot {
            Slot::Configuration => Some(serde_json::to_vec_pretty(&self.configuration)),
            Slot::Settings => Some(serde_json::to_vec_pretty(&self.settings)),
            Slot::Event => Some(serde_json::to_vec_pretty(&self.event)),
            Slot::EventRules => self.event_rules.as_ref().map(serde_json::to_vec_pretty),
            Slot::EntryList => self.entrylist.as_ref().map(serde_json::to_vec_pretty),
            Slot::Bop => self.bop.as_ref().map(serde_json::to_vec_pretty),
            Slot::AssistRules => self.assist_rules.as_ref().map(serde_json::to_vec_pretty),
        }
    }

    /// A copy with every password blanked.
    pub fn redacted(&self) -> Profile {
        let mut profile = self.clone();
        profile.settings.clear_secrets();
        profile
    }

    /// A copy as `viewer` is allowed to see it.
    pub fn view(&self, viewer: Viewer) -> Profile {
        match viewer {
            Viewer::Admin => self.clone(),
            Viewer::Guest => self.redacted(),
        }
    }

    /// Public summary of the profile.
    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            id: self.id,
            server_name: self.settings.server_name.clone(),
            track: self.event.track.clone(),
            tcp_port: self.configuration.tcp_port,
            udp_port: self.configuration.udp_port,
        }
    }
}

/// Public, secret-free summary of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub id: ProfileId,
    pub server_name: String,
    pub track: String,
    pub tcp_port: u16,
    pub udp_port: u16,
}
