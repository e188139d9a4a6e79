// Import necessary modules from external crates.
use crate::catalog::{Catalog, DEFAULT_METATYPE};
use crate::normalize::normalize;
use crate::priority::Priorities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SKILL_RATING_MAX: i32 = 6;

// Define an enumeration for the ways a character can be awakened (or not).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Awakening {
    #[default]
    Mundane,
    Mage,
    Adept,
    MysticAdept,
    Technomancer,
    // Anything the form sent that is not one of the above; normalization replaces it.
    #[serde(other)]
    Unrecognized,
}

// Implement the Display trait for the Awakening enum to allow for easier printing.
impl fmt::Display for Awakening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Awakening::Mundane => write!(f, "Mundane"),
            Awakening::Mage => write!(f, "Mage"),
            Awakening::Adept => write!(f, "Adept"),
            Awakening::MysticAdept => write!(f, "Mystic Adept"),
            Awakening::Technomancer => write!(f, "Technomancer"),
            Awakening::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

impl Awakening {
    pub const ALL: [Awakening; 5] = [
        Awakening::Mundane,
        Awakening::Mage,
        Awakening::Adept,
        Awakening::MysticAdept,
        Awakening::Technomancer,
    ];

    // Casts spells and follows a tradition.
    pub fn is_magician(self) -> bool {
        matches!(self, Awakening::Mage | Awakening::MysticAdept)
    }

    pub fn uses_magic(self) -> bool {
        matches!(
            self,
            Awakening::Mage | Awakening::Adept | Awakening::MysticAdept
        )
    }

    pub fn has_adept_powers(self) -> bool {
        matches!(self, Awakening::Adept | Awakening::MysticAdept)
    }

    pub fn uses_resonance(self) -> bool {
        self == Awakening::Technomancer
    }
}

// Define a structure for contacts within the game, representing relationships and connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub loyalty: i32,
    pub connection: i32,
}

// An installed augmentation with its grade and, for cyberlimbs, attribute upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentSelection {
    pub id: String,
    #[serde(default = "standard_grade")]
    pub grade: String,
    #[serde(default)]
    pub agi_upgrade: i32,
    #[serde(default)]
    pub str_upgrade: i32,
}

pub fn standard_grade() -> String {
    "standard".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneSelection {
    pub id: String,
    #[serde(default)]
    pub mods: Vec<String>,
}

/// The point-buy selections of a character in creation.
///
/// Owned by the caller and persisted server-side. Every action produces a new normalized
/// state; once `saved` is set only a reset changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterState {
    // Priority and core allocations
    pub priorities: Priorities,
    pub attributes: BTreeMap<String, i32>,
    pub skills: BTreeMap<String, i32>,
    pub skill_groups: BTreeMap<String, i32>,
    pub specializations: BTreeMap<String, String>, // skill id -> specialization
    pub special: BTreeMap<String, i32>,            // bonus above base
    pub awakening: Awakening,
    pub metatype_species: String,
    pub saved: bool,

    // Knowledge
    pub knowledge_skills: BTreeMap<String, i32>,
    pub languages: BTreeMap<String, i32>,
    pub native_language: Option<String>,

    // Magic and resonance
    pub tradition: Option<String>,
    pub mentor_spirit: Option<String>,
    pub spells: Vec<String>,
    pub powers: Vec<String>,
    pub complex_forms: Vec<String>,

    // Economic and social information
    pub gear: BTreeMap<String, i32>, // gear id -> quantity
    pub augments: Vec<AugmentSelection>,
    pub drones: Vec<DroneSelection>,
    pub lifestyle: Option<String>,
    pub lifestyle_months: i32,
    pub contacts: Vec<Contact>,
    pub qualities: Vec<String>,
}

impl Default for CharacterState {
    fn default() -> Self {
        CharacterState {
            priorities: Priorities::default(),
            attributes: BTreeMap::new(),
            skills: BTreeMap::new(),
            skill_groups: BTreeMap::new(),
            specializations: BTreeMap::new(),
            special: BTreeMap::new(),
            awakening: Awakening::Mundane,
            metatype_species: DEFAULT_METATYPE.to_string(),
            saved: false,
            knowledge_skills: BTreeMap::new(),
            languages: BTreeMap::new(),
            native_language: None,
            tradition: None,
            mentor_spirit: None,
            spells: Vec::new(),
            powers: Vec::new(),
            complex_forms: Vec::new(),
            gear: BTreeMap::new(),
            augments: Vec::new(),
            drones: Vec::new(),
            lifestyle: None,
            lifestyle_months: 1,
            contacts: Vec::new(),
            qualities: Vec::new(),
        }
    }
}

// Implementation of methods for the CharacterState struct.
impl CharacterState {
    /// A fresh sheet for a newly opened chargen slot, normalized against `catalog`.
    pub fn new(catalog: &Catalog) -> Self {
        normalize(&CharacterState::default(), catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    // Group rating locking a skill, if any positively rated group contains it.
    pub fn locking_group_rating(&self, catalog: &Catalog, skill_id: &str) -> Option<i32> {
        catalog
            .groups_containing(skill_id)
            .filter_map(|g| self.skill_groups.get(&g.id).copied())
            .filter(|rating| *rating > 0)
            .max()
    }

    pub fn is_skill_locked(&self, catalog: &Catalog, skill_id: &str) -> bool {
        self.locking_group_rating(catalog, skill_id).is_some()
    }

    /// Rating a skill is rolled at: the highest active group containing it, or its own.
    pub fn effective_skill_rating(&self, catalog: &Catalog, skill_id: &str) -> i32 {
        self.locking_group_rating(catalog, skill_id)
            .unwrap_or_else(|| self.skills.get(skill_id).copied().unwrap_or(0))
    }

    // Attribute value looked up case-insensitively by name, or by id substring.
    pub fn attribute(&self, catalog: &Catalog, key: &str) -> i32 {
        let key = key.to_lowercase();
        catalog
            .attributes
            .iter()
            .find(|def| {
                let name = def.name.to_lowercase();
                name == key || name.contains(&key) || def.id.to_lowercase().contains(&key)
            })
            .and_then(|def| self.attributes.get(&def.id).copied())
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(id, _)| id.to_lowercase().contains(&key))
                    .map(|(_, value)| *value)
            })
            .unwrap_or(0)
    }

    pub fn has_quality_matching(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.qualities
            .iter()
            .any(|q| q.to_lowercase().contains(&needle))
    }
}
