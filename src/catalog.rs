// src/catalog.rs
use crate::error::CatalogError;
use crate::priority::{Letter, PriorityTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_METATYPE: &str = "human";
pub const DEFAULT_STARTING_KARMA: i32 = 25;

/// Read-only reference data for one chargen session.
///
/// Supplied by the server as JSON. Every optional collection may be absent and is then
/// treated as empty; [`Catalog::check_required`] reports the collections that cannot be.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub attributes: Vec<AttributeDef>,
    pub skills: Vec<SkillDef>,
    pub skill_groups: Vec<SkillGroupDef>,
    pub special_attributes: Vec<SpecialAttributeDef>,
    pub priority_table: PriorityTable,
    pub metatypes: Vec<MetatypeDef>,
    // metatype id -> attribute id -> [min, max]
    pub metatype_attribute_bounds: BTreeMap<String, BTreeMap<String, [i32; 2]>>,

    // Magic
    pub traditions: Vec<NamedEntry>,
    pub mentor_spirits: Vec<NamedEntry>,
    pub spells: Vec<SpellDef>,
    pub adept_powers: Vec<AdeptPowerDef>,
    pub complex_forms: Vec<NamedEntry>,

    // Gear and augmentations
    pub gear: Vec<GearDef>,
    pub augments: Vec<AugmentDef>,
    pub augment_grades: Vec<AugmentGrade>,
    pub drones: Vec<DroneDef>,
    pub drone_mods: Vec<DroneModDef>,
    pub lifestyles: Vec<LifestyleDef>,

    // Social
    pub qualities: Vec<QualityDef>,
    pub languages: Vec<String>,
    pub starting_karma: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub id: String,
    pub name: String,
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub sort: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_stat_id: String,
    #[serde(default)]
    pub parent_stat_name: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub specializations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroupDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub member_skill_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAttributeDef {
    pub id: String,
    pub name: String,
    pub min: i32,
    pub max: i32,
}

// Which special resource an id stands for, derived from the id itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    Edge,
    Magic,
    Resonance,
    Other,
}

impl SpecialAttributeDef {
    pub fn kind(&self) -> SpecialKind {
        let id = self.id.to_lowercase();
        if id.contains("edge") {
            SpecialKind::Edge
        } else if id.contains("magic") {
            SpecialKind::Magic
        } else if id.contains("resonance") {
            SpecialKind::Resonance
        } else {
            SpecialKind::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetatypeDef {
    pub id: String,
    pub name: String,
    #[serde(default = "lowest_priority")]
    pub min_priority: Letter,
}

fn lowest_priority() -> Letter {
    Letter::E
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdeptPowerDef {
    pub id: String,
    pub name: String,
    pub cost: f64, // Power points.
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub essence_cost: f64,
    pub cost: i64,
    #[serde(default)]
    pub cyberlimb: bool,
    #[serde(default)]
    pub upgrade_cost: i64, // Per point of agility or strength upgrade, cyberlimbs only.
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentGrade {
    pub id: String,
    pub name: String,
    pub essence_multiplier: f64,
    pub cost_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneDef {
    pub id: String,
    pub name: String,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneModDef {
    pub id: String,
    pub name: String,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleDef {
    pub id: String,
    pub name: String,
    pub monthly_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDef {
    pub id: String,
    pub name: String,
    pub karma: i32, // Positive qualities cost karma, negative ones grant it.
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Startup precondition: a catalog without attributes, skills or priority table cannot
    /// drive the form at all.
    pub fn check_required(&self) -> Result<(), CatalogError> {
        if self.attributes.is_empty() {
            return Err(CatalogError::NoAttributes);
        }
        if self.skills.is_empty() {
            return Err(CatalogError::NoSkills);
        }
        if self.priority_table.is_empty() {
            return Err(CatalogError::NoPriorityTable);
        }
        Ok(())
    }

    pub fn starting_karma(&self) -> i32 {
        self.starting_karma.unwrap_or(DEFAULT_STARTING_KARMA)
    }

    /// Attributes in catalog order: `sort` ascending, declaration order on ties.
    pub fn sorted_attributes(&self) -> Vec<&AttributeDef> {
        let mut attributes: Vec<&AttributeDef> = self.attributes.iter().collect();
        attributes.sort_by_key(|a| a.sort);
        attributes
    }

    pub fn sorted_skills(&self) -> Vec<&SkillDef> {
        let mut skills: Vec<&SkillDef> = self.skills.iter().collect();
        skills.sort_by_key(|s| s.sort);
        skills
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn skill_group(&self, id: &str) -> Option<&SkillGroupDef> {
        self.skill_groups.iter().find(|g| g.id == id)
    }

    pub fn special_attribute(&self, id: &str) -> Option<&SpecialAttributeDef> {
        self.special_attributes.iter().find(|s| s.id == id)
    }

    /// `[min, max]` for an attribute, superseded by the metatype's bounds when present.
    pub fn attribute_bounds(&self, metatype_id: &str, attribute: &AttributeDef) -> (i32, i32) {
        let (min, max) = self
            .metatype_attribute_bounds
            .get(metatype_id)
            .and_then(|bounds| bounds.get(&attribute.id))
            .map(|[min, max]| (*min, *max))
            .unwrap_or((attribute.min, attribute.max));
        (min, max.max(min))
    }

    /// Groups that contain `skill_id`.
    pub fn groups_containing<'a>(
        &'a self,
        skill_id: &'a str,
    ) -> impl Iterator<Item = &'a SkillGroupDef> + 'a {
        self.skill_groups
            .iter()
            .filter(move |g| g.member_skill_ids.iter().any(|m| m == skill_id))
    }

    pub fn metatype_ids(&self) -> Vec<&str> {
        self.metatypes.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn augment(&self, id: &str) -> Option<&AugmentDef> {
        self.augments.iter().find(|a| a.id == id)
    }

    pub fn augment_grade(&self, id: &str) -> Option<&AugmentGrade> {
        self.augment_grades.iter().find(|g| g.id == id)
    }

    pub fn adept_power(&self, id: &str) -> Option<&AdeptPowerDef> {
        self.adept_powers.iter().find(|p| p.id == id)
    }

    pub fn gear_item(&self, id: &str) -> Option<&GearDef> {
        self.gear.iter().find(|g| g.id == id)
    }

    pub fn drone(&self, id: &str) -> Option<&DroneDef> {
        self.drones.iter().find(|d| d.id == id)
    }

    pub fn drone_mod(&self, id: &str) -> Option<&DroneModDef> {
        self.drone_mods.iter().find(|m| m.id == id)
    }

    pub fn lifestyle(&self, id: &str) -> Option<&LifestyleDef> {
        self.lifestyles.iter().find(|l| l.id == id)
    }

    pub fn quality(&self, id: &str) -> Option<&QualityDef> {
        self.qualities.iter().find(|q| q.id == id)
    }

    pub fn has_spell(&self, id: &str) -> bool {
        self.spells.iter().any(|s| s.id == id)
    }

    pub fn has_complex_form(&self, id: &str) -> bool {
        self.complex_forms.iter().any(|f| f.id == id)
    }

    pub fn has_tradition(&self, id: &str) -> bool {
        self.traditions.iter().any(|t| t.id == id)
    }

    pub fn has_mentor_spirit(&self, id: &str) -> bool {
        self.mentor_spirits.iter().any(|m| m.id == id)
    }
}
