// src/actions.rs
use crate::catalog::{Catalog, DEFAULT_METATYPE};
use crate::character::{
    Awakening, AugmentSelection, CharacterState, Contact, DroneSelection, SKILL_RATING_MAX,
    standard_grade,
};
use crate::derived::{DashboardData, PoolSummary, compute_dashboard};
use crate::error::Result;
use crate::normalize::normalize;
use crate::priority::{Category, Letter};
use crate::validate::validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user action on the chargen form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // Swap letters, then reset everything the old budgets paid for.
    SetPriority { category: Category, letter: Letter },
    // Swap letters and let normalization trim what no longer fits.
    SetPriorityPreserving { category: Category, letter: Letter },
    BumpAttribute { id: String, delta: i32 },
    BumpSkill { id: String, delta: i32 },
    SetSpecialization { skill_id: String, specialization: Option<String> },
    BumpSkillGroup { id: String, delta: i32 },
    BumpSpecial { id: String, delta: i32 },
    SetAwakening { awakening: Awakening },
    SetMetatype { id: String },
    SetTradition { id: Option<String> },
    SetMentorSpirit { id: Option<String> },
    ToggleSpell { id: String },
    TogglePower { id: String },
    ToggleComplexForm { id: String },
    BumpKnowledgeSkill { name: String, delta: i32 },
    BumpLanguage { name: String, delta: i32 },
    SetNativeLanguage { name: Option<String> },
    SetGearQuantity { id: String, quantity: i32 },
    AddAugment { id: String, grade: Option<String> },
    RemoveAugment { index: usize },
    SetAugmentGrade { index: usize, grade: String },
    SetAugmentUpgrades { index: usize, agility: i32, strength: i32 },
    AddDrone { id: String },
    RemoveDrone { index: usize },
    ToggleDroneMod { index: usize, mod_id: String },
    SetLifestyle { id: Option<String>, months: i32 },
    SetContact { contact: Contact },
    RemoveContact { name: String },
    ToggleQuality { id: String },
    Save,
    Reset,
}

/// The side effect half of an optimistic update: hand the next state to storage.
///
/// Success or failure never feeds back into the engine.
pub trait Persist {
    fn persist(&mut self, state: &CharacterState) -> Result<()>;
}

impl<F> Persist for F
where
    F: FnMut(&CharacterState) -> Result<()>,
{
    fn persist(&mut self, state: &CharacterState) -> Result<()> {
        self(state)
    }
}

/// Apply `action` and forward the resulting state to `persist`.
pub fn compute_next_state(
    state: &CharacterState,
    catalog: &Catalog,
    action: &Action,
    persist: &mut impl Persist,
) -> CharacterState {
    let next = apply(state, catalog, action);
    if let Err(e) = persist.persist(&next) {
        log::warn!("Failed to persist character state: {e}");
    }
    next
}

/// Pure state transition. A saved sheet ignores everything but [`Action::Reset`]; actions
/// that would overdraw a point pool or touch a group-locked skill leave the state as is.
pub fn apply(state: &CharacterState, catalog: &Catalog, action: &Action) -> CharacterState {
    if state.saved && *action != Action::Reset {
        log::debug!("Ignoring {action:?}: the character sheet is saved");
        return state.clone();
    }

    let current = normalize(state, catalog);
    match transition(&current, catalog, action) {
        Some(next) => normalize(&next, catalog),
        None => {
            log::debug!("Action {action:?} had no effect");
            current
        }
    }
}

// The raw edit for an action, or None when the action is refused.
fn transition(
    current: &CharacterState,
    catalog: &Catalog,
    action: &Action,
) -> Option<CharacterState> {
    let mut next = current.clone();

    match action {
        Action::SetPriority { category, letter } => {
            if current.priorities.get(*category) == *letter {
                return None;
            }
            next.priorities.set(*category, *letter);
            reset_allocations(&mut next);
            Some(next)
        }

        Action::SetPriorityPreserving { category, letter } => {
            next.priorities.set(*category, *letter);
            Some(next)
        }

        Action::BumpAttribute { id, delta } => {
            let def = catalog.attributes.iter().find(|a| a.id == *id)?;
            let (min, max) = catalog.attribute_bounds(&current.metatype_species, def);
            let value = current.attributes.get(id).copied().unwrap_or(min);
            next.attributes
                .insert(id.clone(), value.saturating_add(*delta).clamp(min, max));
            fits(current, &next, catalog, |d| d.attributes).then_some(next)
        }

        Action::BumpSkill { id, delta } => {
            catalog.skill(id)?;
            if current.is_skill_locked(catalog, id) {
                log::debug!("Skill {id} is locked by an active skill group");
                return None;
            }
            let value = current.skills.get(id).copied().unwrap_or(0);
            set_sparse(&mut next.skills, id, value.saturating_add(*delta), SKILL_RATING_MAX);
            if !next.skills.contains_key(id) {
                next.specializations.remove(id);
            }
            fits(current, &next, catalog, |d| d.skills).then_some(next)
        }

        Action::SetSpecialization {
            skill_id,
            specialization,
        } => {
            catalog.skill(skill_id)?;
            if current.is_skill_locked(catalog, skill_id) || !current.skills.contains_key(skill_id)
            {
                return None;
            }
            match specialization {
                Some(name) if !name.trim().is_empty() => {
                    next.specializations.insert(skill_id.clone(), name.clone());
                }
                _ => {
                    next.specializations.remove(skill_id);
                }
            }
            fits(current, &next, catalog, |d| d.skills).then_some(next)
        }

        Action::BumpSkillGroup { id, delta } => {
            catalog.skill_group(id)?;
            let value = current.skill_groups.get(id).copied().unwrap_or(0);
            set_sparse(
                &mut next.skill_groups,
                id,
                value.saturating_add(*delta),
                SKILL_RATING_MAX,
            );
            fits(current, &next, catalog, |d| d.skill_groups).then_some(next)
        }

        Action::BumpSpecial { id, delta } => {
            let def = catalog.special_attribute(id)?;
            let value = current.special.get(id).copied().unwrap_or(0);
            // The normalizer caps the bonus against its base.
            set_sparse(&mut next.special, id, value.saturating_add(*delta), def.max.max(0));
            fits(current, &next, catalog, |d| d.special).then_some(next)
        }

        Action::SetAwakening { awakening } => {
            next.awakening = *awakening;
            Some(next)
        }

        Action::SetMetatype { id } => {
            next.metatype_species = id.clone();
            Some(next)
        }

        Action::SetTradition { id } => {
            next.tradition = id.clone();
            Some(next)
        }

        Action::SetMentorSpirit { id } => {
            next.mentor_spirit = id.clone();
            Some(next)
        }

        Action::ToggleSpell { id } => {
            toggle(&mut next.spells, id);
            Some(next)
        }

        Action::TogglePower { id } => {
            toggle(&mut next.powers, id);
            let data = compute_dashboard(&next, catalog);
            let within_budget = data
                .power_points
                .is_none_or(|points| points.remaining >= -f64::EPSILON);
            (within_budget || !next.powers.contains(id)).then_some(next)
        }

        Action::ToggleComplexForm { id } => {
            toggle(&mut next.complex_forms, id);
            Some(next)
        }

        Action::BumpKnowledgeSkill { name, delta } => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = current.knowledge_skills.get(name).copied().unwrap_or(0);
            set_sparse(
                &mut next.knowledge_skills,
                name,
                value.saturating_add(*delta),
                SKILL_RATING_MAX,
            );
            fits(current, &next, catalog, |d| d.knowledge).then_some(next)
        }

        Action::BumpLanguage { name, delta } => {
            let name = name.trim();
            if name.is_empty() || current.native_language.as_deref() == Some(name) {
                return None;
            }
            let value = current.languages.get(name).copied().unwrap_or(0);
            set_sparse(
                &mut next.languages,
                name,
                value.saturating_add(*delta),
                SKILL_RATING_MAX,
            );
            fits(current, &next, catalog, |d| d.knowledge).then_some(next)
        }

        Action::SetNativeLanguage { name } => {
            next.native_language = name.clone();
            Some(next)
        }

        Action::SetGearQuantity { id, quantity } => {
            catalog.gear_item(id)?;
            if *quantity > 0 {
                next.gear.insert(id.clone(), *quantity);
            } else {
                next.gear.remove(id);
            }
            Some(next)
        }

        Action::AddAugment { id, grade } => {
            catalog.augment(id)?;
            next.augments.push(AugmentSelection {
                id: id.clone(),
                grade: grade.clone().unwrap_or_else(standard_grade),
                agi_upgrade: 0,
                str_upgrade: 0,
            });
            Some(next)
        }

        Action::RemoveAugment { index } => {
            (*index < next.augments.len()).then(|| {
                next.augments.remove(*index);
                next
            })
        }

        Action::SetAugmentGrade { index, grade } => {
            next.augments.get_mut(*index)?.grade = grade.clone();
            Some(next)
        }

        Action::SetAugmentUpgrades {
            index,
            agility,
            strength,
        } => {
            let selection = next.augments.get_mut(*index)?;
            selection.agi_upgrade = *agility;
            selection.str_upgrade = *strength;
            Some(next)
        }

        Action::AddDrone { id } => {
            catalog.drone(id)?;
            next.drones.push(DroneSelection {
                id: id.clone(),
                mods: Vec::new(),
            });
            Some(next)
        }

        Action::RemoveDrone { index } => (*index < next.drones.len()).then(|| {
            next.drones.remove(*index);
            next
        }),

        Action::ToggleDroneMod { index, mod_id } => {
            toggle(&mut next.drones.get_mut(*index)?.mods, mod_id);
            Some(next)
        }

        Action::SetLifestyle { id, months } => {
            next.lifestyle = id.clone();
            next.lifestyle_months = *months;
            Some(next)
        }

        Action::SetContact { contact } => {
            match next.contacts.iter_mut().find(|c| c.name == contact.name) {
                Some(existing) => *existing = contact.clone(),
                None => next.contacts.push(contact.clone()),
            }
            Some(next)
        }

        Action::RemoveContact { name } => {
            let before = next.contacts.len();
            next.contacts.retain(|c| c.name != *name);
            (next.contacts.len() != before).then_some(next)
        }

        Action::ToggleQuality { id } => {
            catalog.quality(id)?;
            toggle(&mut next.qualities, id);
            Some(next)
        }

        Action::Save => {
            let report = validate(&compute_dashboard(current, catalog), current);
            if !report.can_save {
                log::info!(
                    "Save blocked by {} validation error(s)",
                    report.error_count
                );
                return None;
            }
            next.saved = true;
            Some(next)
        }

        Action::Reset => Some(CharacterState::default()),
    }
}

// Full reset of everything the priority budgets paid for.
fn reset_allocations(state: &mut CharacterState) {
    state.attributes.clear();
    state.skills.clear();
    state.skill_groups.clear();
    state.specializations.clear();
    state.special.clear();
    state.awakening = Awakening::Mundane;
    state.metatype_species = DEFAULT_METATYPE.to_string();
}

// An increase must still fit its pool; decreases always go through.
fn fits(
    before: &CharacterState,
    after: &CharacterState,
    catalog: &Catalog,
    pool: impl Fn(&DashboardData) -> PoolSummary,
) -> bool {
    let old = pool(&compute_dashboard(before, catalog));
    let new = pool(&compute_dashboard(after, catalog));
    new.spent <= old.spent || new.remaining >= 0
}

fn set_sparse(map: &mut BTreeMap<String, i32>, id: &str, value: i32, cap: i32) {
    let value = value.clamp(0, cap);
    if value > 0 {
        map.insert(id.to_string(), value);
    } else {
        map.remove(id);
    }
}

fn toggle(list: &mut Vec<String>, id: &str) {
    if let Some(index) = list.iter().position(|existing| existing == id) {
        list.remove(index);
    } else {
        list.push(id.to_string());
    }
}
