// src/normalize.rs
//
// Re-derives a character state so every range and pool invariant holds again after an
// upstream choice (priority letters, metatype, awakening) moved the budgets.
use crate::catalog::{Catalog, DEFAULT_METATYPE, MetatypeDef, SpecialKind};
use crate::character::{Awakening, CharacterState, SKILL_RATING_MAX, standard_grade};
use crate::derived::{knowledge_pool, power_point_budget};
use crate::priority::{Category, Letter, ResolvedPools, resolve};
use std::collections::{BTreeMap, HashSet};

const CONTACT_LOYALTY_MAX: i32 = 6;
const CONTACT_CONNECTION_MAX: i32 = 12;
const CYBERLIMB_UPGRADE_MAX: i32 = 6;

// One allocation competing for a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allotment {
    pub id: String,
    pub value: i32,
    pub floor: i32,
    pub cap: i32,
    pub surcharge: i32, // Extra cost paid while the entry is above its floor (specializations).
    pub rank_bias: i32, // Added to the investment when picking what to trim.
}

impl Allotment {
    pub fn new(id: impl Into<String>, value: i32, floor: i32, cap: i32) -> Self {
        Allotment {
            id: id.into(),
            value,
            floor,
            cap: cap.max(floor),
            surcharge: 0,
            rank_bias: 0,
        }
    }

    pub fn investment(&self) -> i32 {
        self.value - self.floor
    }

    pub fn cost(&self) -> i32 {
        if self.investment() > 0 {
            self.investment() + self.surcharge
        } else {
            0
        }
    }
}

/// Clamp every entry into `[floor, cap]`, then take points back one at a time from the
/// largest investment until the total fits `pool`.
///
/// Ties go to the entry that comes first in `entries`, so callers pass them in catalog
/// order. Returns the number of points trimmed.
pub fn trim_largest_first(entries: &mut [Allotment], pool: i32) -> i32 {
    for entry in entries.iter_mut() {
        entry.value = entry.value.clamp(entry.floor, entry.cap);
    }

    let mut spent: i32 = entries.iter().map(Allotment::cost).sum();
    let mut trimmed = 0;
    while spent > pool {
        let Some(index) = largest_investment(entries) else {
            break;
        };
        let before = entries[index].cost();
        entries[index].value -= 1;
        spent -= before - entries[index].cost();
        trimmed += 1;
    }
    trimmed
}

fn largest_investment(entries: &[Allotment]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (index, entry) in entries.iter().enumerate() {
        if entry.investment() <= 0 {
            continue;
        }
        let key = entry.investment() + entry.rank_bias;
        match best {
            Some((_, best_key)) if best_key >= key => {}
            _ => best = Some((index, key)),
        }
    }
    best.map(|(index, _)| index)
}

/// Letter E always yields the default metatype; otherwise the current choice is kept if
/// the letter allows it, then human, then the first metatype the letter allows.
pub fn normalize_metatype_species(current: &str, letter: Letter, choices: &[MetatypeDef]) -> String {
    if letter == Letter::E {
        return DEFAULT_METATYPE.to_string();
    }

    let eligible: Vec<&MetatypeDef> = choices
        .iter()
        .filter(|m| m.min_priority.rank() <= letter.rank())
        .collect();

    if eligible.iter().any(|m| m.id == current) {
        current.to_string()
    } else if eligible.iter().any(|m| m.id == DEFAULT_METATYPE) {
        DEFAULT_METATYPE.to_string()
    } else {
        eligible
            .first()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| DEFAULT_METATYPE.to_string())
    }
}

pub fn normalize_awakening(current: Awakening, magic_disabled: bool) -> Awakening {
    if magic_disabled {
        Awakening::Mundane
    } else if current == Awakening::Unrecognized {
        Awakening::Mage
    } else {
        current
    }
}

/// Produce a state where every allocation invariant holds, changing as little as possible.
///
/// Deterministic and idempotent: normalizing a normalized state returns it unchanged.
pub fn normalize(state: &CharacterState, catalog: &Catalog) -> CharacterState {
    let mut next = state.clone();

    next.priorities = next.priorities.normalized();
    let pools = resolve(&next.priorities, &catalog.priority_table);

    next.metatype_species = normalize_metatype_species(
        &next.metatype_species,
        next.priorities.get(Category::Metatype),
        &catalog.metatypes,
    );
    next.awakening = normalize_awakening(next.awakening, pools.magic_disabled());

    normalize_attributes(&mut next, catalog, &pools);
    normalize_skill_groups(&mut next, catalog, &pools);
    normalize_skills(&mut next, catalog, &pools);
    normalize_special(&mut next, catalog, &pools);
    normalize_magic(&mut next, catalog, &pools);
    normalize_knowledge(&mut next, catalog);
    normalize_belongings(&mut next, catalog);
    normalize_social(&mut next, catalog);

    next
}

fn normalize_attributes(state: &mut CharacterState, catalog: &Catalog, pools: &ResolvedPools) {
    let mut entries: Vec<Allotment> = catalog
        .sorted_attributes()
        .into_iter()
        .map(|def| {
            let (min, max) = catalog.attribute_bounds(&state.metatype_species, def);
            let value = state.attributes.get(&def.id).copied().unwrap_or(min);
            Allotment::new(&def.id, value, min, max)
        })
        .collect();

    let trimmed = trim_largest_first(&mut entries, pools.attr_points);
    if trimmed > 0 {
        log::debug!(
            "Trimmed {trimmed} attribute point(s) to fit a pool of {}",
            pools.attr_points
        );
    }

    // Attributes keep their floor explicitly.
    state.attributes = entries.into_iter().map(|e| (e.id, e.value)).collect();
}

fn normalize_skill_groups(state: &mut CharacterState, catalog: &Catalog, pools: &ResolvedPools) {
    let mut entries: Vec<Allotment> = catalog
        .skill_groups
        .iter()
        .map(|def| {
            let value = state.skill_groups.get(&def.id).copied().unwrap_or(0);
            Allotment::new(&def.id, value, 0, SKILL_RATING_MAX)
        })
        .collect();

    let trimmed = trim_largest_first(&mut entries, pools.group_points);
    if trimmed > 0 {
        log::debug!(
            "Trimmed {trimmed} skill group point(s) to fit a pool of {}",
            pools.group_points
        );
    }

    state.skill_groups = sparse(entries);
}

fn normalize_skills(state: &mut CharacterState, catalog: &Catalog, pools: &ResolvedPools) {
    let mut entries: Vec<Allotment> = Vec::new();
    let mut specializations: BTreeMap<String, String> = BTreeMap::new();

    for def in catalog.sorted_skills() {
        // A skill inside an active group has no rating or specialization of its own.
        if state.is_skill_locked(catalog, &def.id) {
            continue;
        }
        let value = state.skills.get(&def.id).copied().unwrap_or(0);
        let mut entry = Allotment::new(&def.id, value, 0, SKILL_RATING_MAX);

        if let Some(specialization) = state.specializations.get(&def.id) {
            let offered = def.specializations.is_empty()
                || def.specializations.iter().any(|s| s == specialization);
            if entry.value > 0 && offered && !specialization.trim().is_empty() {
                entry.surcharge = 1;
                specializations.insert(def.id.clone(), specialization.clone());
            }
        }
        entries.push(entry);
    }

    let trimmed = trim_largest_first(&mut entries, pools.skill_points);
    if trimmed > 0 {
        log::debug!(
            "Trimmed {trimmed} skill point(s) to fit a pool of {}",
            pools.skill_points
        );
    }

    state.skills = sparse(entries);
    specializations.retain(|skill_id, _| state.skills.contains_key(skill_id));
    state.specializations = specializations;
}

// Base value a special attribute's bonus is bought on top of, or None if the character
// cannot use it at all.
fn special_base(kind: SpecialKind, min: i32, awakening: Awakening, magic_rating: i32) -> Option<i32> {
    match kind {
        SpecialKind::Magic if awakening.uses_magic() => Some(min.max(magic_rating)),
        SpecialKind::Resonance if awakening.uses_resonance() => Some(min.max(magic_rating)),
        SpecialKind::Magic | SpecialKind::Resonance => None,
        SpecialKind::Edge | SpecialKind::Other => Some(min),
    }
}

fn normalize_special(state: &mut CharacterState, catalog: &Catalog, pools: &ResolvedPools) {
    let mut entries: Vec<Allotment> = catalog
        .special_attributes
        .iter()
        .map(|def| {
            let value = state.special.get(&def.id).copied().unwrap_or(0);
            match special_base(def.kind(), def.min, state.awakening, pools.magic_rating) {
                Some(base) => {
                    let mut entry = Allotment::new(&def.id, value, 0, def.max - base);
                    // Trim from whichever resource currently stands higher.
                    entry.rank_bias = base;
                    entry
                }
                None => Allotment::new(&def.id, value, 0, 0),
            }
        })
        .collect();

    let trimmed = trim_largest_first(&mut entries, pools.special_points);
    if trimmed > 0 {
        log::debug!(
            "Trimmed {trimmed} special point(s) to fit a pool of {}",
            pools.special_points
        );
    }

    state.special = sparse(entries);
}

/// Total Magic (or Resonance) the character ends up with: base plus bought bonus.
pub fn magic_total(state: &CharacterState, catalog: &Catalog, pools: &ResolvedPools) -> i32 {
    catalog
        .special_attributes
        .iter()
        .filter(|def| matches!(def.kind(), SpecialKind::Magic | SpecialKind::Resonance))
        .filter_map(|def| {
            special_base(def.kind(), def.min, state.awakening, pools.magic_rating)
                .map(|base| base + state.special.get(&def.id).copied().unwrap_or(0))
        })
        .max()
        .unwrap_or_else(|| {
            if state.awakening == Awakening::Mundane {
                0
            } else {
                pools.magic_rating.max(0)
            }
        })
}

fn normalize_magic(state: &mut CharacterState, catalog: &Catalog, pools: &ResolvedPools) {
    let awakening = state.awakening;

    if awakening.is_magician() {
        state.tradition = state.tradition.take().filter(|t| catalog.has_tradition(t));
        state.spells = dedup_known(&state.spells, |id| catalog.has_spell(id));
    } else {
        state.tradition = None;
        state.spells.clear();
    }

    if !awakening.uses_magic() {
        state.mentor_spirit = None;
    } else {
        state.mentor_spirit = state
            .mentor_spirit
            .take()
            .filter(|m| catalog.has_mentor_spirit(m));
    }

    if awakening.has_adept_powers() {
        state.powers = dedup_known(&state.powers, |id| catalog.adept_power(id).is_some());
        let budget = power_point_budget(state, catalog, pools);
        trim_powers(state, catalog, budget);
    } else {
        state.powers.clear();
    }

    if awakening.uses_resonance() {
        state.complex_forms = dedup_known(&state.complex_forms, |id| catalog.has_complex_form(id));
    } else {
        state.complex_forms.clear();
    }
}

// Drop the most expensive power (catalog order on ties) until the rest fit.
fn trim_powers(state: &mut CharacterState, catalog: &Catalog, budget: f64) {
    let cost_of = |id: &str| catalog.adept_power(id).map(|p| p.cost).unwrap_or(0.0);
    let catalog_index = |id: &str| {
        catalog
            .adept_powers
            .iter()
            .position(|p| p.id == id)
            .unwrap_or(usize::MAX)
    };

    while state.powers.iter().map(|id| cost_of(id.as_str())).sum::<f64>() > budget + f64::EPSILON {
        let Some(drop_index) = state
            .powers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                cost_of(b.as_str())
                    .total_cmp(&cost_of(a.as_str()))
                    .then_with(|| catalog_index(a.as_str()).cmp(&catalog_index(b.as_str())))
            })
            .map(|(index, _)| index)
        else {
            break;
        };
        let dropped = state.powers.remove(drop_index);
        log::debug!("Dropped adept power {dropped} to fit {budget} power point(s)");
    }
}

fn normalize_knowledge(state: &mut CharacterState, catalog: &Catalog) {
    if let Some(native) = state.native_language.take() {
        let native = native.trim().to_string();
        if !native.is_empty() {
            state.languages.remove(&native);
            state.native_language = Some(native);
        }
    }

    let mut entries: Vec<Allotment> = state
        .knowledge_skills
        .iter()
        .chain(state.languages.iter())
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, rating)| Allotment::new(name.clone(), *rating, 0, SKILL_RATING_MAX))
        .collect();
    let knowledge_count = state
        .knowledge_skills
        .keys()
        .filter(|name| !name.trim().is_empty())
        .count();

    let pool = knowledge_pool(state, catalog);
    let trimmed = trim_largest_first(&mut entries, pool);
    if trimmed > 0 {
        log::debug!("Trimmed {trimmed} knowledge point(s) to fit a pool of {pool}");
    }

    let languages = entries.split_off(knowledge_count);
    state.knowledge_skills = sparse(entries);
    state.languages = sparse(languages);
}

fn normalize_belongings(state: &mut CharacterState, catalog: &Catalog) {
    state
        .gear
        .retain(|id, quantity| *quantity > 0 && catalog.gear_item(id).is_some());

    state.augments.retain(|a| catalog.augment(&a.id).is_some());
    for selection in state.augments.iter_mut() {
        if catalog.augment_grade(&selection.grade).is_none() {
            selection.grade = standard_grade();
        }
        let cyberlimb = catalog.augment(&selection.id).is_some_and(|a| a.cyberlimb);
        if cyberlimb {
            selection.agi_upgrade = selection.agi_upgrade.clamp(0, CYBERLIMB_UPGRADE_MAX);
            selection.str_upgrade = selection.str_upgrade.clamp(0, CYBERLIMB_UPGRADE_MAX);
        } else {
            selection.agi_upgrade = 0;
            selection.str_upgrade = 0;
        }
    }

    state.drones.retain(|d| catalog.drone(&d.id).is_some());
    for drone in state.drones.iter_mut() {
        drone.mods = dedup_known(&drone.mods, |id| catalog.drone_mod(id).is_some());
    }

    state.lifestyle = state
        .lifestyle
        .take()
        .filter(|id| catalog.lifestyle(id).is_some());
    state.lifestyle_months = state.lifestyle_months.max(1);
}

fn normalize_social(state: &mut CharacterState, catalog: &Catalog) {
    for contact in state.contacts.iter_mut() {
        contact.loyalty = contact.loyalty.clamp(1, CONTACT_LOYALTY_MAX);
        contact.connection = contact.connection.clamp(1, CONTACT_CONNECTION_MAX);
    }
    state.qualities = dedup_known(&state.qualities, |id| catalog.quality(id).is_some());
}

// Sparse maps keep only entries above their floor.
fn sparse(entries: Vec<Allotment>) -> BTreeMap<String, i32> {
    entries
        .into_iter()
        .filter(|e| e.value > e.floor)
        .map(|e| (e.id, e.value))
        .collect()
}

fn dedup_known(ids: &[String], known: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| known(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}
