// src/derived.rs
//
// Everything the dashboard shows that is computed rather than chosen: pool usage,
// essence, nuyen, SR5 derived stats and completion.
use crate::catalog::Catalog;
use crate::character::CharacterState;
use crate::normalize::magic_total;
use crate::priority::{ResolvedPools, resolve};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

pub const BASE_ESSENCE: f64 = 6.0;
pub const BIOCOMPATIBILITY_MULTIPLIER: f64 = 0.9;

// Points available, spent and left in one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub total: i32,
    pub spent: i32,
    pub remaining: i32,
}

impl PoolSummary {
    pub fn new(total: i32, spent: i32) -> Self {
        PoolSummary {
            total,
            spent,
            remaining: total - spent,
        }
    }

    // A pool with nothing in it counts as fully spent.
    pub fn spent_fraction(&self) -> f64 {
        if self.total <= 0 {
            1.0
        } else {
            (self.spent as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }
}

// Adept power points are bought in fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerPointSummary {
    pub total: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EssenceSummary {
    pub base: f64,
    pub cost: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NuyenSummary {
    pub total: i64,
    pub augments: i64,
    pub lifestyle: i64,
    pub gear: i64,
    pub drones: i64,
    pub spent: i64,
    pub remaining: i64,
}

// Secondary attributes and limits as printed on an SR5 character sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub physical_limit: i32,
    pub mental_limit: i32,
    pub social_limit: i32,
    pub physical_monitor: i32,
    pub stun_monitor: i32,
    pub composure: i32,
    pub judge_intentions: i32,
    pub memory: i32,
    pub lift_carry: i32,
    pub initiative: i32,
}

/// Plain data handed to every consumer of a state change; holds no references into the
/// catalog or the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub pools: ResolvedPools,
    pub attributes: PoolSummary,
    pub skills: PoolSummary,
    pub skill_groups: PoolSummary,
    pub special: PoolSummary,
    pub knowledge: PoolSummary,
    pub contacts: PoolSummary,
    pub karma: PoolSummary,
    pub power_points: Option<PowerPointSummary>,
    pub magic: i32,
    pub essence: EssenceSummary,
    pub nuyen: NuyenSummary,
    pub stats: DerivedStats,
    pub completion: u8,
}

/// Knowledge and language points: (LOG + INT) × 2.
pub fn knowledge_pool(state: &CharacterState, catalog: &Catalog) -> i32 {
    (state.attribute(catalog, "logic") + state.attribute(catalog, "intuition")) * 2
}

// Free contact karma: CHA × 3.
pub fn contact_pool(state: &CharacterState, catalog: &Catalog) -> i32 {
    state.attribute(catalog, "charisma") * 3
}

/// Power points available to adepts and mystic adepts: their total Magic.
pub fn power_point_budget(state: &CharacterState, catalog: &Catalog, pools: &ResolvedPools) -> f64 {
    if state.awakening.has_adept_powers() {
        magic_total(state, catalog, pools) as f64
    } else {
        0.0
    }
}

pub fn compute_dashboard(state: &CharacterState, catalog: &Catalog) -> DashboardData {
    let pools = resolve(&state.priorities, &catalog.priority_table);

    let attributes = PoolSummary::new(pools.attr_points, attribute_spent(state, catalog));
    let skills = PoolSummary::new(
        pools.skill_points,
        state.skills.values().sum::<i32>() + state.specializations.len() as i32,
    );
    let skill_groups = PoolSummary::new(pools.group_points, state.skill_groups.values().sum());
    let special = PoolSummary::new(pools.special_points, state.special.values().sum());
    let knowledge = PoolSummary::new(
        knowledge_pool(state, catalog),
        state.knowledge_skills.values().sum::<i32>() + state.languages.values().sum::<i32>(),
    );
    let contacts = PoolSummary::new(
        contact_pool(state, catalog),
        state
            .contacts
            .iter()
            .map(|c| c.loyalty + c.connection)
            .sum(),
    );

    let essence = compute_essence(state, catalog);
    let nuyen = compute_nuyen(state, catalog, &pools);
    let stats = compute_stats(state, catalog, essence.remaining);
    let completion = completion_percentage(&attributes, &skills, &special, state.saved);

    DashboardData {
        pools,
        attributes,
        skills,
        skill_groups,
        special,
        knowledge,
        contacts,
        karma: compute_karma(state, catalog),
        power_points: compute_power_points(state, catalog, &pools),
        magic: magic_total(state, catalog, &pools),
        essence,
        nuyen,
        stats,
        completion,
    }
}

fn attribute_spent(state: &CharacterState, catalog: &Catalog) -> i32 {
    catalog
        .attributes
        .iter()
        .map(|def| {
            let (min, _) = catalog.attribute_bounds(&state.metatype_species, def);
            state
                .attributes
                .get(&def.id)
                .map(|value| value - min)
                .unwrap_or(0)
        })
        .sum()
}

fn compute_karma(state: &CharacterState, catalog: &Catalog) -> PoolSummary {
    let (cost, granted) = state
        .qualities
        .iter()
        .filter_map(|id| catalog.quality(id))
        .fold((0, 0), |(cost, granted), quality| {
            if quality.karma >= 0 {
                (cost + quality.karma, granted)
            } else {
                (cost, granted - quality.karma)
            }
        });
    PoolSummary::new(catalog.starting_karma() + granted, cost)
}

fn compute_power_points(
    state: &CharacterState,
    catalog: &Catalog,
    pools: &ResolvedPools,
) -> Option<PowerPointSummary> {
    if !state.awakening.has_adept_powers() {
        return None;
    }
    let total = power_point_budget(state, catalog, pools);
    let spent: f64 = state
        .powers
        .iter()
        .filter_map(|id| catalog.adept_power(id))
        .map(|p| p.cost)
        .sum();
    Some(PowerPointSummary {
        total,
        spent,
        remaining: total - spent,
    })
}

/// Essence left after augmentations: 6 minus each augment's cost scaled by its grade,
/// and by 0.9 for characters with Biocompatibility.
pub fn compute_essence(state: &CharacterState, catalog: &Catalog) -> EssenceSummary {
    let biocompatibility = if state.has_quality_matching("biocompatibility") {
        BIOCOMPATIBILITY_MULTIPLIER
    } else {
        1.0
    };

    let cost: f64 = state
        .augments
        .iter()
        .filter_map(|selection| {
            let augment = catalog.augment(&selection.id)?;
            let grade = catalog
                .augment_grade(&selection.grade)
                .map(|g| g.essence_multiplier)
                .unwrap_or(1.0);
            Some(augment.essence_cost * grade * biocompatibility)
        })
        .sum();

    EssenceSummary {
        base: BASE_ESSENCE,
        cost,
        remaining: BASE_ESSENCE - cost,
    }
}

pub fn compute_nuyen(
    state: &CharacterState,
    catalog: &Catalog,
    pools: &ResolvedPools,
) -> NuyenSummary {
    let augments: i64 = state
        .augments
        .iter()
        .filter_map(|selection| {
            let augment = catalog.augment(&selection.id)?;
            let multiplier = catalog
                .augment_grade(&selection.grade)
                .map(|g| g.cost_multiplier)
                .unwrap_or(1.0);
            let mut cost = (augment.cost as f64 * multiplier).round() as i64;
            if augment.cyberlimb {
                let upgrades = i64::from(selection.agi_upgrade) + i64::from(selection.str_upgrade);
                cost = cost.saturating_add(upgrades.saturating_mul(augment.upgrade_cost));
            }
            Some(cost)
        })
        .sum();

    let lifestyle = state
        .lifestyle
        .as_deref()
        .and_then(|id| catalog.lifestyle(id))
        .map(|l| l.monthly_cost * i64::from(state.lifestyle_months.max(1)))
        .unwrap_or(0);

    let gear: i64 = state
        .gear
        .iter()
        .filter_map(|(id, quantity)| {
            catalog
                .gear_item(id)
                .map(|item| item.cost * i64::from(*quantity))
        })
        .sum();

    let drones: i64 = state
        .drones
        .iter()
        .filter_map(|selection| {
            let drone = catalog.drone(&selection.id)?;
            let mods: i64 = selection
                .mods
                .iter()
                .filter_map(|id| catalog.drone_mod(id))
                .map(|m| m.cost)
                .sum();
            Some(drone.cost + mods)
        })
        .sum();

    let spent = augments + lifestyle + gear + drones;
    NuyenSummary {
        total: pools.resources,
        augments,
        lifestyle,
        gear,
        drones,
        spent,
        remaining: pools.resources - spent,
    }
}

// Update derived attributes based on basic attributes and remaining essence.
pub fn compute_stats(state: &CharacterState, catalog: &Catalog, essence: f64) -> DerivedStats {
    let attribute = |name: &str| state.attribute(catalog, name);
    let body = attribute("body");
    let reaction = attribute("reaction");
    let strength = attribute("strength");
    let willpower = attribute("willpower");
    let logic = attribute("logic");
    let intuition = attribute("intuition");
    let charisma = attribute("charisma");
    let essence = if essence.is_finite() { essence } else { BASE_ESSENCE };

    DerivedStats {
        physical_limit: ((strength * 2 + body + reaction) as f64 / 3.0).ceil() as i32,
        mental_limit: ((logic * 2 + intuition + willpower) as f64 / 3.0).ceil() as i32,
        social_limit: ((charisma * 2 + willpower + essence.floor() as i32) as f64 / 3.0).ceil()
            as i32,
        physical_monitor: 8 + (body as f64 / 2.0).ceil() as i32,
        stun_monitor: 8 + (willpower as f64 / 2.0).ceil() as i32,
        composure: charisma + willpower,
        judge_intentions: charisma + intuition,
        memory: logic + willpower,
        lift_carry: strength + body,
        initiative: reaction + intuition,
    }
}

/// 33% attributes, 33% skills, 20% special, 14 points for a saved sheet; capped at 100.
pub fn completion_percentage(
    attributes: &PoolSummary,
    skills: &PoolSummary,
    special: &PoolSummary,
    saved: bool,
) -> u8 {
    let saved_bonus = if saved { 14.0 } else { 0.0 };
    let score = 33.0 * attributes.spent_fraction()
        + 33.0 * skills.spent_fraction()
        + 20.0 * special.spent_fraction()
        + saved_bonus;
    score.clamp(0.0, 100.0).round() as u8
}

/// Explicit memoization table for dashboards.
///
/// Entries are keyed by a caller-chosen cache key and invalidated whenever the
/// fingerprint of (state, catalog) changes. Owned and passed around by the caller.
#[derive(Debug, Default)]
pub struct MetricsCache {
    entries: HashMap<String, (u64, DashboardData)>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dashboard(
        &mut self,
        key: &str,
        state: &CharacterState,
        catalog: &Catalog,
    ) -> DashboardData {
        let Some(fingerprint) = fingerprint(state, catalog) else {
            return compute_dashboard(state, catalog);
        };

        if let Some((cached, data)) = self.entries.get(key) {
            if *cached == fingerprint {
                return data.clone();
            }
        }

        let data = compute_dashboard(state, catalog);
        self.entries
            .insert(key.to_string(), (fingerprint, data.clone()));
        data
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fingerprint(state: &CharacterState, catalog: &Catalog) -> Option<u64> {
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(state).ok()?.hash(&mut hasher);
    serde_json::to_string(catalog).ok()?.hash(&mut hasher);
    Some(hasher.finish())
}
