// src/priority.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// A priority letter, A (best) through E (worst).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
}

impl Letter {
    // A = 5 ... E = 1
    pub fn rank(self) -> u8 {
        match self {
            Letter::A => 5,
            Letter::B => 4,
            Letter::C => 3,
            Letter::D => 2,
            Letter::E => 1,
        }
    }
}

/// The fixed set of categories a priority letter is assigned to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Metatype,
    Attributes,
    Skills,
    Magic,
    Resources,
}

/// Priority letter assignment, one letter per category.
///
/// A valid assignment is a bijection from [`Category`] onto A–E. Deserialized input may be
/// partial or contain duplicates; [`Priorities::normalized`] repairs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priorities(BTreeMap<Category, Letter>);

impl Default for Priorities {
    // Round-robin: metatype A, attributes B, skills C, magic D, resources E.
    fn default() -> Self {
        Priorities(Category::iter().zip(Letter::iter()).collect())
    }
}

impl Priorities {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Category, Letter)>) -> Self {
        Priorities(pairs.into_iter().collect())
    }

    // Unassigned categories resolve to the lowest rank.
    pub fn get(&self, category: Category) -> Letter {
        self.0.get(&category).copied().unwrap_or(Letter::E)
    }

    pub fn holder_of(&self, letter: Letter) -> Option<Category> {
        self.0
            .iter()
            .find(|(_, held)| **held == letter)
            .map(|(category, _)| *category)
    }

    /// Assign `letter` to `category`, handing the category's previous letter to whichever
    /// category held `letter` before.
    pub fn set(&mut self, category: Category, letter: Letter) {
        let previous = self.0.get(&category).copied();
        let holders: Vec<Category> = self
            .0
            .iter()
            .filter(|(held_by, held)| **held == letter && **held_by != category)
            .map(|(held_by, _)| *held_by)
            .collect();

        for holder in holders {
            match previous {
                Some(previous) => {
                    self.0.insert(holder, previous);
                }
                None => {
                    self.0.remove(&holder);
                }
            }
        }
        self.0.insert(category, letter);
    }

    pub fn is_permutation(&self) -> bool {
        Category::iter().all(|c| self.0.contains_key(&c))
            && Letter::iter().all(|l| self.holder_of(l).is_some())
    }

    /// Repair into a bijection: the first holder of a letter (in category order) keeps it,
    /// the remaining categories take the unused letters from A to E.
    pub fn normalized(&self) -> Self {
        if self.is_permutation() {
            return self.clone();
        }

        let mut assigned: BTreeMap<Category, Letter> = BTreeMap::new();
        for category in Category::iter() {
            if let Some(letter) = self.0.get(&category) {
                if !assigned.values().any(|held| held == letter) {
                    assigned.insert(category, *letter);
                }
            }
        }

        let free: Vec<Letter> = Letter::iter()
            .filter(|l| !assigned.values().any(|held| held == l))
            .collect();
        let mut free = free.into_iter();
        for category in Category::iter() {
            if !assigned.contains_key(&category) {
                if let Some(letter) = free.next() {
                    assigned.insert(category, letter);
                }
            }
        }
        Priorities(assigned)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Letter)> + '_ {
        self.0.iter().map(|(c, l)| (*c, *l))
    }
}

/// Point quantities per priority letter for each category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityTable {
    pub attributes: BTreeMap<Letter, i32>,
    pub skills: BTreeMap<Letter, i32>,
    pub skill_groups: BTreeMap<Letter, i32>,
    pub magic: BTreeMap<Letter, i32>,
    pub resources: BTreeMap<Letter, i64>,
    pub metatype_special: BTreeMap<Letter, i32>,
}

impl PriorityTable {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.skills.is_empty()
            && self.skill_groups.is_empty()
            && self.magic.is_empty()
            && self.resources.is_empty()
            && self.metatype_special.is_empty()
    }
}

// Point pools for the current priority assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPools {
    pub attr_points: i32,
    pub skill_points: i32,
    pub group_points: i32,
    pub magic_rating: i32,
    pub resources: i64,
    pub special_points: i32,
    pub magic_letter: Letter,
}

impl ResolvedPools {
    // Magic/resonance eligibility
    pub fn magic_disabled(&self) -> bool {
        self.magic_letter == Letter::E || self.magic_rating <= 0
    }
}

/// Map each category's letter onto its row of the priority table. Missing rows are 0.
pub fn resolve(priorities: &Priorities, table: &PriorityTable) -> ResolvedPools {
    fn row<T: Copy + Default>(row: &BTreeMap<Letter, T>, letter: Letter) -> T {
        row.get(&letter).copied().unwrap_or_default()
    }

    let magic_letter = priorities.get(Category::Magic);
    let skills_letter = priorities.get(Category::Skills);

    ResolvedPools {
        attr_points: row(&table.attributes, priorities.get(Category::Attributes)),
        skill_points: row(&table.skills, skills_letter),
        group_points: row(&table.skill_groups, skills_letter),
        magic_rating: row(&table.magic, magic_letter),
        resources: row(&table.resources, priorities.get(Category::Resources)),
        special_points: row(&table.metatype_special, priorities.get(Category::Metatype)),
        magic_letter,
    }
}
