// Shared fixtures for the integration tests.
#![allow(dead_code)]

use sharad_chargen::*;
use std::fs;

pub fn dummy_catalog() -> Catalog {
    let json_str = fs::read_to_string("tests/dummy_catalog.json")
        .expect("Failed to read dummy catalog JSON file");
    Catalog::from_json(&json_str).expect("Failed to parse dummy catalog")
}

// Unlisted categories are filled in by normalization.
pub fn priorities(pairs: &[(Category, Letter)]) -> Priorities {
    Priorities::from_pairs(pairs.iter().copied())
}

pub fn state_with(pairs: &[(Category, Letter)]) -> CharacterState {
    CharacterState {
        priorities: priorities(pairs),
        ..CharacterState::default()
    }
}

pub fn map(entries: &[(&str, i32)]) -> std::collections::BTreeMap<String, i32> {
    entries
        .iter()
        .map(|(id, value)| (id.to_string(), *value))
        .collect()
}
