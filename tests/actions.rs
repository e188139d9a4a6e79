mod common;

use common::{dummy_catalog, state_with};
use sharad_chargen::error::Result;
use sharad_chargen::*;

fn bump_attribute(id: &str, delta: i32) -> Action {
    Action::BumpAttribute {
        id: id.to_string(),
        delta,
    }
}

fn apply_all(state: &CharacterState, catalog: &Catalog, actions: &[Action]) -> CharacterState {
    actions
        .iter()
        .fold(state.clone(), |state, action| apply(&state, catalog, action))
}

#[test]
fn test_action_from_json() {
    let action: Action = serde_json::from_str(r#"{"type":"bump_attribute","id":"body","delta":1}"#)
        .expect("Failed to parse action");
    assert_eq!(action, bump_attribute("body", 1));

    let action: Action =
        serde_json::from_str(r#"{"type":"set_priority","category":"attributes","letter":"A"}"#)
            .expect("Failed to parse action");
    assert_eq!(
        action,
        Action::SetPriority {
            category: Category::Attributes,
            letter: Letter::A,
        }
    );

    let action: Action = serde_json::from_str(r#"{"type":"save"}"#).expect("Failed to parse action");
    assert_eq!(action, Action::Save);
}

#[test]
fn test_bump_attribute_refused_past_pool() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            bump_attribute("body", 5),
            bump_attribute("agility", 5),
            bump_attribute("reaction", 5),
            bump_attribute("strength", 5),
        ],
    );
    assert_eq!(compute_dashboard(&state, &catalog).attributes.remaining, 0);

    let next = apply(&state, &catalog, &bump_attribute("willpower", 1));
    assert_eq!(next, state);

    let lowered = apply(&state, &catalog, &bump_attribute("body", -2));
    assert_eq!(lowered.attributes.get("body"), Some(&4));
}

#[test]
fn test_bump_attribute_clamped_to_bounds() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);

    let next = apply(&state, &catalog, &bump_attribute("body", 10));
    assert_eq!(next.attributes.get("body"), Some(&6));

    let next = apply(&next, &catalog, &bump_attribute("body", -10));
    assert_eq!(next.attributes.get("body"), Some(&1));

    let unknown = apply(&state, &catalog, &bump_attribute("luck", 1));
    assert_eq!(unknown, state);
}

#[test]
fn test_set_priority_swaps_and_resets() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            bump_attribute("body", 3),
            Action::SetAwakening {
                awakening: Awakening::Mage,
            },
            Action::SetMetatype {
                id: "elf".to_string(),
            },
            Action::BumpSkill {
                id: "pistols".to_string(),
                delta: 4,
            },
        ],
    );
    assert_eq!(state.attributes.get("body"), Some(&4));
    assert_eq!(state.awakening, Awakening::Mage);
    assert_eq!(state.metatype_species, "elf");

    let next = apply(
        &state,
        &catalog,
        &Action::SetPriority {
            category: Category::Attributes,
            letter: Letter::A,
        },
    );

    assert!(next.priorities.is_permutation());
    assert_eq!(next.priorities.get(Category::Attributes), Letter::A);
    assert_eq!(next.priorities.get(Category::Metatype), Letter::B);
    assert!(next.attributes.values().all(|value| *value == 1));
    assert!(next.skills.is_empty());
    assert_eq!(next.awakening, Awakening::Mundane);
    assert_eq!(next.metatype_species, "human");
}

#[test]
fn test_set_priority_to_same_letter_keeps_allocations() {
    let catalog = dummy_catalog();
    let state = apply(&CharacterState::new(&catalog), &catalog, &bump_attribute("body", 3));

    let next = apply(
        &state,
        &catalog,
        &Action::SetPriority {
            category: Category::Attributes,
            letter: Letter::B,
        },
    );
    assert_eq!(next, state);
}

#[test]
fn test_set_priority_preserving_trims_to_new_pool() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            bump_attribute("body", 5),
            bump_attribute("agility", 5),
            bump_attribute("reaction", 5),
            bump_attribute("strength", 5),
        ],
    );

    let next = apply(
        &state,
        &catalog,
        &Action::SetPriorityPreserving {
            category: Category::Attributes,
            letter: Letter::E,
        },
    );

    assert_eq!(next.priorities.get(Category::Resources), Letter::B);
    let data = compute_dashboard(&next, &catalog);
    assert_eq!(data.attributes.total, 12);
    assert_eq!(data.attributes.spent, 12);
    assert_eq!(data.nuyen.total, 275000);
}

#[test]
fn test_locked_skill_bump_is_refused() {
    let catalog = dummy_catalog();
    let state = apply(
        &CharacterState::new(&catalog),
        &catalog,
        &Action::BumpSkillGroup {
            id: "firearms".to_string(),
            delta: 1,
        },
    );
    assert_eq!(state.skill_groups.get("firearms"), Some(&1));

    let next = apply(
        &state,
        &catalog,
        &Action::BumpSkill {
            id: "pistols".to_string(),
            delta: 1,
        },
    );
    assert_eq!(next, state);
    assert_eq!(next.effective_skill_rating(&catalog, "pistols"), 1);
}

#[test]
fn test_skill_group_bump_refused_past_group_pool() {
    let catalog = dummy_catalog();
    let state = apply(
        &CharacterState::new(&catalog),
        &catalog,
        &Action::BumpSkillGroup {
            id: "firearms".to_string(),
            delta: 2,
        },
    );
    assert_eq!(state.skill_groups.get("firearms"), Some(&2));

    let next = apply(
        &state,
        &catalog,
        &Action::BumpSkillGroup {
            id: "stealth".to_string(),
            delta: 1,
        },
    );
    assert_eq!(next, state);
}

#[test]
fn test_specialization_requires_rated_skill() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);
    let set_revolvers = Action::SetSpecialization {
        skill_id: "pistols".to_string(),
        specialization: Some("Revolvers".to_string()),
    };

    let unrated = apply(&state, &catalog, &set_revolvers);
    assert!(unrated.specializations.is_empty());

    let rated = apply_all(
        &state,
        &catalog,
        &[
            Action::BumpSkill {
                id: "pistols".to_string(),
                delta: 2,
            },
            set_revolvers,
        ],
    );
    assert_eq!(
        rated.specializations.get("pistols").map(String::as_str),
        Some("Revolvers")
    );
    assert_eq!(compute_dashboard(&rated, &catalog).skills.spent, 3);

    // Dropping the skill to zero takes the specialization with it.
    let cleared = apply(
        &rated,
        &catalog,
        &Action::BumpSkill {
            id: "pistols".to_string(),
            delta: -2,
        },
    );
    assert!(cleared.specializations.is_empty());
}

#[test]
fn test_magic_priority_e_clears_magic_selections() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            Action::SetAwakening {
                awakening: Awakening::Mage,
            },
            Action::SetTradition {
                id: Some("hermetic".to_string()),
            },
            Action::ToggleSpell {
                id: "manabolt".to_string(),
            },
        ],
    );
    assert_eq!(state.spells, vec!["manabolt".to_string()]);
    assert_eq!(state.tradition.as_deref(), Some("hermetic"));

    let next = apply(
        &state,
        &catalog,
        &Action::SetPriorityPreserving {
            category: Category::Magic,
            letter: Letter::E,
        },
    );
    assert_eq!(next.awakening, Awakening::Mundane);
    assert!(next.spells.is_empty());
    assert_eq!(next.tradition, None);
}

#[test]
fn test_toggle_power_refused_over_budget() {
    let catalog = dummy_catalog();
    let toggle = |id: &str| Action::TogglePower { id: id.to_string() };
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            Action::SetAwakening {
                awakening: Awakening::Adept,
            },
            toggle("improved_reflexes"),
            toggle("killing_hands"),
        ],
    );
    assert_eq!(state.powers.len(), 2);

    let refused = apply(&state, &catalog, &toggle("enhanced_accuracy"));
    assert_eq!(refused, state);

    let removed = apply(&state, &catalog, &toggle("killing_hands"));
    assert_eq!(removed.powers, vec!["improved_reflexes".to_string()]);
}

#[test]
fn test_save_locks_sheet_until_reset() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);

    let saved = apply(&state, &catalog, &Action::Save);
    assert!(saved.saved);

    let ignored = apply(&saved, &catalog, &bump_attribute("body", 1));
    assert_eq!(ignored, saved);

    let reset = apply(&saved, &catalog, &Action::Reset);
    assert!(!reset.saved);
    assert_eq!(reset, CharacterState::new(&catalog));
}

#[test]
fn test_save_blocked_by_validation_errors() {
    let catalog = dummy_catalog();
    let state = apply(
        &CharacterState::new(&catalog),
        &catalog,
        &Action::AddAugment {
            id: "cyberarm".to_string(),
            grade: None,
        },
    );
    assert_eq!(compute_dashboard(&state, &catalog).nuyen.remaining, -9000);

    let next = apply(&state, &catalog, &Action::Save);
    assert!(!next.saved);
}

#[test]
fn test_gear_and_augment_actions() {
    let catalog = dummy_catalog();
    let state = state_with(&[
        (Category::Resources, Letter::A),
        (Category::Metatype, Letter::E),
        (Category::Attributes, Letter::B),
        (Category::Skills, Letter::C),
        (Category::Magic, Letter::D),
    ]);

    let state = apply_all(
        &state,
        &catalog,
        &[
            Action::SetGearQuantity {
                id: "ares_predator".to_string(),
                quantity: 2,
            },
            Action::AddAugment {
                id: "cyberarm".to_string(),
                grade: Some("alpha".to_string()),
            },
            Action::SetAugmentUpgrades {
                index: 0,
                agility: 2,
                strength: 1,
            },
            Action::AddDrone {
                id: "fly_spy".to_string(),
            },
            Action::ToggleDroneMod {
                index: 0,
                mod_id: "sensor_upgrade".to_string(),
            },
            Action::SetLifestyle {
                id: Some("low".to_string()),
                months: 3,
            },
        ],
    );

    assert_eq!(state.gear.get("ares_predator"), Some(&2));
    assert_eq!(state.augments[0].grade, "alpha");
    assert_eq!(state.augments[0].agi_upgrade, 2);
    assert_eq!(state.drones[0].mods, vec!["sensor_upgrade".to_string()]);

    let nuyen = compute_dashboard(&state, &catalog).nuyen;
    assert_eq!(nuyen.gear, 1450);
    assert_eq!(nuyen.augments, 18000 + 15000);
    assert_eq!(nuyen.drones, 2500);
    assert_eq!(nuyen.lifestyle, 6000);
    assert_eq!(nuyen.remaining, 450000 - 1450 - 33000 - 2500 - 6000);

    let state = apply_all(
        &state,
        &catalog,
        &[
            Action::SetGearQuantity {
                id: "ares_predator".to_string(),
                quantity: 0,
            },
            Action::RemoveAugment { index: 0 },
            Action::RemoveDrone { index: 0 },
        ],
    );
    assert!(state.gear.is_empty());
    assert!(state.augments.is_empty());
    assert!(state.drones.is_empty());
}

#[test]
fn test_contact_actions() {
    let catalog = dummy_catalog();
    let contact = |loyalty| Contact {
        name: "Jenna 'Fixer' Morgan".to_string(),
        loyalty,
        connection: 4,
    };

    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            Action::SetContact {
                contact: contact(3),
            },
            Action::SetContact {
                contact: contact(5),
            },
        ],
    );
    assert_eq!(state.contacts, vec![contact(5)]);

    let unchanged = apply(
        &state,
        &catalog,
        &Action::RemoveContact {
            name: "Nobody".to_string(),
        },
    );
    assert_eq!(unchanged, state);

    let removed = apply(
        &state,
        &catalog,
        &Action::RemoveContact {
            name: "Jenna 'Fixer' Morgan".to_string(),
        },
    );
    assert!(removed.contacts.is_empty());
}

#[test]
fn test_languages_skip_native_language() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[
            Action::SetNativeLanguage {
                name: Some("English".to_string()),
            },
            Action::BumpLanguage {
                name: "English".to_string(),
                delta: 2,
            },
            Action::BumpLanguage {
                name: "Japanese".to_string(),
                delta: 2,
            },
            Action::BumpKnowledgeSkill {
                name: "Corp Politics".to_string(),
                delta: 3,
            },
        ],
    );

    assert!(!state.languages.contains_key("English"));
    assert_eq!(state.languages.get("Japanese"), Some(&2));
    // Three points do not fit in the two left over.
    assert!(state.knowledge_skills.is_empty());
}

#[test]
fn test_compute_next_state_persists_every_state() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);
    let mut persisted: Vec<CharacterState> = Vec::new();

    let next = {
        let mut persist = |s: &CharacterState| -> Result<()> {
            persisted.push(s.clone());
            Ok(())
        };
        compute_next_state(&state, &catalog, &bump_attribute("body", 1), &mut persist)
    };

    assert_eq!(persisted, vec![next.clone()]);
    assert_eq!(next.attributes.get("body"), Some(&2));
}

#[test]
fn test_compute_next_state_ignores_persist_failure() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);
    let mut failing = |_: &CharacterState| -> Result<()> { Err(ChargenError::NoHomeDirectory) };

    let next = compute_next_state(&state, &catalog, &bump_attribute("body", 1), &mut failing);
    assert_eq!(next, apply(&state, &catalog, &bump_attribute("body", 1)));
}

#[test]
fn test_extreme_bump_deltas_are_clamped() {
    let catalog = dummy_catalog();
    let state = CharacterState::new(&catalog);

    let maxed = apply(&state, &catalog, &bump_attribute("body", i32::MAX));
    assert_eq!(maxed.attributes.get("body"), Some(&6));
    let floored = apply(&maxed, &catalog, &bump_attribute("body", i32::MIN));
    assert_eq!(floored.attributes.get("body"), Some(&1));

    let skill = |delta| Action::BumpSkill {
        id: "perception".to_string(),
        delta,
    };
    let maxed = apply(&state, &catalog, &skill(i32::MAX));
    assert_eq!(maxed.skills.get("perception"), Some(&6));
    let floored = apply(&maxed, &catalog, &skill(i32::MIN));
    assert!(!floored.skills.contains_key("perception"));

    let special = |delta| Action::BumpSpecial {
        id: "edge".to_string(),
        delta,
    };
    let maxed = apply(&state, &catalog, &special(i32::MAX));
    assert_eq!(maxed.special.get("edge"), Some(&5));
    let floored = apply(&maxed, &catalog, &special(i32::MIN));
    assert!(!floored.special.contains_key("edge"));
}

#[test]
fn test_extreme_group_deltas_are_clamped() {
    let catalog = dummy_catalog();
    let group = |delta| Action::BumpSkillGroup {
        id: "firearms".to_string(),
        delta,
    };

    // A six-point group does not fit the two points of the default letter.
    let state = CharacterState::new(&catalog);
    assert_eq!(apply(&state, &catalog, &group(i32::MAX)), state);

    let state = normalize(&state_with(&[(Category::Skills, Letter::A)]), &catalog);
    let maxed = apply(&state, &catalog, &group(i32::MAX));
    assert_eq!(maxed.skill_groups.get("firearms"), Some(&6));
    let floored = apply(&maxed, &catalog, &group(i32::MIN));
    assert!(!floored.skill_groups.contains_key("firearms"));
}

#[test]
fn test_extreme_knowledge_deltas_are_clamped() {
    let catalog = dummy_catalog();
    let state = apply_all(
        &CharacterState::new(&catalog),
        &catalog,
        &[bump_attribute("logic", 3), bump_attribute("intuition", 3)],
    );
    let knowledge = |delta| Action::BumpKnowledgeSkill {
        name: "Corp Politics".to_string(),
        delta,
    };
    let language = |delta| Action::BumpLanguage {
        name: "Japanese".to_string(),
        delta,
    };

    let maxed = apply_all(&state, &catalog, &[knowledge(i32::MAX), language(i32::MAX)]);
    assert_eq!(maxed.knowledge_skills.get("Corp Politics"), Some(&6));
    assert_eq!(maxed.languages.get("Japanese"), Some(&6));

    let floored = apply_all(&maxed, &catalog, &[knowledge(i32::MIN), language(i32::MIN)]);
    assert!(floored.knowledge_skills.is_empty());
    assert!(floored.languages.is_empty());
}

#[test]
fn test_extreme_cyberlimb_upgrades_are_clamped() {
    let catalog = dummy_catalog();
    let upgrades = |value| Action::SetAugmentUpgrades {
        index: 0,
        agility: value,
        strength: value,
    };
    let state = apply(
        &CharacterState::new(&catalog),
        &catalog,
        &Action::AddAugment {
            id: "cyberarm".to_string(),
            grade: None,
        },
    );

    let maxed = apply(&state, &catalog, &upgrades(i32::MAX));
    assert_eq!(maxed.augments[0].agi_upgrade, 6);
    assert_eq!(maxed.augments[0].str_upgrade, 6);
    assert_eq!(compute_dashboard(&maxed, &catalog).nuyen.augments, 75000);
    assert_eq!(apply(&maxed, &catalog, &Action::Save), maxed);

    let floored = apply(&maxed, &catalog, &upgrades(i32::MIN));
    assert_eq!(floored.augments[0].agi_upgrade, 0);
    assert_eq!(floored.augments[0].str_upgrade, 0);

    // Unnormalized upgrades still price without overflowing.
    let mut raw = state.clone();
    raw.augments[0].agi_upgrade = i32::MAX;
    raw.augments[0].str_upgrade = i32::MAX;
    let nuyen = compute_dashboard(&raw, &catalog).nuyen;
    assert!(nuyen.augments > i64::from(i32::MAX));
    assert!(nuyen.remaining < 0);
}
