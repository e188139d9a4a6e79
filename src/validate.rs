// src/validate.rs
use crate::character::CharacterState;
use crate::derived::{DashboardData, PoolSummary};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// The part of the form an issue points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Attributes,
    Skills,
    SkillGroups,
    Special,
    Knowledge,
    Contacts,
    Qualities,
    Magic,
    Augments,
    Resources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub section: Section,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issues: Vec<Issue>,
    pub error_count: usize,
    pub warning_count: usize,
    pub is_valid: bool,
    pub can_save: bool,
}

impl ValidationResult {
    fn from_issues(issues: Vec<Issue>) -> Self {
        let error_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warning_count = issues.len() - error_count;
        ValidationResult {
            issues,
            error_count,
            warning_count,
            is_valid: error_count == 0 && warning_count == 0,
            can_save: error_count == 0,
        }
    }

    pub fn issues_in(&self, section: Section) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.section == section)
    }
}

// How a pool is checked: whether leftover points deserve a warning.
struct PoolRule<'a> {
    section: Section,
    pool: &'a PoolSummary,
    warn_unspent: bool,
}

/// Turn derived metrics into a classified issue list. Warnings never block saving.
pub fn validate(data: &DashboardData, state: &CharacterState) -> ValidationResult {
    let mut issues = Vec::new();

    let rules = [
        PoolRule {
            section: Section::Attributes,
            pool: &data.attributes,
            warn_unspent: true,
        },
        PoolRule {
            section: Section::Skills,
            pool: &data.skills,
            warn_unspent: true,
        },
        PoolRule {
            section: Section::SkillGroups,
            pool: &data.skill_groups,
            warn_unspent: true,
        },
        PoolRule {
            section: Section::Special,
            pool: &data.special,
            warn_unspent: data.special.total > 0,
        },
        PoolRule {
            section: Section::Knowledge,
            pool: &data.knowledge,
            warn_unspent: true,
        },
        PoolRule {
            section: Section::Contacts,
            pool: &data.contacts,
            warn_unspent: false,
        },
        PoolRule {
            section: Section::Qualities,
            pool: &data.karma,
            warn_unspent: false,
        },
    ];

    for rule in rules {
        let remaining = rule.pool.remaining;
        if remaining < 0 {
            issues.push(error(rule.section, format!("overspent {} point(s)", -remaining)));
        } else if remaining > 0 && rule.warn_unspent {
            issues.push(warning(rule.section, format!("{remaining} point(s) unspent")));
        }
    }

    if let Some(power_points) = &data.power_points {
        if power_points.remaining < -f64::EPSILON {
            issues.push(error(
                Section::Magic,
                format!("overspent {} power point(s)", -power_points.remaining),
            ));
        }
    }

    if state.awakening.is_magician() {
        if state.tradition.is_none() {
            issues.push(warning(Section::Magic, "no tradition selected".to_string()));
        }
        if state.spells.is_empty() {
            issues.push(warning(Section::Magic, "no spells selected".to_string()));
        }
    }

    if data.essence.remaining < 0.0 {
        issues.push(error(
            Section::Augments,
            format!("essence overspent by {:.2}", -data.essence.remaining),
        ));
    }

    if data.nuyen.remaining < 0 {
        issues.push(error(
            Section::Resources,
            format!("overspent {}¥", -data.nuyen.remaining),
        ));
    }

    ValidationResult::from_issues(issues)
}

fn error(section: Section, message: String) -> Issue {
    Issue {
        severity: Severity::Error,
        section,
        message,
    }
}

fn warning(section: Section, message: String) -> Issue {
    Issue {
        severity: Severity::Warning,
        section,
        message,
    }
}
