use crate::actions::Persist;
use crate::character::CharacterState;
use crate::error::{ChargenError, Result};
use crate::settings::Settings;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, read_dir, read_to_string, remove_file, write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// A locally cached, not yet confirmed character state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Draft {
    pub draft_id: String,
    pub feature_id: String,
    pub saved_at: DateTime<Utc>,
    pub state: CharacterState,
}

impl Draft {
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.saved_at > ttl
    }
}

/// One JSON file per draft id. Drafts older than the TTL are treated as absent, and a full
/// store makes room by evicting expired drafts before giving up.
#[derive(Clone, Debug)]
pub struct DraftStore {
    dir: PathBuf,
    feature_id: String,
    ttl: Duration,
    max_drafts: usize,
    current_draft: String,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            dir: dir.into(),
            feature_id: settings.feature_id.clone(),
            ttl: Duration::days(settings.draft_ttl_days),
            max_drafts: settings.max_drafts,
            current_draft: Self::new_draft_id(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.resolved_draft_dir()?, settings))
    }

    pub fn new_draft_id() -> String {
        Uuid::new_v4().to_string()
    }

    // Which draft `persist` writes to.
    pub fn with_draft_id(mut self, draft_id: impl Into<String>) -> Self {
        self.current_draft = draft_id.into();
        self
    }

    pub fn draft_id(&self) -> &str {
        &self.current_draft
    }

    fn path_for(&self, draft_id: &str) -> PathBuf {
        self.dir.join(format!("{draft_id}.json"))
    }

    pub fn scan_drafts(&self) -> Vec<String> {
        if !self.dir.exists() {
            return Vec::new();
        }

        let Ok(entries) = read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut drafts: Vec<String> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                if path.is_file() && path.extension()? == "json" {
                    path.file_stem()?.to_str().map(String::from)
                } else {
                    None
                }
            })
            .collect();
        drafts.sort();
        drafts
    }

    pub fn store(&self, draft_id: &str, state: &CharacterState) -> Result<()> {
        self.store_at(draft_id, state, Utc::now())
    }

    pub fn store_at(&self, draft_id: &str, state: &CharacterState, now: DateTime<Utc>) -> Result<()> {
        create_dir_all(&self.dir)?;

        let is_new = !self.path_for(draft_id).exists();
        if is_new && self.scan_drafts().len() >= self.max_drafts {
            let evicted = self.evict_expired_at(now)?;
            log::info!("Draft store full, evicted {evicted} expired draft(s)");
            if self.scan_drafts().len() >= self.max_drafts {
                return Err(ChargenError::DraftQuotaExceeded(self.max_drafts));
            }
        }

        let draft = Draft {
            draft_id: draft_id.to_string(),
            feature_id: self.feature_id.clone(),
            saved_at: now,
            state: state.clone(),
        };
        write(self.path_for(draft_id), serde_json::to_string_pretty(&draft)?)?;
        Ok(())
    }

    pub fn load(&self, draft_id: &str) -> Result<Option<Draft>> {
        self.load_at(draft_id, Utc::now())
    }

    /// Read a draft; an expired one is deleted and reported as absent.
    pub fn load_at(&self, draft_id: &str, now: DateTime<Utc>) -> Result<Option<Draft>> {
        let path = self.path_for(draft_id);
        if !path.exists() {
            return Ok(None);
        }

        let draft: Draft = serde_json::from_str(&read_to_string(&path)?)?;
        if draft.is_expired(self.ttl, now) {
            log::debug!("Draft {draft_id} expired, removing it");
            remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(draft))
    }

    pub fn delete(&self, draft_id: &str) -> Result<()> {
        let path = self.path_for(draft_id);
        if path.exists() {
            remove_file(path)?;
        }
        Ok(())
    }

    pub fn evict_expired(&self) -> Result<usize> {
        self.evict_expired_at(Utc::now())
    }

    pub fn evict_expired_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut evicted = 0;
        for draft_id in self.scan_drafts() {
            let path = self.path_for(&draft_id);
            match read_draft(&path) {
                Some(draft) if !draft.is_expired(self.ttl, now) => {}
                // Expired or unreadable drafts both go.
                _ => {
                    remove_file(&path)?;
                    evicted += 1;
                }
            }
        }
        Ok(evicted)
    }
}

fn read_draft(path: &Path) -> Option<Draft> {
    let data = read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

impl Persist for DraftStore {
    fn persist(&mut self, state: &CharacterState) -> Result<()> {
        let draft_id = self.current_draft.clone();
        self.store(&draft_id, state)
    }
}
