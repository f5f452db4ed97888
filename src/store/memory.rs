use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Utc;

use super::ProfileStore;
use crate::model::FormatProfile;

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<Vec<FormatProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().map(|profiles| profiles.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileStore for MemoryProfileStore {
    fn upsert(&self, owner_scope_id: &str, profile: &FormatProfile) -> Result<FormatProfile> {
        let mut profiles = self
            .profiles
            .lock()
            .map_err(|_| anyhow!("memory profile store lock poisoned"))?;

        if let Some(existing) = profiles.iter_mut().find(|stored| {
            stored.owner_scope_id == owner_scope_id && stored.signature == profile.signature
        }) {
            let usage_count = existing.usage_count + 1;
            let created_at = existing.created_at;
            let corrections = if profile.corrections.is_null() {
                existing.corrections.clone()
            } else {
                profile.corrections.clone()
            };

            *existing = FormatProfile {
                owner_scope_id: owner_scope_id.to_string(),
                usage_count,
                corrections,
                created_at,
                updated_at: Utc::now(),
                ..profile.clone()
            };
            return Ok(existing.clone());
        }

        let inserted = FormatProfile {
            owner_scope_id: owner_scope_id.to_string(),
            usage_count: profile.usage_count.max(1),
            ..profile.clone()
        };
        profiles.push(inserted.clone());
        Ok(inserted)
    }

    fn list(&self, owner_scope_id: &str) -> Result<Vec<FormatProfile>> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| anyhow!("memory profile store lock poisoned"))?;
        Ok(profiles
            .iter()
            .filter(|profile| profile.owner_scope_id == owner_scope_id)
            .cloned()
            .collect())
    }

    fn get_by_signature(
        &self,
        owner_scope_id: &str,
        signature: &str,
    ) -> Result<Option<FormatProfile>> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| anyhow!("memory profile store lock poisoned"))?;
        Ok(profiles
            .iter()
            .find(|profile| profile.owner_scope_id == owner_scope_id && profile.signature == signature)
            .cloned())
    }
}
