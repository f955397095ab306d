use crate::error::AppError;
use crate::hero::HeroId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroCode {
    pub code: String,
    pub name: String,
}

/// Translation between the short codes clients send and hero names.
///
/// An empty table passes values through unchanged, so callers can send names
/// directly when no `herocodes.json` is installed.
#[derive(Debug, Clone, Default)]
pub struct HeroCodeTable {
    by_code: BTreeMap<String, HeroId>,
    by_hero: BTreeMap<HeroId, String>,
}

impl HeroCodeTable {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("No hero code table at {}, using names as sent", path.display());
            return Ok(HeroCodeTable::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let entries: Vec<HeroCode> = serde_json::from_str(&content)?;
        let listed = entries.len();
        let table = HeroCodeTable::from_entries(entries);
        if table.len() < listed {
            log::warn!(
                "{} of {} hero code entries in {} were blank or duplicated",
                listed - table.len(),
                listed,
                path.display()
            );
        }
        log::debug!("Loaded {} hero codes from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = HeroCode>) -> Self {
        let mut table = HeroCodeTable::default();
        for entry in entries {
            let Some(hero) = HeroId::parse(&entry.name) else {
                continue;
            };
            let code = entry.code.trim().to_string();
            table.by_hero.entry(hero.clone()).or_insert_with(|| code.clone());
            table.by_code.insert(code, hero);
        }
        table
    }

    pub fn is_passthrough(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Resolve one request value. Blank and unknown values are absent.
    pub fn hero(&self, value: &str) -> Option<HeroId> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if self.is_passthrough() {
            return HeroId::parse(value);
        }
        let hero = self.by_code.get(value).cloned();
        if hero.is_none() {
            log::debug!("Ignoring unknown hero code {:?}", value);
        }
        hero
    }

    pub fn resolve(&self, value: Option<&String>) -> Option<HeroId> {
        value.and_then(|v| self.hero(v))
    }

    /// Code to send back for `hero`, or its name when no code is known.
    pub fn code_of(&self, hero: &HeroId) -> String {
        self.by_hero
            .get(hero)
            .cloned()
            .unwrap_or_else(|| hero.to_string())
    }
}
