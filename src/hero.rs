use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when a multi-hero key has to be flattened into one string.
pub const KEY_SEPARATOR: char = '|';

/// Canonical hero identifier (the hero's display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(String);

impl HeroId {
    pub fn new(name: impl Into<String>) -> Self {
        HeroId(name.into())
    }

    /// Normalise a raw slot value: trimmed, empty means absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(HeroId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeroId {
    fn from(name: &str) -> Self {
        HeroId::new(name)
    }
}

/// Order-sensitive lookup key of one or two prior picks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey(Vec<HeroId>);

impl PatternKey {
    pub fn single(hero: HeroId) -> Self {
        PatternKey(vec![hero])
    }

    pub fn pair(first: HeroId, second: HeroId) -> Self {
        PatternKey(vec![first, second])
    }

    /// True when any position holds the same hero as the same position of `other`.
    pub fn overlaps(&self, other: &PatternKey) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a == b)
    }

    pub fn to_flat(&self) -> String {
        let parts: Vec<&str> = self.0.iter().map(HeroId::as_str).collect();
        parts.join(&KEY_SEPARATOR.to_string())
    }

    pub fn from_flat(flat: &str) -> Option<Self> {
        let heroes: Option<Vec<HeroId>> = flat.split(KEY_SEPARATOR).map(HeroId::parse).collect();
        heroes.filter(|h| !h.is_empty()).map(PatternKey)
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_flat())
    }
}
