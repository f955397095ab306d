//! Conditional pick-pattern tables: the most frequent historical next picks
//! given one or two prior enemy picks.

use crate::dataset::MatchRecord;
use crate::hero::{HeroId, PatternKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const PATTERN_TOP_K: usize = 10;
pub const FIRST_PICK_POOL: usize = 40;

/// Draft-phase table identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternPhase {
    /// Enemy opened: main's 1st+2nd after enemy's 1st.
    #[serde(rename = "enemy_m1m2")]
    EnemyM1M2,
    /// Enemy opened: main's 3rd+4th after enemy's 2nd+3rd.
    #[serde(rename = "enemy_m3m4")]
    EnemyM3M4,
    /// Enemy opened: main's 5th after enemy's 4th+5th.
    #[serde(rename = "enemy_m5")]
    EnemyM5,
    /// Main opened: main's 2nd+3rd after enemy's 1st+2nd.
    #[serde(rename = "main_m2m3")]
    MainM2M3,
    /// Main opened: main's 4th+5th after enemy's 3rd+4th.
    #[serde(rename = "main_m4m5")]
    MainM4M5,
    /// Main's 2nd+3rd after enemy's 1st+2nd, whoever opened.
    #[serde(rename = "any_m2m3")]
    AnyOrderM2M3,
    /// Main's 4th+5th after enemy's 3rd+4th, whoever opened.
    #[serde(rename = "any_m4m5")]
    AnyOrderM4M5,
}

impl PatternPhase {
    pub const ALL: [PatternPhase; 7] = [
        PatternPhase::EnemyM1M2,
        PatternPhase::EnemyM3M4,
        PatternPhase::EnemyM5,
        PatternPhase::MainM2M3,
        PatternPhase::MainM4M5,
        PatternPhase::AnyOrderM2M3,
        PatternPhase::AnyOrderM4M5,
    ];

    /// Which first-picker rows feed the table; `None` takes every row.
    fn main_first(self) -> Option<bool> {
        match self {
            PatternPhase::EnemyM1M2 | PatternPhase::EnemyM3M4 | PatternPhase::EnemyM5 => Some(false),
            PatternPhase::MainM2M3 | PatternPhase::MainM4M5 => Some(true),
            PatternPhase::AnyOrderM2M3 | PatternPhase::AnyOrderM4M5 => None,
        }
    }

    /// Zero-based enemy slots forming the key.
    pub fn key_slots(self) -> &'static [usize] {
        match self {
            PatternPhase::EnemyM1M2 => &[0],
            PatternPhase::EnemyM3M4 => &[1, 2],
            PatternPhase::EnemyM5 => &[3, 4],
            PatternPhase::MainM2M3 | PatternPhase::AnyOrderM2M3 => &[0, 1],
            PatternPhase::MainM4M5 | PatternPhase::AnyOrderM4M5 => &[2, 3],
        }
    }

    /// Zero-based main slots forming the response.
    fn response_slots(self) -> &'static [usize] {
        match self {
            PatternPhase::EnemyM1M2 => &[0, 1],
            PatternPhase::EnemyM3M4 => &[2, 3],
            PatternPhase::EnemyM5 => &[4],
            PatternPhase::MainM2M3 | PatternPhase::AnyOrderM2M3 => &[1, 2],
            PatternPhase::MainM4M5 | PatternPhase::AnyOrderM4M5 => &[3, 4],
        }
    }

    fn key_of(self, record: &MatchRecord) -> Option<PatternKey> {
        let heroes: Option<Vec<HeroId>> = self
            .key_slots()
            .iter()
            .map(|&slot| record.enemy[slot].clone())
            .collect();
        match heroes?.as_slice() {
            [single] => Some(PatternKey::single(single.clone())),
            [first, second] => Some(PatternKey::pair(first.clone(), second.clone())),
            _ => None,
        }
    }

    fn response_of(self, record: &MatchRecord) -> Option<Vec<HeroId>> {
        self.response_slots()
            .iter()
            .map(|&slot| record.main[slot].clone())
            .collect()
    }
}

/// One historical next-pick combination and how often it was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub heroes: Vec<HeroId>,
    pub count: u32,
}

/// Next-pick combinations per lookup key, with their full observation counts.
///
/// Each key keeps every combination it has seen, ranked by count. Exact
/// lookups only expose the top [`PATTERN_TOP_K`]; relaxed lookups merge the
/// complete lists so the ranking reflects raw row counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FlatPatternTable", into = "FlatPatternTable")]
pub struct PatternTable {
    entries: BTreeMap<PatternKey, Vec<PatternEntry>>,
}

impl PatternTable {
    /// Top entries recorded for exactly this key, most frequent first.
    pub fn lookup(&self, key: &PatternKey) -> &[PatternEntry] {
        let entries = self.entries.get(key).map(Vec::as_slice).unwrap_or(&[]);
        &entries[..entries.len().min(PATTERN_TOP_K)]
    }

    /// Combinations seen under every key sharing at least one positional hero
    /// with `key`, merged and re-ranked by summed count, top entries only.
    /// Each row belongs to exactly one key, so the sums are row counts.
    pub fn lookup_relaxed(&self, key: &PatternKey) -> Vec<PatternEntry> {
        let mut merged = ComboCounts::default();
        for (candidate, entries) in &self.entries {
            if candidate.overlaps(key) {
                for entry in entries {
                    merged.add(&entry.heroes, entry.count);
                }
            }
        }
        merged.ranked(PATTERN_TOP_K)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted shape: multi-hero keys joined into one string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct FlatPatternTable(BTreeMap<String, Vec<PatternEntry>>);

impl From<FlatPatternTable> for PatternTable {
    fn from(flat: FlatPatternTable) -> Self {
        let entries = flat
            .0
            .into_iter()
            .filter_map(|(key, entries)| match PatternKey::from_flat(&key) {
                Some(key) => Some((key, entries)),
                None => {
                    log::warn!("Dropping pattern entry with malformed key {:?}", key);
                    None
                }
            })
            .collect();
        PatternTable { entries }
    }
}

impl From<PatternTable> for FlatPatternTable {
    fn from(table: PatternTable) -> Self {
        FlatPatternTable(
            table
                .entries
                .into_iter()
                .map(|(key, entries)| (key.to_flat(), entries))
                .collect(),
        )
    }
}

/// Frequency counter that remembers first-seen order for tie-breaks.
#[derive(Default)]
struct ComboCounts {
    order: Vec<PatternEntry>,
    index: HashMap<Vec<HeroId>, usize>,
}

impl ComboCounts {
    fn add(&mut self, heroes: &[HeroId], count: u32) {
        match self.index.get(heroes) {
            Some(&pos) => self.order[pos].count += count,
            None => {
                self.index.insert(heroes.to_vec(), self.order.len());
                self.order.push(PatternEntry {
                    heroes: heroes.to_vec(),
                    count,
                });
            }
        }
    }

    fn ranked(mut self, limit: usize) -> Vec<PatternEntry> {
        // stable: equal counts keep first-seen order
        self.order.sort_by(|a, b| b.count.cmp(&a.count));
        self.order.truncate(limit);
        self.order
    }
}

/// All pattern tables plus the first-pick popularity ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPatterns {
    pub first_picks: Vec<HeroId>,
    pub tables: BTreeMap<PatternPhase, PatternTable>,
}

impl DraftPatterns {
    pub fn table(&self, phase: PatternPhase) -> Option<&PatternTable> {
        self.tables.get(&phase)
    }

    pub fn is_empty(&self) -> bool {
        self.first_picks.is_empty() && self.tables.values().all(PatternTable::is_empty)
    }

    pub fn total_keys(&self) -> usize {
        self.tables.values().map(PatternTable::len).sum()
    }
}

pub fn compute_first_picks(matches: &[MatchRecord]) -> Vec<HeroId> {
    let mut counts = ComboCounts::default();
    for record in matches {
        if let Some(hero) = record.first_pick() {
            counts.add(std::slice::from_ref(hero), 1);
        }
    }
    counts
        .ranked(FIRST_PICK_POOL)
        .into_iter()
        .filter_map(|entry| entry.heroes.into_iter().next())
        .collect()
}

pub fn compute_pattern_table(matches: &[MatchRecord], phase: PatternPhase) -> PatternTable {
    let mut grouped: BTreeMap<PatternKey, ComboCounts> = BTreeMap::new();

    let wanted = phase.main_first();
    for record in matches.iter().filter(|r| wanted.map_or(true, |first| r.main_first == first)) {
        let (Some(key), Some(response)) = (phase.key_of(record), phase.response_of(record)) else {
            continue;
        };
        grouped.entry(key).or_default().add(&response, 1);
    }

    let entries = grouped
        .into_iter()
        .map(|(key, counts)| (key, counts.ranked(usize::MAX)))
        .collect();
    PatternTable { entries }
}

pub fn compute_draft_patterns(matches: &[MatchRecord]) -> DraftPatterns {
    let tables: BTreeMap<PatternPhase, PatternTable> = PatternPhase::ALL
        .iter()
        .map(|&phase| (phase, compute_pattern_table(matches, phase)))
        .collect();

    let patterns = DraftPatterns {
        first_picks: compute_first_picks(matches),
        tables,
    };
    log::info!("Computed {} total pattern lookups", patterns.total_keys());
    patterns
}
