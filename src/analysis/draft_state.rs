//! Classifies a partially filled draft into the slot(s) that must be filled next.
//!
//! Phases are matched by an ordered list of predicates over which slots are
//! filled; the first predicate that holds wins.

use crate::analysis::patterns::PatternPhase;
use crate::dataset::{model_slot_order, DRAFT_SLOTS, PRE_BANS_PER_SIDE, TEAM_SIZE};
use crate::hero::{HeroId, PatternKey};
use std::collections::BTreeSet;
use std::fmt;

/// A draft in progress, as received with a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftState {
    pub main: [Option<HeroId>; TEAM_SIZE],
    pub enemy: [Option<HeroId>; TEAM_SIZE],
    pub main_pre_bans: [Option<HeroId>; PRE_BANS_PER_SIDE],
    pub enemy_pre_bans: [Option<HeroId>; PRE_BANS_PER_SIDE],
    pub main_post_ban: Option<HeroId>,
    pub enemy_post_ban: Option<HeroId>,
    /// Heroes the caller wants kept out of any recommendation.
    pub excluded: Vec<HeroId>,
}

impl DraftState {
    pub fn main_heroes(&self) -> Vec<HeroId> {
        self.main.iter().flatten().cloned().collect()
    }

    pub fn enemy_heroes(&self) -> Vec<HeroId> {
        self.enemy.iter().flatten().cloned().collect()
    }

    /// Every hero already used or banned anywhere, plus the caller's exclusions.
    pub fn cannot_pick(&self) -> BTreeSet<HeroId> {
        self.main
            .iter()
            .chain(self.enemy.iter())
            .chain(self.main_pre_bans.iter())
            .chain(self.enemy_pre_bans.iter())
            .chain(std::iter::once(&self.main_post_ban))
            .chain(std::iter::once(&self.enemy_post_ban))
            .flatten()
            .chain(self.excluded.iter())
            .cloned()
            .collect()
    }

    pub fn draft_slots(&self) -> [Option<&HeroId>; DRAFT_SLOTS] {
        model_slot_order(
            &self.main,
            &self.enemy,
            &self.main_pre_bans,
            &self.enemy_pre_bans,
            self.main_post_ban.as_ref(),
            self.enemy_post_ban.as_ref(),
        )
    }

    fn fill(&self) -> SlotFill {
        SlotFill {
            m: std::array::from_fn(|i| self.main[i].is_some()),
            e: std::array::from_fn(|i| self.enemy[i].is_some()),
        }
    }
}

/// Which pick slots hold a hero. Index 0 is the side's first pick.
#[derive(Debug, Clone, Copy)]
struct SlotFill {
    m: [bool; TEAM_SIZE],
    e: [bool; TEAM_SIZE],
}

impl SlotFill {
    fn empty(&self) -> bool {
        !self.m.iter().chain(self.e.iter()).any(|&filled| filled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftPhase {
    Initial,
    AwaitOpponentResponse,
    EnemyFirstNeedM1M2,
    EnemyFirstNeedM2Only,
    EnemyFirstNeedM3M4,
    EnemyFirstNeedM4Only,
    NeedFinalPick,
    MainFirstNeedM2M3,
    MainFirstNeedM3Only,
    MainFirstNeedM4M5,
    GenericFallback,
}

/// How the matrix-based rankings are combined once pattern lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPolicy {
    /// First-pick popularity only.
    Popularity,
    CounterOnly,
    CounterFirst,
    SynergyFirst,
}

type PhaseRule = (DraftPhase, fn(&SlotFill) -> bool);

// Order matters: the first matching rule decides the phase.
const PHASE_RULES: [PhaseRule; 10] = [
    (DraftPhase::Initial, |f| f.empty()),
    (DraftPhase::AwaitOpponentResponse, |f| f.m[0] && !f.e[0] && !f.e[1]),
    (DraftPhase::EnemyFirstNeedM1M2, |f| f.e[0] && !f.m[0] && !f.m[1]),
    (DraftPhase::EnemyFirstNeedM2Only, |f| f.e[0] && f.m[0] && !f.m[1] && !f.e[1]),
    (DraftPhase::EnemyFirstNeedM3M4, |f| {
        f.m[0] && f.m[1] && f.e[1] && f.e[2] && !f.m[2] && !f.m[3]
    }),
    (DraftPhase::EnemyFirstNeedM4Only, |f| {
        f.m[0] && f.m[1] && f.m[2] && !f.m[3] && f.e[1] && f.e[2] && !f.e[3]
    }),
    (DraftPhase::NeedFinalPick, |f| f.m[0] && f.m[1] && f.m[2] && f.m[3] && !f.m[4]),
    (DraftPhase::MainFirstNeedM2M3, |f| {
        f.m[0] && f.e[0] && f.e[1] && !f.m[1] && !f.m[2]
    }),
    (DraftPhase::MainFirstNeedM3Only, |f| {
        f.m[0] && f.m[1] && !f.m[2] && f.e[0] && f.e[1] && !f.e[2]
    }),
    (DraftPhase::MainFirstNeedM4M5, |f| {
        f.m[0] && f.m[1] && f.m[2] && !f.m[3] && !f.m[4] && f.e[2] && f.e[3]
    }),
];

impl DraftPhase {
    /// Number of heroes to propose in this phase.
    pub fn requested_count(self) -> usize {
        match self {
            DraftPhase::Initial
            | DraftPhase::EnemyFirstNeedM2Only
            | DraftPhase::EnemyFirstNeedM4Only
            | DraftPhase::MainFirstNeedM3Only => 1,
            DraftPhase::NeedFinalPick => 3,
            _ => 2,
        }
    }

    pub fn blend(self) -> BlendPolicy {
        match self {
            DraftPhase::Initial | DraftPhase::AwaitOpponentResponse => BlendPolicy::Popularity,
            DraftPhase::EnemyFirstNeedM1M2 | DraftPhase::GenericFallback => BlendPolicy::CounterOnly,
            DraftPhase::EnemyFirstNeedM2Only
            | DraftPhase::EnemyFirstNeedM4Only
            | DraftPhase::MainFirstNeedM3Only => BlendPolicy::SynergyFirst,
            DraftPhase::EnemyFirstNeedM3M4
            | DraftPhase::NeedFinalPick
            | DraftPhase::MainFirstNeedM2M3
            | DraftPhase::MainFirstNeedM4M5 => BlendPolicy::CounterFirst,
        }
    }

    /// Pattern queries to try in order before falling back to the matrices.
    ///
    /// Main-first phases retry on rows from either opener, the way the same
    /// enemy pair is usually answered regardless of who picked first.
    pub fn pattern_lookups(self) -> &'static [PatternLookup] {
        use PatternPhase::*;
        match self {
            DraftPhase::EnemyFirstNeedM1M2 | DraftPhase::EnemyFirstNeedM2Only => &const { [PatternLookup::exact(EnemyM1M2)] },
            DraftPhase::EnemyFirstNeedM3M4 | DraftPhase::EnemyFirstNeedM4Only => {
                &const { [PatternLookup::exact(EnemyM3M4), PatternLookup::relaxed(EnemyM3M4)] }
            }
            DraftPhase::NeedFinalPick => &const { [PatternLookup::exact(EnemyM5), PatternLookup::relaxed(EnemyM5)] },
            DraftPhase::MainFirstNeedM2M3 | DraftPhase::MainFirstNeedM3Only => {
                &const { [PatternLookup::exact(MainM2M3), PatternLookup::exact(AnyOrderM2M3)] }
            }
            DraftPhase::MainFirstNeedM4M5 => &const { [PatternLookup::exact(MainM4M5), PatternLookup::relaxed(AnyOrderM4M5)] },
            DraftPhase::Initial | DraftPhase::AwaitOpponentResponse | DraftPhase::GenericFallback => &[],
        }
    }
}

/// One pattern-table query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternLookup {
    pub table: PatternPhase,
    /// Match on either key hero instead of the whole key.
    pub relaxed: bool,
}

impl PatternLookup {
    const fn exact(table: PatternPhase) -> Self {
        PatternLookup { table, relaxed: false }
    }

    const fn relaxed(table: PatternPhase) -> Self {
        PatternLookup { table, relaxed: true }
    }
}

impl fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftPhase::Initial => "INITIAL",
            DraftPhase::AwaitOpponentResponse => "AWAIT_OPPONENT_RESPONSE",
            DraftPhase::EnemyFirstNeedM1M2 => "ENEMY_FIRST__NEED_M1_M2",
            DraftPhase::EnemyFirstNeedM2Only => "ENEMY_FIRST__NEED_M2_ONLY",
            DraftPhase::EnemyFirstNeedM3M4 => "ENEMY_FIRST__NEED_M3_M4",
            DraftPhase::EnemyFirstNeedM4Only => "ENEMY_FIRST__NEED_M4_ONLY",
            DraftPhase::NeedFinalPick => "NEED_M5_ONLY",
            DraftPhase::MainFirstNeedM2M3 => "MAIN_FIRST__NEED_M2_M3",
            DraftPhase::MainFirstNeedM3Only => "MAIN_FIRST__NEED_M3_ONLY",
            DraftPhase::MainFirstNeedM4M5 => "MAIN_FIRST__NEED_M4_M5",
            DraftPhase::GenericFallback => "GENERIC_FALLBACK",
        };
        f.write_str(name)
    }
}

/// Everything the recommender needs to know about the current phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDescriptor {
    pub phase: DraftPhase,
    /// Enemy picks keying the phase's pattern tables, when all are known.
    pub pattern_key: Option<PatternKey>,
    pub known_enemies: Vec<HeroId>,
    pub known_allies: Vec<HeroId>,
    pub cannot_pick: BTreeSet<HeroId>,
}

impl PhaseDescriptor {
    pub fn requested_count(&self) -> usize {
        self.phase.requested_count()
    }

    /// Pattern queries to run; none without a complete key.
    pub fn pattern_lookups(&self) -> &'static [PatternLookup] {
        if self.pattern_key.is_some() {
            self.phase.pattern_lookups()
        } else {
            &[]
        }
    }
}

pub fn classify_phase(state: &DraftState) -> DraftPhase {
    let fill = state.fill();
    PHASE_RULES
        .iter()
        .find(|(_, rule)| rule(&fill))
        .map(|(phase, _)| *phase)
        .unwrap_or(DraftPhase::GenericFallback)
}

pub fn classify(state: &DraftState) -> PhaseDescriptor {
    let phase = classify_phase(state);

    let pattern_key = phase.pattern_lookups().first().and_then(|lookup| {
        let heroes: Option<Vec<HeroId>> =
            lookup.table.key_slots().iter().map(|&slot| state.enemy[slot].clone()).collect();
        match heroes?.as_slice() {
            [single] => Some(PatternKey::single(single.clone())),
            [first, second] => Some(PatternKey::pair(first.clone(), second.clone())),
            _ => None,
        }
    });

    let descriptor = PhaseDescriptor {
        phase,
        pattern_key,
        known_enemies: state.enemy_heroes(),
        known_allies: state.main_heroes(),
        cannot_pick: state.cannot_pick(),
    };
    log::debug!(
        "Classified draft as {} (key: {:?}, {} excluded)",
        descriptor.phase,
        descriptor.pattern_key.as_ref().map(PatternKey::to_flat),
        descriptor.cannot_pick.len()
    );
    descriptor
}
