use super::draft_state::{classify, BlendPolicy, DraftState, PhaseDescriptor};
use super::patterns::{DraftPatterns, PatternEntry};
use super::stats::{DraftStatistics, PairMatrix};
use crate::hero::HeroId;
use std::collections::BTreeSet;
use std::fmt;

/// Where a recommended hero came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Pattern,
    RelaxedPattern,
    Counter,
    Synergy,
    Popularity,
}

impl fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecommendationSource::Pattern => "pattern",
            RecommendationSource::RelaxedPattern => "pattern (partial)",
            RecommendationSource::Counter => "counter",
            RecommendationSource::Synergy => "synergy",
            RecommendationSource::Popularity => "popular first pick",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub hero: HeroId,
    pub source: RecommendationSource,
    /// Mean matrix winrate, for matrix-ranked picks only.
    pub score: Option<f64>,
}

impl Recommendation {
    fn new(hero: HeroId, source: RecommendationSource, score: Option<f64>) -> Self {
        Recommendation { hero, source, score }
    }
}

/// Stateless recommender over the loaded statistics; one instance serves every request.
pub struct DraftRecommender<'a> {
    stats: &'a DraftStatistics,
    patterns: &'a DraftPatterns,
}

impl<'a> DraftRecommender<'a> {
    pub fn new(stats: &'a DraftStatistics, patterns: &'a DraftPatterns) -> Self {
        DraftRecommender { stats, patterns }
    }

    /// Classify the draft and resolve it into recommendations.
    pub fn recommend(&self, state: &DraftState) -> (PhaseDescriptor, Vec<Recommendation>) {
        let descriptor = classify(state);
        let picks = self.resolve(&descriptor);
        (descriptor, picks)
    }

    /// Up to `requested_count` distinct heroes, none of them in the cannot-pick set.
    pub fn resolve(&self, descriptor: &PhaseDescriptor) -> Vec<Recommendation> {
        let count = descriptor.requested_count();
        let policy = descriptor.phase.blend();

        if policy == BlendPolicy::Popularity {
            return self.popular_picks(&descriptor.cannot_pick, count);
        }

        if let Some(key) = &descriptor.pattern_key {
            for lookup in descriptor.pattern_lookups() {
                let Some(table) = self.patterns.table(lookup.table) else {
                    continue;
                };
                let found = if lookup.relaxed {
                    flatten_entries(
                        &table.lookup_relaxed(key),
                        &descriptor.cannot_pick,
                        count,
                        RecommendationSource::RelaxedPattern,
                    )
                } else {
                    flatten_entries(
                        table.lookup(key),
                        &descriptor.cannot_pick,
                        count,
                        RecommendationSource::Pattern,
                    )
                };
                if !found.is_empty() {
                    return found;
                }
            }
        }

        let counters = self.counter_scores(&descriptor.known_enemies, &descriptor.cannot_pick);
        let synergies = self.synergy_scores(&descriptor.known_allies, &descriptor.cannot_pick);
        log::debug!(
            "{}: matrix fallback with {} counter and {} synergy candidates",
            descriptor.phase,
            counters.len(),
            synergies.len()
        );

        let policy = if descriptor.known_allies.is_empty() {
            BlendPolicy::CounterOnly
        } else {
            policy
        };

        match policy {
            BlendPolicy::CounterOnly => blend(counters, Vec::new(), count),
            BlendPolicy::CounterFirst => blend(counters, synergies, count),
            BlendPolicy::SynergyFirst => blend(synergies, counters, count),
            BlendPolicy::Popularity => Vec::new(),
        }
    }

    /// Most popular eligible first picks.
    fn popular_picks(&self, cannot_pick: &BTreeSet<HeroId>, count: usize) -> Vec<Recommendation> {
        self.patterns
            .first_picks
            .iter()
            .filter(|hero| !cannot_pick.contains(*hero))
            .take(count)
            .map(|hero| Recommendation::new(hero.clone(), RecommendationSource::Popularity, None))
            .collect()
    }

    /// Candidates ranked by mean matchup winrate against `enemies`.
    pub fn counter_scores(&self, enemies: &[HeroId], cannot_pick: &BTreeSet<HeroId>) -> Vec<Recommendation> {
        score_candidates(&self.stats.matchups, enemies, cannot_pick, RecommendationSource::Counter)
    }

    /// Candidates ranked by mean synergy winrate with `allies`.
    pub fn synergy_scores(&self, allies: &[HeroId], cannot_pick: &BTreeSet<HeroId>) -> Vec<Recommendation> {
        score_candidates(&self.stats.synergies, allies, cannot_pick, RecommendationSource::Synergy)
    }
}

/// Flatten pattern combinations into distinct eligible heroes, most frequent first.
fn flatten_entries(
    entries: &[PatternEntry],
    cannot_pick: &BTreeSet<HeroId>,
    count: usize,
    source: RecommendationSource,
) -> Vec<Recommendation> {
    let mut seen = BTreeSet::new();
    entries
        .iter()
        .flat_map(|entry| entry.heroes.iter())
        .filter(|hero| !cannot_pick.contains(*hero) && seen.insert((*hero).clone()))
        .take(count)
        .map(|hero| Recommendation::new(hero.clone(), source, None))
        .collect()
}

/// Mean matrix rate of each eligible candidate over the `against` heroes it has data for.
/// Candidates with no overlapping data are left out.
fn score_candidates(
    matrix: &PairMatrix,
    against: &[HeroId],
    cannot_pick: &BTreeSet<HeroId>,
    source: RecommendationSource,
) -> Vec<Recommendation> {
    if against.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Recommendation> = matrix
        .heroes()
        .filter(|candidate| !cannot_pick.contains(*candidate))
        .filter_map(|candidate| {
            let rates: Vec<f64> = against
                .iter()
                .filter_map(|other| matrix.get(candidate, other))
                .collect();
            if rates.is_empty() {
                None
            } else {
                let mean = rates.iter().sum::<f64>() / rates.len() as f64;
                Some(Recommendation::new(candidate.clone(), source, Some(mean)))
            }
        })
        .collect();

    // stable sort keeps hero order on ties
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

/// Take from `primary` first, then fill from `secondary`, skipping duplicates.
fn blend(primary: Vec<Recommendation>, secondary: Vec<Recommendation>, count: usize) -> Vec<Recommendation> {
    let mut picked: Vec<Recommendation> = Vec::with_capacity(count);
    for candidate in primary.into_iter().chain(secondary) {
        if picked.len() == count {
            break;
        }
        if picked.iter().all(|p| p.hero != candidate.hero) {
            picked.push(candidate);
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::draft_state::DraftPhase;
    use crate::analysis::patterns::compute_draft_patterns;
    use crate::dataset::fixtures::record;
    use crate::dataset::MatchRecord;

    fn h(name: &str) -> HeroId {
        HeroId::new(name)
    }

    fn heroes(recommendations: &[Recommendation]) -> Vec<HeroId> {
        recommendations.iter().map(|r| r.hero.clone()).collect()
    }

    fn state(main: [&str; 5], enemy: [&str; 5]) -> DraftState {
        DraftState {
            main: main.map(HeroId::parse),
            enemy: enemy.map(HeroId::parse),
            ..DraftState::default()
        }
    }

    fn context(matches: &[MatchRecord]) -> (DraftStatistics, DraftPatterns) {
        (DraftStatistics::compute(matches), compute_draft_patterns(matches))
    }

    /// X is beaten by C, beats D; A/B is the habitual answer to an X opener.
    fn sample_matches() -> Vec<MatchRecord> {
        let mut matches = Vec::new();
        for _ in 0..3 {
            matches.push(record(["A", "B", "", "", ""], ["X", "", "", "", ""], false, false));
        }
        for _ in 0..5 {
            matches.push(record(["C", "", "", "", ""], ["X", "", "", "", ""], true, true));
            matches.push(record(["D", "", "", "", ""], ["X", "", "", "", ""], true, false));
        }
        matches
    }

    #[test]
    fn test_exact_pattern_precedes_matrix_scores() {
        let (stats, patterns) = context(&sample_matches());
        let recommender = DraftRecommender::new(&stats, &patterns);

        let (descriptor, picks) = recommender.recommend(&state(["", "", "", "", ""], ["X", "", "", "", ""]));
        assert_eq!(descriptor.phase, DraftPhase::EnemyFirstNeedM1M2);
        assert_eq!(heroes(&picks), vec![h("A"), h("B")]);
        assert!(picks.iter().all(|p| p.source == RecommendationSource::Pattern));
    }

    #[test]
    fn test_falls_back_to_counters_when_pattern_is_banned() {
        let (stats, patterns) = context(&sample_matches());
        let recommender = DraftRecommender::new(&stats, &patterns);

        let mut draft = state(["", "", "", "", ""], ["X", "", "", "", ""]);
        draft.main_pre_bans = [Some(h("A")), Some(h("B"))];
        let (_, picks) = recommender.recommend(&draft);

        assert_eq!(picks[0].hero, h("C"));
        assert_eq!(picks[0].source, RecommendationSource::Counter);
        assert_eq!(picks[0].score, Some(1.0));
        // A and B are banned, D never beat X
        assert_eq!(heroes(&picks), vec![h("C"), h("D")]);
    }

    #[test]
    fn test_never_returns_cannot_pick_heroes() {
        let (stats, patterns) = context(&sample_matches());
        let recommender = DraftRecommender::new(&stats, &patterns);

        let mut draft = state(["", "", "", "", ""], ["X", "", "", "", ""]);
        draft.excluded = vec![h("A"), h("C")];
        let (descriptor, picks) = recommender.recommend(&draft);

        assert!(!picks.is_empty());
        for pick in &picks {
            assert!(!descriptor.cannot_pick.contains(&pick.hero));
        }
    }

    #[test]
    fn test_initial_returns_most_popular_first_pick() {
        let (stats, patterns) = context(&sample_matches());
        let recommender = DraftRecommender::new(&stats, &patterns);

        let (_, picks) = recommender.recommend(&DraftState::default());
        assert_eq!(heroes(&picks), vec![h("C")]);

        let mut banned = DraftState::default();
        banned.enemy_pre_bans = [Some(h("C")), None];
        let (_, picks) = recommender.recommend(&banned);
        assert_eq!(heroes(&picks), vec![h("D")]);
    }

    #[test]
    fn test_empty_statistics_recommend_nothing() {
        let stats = DraftStatistics::default();
        let patterns = DraftPatterns::default();
        let recommender = DraftRecommender::new(&stats, &patterns);

        let drafts = [
            state(["", "", "", "", ""], ["", "", "", "", ""]),
            state(["M1", "", "", "", ""], ["", "", "", "", ""]),
            state(["", "", "", "", ""], ["E1", "", "", "", ""]),
            state(["M1", "M2", "", "", ""], ["E1", "E2", "E3", "", ""]),
            state(["M1", "M2", "M3", "M4", ""], ["E1", "E2", "E3", "E4", "E5"]),
            state(["", "", "", "", ""], ["", "E2", "", "", ""]),
        ];
        for draft in &drafts {
            assert!(recommender.recommend(draft).1.is_empty());
        }
    }

    #[test]
    fn test_relaxed_lookup_for_final_pick() {
        let mut matches = Vec::new();
        for _ in 0..2 {
            matches.push(record(["", "", "", "", "F"], ["", "", "", "P", "Q"], false, true));
        }
        let (stats, patterns) = context(&matches);
        let recommender = DraftRecommender::new(&stats, &patterns);

        let draft = state(["M1", "M2", "M3", "M4", ""], ["E1", "E2", "E3", "P", "R"]);
        let (descriptor, picks) = recommender.recommend(&draft);
        assert_eq!(descriptor.phase, DraftPhase::NeedFinalPick);
        assert_eq!(heroes(&picks), vec![h("F")]);
        assert_eq!(picks[0].source, RecommendationSource::RelaxedPattern);
    }

    #[test]
    fn test_main_first_pair_uses_enemy_first_history() {
        // (X, Y) was only ever answered with P, Q after the enemy opened
        let mut matches = Vec::new();
        for _ in 0..3 {
            matches.push(record(["M1", "P", "Q", "", ""], ["X", "Y", "", "", ""], false, true));
        }
        for _ in 0..5 {
            matches.push(record(["A", "", "", "", ""], ["X", "Y", "", "", ""], true, true));
        }
        let (stats, patterns) = context(&matches);
        let recommender = DraftRecommender::new(&stats, &patterns);

        let (descriptor, picks) = recommender.recommend(&state(["M1", "", "", "", ""], ["X", "Y", "", "", ""]));
        assert_eq!(descriptor.phase, DraftPhase::MainFirstNeedM2M3);
        assert_eq!(heroes(&picks), vec![h("P"), h("Q")]);
        assert!(picks.iter().all(|p| p.source == RecommendationSource::Pattern));
    }

    #[test]
    fn test_main_first_late_pair_relaxes_across_openers() {
        // only enemy-first rows share E3 = X with the request
        let mut matches = Vec::new();
        for _ in 0..2 {
            matches.push(record(["", "", "", "F", "G"], ["", "", "X", "Z", ""], false, true));
        }
        let (stats, patterns) = context(&matches);
        let recommender = DraftRecommender::new(&stats, &patterns);

        let draft = state(["M1", "M2", "M3", "", ""], ["E1", "E2", "X", "Y", ""]);
        let (descriptor, picks) = recommender.recommend(&draft);
        assert_eq!(descriptor.phase, DraftPhase::MainFirstNeedM4M5);
        assert_eq!(heroes(&picks), vec![h("F"), h("G")]);
        assert_eq!(picks[0].source, RecommendationSource::RelaxedPattern);
    }

    #[test]
    fn test_synergy_first_blend() {
        // S pairs well with M1, K counters E1
        let mut matches = Vec::new();
        for _ in 0..5 {
            matches.push(record(["M1", "S", "", "", ""], ["Z", "", "", "", ""], true, true));
            matches.push(record(["K", "", "", "", ""], ["E1", "", "", "", ""], true, true));
        }
        let (stats, patterns) = context(&matches);
        let recommender = DraftRecommender::new(&stats, &patterns);

        // M2 only, enemy opened with E1 and no pattern for it on the enemy-first table
        let draft = state(["M1", "", "", "", ""], ["E1", "", "", "", ""]);
        let (descriptor, picks) = recommender.recommend(&draft);
        assert_eq!(descriptor.phase, DraftPhase::EnemyFirstNeedM2Only);
        assert_eq!(heroes(&picks), vec![h("S")]);
        assert_eq!(picks[0].source, RecommendationSource::Synergy);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let (stats, patterns) = context(&sample_matches());
        let recommender = DraftRecommender::new(&stats, &patterns);
        let draft = state(["M1", "M2", "", "", ""], ["X", "Y", "W", "", ""]);

        let first = recommender.recommend(&draft).1;
        for _ in 0..5 {
            assert_eq!(recommender.recommend(&draft).1, first);
        }
    }

    #[test]
    fn test_blend_skips_duplicates() {
        let a = Recommendation::new(h("A"), RecommendationSource::Counter, Some(0.7));
        let b = Recommendation::new(h("B"), RecommendationSource::Counter, Some(0.6));
        let a_syn = Recommendation::new(h("A"), RecommendationSource::Synergy, Some(0.9));
        let c = Recommendation::new(h("C"), RecommendationSource::Synergy, Some(0.8));

        let picked = blend(vec![a_syn, c], vec![a, b], 3);
        assert_eq!(heroes(&picked), vec![h("A"), h("C"), h("B")]);
        assert_eq!(picked[0].source, RecommendationSource::Synergy);
    }
}
