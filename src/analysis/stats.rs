use crate::dataset::MatchRecord;
use crate::hero::HeroId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum joint games before an empirical pair winrate is trusted.
pub const MIN_SAMPLES: u32 = 5;
pub const DEFAULT_WINRATE: f64 = 0.5;

pub type HeroRates = BTreeMap<HeroId, f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WinCounter {
    pub games: u32,
    pub wins: u32,
}

impl WinCounter {
    pub fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    /// Win rate, or the neutral default below the sample threshold.
    pub fn trusted_rate(&self) -> f64 {
        if self.games < MIN_SAMPLES {
            DEFAULT_WINRATE
        } else {
            self.win_rate()
        }
    }
}

/// Nested `hero -> other hero -> winrate` table.
///
/// A present entry means the pair was observed at least once; `rate`
/// answers for every pair and falls back to [`DEFAULT_WINRATE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairMatrix(BTreeMap<HeroId, BTreeMap<HeroId, f64>>);

pub type MatchupMatrix = PairMatrix;
pub type SynergyMatrix = PairMatrix;

impl PairMatrix {
    pub fn get(&self, hero: &HeroId, other: &HeroId) -> Option<f64> {
        self.0.get(hero).and_then(|row| row.get(other)).copied()
    }

    pub fn rate(&self, hero: &HeroId, other: &HeroId) -> f64 {
        self.get(hero, other).unwrap_or(DEFAULT_WINRATE)
    }

    /// Row heroes in sorted order.
    pub fn heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, hero: HeroId, other: HeroId, rate: f64) {
        self.0.entry(hero).or_default().insert(other, rate);
    }
}

/// Every table the recommender and the stats view read, computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct DraftStatistics {
    pub winrates: HeroRates,
    pub pickrates: HeroRates,
    pub matchups: MatchupMatrix,
    pub synergies: SynergyMatrix,
}

impl DraftStatistics {
    pub fn compute(matches: &[MatchRecord]) -> Self {
        DraftStatistics {
            winrates: compute_winrates(matches),
            pickrates: compute_pickrates(matches),
            matchups: compute_matchup_matrix(matches),
            synergies: compute_synergy_matrix(matches),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.winrates.is_empty()
            && self.pickrates.is_empty()
            && self.matchups.is_empty()
            && self.synergies.is_empty()
    }
}

/// Overall win fraction of each hero across main and enemy appearances.
pub fn compute_winrates(matches: &[MatchRecord]) -> HeroRates {
    let mut counters: BTreeMap<HeroId, WinCounter> = BTreeMap::new();

    for record in matches {
        for hero in record.main_heroes() {
            counters.entry(hero.clone()).or_default().record(record.main_won);
        }
        for hero in record.enemy_heroes() {
            counters.entry(hero.clone()).or_default().record(!record.main_won);
        }
    }

    log::info!("Computed winrates for {} heroes", counters.len());
    counters
        .into_iter()
        .map(|(hero, counter)| (hero, counter.win_rate()))
        .collect()
}

/// Fraction of matches in which each hero was picked by either side.
pub fn compute_pickrates(matches: &[MatchRecord]) -> HeroRates {
    if matches.is_empty() {
        return HeroRates::new();
    }

    let mut appearances: BTreeMap<HeroId, u32> = BTreeMap::new();
    for record in matches {
        let picked: BTreeSet<&HeroId> = record.main_heroes().chain(record.enemy_heroes()).collect();
        for hero in picked {
            *appearances.entry(hero.clone()).or_default() += 1;
        }
    }

    let total = matches.len() as f64;
    log::info!("Computed pickrates for {} heroes", appearances.len());
    appearances
        .into_iter()
        .map(|(hero, count)| (hero, count as f64 / total))
        .collect()
}

/// Winrate of each main-side hero against each enemy-side hero.
pub fn compute_matchup_matrix(matches: &[MatchRecord]) -> MatchupMatrix {
    let mut counters: BTreeMap<(HeroId, HeroId), WinCounter> = BTreeMap::new();

    for record in matches {
        let mine: BTreeSet<&HeroId> = record.main_heroes().collect();
        let theirs: BTreeSet<&HeroId> = record.enemy_heroes().collect();
        for my_hero in &mine {
            for enemy_hero in &theirs {
                counters
                    .entry(((*my_hero).clone(), (*enemy_hero).clone()))
                    .or_default()
                    .record(record.main_won);
            }
        }
    }

    let mut matrix = PairMatrix::default();
    for ((my_hero, enemy_hero), counter) in counters {
        matrix.insert(my_hero, enemy_hero, counter.trusted_rate());
    }

    log::info!("Computed matchup data for {} heroes", matrix.len());
    matrix
}

/// Winrate of each unordered pair of heroes drafted together on the main side.
pub fn compute_synergy_matrix(matches: &[MatchRecord]) -> SynergyMatrix {
    let mut counters: BTreeMap<(HeroId, HeroId), WinCounter> = BTreeMap::new();

    for record in matches {
        let team: Vec<&HeroId> = record.main_heroes().collect::<BTreeSet<_>>().into_iter().collect();
        for (i, first) in team.iter().enumerate() {
            for second in &team[i + 1..] {
                counters
                    .entry(((*first).clone(), (*second).clone()))
                    .or_default()
                    .record(record.main_won);
            }
        }
    }

    let mut matrix = PairMatrix::default();
    for ((first, second), counter) in counters {
        let rate = counter.trusted_rate();
        matrix.insert(first.clone(), second.clone(), rate);
        matrix.insert(second, first, rate);
    }

    log::info!("Computed synergies for {} heroes", matrix.len());
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::record;

    fn h(name: &str) -> HeroId {
        HeroId::new(name)
    }

    #[test]
    fn test_win_counter_threshold() {
        let mut counter = WinCounter::default();
        for _ in 0..4 {
            counter.record(true);
        }
        assert_eq!(counter.win_rate(), 1.0);
        assert_eq!(counter.trusted_rate(), DEFAULT_WINRATE);

        counter.record(false);
        assert_eq!(counter.trusted_rate(), 0.8);
    }

    #[test]
    fn test_winrate_main_first_slice() {
        // A opens as main1 in 7 matches and wins 5 of them
        let mut matches = Vec::new();
        for i in 0..7 {
            matches.push(record(["A", "B", "", "", ""], ["C", "D", "", "", ""], true, i < 5));
        }
        for _ in 0..3 {
            matches.push(record(["B", "", "", "", ""], ["C", "", "", "", ""], false, true));
        }

        let winrates = compute_winrates(&matches);
        assert_eq!(winrates[&h("A")], 5.0 / 7.0);

        // one enemy-side appearance where the enemy side wins
        matches.push(record(["B", "", "", "", ""], ["A", "", "", "", ""], false, false));
        let winrates = compute_winrates(&matches);
        assert_eq!(winrates[&h("A")], 6.0 / 8.0);
    }

    #[test]
    fn test_pickrates_count_matches_not_slots() {
        let matches = vec![
            record(["A", "B", "", "", ""], ["C", "", "", "", ""], true, true),
            record(["B", "", "", "", ""], ["A", "", "", "", ""], true, true),
            record(["D", "", "", "", ""], ["C", "", "", "", ""], true, true),
            record(["D", "", "", "", ""], ["E", "", "", "", ""], true, true),
        ];
        let pickrates = compute_pickrates(&matches);
        assert_eq!(pickrates[&h("A")], 0.5);
        assert_eq!(pickrates[&h("E")], 0.25);
        assert!(compute_pickrates(&[]).is_empty());
    }

    #[test]
    fn test_matchup_below_threshold_is_default() {
        let mut matches = Vec::new();
        for _ in 0..4 {
            matches.push(record(["A", "", "", "", ""], ["B", "", "", "", ""], false, true));
        }
        for i in 0..6 {
            matches.push(record(["C", "", "", "", ""], ["B", "", "", "", ""], false, i < 3));
        }

        let matrix = compute_matchup_matrix(&matches);
        assert_eq!(matrix.get(&h("A"), &h("B")), Some(0.5));
        assert_eq!(matrix.get(&h("C"), &h("B")), Some(0.5));
        assert_eq!(matrix.get(&h("B"), &h("A")), None);
        assert_eq!(matrix.rate(&h("B"), &h("A")), DEFAULT_WINRATE);
    }

    #[test]
    fn test_matchup_is_directional() {
        let mut matches = Vec::new();
        for _ in 0..5 {
            matches.push(record(["A", "", "", "", ""], ["B", "", "", "", ""], false, true));
            matches.push(record(["B", "", "", "", ""], ["A", "", "", "", ""], false, true));
        }
        matches.push(record(["B", "", "", "", ""], ["A", "", "", "", ""], false, false));

        let matrix = compute_matchup_matrix(&matches);
        assert_eq!(matrix.rate(&h("A"), &h("B")), 1.0);
        assert_eq!(matrix.rate(&h("B"), &h("A")), 5.0 / 6.0);
    }

    #[test]
    fn test_synergy_is_symmetric() {
        let mut matches = Vec::new();
        for i in 0..8 {
            matches.push(record(["A", "B", "C", "", ""], ["X", "", "", "", ""], false, i % 4 != 0));
        }
        matches.push(record(["C", "D", "", "", ""], ["X", "", "", "", ""], false, true));

        let matrix = compute_synergy_matrix(&matches);
        let heroes: Vec<HeroId> = matrix.heroes().cloned().collect();
        for a in &heroes {
            for b in &heroes {
                assert_eq!(matrix.rate(a, b), matrix.rate(b, a));
            }
        }
        assert_eq!(matrix.rate(&h("A"), &h("B")), 0.75);
        assert_eq!(matrix.get(&h("C"), &h("D")), Some(DEFAULT_WINRATE));
        assert_eq!(matrix.get(&h("A"), &h("A")), None);
    }
}
