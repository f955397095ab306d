use crate::analysis::patterns::DraftPatterns;
use crate::analysis::recommender::DraftRecommender;
use crate::analysis::stats::{DraftStatistics, HeroRates, PairMatrix};
use crate::config::Config;
use crate::error::AppError;
use crate::predict::{ModelBundle, WinPredictor, MODEL_FORMAT_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const WINRATES: &str = "hero_winrates";
pub const PICKRATES: &str = "hero_pickrates";
pub const MATCHUPS: &str = "hero_matchups";
pub const SYNERGIES: &str = "hero_synergies";
pub const PATTERNS: &str = "draft_patterns";
pub const MODEL: &str = "trained_model";

/// Directory of persisted tables, each kept as `<name>.json` and `<name>.bin`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn json_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn bin_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", name))
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| AppError::io(&self.dir, e))?;

        let json_path = self.json_path(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&json_path, json).map_err(|e| AppError::io(&json_path, e))?;

        let bin_path = self.bin_path(name);
        let bytes = bincode::serialize(value)?;
        fs::write(&bin_path, bytes).map_err(|e| AppError::io(&bin_path, e))?;

        log::info!("Saved {} and {}", json_path.display(), bin_path.display());
        Ok(())
    }

    /// Read the binary form, falling back to JSON when it is absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let bin_path = self.bin_path(name);
        if let Ok(bytes) = fs::read(&bin_path) {
            match bincode::deserialize(&bytes) {
                Ok(value) => return Ok(value),
                Err(e) => log::warn!("Ignoring unreadable {}: {}", bin_path.display(), e),
            }
        }

        let json_path = self.json_path(name);
        match fs::read_to_string(&json_path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(_) => Err(AppError::MissingArtifact(name.to_string())),
        }
    }

    /// Like [`load`](Self::load), but a missing or broken artifact becomes an empty table.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.load(name) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}; continuing with an empty {} table", e, name);
                T::default()
            }
        }
    }

    pub fn save_statistics(&self, stats: &DraftStatistics) -> Result<(), AppError> {
        self.save(WINRATES, &stats.winrates)?;
        self.save(PICKRATES, &stats.pickrates)?;
        self.save(MATCHUPS, &stats.matchups)?;
        self.save(SYNERGIES, &stats.synergies)
    }

    pub fn load_statistics(&self) -> DraftStatistics {
        DraftStatistics {
            winrates: self.load_or_default::<HeroRates>(WINRATES),
            pickrates: self.load_or_default::<HeroRates>(PICKRATES),
            matchups: self.load_or_default::<PairMatrix>(MATCHUPS),
            synergies: self.load_or_default::<PairMatrix>(SYNERGIES),
        }
    }

    pub fn load_model(&self) -> Option<ModelBundle> {
        match self.load::<ModelBundle>(MODEL) {
            Ok(bundle) if bundle.version == MODEL_FORMAT_VERSION => Some(bundle),
            Ok(bundle) => {
                log::warn!(
                    "Ignoring model bundle version {} (expected {})",
                    bundle.version,
                    MODEL_FORMAT_VERSION
                );
                None
            }
            Err(e) => {
                log::warn!("{}; predictions will train on demand", e);
                None
            }
        }
    }
}

/// Read-only state shared by every request, built once at startup.
#[derive(Debug)]
pub struct DraftContext {
    pub stats: DraftStatistics,
    pub patterns: DraftPatterns,
    pub model: Option<ModelBundle>,
    pub dataset_path: PathBuf,
}

impl DraftContext {
    pub fn load(config: &Config) -> Self {
        let store = ArtifactStore::new(&config.data_dir);
        let context = DraftContext {
            stats: store.load_statistics(),
            patterns: store.load_or_default(PATTERNS),
            model: store.load_model(),
            dataset_path: config.dataset_path.clone(),
        };

        if context.stats.is_empty() && context.patterns.is_empty() {
            log::warn!(
                "No statistics found in {}; run `build` first. Recommendations will be empty.",
                store.dir().display()
            );
        } else {
            log::info!(
                "Loaded matchup data for {} heroes, synergy data for {} heroes, {} pattern keys",
                context.stats.matchups.len(),
                context.stats.synergies.len(),
                context.patterns.total_keys()
            );
        }
        context
    }

    pub fn recommender(&self) -> DraftRecommender<'_> {
        DraftRecommender::new(&self.stats, &self.patterns)
    }

    pub fn predictor(&self) -> WinPredictor<'_> {
        WinPredictor::new(self.model.as_ref(), &self.dataset_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::draft_state::DraftState;
    use crate::analysis::patterns::compute_draft_patterns;
    use crate::dataset::fixtures::record;
    use crate::hero::HeroId;

    fn sample_matches() -> Vec<crate::dataset::MatchRecord> {
        (0..6)
            .map(|i| record(["A", "B", "", "", ""], ["X", "Y", "", "", ""], false, i % 3 != 0))
            .collect()
    }

    #[test]
    fn test_statistics_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let stats = DraftStatistics::compute(&sample_matches());

        store.save_statistics(&stats).unwrap();
        assert!(store.json_path(MATCHUPS).exists());
        assert!(store.bin_path(MATCHUPS).exists());

        let loaded = store.load_statistics();
        assert_eq!(loaded.winrates, stats.winrates);
        assert_eq!(loaded.matchups, stats.matchups);
        assert_eq!(loaded.synergies, stats.synergies);
    }

    #[test]
    fn test_json_used_when_binary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let patterns = compute_draft_patterns(&sample_matches());

        store.save(PATTERNS, &patterns).unwrap();
        fs::remove_file(store.bin_path(PATTERNS)).unwrap();

        let loaded: DraftPatterns = store.load(PATTERNS).unwrap();
        assert_eq!(loaded, patterns);
    }

    #[test]
    fn test_missing_artifacts_give_empty_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path().to_path_buf());
        let context = DraftContext::load(&config);

        assert!(context.stats.is_empty());
        assert!(context.patterns.is_empty());
        assert!(context.model.is_none());

        let mut draft = DraftState::default();
        draft.enemy[0] = Some(HeroId::new("X"));
        assert!(context.recommender().recommend(&draft).1.is_empty());
        assert!(context.recommender().recommend(&DraftState::default()).1.is_empty());
    }

    #[test]
    fn test_missing_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let result: Result<HeroRates, AppError> = store.load(WINRATES);
        assert!(matches!(result, Err(AppError::MissingArtifact(_))));
    }
}
