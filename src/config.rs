use crate::error::AppError;
use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "e7_data";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub hero_codes_path: PathBuf,
}

impl Config {
    /// Read the environment (and `.env`), with `data_dir` taking the place of
    /// `DRAFT_DATA_DIR` when given. `DRAFT_DATASET` and `DRAFT_HERO_CODES`
    /// still apply on top of either directory.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Config::resolve(data_dir, |key| env::var(key).ok())
    }

    fn resolve(
        data_dir: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => {
                let dir = lookup("DRAFT_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
                if dir.trim().is_empty() {
                    return Err(AppError::ConfigError(
                        "DRAFT_DATA_DIR is set but empty".to_string(),
                    ));
                }
                PathBuf::from(dir)
            }
        };

        let mut config = Config::with_data_dir(data_dir);
        if let Some(dataset) = lookup("DRAFT_DATASET") {
            config.dataset_path = PathBuf::from(dataset);
        }
        if let Some(codes) = lookup("DRAFT_HERO_CODES") {
            config.hero_codes_path = PathBuf::from(codes);
        }

        Ok(config)
    }

    /// Point every derived path at `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Config {
            dataset_path: data_dir.join("drafts_dataset.csv"),
            hero_codes_path: data_dir.join("herocodes.json"),
            data_dir,
        }
    }
}
