mod analysis;
mod api;
mod artifacts;
mod config;
mod dataset;
mod display;
mod error;
mod hero;
mod predict;

use analysis::patterns::compute_draft_patterns;
use analysis::stats::{
    compute_matchup_matrix, compute_pickrates, compute_synergy_matrix, compute_winrates, DraftStatistics,
};
use anyhow::{Context, Result};
use api::codes::HeroCodeTable;
use api::models::{PredictRequest, PredictResponse, RecommendRequest, RecommendResponse};
use artifacts::{ArtifactStore, DraftContext, MODEL, PATTERNS};
use clap::{Args, Parser, Subcommand};
use config::Config;
use display::output::{
    display_error, display_info, display_model_summary, display_prediction, display_recommendations,
    display_stats_summary, display_success,
};
use indicatif::ProgressBar;
use predict::ModelBundle;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "Draft Advisor")]
#[command(about = "Hero draft recommendations and win prediction from past matches", long_about = None)]
struct Cli {
    /// Directory holding the dataset and generated tables (overrides DRAFT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate the match dataset into winrate, matchup, synergy and pattern tables
    Build {
        /// Also fit and save the win model
        #[arg(long)]
        train: bool,
    },

    /// Fit the win model on the dataset and save it
    Train,

    /// Recommend the next pick(s) for a draft in progress
    Recommend(DraftArgs),

    /// Predict the winner of a draft
    Predict(PredictArgs),

    /// Summarise the generated tables
    Stats {
        /// Number of heroes to list (default: 15)
        #[arg(short, long, default_value = "15")]
        top_n: usize,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    /// JSON request file (enPick1..5, myPick1..5, myPre1/2, enPre1/2, exclude)
    #[arg(long)]
    request: Option<PathBuf>,

    /// Your picks in draft order, comma separated (leave a position blank to skip it)
    #[arg(long, value_delimiter = ',')]
    main: Vec<String>,

    /// Enemy picks in draft order, comma separated
    #[arg(long, value_delimiter = ',')]
    enemy: Vec<String>,

    /// Your pre-bans
    #[arg(long, value_delimiter = ',')]
    main_bans: Vec<String>,

    /// Enemy pre-bans
    #[arg(long, value_delimiter = ',')]
    enemy_bans: Vec<String>,

    /// Heroes that must never be recommended
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    draft: DraftArgs,

    /// Your post-ban
    #[arg(long)]
    main_post: Option<String>,

    /// Enemy post-ban
    #[arg(long)]
    enemy_post: Option<String>,

    /// Your side picked first
    #[arg(long)]
    main_first: bool,
}

impl DraftArgs {
    fn recommend_request(&self) -> Result<RecommendRequest> {
        match &self.request {
            Some(path) => read_request(path),
            None => Ok(RecommendRequest::from_lists(
                &self.main,
                &self.enemy,
                &self.main_bans,
                &self.enemy_bans,
                &self.exclude,
            )),
        }
    }
}

impl PredictArgs {
    fn predict_request(&self) -> Result<PredictRequest> {
        if let Some(path) = &self.draft.request {
            return read_request(path);
        }
        Ok(PredictRequest {
            draft: self.draft.recommend_request()?,
            my_post: self.main_post.clone(),
            en_post: self.enemy_post.clone(),
            is_first: Some(api::models::FirstPickFlag::Bool(self.main_first)),
        })
    }
}

fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading request {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing request {}", path.display()))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;

    match cli.command {
        Command::Build { train } => build(&config, train),
        Command::Train => train(&config),
        Command::Recommend(args) => recommend(&config, &args),
        Command::Predict(args) => predict(&config, &args),
        Command::Stats { top_n } => {
            let context = DraftContext::load(&config);
            display_stats_summary(&context.stats, &context.patterns, top_n);
            if let Some(bundle) = &context.model {
                display_model_summary(bundle);
            }
            Ok(())
        }
    }
}

fn build(config: &Config, with_model: bool) -> Result<()> {
    display_info(&format!("Reading matches from {}", config.dataset_path.display()));
    let matches = dataset::load_dataset(&config.dataset_path).context("loading dataset")?;
    display_success(&format!("Loaded {} matches", matches.len()));

    let pb = ProgressBar::new(6);
    pb.set_message("Computing winrates");
    let winrates = compute_winrates(&matches);
    pb.inc(1);
    pb.set_message("Computing pickrates");
    let pickrates = compute_pickrates(&matches);
    pb.inc(1);
    pb.set_message("Computing matchups");
    let matchups = compute_matchup_matrix(&matches);
    pb.inc(1);
    pb.set_message("Computing synergies");
    let synergies = compute_synergy_matrix(&matches);
    pb.inc(1);
    pb.set_message("Mining draft patterns");
    let patterns = compute_draft_patterns(&matches);
    pb.inc(1);

    pb.set_message("Saving tables");
    let stats = DraftStatistics {
        winrates,
        pickrates,
        matchups,
        synergies,
    };
    let store = ArtifactStore::new(&config.data_dir);
    store.save_statistics(&stats).context("saving statistics")?;
    store.save(PATTERNS, &patterns).context("saving draft patterns")?;
    pb.inc(1);
    pb.finish_with_message("✓ Tables built");

    display_success(&format!(
        "{} heroes, {} pattern keys written to {}",
        stats.winrates.len(),
        patterns.total_keys(),
        store.dir().display()
    ));

    if with_model {
        fit_and_save(&store, &matches)?;
    }
    Ok(())
}

fn train(config: &Config) -> Result<()> {
    display_info(&format!("Reading matches from {}", config.dataset_path.display()));
    let matches = dataset::load_dataset(&config.dataset_path).context("loading dataset")?;
    fit_and_save(&ArtifactStore::new(&config.data_dir), &matches)
}

fn fit_and_save(store: &ArtifactStore, matches: &[dataset::MatchRecord]) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Training win model on {} matches", matches.len()));
    let bundle = ModelBundle::train(matches).context("training win model")?;
    store.save(MODEL, &bundle).context("saving win model")?;
    pb.finish_with_message("✓ Model trained");

    display_model_summary(&bundle);
    Ok(())
}

fn recommend(config: &Config, args: &DraftArgs) -> Result<()> {
    let request = args.recommend_request()?;
    let codes = HeroCodeTable::load(&config.hero_codes_path).context("loading hero codes")?;
    let context = DraftContext::load(config);

    let state = request.draft_state(&codes);
    let (descriptor, picks) = context.recommender().recommend(&state);

    if args.json {
        let response = RecommendResponse::new(&descriptor, &picks, &codes);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display_recommendations(&descriptor, &picks);
    }
    Ok(())
}

fn predict(config: &Config, args: &PredictArgs) -> Result<()> {
    let request = args.predict_request()?;
    let codes = HeroCodeTable::load(&config.hero_codes_path).context("loading hero codes")?;
    let context = DraftContext::load(config);

    let prediction = context.predictor().predict(&request.features(&codes));

    if args.draft.json {
        println!("{}", serde_json::to_string_pretty(&PredictResponse::from(prediction))?);
    } else {
        display_prediction(&prediction);
    }
    Ok(())
}
