use crate::analysis::draft_state::PhaseDescriptor;
use crate::analysis::patterns::DraftPatterns;
use crate::analysis::recommender::Recommendation;
use crate::analysis::stats::DraftStatistics;
use crate::predict::{ModelBundle, Outcome, Prediction, PredictionSource};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PickRow {
    rank: String,
    hero: String,
    source: String,
    score: String,
}

#[derive(Tabled)]
struct HeroRow {
    rank: String,
    hero: String,
    win_rate: String,
    pick_rate: String,
}

pub fn display_recommendations(descriptor: &PhaseDescriptor, picks: &[Recommendation]) {
    println!("\n{}", format!("🎯 Draft phase: {}", descriptor.phase).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if !descriptor.known_enemies.is_empty() {
        let enemies: Vec<String> = descriptor.known_enemies.iter().map(|h| h.to_string()).collect();
        println!("{} {}", "Enemy picks:".bold(), enemies.join(", ").red());
    }
    if !descriptor.known_allies.is_empty() {
        let allies: Vec<String> = descriptor.known_allies.iter().map(|h| h.to_string()).collect();
        println!("{} {}", "Your picks:".bold(), allies.join(", ").green());
    }
    if let Some(key) = &descriptor.pattern_key {
        println!("{} {}", "Pattern key:".bold(), key);
    }
    println!();

    if picks.is_empty() {
        println!("{}", "No recommendations available (not enough data)".yellow());
        return;
    }

    let rows: Vec<PickRow> = picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| PickRow {
            rank: format!("#{}", idx + 1),
            hero: pick.hero.to_string(),
            source: pick.source.to_string(),
            score: pick.score.map_or_else(|| "-".to_string(), |s| format!("{:.1}%", s * 100.0)),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if picks.len() < descriptor.requested_count() {
        println!(
            "{}",
            format!(
                "Only {} of {} requested picks could be filled",
                picks.len(),
                descriptor.requested_count()
            )
            .yellow()
        );
    }
    println!();
}

pub fn display_prediction(prediction: &Prediction) {
    let verdict = match prediction.outcome {
        Outcome::MainWins => prediction.outcome.to_string().green().bold(),
        Outcome::EnemyWins => prediction.outcome.to_string().red().bold(),
    };
    println!("\n{} {}", "🔮 Prediction:".bold().cyan(), verdict);
    println!("   label {} from {}", prediction.outcome.label(), prediction.source);

    if prediction.source == PredictionSource::Fallback {
        println!(
            "  {} No model or dataset available, this is a default answer",
            "⚠️".yellow()
        );
    }
    println!();
}

pub fn display_model_summary(bundle: &ModelBundle) {
    println!("\n{}", "🧠 WIN MODEL".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!("{} {}", "Trained:".bold(), bundle.trained_at.format("%Y-%m-%d %H:%M UTC"));
    println!("{} {}", "Training drafts:".bold(), bundle.train_size);
    println!("{} {:.1}%\n", "Held-out accuracy:".bold(), bundle.test_accuracy * 100.0);
}

pub fn display_stats_summary(stats: &DraftStatistics, patterns: &DraftPatterns, top_n: usize) {
    println!("\n{}", "📊 DRAFT STATISTICS".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!(
        "{} {} heroes with winrates, {} in the matchup matrix, {} in the synergy matrix",
        "📈 Coverage:".bold(),
        stats.winrates.len(),
        stats.matchups.len(),
        stats.synergies.len()
    );
    println!(
        "{} {} pattern keys, {} popular first picks\n",
        "🧩 Patterns:".bold(),
        patterns.total_keys(),
        patterns.first_picks.len()
    );

    if stats.pickrates.is_empty() {
        println!("{}", "No statistics loaded. Run `build` first.".yellow());
        return;
    }

    let mut by_pickrate: Vec<_> = stats.pickrates.iter().collect();
    by_pickrate.sort_by(|a, b| b.1.total_cmp(a.1));

    let rows: Vec<HeroRow> = by_pickrate
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (hero, pick_rate))| HeroRow {
            rank: format!("#{}", idx + 1),
            hero: hero.to_string(),
            win_rate: stats
                .winrates
                .get(hero)
                .map_or_else(|| "-".to_string(), |w| format!("{:.1}%", w * 100.0)),
            pick_rate: format!("{:.1}%", pick_rate * 100.0),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
