use super::codes::HeroCodeTable;
use crate::analysis::draft_state::{DraftState, PhaseDescriptor};
use crate::analysis::recommender::Recommendation;
use crate::hero::HeroId;
use crate::predict::encoder::DraftFeatures;
use crate::predict::Prediction;
use serde::{Deserialize, Serialize};

// Recommendation request: current picks and pre-bans of both sides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendRequest {
    pub en_pick1: Option<String>,
    pub en_pick2: Option<String>,
    pub en_pick3: Option<String>,
    pub en_pick4: Option<String>,
    pub en_pick5: Option<String>,
    pub my_pick1: Option<String>,
    pub my_pick2: Option<String>,
    pub my_pick3: Option<String>,
    pub my_pick4: Option<String>,
    pub my_pick5: Option<String>,
    pub my_pre1: Option<String>,
    pub my_pre2: Option<String>,
    pub en_pre1: Option<String>,
    pub en_pre2: Option<String>,
    pub exclude: Vec<String>,
}

fn resolve_all<const N: usize>(values: [&Option<String>; N], codes: &HeroCodeTable) -> [Option<HeroId>; N] {
    values.map(|value| codes.resolve(value.as_ref()))
}

/// Slot `i` takes `values[i]`; missing trailing values leave the slot empty.
fn positional<const N: usize>(values: &[String]) -> [Option<String>; N] {
    std::array::from_fn(|i| values.get(i).filter(|v| !v.trim().is_empty()).cloned())
}

impl RecommendRequest {
    /// Build a request from positional lists, as typed on the command line.
    pub fn from_lists(
        main: &[String],
        enemy: &[String],
        main_bans: &[String],
        enemy_bans: &[String],
        exclude: &[String],
    ) -> Self {
        let [my_pick1, my_pick2, my_pick3, my_pick4, my_pick5] = positional::<5>(main);
        let [en_pick1, en_pick2, en_pick3, en_pick4, en_pick5] = positional::<5>(enemy);
        let [my_pre1, my_pre2] = positional::<2>(main_bans);
        let [en_pre1, en_pre2] = positional::<2>(enemy_bans);

        RecommendRequest {
            en_pick1,
            en_pick2,
            en_pick3,
            en_pick4,
            en_pick5,
            my_pick1,
            my_pick2,
            my_pick3,
            my_pick4,
            my_pick5,
            my_pre1,
            my_pre2,
            en_pre1,
            en_pre2,
            exclude: exclude.to_vec(),
        }
    }

    pub fn draft_state(&self, codes: &HeroCodeTable) -> DraftState {
        DraftState {
            main: resolve_all(
                [&self.my_pick1, &self.my_pick2, &self.my_pick3, &self.my_pick4, &self.my_pick5],
                codes,
            ),
            enemy: resolve_all(
                [&self.en_pick1, &self.en_pick2, &self.en_pick3, &self.en_pick4, &self.en_pick5],
                codes,
            ),
            main_pre_bans: resolve_all([&self.my_pre1, &self.my_pre2], codes),
            enemy_pre_bans: resolve_all([&self.en_pre1, &self.en_pre2], codes),
            main_post_ban: None,
            enemy_post_ban: None,
            excluded: self.exclude.iter().filter_map(|v| codes.hero(v)).collect(),
        }
    }
}

/// `isFirst` arrives as a boolean, a number or a string depending on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FirstPickFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FirstPickFlag {
    pub fn is_set(&self) -> bool {
        match self {
            FirstPickFlag::Bool(flag) => *flag,
            FirstPickFlag::Number(n) => *n != 0,
            FirstPickFlag::Text(text) => matches!(text.trim(), "1" | "true" | "True"),
        }
    }
}

// Prediction request: a recommendation request plus post-bans and the first-pick flag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    #[serde(flatten)]
    pub draft: RecommendRequest,
    #[serde(default)]
    pub my_post: Option<String>,
    #[serde(default)]
    pub en_post: Option<String>,
    #[serde(default)]
    pub is_first: Option<FirstPickFlag>,
}

impl PredictRequest {
    pub fn draft_state(&self, codes: &HeroCodeTable) -> DraftState {
        DraftState {
            main_post_ban: codes.resolve(self.my_post.as_ref()),
            enemy_post_ban: codes.resolve(self.en_post.as_ref()),
            ..self.draft.draft_state(codes)
        }
    }

    pub fn main_first(&self) -> bool {
        self.is_first.as_ref().is_some_and(FirstPickFlag::is_set)
    }

    pub fn features(&self, codes: &HeroCodeTable) -> DraftFeatures {
        let state = self.draft_state(codes);
        DraftFeatures::new(state.draft_slots(), self.main_first())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedHero {
    pub hero: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub phase: String,
    pub recommendations: Vec<RecommendedHero>,
}

impl RecommendResponse {
    pub fn new(descriptor: &PhaseDescriptor, picks: &[Recommendation], codes: &HeroCodeTable) -> Self {
        RecommendResponse {
            phase: descriptor.phase.to_string(),
            recommendations: picks
                .iter()
                .map(|pick| RecommendedHero {
                    hero: codes.code_of(&pick.hero),
                    source: pick.source.to_string(),
                    score: pick.score,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub outcome: String,
    pub source: String,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        PredictResponse {
            prediction: prediction.outcome.label(),
            outcome: prediction.outcome.to_string(),
            source: prediction.source.to_string(),
        }
    }
}
