pub mod draft_state;
pub mod patterns;
pub mod recommender;
pub mod stats;
