mod models;
mod store;
mod trait_def;
mod validation;

pub use models::*;
pub use store::{SqliteMusicStore, SEARCH_RESULTS_LIMIT};
pub use trait_def::MusicStore;
pub use validation::{MusicStoreError, MusicStoreResult, MAX_SCORE, MIN_SCORE};
