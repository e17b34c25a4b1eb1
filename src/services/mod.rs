pub mod onboarding;
pub mod picks;
pub mod providers;
pub mod recommendations;

pub use picks::{InMemoryPickStore, PickStore};
pub use providers::{ContentProvider, TmdbProvider};
pub use recommendations::{RecommendationService, Recommendations};
