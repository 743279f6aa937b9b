//! Application layer - orchestration of scrapers, metadata sources,
//! repositories, and the task engine

pub mod jobs;
pub mod services;
pub mod use_cases;

pub use use_cases::{
    ImportRequest, ImportUseCase, MatchUseCase, RefreshUseCase, SearchProviderUseCase,
};
