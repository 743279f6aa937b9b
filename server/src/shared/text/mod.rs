//! Text processing utilities shared by scrapers and the search pipeline

pub mod normalizer;

pub use normalizer::TitleNormalizer;
