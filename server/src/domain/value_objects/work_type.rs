//! WorkType value object
//!
//! Represents the type of a library entry (TV series, movie, OVA, other)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Work type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    /// Episodic TV series
    TvSeries,
    /// Full-length movie
    Movie,
    /// Original video animation
    Ova,
    /// Anything else
    Other,
}

impl WorkType {
    /// Returns the string representation stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::TvSeries => "tv_series",
            WorkType::Movie => "movie",
            WorkType::Ova => "ova",
            WorkType::Other => "other",
        }
    }

    /// Checks if this is a movie
    pub fn is_movie(&self) -> bool {
        matches!(self, WorkType::Movie)
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkType {
    type Err = crate::shared::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv_series" => Ok(WorkType::TvSeries),
            "movie" => Ok(WorkType::Movie),
            "ova" => Ok(WorkType::Ova),
            "other" => Ok(WorkType::Other),
            other => Err(crate::shared::error::DomainError::ParseError(format!(
                "unknown work type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for t in [WorkType::TvSeries, WorkType::Movie, WorkType::Ova, WorkType::Other] {
            assert_eq!(t.as_str().parse::<WorkType>().unwrap(), t);
        }
    }

    #[test]
    fn rejects_unknown() {
        assert!("podcast".parse::<WorkType>().is_err());
    }
}
