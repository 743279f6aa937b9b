use serde::{Deserialize, Serialize};
use std::fmt;

/// The structured form of a search keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedKeyword {
    /// The title with any recognized season/episode suffix removed.
    /// Never empty: falls back to the trimmed input keyword.
    pub title: String,
    /// Season number, when the keyword carried one
    pub season: Option<u32>,
    /// Episode number, only produced by the SxxEyy form
    pub episode: Option<u32>,
}

impl ParsedKeyword {
    /// A parse that extracted nothing beyond the title
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            season: None,
            episode: None,
        }
    }
}

impl fmt::Display for ParsedKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(s) = self.season {
            write!(f, " S{:02}", s)?;
        }
        if let Some(e) = self.episode {
            write!(f, "E{:02}", e)?;
        }
        Ok(())
    }
}
