//! # Keyword Parser
//!
//! Parses the free-form search keywords a danmaku library receives from
//! players and users into a structured `(title, season, episode)` triple.
//!
//! ## Quick Start
//!
//! ```rust
//! use keyword_parser::parse;
//!
//! let result = parse("Fate/Zero S02E05");
//!
//! assert_eq!(result.title, "Fate/Zero");
//! assert_eq!(result.season, Some(2));
//! assert_eq!(result.episode, Some(5));
//! ```
//!
//! ## Pattern priority
//!
//! Matchers run in a fixed order; the first one that applies wins:
//!
//! 1. **SxxEyy**: `"Title S02E05"`
//! 2. **Season suffix**: `"Title S2"`, `"Title Season 2"`
//! 3. **CJK season**: `"Title 第二季"`, `"Title 第3部"`
//! 4. **Unicode Roman numeral**: `"Title Ⅲ"`
//! 5. **ASCII Roman numeral**: `"Title III"`
//! 6. **Trailing digits**: `"Title 2"` — skipped when the title already ends
//!    with a four-digit year (`"Blade Runner 2049"` stays intact)
//! 7. Fallthrough: the whole keyword is the title
//!
//! A second entry point, [`season_from_title`], extracts a season number
//! from anywhere inside a candidate title (`"某科学的超电磁炮 第二季"`),
//! defaulting to 1. It additionally understands formal Chinese numerals
//! (壹贰叁…), the `N之章` form, and `幕` as a season marker.

pub mod numerals;
pub mod parser;
pub mod patterns;
pub mod season;
pub mod types;

pub use parser::parse;
pub use season::season_from_title;
pub use types::ParsedKeyword;
