//! The keyword parser entry point.

use crate::numerals::{chinese_or_arabic, roman_to_int, unicode_roman_to_int};
use crate::patterns;
use crate::types::ParsedKeyword;

/// Parse a free-form search keyword into `(title, season, episode)`.
///
/// See the crate docs for the pattern priority order. The returned title is
/// always non-empty for non-empty input; when nothing matches, the trimmed
/// keyword itself is the title.
pub fn parse(keyword: &str) -> ParsedKeyword {
    let keyword = keyword.trim();

    if let Some(caps) = patterns::SEASON_EPISODE.captures(keyword) {
        let title = strip_redundant_season_marker(caps["title"].trim());
        let season = caps["season"].parse().ok();
        let episode = caps["episode"].parse().ok();
        if !title.is_empty() {
            return ParsedKeyword {
                title,
                season,
                episode,
            };
        }
    }

    for (pattern, extract, year_guard) in season_matchers() {
        if let Some(caps) = pattern.captures(keyword) {
            let title = caps["title"].trim().to_string();
            if title.is_empty() {
                continue;
            }
            // Keep titles like "Blade Runner 2049" intact: a bare digit
            // suffix is not a season when the title already ends in a year.
            if year_guard && ends_with_year(&title) {
                continue;
            }
            if let Some(season) = extract(&caps["season"]) {
                return ParsedKeyword {
                    title,
                    season: Some(season),
                    episode: None,
                };
            }
        }
    }

    ParsedKeyword::title_only(keyword)
}

type SeasonExtractor = fn(&str) -> Option<u32>;

fn season_matchers() -> [(&'static regex::Regex, SeasonExtractor, bool); 5] {
    [
        (&*patterns::SEASON_SUFFIX, |s| s.parse().ok(), false),
        (&*patterns::CJK_SEASON_SUFFIX, chinese_or_arabic, false),
        (
            &*patterns::UNICODE_ROMAN_SUFFIX,
            |s| s.chars().next().and_then(unicode_roman_to_int),
            false,
        ),
        (&*patterns::ASCII_ROMAN_SUFFIX, roman_to_int, false),
        (&*patterns::DIGIT_SUFFIX, |s| s.parse().ok(), true),
    ]
}

/// True when the last token of the title is a plausible release year,
/// e.g. "Blade Runner 2049". Such titles keep their trailing digits.
fn ends_with_year(title: &str) -> bool {
    title.len() > 4 && title.chars().rev().take(4).all(|c| c.is_ascii_digit())
}

/// Drop a trailing season marker that merely repeats what the SxxEyy form
/// already said, so `"Fate/Zero 第二季 S2E3"` yields the bare title.
fn strip_redundant_season_marker(title: &str) -> String {
    for (pattern, extract, year_guard) in season_matchers() {
        if let Some(caps) = pattern.captures(title) {
            let stripped = caps["title"].trim();
            if stripped.is_empty() || (year_guard && ends_with_year(stripped)) {
                continue;
            }
            if extract(&caps["season"]).is_some() {
                return stripped.to_string();
            }
        }
    }
    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sxxeyy() {
        let r = parse("Fate/Zero S02E05");
        assert_eq!(r.title, "Fate/Zero");
        assert_eq!(r.season, Some(2));
        assert_eq!(r.episode, Some(5));
    }

    #[test]
    fn season_word() {
        let r = parse("Attack on Titan Season 3");
        assert_eq!(r.title, "Attack on Titan");
        assert_eq!(r.season, Some(3));
        assert_eq!(r.episode, None);
    }

    #[test]
    fn cjk_season() {
        let r = parse("某科学的超电磁炮 第二季");
        assert_eq!(r.title, "某科学的超电磁炮");
        assert_eq!(r.season, Some(2));
    }

    #[test]
    fn unicode_roman() {
        let r = parse("オーバーロード Ⅲ");
        assert_eq!(r.title, "オーバーロード");
        assert_eq!(r.season, Some(3));
    }

    #[test]
    fn ascii_roman() {
        let r = parse("Overlord III");
        assert_eq!(r.title, "Overlord");
        assert_eq!(r.season, Some(3));
    }

    #[test]
    fn bare_digit_season() {
        let r = parse("进击的巨人 2");
        assert_eq!(r.title, "进击的巨人");
        assert_eq!(r.season, Some(2));
    }

    #[test]
    fn year_is_not_a_season() {
        let r = parse("Blade Runner 2049 2");
        assert_eq!(r.title, "Blade Runner 2049 2");
        assert_eq!(r.season, None);
    }

    #[test]
    fn fallthrough_keeps_keyword() {
        let r = parse("Steins;Gate");
        assert_eq!(r.title, "Steins;Gate");
        assert_eq!(r.season, None);
        assert_eq!(r.episode, None);
    }

    #[test]
    fn whitespace_trimmed() {
        let r = parse("  Frieren  ");
        assert_eq!(r.title, "Frieren");
    }
}
