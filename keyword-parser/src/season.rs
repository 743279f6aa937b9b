//! Season extraction from candidate titles.
//!
//! Scraper search results rarely expose a season field; the season is
//! buried in the display title (`"某科学的超电磁炮 第二季"`,
//! `"Overlord Ⅲ"`). This module pulls it out, defaulting to season 1.

use crate::numerals::{chinese_to_int, roman_to_int, unicode_roman_to_int};
use crate::patterns;

/// Extract a season number from anywhere inside a title.
///
/// Matchers run in a fixed order (`S01`/`Season 1`, `第N季/部/幕`,
/// `N之章`, Unicode Roman, ASCII Roman); the first hit wins. Titles with
/// no recognizable marker are season 1.
pub fn season_from_title(title: &str) -> u32 {
    if title.is_empty() {
        return 1;
    }

    if let Some(caps) = patterns::TITLE_S_SEASON.captures(title) {
        if let Ok(n) = caps["num"].parse() {
            return n;
        }
    }

    if let Some(caps) = patterns::TITLE_CJK_SEASON.captures(title) {
        let raw = &caps["num"];
        if let Ok(n) = raw.parse() {
            return n;
        }
        if let Some(n) = raw.chars().next().and_then(chinese_to_int) {
            return n;
        }
    }

    if let Some(caps) = patterns::TITLE_ZHI_ZHANG.captures(title) {
        if let Some(n) = caps["num"].chars().next().and_then(chinese_to_int) {
            return n;
        }
    }

    if let Some(caps) = patterns::TITLE_UNICODE_ROMAN.captures(title) {
        if let Some(n) = caps["num"].chars().next().and_then(unicode_roman_to_int) {
            return n;
        }
    }

    if let Some(caps) = patterns::TITLE_ASCII_ROMAN.captures(title) {
        if let Some(n) = roman_to_int(&caps["num"]) {
            return n;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_marker() {
        assert_eq!(season_from_title("Some Show S03"), 3);
        assert_eq!(season_from_title("Some Show Season 2"), 2);
    }

    #[test]
    fn cjk_markers() {
        assert_eq!(season_from_title("某科学的超电磁炮 第二季"), 2);
        assert_eq!(season_from_title("进击的巨人 第3部"), 3);
        assert_eq!(season_from_title("舞台剧 第壹幕"), 1);
    }

    #[test]
    fn zhi_zhang() {
        assert_eq!(season_from_title("游戏人生 二之章"), 2);
    }

    #[test]
    fn roman_markers() {
        assert_eq!(season_from_title("Overlord Ⅲ"), 3);
        assert_eq!(season_from_title("Overlord IV"), 4);
    }

    #[test]
    fn defaults_to_one() {
        assert_eq!(season_from_title("Frieren"), 1);
        assert_eq!(season_from_title(""), 1);
    }
}
