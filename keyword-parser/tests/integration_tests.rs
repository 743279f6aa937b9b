//! Integration tests using real-world search keywords

use keyword_parser::{parse, season_from_title};
use pretty_assertions::assert_eq;

// ============================================================================
// KEYWORD PARSING
// ============================================================================

#[test]
fn test_fate_zero_full_form() {
    let r = parse("Fate/Zero S02E05");
    assert_eq!(r.title, "Fate/Zero");
    assert_eq!(r.season, Some(2));
    assert_eq!(r.episode, Some(5));
}

#[test]
fn test_mixed_cjk_and_sxxeyy() {
    // The SxxEyy form wins, and the redundant CJK season marker is stripped
    let r = parse("Fate/Zero 第二季 S2E3");
    assert_eq!(r.title, "Fate/Zero");
    assert_eq!(r.season, Some(2));
    assert_eq!(r.episode, Some(3));
}

#[test]
fn test_long_episode_number() {
    let r = parse("名侦探柯南 S01E1024");
    assert_eq!(r.title, "名侦探柯南");
    assert_eq!(r.season, Some(1));
    assert_eq!(r.episode, Some(1024));
}

#[test]
fn test_season_only_forms() {
    assert_eq!(parse("间谍过家家 S2").season, Some(2));
    assert_eq!(parse("间谍过家家 Season 2").season, Some(2));
    assert_eq!(parse("间谍过家家 第二季").season, Some(2));
    assert_eq!(parse("间谍过家家 第2部").season, Some(2));
    assert_eq!(parse("间谍过家家 Ⅱ").season, Some(2));
    assert_eq!(parse("间谍过家家 II").season, Some(2));
    assert_eq!(parse("间谍过家家 2").season, Some(2));
}

#[test]
fn test_season_forms_share_title() {
    for keyword in [
        "间谍过家家 S2",
        "间谍过家家 第二季",
        "间谍过家家 Ⅱ",
        "间谍过家家 2",
    ] {
        assert_eq!(parse(keyword).title, "间谍过家家", "keyword: {keyword}");
    }
}

#[test]
fn test_year_suffix_is_preserved() {
    let r = parse("Blade Runner 2049");
    assert_eq!(r.title, "Blade Runner 2049");
    assert_eq!(r.season, None);
}

#[test]
fn test_plain_title() {
    let r = parse("葬送のフリーレン");
    assert_eq!(r.title, "葬送のフリーレン");
    assert_eq!(r.season, None);
    assert_eq!(r.episode, None);
}

#[test]
fn test_case_insensitive_sxxeyy() {
    let r = parse("shingeki no kyojin s03e12");
    assert_eq!(r.title, "shingeki no kyojin");
    assert_eq!(r.season, Some(3));
    assert_eq!(r.episode, Some(12));
}

// ============================================================================
// SEASON FROM TITLE
// ============================================================================

#[test]
fn test_title_season_markers() {
    assert_eq!(season_from_title("某科学的超电磁炮 第二季"), 2);
    assert_eq!(season_from_title("Re:ZERO Season 2"), 2);
    assert_eq!(season_from_title("刀剑神域 第3部"), 3);
    assert_eq!(season_from_title("犬夜叉 完结篇"), 1);
}

#[test]
fn test_title_formal_numerals() {
    assert_eq!(season_from_title("舞动青春 第贰季"), 2);
    assert_eq!(season_from_title("某剧 第拾部"), 10);
}

#[test]
fn test_title_zhi_zhang_form() {
    assert_eq!(season_from_title("游戏人生 三之章"), 3);
}

#[test]
fn test_title_roman_markers() {
    assert_eq!(season_from_title("オーバーロード Ⅳ"), 4);
    assert_eq!(season_from_title("Sword Art Online II"), 2);
}

#[test]
fn test_title_without_marker_defaults() {
    assert_eq!(season_from_title("鬼灭之刃"), 1);
}
