//! Pre-compiled regular expressions for the keyword and title parsers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `"Title S02E05"` — the only form that also carries an episode
    pub static ref SEASON_EPISODE: Regex =
        Regex::new(r"(?i)^(?P<title>.+?)\s*S(?P<season>\d{1,2})E(?P<episode>\d{1,4})$").unwrap();

    /// `"Title S2"` / `"Title Season 2"`
    pub static ref SEASON_SUFFIX: Regex =
        Regex::new(r"(?i)^(?P<title>.*?)\s*(?:S|Season)\s*(?P<season>\d{1,2})$").unwrap();

    /// `"Title 第二季"` / `"Title 第3部"` — everyday Chinese numerals or digits
    pub static ref CJK_SEASON_SUFFIX: Regex =
        Regex::new(r"^(?P<title>.*?)\s*第\s*(?P<season>[一二三四五六七八九十\d]+)\s*[季部]$").unwrap();

    /// `"Title Ⅲ"` — a single Unicode Roman numeral at the end
    pub static ref UNICODE_ROMAN_SUFFIX: Regex =
        Regex::new(r"^(?P<title>.*?)\s*(?P<season>[Ⅰ-Ⅻⅰ-ⅻ])$").unwrap();

    /// `"Title III"` — ASCII Roman numerals separated by whitespace
    pub static ref ASCII_ROMAN_SUFFIX: Regex =
        Regex::new(r"(?i)^(?P<title>.*?)\s+(?P<season>[IVXLCDM]+)$").unwrap();

    /// `"Title 2"` — bare trailing digits, ambiguous with years
    pub static ref DIGIT_SUFFIX: Regex =
        Regex::new(r"^(?P<title>.*?)\s+(?P<season>\d{1,2})$").unwrap();

    /// Season markers appearing anywhere inside a title:
    /// `第N季`, `第N部`, `第N幕` with everyday or formal Chinese numerals
    pub static ref TITLE_CJK_SEASON: Regex =
        Regex::new(r"第\s*(?P<num>[一二三四五六七八九十壹贰叁肆伍陆柒捌玖拾\d])\s*[季部幕]").unwrap();

    /// `N之章` inside a title
    pub static ref TITLE_ZHI_ZHANG: Regex =
        Regex::new(r"(?P<num>[一二三四五六七八九十壹贰叁肆伍陆柒捌玖拾])\s*之\s*章").unwrap();

    /// `S01` / `Season 1` inside a title
    pub static ref TITLE_S_SEASON: Regex =
        Regex::new(r"(?i)(?:S|Season)\s*(?P<num>\d+)").unwrap();

    /// Unicode Roman numeral inside a title, set off by whitespace
    pub static ref TITLE_UNICODE_ROMAN: Regex =
        Regex::new(r"\s+(?P<num>[Ⅰ-Ⅻⅰ-ⅻ])(?:\s|$)").unwrap();

    /// ASCII Roman numeral inside a title, set off by whitespace
    pub static ref TITLE_ASCII_ROMAN: Regex =
        Regex::new(r"(?i)\s+(?P<num>[IVXLCDM]+)\b").unwrap();
}
