//! Title normalization utilities
//!
//! Provides functions to normalize scraped titles before they are stored or
//! compared:
//! - Stripping HTML tags and entities from upstream search payloads
//! - Folding ASCII and fullwidth colons
//! - Removing bracketed annotations for alias comparison

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex to match HTML tags in upstream titles (`<em class="keyword">`)
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Regex to match bracketed annotations, both ASCII and fullwidth forms
static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[^\]]*\]|【[^】]*】|\([^)]*\)|（[^）]*）").unwrap()
});

/// Regex to match multiple whitespace
static MULTIPLE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Title normalizer for scraped media titles
pub struct TitleNormalizer;

impl TitleNormalizer {
    /// Clean a raw title coming off a scraper payload.
    ///
    /// Strips HTML tags, unescapes entities, collapses whitespace, and folds
    /// the ASCII colon into its fullwidth form, which is how titles are
    /// stored in the library.
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(
    ///     TitleNormalizer::clean_scraped("<em>Fate</em>/Zero&amp;"),
    ///     "Fate/Zero&"
    /// );
    /// ```
    pub fn clean_scraped(title: &str) -> String {
        let without_tags = HTML_TAG.replace_all(title, "");
        let unescaped = html_escape::decode_html_entities(&without_tags);
        let collapsed = MULTIPLE_SPACES.replace_all(&unescaped, " ");
        collapsed.trim().replace(':', "：")
    }

    /// Fold a stored title back to its ASCII-colon, space-free form.
    ///
    /// This is the shape used for LIKE-fallback matching: `"Fate：Zero"`
    /// and `"Fate: Zero"` both become `"fate:zero"`.
    pub fn fold_for_matching(title: &str) -> String {
        title.replace('：', ":").replace(' ', "").to_lowercase()
    }

    /// Normalize a candidate title for alias-set filtering.
    ///
    /// Drops bracketed regions (release-group tags, quality notes),
    /// lowercases, removes spaces, and folds colons. Two titles referring to
    /// the same work should collide after this.
    pub fn normalize_for_filtering(title: &str) -> String {
        let without_brackets = BRACKETED.replace_all(title, "");
        without_brackets
            .to_lowercase()
            .replace(' ', "")
            .replace('：', ":")
            .trim()
            .to_string()
    }

    /// Sanitize a keyword for FULLTEXT search by removing boolean-mode
    /// operators.
    pub fn sanitize_for_fulltext(keyword: &str) -> String {
        static OPERATORS: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"[+\-><()~*@"]"#).unwrap());
        let sanitized = OPERATORS.replace_all(keyword, " ");
        MULTIPLE_SPACES
            .replace_all(&sanitized, " ")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_scraped_strips_tags_and_entities() {
        assert_eq!(
            TitleNormalizer::clean_scraped("<em class=\"keyword\">Fate</em>/Zero&amp;Co"),
            "Fate/Zero&Co"
        );
    }

    #[test]
    fn clean_scraped_folds_colon() {
        assert_eq!(
            TitleNormalizer::clean_scraped("名侦探柯南:黑铁的鱼影"),
            "名侦探柯南：黑铁的鱼影"
        );
    }

    #[test]
    fn fold_for_matching_is_symmetric() {
        assert_eq!(
            TitleNormalizer::fold_for_matching("Fate： Zero"),
            TitleNormalizer::fold_for_matching("fate:zero")
        );
    }

    #[test]
    fn filtering_drops_brackets() {
        assert_eq!(
            TitleNormalizer::normalize_for_filtering("【独播】某科学的超电磁炮 (TV)"),
            "某科学的超电磁炮"
        );
        assert_eq!(
            TitleNormalizer::normalize_for_filtering("Fate：Zero [BD]"),
            "fate:zero"
        );
    }

    #[test]
    fn fulltext_sanitization_removes_operators() {
        assert_eq!(
            TitleNormalizer::sanitize_for_fulltext("Re:ZERO -Starting Life-"),
            "Re:ZERO Starting Life"
        );
    }
}
