//! Comment normalization
//!
//! Applied by every scraper after fetching and before returning:
//!
//! 1. Deduplicate by upstream `cid`.
//! 2. Group by textual content.
//! 3. Collapse each group of two or more into the earliest-timestamp
//!    comment with `" X{n}"` appended to its text.
//!
//! The output keeps the first-seen order of the surviving comments.

use std::collections::HashMap;

use crate::interfaces::scrapers::DanmakuComment;

/// Normalizes a scraper's raw comment list
pub fn normalize_comments(comments: Vec<DanmakuComment>) -> Vec<DanmakuComment> {
    // 1. Dedup by cid, keeping the first occurrence
    let mut seen_cids = HashMap::new();
    let mut unique = Vec::with_capacity(comments.len());
    for comment in comments {
        if seen_cids.insert(comment.cid.clone(), ()).is_none() {
            unique.push(comment);
        }
    }

    // 2. Group by content, keeping group discovery order
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<DanmakuComment>> = HashMap::new();
    for comment in unique {
        if !groups.contains_key(&comment.m) {
            group_order.push(comment.m.clone());
        }
        groups.entry(comment.m.clone()).or_default().push(comment);
    }

    // 3. Collapse duplicates onto the earliest comment
    let mut result = Vec::with_capacity(group_order.len());
    for content in group_order {
        let mut group = groups.remove(&content).unwrap_or_default();
        if group.len() == 1 {
            result.extend(group);
            continue;
        }
        let earliest_idx = group
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.t.total_cmp(&b.t))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut keeper = group.swap_remove(earliest_idx);
        keeper.m = format!("{} X{}", keeper.m, group.len() + 1);
        result.push(keeper);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::scrapers::comment_mode;

    fn comment(cid: &str, t: f64, m: &str) -> DanmakuComment {
        DanmakuComment::new(cid, t, comment_mode::SCROLL, 16777215, "test", m)
    }

    #[test]
    fn collapses_duplicate_content_onto_earliest() {
        let input = vec![
            comment("1", 10.5, "233"),
            comment("2", 10.0, "233"),
            comment("3", 11.0, "233"),
            comment("4", 12.0, "233"),
        ];
        let result = normalize_comments(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].m, "233 X4");
        assert_eq!(result[0].t, 10.0);
        assert_eq!(result[0].cid, "2");
    }

    #[test]
    fn dedups_by_cid_before_grouping() {
        let input = vec![
            comment("1", 10.0, "hello"),
            comment("1", 10.0, "hello"),
        ];
        let result = normalize_comments(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].m, "hello");
    }

    #[test]
    fn singletons_pass_through_untouched() {
        let input = vec![comment("1", 1.0, "a"), comment("2", 2.0, "b")];
        let result = normalize_comments(input);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].m, "a");
        assert_eq!(result[1].m, "b");
    }

    #[test]
    fn keeps_first_seen_order() {
        let input = vec![
            comment("1", 5.0, "b"),
            comment("2", 1.0, "a"),
            comment("3", 6.0, "b"),
        ];
        let result = normalize_comments(input);
        assert_eq!(result[0].m, "b X2");
        assert_eq!(result[1].m, "a");
    }
}
