//! Engine-agnostic aggregation helpers shared by all backends.
//!
//! Per-tag unread counts are folded in memory from the per-source GROUP BY
//! result: grouping by CSV membership in SQL is not expressible portably,
//! and the source list is small by assumption.

use std::collections::{HashMap, HashSet};

use feedstore_core::{TagUnread, tag_visible};

/// Default display colors for implicitly created tags.
pub(crate) const TAG_PALETTE: &[&str] = &[
    "#7f9a61", "#c94a4a", "#4a77c9", "#c9a04a", "#9a61a8", "#4ac9b5", "#c96a9e", "#8a8a4a",
    "#5a9ec9", "#c9764a", "#6a4ac9", "#4ac95e", "#a84a61", "#61a84a", "#4a5ec9", "#c9c24a",
];

/// Color shown for tags that have no color row yet.
pub(crate) const DEFAULT_TAG_COLOR: &str = "#cccccc";

/// Deterministically pick an unused palette color for a new tag.
///
/// Hash of the tag name selects a starting slot; linear probing skips
/// colors already taken. When the palette is exhausted, colors repeat.
pub(crate) fn pick_unused_color(tag: &str, used: &HashSet<String>) -> String {
    let start = fnv1a(tag.as_bytes()) as usize % TAG_PALETTE.len();
    for i in 0..TAG_PALETTE.len() {
        let candidate = TAG_PALETTE[(start + i) % TAG_PALETTE.len()];
        if !used.contains(candidate) {
            return candidate.to_owned();
        }
    }
    TAG_PALETTE[start].to_owned()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Fold per-source unread counts into per-tag unread counts.
///
/// `sources` pairs each source's tag list with its unread count. Tags the
/// caller may not see are dropped; tags without a stored color get the
/// default color. Result is ordered by lowercase tag name.
pub(crate) fn fold_unread_by_tag(
    sources: &[(Vec<String>, u64)],
    colors: &HashMap<String, String>,
    privileged: bool,
) -> Vec<TagUnread> {
    let mut by_tag: HashMap<&str, u64> = HashMap::new();
    for (tags, unread) in sources {
        for tag in tags {
            if tag_visible(tag, privileged) {
                *by_tag.entry(tag.as_str()).or_insert(0) += unread;
            }
        }
    }
    let mut result: Vec<TagUnread> = by_tag
        .into_iter()
        .map(|(tag, unread)| TagUnread {
            tag: tag.to_owned(),
            color: colors.get(tag).cloned().unwrap_or_else(|| DEFAULT_TAG_COLOR.to_owned()),
            unread,
        })
        .collect();
    result.sort_by_key(|t| t.tag.to_lowercase());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_pick_is_deterministic_and_skips_used() {
        let used = HashSet::new();
        let first = pick_unused_color("news", &used);
        assert_eq!(first, pick_unused_color("news", &used));

        let mut taken = HashSet::new();
        taken.insert(first.clone());
        assert_ne!(first, pick_unused_color("news", &taken));
    }

    #[test]
    fn tag_fold_sums_across_sources_and_hides_private() {
        let sources = vec![
            (vec!["news".to_owned(), "@personal".to_owned()], 3),
            (vec!["news".to_owned()], 2),
        ];
        let colors = HashMap::from([("news".to_owned(), "#112233".to_owned())]);

        let public = fold_unread_by_tag(&sources, &colors, false);
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].tag, "news");
        assert_eq!(public[0].unread, 5);
        assert_eq!(public[0].color, "#112233");

        let private = fold_unread_by_tag(&sources, &colors, true);
        assert_eq!(private.len(), 2);
        assert_eq!(private[0].tag, "@personal");
        assert_eq!(private[0].color, DEFAULT_TAG_COLOR);
    }
}
