//! Truncation policy — pure functions that bound accumulated entity state.
//!
//! Comment batches are bounded by total byte size (most-recent entries kept)
//! and per-ticket summary maps by entry count (highest ticket ids kept).
//! Both return whether anything was dropped so callers can log it.

use std::collections::HashMap;

/// Bound a comment batch to `limit` total bytes, keeping the most-recent
/// (trailing) entries.
///
/// Keeps the smallest trailing run whose cumulative length reaches the
/// limit, so the newest comment is always retained even when it alone
/// exceeds the budget. A limit of zero clears the batch.
pub fn truncate_comment_batch(comments: Vec<String>, limit: usize) -> (Vec<String>, bool) {
    if limit == 0 {
        let truncated = !comments.is_empty();
        return (Vec::new(), truncated);
    }

    let total: usize = comments.iter().map(|c| c.len()).sum();
    if total <= limit {
        return (comments, false);
    }

    let mut sum = 0usize;
    for (i, comment) in comments.iter().enumerate().rev() {
        sum += comment.len();
        if sum >= limit {
            return (comments[i..].to_vec(), true);
        }
    }

    // Unreachable: total > limit guarantees the scan hits the budget.
    (comments, true)
}

/// Bound a ticket-id-keyed summary map to at most `limit` entries, keeping
/// the entries with the highest (most recent) ticket ids.
pub fn truncate_summary_map(
    map: HashMap<i64, String>,
    limit: usize,
) -> (HashMap<i64, String>, bool) {
    if map.len() <= limit {
        return (map, false);
    }

    let mut keys: Vec<i64> = map.keys().copied().collect();
    keys.sort_unstable();
    let kept: Vec<i64> = keys.split_off(keys.len() - limit);

    let mut truncated = HashMap::with_capacity(limit);
    let mut map = map;
    for key in kept {
        if let Some(value) = map.remove(&key) {
            truncated.insert(key, value);
        }
    }

    (truncated, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn batch_under_limit_is_untouched() {
        let (kept, truncated) = truncate_comment_batch(batch(&["aa", "bb"]), 10);
        assert_eq!(kept, batch(&["aa", "bb"]));
        assert!(!truncated);
    }

    #[test]
    fn batch_keeps_most_recent_entries() {
        let (kept, truncated) = truncate_comment_batch(batch(&["aaaa", "bbbb", "cccc"]), 6);
        assert_eq!(kept, batch(&["bbbb", "cccc"]));
        assert!(truncated);
    }

    #[test]
    fn batch_always_keeps_newest_even_when_oversized() {
        let (kept, truncated) = truncate_comment_batch(batch(&["aa", "bbbbbbbbbb"]), 4);
        assert_eq!(kept, batch(&["bbbbbbbbbb"]));
        assert!(truncated);
    }

    #[test]
    fn batch_zero_limit_clears() {
        let (kept, truncated) = truncate_comment_batch(batch(&["aa"]), 0);
        assert!(kept.is_empty());
        assert!(truncated);
    }

    #[test]
    fn map_under_limit_is_untouched() {
        let map: HashMap<i64, String> = (1..=3).map(|i| (i, format!("s{i}"))).collect();
        let (kept, truncated) = truncate_summary_map(map, 5);
        assert_eq!(kept.len(), 3);
        assert!(!truncated);
    }

    #[test]
    fn map_drops_lowest_ids_first() {
        let map: HashMap<i64, String> = (1..=10).map(|i| (i, format!("s{i}"))).collect();
        let (kept, truncated) = truncate_summary_map(map, 4);
        assert!(truncated);
        assert_eq!(kept.len(), 4);
        for id in 7..=10 {
            assert!(kept.contains_key(&id), "expected id {id} to survive");
        }
        assert!(!kept.contains_key(&6));
    }

    #[test]
    fn map_511_entries_with_500_cap_keeps_the_500_highest() {
        let map: HashMap<i64, String> = (1..=511).map(|i| (i, format!("s{i}"))).collect();
        let (kept, truncated) = truncate_summary_map(map, 500);
        assert!(truncated);
        assert_eq!(kept.len(), 500);
        // The 11 lowest ids are gone; everything kept is among the 511 highest.
        for id in 1..=11 {
            assert!(!kept.contains_key(&id));
        }
        for id in 12..=511 {
            assert!(kept.contains_key(&id));
        }
    }
}
