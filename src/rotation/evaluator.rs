//! Pure retention policy evaluator.
//!
//! Maps a set of deprecated backup entries plus the retention floor and
//! ceiling to the exact set of entries to delete. No I/O, no clock: callers
//! pre-filter entries against the cutoff. Both backend pipelines call this
//! one function, which keeps filesystem and remote rotation semantics
//! identical by construction.

use crate::storage::BackupEntry;

/// Compute the deletion set for one backend's deprecated entries.
///
/// Entries are ordered oldest-first by `last_modified`, tie-broken by
/// identifier so repeated listings of the same backend state select the same
/// entries. The `min_keep_count` newest deprecated entries are always
/// preserved, and at most `max_clean_count` entries are selected.
///
/// Returns the selected entries oldest-first. The input is never mutated.
pub fn select_for_deletion(
    deprecated: &[BackupEntry],
    min_keep_count: usize,
    max_clean_count: usize,
) -> Vec<BackupEntry> {
    if deprecated.len() <= min_keep_count {
        return Vec::new();
    }

    let mut sorted = deprecated.to_vec();
    sorted.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.identifier.cmp(&b.identifier))
    });

    let eligible = sorted.len() - min_keep_count;
    sorted.truncate(eligible.min(max_clean_count));
    sorted
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn entry(id: &str, ts: DateTime<Utc>) -> BackupEntry {
        BackupEntry {
            identifier: id.to_string(),
            last_modified: ts,
            display_name: id.to_string(),
        }
    }

    /// `n` entries, oldest first: entry `i` is `i` hours after the epoch base.
    fn entries(n: usize) -> Vec<BackupEntry> {
        (0..n)
            .map(|i| {
                let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64);
                entry(&format!("backup-{:02}", i), ts)
            })
            .collect()
    }

    #[test]
    fn test_empty_input_selects_nothing() {
        assert!(select_for_deletion(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_at_or_below_floor_selects_nothing() {
        let set = entries(2);
        assert!(select_for_deletion(&set, 2, 10).is_empty());
        assert!(select_for_deletion(&set, 3, 10).is_empty());

        let single = entries(1);
        assert!(select_for_deletion(&single, 2, 10).is_empty());
    }

    #[test]
    fn test_selects_oldest_keeps_newest_floor() {
        // 12 deprecated, keep 2, clean up to 10: the 10 oldest go, the 2
        // newest deprecated entries survive.
        let set = entries(12);
        let selected = select_for_deletion(&set, 2, 10);

        assert_eq!(selected.len(), 10);
        let ids: Vec<_> = selected.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids[0], "backup-00");
        assert_eq!(ids[9], "backup-09");
        assert!(!ids.contains(&"backup-10"));
        assert!(!ids.contains(&"backup-11"));
    }

    #[test]
    fn test_clean_count_caps_selection() {
        let set = entries(10);
        let selected = select_for_deletion(&set, 0, 3);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].identifier, "backup-00");
        assert_eq!(selected[2].identifier, "backup-02");
    }

    #[test]
    fn test_zero_floor_selects_oldest() {
        let set = entries(4);
        let selected = select_for_deletion(&set, 0, 10);
        assert_eq!(selected.len(), 4);
        assert_eq!(selected[0].identifier, "backup-00");
    }

    #[test]
    fn test_zero_clean_count_selects_nothing() {
        let set = entries(8);
        assert!(select_for_deletion(&set, 2, 0).is_empty());
    }

    #[test]
    fn test_selection_size_formula() {
        // size = min(max_clean, n - min_keep) over a grid of policies
        for n in 0..8usize {
            let set = entries(n);
            for min_keep in 0..4usize {
                for max_clean in 0..6usize {
                    let selected = select_for_deletion(&set, min_keep, max_clean);
                    let expected = if n <= min_keep {
                        0
                    } else {
                        max_clean.min(n - min_keep)
                    };
                    assert_eq!(
                        selected.len(),
                        expected,
                        "n={} min_keep={} max_clean={}",
                        n,
                        min_keep,
                        max_clean
                    );
                }
            }
        }
    }

    #[test]
    fn test_newest_floor_never_selected() {
        let set = entries(9);
        for min_keep in 1..5usize {
            let selected = select_for_deletion(&set, min_keep, 100);
            for survivor in set.iter().rev().take(min_keep) {
                assert!(
                    !selected.iter().any(|e| e.identifier == survivor.identifier),
                    "floor entry {} was selected with min_keep={}",
                    survivor.identifier,
                    min_keep
                );
            }
        }
    }

    #[test]
    fn test_ties_broken_by_identifier() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let set = vec![entry("b", ts), entry("a", ts), entry("c", ts)];

        let first = select_for_deletion(&set, 1, 10);
        let second = select_for_deletion(&set, 1, 10);
        assert_eq!(first, second);

        let ids: Vec<_> = first.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let set = vec![
            entry("z", Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            entry("a", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ];
        let before = set.clone();
        let _ = select_for_deletion(&set, 0, 10);
        assert_eq!(set, before);
    }
}
