use crate::models::TorrentRecord;

/// Decide whether a torrent has finished seeding and should be removed.
///
/// True when the ratio has reached the threshold (ties included) or the daemon
/// reports the torrent as `Finished`. Ratios are compared as numbers.
pub fn should_remove(record: &TorrentRecord, removal_ratio: f64) -> bool {
    record.ratio >= removal_ratio || record.is_finished()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(ratio: f64, state: &str) -> TorrentRecord {
        TorrentRecord {
            name: "Foo".to_string(),
            ratio,
            progress: "100%".to_string(),
            state: state.to_string(),
            stop_location: "/downloads/complete".to_string(),
        }
    }

    #[test]
    fn test_ratio_above_threshold() {
        assert!(should_remove(&torrent(2.5, "Idle"), 2.0));
    }

    #[test]
    fn test_ratio_below_threshold() {
        assert!(!should_remove(&torrent(1.0, "Idle"), 2.0));
    }

    #[test]
    fn test_ratio_equal_to_threshold() {
        assert!(should_remove(&torrent(2.0, "Seeding"), 2.0));
    }

    #[test]
    fn test_finished_ignores_ratio() {
        assert!(should_remove(&torrent(0.0, "Finished"), 2.0));
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        // "10.0" < "9.0" as strings
        assert!(should_remove(&torrent(10.0, "Idle"), 9.0));
        assert!(!should_remove(&torrent(9.0, "Idle"), 10.0));
    }
}
