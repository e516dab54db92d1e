use serde::{Deserialize, Serialize};

use crate::room::models::SpinRecord;

/// Below this much remaining time a late joiner just waits for the result
pub const SYNC_THRESHOLD_MS: i64 = 100;

/// How far a running spin has progressed, as seen by someone joining now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinProgress {
    pub elapsed_ms: i64,
    pub remaining_ms: i64,
}

/// Works out whether a late joiner should replay the running spin.
///
/// Returns `None` when the spin is effectively over; the joiner then gets
/// the regular SPIN_STOPPED broadcast shortly.
pub fn spin_progress(spin: &SpinRecord, now_ms: i64) -> Option<SpinProgress> {
    let elapsed_ms = (now_ms - spin.start_time).max(0);
    let remaining_ms = (spin.duration_ms() - elapsed_ms).max(0);

    if remaining_ms > SYNC_THRESHOLD_MS {
        Some(SpinProgress {
            elapsed_ms,
            remaining_ms,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::{Candidate, NewCandidate};
    use rstest::rstest;

    fn spin_started_at(start_time: i64, duration: f64) -> SpinRecord {
        SpinRecord {
            token: "t".to_string(),
            duration,
            total_rotation: 33.0,
            start_rotation: 0.0,
            selected_candidate: Candidate::with_id(
                1,
                NewCandidate {
                    title: "Jaws".to_string(),
                    year: Some(1975),
                    poster: None,
                },
                "alice".to_string(),
            ),
            spun_by: "alice".to_string(),
            start_time,
            candidate_ids: vec![1],
            is_elimination_round: false,
            round: None,
        }
    }

    #[test]
    fn test_halfway_joiner_gets_remaining_half() {
        let spin = spin_started_at(10_000, 5.0);
        let progress = spin_progress(&spin, 12_500).unwrap();
        assert_eq!(progress.elapsed_ms, 2_500);
        assert_eq!(progress.remaining_ms, 2_500);
    }

    #[rstest]
    #[case(14_900)] // exactly at the threshold
    #[case(14_950)]
    #[case(15_000)]
    #[case(20_000)] // long finished, completion not yet fired
    fn test_nearly_finished_spin_not_synced(#[case] now: i64) {
        let spin = spin_started_at(10_000, 5.0);
        assert!(spin_progress(&spin, now).is_none());
    }

    #[test]
    fn test_just_above_threshold_is_synced() {
        let spin = spin_started_at(10_000, 5.0);
        let progress = spin_progress(&spin, 14_899).unwrap();
        assert_eq!(progress.remaining_ms, 101);
    }

    #[test]
    fn test_clock_behind_start_counts_as_zero_elapsed() {
        let spin = spin_started_at(10_000, 2.0);
        let progress = spin_progress(&spin, 9_000).unwrap();
        assert_eq!(progress.elapsed_ms, 0);
        assert_eq!(progress.remaining_ms, 2_000);
    }

    #[test]
    fn test_fractional_duration() {
        let spin = spin_started_at(0, 1.25);
        let progress = spin_progress(&spin, 250).unwrap();
        assert_eq!(progress.remaining_ms, 1_000);
    }
}
