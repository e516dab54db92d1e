use std::f64::consts::TAU;

/// Lowest weight a candidate can have, however many down votes it collects
pub const MIN_WEIGHT: f64 = 0.1;

/// Weight added (or removed) per net vote
pub const VOTE_WEIGHT_STEP: f64 = 0.3;

/// Anything that can sit on the wheel
pub trait Weighted {
    /// Net vote tally used to size the segment
    fn votes(&self) -> i32;
}

/// A slice of the wheel owned by one candidate, as a half-open range [start, end)
#[derive(Debug)]
pub struct Segment<'a, T> {
    pub candidate: &'a T,
    pub start: f64,
    pub end: f64,
}

impl<T> Segment<'_, T> {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    fn contains(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.end
    }
}

/// Weight of a candidate given its vote tally
pub fn candidate_weight(votes: i32) -> f64 {
    (1.0 + f64::from(votes) * VOTE_WEIGHT_STEP).max(MIN_WEIGHT)
}

/// Folds any angle (negative or several turns) into [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let folded = ((angle % TAU) + TAU) % TAU;
    // (-tiny % TAU) + TAU rounds up to TAU
    if folded >= TAU {
        0.0
    } else {
        folded
    }
}

/// Lays the candidates out around the wheel in input order.
///
/// Widths are proportional to [`candidate_weight`]; the last segment is closed
/// at exactly 2π so the widths always add up to a full turn.
pub fn segments<T: Weighted>(candidates: &[T]) -> Vec<Segment<'_, T>> {
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| candidate_weight(c.votes()))
        .collect();
    let total: f64 = weights.iter().sum();

    let mut start = 0.0;
    let mut result = Vec::with_capacity(candidates.len());
    for (index, (candidate, weight)) in candidates.iter().zip(weights).enumerate() {
        let end = if index + 1 == candidates.len() {
            TAU
        } else {
            start + weight / total * TAU
        };
        result.push(Segment {
            candidate,
            start,
            end,
        });
        start = end;
    }
    result
}

/// Resolves a wheel rotation to the candidate under the pointer.
///
/// The pointer sits at angle 0 of the unrotated wheel, so after turning the
/// wheel by `rotation` it points at `2π - rotation` in wheel coordinates.
/// Returns `None` only for an empty wheel.
pub fn select_winner<T: Weighted>(candidates: &[T], rotation: f64) -> Option<&T> {
    let layout = segments(candidates);
    let pointer = (TAU - normalize_angle(rotation)) % TAU;

    layout
        .iter()
        .find(|segment| segment.contains(pointer))
        .or_else(|| layout.last())
        .map(|segment| segment.candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[derive(Debug, PartialEq)]
    struct Entry {
        name: &'static str,
        votes: i32,
    }

    impl Weighted for Entry {
        fn votes(&self) -> i32 {
            self.votes
        }
    }

    fn wheel(votes: &[(&'static str, i32)]) -> Vec<Entry> {
        votes
            .iter()
            .map(|&(name, votes)| Entry { name, votes })
            .collect()
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 1.3)]
    #[case(-3, 0.1)]
    #[case(-4, 0.1)]
    #[case(-1000, 0.1)]
    fn test_candidate_weight(#[case] votes: i32, #[case] expected: f64) {
        assert!((candidate_weight(votes) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weight_never_below_floor() {
        for votes in -500..500 {
            assert!(candidate_weight(votes) >= MIN_WEIGHT);
        }
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(TAU, 0.0)]
    #[case(-FRAC_PI_2, 3.0 * FRAC_PI_2)]
    #[case(5.0 * TAU + 1.0, 1.0)]
    fn test_normalize_angle(#[case] angle: f64, #[case] expected: f64) {
        let normalized = normalize_angle(angle);
        assert!((normalized - expected).abs() < 1e-9);
        assert!((0.0..TAU).contains(&normalized));
    }

    #[test]
    fn test_segments_cover_full_turn() {
        let entries = wheel(&[("a", 3), ("b", -2), ("c", 0), ("d", 7), ("e", -9)]);
        let layout = segments(&entries);

        let total: f64 = layout.iter().map(|s| s.width()).sum();
        assert!((total - TAU).abs() < 1e-9);
        assert_eq!(layout[0].start, 0.0);
        assert_eq!(layout.last().unwrap().end, TAU);
        for pair in layout.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_more_votes_means_wider_segment() {
        let entries = wheel(&[("a", -1), ("b", 0), ("c", 1), ("d", 2)]);
        let layout = segments(&entries);

        for pair in layout.windows(2) {
            assert!(pair[0].width() < pair[1].width());
        }
    }

    #[test]
    fn test_zero_rotation_picks_first_segment() {
        let entries = wheel(&[("A", 0), ("B", 0), ("C", 0), ("D", 0)]);
        let winner = select_winner(&entries, 0.0).unwrap();
        assert_eq!(winner.name, "A");
    }

    #[rstest]
    // pointer = 2π - rotation, equal quarter segments
    #[case(0.25 * PI, "D")]
    #[case(0.75 * PI, "C")]
    #[case(1.25 * PI, "B")]
    #[case(1.75 * PI, "A")]
    #[case(7.0 * TAU + 0.75 * PI, "C")]
    #[case(-0.25 * PI, "A")]
    fn test_rotation_selects_segment_under_pointer(
        #[case] rotation: f64,
        #[case] expected: &str,
    ) {
        let entries = wheel(&[("A", 0), ("B", 0), ("C", 0), ("D", 0)]);
        assert_eq!(select_winner(&entries, rotation).unwrap().name, expected);
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let entries = wheel(&[("only", -7)]);
        for step in 0..64 {
            let rotation = f64::from(step) * 0.37;
            assert_eq!(select_winner(&entries, rotation).unwrap().name, "only");
        }
    }

    #[test]
    fn test_empty_wheel_has_no_winner() {
        let entries: Vec<Entry> = Vec::new();
        assert!(select_winner(&entries, 1.0).is_none());
    }

    #[test]
    fn test_selection_is_deterministic_and_in_set() {
        let entries = wheel(&[("a", 2), ("b", -1), ("c", 0), ("d", 5), ("e", -6)]);
        for step in 0..500 {
            let rotation = f64::from(step) * 0.173 - 20.0;
            let first = select_winner(&entries, rotation).unwrap();
            let second = select_winner(&entries, rotation).unwrap();
            assert_eq!(first, second);
            assert!(entries.iter().any(|e| std::ptr::eq(e, first)));
        }
    }

    #[test]
    fn test_heavily_downvoted_candidate_still_reachable() {
        let entries = wheel(&[("liked", 10), ("hated", -50)]);
        let layout = segments(&entries);
        // Pointer lands in the middle of the second segment
        let middle = (layout[1].start + layout[1].end) / 2.0;
        let rotation = TAU - middle;
        assert_eq!(select_winner(&entries, rotation).unwrap().name, "hated");
    }
}
