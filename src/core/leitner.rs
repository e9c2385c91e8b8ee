//! Leitner box adjustment.

use crate::types::{LeitnerBox, Performance};

/// Box a card moves to after being scored `performance` while in `current`.
///
/// A pass (3 or more) moves one box up, anything lower moves one box down,
/// both clamped to `1..=5`. Only the current box matters.
pub fn next_box(current: LeitnerBox, performance: Performance) -> LeitnerBox {
    if performance.is_pass() {
        current.promoted()
    } else {
        current.demoted()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn lb(n: i64) -> LeitnerBox {
        LeitnerBox::new(n).unwrap()
    }

    fn perf(n: i64) -> Performance {
        Performance::new(n).unwrap()
    }

    #[test]
    fn pass_promotes_fail_demotes() {
        assert_eq!(next_box(lb(1), perf(4)), lb(2));
        assert_eq!(next_box(lb(3), perf(3)), lb(4));
        assert_eq!(next_box(lb(3), perf(2)), lb(2));
    }

    #[test]
    fn clamps_at_floor_and_ceiling() {
        assert_eq!(next_box(lb(1), perf(1)), lb(1));
        assert_eq!(next_box(lb(5), perf(5)), lb(5));
    }

    proptest! {
        #[test]
        fn stays_in_range_and_is_monotonic_in_score(b in 1i64..=5, p in 1i64..=4) {
            let lo = next_box(lb(b), perf(p));
            let hi = next_box(lb(b), perf(p + 1));
            prop_assert!(lo >= LeitnerBox::MIN && lo <= LeitnerBox::MAX);
            prop_assert!(hi >= lo);
        }

        #[test]
        fn failing_never_raises_and_passing_never_lowers(b in 1i64..=5, p in 1i64..=5) {
            let next = next_box(lb(b), perf(p));
            if p < 3 {
                prop_assert!(next <= lb(b));
            } else {
                prop_assert!(next >= lb(b));
            }
        }
    }
}
