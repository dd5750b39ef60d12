// SPDX-License-Identifier: Apache-2.0

//! Sparse board-column ordering.
//!
//! Positions are orderable scalars, not dense indexes: appending derives the
//! scalar from the clock, and a drop between two siblings takes their
//! midpoint. Only the moved row is ever written; neighbors keep their
//! positions. Concurrent moves of the same task resolve last-write-wins at
//! the row level.

/// Gap used when a task is dropped before the first or after the last
/// sibling and the clock scalar is not usable.
const STEP: f64 = 1024.0;

/// Position for appending to the end of a column.
#[must_use]
pub fn next_position(now_ms: i64) -> f64 {
    now_ms as f64
}

/// Position for a task dropped between `before` and `after` within one
/// column.
///
/// Either neighbor may be absent (drop at the head or tail). The result is
/// strictly ordered against both present neighbors whenever the interval
/// admits a midpoint; a collapsed interval (midpoint indistinguishable from
/// an endpoint at f64 precision) degrades to an endpoint offset, which keeps
/// the outcome deterministic for the same inputs.
#[must_use]
pub fn position_between(before: Option<f64>, after: Option<f64>, now_ms: i64) -> f64 {
    match (before, after) {
        (None, None) => next_position(now_ms),
        (None, Some(first)) => first - STEP,
        (Some(last), None) => {
            let appended = next_position(now_ms);
            if appended > last {
                appended
            } else {
                last + STEP
            }
        }
        (Some(b), Some(a)) => {
            let mid = b + (a - b) / 2.0;
            if mid > b && mid < a {
                mid
            } else {
                // Interval exhausted at f64 precision; step just past the
                // lower endpoint. Readers order ties by id, so landing on
                // the upper neighbor stays stable.
                b + (b.abs() * f64::EPSILON).max(f64::MIN_POSITIVE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_tracks_the_clock() {
        assert_eq!(next_position(1_700_000_000_000), 1_700_000_000_000.0);
        assert!(next_position(2) > next_position(1));
    }

    #[test]
    fn midpoint_lands_strictly_between_neighbors() {
        let p = position_between(Some(100.0), Some(200.0), 0);
        assert!(p > 100.0 && p < 200.0);
    }

    #[test]
    fn head_drop_precedes_the_first_sibling() {
        let first = 5_000.0;
        assert!(position_between(None, Some(first), 99_000) < first);
    }

    #[test]
    fn tail_drop_follows_the_last_sibling_even_with_a_stale_clock() {
        let last = 9_000.0;
        // Clock behind the last sibling's scalar: still strictly after.
        assert!(position_between(Some(last), None, 1_000) > last);
        // Clock ahead: the clock scalar wins.
        assert_eq!(position_between(Some(last), None, 50_000), 50_000.0);
    }

    #[test]
    fn collapsed_interval_still_orders_after_the_lower_neighbor() {
        let b = 100.0;
        let a = b + f64::EPSILON;
        let p = position_between(Some(b), Some(a), 0);
        assert!(p > b);
    }

    #[test]
    fn empty_column_appends() {
        assert_eq!(position_between(None, None, 42_000), 42_000.0);
    }
}
