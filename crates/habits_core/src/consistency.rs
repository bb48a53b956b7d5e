//! Consistency metric.
//!
//! # Responsibility
//! - Derive the share of elapsed days on which a habit's goal was met.
//!
//! # Invariants
//! - Pure: depends only on `created_at`, `progress_days` and the given `now`.
//! - Day of creation (or a clock earlier than creation) yields `0`.
//! - Results above 100 are reported as-is, never clamped.

use crate::model::habit::{Habit, DAY_MS};

/// Whole days between `created_at` and `now`, rounded toward negative infinity.
pub fn days_elapsed(created_at: i64, now: i64) -> i64 {
    now.saturating_sub(created_at).div_euclid(DAY_MS)
}

/// Integer percentage `floor(100 * progress_days / days_elapsed)`.
pub fn consistency(habit: &Habit, now: i64) -> u32 {
    let days = days_elapsed(habit.created_at, now);
    if days <= 0 {
        return 0;
    }
    let percent = 100 * i64::from(habit.progress_days) / days;
    u32::try_from(percent).unwrap_or(u32::MAX)
}

/// Arithmetic mean of per-habit percentages; `None` for an empty set.
pub fn average_consistency(habits: &[Habit], now: i64) -> Option<f64> {
    if habits.is_empty() {
        return None;
    }
    let total: u64 = habits
        .iter()
        .map(|habit| u64::from(consistency(habit, now)))
        .sum();
    Some(total as f64 / habits.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::{average_consistency, consistency, days_elapsed};
    use crate::model::habit::{Habit, NewHabit, DAY_MS};

    const T0: i64 = 1_700_000_000_000;

    fn habit_with_progress(progress_days: u32) -> Habit {
        let mut habit = Habit::new(&NewHabit::new("Read", true, "10 pages"), T0);
        habit.progress_days = progress_days;
        habit
    }

    #[test]
    fn days_elapsed_floors_partial_days() {
        assert_eq!(days_elapsed(T0, T0), 0);
        assert_eq!(days_elapsed(T0, T0 + DAY_MS - 1), 0);
        assert_eq!(days_elapsed(T0, T0 + DAY_MS), 1);
        assert_eq!(days_elapsed(T0, T0 + 5 * DAY_MS / 2), 2);
        assert_eq!(days_elapsed(T0, T0 - 1), -1);
    }

    #[test]
    fn same_day_is_zero_even_with_progress() {
        let habit = habit_with_progress(3);
        assert_eq!(consistency(&habit, T0), 0);
        assert_eq!(consistency(&habit, T0 + DAY_MS - 1), 0);
        assert_eq!(consistency(&habit, T0 - 10 * DAY_MS), 0);
    }

    #[test]
    fn truncates_toward_zero() {
        let habit = habit_with_progress(1);
        assert_eq!(consistency(&habit, T0 + 3 * DAY_MS), 33);
        let habit = habit_with_progress(2);
        assert_eq!(consistency(&habit, T0 + 3 * DAY_MS), 66);
    }

    #[test]
    fn excess_progress_is_not_clamped() {
        let habit = habit_with_progress(3);
        assert_eq!(consistency(&habit, T0 + 2 * DAY_MS), 150);
    }

    #[test]
    fn non_decreasing_in_progress_for_fixed_elapsed_days() {
        let now = T0 + 7 * DAY_MS;
        let mut previous = 0;
        for progress in 0..=10 {
            let value = consistency(&habit_with_progress(progress), now);
            assert!(value >= previous, "{value} < {previous} at {progress}");
            previous = value;
        }
    }

    #[test]
    fn average_is_mean_of_percentages_and_none_when_empty() {
        let now = T0 + 4 * DAY_MS;
        let habits = vec![habit_with_progress(4), habit_with_progress(1)];
        assert_eq!(average_consistency(&habits, now), Some(62.5));
        assert_eq!(average_consistency(&[], now), None);
    }
}
