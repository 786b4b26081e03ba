//! Dose schedules built from parallel offset and quantity lists.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

/// Pairs offsets (hours) with dose quantities, repeating the last value of
/// the shorter list until the longer one is exhausted. A later duplicate of
/// an offset overwrites the earlier entry. Either list being empty yields an
/// empty schedule.
pub fn build_dose_schedule(offsets: &[f64], doses: &[f64]) -> HashMap<OrderedFloat<f64>, f64> {
    let mut schedule = HashMap::new();
    if offsets.is_empty() || doses.is_empty() {
        return schedule;
    }
    for i in 0..offsets.len().max(doses.len()) {
        let offset = offsets[i.min(offsets.len() - 1)];
        let dose = doses[i.min(doses.len() - 1)];
        schedule.insert(OrderedFloat(offset), dose);
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dose_repeats_across_offsets() {
        let schedule = build_dose_schedule(&[0.0, 12.0, 24.0], &[10.0]);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[&OrderedFloat(0.0)], 10.0);
        assert_eq!(schedule[&OrderedFloat(12.0)], 10.0);
        assert_eq!(schedule[&OrderedFloat(24.0)], 10.0);
    }

    #[test]
    fn last_offset_repeats_across_doses() {
        let schedule = build_dose_schedule(&[0.0, 8.0], &[10.0, 20.0, 30.0]);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[&OrderedFloat(0.0)], 10.0);
        assert_eq!(schedule[&OrderedFloat(8.0)], 30.0);
    }

    #[test]
    fn duplicate_offsets_keep_the_last_dose() {
        let schedule = build_dose_schedule(&[0.0, 0.0], &[5.0, 7.0]);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[&OrderedFloat(0.0)], 7.0);
    }

    #[test]
    fn empty_lists_yield_an_empty_schedule() {
        assert!(build_dose_schedule(&[], &[1.0]).is_empty());
        assert!(build_dose_schedule(&[0.0], &[]).is_empty());
    }
}
