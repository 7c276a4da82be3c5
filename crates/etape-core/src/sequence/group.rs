//! Consecutive-group aggregation.
//!
//! Groups a position-sorted step list into singles and ranges. A run is
//! extended only by a step at the same destination with position exactly
//! one past the run's last member; adjacency is positional, so the same
//! destination revisited later in the itinerary starts a fresh group.

use crate::model::{ItineraryStep, StepGroup};

/// Group a sorted step list into maximal consecutive-destination runs.
///
/// Input must be sorted ascending by position. Single linear pass.
pub fn group_steps(steps: &[ItineraryStep]) -> Vec<StepGroup> {
    let mut groups = Vec::new();
    let mut run: Vec<ItineraryStep> = Vec::new();

    for step in steps {
        if let Some(last) = run.last() {
            let extends = last.destination.id == step.destination.id
                && step.position == last.position + 1;
            if !extends {
                groups.push(close_run(std::mem::take(&mut run)));
            }
        }
        run.push(step.clone());
    }

    if !run.is_empty() {
        groups.push(close_run(run));
    }

    groups
}

fn close_run(mut run: Vec<ItineraryStep>) -> StepGroup {
    if run.len() == 1 {
        StepGroup::Single(run.remove(0))
    } else {
        StepGroup::Range { steps: run }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::step;

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_steps(&[]).is_empty());
    }

    #[test]
    fn two_nights_then_new_town() {
        // Two consecutive days in A, then one in B.
        let steps = vec![
            step(1, "2025-01-01", 1, 1),
            step(2, "2025-01-02", 1, 2),
            step(3, "2025-01-03", 2, 3),
        ];
        let groups = group_steps(&steps);
        assert_eq!(groups.len(), 2);
        match &groups[0] {
            StepGroup::Range { steps } => {
                assert_eq!(steps.len(), 2);
                assert_eq!(steps[0].id, Some(1));
                assert_eq!(steps[1].id, Some(2));
            }
            other => panic!("expected range, got {other:?}"),
        }
        match &groups[1] {
            StepGroup::Single(s) => assert_eq!(s.id, Some(3)),
            other => panic!("expected single, got {other:?}"),
        }
    }

    #[test]
    fn position_gap_breaks_a_run() {
        // Same destination but a hole in the sequence (a deleted day):
        // adjacency is positional, the run must split.
        let steps = vec![
            step(1, "2025-01-01", 1, 1),
            step(2, "2025-01-03", 1, 3),
        ];
        let groups = group_steps(&steps);
        assert_eq!(groups.len(), 2);
        assert!(matches!(groups[0], StepGroup::Single(_)));
        assert!(matches!(groups[1], StepGroup::Single(_)));
    }

    #[test]
    fn revisited_destination_does_not_merge() {
        // A, B, A again: the two A groups must stay separate.
        let steps = vec![
            step(1, "2025-01-01", 1, 1),
            step(2, "2025-01-02", 2, 2),
            step(3, "2025-01-03", 1, 3),
        ];
        let groups = group_steps(&steps);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].destination().id, 1);
        assert_eq!(groups[1].destination().id, 2);
        assert_eq!(groups[2].destination().id, 1);
    }

    #[test]
    fn ranges_are_contiguous_and_boundaries_split() {
        let steps = vec![
            step(1, "2025-01-01", 1, 1),
            step(2, "2025-01-02", 1, 2),
            step(3, "2025-01-03", 1, 3),
            step(4, "2025-01-04", 2, 4),
            step(5, "2025-01-05", 2, 5),
        ];
        let groups = group_steps(&steps);

        for group in &groups {
            let members = group.steps();
            for pair in members.windows(2) {
                assert_eq!(pair[1].position, pair[0].position + 1);
                assert_eq!(pair[1].destination.id, pair[0].destination.id);
            }
        }
        // Adjacent groups never share a destination across a contiguous
        // boundary (otherwise the first group would not be maximal).
        for pair in groups.windows(2) {
            let last = &pair[0].steps()[pair[0].len() - 1];
            let first = &pair[1].steps()[0];
            assert!(
                last.destination.id != first.destination.id
                    || first.position != last.position + 1
            );
        }
    }

    #[test]
    fn grouping_is_total() {
        // Concatenating all groups reproduces the input exactly.
        let steps = vec![
            step(1, "2025-01-01", 1, 1),
            step(2, "2025-01-02", 1, 2),
            step(3, "2025-01-03", 2, 3),
            step(4, "2025-01-04", 3, 4),
            step(5, "2025-01-05", 3, 5),
            step(6, "2025-01-06", 3, 6),
        ];
        let groups = group_steps(&steps);
        let flattened: Vec<_> = groups.iter().flat_map(|g| g.steps().iter()).collect();
        assert_eq!(flattened.len(), steps.len());
        for (original, grouped) in steps.iter().zip(flattened) {
            assert_eq!(original, grouped);
        }
    }
}
