//! Splitting outbound requests under per-request limits.

use std::ops::Range;

/// Split `weights` into consecutive ranges holding at most `max_items` items
/// whose summed weight stays within `max_weight`.
///
/// An item heavier than `max_weight` on its own gets a range to itself, so
/// every item is covered exactly once and order is preserved.
pub(crate) fn split_by_budget(
    weights: &[usize],
    max_items: usize,
    max_weight: usize,
) -> Vec<Range<usize>> {
    let max_items = max_items.max(1);
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut total = 0;

    for (i, &weight) in weights.iter().enumerate() {
        let full = i - start == max_items || total + weight > max_weight;
        if i > start && full {
            ranges.push(start..i);
            start = i;
            total = 0;
        }
        total += weight;
    }
    if start < weights.len() {
        ranges.push(start..weights.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_item_limit() {
        assert_eq!(split_by_budget(&[1; 5], 2, 100), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn respects_weight_limit() {
        assert_eq!(split_by_budget(&[4, 4, 4, 1, 1], 10, 8), vec![0..2, 2..5]);
    }

    #[test]
    fn oversized_item_travels_alone() {
        assert_eq!(split_by_budget(&[2, 50, 2], 10, 10), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn empty_input_has_no_batches() {
        assert!(split_by_budget(&[], 10, 10).is_empty());
    }

    #[test]
    fn ranges_cover_every_item_in_order() {
        let weights: Vec<usize> = (0..500).map(|i| (i * 37) % 90 + 1).collect();
        let ranges = split_by_budget(&weights, 16, 300);

        let mut next = 0;
        for range in &ranges {
            assert_eq!(range.start, next);
            assert!(range.len() <= 16);
            assert!(range.len() == 1 || weights[range.clone()].iter().sum::<usize>() <= 300);
            next = range.end;
        }
        assert_eq!(next, weights.len());
    }
}
