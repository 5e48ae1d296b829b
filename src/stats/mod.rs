use crate::draws::{Draw, DrawRules};

/// Occurrence counts per possible number across a draw history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    min_number: u8,
    counts: Vec<u64>,
}

impl FrequencyTable {
    pub fn count(&self, number: u8) -> u64 {
        self.counts[(number - self.min_number) as usize]
    }

    /// Total occurrences across all numbers.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Share of all occurrences held by one number, in percent. Zero for an
    /// empty history.
    pub fn percentage(&self, number: u8) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }

        self.count(number) as f64 / total as f64 * 100.0
    }

    /// Iterate `(number, count)` pairs, most frequent first, ties broken by
    /// ascending number.
    pub fn by_frequency(&self) -> Vec<(u8, u64)> {
        let mut entries: Vec<(u8, u64)> = self
            .counts
            .iter()
            .enumerate()
            .map(|(idx, &count)| (self.min_number + idx as u8, count))
            .collect();

        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Count how often each possible number appeared. Plain aggregation, no
/// model involved; an empty history yields an all-zero table.
pub fn analyze(draws: &[Draw], rules: &DrawRules) -> FrequencyTable {
    let mut counts = vec![0u64; rules.pool_size()];

    for draw in draws {
        for &n in draw.numbers() {
            counts[(n - rules.min_number) as usize] += 1;
        }
    }

    FrequencyTable {
        min_number: rules.min_number,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DrawRules {
        DrawRules {
            min_number: 1,
            max_number: 5,
            numbers_per_draw: 2,
        }
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let table = analyze(&[], &rules());

        assert_eq!(table.len(), 5);
        assert_eq!(table.total(), 0);
        assert!((1..=5).all(|n| table.count(n) == 0));
        assert_eq!(table.percentage(3), 0.0);
    }

    #[test]
    fn test_counts_and_percentages() {
        let draws = vec![
            Draw::validated(1, "a".to_string(), vec![1, 2], &rules()).unwrap(),
            Draw::validated(2, "b".to_string(), vec![2, 3], &rules()).unwrap(),
        ];

        let table = analyze(&draws, &rules());
        assert_eq!(table.total(), 4);
        assert_eq!(table.count(2), 2);
        assert_eq!(table.count(5), 0);
        assert!((table.percentage(2) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_by_frequency_ordering() {
        let draws = vec![
            Draw::validated(1, "a".to_string(), vec![1, 4], &rules()).unwrap(),
            Draw::validated(2, "b".to_string(), vec![1, 3], &rules()).unwrap(),
        ];

        let entries = analyze(&draws, &rules()).by_frequency();
        assert_eq!(entries[0], (1, 2));
        // Ties by ascending number
        assert_eq!(entries[1], (3, 1));
        assert_eq!(entries[2], (4, 1));
    }
}
