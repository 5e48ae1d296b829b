use ndarray::{Array, Array2, ArrayView, Axis};

use crate::draws::{Draw, DrawRules};

/// A training set: input rows and their target rows.
pub struct Dataset {
    pub data: Array2<f64>,
    pub target: Array2<f64>,
}

/// Encode draws as one-hot presence/absence rows, one row per draw in
/// input order. Column j corresponds to number `min_number + j`.
/// Pure and deterministic: the same draws always produce the same matrix.
pub fn encode(draws: &[Draw], rules: &DrawRules) -> Array2<f64> {
    let mut data = Array::zeros((0, rules.pool_size()));

    for draw in draws {
        let row = one_hot(draw, rules);
        data.push_row(ArrayView::from(&row)).unwrap();
    }

    data
}

fn one_hot(draw: &Draw, rules: &DrawRules) -> Vec<f64> {
    let mut row = vec![0f64; rules.pool_size()];

    for &n in draw.numbers() {
        row[(n - rules.min_number) as usize] = 1f64;
    }

    row
}

/// Pair consecutive feature rows into a supervised dataset: row i is the
/// input, row i+1 (normalized to sum 1, so it is a probability
/// distribution) is the target. N feature rows yield N-1 training rows.
pub fn training_set(features: &Array2<f64>) -> Dataset {
    let width = features.ncols();
    let mut data = Array::zeros((0, width));
    let mut target = Array::zeros((0, width));

    for i in 0..features.nrows().saturating_sub(1) {
        let next = features.index_axis(Axis(0), i + 1);
        let total: f64 = next.sum();
        let distribution = next.map(|x| x / total);

        data.push_row(features.index_axis(Axis(0), i)).unwrap();
        target.push_row(distribution.view()).unwrap();
    }

    Dataset { data, target }
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

    fn draws() -> Vec<Draw> {
        vec![
            Draw::validated(1, "a".to_string(), vec![1, 3], &rules()).unwrap(),
            Draw::validated(2, "b".to_string(), vec![2, 5], &rules()).unwrap(),
            Draw::validated(3, "c".to_string(), vec![4, 5], &rules()).unwrap(),
        ]
    }

    #[test]
    fn test_encode_one_hot_rows() {
        let features = encode(&draws(), &rules());

        assert_eq!(features.nrows(), 3);
        assert_eq!(features.row(0).to_vec(), vec![1.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(features.row(1).to_vec(), vec![0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = encode(&draws(), &rules());
        let b = encode(&draws(), &rules());
        assert_eq!(a, b);
    }

    #[test]
    fn test_training_set_shifts_by_one() {
        let features = encode(&draws(), &rules());
        let dataset = training_set(&features);

        assert_eq!(dataset.data.nrows(), 2);
        assert_eq!(dataset.data.row(0), features.row(0));
        // Target rows are distributions over the next draw's numbers
        assert_eq!(dataset.target.row(0).to_vec(), vec![0.0, 0.5, 0.0, 0.0, 0.5]);
        assert!((dataset.target.row(1).sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_training_set_of_empty_features_is_empty() {
        let features = encode(&[], &rules());
        let dataset = training_set(&features);
        assert_eq!(dataset.data.nrows(), 0);
    }
}
