use ndarray::{Array2, ArrayView2, Axis};
use tracing::{debug, info};

use crate::draws::{Draw, DrawRules, Prediction};
use crate::error::LottoError;
use crate::features::Dataset;

pub mod neural_net;

use neural_net::{ActivationFunction, InitMethod, NeuralNet};

pub trait Model {
    fn fit(&mut self, dataset: &Dataset) -> Vec<(usize, f64)>;
    fn predict(&self, inputs: &ArrayView2<f64>) -> Array2<f64>;
}

/// Training configuration. Architecture and hyperparameters are
/// deliberately configuration, not constants: nothing about the lottery
/// pins down a "right" network.
#[derive(Debug, Clone)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub num_epochs: usize,
    pub batch_size: usize,
    pub activation: ActivationFunction,
    pub init: InitMethod,
    pub seed: Option<u64>,
    pub min_training_rows: usize,
}

impl Default for MlpConfig {
    fn default() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![64],
            learning_rate: 0.05,
            num_epochs: 200,
            batch_size: 16,
            activation: ActivationFunction::Sigmoid,
            init: InitMethod::Xavier,
            seed: None,
            min_training_rows: 10,
        }
    }
}

/// Fit a fresh network on the dataset.
///
/// Fails with `InsufficientData` before any weights are touched when the
/// dataset is below the configured row minimum; there is no partial fit.
///
/// Disclaimer: lottery draws are independent random events. The network
/// learns whatever regularities the history happens to contain, which is
/// no more than chance; nothing here improves actual winning odds.
pub fn train(dataset: &Dataset, config: &MlpConfig) -> Result<NeuralNet, LottoError> {
    let available = dataset.data.nrows();
    if available < config.min_training_rows {
        return Err(LottoError::InsufficientData {
            available,
            required: config.min_training_rows,
        });
    }

    let width = dataset.data.ncols();
    let mut structure = vec![width];
    structure.extend_from_slice(&config.hidden_layers);
    structure.push(width);

    let mut net = NeuralNet::new(structure, config);
    let losses = net.fit(dataset);

    if let Some((epoch, loss)) = losses.last() {
        info!(rows = available, epoch, loss, "training finished");
    }

    Ok(net)
}

/// Rank every possible number by the network's mean output score over the
/// given feature rows, highest first, ties broken by ascending number.
pub fn rank_numbers(net: &NeuralNet, features: &Array2<f64>, rules: &DrawRules) -> Vec<u8> {
    let scores = net
        .predict(&features.view())
        .mean_axis(Axis(0))
        .unwrap_or_else(|| ndarray::Array1::zeros(rules.pool_size()));

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    order
        .into_iter()
        .map(|idx| rules.min_number + idx as u8)
        .collect()
}

/// Produce `count` candidate combinations from a trained network.
///
/// Deterministic: combination j keeps the fixed top block of the ranking
/// and completes it with the j-th next-ranked number, so every combination
/// is distinct and ties never depend on RNG state.
pub fn combinations(
    net: &NeuralNet,
    features: &Array2<f64>,
    rules: &DrawRules,
    count: usize,
    history: &[Draw],
) -> Vec<Prediction> {
    if features.nrows() == 0 {
        return vec![];
    }

    let ranked = rank_numbers(net, features, rules);
    let fixed = rules.numbers_per_draw - 1;
    // Only pool_size - fixed distinct completions exist
    let available = ranked.len() - fixed;
    if count > available {
        debug!(count, available, "capping combination count to the pool");
    }

    (0..count.min(available))
        .map(|j| {
            let mut numbers: Vec<u8> = ranked[..fixed].to_vec();
            numbers.push(ranked[fixed + j]);
            Prediction::new(numbers, history)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{encode, training_set};

    fn rules() -> DrawRules {
        DrawRules {
            min_number: 1,
            max_number: 10,
            numbers_per_draw: 4,
        }
    }

    fn config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![8],
            num_epochs: 30,
            batch_size: 4,
            seed: Some(7),
            min_training_rows: 5,
            ..MlpConfig::default()
        }
    }

    fn history() -> Vec<Draw> {
        (0..12u32)
            .map(|i| {
                let base = (i % 6) as u8;
                Draw::validated(
                    i,
                    format!("{}/01/2025", i + 1),
                    vec![base + 1, base + 2, base + 3, base + 4],
                    &rules(),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_train_below_minimum_fails() {
        let draws = &history()[..4];
        let dataset = training_set(&encode(draws, &rules()));

        let err = train(&dataset, &config()).unwrap_err();
        assert!(matches!(
            err,
            LottoError::InsufficientData {
                available: 3,
                required: 5
            }
        ));
    }

    #[test]
    fn test_combinations_are_distinct_and_valid() {
        let draws = history();
        let features = encode(&draws, &rules());
        let dataset = training_set(&features);
        let net = train(&dataset, &config()).unwrap();

        let predictions = combinations(&net, &features, &rules(), 3, &draws);
        assert_eq!(predictions.len(), 3);

        for p in &predictions {
            assert_eq!(p.numbers.len(), 4);
            assert!(p.numbers.windows(2).all(|w| w[0] < w[1]));
            assert!(p.numbers.iter().all(|&n| rules().contains(n)));
        }

        assert_ne!(predictions[0].numbers, predictions[1].numbers);
        assert_ne!(predictions[1].numbers, predictions[2].numbers);
    }

    #[test]
    fn test_combination_count_is_capped_by_pool() {
        let draws = history();
        let features = encode(&draws, &rules());
        let net = train(&training_set(&features), &config()).unwrap();

        // 10 numbers, 3 fixed -> at most 7 completions
        let predictions = combinations(&net, &features, &rules(), 50, &draws);
        assert_eq!(predictions.len(), 7);
    }

    #[test]
    fn test_ranking_is_deterministic_for_fixed_seed() {
        let draws = history();
        let features = encode(&draws, &rules());

        let a = train(&training_set(&features), &config()).unwrap();
        let b = train(&training_set(&features), &config()).unwrap();

        assert_eq!(
            rank_numbers(&a, &features, &rules()),
            rank_numbers(&b, &features, &rules())
        );
    }
}
