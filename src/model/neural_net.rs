use std::fs::File;
use std::path::Path;

use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Model, MlpConfig};
use crate::error::LottoError;
use crate::features::Dataset;

/// A multi-layer perceptron over the number pool: inputs and outputs are
/// both pool-width vectors, hidden layers come from the config.
#[derive(Debug)]
pub struct NeuralNet {
    pub layers: Vec<(Array2<f64>, Array1<f64>)>, // Each layer holds a weight matrix and a bias vector
    pub num_epochs: usize,                       // Training hyperparams
    pub batch_size: usize,
    pub learning_rate: f64,
    pub activation_function: ActivationFunction,
}

#[derive(clap::ValueEnum, Clone, Debug, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Sigmoid,
    Tanh,
    LeakyReLU,
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum InitMethod {
    Default,
    Xavier,
}

#[derive(Serialize, Deserialize)]
struct StoredLayer {
    rows: usize,
    cols: usize,
    weights: Vec<f64>,
    bias: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct StoredModel {
    activation: ActivationFunction,
    layers: Vec<StoredLayer>,
}

impl NeuralNet {
    /// Construct a new network with the given layer structure. A fixed
    /// seed in the config makes the initial weights reproducible.
    pub fn new(layer_structure: Vec<usize>, config: &MlpConfig) -> NeuralNet {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let layers = match config.init {
            InitMethod::Default => init_layers_default(&layer_structure, &mut rng),
            InitMethod::Xavier => init_layers_xavier(&layer_structure, &mut rng),
        };

        NeuralNet {
            layers,
            num_epochs: config.num_epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            activation_function: config.activation.clone(),
        }
    }

    // Perform a forward pass of the network on some input.
    // Returns the outputs of the hidden layers, and the non-activated outputs of the hidden layers (used for backprop)
    fn forward(&self, inputs: &ArrayView2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut hidden = vec![];
        let mut hidden_linear = vec![];
        // The first layer is a passthrough layer, so it outputs whatever its input is
        hidden.push(inputs.to_owned());

        let mut it = self.layers.iter().peekable();

        while let Some(layer) = it.next() {
            // The output of the layer without applying the activation function
            let lin_output = hidden.last().unwrap().dot(&layer.0) + &layer.1;
            // Hidden layers get the activation function; the output layer
            // stays linear and is normalized by softmax later
            let real_output = lin_output.map(|x| match it.peek() {
                Some(_) => activation(&self.activation_function, *x),
                None => *x,
            });

            hidden.push(real_output);
            hidden_linear.push(lin_output);
        }

        (hidden, hidden_linear)
    }

    /// Calculate the gradients using backprop and perform a GD step
    fn backward_and_update(
        &mut self,
        hidden: Vec<Array2<f64>>,
        hidden_linear: Vec<Array2<f64>>,
        grad: Array2<f64>,
    ) {
        // The gradient WRT the current layer
        let mut grad_help = grad;

        for idx in (0..self.layers.len()).rev() {
            // If we aren't at the last layer, we need to change the gradient
            if idx != self.layers.len() - 1 {
                let step_mat =
                    hidden_linear[idx].map(|x| delta_activation(&self.activation_function, *x));
                grad_help = grad_help * step_mat;
            }

            // Gradient WRT the weights in the current layer
            let weight_grad = hidden[idx].t().dot(&grad_help);
            // Gradient WRT the biases in the current layer
            let bias_grad = &grad_help.mean_axis(Axis(0)).unwrap();

            // Perform GD step
            let new_weights = &self.layers[idx].0 - self.learning_rate * weight_grad;
            let new_biases = &self.layers[idx].1 - self.learning_rate * bias_grad;

            // Update the helper variable
            grad_help = grad_help.dot(&self.layers[idx].0.t());

            self.layers[idx] = (new_weights, new_biases);
        }
    }

    fn softmax_scores(&self, scores: &Array2<f64>) -> Array2<f64> {
        let mut predictions = Array::zeros((0, scores.ncols()));

        for row in scores.axis_iter(Axis(0)) {
            predictions.push_row(softmax(row).view()).unwrap();
        }

        predictions
    }

    /// Serialize the trained weights to JSON. Persistence is an explicit
    /// boundary step; nothing holds a model between invocations.
    pub fn save(&self, path: &Path) -> Result<(), LottoError> {
        let stored = StoredModel {
            activation: self.activation_function.clone(),
            layers: self
                .layers
                .iter()
                .map(|(w, b)| StoredLayer {
                    rows: w.nrows(),
                    cols: w.ncols(),
                    weights: w.iter().copied().collect(),
                    bias: b.to_vec(),
                })
                .collect(),
        };

        let file = File::create(path)?;
        serde_json::to_writer(file, &stored).map_err(|e| LottoError::Storage {
            reason: e.to_string(),
        })
    }

    /// Load weights saved by [`NeuralNet::save`]. Hyperparameters revert to
    /// the given config; only the weights and activation travel.
    pub fn load(path: &Path, config: &MlpConfig) -> Result<NeuralNet, LottoError> {
        let file = File::open(path)?;
        let stored: StoredModel =
            serde_json::from_reader(file).map_err(|e| LottoError::Storage {
                reason: e.to_string(),
            })?;

        let mut layers = vec![];
        for layer in stored.layers {
            let weights = Array2::from_shape_vec((layer.rows, layer.cols), layer.weights)
                .map_err(|e| LottoError::Storage {
                    reason: e.to_string(),
                })?;
            layers.push((weights, Array1::from_vec(layer.bias)));
        }

        Ok(NeuralNet {
            layers,
            num_epochs: config.num_epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            activation_function: stored.activation,
        })
    }
}

impl Model for NeuralNet {
    /// Fit the model to the dataset.
    /// Returns the training loss per epoch.
    fn fit(&mut self, dataset: &Dataset) -> Vec<(usize, f64)> {
        let mut losses = vec![];

        for num_epoch in 0..self.num_epochs {
            // Get a batch of instances and their targets
            for (input_batch, target_batch) in dataset
                .data
                .axis_chunks_iter(Axis(0), self.batch_size)
                .zip(dataset.target.axis_chunks_iter(Axis(0), self.batch_size))
            {
                let (hidden, hidden_linear) = self.forward(&input_batch);

                let predictions = self.softmax_scores(hidden.last().unwrap());

                // Gradient is initialized to the gradient of the loss WRT the output layer
                let grad = predictions - target_batch;

                self.backward_and_update(hidden, hidden_linear, grad);
            }

            let loss = cross_entropy(&self.predict(&dataset.data.view()), dataset.target.view());
            debug!(epoch = num_epoch, loss, "epoch finished");
            losses.push((num_epoch, loss));
        }

        losses
    }

    /// Predict a probability distribution over the number pool for each
    /// input row.
    fn predict(&self, inputs: &ArrayView2<f64>) -> Array2<f64> {
        let (hidden, _) = self.forward(inputs);

        self.softmax_scores(hidden.last().unwrap())
    }
}

fn activation(name: &ActivationFunction, z: f64) -> f64 {
    match name {
        ActivationFunction::ReLU => z.max(0f64),
        ActivationFunction::Sigmoid => (1f64 + (-z).exp()).recip(),
        ActivationFunction::Tanh => (z.exp() - (-z).exp()) / (z.exp() + (-z).exp()),
        ActivationFunction::LeakyReLU => z.max(0.01 * z),
    }
}

fn delta_activation(name: &ActivationFunction, z: f64) -> f64 {
    match name {
        ActivationFunction::ReLU => {
            if z > 0f64 {
                1f64
            } else {
                0f64
            }
        }
        ActivationFunction::Sigmoid => activation(name, z) * (1f64 - activation(name, z)),
        ActivationFunction::Tanh => 1f64 - activation(name, z) * activation(name, z),
        ActivationFunction::LeakyReLU => {
            if z > 0f64 {
                1f64
            } else {
                0.01f64
            }
        }
    }
}

fn init_layers_default(
    layer_structure: &[usize],
    rng: &mut StdRng,
) -> Vec<(Array2<f64>, Array1<f64>)> {
    let mut layers = vec![];
    // Weights are initialized from a uniform distribiution
    let distribution = Uniform::new(-0.3, 0.3);

    for i in 0..layer_structure.len() - 1 {
        // Random matrix of the weights between this layer and the next layer
        let weights = Array::zeros((layer_structure[i], layer_structure[i + 1]))
            .map(|_: &f64| distribution.sample(rng));
        // Bias vector between this layer and the next layer. Init'd to ones
        let bias = Array::ones(layer_structure[i + 1]);

        layers.push((weights, bias));
    }

    layers
}

fn init_layers_xavier(
    layer_structure: &[usize],
    rng: &mut StdRng,
) -> Vec<(Array2<f64>, Array1<f64>)> {
    let mut layers = vec![];

    for i in 0..layer_structure.len() - 1 {
        let boundary = 6f64.sqrt() / (layer_structure[i] + layer_structure[i + 1]) as f64;
        let dist = Uniform::new(-boundary, boundary);

        let weights = Array::zeros((layer_structure[i], layer_structure[i + 1]))
            .map(|_: &f64| dist.sample(rng));
        let bias = Array::zeros(layer_structure[i + 1]);

        layers.push((weights, bias));
    }

    layers
}

/// Softmax function - Convert scores into a probability distribution
fn softmax(scores: ArrayView1<f64>) -> Array1<f64> {
    let max = scores.iter().max_by(|x, y| x.total_cmp(y)).unwrap();
    // We use a numerical trick where we shift the elements by the max, because otherwise
    // We would have to compute the exp of very large values which wraps to NaN
    let shift_scores = scores.map(|x| x - max);
    let sum: f64 = shift_scores.iter().map(|x| x.exp()).sum();

    (0..scores.len())
        .map(|x| shift_scores[x].exp() / sum)
        .collect()
}

/// Calculate the cross-entropy loss on a given batch
fn cross_entropy(predictions: &Array2<f64>, target: ArrayView2<f64>) -> f64 {
    let total: f64 = predictions
        .axis_iter(Axis(0))
        .zip(target.axis_iter(Axis(0)))
        .map(|(actual_row, target_row)| target_row.dot(&actual_row.map(|x| x.log2())))
        .sum();

    -1f64 * (1f64 / predictions.nrows() as f64) * total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![4],
            num_epochs: 50,
            batch_size: 2,
            seed: Some(42),
            min_training_rows: 2,
            ..MlpConfig::default()
        }
    }

    #[test]
    fn test_predict_rows_are_distributions() {
        let net = NeuralNet::new(vec![3, 4, 3], &config());
        let inputs = array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];

        let out = net.predict(&inputs.view());
        assert_eq!(out.dim(), (2, 3));
        for row in out.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut net = NeuralNet::new(vec![2, 4, 2], &config());
        let dataset = Dataset {
            data: array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]],
            target: array![[0.0, 1.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]],
        };

        let losses = net.fit(&dataset);
        assert_eq!(losses.len(), 50);
        assert!(losses.last().unwrap().1 < losses.first().unwrap().1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let net = NeuralNet::new(vec![3, 4, 3], &config());
        let inputs = array![[1.0, 1.0, 0.0]];

        let mut path = std::env::temp_dir();
        path.push(format!("lotomlp_weights_{}.json", std::process::id()));

        net.save(&path).unwrap();
        let restored = NeuralNet::load(&path, &config()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(net.predict(&inputs.view()), restored.predict(&inputs.view()));
    }

    #[test]
    fn test_softmax_handles_large_scores() {
        let scores = array![1000.0, 1001.0, 999.0];
        let out = softmax(scores.view());

        assert!((out.sum() - 1.0).abs() < 1e-9);
        assert!(out.iter().all(|p| p.is_finite()));
    }
}
