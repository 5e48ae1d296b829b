use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lotomlp::config::Settings;
use lotomlp::draws::{Draw, DrawRules};
use lotomlp::model::neural_net::{ActivationFunction, InitMethod};
use lotomlp::model::MlpConfig;
use lotomlp::storage::csv_store::CsvStore;
use lotomlp::storage::redis_store::RedisStore;
use lotomlp::storage::DrawStore;
use lotomlp::{features, fetch, model, stats};

#[derive(clap::ValueEnum, Clone, Debug)]
enum StorageKind {
    Csv,
    Redis,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Fetch the draw history from the results API before anything else
    #[arg(short, long)]
    fetch: bool,

    /// Train the network and print candidate combinations
    /// Without this flag, number occurrences are printed instead
    #[arg(short, long)]
    predict: bool,

    /// Storage backend holding the draw history
    #[arg(short, long, value_enum, default_value = "csv")]
    storage: StorageKind,

    /// How many candidate combinations to produce
    #[arg(short, long)]
    count: Option<usize>,

    /// Hidden layer sizes, e.g. 64 32
    #[arg(long, value_parser, num_args = 1.., value_delimiter = ' ', default_values_t = [64usize])]
    hidden_layers: Vec<usize>,

    /// Learning rate of the network
    #[arg(short, long, default_value_t = 0.05)]
    learning_rate: f64,

    /// Number of epochs to train the network for
    #[arg(short, long, default_value_t = 200)]
    num_epochs: usize,

    /// Batch size of the network
    #[arg(short, long, default_value_t = 16)]
    batch_size: usize,

    /// Activation function used by the network
    #[arg(short, long, value_enum, default_value = "sigmoid")]
    activation_function: ActivationFunction,

    /// Weight initialization method
    #[arg(short, long, value_enum, default_value = "xavier")]
    initialization: InitMethod,

    /// RNG seed for reproducible training
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum number of training rows required before fitting
    #[arg(long, default_value_t = 10)]
    min_rows: usize,

    /// Whether or not to export the model's weights
    /// Weights are exported in JSON format
    #[arg(short, long)]
    weight_path: Option<String>,
}

fn open_store(kind: &StorageKind, settings: &Settings) -> Result<Box<dyn DrawStore>> {
    match kind {
        StorageKind::Csv => Ok(Box::new(CsvStore::new(
            settings.csv_path.clone(),
            settings.rules,
        ))),
        StorageKind::Redis => Ok(Box::new(RedisStore::connect(
            &settings.redis_url,
            settings.redis_key.clone(),
            settings.rules,
        )?)),
    }
}

/// Fetch the latest history and append the draws the store does not have
/// yet. Stored draws are never rewritten.
fn fetch_and_store(store: &mut dyn DrawStore, settings: &Settings) -> Result<()> {
    let outcome = fetch::fetch_latest(&settings.api_endpoint, &settings.rules)?;
    let existing: HashSet<u32> = store.load_all()?.iter().map(Draw::id).collect();

    let mut appended = 0;
    for draw in &outcome.draws {
        if !existing.contains(&draw.id()) {
            store.append(draw)?;
            appended += 1;
        }
    }

    info!(appended, skipped = outcome.skipped, "draw history updated");

    Ok(())
}

fn run_predictions(args: &Args, settings: &Settings, draws: &[Draw]) -> Result<()> {
    let mlp_config = MlpConfig {
        hidden_layers: args.hidden_layers.clone(),
        learning_rate: args.learning_rate,
        num_epochs: args.num_epochs,
        batch_size: args.batch_size,
        activation: args.activation_function.clone(),
        init: args.initialization.clone(),
        seed: args.seed,
        min_training_rows: args.min_rows,
    };

    let features = features::encode(draws, &settings.rules);
    let dataset = features::training_set(&features);
    let net = model::train(&dataset, &mlp_config)?;

    if let Some(weight_path) = &args.weight_path {
        net.save(Path::new(weight_path))?;
        info!(path = %weight_path, "exported model weights");
    }

    let count = args.count.unwrap_or(settings.prediction_count);
    let predictions = model::combinations(&net, &features, &settings.rules, count, draws);

    for (j, prediction) in predictions.iter().enumerate() {
        let numbers: Vec<String> = prediction.numbers.iter().map(|n| n.to_string()).collect();
        let note = if prediction.previously_drawn {
            " (already occurred)"
        } else {
            ""
        };

        println!("Combination {}: [{}]{}", j + 1, numbers.join(", "), note);
    }

    Ok(())
}

fn print_occurrences(draws: &[Draw], rules: &DrawRules) {
    let table = stats::analyze(draws, rules);
    let total = table.total();

    for (number, count) in table.by_frequency() {
        println!(
            "Number: {}, Occurrences: {}-{}, Percentage: {:.2}%",
            number,
            count,
            total,
            table.percentage(number)
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    let mut store = open_store(&args.storage, &settings)?;

    if args.fetch {
        fetch_and_store(store.as_mut(), &settings)?;
    }

    let draws = store.load_all()?;
    info!(draws = draws.len(), "loaded draw history");

    if args.predict {
        run_predictions(&args, &settings, &draws)?;
    } else {
        print_occurrences(&draws, &settings.rules);
    }

    Ok(())
}
