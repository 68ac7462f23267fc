//! Command-line front end: create, train, test and manage saved digit networks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use digit_mlp::digits::{NUM_CLASSES, PIXELS_PER_IMAGE};
use digit_mlp::{ActivationFunction, DigitSet, Network, SaveDir, Shuffle, Split, TrainConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "digit-mlp")]
#[command(about = "Train and test feedforward networks on handwritten digits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the digit picture and answer files
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Directory holding saved networks
    #[arg(long, global = true, default_value = "saves")]
    save_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a randomly initialized network (784 inputs, 10 outputs)
    Create {
        name: String,

        /// Hidden layer sizes, e.g. 30 or 64,32
        #[arg(long, value_delimiter = ',', default_value = "30")]
        hidden: Vec<usize>,

        /// Activation per non-input layer, by name or code; a single value is
        /// used for every layer
        #[arg(long, value_delimiter = ',', default_value = "sigmoid")]
        activations: Vec<ActivationFunction>,

        /// Seed for reproducible initialization
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Train a saved network on the training split and save it back
    Train {
        name: String,

        #[arg(long, default_value_t = 30)]
        epochs: usize,

        #[arg(long, default_value_t = 20)]
        batch_size: usize,

        #[arg(long, default_value_t = 3.0)]
        learning_rate: f64,

        /// Seed for the per-epoch shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Only use the first N training images
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Measure accuracy on the test split
    Test {
        name: String,

        /// Only use the first N test images
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a saved network's architecture
    Info { name: String },

    /// Print every weight and bias of a saved network
    Dump {
        name: String,

        /// Print the JSON model instead of the text dump
        #[cfg(feature = "serde")]
        #[arg(long)]
        json: bool,
    },

    /// List saved networks
    List,

    /// Delete a saved network
    Delete { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let saves = SaveDir::open(&cli.save_dir)
        .with_context(|| format!("failed to open save directory {}", cli.save_dir.display()))?;

    match cli.command {
        Commands::Create {
            name,
            hidden,
            activations,
            seed,
        } => {
            if saves.find(&name)?.is_some() {
                bail!("a network named {name:?} already exists");
            }

            let mut layer_sizes = Vec::with_capacity(hidden.len() + 2);
            layer_sizes.push(PIXELS_PER_IMAGE);
            layer_sizes.extend_from_slice(&hidden);
            layer_sizes.push(NUM_CLASSES);

            let functions = match activations.as_slice() {
                [single] => vec![*single; layer_sizes.len() - 1],
                many => many.to_vec(),
            };
            let network = match seed {
                Some(seed) => Network::new_with_seed(&layer_sizes, &functions, seed)?,
                None => Network::new_with_rng(&layer_sizes, &functions, &mut rand::thread_rng())?,
            };

            let path = saves.save(&network, &name)?;
            info!(%name, ?layer_sizes, path = %path.display(), "created network");
        }

        Commands::Train {
            name,
            epochs,
            batch_size,
            learning_rate,
            seed,
            limit,
        } => {
            let mut network = saves.load(&name)?;
            let data = load_split(&cli.data_dir, Split::Train, limit)?;
            let cfg = TrainConfig {
                epochs,
                batch_size,
                learning_rate,
                shuffle: seed.map_or(Shuffle::Random, Shuffle::Seeded),
            };

            let report = network.train(&data, &cfg)?;
            saves.save(&network, &name)?;
            if let Some(last) = report.epochs.last() {
                info!(%name, mean_error = last.mean_error, "training finished");
            }
        }

        Commands::Test { name, limit } => {
            let network = saves.load(&name)?;
            let data = load_split(&cli.data_dir, Split::Test, limit)?;
            let report = network.evaluate(&data)?;
            println!(
                "{}/{} correct ({:.2}%), mean squared error {:.5}",
                report.correct,
                report.total,
                report.accuracy * 100.0,
                report.mean_error
            );
        }

        Commands::Info { name } => {
            let network = saves.load(&name)?;
            println!("Name: {name}");
            for (i, (size, f)) in network
                .layer_sizes()
                .iter()
                .zip(network.activation_functions())
                .enumerate()
            {
                println!("Layer {i}: {size} neurons, {f}");
            }
        }

        #[cfg(feature = "serde")]
        Commands::Dump { name, json } => {
            let network = saves.load(&name)?;
            if json {
                println!("{}", network.to_json_string_pretty()?);
            } else {
                print!("{network}");
            }
        }
        #[cfg(not(feature = "serde"))]
        Commands::Dump { name } => {
            let network = saves.load(&name)?;
            print!("{network}");
        }

        Commands::List => {
            let names = saves.names()?;
            if names.is_empty() {
                println!("No saved networks in {}", saves.root().display());
            }
            for name in names {
                println!("{name}");
            }
        }

        Commands::Delete { name } => {
            if !saves.delete(&name)? {
                bail!("no saved network named {name:?}");
            }
            info!(%name, "deleted network");
        }
    }

    Ok(())
}

fn load_split(dir: &Path, split: Split, limit: Option<usize>) -> Result<DigitSet> {
    let len = limit.map_or(split.image_count(), |n| n.min(split.image_count()));
    DigitSet::load_first(dir, split, len)
        .with_context(|| format!("failed to load {split:?} digits from {}", dir.display()))
}
