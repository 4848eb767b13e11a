//! Sample SDSD trees from a YAML model config and write them, with the
//! run's inputs echoed, as a YAML document on stdout.

// Traits
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;

// Structs
use rand_pcg::Pcg64;
use std::path::PathBuf;

// Functions
use log::warn;
use std::process;

use sdsdsim::config::{SimConfig, SimOutput, TreeSample};
use sdsdsim::errors::ConfigError;
use sdsdsim::model::sim_sdsd_tree;
use sdsdsim::sampling;

#[derive(Debug, Parser)]
#[command(
    name = "sim_SDSD_trees",
    version,
    about = "Simulate state-dependent speciation and diversification trees"
)]
struct Cli {
    /// Path to SDSD model config file.
    #[arg(value_name = "PATH-TO-CONFIG-FILE")]
    config_path: PathBuf,

    /// Number of trees to sample.
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    number_of_samples: u64,

    /// Seed for random number generator.
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("ERROR: {}", error);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ConfigError> {
    let seed = cli
        .seed
        .unwrap_or_else(|| sampling::safe_seed(&mut rand::thread_rng()));
    let mut rng = Pcg64::seed_from_u64(seed);

    let config = SimConfig::from_path(&cli.config_path)?;
    let model = config.model.build()?;
    let conditions = config.settings.stopping_conditions;
    let keep_extinct_trees = config.settings.keep_extinct_trees;
    let prune_extinct_leaves = config.settings.prune_extinct_leaves;
    let max_leaves_strict = config.settings.max_leaves_strict;

    let mut samples: Vec<TreeSample> = Vec::with_capacity(cli.number_of_samples as usize);
    while samples.len() < cli.number_of_samples as usize {
        let result = sim_sdsd_tree(rng.gen(), &model, &conditions)?;
        if !result.survived && !keep_extinct_trees {
            continue;
        }
        let tree = result.tree;
        if max_leaves_strict && overshoots_a_threshold(&conditions, &tree) {
            continue;
        }
        let stored = if prune_extinct_leaves {
            match tree.prune_extinct_leaves() {
                Some(pruned) => pruned,
                None => {
                    warn!("replicate went fully extinct and cannot be pruned; discarding it");
                    continue;
                }
            }
        } else {
            tree
        };
        samples.push(TreeSample {
            tree: stored.as_newick_simmap_string(true),
            burst_times: result.burst_times,
        });
    }

    let output = SimOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        seed,
        model: config.model,
        settings: config.settings,
        trees: samples,
    };
    serde_yaml::to_writer(std::io::stdout().lock(), &output)?;
    Ok(())
}

/// Did the final shared event push a leaf count past its threshold?
fn overshoots_a_threshold(
    conditions: &sdsdsim::StoppingConditions,
    tree: &sdsdsim::Tree,
) -> bool {
    let root = tree.root();
    let checks = [
        (
            "max_total_leaves",
            conditions.max_total_leaves,
            tree.number_of_leaves(root),
        ),
        (
            "max_extant_leaves",
            conditions.max_extant_leaves,
            tree.number_of_extant_leaves(root),
        ),
        (
            "max_extinct_leaves",
            conditions.max_extinct_leaves,
            tree.number_of_extinct_leaves(root),
        ),
    ];
    for (name, threshold, found) in checks.iter() {
        if let Some(max) = threshold {
            if found > max {
                warn!(
                    "{} is {} and the final shared event resulted in {} leaves; \
                     discarding this replicate",
                    name, max, found
                );
                return true;
            }
        }
    }
    false
}
