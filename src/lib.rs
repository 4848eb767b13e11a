//! Forward-time simulation of phylogenetic trees under state-dependent
//! speciation and diversification (SDSD) with tree-wide burst events.
//!
//! # Goal
//!
//! Serve as an extension of the [rand crate](https://crates.io/crates/rand)
//! for simulating time-calibrated trees whose birth, death, and
//! character-transition rates all depend on an evolving discrete state,
//! with mass-diversification "bursts" superimposed on the whole tree.
//!
//! Every replicate yields the rooted tree (each branch carrying its
//! piecewise-constant state history), the times at which bursts fired, and
//! whether the population survived.
//!
//! # Examples
//!
//! ## Simulating a replicate
//!
//! ```
//! use sdsdsim::{sim_sdsd_tree, SdsdModel, StoppingConditions};
//!
//! let model = SdsdModel::default();
//! let conditions = StoppingConditions {
//!     max_extant_leaves: Some(10),
//!     ..Default::default()
//! };
//! let result = sim_sdsd_tree(4, &model, &conditions).unwrap();
//! if result.survived {
//!     assert!(result.tree.number_of_extant_leaves(result.tree.root()) >= 10);
//! }
//! println!("{}", result.tree.as_newick_simmap_string(true));
//! ```
//!
//! ## Pruning extinct lineages
//!
//! ```
//! use sdsdsim::{sim_sdsd_tree, SdsdModel, StoppingConditions};
//!
//! let conditions = StoppingConditions {
//!     max_total_leaves: Some(20),
//!     ..Default::default()
//! };
//! let result = sim_sdsd_tree(11, &SdsdModel::default(), &conditions).unwrap();
//! if result.survived {
//!     let pruned = result.tree.prune_extinct_leaves().unwrap();
//!     assert_eq!(pruned.number_of_extinct_leaves(pruned.root()), 0);
//! }
//! ```
//!
//! ## The character chain on its own
//!
//! ```
//! use sdsdsim::Ctmc;
//!
//! let ctmc = Ctmc::new(vec![vec![-1.0, 1.0], vec![2.0, -2.0]]).unwrap();
//! let probs = ctmc.steady_state_probs().unwrap();
//! assert!((probs[0] - 2.0 / 3.0).abs() < 1e-9);
//! ```
//!
//! # Remarks
//!
//! The core takes the caller's RNG by `&mut` everywhere; for a fixed seed,
//! model, and stopping configuration a replicate is reproduced bit for
//! bit.

pub use crate::ctmc::Ctmc;
pub use crate::model::{
    sim_sdsd_tree, sim_sdsd_tree_with_rng, SdsdModel, SimResult, StoppingConditions,
};
pub use crate::node::{Node, NodeId, Tree};

/// Config and output documents for the `sim_SDSD_trees` front end.
pub mod config;
pub mod ctmc;
/// Errors of this crate.
pub mod errors;
pub mod model;
pub mod node;
/// Tolerant float comparison.
pub mod numeric;
/// Seeded draws shared by the simulators.
pub mod sampling;
