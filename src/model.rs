//! State-dependent speciation and diversification with tree-wide bursts.

// Traits
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

// Structs
use rand_pcg::Pcg64;

use crate::ctmc::Ctmc;
use crate::errors::{ModelError, SimError};
use crate::node::{Node, NodeId, Tree};
use crate::sampling;

/// A vetted SDSD parameterization.
///
/// Every per-state vector is checked against the rate matrix's dimension
/// at construction; rates must be non-negative and burst probabilities
/// must lie in `[0, 1]`.
///
/// # Remarks
///
/// Under `only_bifurcate` a diverging burst lineage always yields exactly
/// two children and the furcation Poisson parameters are ignored (no draw
/// is consumed). Such a lineage is still marked `is_burst_node`; trees
/// without burst nodes additionally require `burst_rate` to be zero, so
/// the tree-wide clock never fires.
#[derive(Clone, Debug, PartialEq)]
pub struct SdsdModel {
    pub ctmc: Ctmc,
    pub birth_rates: Vec<f64>,
    pub death_rates: Vec<f64>,
    pub burst_rate: f64,
    pub burst_probs: Vec<f64>,
    pub burst_furcation_poisson_means: Vec<f64>,
    pub burst_furcation_poisson_shifts: Vec<u64>,
    pub only_bifurcate: bool,
}

impl SdsdModel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        q: Vec<Vec<f64>>,
        birth_rates: Vec<f64>,
        death_rates: Vec<f64>,
        burst_rate: f64,
        burst_probs: Vec<f64>,
        burst_furcation_poisson_means: Vec<f64>,
        burst_furcation_poisson_shifts: Vec<u64>,
        only_bifurcate: bool,
    ) -> Result<Self, ModelError> {
        let ctmc = Ctmc::new(q)?;
        let n_states = ctmc.n_states();
        let vet_len = |field: &'static str, found: usize| -> Result<(), ModelError> {
            if found != n_states {
                return Err(ModelError::LengthMismatch {
                    field,
                    found,
                    expected: n_states,
                });
            }
            Ok(())
        };
        vet_len("birth rates", birth_rates.len())?;
        vet_len("death rates", death_rates.len())?;
        vet_len("burst probabilities", burst_probs.len())?;
        vet_len(
            "burst furcation poisson means",
            burst_furcation_poisson_means.len(),
        )?;
        vet_len(
            "burst furcation poisson shifts",
            burst_furcation_poisson_shifts.len(),
        )?;
        let vet_rates = |field: &'static str, rates: &[f64]| -> Result<(), ModelError> {
            match rates.iter().position(|&r| r < 0.0) {
                Some(index) => Err(ModelError::NegativeRate {
                    field,
                    index,
                    value: rates[index],
                }),
                None => Ok(()),
            }
        };
        vet_rates("birth_rates", &birth_rates)?;
        vet_rates("death_rates", &death_rates)?;
        vet_rates(
            "burst_furcation_poisson_means",
            &burst_furcation_poisson_means,
        )?;
        if let Some(index) = burst_probs.iter().position(|&p| !(0.0..=1.0).contains(&p)) {
            return Err(ModelError::InvalidProbability {
                index,
                value: burst_probs[index],
            });
        }
        if burst_rate < 0.0 {
            return Err(ModelError::NegativeBurstRate { value: burst_rate });
        }
        Ok(SdsdModel {
            ctmc,
            birth_rates,
            death_rates,
            burst_rate,
            burst_probs,
            burst_furcation_poisson_means,
            burst_furcation_poisson_shifts,
            only_bifurcate,
        })
    }
}

impl Default for SdsdModel {
    /// Two symmetric states with mildly state-dependent burst behavior.
    fn default() -> Self {
        SdsdModel::new(
            vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, 1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 0.6],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap()
    }
}

/// Thresholds that end a replicate. At least one must be set; every set
/// value must be strictly positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoppingConditions {
    pub max_extant_leaves: Option<usize>,
    pub max_extinct_leaves: Option<usize>,
    pub max_total_leaves: Option<usize>,
    pub max_time: Option<f64>,
}

impl StoppingConditions {
    pub fn validate(&self) -> Result<(), SimError> {
        let mut any = false;
        let mut vet_count = |name: &'static str, value: Option<usize>| -> Result<(), SimError> {
            if let Some(value) = value {
                any = true;
                if value == 0 {
                    return Err(SimError::NonPositiveStoppingCondition {
                        name,
                        value: 0.0,
                    });
                }
            }
            Ok(())
        };
        vet_count("max_extant_leaves", self.max_extant_leaves)?;
        vet_count("max_extinct_leaves", self.max_extinct_leaves)?;
        vet_count("max_total_leaves", self.max_total_leaves)?;
        if let Some(max_time) = self.max_time {
            any = true;
            if max_time <= 0.0 {
                return Err(SimError::NonPositiveStoppingCondition {
                    name: "max_time",
                    value: max_time,
                });
            }
        }
        if !any {
            return Err(SimError::NoStoppingCondition);
        }
        Ok(())
    }
}

/// One finished replicate.
#[derive(Clone, Debug, PartialEq)]
pub struct SimResult {
    /// False when the extant population collapsed to zero.
    pub survived: bool,
    pub tree: Tree,
    /// Absolute times at which tree-wide bursts fired.
    pub burst_times: Vec<f64>,
}

/// Simulate one replicate from a seed.
///
/// Seeds a PCG generator and hands it to [`sim_sdsd_tree_with_rng`]; a
/// fixed seed, model, and stopping configuration reproduce the replicate
/// bit for bit.
pub fn sim_sdsd_tree(
    seed: u64,
    model: &SdsdModel,
    conditions: &StoppingConditions,
) -> Result<SimResult, SimError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    sim_sdsd_tree_with_rng(&mut rng, model, conditions)
}

/// Simulate one replicate, drawing from the caller's generator.
///
/// The root's state comes from the chain's steady-state distribution and
/// its branch is seeded at time zero. Each iteration races one exponential
/// clock per live lineage (birth + death + transition rates for its
/// current state) against one tree-wide burst clock; once a leaf-count
/// threshold is reached, diversification is frozen and the tree is
/// extended to the next would-be event before stopping.
pub fn sim_sdsd_tree_with_rng<R>(
    rng: &mut R,
    model: &SdsdModel,
    conditions: &StoppingConditions,
) -> Result<SimResult, SimError>
where
    R: Rng + ?Sized,
{
    conditions.validate()?;
    let mut clock = 0.0;
    let root_state = model.ctmc.draw_random_state(rng)?;
    let mut root = Node::new(root_state);
    root.label = Some("root".to_string());
    let mut tree = Tree::new(root);
    tree.set_seed_time(clock);
    let mut extant: Vec<NodeId> = vec![tree.root()];
    let mut extinct: Vec<NodeId> = Vec::new();
    let mut burst_times: Vec<f64> = Vec::new();
    let mut survived = true;

    loop {
        // A burst can push a leaf count past its threshold without ever
        // equaling it, so freezing tests "reached or exceeded".
        let final_extension = conditions
            .max_extant_leaves
            .map_or(false, |max| extant.len() >= max)
            || conditions
                .max_extinct_leaves
                .map_or(false, |max| extinct.len() >= max)
            || conditions
                .max_total_leaves
                .map_or(false, |max| extant.len() + extinct.len() >= max);

        let mut lineage_rates: Vec<(f64, f64, f64)> = Vec::with_capacity(extant.len());
        let mut total_rates: Vec<f64> = Vec::with_capacity(extant.len() + 1);
        for &id in &extant {
            let state = tree.leafward_state(id);
            let birth_rate = model.birth_rates[state];
            let death_rate = model.death_rates[state];
            let transition_rate = model.ctmc.rate_from(state);
            lineage_rates.push((birth_rate, death_rate, transition_rate));
            total_rates.push(birth_rate + death_rate + transition_rate);
        }
        // The last slot is the tree-wide burst clock.
        total_rates.push(model.burst_rate);

        // Race only the strictly positive clocks, but attribute the winner
        // in the original index space.
        let mut wait = f64::INFINITY;
        let mut winner = usize::MAX;
        for (index, &rate) in total_rates.iter().enumerate() {
            if rate <= 0.0 {
                continue;
            }
            let sample = sampling::exponential(rate, rng);
            if sample < wait {
                wait = sample;
                winner = index;
            }
        }
        debug_assert!(winner != usize::MAX, "no lineage had a positive rate");

        if let Some(max_time) = conditions.max_time {
            if clock + wait > max_time {
                clock = max_time;
                break;
            }
        }
        clock += wait;

        if winner == extant.len() {
            // Tree-wide burst.
            if final_extension {
                break;
            }
            burst_times.push(clock);
            // Children spawned during this burst must not diverge in it.
            let snapshot = extant.clone();
            for &id in &snapshot {
                let state = tree.leafward_state(id);
                let u: f64 = rng.gen();
                if u > model.burst_probs[state] {
                    continue;
                }
                let n_children = if model.only_bifurcate {
                    2
                } else {
                    sampling::poisson_rv(model.burst_furcation_poisson_means[state], rng)?
                        + model.burst_furcation_poisson_shifts[state]
                };
                debug_assert!(n_children > 0, "burst produced a zero furcation");
                if n_children > 1 {
                    tree.node_mut(id).time = Some(clock);
                    tree.node_mut(id).is_burst_node = true;
                    let position = extant
                        .iter()
                        .position(|&e| e == id)
                        .expect("burst lineage is not live");
                    extant.remove(position);
                    for _ in 0..n_children {
                        let child = tree.spawn_child(id, Node::new(state));
                        extant.push(child);
                    }
                }
            }
        } else {
            // Lineage-specific event.
            let id = extant[winner];
            let (birth_rate, death_rate, transition_rate) = lineage_rates[winner];
            let event =
                sampling::weighted_index(&[birth_rate, death_rate, transition_rate], rng);
            if event < 2 && final_extension {
                break;
            }
            match event {
                0 => {
                    let state = tree.leafward_state(id);
                    tree.node_mut(id).time = Some(clock);
                    extant.remove(winner);
                    for _ in 0..2 {
                        let child = tree.spawn_child(id, Node::new(state));
                        extant.push(child);
                    }
                }
                1 => {
                    tree.node_mut(id).time = Some(clock);
                    tree.node_mut(id).is_extinct = true;
                    extant.remove(winner);
                    extinct.push(id);
                    if extant.is_empty() {
                        survived = false;
                        break;
                    }
                }
                2 => {
                    let state = tree.leafward_state(id);
                    let new_state = model.ctmc.draw_transition(state, rng);
                    tree.transition_state(id, new_state, clock);
                }
                _ => unreachable!("unexpected event index: {}", event),
            }
        }
    }

    finalize(&mut tree, clock);
    log::debug!(
        "replicate done: clock={}, survived={}, extant={}, extinct={}, bursts={}",
        clock,
        survived,
        extant.len(),
        extinct.len(),
        burst_times.len()
    );
    Ok(SimResult {
        survived,
        tree,
        burst_times,
    })
}

/// Close out a finished replicate: live leaves end at the final clock and
/// every recorded state change gains its height above the present.
fn finalize(tree: &mut Tree, clock: f64) {
    let ids: Vec<NodeId> = tree.leafward_iter(tree.root()).collect();
    for id in ids {
        if tree.node(id).time.is_none() {
            debug_assert!(tree.is_leaf(id));
            debug_assert!(!tree.node(id).is_extinct);
            tree.node_mut(id).time = Some(clock);
        }
        let node = tree.node_mut(id);
        debug_assert!(node.state_change_heights.is_empty());
        node.state_change_heights = node.state_change_times.iter().map(|&t| clock - t).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CtmcError, DrawError};
    use crate::numeric::{is_zero, is_zero_within};

    fn expected_yule_tree_height(n_tips: usize, birth_rate: f64) -> f64 {
        (2..=n_tips).map(|i| 1.0 / (i as f64 * birth_rate)).sum()
    }

    fn expected_yule_tree_length(n_tips: usize, birth_rate: f64) -> f64 {
        (n_tips - 1) as f64 / birth_rate
    }

    fn assert_branch_invariants(tree: &Tree) {
        let root = tree.root();
        assert_eq!(tree.seed_time(), Some(0.0));
        for node in tree.leafward_iter(root) {
            if let Some(parent) = tree.parent(node) {
                let parent_time = tree.node(parent).time.unwrap();
                let node_time = tree.node(node).time.unwrap();
                assert!(parent_time < node_time);
                assert!(is_zero(
                    (tree.height(parent) - tree.height(node)) - (node_time - parent_time)
                ));
            }
            let history = tree.state_history(node);
            assert_eq!(history[0].0, tree.node(node).rootward_state);
            assert_eq!(history[history.len() - 1].0, tree.leafward_state(node));
            let duration: f64 = history.iter().map(|&(_, d)| d).sum();
            assert!(is_zero(tree.branch_length(node) - duration));
        }
        assert_eq!(
            tree.number_of_leaves(root),
            tree.number_of_extant_leaves(root) + tree.number_of_extinct_leaves(root)
        );
    }

    #[test]
    fn yule_regression() {
        let model = SdsdModel::new(
            vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            0.0,
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2, 2],
            true,
        )
        .unwrap();
        let max_extant_leaves = 50;
        let conditions = StoppingConditions {
            max_extant_leaves: Some(max_extant_leaves),
            ..Default::default()
        };

        let n = 2000;
        let expected_height = expected_yule_tree_height(max_extant_leaves, 1.0);
        let expected_length = expected_yule_tree_length(max_extant_leaves, 1.0);
        let mut total_height = 0.0;
        let mut total_length = 0.0;
        for seed in 0..n {
            let result = sim_sdsd_tree(seed, &model, &conditions).unwrap();
            assert!(result.survived);
            assert!(result.burst_times.is_empty());
            let tree = &result.tree;
            let root = tree.root();
            total_height += tree.height(root);
            total_length += tree.tree_length(root);
            assert_eq!(tree.number_of_leaves(root), max_extant_leaves);
            for node in tree.leafward_iter(root) {
                assert!(!tree.node(node).is_burst_node);
                assert!(!tree.node(node).is_extinct);
            }
            assert_branch_invariants(tree);
        }
        let mean_height = total_height / n as f64;
        let mean_length = total_length / n as f64;
        // Expected height is about 3.5, expected length exactly 49.
        assert!(is_zero_within(mean_height - expected_height, 0.05));
        assert!(is_zero_within(mean_length - expected_length, 0.5));
    }

    #[test]
    fn basic_sdsd_invariants() {
        let model = SdsdModel::new(
            vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, 2.0],
            vec![0.5, 0.8],
            1.0,
            vec![0.1, 0.5],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap();
        let max_extant_leaves = 50;
        let conditions = StoppingConditions {
            max_extant_leaves: Some(max_extant_leaves),
            ..Default::default()
        };
        for seed in 0..100 {
            let result = sim_sdsd_tree(seed, &model, &conditions).unwrap();
            let tree = &result.tree;
            let root = tree.root();
            assert_branch_invariants(tree);
            let n_extant = tree.number_of_extant_leaves(root);
            if result.survived {
                assert!(n_extant >= max_extant_leaves);
            } else {
                assert_eq!(n_extant, 0);
            }
        }
    }

    #[test]
    fn rate_recovery_under_time_bound() {
        let r_trans = 1.5;
        let r_birth = 2.0;
        let r_death = 1.0;
        let r_burst = 1.2;
        let model = SdsdModel::new(
            vec![vec![-r_trans, r_trans], vec![r_trans, -r_trans]],
            vec![r_birth, r_birth],
            vec![r_death, r_death],
            r_burst,
            vec![0.5, 0.5],
            vec![1.0, 1.0],
            vec![2, 2],
            false,
        )
        .unwrap();
        let max_time = 2.0;
        let conditions = StoppingConditions {
            max_time: Some(max_time),
            ..Default::default()
        };

        let n = 200;
        let mut n_bursts = 0usize;
        let mut n_births = [0usize; 2];
        let mut n_deaths = [0usize; 2];
        let mut n_trans = [0usize; 2];
        let mut total_time = 0.0;
        let mut total_tree_length = 0.0;
        for seed in 0..n {
            let result = sim_sdsd_tree(seed, &model, &conditions).unwrap();
            let tree = &result.tree;
            let root = tree.root();
            n_bursts += result.burst_times.len();
            assert_eq!(tree.seed_time(), Some(0.0));
            let root_time = tree.node(root).time.unwrap();
            let elapsed = tree.height(root) + root_time;
            if result.survived {
                assert!(is_zero(elapsed - max_time));
            } else {
                assert!(elapsed < max_time);
            }
            total_time += elapsed;
            total_tree_length += tree.tree_length(root) + root_time;
            for node in tree.leafward_iter(root) {
                if tree.node(node).is_extinct {
                    n_deaths[tree.leafward_state(node)] += 1;
                } else if !tree.is_leaf(node) && !tree.node(node).is_burst_node {
                    assert_eq!(tree.node(node).children().len(), 2);
                    n_births[tree.leafward_state(node)] += 1;
                }
                for &(from, to) in &tree.node(node).state_changes {
                    assert_ne!(from, to);
                    n_trans[to] += 1;
                }
            }
        }
        let births = (n_births[0] + n_births[1]) as f64;
        let deaths = (n_deaths[0] + n_deaths[1]) as f64;
        let trans = (n_trans[0] + n_trans[1]) as f64;
        let eps = 0.1;
        assert!(is_zero_within(n_trans[0] as f64 / n_trans[1] as f64 - 1.0, eps));
        assert!(is_zero_within(
            n_births[0] as f64 / n_births[1] as f64 - 1.0,
            eps
        ));
        assert!(is_zero_within(
            n_deaths[0] as f64 / n_deaths[1] as f64 - 1.0,
            eps
        ));
        assert!(is_zero_within(trans / total_tree_length - r_trans, eps));
        assert!(is_zero_within(births / total_tree_length - r_birth, eps));
        assert!(is_zero_within(deaths / total_tree_length - r_death, eps));
        assert!(is_zero_within(n_bursts as f64 / total_time - r_burst, eps));
    }

    #[test]
    fn total_leaf_threshold_is_hit_exactly_without_bursts() {
        let model = SdsdModel::new(
            vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, 1.0],
            vec![0.4, 0.4],
            0.0,
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2, 2],
            true,
        )
        .unwrap();
        let conditions = StoppingConditions {
            max_total_leaves: Some(20),
            ..Default::default()
        };
        for seed in 0..50 {
            let result = sim_sdsd_tree(seed, &model, &conditions).unwrap();
            let tree = &result.tree;
            if result.survived {
                assert_eq!(tree.number_of_leaves(tree.root()), 20);
            }
        }
    }

    #[test]
    fn produced_newick_parses_back_faithfully() {
        let model = SdsdModel::default();
        let conditions = StoppingConditions {
            max_extant_leaves: Some(15),
            ..Default::default()
        };
        for seed in 0..20 {
            let result = sim_sdsd_tree(seed, &model, &conditions).unwrap();
            let tree = &result.tree;
            for &include_root in &[false, true] {
                let written = tree.as_newick_simple_string(include_root);
                let parsed = Tree::from_newick_simple(&written).unwrap();
                // Topology and labels survive exactly; branch lengths are
                // rebuilt from absolute times, so compare at tolerance.
                let original: Vec<(bool, Option<String>, f64)> = tree
                    .leafward_iter(tree.root())
                    .map(|n| {
                        (
                            tree.is_leaf(n),
                            tree.node(n).label.clone(),
                            tree.branch_length(n),
                        )
                    })
                    .collect();
                let reparsed: Vec<(bool, Option<String>, f64)> = parsed
                    .leafward_iter(parsed.root())
                    .map(|n| {
                        (
                            parsed.is_leaf(n),
                            parsed.node(n).label.clone(),
                            parsed.branch_length(n),
                        )
                    })
                    .collect();
                assert_eq!(original.len(), reparsed.len());
                for (i, (a, b)) in original.iter().zip(reparsed.iter()).enumerate() {
                    assert_eq!(a.0, b.0);
                    // An internal root's label is not part of the simple
                    // form, so it cannot come back.
                    if i > 0 || a.0 {
                        assert_eq!(a.1, b.1);
                    }
                    assert!(is_zero_within(a.2 - b.2, 1e-9));
                }
            }
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let model = SdsdModel::default();
        let conditions = StoppingConditions {
            max_extant_leaves: Some(25),
            max_time: Some(10.0),
            ..Default::default()
        };
        let a = sim_sdsd_tree(42, &model, &conditions).unwrap();
        let b = sim_sdsd_tree(42, &model, &conditions).unwrap();
        assert_eq!(a.survived, b.survived);
        assert_eq!(a.burst_times, b.burst_times);
        assert_eq!(
            a.tree.as_newick_simmap_string(true),
            b.tree.as_newick_simmap_string(true)
        );

        let c = sim_sdsd_tree(43, &model, &conditions).unwrap();
        assert_ne!(
            a.tree.as_newick_simmap_string(true),
            c.tree.as_newick_simmap_string(true)
        );
    }

    #[test]
    fn model_vets_vector_lengths() {
        let q = vec![vec![-1.0, 1.0], vec![1.0, -1.0]];
        let err = SdsdModel::new(
            q.clone(),
            vec![1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 0.6],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::LengthMismatch {
                field: "birth rates",
                found: 1,
                expected: 2
            }
        );
        let err = SdsdModel::new(
            q.clone(),
            vec![1.0, 1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 0.6, 0.2],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::LengthMismatch {
                field: "burst probabilities",
                found: 3,
                expected: 2
            }
        );
        let err = SdsdModel::new(
            vec![vec![-1.0, 1.0], vec![1.0, 1.0]],
            vec![1.0, 1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 0.6],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::Ctmc(CtmcError::NonNegativeDiagonal { row: 1 })
        );
    }

    #[test]
    fn model_vets_rate_values() {
        let q = vec![vec![-1.0, 1.0], vec![1.0, -1.0]];
        let err = SdsdModel::new(
            q.clone(),
            vec![1.0, -1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 0.6],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::NegativeRate {
                field: "birth_rates",
                index: 1,
                value: -1.0
            }
        );
        let err = SdsdModel::new(
            q.clone(),
            vec![1.0, 1.0],
            vec![0.5, 0.5],
            0.5,
            vec![0.1, 1.5],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidProbability {
                index: 1,
                value: 1.5
            }
        );
        let err = SdsdModel::new(
            q,
            vec![1.0, 1.0],
            vec![0.5, 0.5],
            -0.5,
            vec![0.1, 0.6],
            vec![1.0, 2.0],
            vec![2, 2],
            false,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NegativeBurstRate { value: -0.5 });
    }

    #[test]
    fn stopping_conditions_are_vetted() {
        let model = SdsdModel::default();
        let none = StoppingConditions::default();
        assert_eq!(none.validate(), Err(SimError::NoStoppingCondition));
        assert_eq!(
            sim_sdsd_tree(1, &model, &none).unwrap_err(),
            SimError::NoStoppingCondition
        );
        let zero = StoppingConditions {
            max_extant_leaves: Some(0),
            ..Default::default()
        };
        assert_eq!(
            zero.validate(),
            Err(SimError::NonPositiveStoppingCondition {
                name: "max_extant_leaves",
                value: 0.0
            })
        );
        let negative_time = StoppingConditions {
            max_time: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(
            negative_time.validate(),
            Err(SimError::NonPositiveStoppingCondition {
                name: "max_time",
                value: -1.0
            })
        );
        let ok = StoppingConditions {
            max_extinct_leaves: Some(3),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn draw_errors_have_a_home() {
        // Vector-length and draw failures share the SimError surface.
        let err: SimError = DrawError::PoissonOverflow { mean: 1e300 }.into();
        match err {
            SimError::Draw(DrawError::PoissonOverflow { .. }) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
