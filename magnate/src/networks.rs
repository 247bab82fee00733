//! Networks are the executable expression of genomes.
//!
//! A [`Network`] flattens a genome's graph into an arena of nodes
//! with precomputed incoming-connection lists. Activation is a pure
//! fixed-round relaxation over double-buffered node values, so a
//! single network can be activated concurrently from any number of
//! threads through a shared reference. The only mutable state, the
//! tournament score, sits behind a mutex for the same reason.

use crate::genomics::{Genome, NodeType};

use ahash::RandomState;

use std::collections::HashMap;
use std::sync::Mutex;

/// Number of value-propagation rounds per activation.
///
/// Every round pushes each node's value across its outgoing
/// connections once, so cycles in the graph act as a bounded
/// recurrence rather than an infinite loop.
pub const RELAXATION_ROUNDS: usize = 10;

/// One arena node: the positions and weights of the connections
/// feeding it.
#[derive(Clone, Debug)]
struct Unit {
    is_input: bool,
    is_output: bool,
    incoming: Vec<(usize, f32)>,
}

/// The phenotype of a [`Genome`]: a recurrent neural network.
///
/// Built via [`From<&Genome>`](#impl-From<%26Genome>-for-Network).
/// Disabled genes are not expressed. Activation does not mutate the
/// network, so `&Network` is safely shareable across worker threads.
///
/// # Examples
/// ```
/// use magnate::genomics::{GeneticConfig, Genome};
/// use magnate::networks::Network;
/// use std::num::NonZeroUsize;
///
/// let config = GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     output_count: NonZeroUsize::new(1).unwrap(),
///     ..GeneticConfig::zero()
/// };
///
/// let network = Network::from(&Genome::new(&config));
/// let outputs = network.activate(&[1.0, 0.0]);
///
/// assert_eq!(outputs.len(), 1);
/// ```
#[derive(Debug)]
pub struct Network {
    units: Vec<Unit>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    score: Mutex<f32>,
}

impl Network {
    /// Activates the network on the given sensor values and returns
    /// the output node values, in output node order.
    ///
    /// Input values are re-imposed at the start of every relaxation
    /// round; hidden nodes take the sigmoid of their weighted
    /// incoming sum from the previous round. Output nodes are
    /// computed once, from the final round's values, after the
    /// relaxation has run. Nodes with no incoming connections stay
    /// at 0.0.
    ///
    /// # Panics
    /// Panics if `sensors` is shorter than the network's input node
    /// count.
    pub fn activate(&self, sensors: &[f32]) -> Vec<f32> {
        let mut current = vec![0.0f32; self.units.len()];
        let mut next = vec![0.0f32; self.units.len()];

        for _ in 0..RELAXATION_ROUNDS {
            for (slot, position) in self.inputs.iter().enumerate() {
                current[*position] = sensors[slot];
            }
            for (position, unit) in self.units.iter().enumerate() {
                if unit.is_input {
                    next[position] = current[position];
                    continue;
                }
                // Output nodes never feed other nodes, so they are
                // left out of the relaxation entirely.
                if unit.is_output {
                    continue;
                }
                if unit.incoming.is_empty() {
                    next[position] = 0.0;
                    continue;
                }
                next[position] = sigmoid(self.weighted_sum(position, &current));
            }
            std::mem::swap(&mut current, &mut next);
        }

        self.outputs
            .iter()
            .map(|o| {
                if self.units[*o].incoming.is_empty() {
                    0.0
                } else {
                    sigmoid(self.weighted_sum(*o, &current))
                }
            })
            .collect()
    }

    fn weighted_sum(&self, position: usize, values: &[f32]) -> f32 {
        self.units[position]
            .incoming
            .iter()
            .map(|(source, weight)| values[*source] * weight)
            .sum()
    }

    /// Returns the network's current tournament score.
    pub fn score(&self) -> f32 {
        *self.score.lock().unwrap()
    }

    /// Resets the score to zero.
    pub fn reset_score(&self) {
        *self.score.lock().unwrap() = 0.0;
    }

    /// Adds to the score. Callable concurrently.
    pub fn add_score(&self, amount: f32) {
        *self.score.lock().unwrap() += amount;
    }

    /// Number of input nodes.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output nodes.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

impl From<&Genome> for Network {
    fn from(genome: &Genome) -> Network {
        let position: HashMap<usize, usize, RandomState> = genome
            .nodes()
            .enumerate()
            .map(|(arena, node)| (node.index(), arena))
            .collect();

        let mut units: Vec<Unit> = genome
            .nodes()
            .map(|node| Unit {
                is_input: node.node_type() == NodeType::Input,
                is_output: node.node_type() == NodeType::Output,
                incoming: Vec::new(),
            })
            .collect();

        for gene in genome.edges().filter(|g| g.enabled()) {
            let source = position[&gene.source()];
            let destination = position[&gene.destination()];
            units[destination].incoming.push((source, gene.weight()));
        }

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (arena, node) in genome.nodes().enumerate() {
            match node.node_type() {
                NodeType::Input => inputs.push(arena),
                NodeType::Output => outputs.push(arena),
                NodeType::Hidden => {}
            }
        }

        Network {
            units,
            inputs,
            outputs,
            score: Mutex::new(0.0),
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
