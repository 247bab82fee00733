//! Genomes are the heritable encoding of a player network.
//!
//! A genome is a directed graph of typed nodes and weighted,
//! enable-flagged genes, each gene tagged with a run-wide innovation
//! number drawn from the shared [`History`]. Genomes are progressively
//! complexified through structural mutation, recombined by
//! innovation-aligned crossover, and clustered into species by
//! [`genetic distance`](Genome::genetic_distance).

mod config;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use genes::Gene;
pub use history::{History, Marking};
pub use nodes::{Node, NodeType};

use crate::Innovation;

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A genome: node and gene sequences plus the evolutionary
/// bookkeeping attached to them.
///
/// Nodes are kept sorted by index and genes by innovation number;
/// every mutation and crossover preserves both orderings. Input
/// nodes never receive genes and output nodes never source them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genome {
    nodes: Vec<Node>,
    edges: Vec<Gene>,
    fitness: f32,
    adjusted_fitness: f32,
    bracket: usize,
}

impl Genome {
    /// Creates the minimal seed genome for the configured topology:
    /// the full set of input and output nodes, connected by a single
    /// enabled gene from node 0 to the first output node with weight
    /// 0.0 and innovation number 0.
    ///
    /// The structure beyond that is left to mutation.
    ///
    /// # Examples
    /// ```
    /// use magnate::genomics::{GeneticConfig, Genome, NodeType};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(126).unwrap(),
    ///     output_count: NonZeroUsize::new(9).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config);
    ///
    /// assert_eq!(genome.nodes().count(), 126 + 9);
    /// assert_eq!(genome.edges().count(), 1);
    /// assert_eq!(genome.edges().next().unwrap().destination(), 126);
    /// ```
    pub fn new(config: &GeneticConfig) -> Genome {
        let inputs = config.input_count.get();
        let outputs = config.output_count.get();

        let mut nodes = Vec::with_capacity(inputs + outputs);
        for i in 0..inputs {
            nodes.push(Node::new(NodeType::Input, i));
        }
        for o in 0..outputs {
            nodes.push(Node::new(NodeType::Output, o + inputs));
        }

        Genome {
            nodes,
            edges: vec![Gene::new(0, 0, inputs, 0.0, true)],
            fitness: 0.0,
            adjusted_fitness: 0.0,
            bracket: 0,
        }
    }

    /// Reassembles a genome from raw node and gene sequences, as
    /// read back from a checkpoint. Both sequences are re-sorted
    /// into canonical order.
    pub(crate) fn from_parts(mut nodes: Vec<Node>, mut edges: Vec<Gene>) -> Genome {
        nodes.sort_unstable_by_key(Node::index);
        edges.sort_by_key(Gene::innovation);
        Genome {
            nodes,
            edges,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            bracket: 0,
        }
    }

    /// Adds a node, keeping the node sequence sorted by index.
    pub fn add_node(&mut self, node_type: NodeType, index: usize) {
        let position = self.nodes.partition_point(|n| n.index() < index);
        self.nodes.insert(position, Node::new(node_type, index));
    }

    /// Adds a gene, keeping the gene sequence sorted by innovation
    /// number.
    pub fn add_edge(
        &mut self,
        source: usize,
        destination: usize,
        weight: f32,
        enabled: bool,
        innovation: Innovation,
    ) {
        let position = self
            .edges
            .partition_point(|g| g.innovation() < innovation);
        self.edges
            .insert(position, Gene::new(innovation, source, destination, weight, enabled));
    }

    /// Returns an iterator over the genome's nodes, in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns an iterator over the genome's genes, in innovation
    /// order.
    pub fn edges(&self) -> impl Iterator<Item = &Gene> {
        self.edges.iter()
    }

    /// Returns the genome's fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Sets the genome's fitness.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's species-size adjusted fitness.
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }

    /// Sets the genome's adjusted fitness.
    pub fn set_adjusted_fitness(&mut self, adjusted_fitness: f32) {
        self.adjusted_fitness = adjusted_fitness;
    }

    /// Returns the number of tournament rounds survived this
    /// generation.
    pub fn bracket(&self) -> usize {
        self.bracket
    }

    /// Resets the bracket counter, at the start of a tournament.
    pub fn set_bracket(&mut self, bracket: usize) {
        self.bracket = bracket;
    }

    /// Advances the bracket counter after a won round.
    pub fn advance_bracket(&mut self) {
        self.bracket += 1;
    }

    /// Returns the highest node index present in the genome.
    fn max_node_index(&self) -> usize {
        self.nodes.last().expect("genome has no nodes").index()
    }

    /// Applies the full mutation battery to the genome: weight
    /// mutation, link addition, node addition, disabling and
    /// enabling, each applied the expected number of times
    /// configured for it.
    pub fn mutate_all(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        for _ in 0..applications(config.weight_mutation_expectation, rng) {
            self.mutate_weight(config, rng);
        }
        for _ in 0..applications(config.link_mutation_expectation, rng) {
            self.mutate_add_link(history, config, rng);
        }
        for _ in 0..applications(config.node_mutation_expectation, rng) {
            self.mutate_add_node(history, rng);
        }
        for _ in 0..applications(config.disable_mutation_expectation, rng) {
            self.mutate_disable(rng);
        }
        for _ in 0..applications(config.enable_mutation_expectation, rng) {
            self.mutate_enable(rng);
        }
    }

    /// Mutates one uniformly chosen gene's weight: with
    /// [`weight_shift_chance`] the weight is shifted by a small
    /// offset, otherwise it is replaced with a fresh random value.
    ///
    /// [`weight_shift_chance`]: GeneticConfig::weight_shift_chance
    pub fn mutate_weight(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        let selection = rng.gen_range(0..self.edges.len());
        let gene = &mut self.edges[selection];
        if rng.gen::<f32>() < config.weight_shift_chance {
            gene.shift_weight(config, rng);
        } else {
            gene.randomize_weight(config, rng);
        }
    }

    /// Adds a new enabled gene between a uniformly chosen pair of
    /// yet-unconnected nodes, registering it with the history.
    ///
    /// Self-loops, genes into input nodes and genes out of output
    /// nodes are never candidates. If the genome has no legal
    /// candidate pair left, this is a silent no-op.
    pub fn mutate_add_link(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        let connected: HashSet<(usize, usize), RandomState> =
            self.edges.iter().map(Gene::endpoints).collect();

        let mut candidates = Vec::new();
        for source in &self.nodes {
            for destination in &self.nodes {
                if source.node_type() == NodeType::Output
                    || destination.node_type() == NodeType::Input
                {
                    continue;
                }
                if source.index() == destination.index() {
                    continue;
                }
                if connected.contains(&(source.index(), destination.index())) {
                    continue;
                }
                candidates.push((source.index(), destination.index()));
            }
        }

        if candidates.is_empty() {
            return;
        }

        let (source, destination) = candidates[rng.gen_range(0..candidates.len())];
        let weight = Gene::random_weight(config, rng);
        let innovation = history.register(source, destination);
        self.add_edge(source, destination, weight, true, innovation);
    }

    /// Splits a uniformly chosen gene: the gene is disabled and
    /// replaced by a fresh hidden node bridged by two new genes,
    /// source → new (weight 1.0) and new → destination (the old
    /// weight).
    ///
    /// If the chosen gene is already disabled the mutation aborts
    /// without resampling. That throttles topological growth, and
    /// is deliberate.
    pub fn mutate_add_node(&mut self, history: &mut History, rng: &mut impl Rng) {
        let selection = rng.gen_range(0..self.edges.len());
        if !self.edges[selection].enabled() {
            return;
        }

        let (source, destination) = self.edges[selection].endpoints();
        let weight = self.edges[selection].weight();
        self.edges[selection].set_enabled(false);

        let bridge = self.max_node_index() + 1;
        let first = history.register(source, bridge);
        let second = history.register(bridge, destination);

        self.add_node(NodeType::Hidden, bridge);
        self.add_edge(source, bridge, 1.0, true, first);
        self.add_edge(bridge, destination, weight, true, second);
    }

    /// Enables a uniformly chosen disabled gene; no-op if every
    /// gene is already enabled.
    pub fn mutate_enable(&mut self, rng: &mut impl Rng) {
        self.flip_random_gene(false, rng);
    }

    /// Disables a uniformly chosen enabled gene; no-op if every
    /// gene is already disabled.
    pub fn mutate_disable(&mut self, rng: &mut impl Rng) {
        self.flip_random_gene(true, rng);
    }

    fn flip_random_gene(&mut self, currently_enabled: bool, rng: &mut impl Rng) {
        let candidates: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, g)| g.enabled() == currently_enabled)
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return;
        }
        let selection = candidates[rng.gen_range(0..candidates.len())];
        self.edges[selection].set_enabled(!currently_enabled);
    }

    /// Produces an offspring of two genomes.
    ///
    /// Genes are aligned by innovation number. For each matching
    /// pair a fair coin is flipped: the second parent's copy is
    /// taken only when the coin favors it *and* that copy is
    /// enabled; in every other case the first parent's copy wins.
    /// Disjoint and excess genes are inherited from the first
    /// parent only, so the offspring's structure is exactly the
    /// first parent's structure. The node set is rebuilt from the
    /// first parent's fixed input/output topology plus one hidden
    /// node per hidden index the gene set references.
    pub fn mate(first: &Genome, second: &Genome, rng: &mut impl Rng) -> Genome {
        let from_second: HashMap<Innovation, &Gene, RandomState> = second
            .edges
            .iter()
            .map(|g| (g.innovation(), g))
            .collect();

        let mut edges = Vec::with_capacity(first.edges.len());
        for gene in &first.edges {
            match from_second.get(&gene.innovation()) {
                Some(other) if rng.gen_range(0..2) == 1 && other.enabled() => {
                    edges.push(**other);
                }
                _ => edges.push(*gene),
            }
        }

        let mut nodes: Vec<Node> = first
            .nodes
            .iter()
            .filter(|n| n.node_type() != NodeType::Hidden)
            .copied()
            .collect();
        let fixed: HashSet<usize, RandomState> = nodes.iter().map(Node::index).collect();

        let mut hidden: Vec<usize> = edges
            .iter()
            .flat_map(|g| [g.source(), g.destination()])
            .filter(|index| !fixed.contains(index))
            .collect();
        hidden.sort_unstable();
        hidden.dedup();
        for index in hidden {
            nodes.push(Node::new(NodeType::Hidden, index));
        }
        nodes.sort_unstable_by_key(Node::index);

        Genome {
            nodes,
            edges,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            bracket: 0,
        }
    }

    /// Returns the speciation distance between two genomes:
    ///
    /// `C1 × excess/N + C2 × disjoint/N + C3 × mean |Δweight|`
    ///
    /// where `N` is the larger gene count of the two, excess and
    /// disjoint genes are counted on both sides, and the weight
    /// term averages over matching genes.
    ///
    /// The split between "disjoint" and "excess" depends on which
    /// genome reaches the higher innovation number; the count of
    /// each class is the same under argument swap, so the distance
    /// is symmetric as long as both gene factors are equal.
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        let alignment = Alignment::of(first, second);

        let n = first.edges.len().max(second.edges.len()) as f32;
        let weight_term = if alignment.matching == 0 {
            0.0
        } else {
            alignment.weight_difference / alignment.matching as f32
        };

        config.excess_gene_factor * (alignment.excess as f32 / n)
            + config.disjoint_gene_factor * (alignment.disjoint as f32 / n)
            + config.common_weight_factor * weight_term
    }
}

/// Counts drawn from aligning two gene sequences by innovation
/// number.
struct Alignment {
    matching: usize,
    weight_difference: f32,
    disjoint: usize,
    excess: usize,
}

impl Alignment {
    fn of(first: &Genome, second: &Genome) -> Alignment {
        let max_first = first
            .edges
            .last()
            .expect("genome has no genes")
            .innovation();
        let max_second = second
            .edges
            .last()
            .expect("genome has no genes")
            .innovation();
        // Genes beyond the shorter lineage's reach are excess,
        // the rest of the unmatched ones are disjoint.
        let reach = max_first.min(max_second);

        let mut alignment = Alignment {
            matching: 0,
            weight_difference: 0.0,
            disjoint: 0,
            excess: 0,
        };

        let (mut i, mut j) = (0, 0);
        while i < first.edges.len() && j < second.edges.len() {
            let a = &first.edges[i];
            let b = &second.edges[j];
            if a.innovation() == b.innovation() {
                alignment.matching += 1;
                alignment.weight_difference += (a.weight() - b.weight()).abs();
                i += 1;
                j += 1;
            } else if a.innovation() < b.innovation() {
                alignment.bucket(a.innovation(), reach);
                i += 1;
            } else {
                alignment.bucket(b.innovation(), reach);
                j += 1;
            }
        }
        for gene in &first.edges[i..] {
            alignment.bucket(gene.innovation(), reach);
        }
        for gene in &second.edges[j..] {
            alignment.bucket(gene.innovation(), reach);
        }

        alignment
    }

    fn bucket(&mut self, innovation: Innovation, reach: Innovation) {
        if innovation > reach {
            self.excess += 1;
        } else {
            self.disjoint += 1;
        }
    }
}

/// Converts an expected application count into a concrete count:
/// `floor(expectation)` guaranteed applications plus one more with
/// probability `fract(expectation)`.
fn applications(expectation: f32, rng: &mut impl Rng) -> usize {
    let mut count = 0;
    let mut p = expectation;
    while p > 0.0 {
        if rng.gen::<f32>() < p {
            count += 1;
        }
        p -= 1.0;
    }
    count
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Genome {{ nodes: [{}], genes: [{}], fitness: {} }}",
            self.nodes
                .iter()
                .map(Node::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            self.edges
                .iter()
                .map(Gene::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            self.fitness,
        )
    }
}
