use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation and
/// inter-genome operations.
///
/// Mutation operators are governed by *expected application
/// counts* rather than single probabilities: an operator with
/// expectation `p` runs `floor(p)` times unconditionally plus
/// one extra time with probability `p - floor(p)`.
///
/// # Note
/// Quantities expressing probabilities should be in the range
/// [0.0, 1.0]; values outside it may produce odd behaviours.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input nodes in a genome.
    pub input_count: NonZeroUsize,
    /// Number of output nodes in a genome.
    pub output_count: NonZeroUsize,
    /// Expected applications of the weight mutation per [`mutate_all`].
    ///
    /// [`mutate_all`]: crate::genomics::Genome::mutate_all
    pub weight_mutation_expectation: f32,
    /// Expected applications of the link-addition mutation per [`mutate_all`].
    ///
    /// [`mutate_all`]: crate::genomics::Genome::mutate_all
    pub link_mutation_expectation: f32,
    /// Expected applications of the node-addition mutation per [`mutate_all`].
    ///
    /// [`mutate_all`]: crate::genomics::Genome::mutate_all
    pub node_mutation_expectation: f32,
    /// Expected applications of the gene-disabling mutation per [`mutate_all`].
    ///
    /// [`mutate_all`]: crate::genomics::Genome::mutate_all
    pub disable_mutation_expectation: f32,
    /// Expected applications of the gene-enabling mutation per [`mutate_all`].
    ///
    /// [`mutate_all`]: crate::genomics::Genome::mutate_all
    pub enable_mutation_expectation: f32,
    /// Chance that a weight mutation shifts the weight instead
    /// of replacing it with a fresh random value.
    pub weight_shift_chance: f32,
    /// Full width of the uniform distribution a weight shift
    /// draws from; the offset is in ±`weight_shift_step / 2`.
    pub weight_shift_step: f32,
    /// Maximum magnitude of a freshly randomized gene weight.
    pub weight_bound: f32,
    /// Weight of excess genes in speciation distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in speciation distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the mean matching-gene weight difference in
    /// speciation distance.
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration: all rates and
    /// factors 0, and node counts 1.
    ///
    /// # Note
    /// Not suitable for actual evolution; it is meant as a base
    /// to fill in unused values during configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use magnate::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(126).unwrap(),
    ///     output_count: NonZeroUsize::new(9).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            input_count: unsafe { NonZeroUsize::new_unchecked(1) },
            output_count: unsafe { NonZeroUsize::new_unchecked(1) },
            weight_mutation_expectation: 0.0,
            link_mutation_expectation: 0.0,
            node_mutation_expectation: 0.0,
            disable_mutation_expectation: 0.0,
            enable_mutation_expectation: 0.0,
            weight_shift_chance: 0.0,
            weight_shift_step: 0.0,
            weight_bound: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }

    /// Returns the reference configuration for the given topology:
    /// the mutation expectations and distance factors the trainer
    /// runs with.
    ///
    /// # Examples
    /// ```
    /// use magnate::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig::standard(
    ///     NonZeroUsize::new(126).unwrap(),
    ///     NonZeroUsize::new(9).unwrap(),
    /// );
    ///
    /// assert_eq!(config.weight_mutation_expectation, 2.0);
    /// assert_eq!(config.common_weight_factor, 0.4);
    /// ```
    pub const fn standard(input_count: NonZeroUsize, output_count: NonZeroUsize) -> GeneticConfig {
        GeneticConfig {
            input_count,
            output_count,
            weight_mutation_expectation: 2.0,
            link_mutation_expectation: 0.2,
            node_mutation_expectation: 0.1,
            disable_mutation_expectation: 0.2,
            enable_mutation_expectation: 0.6,
            weight_shift_chance: 0.9,
            weight_shift_step: 0.1,
            weight_bound: 2.0,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
        }
    }
}
