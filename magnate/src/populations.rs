//! Population-level evolution: speciation, fitness sharing,
//! survival and breeding.
//!
//! A [`Population`] owns all species (which own the genomes), the
//! run-wide innovation [`History`], and the current generation's
//! executable [`Network`]s, materialized in species order. One call
//! to [`Population::evolve`] turns a scored generation into the
//! next one.

mod config;
mod species;

pub use config::PopulationConfig;
pub use species::Species;

use crate::genomics::{GeneticConfig, Genome, History};
use crate::networks::Network;

use rand::Rng;

/// A population of genomes, clustered into species and expressed
/// as networks.
///
/// # Examples
/// ```
/// use magnate::genomics::GeneticConfig;
/// use magnate::populations::{Population, PopulationConfig};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use std::num::NonZeroUsize;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let population = Population::new(
///     PopulationConfig::standard(NonZeroUsize::new(16).unwrap()),
///     GeneticConfig::standard(
///         NonZeroUsize::new(3).unwrap(),
///         NonZeroUsize::new(2).unwrap(),
///     ),
///     &mut rng,
/// );
///
/// assert_eq!(population.size(), 16);
/// assert_eq!(population.networks().len(), 16);
/// ```
pub struct Population {
    species: Vec<Species>,
    networks: Vec<Network>,
    history: History,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a fresh population: `size` copies of the seed genome,
    /// speciated (identical seeds land in one species) and then
    /// mutated once each, with the innovation history pre-seeded
    /// for the configured topology.
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        rng: &mut impl Rng,
    ) -> Population {
        let mut population = Population {
            species: Vec::new(),
            networks: Vec::new(),
            history: History::new(&genetic_config),
            generation: 0,
            population_config,
            genetic_config,
        };

        for _ in 0..population.population_config.size.get() {
            let genome = Genome::new(&population.genetic_config);
            population.speciate(genome);
        }

        let (species, history, genetic_config) = (
            &mut population.species,
            &mut population.history,
            &population.genetic_config,
        );
        for species in species {
            for member in species.members_mut() {
                member.mutate_all(history, genetic_config, rng);
            }
        }

        population.materialize();
        population
    }

    /// Reassembles a population from checkpointed state and
    /// re-materializes its networks.
    pub(crate) fn from_parts(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        generation: usize,
        history: History,
        species: Vec<Species>,
    ) -> Population {
        let mut population = Population {
            species,
            networks: Vec::new(),
            history,
            generation,
            population_config,
            genetic_config,
        };
        population.materialize();
        population
    }

    /// Advances the population one generation.
    ///
    /// The steps run in strict order: fitness sharing, per-species
    /// culling to the survival portion, staleness accounting,
    /// proportional offspring quotas, breeding (with shortfall
    /// filled from random species), elitist culling to one member,
    /// speciation of the children, and finally network
    /// re-materialization.
    ///
    /// Species reduced to a single member by culling are removed
    /// outright, and staleness accounting is skipped whenever only
    /// one species remains.
    pub fn evolve(&mut self, rng: &mut impl Rng) {
        for species in &mut self.species {
            species.share_fitness();
        }

        for species in &mut self.species {
            species.sort_members();
            species.cull_to_portion(self.population_config.survival_threshold);
        }
        self.species.retain(|species| species.len() > 1);

        let stagnation = self.population_config.stagnation_threshold.get();
        let mut index = 0;
        while self.species.len() > 1 && index < self.species.len() {
            self.species[index].update_staleness();
            if self.species[index].staleness() >= stagnation {
                self.species.remove(index);
            } else {
                index += 1;
            }
        }

        let total: f32 = self.species.iter().map(Species::adjusted_fitness_sum).sum();
        let size = self.population_config.size.get();
        let mut children = Vec::new();
        {
            let (species, history, genetic_config, population_config) = (
                &self.species,
                &mut self.history,
                &self.genetic_config,
                &self.population_config,
            );
            for species in species.iter() {
                let quota =
                    (size as f32 * (species.adjusted_fitness_sum() / total)) as i64 - 1;
                for _ in 0..quota {
                    children.push(species.breed(history, genetic_config, population_config, rng));
                }
            }
            while size > species.len() + children.len() {
                let donor = &species[rng.gen_range(0..species.len())];
                children.push(donor.breed(history, genetic_config, population_config, rng));
            }
        }

        for species in &mut self.species {
            species.cull_to_one();
        }
        for child in children {
            self.speciate(child);
        }

        self.materialize();
        self.generation += 1;
    }

    /// Assigns a genome to the first species whose representative
    /// lies within the distance threshold, or founds a new species
    /// with it.
    fn speciate(&mut self, genome: Genome) {
        let genetic_config = &self.genetic_config;
        let threshold = self.population_config.distance_threshold;

        for species in &mut self.species {
            let distance =
                Genome::genetic_distance(species.representative(), &genome, genetic_config);
            if distance < threshold {
                species.push(genome);
                return;
            }
        }
        self.species.push(Species::new(genome));
    }

    /// Rebuilds the network list from the current genomes, in
    /// species order.
    fn materialize(&mut self) {
        self.networks = self
            .species
            .iter()
            .flat_map(|species| species.members().iter())
            .map(Network::from)
            .collect();
    }

    /// Returns the networks and genomes of the current generation
    /// in matching order, networks shared and genomes mutable.
    pub(crate) fn contestants(&mut self) -> (&[Network], Vec<&mut Genome>) {
        let genomes = self
            .species
            .iter_mut()
            .flat_map(|species| species.members_mut().iter_mut())
            .collect();
        (&self.networks, genomes)
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the number of genomes currently in the population.
    pub fn size(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    /// Returns the current species list.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Returns an iterator over all genomes, in species order.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|species| species.members())
    }

    /// Returns the current generation's networks, in species order.
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Returns the run-wide innovation history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the genome with the highest raw fitness.
    ///
    /// # Panics
    /// Panics if any genome's fitness is NaN.
    pub fn champion(&self) -> &Genome {
        self.genomes()
            .max_by(|a, b| {
                a.fitness()
                    .partial_cmp(&b.fitness())
                    .expect("invalid genome fitnesses detected (NaN)")
            })
            .expect("population has no genomes")
    }

    /// Returns the population's genetic configuration.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Gene, Node};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn configs(size: usize) -> (PopulationConfig, GeneticConfig) {
        (
            PopulationConfig::standard(NonZeroUsize::new(size).unwrap()),
            GeneticConfig::standard(
                NonZeroUsize::new(3).unwrap(),
                NonZeroUsize::new(2).unwrap(),
            ),
        )
    }

    #[test]
    fn fresh_population_is_one_mutated_species() {
        let (population_config, genetic_config) = configs(16);
        let mut rng = StdRng::seed_from_u64(3);
        let population = Population::new(population_config, genetic_config, &mut rng);

        // Identical seeds are all within distance 0 of each other.
        assert_eq!(population.species().len(), 1);
        assert_eq!(population.size(), 16);
        assert_eq!(population.networks().len(), 16);
        assert_eq!(population.generation(), 0);
        assert!(population.genomes().all(|g| g.edges().count() >= 1));
    }

    #[test]
    fn evolution_preserves_population_size() {
        let (population_config, genetic_config) = configs(16);
        let mut rng = StdRng::seed_from_u64(5);
        let mut population = Population::new(population_config, genetic_config, &mut rng);

        for generation in 1..=10 {
            for species in &mut population.species {
                for (rank, member) in species.members_mut().iter_mut().enumerate() {
                    member.set_fitness(10.0 - rank as f32);
                }
            }
            population.evolve(&mut rng);
            assert_eq!(population.size(), 16, "generation {}", generation);
            assert_eq!(population.networks().len(), 16);
            assert_eq!(population.generation(), generation);
        }
    }

    #[test]
    fn zero_fitness_generations_survive() {
        // With a zero fitness sum every quota collapses and the
        // whole next generation comes from shortfall breeding.
        let (population_config, genetic_config) = configs(16);
        let mut rng = StdRng::seed_from_u64(8);
        let mut population = Population::new(population_config, genetic_config, &mut rng);

        for _ in 0..5 {
            population.evolve(&mut rng);
            assert_eq!(population.size(), 16);
            assert!(!population.species.is_empty());
        }
    }

    #[test]
    fn distant_genome_founds_a_new_species() {
        let (population_config, genetic_config) = configs(4);
        let mut rng = StdRng::seed_from_u64(2);
        let mut population =
            Population::new(population_config, genetic_config.clone(), &mut rng);
        let species_before = population.species().len();

        // Same single-gene structure as the seed, but a weight so
        // far away that the weight term alone exceeds the threshold.
        let nodes: Vec<Node> = Genome::new(&genetic_config).nodes().copied().collect();
        let outlier = Genome::from_parts(nodes, vec![Gene::new(0, 0, 3, 100.0, true)]);
        population.speciate(outlier);

        assert_eq!(population.species().len(), species_before + 1);
    }

    #[test]
    fn contestants_pair_networks_with_genomes_in_order() {
        let (population_config, genetic_config) = configs(16);
        let mut rng = StdRng::seed_from_u64(4);
        let mut population = Population::new(population_config, genetic_config, &mut rng);

        let (networks, genomes) = population.contestants();
        assert_eq!(networks.len(), genomes.len());
    }
}
