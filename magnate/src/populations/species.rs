use crate::genomics::{GeneticConfig, Genome, History};
use crate::populations::PopulationConfig;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A cluster of genomes within speciation distance of its founding
/// representative.
///
/// Species own their members. The first member acts as the
/// representative against which candidate genomes are measured,
/// and after sorting it is also the species champion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    members: Vec<Genome>,
    top_fitness: f32,
    staleness: usize,
}

impl Species {
    /// Creates a new species with the given founder as its sole
    /// member and representative.
    pub fn new(founder: Genome) -> Species {
        Species {
            members: vec![founder],
            top_fitness: 0.0,
            staleness: 0,
        }
    }

    /// Reassembles a species from checkpointed state.
    pub(crate) fn from_parts(
        members: Vec<Genome>,
        top_fitness: f32,
        staleness: usize,
    ) -> Species {
        Species {
            members,
            top_fitness,
            staleness,
        }
    }

    /// Returns the species' representative: its first member.
    pub fn representative(&self) -> &Genome {
        &self.members[0]
    }

    /// Returns the species' members.
    pub fn members(&self) -> &[Genome] {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut [Genome] {
        &mut self.members
    }

    /// Adds a genome to the species.
    pub fn push(&mut self, genome: Genome) {
        self.members.push(genome);
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the best raw fitness the species has ever seen.
    pub fn top_fitness(&self) -> f32 {
        self.top_fitness
    }

    /// Returns the number of generations since the species last
    /// improved its best fitness.
    pub fn staleness(&self) -> usize {
        self.staleness
    }

    /// Sets every member's adjusted fitness to its raw fitness
    /// divided by the species size.
    pub(crate) fn share_fitness(&mut self) {
        let count = self.members.len() as f32;
        for member in &mut self.members {
            let adjusted = member.fitness() / count;
            member.set_adjusted_fitness(adjusted);
        }
    }

    /// Returns the sum of the members' adjusted fitnesses.
    pub fn adjusted_fitness_sum(&self) -> f32 {
        self.members.iter().map(Genome::adjusted_fitness).sum()
    }

    /// Sorts members by descending adjusted fitness.
    ///
    /// # Panics
    /// Panics if any member's adjusted fitness is NaN.
    pub(crate) fn sort_members(&mut self) {
        self.members.sort_by(|a, b| {
            b.adjusted_fitness()
                .partial_cmp(&a.adjusted_fitness())
                .expect("invalid genome fitnesses detected (NaN)")
        });
    }

    /// Removes all but the top `portion` of members, rounded up.
    /// Species of size 1 are left alone. Assumes members are
    /// already sorted.
    pub(crate) fn cull_to_portion(&mut self, portion: f32) {
        if self.members.len() <= 1 {
            return;
        }
        let remaining = (self.members.len() as f32 * portion).ceil() as usize;
        self.members.truncate(remaining);
    }

    /// Removes all but the champion. Assumes members are already
    /// sorted.
    pub(crate) fn cull_to_one(&mut self) {
        self.members.truncate(1);
    }

    /// Compares the current champion's raw fitness to the species'
    /// historical best: staleness resets on improvement and
    /// increments otherwise. Assumes members are already sorted.
    pub(crate) fn update_staleness(&mut self) {
        let top = self.members[0].fitness();
        if self.top_fitness < top {
            self.top_fitness = top;
            self.staleness = 0;
        } else {
            self.staleness += 1;
        }
    }

    /// Breeds one child from the species' current members.
    ///
    /// With the configured chance, and if the species has at least
    /// two members, two distinct members are drawn at random and
    /// crossed, the earlier-sorted (fitter) one acting as the
    /// structure-donating first parent. Otherwise a random member
    /// is cloned. Either way the child is then mutated.
    pub fn breed(
        &self,
        history: &mut History,
        genetic_config: &GeneticConfig,
        population_config: &PopulationConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        let sexual = self.members.len() > 1
            && rng.gen::<f32>() < population_config.sexual_reproduction_chance;

        let mut child = if sexual {
            let s1 = rng.gen_range(0..self.members.len());
            let mut s2 = rng.gen_range(0..self.members.len() - 1);
            if s2 >= s1 {
                s2 += 1;
            }
            let (first, second) = if s1 < s2 { (s1, s2) } else { (s2, s1) };
            Genome::mate(&self.members[first], &self.members[second], rng)
        } else {
            self.members[rng.gen_range(0..self.members.len())].clone()
        };

        // Children enter the next generation unevaluated.
        child.set_fitness(0.0);
        child.set_adjusted_fitness(0.0);
        child.set_bracket(0);
        child.mutate_all(history, genetic_config, rng);
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Gene;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn genetic_config() -> GeneticConfig {
        GeneticConfig::standard(
            NonZeroUsize::new(3).unwrap(),
            NonZeroUsize::new(2).unwrap(),
        )
    }

    fn species_of(count: usize, fitnesses: &[f32]) -> Species {
        let config = genetic_config();
        let mut species = Species::new(Genome::new(&config));
        for _ in 1..count {
            species.push(Genome::new(&config));
        }
        for (member, fitness) in species.members_mut().iter_mut().zip(fitnesses) {
            member.set_fitness(*fitness);
        }
        species
    }

    #[test]
    fn fitness_sharing_divides_by_species_size() {
        let mut species = species_of(4, &[8.0, 4.0, 2.0, 0.0]);
        species.share_fitness();
        let adjusted: Vec<f32> = species
            .members()
            .iter()
            .map(Genome::adjusted_fitness)
            .collect();
        assert_eq!(adjusted, vec![2.0, 1.0, 0.5, 0.0]);
        assert_eq!(species.adjusted_fitness_sum(), 3.5);
    }

    #[test]
    fn culling_keeps_the_top_portion_rounded_up() {
        let mut species = species_of(10, &[1.0, 5.0, 3.0, 2.0, 4.0, 0.0, 9.0, 7.0, 8.0, 6.0]);
        species.share_fitness();
        species.sort_members();
        species.cull_to_portion(0.2);

        assert_eq!(species.len(), 2);
        assert_eq!(species.members()[0].fitness(), 9.0);
        assert_eq!(species.members()[1].fitness(), 8.0);
    }

    #[test]
    fn culling_leaves_singletons_alone() {
        let mut species = species_of(1, &[1.0]);
        species.cull_to_portion(0.2);
        assert_eq!(species.len(), 1);
    }

    #[test]
    fn staleness_resets_on_improvement_only() {
        let mut species = species_of(2, &[3.0, 1.0]);
        species.share_fitness();
        species.sort_members();

        species.update_staleness();
        assert_eq!(species.staleness(), 0);
        assert_eq!(species.top_fitness(), 3.0);

        // No improvement.
        species.update_staleness();
        species.update_staleness();
        assert_eq!(species.staleness(), 2);

        species.members_mut()[0].set_fitness(5.0);
        species.update_staleness();
        assert_eq!(species.staleness(), 0);
        assert_eq!(species.top_fitness(), 5.0);
    }

    #[test]
    #[should_panic(expected = "invalid genome fitnesses detected (NaN)")]
    fn nan_fitness_is_fatal() {
        let mut species = species_of(2, &[f32::NAN, 1.0]);
        species.share_fitness();
        species.sort_members();
    }

    #[test]
    fn asexual_breeding_clones_and_mutates() {
        let config = genetic_config();
        let population_config = PopulationConfig {
            sexual_reproduction_chance: 0.0,
            ..PopulationConfig::zero()
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(11);

        let species = species_of(1, &[1.0]);
        let child = species.breed(&mut history, &config, &population_config, &mut rng);
        assert!(child.edges().count() >= 1);
        assert_eq!(child.fitness(), 0.0);
    }

    #[test]
    fn sexual_breeding_draws_two_distinct_parents() {
        let config = genetic_config();
        let population_config = PopulationConfig {
            sexual_reproduction_chance: 1.0,
            ..PopulationConfig::zero()
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(11);

        let species = species_of(3, &[3.0, 2.0, 1.0]);
        for _ in 0..20 {
            let child = species.breed(&mut history, &config, &population_config, &mut rng);
            // Children keep the seed gene the parents share.
            assert!(child.edges().map(Gene::innovation).any(|i| i == 0));
        }
    }
}
