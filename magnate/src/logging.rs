//! Generational progress reporting.
//!
//! The trainer records a [`Log`] snapshot per generation: species
//! count, fitness statistics and genome size statistics. Snapshots
//! are plain data, so callers decide whether to print them, keep
//! them, or both.

use crate::genomics::Genome;
use crate::populations::Population;

use std::fmt;

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    ///
    /// # Panics
    /// Panics if the sequence is empty or contains NaN.
    ///
    /// # Examples
    /// ```
    /// use magnate::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        data.sort_by(|a, b| a.partial_cmp(b).expect("invalid statistics data (NaN)"));

        let minimum = *data.first().expect("no statistics data");
        let maximum = *data.last().expect("no statistics data");
        let mean = data.iter().sum::<f32>() / data.len() as f32;
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };

        Stats {
            maximum,
            minimum,
            mean,
            median,
        }
    }
}

/// A snapshot of a population at the end of a generation.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation: usize,
    pub species_count: usize,
    pub champion_fitness: f32,
    pub fitness: Stats,
    pub gene_counts: Stats,
}

impl Log {
    /// Takes a snapshot of the given population.
    pub fn new(population: &Population) -> Log {
        Log {
            generation: population.generation(),
            species_count: population.species().len(),
            champion_fitness: population.champion().fitness(),
            fitness: Stats::from(population.genomes().map(Genome::fitness)),
            gene_counts: Stats::from(
                population.genomes().map(|g| g.edges().count() as f32),
            ),
        }
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration: {}\n\
            \tspecies_count: {}\n\
            \tchampion_fitness: {}\n\
            \tfitness: {:?}\n\
            \tgene_counts: {:?}\n\
            }}",
            self.generation,
            self.species_count,
            self.champion_fitness,
            self.fitness,
            self.gene_counts,
        )
    }
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug, Default)]
pub struct EvolutionLogger {
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with no recorded snapshots.
    pub fn new() -> EvolutionLogger {
        EvolutionLogger { logs: Vec::new() }
    }

    /// Takes and stores a snapshot of the given population.
    pub fn record(&mut self, population: &Population) {
        self.logs.push(Log::new(population));
    }

    /// Returns an iterator over all recorded snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;
    use crate::populations::PopulationConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    #[test]
    fn stats_of_even_length_data() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn snapshot_reflects_the_population() {
        let mut rng = StdRng::seed_from_u64(31);
        let population = Population::new(
            PopulationConfig::standard(NonZeroUsize::new(16).unwrap()),
            GeneticConfig::standard(
                NonZeroUsize::new(3).unwrap(),
                NonZeroUsize::new(2).unwrap(),
            ),
            &mut rng,
        );

        let mut logger = EvolutionLogger::new();
        logger.record(&population);

        let log = logger.iter().next().unwrap();
        assert_eq!(log.generation, 0);
        assert_eq!(log.species_count, population.species().len());
        assert!(log.gene_counts.minimum >= 1.0);
    }
}
