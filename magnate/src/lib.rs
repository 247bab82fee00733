//! NEAT-style neuroevolution of recurrent board-game players.
//!
//! The crate evolves variable-topology recurrent networks with the
//! classic NEAT toolbox — historical innovation markings, alignment-based
//! crossover, speciation with fitness sharing — and evaluates whole
//! generations through a parallel 4-player single-elimination tournament.
//! The game itself is external: anything implementing
//! [`Environment`](tournament::Environment) can act as the fitness
//! environment.
//!
//! # Example: evolving against a trivial environment
//! ```
//! use magnate::genomics::GeneticConfig;
//! use magnate::networks::Network;
//! use magnate::populations::{Population, PopulationConfig};
//! use magnate::tournament::{Environment, Outcome, Tournament, TournamentConfig};
//! use rand::rngs::StdRng;
//! use rand::{RngCore, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! // An environment in which the first-seated player always wins.
//! struct FirstSeatWins;
//!
//! impl Environment for FirstSeatWins {
//!     fn play(&self, _players: [&Network; 4], _rng: &mut dyn RngCore) -> Outcome {
//!         Outcome::Victory(0)
//!     }
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(3).unwrap(),
//!     output_count: NonZeroUsize::new(2).unwrap(),
//!     ..GeneticConfig::zero()
//! };
//! let population_config = PopulationConfig {
//!     // Bracket play needs a power-of-four population.
//!     size: NonZeroUsize::new(16).unwrap(),
//!     distance_threshold: 1.0,
//!     survival_threshold: 0.2,
//!     sexual_reproduction_chance: 0.75,
//!     stagnation_threshold: NonZeroUsize::new(15).unwrap(),
//! };
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut population = Population::new(population_config, genetic_config, &mut rng);
//! let mut tournament = Tournament::new(
//!     FirstSeatWins,
//!     TournamentConfig {
//!         round_size: 4,
//!         batch_size: NonZeroUsize::new(2).unwrap(),
//!         workers: NonZeroUsize::new(2),
//!         verbose: false,
//!     },
//! );
//!
//! for _ in 0..3 {
//!     tournament.execute(&mut population, &mut rng);
//!     population.evolve(&mut rng);
//! }
//! ```

pub mod checkpoint;
pub mod genomics;
pub mod logging;
pub mod networks;
pub mod populations;
pub mod tournament;

/// Identifier type for historical structural markings.
/// Two genes anywhere in a run that connect the same pair
/// of nodes carry the same innovation number, which is what
/// makes genome alignment meaningful.
pub type Innovation = usize;
