//! Bracket-tournament evaluation of a generation.
//!
//! The scheduler turns a population's networks into fitness scores
//! by repeated 4-player single-elimination rounds: contestants are
//! shuffled, grouped into brackets of four, and each bracket plays
//! a fixed number of games in parallel fork-join batches. Wins and
//! draws accumulate on the networks' score fields; surviving a
//! round increments the genome's bracket counter, and final fitness
//! is a linear function of bracket depth anchored to a running
//! champion score carried across generations.

use crate::networks::Network;
use crate::populations::Population;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::thread;

/// The result of one 4-player game.
///
/// `Victory` carries the seat of the winner: the index into the
/// player array passed to [`Environment::play`]. Any seat shuffling
/// the environment performs internally must be mapped back before
/// reporting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Victory(usize),
    Draw,
}

/// A 4-player game the tournament can evaluate networks in.
///
/// `play` is called concurrently from worker threads with shared
/// network references, so implementations must confine per-game
/// state to locals and guard any shared analytics behind locks.
/// Randomness comes exclusively from the provided generator, which
/// is seeded per worker for reproducibility.
pub trait Environment: Sync {
    /// Plays one full game between the four networks and reports
    /// its outcome.
    fn play(&self, players: [&Network; 4], rng: &mut dyn RngCore) -> Outcome;

    /// Returns a progress report to print between batches, if the
    /// environment keeps one.
    fn progress(&self) -> Option<String> {
        None
    }
}

/// Configuration data for tournament execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Number of games each bracket plays per round, rounded up to
    /// a whole number of batches.
    pub round_size: usize,
    /// Number of games each worker plays sequentially per batch.
    /// Nonzero, or the round could never make progress.
    pub batch_size: NonZeroUsize,
    /// Number of worker threads per batch. `None` uses the
    /// available hardware parallelism.
    pub workers: Option<NonZeroUsize>,
    /// Whether to print round and bracket progress to stdout.
    pub verbose: bool,
}

impl Default for TournamentConfig {
    fn default() -> TournamentConfig {
        TournamentConfig {
            round_size: 2000,
            // SAFETY: 20 is a valid NonZeroUsize.
            batch_size: unsafe { NonZeroUsize::new_unchecked(20) },
            workers: None,
            verbose: true,
        }
    }
}

/// The tournament scheduler.
///
/// Holds the environment, the execution configuration, and the
/// champion anchor carried from one generation to the next. See
/// the [crate-level example](crate) for usage.
pub struct Tournament<E> {
    environment: E,
    config: TournamentConfig,
    champion_score: f32,
    champion_bracket: usize,
}

impl<E: Environment> Tournament<E> {
    /// Creates a new tournament scheduler around an environment.
    pub fn new(environment: E, config: TournamentConfig) -> Tournament<E> {
        Tournament {
            environment,
            config,
            champion_score: 0.0,
            champion_bracket: 0,
        }
    }

    /// Returns the current champion score anchor.
    pub fn champion_score(&self) -> f32 {
        self.champion_score
    }

    /// Restores a checkpointed champion score. The champion bracket
    /// is not persisted, so the first generation after a restore is
    /// anchored as if the previous champion had been eliminated
    /// immediately.
    pub fn restore_champion_score(&mut self, score: f32) {
        self.champion_score = score;
        self.champion_bracket = 0;
    }

    /// Returns a reference to the environment.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Runs a full single-elimination tournament over the current
    /// generation and assigns every genome's fitness.
    ///
    /// Fitness is `championScore + (bracket - championBracket) × 5`
    /// with the anchor taken from the previous generation, after
    /// which the anchor is replaced by the new champion's fitness
    /// and bracket.
    ///
    /// # Panics
    /// Panics unless the population size is a power of four, since
    /// every elimination round needs full brackets.
    pub fn execute(&mut self, population: &mut Population, rng: &mut impl Rng) {
        let workers = self
            .config
            .workers
            .or_else(|| thread::available_parallelism().ok())
            .map(NonZeroUsize::get)
            .unwrap_or(1);

        if self.config.verbose {
            println!("tournament #{}", population.generation());
        }

        let (networks, mut genomes) = population.contestants();
        for genome in genomes.iter_mut() {
            genome.set_bracket(0);
            genome.set_fitness(0.0);
            genome.set_adjusted_fitness(0.0);
        }
        for network in networks {
            network.reset_score();
        }

        let mut pool: Vec<usize> = (0..networks.len()).collect();

        while pool.len() > 1 {
            assert_eq!(
                pool.len() % 4,
                0,
                "bracket round with {} contestants; population size must be a power of four",
                pool.len()
            );
            if self.config.verbose {
                println!("\tround of {}", pool.len());
            }

            pool.shuffle(rng);
            for network in networks {
                network.reset_score();
            }

            let mut survivors = Vec::with_capacity(pool.len() / 4);
            for (number, bracket) in pool.chunks(4).enumerate() {
                if self.config.verbose {
                    println!("\t\tbracket {}", number);
                }
                let players = [
                    &networks[bracket[0]],
                    &networks[bracket[1]],
                    &networks[bracket[2]],
                    &networks[bracket[3]],
                ];

                let mut played = 0;
                while played < self.config.round_size {
                    self.run_batch(players, workers, rng);
                    played += workers * self.config.batch_size.get();

                    if self.config.verbose {
                        if let Some(report) = self.environment.progress() {
                            println!("{}", report);
                        }
                    }
                }

                // Strictly-highest score advances; ties keep the
                // earliest seat.
                let mut winner = 0;
                let mut best = players[0].score();
                for (seat, player) in players.iter().enumerate().skip(1) {
                    let score = player.score();
                    if best < score {
                        winner = seat;
                        best = score;
                    }
                }
                genomes[bracket[winner]].advance_bracket();
                survivors.push(bracket[winner]);
            }
            pool = survivors;
        }

        let champion = pool[0];
        let anchor = self.champion_score;
        let anchor_bracket = self.champion_bracket as f32;
        for genome in genomes.iter_mut() {
            let depth = genome.bracket() as f32 - anchor_bracket;
            genome.set_fitness(anchor + depth * 5.0);
        }

        self.champion_score = genomes[champion].fitness();
        self.champion_bracket = genomes[champion].bracket();
        if self.config.verbose {
            println!(
                "\tchampion score {} at bracket {}",
                self.champion_score, self.champion_bracket
            );
        }
    }

    /// Plays one fork-join batch: each worker thread plays
    /// `batch_size` full games sequentially with its own seeded
    /// generator, and all workers are joined before returning.
    fn run_batch(&self, players: [&Network; 4], workers: usize, rng: &mut impl Rng) {
        let batch_size = self.config.batch_size.get();
        let environment = &self.environment;

        thread::scope(|scope| {
            for _ in 0..workers {
                let seed = rng.gen::<u64>();
                scope.spawn(move || {
                    let mut worker_rng = StdRng::seed_from_u64(seed);
                    for _ in 0..batch_size {
                        match environment.play(players, &mut worker_rng) {
                            Outcome::Victory(seat) => players[seat].add_score(1.0),
                            Outcome::Draw => {
                                for player in players {
                                    player.add_score(0.25);
                                }
                            }
                        }
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, Genome};
    use crate::populations::PopulationConfig;
    use std::sync::Mutex;

    fn population(size: usize, rng: &mut impl Rng) -> Population {
        Population::new(
            PopulationConfig::standard(NonZeroUsize::new(size).unwrap()),
            GeneticConfig::standard(
                NonZeroUsize::new(2).unwrap(),
                NonZeroUsize::new(1).unwrap(),
            ),
            rng,
        )
    }

    fn config(round_size: usize, batch_size: usize, workers: usize) -> TournamentConfig {
        TournamentConfig {
            round_size,
            batch_size: NonZeroUsize::new(batch_size).unwrap(),
            workers: NonZeroUsize::new(workers),
            verbose: false,
        }
    }

    #[test]
    fn default_config_makes_progress() {
        // A zero batch would loop a bracket forever; the type rules
        // it out and the default plays 20 games per worker pass.
        let config = TournamentConfig::default();
        assert_eq!(config.batch_size.get(), 20);
        assert_eq!(config.round_size, 2000);
        assert!(config.workers.is_none());
    }

    struct AlwaysDraw;

    impl Environment for AlwaysDraw {
        fn play(&self, _players: [&Network; 4], _rng: &mut dyn RngCore) -> Outcome {
            Outcome::Draw
        }
    }

    /// Three wins for seat 2, then draws.
    struct Scripted {
        calls: Mutex<usize>,
    }

    impl Environment for Scripted {
        fn play(&self, _players: [&Network; 4], _rng: &mut dyn RngCore) -> Outcome {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= 3 {
                Outcome::Victory(2)
            } else {
                Outcome::Draw
            }
        }
    }

    #[test]
    fn scores_accumulate_per_outcome() {
        let mut rng = StdRng::seed_from_u64(20);
        let mut population = population(4, &mut rng);
        let mut tournament = Tournament::new(
            Scripted {
                calls: Mutex::new(0),
            },
            config(4, 4, 1),
        );

        tournament.execute(&mut population, &mut rng);

        // Three wins and one draw: the seat-2 network ends at
        // 3.0 + 0.25, the other three at 0.25 each.
        let mut scores: Vec<f32> = population.networks().iter().map(Network::score).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(scores, vec![0.25, 0.25, 0.25, 3.25]);

        // One round deep: the winner sits at bracket 1, fitness 5.
        let mut fitnesses: Vec<f32> = population.genomes().map(Genome::fitness).collect();
        fitnesses.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(fitnesses, vec![0.0, 0.0, 0.0, 5.0]);
        assert_eq!(tournament.champion_score(), 5.0);

        let winner = population
            .networks()
            .iter()
            .position(|n| n.score() == 3.25)
            .unwrap();
        let winner_genome = population.genomes().nth(winner).unwrap();
        assert_eq!(winner_genome.bracket(), 1);
        assert_eq!(winner_genome.fitness(), 5.0);
    }

    #[test]
    fn all_draws_advance_the_earliest_seat() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut population = population(16, &mut rng);
        let mut tournament = Tournament::new(AlwaysDraw, config(4, 2, 2));

        tournament.execute(&mut population, &mut rng);

        // 16 contestants, two elimination rounds: one champion at
        // bracket 2, three finalists at 1, twelve at 0.
        let mut brackets: Vec<usize> = population.genomes().map(Genome::bracket).collect();
        brackets.sort_unstable();
        assert_eq!(brackets, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 2]);

        let mut fitnesses: Vec<f32> = population.genomes().map(Genome::fitness).collect();
        fitnesses.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(fitnesses[12..], [5.0, 5.0, 5.0, 10.0]);
        assert_eq!(tournament.champion_score(), 10.0);
    }

    #[test]
    fn champion_anchor_keeps_fitness_bounded() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut population = population(16, &mut rng);
        let mut tournament = Tournament::new(AlwaysDraw, config(4, 2, 2));

        tournament.execute(&mut population, &mut rng);
        assert_eq!(tournament.champion_score(), 10.0);

        // The next pass is anchored to the previous champion: the
        // new champion re-earns exactly the anchor score, and
        // first-round losers bottom out at anchor - bracket × 5.
        tournament.execute(&mut population, &mut rng);
        let mut fitnesses: Vec<f32> = population.genomes().map(Genome::fitness).collect();
        fitnesses.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(fitnesses[0], 0.0);
        assert_eq!(fitnesses[15], 10.0);
        assert_eq!(tournament.champion_score(), 10.0);
    }

    #[test]
    fn restored_champion_score_resets_the_bracket_anchor() {
        let mut tournament = Tournament::new(AlwaysDraw, config(4, 2, 1));
        tournament.restore_champion_score(20.0);
        assert_eq!(tournament.champion_score(), 20.0);

        let mut rng = StdRng::seed_from_u64(23);
        let mut population = population(16, &mut rng);
        tournament.execute(&mut population, &mut rng);
        // Anchored at 20 with bracket anchor 0, the champion lands
        // at 20 + 2 × 5.
        assert_eq!(tournament.champion_score(), 30.0);
    }

    #[test]
    #[should_panic(expected = "power of four")]
    fn non_power_of_four_population_is_rejected() {
        let mut rng = StdRng::seed_from_u64(24);
        // 8 contestants survive the first round as 2, which cannot
        // form a bracket.
        let mut population = population(8, &mut rng);
        let mut tournament = Tournament::new(AlwaysDraw, config(4, 2, 2));
        tournament.execute(&mut population, &mut rng);
    }
}
