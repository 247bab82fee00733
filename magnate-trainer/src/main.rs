//! Training binary: evolves property-game players for a fixed
//! number of generations, checkpointing after every one.

pub mod adapter;
pub mod analytics;
pub mod game;
pub mod policy;

use game::EstateGame;
use magnate::checkpoint::{self, CheckpointError};
use magnate::genomics::GeneticConfig;
use magnate::logging::Log;
use magnate::populations::{Population, PopulationConfig};
use magnate::tournament::{Tournament, TournamentConfig};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::num::NonZeroUsize;
use std::path::Path;
use std::process;

const CHECKPOINT_PATH: &str = "magnate_population.txt";
const GENERATIONS: usize = 1000;
const POPULATION_SIZE: usize = 256;

fn main() {
    if let Err(error) = run() {
        eprintln!("{}", error);
        process::exit(1);
    }
}

fn run() -> Result<(), CheckpointError> {
    let genetic_config = GeneticConfig::standard(
        NonZeroUsize::new(adapter::SENSORS).unwrap(),
        NonZeroUsize::new(9).unwrap(),
    );
    let population_config =
        PopulationConfig::standard(NonZeroUsize::new(POPULATION_SIZE).unwrap());

    let mut rng = StdRng::from_entropy();
    let mut tournament = Tournament::new(EstateGame::new(), TournamentConfig::default());

    let path = Path::new(CHECKPOINT_PATH);
    let mut population = if path.exists() {
        // A checkpoint that cannot be parsed is fatal; resuming
        // from partial state would corrupt innovation lineage.
        let (population, champion_score) =
            checkpoint::load(path, population_config, genetic_config)?;
        tournament.restore_champion_score(champion_score);
        println!(
            "resumed generation {} with champion score {}",
            population.generation(),
            champion_score,
        );
        population
    } else {
        Population::new(population_config, genetic_config, &mut rng)
    };

    for _ in 0..GENERATIONS {
        tournament.execute(&mut population, &mut rng);
        println!("{}", Log::new(&population));

        population.evolve(&mut rng);
        checkpoint::save(path, &population, tournament.champion_score())?;
    }

    Ok(())
}
