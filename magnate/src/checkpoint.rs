//! Checkpoint persistence for training runs.
//!
//! A checkpoint is a single delimited text record:
//!
//! ```text
//! generation;championScore;markings;speciesBlocks;
//! ```
//!
//! `markings` is a comma-joined flat list of
//! (order, source, destination) triples. `speciesBlocks` is a
//! `&`-joined alternating sequence of `topFitness,staleness`
//! headers and `n`-joined genome blocks, each block listing the
//! genome's nodes (`index,TYPE,` pairs), a `#` divider, and its
//! genes (`source,destination,weight,enabled,innovation,`
//! quintuples). Node types are written in upper case so that the
//! letter `n` can serve as the genome separator; they are parsed
//! case-insensitively.
//!
//! Loading reconstructs the innovation history, every species
//! header and every genome exactly, then re-materializes all
//! networks. A malformed checkpoint is an error the caller should
//! treat as fatal: proceeding on partially loaded state would
//! corrupt innovation lineage.

use crate::genomics::{Gene, GeneticConfig, Genome, History, Marking, Node, NodeType};
use crate::populations::{Population, PopulationConfig, Species};

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// An error in checkpoint reading, writing or parsing.
#[derive(Debug)]
pub enum CheckpointError {
    /// Underlying file I/O failed.
    Io(io::Error),
    /// The record is missing one of its four sections.
    MissingSection(&'static str),
    /// A numeric field failed to parse.
    Number {
        field: &'static str,
        text: String,
    },
    /// An enabled flag was neither `true` nor `false`.
    Boolean(String),
    /// A node type tag was not recognized.
    NodeType(String),
    /// A section's internal shape was wrong.
    Structure(&'static str),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(error) => {
                write!(f, "checkpoint I/O failed: {}", error)
            }
            CheckpointError::MissingSection(section) => {
                write!(f, "checkpoint is missing its {} section", section)
            }
            CheckpointError::Number { field, text } => {
                write!(f, "unparsable {} value {:?} in checkpoint", field, text)
            }
            CheckpointError::Boolean(text) => {
                write!(f, "unparsable enabled flag {:?} in checkpoint", text)
            }
            CheckpointError::NodeType(text) => {
                write!(f, "unrecognized node type {:?} in checkpoint", text)
            }
            CheckpointError::Structure(description) => {
                write!(f, "malformed checkpoint: {}", description)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<io::Error> for CheckpointError {
    fn from(error: io::Error) -> CheckpointError {
        CheckpointError::Io(error)
    }
}

/// Writes the population and champion score anchor to `path`,
/// overwriting any previous checkpoint there.
pub fn save(
    path: &Path,
    population: &Population,
    champion_score: f32,
) -> Result<(), CheckpointError> {
    let mut text = String::new();
    text.push_str(&format!("{};{};", population.generation(), champion_score));

    let markings: Vec<String> = population
        .history()
        .markings()
        .map(|m| format!("{},{},{}", m.order, m.source, m.destination))
        .collect();
    text.push_str(&markings.join(","));
    text.push(';');

    let mut blocks = Vec::with_capacity(population.species().len() * 2);
    for species in population.species() {
        blocks.push(format!("{},{}", species.top_fitness(), species.staleness()));
        let genomes: Vec<String> = species.members().iter().map(genome_block).collect();
        blocks.push(genomes.join("n"));
    }
    text.push_str(&blocks.join("&"));
    text.push(';');

    fs::write(path, text)?;
    Ok(())
}

/// Reads a checkpoint back into a population and its champion
/// score anchor, re-materializing all networks.
pub fn load(
    path: &Path,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
) -> Result<(Population, f32), CheckpointError> {
    let text = fs::read_to_string(path)?;
    let mut sections = text.split(';');

    let generation = number(
        "generation",
        sections
            .next()
            .ok_or(CheckpointError::MissingSection("generation"))?,
    )?;
    let champion_score = number(
        "champion score",
        sections
            .next()
            .ok_or(CheckpointError::MissingSection("champion score"))?,
    )?;
    let marking_section = sections
        .next()
        .ok_or(CheckpointError::MissingSection("markings"))?;
    let species_section = sections
        .next()
        .ok_or(CheckpointError::MissingSection("species"))?;

    let history = parse_markings(marking_section)?;
    let species = parse_species(species_section)?;

    let population = Population::from_parts(
        population_config,
        genetic_config,
        generation,
        history,
        species,
    );
    Ok((population, champion_score))
}

fn genome_block(genome: &Genome) -> String {
    let mut block = String::new();
    for node in genome.nodes() {
        block.push_str(&format!("{},{},", node.index(), type_tag(node.node_type())));
    }
    block.push('#');
    for gene in genome.edges() {
        block.push_str(&format!(
            "{},{},{},{},{},",
            gene.source(),
            gene.destination(),
            gene.weight(),
            gene.enabled(),
            gene.innovation(),
        ));
    }
    block
}

fn parse_markings(section: &str) -> Result<History, CheckpointError> {
    let fields: Vec<&str> = section.split(',').collect();
    if fields.len() % 3 != 0 {
        return Err(CheckpointError::Structure(
            "marking list length is not a multiple of three",
        ));
    }

    let mut markings = Vec::with_capacity(fields.len() / 3);
    for triple in fields.chunks(3) {
        let marking = Marking {
            order: number("marking order", triple[0])?,
            source: number("marking source", triple[1])?,
            destination: number("marking destination", triple[2])?,
        };
        if marking.order != markings.len() {
            return Err(CheckpointError::Structure("marking order out of sequence"));
        }
        markings.push(marking);
    }
    Ok(History::from_markings(markings))
}

fn parse_species(section: &str) -> Result<Vec<Species>, CheckpointError> {
    let blocks: Vec<&str> = section.split('&').collect();
    if blocks.len() % 2 != 0 {
        return Err(CheckpointError::Structure(
            "species headers and genome lists are not paired",
        ));
    }

    let mut species = Vec::with_capacity(blocks.len() / 2);
    for pair in blocks.chunks(2) {
        let header: Vec<&str> = pair[0].split(',').collect();
        if header.len() != 2 {
            return Err(CheckpointError::Structure(
                "species header is not a topFitness,staleness pair",
            ));
        }
        let top_fitness = number("species top fitness", header[0])?;
        let staleness = number("species staleness", header[1])?;

        let mut members = Vec::new();
        for block in pair[1].split('n') {
            members.push(parse_genome(block)?);
        }
        species.push(Species::from_parts(members, top_fitness, staleness));
    }
    Ok(species)
}

fn parse_genome(block: &str) -> Result<Genome, CheckpointError> {
    let (node_part, gene_part) = block
        .split_once('#')
        .ok_or(CheckpointError::Structure("genome block has no # divider"))?;

    // Trailing commas leave one empty field at the end of each part.
    let node_fields: Vec<&str> = node_part.split(',').collect();
    let mut nodes = Vec::new();
    let mut i = 0;
    while i + 1 < node_fields.len() {
        nodes.push(Node::new(
            parse_node_type(node_fields[i + 1])?,
            number("node index", node_fields[i])?,
        ));
        i += 2;
    }

    let gene_fields: Vec<&str> = gene_part.split(',').collect();
    let mut edges = Vec::new();
    let mut i = 0;
    while i + 4 < gene_fields.len() {
        edges.push(Gene::new(
            number("gene innovation", gene_fields[i + 4])?,
            number("gene source", gene_fields[i])?,
            number("gene destination", gene_fields[i + 1])?,
            number("gene weight", gene_fields[i + 2])?,
            parse_enabled(gene_fields[i + 3])?,
        ));
        i += 5;
    }

    Ok(Genome::from_parts(nodes, edges))
}

fn number<T: FromStr>(field: &'static str, text: &str) -> Result<T, CheckpointError> {
    text.trim().parse().map_err(|_| CheckpointError::Number {
        field,
        text: text.to_string(),
    })
}

fn parse_enabled(text: &str) -> Result<bool, CheckpointError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CheckpointError::Boolean(text.to_string()))
    }
}

fn type_tag(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Input => "INPUT",
        NodeType::Output => "OUTPUT",
        NodeType::Hidden => "HIDDEN",
    }
}

fn parse_node_type(text: &str) -> Result<NodeType, CheckpointError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "input" => Ok(NodeType::Input),
        "output" => Ok(NodeType::Output),
        "hidden" => Ok(NodeType::Hidden),
        _ => Err(CheckpointError::NodeType(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    fn configs(size: usize) -> (PopulationConfig, GeneticConfig) {
        (
            PopulationConfig::standard(NonZeroUsize::new(size).unwrap()),
            GeneticConfig::standard(
                NonZeroUsize::new(4).unwrap(),
                NonZeroUsize::new(3).unwrap(),
            ),
        )
    }

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn round_trips_a_population() {
        let (population_config, genetic_config) = configs(16);
        let mut rng = StdRng::seed_from_u64(40);
        let mut population =
            Population::new(population_config.clone(), genetic_config.clone(), &mut rng);
        for _ in 0..3 {
            for (rank, genome) in population.contestants().1.into_iter().enumerate() {
                genome.set_fitness((16 - rank) as f32);
            }
            population.evolve(&mut rng);
        }

        let path = scratch_file("magnate-checkpoint-round-trip.txt");
        save(&path, &population, 17.5).unwrap();
        let (restored, champion_score) =
            load(&path, population_config, genetic_config).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(champion_score, 17.5);
        assert_eq!(restored.generation(), population.generation());
        assert_eq!(
            restored.history().markings().collect::<Vec<_>>(),
            population.history().markings().collect::<Vec<_>>()
        );
        assert_eq!(restored.species().len(), population.species().len());
        for (a, b) in restored.species().iter().zip(population.species()) {
            assert_eq!(a.top_fitness(), b.top_fitness());
            assert_eq!(a.staleness(), b.staleness());
            assert_eq!(a.len(), b.len());
            for (ga, gb) in a.members().iter().zip(b.members()) {
                assert_eq!(
                    ga.nodes().collect::<Vec<_>>(),
                    gb.nodes().collect::<Vec<_>>()
                );
                assert_eq!(
                    ga.edges().collect::<Vec<_>>(),
                    gb.edges().collect::<Vec<_>>()
                );
            }
        }
        assert_eq!(restored.networks().len(), population.networks().len());
    }

    #[test]
    fn missing_sections_are_rejected() {
        let path = scratch_file("magnate-checkpoint-missing.txt");
        std::fs::write(&path, "3;12.5").unwrap();
        let (population_config, genetic_config) = configs(4);
        let result = load(&path, population_config, genetic_config);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(CheckpointError::MissingSection("markings"))
        ));
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let path = scratch_file("magnate-checkpoint-number.txt");
        std::fs::write(&path, "x;0;0,0,1;0,0&0,INPUT,1,OUTPUT,#0,1,0,true,0,;").unwrap();
        let (population_config, genetic_config) = configs(4);
        let result = load(&path, population_config, genetic_config);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(CheckpointError::Number {
                field: "generation",
                ..
            })
        ));
    }

    #[test]
    fn unknown_node_types_are_rejected() {
        let path = scratch_file("magnate-checkpoint-nodetype.txt");
        std::fs::write(&path, "0;0;0,0,1;0,0&0,SIDEWAYS,1,OUTPUT,#0,1,0,true,0,;").unwrap();
        let (population_config, genetic_config) = configs(4);
        let result = load(&path, population_config, genetic_config);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CheckpointError::NodeType(_))));
    }

    #[test]
    fn out_of_sequence_markings_are_rejected() {
        let path = scratch_file("magnate-checkpoint-order.txt");
        std::fs::write(&path, "0;0;5,0,1;0,0&0,INPUT,1,OUTPUT,#0,1,0,true,0,;").unwrap();
        let (population_config, genetic_config) = configs(4);
        let result = load(&path, population_config, genetic_config);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CheckpointError::Structure(_))));
    }

    #[test]
    fn node_types_parse_case_insensitively() {
        assert_eq!(parse_node_type("INPUT").unwrap(), NodeType::Input);
        assert_eq!(parse_node_type("Hidden").unwrap(), NodeType::Hidden);
        assert_eq!(parse_node_type("output").unwrap(), NodeType::Output);
        assert!(parse_node_type("").is_err());
    }

    #[test]
    fn weights_survive_text_formatting_exactly() {
        let value: f32 = -1.234_567_9e-3;
        let text = format!("{}", value);
        assert_eq!(text.parse::<f32>().unwrap(), value);
    }
}
