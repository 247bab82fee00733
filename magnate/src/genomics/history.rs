use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// One historical marking: the record that some genome, at some
/// point in the run, first connected `source` to `destination`.
/// `order` is the innovation number assigned to that structure.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Marking {
    pub order: Innovation,
    pub source: usize,
    pub destination: usize,
}

/// The run-wide registry of structural innovations.
///
/// A `History` assigns each unique (source, destination) node pair
/// a single innovation number for the life of the run, so that two
/// genomes which independently evolve the same connection can be
/// aligned gene-by-gene during crossover and speciation. The record
/// is append-only and is persisted with checkpoints, so a resumed
/// run keeps historical identity intact.
///
/// # Examples
/// ```
/// use magnate::genomics::{GeneticConfig, History};
/// use std::num::NonZeroUsize;
///
/// let config = GeneticConfig {
///     input_count: NonZeroUsize::new(3).unwrap(),
///     output_count: NonZeroUsize::new(2).unwrap(),
///     ..GeneticConfig::zero()
/// };
///
/// // Every input-output pair is pre-registered, so mutations
/// // start allocating at 3 × 2.
/// let mut history = History::new(&config);
/// assert_eq!(history.len(), 6);
///
/// let innovation = history.register(4, 3);
/// assert_eq!(innovation, 6);
///
/// // Registration is idempotent.
/// assert_eq!(history.register(4, 3), innovation);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct History {
    markings: Vec<Marking>,
    endpoints: HashMap<(usize, usize), Innovation, RandomState>,
}

impl History {
    /// Creates a new history, pre-registering a marking for every
    /// (input, output) node pair of the configured topology.
    ///
    /// Pre-registration pins the innovation numbers of all possible
    /// seed connections: the pair `(i, o)` receives number
    /// `o_idx + i × output_count`. In particular the seed genome's
    /// single edge, node 0 to the first output node, is innovation 0.
    pub fn new(config: &GeneticConfig) -> History {
        let inputs = config.input_count.get();
        let outputs = config.output_count.get();

        let mut history = History {
            markings: Vec::with_capacity(inputs * outputs),
            endpoints: HashMap::default(),
        };
        for i in 0..inputs {
            for o in 0..outputs {
                history.register(i, o + inputs);
            }
        }
        history
    }

    /// Rebuilds a history from a previously recorded marking list,
    /// as stored in a checkpoint. Marking order must match list
    /// position.
    pub(crate) fn from_markings(markings: Vec<Marking>) -> History {
        let endpoints = markings
            .iter()
            .map(|m| ((m.source, m.destination), m.order))
            .collect();
        History {
            markings,
            endpoints,
        }
    }

    /// Returns the innovation number for the given node pair,
    /// assigning the next free number if the pair has never been
    /// seen before in this run.
    pub fn register(&mut self, source: usize, destination: usize) -> Innovation {
        if let Some(order) = self.endpoints.get(&(source, destination)) {
            return *order;
        }

        let order = self.markings.len();
        self.markings.push(Marking {
            order,
            source,
            destination,
        });
        self.endpoints.insert((source, destination), order);
        order
    }

    /// Returns the number of markings recorded so far.
    pub fn len(&self) -> usize {
        self.markings.len()
    }

    /// Returns `true` if no markings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }

    /// Returns an iterator over all markings, in registration order.
    pub fn markings(&self) -> impl Iterator<Item = &Marking> {
        self.markings.iter()
    }
}
