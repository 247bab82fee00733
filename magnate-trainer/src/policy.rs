//! Player decision points, as a capability trait.
//!
//! The game engine never talks to networks directly; it asks a
//! [`DecisionPolicy`] at each decision point. [`NetworkPolicy`]
//! backs the decisions with network inference over the sensor
//! pack, and [`ScriptedPolicy`] is a fixed baseline used for
//! testing the engine without evolution in the loop.

use crate::adapter::{SensorPack, MONEY_SCALE};

use magnate::networks::Network;

/// The decision points a player must answer during a game.
pub trait DecisionPolicy {
    /// Buy the selected property at list price, or send it to
    /// auction?
    fn buy(&self, sensors: &SensorPack) -> bool;

    /// Mortgage the selected property to raise cash?
    fn mortgage(&self, sensors: &SensorPack) -> bool;

    /// Auction bid for the selected property, in money units.
    fn bid(&self, sensors: &SensorPack) -> i64;

    /// Offer a trade for the selected property?
    fn offer_trade(&self, sensors: &SensorPack) -> bool;

    /// Accept the trade offered for the selected property?
    fn accept_trade(&self, sensors: &SensorPack) -> bool;
}

/// Decisions backed by network inference.
///
/// Output decoding: output 0 is the buy gate, 2 the mortgage gate,
/// 4 the auction bid scaled by [`MONEY_SCALE`], 7 and 8 the trade
/// offer and accept gates. Gates open strictly above 0.5. The
/// remaining outputs are reserved for decision points this engine
/// does not exercise.
pub struct NetworkPolicy<'a> {
    network: &'a Network,
}

impl<'a> NetworkPolicy<'a> {
    pub fn new(network: &'a Network) -> NetworkPolicy<'a> {
        NetworkPolicy { network }
    }
}

impl DecisionPolicy for NetworkPolicy<'_> {
    fn buy(&self, sensors: &SensorPack) -> bool {
        self.network.activate(sensors.values())[0] > 0.5
    }

    fn mortgage(&self, sensors: &SensorPack) -> bool {
        self.network.activate(sensors.values())[2] > 0.5
    }

    fn bid(&self, sensors: &SensorPack) -> i64 {
        (self.network.activate(sensors.values())[4] * MONEY_SCALE) as i64
    }

    fn offer_trade(&self, sensors: &SensorPack) -> bool {
        self.network.activate(sensors.values())[7] > 0.5
    }

    fn accept_trade(&self, sensors: &SensorPack) -> bool {
        self.network.activate(sensors.values())[8] > 0.5
    }
}

/// A fixed baseline: buys everything it can, mortgages when asked,
/// bids a flat amount, never trades.
pub struct ScriptedPolicy;

impl DecisionPolicy for ScriptedPolicy {
    fn buy(&self, _sensors: &SensorPack) -> bool {
        true
    }

    fn mortgage(&self, _sensors: &SensorPack) -> bool {
        true
    }

    fn bid(&self, _sensors: &SensorPack) -> i64 {
        100
    }

    fn offer_trade(&self, _sensors: &SensorPack) -> bool {
        false
    }

    fn accept_trade(&self, _sensors: &SensorPack) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magnate::genomics::{GeneticConfig, Genome};
    use std::num::NonZeroUsize;

    fn seed_network() -> Network {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(crate::adapter::SENSORS).unwrap(),
            output_count: NonZeroUsize::new(9).unwrap(),
            ..GeneticConfig::zero()
        };
        Network::from(&Genome::new(&config))
    }

    #[test]
    fn seed_network_gates_stay_closed() {
        // The seed genome's only connection feeds output 0 with
        // weight 0, so the buy gate sits at sigmoid(0) = 0.5, which
        // is not strictly above the threshold. The other outputs
        // have no incoming connections and hold 0.
        let network = seed_network();
        let policy = NetworkPolicy::new(&network);
        let pack = SensorPack::new();

        assert!(!policy.buy(&pack));
        assert!(!policy.mortgage(&pack));
        assert!(!policy.offer_trade(&pack));
        assert!(!policy.accept_trade(&pack));
        assert_eq!(policy.bid(&pack), 0);
    }

    #[test]
    fn scripted_baseline_is_deterministic() {
        let policy = ScriptedPolicy;
        let pack = SensorPack::new();
        assert!(policy.buy(&pack));
        assert!(policy.mortgage(&pack));
        assert_eq!(policy.bid(&pack), 100);
        assert!(!policy.offer_trade(&pack));
    }
}
