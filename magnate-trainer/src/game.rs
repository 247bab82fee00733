//! The fitness environment: a 4-player property race on a 40-tile
//! board.
//!
//! This is a deliberately reduced rules engine. It keeps the parts
//! that exercise the decision policies (buying, auctions, rent,
//! mortgaging, trades, bankruptcy) and drops everything else; its
//! job is to separate stronger players from weaker ones, not to be
//! a faithful board game. Games always terminate: a fixed stalemate
//! round limit forces a draw.

use crate::adapter::{property_slot, SensorPack};
use crate::analytics::Analytics;
use crate::policy::{DecisionPolicy, NetworkPolicy};

use magnate::networks::Network;
use magnate::tournament::{Environment, Outcome};

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Rounds of four turns before a game is called a draw.
pub const STALEMATE_ROUNDS: usize = 300;

const STARTING_MONEY: i64 = 1500;
const GO_SALARY: i64 = 200;
const JAIL_TILE: usize = 10;
const GO_TO_JAIL_TILE: usize = 30;
/// Premium over list price a trade offer carries.
const TRADE_PREMIUM: f32 = 1.1;

/// List price per tile; 0 marks tiles that trigger nothing on
/// their own. Tiles with a price but no property slot are taxes.
const COSTS: [i64; 40] = [
    0, 60, 0, 60, 200, 200, 100, 0, 100, 120, 0, 140, 150, 140, 160, 200, 180, 0, 180, 200, 0,
    220, 0, 220, 240, 200, 260, 260, 150, 280, 0, 300, 300, 0, 320, 200, 0, 250, 100, 400,
];

enum GameEnd {
    Winner(usize),
    Stalemate,
}

struct Seat {
    position: usize,
    money: i64,
    jailed: bool,
    retired: bool,
}

struct Table<'a> {
    policies: [&'a dyn DecisionPolicy; 4],
    seats: [Seat; 4],
    owners: [Option<usize>; 40],
    mortgaged: [bool; 40],
    pack: SensorPack,
    remaining: usize,
}

impl<'a> Table<'a> {
    fn new(policies: [&'a dyn DecisionPolicy; 4]) -> Table<'a> {
        Table {
            policies,
            seats: std::array::from_fn(|_| Seat {
                position: 0,
                money: STARTING_MONEY,
                jailed: false,
                retired: false,
            }),
            owners: [None; 40],
            mortgaged: [false; 40],
            pack: SensorPack::new(),
            remaining: 4,
        }
    }

    /// Rewrites the whole sensor pack from current table state.
    fn refresh_pack(&mut self, acting: usize) {
        self.pack.set_turn(acting);
        for seat in 0..4 {
            self.pack.set_position(seat, self.seats[seat].position);
            self.pack.set_money(seat, self.seats[seat].money);
            self.pack.set_jail(seat, self.seats[seat].jailed);
        }
        for tile in 0..COSTS.len() {
            self.pack.set_owner(tile, self.owners[tile]);
            self.pack.set_mortgage(tile, self.mortgaged[tile]);
        }
        self.pack.clear_selection();
    }

    fn take_turn(&mut self, seat: usize, analytics: &Analytics, rng: &mut dyn RngCore) {
        if self.seats[seat].jailed {
            self.seats[seat].jailed = false;
            return;
        }

        let roll = rng.gen_range(1..=6) + rng.gen_range(1..=6);
        let landed = (self.seats[seat].position + roll) % COSTS.len();
        if landed < self.seats[seat].position {
            self.seats[seat].money += GO_SALARY;
        }
        self.seats[seat].position = landed;
        self.refresh_pack(seat);

        if landed == GO_TO_JAIL_TILE {
            self.seats[seat].position = JAIL_TILE;
            self.seats[seat].jailed = true;
            return;
        }

        let cost = COSTS[landed];
        match property_slot(landed) {
            None => {
                // A priced tile without a slot is a tax.
                if cost > 0 {
                    self.charge(seat, cost, None);
                }
            }
            Some(_) => match self.owners[landed] {
                None => {
                    self.pack.set_selection(landed);
                    if self.policies[seat].buy(&self.pack) && self.seats[seat].money >= cost {
                        self.seats[seat].money -= cost;
                        self.owners[landed] = Some(seat);
                        self.pack.set_owner(landed, Some(seat));
                    } else {
                        self.auction(landed, analytics);
                    }
                    self.pack.clear_selection();
                }
                Some(owner) if owner != seat && !self.mortgaged[landed] => {
                    let rent = cost / 5;
                    self.charge(seat, rent, Some(owner));
                }
                Some(_) => {}
            },
        }

        if !self.seats[seat].retired {
            self.attempt_trade(seat, analytics, rng);
        }
    }

    /// Sells the tile to the highest strictly positive bidder,
    /// earliest seat on ties. Every bid is capped by the bidder's
    /// money and reported to analytics.
    fn auction(&mut self, tile: usize, analytics: &Analytics) {
        self.pack.set_selection(tile);

        let mut winner = None;
        let mut best = 0;
        for seat in 0..4 {
            if self.seats[seat].retired {
                continue;
            }
            let bid = self.policies[seat]
                .bid(&self.pack)
                .clamp(0, self.seats[seat].money);
            analytics.record_bid(tile, bid);
            if bid > best {
                best = bid;
                winner = Some(seat);
            }
        }

        if let Some(seat) = winner {
            self.seats[seat].money -= best;
            self.owners[tile] = Some(seat);
            self.pack.set_owner(tile, Some(seat));
        }
        self.pack.clear_selection();
    }

    /// Offers to buy one random opponent-owned tile at a premium
    /// over list price.
    fn attempt_trade(&mut self, seat: usize, analytics: &Analytics, rng: &mut dyn RngCore) {
        let candidates: Vec<usize> = (0..COSTS.len())
            .filter(|tile| matches!(self.owners[*tile], Some(owner) if owner != seat))
            .collect();
        let tile = match candidates.choose(rng) {
            Some(tile) => *tile,
            None => return,
        };
        let price = (COSTS[tile] as f32 * TRADE_PREMIUM) as i64;
        if self.seats[seat].money < price {
            return;
        }
        let owner = match self.owners[tile] {
            Some(owner) => owner,
            None => return,
        };

        self.pack.set_selection(tile);
        if self.policies[seat].offer_trade(&self.pack)
            && self.policies[owner].accept_trade(&self.pack)
        {
            self.seats[seat].money -= price;
            self.seats[owner].money += price;
            self.owners[tile] = Some(seat);
            self.pack.set_owner(tile, Some(seat));
            analytics.record_trade(tile);
        }
        self.pack.clear_selection();
    }

    /// Collects a payment, mortgaging the payer's properties while
    /// they are short and willing. An unpayable debt retires the
    /// payer: the creditor inherits their remaining money and
    /// tiles, or the bank absorbs them.
    fn charge(&mut self, seat: usize, amount: i64, creditor: Option<usize>) {
        while self.seats[seat].money < amount {
            let candidate = (0..COSTS.len())
                .find(|tile| self.owners[*tile] == Some(seat) && !self.mortgaged[*tile]);
            let tile = match candidate {
                Some(tile) => tile,
                None => break,
            };
            self.pack.set_selection(tile);
            let mortgage = self.policies[seat].mortgage(&self.pack);
            self.pack.clear_selection();
            if !mortgage {
                break;
            }
            self.mortgaged[tile] = true;
            self.seats[seat].money += COSTS[tile] / 2;
            self.pack.set_mortgage(tile, true);
        }

        if self.seats[seat].money >= amount {
            self.seats[seat].money -= amount;
            if let Some(creditor) = creditor {
                self.seats[creditor].money += amount;
            }
            return;
        }

        let leftover = self.seats[seat].money;
        self.seats[seat].money = 0;
        self.seats[seat].retired = true;
        self.remaining -= 1;
        if let Some(creditor) = creditor {
            self.seats[creditor].money += leftover;
        }
        for tile in 0..COSTS.len() {
            if self.owners[tile] == Some(seat) {
                self.owners[tile] = creditor;
                if creditor.is_none() {
                    self.mortgaged[tile] = false;
                }
            }
        }
    }

    fn survivor(&self) -> usize {
        self.seats
            .iter()
            .position(|seat| !seat.retired)
            .expect("all seats retired")
    }
}

/// The game as a tournament environment.
///
/// Seats are shuffled internally per game so that turn order is
/// not tied to bracket position; reported victories are indexed by
/// the player array as passed in.
pub struct EstateGame {
    analytics: Analytics,
}

impl EstateGame {
    pub fn new() -> EstateGame {
        EstateGame {
            analytics: Analytics::new(),
        }
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    fn run(&self, policies: [&dyn DecisionPolicy; 4], rng: &mut dyn RngCore) -> GameEnd {
        let mut table = Table::new(policies);

        for _ in 0..STALEMATE_ROUNDS {
            for seat in 0..4 {
                if table.seats[seat].retired {
                    continue;
                }
                table.take_turn(seat, &self.analytics, rng);
                if table.remaining == 1 {
                    let winner = table.survivor();
                    for tile in 0..COSTS.len() {
                        if table.owners[tile] == Some(winner) {
                            self.analytics.record_win(tile);
                        }
                    }
                    return GameEnd::Winner(winner);
                }
            }
        }
        GameEnd::Stalemate
    }
}

impl Default for EstateGame {
    fn default() -> EstateGame {
        EstateGame::new()
    }
}

impl Environment for EstateGame {
    fn play(&self, players: [&Network; 4], rng: &mut dyn RngCore) -> Outcome {
        let policies = players.map(NetworkPolicy::new);

        let mut order = [0, 1, 2, 3];
        order.shuffle(rng);
        let seated: [&dyn DecisionPolicy; 4] = [
            &policies[order[0]],
            &policies[order[1]],
            &policies[order[2]],
            &policies[order[3]],
        ];

        match self.run(seated, rng) {
            GameEnd::Winner(seat) => Outcome::Victory(order[seat]),
            GameEnd::Stalemate => Outcome::Draw,
        }
    }

    fn progress(&self) -> Option<String> {
        Some(self.analytics.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ScriptedPolicy;
    use magnate::genomics::{GeneticConfig, Genome};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    struct FixedBid(i64);

    impl DecisionPolicy for FixedBid {
        fn buy(&self, _sensors: &SensorPack) -> bool {
            false
        }
        fn mortgage(&self, _sensors: &SensorPack) -> bool {
            false
        }
        fn bid(&self, _sensors: &SensorPack) -> i64 {
            self.0
        }
        fn offer_trade(&self, _sensors: &SensorPack) -> bool {
            false
        }
        fn accept_trade(&self, _sensors: &SensorPack) -> bool {
            false
        }
    }

    fn seed_network() -> Network {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(crate::adapter::SENSORS).unwrap(),
            output_count: NonZeroUsize::new(9).unwrap(),
            ..GeneticConfig::zero()
        };
        Network::from(&Genome::new(&config))
    }

    #[test]
    fn auction_sells_to_the_highest_earliest_bidder() {
        let bidders = [FixedBid(50), FixedBid(200), FixedBid(200), FixedBid(10)];
        let policies: [&dyn DecisionPolicy; 4] =
            [&bidders[0], &bidders[1], &bidders[2], &bidders[3]];
        let mut table = Table::new(policies);
        let analytics = Analytics::new();

        table.auction(1, &analytics);

        assert_eq!(table.owners[1], Some(1));
        assert_eq!(table.seats[1].money, STARTING_MONEY - 200);
        assert_eq!(table.seats[2].money, STARTING_MONEY);
        assert_eq!(analytics.mean_bids()[1], (50.0 + 200.0 + 200.0 + 10.0) / 4.0);
    }

    #[test]
    fn zero_bids_leave_the_tile_unsold() {
        let bidders = [FixedBid(0), FixedBid(0), FixedBid(0), FixedBid(0)];
        let policies: [&dyn DecisionPolicy; 4] =
            [&bidders[0], &bidders[1], &bidders[2], &bidders[3]];
        let mut table = Table::new(policies);

        table.auction(1, &Analytics::new());
        assert_eq!(table.owners[1], None);
    }

    #[test]
    fn unpayable_debt_retires_the_seat_and_transfers_assets() {
        let policies: [&dyn DecisionPolicy; 4] = [
            &ScriptedPolicy,
            &ScriptedPolicy,
            &ScriptedPolicy,
            &ScriptedPolicy,
        ];
        let mut table = Table::new(policies);
        table.owners[1] = Some(0);
        table.seats[0].money = 10;

        table.charge(0, 5000, Some(2));

        assert!(table.seats[0].retired);
        assert_eq!(table.remaining, 3);
        assert_eq!(table.owners[1], Some(2));
        // Mortgage value of tile 1 plus the starting 10 go to the
        // creditor on top of their own funds.
        assert_eq!(table.seats[2].money, STARTING_MONEY + 10 + COSTS[1] / 2);
    }

    #[test]
    fn scripted_game_terminates() {
        let game = EstateGame::new();
        let policies: [&dyn DecisionPolicy; 4] = [
            &ScriptedPolicy,
            &ScriptedPolicy,
            &ScriptedPolicy,
            &ScriptedPolicy,
        ];
        let mut rng = StdRng::seed_from_u64(60);
        match game.run(policies, &mut rng) {
            GameEnd::Winner(seat) => assert!(seat < 4),
            GameEnd::Stalemate => {}
        }
    }

    #[test]
    fn seed_networks_play_to_a_stalemate() {
        // Seed networks never open their buy gates and bid zero,
        // so no property changes hands and nobody can go bankrupt.
        let game = EstateGame::new();
        let networks: Vec<Network> = (0..4).map(|_| seed_network()).collect();
        let players = [&networks[0], &networks[1], &networks[2], &networks[3]];

        let mut rng = StdRng::seed_from_u64(61);
        assert_eq!(game.play(players, &mut rng), Outcome::Draw);
        assert!(game.analytics().win_ratios().iter().all(|r| *r == 0.0));
    }
}
