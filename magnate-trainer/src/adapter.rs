//! Sensory encoding: packs game state into the fixed input vector
//! the player networks are evolved against.
//!
//! The pack is 126 floats, laid out in blocks:
//!
//! | offset | size | contents                                  |
//! |--------|------|-------------------------------------------|
//! | 0      | 4    | whose turn it is, one-hot                 |
//! | 4      | 4    | player positions, normalized by tile 39   |
//! | 8      | 4    | player money, normalized by 4000, clamped |
//! | 12     | 4    | reserved (card holdings)                  |
//! | 16     | 4    | jail flags                                |
//! | 20     | 28   | per-property owner, (seat + 1) / 4        |
//! | 48     | 28   | per-property mortgage flags               |
//! | 76     | 22   | reserved (house counts)                   |
//! | 98     | 28   | decision context, one-hot property        |
//!
//! Only the 28 purchasable tiles of the 40-tile board get property
//! slots; [`property_slot`] maps board positions to them.

const TURN: usize = 0;
const POSITION: usize = 4;
const MONEY: usize = 8;
const JAIL: usize = 16;
const OWNER: usize = 20;
const MORTGAGE: usize = 48;
const SELECT: usize = 98;

/// Number of sensors, and thus network inputs.
pub const SENSORS: usize = 126;

/// Normalization bound for money values: one pack unit of money.
pub const MONEY_SCALE: f32 = 4000.0;

/// Property slot for each of the 40 board tiles, or -1 for tiles
/// that cannot be owned.
const PROPERTY_SLOTS: [i8; 40] = [
    -1, 0, -1, 1, -1, 2, 3, -1, 4, 5, -1, 6, 7, 8, 9, 10, 11, -1, 12, 13, -1, 14, -1, 15, 16,
    17, 18, 19, 20, 21, -1, 22, 23, -1, 24, 25, -1, 26, -1, 27,
];

/// Returns the property slot of a board tile, if it is ownable.
pub fn property_slot(tile: usize) -> Option<usize> {
    match PROPERTY_SLOTS[tile] {
        -1 => None,
        slot => Some(slot as usize),
    }
}

/// The input vector under construction for one game.
///
/// One pack is shared by all four players of a game and updated
/// in place as the game progresses; the acting player and decision
/// context blocks are rewritten before every decision.
#[derive(Clone, Debug)]
pub struct SensorPack {
    values: [f32; SENSORS],
}

impl SensorPack {
    pub fn new() -> SensorPack {
        SensorPack {
            values: [0.0; SENSORS],
        }
    }

    /// Returns the packed sensor values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Marks the acting player, one-hot.
    pub fn set_turn(&mut self, seat: usize) {
        for slot in &mut self.values[TURN..TURN + 4] {
            *slot = 0.0;
        }
        self.values[TURN + seat] = 1.0;
    }

    /// Records a player's board position, normalized to [0, 1].
    pub fn set_position(&mut self, seat: usize, tile: usize) {
        self.values[POSITION + seat] = (tile as f32 / 39.0).clamp(0.0, 1.0);
    }

    /// Records a player's money, normalized by [`MONEY_SCALE`] and
    /// clamped to [0, 1].
    pub fn set_money(&mut self, seat: usize, money: i64) {
        self.values[MONEY + seat] = (money as f32 / MONEY_SCALE).clamp(0.0, 1.0);
    }

    /// Records whether a player sits in jail.
    pub fn set_jail(&mut self, seat: usize, jailed: bool) {
        self.values[JAIL + seat] = if jailed { 1.0 } else { 0.0 };
    }

    /// Records a property's owner: 0 when unowned, otherwise
    /// `(seat + 1) / 4`.
    pub fn set_owner(&mut self, tile: usize, owner: Option<usize>) {
        if let Some(slot) = property_slot(tile) {
            self.values[OWNER + slot] = match owner {
                Some(seat) => (seat as f32 + 1.0) / 4.0,
                None => 0.0,
            };
        }
    }

    /// Records a property's mortgage flag.
    pub fn set_mortgage(&mut self, tile: usize, mortgaged: bool) {
        if let Some(slot) = property_slot(tile) {
            self.values[MORTGAGE + slot] = if mortgaged { 1.0 } else { 0.0 };
        }
    }

    /// Marks the property a decision is about, one-hot.
    pub fn set_selection(&mut self, tile: usize) {
        self.clear_selection();
        if let Some(slot) = property_slot(tile) {
            self.values[SELECT + slot] = 1.0;
        }
    }

    /// Clears the decision context block.
    pub fn clear_selection(&mut self) {
        for slot in &mut self.values[SELECT..SELECT + 28] {
            *slot = 0.0;
        }
    }
}

impl Default for SensorPack {
    fn default() -> SensorPack {
        SensorPack::new()
    }
}
