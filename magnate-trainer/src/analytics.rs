//! Per-tile training analytics.
//!
//! Games report auction bids, trades, and the tiles held by each
//! game's winner. The counters are shared by all worker threads of
//! a tournament batch, so they live behind one mutex held only for
//! the duration of an update.

use std::fmt::Write;
use std::sync::Mutex;

pub const BOARD_TILES: usize = 40;

#[derive(Clone, Copy, Default)]
struct TileRecord {
    bids: u32,
    bid_total: i64,
    trades: u32,
    wins: u32,
}

/// Mutex-guarded per-tile counters.
pub struct Analytics {
    tiles: Mutex<[TileRecord; BOARD_TILES]>,
}

impl Default for Analytics {
    fn default() -> Analytics {
        Analytics::new()
    }
}

impl Analytics {
    pub fn new() -> Analytics {
        Analytics {
            tiles: Mutex::new([TileRecord::default(); BOARD_TILES]),
        }
    }

    /// Records an auction bid on a tile.
    pub fn record_bid(&self, tile: usize, amount: i64) {
        let mut tiles = self.tiles.lock().unwrap();
        tiles[tile].bids += 1;
        tiles[tile].bid_total += amount;
    }

    /// Records a completed trade of a tile.
    pub fn record_trade(&self, tile: usize) {
        self.tiles.lock().unwrap()[tile].trades += 1;
    }

    /// Records that a game's winner held the tile.
    pub fn record_win(&self, tile: usize) {
        self.tiles.lock().unwrap()[tile].wins += 1;
    }

    /// Returns each tile's win count, min-max normalized over the
    /// tiles that have won at least once. All zeros until some game
    /// has produced a winner.
    pub fn win_ratios(&self) -> [f32; BOARD_TILES] {
        let tiles = self.tiles.lock().unwrap();

        let max = tiles.iter().map(|t| t.wins).max().unwrap_or(0);
        let min = tiles
            .iter()
            .map(|t| t.wins)
            .filter(|wins| *wins != 0)
            .min()
            .unwrap_or(0);

        let mut ratios = [0.0; BOARD_TILES];
        if max > min {
            for (ratio, tile) in ratios.iter_mut().zip(tiles.iter()) {
                *ratio = (tile.wins.saturating_sub(min)) as f32 / (max - min) as f32;
            }
        }
        ratios
    }

    /// Returns the mean bid per tile, 0 where no bids were made.
    pub fn mean_bids(&self) -> [f32; BOARD_TILES] {
        let tiles = self.tiles.lock().unwrap();
        let mut means = [0.0; BOARD_TILES];
        for (mean, tile) in means.iter_mut().zip(tiles.iter()) {
            if tile.bids > 0 {
                *mean = tile.bid_total as f32 / tile.bids as f32;
            }
        }
        means
    }

    /// Renders the win-ratio table for progress display.
    pub fn report(&self) -> String {
        let ratios = self.win_ratios();
        let mut report = String::new();
        for (tile, ratio) in ratios.iter().enumerate() {
            let _ = write!(report, "\t\t\ttile {:2}: {:.3}", tile, ratio);
            report.push('\n');
        }
        report.pop();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ratios_are_min_max_normalized() {
        let analytics = Analytics::new();
        for _ in 0..1 {
            analytics.record_win(1);
        }
        for _ in 0..3 {
            analytics.record_win(5);
        }
        for _ in 0..5 {
            analytics.record_win(9);
        }

        let ratios = analytics.win_ratios();
        assert_eq!(ratios[1], 0.0);
        assert_eq!(ratios[5], 0.5);
        assert_eq!(ratios[9], 1.0);
        assert_eq!(ratios[0], 0.0);
    }

    #[test]
    fn ratios_are_flat_before_any_spread() {
        let analytics = Analytics::new();
        assert!(analytics.win_ratios().iter().all(|r| *r == 0.0));
        analytics.record_win(3);
        assert!(analytics.win_ratios().iter().all(|r| *r == 0.0));
    }

    #[test]
    fn bids_average_per_tile() {
        let analytics = Analytics::new();
        analytics.record_bid(7, 100);
        analytics.record_bid(7, 300);
        assert_eq!(analytics.mean_bids()[7], 200.0);
        assert_eq!(analytics.mean_bids()[8], 0.0);
    }

    #[test]
    fn counters_tolerate_concurrent_updates() {
        let analytics = Analytics::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        analytics.record_win(0);
                        analytics.record_trade(1);
                        analytics.record_bid(2, 10);
                    }
                });
            }
        });
        let tiles = analytics.tiles.lock().unwrap();
        assert_eq!(tiles[0].wins, 400);
        assert_eq!(tiles[1].trades, 400);
        assert_eq!(tiles[2].bids, 400);
    }
}
