//! The demonstration dungeon: a walled rectangle with pillars, ice, and
//! fountains.
//!
//! Layout is derived entirely from the world seed so runs are reproducible.
//! Anything outside the rectangle reads as wall.

use delve_core::config::WorldConfig;
use delve_types::{Direction, Position};
use rand::Rng;
use serde::Serialize;

/// Smallest width or height that leaves room for a floor inside the walls.
const MIN_SIDE: u32 = 5;

/// Errors from dungeon construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DungeonError {
    /// The configured size leaves no interior.
    #[error("dungeon {width}x{height} is too small (minimum {MIN_SIDE}x{MIN_SIDE})")]
    TooSmall {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },

    /// The configured size does not fit in memory or coordinates.
    #[error("dungeon {width}x{height} is too large")]
    TooLarge {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },

    /// Generation left no floor cell to start the player on.
    #[error("dungeon has no open floor")]
    NoFloor,
}

/// One cell of the dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    /// Open ground.
    Floor,
    /// Impassable.
    Wall,
    /// Passable, but anything stepping onto it slides.
    Ice,
    /// Passable point of interest.
    Fountain,
}

impl Tile {
    /// Whether an actor can stand here.
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// The dungeon grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dungeon {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Dungeon {
    /// An open room of the given size with walls around the edge.
    ///
    /// # Errors
    ///
    /// Returns [`DungeonError`] if either side is shorter than 5 cells or
    /// the grid is too large to address.
    pub fn walled(width: u32, height: u32) -> Result<Self, DungeonError> {
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(DungeonError::TooSmall { width, height });
        }
        let too_large = DungeonError::TooLarge { width, height };
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(too_large);
        }
        let cells = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| too_large.clone())?;

        let mut dungeon = Self {
            width,
            height,
            tiles: vec![Tile::Floor; cells],
        };
        for pos in dungeon.positions().collect::<Vec<_>>() {
            if dungeon.on_edge(pos) {
                dungeon.set(pos, Tile::Wall);
            }
        }
        Ok(dungeon)
    }

    /// Build the dungeon described by `config`, scattering pillars, ice
    /// patches, and fountains with `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`DungeonError`] if the configured size is unusable.
    pub fn generate(config: &WorldConfig, rng: &mut impl Rng) -> Result<Self, DungeonError> {
        let mut dungeon = Self::walled(config.width, config.height)?;

        // Pillars: roughly one interior cell in thirty.
        let pillars = dungeon.interior_cells() / 30;
        for _ in 0..pillars {
            if let Some(pos) = dungeon.random_floor(rng) {
                dungeon.set(pos, Tile::Wall);
            }
        }

        // Ice patches: short horizontal or vertical strips.
        for _ in 0..config.ice_patches {
            let Some(start) = dungeon.random_floor(rng) else {
                break;
            };
            let direction = if rng.random_bool(0.5) {
                Direction::East
            } else {
                Direction::South
            };
            let length = rng.random_range(2..=4);
            let mut pos = start;
            for _ in 0..length {
                if dungeon.tile(pos) != Tile::Floor {
                    break;
                }
                dungeon.set(pos, Tile::Ice);
                match pos.step(direction) {
                    Some(next) => pos = next,
                    None => break,
                }
            }
        }

        for _ in 0..config.fountains {
            if let Some(pos) = dungeon.random_floor(rng) {
                dungeon.set(pos, Tile::Fountain);
            }
        }

        Ok(dungeon)
    }

    /// Width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The tile at `pos`; wall outside the grid.
    pub fn tile(&self, pos: Position) -> Tile {
        self.index(pos)
            .and_then(|i| self.tiles.get(i))
            .copied()
            .unwrap_or(Tile::Wall)
    }

    /// Overwrite the tile at `pos`. Positions outside the grid are ignored.
    pub fn set(&mut self, pos: Position, tile: Tile) {
        if let Some(slot) = self.index(pos).and_then(|i| self.tiles.get_mut(i)) {
            *slot = tile;
        }
    }

    /// Whether any of the eight neighbours of `pos` is a fountain.
    pub fn fountain_adjacent(&self, pos: Position) -> bool {
        Direction::ALL
            .iter()
            .filter_map(|&dir| pos.step(dir))
            .any(|next| self.tile(next) == Tile::Fountain)
    }

    /// A uniformly chosen floor cell, or `None` if a bounded number of
    /// tries finds none.
    pub fn random_floor(&self, rng: &mut impl Rng) -> Option<Position> {
        let max_x = i32::try_from(self.width).ok()?.checked_sub(1)?;
        let max_y = i32::try_from(self.height).ok()?.checked_sub(1)?;
        for _ in 0..256 {
            let pos = Position::new(rng.random_range(1..max_x), rng.random_range(1..max_y));
            if self.tile(pos) == Tile::Floor {
                return Some(pos);
            }
        }
        None
    }

    /// The floor cell nearest the centre, scanning outward row by row.
    pub fn central_floor(&self) -> Option<Position> {
        let centre = Position::new(
            i32::try_from(self.width / 2).ok()?,
            i32::try_from(self.height / 2).ok()?,
        );
        self.positions()
            .filter(|&pos| self.tile(pos) == Tile::Floor)
            .min_by_key(|&pos| (pos.distance(centre), pos.y, pos.x))
    }

    /// Render as text, one row per line.
    pub fn render(&self, marks: &[(Position, char)]) -> String {
        let mut out = String::new();
        let mut row = None;
        for pos in self.positions() {
            if row.is_some_and(|y| y != pos.y) {
                out.push('\n');
            }
            row = Some(pos.y);
            let glyph = marks
                .iter()
                .rev()
                .find(|(at, _)| *at == pos)
                .map_or_else(
                    || match self.tile(pos) {
                        Tile::Floor => '.',
                        Tile::Wall => '#',
                        Tile::Ice => '~',
                        Tile::Fountain => '{',
                    },
                    |&(_, glyph)| glyph,
                );
            out.push(glyph);
        }
        out
    }

    fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let width = i32::try_from(self.width).unwrap_or(0);
        let height = i32::try_from(self.height).unwrap_or(0);
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    fn on_edge(&self, pos: Position) -> bool {
        let last_x = i64::from(self.width).saturating_sub(1);
        let last_y = i64::from(self.height).saturating_sub(1);
        pos.x == 0 || pos.y == 0 || i64::from(pos.x) == last_x || i64::from(pos.y) == last_y
    }

    fn interior_cells(&self) -> u32 {
        self.width
            .saturating_sub(2)
            .saturating_mul(self.height.saturating_sub(2))
    }

    fn index(&self, pos: Position) -> Option<usize> {
        let x = u32::try_from(pos.x).ok()?;
        let y = u32::try_from(pos.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let flat = y.checked_mul(self.width)?.checked_add(x)?;
        usize::try_from(flat).ok()
    }
}
