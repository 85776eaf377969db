//! Arena terrain and per-level map generation.
//!
//! Terrain lives on a fixed `MAP_SIZE` x `MAP_SIZE` grid with one bitset per
//! terrain kind. Level 1 uses the classic hand-made layout; later levels are
//! generated from a level-seeded RNG so every client and every test sees the
//! same map for the same level.

use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tank_protocol::packets::MapView;
use tank_protocol::{MAP_SIZE, TilePos};

/// Eagle position on every level.
pub const BASE_POSITION: TilePos = TilePos::new(12, 24);

/// Tiles within this Chebyshev distance of the base are fortified by a shovel.
const FORTIFY_RADIUS: i32 = 2;

/// Static terrain of one level.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    bricks: FixedBitSet,
    steel: FixedBitSet,
    water: FixedBitSet,
    trees: FixedBitSet,
    base: TilePos,
    fortification: Option<Fortification>,
}

/// Record of a temporary shovel upgrade so it can be undone exactly.
#[derive(Debug, Clone, PartialEq)]
struct Fortification {
    original_bricks: Vec<TilePos>,
    /// Ring tiles that were empty and got fresh steel.
    added_steel: Vec<TilePos>,
}

#[derive(Debug, Clone, Copy)]
enum Terrain {
    Brick,
    Steel,
    Water,
    Tree,
}

impl Map {
    /// A map with nothing but the base.
    pub fn empty(base: TilePos) -> Self {
        let cells = MAP_SIZE * MAP_SIZE;
        Self {
            bricks: FixedBitSet::with_capacity(cells),
            steel: FixedBitSet::with_capacity(cells),
            water: FixedBitSet::with_capacity(cells),
            trees: FixedBitSet::with_capacity(cells),
            base,
            fortification: None,
        }
    }

    /// Layout for `level` (1-based).
    pub fn generate(level: u32) -> Self {
        if level <= 1 {
            Self::default_layout()
        } else {
            Self::generated_layout(level)
        }
    }

    /// The opening layout: brick rows, four steel posts, a pond and two groves.
    pub fn default_layout() -> Self {
        let mut map = Self::empty(BASE_POSITION);

        for i in 0..13 {
            if i == 6 {
                continue; // central corridor
            }
            for y in [10, 14, 18] {
                map.place(Terrain::Brick, TilePos::new(i * 2, y));
                map.place(Terrain::Brick, TilePos::new(i * 2 + 1, y));
            }
        }

        for (x, y) in [(4, 12), (20, 12), (4, 24), (20, 24)] {
            map.place(Terrain::Steel, TilePos::new(x, y));
        }

        map.build_fortress();

        for i in 0..3 {
            for j in 0..2 {
                map.place(Terrain::Water, TilePos::new(10 + i, 15 + j));
                map.place(Terrain::Tree, TilePos::new(2 + i, 10 + j));
                map.place(Terrain::Tree, TilePos::new(20 + i, 10 + j));
            }
        }

        map
    }

    /// Mirror-symmetric random layout, denser in steel as levels rise.
    fn generated_layout(level: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(0x7A4B_0000 ^ u64::from(level));
        let mut map = Self::empty(BASE_POSITION);
        let steel_chance = (0.04 + 0.01 * level as f64).min(0.15);
        let last = MAP_SIZE as i32 - 1;

        // 2x2 blocks on the left half, mirrored to the right; columns 12-13
        // stay open as a corridor toward the base.
        for by in (2..22).step_by(2) {
            for bx in (0..12).step_by(2) {
                let roll: f64 = rng.random();
                let terrain = if roll < 0.35 {
                    Some(Terrain::Brick)
                } else if roll < 0.35 + steel_chance {
                    Some(Terrain::Steel)
                } else if roll < 0.40 + steel_chance {
                    Some(Terrain::Water)
                } else if roll < 0.48 + steel_chance {
                    Some(Terrain::Tree)
                } else {
                    None
                };
                let Some(terrain) = terrain else { continue };
                for dy in 0..2 {
                    for dx in 0..2 {
                        let x = bx + dx;
                        let y = by + dy;
                        map.place(terrain, TilePos::new(x, y));
                        map.place(terrain, TilePos::new(last - x, y));
                    }
                }
            }
        }

        map.build_fortress();
        map
    }

    /// Brick ring around the base.
    fn build_fortress(&mut self) {
        let base = self.base;
        for dx in -1..=1 {
            self.place(Terrain::Brick, TilePos::new(base.x + dx, base.y - 2));
            self.place(Terrain::Brick, TilePos::new(base.x + dx, base.y - 1));
        }
        for dy in -2..=0 {
            self.place(Terrain::Brick, TilePos::new(base.x - 2, base.y + dy));
            self.place(Terrain::Brick, TilePos::new(base.x + 2, base.y + dy));
        }
    }

    fn place(&mut self, terrain: Terrain, tile: TilePos) {
        let Some(idx) = index(tile) else { return };
        if tile == self.base {
            return;
        }
        match terrain {
            Terrain::Brick => self.bricks.insert(idx),
            Terrain::Steel => self.steel.insert(idx),
            Terrain::Water => self.water.insert(idx),
            Terrain::Tree => self.trees.insert(idx),
        }
    }

    #[inline]
    pub fn base(&self) -> TilePos {
        self.base
    }

    #[inline]
    pub fn is_brick(&self, tile: TilePos) -> bool {
        index(tile).is_some_and(|i| self.bricks.contains(i))
    }

    #[inline]
    pub fn is_steel(&self, tile: TilePos) -> bool {
        index(tile).is_some_and(|i| self.steel.contains(i))
    }

    #[inline]
    pub fn is_water(&self, tile: TilePos) -> bool {
        index(tile).is_some_and(|i| self.water.contains(i))
    }

    #[inline]
    pub fn is_tree(&self, tile: TilePos) -> bool {
        index(tile).is_some_and(|i| self.trees.contains(i))
    }

    #[inline]
    pub fn is_base(&self, tile: TilePos) -> bool {
        tile == self.base
    }

    /// Whether a tank may not occupy this tile. Trees never block.
    #[inline]
    pub fn blocks_tanks(&self, tile: TilePos) -> bool {
        self.is_brick(tile) || self.is_steel(tile) || self.is_water(tile) || self.is_base(tile)
    }

    /// Destroy a brick tile. Returns false if there was none.
    pub fn remove_brick(&mut self, tile: TilePos) -> bool {
        match index(tile) {
            Some(i) if self.bricks.contains(i) => {
                self.bricks.set(i, false);
                true
            }
            _ => false,
        }
    }

    pub fn is_fortified(&self) -> bool {
        self.fortification.is_some()
    }

    /// Turn every brick near the base into steel and close the ring of eight
    /// tiles around it, remembering what was there before.
    /// Returns false if the base was already fortified.
    pub fn fortify_base(&mut self) -> bool {
        if self.fortification.is_some() {
            return false;
        }
        let base = self.base;
        let original_bricks: Vec<TilePos> = self
            .bricks
            .ones()
            .map(tile_at)
            .filter(|t| t.chebyshev(base) <= FORTIFY_RADIUS)
            .collect();
        for &tile in &original_bricks {
            if let Some(i) = index(tile) {
                self.bricks.set(i, false);
                self.steel.insert(i);
            }
        }

        let mut added_steel = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let tile = TilePos::new(base.x + dx, base.y + dy);
                let Some(i) = index(tile) else { continue };
                if tile == base || self.steel.contains(i) {
                    continue;
                }
                self.steel.insert(i);
                added_steel.push(tile);
            }
        }

        self.fortification = Some(Fortification {
            original_bricks,
            added_steel,
        });
        true
    }

    /// Undo `fortify_base`: recorded bricks come back, added steel goes.
    /// Returns false if nothing was fortified.
    pub fn revert_fortification(&mut self) -> bool {
        let Some(fortification) = self.fortification.take() else {
            return false;
        };
        for tile in fortification.added_steel {
            if let Some(i) = index(tile) {
                self.steel.set(i, false);
            }
        }
        for tile in fortification.original_bricks {
            if let Some(i) = index(tile) {
                self.steel.set(i, false);
                self.bricks.insert(i);
            }
        }
        true
    }

    /// Tile lists for the wire.
    pub fn view(&self) -> MapView {
        MapView {
            walls: self.bricks.ones().map(tile_at).collect(),
            steel_walls: self.steel.ones().map(tile_at).collect(),
            water: self.water.ones().map(tile_at).collect(),
            trees: self.trees.ones().map(tile_at).collect(),
            base_position: self.base,
        }
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::default_layout()
    }
}

#[inline]
fn index(tile: TilePos) -> Option<usize> {
    let size = MAP_SIZE as i32;
    if tile.x < 0 || tile.y < 0 || tile.x >= size || tile.y >= size {
        return None;
    }
    Some(tile.y as usize * MAP_SIZE + tile.x as usize)
}

#[inline]
fn tile_at(idx: usize) -> TilePos {
    TilePos::new((idx % MAP_SIZE) as i32, (idx / MAP_SIZE) as i32)
}
