//! Tile storage, neighbour lookup and road connectivity.

use addd_core::{Direction, GridSnapshot, RoadShape, TileCoord, TileKind, TileSnapshot};

/// A single grid square.
///
/// Tiles compare equal when their coordinates match, whatever their kind.
#[derive(Clone, Copy, Debug)]
pub struct Tile {
    coord: TileCoord,
    kind: TileKind,
}

impl Tile {
    /// Placeholder returned for every out-of-bounds lookup.
    pub const DUMMY: Tile = Tile {
        coord: TileCoord::SENTINEL,
        kind: TileKind::Empty,
    };

    const fn new(coord: TileCoord, kind: TileKind) -> Self {
        Self { coord, kind }
    }

    /// Location of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.coord.x()
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.coord.y()
    }

    /// Current kind of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Reports whether this is the out-of-bounds sentinel.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.coord == TileCoord::SENTINEL
    }

    /// Reports whether NPCs may travel across this tile.
    #[must_use]
    pub fn is_network(&self) -> bool {
        !self.is_dummy() && self.kind.is_network()
    }

    /// Reports whether both tiles are real and share an edge.
    #[must_use]
    pub fn is_neighbour(&self, other: &Tile) -> bool {
        !self.is_dummy() && !other.is_dummy() && self.coord.is_cardinal_neighbour(other.coord)
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for Tile {}

impl std::hash::Hash for Tile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coord.hash(state);
    }
}

/// Largest number of tiles a grid may hold (1024 × 1024).
pub const MAX_GRID_TILES: u64 = 1 << 20;

/// Dense `width × height` tile storage in row-major order.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    revision: u64,
}

impl TileGrid {
    /// Reports whether a `width × height` grid is non-empty and within
    /// [`MAX_GRID_TILES`].
    #[must_use]
    pub fn fits(width: u32, height: u32) -> bool {
        width > 0 && height > 0 && u64::from(width) * u64::from(height) <= MAX_GRID_TILES
    }

    /// Creates a grid filled with empty tiles.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity(cell_count(width, height));
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(coord_from(x, y), TileKind::Empty));
            }
        }
        Self {
            width,
            height,
            tiles,
            revision: 0,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the coordinate maps to a real tile.
    #[must_use]
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.index(coord).is_some()
    }

    /// Returns the tile at `coord`, or [`Tile::DUMMY`] when out of bounds.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Tile {
        self.index(coord)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(Tile::DUMMY)
    }

    /// Returns the tile at `(x, y)`, or [`Tile::DUMMY`] when out of bounds.
    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        self.tile(TileCoord::new(x, y))
    }

    /// Returns the adjacent tile in `direction`, or the sentinel at the border.
    #[must_use]
    pub fn neighbour(&self, coord: TileCoord, direction: Direction) -> Tile {
        self.tile(coord.step(direction))
    }

    /// The four cardinal neighbours in N, E, S, W order.
    #[must_use]
    pub fn neighbours(&self, coord: TileCoord) -> [Tile; 4] {
        Direction::ALL.map(|direction| self.neighbour(coord, direction))
    }

    /// Cardinal neighbours that belong to the travel network.
    pub fn network_neighbours(&self, coord: TileCoord) -> impl Iterator<Item = Tile> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |direction| self.neighbour(coord, direction))
            .filter(Tile::is_network)
    }

    /// Reports whether NPCs may travel across the tile at `coord`.
    #[must_use]
    pub fn is_network(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_network()
    }

    /// Overwrites the kind of a tile. Returns `true` when something changed.
    pub fn set_kind(&mut self, coord: TileCoord, kind: TileKind) -> bool {
        let Some(tile) = self.index(coord).and_then(|index| self.tiles.get_mut(index)) else {
            return false;
        };
        if tile.kind == kind {
            return false;
        }
        tile.kind = kind;
        self.revision = self.revision.wrapping_add(1);
        true
    }

    /// Connectivity shape of a dynamic tile, `None` for static kinds.
    #[must_use]
    pub fn road_shape(&self, coord: TileCoord) -> Option<RoadShape> {
        let tile = self.tile(coord);
        if tile.is_dummy() || !tile.kind().is_dynamic() {
            return None;
        }

        let [north, east, south, west] = self.neighbours(coord).map(|tile| tile.is_network());
        Some(RoadShape::from_connections(north, east, south, west))
    }

    /// Short human-readable description of a tile.
    #[must_use]
    pub fn describe(&self, coord: TileCoord) -> String {
        let tile = self.tile(coord);
        if tile.is_dummy() {
            return format!("No tile at ({}, {})", coord.x(), coord.y());
        }

        let label = match tile.kind() {
            TileKind::Empty => "empty ground",
            TileKind::Building => "building lot",
            TileKind::Road => "road",
            TileKind::Path => "path",
        };
        let connections = self.network_neighbours(coord).count();
        format!(
            "Tile ({}, {}): {label}, {connections} network neighbour(s)",
            tile.x(),
            tile.y()
        )
    }

    /// Counter bumped whenever a tile changes kind.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Per-tick hook run before entities update. Tiles carry no timed
    /// behaviour yet.
    pub fn update(&mut self, _ticks: u32) {}

    /// Iterator over every real tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Captures the grid for presentation layers.
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        let tiles = self
            .tiles
            .iter()
            .map(|tile| TileSnapshot {
                tile: tile.coord(),
                kind: tile.kind(),
                road_shape: self.road_shape(tile.coord()),
            })
            .collect();
        GridSnapshot::new(self.width, self.height, tiles)
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        let x = u32::try_from(coord.x()).ok()?;
        let y = u32::try_from(coord.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    let count = u64::from(width) * u64::from(height);
    usize::try_from(count).unwrap_or(0)
}

fn coord_from(x: u32, y: u32) -> TileCoord {
    TileCoord::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}
