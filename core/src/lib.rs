#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the addd simulation.
//!
//! This crate defines the message surface that connects adapters and the
//! authoritative world. Adapters submit [`Command`] values describing desired
//! mutations, the world executes those commands via its `apply` entry point,
//! and then reports what happened through [`Event`] values. Presentation
//! layers poll immutable snapshots ([`GridSnapshot`], [`EntityView`]) between
//! ticks instead of registering callbacks on simulation objects.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

/// Location of a single tile expressed as signed column and row coordinates.
///
/// Coordinates are signed so that the out-of-bounds sentinel can live at
/// `(-1, -1)`. North points towards increasing `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Coordinate reserved for the out-of-bounds sentinel tile.
    pub const SENTINEL: TileCoord = TileCoord::new(-1, -1);

    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Coordinate one step away in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the straight-line distance between two coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: TileCoord) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether the two coordinates share an edge.
    #[must_use]
    pub fn is_cardinal_neighbour(self, other: TileCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Cardinal directions available on the grid. Diagonals do not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards increasing `y`.
    North,
    /// Towards increasing `x`.
    East,
    /// Towards decreasing `y`.
    South,
    /// Towards decreasing `x`.
    West,
}

impl Direction {
    /// All directions in canonical N, E, S, W order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Coordinate delta applied when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Direction that leads from `from` to the adjacent `to`, if they are neighbours.
    #[must_use]
    pub fn between(from: TileCoord, to: TileCoord) -> Option<Self> {
        Self::ALL.into_iter().find(|direction| from.step(*direction) == to)
    }
}

/// Mutable classification of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TileKind {
    /// Open ground that nothing can travel through.
    #[default]
    Empty,
    /// Ground covered by a building footprint.
    Building,
    /// Road segment; part of the travel network and drawn by connectivity.
    Road,
    /// Footpath; part of the travel network.
    Path,
}

impl TileKind {
    /// Reports whether NPCs may travel across tiles of this kind.
    #[must_use]
    pub const fn is_network(self) -> bool {
        matches!(self, Self::Road | Self::Path)
    }

    /// Reports whether the tile's appearance depends on its neighbours.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Road)
    }
}

/// Shape of a dynamic road tile derived from its connected neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoadShape {
    /// Connected on all four sides.
    Cross,
    /// North, south and east connections.
    TeeEast,
    /// North, south and west connections.
    TeeWest,
    /// East, west and north connections.
    TeeNorth,
    /// East, west and south connections.
    TeeSouth,
    /// Straight north-south segment.
    Vertical,
    /// Straight east-west segment, also used for isolated pieces.
    Horizontal,
    /// Corner joining north and east.
    NorthEast,
    /// Corner joining north and west.
    NorthWest,
    /// Corner joining south and east.
    SouthEast,
    /// Corner joining south and west.
    SouthWest,
    /// Dead end opening to the north.
    North,
    /// Dead end opening to the south.
    South,
    /// Dead end opening to the east.
    East,
    /// Dead end opening to the west.
    West,
}

impl RoadShape {
    /// Resolves the shape from the N, E, S, W connection pattern.
    ///
    /// Full crossings win, then tees and straights built on the north-south
    /// pair, then those built on the east-west pair, then corners and stubs.
    /// A road without connections is drawn horizontally.
    #[must_use]
    pub const fn from_connections(north: bool, east: bool, south: bool, west: bool) -> Self {
        if north && east && south && west {
            Self::Cross
        } else if north && south {
            if east {
                Self::TeeEast
            } else if west {
                Self::TeeWest
            } else {
                Self::Vertical
            }
        } else if east && west {
            if north {
                Self::TeeNorth
            } else if south {
                Self::TeeSouth
            } else {
                Self::Horizontal
            }
        } else if north {
            if east {
                Self::NorthEast
            } else if west {
                Self::NorthWest
            } else {
                Self::North
            }
        } else if south {
            if east {
                Self::SouthEast
            } else if west {
                Self::SouthWest
            } else {
                Self::South
            }
        } else if east {
            Self::East
        } else if west {
            Self::West
        } else {
            Self::Horizontal
        }
    }
}

/// Unique identifier assigned to an entity by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to an objective by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveId(u64);

impl ObjectiveId {
    /// Creates a new objective identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Coarse classification of an entity record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityClass {
    /// Stationary entity without footprint or sprite.
    Plain,
    /// Stationary entity occupying a footprint.
    Building,
    /// Mobile entity that pursues objectives.
    Npc,
}

/// Kinds of buildings that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingKind {
    /// Placeholder building drawn as a bare tile.
    None,
    /// Small dwelling.
    House,
    /// Workplace.
    Factory,
    /// Teaching building.
    School,
    /// Study building.
    Library,
}

impl BuildingKind {
    /// Number of tiles covered along `x` and `y`.
    #[must_use]
    pub const fn footprint(self) -> (u32, u32) {
        match self {
            Self::None | Self::House => (1, 1),
            Self::Factory | Self::School | Self::Library => (2, 2),
        }
    }

    /// Name of the sprite used for this building.
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::None => "tile",
            Self::House => "house",
            Self::Factory => "factory",
            Self::School => "school",
            Self::Library => "library",
        }
    }
}

/// Kinds of NPCs that can be spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NpcKind {
    /// Generic walker.
    None,
    /// Slow, deliberate protagonist.
    Hero,
    /// Patrol officer.
    Police,
    /// Staff member.
    Faculty,
    /// Quick-footed student.
    Student,
}

impl NpcKind {
    /// Number of ticks required to cross a single tile.
    #[must_use]
    pub const fn move_rate(self) -> u32 {
        match self {
            Self::None => 1,
            Self::Hero => 5,
            Self::Police => 3,
            Self::Faculty => 7,
            Self::Student => 2,
        }
    }

    /// Name of the sprite used for this NPC.
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::None => "main",
            Self::Hero => "old",
            Self::Police => "redshirt",
            Self::Faculty => "blueshirt",
            Self::Student => "young",
        }
    }
}

/// Axis-aligned rectangle of tiles anchored at its lowest coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    origin: TileCoord,
    width: u32,
    height: u32,
}

impl TileRect {
    /// Constructs a rectangle from an origin tile and size.
    #[must_use]
    pub const fn new(origin: TileCoord, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Tile that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Width of the rectangle in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the rectangle covers the provided tile.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        let dx = i64::from(tile.x()) - i64::from(self.origin.x());
        let dy = i64::from(tile.y()) - i64::from(self.origin.y());
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }

    /// Iterator over every covered tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let origin = self.origin;
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |dy| {
            (0..width).map(move |dx| {
                TileCoord::new(origin.x().saturating_add(dx), origin.y().saturating_add(dy))
            })
        })
    }
}

/// Recipe for an objective that the world turns into a live objective.
///
/// Identifiers are assigned by the world when the plan is accepted, including
/// those of every chained follow-up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectivePlan {
    /// Entity the owner must stand next to, if any.
    pub target: Option<EntityId>,
    /// Items the owner must carry; deducted on completion.
    pub required: BTreeMap<String, u32>,
    /// Items granted to the owner on completion.
    pub reward: BTreeMap<String, u32>,
    /// Objectives appended to the owner's queue on completion.
    pub chain: Vec<ObjectivePlan>,
}

impl ObjectivePlan {
    /// Placeholder objective that completes on the next interaction.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Objective satisfied by standing next to `target`.
    #[must_use]
    pub fn reach(target: EntityId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Adds an item requirement.
    #[must_use]
    pub fn requiring(mut self, item: impl Into<String>, amount: u32) -> Self {
        if amount > 0 {
            let _ = self.required.insert(item.into(), amount);
        }
        self
    }

    /// Adds an item reward.
    #[must_use]
    pub fn rewarding(mut self, item: impl Into<String>, amount: u32) -> Self {
        if amount > 0 {
            let _ = self.reward.insert(item.into(), amount);
        }
        self
    }

    /// Appends a follow-up objective.
    #[must_use]
    pub fn then(mut self, next: ObjectivePlan) -> Self {
        self.chain.push(next);
        self
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with an empty one of the given size and clears all entities.
    ConfigureTileGrid {
        /// Number of tile columns.
        width: u32,
        /// Number of tile rows.
        height: u32,
    },
    /// Changes how much real time a single simulation tick represents.
    ConfigureClock {
        /// Real time converted into one tick.
        tick_duration: Duration,
    },
    /// Advances the simulation by the provided real time.
    Tick {
        /// Real time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Overwrites the kind of a single tile.
    SetTileKind {
        /// Tile to modify.
        tile: TileCoord,
        /// Kind to apply.
        kind: TileKind,
    },
    /// Places a building anchored at the origin tile.
    PlaceBuilding {
        /// Kind of building to construct.
        kind: BuildingKind,
        /// Lowest tile of the footprint.
        origin: TileCoord,
        /// Display name.
        name: String,
        /// Display description.
        description: String,
    },
    /// Spawns an NPC on the given tile.
    SpawnNpc {
        /// Kind of NPC to spawn.
        kind: NpcKind,
        /// Starting tile.
        tile: TileCoord,
        /// Display name.
        name: String,
        /// Display description.
        description: String,
    },
    /// Spawns a plain entity on the given tile.
    SpawnEntity {
        /// Tile the entity stands on.
        tile: TileCoord,
        /// Display name.
        name: String,
        /// Display description.
        description: String,
    },
    /// Appends an objective to an entity's queue.
    AssignObjective {
        /// Owner of the objective.
        entity: EntityId,
        /// Objective recipe.
        objective: ObjectivePlan,
    },
    /// Adds (or, with a negative amount, removes) items from an inventory.
    AdjustInventory {
        /// Owner of the inventory.
        entity: EntityId,
        /// Item name.
        item: String,
        /// Signed amount to add.
        amount: i64,
    },
    /// Removes an entity from the world.
    RemoveEntity {
        /// Entity to remove.
        entity: EntityId,
    },
}

/// Why an NPC stopped pursuing its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PursuitEnd {
    /// The NPC stands next to the target.
    Arrived,
    /// No network route leads to the target.
    Unreachable,
    /// The target disappeared or no objective refers to it anymore.
    TargetLost,
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The referenced tile lies outside the grid.
    OutOfBounds,
    /// The footprint overlaps an existing building.
    Occupied,
    /// The referenced entity does not exist.
    MissingEntity,
    /// The objective targets an entity that does not exist.
    MissingTarget,
    /// A grid or clock configuration value was zero, or a grid was too large.
    InvalidConfiguration,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The grid was replaced.
    GridConfigured {
        /// Number of tile columns.
        width: u32,
        /// Number of tile rows.
        height: u32,
    },
    /// The simulation clock advanced by whole ticks.
    TimeAdvanced {
        /// Ticks simulated during this command.
        ticks: u32,
        /// Game time in minutes after advancing.
        minutes: u64,
    },
    /// A tile changed kind.
    TileChanged {
        /// Tile that changed.
        tile: TileCoord,
        /// New kind.
        kind: TileKind,
    },
    /// An entity entered the world.
    EntitySpawned {
        /// Identifier allocated to the entity.
        entity: EntityId,
        /// Classification of the entity.
        class: EntityClass,
        /// Tile the entity stands on.
        tile: TileCoord,
    },
    /// An entity left the world.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// An objective was added to an entity's queue.
    ObjectiveAssigned {
        /// Owner of the objective.
        entity: EntityId,
        /// Identifier allocated to the objective.
        objective: ObjectiveId,
    },
    /// An entity interacted with a neighbour. Doubles as the audio trigger.
    Interacted {
        /// Entity whose objectives were evaluated.
        entity: EntityId,
        /// Entity it met.
        partner: EntityId,
    },
    /// An objective completed and left the queue.
    ObjectiveCompleted {
        /// Owner of the objective.
        entity: EntityId,
        /// Completed objective.
        objective: ObjectiveId,
    },
    /// An inventory count changed.
    InventoryChanged {
        /// Owner of the inventory.
        entity: EntityId,
        /// Item that changed.
        item: String,
        /// Count held after the change.
        amount: u32,
    },
    /// An NPC adopted a new target.
    PursuitStarted {
        /// NPC that started pursuing.
        npc: EntityId,
        /// Entity being pursued.
        target: EntityId,
    },
    /// An NPC stopped pursuing its target.
    PursuitEnded {
        /// NPC that stopped.
        npc: EntityId,
        /// Entity it had been pursuing.
        target: EntityId,
        /// Why the pursuit ended.
        reason: PursuitEnd,
    },
    /// An NPC began crossing into an adjacent tile.
    MoveStarted {
        /// NPC that is moving.
        npc: EntityId,
        /// Tile being left.
        from: TileCoord,
        /// Tile being entered.
        to: TileCoord,
    },
    /// An NPC finished crossing into a tile.
    MoveCompleted {
        /// NPC that moved.
        npc: EntityId,
        /// Tile the NPC now occupies.
        tile: TileCoord,
    },
    /// A command was refused.
    CommandRejected {
        /// Why the command was refused.
        reason: Rejection,
    },
}

/// Immutable description of a single tile used by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Location of the tile.
    pub tile: TileCoord,
    /// Kind of the tile.
    pub kind: TileKind,
    /// Connectivity shape for dynamic tiles.
    pub road_shape: Option<RoadShape>,
}

/// Read-only snapshot of the whole grid in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridSnapshot {
    width: u32,
    height: u32,
    tiles: Vec<TileSnapshot>,
}

impl GridSnapshot {
    /// Creates a grid snapshot from tiles listed row by row.
    #[must_use]
    pub fn new(width: u32, height: u32, tiles: Vec<TileSnapshot>) -> Self {
        Self {
            width,
            height,
            tiles,
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

    /// Iterator over the captured tiles.
    pub fn iter(&self) -> impl Iterator<Item = &TileSnapshot> {
        self.tiles.iter()
    }
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Classification of the entity.
    pub class: EntityClass,
    /// Display name.
    pub name: String,
    /// Tile the entity occupies.
    pub tile: TileCoord,
    /// Fractional position; differs from `tile` while an NPC is mid-move.
    pub position: (f32, f32),
    /// Footprint for buildings.
    pub footprint: Option<TileRect>,
    /// Sprite name for buildings and NPCs.
    pub asset_name: Option<&'static str>,
    /// Direction of the current move, if moving.
    pub moving: Option<Direction>,
    /// Number of objectives still queued.
    pub objectives: usize,
}

/// Read-only snapshot describing all entities in insertion order.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EntitySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
