#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for addd adapters.
//!
//! The world exposes read-only snapshots; this crate turns them into a
//! [`Scene`] made of asset keys and world-space positions that any backend can
//! draw. Backends implement [`Presenter`].

use addd_core::{
    EntityClass, EntityId, EntityView, Event, GridSnapshot, RoadShape, TileCoord, TileKind,
    TileRect, TileSnapshot,
};
use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{error::Error, fmt};

/// Side length of a tile sprite in world units.
pub const TILE_LENGTH: f32 = 32.0;

/// Atlas directory holding tile sprites.
pub const TILE_ASSET_DIR: &str = "tiles/";

/// Atlas directory holding entity sprites.
pub const ENTITY_ASSET_DIR: &str = "entities/";

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Untinted sprite color.
    pub const PLAIN: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    /// Tint applied to the entity under the cursor.
    pub const HOVER: Color = Color::new(0.6, 0.6, 1.0, 1.0);

    /// Tint applied to the selected entity.
    pub const SELECT: Color = Color::new(0.7, 1.0, 0.7, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Image drawn for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileAsset {
    /// Open ground; also drawn beneath building footprints.
    Grass,
    /// Footpath.
    Path,
    /// Road piece shaped by its connected neighbours.
    Road(RoadShape),
}

impl TileAsset {
    /// Selects the image for a captured tile.
    #[must_use]
    pub fn from_snapshot(snapshot: &TileSnapshot) -> Self {
        match snapshot.kind {
            TileKind::Empty | TileKind::Building => Self::Grass,
            TileKind::Path => Self::Path,
            TileKind::Road => Self::Road(snapshot.road_shape.unwrap_or(RoadShape::Horizontal)),
        }
    }

    /// File name of the image without its directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Path => "path",
            Self::Road(shape) => match shape {
                RoadShape::Cross => "road-x",
                RoadShape::TeeEast => "road-te",
                RoadShape::TeeWest => "road-tw",
                RoadShape::TeeNorth => "road-tn",
                RoadShape::TeeSouth => "road-ts",
                RoadShape::Vertical => "road-v",
                RoadShape::Horizontal => "road-h",
                RoadShape::NorthEast => "road-ne",
                RoadShape::NorthWest => "road-nw",
                RoadShape::SouthEast => "road-se",
                RoadShape::SouthWest => "road-sw",
                RoadShape::North => "road-n",
                RoadShape::South => "road-s",
                RoadShape::East => "road-e",
                RoadShape::West => "road-w",
            },
        }
    }

    /// Atlas key of the image, for example `tiles/road-te`.
    #[must_use]
    pub fn key(self) -> String {
        format!("{TILE_ASSET_DIR}{}", self.file_name())
    }
}

/// A tile positioned in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSprite {
    /// Tile drawn by this sprite.
    pub tile: TileCoord,
    /// Image to draw.
    pub asset: TileAsset,
    /// Lower-left corner in world units.
    pub origin: Vec2,
}

/// An entity positioned in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySprite {
    /// Identifier of the drawn entity.
    pub id: EntityId,
    /// Coarse classification, used by backends without images.
    pub class: EntityClass,
    /// Display name.
    pub name: String,
    /// Atlas key such as `entities/house`; plain entities have none.
    pub asset_key: Option<String>,
    /// Lower-left corner in world units, interpolated while moving.
    pub origin: Vec2,
    /// Area covered in world units.
    pub size: Vec2,
    /// Tint reflecting hover and selection state.
    pub tint: Color,
    footprint: Option<TileRect>,
}

impl EntitySprite {
    /// Reports whether `point` lies within the drawn area.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x < max.x && point.y < max.y
    }
}

/// Entities singled out by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Entity under the cursor.
    pub hovered: Option<EntityId>,
    /// Entity picked by the user.
    pub selected: Option<EntityId>,
}

impl Highlight {
    fn tint(&self, id: EntityId) -> Color {
        if self.selected == Some(id) {
            Color::SELECT
        } else if self.hovered == Some(id) {
            Color::HOVER
        } else {
            Color::PLAIN
        }
    }
}

/// Describes the tile grid in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Converts a position in tile units into world units.
    #[must_use]
    pub fn tile_to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y) * self.tile_length
    }

    /// Tile containing a world-space point, or `None` outside the grid.
    #[must_use]
    pub fn world_to_tile(&self, position: Vec2) -> Option<TileCoord> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let scaled = position / self.tile_length;
        let (column, row) = (scaled.x.floor() as u32, scaled.y.floor() as u32);
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(TileCoord::new(column as i32, row as i32))
    }
}

/// Scene description combining the tile layer and the entity layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid geometry.
    pub grid: TileGridPresentation,
    /// Tiles in row-major order.
    pub tiles: Vec<TileSprite>,
    /// Entities in draw order.
    pub entities: Vec<EntitySprite>,
    /// Free-form status line, such as the in-game time.
    pub caption: String,
}

impl Scene {
    /// Builds a scene from world snapshots.
    pub fn build(
        grid: &GridSnapshot,
        entities: &EntityView,
        highlight: Highlight,
        tile_length: f32,
    ) -> std::result::Result<Self, RenderingError> {
        let geometry = TileGridPresentation::new(grid.width(), grid.height(), tile_length)?;

        let tiles = grid
            .iter()
            .map(|snapshot| TileSprite {
                tile: snapshot.tile,
                asset: TileAsset::from_snapshot(snapshot),
                origin: geometry
                    .tile_to_world(snapshot.tile.x() as f32, snapshot.tile.y() as f32),
            })
            .collect();

        let entities = entities
            .iter()
            .map(|snapshot| {
                let size = snapshot.footprint.map_or(Vec2::ONE, |rect| {
                    Vec2::new(rect.width() as f32, rect.height() as f32)
                }) * tile_length;
                EntitySprite {
                    id: snapshot.id,
                    class: snapshot.class,
                    name: snapshot.name.clone(),
                    asset_key: snapshot
                        .asset_name
                        .map(|name| format!("{ENTITY_ASSET_DIR}{name}")),
                    origin: geometry.tile_to_world(snapshot.position.0, snapshot.position.1),
                    size,
                    tint: highlight.tint(snapshot.id),
                    footprint: snapshot.footprint,
                }
            })
            .collect();

        Ok(Self {
            grid: geometry,
            tiles,
            entities,
            caption: String::new(),
        })
    }

    /// Replaces the caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Entity drawn at a world-space point.
    ///
    /// A building whose footprint covers the tile wins outright. Otherwise
    /// moving entities are hit-tested against their interpolated position.
    #[must_use]
    pub fn entity_at(&self, point: Vec2) -> Option<EntityId> {
        let tile = self.grid.world_to_tile(point)?;
        if let Some(building) = self.entities.iter().find(|sprite| {
            sprite.class == EntityClass::Building
                && sprite.footprint.is_some_and(|rect| rect.contains(tile))
        }) {
            return Some(building.id);
        }
        self.entities
            .iter()
            .find(|sprite| sprite.class != EntityClass::Building && sprite.contains(point))
            .map(|sprite| sprite.id)
    }
}

/// Audible feedback derived from world events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Two entities met.
    Greeting,
    /// An objective was fulfilled.
    Reward,
}

impl SoundCue {
    /// Cue triggered by an event, if any.
    #[must_use]
    pub fn for_event(event: &Event) -> Option<Self> {
        match event {
            Event::Interacted { .. } => Some(Self::Greeting),
            Event::ObjectiveCompleted { .. } => Some(Self::Reward),
            _ => None,
        }
    }
}

/// Rendering backend capable of presenting addd scenes.
pub trait Presenter {
    /// Draws a single frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;

    /// Plays a sound. Silent backends ignore it.
    fn play(&mut self, _cue: SoundCue) -> AnyResult<()> {
        Ok(())
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive size.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use addd_core::{Direction, EntitySnapshot};

    fn grid() -> GridSnapshot {
        let mut tiles = Vec::new();
        for y in 0..2 {
            for x in 0..3 {
                let (kind, road_shape) = match (x, y) {
                    (0, 0) => (TileKind::Road, Some(RoadShape::East)),
                    (1, 0) => (TileKind::Road, Some(RoadShape::West)),
                    (2, 1) => (TileKind::Path, None),
                    (0, 1) => (TileKind::Building, None),
                    _ => (TileKind::Empty, None),
                };
                tiles.push(TileSnapshot {
                    tile: TileCoord::new(x, y),
                    kind,
                    road_shape,
                });
            }
        }
        GridSnapshot::new(3, 2, tiles)
    }

    fn entities() -> EntityView {
        EntityView::from_snapshots(vec![
            EntitySnapshot {
                id: EntityId::new(1),
                class: EntityClass::Building,
                name: "Hut".to_owned(),
                tile: TileCoord::new(0, 1),
                position: (0.0, 1.0),
                footprint: Some(TileRect::new(TileCoord::new(0, 1), 1, 1)),
                asset_name: Some("house"),
                moving: None,
                objectives: 0,
            },
            EntitySnapshot {
                id: EntityId::new(2),
                class: EntityClass::Npc,
                name: "Bob".to_owned(),
                tile: TileCoord::new(0, 0),
                position: (0.5, 0.0),
                footprint: None,
                asset_name: Some("old"),
                moving: Some(Direction::East),
                objectives: 1,
            },
            EntitySnapshot {
                id: EntityId::new(3),
                class: EntityClass::Plain,
                name: "Well".to_owned(),
                tile: TileCoord::new(2, 0),
                position: (2.0, 0.0),
                footprint: None,
                asset_name: None,
                moving: None,
                objectives: 0,
            },
        ])
    }

    #[test]
    fn tile_grid_creation_rejects_non_positive_tile_length() {
        assert!(TileGridPresentation::new(3, 3, 32.0).is_ok());
        let error = TileGridPresentation::new(3, 3, 0.0).expect_err("zero length rejected");
        assert_eq!(error, RenderingError::InvalidTileLength { tile_length: 0.0 });
    }

    #[test]
    fn road_shapes_map_to_atlas_keys() {
        assert_eq!(TileAsset::Road(RoadShape::TeeEast).key(), "tiles/road-te");
        assert_eq!(TileAsset::Road(RoadShape::Cross).key(), "tiles/road-x");
        assert_eq!(TileAsset::Grass.key(), "tiles/grass");
        assert_eq!(TileAsset::Path.key(), "tiles/path");
    }

    #[test]
    fn building_tiles_are_drawn_as_grass() {
        let scene = Scene::build(&grid(), &entities(), Highlight::default(), TILE_LENGTH)
            .expect("valid scene");
        let under_hut = scene
            .tiles
            .iter()
            .find(|sprite| sprite.tile == TileCoord::new(0, 1))
            .expect("tile captured");
        assert_eq!(under_hut.asset, TileAsset::Grass);
        assert_eq!(under_hut.origin, Vec2::new(0.0, 32.0));
    }

    #[test]
    fn entity_sprites_use_interpolated_positions() {
        let scene = Scene::build(&grid(), &entities(), Highlight::default(), TILE_LENGTH)
            .expect("valid scene");
        let bob = &scene.entities[1];
        assert_eq!(bob.origin, Vec2::new(16.0, 0.0));
        assert_eq!(bob.asset_key.as_deref(), Some("entities/old"));
        assert_eq!(scene.entities[2].asset_key, None);
    }

    #[test]
    fn highlight_tints_selected_over_hovered() {
        let highlight = Highlight {
            hovered: Some(EntityId::new(2)),
            selected: Some(EntityId::new(1)),
        };
        let scene =
            Scene::build(&grid(), &entities(), highlight, TILE_LENGTH).expect("valid scene");
        assert_eq!(scene.entities[0].tint, Color::SELECT);
        assert_eq!(scene.entities[1].tint, Color::HOVER);
        assert_eq!(scene.entities[2].tint, Color::PLAIN);
    }

    #[test]
    fn hit_testing_prefers_buildings_then_moving_sprites() {
        let scene = Scene::build(&grid(), &entities(), Highlight::default(), TILE_LENGTH)
            .expect("valid scene");
        assert_eq!(scene.entity_at(Vec2::new(5.0, 40.0)), Some(EntityId::new(1)));
        assert_eq!(scene.entity_at(Vec2::new(40.0, 10.0)), Some(EntityId::new(2)));
        assert_eq!(scene.entity_at(Vec2::new(5.0, 10.0)), None);
        assert_eq!(scene.entity_at(Vec2::new(-1.0, 10.0)), None);
    }

    #[test]
    fn world_to_tile_rejects_points_outside_the_grid() {
        let grid = TileGridPresentation::new(3, 2, 10.0).expect("valid grid");
        assert_eq!(grid.world_to_tile(Vec2::new(25.0, 15.0)), Some(TileCoord::new(2, 1)));
        assert_eq!(grid.world_to_tile(Vec2::new(30.0, 5.0)), None);
    }

    #[test]
    fn interaction_events_trigger_sounds() {
        let greeting = Event::Interacted {
            entity: EntityId::new(1),
            partner: EntityId::new(2),
        };
        assert_eq!(SoundCue::for_event(&greeting), Some(SoundCue::Greeting));
        let moved = Event::MoveCompleted {
            npc: EntityId::new(1),
            tile: TileCoord::new(0, 0),
        };
        assert_eq!(SoundCue::for_event(&moved), None);
    }
}
