//! JSON snapshot of a whole world.
//!
//! The document nests everything under a `game` object holding the clock
//! (`time`, in minutes), the tile manager (`tm`) and the entity manager
//! (`em`). Entities are tagged by their `sub` field. Movement state is not
//! written: NPCs come back idle and re-plan on their first tick.

use std::collections::{BTreeMap, HashSet};

use addd_core::{BuildingKind, EntityId, NpcKind, ObjectiveId, TileCoord, TileKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    clock::Clock,
    entity::{Entity, EntityKind},
    grid::{TileGrid, MAX_GRID_TILES},
    manager::EntityManager,
    movement::Npc,
    objective::Objective,
    World,
};

/// Failure to turn save data back into a world.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The text is not JSON, or names an unknown entity `sub` or kind.
    #[error("malformed save data: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but describes an impossible world.
    #[error("inconsistent save data: {0}")]
    Invalid(String),
}

/// Failure to write a world out.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Serialization into JSON failed.
    #[error("failed to encode save data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    game: GameRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct GameRecord {
    time: u64,
    tm: GridRecord,
    em: EntitiesRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridRecord {
    width: u32,
    height: u32,
    tiles: Vec<TileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TileRecord {
    x: i32,
    y: i32,
    #[serde(rename = "type")]
    kind: TileKind,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntitiesRecord {
    entities: Vec<EntityRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "sub", rename_all = "lowercase")]
enum EntityRecord {
    Entity(CommonRecord),
    Building {
        #[serde(flatten)]
        common: CommonRecord,
        #[serde(rename = "type")]
        kind: BuildingKind,
    },
    Npc {
        #[serde(flatten)]
        common: CommonRecord,
        #[serde(rename = "type")]
        kind: NpcKind,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CommonRecord {
    id: EntityId,
    name: String,
    #[serde(default)]
    desc: String,
    x: i32,
    y: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    inventory: BTreeMap<String, u32>,
    #[serde(default)]
    objectives: Vec<ObjectiveRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ObjectiveRecord {
    id: ObjectiveId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<EntityId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    required: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    reward: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chain: Vec<ObjectiveRecord>,
}

/// Serialises the world. `pretty` selects indented output.
pub fn to_json(world: &World, pretty: bool) -> Result<String, SaveError> {
    let file = SaveFile {
        game: GameRecord {
            time: world.clock.minutes(),
            tm: grid_record(&world.grid),
            em: EntitiesRecord {
                entities: world.entities.iter().map(entity_record).collect(),
            },
        },
    };

    let json = if pretty {
        serde_json::to_string_pretty(&file)?
    } else {
        serde_json::to_string(&file)?
    };
    info!(
        entities = world.entities.len(),
        minutes = world.clock.minutes(),
        bytes = json.len(),
        "world saved"
    );
    Ok(json)
}

/// Rebuilds a world from save data. Nothing is partially applied on error.
pub fn from_json(json: &str) -> Result<World, LoadError> {
    let file: SaveFile = serde_json::from_str(json)?;
    let GameRecord { time, tm, em } = file.game;

    let grid = restore_grid(tm)?;
    let entities = restore_entities(em, &grid)?;

    let mut clock = Clock::default();
    clock.set_minutes(time);
    info!(
        width = grid.width(),
        height = grid.height(),
        entities = entities.len(),
        minutes = time,
        "world loaded"
    );
    Ok(World::restored(grid, entities, clock))
}

fn grid_record(grid: &TileGrid) -> GridRecord {
    GridRecord {
        width: grid.width(),
        height: grid.height(),
        tiles: grid
            .iter()
            .map(|tile| TileRecord {
                x: tile.x(),
                y: tile.y(),
                kind: tile.kind(),
            })
            .collect(),
    }
}

fn entity_record(entity: &Entity) -> EntityRecord {
    let common = CommonRecord {
        id: entity.id(),
        name: entity.name().to_owned(),
        desc: entity.description().to_owned(),
        x: entity.tile().x(),
        y: entity.tile().y(),
        inventory: entity
            .inventory()
            .iter()
            .map(|(item, amount)| (item.to_owned(), amount))
            .collect(),
        objectives: entity.objectives().iter().map(objective_record).collect(),
    };
    match entity.kind() {
        EntityKind::Plain => EntityRecord::Entity(common),
        EntityKind::Building(kind) => EntityRecord::Building {
            common,
            kind: *kind,
        },
        EntityKind::Npc(npc) => EntityRecord::Npc {
            common,
            kind: npc.kind(),
        },
    }
}

fn objective_record(objective: &Objective) -> ObjectiveRecord {
    ObjectiveRecord {
        id: objective.id(),
        target: objective.target(),
        required: objective.required().clone(),
        reward: objective.reward().clone(),
        chain: objective.chain().iter().map(objective_record).collect(),
    }
}

fn restore_grid(record: GridRecord) -> Result<TileGrid, LoadError> {
    if !TileGrid::fits(record.width, record.height) {
        return Err(LoadError::Invalid(format!(
            "grid dimensions {}x{} must be positive and hold at most {MAX_GRID_TILES} tiles",
            record.width, record.height
        )));
    }

    let mut grid = TileGrid::new(record.width, record.height);
    for tile in record.tiles {
        let coord = TileCoord::new(tile.x, tile.y);
        if !grid.contains(coord) {
            return Err(LoadError::Invalid(format!(
                "tile ({}, {}) lies outside the {}x{} grid",
                tile.x, tile.y, record.width, record.height
            )));
        }
        let _ = grid.set_kind(coord, tile.kind);
    }
    Ok(grid)
}

fn restore_entities(record: EntitiesRecord, grid: &TileGrid) -> Result<EntityManager, LoadError> {
    let mut entity_ids = HashSet::new();
    for entity in &record.entities {
        let id = entity.common().id;
        if !entity_ids.insert(id) {
            return Err(LoadError::Invalid(format!("duplicate entity id {}", id.get())));
        }
    }

    let mut objective_ids = HashSet::new();
    let mut manager = EntityManager::new();
    for entity in record.entities {
        let (common, kind) = match entity {
            EntityRecord::Entity(common) => (common, EntityKind::Plain),
            EntityRecord::Building { common, kind } => (common, EntityKind::Building(kind)),
            EntityRecord::Npc { common, kind } => (common, EntityKind::Npc(Npc::new(kind))),
        };

        let tile = TileCoord::new(common.x, common.y);
        if !grid.contains(tile) {
            return Err(LoadError::Invalid(format!(
                "entity {} stands outside the grid at ({}, {})",
                common.id.get(),
                common.x,
                common.y
            )));
        }

        let mut restored = Entity::new(common.id, common.name, common.desc, tile, kind);
        for (item, amount) in &common.inventory {
            let _ = restored.add_item(item, i64::from(*amount));
        }
        for objective in common.objectives {
            let objective = restore_objective(objective, &entity_ids, &mut objective_ids)?;
            restored.push_objective(objective);
        }
        manager.restore(restored);
    }
    Ok(manager)
}

fn restore_objective(
    record: ObjectiveRecord,
    entity_ids: &HashSet<EntityId>,
    objective_ids: &mut HashSet<ObjectiveId>,
) -> Result<Objective, LoadError> {
    if !objective_ids.insert(record.id) {
        return Err(LoadError::Invalid(format!(
            "duplicate objective id {}",
            record.id.get()
        )));
    }
    if let Some(target) = record.target {
        if !entity_ids.contains(&target) {
            return Err(LoadError::Invalid(format!(
                "objective {} targets missing entity {}",
                record.id.get(),
                target.get()
            )));
        }
    }

    let chain = record
        .chain
        .into_iter()
        .map(|next| restore_objective(next, entity_ids, objective_ids))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Objective::new(
        record.id,
        record.target,
        record.required,
        record.reward,
        chain,
    ))
}

impl EntityRecord {
    fn common(&self) -> &CommonRecord {
        match self {
            Self::Entity(common) | Self::Building { common, .. } | Self::Npc { common, .. } => {
                common
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_records_are_tagged_by_sub() {
        let record = EntityRecord::Npc {
            common: CommonRecord {
                id: EntityId::new(4),
                name: "Bob".to_owned(),
                desc: "hardworking".to_owned(),
                x: 2,
                y: 3,
                inventory: BTreeMap::new(),
                objectives: Vec::new(),
            },
            kind: NpcKind::Hero,
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["sub"], "npc");
        assert_eq!(value["type"], "HERO");
        assert_eq!(value["id"], 4);
        assert_eq!(value["desc"], "hardworking");
        assert!(value.get("inventory").is_none());
    }

    #[test]
    fn unknown_sub_is_a_parse_error() {
        let json = r#"{"sub":"dragon","id":1,"name":"x","desc":"","x":0,"y":0}"#;
        assert!(serde_json::from_str::<EntityRecord>(json).is_err());
    }

    #[test]
    fn objective_fields_are_optional() {
        let json = r#"{"id":3}"#;
        let record: ObjectiveRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.id, ObjectiveId::new(3));
        assert!(record.target.is_none());
        assert!(record.required.is_empty());
        assert!(record.chain.is_empty());
    }
}
