//! Scenario files describing a starting town.
//!
//! A scenario is a TOML document. The map is drawn as text rows, top row
//! first: `#` is road, `=` is footpath and `.` is open ground. Buildings,
//! NPCs and plain entities are listed by name, and objectives refer to those
//! names.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
    time::Duration,
};

use addd_core::{
    BuildingKind, Command, EntityId, Event, NpcKind, ObjectivePlan, TileCoord, TileKind,
};
use addd_world::{self as world, World};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

/// Parsed scenario document.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    /// Real milliseconds per simulation tick.
    #[serde(default)]
    pub(crate) tick_millis: Option<u64>,
    pub(crate) rows: Vec<String>,
    #[serde(default)]
    pub(crate) buildings: Vec<BuildingSpec>,
    #[serde(default)]
    pub(crate) npcs: Vec<NpcSpec>,
    #[serde(default)]
    pub(crate) entities: Vec<EntitySpec>,
    #[serde(default)]
    pub(crate) objectives: Vec<AssignmentSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BuildingSpec {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) kind: BuildingKind,
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) inventory: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NpcSpec {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) kind: NpcKind,
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) inventory: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntitySpec {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) inventory: BTreeMap<String, u32>,
}

/// Objective handed to a named owner.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AssignmentSpec {
    pub(crate) owner: String,
    #[serde(flatten)]
    pub(crate) objective: ObjectiveSpec,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ObjectiveSpec {
    #[serde(default)]
    pub(crate) target: Option<String>,
    #[serde(default)]
    pub(crate) required: BTreeMap<String, u32>,
    #[serde(default)]
    pub(crate) reward: BTreeMap<String, u32>,
    #[serde(default)]
    pub(crate) then: Vec<ObjectiveSpec>,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub(crate) fn parse(data: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(data)?;
        let _ = scenario.dimensions()?;
        Ok(scenario)
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        let height = self.rows.len();
        let width = self.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 || height == 0 {
            bail!("scenario map must contain at least one tile");
        }
        if let Some(row) = self.rows.iter().find(|row| row.chars().count() != width) {
            bail!("map row '{row}' differs from the first row's width of {width}");
        }
        Ok((width as u32, height as u32))
    }

    /// Builds a fresh world populated with the scenario's contents.
    pub(crate) fn build(&self) -> Result<World> {
        let (width, height) = self.dimensions()?;
        let mut world = World::new();
        let mut commands = vec![Command::ConfigureTileGrid { width, height }];
        if let Some(millis) = self.tick_millis {
            commands.push(Command::ConfigureClock {
                tick_duration: Duration::from_millis(millis),
            });
        }

        for (row_index, row) in self.rows.iter().enumerate() {
            let y = (height as usize - 1 - row_index) as i32;
            for (x, symbol) in row.chars().enumerate() {
                let kind = match symbol {
                    '#' => TileKind::Road,
                    '=' => TileKind::Path,
                    '.' => continue,
                    other => bail!("unknown map symbol '{other}' at ({x}, {y})"),
                };
                commands.push(Command::SetTileKind {
                    tile: TileCoord::new(x as i32, y),
                    kind,
                });
            }
        }
        for command in commands {
            let _ = execute(&mut world, command)?;
        }

        let mut names = HashMap::new();
        let mut inventories = Vec::new();
        for building in &self.buildings {
            let id = spawn(
                &mut world,
                &mut names,
                &building.name,
                Command::PlaceBuilding {
                    kind: building.kind,
                    origin: TileCoord::new(building.x, building.y),
                    name: building.name.clone(),
                    description: building.description.clone(),
                },
            )?;
            inventories.push((id, &building.inventory));
        }
        for npc in &self.npcs {
            let id = spawn(
                &mut world,
                &mut names,
                &npc.name,
                Command::SpawnNpc {
                    kind: npc.kind,
                    tile: TileCoord::new(npc.x, npc.y),
                    name: npc.name.clone(),
                    description: npc.description.clone(),
                },
            )?;
            inventories.push((id, &npc.inventory));
        }
        for entity in &self.entities {
            let id = spawn(
                &mut world,
                &mut names,
                &entity.name,
                Command::SpawnEntity {
                    tile: TileCoord::new(entity.x, entity.y),
                    name: entity.name.clone(),
                    description: entity.description.clone(),
                },
            )?;
            inventories.push((id, &entity.inventory));
        }

        for (entity, inventory) in inventories {
            for (item, amount) in inventory {
                let _ = execute(
                    &mut world,
                    Command::AdjustInventory {
                        entity,
                        item: item.clone(),
                        amount: i64::from(*amount),
                    },
                )?;
            }
        }

        for assignment in &self.objectives {
            let entity = resolve(&names, &assignment.owner)?;
            let objective = plan(&names, &assignment.objective)?;
            let _ = execute(&mut world, Command::AssignObjective { entity, objective })
                .with_context(|| format!("objective for '{}'", assignment.owner))?;
        }

        info!(
            scenario = %self.name,
            width,
            height,
            entities = names.len(),
            "scenario built"
        );
        Ok(world)
    }
}

fn execute(world: &mut World, command: Command) -> Result<Vec<Event>> {
    let description = format!("{command:?}");
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    if let Some(reason) = events.iter().find_map(|event| match event {
        Event::CommandRejected { reason } => Some(*reason),
        _ => None,
    }) {
        bail!("world rejected {description}: {reason:?}");
    }
    Ok(events)
}

fn spawn(
    world: &mut World,
    names: &mut HashMap<String, EntityId>,
    name: &str,
    command: Command,
) -> Result<EntityId> {
    if names.contains_key(name) {
        bail!("entity name '{name}' is used more than once");
    }
    let events = execute(world, command).with_context(|| format!("placing '{name}'"))?;
    let Some(id) = events.iter().find_map(|event| match event {
        Event::EntitySpawned { entity, .. } => Some(*entity),
        _ => None,
    }) else {
        bail!("placing '{name}' produced no entity");
    };
    let _ = names.insert(name.to_owned(), id);
    Ok(id)
}

fn resolve(names: &HashMap<String, EntityId>, name: &str) -> Result<EntityId> {
    names
        .get(name)
        .copied()
        .with_context(|| format!("no entity named '{name}'"))
}

fn plan(names: &HashMap<String, EntityId>, spec: &ObjectiveSpec) -> Result<ObjectivePlan> {
    let mut recipe = match &spec.target {
        Some(target) => ObjectivePlan::reach(resolve(names, target)?),
        None => ObjectivePlan::empty(),
    };
    for (item, amount) in &spec.required {
        recipe = recipe.requiring(item.clone(), *amount);
    }
    for (item, amount) in &spec.reward {
        recipe = recipe.rewarding(item.clone(), *amount);
    }
    for next in &spec.then {
        recipe = recipe.then(plan(names, next)?);
    }
    Ok(recipe)
}
