#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the addd simulation.
//!
//! The world owns the tile grid, every entity and the game clock. Adapters
//! mutate it exclusively through [`apply`] and observe it through the
//! [`query`] module and the events pushed by each command.

mod clock;
mod entity;
mod grid;
mod inventory;
mod manager;
mod movement;
mod objective;
pub mod save;

use addd_core::{
    BuildingKind, Command, EntityClass, EntityId, Event, ObjectivePlan, Rejection, TileCoord,
    TileKind, TileRect,
};
use tracing::warn;

pub use clock::{Clock, DEFAULT_TICK_DURATION};
pub use entity::{Entity, EntityKind};
pub use grid::{Tile, TileGrid, MAX_GRID_TILES};
pub use inventory::Inventory;
pub use manager::EntityManager;
pub use movement::Npc;
pub use objective::Objective;

/// Number of tile columns in a freshly created world.
pub const DEFAULT_GRID_WIDTH: u32 = 40;
/// Number of tile rows in a freshly created world.
pub const DEFAULT_GRID_HEIGHT: u32 = 30;

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    grid: TileGrid,
    entities: EntityManager,
    clock: Clock,
}

impl World {
    /// Creates an empty world with the default grid size and clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: TileGrid::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT),
            entities: EntityManager::new(),
            clock: Clock::default(),
        }
    }

    pub(crate) fn restored(grid: TileGrid, entities: EntityManager, clock: Clock) -> Self {
        Self {
            grid,
            entities,
            clock,
        }
    }

    fn tick(&mut self, ticks: u32, out_events: &mut Vec<Event>) {
        for _ in 0..ticks {
            self.grid.update(1);
            self.entities.update(&self.grid, out_events);
        }
    }

    fn place_building(
        &mut self,
        kind: BuildingKind,
        origin: TileCoord,
        name: String,
        description: String,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        if !self.grid.contains(origin) {
            return Err(Rejection::OutOfBounds);
        }

        let (width, height) = kind.footprint();
        let footprint = TileRect::new(origin, width, height);
        let overlaps = self
            .entities
            .iter()
            .filter_map(Entity::footprint)
            .any(|existing| footprint.tiles().any(|tile| existing.contains(tile)));
        if overlaps {
            return Err(Rejection::Occupied);
        }

        for tile in footprint.tiles() {
            if self.grid.set_kind(tile, TileKind::Building) {
                out_events.push(Event::TileChanged {
                    tile,
                    kind: TileKind::Building,
                });
            }
        }
        let entity = self
            .entities
            .spawn(origin, name, description, EntityKind::Building(kind));
        out_events.push(Event::EntitySpawned {
            entity,
            class: EntityClass::Building,
            tile: origin,
        });
        Ok(())
    }

    fn spawn(
        &mut self,
        tile: TileCoord,
        name: String,
        description: String,
        kind: EntityKind,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        if !self.grid.contains(tile) {
            return Err(Rejection::OutOfBounds);
        }
        let class = match kind {
            EntityKind::Npc(_) => EntityClass::Npc,
            EntityKind::Building(_) => EntityClass::Building,
            EntityKind::Plain => EntityClass::Plain,
        };
        let entity = self.entities.spawn(tile, name, description, kind);
        out_events.push(Event::EntitySpawned {
            entity,
            class,
            tile,
        });
        Ok(())
    }

    fn assign_objective(
        &mut self,
        entity: EntityId,
        plan: ObjectivePlan,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        if !self.entities.contains(entity) {
            return Err(Rejection::MissingEntity);
        }
        if !self.plan_targets_exist(&plan) {
            return Err(Rejection::MissingTarget);
        }

        let objective = self.entities.instantiate(plan);
        let id = objective.id();
        let owner = self
            .entities
            .get_mut(entity)
            .ok_or(Rejection::MissingEntity)?;
        owner.push_objective(objective);
        out_events.push(Event::ObjectiveAssigned {
            entity,
            objective: id,
        });
        Ok(())
    }

    fn plan_targets_exist(&self, plan: &ObjectivePlan) -> bool {
        plan.target
            .map_or(true, |target| self.entities.contains(target))
            && plan.chain.iter().all(|next| self.plan_targets_exist(next))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::ConfigureTileGrid { width, height } => {
            if !TileGrid::fits(width, height) {
                Err(Rejection::InvalidConfiguration)
            } else {
                world.grid = TileGrid::new(width, height);
                world.entities.clear();
                out_events.push(Event::GridConfigured { width, height });
                Ok(())
            }
        }
        Command::ConfigureClock { tick_duration } => {
            if tick_duration.is_zero() {
                Err(Rejection::InvalidConfiguration)
            } else {
                world.clock.set_tick_duration(tick_duration);
                Ok(())
            }
        }
        Command::Tick { dt } => {
            let ticks = world.clock.advance(dt);
            if ticks > 0 {
                out_events.push(Event::TimeAdvanced {
                    ticks,
                    minutes: world.clock.minutes(),
                });
                world.tick(ticks, out_events);
            }
            Ok(())
        }
        Command::SetTileKind { tile, kind } => {
            if !world.grid.contains(tile) {
                Err(Rejection::OutOfBounds)
            } else {
                if world.grid.set_kind(tile, kind) {
                    out_events.push(Event::TileChanged { tile, kind });
                }
                Ok(())
            }
        }
        Command::PlaceBuilding {
            kind,
            origin,
            name,
            description,
        } => world.place_building(kind, origin, name, description, out_events),
        Command::SpawnNpc {
            kind,
            tile,
            name,
            description,
        } => world.spawn(
            tile,
            name,
            description,
            EntityKind::Npc(Npc::new(kind)),
            out_events,
        ),
        Command::SpawnEntity {
            tile,
            name,
            description,
        } => world.spawn(tile, name, description, EntityKind::Plain, out_events),
        Command::AssignObjective { entity, objective } => {
            world.assign_objective(entity, objective, out_events)
        }
        Command::AdjustInventory {
            entity,
            item,
            amount,
        } => match world.entities.get_mut(entity) {
            Some(owner) => {
                let held = owner.add_item(&item, amount);
                out_events.push(Event::InventoryChanged {
                    entity,
                    item,
                    amount: held,
                });
                Ok(())
            }
            None => Err(Rejection::MissingEntity),
        },
        Command::RemoveEntity { entity } => match world.entities.remove(entity) {
            Some(_) => {
                out_events.push(Event::EntityRemoved { entity });
                Ok(())
            }
            None => Err(Rejection::MissingEntity),
        },
    };

    if let Err(reason) = outcome {
        warn!(?reason, "command rejected");
        out_events.push(Event::CommandRejected { reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use addd_core::{
        Direction, EntityId, EntitySnapshot, EntityView, GridSnapshot, RoadShape, TileCoord,
    };

    use super::{Clock, Entity, EntityManager, Tile, TileGrid, World};

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Tile at `coord`, or the sentinel when out of bounds.
    #[must_use]
    pub fn tile(world: &World, coord: TileCoord) -> Tile {
        world.grid.tile(coord)
    }

    /// Captures the grid for presentation layers.
    #[must_use]
    pub fn grid_snapshot(world: &World) -> GridSnapshot {
        world.grid.snapshot()
    }

    /// Connectivity shape of the tile at `coord`, if it is a road.
    #[must_use]
    pub fn road_shape(world: &World, coord: TileCoord) -> Option<RoadShape> {
        world.grid.road_shape(coord)
    }

    /// Human-readable description of the tile at `coord`.
    #[must_use]
    pub fn describe_tile(world: &World, coord: TileCoord) -> String {
        world.grid.describe(coord)
    }

    /// Provides read-only access to the game clock.
    #[must_use]
    pub fn clock(world: &World) -> &Clock {
        &world.clock
    }

    /// Provides read-only access to every entity.
    #[must_use]
    pub fn entities(world: &World) -> &EntityManager {
        &world.entities
    }

    /// Looks up a single entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.entities.get(id)
    }

    /// Looks up an entity by display name.
    #[must_use]
    pub fn find_by_name<'a>(world: &'a World, name: &str) -> Option<&'a Entity> {
        world.entities.find_by_name(name)
    }

    /// Reports whether the entity is an NPC crossing between tiles.
    #[must_use]
    pub fn is_moving(world: &World, id: EntityId) -> bool {
        entity(world, id)
            .and_then(Entity::npc)
            .is_some_and(|npc| npc.is_moving())
    }

    /// Fractional position of the entity, interpolated mid-move.
    #[must_use]
    pub fn tile_position(world: &World, id: EntityId) -> Option<(f32, f32)> {
        entity(world, id).map(Entity::position)
    }

    /// Direction of the entity's current move, if it is moving.
    #[must_use]
    pub fn move_direction(world: &World, id: EntityId) -> Option<Direction> {
        let entity = entity(world, id)?;
        entity.npc()?.move_direction(entity.tile())
    }

    /// Captures every entity in insertion order.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let snapshots = world
            .entities
            .iter()
            .map(|entity| EntitySnapshot {
                id: entity.id(),
                class: entity.class(),
                name: entity.name().to_owned(),
                tile: entity.tile(),
                position: entity.position(),
                footprint: entity.footprint(),
                asset_name: entity.asset_name(),
                moving: entity
                    .npc()
                    .and_then(|npc| npc.move_direction(entity.tile())),
                objectives: entity.objectives().len(),
            })
            .collect();
        EntityView::from_snapshots(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use addd_core::{Direction, NpcKind, ObjectiveId, PursuitEnd};

    use super::*;

    fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            apply(world, command, &mut events);
        }
        events
    }

    fn spawned(events: &[Event]) -> Vec<EntityId> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::EntitySpawned { entity, .. } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_world_uses_default_dimensions() {
        let world = World::new();
        assert_eq!(query::grid(&world).width(), DEFAULT_GRID_WIDTH);
        assert_eq!(query::grid(&world).height(), DEFAULT_GRID_HEIGHT);
        assert_eq!(query::clock(&world).tick_duration(), DEFAULT_TICK_DURATION);
        assert!(query::entities(&world).is_empty());
    }

    #[test]
    fn configure_tile_grid_clears_entities() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![
                Command::SpawnEntity {
                    tile: TileCoord::new(1, 1),
                    name: "marker".to_owned(),
                    description: String::new(),
                },
                Command::ConfigureTileGrid {
                    width: 5,
                    height: 4,
                },
            ],
        );

        assert_eq!(events.last(), Some(&Event::GridConfigured { width: 5, height: 4 }));
        assert_eq!(query::grid(&world).width(), 5);
        assert!(query::entities(&world).is_empty());
    }

    #[test]
    fn zero_sized_configuration_is_rejected() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![
                Command::ConfigureTileGrid {
                    width: 0,
                    height: 4,
                },
                Command::ConfigureClock {
                    tick_duration: Duration::ZERO,
                },
            ],
        );
        assert_eq!(
            events,
            vec![
                Event::CommandRejected {
                    reason: Rejection::InvalidConfiguration,
                },
                Event::CommandRejected {
                    reason: Rejection::InvalidConfiguration,
                },
            ]
        );
        assert_eq!(query::grid(&world).width(), DEFAULT_GRID_WIDTH);
    }

    #[test]
    fn oversized_configuration_is_rejected() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![Command::ConfigureTileGrid {
                width: 65_535,
                height: 65_535,
            }],
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: Rejection::InvalidConfiguration,
            }]
        );
        assert_eq!(query::grid(&world).width(), DEFAULT_GRID_WIDTH);
        assert!(TileGrid::fits(1024, 1024));
        assert!(!TileGrid::fits(1024, 1025));
    }

    #[test]
    fn buildings_stamp_their_footprint_and_reject_overlap() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Factory,
                    origin: TileCoord::new(2, 2),
                    name: "Factory".to_owned(),
                    description: String::new(),
                },
                Command::PlaceBuilding {
                    kind: BuildingKind::House,
                    origin: TileCoord::new(3, 3),
                    name: "House".to_owned(),
                    description: String::new(),
                },
                Command::PlaceBuilding {
                    kind: BuildingKind::House,
                    origin: TileCoord::new(-1, 0),
                    name: "Nowhere".to_owned(),
                    description: String::new(),
                },
            ],
        );

        let changed = events
            .iter()
            .filter(|event| matches!(event, Event::TileChanged { .. }))
            .count();
        assert_eq!(changed, 4);
        assert_eq!(spawned(&events).len(), 1);
        assert!(events.contains(&Event::CommandRejected {
            reason: Rejection::Occupied,
        }));
        assert!(events.contains(&Event::CommandRejected {
            reason: Rejection::OutOfBounds,
        }));
        assert_eq!(query::tile(&world, TileCoord::new(3, 3)).kind(), TileKind::Building);
    }

    #[test]
    fn objectives_require_existing_owner_and_targets() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![Command::SpawnEntity {
                tile: TileCoord::new(0, 0),
                name: "owner".to_owned(),
                description: String::new(),
            }],
        );
        let owner = spawned(&events)[0];

        let events = run(
            &mut world,
            vec![
                Command::AssignObjective {
                    entity: EntityId::new(99),
                    objective: ObjectivePlan::empty(),
                },
                Command::AssignObjective {
                    entity: owner,
                    objective: ObjectivePlan::empty().then(ObjectivePlan::reach(EntityId::new(42))),
                },
                Command::AssignObjective {
                    entity: owner,
                    objective: ObjectivePlan::reach(owner),
                },
            ],
        );

        assert_eq!(
            events,
            vec![
                Event::CommandRejected {
                    reason: Rejection::MissingEntity,
                },
                Event::CommandRejected {
                    reason: Rejection::MissingTarget,
                },
                Event::ObjectiveAssigned {
                    entity: owner,
                    objective: ObjectiveId::new(1),
                },
            ]
        );
    }

    #[test]
    fn ticks_follow_the_clock() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![
                Command::ConfigureClock {
                    tick_duration: Duration::from_millis(10),
                },
                Command::Tick {
                    dt: Duration::from_millis(5),
                },
                Command::Tick {
                    dt: Duration::from_millis(26),
                },
            ],
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                ticks: 3,
                minutes: 3,
            }]
        );
        assert_eq!(query::clock(&world).accumulated(), Duration::from_millis(1));
    }

    #[test]
    fn inventory_adjustments_report_resulting_counts() {
        let mut world = World::new();
        let events = run(
            &mut world,
            vec![Command::SpawnEntity {
                tile: TileCoord::new(0, 0),
                name: "owner".to_owned(),
                description: String::new(),
            }],
        );
        let owner = spawned(&events)[0];

        let events = run(
            &mut world,
            vec![
                Command::AdjustInventory {
                    entity: owner,
                    item: "wood".to_owned(),
                    amount: 3,
                },
                Command::AdjustInventory {
                    entity: owner,
                    item: "wood".to_owned(),
                    amount: -5,
                },
            ],
        );
        assert_eq!(
            events,
            vec![
                Event::InventoryChanged {
                    entity: owner,
                    item: "wood".to_owned(),
                    amount: 3,
                },
                Event::InventoryChanged {
                    entity: owner,
                    item: "wood".to_owned(),
                    amount: 0,
                },
            ]
        );
        assert!(query::entity(&world, owner).is_some_and(|entity| !entity.has_items()));
    }

    #[test]
    fn removing_a_pursued_target_ends_the_pursuit() {
        let mut world = World::new();
        let mut commands = vec![Command::ConfigureTileGrid {
            width: 8,
            height: 1,
        }];
        for x in 0..8 {
            commands.push(Command::SetTileKind {
                tile: TileCoord::new(x, 0),
                kind: TileKind::Road,
            });
        }
        commands.push(Command::ConfigureClock {
            tick_duration: Duration::from_millis(1),
        });
        commands.push(Command::SpawnNpc {
            kind: NpcKind::Faculty,
            tile: TileCoord::new(0, 0),
            name: "walker".to_owned(),
            description: String::new(),
        });
        commands.push(Command::SpawnEntity {
            tile: TileCoord::new(7, 0),
            name: "post".to_owned(),
            description: String::new(),
        });
        let events = run(&mut world, commands);
        let ids = spawned(&events);
        let (walker, post) = (ids[0], ids[1]);

        let _ = run(
            &mut world,
            vec![
                Command::AssignObjective {
                    entity: walker,
                    objective: ObjectivePlan::reach(post),
                },
                Command::Tick {
                    dt: Duration::from_millis(1),
                },
            ],
        );
        assert!(query::is_moving(&world, walker));
        assert_eq!(query::move_direction(&world, walker), Some(Direction::East));

        let events = run(
            &mut world,
            vec![
                Command::RemoveEntity { entity: post },
                Command::Tick {
                    dt: Duration::from_millis(7),
                },
            ],
        );
        assert!(events.contains(&Event::PursuitEnded {
            npc: walker,
            target: post,
            reason: PursuitEnd::TargetLost,
        }));
        assert_eq!(query::tile_position(&world, walker), Some((1.0, 0.0)));
        assert!(!query::is_moving(&world, walker));
    }
}
