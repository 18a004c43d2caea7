//! Ownership of every entity plus the interaction and update passes.

use addd_core::{EntityId, Event, ObjectiveId, ObjectivePlan, TileCoord};
use addd_system_pathfinding::Pathfinder;

use crate::{
    entity::{Entity, EntityKind},
    grid::TileGrid,
    movement::Surroundings,
    objective::Objective,
};

/// Registry of all entities in insertion order.
#[derive(Debug)]
pub struct EntityManager {
    entities: Vec<Entity>,
    pathfinder: Pathfinder,
    next_entity: u64,
    next_objective: u64,
}

impl EntityManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            pathfinder: Pathfinder::new(),
            next_entity: 1,
            next_objective: 1,
        }
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the registry holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Looks up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Looks up an entity for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Reports whether an entity with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Current tile of an entity.
    #[must_use]
    pub fn locate(&self, id: EntityId) -> Option<TileCoord> {
        self.get(id).map(Entity::tile)
    }

    /// First entity carrying the given display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name() == name)
    }

    /// Iterator over entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub(crate) fn spawn(
        &mut self,
        tile: TileCoord,
        name: String,
        description: String,
        kind: EntityKind,
    ) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        self.entities.push(Entity::new(id, name, description, tile, kind));
        id
    }

    /// Inserts an entity restored from a save, keeping id allocation ahead of it.
    pub(crate) fn restore(&mut self, entity: Entity) {
        self.next_entity = self.next_entity.max(entity.id().get().saturating_add(1));
        let highest = entity
            .objectives()
            .iter()
            .map(highest_objective_id)
            .max()
            .unwrap_or(0);
        self.next_objective = self.next_objective.max(highest.saturating_add(1));
        self.entities.push(entity);
    }

    /// Removes an entity and every objective that pointed at it.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let position = self.entities.iter().position(|entity| entity.id() == id)?;
        let removed = self.entities.remove(position);
        for entity in &mut self.entities {
            entity.forget_target(id);
        }
        Some(removed)
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }

    /// Turns a plan into a live objective, allocating ids depth-first.
    pub(crate) fn instantiate(&mut self, plan: ObjectivePlan) -> Objective {
        let id = ObjectiveId::new(self.next_objective);
        self.next_objective = self.next_objective.saturating_add(1);
        let chain = plan
            .chain
            .into_iter()
            .map(|next| self.instantiate(next))
            .collect();
        Objective::new(id, plan.target, plan.required, plan.reward, chain)
    }

    /// Runs one tick: every entity interacts with its neighbours, then every
    /// entity updates.
    pub(crate) fn update(&mut self, grid: &TileGrid, out_events: &mut Vec<Event>) {
        self.interact_all(out_events);

        let mut pathfinder = std::mem::take(&mut self.pathfinder);
        for index in 0..self.entities.len() {
            let (before, rest) = self.entities.split_at_mut(index);
            let Some((entity, after)) = rest.split_first_mut() else {
                continue;
            };
            let others = &*before;
            let later = &*after;
            let mut surroundings = Surroundings {
                grid,
                pathfinder: &mut pathfinder,
                locate: |id: EntityId| {
                    others
                        .iter()
                        .chain(later.iter())
                        .find(|other| other.id() == id)
                        .map(Entity::tile)
                },
            };
            entity.update(&mut surroundings, out_events);
        }
        self.pathfinder = pathfinder;
    }

    fn interact_all(&mut self, out_events: &mut Vec<Event>) {
        let mut pairs = Vec::new();
        for first in &self.entities {
            let tile = first.tile();
            for second in &self.entities {
                if second.id() == first.id() {
                    continue;
                }
                if second.tile() == tile || tile.is_cardinal_neighbour(second.tile()) {
                    pairs.push((first.id(), second.id(), second.tile()));
                }
            }
        }

        for (first, second, second_tile) in pairs {
            let Some(entity) = self.get_mut(first) else {
                continue;
            };
            out_events.push(Event::Interacted {
                entity: first,
                partner: second,
            });
            entity.interact(second, second_tile, out_events);
        }
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

fn highest_objective_id(objective: &Objective) -> u64 {
    objective
        .chain()
        .iter()
        .map(highest_objective_id)
        .fold(objective.id().get(), u64::max)
}

#[cfg(test)]
mod tests {
    use addd_core::{NpcKind, TileKind};

    use super::*;
    use crate::movement::Npc;

    fn plain(manager: &mut EntityManager, x: i32, y: i32) -> EntityId {
        manager.spawn(
            TileCoord::new(x, y),
            format!("plain {x},{y}"),
            String::new(),
            EntityKind::Plain,
        )
    }

    #[test]
    fn ids_are_allocated_sequentially() {
        let mut manager = EntityManager::new();
        let a = plain(&mut manager, 0, 0);
        let b = plain(&mut manager, 1, 0);
        assert_eq!(a, EntityId::new(1));
        assert_eq!(b, EntityId::new(2));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn plans_allocate_ids_through_the_chain() {
        let mut manager = EntityManager::new();
        let target = plain(&mut manager, 0, 0);
        let objective = manager.instantiate(
            ObjectivePlan::reach(target)
                .then(ObjectivePlan::empty().then(ObjectivePlan::reach(target)))
                .then(ObjectivePlan::empty()),
        );
        assert_eq!(objective.id(), ObjectiveId::new(1));
        assert_eq!(objective.chain()[0].id(), ObjectiveId::new(2));
        assert_eq!(objective.chain()[0].chain()[0].id(), ObjectiveId::new(3));
        assert_eq!(objective.chain()[1].id(), ObjectiveId::new(4));
        assert_eq!(highest_objective_id(&objective), 4);
    }

    #[test]
    fn interaction_covers_own_tile_and_cardinal_neighbours_only() {
        let mut manager = EntityManager::new();
        let centre = plain(&mut manager, 2, 2);
        let north = plain(&mut manager, 2, 3);
        let shared = plain(&mut manager, 2, 2);
        let _diagonal = plain(&mut manager, 3, 3);
        let _far = plain(&mut manager, 2, 4);

        let mut events = Vec::new();
        manager.interact_all(&mut events);

        let partners: Vec<EntityId> = events
            .iter()
            .filter_map(|event| match event {
                Event::Interacted { entity, partner } if *entity == centre => Some(*partner),
                _ => None,
            })
            .collect();
        assert_eq!(partners, vec![north, shared]);

        let from_north = events
            .iter()
            .filter(|event| matches!(event, Event::Interacted { entity, .. } if *entity == north))
            .count();
        assert_eq!(from_north, 4);
    }

    #[test]
    fn removal_forgets_objectives_pointing_at_the_entity() {
        let mut manager = EntityManager::new();
        let owner = plain(&mut manager, 0, 0);
        let target = plain(&mut manager, 5, 5);
        let objective = manager.instantiate(ObjectivePlan::reach(target));
        if let Some(entity) = manager.get_mut(owner) {
            entity.push_objective(objective);
        }

        assert!(manager.remove(target).is_some());
        assert!(manager.remove(target).is_none());
        assert!(manager.get(owner).is_some_and(|entity| entity.objectives().is_empty()));
    }

    #[test]
    fn update_moves_npcs_towards_their_targets() {
        let mut grid = TileGrid::new(5, 1);
        for x in 0..5 {
            let _ = grid.set_kind(TileCoord::new(x, 0), TileKind::Road);
        }
        let mut manager = EntityManager::new();
        let walker = manager.spawn(
            TileCoord::new(0, 0),
            "walker".to_owned(),
            String::new(),
            EntityKind::Npc(Npc::new(NpcKind::None)),
        );
        let post = plain(&mut manager, 4, 0);
        let objective = manager.instantiate(ObjectivePlan::reach(post));
        if let Some(entity) = manager.get_mut(walker) {
            entity.push_objective(objective);
        }

        let mut events = Vec::new();
        for _ in 0..6 {
            manager.update(&grid, &mut events);
        }

        assert_eq!(manager.locate(walker), Some(TileCoord::new(3, 0)));
        assert!(manager
            .get(walker)
            .is_some_and(|entity| entity.objectives().is_empty()));
    }
}
