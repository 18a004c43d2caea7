//! Entity records and their kind-specific payloads.

use addd_core::{BuildingKind, EntityClass, EntityId, Event, TileCoord, TileRect};

use crate::{
    inventory::Inventory,
    movement::{Npc, Surroundings},
    objective::Objective,
};

/// Kind-specific payload of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// Stationary entity without footprint or sprite.
    Plain,
    /// Stationary building anchored at the entity's tile.
    Building(BuildingKind),
    /// Mobile entity that walks towards its objective targets.
    Npc(Npc),
}

/// Anything that lives on the grid: plain markers, buildings and NPCs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    name: String,
    description: String,
    tile: TileCoord,
    inventory: Inventory,
    objectives: Vec<Objective>,
    kind: EntityKind,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        name: String,
        description: String,
        tile: TileCoord,
        kind: EntityKind,
    ) -> Self {
        Self {
            id,
            name,
            description,
            tile,
            inventory: Inventory::new(),
            objectives: Vec::new(),
            kind,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tile the entity stands on; the anchor tile for buildings.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }

    /// Items carried by the entity.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Queued objectives, current one first.
    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Kind-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Coarse classification of the entity.
    #[must_use]
    pub const fn class(&self) -> EntityClass {
        match self.kind {
            EntityKind::Plain => EntityClass::Plain,
            EntityKind::Building(_) => EntityClass::Building,
            EntityKind::Npc(_) => EntityClass::Npc,
        }
    }

    /// Movement state when the entity is an NPC.
    #[must_use]
    pub const fn npc(&self) -> Option<&Npc> {
        match &self.kind {
            EntityKind::Npc(npc) => Some(npc),
            _ => None,
        }
    }

    /// Covered tiles when the entity is a building.
    #[must_use]
    pub const fn footprint(&self) -> Option<TileRect> {
        match self.kind {
            EntityKind::Building(kind) => {
                let (width, height) = kind.footprint();
                Some(TileRect::new(self.tile, width, height))
            }
            _ => None,
        }
    }

    /// Reports whether the entity walks on its own.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        matches!(self.kind, EntityKind::Npc(_))
    }

    /// Sprite name for buildings and NPCs.
    #[must_use]
    pub const fn asset_name(&self) -> Option<&'static str> {
        match &self.kind {
            EntityKind::Plain => None,
            EntityKind::Building(kind) => Some(kind.asset_name()),
            EntityKind::Npc(npc) => Some(npc.kind().asset_name()),
        }
    }

    /// Reports whether `other` stands on a tile sharing an edge with this one.
    #[must_use]
    pub fn is_adjacent_to(&self, other: &Entity) -> bool {
        self.tile.is_cardinal_neighbour(other.tile)
    }

    /// Adds items; negative amounts remove. Returns the resulting count.
    pub fn add_item(&mut self, item: &str, amount: i64) -> u32 {
        self.inventory.add(item, amount)
    }

    /// Removes up to `amount` items. Returns the resulting count.
    pub fn remove_item(&mut self, item: &str, amount: u32) -> u32 {
        self.inventory.remove(item, amount)
    }

    /// Count of `item` carried.
    #[must_use]
    pub fn item_amount(&self, item: &str) -> u32 {
        self.inventory.amount(item)
    }

    /// Reports whether the entity carries anything.
    #[must_use]
    pub fn has_items(&self) -> bool {
        !self.inventory.is_empty()
    }

    /// Fractional position, interpolated while an NPC crosses into the next tile.
    #[must_use]
    pub fn position(&self) -> (f32, f32) {
        match &self.kind {
            EntityKind::Npc(npc) => npc.tile_position(self.tile),
            _ => (self.tile.x() as f32, self.tile.y() as f32),
        }
    }

    pub(crate) fn push_objective(&mut self, objective: Objective) {
        self.objectives.push(objective);
    }

    /// Drops every objective that names `target`, including chained follow-ups.
    pub(crate) fn forget_target(&mut self, target: EntityId) {
        forget_in(&mut self.objectives, target);
    }

    pub(crate) fn objective_targets(&self) -> Vec<EntityId> {
        self.objectives
            .iter()
            .filter_map(Objective::target)
            .collect()
    }

    /// Evaluates every queued objective against `partner`, in queue order.
    ///
    /// Completed objectives deduct their requirements, credit their rewards
    /// and leave the queue; their follow-ups are appended once every
    /// objective has been evaluated. Only this entity is mutated.
    pub(crate) fn interact(
        &mut self,
        partner: EntityId,
        partner_tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) {
        let mut follow_ups = Vec::new();
        let mut index = 0;
        while index < self.objectives.len() {
            let objective = &self.objectives[index];
            let complete = objective.is_target_satisfied(self.tile, partner, partner_tile)
                && objective.are_items_satisfied(&self.inventory);
            if !complete {
                index += 1;
                continue;
            }

            let objective = self.objectives.remove(index);
            for (item, amount) in objective.required() {
                let held = self.inventory.remove(item, *amount);
                out_events.push(Event::InventoryChanged {
                    entity: self.id,
                    item: item.clone(),
                    amount: held,
                });
            }
            for (item, amount) in objective.reward() {
                let held = self.inventory.add(item, i64::from(*amount));
                out_events.push(Event::InventoryChanged {
                    entity: self.id,
                    item: item.clone(),
                    amount: held,
                });
            }
            out_events.push(Event::ObjectiveCompleted {
                entity: self.id,
                objective: objective.id(),
            });
            follow_ups.extend(objective.into_chain());
        }

        for objective in follow_ups {
            out_events.push(Event::ObjectiveAssigned {
                entity: self.id,
                objective: objective.id(),
            });
            self.objectives.push(objective);
        }
    }

    /// Per-tick behaviour. Only NPCs act: they run one movement step.
    pub(crate) fn update<L>(
        &mut self,
        surroundings: &mut Surroundings<'_, L>,
        out_events: &mut Vec<Event>,
    ) where
        L: Fn(EntityId) -> Option<TileCoord>,
    {
        let targets = self.objective_targets();
        if let EntityKind::Npc(npc) = &mut self.kind {
            npc.step(self.id, &mut self.tile, &targets, surroundings, out_events);
        }
    }
}

fn forget_in(objectives: &mut Vec<Objective>, target: EntityId) {
    objectives.retain(|objective| objective.target() != Some(target));
    for objective in objectives.iter_mut() {
        forget_in(objective.chain_mut(), target);
    }
}
