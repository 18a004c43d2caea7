//! Goals queued on entities.

use std::collections::BTreeMap;

use addd_core::{EntityId, ObjectiveId, TileCoord};

use crate::inventory::Inventory;

/// A unit of goal state owned by an entity.
///
/// An objective may name a target entity (satisfied by standing next to it
/// while interacting with it), a set of required items (satisfied by carrying
/// them), items granted on completion, and follow-up objectives appended to
/// the owner's queue on completion. An objective with neither target nor
/// requirements completes on the first interaction, which makes it a handy
/// carrier for injecting chained sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Objective {
    id: ObjectiveId,
    target: Option<EntityId>,
    required: BTreeMap<String, u32>,
    reward: BTreeMap<String, u32>,
    chain: Vec<Objective>,
}

impl Objective {
    pub(crate) fn new(
        id: ObjectiveId,
        target: Option<EntityId>,
        required: BTreeMap<String, u32>,
        reward: BTreeMap<String, u32>,
        chain: Vec<Objective>,
    ) -> Self {
        Self {
            id,
            target,
            required: positive_only(required),
            reward: positive_only(reward),
            chain,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> ObjectiveId {
        self.id
    }

    /// Entity the owner must reach, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Items that must be carried and are deducted on completion.
    #[must_use]
    pub fn required(&self) -> &BTreeMap<String, u32> {
        &self.required
    }

    /// Items granted on completion.
    #[must_use]
    pub fn reward(&self) -> &BTreeMap<String, u32> {
        &self.reward
    }

    /// Follow-ups appended to the owner's queue on completion.
    #[must_use]
    pub fn chain(&self) -> &[Objective] {
        &self.chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut Vec<Objective> {
        &mut self.chain
    }

    pub(crate) fn into_chain(self) -> Vec<Objective> {
        self.chain
    }

    /// Target half of the completion test, evaluated against the partner just met.
    ///
    /// Only the target itself can satisfy it: standing next to the target
    /// while meeting some other entity does not count. Every adjacent pair
    /// interacts on each tick, so the target is always met in its own turn.
    #[must_use]
    pub fn is_target_satisfied(
        &self,
        owner: TileCoord,
        partner: EntityId,
        partner_tile: TileCoord,
    ) -> bool {
        match self.target {
            None => true,
            Some(target) => target == partner && owner.is_cardinal_neighbour(partner_tile),
        }
    }

    /// Item half of the completion test.
    #[must_use]
    pub fn are_items_satisfied(&self, inventory: &Inventory) -> bool {
        inventory.covers(&self.required)
    }
}

fn positive_only(items: BTreeMap<String, u32>) -> BTreeMap<String, u32> {
    items.into_iter().filter(|(_, amount)| *amount > 0).collect()
}
