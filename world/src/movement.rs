//! NPC pursuit and tile-to-tile movement.
//!
//! An NPC cycles through three states. While idle it looks at its objective
//! queue and adopts the first target it is not already standing next to.
//! While seeking it plans a route and pops the next tile off it. While moving
//! it accumulates ticks until the transition completes, then immediately
//! re-evaluates within the same tick.

use std::collections::VecDeque;

use addd_core::{Direction, EntityId, Event, NpcKind, PursuitEnd, TileCoord};
use addd_system_pathfinding::Pathfinder;
use tracing::debug;

use crate::grid::TileGrid;

/// Mobile payload of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Npc {
    kind: NpcKind,
    target: Option<EntityId>,
    target_tile: Option<TileCoord>,
    path: VecDeque<TileCoord>,
    next_tile: Option<TileCoord>,
    move_rate: u32,
    move_progress: Option<u32>,
    stalled: Option<Stall>,
}

/// Remembers a failed search so it is not repeated every tick while nothing
/// relevant has changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Stall {
    target: EntityId,
    target_tile: TileCoord,
    origin: TileCoord,
    revision: u64,
}

/// Borrowed world state an NPC consults while stepping.
pub(crate) struct Surroundings<'a, L> {
    pub(crate) grid: &'a TileGrid,
    pub(crate) pathfinder: &'a mut Pathfinder,
    pub(crate) locate: L,
}

enum Advance {
    Step(TileCoord),
    Arrived,
    Unreachable,
}

impl Npc {
    pub(crate) fn new(kind: NpcKind) -> Self {
        Self {
            kind,
            target: None,
            target_tile: None,
            path: VecDeque::new(),
            next_tile: None,
            move_rate: kind.move_rate().max(1),
            move_progress: None,
            stalled: None,
        }
    }

    /// Kind of NPC.
    #[must_use]
    pub const fn kind(&self) -> NpcKind {
        self.kind
    }

    /// Entity currently pursued, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Tile being entered while a move is in progress.
    #[must_use]
    pub const fn next_tile(&self) -> Option<TileCoord> {
        self.next_tile
    }

    /// Ticks needed to cross one tile.
    #[must_use]
    pub const fn move_rate(&self) -> u32 {
        self.move_rate
    }

    /// Ticks spent on the current move, `None` when standing still.
    #[must_use]
    pub const fn move_progress(&self) -> Option<u32> {
        self.move_progress
    }

    /// Remaining planned route, head first.
    pub fn path(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.path.iter().copied()
    }

    /// Reports whether a tile transition is underway.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.move_progress.is_some()
    }

    /// Direction of the current move when leaving `tile`.
    #[must_use]
    pub fn move_direction(&self, tile: TileCoord) -> Option<Direction> {
        self.next_tile
            .filter(|_| self.is_moving())
            .and_then(|next| Direction::between(tile, next))
    }

    /// Fractional position interpolated between `tile` and the tile being entered.
    #[must_use]
    pub fn tile_position(&self, tile: TileCoord) -> (f32, f32) {
        let origin = (tile.x() as f32, tile.y() as f32);
        let (Some(next), Some(progress)) = (self.next_tile, self.move_progress) else {
            return origin;
        };

        let fraction = (progress as f32 / self.move_rate as f32).clamp(0.0, 1.0);
        (
            origin.0 + (next.x() as f32 - origin.0) * fraction,
            origin.1 + (next.y() as f32 - origin.1) * fraction,
        )
    }

    /// Runs one tick of movement for the NPC `id` standing on `tile`.
    ///
    /// `objective_targets` lists the targets of the NPC's queued objectives in
    /// queue order; `locate` resolves the live tile of any other entity.
    pub(crate) fn step<L>(
        &mut self,
        id: EntityId,
        tile: &mut TileCoord,
        objective_targets: &[EntityId],
        surroundings: &mut Surroundings<'_, L>,
        out_events: &mut Vec<Event>,
    ) where
        L: Fn(EntityId) -> Option<TileCoord>,
    {
        if let (Some(next), Some(progress)) = (self.next_tile, self.move_progress) {
            let progress = progress.saturating_add(1);
            if progress < self.move_rate {
                self.move_progress = Some(progress);
                return;
            }

            self.next_tile = None;
            self.move_progress = None;
            if let Some(target) = self.target {
                if (surroundings.locate)(target) == Some(next) {
                    // The target walked into the tile being entered.
                    self.end_pursuit(id, target, PursuitEnd::Arrived, out_events);
                    return;
                }
            }

            *tile = next;
            out_events.push(Event::MoveCompleted { npc: id, tile: next });
        }

        let (target, target_tile) = match self.target {
            Some(target) => {
                let live = (surroundings.locate)(target)
                    .filter(|_| objective_targets.contains(&target));
                let Some(target_tile) = live else {
                    self.end_pursuit(id, target, PursuitEnd::TargetLost, out_events);
                    return;
                };
                (target, target_tile)
            }
            None => {
                let Some((target, target_tile)) =
                    self.choose_target(*tile, objective_targets, surroundings)
                else {
                    return;
                };
                self.target = Some(target);
                self.target_tile = None;
                self.path.clear();
                debug!(npc = id.get(), target = target.get(), "pursuit started");
                out_events.push(Event::PursuitStarted { npc: id, target });
                (target, target_tile)
            }
        };

        match self.advance(*tile, target_tile, surroundings) {
            Advance::Step(next) => {
                self.next_tile = Some(next);
                self.move_progress = Some(0);
                out_events.push(Event::MoveStarted {
                    npc: id,
                    from: *tile,
                    to: next,
                });
            }
            Advance::Arrived => self.end_pursuit(id, target, PursuitEnd::Arrived, out_events),
            Advance::Unreachable => {
                self.stalled = Some(Stall {
                    target,
                    target_tile,
                    origin: *tile,
                    revision: surroundings.grid.revision(),
                });
                self.end_pursuit(id, target, PursuitEnd::Unreachable, out_events);
            }
        }
    }

    fn choose_target<L>(
        &self,
        tile: TileCoord,
        objective_targets: &[EntityId],
        surroundings: &Surroundings<'_, L>,
    ) -> Option<(EntityId, TileCoord)>
    where
        L: Fn(EntityId) -> Option<TileCoord>,
    {
        let revision = surroundings.grid.revision();
        objective_targets.iter().copied().find_map(|target| {
            let target_tile = (surroundings.locate)(target)?;
            if tile.manhattan_distance(target_tile) <= 1 {
                return None;
            }
            let stall = Stall {
                target,
                target_tile,
                origin: tile,
                revision,
            };
            if self.stalled == Some(stall) {
                return None;
            }
            Some((target, target_tile))
        })
    }

    fn advance<L>(
        &mut self,
        origin: TileCoord,
        target_tile: TileCoord,
        surroundings: &mut Surroundings<'_, L>,
    ) -> Advance {
        let mut replanned = false;
        if self.path.is_empty() || self.target_tile != Some(target_tile) {
            if !self.replan(origin, target_tile, surroundings) {
                return Advance::Unreachable;
            }
            replanned = true;
        }

        loop {
            let Some(next) = self.path.pop_front() else {
                return Advance::Arrived;
            };
            if next == target_tile {
                return Advance::Arrived;
            }
            if origin.is_cardinal_neighbour(next) && surroundings.grid.is_network(next) {
                return Advance::Step(next);
            }
            if replanned || !self.replan(origin, target_tile, surroundings) {
                return Advance::Unreachable;
            }
            replanned = true;
        }
    }

    fn replan<L>(
        &mut self,
        origin: TileCoord,
        target_tile: TileCoord,
        surroundings: &mut Surroundings<'_, L>,
    ) -> bool {
        self.target_tile = Some(target_tile);
        self.path.clear();

        let grid = surroundings.grid;
        match surroundings
            .pathfinder
            .find(origin, target_tile, |tile| grid.is_network(tile))
        {
            Some(path) => {
                debug!(
                    from = ?origin,
                    to = ?target_tile,
                    steps = path.len(),
                    "route planned"
                );
                self.path.extend(path);
                true
            }
            None => {
                debug!(from = ?origin, to = ?target_tile, "no route");
                false
            }
        }
    }

    fn end_pursuit(
        &mut self,
        id: EntityId,
        target: EntityId,
        reason: PursuitEnd,
        out_events: &mut Vec<Event>,
    ) {
        self.target = None;
        self.target_tile = None;
        self.path.clear();
        debug!(npc = id.get(), target = target.get(), ?reason, "pursuit ended");
        out_events.push(Event::PursuitEnded {
            npc: id,
            target,
            reason,
        });
    }
}
