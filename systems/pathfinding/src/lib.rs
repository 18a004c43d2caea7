#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-first route search over the travel network.
//!
//! The search only walks tiles accepted by the caller's traversability
//! predicate, with one exception: the destination itself may be any kind of
//! tile, so that NPCs can head for buildings that sit next to a road.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use addd_core::{Direction, TileCoord};

/// Reusable search workspace.
///
/// Buffers survive between searches so that NPCs re-planning every few ticks
/// do not allocate on each request.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<SearchNode>,
    index: HashMap<TileCoord, usize>,
    frontier: BinaryHeap<FrontierEntry>,
    sequence: u64,
}

impl Pathfinder {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches for a route from `origin` to `destination`.
    ///
    /// `is_network` must return `false` for tiles outside the grid. Nodes are
    /// expanded in order of `steps + straight-line distance`, ties resolved by
    /// discovery order. Re-discovering a tile with fewer steps rewrites its
    /// step count and predecessor in place without re-queueing it, so the
    /// tile keeps the priority it was first queued with. Expanded tiles are
    /// never expanded twice. The result is always a walkable route but not
    /// necessarily the shortest one.
    ///
    /// Returns the tiles to walk in traversal order, excluding `origin` and
    /// ending with `destination`, or `None` when the frontier runs dry.
    pub fn find<F>(
        &mut self,
        origin: TileCoord,
        destination: TileCoord,
        mut is_network: F,
    ) -> Option<Vec<TileCoord>>
    where
        F: FnMut(TileCoord) -> bool,
    {
        self.reset();
        if origin == destination {
            return Some(Vec::new());
        }

        let start = self.discover(origin, 0, None, destination);
        debug_assert_eq!(start, 0);

        while let Some(entry) = self.frontier.pop() {
            let current = entry.node;
            let node = &mut self.nodes[current];
            if node.expanded {
                continue;
            }
            node.expanded = true;

            if node.tile == destination {
                return Some(self.reconstruct(current));
            }

            let tile = node.tile;
            let next_steps = node.steps.saturating_add(1);
            for direction in Direction::ALL {
                let neighbour = tile.step(direction);
                if neighbour != destination && !is_network(neighbour) {
                    continue;
                }

                match self.index.get(&neighbour).copied() {
                    Some(existing) => self.relax(existing, next_steps, current),
                    None => {
                        let _ = self.discover(neighbour, next_steps, Some(current), destination);
                    }
                }
            }
        }

        None
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.frontier.clear();
        self.sequence = 0;
    }

    fn discover(
        &mut self,
        tile: TileCoord,
        steps: u32,
        previous: Option<usize>,
        destination: TileCoord,
    ) -> usize {
        let position = self.nodes.len();
        self.nodes.push(SearchNode {
            tile,
            steps,
            previous,
            expanded: false,
        });
        let _ = self.index.insert(tile, position);
        self.enqueue(position, destination);
        position
    }

    fn relax(&mut self, node: usize, steps: u32, previous: usize) {
        let entry = &mut self.nodes[node];
        if entry.expanded || steps >= entry.steps {
            return;
        }
        entry.steps = steps;
        entry.previous = Some(previous);
    }

    fn enqueue(&mut self, node: usize, destination: TileCoord) {
        let entry = &self.nodes[node];
        let priority = f64::from(entry.steps) + entry.tile.euclidean_distance(destination);
        self.frontier.push(FrontierEntry {
            priority,
            sequence: self.sequence,
            node,
        });
        self.sequence = self.sequence.wrapping_add(1);
    }

    fn reconstruct(&self, mut node: usize) -> Vec<TileCoord> {
        let mut path = Vec::new();
        while let Some(previous) = self.nodes[node].previous {
            path.push(self.nodes[node].tile);
            node = previous;
        }
        path.reverse();
        path
    }
}

/// Convenience wrapper that searches with a throwaway workspace.
pub fn find_path<F>(
    origin: TileCoord,
    destination: TileCoord,
    is_network: F,
) -> Option<Vec<TileCoord>>
where
    F: FnMut(TileCoord) -> bool,
{
    Pathfinder::new().find(origin, destination, is_network)
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    tile: TileCoord,
    steps: u32,
    previous: Option<usize>,
    expanded: bool,
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    priority: f64,
    sequence: u64,
    node: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // BinaryHeap is a max-heap: lowest priority, then earliest discovery, wins.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn open(width: i32, height: i32) -> impl Fn(TileCoord) -> bool {
        move |tile| tile.x() >= 0 && tile.y() >= 0 && tile.x() < width && tile.y() < height
    }

    #[test]
    fn origin_equal_to_destination_yields_empty_path() {
        let path = find_path(TileCoord::new(2, 2), TileCoord::new(2, 2), open(5, 5));
        assert_eq!(path, Some(Vec::new()));
    }

    #[test]
    fn straight_corridor_is_followed_in_order() {
        let path = find_path(TileCoord::new(0, 0), TileCoord::new(3, 0), open(4, 1))
            .expect("corridor is connected");
        assert_eq!(
            path,
            vec![
                TileCoord::new(1, 0),
                TileCoord::new(2, 0),
                TileCoord::new(3, 0),
            ]
        );
    }

    #[test]
    fn frontier_prefers_lower_priority_then_earlier_discovery() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry {
            priority: 3.0,
            sequence: 0,
            node: 0,
        });
        heap.push(FrontierEntry {
            priority: 2.0,
            sequence: 2,
            node: 1,
        });
        heap.push(FrontierEntry {
            priority: 2.0,
            sequence: 1,
            node: 2,
        });

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|entry| entry.node)).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn workspace_is_reusable_between_searches() {
        let mut pathfinder = Pathfinder::new();
        let first = pathfinder.find(TileCoord::new(0, 0), TileCoord::new(2, 2), open(3, 3));
        let second = pathfinder.find(TileCoord::new(2, 2), TileCoord::new(0, 0), open(3, 3));
        assert_eq!(first.map(|path| path.len()), Some(4));
        assert_eq!(second.map(|path| path.len()), Some(4));
    }

    #[test]
    fn shorter_rediscovery_updates_in_place_without_requeueing() {
        // Rows top first. Searching from (4, 2) to (0, 0) reaches some tiles
        // again with fewer steps before they are expanded.
        let rows = [".##.#", "#####", "#####", "##..#", "#####"];
        let network: HashSet<TileCoord> = rows
            .iter()
            .enumerate()
            .flat_map(|(row_index, row)| {
                row.chars().enumerate().filter_map(move |(x, symbol)| {
                    (symbol == '#').then(|| TileCoord::new(x as i32, 4 - row_index as i32))
                })
            })
            .collect();

        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find(TileCoord::new(4, 2), TileCoord::new(0, 0), |tile| {
                network.contains(&tile)
            })
            .expect("connected");

        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&TileCoord::new(0, 0)));
        assert_eq!(pathfinder.sequence as usize, pathfinder.nodes.len());
    }
}
