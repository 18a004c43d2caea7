use std::collections::HashSet;

use addd_core::TileCoord;
use addd_system_pathfinding::{find_path, Pathfinder};

/// Parses a map where `#` marks network tiles and anything else blocks travel.
/// The first line is the top row (highest `y`).
fn network_from(rows: &[&str]) -> HashSet<TileCoord> {
    let height = rows.len() as i32;
    let mut tiles = HashSet::new();
    for (row_index, row) in rows.iter().enumerate() {
        let y = height - 1 - row_index as i32;
        for (x, symbol) in row.chars().enumerate() {
            if symbol == '#' {
                let _ = tiles.insert(TileCoord::new(x as i32, y));
            }
        }
    }
    tiles
}

fn assert_walkable(origin: TileCoord, path: &[TileCoord]) {
    let mut previous = origin;
    for step in path {
        assert!(
            previous.is_cardinal_neighbour(*step),
            "{previous:?} -> {step:?} is not a single cardinal step"
        );
        previous = *step;
    }
}

#[test]
fn open_grid_paths_have_manhattan_length() {
    let width = 7;
    let height = 6;
    let is_network =
        |tile: TileCoord| tile.x() >= 0 && tile.y() >= 0 && tile.x() < width && tile.y() < height;
    let mut pathfinder = Pathfinder::new();

    for origin_x in 0..width {
        for origin_y in 0..height {
            for (dest_x, dest_y) in [(0, 0), (6, 5), (3, 2), (0, 5), (6, 0)] {
                let origin = TileCoord::new(origin_x, origin_y);
                let destination = TileCoord::new(dest_x, dest_y);
                let path = pathfinder
                    .find(origin, destination, is_network)
                    .expect("open grid is connected");

                assert_eq!(
                    path.len() as u32,
                    origin.manhattan_distance(destination),
                    "{origin:?} -> {destination:?}"
                );
                assert_walkable(origin, &path);
                if !path.is_empty() {
                    assert_eq!(path.last(), Some(&destination));
                }
            }
        }
    }
}

#[test]
fn search_detours_around_blocked_tiles() {
    let network = network_from(&[
        "#####", //
        "#...#", //
        "#.#.#", //
        "#...#", //
        "#####",
    ]);
    let origin = TileCoord::new(0, 2);
    let destination = TileCoord::new(4, 2);

    let path = find_path(origin, destination, |tile| network.contains(&tile))
        .expect("ring road connects both sides");

    assert_walkable(origin, &path);
    assert_eq!(path.len(), 8);
    for step in &path {
        assert!(network.contains(step), "{step:?} is off the network");
    }
}

#[test]
fn destination_need_not_be_network() {
    let network = network_from(&["###."]);
    let origin = TileCoord::new(0, 0);
    let building = TileCoord::new(3, 0);

    let path = find_path(origin, building, |tile| network.contains(&tile))
        .expect("building is reachable from the road");

    assert_eq!(path.last(), Some(&building));
    assert_eq!(path.len(), 3);
}

#[test]
fn non_network_tiles_are_not_crossed_on_the_way() {
    let network = network_from(&["##.##"]);

    let path = find_path(TileCoord::new(0, 0), TileCoord::new(4, 0), |tile| {
        network.contains(&tile)
    });

    assert!(path.is_none(), "a gap in the road must block the route");
}

#[test]
fn isolated_destination_is_unreachable() {
    let network = network_from(&[
        "###..", //
        "###..", //
        "###.#",
    ]);

    let path = find_path(TileCoord::new(0, 0), TileCoord::new(4, 0), |tile| {
        network.contains(&tile)
    });

    assert!(path.is_none());
}
