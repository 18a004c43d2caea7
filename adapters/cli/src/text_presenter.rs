//! Terminal backend drawing scenes as character grids.

use std::io::Write;

use addd_core::{EntityClass, RoadShape};
use addd_rendering::{Presenter, Scene, TileAsset};
use anyhow::Result;
use glam::Vec2;

/// Writes each presented scene as text, top row first.
#[derive(Debug)]
pub(crate) struct TextPresenter<W> {
    out: W,
    frames: usize,
}

impl<W: Write> TextPresenter<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Number of frames written so far.
    pub(crate) fn frames(&self) -> usize {
        self.frames
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        let columns = scene.grid.columns as usize;
        let rows = scene.grid.rows as usize;
        let mut canvas = vec![vec![' '; columns]; rows];

        for sprite in &scene.tiles {
            if let Some(cell) = cell(&mut canvas, sprite.origin, scene.grid.tile_length) {
                *cell = tile_glyph(sprite.asset);
            }
        }

        let mut legend = Vec::new();
        for sprite in &scene.entities {
            let glyph = match sprite.class {
                EntityClass::Building => building_glyph(sprite.asset_key.as_deref()),
                EntityClass::Npc => sprite.name.chars().next().unwrap_or('@'),
                EntityClass::Plain => '*',
            };
            let tiles = (sprite.size / scene.grid.tile_length).round();
            for dx in 0..tiles.x as i32 {
                for dy in 0..tiles.y as i32 {
                    let offset = Vec2::new(dx as f32, dy as f32) * scene.grid.tile_length;
                    if let Some(cell) =
                        cell(&mut canvas, sprite.origin + offset, scene.grid.tile_length)
                    {
                        *cell = glyph;
                    }
                }
            }
            if sprite.class == EntityClass::Npc {
                let at = sprite.origin / scene.grid.tile_length;
                legend.push(format!("{glyph} {} ({:.1}, {:.1})", sprite.name, at.x, at.y));
            }
        }

        if !scene.caption.is_empty() {
            writeln!(self.out, "{}", scene.caption)?;
        }
        for row in canvas.iter().rev() {
            writeln!(self.out, "{}", row.iter().collect::<String>())?;
        }
        for line in legend {
            writeln!(self.out, "  {line}")?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}

fn cell(canvas: &mut [Vec<char>], origin: Vec2, tile_length: f32) -> Option<&mut char> {
    let at = (origin / tile_length).round();
    if at.x < 0.0 || at.y < 0.0 {
        return None;
    }
    canvas
        .get_mut(at.y as usize)
        .and_then(|row| row.get_mut(at.x as usize))
}

fn tile_glyph(asset: TileAsset) -> char {
    match asset {
        TileAsset::Grass => '.',
        TileAsset::Path => ':',
        TileAsset::Road(shape) => match shape {
            RoadShape::Cross => '┼',
            RoadShape::TeeEast => '├',
            RoadShape::TeeWest => '┤',
            RoadShape::TeeNorth => '┴',
            RoadShape::TeeSouth => '┬',
            RoadShape::Vertical | RoadShape::North | RoadShape::South => '│',
            RoadShape::Horizontal | RoadShape::East | RoadShape::West => '─',
            RoadShape::NorthEast => '└',
            RoadShape::NorthWest => '┘',
            RoadShape::SouthEast => '┌',
            RoadShape::SouthWest => '┐',
        },
    }
}

fn building_glyph(asset_key: Option<&str>) -> char {
    match asset_key.and_then(|key| key.rsplit('/').next()) {
        Some("house") => 'H',
        Some("factory") => 'F',
        Some("school") => 'S',
        Some("library") => 'L',
        _ => 'B',
    }
}
