#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs addd towns in the terminal.

mod save_slots;
mod scenario;
mod text_presenter;

use std::{io, path::PathBuf, time::Duration};

use addd_core::{Command, Event};
use addd_rendering::{Highlight, Presenter, Scene, SoundCue, TILE_LENGTH};
use addd_world::{self as world, query, World};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    save_slots::{SaveSlots, SlotStatus},
    scenario::Scenario,
    text_presenter::TextPresenter,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Town simulation with wandering NPCs")]
struct Cli {
    /// Directory holding the save slots.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Write readable JSON saves instead of encoded ones.
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Simulate a scenario or a saved game.
    Run(RunArgs),
    /// Draw the contents of a save slot.
    Show {
        /// Slot to draw.
        slot: usize,
    },
    /// List the save slots.
    Slots,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenario to start from.
    #[arg(long, default_value = "scenarios/demo.toml")]
    scenario: PathBuf,

    /// Resume from a save slot instead of a scenario.
    #[arg(long, conflicts_with = "scenario")]
    load: Option<usize>,

    /// Real seconds to simulate.
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Frames per simulated second.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Draw frames while simulating.
    #[arg(long)]
    render: bool,

    /// Draw one frame out of this many.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    render_every: u64,

    /// Slot to save into when the run ends.
    #[arg(long)]
    save: Option<usize>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default)]
struct Tally {
    moves: usize,
    interactions: usize,
    completed: usize,
    rejected: usize,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::MoveCompleted { .. } => self.moves += 1,
            Event::Interacted { .. } => self.interactions += 1,
            Event::ObjectiveCompleted { .. } => self.completed += 1,
            Event::CommandRejected { .. } => self.rejected += 1,
            _ => {}
        }
    }
}

/// Entry point for the addd command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let slots = SaveSlots::new(&cli.data_dir, cli.dev);

    match cli.command {
        Mode::Run(args) => run(args, &slots),
        Mode::Show { slot } => {
            let world = slots.load(slot)?;
            let mut presenter = TextPresenter::new(io::stdout().lock());
            presenter.present(&scene(&world, &format!("slot {slot}"))?)
        }
        Mode::Slots => {
            for (slot, status) in slots.list() {
                match status {
                    SlotStatus::Empty => println!("slot {slot}: empty"),
                    SlotStatus::Saved { minutes, entities } => {
                        println!("slot {slot}: {minutes} minutes, {entities} entities")
                    }
                    SlotStatus::Unreadable(reason) => {
                        println!("slot {slot}: unreadable ({reason})")
                    }
                }
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run(args: RunArgs, slots: &SaveSlots) -> Result<()> {
    let (mut world, title) = match args.load {
        Some(slot) => (slots.load(slot)?, format!("slot {slot}")),
        None => {
            let scenario = Scenario::load(&args.scenario)?;
            if !scenario.description.is_empty() {
                info!(scenario = %scenario.name, "{}", scenario.description);
            }
            (scenario.build()?, scenario.name)
        }
    };

    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let frames = (args.seconds.max(0.0) * f64::from(args.fps)).round() as u64;
    let mut presenter = TextPresenter::new(io::stdout().lock());
    let mut tally = Tally::default();

    info!(%title, frames, "simulation started");
    for index in 0..frames {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: frame }, &mut events);
        for event in &events {
            debug!(?event, "world event");
            tally.record(event);
            if let Some(cue) = SoundCue::for_event(event) {
                presenter.play(cue)?;
            }
        }
        if args.render && index % args.render_every == 0 {
            presenter.present(&scene(&world, &title)?)?;
        }
    }
    if args.render {
        presenter.present(&scene(&world, &title)?)?;
    }

    let clock = query::clock(&world);
    info!(
        minutes = clock.minutes(),
        frames_drawn = presenter.frames(),
        moves = tally.moves,
        interactions = tally.interactions,
        completed = tally.completed,
        rejected = tally.rejected,
        "simulation finished"
    );
    let open: usize = query::entities(&world)
        .iter()
        .map(|entity| entity.objectives().len())
        .sum();
    println!(
        "{title}: {} objectives completed, {open} still open after {} game minutes",
        tally.completed,
        clock.minutes()
    );

    if let Some(slot) = args.save {
        let path = slots.save(slot, &world)?;
        println!("saved to {}", path.display());
    }
    Ok(())
}

fn scene(world: &World, title: &str) -> Result<Scene> {
    let clock = query::clock(world);
    let caption = format!(
        "{title} | day {} {:02}:{}0",
        clock.day() + 1,
        clock.hour(),
        clock.ten_minutes()
    );
    let scene = Scene::build(
        &query::grid_snapshot(world),
        &query::entity_view(world),
        Highlight::default(),
        TILE_LENGTH,
    )?;
    Ok(scene.with_caption(caption))
}
