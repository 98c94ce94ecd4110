//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kdam::{tqdm, BarExt};
use tracing::info;

use crate::error::Result;
use crate::io::{place, read_part_file, write_part_file, Appearance, AtOrigin, Linear, Placement};
use crate::network::generators::{adder, random, testcases};
use crate::network::stats::stats;
use crate::network::{CompileConfig, GateMode, Network};
use crate::sim::{SimConfig, Simulator};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a network, compile it and write its part list
    ///
    /// Dead ends are removed unless asked otherwise, and parts are given a position
    /// by the chosen placement.
    #[clap(alias = "gen")]
    Generate(GenerateArgs),

    /// Show statistics about a part list
    ///
    /// Will print the number of parts of each kind and how connected they are.
    #[clap()]
    Show(ShowArgs),

    /// Simulate a part list
    ///
    /// Parts can be driven to a fixed state for the whole simulation. The states of the
    /// pinned parts after the last frame are printed, one per line.
    #[clap(alias = "sim")]
    Simulate(SimulateArgs),
}

impl Commands {
    /// Run the command
    pub fn run(&self) -> Result<()> {
        match self {
            Commands::Generate(a) => a.run(),
            Commands::Show(a) => a.run(),
            Commands::Simulate(a) => a.run(),
        }
    }
}

/// Available network generators
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GeneratorKind {
    /// Chain of gates
    Chain,
    /// Xor gates fed by the two previous ones
    Mesh,
    /// Ripple-carry adder
    Adder,
    /// Random network with loops
    Random,
}

/// Available placements
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PlacementKind {
    /// All parts at the origin
    Origin,
    /// Parts in a row, pinned parts on a separate row
    Linear,
}

/// Command arguments for network generation
#[derive(Args)]
pub struct GenerateArgs {
    /// Network to generate
    #[arg(value_enum)]
    kind: GeneratorKind,

    /// Output file for the part list
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Size of the network: gates for chains, meshes and random networks, bits for adders
    #[arg(short = 'n', long, default_value_t = 8)]
    size: usize,

    /// Gate mode for chains
    #[arg(long, default_value = "and")]
    mode: GateMode,

    /// Maximum number of inputs per gate for random networks
    #[arg(long, default_value_t = 3)]
    max_fanin: usize,

    /// Seed for random networks
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Depth budget of the compilation
    #[arg(long, default_value_t = 900)]
    max_depth: usize,

    /// Keep the parts that cannot influence any pinned part
    #[arg(long)]
    keep_dead_ends: bool,

    /// Placement of the exported parts
    #[arg(long, value_enum, default_value_t = PlacementKind::Linear)]
    placement: PlacementKind,

    /// Distance between parts for the linear placement
    #[arg(long, default_value_t = 1)]
    spacing: i32,
}

impl GenerateArgs {
    fn network(&self) -> Network<Appearance> {
        match self.kind {
            GeneratorKind::Chain => testcases::chain(self.size.max(1), self.mode),
            GeneratorKind::Mesh => testcases::mesh(self.size.max(2)),
            GeneratorKind::Adder => adder::ripple_carry(self.size),
            GeneratorKind::Random => {
                random::random_circuit(self.size.max(1), self.max_fanin.max(1), self.seed)
            }
        }
    }

    /// Run the command
    pub fn run(&self) -> Result<()> {
        let mut net = self.network();
        net.compile(&CompileConfig {
            max_depth: self.max_depth,
            remove_dead_ends: !self.keep_dead_ends,
            prune_dead_loops: !self.keep_dead_ends,
        });
        for d in net.diagnostics() {
            println!("Warning: {}", d);
        }
        let mut parts = net.parts()?;
        let placement: Box<dyn Placement> = match self.placement {
            PlacementKind::Origin => Box::new(AtOrigin),
            PlacementKind::Linear => Box::new(Linear {
                spacing: self.spacing,
            }),
        };
        place(&mut parts, placement.as_ref());
        write_part_file(&self.output, &parts)?;
        println!("{}", stats(&parts));
        Ok(())
    }
}

/// Command arguments for part list informations
#[derive(Args)]
pub struct ShowArgs {
    /// Part list to show
    file: PathBuf,
}

impl ShowArgs {
    /// Run the command
    pub fn run(&self) -> Result<()> {
        let parts = read_part_file::<Appearance>(&self.file)?;
        println!("Part list stats:\n{}\n\n", stats(&parts));
        Ok(())
    }
}

/// Parse a forced state given as ID=0 or ID=1
fn parse_drive(s: &str) -> std::result::Result<(u32, bool), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=0 or ID=1, got '{}'", s))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid part id '{}': {}", id, e))?;
    let value = match value.trim() {
        "0" => false,
        "1" => true,
        v => return Err(format!("invalid state '{}', expected 0 or 1", v)),
    };
    Ok((id, value))
}

/// Command arguments for simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Part list to simulate
    file: PathBuf,

    /// Number of frames to simulate
    #[arg(short = 'f', long, default_value_t = 100)]
    frames: usize,

    /// Number of partitions evaluated concurrently
    #[arg(short = 'p', long, default_value_t = 1)]
    partitions: usize,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Force the state of a part for the whole simulation, as ID=0 or ID=1
    #[arg(short = 'd', long, value_parser = parse_drive)]
    drive: Vec<(u32, bool)>,
}

impl SimulateArgs {
    /// Run the command
    pub fn run(&self) -> Result<()> {
        let parts = read_part_file::<Appearance>(&self.file)?;
        let config = SimConfig {
            partitions: self.partitions,
            threads: self.threads,
        };
        let mut sim = Simulator::new(&parts, &config)?;
        for (id, value) in &self.drive {
            sim.drive(*id, Some(*value))?;
        }

        let mut progress = tqdm!(total = self.frames);
        progress.set_description("Frames simulated");
        for _ in 0..self.frames {
            sim.step();
            progress.update(1)?;
        }
        progress.refresh()?;
        eprintln!();
        info!("Simulated {} frames", sim.frame());

        for (id, state) in sim.pinned().zip(sim.pinned_states()) {
            println!("{}: {}", id, u8::from(state));
        }
        Ok(())
    }
}
