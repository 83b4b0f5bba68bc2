use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env("ECONOMY_CATALOG"), default_value = "resources/commodities.json")]
    pub catalog: PathBuf,
    #[arg(long, env("ECONOMY_UNIVERSE"), default_value = "resources/universe.json")]
    pub universe: PathBuf,
    #[arg(long, env("ECONOMY_SAVE_DIR"), default_value = "saves")]
    pub save_dir: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, PartialEq, Subcommand)]
pub enum Commands {
    /// prints the current price of every commodity on every planet
    Prices {
        #[arg(long)]
        system: Option<String>,
    },
    /// advances the clock, landing on every planet each tick
    Simulate {
        #[arg(long, default_value_t = 10)]
        ticks: u32,
        /// simulated time per tick, in ntime
        #[arg(long, default_value_t = 10_000_000)]
        dt: u64,
        /// writes the observations to this slot afterwards
        #[arg(long)]
        save_slot: Option<String>,
    },
    /// prints the observed averages stored in a save slot
    Averages {
        #[arg(long, default_value = "auto")]
        slot: String,
    },
    /// lists the save slots
    Slots,
}
