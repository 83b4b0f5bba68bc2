use anyhow::{Context, Result};
use clap::Parser;
use econ_core::Economy;
use econ_domain::SimTime;
use econ_store::{load_world, save_world, EconomyStore, JsonFileEconomyStore};
use tracing::{event, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use galactic_economy::cli_args::{Cli, Commands};
use galactic_economy::configuration::AppConfiguration;
use galactic_economy::{load_world_state, report, simulation};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = AppConfiguration::from_env(&cli)?;

    let mut world = load_world_state(&cfg)?;
    event!(
        Level::INFO,
        "Loaded {} commodities, {} systems and {} planets",
        world.catalog.len(),
        world.universe.systems().len(),
        world.universe.planets().len()
    );

    let mut economy = Economy::new(cfg.economy.clone());
    economy.init(&mut world).context("initialising the economy")?;

    let store = JsonFileEconomyStore::new(&cfg.save_dir);

    match cli.command {
        Commands::Prices { system } => {
            let only_system = match system {
                Some(name) => Some(world.universe.system_by_name(&name).with_context(|| format!("unknown system '{name}'"))?),
                None => None,
            };
            println!("{}", report::price_table(&world, &economy, only_system));
        }
        Commands::Simulate { ticks, dt, save_slot } => {
            if let Some(slot) = save_slot.as_deref() {
                if load_world(&store, slot, &mut world)?.is_none() {
                    event!(Level::INFO, "Starting slot '{}' from scratch", slot);
                }
            }
            simulation::run_ticks(&mut world, &mut economy, ticks, SimTime(dt))?;
            println!("{}", report::averages_table(&world, &economy));
            if let Some(slot) = save_slot.as_deref() {
                save_world(&store, slot, &world)?;
            }
        }
        Commands::Averages { slot } => match load_world(&store, &slot, &mut world)? {
            Some(_) => println!("{}", report::averages_table(&world, &economy)),
            None => warn!("Nothing saved in slot '{}'", slot),
        },
        Commands::Slots => {
            for slot in store.slots()? {
                println!("{slot}");
            }
        }
    }

    economy.destroy();
    Ok(())
}
