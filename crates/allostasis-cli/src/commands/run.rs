//! Run a world headless.

use allostasis::prelude::*;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{self, DropSpec};

pub struct RunOptions {
    pub ticks: u64,
    pub seed: Option<u64>,
    pub agents: Option<usize>,
    pub drops: Vec<DropSpec>,
    pub json: bool,
    pub verbose: bool,
}

pub fn run(config_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let (mut sim_config, source) = config::load(config_path)?;
    if let Some(seed) = options.seed {
        sim_config.world.seed = seed;
    }
    if let Some(agents) = options.agents {
        sim_config.population.count = agents;
    }

    let mut world = Simulation::from_config(&sim_config).context("Failed to build world")?;
    let sync = Synchronizer::new(world.snapshot());

    for drop in &options.drops {
        if let Err(e) = sync.try_submit(drop.action()) {
            bail!("Rejected --drop {},{},{}: {}", drop.x, drop.y, drop.amount, e);
        }
    }

    if options.json {
        let snapshot = world.run(options.ticks, &sync)?;
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    if let Some(path) = source {
        println!("{} Using {}", "→".blue(), path.display());
    }
    let initial = sync.get_snapshot();
    println!(
        "{} World {}x{}, {} agents, seed {}",
        "→".blue(),
        sim_config.world.width,
        sim_config.world.height,
        initial.agents.len().to_string().cyan(),
        sim_config.world.seed
    );
    println!("{} Running {} ticks...", "→".blue(), options.ticks.to_string().cyan());

    let pb = ProgressBar::new(options.ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ticks ({msg})")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut last_deaths = 0;
    let mut last = initial.clone();
    for _ in 0..options.ticks {
        last = world.step(&sync)?;
        let stats = &last.stats;
        if options.verbose && stats.total_deaths > last_deaths {
            for agent in last.agents.iter().filter(|a| a.died_at == Some(last.tick)) {
                pb.println(format!(
                    "  {} {} died at tick {} ({:?})",
                    "✗".red(),
                    agent.id,
                    last.tick,
                    agent.death_cause
                ));
            }
        }
        last_deaths = stats.total_deaths;
        pb.set_message(format!("{} alive", stats.agents_alive));
        pb.inc(1);
        if stats.agents_alive == 0 && !last.agents.is_empty() {
            pb.println(format!("  {} population extinct at tick {}", "•".yellow(), last.tick));
            break;
        }
    }
    pb.finish_with_message("done");

    print_summary(&initial, &last);
    Ok(())
}

fn print_summary(initial: &WorldSnapshot, last: &WorldSnapshot) {
    let stats = &last.stats;
    println!();
    println!("{} Simulation complete at tick {}", "✓".green().bold(), last.tick);
    println!(
        "  Alive: {} → {}",
        initial.stats.agents_alive.to_string().yellow(),
        stats.agents_alive.to_string().green()
    );

    let mut causes: BTreeMap<String, usize> = BTreeMap::new();
    for agent in &last.agents {
        if let Some(cause) = agent.death_cause {
            *causes.entry(format!("{:?}", cause)).or_default() += 1;
        }
    }
    if causes.is_empty() {
        println!("  Deaths: {}", "0".green());
    } else {
        let detail: Vec<String> = causes.iter().map(|(c, n)| format!("{} {}", n, c)).collect();
        println!("  Deaths: {} ({})", stats.total_deaths.to_string().red(), detail.join(", "));
    }

    println!(
        "  Mean energy: {:.2} → {:.2}",
        initial.stats.mean_energy, stats.mean_energy
    );
    println!(
        "  Mean temperature: {:.2} → {:.2}",
        initial.stats.mean_temperature, stats.mean_temperature
    );
    println!("  Mean valence: {:.3}", stats.mean_valence);
    println!(
        "  Food in world: {:.1} → {:.1}",
        initial.stats.food_total, stats.food_total
    );
    if stats.total_faults > 0 {
        println!("  Agent faults: {}", stats.total_faults.to_string().yellow());
    }
}
