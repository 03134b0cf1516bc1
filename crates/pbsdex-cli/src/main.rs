//! PBSDex CLI
//!
//! Converts PBS text files into JSON:
//! - `pokemon`: species + forms, merged into one flat array
//! - `moves`, `types`, `items`, `abilities`: objects keyed by internal id
//! - `encounters`: encounter tables keyed by location

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use pbsdex_ingest::pokemon::{self, PokemonOptions};
use pbsdex_ingest::{read_source, Format};
use pbsdex_pbs::{DuplicatePolicy, StatOrder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pbsdex")]
#[command(author, version, about = "PBSDex: convert PBS data files to JSON")]
struct Cli {
    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// pokemon.txt (+ pokemon_forms.txt) → array of species and forms
    Pokemon(PokemonArgs),
    /// moves.txt → moves keyed by internal id
    Moves(ConvertArgs),
    /// types.txt → types keyed by internal id
    Types(ConvertArgs),
    /// items.txt → items keyed by internal id
    Items(ConvertArgs),
    /// abilities.txt → abilities keyed by internal id
    Abilities(ConvertArgs),
    /// encounters.txt → encounter tables keyed by location
    Encounters(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input PBS file
    src: PathBuf,
    /// Output JSON file
    dest: PathBuf,
}

#[derive(Args)]
struct PokemonArgs {
    /// Input pokemon.txt
    src: PathBuf,
    /// Output JSON file
    dest: PathBuf,
    /// pokemon_forms.txt; skipped with a warning if missing
    #[arg(long)]
    forms: Option<PathBuf>,
    /// Order of the six values in BaseStats / EffortPoints
    #[arg(long, default_value = "hp,atk,def,spe,spa,spd")]
    stat_order: StatOrder,
    /// Drop cosmetic forms (Unown letters, Pikachu caps and cosplay)
    #[arg(long)]
    exclude_cosmetics: bool,
    /// Only identity, types, stats, abilities and pokedex text
    #[arg(long)]
    compact: bool,
    /// Which block wins when two species share an internal id
    #[arg(long, default_value = "last-wins")]
    duplicates: DuplicatePolicy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Pokemon(args) => cmd_pokemon(&args),
        Commands::Moves(args) => cmd_convert(Format::Moves, &args),
        Commands::Types(args) => cmd_convert(Format::Types, &args),
        Commands::Items(args) => cmd_convert(Format::Items, &args),
        Commands::Abilities(args) => cmd_convert(Format::Abilities, &args),
        Commands::Encounters(args) => cmd_convert(Format::Encounters, &args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_pokemon(args: &PokemonArgs) -> Result<()> {
    println!("{} species {}", "Converting".green().bold(), args.src.display());

    let species = read_source(&args.src)?;
    let forms = match &args.forms {
        Some(path) if path.exists() => {
            println!("  {} forms {}", "+".cyan(), path.display());
            Some(read_source(path)?)
        }
        Some(path) => {
            tracing::warn!(path = %path.display(), "forms file not found, continuing without forms");
            None
        }
        None => None,
    };

    let options = PokemonOptions {
        stat_order: args.stat_order,
        include_cosmetic: !args.exclude_cosmetics,
        duplicates: args.duplicates,
        compact: args.compact,
    };
    let (outcome, report) = pokemon::convert(&species, forms.as_deref(), &options);

    let json = serde_json::to_string_pretty(&outcome.entities)?;
    write_output(&args.dest, &json)?;

    println!(
        "{} {} entries to {}",
        "Wrote".green().bold(),
        outcome.entities.len(),
        args.dest.display()
    );
    if report.duplicates > 0 {
        println!(
            "  {} {} duplicate species ({})",
            "→".cyan(),
            report.duplicates,
            args.duplicates
        );
    }
    if outcome.unknown_base > 0 {
        println!("  {} {} forms with unknown species skipped", "→".cyan(), outcome.unknown_base);
    }
    if outcome.cosmetic_skipped > 0 {
        println!("  {} {} cosmetic forms skipped", "→".cyan(), outcome.cosmetic_skipped);
    }
    Ok(())
}

fn cmd_convert(format: Format, args: &ConvertArgs) -> Result<()> {
    println!("{} {} {}", "Converting".green().bold(), format, args.src.display());

    let text = read_source(&args.src)?;
    let (json, count) = format.convert(&text)?;
    write_output(&args.dest, &json)?;

    println!(
        "{} {} {} to {}",
        "Wrote".green().bold(),
        count,
        format.noun(),
        args.dest.display()
    );
    Ok(())
}

fn write_output(dest: &Path, json: &str) -> Result<()> {
    fs::create_dir_all(dest.parent().unwrap_or(Path::new(".")))
        .with_context(|| format!("creating parent directory of {}", dest.display()))?;
    fs::write(dest, format!("{json}\n")).with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}
