//! Sift CLI
//!
//! Inspect filter declarations and replay edits against them.

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sift_filter::dispatch::render_filter;
use sift_filter::{FilterModelRef, Operator};

mod config;
mod edit;
mod render;

use config::FilterConfig;
use edit::Edit;
use render::TextRenderer;

#[derive(Parser)]
#[command(name = "sift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rich filter declarations: inspect fields and build payloads", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show visible and available fields
    Show {
        /// Filter declaration (TOML); the demo filter when omitted
        file: Option<PathBuf>,
    },

    /// Apply edits in the order given and print the payload
    Parse {
        /// Filter declaration (TOML); the demo filter when omitted
        file: Option<PathBuf>,

        /// Show a field
        #[arg(long, value_name = "ID")]
        add: Vec<String>,

        /// Remove a field, nulling its value and operator
        #[arg(long, value_name = "ID")]
        clean: Vec<String>,

        /// Set a value (`null` clears it, ranges are LOW..HIGH)
        #[arg(long, value_name = "ID=VALUE")]
        set: Vec<String>,

        /// Set an operator by its wire name
        #[arg(long, value_name = "ID=OP")]
        operator: Vec<String>,

        /// Hide every field
        #[arg(long)]
        clear: bool,

        /// Restore the declared state
        #[arg(long)]
        reset: bool,

        /// Print the visible fields with type and order instead of the payload
        #[arg(long)]
        state: bool,
    },

    /// List declared fields with their types and operators
    Fields {
        /// Filter declaration (TOML); the demo filter when omitted
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Show { file } => cmd_show(file.as_deref()),

        Commands::Parse { file, state, .. } => {
            let edits = matches
                .subcommand_matches("parse")
                .map(ordered_edits)
                .unwrap_or_default();
            cmd_parse(file.as_deref(), &edits, state)
        }

        Commands::Fields { file } => cmd_fields(file.as_deref()),
    }
}

/// Edits in command-line order, whatever flag introduced them
fn ordered_edits(matches: &ArgMatches) -> Vec<Edit> {
    let mut edits: Vec<(usize, Edit)> = Vec::new();

    let mut collect = |name: &str, make: fn(String) -> Edit| {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(name), matches.get_many::<String>(name))
        {
            edits.extend(indices.zip(values.cloned().map(make)));
        }
    };
    collect("add", Edit::Add);
    collect("clean", Edit::Clean);
    collect("set", Edit::Set);
    collect("operator", Edit::Operator);

    for (name, edit) in [("clear", Edit::Clear), ("reset", Edit::Reset)] {
        if matches.get_flag(name) {
            let index = matches.index_of(name).unwrap_or(usize::MAX);
            edits.push((index, edit));
        }
    }

    edits.sort_by_key(|(index, _)| *index);
    edits.into_iter().map(|(_, edit)| edit).collect()
}

fn cmd_show(file: Option<&Path>) -> Result<()> {
    let config = FilterConfig::load_or_demo(file)?;
    let model = config.build_model()?;

    if let Some(title) = &config.title {
        println!("{title}");
        println!();
    }

    let lines = render_filter(&mut TextRenderer, &model)?;
    println!("Visible ({}):", lines.len());
    for line in &lines {
        println!("  {line}");
    }

    let available = model.available_fields();
    println!();
    println!("Available ({}):", available.len());
    for field in &available {
        println!("  {} ({})", field.display_label(), field.field_type());
    }

    Ok(())
}

fn cmd_parse(file: Option<&Path>, edits: &[Edit], show_state: bool) -> Result<()> {
    let config = FilterConfig::load_or_demo(file)?;
    let model = config.build_model()?;

    edit::apply_all(&model, edits)?;
    info!("Applied {} edit(s)", edits.len());

    let json = if show_state {
        let state: serde_json::Map<String, serde_json::Value> = model
            .fields_array()
            .into_iter()
            .map(|field| {
                let entry = serde_json::json!({
                    "type": field.field_type(),
                    "value": field.value,
                    "operator": field.operator,
                    "order": field.order,
                });
                (field.id, entry)
            })
            .collect();
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string_pretty(&model.payload())
    }
    .context("Failed to serialize payload")?;

    println!("{json}");
    Ok(())
}

fn cmd_fields(file: Option<&Path>) -> Result<()> {
    let config = FilterConfig::load_or_demo(file)?;
    let model = config.build_model()?;

    for field in model.base().iter() {
        let operators: Vec<&str> = field
            .field_type()
            .operators()
            .iter()
            .map(Operator::as_str)
            .collect();
        println!(
            "{:<16} {:<14} {}",
            field.id,
            field.field_type().as_str(),
            operators.join(", ")
        );
    }

    Ok(())
}
