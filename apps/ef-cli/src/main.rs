use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

use ef_graph::NodeKind;
use tracing::{info, warn};

mod error;

use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "ef-cli")]
#[command(about = "EnerFlow CLI - compile energy system models into flow graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a model file without compiling it
    Validate {
        /// Path to the model file (YAML or JSON)
        model_path: PathBuf,
    },
    /// Compile a model and print the build report
    Compile {
        /// Path to the model file (YAML or JSON)
        model_path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Write the compiled graph as JSON to this file
        #[arg(long)]
        emit_graph: Option<PathBuf>,
        /// Fail when any row is rejected
        #[arg(long)]
        strict: bool,
    },
    /// Apply the configured temporal reduction and print its statistics
    Reduce {
        /// Path to the model file (YAML or JSON)
        model_path: PathBuf,
    },
    /// Annualize an investment cost
    Annualize {
        /// Capital cost per unit of capacity
        capital: f64,
        /// Economic lifetime in years
        #[arg(long)]
        lifetime: Option<f64>,
        /// Interest rate as a fraction (0.05 = 5 %)
        #[arg(long)]
        rate: Option<f64>,
    },
}

fn main() -> CliResult<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { model_path } => cmd_validate(&model_path),
        Commands::Compile {
            model_path,
            json,
            emit_graph,
            strict,
        } => cmd_compile(&model_path, json, emit_graph.as_deref(), strict),
        Commands::Reduce { model_path } => cmd_reduce(&model_path),
        Commands::Annualize {
            capital,
            lifetime,
            rate,
        } => cmd_annualize(capital, lifetime, rate),
    }
}

fn cmd_validate(model_path: &Path) -> CliResult<()> {
    println!("Validating model: {}", model_path.display());
    let spec = ef_spec::load(model_path)?;
    info!(model = %spec.name, path = %model_path.display(), "model loaded");
    println!("✓ Model '{}' is valid", spec.name);
    println!(
        "  {} buses, {} sources, {} sinks, {} converters, {} series",
        spec.buses.len(),
        spec.sources.len(),
        spec.sinks.len(),
        spec.converters.len(),
        spec.timeseries.len()
    );
    Ok(())
}

fn cmd_compile(
    model_path: &Path,
    json: bool,
    emit_graph: Option<&Path>,
    strict: bool,
) -> CliResult<()> {
    let spec = ef_spec::load(model_path)?;
    info!(model = %spec.name, path = %model_path.display(), "model loaded");
    let model = ef_compile::compile(&spec)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&model.report)?);
    } else {
        print!("{}", model.report);
        for kind in [
            NodeKind::Bus,
            NodeKind::Source,
            NodeKind::Sink,
            NodeKind::Converter,
        ] {
            println!("  {kind}: {}", model.graph.nodes_of(kind).count());
        }
        println!(
            "  flows: {} ({} with investment, {} on/off)",
            model.graph.flows().len(),
            model.graph.investment_flows().count(),
            model.graph.flows().iter().filter(|f| f.nonconvex.is_some()).count()
        );
    }

    if let Some(path) = emit_graph {
        let encoded = serde_json::to_string_pretty(&model.graph)?;
        std::fs::write(path, encoded).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "graph written");
        if !json {
            println!("✓ Graph written to {}", path.display());
        }
    }

    let count = model.report.rejected().count();
    if strict && count > 0 {
        warn!(count, "strict mode: rejected rows present");
        return Err(CliError::RejectedRows { count });
    }
    Ok(())
}

fn cmd_reduce(model_path: &Path) -> CliResult<()> {
    let spec = ef_spec::load(model_path)?;
    info!(model = %spec.name, path = %model_path.display(), "model loaded");
    let strategy = spec.settings.reduction.resolve()?;
    let index = spec.settings.time_index.build()?;
    let reduction = ef_ts::reduce(&index, &spec.timeseries, &strategy)?;
    let stats = &reduction.stats;

    println!("Strategy: {}", stats.strategy);
    println!(
        "  time steps: {} -> {} (ratio {:.3})",
        stats.original_len, stats.reduced_len, stats.ratio
    );
    println!(
        "  span: {} .. {}",
        reduction.index.first(),
        reduction.index.last()
    );
    for (name, values) in reduction.table.iter() {
        println!("  {name}: {} samples", values.len());
    }
    for (name, len) in &reduction.misaligned {
        println!("  {name}: {len} samples, left out (index has {})", index.len());
    }
    Ok(())
}

fn cmd_annualize(capital: f64, lifetime: Option<f64>, rate: Option<f64>) -> CliResult<()> {
    let annual = ef_core::annualized_cost(capital, lifetime, rate)?;
    info!(capital, ?lifetime, ?rate, annual, "investment annualized");
    match (lifetime, rate) {
        (Some(n), Some(i)) => {
            let factor = ef_core::annuity_factor(i, n)?;
            println!("annuity factor: {factor:.6}");
        }
        _ => println!("lifetime or rate missing; capital taken as annual cost"),
    }
    println!("annualized cost: {annual:.4}");
    Ok(())
}
