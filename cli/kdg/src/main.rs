//! kdg CLI: translate a knob dependency graph description into an
//! LP/MIP solver input file.

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};

use kdg_frontend::{load_list, load_xml, ParseReport};
use kdg_lpgen::{generate, Dialect, Direction, GeneratorConfig};

#[derive(Parser)]
#[command(
    name = "kdg",
    version,
    about = "Generate LP/MIP solver input from a knob dependency graph"
)]
#[command(group = ArgGroup::new("input").required(true))]
struct Cli {
    /// Application name (used for the output file name)
    #[arg(long)]
    app: String,

    /// XML description file
    #[arg(long, group = "input")]
    xml: Option<PathBuf>,

    /// List-format description file
    #[arg(long, group = "input")]
    desc: Option<PathBuf>,

    /// Resource budget for the cost constraint
    #[arg(long, allow_hyphen_values = true)]
    budget: f64,

    /// Output directory for the generated .lp file
    #[arg(long, default_value = ".")]
    outdir: PathBuf,

    /// Output dialect
    #[arg(long, value_enum, default_value_t = DialectArg::Cplex)]
    dialect: DialectArg,

    /// Objective direction
    #[arg(long, value_enum, default_value_t = ObjectiveArg::Quality)]
    objective: ObjectiveArg,

    /// Force a named node on (repeatable)
    #[arg(long)]
    force: Vec<String>,

    /// Print recoverable parse and generation warnings
    #[arg(long)]
    verbose: bool,

    /// Print a JSON model summary after writing the output
    #[arg(long)]
    stats: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Cplex,
    Lpsolve,
}

#[derive(Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    Quality,
    Cost,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (graph, report) = load_graph(&cli)?;
    if cli.verbose {
        print_report(&report);
    }

    let mut config = GeneratorConfig::new(cli.budget);
    config.dialect = match cli.dialect {
        DialectArg::Cplex => Dialect::Cplex,
        DialectArg::Lpsolve => Dialect::LpSolve,
    };
    config.direction = match cli.objective {
        ObjectiveArg::Quality => Direction::MaximizeValue,
        ObjectiveArg::Cost => Direction::MinimizeCost,
    };
    for name in &cli.force {
        config.force(name);
    }

    let generated = generate(&graph, &config)
        .with_context(|| format!("could not generate a model for {}", cli.app))?;
    if cli.verbose {
        for warning in &generated.warnings {
            eprintln!("warning: {warning}");
        }
    }

    fs::create_dir_all(&cli.outdir)
        .with_context(|| format!("could not create output directory {}", cli.outdir.display()))?;
    let out_path = cli.outdir.join(format!("{}.lp", cli.app));
    fs::write(&out_path, &generated.text)
        .with_context(|| format!("could not write {}", out_path.display()))?;

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&generated.stats)?);
    }
    Ok(())
}

fn load_graph(cli: &Cli) -> Result<(kdg_core::DependencyGraph, ParseReport)> {
    if let Some(path) = &cli.xml {
        load_xml(&cli.app, path).context("could not read the XML description")
    } else if let Some(path) = &cli.desc {
        load_list(path).context("could not read the list description")
    } else {
        // clap's input group makes this unreachable.
        bail!("no input description provided")
    }
}

fn print_report(report: &ParseReport) {
    for warning in report.warnings() {
        eprintln!("warning: {warning}");
    }
}
