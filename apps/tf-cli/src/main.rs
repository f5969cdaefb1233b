//! Command-line entry point for steady-state pipe-flow solves.

mod project;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tf_solver::{pipeflow, Mode, SolveOptions};

#[derive(Parser)]
#[command(name = "tf-cli", version, about = "Steady-state pipe-flow solver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and build a network from a project file without solving it.
    Validate {
        /// Path to a YAML project file.
        project: PathBuf,
    },
    /// Solve a network and print node/branch results.
    Run {
        /// Path to a YAML project file.
        project: PathBuf,
        /// Coupling mode, overriding the project file's `options.mode`.
        #[arg(long)]
        mode: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate { project } => cmd_validate(&project),
        Commands::Run { project, mode } => cmd_run(&project, mode.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let project = project::load(path)?;
    let net = project::build_network(&project)?;
    println!(
        "valid: {} node(s), {} branch(es), fluid={}",
        net.node_count(),
        net.branch_count(),
        net.fluid().name()
    );
    Ok(())
}

fn cmd_run(path: &PathBuf, mode_override: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let project = project::load(path)?;
    let mut net = project::build_network(&project)?;

    let (mut mode, opts) = match &project.options {
        Some(config) => config.parse()?,
        None => (Mode::Hydraulics, SolveOptions::default()),
    };
    if let Some(raw) = mode_override {
        mode = raw.parse()?;
    }

    let outcome = pipeflow(&mut net, mode, &opts)?;

    println!("nodes:");
    for (i, node) in outcome.node_results.iter().enumerate() {
        println!(
            "  {:>3}  p={:>10.4} bar  t={:>8.2} K  mdot={:>10.4} kg/s",
            i, node.p_bar, node.t_k, node.mdot_kg_per_s
        );
    }

    println!("branches:");
    for (i, branch) in outcome.branch_results.iter().enumerate() {
        println!(
            "  {:>3}  v={:>9.4} m/s  p_from={:>8.4} bar  p_to={:>8.4} bar  t_from={:>7.2} K  t_to={:>7.2} K  re={:>10.1}  lambda={:.5}",
            i,
            branch.v_mean_m_per_s,
            branch.p_from_bar,
            branch.p_to_bar,
            branch.t_from_k,
            branch.t_to_k,
            branch.reynolds,
            branch.lambda,
        );
    }

    if let Some(n) = outcome.hydraulic_iterations {
        println!("hydraulic iterations: {n}");
    }
    if let Some(n) = outcome.thermal_iterations {
        println!("thermal iterations: {n}");
    }
    if let Some(n) = outcome.outer_iterations {
        println!("outer iterations: {n}");
    }

    Ok(())
}
