use alloyblend_core::{
    BlendingProblem, Config, ExportFormat, LoggingConfig, OptimizationResult, OptimizationStatus, Optimizer,
    SensitivityReport, io, presets,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "alloyblend")]
#[command(about = "Least-cost alloy blending from raw materials", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a blending problem and output the optimal blend
    Solve {
        /// The JSON problem file
        file: PathBuf,
        /// Show sensitivity analysis
        #[arg(short, long)]
        analysis: bool,
        /// Output format (pretty, json, csv)
        #[arg(short, long, default_value = "pretty", value_parser = ["pretty", "json", "csv"])]
        format: String,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a problem file for errors
    Check {
        /// The JSON problem file
        file: PathBuf,
    },
    /// Write the 316L stainless steel example problem
    Preset {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
        _ => {
            fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    }
}

fn read_problem(file: &Path) -> BlendingProblem {
    match io::load_problem(file) {
        Ok(p) => {
            tracing::debug!(file = %file.display(), materials = p.raw_materials.len(), "problem loaded");
            p
        }
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            analysis,
            format,
            config,
        } => {
            let config = load_config(config.as_deref());
            init_logging(&config.logging);

            let problem = read_problem(&file);
            let optimizer = Optimizer::from_config(&config.solver);

            let result = match optimizer.optimize(&problem) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            match format.parse::<ExportFormat>() {
                Ok(ExportFormat::Json) => match io::result_to_json(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                Ok(ExportFormat::Csv) => print!("{}", io::result_to_csv(&result)),
                Err(_) => print_pretty(&problem, &result, analysis),
            }

            if !result.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let problem = read_problem(&file);
            let errors = problem.validate();

            if errors.is_empty() {
                println!("✓ {} is valid", file.display());
                println!("  {} raw materials", problem.raw_materials.len());
                println!("  {} elements", problem.alloy_spec.elements.len());
                println!("  {} additional constraints", problem.additional_constraints.constraints.len());
            } else {
                eprintln!("✗ {} has {} error(s):", file.display(), errors.len());
                for e in &errors {
                    eprintln!("  {}", e);
                }
                std::process::exit(1);
            }
        }
        Commands::Preset { output } => {
            let json = match io::problem_to_json(&presets::stainless_316l()) {
                Ok(j) => j,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        eprintln!("Error writing {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }
}

fn print_pretty(problem: &BlendingProblem, result: &OptimizationResult, analysis: bool) {
    let spec = &problem.alloy_spec;
    println!("Problem: {}", problem.name);
    println!("Alloy: {}", spec.name);
    println!("Target weight: {}", spec.target_weight);
    println!();

    match result.status {
        OptimizationStatus::Optimal | OptimizationStatus::TimeLimitReached => {
            println!("Status: {}", result.status);
            if result.status == OptimizationStatus::TimeLimitReached {
                println!("Best blend found before the limit; not proven optimal.");
            }
            println!("Total cost: {:.2}", result.total_cost);
            println!("Solve time: {:.3}s", result.solve_time);
            println!();

            println!("Raw materials:");
            for material in &problem.raw_materials {
                let amount = result.quantity(&material.name);
                if amount > 0.001 {
                    let pct = amount / result.total_weight * 100.0;
                    println!("  {:24} {:10.2} ({:5.2}%)", material.name, amount, pct);
                }
            }
            println!();

            println!("Composition:");
            for element in &spec.elements {
                let flag = |suffix: &str| {
                    result
                        .constraints_satisfied
                        .get(&format!("{}_{}", element.symbol, suffix))
                        .copied()
                        .unwrap_or(true)
                };
                let ok = flag("min") && flag("max") && flag("target");
                println!(
                    "  {:4} {:8.3}%  [{} - {}] {}",
                    element.symbol,
                    result.percentage(&element.symbol),
                    element.min_percent,
                    element.max_percent,
                    if ok { "✓" } else { "✗" }
                );
            }

            if let Some(props) = &result.properties {
                println!();
                println!("Estimated properties:");
                println!("  density        {:8.3}", props.density);
                println!("  hardness       {:8.2}", props.hardness);
                println!("  melting point  {:8.1}", props.melting_point);
            }

            let failed: Vec<&String> = result
                .constraints_satisfied
                .iter()
                .filter(|(_, ok)| !**ok)
                .map(|(name, _)| name)
                .collect();
            if !failed.is_empty() {
                println!();
                println!("Unsatisfied constraints:");
                for name in failed {
                    println!("  - {}", name);
                }
            }

            if analysis {
                match &result.sensitivity {
                    Some(report) => print_analysis(report),
                    None => {
                        println!();
                        println!("Analysis: not available (integer model or non-optimal result)");
                    }
                }
            }
        }
        OptimizationStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No blend satisfies all constraints.");
            if !result.diagnostics.is_empty() {
                println!();
                println!("Conflicting constraints:");
                for d in &result.diagnostics {
                    println!("  - {}", d);
                }
            }
        }
        OptimizationStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal blend; check material costs.");
        }
        OptimizationStatus::SolverError => {
            println!("Status: SOLVER_ERROR");
            println!("{}", result.message);
        }
    }
}

fn print_analysis(report: &SensitivityReport) {
    println!();
    println!("Analysis:");
    println!();

    if let Some(marginal) = report.marginal_cost_per_unit {
        println!("Marginal cost per unit of blend: {:.4}", marginal);
        println!();
    }

    if !report.binding_constraints.is_empty() {
        println!("Binding constraints:");
        for name in &report.binding_constraints {
            println!("  - {}", name);
        }
        println!();
    }

    println!("Shadow prices:");
    for sp in &report.shadow_prices {
        if sp.value.abs() > 0.001 {
            println!("  {:30} {:10.4}", sp.constraint, sp.value);
            println!("    {}", sp.interpretation);
        }
    }
    println!();

    println!("Reduced costs (materials not in the blend):");
    for rc in &report.reduced_costs {
        if !rc.in_solution && rc.value.abs() > 0.001 {
            println!("  {:24} cost must decrease by {:.4} to enter the blend", rc.material, rc.value);
        }
    }

    if report.degenerate {
        println!();
        println!("Alternative optimum: another blend has the same cost");
        for material in &report.alternative_materials {
            println!("  - {} can change quantity at no extra cost", material);
        }
        for constraint in &report.alternative_constraints {
            println!("  - {} can be left at no extra cost", constraint);
        }
    }
}
