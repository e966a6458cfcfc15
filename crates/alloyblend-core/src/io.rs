//! JSON persistence of problems and export of results.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BlendError, Result};
use crate::model::BlendingProblem;
use crate::result::OptimizationResult;

pub fn problem_from_json(json: &str) -> Result<BlendingProblem> {
    Ok(serde_json::from_str(json)?)
}

pub fn problem_to_json(problem: &BlendingProblem) -> Result<String> {
    Ok(serde_json::to_string_pretty(problem)?)
}

pub fn load_problem(path: impl AsRef<Path>) -> Result<BlendingProblem> {
    let content = fs::read_to_string(path)?;
    problem_from_json(&content)
}

pub fn save_problem(problem: &BlendingProblem, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, problem_to_json(problem)?)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(BlendError::Config(format!("unknown export format '{}'", other))),
        }
    }
}

pub fn result_to_json(result: &OptimizationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Three-column table (`Parameter,Value,Unit`): summary rows, then one section
/// per material, element and constraint flag, separated by blank lines
pub fn result_to_csv(result: &OptimizationResult) -> String {
    let mut out = String::new();
    let mut row = |cells: [&str; 3]| {
        let line: Vec<String> = cells.iter().map(|c| csv_field(c)).collect();
        let _ = writeln!(out, "{}", line.join(","));
    };

    row(["Parameter", "Value", "Unit"]);
    row(["Status", &result.status.to_string(), ""]);
    row(["Proven Optimal", if result.proven_optimal { "true" } else { "false" }, ""]);
    if let Some(objective) = result.objective_value {
        row(["Objective", &format!("{:.2}", objective), ""]);
    }
    row(["Total Cost", &format!("{:.2}", result.total_cost), ""]);
    row(["Total Weight", &format!("{:.2}", result.total_weight), "kg"]);
    row(["Solve Time", &format!("{:.3}", result.solve_time), "s"]);

    if !result.solution.is_empty() {
        row(["", "", ""]);
        row(["Raw Material", "Quantity", "Unit"]);
        for (material, quantity) in &result.solution {
            row([material, &format!("{:.3}", quantity), "kg"]);
        }
    }

    if !result.element_percentages.is_empty() {
        row(["", "", ""]);
        row(["Element", "Percentage", "Unit"]);
        for (symbol, pct) in &result.element_percentages {
            row([symbol, &format!("{:.3}", pct), "%"]);
        }
    }

    if !result.constraints_satisfied.is_empty() {
        row(["", "", ""]);
        row(["Constraint", "Satisfied", ""]);
        for (name, ok) in &result.constraints_satisfied {
            row([name, if *ok { "true" } else { "false" }, ""]);
        }
    }

    out
}

/// Quote a field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn export_result(result: &OptimizationResult, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
    let content = match format {
        ExportFormat::Json => result_to_json(result)?,
        ExportFormat::Csv => result_to_csv(result),
    };
    fs::write(path, content)?;
    Ok(())
}
