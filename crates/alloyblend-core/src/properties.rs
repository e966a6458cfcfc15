//! Linear property models over element percentages.
//!
//! A [`PropertyModel`] estimates a physical property of an alloy as
//! `intercept + sum(coefficient[symbol] * percent[symbol])`. Because it is
//! linear in the percentages it can be turned into a single constraint row.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::BlendingProblem;

/// Pure-element melting points in degrees Celsius
const MELTING_POINTS: [(&str, f64); 12] = [
    ("Fe", 1538.0),
    ("Ni", 1455.0),
    ("Cr", 1907.0),
    ("Mo", 2623.0),
    ("C", 3550.0),
    ("Mn", 1246.0),
    ("Si", 1414.0),
    ("Al", 660.0),
    ("Cu", 1085.0),
    ("Ti", 1668.0),
    ("V", 1910.0),
    ("W", 3414.0),
];

/// Empirical HRC contribution per percent of element (stainless steels)
const HARDNESS: [(&str, f64); 4] = [("Fe", 0.3), ("Cr", 1.2), ("Ni", 0.8), ("C", 50.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Hardness,
    MeltingPoint,
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::Hardness => write!(f, "hardness"),
            Property::MeltingPoint => write!(f, "melting_point"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyModel {
    /// Contribution per percentage point of each element
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl PropertyModel {
    pub fn default_hardness() -> Self {
        Self::from_table(&HARDNESS, 1.0)
    }

    /// Mass-fraction weighted pure-element melting points
    pub fn default_melting_point() -> Self {
        Self::from_table(&MELTING_POINTS, 0.01)
    }

    fn from_table(table: &[(&str, f64)], scale: f64) -> Self {
        Self {
            coefficients: table
                .iter()
                .map(|(symbol, value)| (symbol.to_string(), value * scale))
                .collect(),
            intercept: 0.0,
        }
    }

    /// Property value of a composition given in percent
    pub fn evaluate(&self, composition: &BTreeMap<String, f64>) -> f64 {
        self.intercept
            + composition
                .iter()
                .map(|(symbol, pct)| self.coefficients.get(symbol).copied().unwrap_or(0.0) * pct)
                .sum::<f64>()
    }
}

/// Estimated physical properties of a blend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyEstimate {
    /// Harmonic mean of material densities weighted by mass
    pub density: f64,
    pub hardness: f64,
    pub melting_point: f64,
}

/// Estimate blend properties from per-material quantities (in material order)
pub fn estimate(problem: &BlendingProblem, quantities: &[f64]) -> Option<PropertyEstimate> {
    let total: f64 = quantities.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let volume: f64 = problem
        .raw_materials
        .iter()
        .zip(quantities)
        .map(|(m, q)| q / m.density)
        .sum();

    let composition = problem.blend_composition(quantities);
    let spec = &problem.alloy_spec;

    Some(PropertyEstimate {
        density: if volume > 0.0 { total / volume } else { 0.0 },
        hardness: spec.property_model(Property::Hardness).evaluate(&composition),
        melting_point: spec.property_model(Property::MeltingPoint).evaluate(&composition),
    })
}
