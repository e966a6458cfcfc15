use alloyblend_solver::SolverError;
use thiserror::Error;

/// A structural defect in a blending problem, found before any model is built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Problem has no raw materials")]
    NoRawMaterials,

    #[error("Raw material #{0} has an empty name")]
    EmptyMaterialName(usize),

    #[error("Duplicate raw material name: {0}")]
    DuplicateMaterial(String),

    #[error("Raw material '{material}' has invalid cost per kg: {value}")]
    InvalidCost { material: String, value: f64 },

    #[error("Raw material '{material}' has invalid availability: {value}")]
    InvalidAvailability { material: String, value: f64 },

    #[error("Raw material '{material}' lists {symbol} at {value}%, outside [0, 100]")]
    CompositionOutOfRange {
        material: String,
        symbol: String,
        value: f64,
    },

    #[error("Raw material '{material}' composition sums to {total}%, above 100%")]
    CompositionOverflow { material: String, total: f64 },

    #[error("Raw material '{material}' has non-positive density: {value}")]
    InvalidDensity { material: String, value: f64 },

    #[error("Raw material '{material}' has purity {value}, outside (0, 100]")]
    InvalidPurity { material: String, value: f64 },

    #[error("Target weight must be positive, got {0}")]
    InvalidTargetWeight(f64),

    #[error("Alloy specification has no elements")]
    NoElements,

    #[error("Element #{0} has an empty symbol")]
    EmptySymbol(usize),

    #[error("Duplicate element symbol: {0}")]
    DuplicateElement(String),

    #[error("Element {symbol}: bounds [{min}, {max}] fall outside [0, 100]")]
    BoundsOutOfRange { symbol: String, min: f64, max: f64 },

    #[error("Element {symbol}: min_percent {min} exceeds max_percent {max}")]
    InvertedBounds { symbol: String, min: f64, max: f64 },

    #[error("Element {symbol}: target {target}% lies outside [{min}, {max}]")]
    TargetOutOfBounds {
        symbol: String,
        target: f64,
        min: f64,
        max: f64,
    },

    #[error("max_impurities must be non-negative, got {0}")]
    InvalidMaxImpurities(f64),

    #[error("{property}: minimum {min} exceeds maximum {max}")]
    InvertedPropertyBounds { property: String, min: f64, max: f64 },

    #[error("{property}: bound must be finite, got {value}")]
    InvalidPropertyBound { property: String, value: f64 },

    #[error("{property} model: {term} must be finite, got {value}")]
    InvalidPropertyCoefficient {
        property: String,
        term: String,
        value: f64,
    },
}

/// An additional constraint that cannot be applied to the current problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Unknown material in {context}: {material}")]
    UnknownMaterial { context: String, material: String },

    #[error("Unknown element in {context}: {symbol}")]
    UnknownElement { context: String, symbol: String },

    #[error("Invalid {context} constraint: {reason}")]
    InvalidParameter { context: String, reason: String },
}

#[derive(Error, Debug)]
pub enum BlendError {
    #[error("Problem failed validation with {} error(s): {}", .0.len(), join(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BlendError>;

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = BlendError::Validation(vec![
            ValidationError::NoRawMaterials,
            ValidationError::InvalidTargetWeight(-1.0),
        ]);
        let text = err.to_string();
        assert!(text.contains("2 error(s)"), "got: {}", text);
        assert!(text.contains("no raw materials"), "got: {}", text);
        assert!(text.contains("-1"), "got: {}", text);
    }
}
