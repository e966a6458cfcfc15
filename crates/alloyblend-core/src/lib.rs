pub mod builder;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod presets;
pub mod properties;
pub mod result;
pub mod sensitivity;
mod validation;

#[cfg(feature = "worker")]
pub mod worker;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use alloyblend_solver::{BackendKind, Interrupt, SolveOptions, SolverError};
pub use builder::{BlendModel, BoundSide, ConstraintBuilder, RowInfo, RowKind};
pub use config::{Config, LoggingConfig, SolverConfig};
pub use error::{BlendError, ConstraintError, Result, ValidationError};
pub use io::{ExportFormat, export_result, load_problem, save_problem};
pub use model::{AdditionalConstraint, AdditionalConstraints, AlloySpecification, BlendingProblem, Element, RawMaterial};
pub use pipeline::{Optimizer, Progress, Stage};
pub use properties::{Property, PropertyEstimate, PropertyModel};
pub use result::{OptimizationResult, OptimizationStatus};
pub use sensitivity::{ReducedCost, SensitivityReport, ShadowPrice, Unavailable};
#[cfg(feature = "worker")]
pub use worker::{SolveHandle, SolveWorker, WorkerEvent};
