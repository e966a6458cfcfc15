//! WASM bindings for alloy blending
//!
//! Problems cross the boundary as JSON text in the persisted format; results
//! come back as plain JS objects.

use wasm_bindgen::prelude::*;

use crate::io;
use crate::pipeline::Optimizer;
use crate::presets;

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

/// Solve a problem given as JSON and return the optimization result
#[wasm_bindgen]
pub fn solve(problem_json: &str) -> Result<JsValue, JsValue> {
    let problem = io::problem_from_json(problem_json).map_err(js_error)?;
    let result = Optimizer::new().optimize(&problem).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&result).map_err(js_error)
}

/// Validate a problem given as JSON and return every problem found as a list
/// of messages (empty when valid)
#[wasm_bindgen]
pub fn validate(problem_json: &str) -> JsValue {
    let messages: Vec<String> = match io::problem_from_json(problem_json) {
        Ok(problem) => problem.validate().iter().map(ToString::to_string).collect(),
        Err(e) => vec![e.to_string()],
    };
    serde_wasm_bindgen::to_value(&messages).unwrap_or(JsValue::NULL)
}

/// The 316L stainless steel preset as JSON text
#[wasm_bindgen]
pub fn preset_316l() -> Result<String, JsValue> {
    io::problem_to_json(&presets::stainless_316l()).map_err(js_error)
}
