use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::properties::{Property, PropertyModel};

/// A chemical element bound in the alloy specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_percent: f64,
    #[serde(default = "default_max_percent")]
    pub max_percent: f64,
    /// Exact percentage required; replaces the min/max rows when set
    #[serde(default)]
    pub target_percent: Option<f64>,
}

/// A purchasable input to the blend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub name: String,
    pub cost_per_kg: f64,
    /// Upper bound on the usable quantity
    pub availability: f64,
    /// Element symbol -> percent by mass. The remainder is unspecified content.
    #[serde(default)]
    pub composition: BTreeMap<String, f64>,
    #[serde(default = "default_density")]
    pub density: f64,
    #[serde(default = "default_purity")]
    pub purity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlloySpecification {
    pub name: String,
    pub target_weight: f64,
    pub elements: Vec<Element>,
    /// Percent of the blend allowed outside the specified elements
    #[serde(default = "default_max_impurities")]
    pub max_impurities: f64,
    #[serde(default)]
    pub min_hardness: Option<f64>,
    #[serde(default)]
    pub max_hardness: Option<f64>,
    #[serde(default)]
    pub melting_point_min: Option<f64>,
    #[serde(default)]
    pub melting_point_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness_coefficients: Option<PropertyModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub melting_point_coefficients: Option<PropertyModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendingProblem {
    pub name: String,
    pub raw_materials: Vec<RawMaterial>,
    pub alloy_spec: AlloySpecification,
    #[serde(default)]
    pub additional_constraints: AdditionalConstraints,
}

/// Extension constraints applied after the composition rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdditionalConstraints {
    #[serde(default)]
    pub constraints: Vec<AdditionalConstraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum AdditionalConstraint {
    /// Use at most `count` distinct materials (adds binary indicators)
    MaxMaterials { count: usize },
    /// Bounds on the quantity of one material
    MaterialLimit {
        material: String,
        #[serde(default)]
        min_quantity: Option<f64>,
        #[serde(default)]
        max_quantity: Option<f64>,
    },
    /// Cap on a per-kg emission or resource total
    Environmental {
        name: String,
        factors: BTreeMap<String, f64>,
        max_total: f64,
    },
    /// Bounds on the ratio between two element masses in the blend
    ElementRatio {
        numerator: String,
        denominator: String,
        #[serde(default)]
        min_ratio: Option<f64>,
        #[serde(default)]
        max_ratio: Option<f64>,
    },
}

fn default_max_percent() -> f64 {
    100.0
}

fn default_density() -> f64 {
    7.8
}

fn default_purity() -> f64 {
    100.0
}

fn default_max_impurities() -> f64 {
    2.0
}

impl Element {
    pub fn new(symbol: impl Into<String>, min_percent: f64, max_percent: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: String::new(),
            min_percent,
            max_percent,
            target_percent: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target_percent = Some(target);
        self
    }

    /// The single percentage this element is pinned to, if any
    pub fn fixed_percent(&self) -> Option<f64> {
        self.target_percent
            .or_else(|| (self.min_percent == self.max_percent).then_some(self.min_percent))
    }
}

impl RawMaterial {
    pub fn new(name: impl Into<String>, cost_per_kg: f64, availability: f64) -> Self {
        Self {
            name: name.into(),
            cost_per_kg,
            availability,
            composition: BTreeMap::new(),
            density: default_density(),
            purity: default_purity(),
        }
    }

    pub fn with_element(mut self, symbol: impl Into<String>, percent: f64) -> Self {
        self.composition.insert(symbol.into(), percent);
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_purity(mut self, purity: f64) -> Self {
        self.purity = purity;
        self
    }

    /// Percent of `symbol` in this material, zero when absent
    pub fn percent_of(&self, symbol: &str) -> f64 {
        self.composition.get(symbol).copied().unwrap_or(0.0)
    }

    /// Fraction of this material outside the given element set
    pub fn unspecified_fraction<'a>(&self, symbols: impl IntoIterator<Item = &'a str>) -> f64 {
        let specified: f64 = symbols.into_iter().map(|s| self.percent_of(s)).sum();
        (1.0 - specified / 100.0).max(0.0)
    }
}

impl AlloySpecification {
    pub fn new(name: impl Into<String>, target_weight: f64, elements: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            target_weight,
            elements,
            max_impurities: default_max_impurities(),
            min_hardness: None,
            max_hardness: None,
            melting_point_min: None,
            melting_point_max: None,
            hardness_coefficients: None,
            melting_point_coefficients: None,
        }
    }

    pub fn with_max_impurities(mut self, max_impurities: f64) -> Self {
        self.max_impurities = max_impurities;
        self
    }

    pub fn element(&self, symbol: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.symbol == symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.symbol.as_str())
    }

    /// Supplied coefficient map, or the built-in empirical one
    pub fn property_model(&self, property: Property) -> PropertyModel {
        match property {
            Property::Hardness => self
                .hardness_coefficients
                .clone()
                .unwrap_or_else(PropertyModel::default_hardness),
            Property::MeltingPoint => self
                .melting_point_coefficients
                .clone()
                .unwrap_or_else(PropertyModel::default_melting_point),
        }
    }

    /// (minimum, maximum) requested for a property
    pub fn property_bounds(&self, property: Property) -> (Option<f64>, Option<f64>) {
        match property {
            Property::Hardness => (self.min_hardness, self.max_hardness),
            Property::MeltingPoint => (self.melting_point_min, self.melting_point_max),
        }
    }
}

impl BlendingProblem {
    pub fn new(name: impl Into<String>, raw_materials: Vec<RawMaterial>, alloy_spec: AlloySpecification) -> Self {
        Self {
            name: name.into(),
            raw_materials,
            alloy_spec,
            additional_constraints: AdditionalConstraints::default(),
        }
    }

    pub fn with_constraint(mut self, constraint: AdditionalConstraint) -> Self {
        self.additional_constraints.constraints.push(constraint);
        self
    }

    pub fn material(&self, name: &str) -> Option<&RawMaterial> {
        self.raw_materials.iter().find(|m| m.name == name)
    }

    /// Specified symbols in specification order, then any other symbol found
    /// in a material composition in sorted order
    pub fn all_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.alloy_spec.symbols().map(str::to_string).collect();
        let extra: BTreeSet<&String> = self
            .raw_materials
            .iter()
            .flat_map(|m| m.composition.keys())
            .filter(|s| self.alloy_spec.element(s).is_none())
            .collect();
        symbols.extend(extra.into_iter().cloned());
        symbols
    }

    /// Percent of every known symbol in the blend given per-material quantities
    pub fn blend_composition(&self, quantities: &[f64]) -> BTreeMap<String, f64> {
        let total: f64 = quantities.iter().sum();
        self.all_symbols()
            .into_iter()
            .map(|symbol| {
                let mass: f64 = self
                    .raw_materials
                    .iter()
                    .zip(quantities)
                    .map(|(m, q)| m.percent_of(&symbol) / 100.0 * q)
                    .sum();
                let pct = if total > 0.0 { mass / total * 100.0 } else { 0.0 };
                (symbol, pct)
            })
            .collect()
    }
}
