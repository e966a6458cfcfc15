use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::{AlloySpecification, BlendingProblem, Element, RawMaterial};
use crate::properties::PropertyModel;

/// Slack allowed on composition sums entered with rounded figures
const COMPOSITION_SUM_TOLERANCE: f64 = 1e-6;

impl BlendingProblem {
    /// Collect every structural defect. An empty list means the problem can be
    /// handed to the constraint builder.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.raw_materials.is_empty() {
            errors.push(ValidationError::NoRawMaterials);
        }

        let mut seen = HashSet::new();
        for (i, material) in self.raw_materials.iter().enumerate() {
            if material.name.trim().is_empty() {
                errors.push(ValidationError::EmptyMaterialName(i));
            } else if !seen.insert(material.name.as_str()) {
                errors.push(ValidationError::DuplicateMaterial(material.name.clone()));
            }
            material.collect_errors(&mut errors);
        }

        self.alloy_spec.collect_errors(&mut errors);
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl RawMaterial {
    fn collect_errors(&self, errors: &mut Vec<ValidationError>) {
        let name = || self.name.clone();

        if !(self.cost_per_kg.is_finite() && self.cost_per_kg >= 0.0) {
            errors.push(ValidationError::InvalidCost {
                material: name(),
                value: self.cost_per_kg,
            });
        }
        if !(self.availability.is_finite() && self.availability >= 0.0) {
            errors.push(ValidationError::InvalidAvailability {
                material: name(),
                value: self.availability,
            });
        }

        for (symbol, &value) in &self.composition {
            if !(0.0..=100.0).contains(&value) {
                errors.push(ValidationError::CompositionOutOfRange {
                    material: name(),
                    symbol: symbol.clone(),
                    value,
                });
            }
        }
        let total: f64 = self.composition.values().sum();
        if total > 100.0 + COMPOSITION_SUM_TOLERANCE {
            errors.push(ValidationError::CompositionOverflow { material: name(), total });
        }

        if !(self.density.is_finite() && self.density > 0.0) {
            errors.push(ValidationError::InvalidDensity {
                material: name(),
                value: self.density,
            });
        }
        if !(self.purity > 0.0 && self.purity <= 100.0) {
            errors.push(ValidationError::InvalidPurity {
                material: name(),
                value: self.purity,
            });
        }
    }
}

impl AlloySpecification {
    fn collect_errors(&self, errors: &mut Vec<ValidationError>) {
        if !(self.target_weight.is_finite() && self.target_weight > 0.0) {
            errors.push(ValidationError::InvalidTargetWeight(self.target_weight));
        }
        if self.elements.is_empty() {
            errors.push(ValidationError::NoElements);
        }

        let mut seen = HashSet::new();
        for (i, element) in self.elements.iter().enumerate() {
            if element.symbol.trim().is_empty() {
                errors.push(ValidationError::EmptySymbol(i));
            } else if !seen.insert(element.symbol.as_str()) {
                errors.push(ValidationError::DuplicateElement(element.symbol.clone()));
            }
            element.collect_errors(errors);
        }

        if !(self.max_impurities >= 0.0) {
            errors.push(ValidationError::InvalidMaxImpurities(self.max_impurities));
        }

        let physical = [
            ("hardness", self.min_hardness, self.max_hardness, &self.hardness_coefficients),
            ("melting_point", self.melting_point_min, self.melting_point_max, &self.melting_point_coefficients),
        ];
        for (property, min, max, model) in physical {
            for value in [min, max].into_iter().flatten() {
                if !value.is_finite() {
                    errors.push(ValidationError::InvalidPropertyBound {
                        property: property.to_string(),
                        value,
                    });
                }
            }
            if let Some(model) = model {
                model.collect_errors(property, errors);
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    errors.push(ValidationError::InvertedPropertyBounds {
                        property: property.to_string(),
                        min,
                        max,
                    });
                }
            }
        }
    }
}

impl PropertyModel {
    fn collect_errors(&self, property: &str, errors: &mut Vec<ValidationError>) {
        let terms = self
            .coefficients
            .iter()
            .map(|(symbol, value)| (symbol.as_str(), *value))
            .chain(std::iter::once(("intercept", self.intercept)));
        for (term, value) in terms {
            if !value.is_finite() {
                errors.push(ValidationError::InvalidPropertyCoefficient {
                    property: property.to_string(),
                    term: term.to_string(),
                    value,
                });
            }
        }
    }
}

impl Element {
    fn collect_errors(&self, errors: &mut Vec<ValidationError>) {
        let (min, max) = (self.min_percent, self.max_percent);
        let in_range = |v: f64| (0.0..=100.0).contains(&v);

        if !in_range(min) || !in_range(max) {
            errors.push(ValidationError::BoundsOutOfRange {
                symbol: self.symbol.clone(),
                min,
                max,
            });
        }
        if min > max {
            errors.push(ValidationError::InvertedBounds {
                symbol: self.symbol.clone(),
                min,
                max,
            });
        }
        if let Some(target) = self.target_percent {
            if !(target >= min && target <= max) {
                errors.push(ValidationError::TargetOutOfBounds {
                    symbol: self.symbol.clone(),
                    target,
                    min,
                    max,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_problem() -> BlendingProblem {
        BlendingProblem::new(
            "valid",
            vec![
                RawMaterial::new("scrap", 1.0, 100.0).with_element("Fe", 98.0),
                RawMaterial::new("ferrochrome", 2.0, 50.0)
                    .with_element("Cr", 60.0)
                    .with_element("Fe", 35.0),
            ],
            AlloySpecification::new(
                "steel",
                50.0,
                vec![Element::new("Fe", 60.0, 100.0), Element::new("Cr", 10.0, 20.0)],
            ),
        )
    }

    #[test]
    fn test_valid_problem_has_no_errors() {
        assert!(valid_problem().validate().is_empty());
        assert!(valid_problem().is_valid());
    }

    #[test]
    fn test_every_defect_is_reported() {
        let mut problem = valid_problem();
        problem.raw_materials[0].cost_per_kg = -1.0;
        problem.raw_materials[0].composition.insert("C".to_string(), 5.0);
        problem.raw_materials[1].name = "scrap".to_string();
        problem.raw_materials[1].availability = f64::INFINITY;
        problem.raw_materials[1].purity = 0.0;
        problem.alloy_spec.elements[1].min_percent = 30.0;
        problem.alloy_spec.elements.push(Element::new("Fe", 0.0, 100.0));
        problem.alloy_spec.target_weight = 0.0;

        let errors = problem.validate();

        assert!(errors.contains(&ValidationError::InvalidCost {
            material: "scrap".to_string(),
            value: -1.0
        }));
        assert!(errors.contains(&ValidationError::CompositionOverflow {
            material: "scrap".to_string(),
            total: 103.0
        }));
        assert!(errors.contains(&ValidationError::DuplicateMaterial("scrap".to_string())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidAvailability { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPurity { .. })));
        assert!(errors.contains(&ValidationError::InvertedBounds {
            symbol: "Cr".to_string(),
            min: 30.0,
            max: 20.0
        }));
        assert!(errors.contains(&ValidationError::DuplicateElement("Fe".to_string())));
        assert!(errors.contains(&ValidationError::InvalidTargetWeight(0.0)));
        assert_eq!(errors.len(), 8, "errors: {:?}", errors);
    }

    #[test]
    fn test_target_outside_bounds() {
        let mut problem = valid_problem();
        problem.alloy_spec.elements[1] = Element::new("Cr", 10.0, 20.0).with_target(25.0);

        let errors = problem.validate();
        assert_eq!(
            errors,
            vec![ValidationError::TargetOutOfBounds {
                symbol: "Cr".to_string(),
                target: 25.0,
                min: 10.0,
                max: 20.0
            }]
        );
    }

    #[test]
    fn test_empty_problem() {
        let problem = BlendingProblem::new("empty", vec![], AlloySpecification::new("s", 10.0, vec![]));
        let errors = problem.validate();
        assert_eq!(errors, vec![ValidationError::NoRawMaterials, ValidationError::NoElements]);
    }

    #[test]
    fn test_symbols_outside_the_spec_are_allowed() {
        let mut problem = valid_problem();
        problem.raw_materials[0].composition.insert("Si".to_string(), 1.5);
        assert!(problem.validate().is_empty());
    }

    #[test]
    fn test_non_finite_property_inputs() {
        let mut problem = valid_problem();
        problem.alloy_spec.min_hardness = Some(f64::NAN);
        problem.alloy_spec.melting_point_max = Some(f64::INFINITY);
        problem.alloy_spec.hardness_coefficients = Some(PropertyModel {
            coefficients: [("Cr".to_string(), f64::NAN), ("Fe".to_string(), 0.3)].into_iter().collect(),
            intercept: f64::NEG_INFINITY,
        });

        let errors = problem.validate();
        assert_eq!(errors.len(), 4, "errors: {:?}", errors);
        assert!(errors.contains(&ValidationError::InvalidPropertyBound {
            property: "melting_point".to_string(),
            value: f64::INFINITY
        }));
        assert!(errors.contains(&ValidationError::InvalidPropertyCoefficient {
            property: "hardness".to_string(),
            term: "intercept".to_string(),
            value: f64::NEG_INFINITY
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidPropertyCoefficient { term, .. } if term == "Cr"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidPropertyBound { property, .. } if property == "hardness"
        )));
    }

    #[test]
    fn test_inverted_physical_bounds() {
        let mut problem = valid_problem();
        problem.alloy_spec.min_hardness = Some(40.0);
        problem.alloy_spec.max_hardness = Some(30.0);
        assert_eq!(problem.validate().len(), 1);
    }
}
