//! Ready-made problems.

use crate::model::{AlloySpecification, BlendingProblem, Element, RawMaterial};

/// One tonne of 316L stainless steel from scrap, ferroalloys and pure metals
pub fn stainless_316l() -> BlendingProblem {
    let materials = vec![
        RawMaterial::new("Stainless Scrap 316", 2.5, 5000.0)
            .with_element("Fe", 65.0)
            .with_element("Cr", 17.0)
            .with_element("Ni", 12.0)
            .with_element("Mo", 2.5)
            .with_element("C", 0.03)
            .with_element("Mn", 2.0)
            .with_density(8.0)
            .with_purity(98.0),
        RawMaterial::new("Ferrochrome", 1.8, 2000.0)
            .with_element("Cr", 50.0)
            .with_element("Fe", 40.0)
            .with_element("C", 8.0)
            .with_element("Si", 1.5)
            .with_density(6.8)
            .with_purity(95.0),
        RawMaterial::new("Pure Nickel", 15.0, 1000.0)
            .with_element("Ni", 99.9)
            .with_density(8.9)
            .with_purity(99.9),
        RawMaterial::new("Molybdenum", 25.0, 200.0)
            .with_element("Mo", 99.5)
            .with_density(10.3)
            .with_purity(99.5),
        RawMaterial::new("Cast Iron", 0.5, 10000.0)
            .with_element("Fe", 94.0)
            .with_element("C", 3.5)
            .with_element("Si", 2.0)
            .with_element("Mn", 0.5)
            .with_density(7.2)
            .with_purity(96.0),
    ];

    let elements = vec![
        Element::new("Fe", 60.0, 72.0).with_name("Iron"),
        Element::new("Cr", 16.0, 18.0).with_name("Chromium"),
        Element::new("Ni", 10.0, 14.0).with_name("Nickel"),
        Element::new("Mo", 2.0, 3.0).with_name("Molybdenum"),
        Element::new("C", 0.0, 0.03).with_name("Carbon"),
        Element::new("Mn", 0.0, 2.0).with_name("Manganese"),
    ];

    let spec = AlloySpecification::new("316L Stainless Steel", 1000.0, elements).with_max_impurities(2.0);
    BlendingProblem::new("316L Stainless Steel Production", materials, spec)
}
