//! Linear unit conversion for metric values, driven by a channel's conversion units.

use crate::catalog::{Channel, Product, ValueData};
use crate::cursor::UnitConverter;
use crate::error::ExportError;
use anyhow::Result;
use std::collections::BTreeMap;

/// Units of one metric family expressed as factors to the family's standard unit.
#[derive(Clone, Debug, Default)]
pub struct MeasureFamily {
    factors: BTreeMap<String, f64>,
}

impl MeasureFamily {
    pub fn unit(mut self, unit: impl Into<String>, factor: f64) -> Self {
        self.factors.insert(unit.into(), factor);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetricConverter {
    families: BTreeMap<String, MeasureFamily>,
}

impl MetricConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length and weight families with their common units.
    pub fn with_standard_families() -> Self {
        Self::new()
            .family(
                "Length",
                MeasureFamily::default()
                    .unit("MILLIMETER", 0.001)
                    .unit("CENTIMETER", 0.01)
                    .unit("METER", 1.0)
                    .unit("KILOMETER", 1000.0)
                    .unit("INCH", 0.0254)
                    .unit("FOOT", 0.3048),
            )
            .family(
                "Weight",
                MeasureFamily::default()
                    .unit("MILLIGRAM", 0.000_001)
                    .unit("GRAM", 0.001)
                    .unit("KILOGRAM", 1.0)
                    .unit("OUNCE", 0.028_349_523_125)
                    .unit("POUND", 0.453_592_37),
            )
    }

    pub fn family(mut self, code: impl Into<String>, family: MeasureFamily) -> Self {
        self.families.insert(code.into(), family);
        self
    }

    fn factor(&self, family: &str, unit: &str) -> Result<f64, ExportError> {
        self.families
            .get(family)
            .and_then(|f| f.factors.get(unit))
            .copied()
            .ok_or_else(|| ExportError::UnknownUnit { family: family.to_string(), unit: unit.to_string() })
    }

    pub fn convert_amount(&self, family: &str, amount: f64, from: &str, to: &str) -> Result<f64, ExportError> {
        if from == to {
            return Ok(amount);
        }
        let from_f = self.factor(family, from)?;
        let to_f = self.factor(family, to)?;
        Ok(amount * from_f / to_f)
    }
}

impl UnitConverter for MetricConverter {
    fn convert(&self, product: &mut Product, channel: &Channel) -> Result<()> {
        if channel.conversion_units.is_empty() {
            return Ok(());
        }
        for value in product.values.iter_mut() {
            if let ValueData::Metric { family, amount, unit } = &mut value.data {
                if let Some(target) = channel.conversion_units.get(family.as_str()) {
                    *amount = self.convert_amount(family, *amount, unit, target)?;
                    *unit = target.clone();
                }
            }
        }
        Ok(())
    }
}
