//! Catalog entities the export stage reads: channels, products and their values,
//! and attribute definitions. These are read-only inputs; persistence lives elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Export context: a scope, its locales/currencies, a category tree root, and
/// the measurement units metrics are converted into on read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub code: String,
    pub root_category_id: i64,
    pub scope: String,
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
    /// metric family -> target unit
    #[serde(default)]
    pub conversion_units: BTreeMap<String, String>,
}

impl Channel {
    /// A channel whose scope is its own code, as channels normally are.
    pub fn new(code: impl Into<String>, root_category_id: i64) -> Self {
        let code = code.into();
        Self {
            scope: code.clone(),
            code,
            root_category_id,
            locales: Vec::new(),
            currencies: Vec::new(),
            conversion_units: BTreeMap::new(),
        }
    }
    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_conversion_unit(mut self, family: impl Into<String>, unit: impl Into<String>) -> Self {
        self.conversion_units.insert(family.into(), unit.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub amount: f64,
}

/// Typed payload of one product value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ValueData {
    Text(String),
    Number(f64),
    Boolean(bool),
    Options(Vec<String>),
    Date(time::Date),
    Metric { family: String, amount: f64, unit: String },
    Prices(Vec<Price>),
    Media { file_key: String, original_filename: String },
}

impl ValueData {
    pub fn is_media(&self) -> bool {
        matches!(self, ValueData::Media { .. })
    }
}

/// One attribute value, optionally localized and/or scoped to a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductValue {
    pub attribute: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub data: ValueData,
}

impl ProductValue {
    pub fn new(attribute: impl Into<String>, data: ValueData) -> Self {
        Self { attribute: attribute.into(), locale: None, scope: None, data }
    }
    pub fn localized(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Products and groups linked to a product under one association type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Code of the identifier attribute (e.g. `sku`).
    pub identifier_attribute: String,
    pub identifier: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    pub enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    #[serde(default)]
    pub values: Vec<ProductValue>,
    /// association type code -> links
    #[serde(default)]
    pub associations: BTreeMap<String, Association>,
    /// channel scope -> completeness ratio (0..=100)
    #[serde(default)]
    pub completeness: BTreeMap<String, u8>,
}

impl Product {
    pub fn new(identifier_attribute: impl Into<String>, identifier: impl Into<String>, updated: OffsetDateTime) -> Self {
        Self {
            identifier_attribute: identifier_attribute.into(),
            identifier: identifier.into(),
            family: None,
            groups: Vec::new(),
            category_ids: Vec::new(),
            enabled: true,
            updated,
            values: Vec::new(),
            associations: BTreeMap::new(),
            completeness: BTreeMap::new(),
        }
    }

    pub fn media_values(&self) -> impl Iterator<Item = &ProductValue> {
        self.values.iter().filter(|v| v.data.is_media())
    }

    /// Whether the attribute has a non-empty value for the given scope (or unscoped).
    pub fn has_value_for(&self, attribute: &str, scope: &str) -> bool {
        self.values.iter().any(|v| {
            v.attribute == attribute
                && v.scope.as_deref().map_or(true, |s| s == scope)
                && match &v.data {
                    ValueData::Text(s) => !s.trim().is_empty(),
                    ValueData::Options(o) => !o.is_empty(),
                    ValueData::Prices(p) => !p.is_empty(),
                    _ => true,
                }
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub code: String,
    /// channel scope -> attribute codes required for completeness
    #[serde(default)]
    pub requirements: BTreeMap<String, Vec<String>>,
}

/// An attribute definition, as exported by the attribute export step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub code: String,
    pub attribute_type: String,
    /// locale -> label
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub useable_as_grid_filter: bool,
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    #[serde(default)]
    pub metric_family: Option<String>,
    #[serde(default)]
    pub default_metric_unit: Option<String>,
    #[serde(default)]
    pub localizable: bool,
    #[serde(default)]
    pub scopable: bool,
    /// Families referencing this attribute, in their natural order.
    #[serde(default)]
    pub families: Vec<Family>,
}

/// Attribute group with the attributes it lists, used for option descriptors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub code: String,
    pub label: String,
    /// (attribute code, label)
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationType {
    pub code: String,
    pub label: String,
}

/// Channel lookup.
pub trait ChannelRepository {
    fn channel_by_code(&self, code: &str) -> anyhow::Result<Option<Channel>>;
    fn channel_codes(&self) -> anyhow::Result<Vec<String>>;
}
