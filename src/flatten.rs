//! Flat `key -> string` shape of products and attribute definitions.
//!
//! Value keys are `<code>` or `<code>-<locale>-<scope>-<currency>` with only the
//! axes that apply. Structural keys (identifier, family, groups, categories,
//! enabled) are marked on the record and never excluded.

use crate::catalog::{AttributeDefinition, Channel, Product, ProductValue, ValueData};
use crate::exclusion::{filter_media_values, ExclusionSet};
use crate::util::join_items;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Separator between a code and its locale/scope/currency suffixes.
pub const SUFFIX_SEPARATOR: char = '-';
/// Separator between items of a multi-valued cell.
pub const ITEM_SEPARATOR: char = ',';

pub const KEY_FAMILY: &str = "family";
pub const KEY_GROUPS: &str = "groups";
pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_ENABLED: &str = "enabled";

/// Ordered flat record handed to the writer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExportRecord {
    entries: BTreeMap<String, String>,
    #[serde(skip)]
    structural: BTreeSet<String>,
}

impl ExportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert a key that exclusion must leave in place.
    pub fn insert_structural(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.structural.insert(key.clone());
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_structural(&self, key: &str) -> bool {
        self.structural.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A new record holding every entry except `keys`.
    pub fn without_keys(self, keys: &BTreeSet<String>) -> Self {
        let entries = self.entries.into_iter().filter(|(k, _)| !keys.contains(k)).collect();
        let structural = self.structural.into_iter().filter(|k| !keys.contains(k)).collect();
        Self { entries, structural }
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExportRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut rec = Self::new();
        for (k, v) in iter {
            rec.insert(k, v);
        }
        rec
    }
}

/// A media file the writer has to copy next to the flat record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaReference {
    pub attribute: String,
    pub file_key: String,
    pub export_path: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatProduct {
    pub record: ExportRecord,
    pub media: Vec<MediaReference>,
}

/// Flattens products for one channel.
#[derive(Clone, Debug)]
pub struct RecordFlattener {
    channel: Channel,
    media_exclusions: ExclusionSet,
}

impl RecordFlattener {
    pub fn new(channel: Channel) -> Self {
        Self { channel, media_exclusions: ExclusionSet::default() }
    }

    /// Attributes whose media values are dropped before flattening.
    pub fn with_media_exclusions(mut self, excluded_attributes: ExclusionSet) -> Self {
        self.media_exclusions = excluded_attributes;
        self
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn flatten(&self, product: &Product) -> FlatProduct {
        let mut record = ExportRecord::new();
        let mut media = Vec::new();

        record.insert_structural(product.identifier_attribute.clone(), product.identifier.clone());
        record.insert_structural(KEY_FAMILY, product.family.clone().unwrap_or_default());
        record.insert_structural(KEY_GROUPS, join_items(&product.groups));
        record.insert_structural(
            KEY_CATEGORIES,
            join_items(product.category_ids.iter().map(|id| id.to_string())),
        );
        record.insert_structural(KEY_ENABLED, flag(product.enabled));

        for value in filter_media_values(&product.values, &self.media_exclusions) {
            if value.attribute == product.identifier_attribute || !self.in_channel(value) {
                continue;
            }
            self.flatten_value(product, value, &mut record, &mut media);
        }

        for (assoc_type, assoc) in &product.associations {
            record.insert(format!("{}{}groups", assoc_type, SUFFIX_SEPARATOR), join_items(&assoc.groups));
            record.insert(format!("{}{}products", assoc_type, SUFFIX_SEPARATOR), join_items(&assoc.products));
        }

        FlatProduct { record, media }
    }

    fn in_channel(&self, value: &ProductValue) -> bool {
        if let Some(scope) = value.scope.as_deref() {
            if scope != self.channel.scope {
                return false;
            }
        }
        match value.locale.as_deref() {
            Some(locale) if !self.channel.locales.is_empty() => self.channel.locales.iter().any(|l| l == locale),
            _ => true,
        }
    }

    fn flatten_value(
        &self,
        product: &Product,
        value: &ProductValue,
        record: &mut ExportRecord,
        media: &mut Vec<MediaReference>,
    ) {
        let key = value_key(value);
        match &value.data {
            ValueData::Text(s) => record.insert(key, s.clone()),
            ValueData::Number(n) => record.insert(key, format_number(*n)),
            ValueData::Boolean(b) => record.insert(key, flag(*b)),
            ValueData::Options(codes) => record.insert(key, join_items(codes)),
            ValueData::Date(d) => record.insert(key, d.to_string()),
            ValueData::Metric { amount, unit, .. } => {
                record.insert(format!("{}{}unit", key, SUFFIX_SEPARATOR), unit.clone());
                record.insert(key, format_number(*amount));
            }
            ValueData::Prices(prices) => {
                for price in prices {
                    if !self.channel.currencies.is_empty() && !self.channel.currencies.contains(&price.currency) {
                        continue;
                    }
                    record.insert(format!("{}{}{}", key, SUFFIX_SEPARATOR, price.currency), format!("{:.2}", price.amount));
                }
            }
            ValueData::Media { file_key, original_filename } => {
                let export_path = format!("files/{}/{}/{}", product.identifier, key, original_filename);
                record.insert(key, export_path.clone());
                media.push(MediaReference {
                    attribute: value.attribute.clone(),
                    file_key: file_key.clone(),
                    export_path,
                });
            }
        }
    }
}

/// `<code>[-<locale>][-<scope>]`
pub fn value_key(value: &ProductValue) -> String {
    let mut key = value.attribute.clone();
    for axis in [value.locale.as_deref(), value.scope.as_deref()].into_iter().flatten() {
        key.push(SUFFIX_SEPARATOR);
        key.push_str(axis);
    }
    key
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Integral values print without a fraction; others keep up to 4 decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let s = format!("{:.4}", n);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Flattens attribute definitions for the attribute export.
#[derive(Clone, Debug, Default)]
pub struct AttributeFlattener {
    active_locales: Vec<String>,
}

impl AttributeFlattener {
    pub fn new<I, S>(active_locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { active_locales: active_locales.into_iter().map(Into::into).collect() }
    }

    pub fn flatten(&self, attribute: &AttributeDefinition) -> ExportRecord {
        let mut record = ExportRecord::new();
        record.insert("type", attribute.attribute_type.clone());
        record.insert("code", attribute.code.clone());
        for locale in &self.active_locales {
            let label = attribute.labels.get(locale).cloned().unwrap_or_default();
            record.insert(format!("label{}{}", SUFFIX_SEPARATOR, locale), label);
        }
        record.insert("group", attribute.group.clone().unwrap_or_default());
        record.insert("unique", flag(attribute.unique));
        record.insert("useable_as_grid_filter", flag(attribute.useable_as_grid_filter));
        record.insert("allowed_extensions", join_items(&attribute.allowed_extensions));
        record.insert("metric_family", attribute.metric_family.clone().unwrap_or_default());
        record.insert("default_metric_unit", attribute.default_metric_unit.clone().unwrap_or_default());
        record.insert("localizable", flag(attribute.localizable));
        record.insert("scopable", flag(attribute.scopable));
        record.insert("families", family_codes(attribute));
        record
    }
}

/// Codes of the families using the attribute, comma-joined in their natural order.
pub fn family_codes(attribute: &AttributeDefinition) -> String {
    join_items(attribute.families.iter().map(|f| f.code.as_str()))
}
