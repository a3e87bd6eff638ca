//! In-memory catalog store: a reference query engine, completeness generator,
//! channel repository and identity map. Used by the demo binary and tests; real
//! deployments put a persistence layer behind the same traits.

use crate::catalog::{Channel, ChannelRepository, Family, Product};
use crate::completeness::CompletenessGenerator;
use crate::processor::ObjectDetacher;
use crate::query::{
    normalized_field, FilterPredicate, Operator, ProductQuery, ProductStream, QueryOptions, FIELD_CATEGORIES,
    FIELD_COMPLETENESS, FIELD_ENABLED, FIELD_UPDATED,
};
use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use time::Date;

/// Fixture shape accepted by `InMemoryCatalog::from_json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub channels: Vec<Channel>,
    /// category id -> parent id
    pub categories: BTreeMap<i64, Option<i64>>,
    pub families: Vec<Family>,
    pub products: Vec<Product>,
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    channels: Vec<Channel>,
    category_parents: BTreeMap<i64, Option<i64>>,
    families: BTreeMap<String, Family>,
    products: Mutex<Vec<Product>>,
    identity_map: Arc<Mutex<BTreeSet<String>>>,
    completeness_runs: Mutex<Vec<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(s: CatalogSnapshot) -> Self {
        let mut cat = Self::new();
        for c in s.channels {
            cat = cat.with_channel(c);
        }
        for (id, parent) in s.categories {
            cat = cat.with_category(id, parent);
        }
        for f in s.families {
            cat = cat.with_family(f);
        }
        for p in s.products {
            cat = cat.with_product(p);
        }
        cat
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(Self::from_snapshot(serde_json::from_str(s)?))
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }
    pub fn with_category(mut self, id: i64, parent: Option<i64>) -> Self {
        self.category_parents.insert(id, parent);
        self
    }
    pub fn with_family(mut self, family: Family) -> Self {
        self.families.insert(family.code.clone(), family);
        self
    }
    pub fn with_product(self, product: Product) -> Self {
        self.products.lock().push(product);
        self
    }

    /// Channels completeness was generated for, in call order.
    pub fn completeness_runs(&self) -> Vec<String> {
        self.completeness_runs.lock().clone()
    }

    /// Identifiers currently held in the identity map.
    pub fn attached(&self) -> BTreeSet<String> {
        self.identity_map.lock().clone()
    }

    pub fn product(&self, identifier: &str) -> Option<Product> {
        self.products.lock().iter().find(|p| p.identifier == identifier).cloned()
    }

    fn is_descendant(&self, category: i64, roots: &[i64]) -> bool {
        let mut current = Some(category);
        let mut hops = 0usize;
        while let Some(id) = current {
            if roots.contains(&id) {
                return true;
            }
            hops += 1;
            if hops > self.category_parents.len() {
                // cycle in fixture data
                return false;
            }
            current = self.category_parents.get(&id).copied().flatten();
        }
        false
    }

    fn check_supported(&self, p: &FilterPredicate) -> Result<()> {
        let updated = normalized_field(FIELD_UPDATED);
        let ok = match p.operator {
            Operator::DescendantOf | Operator::Unclassified => p.field == FIELD_CATEGORIES,
            Operator::TimeInclusiveGte => p.field == updated && p.value.is_i64(),
            Operator::Equals if p.field == FIELD_ENABLED => p.value.is_boolean(),
            Operator::Equals | Operator::LessThan => p.field == FIELD_COMPLETENESS && p.value.is_u64(),
            Operator::Before | Operator::After | Operator::Between | Operator::Empty => p.field == FIELD_UPDATED,
        };
        if !ok {
            bail!("unsupported predicate: {}", p);
        }
        Ok(())
    }

    fn matches(&self, p: &FilterPredicate, product: &Product, default_scope: Option<&str>) -> bool {
        match p.operator {
            Operator::DescendantOf => {
                let roots: Vec<i64> = p.value.as_array().map(|a| a.iter().filter_map(Value::as_i64).collect()).unwrap_or_default();
                product.category_ids.iter().any(|c| self.is_descendant(*c, &roots))
            }
            Operator::Unclassified => product.category_ids.is_empty(),
            Operator::TimeInclusiveGte => p.value.as_i64().map_or(false, |ts| product.updated.unix_timestamp() >= ts),
            Operator::Equals if p.field == FIELD_ENABLED => p.value.as_bool() == Some(product.enabled),
            Operator::Equals | Operator::LessThan => {
                let scope = p.option_str("scope").or(default_scope);
                let ratio = scope.and_then(|s| product.completeness.get(s)).copied();
                match (ratio, p.value.as_u64()) {
                    (Some(r), Some(v)) if p.operator == Operator::Equals => u64::from(r) == v,
                    (Some(r), Some(v)) => u64::from(r) < v,
                    _ => false,
                }
            }
            Operator::Before => day(&p.value).map_or(false, |d| product.updated.date() < d),
            Operator::After => day(&p.value).map_or(false, |d| product.updated.date() > d),
            Operator::Between => {
                let bounds = p.value.as_array().map(|a| a.iter().filter_map(day).collect::<Vec<_>>()).unwrap_or_default();
                match bounds.as_slice() {
                    [lo, hi] => (*lo..=*hi).contains(&product.updated.date()),
                    _ => false,
                }
            }
            // a product always has an updated date
            Operator::Empty => false,
        }
    }
}

fn day(v: &Value) -> Option<Date> {
    let s = v.as_str()?;
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(s, &format).ok()
}

impl ProductQuery for InMemoryCatalog {
    fn execute(&self, predicates: &[FilterPredicate], options: &QueryOptions) -> Result<ProductStream> {
        for p in predicates {
            self.check_supported(p)?;
        }
        let scope = options.default_scope.as_deref();
        let matched: Vec<Product> = self
            .products
            .lock()
            .iter()
            .filter(|prod| predicates.iter().all(|p| self.matches(p, prod, scope)))
            .cloned()
            .collect();
        tracing::debug!(matched = matched.len(), predicates = predicates.len(), "in-memory query executed");

        let identity_map = Arc::clone(&self.identity_map);
        Ok(Box::new(matched.into_iter().map(move |p| {
            identity_map.lock().insert(p.identifier.clone());
            Ok(p)
        })))
    }
}

impl CompletenessGenerator for InMemoryCatalog {
    fn generate_missing_for_channel(&self, channel: &Channel) -> Result<()> {
        let mut products = self.products.lock();
        let mut generated = 0usize;
        for product in products.iter_mut() {
            if product.completeness.contains_key(&channel.scope) {
                continue;
            }
            let required = product
                .family
                .as_deref()
                .and_then(|f| self.families.get(f))
                .and_then(|f| f.requirements.get(&channel.scope))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let ratio = if required.is_empty() {
                100
            } else {
                let present = required.iter().filter(|a| product.has_value_for(a, &channel.scope)).count();
                u8::try_from(present * 100 / required.len()).map_err(|_| anyhow!("completeness ratio out of range"))?
            };
            product.completeness.insert(channel.scope.clone(), ratio);
            generated += 1;
        }
        self.completeness_runs.lock().push(channel.code.clone());
        tracing::debug!(channel = %channel.code, generated, "completeness generated");
        Ok(())
    }
}

impl ChannelRepository for InMemoryCatalog {
    fn channel_by_code(&self, code: &str) -> Result<Option<Channel>> {
        Ok(self.channels.iter().find(|c| c.code == code).cloned())
    }

    fn channel_codes(&self) -> Result<Vec<String>> {
        Ok(self.channels.iter().map(|c| c.code.clone()).collect())
    }
}

impl ObjectDetacher for InMemoryCatalog {
    fn detach(&self, identifier: &str) {
        self.identity_map.lock().remove(identifier);
    }
}
