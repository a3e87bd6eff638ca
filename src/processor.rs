//! Per-record shaping: flatten, apply exclusions, release the source entity.

use crate::catalog::{AssociationType, AttributeDefinition, AttributeGroup, Channel, Product};
use crate::config::JobFilterConfig;
use crate::exclusion::{exclude, ExclusionSet};
use crate::flatten::{AttributeFlattener, ExportRecord, FlatProduct, RecordFlattener};
use crate::reader::ConfigurationField;
use anyhow::Result;

/// Releases a product from the persistence layer's identity cache.
pub trait ObjectDetacher {
    fn detach(&self, identifier: &str);
}

/// For stores without an identity cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDetacher;

impl ObjectDetacher for NoopDetacher {
    fn detach(&self, _identifier: &str) {}
}

/// Detaches on drop, so every exit path of `process` releases the product once.
struct DetachGuard<'a> {
    detacher: &'a dyn ObjectDetacher,
    identifier: String,
}

impl Drop for DetachGuard<'_> {
    fn drop(&mut self) {
        self.detacher.detach(&self.identifier);
    }
}

pub struct ProductProcessor<'a> {
    flattener: RecordFlattener,
    excluded: ExclusionSet,
    detacher: &'a dyn ObjectDetacher,
}

impl<'a> ProductProcessor<'a> {
    pub fn new(channel: Channel, config: &JobFilterConfig, detacher: &'a dyn ObjectDetacher) -> Self {
        let media_exclusions = ExclusionSet::new(config.attributes_to_exclude().iter().cloned());
        Self {
            flattener: RecordFlattener::new(channel).with_media_exclusions(media_exclusions),
            excluded: ExclusionSet::union(config.attributes_to_exclude(), config.association_types_to_exclude()),
            detacher,
        }
    }

    pub fn excluded(&self) -> &ExclusionSet {
        &self.excluded
    }

    /// Shape one product. The product is detached exactly once on every exit
    /// path, unwinding included.
    pub fn process(&self, product: Product) -> Result<FlatProduct> {
        let _guard = DetachGuard { detacher: self.detacher, identifier: product.identifier.clone() };

        let flat = self.flattener.flatten(&product);
        Ok(FlatProduct { record: exclude(flat.record, &self.excluded), media: flat.media })
    }

    /// Option descriptors for the exclusion lists, from the catalog's attribute
    /// groups (groups without attributes are skipped) and association types.
    pub fn configuration_fields(groups: &[AttributeGroup], association_types: &[AssociationType]) -> Vec<ConfigurationField> {
        let attribute_choices = groups
            .iter()
            .filter(|g| !g.attributes.is_empty())
            .flat_map(|g| {
                g.attributes
                    .iter()
                    .map(move |(code, label)| (code.clone(), format!("{} / {}", g.label, label)))
            })
            .collect();
        let association_choices = association_types.iter().map(|t| (t.code.clone(), t.label.clone())).collect();
        vec![
            ConfigurationField::multiple("attributesToExclude", attribute_choices),
            ConfigurationField::multiple("associationTypesToExclude", association_choices),
        ]
    }
}

/// Shapes attribute definitions for the attribute export.
pub struct AttributeProcessor {
    flattener: AttributeFlattener,
}

impl AttributeProcessor {
    pub fn new<I, S>(active_locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { flattener: AttributeFlattener::new(active_locales) }
    }

    pub fn process(&self, attribute: &AttributeDefinition) -> ExportRecord {
        self.flattener.flatten(attribute)
    }
}
