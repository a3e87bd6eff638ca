#[path = "common/mod.rs"]
mod common;

use anyhow::bail;
use catalog_export::memory::InMemoryCatalog;
use catalog_export::{
    AssociationType, AttributeDefinition, AttributeGroup, AttributeProcessor, CatalogExport, ExitStatus, ExportError,
    Family, InMemoryExecutionHistory, JobParameters, MetricConverter, ObjectDetacher, Operator, ProductProcessor,
    ProductReader, ProductValue, ReaderContext, ValueData,
};
use common::*;
use std::cell::RefCell;
use time::macros::datetime;

struct Fixture {
    catalog: InMemoryCatalog,
    history: InMemoryExecutionHistory,
    converter: MetricConverter,
}

impl Fixture {
    fn new(history: InMemoryExecutionHistory) -> Self {
        Self { catalog: make_catalog_basic(), history, converter: MetricConverter::with_standard_families() }
    }

    fn ctx(&self) -> ReaderContext<'_> {
        ReaderContext {
            query: &self.catalog,
            channels: &self.catalog,
            completeness: &self.catalog,
            history: &self.history,
            converter: &self.converter,
        }
    }

    fn export(&self, params: JobParameters) -> anyhow::Result<Vec<catalog_export::FlatProduct>> {
        CatalogExport::new(self.ctx(), &self.catalog).params(params).progress(false).collect_records()
    }
}

fn params() -> JobParameters {
    JobParameters::default().with_job_definition(JOB).with_channel("ecommerce")
}

/// Records the identifiers it is asked to detach.
#[derive(Default)]
struct RecordingDetacher {
    detached: RefCell<Vec<String>>,
}

impl ObjectDetacher for RecordingDetacher {
    fn detach(&self, identifier: &str) {
        self.detached.borrow_mut().push(identifier.to_string());
    }
}

#[test]
fn since_last_run_bound_is_inclusive() {
    let fx = Fixture::new(InMemoryExecutionHistory::new(vec![
        execution(JOB, Some(datetime!(2024-01-01 10:00:00 UTC)), ExitStatus::Completed),
        execution(JOB, Some(datetime!(2024-01-02 00:00:00 UTC)), ExitStatus::Failed),
    ]));
    let records = fx.export(params().with_updated_condition("fromLastExecution")).unwrap();
    // A at 09:59:59 is older than the bound; C sits exactly on it
    assert_eq!(identifiers(&records), ["B", "C"]);
}

#[test]
fn since_last_run_without_history_exports_everything() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params().with_updated_condition("fromLastExecution")).unwrap();
    assert_eq!(identifiers(&records), ["A", "B", "C"]);
}

#[test]
fn fixed_date_bound() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx
        .export(params().with_updated_condition("fromDefinedDate").with_updated_since("2024-01-01T10:00:01Z"))
        .unwrap();
    assert_eq!(identifiers(&records), ["B"]);
}

#[test]
fn completeness_is_generated_then_filtered() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params().with_complete_condition("onlyComplete")).unwrap();
    assert_eq!(fx.catalog.completeness_runs(), ["ecommerce"]);
    // B misses its price; C has no family, so nothing is required of it
    assert_eq!(identifiers(&records), ["A", "C"]);
    assert_eq!(fx.catalog.product("B").unwrap().completeness.get("ecommerce"), Some(&66));

    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params().with_complete_condition("onlyUncomplete")).unwrap();
    assert_eq!(identifiers(&records), ["B"]);
}

#[test]
fn completeness_filter_without_generation_matches_nothing_uncomputed() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx
        .export(params().with_complete_condition("onlyComplete").with_generate_completeness(false))
        .unwrap();
    assert!(fx.catalog.completeness_runs().is_empty());
    assert!(records.is_empty());
}

#[test]
fn categorization_and_enabled_conditions() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params().with_categorization_condition("onlyCategorized")).unwrap();
    assert_eq!(identifiers(&records), ["A"]);

    let records = fx.export(params().with_categorization_condition("onlyNonCategorized")).unwrap();
    assert_eq!(identifiers(&records), ["C"]);

    let records = fx
        .export(params().with_channel("mobile").with_categorization_condition("onlyCategorized"))
        .unwrap();
    assert_eq!(identifiers(&records), ["B"]);

    let records = fx.export(params().with_enabled_condition("onlyDisabled")).unwrap();
    assert_eq!(identifiers(&records), ["B"]);
}

#[test]
fn shaped_record_for_the_channel() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params().with_categorization_condition("onlyCategorized")).unwrap();
    let a = &records[0].record;

    assert_eq!(a.get("sku"), Some("A"));
    assert_eq!(a.get("family"), Some("shoes"));
    assert_eq!(a.get("groups"), Some("summer,promo"));
    assert_eq!(a.get("categories"), Some("3"));
    assert_eq!(a.get("enabled"), Some("1"));

    assert_eq!(a.get("name-en_US"), Some("Runner"));
    assert_eq!(a.get("name-fr_FR"), Some("Coureur"));
    assert!(!a.contains_key("name-de_DE"));
    assert_eq!(a.get("description-en_US-ecommerce"), Some("Fast shoe"));
    assert!(!a.contains_key("description-en_US-mobile"));
    assert_eq!(a.get("description_short"), Some("Fast"));

    assert_eq!(a.get("price-EUR"), Some("10.00"));
    assert_eq!(a.get("price-USD"), Some("12.50"));
    assert!(!a.contains_key("price-GBP"));

    // converted into the channel's unit on read
    assert_eq!(a.get("weight"), Some("0.5"));
    assert_eq!(a.get("weight-unit"), Some("KILOGRAM"));

    assert_eq!(a.get("picture"), Some("files/A/picture/pic.jpg"));
    assert_eq!(a.get("X_SELL-groups"), Some(""));
    assert_eq!(a.get("X_SELL-products"), Some("B"));
    assert_eq!(records[0].media.len(), 2);
}

#[test]
fn exclusions_apply_to_the_whole_run() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx
        .export(
            params()
                .with_categorization_condition("onlyCategorized")
                .with_attributes_to_exclude(["price", "picture", "name"])
                .with_association_types_to_exclude(["X_SELL"]),
        )
        .unwrap();
    let a = &records[0];
    assert!(a.record.keys().all(|k| !k.starts_with("price") && !k.starts_with("name-") && !k.starts_with("X_SELL")));
    assert_eq!(a.record.get("sku"), Some("A"));
    assert_eq!(a.media.len(), 1);
    assert_eq!(a.media[0].attribute, "manual");
}

#[test]
fn every_read_product_is_detached_once() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let records = fx.export(params()).unwrap();
    assert_eq!(records.len(), 3);
    assert!(fx.catalog.attached().is_empty());

    let detacher = RecordingDetacher::default();
    let summary = CatalogExport::new(fx.ctx(), &detacher)
        .params(params().with_enabled_condition("onlyEnabled"))
        .progress(false)
        .for_each_record(|_| Ok(()))
        .unwrap();
    assert_eq!(summary.read, 2);
    assert_eq!(summary.written, 2);
    assert_eq!(detacher.detached.borrow().as_slice(), ["A", "C"]);
}

#[test]
fn consumer_failure_stops_the_run_and_still_detaches() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let mut seen = 0;
    let err = CatalogExport::new(fx.ctx(), &fx.catalog)
        .params(params())
        .progress(false)
        .for_each_record(|_| {
            seen += 1;
            bail!("disk full")
        })
        .unwrap_err();
    assert_eq!(seen, 1);
    assert!(format!("{err:#}").contains("disk full"));
    assert!(fx.catalog.attached().is_empty());
}

#[test]
fn unknown_channel_is_fatal_before_reading() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let err = fx.export(params().with_channel("print").with_complete_condition("onlyComplete")).unwrap_err();
    assert!(matches!(err.downcast_ref::<ExportError>(), Some(ExportError::ChannelNotFound(code)) if code == "print"));
    assert!(fx.catalog.completeness_runs().is_empty());
}

#[test]
fn invalid_parameters_are_rejected_before_reading() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let err = fx.export(params().with_enabled_condition("sometimes")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExportError>(),
        Some(ExportError::InvalidOption { option: "enabledCondition", .. })
    ));
}

#[test]
fn unknown_unit_fails_the_read() {
    let mut product = catalog_export::Product::new("sku", "D", datetime!(2024-01-01 00:00:00 UTC));
    product.values = vec![ProductValue::new(
        "weight",
        ValueData::Metric { family: "Weight".into(), amount: 2.0, unit: "STONE".into() },
    )];
    let fx = Fixture {
        catalog: InMemoryCatalog::new().with_channel(ecommerce()).with_product(product),
        history: InMemoryExecutionHistory::default(),
        converter: MetricConverter::with_standard_families(),
    };
    let err = fx.export(params()).unwrap_err();
    assert!(matches!(err.downcast_ref::<ExportError>(), Some(ExportError::UnknownUnit { unit, .. }) if unit == "STONE"));
}

#[test]
fn reader_requires_initialize() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let mut reader = ProductReader::new(fx.ctx());
    let err = reader.read().unwrap_err();
    assert!(matches!(err.downcast_ref::<ExportError>(), Some(ExportError::NotInitialized)));
    assert_eq!(reader.read_count(), 0);
    assert!(reader.channel().is_none());
}

#[test]
fn reader_hands_out_products_one_at_a_time() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let config = params().with_categorization_condition("onlyCategorized").validate().unwrap();
    let mut reader = ProductReader::new(fx.ctx());
    reader.initialize(&config).unwrap();
    assert_eq!(reader.predicates().len(), 1);
    assert_eq!(reader.predicates()[0].operator, Operator::DescendantOf);
    assert_eq!(reader.channel().map(|c| c.code.as_str()), Some("ecommerce"));

    let first = reader.read().unwrap().unwrap();
    assert_eq!(first.identifier, "A");
    assert_eq!(reader.read_count(), 1);
    assert!(reader.read().unwrap().is_none());
    assert!(reader.read().unwrap().is_none());
    assert_eq!(reader.read_count(), 1);
}

#[test]
fn option_descriptors() {
    let fx = Fixture::new(InMemoryExecutionHistory::default());
    let fields = ProductReader::new(fx.ctx()).configuration_fields().unwrap();
    let channel = fields.iter().find(|f| f.name == "channel").unwrap();
    let codes: Vec<&str> = channel.choices.iter().map(|(v, _)| v.as_str()).collect();
    assert_eq!(codes, ["ecommerce", "mobile"]);
    let complete = fields.iter().find(|f| f.name == "completeCondition").unwrap();
    assert_eq!(complete.choices.len(), 3);

    let groups = vec![
        AttributeGroup {
            code: "marketing".into(),
            label: "Marketing".into(),
            attributes: vec![("name".into(), "Name".into()), ("price".into(), "Price".into())],
        },
        AttributeGroup { code: "empty".into(), label: "Empty".into(), attributes: vec![] },
    ];
    let assoc = vec![AssociationType { code: "X_SELL".into(), label: "Cross sell".into() }];
    let fields = ProductProcessor::configuration_fields(&groups, &assoc);
    assert_eq!(fields[0].name, "attributesToExclude");
    assert!(fields[0].multiple);
    assert_eq!(fields[0].choices.len(), 2);
    assert_eq!(fields[0].choices[1], ("price".to_string(), "Marketing / Price".to_string()));
    assert_eq!(fields[1].choices, [("X_SELL".to_string(), "Cross sell".to_string())]);
}

#[test]
fn attribute_records_list_their_families() {
    let processor = AttributeProcessor::new(["en_US", "fr_FR"]);
    let mut attr = AttributeDefinition {
        code: "weight".into(),
        attribute_type: "metric".into(),
        metric_family: Some("Weight".into()),
        default_metric_unit: Some("GRAM".into()),
        families: vec![
            Family { code: "shoes".into(), ..Default::default() },
            Family { code: "boots".into(), ..Default::default() },
        ],
        ..Default::default()
    };
    attr.labels.insert("en_US".into(), "Weight".into());

    let rec = processor.process(&attr);
    assert_eq!(rec.get("families"), Some("shoes,boots"));
    assert_eq!(rec.get("label-en_US"), Some("Weight"));
    assert_eq!(rec.get("label-fr_FR"), Some(""));
    assert_eq!(rec.get("metric_family"), Some("Weight"));
    assert_eq!(rec.get("unique"), Some("0"));

    attr.families.clear();
    assert_eq!(processor.process(&attr).get("families"), Some(""));
}

#[test]
fn catalog_loads_from_json_snapshot() {
    let json = r#"{
        "channels": [{"code": "print", "root_category_id": 5, "scope": "print", "locales": ["en_US"]}],
        "categories": {"5": null, "6": 5},
        "products": [
            {"identifier_attribute": "sku", "identifier": "P1", "enabled": true,
             "updated": "2024-01-01T10:00:00Z", "category_ids": [6],
             "values": [{"attribute": "name", "locale": "en_US", "data": {"type": "text", "value": "Poster"}}]},
            {"identifier_attribute": "sku", "identifier": "P2", "enabled": true,
             "updated": "2024-01-01T10:00:00Z"}
        ]
    }"#;
    let catalog = InMemoryCatalog::from_json(json).unwrap();
    let history = InMemoryExecutionHistory::default();
    let converter = MetricConverter::with_standard_families();
    let ctx = ReaderContext {
        query: &catalog,
        channels: &catalog,
        completeness: &catalog,
        history: &history,
        converter: &converter,
    };
    let records = CatalogExport::new(ctx, &catalog)
        .params(JobParameters::default().with_channel("print").with_categorization_condition("onlyCategorized"))
        .progress(false)
        .collect_records()
        .unwrap();
    assert_eq!(identifiers(&records), ["P1"]);
    assert_eq!(records[0].record.get("name-en_US"), Some("Poster"));
}
