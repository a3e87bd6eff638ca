#![allow(dead_code)]

use catalog_export::memory::InMemoryCatalog;
use catalog_export::{
    Association, Channel, ExecutionRecord, ExitStatus, Family, Price, Product, ProductValue, ValueData,
};
use time::macros::datetime;
use time::OffsetDateTime;

pub const JOB: &str = "csv_product_export";

pub fn ecommerce() -> Channel {
    Channel::new("ecommerce", 1)
        .with_locales(["en_US", "fr_FR"])
        .with_currencies(["EUR", "USD"])
        .with_conversion_unit("Weight", "KILOGRAM")
}

pub fn mobile() -> Channel {
    Channel::new("mobile", 10).with_locales(["en_US"]).with_currencies(["USD"])
}

/// Tiny catalog:
/// - category tree 1 > 2 > 3 (ecommerce root) and 10 > 11 (mobile root)
/// - family `shoes` requires sku, name, price on ecommerce
/// - `A`: categorized under ecommerce, enabled, complete, updated 09:59:59Z,
///   with localized/scoped/price/metric/media values and an X_SELL association
/// - `B`: categorized under mobile, disabled, missing price, updated 10:00:01Z
/// - `C`: no category, no family, enabled, updated exactly 10:00:00Z
pub fn make_catalog_basic() -> InMemoryCatalog {
    let mut a = Product::new("sku", "A", datetime!(2024-01-01 09:59:59 UTC));
    a.family = Some("shoes".into());
    a.groups = vec!["summer".into(), "promo".into()];
    a.category_ids = vec![3];
    a.values = vec![
        ProductValue::new("sku", ValueData::Text("A".into())),
        ProductValue::new("name", ValueData::Text("Runner".into())).localized("en_US"),
        ProductValue::new("name", ValueData::Text("Coureur".into())).localized("fr_FR"),
        ProductValue::new("name", ValueData::Text("Läufer".into())).localized("de_DE"),
        ProductValue::new("description", ValueData::Text("Fast shoe".into())).localized("en_US").scoped("ecommerce"),
        ProductValue::new("description", ValueData::Text("Small".into())).localized("en_US").scoped("mobile"),
        ProductValue::new("description_short", ValueData::Text("Fast".into())),
        ProductValue::new(
            "price",
            ValueData::Prices(vec![
                Price { currency: "EUR".into(), amount: 10.0 },
                Price { currency: "USD".into(), amount: 12.5 },
                Price { currency: "GBP".into(), amount: 9.0 },
            ]),
        ),
        ProductValue::new("weight", ValueData::Metric { family: "Weight".into(), amount: 500.0, unit: "GRAM".into() }),
        ProductValue::new("picture", ValueData::Media { file_key: "a/b/pic.jpg".into(), original_filename: "pic.jpg".into() }),
        ProductValue::new("manual", ValueData::Media { file_key: "c/d/manual.pdf".into(), original_filename: "manual.pdf".into() }),
    ];
    a.associations.insert("X_SELL".into(), Association { groups: vec![], products: vec!["B".into()] });

    let mut b = Product::new("sku", "B", datetime!(2024-01-01 10:00:01 UTC));
    b.family = Some("shoes".into());
    b.category_ids = vec![11];
    b.enabled = false;
    b.values = vec![
        ProductValue::new("sku", ValueData::Text("B".into())),
        ProductValue::new("name", ValueData::Text("Walker".into())).localized("en_US"),
    ];

    let mut c = Product::new("sku", "C", datetime!(2024-01-01 10:00:00 UTC));
    c.values = vec![ProductValue::new("sku", ValueData::Text("C".into()))];

    InMemoryCatalog::new()
        .with_channel(ecommerce())
        .with_channel(mobile())
        .with_category(1, None)
        .with_category(2, Some(1))
        .with_category(3, Some(2))
        .with_category(10, None)
        .with_category(11, Some(10))
        .with_family(Family {
            code: "shoes".into(),
            requirements: [("ecommerce".to_string(), vec!["sku".to_string(), "name".to_string(), "price".to_string()])]
                .into_iter()
                .collect(),
        })
        .with_product(a)
        .with_product(b)
        .with_product(c)
}

pub fn execution(job: &str, end: Option<OffsetDateTime>, status: ExitStatus) -> ExecutionRecord {
    ExecutionRecord { job_definition_id: job.to_string(), end_time: end, exit_status: status }
}

/// Identifiers of the shaped records, in output order.
pub fn identifiers(records: &[catalog_export::FlatProduct]) -> Vec<String> {
    records.iter().filter_map(|f| f.record.get("sku").map(str::to_string)).collect()
}
