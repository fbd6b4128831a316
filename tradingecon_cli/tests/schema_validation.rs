use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tradingecon_lib::{
    extract_macro, extract_markets, extract_news_feed, CollectionReport, MarketCategory,
    RunMetadata,
};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_fixture(name: &str) -> String {
    let path = workspace_root()
        .join("tradingecon_lib/tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e))
}

fn load_schema() -> Value {
    let path = workspace_root().join("schema").join("report.schema.json");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn metadata() -> RunMetadata {
    RunMetadata {
        scraped_at: Utc::now(),
        duration_seconds: 42.0,
        base_url: "https://tradingeconomics.com/".to_string(),
        max_retries: 3,
        backoff_factor: 0.5,
        rate_limit_delay_secs: 5.0,
        http_timeout_secs: 30.0,
        pipeline_version: "0.3.0".to_string(),
        requests_succeeded: 9,
        requests_failed: 1,
        retries: 2,
        robots_blocked: 0,
    }
}

/// A report built from the HTML fixtures, serialized the way the CLI writes it.
fn fixture_report() -> Value {
    let mut report = CollectionReport::new(metadata());
    *report.market_mut(MarketCategory::Forex) =
        extract_markets(&load_fixture("forex.html"), MarketCategory::Forex).records;
    *report.market_mut(MarketCategory::Etfs) =
        extract_markets(&load_fixture("etfs.html"), MarketCategory::Etfs).records;
    report.set_macro(extract_macro(&load_fixture("macro.html")));
    let base = url::Url::parse("https://tradingeconomics.com/news").unwrap();
    report.news = extract_news_feed(&load_fixture("news.html"), &base);
    report.record_error(
        "bonds",
        "Request to https://tradingeconomics.com/bonds failed with status 404",
    );

    assert!(!report.forex.is_empty(), "forex fixture should yield instruments");
    assert!(!report.news.is_empty(), "news fixture should yield articles");
    serde_json::to_value(&report).expect("report serializes")
}

fn validator() -> jsonschema::Validator {
    jsonschema::draft202012::new(&load_schema()).expect("report schema compiles")
}

// ---------------------------------------------------------------------------
// Positive validation
// ---------------------------------------------------------------------------

#[test]
fn test_fixture_report_conforms_to_schema() {
    let report = fixture_report();
    if let Err(e) = validator().validate(&report) {
        panic!("fixture report failed validation: {e}");
    }
}

#[test]
fn test_empty_report_conforms_to_schema() {
    let report = serde_json::to_value(CollectionReport::new(metadata())).unwrap();
    if let Err(e) = validator().validate(&report) {
        panic!("empty report failed validation: {e}");
    }
}

// ---------------------------------------------------------------------------
// Negative validation: the schema rejects malformed reports
// ---------------------------------------------------------------------------

#[test]
fn test_missing_country_key_rejected() {
    let mut report = fixture_report();
    report["macro_data"].as_object_mut().unwrap().remove("JP");
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_unknown_country_key_rejected() {
    let mut report = fixture_report();
    report["macro_data"]["MX"] = Value::Array(vec![]);
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_out_of_range_pct_change_rejected() {
    let mut report = fixture_report();
    report["forex"][0]["pct_change"] = Value::from(150.0);
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_unknown_category_rejected() {
    let mut report = fixture_report();
    report["forex"][0]["category"] = Value::from("options");
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_relative_article_url_rejected() {
    let mut report = fixture_report();
    report["news"]["market_headlines"][0]["url"] = Value::from("/news/h1");
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_missing_metadata_rejected() {
    let mut report = fixture_report();
    report.as_object_mut().unwrap().remove("metadata");
    assert!(validator().validate(&report).is_err());
}
