//! Serde shape tests for types that are written out as JSON.
//!
//! `piusage usage --json` and `piusage accounts --json` are meant for
//! scripts, so their field names are part of the interface.

use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::{CostPeriod, ProviderKind, RateWindow, UsageSnapshot};

#[test]
fn test_provider_kind_is_lowercase() {
    assert_eq!(serde_json::to_value(ProviderKind::Zai).unwrap(), json!("zai"));
    let kind: ProviderKind = serde_json::from_str(r#""codex""#).unwrap();
    assert_eq!(kind, ProviderKind::Codex);
}

#[test]
fn test_usage_snapshot_json_shape() {
    let reset = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut snap = UsageSnapshot::new(ProviderKind::Claude).for_account("anthropic-1");
    snap.push_window(RateWindow::new("5h", 42.0).resetting_at(Some(reset)));
    snap.push_window(RateWindow::new("Week", 10.0));
    snap.plan = Some("Max".into());

    let value = serde_json::to_value(&snap).unwrap();
    assert_eq!(value["provider"], "claude");
    assert_eq!(value["account_key"], "anthropic-1");
    assert_eq!(value["windows"][0]["label"], "5h");
    assert_eq!(value["windows"][0]["resets_at"], "2026-03-01T12:00:00Z");
    assert!(value["windows"][1].get("resets_at").is_none());
    assert!(value.get("error").is_none());
    assert!(value.get("email").is_none());
}

#[test]
fn test_usage_snapshot_accepts_missing_optionals() {
    let json = r#"{"provider":"zai","display_name":"Z.AI","updated_at":"2026-01-01T00:00:00Z"}"#;
    let snap: UsageSnapshot = serde_json::from_str(json).unwrap();
    assert!(snap.windows.is_empty());
    assert!(snap.error.is_none());
}

#[test]
fn test_cost_period_custom_days() {
    assert_eq!(serde_json::to_value(CostPeriod::Days(3)).unwrap(), json!({"days": 3}));
    assert_eq!(serde_json::to_value(CostPeriod::Month).unwrap(), json!("month"));
}
