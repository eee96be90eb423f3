//! Response parsing edge cases.
//!
//! Provider responses are parsed ad hoc; these tests pin down behavior with
//! partial, odd or hostile bodies.

#[cfg(test)]
mod claude_edge_tests {
    use crate::claude::{ProfileResponse, UsageApiResponse};

    #[test]
    fn test_all_windows_null() {
        let json = r#"{
            "five_hour": null,
            "seven_day": null,
            "seven_day_opus": null,
            "seven_day_sonnet": null
        }"#;
        let response: UsageApiResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot();
        assert!(!snapshot.has_data());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_window_without_utilization() {
        let json = r#"{"seven_day": {"resets_at": "2026-01-05T00:00:00Z"}}"#;
        let response: UsageApiResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot();
        assert_eq!(snapshot.windows[0].label, "Week");
        assert!(snapshot.windows[0].used_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_reset_timestamp() {
        let json = r#"{"five_hour": {"utilization": 10, "resets_at": "tomorrow"}}"#;
        let response: UsageApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.to_snapshot().windows[0].resets_at.is_none());
    }

    #[test]
    fn test_negative_utilization_clamped() {
        let json = r#"{"five_hour": {"utilization": -3}}"#;
        let response: UsageApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.to_snapshot().windows[0].used_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let json = r#"{"five_hour": {"utilization": "high"}}"#;
        assert!(serde_json::from_str::<UsageApiResponse>(json).is_err());
    }

    #[test]
    fn test_empty_profile() {
        let profile: ProfileResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(profile.email(), None);
        assert_eq!(profile.plan(), None);

        let json = r#"{"account": {"email_address": ""}}"#;
        let profile: ProfileResponse = serde_json::from_str(json).unwrap();
        assert_eq!(profile.email(), None);
    }
}

#[cfg(test)]
mod codex_edge_tests {
    use chrono::{TimeZone, Utc};

    use crate::codex::WhamUsageResponse;

    #[test]
    fn test_empty_response() {
        let response: WhamUsageResponse = serde_json::from_str("{}").unwrap();
        let snapshot = response.to_snapshot(Utc::now());
        assert!(!snapshot.has_data());
        assert_eq!(snapshot.plan, None);
    }

    #[test]
    fn test_null_rate_limit_and_credits() {
        let json = r#"{"plan_type": "pro", "rate_limit": null, "credits": null}"#;
        let response: WhamUsageResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot(Utc::now());
        assert_eq!(snapshot.plan.as_deref(), Some("Pro"));
    }

    #[test]
    fn test_unparseable_balance_ignored() {
        let json = r#"{"plan_type": "plus", "credits": {"balance": "n/a"}}"#;
        let response: WhamUsageResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot(Utc::now());
        assert_eq!(snapshot.plan.as_deref(), Some("Plus"));
    }

    #[test]
    fn test_reset_at_wins_over_reset_after() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let json = r#"{"rate_limit": {"primary_window": {
            "used_percent": 50,
            "limit_window_seconds": 18000,
            "reset_after_seconds": 60,
            "reset_at": 1767232800
        }}}"#;
        let response: WhamUsageResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot(now);
        assert_eq!(
            snapshot.windows[0].resets_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 2, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_custom_window_length() {
        let json = r#"{"rate_limit": {"primary_window": {
            "used_percent": 1, "limit_window_seconds": 10800
        }}}"#;
        let response: WhamUsageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.to_snapshot(Utc::now()).windows[0].label, "3h");
    }
}

#[cfg(test)]
mod zai_edge_tests {
    use crate::zai::{QuotaLimit, QuotaResponse};

    fn limit(json: &str) -> QuotaLimit {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_reset_time_as_numeric_string() {
        let l = limit(r#"{"type": "TOKENS_LIMIT", "nextResetTime": "1767225600000"}"#);
        assert_eq!(
            l.resets_at(),
            chrono::DateTime::from_timestamp_millis(1_767_225_600_000)
        );
    }

    #[test]
    fn test_reset_time_unusable() {
        assert!(limit(r#"{"nextResetTime": "soon"}"#).resets_at().is_none());
        assert!(limit(r#"{"nextResetTime": true}"#).resets_at().is_none());
        assert!(limit(r#"{"nextResetTime": null}"#).resets_at().is_none());
    }

    #[test]
    fn test_percentage_preferred_over_ratio() {
        let l = limit(r#"{"percentage": 5, "usage": 100, "currentValue": 50}"#);
        assert_eq!(l.used_percent(), Some(5.0));
    }

    #[test]
    fn test_limits_missing() {
        let response: QuotaResponse = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        let snapshot = response.to_snapshot().unwrap();
        assert!(!snapshot.has_data());
    }

    #[test]
    fn test_null_data_is_malformed() {
        let response: QuotaResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(response.to_snapshot().is_err());
    }
}

#[cfg(test)]
mod redirect_tests {
    use piusage_fetch::{FetchContext, FetchError, FetchSettings};

    use crate::claude::ClaudeApiClient;
    use crate::codex::CodexApiClient;
    use crate::zai::ZaiApiClient;

    fn ctx() -> FetchContext {
        FetchContext::new(FetchSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_foreign_hosts_rejected_before_request() {
        let ctx = ctx();

        let claude = ClaudeApiClient::with_base_url("https://example.com");
        let err = claude.fetch_usage(&ctx, "token").await.unwrap_err();
        assert!(matches!(err, FetchError::DomainNotAllowed(_)));

        let codex = CodexApiClient::with_urls("https://example.com", "https://example.org/me");
        let err = codex.fetch_usage(&ctx, "token", Some("acct")).await.unwrap_err();
        assert!(matches!(err, FetchError::DomainNotAllowed(_)));
        let err = codex.fetch_email(&ctx, "token").await.unwrap_err();
        assert!(matches!(err, FetchError::DomainNotAllowed(_)));

        let zai = ZaiApiClient::with_base_url("https://example.com");
        let err = zai.fetch_quota(&ctx, "key").await.unwrap_err();
        assert!(matches!(err, FetchError::DomainNotAllowed(_)));
    }
}
