//! CLI output formatting tests.

mod json_tests {
    use super::super::{accounts_json, usage_json};
    use chrono::Utc;
    use piusage_core::{
        CredentialEntry, ProviderKind, ProviderStatus, RateWindow, StatusIndicator, UsageSnapshot,
        NO_CREDENTIALS,
    };
    use piusage_providers::ProviderUsage;
    use piusage_store::CredentialStore;
    use serde_json::Value;

    fn store() -> CredentialStore {
        let mut store = CredentialStore::new("/tmp/auth.json");
        let mut entry = CredentialEntry::oauth("secret-token");
        entry.email = Some("a@x.io".into());
        store.insert("anthropic", &entry).unwrap();
        store.insert("anthropic-1", &CredentialEntry::oauth("other")).unwrap();
        store.insert("zai", &CredentialEntry::api_key("zai-key")).unwrap();
        store
    }

    #[test]
    fn test_usage_json_shape() {
        let store = store();
        let mut ok = UsageSnapshot::new(ProviderKind::Claude).for_account("anthropic");
        ok.push_window(RateWindow::new("5h", 25.0));
        let failed = UsageSnapshot::with_error(ProviderKind::Claude, "http 500").for_account("anthropic-1");
        let claude = ProviderUsage::new(ProviderKind::Claude, vec![ok, failed], &store, Utc::now());
        let codex = ProviderUsage::new(
            ProviderKind::Codex,
            vec![UsageSnapshot::with_error(ProviderKind::Codex, NO_CREDENTIALS)],
            &store,
            Utc::now(),
        );
        let statuses = vec![(
            ProviderKind::Claude,
            ProviderStatus::new(StatusIndicator::None, "All Systems Operational"),
        )];

        let json: Value = serde_json::from_str(&usage_json(&[claude, codex], &statuses).unwrap()).unwrap();
        let providers = json.as_array().unwrap();
        assert_eq!(providers.len(), 1, "unconfigured Codex is dropped");

        let claude = &providers[0];
        assert_eq!(claude["provider"], "claude");
        assert_eq!(claude["displayName"], "Claude");
        assert_eq!(claude["activeKey"], "anthropic");
        assert_eq!(claude["status"]["indicator"], "Operational");
        assert_eq!(claude["accounts"].as_array().unwrap().len(), 2);
        assert_eq!(claude["accounts"][1]["error"], "http 500");
    }

    #[test]
    fn test_accounts_json_hides_secrets() {
        let text = accounts_json(&store()).unwrap();
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("zai-key"));

        let json: Value = serde_json::from_str(&text).unwrap();
        let accounts = json.as_array().unwrap();
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0]["key"], "anthropic");
        assert_eq!(accounts[0]["active"], true);
        assert_eq!(accounts[0]["email"], "a@x.io");
        assert_eq!(accounts[1]["active"], false);
        assert_eq!(accounts[2]["provider"], "zai");
        assert_eq!(accounts[2]["type"], "api_key");
    }
}

mod text_tests {
    use super::super::{account_lines, status_lines};
    use piusage_core::{CredentialEntry, PlainTheme, ProviderKind, ProviderStatus, StatusIndicator};
    use piusage_store::CredentialStore;

    #[test]
    fn test_status_lines() {
        let statuses = vec![
            (ProviderKind::Claude, ProviderStatus::new(StatusIndicator::Minor, "Elevated errors")),
            (ProviderKind::Codex, ProviderStatus::unknown("timeout")),
        ];
        let lines = status_lines(&statuses, &PlainTheme);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Claude   ◐ Elevated errors"), "{}", lines[0]);
        assert!(lines[1].contains("timeout"));
    }

    #[test]
    fn test_account_lines() {
        let mut store = CredentialStore::new("/tmp/auth.json");
        store.insert("openai-codex-2", &CredentialEntry::oauth("t")).unwrap();
        store.insert("openai-codex-1", &CredentialEntry::default()).unwrap();

        let lines = account_lines(&store, &PlainTheme);
        assert_eq!(lines[0], "Codex");
        assert!(lines[1].contains("○ openai-codex-1"), "{lines:?}");
        assert!(lines[1].contains("(no token)"), "{lines:?}");
        assert!(lines[2].contains("● openai-codex-2"), "{lines:?}");
    }

    #[test]
    fn test_account_lines_empty_store() {
        let lines = account_lines(&CredentialStore::new("/tmp/none.json"), &PlainTheme);
        assert_eq!(lines, vec!["No accounts stored in /tmp/none.json".to_string()]);
    }
}
