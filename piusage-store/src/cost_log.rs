//! Cost report from agent session logs.
//!
//! Sessions are JSONL files under `<agent dir>/sessions/`, one event per
//! line. Assistant message events carry the provider, model and token usage
//! of the reply:
//!
//! ```json
//! {"type":"message","timestamp":"2026-01-05T10:00:03Z",
//!  "message":{"role":"assistant","provider":"anthropic","model":"claude-sonnet-4",
//!             "usage":{"input":1200,"output":300,"cacheRead":0,"cacheWrite":0,
//!                      "cost":{"total":0.0081}}}}
//! ```
//!
//! Tokens per second are derived from the time between a user message and
//! the next assistant message of the same session.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use piusage_core::{CostPeriod, CostReport, ModelCost, ProviderCost, SessionClock};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;

// ============================================================================
// Log Line Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct LogLine {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<LogMessage>,
}

#[derive(Debug, Deserialize)]
struct LogMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<LogUsage>,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogUsage {
    #[serde(default)]
    input: u64,
    #[serde(default)]
    output: u64,
    #[serde(default)]
    cache_read: u64,
    #[serde(default)]
    cache_write: u64,
    #[serde(default)]
    cost: Option<LogCost>,
}

#[derive(Debug, Default, Deserialize)]
struct LogCost {
    #[serde(default)]
    total: f64,
}

/// Parses an RFC 3339 string or epoch milliseconds.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

impl LogLine {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.message
            .as_ref()
            .and_then(|m| m.timestamp.as_ref())
            .and_then(parse_timestamp)
            .or_else(|| self.timestamp.as_ref().and_then(parse_timestamp))
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Accumulates session events into per-provider, per-model totals.
#[derive(Debug)]
pub struct CostAggregator {
    period: CostPeriod,
    now: DateTime<Utc>,
    providers: HashMap<String, HashMap<String, ModelCost>>,
    sessions: usize,
}

impl CostAggregator {
    /// Creates an aggregator for the period ending at `now`.
    pub fn new(period: CostPeriod, now: DateTime<Utc>) -> Self {
        Self {
            period,
            now,
            providers: HashMap::new(),
            sessions: 0,
        }
    }

    /// Adds one session's JSONL content.
    pub fn add_session(&mut self, content: &str) {
        self.sessions += 1;
        let mut clock = SessionClock::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(event) = serde_json::from_str::<LogLine>(line) else {
                continue;
            };
            if event.kind.as_deref().is_some_and(|k| k != "message") {
                continue;
            }
            let at = event.timestamp();
            let Some(message) = event.message else {
                continue;
            };

            match message.role.as_deref() {
                Some("user") => {
                    if let Some(at) = at {
                        clock.start(at);
                    }
                }
                Some("assistant") => {
                    let Some(usage) = message.usage else {
                        clock.reset();
                        continue;
                    };
                    let timing = at.and_then(|at| clock.finish(at, usage.output));
                    clock.reset();

                    let Some(at) = at else { continue };
                    if !self.period.contains(at, self.now) {
                        continue;
                    }

                    let provider = message.provider.unwrap_or_else(|| "unknown".to_string());
                    let model = message.model.unwrap_or_else(|| "unknown".to_string());
                    let row = self
                        .providers
                        .entry(provider)
                        .or_default()
                        .entry(model.clone())
                        .or_insert_with(|| ModelCost::new(model));

                    row.input_tokens += usage.input;
                    row.output_tokens += usage.output;
                    row.cache_read_tokens += usage.cache_read;
                    row.cache_write_tokens += usage.cache_write;
                    row.cost_usd += usage.cost.map_or(0.0, |c| c.total);
                    row.messages += 1;
                    if let Some(timing) = timing.filter(|t| t.seconds() > 0.0) {
                        row.timed_output_tokens += timing.output_tokens;
                        row.generation_secs += timing.seconds();
                    }
                }
                _ => {}
            }
        }
    }

    /// Finishes aggregation.
    pub fn finish(self) -> CostReport {
        let mut report = CostReport {
            period: self.period,
            providers: self
                .providers
                .into_iter()
                .map(|(provider, models)| ProviderCost {
                    provider,
                    models: models.into_values().collect(),
                })
                .collect(),
            sessions_scanned: self.sessions,
        };
        report.sort_by_cost();
        report
    }
}

// ============================================================================
// Scanning
// ============================================================================

/// Lists `*.jsonl` files below `dir`, recursively. A missing directory is empty.
async fn session_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Scans session logs below `dir` and builds a report for `period`.
///
/// Files last modified before the period starts are skipped without being
/// read. Unreadable files are logged and skipped.
#[instrument(skip_all, fields(dir = %dir.display(), period = %period.label()))]
pub async fn scan_sessions(
    dir: &Path,
    period: CostPeriod,
    now: DateTime<Utc>,
) -> Result<CostReport, StoreError> {
    let since = period.since(now);
    let mut aggregator = CostAggregator::new(period, now);

    for path in session_files(dir).await? {
        if let Some(since) = since {
            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            if modified.is_some_and(|m| m < since) {
                continue;
            }
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => aggregator.add_session(&content),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read session log"),
        }
    }

    let report = aggregator.finish();
    debug!(
        sessions = report.sessions_scanned,
        providers = report.providers.len(),
        cost = report.total_cost_usd(),
        "Cost scan finished"
    );
    Ok(report)
}

// ============================================================================
// Deletion
// ============================================================================

/// Outcome of [`delete_provider_logs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogDeletion {
    /// Session files removed.
    pub removed: usize,
    /// Files that also hold replies of other providers, left in place.
    pub kept_shared: usize,
}

/// Providers with recorded usage in one session, as logged.
fn session_providers(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter_map(|line| serde_json::from_str::<LogLine>(line.trim()).ok())
        .filter_map(|event| event.message)
        .filter(|m| m.role.as_deref() == Some("assistant") && m.usage.is_some())
        .map(|m| m.provider.unwrap_or_else(|| "unknown".to_string()))
        .collect()
}

/// Deletes the session logs below `dir` whose usage all belongs to `provider`.
///
/// Sessions that mix providers are kept, so another provider's spend never
/// disappears with them.
#[instrument(skip_all, fields(dir = %dir.display(), provider = %provider))]
pub async fn delete_provider_logs(dir: &Path, provider: &str) -> Result<LogDeletion, StoreError> {
    let mut deletion = LogDeletion::default();

    for path in session_files(dir).await? {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read session log");
                continue;
            }
        };
        let providers = session_providers(&content);
        if !providers.contains(provider) {
            continue;
        }
        if providers.len() > 1 {
            debug!(path = %path.display(), "Keeping session shared with other providers");
            deletion.kept_shared += 1;
            continue;
        }
        tokio::fs::remove_file(&path).await?;
        deletion.removed += 1;
    }

    info!(
        removed = deletion.removed,
        kept_shared = deletion.kept_shared,
        "Deleted provider session logs"
    );
    Ok(deletion)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn assistant(at: DateTime<Utc>, provider: &str, model: &str, output: u64, cost: f64) -> String {
        serde_json::json!({
            "type": "message",
            "timestamp": at.to_rfc3339(),
            "message": {
                "role": "assistant",
                "provider": provider,
                "model": model,
                "usage": {"input": 100, "output": output, "cacheRead": 50, "cacheWrite": 10,
                          "cost": {"total": cost}}
            }
        })
        .to_string()
    }

    fn user(at: DateTime<Utc>) -> String {
        serde_json::json!({
            "type": "message",
            "timestamp": at.to_rfc3339(),
            "message": {"role": "user", "content": "hi"}
        })
        .to_string()
    }

    #[test]
    fn test_aggregates_per_provider_and_model() {
        let now = Utc::now();
        let t = now - Duration::hours(1);
        let session = [
            r#"{"type":"session","id":"abc"}"#.to_string(),
            user(t),
            assistant(t + Duration::seconds(2), "anthropic", "claude-sonnet-4", 200, 0.5),
            assistant(t + Duration::seconds(9), "anthropic", "claude-sonnet-4", 50, 0.25),
            assistant(t + Duration::seconds(10), "openai-codex", "gpt-5", 10, 0.1),
            "not json".to_string(),
        ]
        .join("\n");

        let mut agg = CostAggregator::new(CostPeriod::Week, now);
        agg.add_session(&session);
        let report = agg.finish();

        assert_eq!(report.sessions_scanned, 1);
        assert_eq!(report.providers[0].provider, "anthropic");
        let sonnet = &report.providers[0].models[0];
        assert_eq!(sonnet.messages, 2);
        assert_eq!(sonnet.output_tokens, 250);
        assert_eq!(sonnet.total_tokens(), 2 * 100 + 250 + 2 * 50 + 2 * 10);
        assert!((sonnet.cost_usd - 0.75).abs() < 1e-9);
        assert!((report.total_cost_usd() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_tokens_per_second_uses_prompt_to_reply_time() {
        let now = Utc::now();
        let t = now - Duration::hours(1);
        let session = [
            user(t),
            assistant(t + Duration::seconds(4), "anthropic", "m", 200, 0.0),
            assistant(t + Duration::seconds(30), "anthropic", "m", 999, 0.0),
        ]
        .join("\n");

        let mut agg = CostAggregator::new(CostPeriod::All, now);
        agg.add_session(&session);
        let report = agg.finish();
        let model = &report.providers[0].models[0];
        assert_eq!(model.timed_output_tokens, 200);
        assert!((model.tokens_per_second().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_period_filter() {
        let now = Utc::now();
        let session = [
            assistant(now - Duration::days(10), "anthropic", "m", 1, 1.0),
            assistant(now - Duration::days(2), "anthropic", "m", 1, 2.0),
        ]
        .join("\n");

        let mut week = CostAggregator::new(CostPeriod::Week, now);
        week.add_session(&session);
        assert!((week.finish().total_cost_usd() - 2.0).abs() < 1e-9);

        let mut all = CostAggregator::new(CostPeriod::All, now);
        all.add_session(&session);
        assert!((all.finish().total_cost_usd() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_epoch_millis_timestamps() {
        let now = Utc::now();
        let ms = (now - Duration::hours(1)).timestamp_millis();
        let line = format!(
            r#"{{"type":"message","message":{{"role":"assistant","provider":"zai","model":"glm-4.6","timestamp":{ms},"usage":{{"input":1,"output":2}}}}}}"#
        );
        let mut agg = CostAggregator::new(CostPeriod::Week, now);
        agg.add_session(&line);
        let report = agg.finish();
        assert_eq!(report.total_messages(), 1);
        assert_eq!(report.providers[0].provider, "zai");
    }

    #[tokio::test]
    async fn test_scan_sessions_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project-a");
        tokio::fs::create_dir_all(&nested).await.unwrap();

        let now = Utc::now();
        let line = assistant(now - Duration::minutes(5), "anthropic", "m", 1, 1.5);
        tokio::fs::write(nested.join("s1.jsonl"), &line).await.unwrap();
        tokio::fs::write(dir.path().join("s2.jsonl"), &line).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), &line).await.unwrap();

        let report = scan_sessions(dir.path(), CostPeriod::Week, now).await.unwrap();
        assert_eq!(report.sessions_scanned, 2);
        assert!((report.total_cost_usd() - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let report = scan_sessions(&dir.path().join("none"), CostPeriod::All, Utc::now())
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_delete_provider_logs_keeps_shared_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project-b");
        tokio::fs::create_dir_all(&nested).await.unwrap();

        let now = Utc::now();
        let at = now - Duration::minutes(5);
        let only_zai = [user(at), assistant(at, "zai", "glm-4.6", 1, 0.5)].join("\n");
        let mixed = [
            assistant(at, "zai", "glm-4.6", 1, 0.5),
            assistant(at, "anthropic", "m", 1, 2.0),
        ]
        .join("\n");
        let only_claude = assistant(at, "anthropic", "m", 1, 1.0);

        tokio::fs::write(nested.join("a.jsonl"), &only_zai).await.unwrap();
        tokio::fs::write(dir.path().join("b.jsonl"), &mixed).await.unwrap();
        tokio::fs::write(dir.path().join("c.jsonl"), &only_claude).await.unwrap();

        let deletion = delete_provider_logs(dir.path(), "zai").await.unwrap();
        assert_eq!(deletion, LogDeletion { removed: 1, kept_shared: 1 });
        assert!(!nested.join("a.jsonl").exists());
        assert!(dir.path().join("b.jsonl").exists());
        assert!(dir.path().join("c.jsonl").exists());

        let report = scan_sessions(dir.path(), CostPeriod::All, now).await.unwrap();
        assert_eq!(report.sessions_scanned, 2);
        assert!((report.total_cost_usd() - 3.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delete_provider_logs_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let deletion = delete_provider_logs(&dir.path().join("none"), "zai").await.unwrap();
        assert_eq!(deletion, LogDeletion::default());
    }
}
