//! Cost tracking types.
//!
//! Spend is reconstructed from the agent's local session logs:
//! - [`CostPeriod`] - Time range a report covers
//! - [`CostReport`] - Totals per provider
//! - [`ProviderCost`] / [`ModelCost`] - Per-provider and per-model rows

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Cost Period
// ============================================================================

/// Time range of a cost report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostPeriod {
    /// Last 7 days.
    #[default]
    Week,
    /// Last 30 days.
    Month,
    /// Everything on disk.
    All,
    /// Last N days.
    Days(u32),
}

impl CostPeriod {
    /// The fixed tabs, in display order.
    pub fn tabs() -> &'static [CostPeriod] {
        &[Self::Week, Self::Month, Self::All]
    }

    /// Tab label.
    pub fn label(&self) -> String {
        match self {
            Self::Week => "week".to_string(),
            Self::Month => "month".to_string(),
            Self::All => "all".to_string(),
            Self::Days(1) => "last day".to_string(),
            Self::Days(n) => format!("last {n} days"),
        }
    }

    /// Earliest timestamp included in the period.
    ///
    /// `None` for [`CostPeriod::All`], and for day counts reaching past the
    /// earliest representable time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::All => return None,
            Self::Days(n) => i64::from(*n),
        };
        Duration::try_days(days).and_then(|d| now.checked_sub_signed(d))
    }

    /// True if `at` falls inside the period ending at `now`.
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.since(now).is_none_or(|since| at >= since)
    }
}

impl std::str::FromStr for CostPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Days)
                .ok_or_else(|| format!("expected week, month, all or a day count, got '{other}'")),
        }
    }
}

// ============================================================================
// Model Cost
// ============================================================================

/// Token and cost totals for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    /// Model id as logged.
    pub model: String,
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Cache read tokens.
    pub cache_read_tokens: u64,
    /// Cache write tokens.
    pub cache_write_tokens: u64,
    /// Cost in USD.
    pub cost_usd: f64,
    /// Assistant messages counted.
    pub messages: u64,
    /// Output tokens of messages whose generation time is known.
    #[serde(default)]
    pub timed_output_tokens: u64,
    /// Total generation time of those messages, seconds.
    #[serde(default)]
    pub generation_secs: f64,
}

impl ModelCost {
    /// Creates an empty row for a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// All tokens, cache included.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_write_tokens
    }

    /// Average output tokens per second over timed messages.
    pub fn tokens_per_second(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        (self.generation_secs > 0.0).then(|| self.timed_output_tokens as f64 / self.generation_secs)
    }
}

// ============================================================================
// Provider Cost
// ============================================================================

/// Totals for one provider, with a per-model breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCost {
    /// Provider id as logged (`anthropic`, `openai-codex`, ...).
    pub provider: String,
    /// Per-model rows, most expensive first.
    pub models: Vec<ModelCost>,
}

impl ProviderCost {
    /// Total cost in USD.
    pub fn cost_usd(&self) -> f64 {
        self.models.iter().map(|m| m.cost_usd).sum()
    }

    /// Total tokens.
    pub fn total_tokens(&self) -> u64 {
        self.models.iter().map(ModelCost::total_tokens).sum()
    }

    /// Total assistant messages.
    pub fn messages(&self) -> u64 {
        self.models.iter().map(|m| m.messages).sum()
    }
}

// ============================================================================
// Cost Report
// ============================================================================

/// Spend over one period, grouped by provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    /// Period covered.
    pub period: CostPeriod,
    /// Providers, most expensive first.
    pub providers: Vec<ProviderCost>,
    /// Session files read.
    pub sessions_scanned: usize,
}

impl CostReport {
    /// Total cost in USD.
    pub fn total_cost_usd(&self) -> f64 {
        self.providers.iter().map(ProviderCost::cost_usd).sum()
    }

    /// Total tokens.
    pub fn total_tokens(&self) -> u64 {
        self.providers.iter().map(ProviderCost::total_tokens).sum()
    }

    /// Total assistant messages.
    pub fn total_messages(&self) -> u64 {
        self.providers.iter().map(ProviderCost::messages).sum()
    }

    /// True if nothing was recorded in the period.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Orders providers and their models by descending cost.
    pub fn sort_by_cost(&mut self) {
        for provider in &mut self.providers {
            provider
                .models
                .sort_by(|a, b| b.cost_usd.total_cmp(&a.cost_usd));
        }
        self.providers
            .sort_by(|a, b| b.cost_usd().total_cmp(&a.cost_usd()));
    }
}
