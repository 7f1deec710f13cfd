use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Metrics a rule can watch. Reports carry them under these lowercase keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Ram,
    Disk,
    Network,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Ram,
        MetricKind::Disk,
        MetricKind::Network,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Self::Cpu),
            "ram" => Some(Self::Ram),
            "disk" => Some(Self::Disk),
            "network" => Some(Self::Network),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
            Self::Network => "network",
        }
    }

    /// Human label used in notification titles and fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Ram => "RAM",
            Self::Disk => "Disk",
            Self::Network => "Network",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed operator set. There is deliberately no equality operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
}

impl ComparisonOperator {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanOrEqual),
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanOrEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Strict floating-point comparison, no tolerance. NaN never matches.
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::GreaterThanOrEqual => value >= threshold,
            Self::LessThan => value < threshold,
            Self::LessThanOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compares `value` against `threshold` using an operator as stored in the
/// database. Unknown operators fail closed.
pub fn compare(value: f64, operator: &str, threshold: f64) -> bool {
    ComparisonOperator::parse(operator).is_some_and(|op| op.matches(value, threshold))
}

/// One normalized agent report handed over by ingestion.
///
/// `cpu`, `ram` and `disk` are 0-100 percentages and `network` is a summed
/// byte count; normalization happens before the report reaches alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub server_id: i32,
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

impl MetricsReport {
    pub fn new(
        server_id: i32,
        hostname: impl Into<String>,
        ip: impl Into<String>,
        metrics: HashMap<String, f64>,
    ) -> Self {
        Self {
            server_id,
            hostname: hostname.into(),
            ip: ip.into(),
            metrics,
        }
    }

    pub fn value(&self, metric: MetricKind) -> Option<f64> {
        self.metrics.get(metric.as_str()).copied()
    }
}

/// An enabled rule, bound to the server being evaluated, decoded into typed
/// fields at the store boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRule {
    pub id: i32,
    pub alert_id: i32,
    pub metric: MetricKind,
    pub operator: ComparisonOperator,
    pub threshold: f64,
    pub cooldown_seconds: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub mentions: Option<String>,
}

/// When the cooldown ledger is written after a rule fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Record the send after every delivery attempt, even if all channels failed.
    #[default]
    Always,
    /// Record the send only when at least one channel accepted the alert.
    OnSuccess,
}

impl CooldownPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "on_success" => Some(Self::OnSuccess),
            _ => None,
        }
    }

    pub fn should_mark(self, delivered: usize) -> bool {
        match self {
            Self::Always => true,
            Self::OnSuccess => delivered > 0,
        }
    }
}
