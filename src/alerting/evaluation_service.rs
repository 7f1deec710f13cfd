use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::models::{ActiveRule, CooldownPolicy, MetricsReport};
use super::stores::{ChannelStore, CooldownStore, RuleStore, SettingsStore, StoreError};
use crate::notifications::message::AlertMessage;
use crate::notifications::models::ChannelConfig;
use crate::notifications::senders::SenderError;
use crate::notifications::service::{NotificationError, NotificationService};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Invalid report: {0}")]
    InvalidReport(String),
    #[error("Failed to read alerting settings: {0}")]
    Settings(#[source] StoreError),
    #[error("Failed to load alert rules for server {server_id}: {source}")]
    RuleLoad {
        server_id: i32,
        #[source]
        source: StoreError,
    },
}

/// What happened to a single rule during one report's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    MetricNotReported,
    NoMatch,
    CoolingDown,
    NoDeliverableChannels,
    Dispatched { delivered: usize, failed: usize },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub rules_evaluated: usize,
    pub rules_triggered: usize,
    pub rules_suppressed: usize,
    pub notifications_delivered: usize,
    pub notifications_failed: usize,
}

impl EvaluationSummary {
    fn record(&mut self, outcome: RuleOutcome) {
        match outcome {
            RuleOutcome::CoolingDown => self.rules_suppressed += 1,
            RuleOutcome::Dispatched { delivered, failed } => {
                self.rules_triggered += 1;
                self.notifications_delivered += delivered;
                self.notifications_failed += failed;
            }
            _ => {}
        }
    }
}

/// Runs once per incoming report: matches rules, enforces cooldowns and fans
/// alerts out to every bound channel.
pub struct EvaluationService {
    rules: Arc<dyn RuleStore>,
    channels: Arc<dyn ChannelStore>,
    cooldowns: Arc<dyn CooldownStore>,
    settings: Arc<dyn SettingsStore>,
    notification_service: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    policy: CooldownPolicy,
}

impl EvaluationService {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        channels: Arc<dyn ChannelStore>,
        cooldowns: Arc<dyn CooldownStore>,
        settings: Arc<dyn SettingsStore>,
        notification_service: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rules,
            channels,
            cooldowns,
            settings,
            notification_service,
            clock,
            policy: CooldownPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CooldownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluates `report` on a background task so the reporting agent is
    /// acknowledged without waiting on webhooks.
    pub fn spawn_evaluation(self: &Arc<Self>, report: MetricsReport) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            match service.evaluate(&report).await {
                Ok(summary) if summary.rules_triggered > 0 => {
                    info!(
                        server_id = report.server_id,
                        triggered = summary.rules_triggered,
                        delivered = summary.notifications_delivered,
                        failed = summary.notifications_failed,
                        "Alert evaluation dispatched notifications."
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        server_id = report.server_id,
                        error = %e,
                        "Alert evaluation failed; report accepted without alerting."
                    );
                }
            }
        })
    }

    /// Evaluates every active rule for the report's server.
    ///
    /// Only settings and rule-loading failures abort the pass. Failures inside
    /// one rule's cooldown check or fan-out are logged and the next rule runs.
    pub async fn evaluate(
        &self,
        report: &MetricsReport,
    ) -> Result<EvaluationSummary, EvaluationError> {
        if report.server_id <= 0 {
            return Err(EvaluationError::InvalidReport(format!(
                "server id must be positive, got {}",
                report.server_id
            )));
        }

        let mut summary = EvaluationSummary::default();

        let enabled = self
            .settings
            .is_alerts_enabled()
            .await
            .map_err(EvaluationError::Settings)?;
        if !enabled {
            debug!(server_id = report.server_id, "Alerts disabled globally; skipping evaluation.");
            return Ok(summary);
        }

        let rules = self
            .rules
            .get_active_rules_for_server(report.server_id)
            .await
            .map_err(|source| EvaluationError::RuleLoad {
                server_id: report.server_id,
                source,
            })?;

        for rule in &rules {
            summary.rules_evaluated += 1;
            match self.evaluate_rule(rule, report).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!(
                        rule_id = rule.id,
                        server_id = report.server_id,
                        error = %e,
                        "Error evaluating rule."
                    );
                }
            }
        }

        Ok(summary)
    }

    async fn evaluate_rule(
        &self,
        rule: &ActiveRule,
        report: &MetricsReport,
    ) -> Result<RuleOutcome, StoreError> {
        let Some(value) = report.value(rule.metric) else {
            return Ok(RuleOutcome::MetricNotReported);
        };

        if !rule.operator.matches(value, rule.threshold) {
            return Ok(RuleOutcome::NoMatch);
        }

        if !self
            .cooldowns
            .can_send(rule.id, report.server_id, rule.cooldown_seconds)
            .await?
        {
            debug!(
                rule_id = rule.id,
                server_id = report.server_id,
                cooldown_seconds = rule.cooldown_seconds,
                "Rule is in cooldown."
            );
            return Ok(RuleOutcome::CoolingDown);
        }

        let channels = self.deliverable_channels(rule.id).await?;
        if channels.is_empty() {
            debug!(
                rule_id = rule.id,
                server_id = report.server_id,
                "Rule matched but has no deliverable channels; skipping."
            );
            return Ok(RuleOutcome::NoDeliverableChannels);
        }

        info!(
            rule_id = rule.id,
            server_id = report.server_id,
            metric = %rule.metric,
            value,
            threshold = rule.threshold,
            "Alert rule triggered. Sending notifications."
        );

        let message = AlertMessage::for_rule(rule, report, value, self.clock.now());

        // All sends start together in channel-id order, so the cooldown is
        // recorded one webhook round-trip after the match.
        let results = join_all(
            channels
                .iter()
                .map(|(_, config)| self.notification_service.send(config, &message)),
        )
        .await;

        let mut delivered = 0;
        let mut failed = 0;
        for ((channel_id, _), result) in channels.iter().zip(results) {
            match result {
                Ok(()) => {
                    delivered += 1;
                    debug!(
                        rule_id = rule.id,
                        server_id = report.server_id,
                        channel_id,
                        "Alert delivered."
                    );
                }
                Err(e) => {
                    failed += 1;
                    log_delivery_failure(rule.id, report.server_id, *channel_id, &e);
                }
            }
        }

        if self.policy.should_mark(delivered) {
            if let Err(e) = self
                .cooldowns
                .mark_sent(rule.id, report.server_id, value)
                .await
            {
                error!(
                    rule_id = rule.id,
                    server_id = report.server_id,
                    error = %e,
                    "Failed to record alert send."
                );
            }
        } else {
            warn!(
                rule_id = rule.id,
                server_id = report.server_id,
                "No channel accepted the alert; cooldown left untouched."
            );
        }

        Ok(RuleOutcome::Dispatched { delivered, failed })
    }

    async fn deliverable_channels(
        &self,
        rule_id: i32,
    ) -> Result<Vec<(i32, ChannelConfig)>, StoreError> {
        let channels = self.channels.get_channels_for_rule(rule_id).await?;
        Ok(channels
            .into_iter()
            .filter_map(|channel| match channel.config {
                Some(config) => Some((channel.id, config)),
                None => {
                    debug!(
                        rule_id,
                        channel_id = channel.id,
                        channel_type = %channel.channel_type,
                        "Skipping channel without a usable configuration."
                    );
                    None
                }
            })
            .collect())
    }
}

fn log_delivery_failure(rule_id: i32, server_id: i32, channel_id: i32, error: &NotificationError) {
    match error.sender_error() {
        Some(SenderError::Transport(e)) => {
            warn!(
                rule_id,
                server_id,
                channel_id,
                error = %e,
                "Alert delivery failed before reaching the destination."
            );
        }
        Some(sender_error) if sender_error.status().is_some() => {
            warn!(
                rule_id,
                server_id,
                channel_id,
                status = sender_error.status(),
                permanent = sender_error.is_permanent(),
                error = %sender_error,
                "Destination rejected alert delivery."
            );
        }
        _ => {
            warn!(rule_id, server_id, channel_id, error = %error, "Alert delivery failed.");
        }
    }
}
