#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

use fleetwatch::alerting::clock::{Clock, ManualClock};
use fleetwatch::alerting::evaluation_service::EvaluationService;
use fleetwatch::alerting::models::{ActiveRule, CooldownPolicy, MetricsReport};
use fleetwatch::alerting::stores::{RuleStore, StoreError};
use fleetwatch::db::entities::{alert_channel, alert_rule_channel};
use fleetwatch::db::services::{
    AlertService, ChannelService, CooldownService, RuleService, SettingsService,
};
use fleetwatch::db::{self, schema};
use fleetwatch::notifications::message::AlertMessage;
use fleetwatch::notifications::models::ChannelConfig;
use fleetwatch::notifications::senders::{NotificationSender, SenderError};
use fleetwatch::notifications::service::NotificationService;
use fleetwatch::web::AppState;
use fleetwatch::web::models::alert_models::{CreateAlertRequest, SaveRuleRequest};

pub const START: i64 = 1_700_000_000;
pub const WEBHOOK: &str = "https://discord.test/api/webhooks/1/token";

pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = db::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    schema::create_schema(&db).await.expect("schema");
    Arc::new(db)
}

/// Captures every message instead of calling out. Optionally fails, and can
/// hold each send at a barrier until enough sends are in flight together.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(ChannelConfig, AlertMessage)>>,
    pub fail_with_status: Mutex<Option<u16>>,
    pub gate: Mutex<Option<Arc<Barrier>>>,
}

impl RecordingSender {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(ChannelConfig, AlertMessage)> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn fail_with(&self, status: u16) {
        *self.fail_with_status.lock().unwrap() = Some(status);
    }

    /// Every send waits until `in_flight` sends have reached it.
    pub fn hold_until_concurrent(&self, in_flight: usize) {
        *self.gate.lock().unwrap() = Some(Arc::new(Barrier::new(in_flight)));
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(
        &self,
        config: &ChannelConfig,
        message: &AlertMessage,
    ) -> Result<(), SenderError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }
        self.sent
            .lock()
            .unwrap()
            .push((config.clone(), message.clone()));
        match *self.fail_with_status.lock().unwrap() {
            Some(status) => Err(SenderError::RemoteServer {
                status,
                body: "down".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Wraps the real rule store and counts lookups.
pub struct CountingRules {
    pub inner: RuleService,
    pub calls: AtomicUsize,
}

impl CountingRules {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuleStore for CountingRules {
    async fn get_active_rules_for_server(
        &self,
        server_id: i32,
    ) -> Result<Vec<ActiveRule>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_active_rules_for_server(server_id).await
    }
}

pub struct Harness {
    pub db: Arc<DatabaseConnection>,
    pub clock: Arc<ManualClock>,
    pub sender: Arc<RecordingSender>,
    pub rules: Arc<CountingRules>,
    pub alerts: Arc<AlertService>,
    pub channels: Arc<ChannelService>,
    pub cooldowns: Arc<CooldownService>,
    pub settings: Arc<SettingsService>,
    pub notifications: Arc<NotificationService>,
    pub evaluation: Arc<EvaluationService>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_policy(CooldownPolicy::Always).await
    }

    pub async fn with_policy(policy: CooldownPolicy) -> Self {
        let db = setup_db().await;
        let clock = Arc::new(ManualClock::at_unix(START));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let sender = Arc::new(RecordingSender::default());

        let rules = Arc::new(CountingRules {
            inner: RuleService::new(db.clone()),
            calls: AtomicUsize::new(0),
        });
        let channels = Arc::new(ChannelService::new(db.clone()));
        let cooldowns = Arc::new(CooldownService::new(db.clone(), dyn_clock.clone()));
        let settings = Arc::new(SettingsService::new(db.clone()));
        let notifications = Arc::new(NotificationService::with_senders(
            channels.clone(),
            dyn_clock.clone(),
            sender.clone(),
        ));
        let evaluation = Arc::new(
            EvaluationService::new(
                rules.clone(),
                channels.clone(),
                cooldowns.clone(),
                settings.clone(),
                notifications.clone(),
                dyn_clock,
            )
            .with_policy(policy),
        );

        Self {
            alerts: Arc::new(AlertService::new(db.clone())),
            db,
            clock,
            sender,
            rules,
            channels,
            cooldowns,
            settings,
            notifications,
            evaluation,
        }
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            db: self.db.clone(),
            evaluation_service: self.evaluation.clone(),
            notification_service: self.notifications.clone(),
            alert_service: self.alerts.clone(),
            channel_service: self.channels.clone(),
            cooldown_service: self.cooldowns.clone(),
            settings_service: self.settings.clone(),
        })
    }

    pub async fn create_alert(&self) -> i32 {
        self.alerts
            .create_alert(CreateAlertRequest {
                title: "Fleet health".into(),
                description: None,
                enabled: Some(true),
            })
            .await
            .expect("create alert")
            .id
    }

    /// Creates an enabled alert with one rule bound to `server_ids` and the
    /// default webhook. Returns (alert_id, rule_id).
    pub async fn seed_rule(&self, form: SaveRuleRequest) -> (i32, i32) {
        let alert_id = self.create_alert().await;
        let rule = self
            .alerts
            .save_rule(alert_id, None, form)
            .await
            .expect("save rule");
        (alert_id, rule.id)
    }

    /// Binds a channel row with an arbitrary stored configuration.
    pub async fn bind_raw_channel(
        &self,
        rule_id: i32,
        channel_type: &str,
        config_json: &str,
    ) -> i32 {
        let now = Utc::now();
        let channel = alert_channel::ActiveModel {
            channel_type: Set(channel_type.to_string()),
            name: Set("raw".to_string()),
            config_json: Set(config_json.to_string()),
            enabled: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("insert channel");
        alert_rule_channel::ActiveModel {
            rule_id: Set(rule_id),
            channel_id: Set(channel.id),
        }
        .insert(&*self.db)
        .await
        .expect("bind channel");
        channel.id
    }
}

pub fn cpu_rule(server_ids: Vec<i32>) -> SaveRuleRequest {
    SaveRuleRequest {
        metric: "cpu".into(),
        operator: ">".into(),
        threshold: 90.0,
        cooldown_seconds: Some(1800),
        title: None,
        description: None,
        color: None,
        mentions: None,
        server_ids,
        webhook: Some(WEBHOOK.into()),
    }
}

pub fn report(server_id: i32, metrics: &[(&str, f64)]) -> MetricsReport {
    let metrics: HashMap<String, f64> = metrics
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();
    MetricsReport::new(server_id, format!("node-{server_id}"), "10.0.0.7", metrics)
}
