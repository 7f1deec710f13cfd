mod common;

use chrono::Duration;

use common::{Harness, START, WEBHOOK, cpu_rule, report};
use fleetwatch::alerting::models::CooldownPolicy;
use fleetwatch::alerting::stores::{CooldownStore, SettingsStore};
use fleetwatch::notifications::models::ChannelConfig;

fn field<'a>(message: &'a fleetwatch::notifications::message::AlertMessage, name: &str) -> &'a str {
    message
        .embed
        .as_ref()
        .and_then(|e| e.fields.iter().find(|f| f.name == name))
        .map(|f| f.value.as_str())
        .unwrap_or_default()
}

#[tokio::test]
async fn first_breach_sends_and_records_state() {
    let h = Harness::new().await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;

    let summary = h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();

    assert_eq!(summary.rules_triggered, 1);
    assert_eq!(summary.notifications_delivered, 1);
    assert_eq!(h.sender.count(), 1);
    let (config, message) = h.sender.last().unwrap();
    assert_eq!(config, ChannelConfig::discord(WEBHOOK));
    assert_eq!(field(&message, "Value"), "95");
    assert_eq!(field(&message, "Threshold"), "> 90");
    assert_eq!(field(&message, "Server"), "node-1");

    let state = h.cooldowns.get_state(rule_id, 1).await.unwrap().unwrap();
    assert_eq!(state.last_value, 95.0);
    assert_eq!(state.last_sent_at, START);
}

#[tokio::test]
async fn repeat_within_cooldown_is_suppressed() {
    let h = Harness::new().await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;
    h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();

    h.clock.advance(Duration::seconds(60));
    let summary = h.evaluation.evaluate(&report(1, &[("cpu", 96.0)])).await.unwrap();

    assert_eq!(summary.rules_suppressed, 1);
    assert_eq!(h.sender.count(), 1);
    let state = h.cooldowns.get_state(rule_id, 1).await.unwrap().unwrap();
    assert_eq!(state.last_value, 95.0);
    assert_eq!(state.last_sent_at, START);
}

#[tokio::test]
async fn breach_after_cooldown_sends_again() {
    let h = Harness::new().await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;
    h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();
    h.clock.advance(Duration::seconds(60));
    h.evaluation.evaluate(&report(1, &[("cpu", 96.0)])).await.unwrap();

    h.clock.advance(Duration::seconds(1801 - 60));
    h.evaluation.evaluate(&report(1, &[("cpu", 96.0)])).await.unwrap();

    assert_eq!(h.sender.count(), 2);
    let state = h.cooldowns.get_state(rule_id, 1).await.unwrap().unwrap();
    assert_eq!(state.last_value, 96.0);
    assert_eq!(state.last_sent_at, START + 1801);
}

#[tokio::test]
async fn channel_without_webhook_is_skipped_quietly() {
    let h = Harness::new().await;
    let mut form = cpu_rule(vec![1]);
    form.webhook = None;
    let (_, rule_id) = h.seed_rule(form).await;
    h.bind_raw_channel(rule_id, "discord", "{}").await;

    let summary = h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();

    assert_eq!(h.sender.count(), 0);
    assert_eq!(summary.rules_evaluated, 1);
    assert_eq!(summary.rules_triggered, 0);
    assert_eq!(summary.notifications_failed, 0);
    assert!(h.cooldowns.get_state(rule_id, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn global_switch_off_skips_rule_lookup() {
    let h = Harness::new().await;
    h.seed_rule(cpu_rule(vec![1])).await;
    h.settings.set_alerts_enabled(false).await.unwrap();

    for server_id in [1, 2, 3] {
        let summary = h
            .evaluation
            .evaluate(&report(server_id, &[("cpu", 99.0), ("ram", 99.0)]))
            .await
            .unwrap();
        assert_eq!(summary.rules_evaluated, 0);
    }

    assert_eq!(h.rules.calls(), 0);
    assert_eq!(h.sender.count(), 0);
    assert!(!h.settings.is_alerts_enabled().await.unwrap());
}

#[tokio::test]
async fn cooldown_is_tracked_per_server() {
    let h = Harness::new().await;
    h.seed_rule(cpu_rule(vec![1, 2])).await;

    h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();
    h.evaluation.evaluate(&report(2, &[("cpu", 95.0)])).await.unwrap();
    h.evaluation.evaluate(&report(1, &[("cpu", 97.0)])).await.unwrap();

    assert_eq!(h.sender.count(), 2);
}

#[tokio::test]
async fn untargeted_server_and_missing_metric_do_not_fire() {
    let h = Harness::new().await;
    h.seed_rule(cpu_rule(vec![1])).await;

    h.evaluation.evaluate(&report(2, &[("cpu", 99.0)])).await.unwrap();
    h.evaluation.evaluate(&report(1, &[("ram", 99.0)])).await.unwrap();
    h.evaluation.evaluate(&report(1, &[("cpu", 90.0)])).await.unwrap();

    assert_eq!(h.sender.count(), 0);
}

#[tokio::test]
async fn failed_delivery_marks_under_always_policy() {
    let h = Harness::new().await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;
    h.sender.fail_with(503);

    let summary = h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();

    assert_eq!(summary.notifications_failed, 1);
    assert!(h.cooldowns.get_state(rule_id, 1).await.unwrap().is_some());
    assert!(!h.cooldowns.can_send(rule_id, 1, 1800).await.unwrap());
}

#[tokio::test]
async fn failed_delivery_leaves_cooldown_open_under_on_success_policy() {
    let h = Harness::with_policy(CooldownPolicy::OnSuccess).await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;
    h.sender.fail_with(503);

    h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();
    h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])).await.unwrap();

    assert_eq!(h.sender.count(), 2);
    assert!(h.cooldowns.get_state(rule_id, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn deliveries_to_bound_channels_run_concurrently() {
    let h = Harness::new().await;
    let (_, rule_id) = h.seed_rule(cpu_rule(vec![1])).await;
    for n in 2..=3 {
        let config = format!(r#"{{"webhook":"https://discord.test/api/webhooks/{n}/token"}}"#);
        h.bind_raw_channel(rule_id, "discord", &config).await;
    }
    h.sender.hold_until_concurrent(3);

    let summary = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        h.evaluation.evaluate(&report(1, &[("cpu", 95.0)])),
    )
    .await
    .expect("sends to all three channels were in flight together")
    .unwrap();

    assert_eq!(summary.notifications_delivered, 3);
    assert_eq!(h.sender.count(), 3);
    let state = h.cooldowns.get_state(rule_id, 1).await.unwrap().unwrap();
    assert_eq!(state.last_sent_at, START);
}

#[tokio::test]
async fn spawned_evaluation_completes_in_background() {
    let h = Harness::new().await;
    h.seed_rule(cpu_rule(vec![1])).await;

    h.evaluation
        .spawn_evaluation(report(1, &[("cpu", 95.0)]))
        .await
        .unwrap();

    assert_eq!(h.sender.count(), 1);
}

#[tokio::test]
async fn non_positive_server_id_is_rejected() {
    let h = Harness::new().await;
    assert!(h.evaluation.evaluate(&report(0, &[("cpu", 95.0)])).await.is_err());
    assert_eq!(h.rules.calls(), 0);
}
