use anyhow::Result;
use chrono::NaiveDate;
use gym_pulse::adapters::{FixedClock, InMemoryMemberStore, InMemoryReminderStore, WebhookDeliverySink};
use gym_pulse::config::{build_sink, GymConfig};
use gym_pulse::domain::model::{DeliveryStatus, Recipient};
use gym_pulse::domain::ports::DeliverySink;
use gym_pulse::{EngineSettings, GymError, LifecycleEngine, Member, MembershipPlan};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use std::time::Duration;

fn recipient() -> Recipient {
    Recipient {
        member_id: 21,
        name: "Nisha".to_string(),
        phone: "9876500021".to_string(),
    }
}

/// 供應商回傳 request_id 時沿用為 message id
#[tokio::test]
async fn test_webhook_posts_json_with_bearer_token() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/sms")
                .header("authorization", "Bearer tok-123")
                .json_body_partial(r#"{"to": "9876500021", "member_id": 21}"#);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"request_id": "req-778"}));
        })
        .await;

    let sink = WebhookDeliverySink::new(
        server.url("/sms"),
        Some("tok-123".to_string()),
        Duration::from_secs(5),
    )?;
    let receipt = sink.send(&recipient(), "Gym closed tomorrow").await?;

    mock.assert_async().await;
    assert_eq!(receipt.message_id, "req-778");
    assert_eq!(receipt.status, DeliveryStatus::Sent);
    Ok(())
}

#[tokio::test]
async fn test_webhook_error_status_is_delivery_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sms");
            then.status(503).body("provider down");
        })
        .await;

    let sink = WebhookDeliverySink::new(server.url("/sms"), None, Duration::from_secs(5))?;
    match sink.send(&recipient(), "hello").await {
        Err(GymError::DeliveryError { member_id, message }) => {
            assert_eq!(member_id, 21);
            assert!(message.contains("503"));
            assert!(message.contains("provider down"));
        }
        other => panic!("expected DeliveryError, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_configured_webhook_drives_reminders() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/notify");
            then.status(202);
        })
        .await;

    let config = GymConfig::from_toml_str(&format!(
        "[delivery]\nprovider = \"webhook\"\nendpoint = \"{}\"\n",
        server.url("/notify")
    ))?;
    let sink = build_sink(&config)?;

    let member = Member {
        id: 21,
        name: "Nisha".to_string(),
        phone: "9876500021".to_string(),
        membership_plan: MembershipPlan::Cardio,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 12),
        duration_months: 1,
        amount_paid: Decimal::new(99900, 2),
    };
    let engine = LifecycleEngine::new(
        InMemoryMemberStore::new(vec![member]),
        FixedClock::new(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
        sink,
        InMemoryReminderStore::new(),
        EngineSettings::default(),
    );

    engine.send_reminder(21).await?;
    engine.send_reminder(21).await?;

    mock.assert_hits_async(1).await;
    Ok(())
}
