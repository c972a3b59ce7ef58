/// End-to-end ranking with a mocked chat-completion backend
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use client_priority_engine::aggregator::SignalAggregator;
use client_priority_engine::coordinator::{RankingCoordinator, RankingPath};
use client_priority_engine::llm::ChatClient;
use client_priority_engine::models::{
    ClientRecord, ContactEvent, GoalProgress, OrderRecord, SuggestedAction, Urgency,
};
use client_priority_engine::reranker::LlmReranker;
use client_priority_engine::sources::{InMemoryCrm, SignalSources};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADVISOR: u128 = 0xA0;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

fn client(n: u128, assets: f64) -> ClientRecord {
    ClientRecord {
        id: Uuid::from_u128(n),
        name: format!("Client {}", n),
        total_assets: Some(assets),
        kyc_expiry_date: None,
        date_of_birth: None,
    }
}

/// Four clients needing attention and one that does not.
fn crm() -> InMemoryCrm {
    let advisor = Uuid::from_u128(ADVISOR);
    let touched = |n: u128, days: i64| ContactEvent {
        client_id: Uuid::from_u128(n),
        timestamp: now() - ChronoDuration::days(days),
    };

    let mut kyc = client(1, 900_000.0);
    kyc.kyc_expiry_date = NaiveDate::from_ymd_opt(2026, 10, 1);
    let mut birthday = client(4, 50_000.0);
    birthday.date_of_birth = NaiveDate::from_ymd_opt(1970, 10, 20);

    InMemoryCrm::new()
        .with_client(advisor, kyc)
        .with_client(advisor, client(2, 300_000.0))
        .with_client(advisor, client(3, 1_500_000.0))
        .with_client(advisor, birthday)
        .with_client(advisor, client(5, 10.0))
        .with_activity(touched(1, 10))
        .with_activity(touched(2, 95))
        .with_communication(touched(3, 5))
        .with_activity(touched(4, 2))
        .with_communication(touched(5, 1))
        .with_goal(GoalProgress {
            client_id: Uuid::from_u128(3),
            current_amount: 100_000.0,
            target_amount: 1_000_000.0,
            status: "active".to_string(),
        })
        .with_order(OrderRecord {
            client_id: Uuid::from_u128(3),
            status: "pending".to_string(),
        })
}

fn coordinator(chat_url: Option<String>, ai_timeout: Duration) -> RankingCoordinator {
    let aggregator = SignalAggregator::new(
        SignalSources::from_backend(Arc::new(crm())),
        Duration::from_secs(2),
    );

    let reranker = chat_url.map(|url| {
        let client = ChatClient::new("sk-test".to_string(), url, "gpt-4o".to_string()).unwrap();
        Box::new(LlmReranker::new(client)) as Box<dyn client_priority_engine::reranker::Reranker>
    });

    RankingCoordinator::new(aggregator, reranker, ai_timeout)
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

async fn mock_chat(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

async fn deterministic_json() -> String {
    let ranking = coordinator(None, Duration::from_secs(1))
        .rank(Uuid::from_u128(ADVISOR), now())
        .await
        .unwrap();
    serde_json::to_string(&ranking).unwrap()
}

#[tokio::test]
async fn test_deterministic_ranking_orders_clients() {
    let report = coordinator(None, Duration::from_secs(1))
        .rank_with_report(Uuid::from_u128(ADVISOR), now())
        .await
        .unwrap();

    assert_eq!(report.path, RankingPath::Deterministic);
    let ids: Vec<Uuid> = report
        .ranking
        .prioritized_clients
        .iter()
        .map(|c| c.client_id)
        .collect();

    // 3: orders + 90% goal shortfall = 45, 1: KYC expired = 40,
    // 2: dormant = 35, 4: birthday = 15
    assert_eq!(
        ids,
        vec![
            Uuid::from_u128(3),
            Uuid::from_u128(1),
            Uuid::from_u128(2),
            Uuid::from_u128(4)
        ]
    );

    let top = &report.ranking.prioritized_clients[0];
    assert_eq!(top.priority_score, 45);
    assert_eq!(top.suggested_action, SuggestedAction::ProcessOrders);
    assert_eq!(top.reason, "Goal 90% behind target");
    assert_eq!(top.urgency, Urgency::High);

    let birthday = &report.ranking.prioritized_clients[3];
    assert_eq!(birthday.reason, "Birthday in 2 days");
    assert_eq!(birthday.suggested_action, SuggestedAction::SendBirthdayWishes);
}

#[tokio::test]
async fn test_ai_ranking_wrapped_in_prose_is_used() {
    let server = MockServer::start().await;
    let content = format!(
        "Here is my ranking:\n```json\n{}\n```\nHope this helps!",
        json!([
            {
                "client_id": Uuid::from_u128(2).to_string(),
                "priority_score": 88,
                "reason": "Dormant for three months",
                "suggested_action": "Schedule call",
                "urgency": "high"
            },
            {
                "client_id": Uuid::from_u128(1).to_string(),
                "priority_score": 80,
                "reason": "KYC lapsed",
                "suggested_action": "Update KYC",
                "urgency": "critical"
            },
            {
                "client_id": Uuid::from_u128(777).to_string(),
                "priority_score": 99,
                "reason": "Not a real client",
                "suggested_action": "Schedule call",
                "urgency": "high"
            }
        ])
    );
    mock_chat(&server, ResponseTemplate::new(200).set_body_json(chat_reply(&content))).await;

    let report = coordinator(
        Some(format!("{}/v1/chat/completions", server.uri())),
        Duration::from_secs(5),
    )
    .rank_with_report(Uuid::from_u128(ADVISOR), now())
    .await
    .unwrap();

    assert_eq!(report.path, RankingPath::Ai);
    let clients = &report.ranking.prioritized_clients;
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].client_id, Uuid::from_u128(2));
    assert_eq!(clients[0].client_name, "Client 2");
    assert_eq!(clients[0].priority_score, 88);
    assert_eq!(clients[1].urgency, Urgency::Critical);
}

#[tokio::test]
async fn test_malformed_ai_reply_falls_back_identically() {
    let server = MockServer::start().await;
    mock_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_reply("[{\"client_id\": ")),
    )
    .await;

    let ranking = coordinator(
        Some(format!("{}/v1/chat/completions", server.uri())),
        Duration::from_secs(5),
    )
    .rank(Uuid::from_u128(ADVISOR), now())
    .await
    .unwrap();

    assert_eq!(serde_json::to_string(&ranking).unwrap(), deterministic_json().await);
}

#[tokio::test]
async fn test_empty_ai_array_falls_back_identically() {
    let server = MockServer::start().await;
    mock_chat(&server, ResponseTemplate::new(200).set_body_json(chat_reply("[]"))).await;

    let ranking = coordinator(
        Some(format!("{}/v1/chat/completions", server.uri())),
        Duration::from_secs(5),
    )
    .rank(Uuid::from_u128(ADVISOR), now())
    .await
    .unwrap();

    assert_eq!(serde_json::to_string(&ranking).unwrap(), deterministic_json().await);
}

#[tokio::test]
async fn test_server_error_falls_back_identically() {
    let server = MockServer::start().await;
    mock_chat(&server, ResponseTemplate::new(500).set_body_string("overloaded")).await;

    let report = coordinator(
        Some(format!("{}/v1/chat/completions", server.uri())),
        Duration::from_secs(5),
    )
    .rank_with_report(Uuid::from_u128(ADVISOR), now())
    .await
    .unwrap();

    assert_eq!(report.path, RankingPath::Deterministic);
    assert_eq!(
        serde_json::to_string(&report.ranking).unwrap(),
        deterministic_json().await
    );
}

#[tokio::test]
async fn test_slow_ai_times_out_and_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("[]"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let report = coordinator(
        Some(format!("{}/v1/chat/completions", server.uri())),
        Duration::from_millis(300),
    )
    .rank_with_report(Uuid::from_u128(ADVISOR), now())
    .await
    .unwrap();

    assert_eq!(report.path, RankingPath::Deterministic);
    assert_eq!(
        serde_json::to_string(&report.ranking).unwrap(),
        deterministic_json().await
    );
}
