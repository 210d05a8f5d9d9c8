use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use finsight::api::{ApiClient, ApiError, FinanceBackend, ListQuery};
use finsight::chat::{ChatSession, SendOutcome, ERROR_REPLY, MAX_SUGGESTIONS};
use finsight::credentials::{Credentials, MemoryCredentialStore};
use finsight::models::{Id, InvestmentInput, InvestmentType, LoginRequest};
use finsight::notify::{NotificationRelay, Severity};
use finsight::session::{SessionEvent, SessionGuard, SESSION_EXPIRED_MESSAGE};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    client: ApiClient,
    relay: NotificationRelay,
    session: Arc<SessionGuard>,
    credentials: Arc<MemoryCredentialStore>,
}

async fn signed_in() -> Result<Harness> {
    let server = MockServer::start().await;
    let relay = NotificationRelay::default();
    let credentials = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        SecretString::from("tok-123"),
        None,
    )));
    let session = Arc::new(SessionGuard::new(credentials.clone()).with_relay(relay.clone()));
    assert!(session.restore().await?);
    let client = ApiClient::new(server.uri())?
        .with_session(session.clone())
        .with_relay(relay.clone());
    Ok(Harness {
        server,
        client,
        relay,
        session,
        credentials,
    })
}

#[tokio::test]
async fn requests_carry_bearer_token() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("GET"))
        .and(path("/analytics/summary"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "net_worth": 150000.5,
            "total_income": 90000,
            "total_expenses": 30000,
            "total_investments": 60000,
            "savings_rate": 66.7,
            "monthly_cash_flow": 60000
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let summary = h.client.financial_summary().await?;
    assert_eq!(summary.net_worth, 150000.5);
    assert_eq!(summary.total_loans, None);
    assert!(h.relay.is_empty());
    Ok(())
}

#[tokio::test]
async fn unauthorized_expires_session_once() -> Result<()> {
    let h = signed_in().await?;
    let mut events = h.session.subscribe();
    for endpoint in ["/finance/investments", "/finance/loans"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
            )
            .mount(&h.server)
            .await;
    }

    let (investments, loans) = tokio::join!(
        FinanceBackend::investments(&h.client),
        FinanceBackend::loans(&h.client),
    );

    assert!(investments.unwrap_err().is_unauthorized());
    assert!(loans.unwrap_err().is_unauthorized());
    assert!(!h.session.is_signed_in());
    assert!(h.session.is_expired());
    assert!(h.credentials.is_empty());

    let active = h.relay.active();
    assert_eq!(active.len(), 1, "one notice per expiry: {active:?}");
    assert_eq!(active[0].message, SESSION_EXPIRED_MESSAGE);
    assert_eq!(events.try_recv()?, SessionEvent::Expired);
    assert!(events.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn failed_login_is_an_ordinary_error() -> Result<()> {
    let server = MockServer::start().await;
    let relay = NotificationRelay::default();
    let session = Arc::new(SessionGuard::new(Arc::new(MemoryCredentialStore::new())));
    let client = ApiClient::new(server.uri())?
        .with_session(session.clone())
        .with_relay(relay.clone());
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "a@example.com", "password": "wrong"})))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client
        .login(&LoginRequest {
            email: "a@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!session.is_expired());
    assert_eq!(relay.active()[0].message, "Invalid credentials");
    Ok(())
}

#[tokio::test]
async fn error_messages_are_extracted_and_forwarded() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("DELETE"))
        .and(path("/finance/investments/inv-9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Investment not found"})),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance/goals"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&h.server)
        .await;

    let err = h.client.delete_investment(&Id::new("inv-9")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 404,
            message: "Investment not found".into()
        }
    );

    let err = h.client.list_goals(&ListQuery::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(502));

    let messages: Vec<_> = h.relay.active().into_iter().map(|n| n.message).collect();
    assert_eq!(
        messages,
        vec![
            "Investment not found".to_string(),
            "Request failed with status code 502".to_string()
        ]
    );
    assert!(h.relay.active().iter().all(|n| n.severity == Severity::Error));
    Ok(())
}

#[tokio::test]
async fn quiet_client_does_not_notify() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("GET"))
        .and(path("/finance/loans"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .mount(&h.server)
        .await;

    let err = FinanceBackend::loans(&h.client.quiet()).await.unwrap_err();
    assert_eq!(err.user_message(), "db down");
    assert!(h.relay.is_empty());
    Ok(())
}

#[tokio::test]
async fn slow_responses_time_out() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("GET"))
        .and(path("/analytics/investments"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&h.server)
        .await;

    let client = h.client.clone().with_timeout(Duration::from_millis(100));
    let err = client.investment_analytics().await.unwrap_err();
    assert_eq!(err, ApiError::Timeout);
    assert!(err.is_background_safe());
    Ok(())
}

#[tokio::test]
async fn dashboard_reads_send_their_query_parameters() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("GET"))
        .and(path("/finance/expenses"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "e1", "category": "food", "amount": 500, "date": "2024-01-01T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analytics/expenses"))
        .and(query_param("months", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "category_breakdown": {"food": 500, "rent": 20000},
            "monthly_trend": [{"month": 1, "amount": 20500}]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance/income"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&h.server)
        .await;

    let expenses = FinanceBackend::recent_expenses(&h.client, 10).await?;
    assert_eq!(expenses[0].id.as_str(), "e1");
    assert_eq!(expenses[0].date, Some(support_date(2024, 1, 1)));

    let analytics = FinanceBackend::expense_analytics(&h.client, 6).await?;
    assert_eq!(analytics.category_breakdown["rent"], 20000.0);

    assert!(FinanceBackend::recent_income(&h.client, 10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_investment_posts_wire_shape() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("POST"))
        .and(path("/finance/investments"))
        .and(body_partial_json(json!({
            "type": "mutual_fund",
            "name": "Index fund",
            "amount": 10000.0,
            "date": "2024-02-01"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "inv-1",
            "type": "mutual_fund",
            "name": "Index fund",
            "amount": 10000,
            "date": "2024-02-01"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let created = h
        .client
        .create_investment(&InvestmentInput {
            kind: InvestmentType::MutualFund,
            name: "Index fund".into(),
            amount: 10_000.0,
            current_value: None,
            date: support_date(2024, 2, 1),
            goal: None,
            description: None,
        })
        .await?;
    assert_eq!(created.id.as_str(), "inv-1");
    assert_eq!(created.current_value(), 10_000.0);
    Ok(())
}

#[tokio::test]
async fn chat_session_keeps_transcript() -> Result<()> {
    let h = signed_in().await?;
    Mock::given(method("POST"))
        .and(path("/chat/message"))
        .and(body_json(json!({"message": "How much did I spend?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "You spent 20,500 this month.",
            "context_used": true,
            "suggestions": ["Show my budget"]
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/message"))
        .and(body_json(json!({"message": "break"})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat/suggestions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggestions": ["a", "b", "c", "d", "e", "f", "g", "h"]
        })))
        .mount(&h.server)
        .await;

    let chat = ChatSession::new(h.client.quiet());
    assert_eq!(chat.transcript().len(), 1);
    assert_eq!(chat.send("   ").await, SendOutcome::Ignored);

    let SendOutcome::Replied(reply) = chat.send("How much did I spend?").await else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, "You spent 20,500 this month.");
    assert_eq!(reply.suggestions, vec!["Show my budget".to_string()]);

    let SendOutcome::Replied(reply) = chat.send("break").await else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, ERROR_REPLY);
    assert!(reply.failed);

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 5);
    assert!(!chat.is_pending());

    assert_eq!(chat.suggestions().await.len(), MAX_SUGGESTIONS);
    Ok(())
}

fn support_date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
