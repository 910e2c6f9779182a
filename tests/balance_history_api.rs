//! End-to-end tests for the Stavky HTTP API
//!
//! Each test builds the full router over temporary SQLite databases and drives it
//! with `oneshot` requests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use stavky_backend::{
    auth::{AuthState, JwtHandler, UserRole, UserStore},
    clock::{FixedClock, SharedClock},
    create_router,
    storage::TipStore,
    AppState,
};

struct Harness {
    router: Router,
    tips_db: NamedTempFile,
    _auth_db: NamedTempFile,
}

impl Harness {
    fn new() -> Self {
        let tips_db = NamedTempFile::new().unwrap();
        let auth_db = NamedTempFile::new().unwrap();

        let user_store = UserStore::with_cost(auth_db.path().to_str().unwrap(), 4).unwrap();
        user_store
            .create_user("jana", "jana-password", UserRole::Customer)
            .unwrap();

        let clock: SharedClock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let auth = AuthState {
            user_store: Arc::new(user_store),
            jwt_handler: Arc::new(JwtHandler::new("integration-secret", clock.clone())),
            clock,
            default_activation_days: 30,
        };
        let tip_store = Arc::new(TipStore::new(tips_db.path().to_str().unwrap()).unwrap());
        let state = AppState::new(tip_store, auth, 1000.0, 12);

        Self {
            router: create_router(state),
            tips_db,
            _auth_db: auth_db,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn add_company(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/settings/betting-companies",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn add_tip(
        &self,
        token: &str,
        company_id: &str,
        date: &str,
        stake: f64,
        total_win: f64,
    ) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/betting-tips",
                Some(token),
                Some(json!({
                    "betting_company_id": company_id,
                    "sport": "Football",
                    "league": "Chance Liga",
                    "match": "Plzeň - Baník",
                    "odds": 1.5,
                    "stake": stake,
                    "total_win": total_win,
                    "match_date": date,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn settle(&self, token: &str, tip_id: &str, status: &str) {
        let (code, _) = self
            .send(
                "PATCH",
                &format!("/api/betting-tips/{tip_id}"),
                Some(token),
                Some(json!({ "status": status })),
            )
            .await;
        assert_eq!(code, StatusCode::OK);
    }

    fn raw_connection(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(self.tips_db.path()).unwrap()
    }
}

#[tokio::test]
async fn balance_history_requires_authentication() {
    let harness = Harness::new();

    let (status, body) = harness.send("GET", "/api/balance-history", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, body) = harness
        .send("GET", "/api/balance-history", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("companies").is_none());
}

#[tokio::test]
async fn balance_history_follows_the_ledger() {
    let harness = Harness::new();
    let admin = harness.login("admin", "admin123").await;

    let tipsport = harness.add_company(&admin, "Tipsport").await;
    let fortuna = harness.add_company(&admin, "Fortuna").await;

    // Inserted out of chronological order on purpose.
    let _pending = harness
        .add_tip(&admin, &tipsport, "2025-05-03T18:00:00Z", 100.0, 150.0)
        .await;
    let early = harness
        .add_tip(&admin, &tipsport, "2025-05-01T18:00:00Z", 50.0, 120.0)
        .await;
    let middle = harness
        .add_tip(&admin, &fortuna, "2025-05-02T18:00:00Z", 30.0, 45.0)
        .await;

    harness.settle(&admin, &early, "win").await;
    harness.settle(&admin, &middle, "loss").await;

    let jana = harness.login("jana", "jana-password").await;
    let (status, body) = harness
        .send("GET", "/api/balance-history", Some(&jana), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        body,
        json!({
            "companies": [
                {
                    "id": tipsport,
                    "name": "Tipsport",
                    "data": [
                        { "date": "2025-05-01T18:00:00.000Z", "balance": 1070.0, "profit": 70.0 },
                        { "date": "2025-05-03T18:00:00.000Z", "balance": 970.0, "profit": -100.0 }
                    ]
                },
                {
                    "id": fortuna,
                    "name": "Fortuna",
                    "data": [
                        { "date": "2025-05-02T18:00:00.000Z", "balance": 970.0, "profit": -30.0 }
                    ]
                }
            ],
            "combined": [
                { "date": "2025-05-01T18:00:00.000Z", "balance": 2070.0 },
                { "date": "2025-05-02T18:00:00.000Z", "balance": 2040.0 },
                { "date": "2025-05-03T18:00:00.000Z", "balance": 1940.0 }
            ]
        })
    );
}

#[tokio::test]
async fn orphaned_and_unstaked_tips_are_ignored() {
    let harness = Harness::new();
    let admin = harness.login("admin", "admin123").await;
    let tipsport = harness.add_company(&admin, "Tipsport").await;
    let fortuna = harness.add_company(&admin, "Fortuna").await;
    harness
        .add_tip(&admin, &tipsport, "2025-05-01T18:00:00Z", 100.0, 150.0)
        .await;
    let orphan = harness
        .add_tip(&admin, &fortuna, "2025-04-01T18:00:00Z", 500.0, 750.0)
        .await;
    harness.settle(&admin, &orphan, "loss").await;

    // Removing the company detaches its tips; a tip without a stake never counts.
    let conn = harness.raw_connection();
    conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
    conn.execute("DELETE FROM betting_companies WHERE id = ?1", [&fortuna])
        .unwrap();
    let detached: Option<String> = conn
        .query_row(
            "SELECT betting_company_id FROM betting_tips WHERE id = ?1",
            [&orphan],
            |row| row.get(0),
        )
        .unwrap();
    assert!(detached.is_none());
    conn.execute(
        "INSERT INTO betting_tips (id, betting_company_id, sport, league, match_name, odds,
                                   stake, total_win, match_date, status, created_at)
         VALUES ('free', ?1, 'Football', 'X', 'C - D', 1.5, NULL, NULL,
                 '2025-04-02T18:00:00+00:00', 'loss', '2025-04-01T00:00:00+00:00')",
        [&tipsport],
    )
    .unwrap();

    let (status, body) = harness
        .send("GET", "/api/balance-history", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companies"].as_array().unwrap().len(), 1);
    assert_eq!(body["companies"][0]["id"], tipsport.as_str());
    assert_eq!(
        body["companies"][0]["data"],
        json!([{ "date": "2025-05-01T18:00:00.000Z", "balance": 900.0, "profit": -100.0 }])
    );
    assert_eq!(
        body["combined"],
        json!([{ "date": "2025-05-01T18:00:00.000Z", "balance": 900.0 }])
    );
}

#[tokio::test]
async fn store_failure_returns_server_error() {
    let harness = Harness::new();
    let admin = harness.login("admin", "admin123").await;

    harness
        .raw_connection()
        .execute_batch("DROP TABLE betting_tips")
        .unwrap();

    let (status, body) = harness
        .send("GET", "/api/balance-history", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch betting tips" }));
}

#[tokio::test]
async fn subscription_gates_tips_and_history() {
    let harness = Harness::new();
    let admin = harness.login("admin", "admin123").await;
    let jana = harness.login("jana", "jana-password").await;

    let tipsport = harness.add_company(&admin, "Tipsport").await;
    harness
        .add_tip(&admin, &tipsport, "2025-06-02T18:00:00Z", 100.0, 150.0)
        .await;

    for uri in ["/api/betting-tips/active", "/api/history"] {
        let (status, body) = harness.send("GET", uri, Some(&jana), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["error"], "Subscription required");
    }

    let (status, body) = harness
        .send(
            "POST",
            "/api/users/activate",
            Some(&admin),
            Some(json!({ "username": "jana" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_active_until"], "2025-07-01T09:00:00+00:00");

    let (status, body) = harness
        .send("GET", "/api/betting-tips/active", Some(&jana), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = harness.send("GET", "/api/history", Some(&jana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"][0]["month"], "2025-06");
    assert_eq!(body["months"][0]["pending"], 1);
}

#[tokio::test]
async fn promotion_takes_effect_for_existing_token() {
    let harness = Harness::new();
    let admin = harness.login("admin", "admin123").await;
    let jana = harness.login("jana", "jana-password").await;

    let (status, _) = harness
        .send(
            "POST",
            "/api/settings/betting-companies",
            Some(&jana),
            Some(json!({ "name": "Tipsport" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = harness
        .send(
            "POST",
            "/api/users/set-betting-role",
            Some(&admin),
            Some(json!({ "username": "jana" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "betting");

    let (_, me) = harness.send("GET", "/api/auth/me", Some(&jana), None).await;
    assert_eq!(me["role"], "betting");

    let tipsport = harness.add_company(&jana, "Tipsport").await;
    let tip = harness
        .add_tip(&jana, &tipsport, "2025-06-02T18:00:00Z", 100.0, 150.0)
        .await;
    harness.settle(&jana, &tip, "win").await;

    let (status, body) = harness.send("GET", "/api/history", Some(&jana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"][0]["wins"], 1);
}
