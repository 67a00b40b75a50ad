//! Session client tests against an in-process mock of the provider API.

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};

use cgd_archiver_core::{CgdClient, Error};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn login_single() -> Json<Value> {
    Json(json!({
        "customerName": "Jane Doe",
        "accounts": [{
            "fullAccountKey": "0001.000123",
            "iban": "PT50000000000000000000001",
            "description": "Conta à ordem",
            "accountType": "DDA"
        }]
    }))
}

fn tx(id: &str, amount: i64) -> Value {
    json!({
        "transactionId": id,
        "amount": amount,
        "transactionType": "Debit",
        "bookDate": "2024-01-02",
        "valueDate": "2024-01-02",
        "description": "coffee"
    })
}

async fn transactions_page(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(
        params.get("fromBookDate").map(String::as_str),
        Some("2000-01-01")
    );
    assert_eq!(params.get("sort").map(String::as_str), Some("+bookDate"));
    match params.get("pageKey").map(String::as_str) {
        None => Json(json!({
            "nextPageKey": "page-2",
            "transactions": [tx("t-1", 1000), tx("t-2", 250)]
        })),
        Some("page-2") => Json(json!({
            "nextPageKey": null,
            "transactions": [tx("t-3", 799)]
        })),
        Some(other) => panic!("unexpected pageKey {other}"),
    }
}

async fn transaction_details(Path((_key, id)): Path<(String, String)>) -> Json<Value> {
    Json(json!({"extendedDescription": format!("details of {id}")}))
}

#[tokio::test]
async fn test_login_and_balance() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/accounts/:key/balances",
            get(|| async {
                Json(json!({
                    "accountBalancesList": [{"bookBalance": 12345, "currency": "EUR"}]
                }))
            }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    assert!(!client.account().full_account_key.is_empty());

    let balance = client.account_balance().await.unwrap();
    assert_eq!(balance.account_balances_list.len(), 1);
    assert_eq!(balance.account_balances_list[0].currency, "EUR");
    assert_eq!(balance.account_balances_list[0].book_balance, 12345);
}

#[tokio::test]
async fn test_login_rejects_multiple_accounts() {
    let app = Router::new().route(
        "/system/security/authentications/basic",
        post(|| async {
            Json(json!({
                "customerName": "Jane Doe",
                "accounts": [
                    {"fullAccountKey": "a", "iban": "x", "description": "one", "accountType": "DDA"},
                    {"fullAccountKey": "b", "iban": "y", "description": "two", "accountType": "DDA"}
                ]
            }))
        }),
    );
    let base = serve(app).await;

    let err = CgdClient::login(&base, "user", "pass").await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedAccount { count: 2 }));
}

#[tokio::test]
async fn test_login_surfaces_auth_failure() {
    let app = Router::new().route(
        "/system/security/authentications/basic",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad credentials") }),
    );
    let base = serve(app).await;

    let err = CgdClient::login(&base, "user", "wrong").await.unwrap_err();
    match err {
        Error::Auth { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad credentials"));
        }
        other => panic!("expected Auth error, got {other}"),
    }
}

#[tokio::test]
async fn test_transactions_paginate_and_enrich() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/accounts/:key/transactions",
            get(transactions_page),
        )
        .route(
            "/business/accounts/:key/transactions/:id",
            get(transaction_details),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    let records: Vec<Value> = client
        .transactions()
        .map(|record| record.unwrap())
        .collect()
        .await;

    let ids: Vec<&str> = records
        .iter()
        .map(|record| record["transactionId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["t-1", "t-2", "t-3"]);
    for record in &records {
        let id = record["transactionId"].as_str().unwrap();
        assert_eq!(
            record["details"]["extendedDescription"],
            format!("details of {id}")
        );
    }
}

#[tokio::test]
async fn test_transactions_end_without_next_page_key() {
    // The last-page marker may be a missing field rather than an explicit null.
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/accounts/:key/transactions",
            get(|| async { Json(json!({"transactions": [tx("t-9", 42)]})) }),
        )
        .route(
            "/business/accounts/:key/transactions/:id",
            get(transaction_details),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    let mut stream = client.transactions();
    let record = stream.next().await.unwrap().unwrap();
    assert_eq!(record["transactionId"], "t-9");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_transactions_reject_pre_enriched_record() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/accounts/:key/transactions",
            get(|| async {
                let mut record = tx("t-1", 100);
                record["details"] = json!({});
                Json(json!({"nextPageKey": null, "transactions": [record]}))
            }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    let mut stream = client.transactions();
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Invariant { .. }));
}

#[tokio::test]
async fn test_documents_use_configured_minimum_date() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/documents/configurations",
            get(|| async { Json(json!({"minimumDate": "2023-05-01T00:00:00Z"})) }),
        )
        .route(
            "/business/documents",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(
                    params.get("fromDate").map(String::as_str),
                    Some("2023-05-01T00:00:00Z")
                );
                Json(json!({
                    "nextPageKey": null,
                    "documents": [{
                        "documentId": "d-1",
                        "issueDate": "2024-02-03T00:00:00Z",
                        "name": "statement"
                    }]
                }))
            }),
        )
        .route(
            "/business/documents/:id/contents",
            get(|Path(id): Path<String>| async move {
                Json(json!({"documentContents": format!("payload-{id}")}))
            }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    let records: Vec<Value> = client
        .documents()
        .map(|record| record.unwrap())
        .collect()
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["documentId"], "d-1");
    assert_eq!(records[0]["contents"], "payload-d-1");
}

#[tokio::test]
async fn test_api_error_surfaces_status_and_body() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/business/accounts/:key/balances",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    let err = client.account_balance().await.unwrap_err();
    match err {
        Error::Api {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, "get_account_balance");
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected Api error, got {other}"),
    }
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/system/security/authentications/current",
            delete(|| async { Json(json!({})) }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_logout_failure_still_releases_the_handle() {
    let app = Router::new()
        .route("/system/security/authentications/basic", post(login_single))
        .route(
            "/system/security/authentications/current",
            delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "session gone") }),
        );
    let base = serve(app).await;

    let client = CgdClient::login(&base, "user", "pass").await.unwrap();
    // logout consumes the client, so the handle is gone whether or not the
    // server-side invalidation succeeded.
    let err = client.logout().await.unwrap_err();
    assert!(matches!(err, Error::Auth { status: 500, .. }));
}
