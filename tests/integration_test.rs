//! End-to-end checks against a running server.
//!
//! Expects the service at `BASE_URL` (default `http://localhost:8080`) with
//! `API_USERS` containing `TEST_USER:TEST_PASSWORD` (default `alice:s3cret`).

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Statistics {
    total_count: u64,
    average_flowrate: f64,
    type_distribution: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    batch_id: i64,
    filename: String,
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    id: i64,
    filename: String,
    uploaded_at: DateTime<Utc>,
    equipment_count: i64,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

fn credentials() -> (String, String) {
    // ---
    (
        std::env::var("TEST_USER").unwrap_or_else(|_| "alice".into()),
        std::env::var("TEST_PASSWORD").unwrap_or_else(|_| "s3cret".into()),
    )
}

async fn upload(client: &Client, filename: &str, csv: &str) -> Result<reqwest::Response> {
    // ---
    let (user, password) = credentials();
    let part = multipart::Part::bytes(csv.as_bytes().to_vec())
        .file_name(filename.to_string())
        .mime_str("text/csv")?;
    let form = multipart::Form::new().part("file", part);

    Ok(client
        .post(format!("{}/api/upload", base_url()))
        .basic_auth(user, Some(password))
        .multipart(form)
        .send()
        .await?)
}

#[tokio::test]
async fn upload_and_statistics_round_trip() -> Result<()> {
    // ---
    let client = Client::new();
    let csv = "name,type,flowrate,pressure,temperature\n\
               PumpA,Pump,10.5,200,80\n\
               PumpB,Pump,12.0,210,82\n\
               ValveA,Valve,0,150,25\n";

    let response = upload(&client, "plant.csv", csv).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: UploadResponse = response.json().await?;

    assert_eq!(created.filename, "plant.csv");
    assert_eq!(created.statistics.total_count, 3);
    assert!((created.statistics.average_flowrate - 7.5).abs() < 1e-9);
    assert_eq!(created.statistics.type_distribution["Pump"], 2);
    assert_eq!(created.statistics.type_distribution["Valve"], 1);

    let (user, password) = credentials();
    let stats: Value = client
        .get(format!("{}/api/batch/{}", base_url(), created.batch_id))
        .basic_auth(&user, Some(&password))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stats["statistics"]["total_count"], 3);

    let history: Vec<HistoryEntry> = client
        .get(format!("{}/api/upload", base_url()))
        .basic_auth(&user, Some(&password))
        .send()
        .await?
        .json()
        .await?;

    assert!(history.len() <= 5, "history must be capped at 5");
    let entry = history
        .iter()
        .find(|h| h.id == created.batch_id)
        .expect("fresh upload should be in recent history");
    assert_eq!(entry.equipment_count, 3);
    assert_eq!(entry.filename, "plant.csv");
    for pair in history.windows(2) {
        assert!(pair[0].uploaded_at >= pair[1].uploaded_at);
    }

    Ok(())
}

#[tokio::test]
async fn invalid_file_is_rejected_with_detail() -> Result<()> {
    // ---
    let client = Client::new();
    let csv = "name,type,flowrate,pressure,temperature\nPumpA,Pump,abc,200,80\n";

    let response = upload(&client, "bad.csv", csv).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert_eq!(body["kind"], "row_validation");
    assert_eq!(body["row_index"], 1);
    assert_eq!(body["field"], "flowrate");
    assert_eq!(body["reason"], "not_numeric");

    Ok(())
}

#[tokio::test]
async fn pdf_export_downloads() -> Result<()> {
    // ---
    let client = Client::new();
    let csv = "equipment_name,equipment_type,flowrate,pressure,temperature\nR1,Reactor,5,300,120\n";
    let created: UploadResponse = upload(&client, "reactor.csv", csv).await?.json().await?;

    let (user, password) = credentials();
    let response = client
        .get(format!("{}/api/export-pdf/{}", base_url(), created.batch_id))
        .basic_auth(user, Some(password))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.bytes().await?;
    assert!(bytes.starts_with(b"%PDF"));

    Ok(())
}

async fn history(client: &Client, limit: u32) -> Result<Vec<HistoryEntry>> {
    // ---
    let (user, password) = credentials();
    Ok(client
        .get(format!("{}/api/upload?limit={limit}", base_url()))
        .basic_auth(user, Some(password))
        .send()
        .await?
        .json()
        .await?)
}

#[tokio::test]
async fn history_orders_newest_first_with_id_tie_break() -> Result<()> {
    // ---
    let client = Client::new();
    let csv = "name,type,flowrate,pressure,temperature\nP1,Pump,1,2,3\n";

    let mut ids = Vec::new();
    for name in ["order-a.csv", "order-b.csv", "order-c.csv"] {
        let created: UploadResponse = upload(&client, name, csv).await?.json().await?;
        ids.push(created.batch_id);
    }

    let entries = history(&client, 100).await?;
    for pair in entries.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        assert!(
            newer.uploaded_at > older.uploaded_at
                || (newer.uploaded_at == older.uploaded_at && newer.id > older.id),
            "{} listed before {}",
            newer.id,
            older.id
        );
    }

    let positions: Vec<usize> = ids
        .iter()
        .map(|id| entries.iter().position(|e| e.id == *id))
        .collect::<Option<_>>()
        .expect("all three uploads listed");
    assert!(positions.windows(2).all(|w| w[0] > w[1]));

    Ok(())
}

#[tokio::test]
async fn rejected_upload_leaves_no_batch() -> Result<()> {
    // ---
    let client = Client::new();
    let filename = format!("rejected-{}.csv", Utc::now().timestamp_micros());
    let csv = "name,type,flowrate,pressure,temperature\nP1,Pump,1,2,3\nP2,Pump,x,2,3\n";

    let response = upload(&client, &filename, csv).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let entries = history(&client, 100).await?;
    assert!(entries.iter().all(|e| e.filename != filename));

    Ok(())
}
