use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use wikiwerk::Load;
use wikiwerk_ksql::{KsqlClient, KsqlLoad, DELIMITED_CONTENT_TYPE};

#[derive(Debug, Clone, Serialize)]
struct Row {
    title: String,
    size: i64,
}

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<String>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

async fn inserts(State(recorded): State<Recorded>, headers: HeaderMap, body: String) -> String {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    recorded.content_types.lock().unwrap().push(content_type);

    let rows = body.lines().count().saturating_sub(1);
    recorded.bodies.lock().unwrap().push(body);

    (0..rows)
        .map(|seq| format!("{{\"status\":\"ok\",\"seq\":{seq}}}\n"))
        .collect()
}

async fn rejecting_inserts() -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        "{\"@type\":\"generic_error\",\"error_code\":40000,\"message\":\"Cannot insert into stream\"}\n"
            .to_string(),
    )
}

async fn info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "KsqlServerInfo": {
            "version": "0.29.0",
            "kafkaClusterId": "cluster-1",
            "ksqlServiceId": "default_",
            "serverStatus": "RUNNING"
        }
    }))
}

/// Captures formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

async fn ksql_server() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/inserts-stream", post(inserts))
        .route("/info", get(info))
        .with_state(recorded.clone());
    (serve(app).await, recorded)
}

#[tokio::test]
async fn test_inserts_stream_sends_delimited_body() {
    let (base, recorded) = ksql_server().await;
    let client = KsqlClient::new(base).unwrap();

    let response = client
        .inserts_stream(
            "Wikipedia_STREAM",
            &[Row {
                title: "Test".to_string(),
                size: 120,
            }],
        )
        .await
        .expect("insert");

    assert!(response.is_success());
    assert_eq!(response.acks.len(), 1);
    assert_eq!(response.acks[0].seq, Some(0));

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        "{\"target\":\"Wikipedia_STREAM\"}\n{\"title\":\"Test\",\"size\":120}\n"
    );
    assert_eq!(recorded.content_types.lock().unwrap()[0], DELIMITED_CONTENT_TYPE);
}

#[tokio::test]
async fn test_server_info() {
    let (base, _) = ksql_server().await;
    let info = KsqlClient::new(base).unwrap().server_info().await.expect("info");

    assert_eq!(info.version, "0.29.0");
    assert_eq!(info.server_status.as_deref(), Some("RUNNING"));
    assert_eq!(info.ksql_service_id.as_deref(), Some("default_"));
}

#[tokio::test]
async fn test_load_sends_one_row_per_item() {
    let (base, recorded) = ksql_server().await;
    let load = KsqlLoad::new(KsqlClient::new(base).unwrap(), "Wikipedia_STREAM");

    for size in [1, 2] {
        load.load(Row {
            title: format!("Page {size}"),
            size,
        })
        .await
        .expect("load");
    }

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);
    assert!(bodies.iter().all(|body| body.lines().count() == 2));
    assert!(bodies[1].contains("\"title\":\"Page 2\""));
}

#[tokio::test]
async fn test_load_logs_forwarded_row_at_info() {
    let (base, _) = ksql_server().await;
    let load = KsqlLoad::new(KsqlClient::new(base).unwrap(), "Wikipedia_STREAM");

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    load.load(Row {
        title: "Logged page".to_string(),
        size: 7,
    })
    .await
    .expect("load");

    let output = logs.contents();
    assert!(output.contains("row inserted"), "missing insert log: {output}");
    assert!(output.contains("Logged page"), "row not logged: {output}");
    assert!(output.contains("\"size\":7"), "row not logged: {output}");
}

#[tokio::test]
async fn test_load_ignores_rejected_rows() {
    let app = Router::new().route("/inserts-stream", post(rejecting_inserts));
    let base = serve(app).await;
    let client = KsqlClient::new(base).unwrap();

    let response = client
        .inserts_stream("Missing_STREAM", &[Row { title: "x".into(), size: 0 }])
        .await
        .expect("transport succeeds");
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.acks[0].error_code, Some(40000));

    let load = KsqlLoad::new(client, "Missing_STREAM");
    assert!(load.load(Row { title: "x".into(), size: 0 }).await.is_ok());
}

#[tokio::test]
async fn test_load_fails_when_unreachable() {
    // bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let load = KsqlLoad::new(KsqlClient::new(format!("http://{addr}")).unwrap(), "S");
    let err = load
        .load(Row { title: "x".into(), size: 0 })
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to reach ksqlDB"));
}
