//! `BigIpSession` against a fake iControl REST endpoint on a local port.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use f5api_core::{Account, ClientSslProfile};
use f5api_ltm::{BigIpSession, LtmClient, LtmError};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    auth: Option<String>,
    range: Option<String>,
    body: Bytes,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn appliance(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(String::from);
    log.lock().unwrap().push(Seen {
        method: method.clone(),
        path: uri.path().to_string(),
        auth: header("authorization"),
        range: header("content-range"),
        body: body.clone(),
    });

    let path = uri.path();
    match (method, path) {
        (Method::GET, "/mgmt/tm/ltm/profile/client-ssl") => axum::Json(json!({
            "kind": "tm:ltm:profile:client-ssl:client-sslcollectionstate",
            "items": [{"name": "clientssl"}, {"name": "svc1"}]
        }))
        .into_response(),
        (Method::GET, "/mgmt/tm/ltm/profile/client-ssl/~Common~svc1") => axum::Json(json!({
            "name": "svc1",
            "partition": "Common",
            "fullPath": "/Common/svc1",
            "cert": "/Common/svc1-2024.crt",
            "key": "/Common/svc1-2024.key",
            "defaultsFrom": "/Common/clientssl"
        }))
        .into_response(),
        (Method::GET, _) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"code": 404, "message": "Object not found"})),
        )
            .into_response(),
        (Method::POST, "/mgmt/tm/sys/file/ssl-cert") => (
            StatusCode::CONFLICT,
            axum::Json(json!({"code": 409, "message": "The requested Certificate File already exists"})),
        )
            .into_response(),
        _ => axum::Json(json!({})).into_response(),
    }
}

async fn start() -> (BigIpSession, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(appliance).with_state(Arc::clone(&log));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let session = BigIpSession::new(&Account {
        ltm_host: format!("http://{addr}"),
        username: "admin".into(),
        password: "secret".into(),
        upload_path: "/var/config/rest/downloads/".into(),
        verify_tls: true,
    })
    .unwrap();
    (session, log)
}

fn seen(log: &Log) -> Vec<Seen> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn list_returns_profile_names_with_basic_auth() {
    let (session, log) = start().await;

    let names = session.list_client_ssl_profiles().await.unwrap();

    assert_eq!(names, vec!["clientssl", "svc1"]);
    let req = &seen(&log)[0];
    // admin:secret
    assert_eq!(req.auth.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
}

#[tokio::test]
async fn get_existing_profile_decodes_references() {
    let (session, _log) = start().await;

    let profile = session.get_client_ssl_profile("svc1").await.unwrap().unwrap();

    assert_eq!(profile.cert, "/Common/svc1-2024.crt");
    assert_eq!(profile.defaults_from, "/Common/clientssl");
}

#[tokio::test]
async fn get_missing_profile_is_none() {
    let (session, log) = start().await;

    assert!(session.get_client_ssl_profile("nope").await.unwrap().is_none());
    assert_eq!(seen(&log)[0].path, "/mgmt/tm/ltm/profile/client-ssl/~Common~nope");
}

#[tokio::test]
async fn upload_is_chunked_with_content_range() {
    let (session, log) = start().await;
    let contents = Bytes::from(vec![b'x'; 600_000]);

    session.upload_file(contents, "svc1.crt").await.unwrap();

    let reqs = seen(&log);
    assert_eq!(reqs.len(), 2);
    assert!(reqs.iter().all(|r| r.path == "/mgmt/shared/file-transfer/uploads/svc1.crt"));
    assert_eq!(reqs[0].range.as_deref(), Some("0-524287/600000"));
    assert_eq!(reqs[1].range.as_deref(), Some("524288-599999/600000"));
    assert_eq!(reqs[0].body.len() + reqs[1].body.len(), 600_000);
}

#[tokio::test]
async fn empty_upload_is_rejected_locally() {
    let (session, log) = start().await;

    let err = session.upload_file(Bytes::new(), "svc1.key").await.unwrap_err();

    assert!(matches!(err, LtmError::InvalidInput(_)));
    assert!(seen(&log).is_empty());
}

#[tokio::test]
async fn import_key_points_at_uploaded_file() {
    let (session, log) = start().await;

    session.import_key("svc1.key", "svc1-2024.key").await.unwrap();

    let req = &seen(&log)[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/mgmt/tm/sys/file/ssl-key");
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(body["name"], "svc1-2024.key");
    assert_eq!(body["sourcePath"], "file:/var/config/rest/downloads/svc1.key");
}

#[tokio::test]
async fn import_conflict_surfaces_appliance_message() {
    let (session, _log) = start().await;

    let err = session
        .import_certificate("svc1.crt", "svc1-2024.crt")
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn modify_puts_full_profile_to_object_path() {
    let (session, log) = start().await;
    let profile = ClientSslProfile {
        name: "svc1".into(),
        cert: "svc1-2024.crt".into(),
        key: "svc1-2024.key".into(),
        ciphers: "DEFAULT".into(),
        ..ClientSslProfile::default()
    };

    session.modify_client_ssl_profile(&profile).await.unwrap();

    let req = &seen(&log)[0];
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.path, "/mgmt/tm/ltm/profile/client-ssl/~Common~svc1");
    let body: ClientSslProfile = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(body, profile);
}

#[tokio::test]
async fn remove_certificate_uses_partition_path() {
    let (session, log) = start().await;

    session.remove_certificate("/Common/svc1-2024.crt").await.unwrap();

    let req = &seen(&log)[0];
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.path, "/mgmt/tm/sys/file/ssl-cert/~Common~svc1-2024.crt");
}

#[tokio::test]
async fn traversal_names_never_reach_the_appliance() {
    let (session, log) = start().await;
    let name = "x/../../../virtual/~Common~vs1";

    let results = [
        session.get_client_ssl_profile(name).await.map(|_| ()),
        session.remove_client_ssl_profile(name).await,
        session.remove_certificate("/Common/../../virtual/vs1").await,
        session.remove_key("svc1.key?expandSubcollections=true").await,
        session
            .upload_file(Bytes::from_static(b"A"), "../../../tm/sys/config.crt")
            .await,
        session.import_certificate("svc1.crt", "../svc1-2024.crt").await,
        session.import_key("../../svc1.key", "svc1-2024.key").await,
    ];

    for result in results {
        assert!(matches!(result, Err(LtmError::InvalidInput(_))), "{result:?}");
    }
    assert!(seen(&log).is_empty());
}
