use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use drivegate_auth::{hash_token, AuthorizationGate, ProtectedRoutes};
use drivegate_axum::{router, DeliveryPolicy, GateState, RequestHandler};
use drivegate_core::delivery::{DEFAULT_CACHE_CONTROL, NO_CACHE};
use drivegate_core::path::encode;
use drivegate_core::AccessToken;
use drivegate_oauth::StaticTokenProvider;
use drivegate_store::{
    ByteStream, Download, DriveItem, DriveStore, StoreError, StoreResult, METADATA_FIELDS,
    NOT_FOUND_MESSAGE,
};
use futures::{stream, StreamExt};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const HOMEPAGE: &str = "https://drive.example.com";

/// In-memory drive: items by path, file contents by download URL.
#[derive(Default)]
struct FakeDrive {
    items: HashMap<String, StoreResult<DriveItem>>,
    files: HashMap<String, Vec<u8>>,
    streams: Mutex<HashMap<String, ByteStream>>,
    metadata_lookups: AtomicUsize,
    opens: AtomicUsize,
}

impl FakeDrive {
    fn file(mut self, path: &str, content: &[u8]) -> Self {
        let url = format!("https://cdn.example.com/dl{path}");
        self.items.insert(
            path.to_string(),
            Ok(DriveItem {
                id: Some(format!("id:{path}")),
                size: Some(content.len() as u64),
                download_url: Some(url.clone()),
                file: Some(json!({})),
            }),
        );
        self.files.insert(url, content.to_vec());
        self
    }

    /// A file whose download serves `body` instead of fixed content.
    fn streaming(self, path: &str, body: ByteStream) -> Self {
        let drive = self.file(path, b"");
        drive
            .streams
            .lock()
            .unwrap()
            .insert(format!("https://cdn.example.com/dl{path}"), body);
        drive
    }

    fn sized(mut self, path: &str, size: u64) -> Self {
        if let Some(Ok(item)) = self.items.get_mut(path) {
            item.size = Some(size);
        }
        self
    }

    fn folder(mut self, path: &str) -> Self {
        self.items.insert(
            path.to_string(),
            Ok(DriveItem {
                id: Some(format!("id:{path}")),
                size: Some(0),
                ..DriveItem::default()
            }),
        );
        self
    }

    fn failing(mut self, path: &str, status: u16, body: Value) -> Self {
        self.items.insert(
            path.to_string(),
            Err(StoreError::Status {
                status,
                body: Some(body),
            }),
        );
        self
    }
}

#[async_trait::async_trait]
impl DriveStore for FakeDrive {
    async fn item(&self, path: &str, token: &AccessToken, fields: &[&str]) -> StoreResult<DriveItem> {
        assert_eq!(token.secret(), "drive-token");
        if fields == METADATA_FIELDS {
            self.metadata_lookups.fetch_add(1, Ordering::SeqCst);
        }
        match self.items.get(path) {
            Some(Ok(item)) => Ok(item.clone()),
            Some(Err(StoreError::Status { status, body })) => Err(StoreError::Status {
                status: *status,
                body: body.clone(),
            }),
            Some(Err(other)) => Err(StoreError::invalid(other.to_string())),
            None => Err(StoreError::Status { status: 404, body: None }),
        }
    }

    async fn open(&self, url: &str) -> StoreResult<Download> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let custom = self.streams.lock().unwrap().remove(url);
        let content = self.files.get(url).cloned().unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        Ok(Download {
            status: StatusCode::OK,
            headers,
            stream: custom.unwrap_or_else(|| {
                Box::pin(stream::once(async move { Ok::<_, io::Error>(Bytes::from(content)) }))
            }),
        })
    }
}

fn app(drive: Arc<FakeDrive>, token: &str, protected: &[&str]) -> axum::Router {
    let gate = AuthorizationGate::new(ProtectedRoutes::new(protected), drive.clone());
    let handler = RequestHandler::new(Arc::new(StaticTokenProvider::new(token)), gate, drive)
        .with_policy(DeliveryPolicy::default());
    router(GateState::new(handler).with_homepage(HOMEPAGE), "/api/raw")
}

fn docs() -> Arc<FakeDrive> {
    Arc::new(
        FakeDrive::default()
            .file("/docs/report.pdf", b"%PDF-1.7 report")
            .file("/private/.password", b"s3cret\n")
            .file("/private/secret.txt", b"top secret")
            .folder("/docs"),
    )
}

fn uri(path: &str, extra: &str) -> String {
    format!("/api/raw?requestMode=fileAccess&hash={}{extra}", encode(path))
}

async fn get(app: axum::Router, uri: &str) -> Response {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: axum::Router, req: Request<Body>) -> Response {
    app.oneshot(req).await.unwrap()
}

async fn body_bytes(res: Response) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

async fn json_body(res: Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

#[tokio::test]
async fn small_file_is_proxied_with_cache_policy() {
    let drive = docs();
    let res = get(app(drive.clone(), "drive-token", &[]), &uri("/docs/report.pdf", "&proxy=true")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CACHE_CONTROL], DEFAULT_CACHE_CONTROL);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(res.headers().get(header::CONNECTION).is_none());
    assert_eq!(body_bytes(res).await, Bytes::from_static(b"%PDF-1.7 report"));
    assert_eq!(drive.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn redirect_keeps_upstream_caching() {
    let drive = docs();
    let res = get(app(drive.clone(), "drive-token", &[]), &uri("/docs/report.pdf", "&proxy=false")).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        res.headers()[header::LOCATION],
        "https://cdn.example.com/dl/docs/report.pdf"
    );
    assert!(res.headers().get(header::CACHE_CONTROL).is_none());
    assert_eq!(drive.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn files_at_the_threshold_are_redirected() {
    let drive = Arc::new(
        FakeDrive::default()
            .file("/big.iso", b"iso")
            .sized("/big.iso", 4_194_304),
    );
    let res = get(app(drive, "drive-token", &[]), &uri("/big.iso", "&proxy=1")).await;
    assert_eq!(res.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn protected_file_with_valid_credential_is_never_cached() {
    let credential = hash_token("s3cret");

    let req = Request::builder()
        .uri(uri("/private/secret.txt", "&proxy=true"))
        .header("od-protected-token", &credential)
        .body(Body::empty())
        .unwrap();
    let res = send(app(docs(), "drive-token", &["/private"]), req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CACHE_CONTROL], NO_CACHE);
    assert_eq!(body_bytes(res).await, Bytes::from_static(b"top secret"));

    let res = get(
        app(docs(), "drive-token", &["/private"]),
        &uri("/private/secret.txt", &format!("&odpt={credential}")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::CACHE_CONTROL], NO_CACHE);
}

#[tokio::test]
async fn protected_file_without_credential_stops_before_metadata() {
    let drive = docs();
    let res = get(app(drive.clone(), "drive-token", &["/private"]), &uri("/private/secret.txt", "")).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await, json!({"error": "Password required."}));
    assert_eq!(drive.metadata_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_credential_is_refused() {
    let req = Request::builder()
        .uri(uri("/private/secret.txt", ""))
        .header("od-protected-token", hash_token("guess"))
        .body(Body::empty())
        .unwrap();
    let res = send(app(docs(), "drive-token", &["/private"]), req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_without_marker_is_404() {
    let drive = Arc::new(FakeDrive::default().file("/vault/a.txt", b"a"));
    let res = get(app(drive, "drive-token", &["/vault"]), &uri("/vault/a.txt", "&odpt=abc")).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["error"], "You didn't set a password.");
}

#[tokio::test]
async fn missing_hash_is_400() {
    let res = get(app(docs(), "drive-token", &[]), "/api/raw?requestMode=fileAccess").await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(res).await,
        json!({"error": "No hash specified.", "homepage": HOMEPAGE})
    );
}

#[tokio::test]
async fn undecodable_hash_is_400() {
    let drive = docs();
    let res = get(app(drive.clone(), "drive-token", &[]), "/api/raw?requestMode=fileAccess&hash=!!!").await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "Hash query invalid.");
    assert_eq!(drive.metadata_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn folder_is_404() {
    let res = get(app(docs(), "drive-token", &[]), &uri("/docs", "")).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["error"], NOT_FOUND_MESSAGE);
    assert_eq!(body["error"], "Hash broken, try again!");
    assert_eq!(body["homepage"], HOMEPAGE);
}

#[tokio::test]
async fn protected_failures_after_access_are_not_cached() {
    let drive = Arc::new(
        FakeDrive::default()
            .file("/private/.password", b"s3cret\n")
            .folder("/private/dir"),
    );
    let req = Request::builder()
        .uri(uri("/private/dir", ""))
        .header("od-protected-token", hash_token("s3cret"))
        .body(Body::empty())
        .unwrap();
    let res = send(app(drive, "drive-token", &["/private"]), req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::CACHE_CONTROL], NO_CACHE);
    assert_eq!(json_body(res).await["error"], NOT_FOUND_MESSAGE);

    let res = get(app(docs(), "drive-token", &[]), &uri("/docs", "")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn empty_credential_header_is_not_replaced_by_the_query() {
    let req = Request::builder()
        .uri(uri("/private/secret.txt", &format!("&odpt={}", hash_token("s3cret"))))
        .header("od-protected-token", "")
        .body(Body::empty())
        .unwrap();
    let res = send(app(docs(), "drive-token", &["/private"]), req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

/// Sets its flag when dropped.
struct Release(Arc<AtomicBool>);

impl Drop for Release {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn dropping_the_response_releases_the_download() {
    let released = Arc::new(AtomicBool::new(false));
    let guard = Release(released.clone());
    let body = stream::once(async { Ok::<_, io::Error>(Bytes::from_static(b"first")) })
        .chain(stream::pending())
        .map(move |chunk| {
            let _held = &guard;
            chunk
        });
    let drive = Arc::new(FakeDrive::default().streaming("/movie.mp4", Box::pin(body)));

    let mut res = get(app(drive, "drive-token", &[]), &uri("/movie.mp4", "&proxy=true")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let frame = res.body_mut().frame().await.unwrap().unwrap();
    assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"first"));
    assert!(!released.load(Ordering::SeqCst));

    drop(res);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failure_mid_stream_ends_the_body_without_an_error_payload() {
    let body = stream::iter([
        Ok(Bytes::from_static(b"partial")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream reset")),
    ]);
    let drive = Arc::new(FakeDrive::default().streaming("/movie.mp4", Box::pin(body)));

    let mut res = get(app(drive, "drive-token", &[]), &uri("/movie.mp4", "&proxy=true")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_ne!(res.headers()[header::CONTENT_TYPE], "application/json");

    let frame = res.body_mut().frame().await.unwrap().unwrap();
    assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"partial"));
    assert!(res.into_body().collect().await.is_err());
}

#[tokio::test]
async fn wrong_request_mode_is_400() {
    for mode in ["folderList", "", "FILEACCESS"] {
        let res = get(
            app(docs(), "drive-token", &[]),
            &format!("/api/raw?requestMode={mode}&hash={}", encode("/docs/report.pdf")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{mode}");
        assert_eq!(json_body(res).await["error"], "Invalid Request Mode.");
    }
}

#[tokio::test]
async fn missing_access_token_is_403() {
    let res = get(app(docs(), "", &[]), &uri("/docs/report.pdf", "")).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await["error"], "No access token.");
}

#[tokio::test]
async fn upstream_errors_pass_through() {
    let upstream = json!({"error": {"code": "accessDenied", "message": "Access denied"}});
    let drive = Arc::new(FakeDrive::default().failing("/locked.txt", 403, upstream.clone()));
    let res = get(app(drive, "drive-token", &[]), &uri("/locked.txt", "")).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await, json!({ "error": upstream }));
}

#[tokio::test]
async fn head_is_served() {
    let req = Request::builder()
        .method("HEAD")
        .uri(uri("/docs/report.pdf", ""))
        .body(Body::empty())
        .unwrap();
    let res = send(app(docs(), "drive-token", &[]), req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn cors_and_request_id_headers() {
    let req = Request::builder()
        .uri(uri("/docs/report.pdf", ""))
        .header(header::ORIGIN, "https://elsewhere.example.org")
        .header("x-request-id", "req-test-123")
        .body(Body::empty())
        .unwrap();
    let res = send(app(docs(), "drive-token", &[]), req).await;

    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()["x-request-id"], "req-test-123");
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let res = get(app(docs(), "drive-token", &[]), &uri("/docs/report.pdf", "")).await;
    assert!(res.headers().get("x-request-id").is_some());
}
