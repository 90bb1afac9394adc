//! Transfer engine and batch runs against scripted HTTP answers and a real
//! temporary directory.

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, HttpStream, RetryPolicy};
use bridge_traits::ingest::{IngestReceipt, IngestRequest, KnowledgeBaseIngestor};
use chrono::{Duration as ChronoDuration, Utc};
use core_auth::AccessToken;
use core_library::models::DocumentDescriptor;
use core_runtime::logging::LogContext;
use core_transfer::{
    destination_path, BatchOrchestrator, DownloadError, TransferEngine,
};
use mockall::mock;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BODY: &[u8] = b"document bytes";

/// Answers each URL from its own queue of statuses; an empty queue means 200.
#[derive(Default)]
struct ScriptedHttp {
    script: Mutex<HashMap<String, VecDeque<Result<u16, BridgeError>>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    fn script(self, url: &str, answers: Vec<Result<u16, BridgeError>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), answers.into());
        self
    }

    fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Err(BridgeError::NotAvailable("buffered requests are not used".into()))
    }

    async fn download_stream(&self, request: HttpRequest) -> BridgeResult<HttpStream> {
        let answer = self
            .script
            .lock()
            .unwrap()
            .get_mut(&request.url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Ok(200));
        self.requests.lock().unwrap().push(request);

        let status = answer?;
        let body: &'static [u8] = if status == 200 { BODY } else { b"error" };
        Ok(HttpStream {
            status,
            headers: HashMap::new(),
            body: Box::new(std::io::Cursor::new(body)),
        })
    }
}

mock! {
    Ingestor {}

    #[async_trait]
    impl KnowledgeBaseIngestor for Ingestor {
        async fn ingest(&self, request: IngestRequest) -> BridgeResult<IngestReceipt>;
    }
}

fn content_url(item: &str) -> String {
    format!("https://graph.microsoft.com/v1.0/drives/drive-1/items/{}/content", item)
}

fn document(name: &str, item: &str) -> DocumentDescriptor {
    let mut doc = DocumentDescriptor::new(name, "drive-1", item);
    doc.library_name = "Documents".into();
    doc.folder_path = "Reports/2024".into();
    doc
}

fn engine(http: Arc<ScriptedHttp>) -> TransferEngine {
    TransferEngine::new(
        http,
        Arc::new(TokioFileSystem::new()),
        AccessToken::new("test-token", None),
        LogContext::disabled(),
    )
    .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
}

#[tokio::test]
async fn test_download_succeeds_on_third_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(
        ScriptedHttp::default().script(&content_url("i1"), vec![Ok(500), Ok(500), Ok(200)]),
    );
    let doc = document("plan.pdf", "i1");

    let path = engine(Arc::clone(&http)).download(&doc, dir.path()).await.unwrap();

    assert_eq!(path, dir.path().join("Documents/Reports/2024/plan.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), BODY);

    let requests = http.requests_to(&content_url("i1"));
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer test-token")
    );
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default().script(
        &content_url("i1"),
        vec![Ok(403), Ok(403), Ok(403)],
    ));

    let err = engine(Arc::clone(&http))
        .download(&document("plan.pdf", "i1"), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::AccessDenied { .. }));
    assert_eq!(http.requests_to(&content_url("i1")).len(), 1);
}

#[tokio::test]
async fn test_unauthorized_and_missing_are_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(
        ScriptedHttp::default()
            .script(&content_url("gone"), vec![Ok(404)])
            .script(&content_url("expired"), vec![Ok(401)]),
    );
    let engine = engine(Arc::clone(&http));

    let missing = engine
        .download(&document("a.pdf", "gone"), dir.path())
        .await
        .unwrap_err();
    let expired = engine
        .download(&document("b.pdf", "expired"), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(missing, DownloadError::NotFound { .. }));
    assert!(matches!(expired, DownloadError::AuthExpired { .. }));
    assert_eq!(http.requests_to(&content_url("gone")).len(), 1);
    assert_eq!(http.requests_to(&content_url("expired")).len(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_after_transient_failures() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default().script(
        &content_url("i1"),
        vec![
            Err(BridgeError::Network("reset".into())),
            Err(BridgeError::Timeout("60s".into())),
            Ok(503),
        ],
    ));
    let doc = document("plan.pdf", "i1");

    let err = engine(Arc::clone(&http)).download(&doc, dir.path()).await.unwrap_err();

    match err {
        DownloadError::RetriesExhausted { attempts, last_error, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "HTTP 503");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!destination_path(&doc, dir.path()).exists());
}

#[tokio::test]
async fn test_fresh_direct_url_is_fetched_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default());
    let mut doc = document("plan.pdf", "i1");
    doc.direct_download_url = Some("https://download.example/plan".into());
    doc.discovered_at = Some(Utc::now());

    engine(Arc::clone(&http)).download(&doc, dir.path()).await.unwrap();

    let direct = http.requests_to("https://download.example/plan");
    assert_eq!(direct.len(), 1);
    assert!(!direct[0].headers.contains_key("Authorization"));
    assert!(http.requests_to(&content_url("i1")).is_empty());
}

#[tokio::test]
async fn test_stale_direct_url_falls_back_to_content_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default());
    let mut doc = document("plan.pdf", "i1");
    doc.direct_download_url = Some("https://download.example/plan".into());
    doc.discovered_at = Some(Utc::now() - ChronoDuration::hours(2));

    engine(Arc::clone(&http)).download(&doc, dir.path()).await.unwrap();

    assert!(http.requests_to("https://download.example/plan").is_empty());
    assert_eq!(http.requests_to(&content_url("i1")).len(), 1);
}

#[tokio::test]
async fn test_expired_token_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default());
    let engine = TransferEngine::new(
        Arc::clone(&http) as Arc<dyn HttpClient>,
        Arc::new(TokioFileSystem::new()),
        AccessToken::new("old", Some(Utc::now() - ChronoDuration::minutes(1))),
        LogContext::disabled(),
    );

    let err = engine
        .download(&document("plan.pdf", "i1"), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::AuthExpired { .. }));
    assert!(http.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let doc = DocumentDescriptor::new("orphan.pdf", "", "");

    let err = engine(Arc::new(ScriptedHttp::default()))
        .download(&doc, dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::MissingIdentifiers { .. }));
}

#[tokio::test]
async fn test_batch_skips_failures_and_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(
        ScriptedHttp::default()
            .script(&content_url("i2"), vec![Ok(404)])
            .script(&content_url("i4"), vec![Ok(403)]),
    );
    let documents: Vec<_> = (1..=5)
        .map(|i| document(&format!("doc{}.pdf", i), &format!("i{}", i)))
        .collect();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&calls);
    let progress = move |done: usize, total: usize| recorder.lock().unwrap().push((done, total));

    let batch = BatchOrchestrator::new(Arc::new(engine(http)), LogContext::disabled());
    let report = batch
        .download_all(&documents, dir.path(), Some(&progress))
        .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed(), 2);
    assert!(!report.results.contains_key("doc2.pdf"));
    assert!(!report.results.contains_key("doc4.pdf"));
    assert!(report.results["doc5.pdf"].exists());

    let calls = calls.lock().unwrap();
    assert_eq!(*calls, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
}

#[tokio::test]
async fn test_batch_ingest_variant() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttp::default().script(&content_url("i3"), vec![Ok(404)]));

    let mut ingestor = MockIngestor::new();
    ingestor
        .expect_ingest()
        .withf(|req| req.document_id == "doc1.pdf" && req.mime_type == "application/pdf")
        .times(1)
        .returning(|req| {
            assert_eq!(req.title, "doc1.pdf");
            assert_eq!(req.source, "SharePoint");
            assert_eq!(&req.content[..], BODY);
            Ok(IngestReceipt {
                document_id: req.document_id,
                status: "STARTING".into(),
            })
        });
    ingestor
        .expect_ingest()
        .withf(|req| req.document_id == "doc2.pdf")
        .times(1)
        .returning(|_| Err(BridgeError::OperationFailed("throttled".into())));

    let engine = engine(http).with_ingestor(Arc::new(ingestor));
    let batch = BatchOrchestrator::new(Arc::new(engine), LogContext::disabled());
    let documents = vec![
        document("doc1.pdf", "i1"),
        document("doc2.pdf", "i2"),
        document("doc3.pdf", "i3"),
    ];

    let report = batch
        .download_all_and_ingest(&documents, dir.path(), None)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results["doc1.pdf"], true);
    assert_eq!(report.results["doc2.pdf"], false);
    assert_eq!(report.results["doc3.pdf"], false);
    assert_eq!(report.succeeded, 1);

    // The failed ingestion keeps its local copy
    assert!(dir.path().join("Documents/Reports/2024/doc2.pdf").exists());
}

#[tokio::test]
async fn test_batch_ingest_requires_ingestor() {
    let dir = tempfile::tempdir().unwrap();
    let batch = BatchOrchestrator::new(
        Arc::new(engine(Arc::new(ScriptedHttp::default()))),
        LogContext::disabled(),
    );

    let err = batch
        .download_all_and_ingest(&[document("a.pdf", "i1")], dir.path(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::IngestionNotConfigured));
}
