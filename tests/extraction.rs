//! End-to-end extraction behaviour with scripted documents and OCR backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use veritext::models::{DocumentKind, SourceDocument};
use veritext::ocr::{
    check_binary, DocumentOpener, EngineConfig, ExtractionError, ExtractionFault,
    ExtractionMethod, OcrBackend, OcrBackendType, OcrError, PaginatedDocument, PopplerOpener,
    ProgressReporter, RecognitionEngine, TextExtractor,
};

/// A document whose text layer and page images are fixed in advance.
#[derive(Clone, Default)]
struct ScriptedDocument {
    text_layer: Vec<String>,
    /// What the OCR backend "sees" on each page.
    ink: Vec<String>,
    failing_page: Option<u32>,
}

impl ScriptedDocument {
    fn with_text(pages: &[&str]) -> Self {
        Self {
            text_layer: pages.iter().map(|p| p.to_string()).collect(),
            ink: pages.iter().map(|p| p.to_string()).collect(),
            failing_page: None,
        }
    }

    fn image_only(ink: &[&str]) -> Self {
        Self {
            text_layer: vec![String::new(); ink.len()],
            ink: ink.iter().map(|p| p.to_string()).collect(),
            failing_page: None,
        }
    }
}

#[async_trait]
impl PaginatedDocument for ScriptedDocument {
    fn page_count(&self) -> u32 {
        self.text_layer.len() as u32
    }

    async fn page_text(&self, page: u32) -> Result<String, ExtractionFault> {
        if self.failing_page == Some(page) {
            return Err(ExtractionFault::ToolFailed(format!("page {} is damaged", page)));
        }
        Ok(self.text_layer[(page - 1) as usize].clone())
    }

    async fn render_page(
        &self,
        page: u32,
        _dpi: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractionFault> {
        let path = output_dir.join(format!("page-{}.png", page));
        tokio::fs::write(&path, &self.ink[(page - 1) as usize]).await?;
        Ok(path)
    }
}

/// Opens any payload as one scripted document, or fails like a parser would.
struct ScriptedOpener {
    document: Option<ScriptedDocument>,
    opens: AtomicUsize,
}

impl ScriptedOpener {
    fn new(document: ScriptedDocument) -> Arc<Self> {
        Arc::new(Self {
            document: Some(document),
            opens: AtomicUsize::new(0),
        })
    }

    fn malformed() -> Arc<Self> {
        Arc::new(Self {
            document: None,
            opens: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DocumentOpener for ScriptedOpener {
    async fn open(&self, _payload: &[u8]) -> Result<Box<dyn PaginatedDocument>, ExtractionFault> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match &self.document {
            Some(document) => Ok(Box::new(document.clone())),
            None => Err(ExtractionFault::ToolFailed(
                "Couldn't find trailer dictionary".to_string(),
            )),
        }
    }
}

/// Reads the rendered "image" back as its text.
struct EchoBackend {
    available: bool,
    warmups: AtomicUsize,
    pages: AtomicUsize,
}

impl EchoBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            warmups: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            warmups: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
        })
    }
}

impl OcrBackend for EchoBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn availability_hint(&self) -> String {
        "echo backend switched off".to_string()
    }

    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        self.pages.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}\n\n", std::fs::read_to_string(image_path)?))
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        self.warmups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn extractor(opener: Arc<ScriptedOpener>, backend: Arc<EchoBackend>) -> TextExtractor {
    let engine = RecognitionEngine::new(
        backend,
        EngineConfig {
            render_scale: 1.0,
            page_timeout: Duration::from_secs(5),
        },
    );
    TextExtractor::new(opener, Arc::new(engine))
}

fn pdf() -> SourceDocument {
    SourceDocument::new("scan.pdf", DocumentKind::Paginated, b"%PDF-1.7".to_vec())
}

fn recorder() -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reporter = ProgressReporter::from_fn(move |p| sink.lock().unwrap().push(p));
    (reporter, seen)
}

#[tokio::test]
async fn plain_text_reports_single_completion() {
    let extractor = extractor(ScriptedOpener::malformed(), EchoBackend::new());
    let (progress, seen) = recorder();

    let result = extractor
        .extract(
            &SourceDocument::plain_text("note.txt", "hello world"),
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "hello world");
    assert_eq!(result.method, ExtractionMethod::PlainText);
    assert_eq!(*seen.lock().unwrap(), vec![100]);
}

#[tokio::test]
async fn plain_text_is_decoded_lossily_without_bom() {
    let extractor = extractor(ScriptedOpener::malformed(), EchoBackend::new());
    let mut payload = vec![0xEF, 0xBB, 0xBF];
    payload.extend_from_slice(b"caf\xff");
    let document = SourceDocument::new("odd.txt", DocumentKind::PlainText, payload);

    let result = extractor
        .extract(&document, &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.text, "caf\u{fffd}");
}

#[tokio::test]
async fn text_layer_is_kept_when_substantial() {
    let pages = [
        "The committee met on Tuesday.",
        "Minutes were approved without objection.",
        "",
        "Meeting adjourned.",
    ];
    let backend = EchoBackend::new();
    let extractor = extractor(ScriptedOpener::new(ScriptedDocument::with_text(&pages)), backend.clone());
    let (progress, seen) = recorder();

    let result = extractor
        .extract(&pdf(), &progress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.method, ExtractionMethod::TextLayer);
    assert_eq!(result.page_count, Some(4));
    assert_eq!(
        result.text,
        "The committee met on Tuesday.\nMinutes were approved without objection.\n\nMeeting adjourned.\n"
    );
    assert_eq!(*seen.lock().unwrap(), vec![13, 25, 38, 50, 100]);
    assert_eq!(backend.warmups.load(Ordering::SeqCst), 0);
    assert!(!extractor.engine().is_open().await);
}

#[tokio::test]
async fn image_only_pages_fall_back_to_ocr() {
    let backend = EchoBackend::new();
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::image_only(&["a", "b", "c"])),
        backend.clone(),
    );
    let (progress, seen) = recorder();

    let result = extractor
        .extract(&pdf(), &progress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.method, ExtractionMethod::Ocr);
    assert_eq!(result.text, "a\nb\nc\n");
    assert_eq!(*seen.lock().unwrap(), vec![17, 33, 50, 67, 83, 100]);
    assert_eq!(backend.pages.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn threshold_is_inclusive_and_configurable() {
    // 20 characters after trimming: at the default threshold this escalates.
    let document = ScriptedDocument {
        text_layer: vec!["  exactly twenty chars  ".to_string()],
        ink: vec!["recognized instead".to_string()],
        failing_page: None,
    };

    let default = extractor(ScriptedOpener::new(document.clone()), EchoBackend::new());
    let result = default
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.method, ExtractionMethod::Ocr);
    assert_eq!(result.text, "recognized instead\n");

    let relaxed = extractor(ScriptedOpener::new(document), EchoBackend::new()).with_min_chars(5);
    let result = relaxed
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.method, ExtractionMethod::TextLayer);
    assert_eq!(result.text, "  exactly twenty chars  \n");
}

#[tokio::test]
async fn malformed_document_fails_without_completion() {
    let extractor = extractor(ScriptedOpener::malformed(), EchoBackend::new());
    let (progress, seen) = recorder();

    let err = extractor
        .extract(&pdf(), &progress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExtractionError::ExtractionFailed(ExtractionFault::ToolFailed(_))
    ));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_document_is_an_extraction_failure() {
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::default()),
        EchoBackend::new(),
    );
    let err = extractor
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::ExtractionFailed(ExtractionFault::NoPages)
    ));
}

#[tokio::test]
async fn page_fault_aborts_whole_extraction() {
    let mut document = ScriptedDocument::with_text(&["first page", "second", "third"]);
    document.failing_page = Some(2);
    let extractor = extractor(ScriptedOpener::new(document), EchoBackend::new());
    let (progress, seen) = recorder();

    let err = extractor
        .extract(&pdf(), &progress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::ExtractionFailed(_)));
    assert_eq!(*seen.lock().unwrap(), vec![17]);
}

#[tokio::test]
async fn unsupported_kind_is_rejected_before_any_work() {
    let opener = ScriptedOpener::malformed();
    let extractor = extractor(opener.clone(), EchoBackend::new());
    let (progress, seen) = recorder();
    let document = SourceDocument::new(
        "photo.png",
        DocumentKind::Unsupported("image/png".to_string()),
        vec![0x89, b'P', b'N', b'G'],
    );

    let err = extractor
        .extract(&document, &progress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::UnsupportedFormat(ref m) if m == "image/png"));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(opener.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unavailable_backend_surfaces_as_failure() {
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::image_only(&["x"])),
        EchoBackend::unavailable(),
    );
    let err = extractor
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::ExtractionFailed(ExtractionFault::Ocr(OcrError::BackendNotAvailable(_)))
    ));
}

#[tokio::test]
async fn pre_cancelled_call_does_nothing() {
    let opener = ScriptedOpener::new(ScriptedDocument::with_text(&["plenty of text on this page"]));
    let extractor = extractor(opener.clone(), EchoBackend::new());
    let (progress, seen) = recorder();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = extractor.extract(&pdf(), &progress, &cancel).await.unwrap_err();

    assert!(matches!(err, ExtractionError::Cancelled));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(opener.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancellation_between_pages_stops_extraction() {
    let backend = EchoBackend::new();
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::image_only(&["a", "b", "c", "d"])),
        backend.clone(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    // Cancel as soon as the first OCR page reports.
    let progress = ProgressReporter::from_fn(move |p| {
        sink.lock().unwrap().push(p);
        if p > 50 {
            trigger.cancel();
        }
    });

    let err = extractor.extract(&pdf(), &progress, &cancel).await.unwrap_err();

    assert!(matches!(err, ExtractionError::Cancelled));
    assert_eq!(*seen.lock().unwrap(), vec![13, 25, 38, 50, 63]);
    assert_eq!(backend.pages.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_calls_agree_and_reuse_engine() {
    let backend = EchoBackend::new();
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::image_only(&["one", "two"])),
        backend.clone(),
    );

    let first = extractor
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();
    let second = extractor
        .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.warmups.load(Ordering::SeqCst), 1);
    assert!(extractor.engine().is_open().await);

    extractor.engine().close().await;
    assert!(!extractor.engine().is_open().await);
}

#[tokio::test]
async fn repeated_text_layer_calls_are_identical() {
    let backend = EchoBackend::new();
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::with_text(&[
            "Quarterly figures were reviewed in detail.",
            "",
            "  Indented line kept as-is.  ",
        ])),
        backend.clone(),
    );

    let mut runs = Vec::new();
    for _ in 0..3 {
        runs.push(
            extractor
                .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
                .await
                .unwrap(),
        );
    }

    assert_eq!(runs[0].method, ExtractionMethod::TextLayer);
    assert_eq!(
        runs[0].text,
        "Quarterly figures were reviewed in detail.\n\n  Indented line kept as-is.  \n"
    );
    assert!(runs.iter().all(|run| *run == runs[0]));
    assert_eq!(backend.warmups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_calls_share_one_engine() {
    let backend = EchoBackend::new();
    let extractor = Arc::new(extractor(
        ScriptedOpener::new(ScriptedDocument::image_only(&["p1", "p2", "p3"])),
        backend.clone(),
    ));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let extractor = Arc::clone(&extractor);
        handles.push(tokio::spawn(async move {
            extractor
                .extract(&pdf(), &ProgressReporter::silent(), &CancellationToken::new())
                .await
        }));
    }

    let mut texts = HashMap::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        *texts.entry(result.text).or_insert(0) += 1;
    }

    assert_eq!(texts.get("p1\np2\np3\n"), Some(&4));
    assert_eq!(backend.warmups.load(Ordering::SeqCst), 1);
    assert_eq!(backend.pages.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn progress_channel_receives_reports() {
    let extractor = extractor(
        ScriptedOpener::new(ScriptedDocument::with_text(&["a page with enough text in it"])),
        EchoBackend::new(),
    );
    let (progress, mut rx) = ProgressReporter::channel();

    extractor
        .extract(&pdf(), &progress, &CancellationToken::new())
        .await
        .unwrap();
    drop(progress);

    let mut received = Vec::new();
    while let Some(p) = rx.recv().await {
        received.push(p);
    }
    assert_eq!(received, vec![50, 100]);
}

#[tokio::test]
async fn poppler_rejects_garbage_payload() {
    if !check_binary("pdfinfo") {
        println!("Skipping test: pdfinfo not installed");
        return;
    }

    let engine = RecognitionEngine::new(EchoBackend::new(), EngineConfig::default());
    let extractor = TextExtractor::new(Arc::new(PopplerOpener::new()), Arc::new(engine));
    let document = SourceDocument::new("broken.pdf", DocumentKind::Paginated, b"not a pdf".to_vec());

    let err = extractor
        .extract(&document, &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::ExtractionFailed(_)));
}
