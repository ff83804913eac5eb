//! Integration tests for the LG language server.
//!
//! These drive the `Backend` through its `LanguageServer` methods and record
//! what would be published to the client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lg_language_server::backend::{Backend, LgServerConfig, ValidationConfig};
use lg_language_server::builtins;
use lg_language_server::diagnostics::DiagnosticsPublisher;
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, LspService};

type Published = (Url, Vec<Diagnostic>, Option<i32>);

#[derive(Default)]
struct Recorder {
    published: Mutex<Vec<Published>>,
}

#[tower_lsp::async_trait]
impl DiagnosticsPublisher for Recorder {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.published
            .lock()
            .unwrap()
            .push((uri, diagnostics, version));
    }
}

impl Recorder {
    fn take(&self) -> Vec<Published> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }
}

const DEBOUNCE_MS: u64 = 200;

fn server() -> (LspService<Backend>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let publisher = recorder.clone();
    let config = LgServerConfig {
        validation: ValidationConfig {
            debounce_ms: DEBOUNCE_MS,
        },
    };
    let (service, _socket) =
        LspService::new(move |client| Backend::with_publisher(client, publisher, config));
    (service, recorder)
}

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///bot/{name}")).unwrap()
}

async fn open(backend: &Backend, uri: &Url, version: i32, text: &str) {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "lg".to_string(),
                version,
                text: text.to_string(),
            },
        })
        .await;
}

async fn change(backend: &Backend, uri: &Url, version: i32, text: &str) {
    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: text.to_string(),
            }],
        })
        .await;
}

async fn close(backend: &Backend, uri: &Url) {
    backend
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        })
        .await;
}

async fn hover(backend: &Backend, uri: &Url, line: u32, character: u32) -> Option<Hover> {
    backend
        .hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position: Position { line, character },
            },
            work_done_progress_params: Default::default(),
        })
        .await
        .unwrap()
}

async fn completion(backend: &Backend, uri: &Url) -> Vec<CompletionItem> {
    let response = backend
        .completion(CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position: Position {
                    line: 0,
                    character: 0,
                },
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        })
        .await
        .unwrap();
    match response {
        Some(CompletionResponse::Array(items)) => items,
        other => panic!("expected an item array, got {:?}", other),
    }
}

async fn quiet_period() {
    tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 5)).await;
}

fn hover_strings(hover: Hover) -> Vec<String> {
    let HoverContents::Array(items) = hover.contents else {
        panic!("expected array hover contents");
    };
    items
        .into_iter()
        .map(|item| match item {
            MarkedString::String(s) => s,
            MarkedString::LanguageString(ls) => ls.value,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_validate_only_the_last_content() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# Greeting\n- hi").await;
    for version in 2..=10 {
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS / 4)).await;
        let text = if version == 10 {
            "# Greeting\n- ${unknownFn()}".to_string()
        } else {
            format!("# Greeting\n- hi {version}")
        };
        change(backend, &doc, version, &text).await;
    }
    assert_eq!(backend.scheduler().pending_count().await, 1);

    quiet_period().await;
    let published = recorder.take();
    assert_eq!(published.len(), 1, "{published:?}");
    let (published_uri, diagnostics, version) = &published[0];
    assert_eq!(published_uri, &doc);
    assert_eq!(*version, Some(10));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("unknownFn"));
    assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(diagnostics[0].source.as_deref(), Some(doc.as_str()));
}

#[tokio::test(start_paused = true)]
async fn close_clears_diagnostics_and_cancels_pending_validation() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# T\n- ${broken(}").await;
    tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS / 2)).await;
    close(backend, &doc).await;
    quiet_period().await;

    let published = recorder.take();
    assert_eq!(published, vec![(doc.clone(), Vec::new(), None)]);
    assert!(!backend.scheduler().is_pending(&doc).await);
    assert!(backend.documents().get(&doc).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn validation_clears_markers_once_errors_are_fixed() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# T\n- ${missing()}").await;
    quiet_period().await;
    let first = recorder.take();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].1.len(), 1);

    change(backend, &doc, 2, "# T\n- fixed").await;
    quiet_period().await;
    let second = recorder.take();
    assert_eq!(second.len(), 1);
    assert!(second[0].1.is_empty());
    assert_eq!(second[0].2, Some(2));
}

#[tokio::test(start_paused = true)]
async fn syntax_error_surfaces_as_one_diagnostic() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# Fine\n- ok\n# Not A Name\n- x").await;
    quiet_period().await;

    let published = recorder.take();
    assert_eq!(published.len(), 1);
    let diagnostics = &published[0].1;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start.line, 2);
    assert!(diagnostics[0].message.starts_with("Syntax error"));
}

#[tokio::test(start_paused = true)]
async fn errors_in_one_document_do_not_leak_into_another() {
    let (service, recorder) = server();
    let backend = service.inner();
    let (bad, good) = (uri("bad.lg"), uri("good.lg"));

    open(backend, &bad, 1, "# A\n- ${nope()}").await;
    open(backend, &good, 1, "# B\n- fine").await;
    quiet_period().await;

    let mut published = recorder.take();
    published.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, bad);
    assert_eq!(published[0].1.len(), 1);
    assert_eq!(published[1].0, good);
    assert!(published[1].1.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hover_prefers_templates_over_builtins() {
    let (service, _recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(
        backend,
        &doc,
        1,
        "# add\n- custom add\n# Use\n- ${add()} ${builtin.sub(2, 1)}",
    )
    .await;

    let template = hover_strings(hover(backend, &doc, 3, 5).await.unwrap());
    assert_eq!(template, vec![doc.to_string(), "- custom add".to_string()]);

    let builtin = hover_strings(hover(backend, &doc, 3, 20).await.unwrap());
    assert_eq!(builtin[0], "Parameters: minuend: number, subtrahend: number");
    assert_eq!(builtin[2], "ReturnType: number");
}

#[tokio::test(start_paused = true)]
async fn hover_and_completion_see_edits_before_validation_runs() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# First\n- one").await;
    change(backend, &doc, 2, "# Second(x)\n- two ${x}").await;

    let items = completion(backend, &doc).await;
    assert_eq!(items[0].label, "Second");
    assert_eq!(items[0].insert_text.as_deref(), Some("Second(x)"));
    assert!(hover(backend, &doc, 0, 3).await.is_some());
    assert!(recorder.take().is_empty(), "nothing published yet");
}

#[tokio::test(start_paused = true)]
async fn completion_lists_templates_then_every_builtin() {
    let (service, _recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 1, "# T1\n- a\n# T2(p)\n- ${p}").await;
    let items = completion(backend, &doc).await;

    assert_eq!(items.len(), 2 + builtins::all().len());
    assert_eq!(items[0].label, "T1");
    assert_eq!(items[1].label, "T2");
    assert_eq!(items[2].label, builtins::all()[0].name);
    assert_eq!(items.last().unwrap().label, builtins::all().last().unwrap().name);

    let resolved = backend.completion_resolve(items[1].clone()).await.unwrap();
    assert_eq!(resolved, items[1]);
}

#[tokio::test(start_paused = true)]
async fn unknown_documents_fail_soft() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("never-opened.lg");

    assert!(hover(backend, &doc, 0, 0).await.is_none());
    assert!(completion(backend, &doc).await.is_empty());

    close(backend, &doc).await;
    assert_eq!(recorder.take(), vec![(doc, Vec::new(), None)]);
}

#[tokio::test(start_paused = true)]
async fn empty_document_never_gets_diagnostics() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("new.lg");

    open(backend, &doc, 1, "").await;
    let templates_and_builtins = completion(backend, &doc).await;
    assert_eq!(templates_and_builtins.len(), builtins::all().len());
    assert!(hover(backend, &doc, 0, 0).await.is_none());

    quiet_period().await;
    for (_, diagnostics, _) in recorder.take() {
        assert!(diagnostics.is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn reopening_with_identical_text_matches_a_single_open() {
    let text = "# Dup\n- a\n# Dup\n- b\n# Call\n- ${nothing()}";

    let (once_service, once_recorder) = server();
    open(once_service.inner(), &uri("x.lg"), 1, text).await;
    quiet_period().await;
    let once = once_recorder.take();

    let (twice_service, twice_recorder) = server();
    open(twice_service.inner(), &uri("x.lg"), 1, text).await;
    open(twice_service.inner(), &uri("x.lg"), 1, text).await;
    quiet_period().await;
    let twice = twice_recorder.take();

    assert_eq!(once.len(), 1);
    assert_eq!(once, twice);
    assert_eq!(once[0].1.len(), 2);
    assert_eq!(
        completion(once_service.inner(), &uri("x.lg")).await,
        completion(twice_service.inner(), &uri("x.lg")).await
    );
}

#[tokio::test(start_paused = true)]
async fn stale_versions_are_ignored() {
    let (service, recorder) = server();
    let backend = service.inner();
    let doc = uri("main.lg");

    open(backend, &doc, 5, "# New\n- current").await;
    change(backend, &doc, 3, "# Old\n- outdated").await;
    quiet_period().await;

    assert_eq!(backend.documents().get(&doc).await.unwrap().version, 5);
    let published = recorder.take();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].2, Some(5));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_validations() {
    let (service, recorder) = server();
    let backend = service.inner();

    open(backend, &uri("a.lg"), 1, "# A\n- a").await;
    open(backend, &uri("b.lg"), 1, "# B\n- b").await;
    backend.shutdown().await.unwrap();
    quiet_period().await;

    assert!(recorder.take().is_empty());
    assert_eq!(backend.scheduler().pending_count().await, 0);
}
