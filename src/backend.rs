//! Backend struct for the LG Language Server.
//!
//! The Backend binds the document store, the validation scheduler and the
//! hover/completion providers to the `LanguageServer` trait from tower-lsp.
//! Hover and completion always re-parse the current text; they never wait
//! for a pending validation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::completion;
use crate::diagnostics::DiagnosticsPublisher;
use crate::documents::{ChangeOutcome, DocumentStore};
use crate::hover;
use crate::resource;
use crate::scheduler::{ValidationScheduler, DEFAULT_DEBOUNCE_MS};

/// Settings key under which clients send LG configuration.
pub const CONFIG_SECTION: &str = "lg";

/// Server-side configuration.
///
/// Read from `initializationOptions` and from
/// `workspace/didChangeConfiguration`, both under the `lg` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LgServerConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Quiet period after the last edit before diagnostics are recomputed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl LgServerConfig {
    /// Extract the `lg` section from a settings object, if present.
    pub fn from_settings(settings: &Value) -> Option<serde_json::Result<Self>> {
        let section = settings.as_object()?.get(CONFIG_SECTION)?;
        Some(serde_json::from_value(section.clone()))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.validation.debounce_ms)
    }
}

/// The LG language server.
///
/// Handles all LSP requests and notifications for open LG documents.
///
/// # State
///
/// - `documents`: Latest text and version of every open document, shared
///   with the scheduler
/// - `scheduler`: Debounced per-document validation and diagnostics publishing
/// - `config`: Server configuration synced from the client
pub struct Backend {
    /// Kept for log messages to the client; diagnostics go through the scheduler.
    client: Client,
    /// Open documents keyed by URI; the scheduler reads from the same store
    documents: Arc<DocumentStore>,
    /// Owns the pending validation timers, one per open document
    scheduler: ValidationScheduler,
    /// Updated from `initializationOptions` and workspace/didChangeConfiguration
    config: RwLock<LgServerConfig>,
}

impl Backend {
    /// Create a new Backend instance with the given client handle.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, LgServerConfig::default())
    }

    pub fn with_config(client: Client, config: LgServerConfig) -> Self {
        let publisher: Arc<dyn DiagnosticsPublisher> = Arc::new(client.clone());
        Self::with_publisher(client, publisher, config)
    }

    /// Create a Backend that publishes diagnostics through `publisher`
    /// instead of the client connection.
    pub fn with_publisher(
        client: Client,
        publisher: Arc<dyn DiagnosticsPublisher>,
        config: LgServerConfig,
    ) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let scheduler =
            ValidationScheduler::new(Arc::clone(&documents), publisher, config.debounce());
        Self {
            client,
            documents,
            scheduler,
            config: RwLock::new(config),
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    pub async fn config(&self) -> LgServerConfig {
        self.config.read().await.clone()
    }

    async fn apply_config(&self, new_config: LgServerConfig) {
        log::debug!("Updated configuration: {:?}", new_config);
        self.scheduler.set_delay(new_config.debounce());
        *self.config.write().await = new_config;
    }

    async fn apply_settings(&self, settings: &Value) {
        match LgServerConfig::from_settings(settings) {
            Some(Ok(new_config)) => self.apply_config(new_config).await,
            Some(Err(e)) => {
                log::warn!("Failed to parse configuration: {}", e);
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("Ignoring invalid LG configuration: {e}"),
                    )
                    .await;
            }
            None => {}
        }
    }

    /// Hover for `uri` at `position`; `None` when the document is not open
    /// or nothing under the cursor is known.
    pub async fn hover_at(&self, uri: &Url, position: Position) -> Option<Hover> {
        let document = self.documents.get(uri).await?;
        let templates = resource::templates(&document.text, uri.as_str());
        hover::hover(&document.text, &templates, position)
    }

    /// Completion candidates for `uri`; empty when the document is not open.
    pub async fn completion_items(&self, uri: &Url) -> Vec<CompletionItem> {
        let Some(document) = self.documents.get(uri).await else {
            return Vec::new();
        };
        let templates = resource::templates(&document.text, uri.as_str());
        completion::completion(&templates)
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options.as_ref() {
            self.apply_settings(options).await;
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "lg-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: crate::capabilities::server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("LG language server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        self.scheduler.shutdown().await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        log::info!("Document opened: {}", uri);

        if !self
            .documents
            .open(uri.clone(), version, params.text_document.text)
            .await
        {
            log::debug!("Document already open, keeping stored content: {}", uri);
        }

        self.scheduler.schedule(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full document sync: the last change carries the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        log::debug!("Document changed: {} (version {})", uri, version);

        match self.documents.change(uri.clone(), version, change.text).await {
            ChangeOutcome::Stale => {
                log::warn!("Ignoring stale change for {} (version {})", uri, version);
                return;
            }
            ChangeOutcome::Opened => {
                log::warn!("Change for unopened document, opening it: {}", uri);
            }
            ChangeOutcome::Updated => {}
        }

        self.scheduler.schedule(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        log::info!("Document closed: {}", uri);

        self.documents.close(&uri).await;
        self.scheduler.retire(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::info!("Configuration changed");
        self.apply_settings(&params.settings).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        Ok(self.hover_at(&uri, position).await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let items = self.completion_items(&uri).await;
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        Ok(item)
    }
}
