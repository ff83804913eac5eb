//! Document store.
//!
//! Owns the text of every open document. Documents are replaced wholesale on
//! each change (full sync); other components only ever see snapshots.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: Url,
    pub version: i32,
    pub text: String,
}

/// Outcome of applying a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Updated,
    /// The document was not open; the change opened it.
    Opened,
    /// The change carried an older version than the stored one.
    Stale,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Url, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document. Returns `false` when it was already open, in which
    /// case the stored content is left untouched.
    pub async fn open(&self, uri: Url, version: i32, text: String) -> bool {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&uri) {
            return false;
        }
        documents.insert(uri.clone(), Document { uri, version, text });
        true
    }

    pub async fn change(&self, uri: Url, version: i32, text: String) -> ChangeOutcome {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&uri) {
            Some(doc) if version < doc.version => ChangeOutcome::Stale,
            Some(doc) => {
                doc.version = version;
                doc.text = text;
                ChangeOutcome::Updated
            }
            None => {
                documents.insert(uri.clone(), Document { uri, version, text });
                ChangeOutcome::Opened
            }
        }
    }

    pub async fn close(&self, uri: &Url) -> Option<Document> {
        self.documents.write().await.remove(uri)
    }

    pub async fn get(&self, uri: &Url) -> Option<Document> {
        self.documents.read().await.get(uri).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}
