pub mod capabilities;
pub mod diagnostics;
pub mod hover;
pub mod lens;
pub mod session;
pub mod util;

use crate::capabilities::SCAN_WORKSPACE_COMMAND;
use crate::session::Session;
use crate::util::{Document, offset_at};
use dashmap::DashMap;
use dcf_core::DcfConfig;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

pub struct LspServer {
    client: Client,
    pub documents: DashMap<Url, Arc<Document>>,
    session: Arc<RwLock<Option<Arc<Session>>>>,
    cancel_token: CancellationToken,
}

impl LspServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            session: Arc::new(RwLock::new(None)),
            cancel_token: CancellationToken::new(),
        }
    }

    pub async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }
}

/// First workspace folder, else the legacy root URI.
#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok())
        .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()))
}

#[tower_lsp::async_trait]
impl LanguageServer for LspServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = match DcfConfig::from_initialization_options(
            params.initialization_options.clone(),
        ) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; falling back to defaults", e);
                DcfConfig::default()
            }
        };

        match workspace_root(&params) {
            Some(root) => {
                tracing::info!("workspace root {} with {:?}", root.display(), config);
                let lens_refresh = capabilities::supports_code_lens_refresh(&params.capabilities);
                let session = session::spawn_session(
                    root,
                    config,
                    self.client.clone(),
                    lens_refresh,
                    self.cancel_token.clone(),
                );
                *self.session.write().await = Some(Arc::new(session));
            }
            None => tracing::warn!("no workspace folder; dead code analysis disabled"),
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "dcf".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: capabilities::server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        match self.session().await {
            Some(session) => {
                self.client
                    .log_message(
                        MessageType::INFO,
                        format!("Dead code analysis started for {}", session.root.display()),
                    )
                    .await;
                session.scheduler.run_now();
            }
            None => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        "No workspace folder open; dead code analysis is disabled",
                    )
                    .await;
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.documents
            .insert(doc.uri, Arc::new(Document::new(doc.text)));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        if let Some(mut doc_ref) = self.documents.get_mut(&uri) {
            let doc = doc_ref.value_mut();
            let mut content = doc.content.clone();
            for change in &params.content_changes {
                match change.range {
                    Some(range) => {
                        let start = offset_at(&content, range.start);
                        let end = offset_at(&content, range.end).max(start);
                        content.replace_range(start..end, &change.text);
                    }
                    None => content = change.text.clone(),
                }
            }
            *doc = Arc::new(Document::new(content));
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        tracing::debug!("didSave {}", params.text_document.uri);
        if let Some(session) = self.session().await {
            session.scheduler.notify_saved();
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        if params.command != SCAN_WORKSPACE_COMMAND {
            return Err(Error::invalid_params(format!(
                "unknown command: {}",
                params.command
            )));
        }
        if let Some(session) = self.session().await {
            session.scheduler.run_now();
        }
        Ok(None)
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        lens::code_lens(self, params).await
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        tracing::trace!("hover {} {}:{}", uri, pos.line, pos.character);
        hover::hover(self, params).await
    }
}

pub async fn run_server() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = tower_lsp::LspService::new(LspServer::new);
    tower_lsp::Server::new(stdin, stdout, socket)
        .serve(service)
        .await;

    Ok(())
}
