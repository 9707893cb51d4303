use crate::LspServer;
use crate::util::{get_word_from_content, uri_to_path, utf16_col_to_byte_col};
use dcf_core::features::HoverContent;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

pub async fn hover(server: &LspServer, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    let Some(session) = server.session().await else {
        return Ok(None);
    };
    let Some(path) = uri_to_path(&uri) else {
        return Ok(None);
    };

    // Prefer the open buffer; fall back to disk for files the client never opened.
    let buffered = server.documents.get(&uri).map(|doc| doc.content.clone());
    let content = match buffered {
        Some(content) => content,
        None => match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => return Ok(None),
        },
    };
    let line = position.line as usize;
    let col = utf16_col_to_byte_col(&content, line, position.character as usize);
    let Some(word) = get_word_from_content(&content, line, col) else {
        return Ok(None);
    };

    let hover = session
        .report_keys(&path)
        .find_map(|key| session.hovers.hover_at(key, position.line + 1, &word))
        .map(to_lsp_hover);
    Ok(hover)
}

pub fn to_lsp_hover(content: HoverContent) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: content.markdown,
        }),
        range: None,
    }
}
