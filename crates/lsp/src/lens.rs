use crate::LspServer;
use crate::util::uri_to_path;
use dcf_core::features::LensMarker;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

pub async fn code_lens(server: &LspServer, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
    let Some(session) = server.session().await else {
        return Ok(None);
    };
    let Some(path) = uri_to_path(&params.text_document.uri) else {
        return Ok(None);
    };

    let markers = session
        .report_keys(&path)
        .map(|key| session.lenses.lenses_for(key))
        .find(|markers| !markers.is_empty())
        .unwrap_or_default();
    Ok(Some(markers.iter().map(to_code_lens).collect()))
}

/// Informational lens: empty command id, so clicking does nothing.
pub fn to_code_lens(marker: &LensMarker) -> CodeLens {
    let line = marker.line.saturating_sub(1);
    CodeLens {
        range: Range::new(Position::new(line, 0), Position::new(line, 0)),
        command: Some(Command {
            title: marker.title.clone(),
            command: String::new(),
            arguments: None,
        }),
        data: None,
    }
}
