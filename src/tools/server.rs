//! Line-delimited JSON transport over stdin/stdout.
//!
//! Each input line is one [`ToolRequest`]; each gets exactly one
//! [`ToolResponse`] line back. Requests run to completion in arrival order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::handlers::ToolServer;
use super::protocol::{ToolRequest, ToolResponse};

/// Serve requests from stdin until it closes.
pub async fn serve_stdio(server: &ToolServer) -> std::io::Result<usize> {
    tracing::info!("Tool server listening on stdio");
    let handled = serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    tracing::info!("stdin closed after {} requests", handled);
    Ok(handled)
}

/// Answer every request line from `reader` on `writer`. Returns the number of
/// responses written.
pub async fn serve<R, W>(server: &ToolServer, reader: R, mut writer: W) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolRequest>(line) {
            Ok(request) => server.handle_request(request),
            Err(e) => {
                tracing::warn!("Invalid request: {}", e);
                ToolResponse::error(format!("Invalid request: {e}"))
            }
        };

        let mut json = serde_json::to_vec(&response)?;
        json.push(b'\n');
        writer.write_all(&json).await?;
        writer.flush().await?;
        handled += 1;
    }

    Ok(handled)
}
