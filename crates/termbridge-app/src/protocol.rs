use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use termbridge_types::{Request, Response};

use super::bridge::Bridge;

/// Reads newline-delimited JSON requests until end of input, feeding each to
/// the bridge and writing exactly one response line per request, in order.
/// End of input is a clean shutdown, not an error.
pub async fn run_loop<R, W>(reader: R, mut writer: W, mut bridge: Bridge) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_response(&mut writer, &bridge.ready_response()).await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Each line is an independent unit: a parse failure is reported and
        // the loop moves on to the next line.
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!(id = %request.id, action = %request.action, "request");
                bridge.handle(request).await
            }
            Err(e) => Response::invalid_json(e),
        };

        write_response(&mut writer, &response).await?;
    }

    debug!("input stream closed, shutting down");
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
