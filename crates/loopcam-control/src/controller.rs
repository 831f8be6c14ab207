//! Line-oriented controller input.

use crate::commands::ControlCommand;
use loopcam_core::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Read controller lines until EOF and forward decoded commands.
///
/// Unrecognized lines are skipped. Stops early, without error, once the
/// receiving side is gone. Returns the number of commands forwarded.
pub async fn run_lines<R>(reader: R, sender: mpsc::Sender<ControlCommand>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    while let Some(line) = lines.next_line().await? {
        let Some(command) = ControlCommand::parse(&line) else {
            trace!(line = %line.trim(), "Ignoring controller line");
            continue;
        };
        debug!(?command, "Controller command");
        if sender.send(command).await.is_err() {
            info!("Command receiver closed, controller input stopped");
            return Ok(forwarded);
        }
        forwarded += 1;
    }
    info!(forwarded, "Controller input ended");
    Ok(forwarded)
}
