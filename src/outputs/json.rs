//! JSON output for the command-line front end.
//!
//! Results go to stdout unless an output path is given, in which case the
//! parent directory is created as needed. Logs never share stdout.

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Render `value` as pretty-printed JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Write `value` as pretty JSON to `output`, or to stdout when `None`.
#[instrument(level = "info", skip(value))]
pub async fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = to_pretty_json(value)?;
    match output {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).await?;
            }
            fs::write(path, &json).await?;
            info!(path = %path.display(), bytes = json.len(), "Wrote JSON");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
