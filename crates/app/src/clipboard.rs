//! Clipboard access for sharing the public link

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{AppError, Result};

/// Copy text, falling back to wl-copy when arboard has no usable backend
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let arboard_error = match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => {
            tracing::debug!("Copied to clipboard via arboard");
            return Ok(());
        }
        Err(e) => e.to_string(),
    };

    if pipe_text("wl-copy", text) {
        tracing::debug!("Copied to clipboard via wl-copy");
        return Ok(());
    }

    tracing::warn!("All clipboard methods failed");
    Err(AppError::Clipboard(arboard_error))
}

/// Feed `text` to a clipboard helper on stdin. The child is always reaped.
fn pipe_text(program: &str, text: &str) -> bool {
    let mut child = match Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(_) => return false,
    };

    // stdin is dropped at the end of the arm so the helper sees EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()).is_ok(),
        None => false,
    };
    if !written {
        let _ = child.kill();
    }

    let exited_ok = matches!(child.wait(), Ok(status) if status.success());
    written && exited_ok
}
