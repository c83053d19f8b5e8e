//! Render surfaces for generated markup.
//!
//! Generated markup is untrusted. [`SandboxedPreview`] never serves it directly:
//! it writes a host page that embeds the markup through `srcdoc` in an iframe
//! with `sandbox="allow-scripts"`, so scripts run but get an opaque origin with no
//! access to the host page, its storage, or top-level navigation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RenderError;

pub const PREVIEW_FILE_NAME: &str = "preview.html";
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// A one-shot "replace everything" display capability.
pub trait RenderSurface: Send {
    /// Discard whatever is shown and show `markup` instead.
    fn display(&mut self, markup: &str) -> Result<(), RenderError>;
}

/// Writes a sandboxed host page to disk for a browser to show.
pub struct SandboxedPreview {
    path: PathBuf,
}

impl SandboxedPreview {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(PREVIEW_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSurface for SandboxedPreview {
    fn display(&mut self, markup: &str) -> Result<(), RenderError> {
        let io_err = |source| RenderError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write-then-rename so a browser reload never sees a half-written page
        let tmp = self.path.with_extension("html.tmp");
        fs::write(&tmp, host_page(markup)).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        log::debug!("Rendered {} bytes of markup to {}", markup.len(), self.path.display());
        Ok(())
    }
}

/// The host page: a full-viewport sandboxed iframe carrying the markup.
pub fn host_page(markup: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>artifex preview</title>
<style>
  html, body {{ margin: 0; height: 100%; background: #fff; }}
  iframe {{ border: 0; width: 100%; height: 100%; display: block; }}
</style>
</head>
<body>
<iframe title="Preview" sandbox="{policy}" srcdoc="{srcdoc}"></iframe>
</body>
</html>
"#,
        policy = SANDBOX_POLICY,
        srcdoc = escape_attribute(markup),
    )
}

/// Escape for a double-quoted HTML attribute value.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
