//! Preview renderer — current document → isolated rendering context.
//!
//! DESIGN
//! ======
//! The renderer exclusively owns one rendering context. It never patches a
//! context: every new `(html, version)` and every forced reload builds a
//! fresh context with a new id and drops the old one. The browser side
//! mirrors this by replacing the whole iframe element whenever the context
//! id changes, so a script crash inside a document cannot outlive a reload.
//!
//! Isolation is the iframe sandbox: scripts, modals, and same-origin form
//! posts are allowed; top-level navigation is not. With same-origin allowed,
//! frame scripts share the host page's origin and can reach its API.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::GeneratedDocument;

/// Sandbox tokens for the rendering context. Excludes `allow-top-navigation`.
pub const SANDBOX_POLICY: &str = "allow-scripts allow-forms allow-modals allow-same-origin";
pub const FRAME_PATH: &str = "/preview/frame";
const FRAME_TITLE: &str = "Helbulid Preview";

const PLACEHOLDER_PAGE: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head><meta charset=\"utf-8\"><title>Preview</title></head>
<body style=\"margin:0;height:100vh;display:flex;align-items:center;justify-content:center;font-family:sans-serif;color:#71717a;background:#18181b\">
<p>Generated website will appear here</p>
</body>
</html>
";

// =============================================================================
// DEVICE VIEW
// =============================================================================

/// Width preset for the preview frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceView {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceView {
    /// Maximum frame width in CSS pixels; `None` means full width.
    #[must_use]
    pub fn max_width_px(self) -> Option<u32> {
        match self {
            Self::Desktop => None,
            Self::Tablet => Some(768),
            Self::Mobile => Some(375),
        }
    }
}

// =============================================================================
// RENDERER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderedDocument {
    html: String,
    version: u64,
}

#[derive(Debug)]
struct RenderingContext {
    id: u64,
    document: Option<RenderedDocument>,
}

/// Public view of the renderer for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewSnapshot {
    pub context_id: u64,
    /// Version on screen, 0 before the first document.
    pub version: u64,
    pub has_document: bool,
    pub reloads: u64,
}

#[derive(Debug)]
pub struct PreviewRenderer {
    context: RenderingContext,
    reloads: u64,
}

impl PreviewRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self { context: RenderingContext { id: 0, document: None }, reloads: 0 }
    }

    /// Replace the rendered content with `html` at `version`.
    ///
    /// Returns `false` when nothing changed: the same pair is already on
    /// screen, or `version` is older than the one on screen.
    pub fn render(&mut self, html: &str, version: u64) -> bool {
        if let Some(current) = &self.context.document {
            if version < current.version || (version == current.version && html == current.html) {
                debug!(version, current = current.version, "preview: render skipped");
                return false;
            }
        }

        let document = Some(RenderedDocument { html: html.to_string(), version });
        self.rebuild(document);
        info!(version, context_id = self.context.id, "preview: rendered");
        true
    }

    /// Tear down and rebuild the context with unchanged content. Returns the new context id.
    pub fn force_reload(&mut self) -> u64 {
        let document = self.context.document.take();
        self.rebuild(document);
        self.reloads += 1;
        info!(context_id = self.context.id, reloads = self.reloads, "preview: forced reload");
        self.context.id
    }

    fn rebuild(&mut self, document: Option<RenderedDocument>) {
        self.context = RenderingContext { id: self.context.id + 1, document };
    }

    #[must_use]
    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            context_id: self.context.id,
            version: self.context.document.as_ref().map_or(0, |d| d.version),
            has_document: self.has_content(),
            reloads: self.reloads,
        }
    }

    fn has_content(&self) -> bool {
        self.context
            .document
            .as_ref()
            .is_some_and(|d| !d.html.trim().is_empty())
    }

    /// The document served inside the frame: the current html or a placeholder page.
    #[must_use]
    pub fn frame_document(&self) -> &str {
        match &self.context.document {
            Some(doc) if !doc.html.trim().is_empty() => &doc.html,
            _ => PLACEHOLDER_PAGE,
        }
    }

    /// Markup for the host page: a sandboxed iframe bound to the current context,
    /// or a placeholder block when there is nothing to show.
    #[must_use]
    pub fn frame_element(&self, device: DeviceView) -> String {
        if !self.has_content() {
            return "<div class=\"preview-placeholder\"><p>Generated website will appear here</p></div>".to_string();
        }

        let style = match device.max_width_px() {
            Some(px) => format!("width:100%;height:100%;border:0;max-width:{px}px"),
            None => "width:100%;height:100%;border:0".to_string(),
        };
        format!(
            "<iframe title=\"{FRAME_TITLE}\" data-context=\"{id}\" sandbox=\"{SANDBOX_POLICY}\" \
             src=\"{FRAME_PATH}?ctx={id}\" style=\"{style}\"></iframe>",
            id = self.context.id,
        )
    }
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DOCUMENT FEED
// =============================================================================

/// Render whatever the channel currently holds. Returns `true` if the renderer changed.
pub fn apply_latest(documents: &mut watch::Receiver<Option<GeneratedDocument>>, renderer: &RwLock<PreviewRenderer>) -> bool {
    let latest = documents.borrow_and_update().clone();
    let Some(doc) = latest else {
        return false;
    };
    renderer
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .render(&doc.html, doc.version)
}

/// Spawn the task that re-renders the preview on every new document.
pub fn spawn_preview_task(
    mut documents: watch::Receiver<Option<GeneratedDocument>>,
    renderer: Arc<RwLock<PreviewRenderer>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        apply_latest(&mut documents, &renderer);
        while documents.changed().await.is_ok() {
            apply_latest(&mut documents, &renderer);
        }
        debug!("preview: document channel closed");
    })
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
