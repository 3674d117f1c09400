//! Printable rendering seam

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Rendering failures. These are logged and never abort a run.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer cannot handle this kind of document
    #[error("Cannot render {0}")]
    Unsupported(PathBuf),

    /// The external renderer failed
    #[error("Rendering {path} failed: {message}")]
    Failed {
        /// Document being rendered
        path: PathBuf,
        /// Failure reported by the renderer
        message: String,
    },
}

/// Produces a printable artifact next to a saved document
pub trait Renderer {
    /// Render the document at `path`, returning the artifact path
    fn render(&self, path: &Path) -> Result<PathBuf, RenderError>;
}

/// Renderer that produces nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&self, path: &Path) -> Result<PathBuf, RenderError> {
        Ok(path.to_path_buf())
    }
}
