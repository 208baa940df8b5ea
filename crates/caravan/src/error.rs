// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use caravan_core::{CaptureError, GeometryError, LocateError, PointerError};
use thiserror::Error;

use crate::wayland::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("failed to find previous route after {attempts} scrolls")]
    RouteNotFound { attempts: u32 },

    #[error("{0}")]
    Config(String),

    #[error("template {path}: {source}")]
    Template {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("{0} window not currently active")]
    NotFocused(String),

    #[error("focus check: {0}")]
    Focus(String),
}
