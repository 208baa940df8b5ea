// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

/// Compositor geometry that was expected to be known but isn't.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("no current output reported by the compositor")]
    NoCurrentOutput,

    #[error("output {0} has no current mode")]
    SizeUnresolved(u32),

    #[error("scale factor of output {0} not resolved")]
    ScaleUnresolved(u32),

    #[error("unknown output {0:?}")]
    UnknownOutput(String),
}

#[derive(Debug, Error)]
pub enum PointerError {
    #[error("virtual pointer roundtrip failed: {0}")]
    Roundtrip(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture buffer: {0}")]
    Buffer(#[from] std::io::Error),

    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Status { program: String, status: String },

    #[error("capture produced no data")]
    Empty,

    #[error("decode frame: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("template not found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
