// Author: Dustin Pilgrim
// License: MIT
//
// Region capture through grim. grim writes a PPM to stdout, which is pointed
// at a memfd private to this process; the frame is decoded from a mapping of
// that memfd and the fd is closed as soon as the buffer goes out of scope.

use std::fs::File;
use std::os::fd::{FromRawFd, OwnedFd};
use std::process::{Command, Stdio};

use caravan_core::{CaptureError, CaptureRegion, FrameSource};
use eventline::debug;
use image::{GrayImage, ImageFormat};
use memmap2::Mmap;

/// Short-lived buffer a capture subprocess writes into. Closed on drop.
pub struct CaptureBuffer {
    file: File,
}

impl CaptureBuffer {
    pub fn acquire() -> Result<Self, CaptureError> {
        let fd = unsafe { libc::memfd_create(c"caravan-capture".as_ptr(), libc::MFD_CLOEXEC) };

        let file = if fd >= 0 {
            // SAFETY: memfd_create returned a fresh descriptor we now own.
            File::from(unsafe { OwnedFd::from_raw_fd(fd) })
        } else {
            debug!(
                "memfd_create failed ({}), using a temp file",
                std::io::Error::last_os_error()
            );
            tempfile::tempfile()?
        };

        Ok(Self { file })
    }

    /// A stdout handle for the subprocess, sharing the same open file.
    pub fn stdio(&self) -> Result<Stdio, CaptureError> {
        Ok(Stdio::from(self.file.try_clone()?))
    }

    fn len(&self) -> Result<u64, CaptureError> {
        Ok(self.file.metadata()?.len())
    }

    pub fn map(&self) -> Result<Mmap, CaptureError> {
        if self.len()? == 0 {
            return Err(CaptureError::Empty);
        }
        // SAFETY: the writer has exited; nothing else holds this memfd.
        Ok(unsafe { Mmap::map(&self.file)? })
    }
}

pub struct GrimSource {
    program: String,
}

impl GrimSource {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

pub fn grim_args(region: &CaptureRegion) -> Vec<String> {
    vec![
        "-t".into(),
        "ppm".into(),
        "-g".into(),
        region.geometry(),
        "-".into(),
    ]
}

impl FrameSource for GrimSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage, CaptureError> {
        let buffer = CaptureBuffer::acquire()?;

        let status = Command::new(&self.program)
            .args(grim_args(region))
            .stdin(Stdio::null())
            .stdout(buffer.stdio()?)
            .status()
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CaptureError::Status {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        let frame = {
            let map = buffer.map()?;
            image::load_from_memory_with_format(&map, ImageFormat::Pnm)?
        };
        debug!(
            "captured {} -> {}x{}",
            region.geometry(),
            frame.width(),
            frame.height()
        );

        Ok(frame.to_luma8())
    }
}
