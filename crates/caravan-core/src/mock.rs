// Author: Dustin Pilgrim
// License: MIT
//
// In-memory stand-ins for the compositor, the capture tool and the alarm.
// They record what they were asked to do so tests can assert on order.

use std::collections::VecDeque;

use image::GrayImage;

use crate::canvas::CaptureRegion;
use crate::error::{CaptureError, PointerError};
use crate::locate::{Alarm, FrameSource};
use crate::pointer::PointerBackend;

#[derive(Debug, Clone, PartialEq)]
pub enum PointerOp {
    Motion {
        x: u32,
        y: u32,
        x_extent: u32,
        y_extent: u32,
    },
    Button {
        code: u32,
        pressed: bool,
    },
    Wheel(f64),
    Frame,
    Roundtrip,
}

#[derive(Debug, Default)]
pub struct RecordingPointer {
    ops: Vec<PointerOp>,
    fail_roundtrip: bool,
}

impl RecordingPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every roundtrip fails, as if the compositor went away.
    pub fn failing() -> Self {
        Self {
            ops: Vec::new(),
            fail_roundtrip: true,
        }
    }

    pub fn ops(&self) -> Vec<PointerOp> {
        self.ops.clone()
    }

    pub fn motions(&self) -> Vec<(u32, u32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PointerOp::Motion { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    /// Where each motion lands as a fraction of its extent.
    pub fn motion_fractions(&self) -> Vec<(f64, f64)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PointerOp::Motion {
                    x,
                    y,
                    x_extent,
                    y_extent,
                } => Some((
                    f64::from(*x) / f64::from(*x_extent),
                    f64::from(*y) / f64::from(*y_extent),
                )),
                _ => None,
            })
            .collect()
    }

    pub fn wheels(&self) -> Vec<f64> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PointerOp::Wheel(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn presses(&self) -> usize {
        self.count_buttons(true)
    }

    pub fn releases(&self) -> usize {
        self.count_buttons(false)
    }

    fn count_buttons(&self, state: bool) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PointerOp::Button { pressed, .. } if *pressed == state))
            .count()
    }
}

impl PointerBackend for RecordingPointer {
    fn motion_absolute(&mut self, x: u32, y: u32, x_extent: u32, y_extent: u32) {
        self.ops.push(PointerOp::Motion {
            x,
            y,
            x_extent,
            y_extent,
        });
    }

    fn button(&mut self, code: u32, pressed: bool) {
        self.ops.push(PointerOp::Button { code, pressed });
    }

    fn wheel(&mut self, value: f64) {
        self.ops.push(PointerOp::Wheel(value));
    }

    fn frame(&mut self) {
        self.ops.push(PointerOp::Frame);
    }

    fn roundtrip(&mut self) -> Result<(), PointerError> {
        if self.fail_roundtrip {
            return Err(PointerError::Roundtrip("mock compositor gone".into()));
        }
        self.ops.push(PointerOp::Roundtrip);
        Ok(())
    }
}

/// Hands out pre-recorded frames; the last one repeats once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<GrayImage>,
    last: Option<GrayImage>,
    fail: bool,
    regions: Vec<CaptureRegion>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self {
            frames: frames.into(),
            ..Self::default()
        }
    }

    pub fn repeating(frame: GrayImage) -> Self {
        Self {
            last: Some(frame),
            ..Self::default()
        }
    }

    /// Every capture fails with `CaptureError::Empty`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn captures(&self) -> usize {
        self.regions.len()
    }

    pub fn regions(&self) -> &[CaptureRegion] {
        &self.regions
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage, CaptureError> {
        self.regions.push(*region);

        if self.fail {
            return Err(CaptureError::Empty);
        }

        if let Some(frame) = self.frames.pop_front() {
            self.last = Some(frame.clone());
            return Ok(frame);
        }

        self.last.clone().ok_or(CaptureError::Empty)
    }
}

#[derive(Debug, Default)]
pub struct CountingAlarm {
    reasons: Vec<String>,
}

impl CountingAlarm {
    pub fn rings(&self) -> usize {
        self.reasons.len()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

impl Alarm for CountingAlarm {
    fn ring(&mut self, reason: &str) {
        self.reasons.push(reason.to_string());
    }
}
