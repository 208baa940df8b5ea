// Author: Dustin Pilgrim
// License: MIT
//
// All automation coordinates are authored against a fixed 1920x1080 canvas.
//
// Conventions:
// - Pointer motion is output-relative: the virtual pointer is bound to the
//   current output and the extent is that output's pixel size. Points that
//   were divided by the scale go out against an extent divided the same way.
// - Capture geometry is layout-relative: grim takes logical coordinates in the
//   global desktop space, so the output's logical position is added there.

use crate::matcher::Match;
use crate::output::Output;
use crate::error::GeometryError;
use crate::rect::{Point, Rect};

pub const CANVAS_WIDTH: f64 = 1920.0;
pub const CANVAS_HEIGHT: f64 = 1080.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    /// (output width / 1920, output height / 1080)
    pub ratio: (f64, f64),
    pub scale: f64,
    /// Logical position of the output in the desktop layout.
    pub origin: (i32, i32),
}

impl CanvasTransform {
    pub fn new(ratio: (f64, f64), scale: f64, origin: (i32, i32)) -> Self {
        Self { ratio, scale, origin }
    }

    pub fn for_output(output: &Output) -> Result<Self, GeometryError> {
        if !output.has_mode() {
            return Err(GeometryError::SizeUnresolved(output.id));
        }
        if output.scale <= 0.0 {
            return Err(GeometryError::ScaleUnresolved(output.id));
        }
        Ok(Self::new(
            (
                f64::from(output.width) / CANVAS_WIDTH,
                f64::from(output.height) / CANVAS_HEIGHT,
            ),
            output.scale,
            output.position.unwrap_or((0, 0)),
        ))
    }

    /// Extent every absolute motion is reported against.
    pub fn extent(&self) -> (u32, u32) {
        let (xr, yr) = self.ratio;
        ((CANVAS_WIDTH * xr) as u32, (CANVAS_HEIGHT * yr) as u32)
    }

    /// Extent for points already divided by the scale, so that the landing
    /// fraction stays `physical / output_px`.
    pub fn compensated_extent(&self) -> (u32, u32) {
        let (xe, ye) = self.extent();
        (
            (f64::from(xe) / self.scale) as u32,
            (f64::from(ye) / self.scale) as u32,
        )
    }

    /// Canvas point -> physical pixel point on the current output.
    pub fn to_physical(&self, x: f64, y: f64) -> Point {
        let (xr, yr) = self.ratio;
        Point::new((x * xr) as i32, (y * yr) as i32)
    }

    /// Physical pixel point -> scale-compensated point.
    pub fn compensate(&self, x: f64, y: f64) -> Point {
        Point::new((x / self.scale) as i32, (y / self.scale) as i32)
    }

    /// Region of the current output, given in canvas units, expressed as a
    /// capture request.
    pub fn capture_region(&self, area: Rect) -> CaptureRegion {
        let origin = self.to_physical(f64::from(area.x), f64::from(area.y));
        let size = self.to_physical(f64::from(area.w), f64::from(area.h));

        let (ox, oy) = self.origin;
        let logical_origin = self.compensate(f64::from(origin.x), f64::from(origin.y));
        let logical_size = self.compensate(f64::from(size.x), f64::from(size.y));

        CaptureRegion {
            x: ox + logical_origin.x,
            y: oy + logical_origin.y,
            w: logical_size.x.max(1),
            h: logical_size.y.max(1),
            physical_origin: origin,
        }
    }
}

/// A capture request in desktop-logical coordinates, remembering where its
/// top-left sits in output-relative physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub physical_origin: Point,
}

impl CaptureRegion {
    /// `X,Y WxH`, the geometry syntax slurp and grim use.
    pub fn geometry(&self) -> String {
        format!("{},{} {}x{}", self.x, self.y, self.w, self.h)
    }

    /// Capture-pixel match position -> output-relative physical pixels.
    pub fn reproject(&self, m: &Match) -> Point {
        Point::new(
            self.physical_origin.x + m.left,
            self.physical_origin.y + m.top,
        )
    }
}
