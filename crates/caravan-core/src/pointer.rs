// Author: Dustin Pilgrim
// License: MIT
//
// Virtual pointer driver. Every event is closed with a frame and followed by
// a blocking roundtrip so the compositor has applied it before the caller
// reads the screen or sends the next event.

use crate::canvas::CanvasTransform;
use crate::error::PointerError;
use crate::rect::Point;

// linux/input-event-codes.h
pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
}

impl Button {
    pub fn code(self) -> u32 {
        match self {
            Button::Left => BTN_LEFT,
            Button::Right => BTN_RIGHT,
            Button::Middle => BTN_MIDDLE,
        }
    }
}

/// Raw requests of a virtual pointer object.
pub trait PointerBackend {
    fn motion_absolute(&mut self, x: u32, y: u32, x_extent: u32, y_extent: u32);

    fn button(&mut self, code: u32, pressed: bool);

    /// Vertical scroll, reported with a wheel axis source.
    fn wheel(&mut self, value: f64);

    fn frame(&mut self);

    /// Block until the compositor acknowledged everything sent so far.
    fn roundtrip(&mut self) -> Result<(), PointerError>;
}

pub struct VirtualPointerDriver<B> {
    backend: B,
    transform: CanvasTransform,
}

impl<B: PointerBackend> VirtualPointerDriver<B> {
    pub fn new(backend: B, transform: CanvasTransform) -> Self {
        Self { backend, transform }
    }

    pub fn transform(&self) -> &CanvasTransform {
        &self.transform
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Move to `(x, y)` and return the point that was transmitted.
    ///
    /// With `real_coords == false` the point is on the 1920x1080 canvas and is
    /// scaled by the resolution ratio. With `real_coords == true` it is already
    /// in physical pixels (e.g. a template match) and is divided by the output
    /// scale instead, and sent against the equally compensated extent.
    pub fn move_to(&mut self, x: f64, y: f64, real_coords: bool) -> Result<Point, PointerError> {
        let (p, (xe, ye)) = if real_coords {
            (self.transform.compensate(x, y), self.transform.compensated_extent())
        } else {
            (self.transform.to_physical(x, y), self.transform.extent())
        };

        self.backend
            .motion_absolute(p.x.max(0) as u32, p.y.max(0) as u32, xe, ye);
        self.commit()?;
        Ok(p)
    }

    /// Press then release. Each half is its own frame and roundtrip.
    pub fn click(&mut self, button: Button) -> Result<(), PointerError> {
        let code = button.code();

        self.backend.button(code, true);
        self.commit()?;

        self.backend.button(code, false);
        self.commit()
    }

    /// Positive values scroll down.
    pub fn wheel(&mut self, value: f64) -> Result<(), PointerError> {
        self.backend.wheel(value);
        self.commit()
    }

    fn commit(&mut self) -> Result<(), PointerError> {
        self.backend.frame();
        self.backend.roundtrip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{PointerOp, RecordingPointer};

    fn uhd_driver() -> VirtualPointerDriver<RecordingPointer> {
        VirtualPointerDriver::new(
            RecordingPointer::new(),
            CanvasTransform::new((2.0, 2.0), 2.0, (0, 0)),
        )
    }

    #[test]
    fn canvas_move_on_uhd_output() {
        let mut drv = uhd_driver();
        let p = drv.move_to(325.0, 1050.0, false).unwrap();

        assert_eq!(p, Point::new(650, 2100));
        assert_eq!(
            drv.backend().ops(),
            vec![
                PointerOp::Motion { x: 650, y: 2100, x_extent: 3840, y_extent: 2160 },
                PointerOp::Frame,
                PointerOp::Roundtrip,
            ]
        );
    }

    #[test]
    fn real_coords_are_scale_compensated() {
        let mut drv = uhd_driver();
        let physical = drv.move_to(325.0, 1050.0, false).unwrap();
        let back = drv
            .move_to(f64::from(physical.x), f64::from(physical.y), true)
            .unwrap();

        assert_eq!(back, Point::new(325, 1050));
        assert_eq!(
            drv.backend().ops()[3],
            PointerOp::Motion { x: 325, y: 1050, x_extent: 1920, y_extent: 1080 }
        );
    }

    #[test]
    fn real_coords_land_on_the_physical_point() {
        let mut drv = uhd_driver();
        drv.move_to(650.0, 2100.0, true).unwrap();

        let (fx, fy) = drv.backend().motion_fractions()[0];
        assert!((fx - 650.0 / 3840.0).abs() < 1e-9);
        assert!((fy - 2100.0 / 2160.0).abs() < 1e-9);
    }

    #[test]
    fn real_coords_land_on_the_physical_point_at_fractional_scale() {
        // 2400x1350 panel at 1.25: 1920x1080 logical.
        let mut drv = VirtualPointerDriver::new(
            RecordingPointer::new(),
            CanvasTransform::new((1.25, 1.25), 1.25, (0, 0)),
        );
        drv.move_to(650.0, 1000.0, true).unwrap();

        assert_eq!(
            drv.backend().ops()[0],
            PointerOp::Motion { x: 520, y: 800, x_extent: 1920, y_extent: 1080 }
        );
        let (fx, fy) = drv.backend().motion_fractions()[0];
        assert!((fx - 650.0 / 2400.0).abs() < 1e-9);
        assert!((fy - 1000.0 / 1350.0).abs() < 1e-9);
    }

    #[test]
    fn negative_points_clamp_to_zero() {
        let mut drv = uhd_driver();
        drv.move_to(-5.0, 10.0, false).unwrap();

        assert_eq!(
            drv.backend().ops()[0],
            PointerOp::Motion { x: 0, y: 20, x_extent: 3840, y_extent: 2160 }
        );
    }

    #[test]
    fn click_is_press_then_release() {
        let mut drv = uhd_driver();
        drv.click(Button::Left).unwrap();

        assert_eq!(
            drv.backend().ops(),
            vec![
                PointerOp::Button { code: BTN_LEFT, pressed: true },
                PointerOp::Frame,
                PointerOp::Roundtrip,
                PointerOp::Button { code: BTN_LEFT, pressed: false },
                PointerOp::Frame,
                PointerOp::Roundtrip,
            ]
        );
    }

    #[test]
    fn wheel_is_framed_and_roundtripped() {
        let mut drv = uhd_driver();
        drv.wheel(120.0).unwrap();

        assert_eq!(
            drv.backend().ops(),
            vec![PointerOp::Wheel(120.0), PointerOp::Frame, PointerOp::Roundtrip]
        );
    }

    #[test]
    fn roundtrip_failure_stops_click_halfway() {
        let mut drv = VirtualPointerDriver::new(
            RecordingPointer::failing(),
            CanvasTransform::new((1.0, 1.0), 1.0, (0, 0)),
        );

        assert!(drv.click(Button::Right).is_err());
        assert_eq!(drv.backend().presses(), 1);
        assert_eq!(drv.backend().releases(), 0);
    }
}
