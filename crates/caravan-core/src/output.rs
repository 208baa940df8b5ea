// Author: Dustin Pilgrim
// License: MIT
//
// Output geometry accumulated from wl_output / xdg_output events.
// Events arrive piecemeal over two roundtrips; the registry folds them into
// whole records and answers "which output is current and how is it scaled".

use crate::canvas::CanvasTransform;
use crate::error::GeometryError;

/// `wl_output.mode` flag bits.
pub const MODE_CURRENT: u32 = 0x1;
pub const MODE_PREFERRED: u32 = 0x2;

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Registry global name of the wl_output.
    pub id: u32,

    /// Connector name (e.g. "DP-1") when the compositor sends one.
    pub name: Option<String>,

    /// Logical position in the global desktop space, from xdg_output.
    pub position: Option<(i32, i32)>,

    /// Pixel size of the current mode. Zero until a current mode was seen.
    pub width: i32,
    pub height: i32,

    /// Effective scale. Zero until resolved.
    pub scale: f64,

    pub current: bool,

    reported_scale: f64,
    logical_size: Option<(i32, i32)>,
}

impl Output {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            position: None,
            width: 0,
            height: 0,
            scale: 0.0,
            current: false,
            reported_scale: 0.0,
            logical_size: None,
        }
    }

    pub fn has_mode(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn logical_size(&self) -> Option<(i32, i32)> {
        self.logical_size
    }

    // Prefer mode/logical ratio (covers fractional scaling); fall back to the
    // integer wl_output.scale. max() on both sides keeps rotated outputs right.
    fn refresh_scale(&mut self) {
        if let Some((lw, lh)) = self.logical_size {
            let logical = lw.max(lh);
            if logical > 0 && self.has_mode() {
                self.scale = f64::from(self.width.max(self.height)) / f64::from(logical);
                return;
            }
        }
        self.scale = self.reported_scale;
    }
}

#[derive(Debug, Default)]
pub struct OutputRegistry {
    outputs: Vec<Output>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output (no-op if known) and return it.
    pub fn insert(&mut self, id: u32) -> &mut Output {
        let idx = match self.outputs.iter().position(|o| o.id == id) {
            Some(idx) => idx,
            None => {
                self.outputs.push(Output::new(id));
                self.outputs.len() - 1
            }
        };
        &mut self.outputs[idx]
    }

    pub fn on_mode(&mut self, id: u32, flags: u32, width: i32, height: i32) {
        self.insert(id);

        if flags & MODE_CURRENT == 0 {
            return;
        }

        for o in self.outputs.iter_mut() {
            if o.id == id {
                o.current = true;
                o.width = width;
                o.height = height;
                o.refresh_scale();
            } else {
                o.current = false;
            }
        }
    }

    pub fn on_scale(&mut self, id: u32, factor: f64) {
        let o = self.insert(id);
        if factor > 0.0 {
            o.reported_scale = factor;
            o.refresh_scale();
        }
    }

    pub fn on_logical_position(&mut self, id: u32, x: i32, y: i32) {
        self.insert(id).position = Some((x, y));
    }

    pub fn on_logical_size(&mut self, id: u32, width: i32, height: i32) {
        let o = self.insert(id);
        o.logical_size = Some((width, height));
        o.refresh_scale();
    }

    pub fn on_name(&mut self, id: u32, name: impl Into<String>) {
        self.insert(id).name = Some(name.into());
    }

    /// Pin the current output by connector name.
    pub fn set_current_by_name(&mut self, name: &str) -> Result<(), GeometryError> {
        if !self.outputs.iter().any(|o| o.name.as_deref() == Some(name)) {
            return Err(GeometryError::UnknownOutput(name.to_string()));
        }

        for o in self.outputs.iter_mut() {
            o.current = o.name.as_deref() == Some(name);
        }
        Ok(())
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn get(&self, id: u32) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub fn current(&self) -> Result<&Output, GeometryError> {
        self.outputs
            .iter()
            .find(|o| o.current)
            .ok_or(GeometryError::NoCurrentOutput)
    }

    /// Current output size relative to the 1920x1080 canvas.
    pub fn resolution_ratio(&self) -> Result<(f64, f64), GeometryError> {
        let cur = self.current()?;
        if !cur.has_mode() {
            return Err(GeometryError::SizeUnresolved(cur.id));
        }
        Ok((
            f64::from(cur.width) / crate::CANVAS_WIDTH,
            f64::from(cur.height) / crate::CANVAS_HEIGHT,
        ))
    }

    pub fn scale_factor(&self) -> Result<f64, GeometryError> {
        let cur = self.current()?;
        if cur.scale <= 0.0 {
            return Err(GeometryError::ScaleUnresolved(cur.id));
        }
        Ok(cur.scale)
    }

    /// Snapshot of everything pointer and capture math needs.
    pub fn transform(&self) -> Result<CanvasTransform, GeometryError> {
        CanvasTransform::for_output(self.current()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uhd_registry() -> OutputRegistry {
        let mut reg = OutputRegistry::new();
        reg.on_mode(7, MODE_CURRENT | MODE_PREFERRED, 3840, 2160);
        reg.on_scale(7, 2.0);
        reg.on_logical_position(7, 0, 0);
        reg
    }

    #[test]
    fn no_current_output_is_an_error() {
        let mut reg = OutputRegistry::new();
        reg.on_mode(1, 0, 1920, 1080);
        reg.on_scale(1, 1.0);

        assert!(matches!(reg.current(), Err(GeometryError::NoCurrentOutput)));
        assert!(matches!(reg.resolution_ratio(), Err(GeometryError::NoCurrentOutput)));
    }

    #[test]
    fn resolution_ratio_follows_current_mode() {
        let reg = uhd_registry();
        assert_eq!(reg.resolution_ratio().unwrap(), (2.0, 2.0));
        assert_eq!(reg.scale_factor().unwrap(), 2.0);
    }

    #[test]
    fn non_current_mode_leaves_size_alone() {
        let mut reg = uhd_registry();
        reg.on_mode(7, MODE_PREFERRED, 1280, 720);

        let cur = reg.current().unwrap();
        assert_eq!((cur.width, cur.height), (3840, 2160));
    }

    #[test]
    fn exactly_one_output_is_current() {
        let mut reg = uhd_registry();
        reg.on_mode(9, MODE_CURRENT, 2560, 1440);
        reg.on_scale(9, 1.0);

        let current: Vec<u32> = reg.outputs().iter().filter(|o| o.current).map(|o| o.id).collect();
        assert_eq!(current, vec![9]);

        let (xr, yr) = reg.resolution_ratio().unwrap();
        assert!((xr - 2560.0 / 1920.0).abs() < 1e-9);
        assert!((yr - 1440.0 / 1080.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_differs_between_sessions_with_different_current_output() {
        let a = uhd_registry();

        let mut b = OutputRegistry::new();
        b.on_mode(7, 0, 3840, 2160);
        b.on_mode(8, MODE_CURRENT, 1920, 1080);
        b.on_scale(8, 1.0);

        assert_eq!(a.resolution_ratio().unwrap(), (2.0, 2.0));
        assert_eq!(b.resolution_ratio().unwrap(), (1.0, 1.0));
    }

    #[test]
    fn unresolved_scale_is_an_error() {
        let mut reg = OutputRegistry::new();
        reg.on_mode(3, MODE_CURRENT, 1920, 1080);

        assert!(matches!(reg.scale_factor(), Err(GeometryError::ScaleUnresolved(3))));
        assert!(reg.transform().is_err());
    }

    #[test]
    fn logical_size_gives_fractional_scale() {
        let mut reg = OutputRegistry::new();
        reg.on_scale(4, 2.0);
        reg.on_logical_size(4, 1536, 864);
        reg.on_mode(4, MODE_CURRENT, 1920, 1080);

        assert!((reg.scale_factor().unwrap() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn pin_current_output_by_name() {
        let mut reg = uhd_registry();
        reg.on_name(7, "DP-1");
        reg.on_mode(8, 0, 1920, 1080);
        reg.on_name(8, "HDMI-A-1");

        reg.set_current_by_name("HDMI-A-1").unwrap();
        assert_eq!(reg.current().unwrap().id, 8);

        assert!(matches!(
            reg.set_current_by_name("eDP-1"),
            Err(GeometryError::UnknownOutput(_))
        ));
        assert_eq!(reg.current().unwrap().id, 8);
    }

    #[test]
    fn transform_carries_logical_position() {
        let mut reg = uhd_registry();
        reg.on_logical_position(7, 1920, 0);

        let t = reg.transform().unwrap();
        assert_eq!(t.origin, (1920, 0));
        assert_eq!(t.extent(), (3840, 2160));
    }
}
