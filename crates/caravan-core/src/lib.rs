// Author: Dustin Pilgrim
// License: MIT

pub mod canvas;
pub mod error;
pub mod locate;
pub mod matcher;
pub mod mock;
pub mod output;
pub mod pointer;
pub mod rect;

pub use canvas::{CanvasTransform, CaptureRegion, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use error::{CaptureError, GeometryError, LocateError, PointerError};
pub use locate::{Alarm, FrameSource, Located, ScreenLocator};
pub use matcher::{Match, StrideMatcher, TemplateMatcher};
pub use output::{Output, OutputRegistry};
pub use pointer::{Button, PointerBackend, VirtualPointerDriver};
pub use rect::{Point, Rect};
