// Author: Dustin Pilgrim
// License: MIT
//
// The trade route screen. Coordinates are canvas (1920x1080) positions of the
// game's UI at that resolution.

use std::thread;
use std::time::Duration;

use caravan_core::{
    Alarm, Button, FrameSource, LocateError, Located, PointerBackend, Rect, ScreenLocator,
    TemplateMatcher, VirtualPointerDriver,
};
use eventline::{debug, info};
use image::GrayImage;

use crate::error::AppError;

/// "Establish Trade Route" button in the unit panel.
pub const ESTABLISH_ROUTE: (f64, f64) = (325.0, 1050.0);
/// Clicking here scrolls the route list back to its first entry.
pub const LIST_TOP: (f64, f64) = (10.0, 300.0);
/// Somewhere over the list, so wheel events scroll it.
pub const ROUTE_LIST: (f64, f64) = (420.0, 450.0);
/// "Yes" in the confirmation dialog.
pub const CONFIRM_YES: (f64, f64) = (850.0, 525.0);

/// Left strip of the screen holding the route list.
pub const SEARCH_AREA: Rect = Rect::new(0, 0, 250, 1050);

#[derive(Debug, Clone, Copy)]
pub struct RouteSettings {
    pub max_attempts: u32,
    pub scroll_value: f64,
    pub settle: Duration,
}

fn settle(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}

fn click_at<B: PointerBackend>(
    pointer: &mut VirtualPointerDriver<B>,
    (x, y): (f64, f64),
) -> Result<(), AppError> {
    pointer.move_to(x, y, false)?;
    pointer.click(Button::Left)?;
    Ok(())
}

/// Open the route dialog, find the previous route in the list and confirm it.
pub fn reestablish<B, S, M, A>(
    pointer: &mut VirtualPointerDriver<B>,
    locator: &mut ScreenLocator<S, M, A>,
    template: &GrayImage,
    settings: &RouteSettings,
) -> Result<Located, AppError>
where
    B: PointerBackend,
    S: FrameSource,
    M: TemplateMatcher,
    A: Alarm,
{
    info!("opening trade route dialog");
    click_at(pointer, ESTABLISH_ROUTE)?;
    settle(settings.settle);

    click_at(pointer, LIST_TOP)?;
    pointer.move_to(ROUTE_LIST.0, ROUTE_LIST.1, false)?;
    settle(settings.settle);

    let region = pointer.transform().capture_region(SEARCH_AREA);
    debug!("searching {} for the previous route", region.geometry());

    let found = locator
        .find_with_retry(template, &region, settings.max_attempts, |attempt| {
            debug!("attempt {attempt}: no match, scrolling {}", settings.scroll_value);
            pointer.wheel(settings.scroll_value)?;
            settle(settings.settle);
            Ok(())
        })
        .map_err(|e| match e {
            LocateError::Exhausted { attempts } => AppError::RouteNotFound { attempts },
            other => AppError::Locate(other),
        })?;

    info!(
        "previous route found on attempt {} at {},{}",
        found.attempt, found.point.x, found.point.y
    );

    pointer.move_to(f64::from(found.point.x), f64::from(found.point.y), true)?;
    pointer.click(Button::Left)?;

    click_at(pointer, CONFIRM_YES)?;
    Ok(found)
}
