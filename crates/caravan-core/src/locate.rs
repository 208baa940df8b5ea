// Author: Dustin Pilgrim
// License: MIT
//
// Bounded-retry screen locator.
//
// The lists we search are filled asynchronously and may need scrolling, so a
// miss runs a caller-supplied corrective action and tries again. Running out
// of attempts rings the alarm once and is reported as `Exhausted`.

use image::GrayImage;

use crate::canvas::CaptureRegion;
use crate::error::{CaptureError, LocateError, PointerError};
use crate::matcher::{Match, TemplateMatcher};
use crate::rect::Point;

/// Produces a grayscale frame of a screen region.
pub trait FrameSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage, CaptureError>;
}

/// Audible/visible escalation when a search gives up. Best-effort.
pub trait Alarm {
    fn ring(&mut self, reason: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    /// Hit in capture pixel space.
    pub hit: Match,
    /// Hit top-left in output-relative physical pixels.
    pub point: Point,
    /// 1-based attempt that produced the hit.
    pub attempt: u32,
}

pub struct ScreenLocator<S, M, A> {
    source: S,
    matcher: M,
    alarm: A,
}

impl<S, M, A> ScreenLocator<S, M, A>
where
    S: FrameSource,
    M: TemplateMatcher,
    A: Alarm,
{
    pub fn new(source: S, matcher: M, alarm: A) -> Self {
        Self {
            source,
            matcher,
            alarm,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    /// One capture + match. The frame is dropped before returning.
    pub fn locate(
        &mut self,
        template: &GrayImage,
        region: &CaptureRegion,
    ) -> Result<Option<Match>, LocateError> {
        let frame = self.source.capture(region)?;
        Ok(self.matcher.locate(&frame, template))
    }

    /// Capture and match up to `max_attempts` times, calling `on_miss` with
    /// the failed attempt number after every miss.
    pub fn find_with_retry<F>(
        &mut self,
        template: &GrayImage,
        region: &CaptureRegion,
        max_attempts: u32,
        mut on_miss: F,
    ) -> Result<Located, LocateError>
    where
        F: FnMut(u32) -> Result<(), PointerError>,
    {
        for attempt in 1..=max_attempts {
            if let Some(hit) = self.locate(template, region)? {
                return Ok(Located {
                    hit,
                    point: region.reproject(&hit),
                    attempt,
                });
            }

            on_miss(attempt)?;
        }

        self.alarm
            .ring(&format!("template not found after {max_attempts} attempts"));

        Err(LocateError::Exhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasTransform;
    use crate::matcher::StrideMatcher;
    use crate::mock::{CountingAlarm, ScriptedSource};
    use crate::rect::Rect;
    use image::Luma;

    fn template() -> GrayImage {
        GrayImage::from_fn(10, 6, |x, y| Luma([((x * 31 + y * 17) % 251) as u8]))
    }

    fn frame_with_template(left: u32, top: u32) -> GrayImage {
        let tpl = template();
        let mut frame = GrayImage::from_pixel(60, 40, Luma([255]));
        for (x, y, px) in tpl.enumerate_pixels() {
            frame.put_pixel(left + x, top + y, *px);
        }
        frame
    }

    fn blank() -> GrayImage {
        GrayImage::from_pixel(60, 40, Luma([255]))
    }

    fn region() -> CaptureRegion {
        CanvasTransform::new((1.0, 1.0), 1.0, (0, 0)).capture_region(Rect::new(0, 100, 60, 40))
    }

    #[test]
    fn found_on_third_attempt_scrolls_twice() {
        let source = ScriptedSource::new(vec![blank(), blank(), frame_with_template(20, 8)]);
        let mut locator = ScreenLocator::new(source, StrideMatcher::default(), CountingAlarm::default());

        let mut misses = Vec::new();
        let found = locator
            .find_with_retry(&template(), &region(), 10, |attempt| {
                misses.push(attempt);
                Ok(())
            })
            .unwrap();

        assert_eq!(found.attempt, 3);
        assert_eq!(found.point, Point::new(20, 108));
        assert_eq!(misses, vec![1, 2]);
        assert_eq!(locator.source().captures(), 3);
        assert_eq!(locator.alarm().rings(), 0);
    }

    #[test]
    fn first_attempt_hit_never_calls_on_miss() {
        let source = ScriptedSource::new(vec![frame_with_template(0, 0)]);
        let mut locator = ScreenLocator::new(source, StrideMatcher::default(), CountingAlarm::default());

        let mut misses = 0;
        let found = locator
            .find_with_retry(&template(), &region(), 5, |_| {
                misses += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(found.attempt, 1);
        assert_eq!(misses, 0);
        assert_eq!(locator.alarm().rings(), 0);
    }

    #[test]
    fn exhaustion_rings_alarm_once() {
        let source = ScriptedSource::repeating(blank());
        let mut locator = ScreenLocator::new(source, StrideMatcher::default(), CountingAlarm::default());

        let mut misses = 0;
        let err = locator
            .find_with_retry(&template(), &region(), 10, |_| {
                misses += 1;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, LocateError::Exhausted { attempts: 10 }));
        assert_eq!(locator.source().captures(), 10);
        assert_eq!(misses, 10);
        assert_eq!(locator.alarm().rings(), 1);
    }

    #[test]
    fn on_miss_failure_aborts_without_alarm() {
        let source = ScriptedSource::repeating(blank());
        let mut locator = ScreenLocator::new(source, StrideMatcher::default(), CountingAlarm::default());

        let err = locator
            .find_with_retry(&template(), &region(), 4, |_| {
                Err(PointerError::Roundtrip("broken pipe".into()))
            })
            .unwrap_err();

        assert!(matches!(err, LocateError::Pointer(_)));
        assert_eq!(locator.source().captures(), 1);
        assert_eq!(locator.alarm().rings(), 0);
    }

    #[test]
    fn capture_failure_is_not_retried() {
        let source = ScriptedSource::failing();
        let mut locator = ScreenLocator::new(source, StrideMatcher::default(), CountingAlarm::default());

        let err = locator
            .find_with_retry(&template(), &region(), 3, |_| Ok(()))
            .unwrap_err();

        assert!(matches!(err, LocateError::Capture(CaptureError::Empty)));
        assert_eq!(locator.alarm().rings(), 0);
    }
}
