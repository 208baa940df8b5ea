// Author: Dustin Pilgrim
// License: MIT

use image::GrayImage;

/// A template hit, in capture pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

pub trait TemplateMatcher {
    /// First position where `template` appears in `frame`, scanning rows top
    /// to bottom.
    fn locate(&self, frame: &GrayImage, template: &GrayImage) -> Option<Match>;
}

/// Coarse grayscale matcher.
///
/// Both the candidate positions and the compared pixels are visited every
/// `step` pixels. A window matches when the mean absolute difference of the
/// sampled pixels stays within `tolerance` (0..=255).
#[derive(Debug, Clone, Copy)]
pub struct StrideMatcher {
    pub step: u32,
    pub tolerance: f64,
}

impl Default for StrideMatcher {
    fn default() -> Self {
        Self {
            step: 2,
            tolerance: 8.0,
        }
    }
}

impl StrideMatcher {
    pub fn new(step: u32, tolerance: f64) -> Self {
        Self {
            step: step.max(1),
            tolerance: tolerance.max(0.0),
        }
    }
}

impl TemplateMatcher for StrideMatcher {
    fn locate(&self, frame: &GrayImage, template: &GrayImage) -> Option<Match> {
        let (fw, fh) = frame.dimensions();
        let (tw, th) = template.dimensions();

        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let step = self.step.max(1) as usize;

        let samples: Vec<(u32, u32, i32)> = (0..th)
            .step_by(step)
            .flat_map(|y| {
                (0..tw)
                    .step_by(step)
                    .map(move |x| (x, y, i32::from(template.get_pixel(x, y)[0])))
            })
            .collect();

        let budget = (self.tolerance * samples.len() as f64) as u64;

        for top in (0..=fh - th).step_by(step) {
            'window: for left in (0..=fw - tw).step_by(step) {
                let mut diff: u64 = 0;
                for &(sx, sy, expected) in &samples {
                    let got = i32::from(frame.get_pixel(left + sx, top + sy)[0]);
                    diff += u64::from((got - expected).unsigned_abs());
                    if diff > budget {
                        continue 'window;
                    }
                }

                return Some(Match {
                    left: left as i32,
                    top: top as i32,
                    width: tw,
                    height: th,
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn noise(w: u32, h: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let v = x.wrapping_mul(73) ^ y.wrapping_mul(151) ^ seed;
            Luma([(v.wrapping_mul(2654435761) >> 24) as u8])
        })
    }

    fn paste(frame: &mut GrayImage, tpl: &GrayImage, left: u32, top: u32) {
        for (x, y, px) in tpl.enumerate_pixels() {
            frame.put_pixel(left + x, top + y, *px);
        }
    }

    #[test]
    fn finds_template_at_step_aligned_offset() {
        let tpl = noise(24, 12, 0xdead);
        let mut frame = GrayImage::from_pixel(200, 120, Luma([30]));
        paste(&mut frame, &tpl, 64, 40);

        let m = StrideMatcher::default().locate(&frame, &tpl).unwrap();
        assert_eq!(m, Match { left: 64, top: 40, width: 24, height: 12 });
    }

    #[test]
    fn small_noise_is_tolerated() {
        let tpl = noise(20, 20, 7);
        let mut frame = GrayImage::from_pixel(100, 100, Luma([0]));
        paste(&mut frame, &tpl, 10, 50);
        for px in frame.pixels_mut() {
            px[0] = px[0].saturating_add(3);
        }

        let m = StrideMatcher::new(2, 8.0).locate(&frame, &tpl).unwrap();
        assert_eq!((m.left, m.top), (10, 50));
    }

    #[test]
    fn absent_template_is_none() {
        let tpl = noise(16, 16, 1);
        let frame = GrayImage::from_pixel(100, 100, Luma([128]));

        assert!(StrideMatcher::default().locate(&frame, &tpl).is_none());
    }

    #[test]
    fn template_larger_than_frame_is_none() {
        let tpl = GrayImage::new(50, 10);
        let frame = GrayImage::new(40, 40);

        assert!(StrideMatcher::default().locate(&frame, &tpl).is_none());
    }
}
