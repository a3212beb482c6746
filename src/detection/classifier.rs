// src/detection/classifier.rs
//
// Per-pixel color segmentation of the minigame UI. Each class is an
// independent inclusive range test; classes may overlap if the
// configured ranges do, nothing here enforces exclusivity.

use crate::types::{ColorConfig, ColorRange, DetectionConfig, Frame};

/// Boolean grid with the same dimensions as the frame it came from.
#[derive(Debug, Clone)]
pub struct Mask {
    bits: Vec<bool>,
    pub width: usize,
    pub height: usize,
}

impl Mask {
    fn from_range(frame: &Frame, range: &ColorRange) -> Self {
        let mut bits = Vec::with_capacity(frame.width * frame.height);
        for y in 0..frame.height {
            for x in 0..frame.width {
                bits.push(range.contains(frame.pixel(x, y)));
            }
        }
        Self {
            bits,
            width: frame.width,
            height: frame.height,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Total matched pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Matched pixels per row, top to bottom.
    pub fn row_counts(&self) -> Vec<usize> {
        (0..self.height)
            .map(|y| (0..self.width).filter(|&x| self.get(x, y)).count())
            .collect()
    }
}

/// One mask per color class, recomputed every tick.
#[derive(Debug, Clone)]
pub struct SegmentMasks {
    pub fish_white: Mask,
    pub fish_green: Mask,
    pub zone_bar: Mask,
    pub bar_background: Mask,
}

/// Pure mapping frame → per-class masks.
pub fn classify(frame: &Frame, colors: &ColorConfig) -> SegmentMasks {
    SegmentMasks {
        fish_white: Mask::from_range(frame, &colors.fish_white),
        fish_green: Mask::from_range(frame, &colors.fish_green),
        zone_bar: Mask::from_range(frame, &colors.zone_bar),
        bar_background: Mask::from_range(frame, &colors.bar_background),
    }
}

/// The minigame UI counts as visible only when the dark bar background
/// and the zone bars are both present. Either alone false-positives on
/// ordinary game scenery (dark caves, blue ocean).
pub fn ui_visible(masks: &SegmentMasks, det: &DetectionConfig) -> bool {
    masks.bar_background.count() >= det.min_bar_pixels && masks.zone_bar.count() > 0
}

/// Fill ratio of the progress bar, estimated from green pixels in the
/// right 40% of the frame against a nominal bar area (full height by
/// 10% of the width). Clamped to [0, 1].
pub fn progress_fill(frame: &Frame, fill: &ColorRange) -> f32 {
    let x_start = (frame.width as f32 * 0.6) as usize;
    let mut green = 0usize;
    for y in 0..frame.height {
        for x in x_start..frame.width {
            if fill.contains(frame.pixel(x, y)) {
                green += 1;
            }
        }
    }
    let nominal = (frame.height as f32 * frame.width as f32 * 0.1).max(1.0);
    (green as f32 / nominal).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorConfig;

    /// Frame builder for synthetic UI scenes. Starts fully dark
    /// (matching the bar-background range).
    pub struct TestScene {
        frame: Frame,
    }

    impl TestScene {
        pub fn new(width: usize, height: usize) -> Self {
            Self {
                frame: Frame {
                    data: vec![10; width * height * 3],
                    width,
                    height,
                    timestamp_ms: 0.0,
                },
            }
        }

        pub fn paint_rows(mut self, rows: std::ops::Range<usize>, rgb: [u8; 3]) -> Self {
            for y in rows {
                for x in 0..self.frame.width {
                    let i = (y * self.frame.width + x) * 3;
                    self.frame.data[i..i + 3].copy_from_slice(&rgb);
                }
            }
            self
        }

        pub fn build(self) -> Frame {
            self.frame
        }
    }

    const ZONE_BLUE: [u8; 3] = [85, 170, 255];
    const FISH_WHITE: [u8; 3] = [255, 255, 255];
    const FISH_GREEN: [u8; 3] = [172, 255, 127];

    #[test]
    fn masks_are_independent_range_tests() {
        let frame = TestScene::new(10, 40)
            .paint_rows(5..8, FISH_WHITE)
            .paint_rows(20..25, ZONE_BLUE)
            .build();
        let masks = classify(&frame, &ColorConfig::default());

        assert_eq!(masks.fish_white.count(), 3 * 10);
        assert_eq!(masks.zone_bar.count(), 5 * 10);
        assert_eq!(masks.fish_green.count(), 0);
        // Dark background everywhere the white/blue rows are not.
        assert_eq!(masks.bar_background.count(), (40 - 3 - 5) * 10);
        assert!(masks.zone_bar.get(0, 20));
        assert!(!masks.zone_bar.get(0, 19));
    }

    #[test]
    fn row_counts_follow_painted_rows() {
        let frame = TestScene::new(8, 10).paint_rows(3..4, ZONE_BLUE).build();
        let masks = classify(&frame, &ColorConfig::default());
        let rows = masks.zone_bar.row_counts();
        assert_eq!(rows[3], 8);
        assert_eq!(rows.iter().sum::<usize>(), 8);
    }

    #[test]
    fn ui_needs_background_and_zone_bars_jointly() {
        let det = DetectionConfig {
            min_bar_pixels: 100,
            ..DetectionConfig::default()
        };
        let colors = ColorConfig::default();

        // Dark background but no zone bars: not the minigame.
        let dark_only = TestScene::new(20, 40).build();
        assert!(!ui_visible(&classify(&dark_only, &colors), &det));

        // Zone bars over a bright scene: not enough dark pixels.
        let bright = TestScene::new(20, 40)
            .paint_rows(0..40, [120, 120, 120])
            .paint_rows(10..20, ZONE_BLUE)
            .build();
        assert!(!ui_visible(&classify(&bright, &colors), &det));

        // Both together: visible.
        let ui = TestScene::new(20, 40).paint_rows(10..20, ZONE_BLUE).build();
        assert!(ui_visible(&classify(&ui, &colors), &det));
    }

    #[test]
    fn green_marker_classified_separately_from_progress() {
        let frame = TestScene::new(10, 20).paint_rows(4..6, FISH_GREEN).build();
        let masks = classify(&frame, &ColorConfig::default());
        assert_eq!(masks.fish_green.count(), 2 * 10);
        assert_eq!(masks.fish_white.count(), 0);
    }

    #[test]
    fn progress_fill_counts_right_portion_only() {
        let colors = ColorConfig::default();
        // Green fill across every row, but only columns in the right 40%
        // contribute. width=10: x_start=6, so 4 columns * 20 rows = 80
        // green pixels; nominal = 20 * 10 * 0.1 = 20 → clamped to 1.0.
        let full = TestScene::new(10, 20).paint_rows(0..20, [50, 230, 50]).build();
        assert_eq!(progress_fill(&full, &colors.progress_fill), 1.0);

        let empty = TestScene::new(10, 20).build();
        assert_eq!(progress_fill(&empty, &colors.progress_fill), 0.0);
    }
}
