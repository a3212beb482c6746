// src/capture.rs
//
// Frame acquisition boundary. The pipeline consumes frames through the
// FrameSource trait; what produces them (a live screen grabber, or the
// replay source below) is interchangeable.

use crate::types::Frame;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Supplies one frame per tick. Must be cheap enough to call at 100+ Hz.
/// `Ok(None)` means the source is exhausted and the loop should end.
pub trait FrameSource {
    fn grab(&mut self) -> Result<Option<Frame>>;
}

/// Replays a directory of recorded frames (PNG/JPG, sorted by filename)
/// as if they were live captures. Timestamps come from the wall clock
/// so the session's idle/settle timers behave as they would live.
pub struct ReplayCapture {
    files: Vec<PathBuf>,
    next: usize,
    started: Instant,
}

impl ReplayCapture {
    pub fn new(dir: &str) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("opening frames dir {dir}"))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
                )
            })
            .collect();
        files.sort();
        info!("📼 Replay source: {} frame(s) in {}", files.len(), dir);
        Ok(Self {
            files,
            next: 0,
            started: Instant::now(),
        })
    }
}

impl FrameSource for ReplayCapture {
    fn grab(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let img = image::open(path)
            .with_context(|| format!("decoding frame {}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();

        Ok(Some(Frame {
            data: img.into_raw(),
            width: width as usize,
            height: height as usize,
            timestamp_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }))
    }
}
