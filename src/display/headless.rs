use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::Viewer;
use crate::frame::Frame;
use crate::roi::Roi;

/// Viewer without a window.
///
/// The ROI is fixed up front (full frame when unset). Shown frames are
/// written to `annotate_dir` as `frame_00000.png`, `frame_00001.png`, ...
/// when a directory is configured and dropped otherwise.
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    roi: Option<Roi>,
    annotate_dir: Option<PathBuf>,
    shown: u64,
}

impl HeadlessViewer {
    pub fn new(roi: Option<Roi>) -> Self {
        Self {
            roi,
            annotate_dir: None,
            shown: 0,
        }
    }

    pub fn with_annotate_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.annotate_dir = Some(dir.into());
        self
    }
}

impl Viewer for HeadlessViewer {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn select_roi(&mut self, first: &Frame) -> Result<Option<Roi>> {
        let roi = self
            .roi
            .unwrap_or_else(|| Roi::full_frame(first.width(), first.height()));
        log::debug!("headless ROI {}", roi);
        if let Some(dir) = &self.annotate_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(Some(roi))
    }

    fn show(&mut self, frame: &Frame) -> Result<()> {
        if let Some(dir) = &self.annotate_dir {
            let path = dir.join(format!("frame_{:05}.png", self.shown));
            frame
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        self.shown += 1;
        Ok(())
    }

    fn pause(&mut self, delay: Duration) -> Result<()> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn defaults_to_full_frame() {
        let mut viewer = HeadlessViewer::new(None);
        let frame = Frame::new(32, 24);
        assert_eq!(
            viewer.select_roi(&frame).unwrap(),
            Some(Roi::new(0, 0, 32, 24))
        );
    }

    #[test]
    fn preset_roi_is_returned_as_is() {
        let mut viewer = HeadlessViewer::new(Some(Roi::new(3, 4, 5, 6)));
        let frame = Frame::new(32, 24);
        assert_eq!(
            viewer.select_roi(&frame).unwrap(),
            Some(Roi::new(3, 4, 5, 6))
        );
    }

    #[test]
    fn writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("annotated");
        let mut viewer = HeadlessViewer::new(None).with_annotate_dir(&out);
        let frame = Frame::from_pixel(4, 4, Rgb([1, 2, 3]));

        viewer.select_roi(&frame).unwrap();
        viewer.show(&frame).unwrap();
        viewer.show(&frame).unwrap();

        assert_eq!(viewer.shown, 2);
        assert!(out.join("frame_00000.png").exists());
        assert!(out.join("frame_00001.png").exists());
        let back = image::open(out.join("frame_00001.png")).unwrap().into_rgb8();
        assert_eq!(back, frame);
    }

    #[test]
    fn never_dragging() {
        assert!(!HeadlessViewer::default().is_dragging());
    }
}
