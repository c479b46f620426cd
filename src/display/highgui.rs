//! OpenCV highgui window.
//!
//! The mouse callback only records drag state. Drawing happens in the viewer
//! methods while they pump `wait_key`.

use anyhow::{anyhow, Result};
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::highgui;
use opencv::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::overlay::{draw_roi, RoiColor};
use super::Viewer;
use crate::frame::Frame;
use crate::roi::Roi;

const SELECT_POLL_MS: i32 = 15;

#[derive(Debug, Default)]
struct DragState {
    dragging: bool,
    anchor: (i32, i32),
    current: (i32, i32),
    moved: bool,
    committed: Option<Roi>,
}

impl DragState {
    fn on_mouse(&mut self, event: i32, x: i32, y: i32) {
        match event {
            highgui::EVENT_LBUTTONDOWN => {
                self.dragging = true;
                self.anchor = (x, y);
                self.current = (x, y);
                self.moved = true;
            }
            highgui::EVENT_MOUSEMOVE if self.dragging => {
                self.current = (x, y);
                self.moved = true;
            }
            highgui::EVENT_LBUTTONUP if self.dragging => {
                self.dragging = false;
                self.current = (x, y);
                self.moved = true;
                self.committed = Some(self.rect());
            }
            _ => {}
        }
    }

    fn rect(&self) -> Roi {
        Roi::from_corners(self.anchor.0, self.anchor.1, self.current.0, self.current.1)
    }
}

/// Interactive window: press, drag and release the left button to select the ROI.
pub struct HighguiViewer {
    window: String,
    drag: Arc<Mutex<DragState>>,
    last: Option<Frame>,
}

impl HighguiViewer {
    pub fn open(window: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
        let drag = Arc::new(Mutex::new(DragState::default()));
        let state = Arc::clone(&drag);
        highgui::set_mouse_callback(
            window,
            Some(Box::new(move |event, x, y, _flags| {
                if let Ok(mut state) = state.lock() {
                    state.on_mouse(event, x, y);
                }
            })),
        )?;
        Ok(Self {
            window: window.to_string(),
            drag,
            last: None,
        })
    }

    fn is_open(&self) -> Result<bool> {
        let visible = highgui::get_window_property(&self.window, highgui::WND_PROP_VISIBLE)?;
        Ok(visible >= 1.0)
    }

    fn present(&self, frame: &Frame) -> Result<()> {
        let mat = to_bgr_mat(frame)?;
        highgui::imshow(&self.window, &mat)?;
        Ok(())
    }
}

impl Viewer for HighguiViewer {
    fn name(&self) -> &'static str {
        "highgui"
    }

    fn select_roi(&mut self, first: &Frame) -> Result<Option<Roi>> {
        self.present(first)?;
        loop {
            highgui::wait_key(SELECT_POLL_MS)?;
            if !self.is_open()? {
                log::debug!("window closed before a ROI was selected");
                return Ok(None);
            }

            let mut state = self
                .drag
                .lock()
                .map_err(|_| anyhow!("drag state lock poisoned"))?;
            if let Some(roi) = state.committed.take() {
                let roi = roi.clamp_to(first.width(), first.height());
                if roi.is_empty() {
                    log::debug!("ignoring empty selection");
                    continue;
                }
                return Ok(Some(roi));
            }
            if state.moved {
                state.moved = false;
                let preview = if state.dragging {
                    draw_roi(first, &state.rect(), RoiColor::Preview)
                } else {
                    first.clone()
                };
                drop(state);
                self.present(&preview)?;
            }
        }
    }

    fn show(&mut self, frame: &Frame) -> Result<()> {
        {
            let mut state = self
                .drag
                .lock()
                .map_err(|_| anyhow!("drag state lock poisoned"))?;
            if let Some(roi) = state.committed.take() {
                log::debug!("ROI is fixed while watching; ignoring selection {}", roi);
            }
        }
        self.present(frame)?;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn is_dragging(&self) -> bool {
        self.drag.lock().map(|state| state.dragging).unwrap_or(false)
    }

    fn pause(&mut self, delay: Duration) -> Result<()> {
        let ms = delay.as_millis().clamp(1, i32::MAX as u128) as i32;
        highgui::wait_key(ms)?;

        let mut state = self
            .drag
            .lock()
            .map_err(|_| anyhow!("drag state lock poisoned"))?;
        if !(state.dragging && state.moved) {
            return Ok(());
        }
        state.moved = false;
        let rect = state.rect();
        drop(state);
        if let Some(last) = &self.last {
            self.present(&draw_roi(last, &rect, RoiColor::Preview))?;
        }
        Ok(())
    }
}

impl Drop for HighguiViewer {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.window);
    }
}

fn to_bgr_mat(frame: &Frame) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    let bytes = mat.data_bytes_mut()?;
    for (dst, src) in bytes.chunks_exact_mut(3).zip(frame.as_raw().chunks_exact(3)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Ok(mat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_normalizes_corners() {
        let mut state = DragState::default();
        state.on_mouse(highgui::EVENT_LBUTTONDOWN, 40, 30);
        state.on_mouse(highgui::EVENT_MOUSEMOVE, 20, 35);
        assert!(state.dragging);
        state.on_mouse(highgui::EVENT_LBUTTONUP, 10, 50);

        assert!(!state.dragging);
        assert_eq!(state.committed, Some(Roi::new(10, 30, 30, 20)));
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut state = DragState::default();
        state.on_mouse(highgui::EVENT_MOUSEMOVE, 5, 5);
        state.on_mouse(highgui::EVENT_LBUTTONUP, 9, 9);
        assert!(!state.moved);
        assert_eq!(state.committed, None);
    }
}
