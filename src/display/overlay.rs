use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::frame::Frame;
use crate::roi::Roi;

/// Overlay color for the ROI rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoiColor {
    /// No object in the ROI.
    Absent,
    /// Object present.
    Present,
    /// Rectangle being dragged.
    Preview,
}

impl RoiColor {
    pub fn for_presence(present: bool) -> Self {
        if present {
            RoiColor::Present
        } else {
            RoiColor::Absent
        }
    }

    pub fn rgb(self) -> Rgb<u8> {
        match self {
            RoiColor::Absent | RoiColor::Preview => Rgb([0, 0, 0]),
            RoiColor::Present => Rgb([255, 0, 0]),
        }
    }
}

/// Copy of `frame` with a 1 px rectangle from `(x, y)` to `(x + w, y + h)`.
pub fn draw_roi(frame: &Frame, roi: &Roi, color: RoiColor) -> Frame {
    let mut canvas = frame.clone();
    let rect = Rect::at(roi.x as i32, roi.y as i32).of_size(roi.width + 1, roi.height + 1);
    draw_hollow_rect_mut(&mut canvas, rect, color.rgb());
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_outline_only() {
        let frame = Frame::from_pixel(10, 10, Rgb([200, 200, 200]));
        let out = draw_roi(&frame, &Roi::new(2, 2, 4, 4), RoiColor::Present);

        assert_eq!(out.get_pixel(2, 2), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(6, 6), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(4, 2), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(4, 4), &Rgb([200, 200, 200]));
        assert_eq!(out.get_pixel(7, 7), &Rgb([200, 200, 200]));
        // source untouched
        assert_eq!(frame.get_pixel(2, 2), &Rgb([200, 200, 200]));
    }

    #[test]
    fn full_frame_roi_is_clipped() {
        let frame = Frame::from_pixel(5, 5, Rgb([9, 9, 9]));
        let out = draw_roi(&frame, &Roi::full_frame(5, 5), RoiColor::Absent);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 4), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(2, 2), &Rgb([9, 9, 9]));
    }

    #[test]
    fn presence_colors() {
        assert_eq!(RoiColor::for_presence(true), RoiColor::Present);
        assert_eq!(RoiColor::for_presence(false).rgb(), Rgb([0, 0, 0]));
    }
}
