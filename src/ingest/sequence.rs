//! Numbered image sequence source.
//!
//! This module provides `ImageSequence` for reading frames from numbered still
//! images on local disk. The sequence is responsible for:
//! - Building the file name for an index (`basename + format(index) + extension`)
//! - Decoding the file into an RGB frame
//! - Tracking a cursor for forward iteration
//!
//! A file that is missing or fails to decode yields `None`. That is the
//! termination signal of the sequence, not an error.

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::IndexFormat;
use crate::frame::Frame;

/// Configuration for an image sequence.
#[derive(Clone, Debug)]
pub struct SequenceConfig {
    /// Path prefix, e.g. "/data/run1/frame_".
    pub basename: String,
    /// printf-style index pattern, e.g. "%04i".
    pub pattern: String,
    /// File suffix including the leading dot, e.g. ".jpeg".
    pub extension: String,
    /// Index returned by the first call to `next`.
    pub start_index: i64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            basename: String::new(),
            pattern: "%04i".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
        }
    }
}

/// Frame source over numbered image files.
pub struct ImageSequence {
    config: SequenceConfig,
    format: IndexFormat,
    cursor: i64,
    stats: SequenceStats,
}

/// Statistics for an image sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceStats {
    pub frames_loaded: u64,
    pub misses: u64,
}

impl ImageSequence {
    pub fn new(config: SequenceConfig) -> Result<Self> {
        let format = IndexFormat::parse(&config.pattern)
            .with_context(|| format!("invalid continuous variable {:?}", config.pattern))?;
        Ok(Self {
            cursor: config.start_index,
            config,
            format,
            stats: SequenceStats::default(),
        })
    }

    /// File path for frame `index`.
    pub fn path_for(&self, index: i64) -> PathBuf {
        PathBuf::from(format!(
            "{}{}{}",
            self.config.basename,
            self.format.render(index),
            self.config.extension
        ))
    }

    /// Load frame `index` without touching the cursor.
    pub fn load_image(&mut self, index: i64) -> Option<Frame> {
        let path = self.path_for(index);
        log::trace!("Reading file {}", path.display());

        match decode(&path) {
            Ok(frame) => {
                self.stats.frames_loaded += 1;
                Some(frame)
            }
            Err(err) => {
                self.stats.misses += 1;
                log::debug!("frame {} unavailable: {:#}", index, err);
                None
            }
        }
    }

    /// Index the next call to `next` will load.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn stats(&self) -> SequenceStats {
        self.stats.clone()
    }
}

/// Yields the frame at the cursor and advances the cursor by one.
///
/// The cursor advances even when the frame is absent, so iteration can be
/// resumed past a gap by calling `next` again.
impl Iterator for ImageSequence {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let index = self.cursor;
        self.cursor += 1;
        self.load_image(index)
    }
}

fn decode(path: &std::path::Path) -> Result<Frame> {
    let image = image::open(path).with_context(|| format!("decode {}", path.display()))?;
    Ok(image.into_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sequence_in(dir: &std::path::Path) -> ImageSequence {
        ImageSequence::new(SequenceConfig {
            basename: format!("{}/frame_", dir.display()),
            pattern: "%04i".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
        })
        .unwrap()
    }

    #[test]
    fn builds_file_names() {
        let seq = ImageSequence::new(SequenceConfig {
            basename: "/home/user/images/frame_".to_string(),
            pattern: "%04i".to_string(),
            extension: ".jpeg".to_string(),
            start_index: 0,
        })
        .unwrap();
        assert_eq!(
            seq.path_for(7),
            PathBuf::from("/home/user/images/frame_0007.jpeg")
        );
        assert_eq!(seq.path_for(12), seq.path_for(12));
    }

    #[test]
    fn rejects_bad_pattern() {
        let config = SequenceConfig {
            pattern: "frame".to_string(),
            ..SequenceConfig::default()
        };
        assert!(ImageSequence::new(config).is_err());
    }

    #[test]
    fn next_advances_and_stops_at_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = sequence_in(dir.path());
        for i in 0..2 {
            let img = RgbImage::from_pixel(4, 3, Rgb([i as u8 * 10, 0, 0]));
            img.save(seq.path_for(i)).unwrap();
        }

        let first = seq.next().unwrap();
        assert_eq!(first.dimensions(), (4, 3));
        assert_eq!(first.get_pixel(0, 0), &Rgb([0, 0, 0]));
        let second = seq.next().unwrap();
        assert_eq!(second.get_pixel(0, 0), &Rgb([10, 0, 0]));
        assert!(seq.next().is_none());
        assert_eq!(seq.cursor(), 3);
        assert_eq!(
            seq.stats(),
            SequenceStats {
                frames_loaded: 2,
                misses: 1
            }
        );
    }

    #[test]
    fn load_image_leaves_cursor_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = sequence_in(dir.path());
        RgbImage::new(2, 2).save(seq.path_for(5)).unwrap();

        assert!(seq.load_image(5).is_some());
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn undecodable_file_ends_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = sequence_in(dir.path());
        std::fs::write(seq.path_for(0), b"not an image").unwrap();
        assert!(seq.next().is_none());
    }
}
