use std::io::Cursor;

use chrono::{DateTime, TimeZone};
use image::imageops::flip_vertical_in_place;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("pixel buffer of {len} bytes does not match a {width}x{height} RGBA frame")]
    Size { width: u32, height: u32, len: usize },
    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// PNG download payload for a captured frame.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub filename: String,
    pub png: Vec<u8>,
}

impl Screenshot {
    /// `bottom_up` frames (as read back from GL) are flipped before encoding.
    pub fn capture<Tz: TimeZone>(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        bottom_up: bool,
        taken_at: &DateTime<Tz>,
    ) -> Result<Self, ScreenshotError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let png = encode_png(width, height, rgba, bottom_up)?;
        Ok(Self {
            filename: screenshot_filename(taken_at),
            png,
        })
    }
}

pub fn screenshot_filename<Tz: TimeZone>(taken_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("shaderdeck-{}.png", taken_at.format("%Y%m%d-%H%M%S"))
}

pub fn encode_png(
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    bottom_up: bool,
) -> Result<Vec<u8>, ScreenshotError> {
    let len = rgba.len();
    let mut image = RgbaImage::from_raw(width, height, rgba).ok_or(ScreenshotError::Size {
        width,
        height,
        len,
    })?;
    if bottom_up {
        flip_vertical_in_place(&mut image);
    }
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn filename_carries_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(screenshot_filename(&at), "shaderdeck-20240309-140507.png");
    }

    #[test]
    fn encodes_png_and_flips_rows() {
        let rgba = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let png = encode_png(1, 2, rgba, true).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn rejects_short_buffers() {
        let err = encode_png(2, 2, vec![0; 4], false).unwrap_err();
        assert!(matches!(err, ScreenshotError::Size { len: 4, .. }));
    }
}
