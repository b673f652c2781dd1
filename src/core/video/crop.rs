//! 帧裁剪 - 对选中帧做增强前的手动取景

use std::io::Cursor;

use image::ImageOutputFormat;
use thiserror::Error;

use super::frame::RawFrame;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Invalid crop rectangle: {0}")]
    InvalidRect(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// 归一化裁剪矩形 (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    /// X offset (0.0 = left edge, 1.0 = right edge)
    pub x: f64,
    /// Y offset (0.0 = top edge, 1.0 = bottom edge)
    pub y: f64,
    /// Width (0.0-1.0 of original)
    pub width: f64,
    /// Height (0.0-1.0 of original)
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<(), CropError> {
        if self.x < 0.0 || self.x > 1.0 {
            return Err(CropError::InvalidRect("x must be between 0 and 1".into()));
        }
        if self.y < 0.0 || self.y > 1.0 {
            return Err(CropError::InvalidRect("y must be between 0 and 1".into()));
        }
        if self.width <= 0.0 || self.width > 1.0 {
            return Err(CropError::InvalidRect(
                "width must be between 0 and 1".into(),
            ));
        }
        if self.height <= 0.0 || self.height > 1.0 {
            return Err(CropError::InvalidRect(
                "height must be between 0 and 1".into(),
            ));
        }
        if self.x + self.width > 1.0 {
            return Err(CropError::InvalidRect("x + width exceeds frame".into()));
        }
        if self.y + self.height > 1.0 {
            return Err(CropError::InvalidRect("y + height exceeds frame".into()));
        }
        Ok(())
    }
}

impl RawFrame {
    /// 裁剪出一个新帧，时间戳保持不变（原帧不被修改）
    pub fn cropped(&self, rect: &CropRect, quality: u8) -> Result<RawFrame, CropError> {
        rect.validate()?;

        let img = image::load_from_memory(&self.jpeg_data)?;

        let width = img.width();
        let height = img.height();

        let crop_x = (rect.x * width as f64) as u32;
        let crop_y = (rect.y * height as f64) as u32;
        let crop_w = ((rect.width * width as f64) as u32).min(width - crop_x);
        let crop_h = ((rect.height * height as f64) as u32).min(height - crop_y);

        if crop_w == 0 || crop_h == 0 {
            return Err(CropError::InvalidRect(
                "crop rectangle collapses to zero pixels".into(),
            ));
        }

        let cropped = img.crop_imm(crop_x, crop_y, crop_w, crop_h);

        let mut buffer = Cursor::new(Vec::new());
        cropped
            .to_rgb8()
            .write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;

        Ok(RawFrame {
            timestamp_ms: self.timestamp_ms,
            width: crop_w,
            height: crop_h,
            jpeg_data: buffer.into_inner(),
        })
    }
}
