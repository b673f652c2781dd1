//! 帧数据结构

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageOutputFormat, RgbImage};

use super::error::MediaError;

/// 解码后的 RGBA 帧
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp_ms: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp_ms: u64) -> Self {
        Self {
            width,
            height,
            data,
            timestamp_ms,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for chunk in self.data.chunks_exact(4) {
            rgb.push(chunk[0]); // R
            rgb.push(chunk[1]); // G
            rgb.push(chunk[2]); // B
        }
        rgb
    }

    /// 编码为 JPEG 快照
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, MediaError> {
        let img = RgbImage::from_raw(self.width, self.height, self.to_rgb())
            .ok_or_else(|| MediaError::Encode("frame buffer size mismatch".to_string()))?;

        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))
            .map_err(|e| MediaError::Encode(e.to_string()))?;

        Ok(buffer.into_inner())
    }
}

/// 某一时间点的静帧快照（JPEG 编码，创建后不可变）
///
/// `timestamp_ms` 在单次提取运行内作为帧的身份键。
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    pub jpeg_data: Vec<u8>,
}

impl RawFrame {
    pub fn from_frame(frame: &Frame, quality: u8) -> Result<Self, MediaError> {
        Ok(Self {
            timestamp_ms: frame.timestamp_ms,
            width: frame.width,
            height: frame.height,
            jpeg_data: frame.to_jpeg(quality)?,
        })
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// 通过人脸/性别过滤的帧
#[derive(Debug, Clone)]
pub struct AcceptedFrame {
    pub frame: RawFrame,
    /// 分类服务的原始答案（"Yes"、"Male" 等）
    pub answer: String,
}

impl AcceptedFrame {
    pub fn new(frame: RawFrame, answer: String) -> Self {
        Self { frame, answer }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.frame.timestamp_ms
    }
}

/// 增强服务产出的图片
///
/// `id` 由来源时间戳和运行内序号推导（`enh-{timestamp_ms}-{position}`），
/// 同一次运行内不会冲突。
#[derive(Debug, Clone)]
pub struct EnhancedImage {
    pub id: String,
    pub original_timestamp_ms: u64,
    pub mime_type: String,
    pub image_data: Vec<u8>,
}

impl EnhancedImage {
    pub fn new(
        position: usize,
        original_timestamp_ms: u64,
        mime_type: String,
        image_data: Vec<u8>,
    ) -> Self {
        Self {
            id: format!("enh-{}-{}", original_timestamp_ms, position),
            original_timestamp_ms,
            mime_type,
            image_data,
        }
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64.encode(&self.image_data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, fill: u8, timestamp_ms: u64) -> Frame {
        let data = vec![fill; (width * height * 4) as usize];
        Frame::new(width, height, data, timestamp_ms)
    }

    #[test]
    fn test_frame_creation() {
        let frame = solid_frame(100, 100, 255, 1000);

        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.pixel_count(), 10000);
        assert_eq!(frame.timestamp_ms, 1000);
    }

    #[test]
    fn test_to_rgb_drops_alpha() {
        let frame = solid_frame(2, 2, 128, 0);
        let rgb = frame.to_rgb();

        assert_eq!(rgb.len(), 2 * 2 * 3);
        assert!(rgb.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_jpeg_snapshot_decodes_back() {
        let frame = solid_frame(64, 48, 200, 500);
        let jpeg = frame.to_jpeg(92).unwrap();

        assert!(!jpeg.is_empty());

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_raw_frame_keeps_timestamp() {
        let frame = solid_frame(32, 32, 10, 750);
        let raw = RawFrame::from_frame(&frame, 92).unwrap();

        assert_eq!(raw.timestamp_ms, 750);
        assert_eq!(raw.width, 32);
        assert_eq!(raw.height, 32);
        assert!((raw.timestamp_secs() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enhanced_image_id_scheme() {
        let img = EnhancedImage::new(2, 1250, "image/png".to_string(), vec![1, 2, 3]);

        assert_eq!(img.id, "enh-1250-2");
        assert_eq!(img.original_timestamp_ms, 1250);
    }

    #[test]
    fn test_enhanced_image_data_uri() {
        let img = EnhancedImage::new(0, 0, "image/png".to_string(), vec![0xDE, 0xAD]);

        assert_eq!(img.data_uri(), "data:image/png;base64,3q0=");
    }
}
