//! 帧增强 - 远程协作方
//!
//! 服务收到目标帧、可选的身份参考帧和是否上色的偏好，
//! 产出一张增强图或"无图"。无图与传输失败对调用方等价：
//! 跳过该帧继续。

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use thiserror::Error;

use super::remote::{endpoint, GenerateRequest, GenerateResponse, Part, ServiceConfig, HTTP_CLIENT};
use crate::core::video::RawFrame;

#[derive(Debug, Error)]
pub enum EnhancerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Response parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image payload decode failed: {0}")]
    Payload(#[from] base64::DecodeError),
}

/// 服务产出的增强图
#[derive(Debug, Clone)]
pub struct EnhancedPayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub trait FrameEnhancer: Send + Sync {
    /// `Ok(None)` 表示服务没有产图
    fn enhance(
        &self,
        frame: &RawFrame,
        reference: Option<&RawFrame>,
        colorize: bool,
    ) -> Result<Option<EnhancedPayload>, EnhancerError>;
}

pub struct GeminiFrameEnhancer {
    config: ServiceConfig,
    client: Client,
}

impl GeminiFrameEnhancer {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            client: HTTP_CLIENT.clone(),
        }
    }

    fn instruction(has_reference: bool, colorize: bool) -> String {
        let mut text = String::from(
            "Restore and enhance the first image: remove blur and compression artifacts, \
             sharpen facial detail, and upscale it. Keep the person's identity, facial \
             features, pose and framing exactly as they are.",
        );
        if has_reference {
            text.push_str(
                " The second image shows the same person; use it as the identity reference.",
            );
        }
        if colorize {
            text.push_str(" If the image is black and white, colorize it naturally.");
        } else {
            text.push_str(" Keep the original colors.");
        }
        text
    }
}

impl FrameEnhancer for GeminiFrameEnhancer {
    fn enhance(
        &self,
        frame: &RawFrame,
        reference: Option<&RawFrame>,
        colorize: bool,
    ) -> Result<Option<EnhancedPayload>, EnhancerError> {
        let mut parts = vec![Part::image("image/jpeg", &frame.jpeg_data)];
        if let Some(reference) = reference {
            parts.push(Part::image("image/jpeg", &reference.jpeg_data));
        }
        parts.push(Part::text(Self::instruction(reference.is_some(), colorize)));

        let url = endpoint(&self.config, &self.config.enhance_model);
        let body = self
            .client
            .post(&url)
            .json(&GenerateRequest::single(parts))
            .send()?
            .error_for_status()?
            .text()?;

        let response: GenerateResponse = serde_json::from_str(&body)?;

        match response.first_image() {
            Some(inline) => Ok(Some(EnhancedPayload {
                mime_type: inline.mime_type.clone(),
                data: BASE64.decode(&inline.data)?,
            })),
            None => Ok(None),
        }
    }
}

type EnhanceFn = dyn Fn(&RawFrame, Option<&RawFrame>, bool) -> Result<Option<EnhancedPayload>, EnhancerError>
    + Send
    + Sync;

/// 测试用增强器
pub struct MockFrameEnhancer {
    behavior: Box<EnhanceFn>,
}

impl MockFrameEnhancer {
    /// 每帧都产出一张固定的 PNG
    pub fn always_producing() -> Self {
        Self::with_behavior(|_, _, _| {
            Ok(Some(EnhancedPayload {
                mime_type: "image/png".to_string(),
                data: vec![0x89, 0x50, 0x4E, 0x47],
            }))
        })
    }

    /// 每帧都"无图"
    pub fn never_producing() -> Self {
        Self::with_behavior(|_, _, _| Ok(None))
    }

    pub fn with_behavior<F>(behavior: F) -> Self
    where
        F: Fn(&RawFrame, Option<&RawFrame>, bool) -> Result<Option<EnhancedPayload>, EnhancerError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            behavior: Box::new(behavior),
        }
    }
}

impl FrameEnhancer for MockFrameEnhancer {
    fn enhance(
        &self,
        frame: &RawFrame,
        reference: Option<&RawFrame>,
        colorize: bool,
    ) -> Result<Option<EnhancedPayload>, EnhancerError> {
        (self.behavior)(frame, reference, colorize)
    }
}
