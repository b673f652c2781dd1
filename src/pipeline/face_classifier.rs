//! 人脸/性别分类 - 远程协作方

use reqwest::blocking::Client;
use thiserror::Error;

use super::remote::{endpoint, GenerateRequest, GenerateResponse, Part, ServiceConfig, HTTP_CLIENT};
use crate::core::video::RawFrame;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Response parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed response: {0}")]
    Response(String),
}

/// 提取时的帧过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameFilter {
    /// 只要求画面里有一张清晰的人脸
    AnyFace,
    /// 要求分类答案等于该标签（如 "Male" / "Female"）
    Label(String),
}

impl FrameFilter {
    /// 判定服务答案是否命中
    ///
    /// 按规约是大小写不敏感的字符串相等比较；AnyFace 模式下
    /// 服务答 Yes/No，标签模式下答 Male/Female/None。
    pub fn matches(&self, answer: &str) -> bool {
        let answer = answer.trim();
        match self {
            FrameFilter::AnyFace => answer.eq_ignore_ascii_case("yes"),
            FrameFilter::Label(want) => answer.eq_ignore_ascii_case(want),
        }
    }
}

/// 远程帧分类器
///
/// 返回服务的原始答案字符串，命中判定交给 [`FrameFilter::matches`]。
/// 传输或解析失败返回 Err，调用方一律按未命中处理。
pub trait FaceClassifier: Send + Sync {
    fn classify(&self, frame: &RawFrame, filter: &FrameFilter)
        -> Result<String, ClassifierError>;
}

pub struct GeminiFaceClassifier {
    config: ServiceConfig,
    client: Client,
}

impl GeminiFaceClassifier {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            client: HTTP_CLIENT.clone(),
        }
    }

    fn instruction(filter: &FrameFilter) -> &'static str {
        match filter {
            FrameFilter::AnyFace => {
                "Look at this video frame. Is there one prominent, clearly visible human face? \
                 Answer with exactly one word: Yes or No."
            }
            FrameFilter::Label(_) => {
                "Look at the most prominent human face in this video frame and judge its \
                 apparent gender. Answer with exactly one word: Male, Female, or None if \
                 there is no clear face."
            }
        }
    }
}

impl FaceClassifier for GeminiFaceClassifier {
    fn classify(
        &self,
        frame: &RawFrame,
        filter: &FrameFilter,
    ) -> Result<String, ClassifierError> {
        let request = GenerateRequest::single(vec![
            Part::image("image/jpeg", &frame.jpeg_data),
            Part::text(Self::instruction(filter)),
        ]);

        let url = endpoint(&self.config, &self.config.classify_model);
        let body = self
            .client
            .post(&url)
            .json(&request)
            .send()?
            .error_for_status()?
            .text()?;

        let response: GenerateResponse = serde_json::from_str(&body)?;

        response
            .first_text()
            .map(|answer| answer.trim().to_string())
            .ok_or_else(|| ClassifierError::Response("no text part in response".to_string()))
    }
}

type AnswerFn = dyn Fn(&RawFrame) -> Result<String, ClassifierError> + Send + Sync;

/// 测试用分类器
pub struct MockFaceClassifier {
    answer: Box<AnswerFn>,
}

impl MockFaceClassifier {
    /// 对所有帧给出同一个答案
    pub fn always(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::with_answer(move |_| Ok(answer.clone()))
    }

    /// 对所有帧返回传输失败
    pub fn always_failing() -> Self {
        Self::with_answer(|_| {
            Err(ClassifierError::Response(
                "synthetic classifier failure".to_string(),
            ))
        })
    }

    pub fn with_answer<F>(answer: F) -> Self
    where
        F: Fn(&RawFrame) -> Result<String, ClassifierError> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
        }
    }
}

impl FaceClassifier for MockFaceClassifier {
    fn classify(
        &self,
        frame: &RawFrame,
        _filter: &FrameFilter,
    ) -> Result<String, ClassifierError> {
        (self.answer)(frame)
    }
}
