//! Audio Output Port - 音频输出设备抽象

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::domain::story::NarrationAudio;

/// 播放错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Audio device closed")]
    DeviceClosed,

    #[error("Audio device suspended")]
    DeviceSuspended,

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Device error: {0}")]
    DeviceError(String),
}

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Suspended,
    Running,
    Closed,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suspended => "suspended",
            Self::Running => "running",
            Self::Closed => "closed",
        }
    }
}

/// 一次正在发声的输出
///
/// `ended` 在自然播放结束时收到信号；被 `halt` 中止时发送端直接丢弃
pub struct OutputStream {
    pub ended: oneshot::Receiver<()>,
    pub halt: CancellationToken,
    pub duration_ms: u64,
}

/// Audio Output Port
///
/// 一个已获取的输出设备，由一个阅读会话独占
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    fn state(&self) -> DeviceState;

    /// 挂起的设备恢复为运行状态
    async fn resume(&self) -> Result<(), PlaybackError>;

    /// 解码并立即开始发声
    fn start(&self, audio: &NarrationAudio) -> Result<OutputStream, PlaybackError>;

    /// 仍在发声的输出数量
    fn active_outputs(&self) -> usize;

    /// 释放设备，之后的 start/resume 返回 DeviceClosed
    fn close(&self);
}

/// Audio Device Port - 设备获取
pub trait AudioDevicePort: Send + Sync {
    fn acquire(&self) -> Result<Arc<dyn AudioOutputPort>, PlaybackError>;
}
