//! Clocked Audio Device - 基于时钟的音频输出
//!
//! 解码旁白后按音频时长"发声"：到时自然结束，或被 halt 中止。
//! 设备初始为挂起状态，首次播放前需要 resume

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::decoder::decode_narration;
use crate::application::ports::{
    AudioDevicePort, AudioOutputPort, DeviceState, OutputStream, PlaybackError,
};
use crate::domain::story::NarrationAudio;

struct OutputSlot {
    halt: CancellationToken,
    done: Arc<AtomicBool>,
}

impl OutputSlot {
    fn is_active(&self) -> bool {
        !self.done.load(Ordering::Acquire) && !self.halt.is_cancelled()
    }
}

pub struct ClockedAudioDevice {
    state: Mutex<DeviceState>,
    outputs: Mutex<Vec<OutputSlot>>,
}

impl ClockedAudioDevice {
    pub fn new(initial: DeviceState) -> Self {
        Self {
            state: Mutex::new(initial),
            outputs: Mutex::new(Vec::new()),
        }
    }

    fn set_state(&self, next: DeviceState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

#[async_trait]
impl AudioOutputPort for ClockedAudioDevice {
    fn state(&self) -> DeviceState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn resume(&self) -> Result<(), PlaybackError> {
        match self.state() {
            DeviceState::Closed => Err(PlaybackError::DeviceClosed),
            DeviceState::Running => Ok(()),
            DeviceState::Suspended => {
                self.set_state(DeviceState::Running);
                tracing::debug!("Audio device resumed");
                Ok(())
            }
        }
    }

    fn start(&self, audio: &NarrationAudio) -> Result<OutputStream, PlaybackError> {
        match self.state() {
            DeviceState::Closed => return Err(PlaybackError::DeviceClosed),
            DeviceState::Suspended => return Err(PlaybackError::DeviceSuspended),
            DeviceState::Running => {}
        }

        let clip = decode_narration(audio)?;
        let duration = clip.duration();
        let halt = CancellationToken::new();
        let done = Arc::new(AtomicBool::new(false));
        let (ended_tx, ended_rx) = oneshot::channel();

        {
            let mut outputs = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
            outputs.retain(OutputSlot::is_active);
            outputs.push(OutputSlot {
                halt: halt.clone(),
                done: done.clone(),
            });
        }

        let task_halt = halt.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    done.store(true, Ordering::Release);
                    let _ = ended_tx.send(());
                }
                _ = task_halt.cancelled() => {
                    done.store(true, Ordering::Release);
                }
            }
        });

        Ok(OutputStream {
            ended: ended_rx,
            halt,
            duration_ms: duration.as_millis() as u64,
        })
    }

    fn active_outputs(&self) -> usize {
        self.outputs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|slot| slot.is_active())
            .count()
    }

    fn close(&self) {
        self.set_state(DeviceState::Closed);
        let outputs = std::mem::take(&mut *self.outputs.lock().unwrap_or_else(|e| e.into_inner()));
        for slot in outputs {
            slot.halt.cancel();
        }
        tracing::debug!("Audio device closed");
    }
}

/// 每个阅读会话获取一个独立的时钟设备
pub struct ClockedDeviceProvider {
    initial_state: DeviceState,
}

impl ClockedDeviceProvider {
    pub fn new(initial_state: DeviceState) -> Self {
        Self { initial_state }
    }
}

impl AudioDevicePort for ClockedDeviceProvider {
    fn acquire(&self) -> Result<Arc<dyn AudioOutputPort>, PlaybackError> {
        Ok(Arc::new(ClockedAudioDevice::new(self.initial_state)))
    }
}
