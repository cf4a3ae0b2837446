//! 播放引擎
//!
//! 不变式：任意时刻最多只有一个活动输出。
//! play 先停止当前输出再开始新的；stop 幂等。
//! 每次 stop 或 play 都推进 epoch，带着旧 epoch 的延迟播放不会再启动

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{AudioOutputPort, DeviceState, PlaybackError};
use crate::domain::story::NarrationAudio;

struct ActivePlayback {
    id: u64,
    halt: CancellationToken,
}

#[derive(Default)]
struct Slot {
    active: Option<ActivePlayback>,
    epoch: u64,
}

impl Slot {
    fn halt(&mut self, playing: &watch::Sender<bool>) -> Option<u64> {
        let previous = self.active.take()?;
        previous.halt.cancel();
        playing.send_replace(false);
        Some(previous.id)
    }
}

/// 引擎与自然结束监听任务共享的状态
struct PlaybackState {
    slot: Mutex<Slot>,
    playing: watch::Sender<bool>,
}

impl PlaybackState {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 自然播放结束：只有仍是同一次播放时才清除
    fn finish(&self, id: u64) {
        let mut slot = self.lock();
        if slot.active.as_ref().map(|a| a.id) == Some(id) {
            slot.active = None;
            self.playing.send_replace(false);
            tracing::debug!(playback_id = id, "Playback finished");
        }
    }
}

pub struct PlaybackEngine {
    output: Arc<dyn AudioOutputPort>,
    state: Arc<PlaybackState>,
    next_id: AtomicU64,
}

impl PlaybackEngine {
    pub fn new(output: Arc<dyn AudioOutputPort>) -> Self {
        let (playing, _) = watch::channel(false);
        Self {
            output,
            state: Arc::new(PlaybackState {
                slot: Mutex::new(Slot::default()),
                playing,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// 播放一段旁白，替换当前正在播放的输出
    pub async fn play(&self, audio: &NarrationAudio) -> Result<(), PlaybackError> {
        self.start(audio, None).await.map(|_| ())
    }

    /// 只有 epoch 仍等于 `epoch` 时才播放
    ///
    /// 期间发生过 stop 或其他 play 时返回 Ok(false)，不触碰设备
    pub async fn play_if_current(
        &self,
        audio: &NarrationAudio,
        epoch: u64,
    ) -> Result<bool, PlaybackError> {
        self.start(audio, Some(epoch)).await
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    async fn start(
        &self,
        audio: &NarrationAudio,
        expected: Option<u64>,
    ) -> Result<bool, PlaybackError> {
        if expected.is_some_and(|epoch| epoch != self.epoch()) {
            return Ok(false);
        }
        if self.output.state() == DeviceState::Suspended {
            self.output.resume().await?;
        }

        let (id, ended) = {
            let mut slot = self.state.lock();
            // resume 期间可能已经翻页
            if expected.is_some_and(|epoch| epoch != slot.epoch) {
                tracing::debug!(epoch = slot.epoch, "Stale playback request dropped");
                return Ok(false);
            }
            slot.epoch += 1;
            slot.halt(&self.state.playing);

            let stream = self.output.start(audio)?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            slot.active = Some(ActivePlayback {
                id,
                halt: stream.halt,
            });
            self.state.playing.send_replace(true);
            tracing::debug!(playback_id = id, duration_ms = stream.duration_ms, "Playback started");
            (id, stream.ended)
        };

        let state = self.state.clone();
        tokio::spawn(async move {
            if ended.await.is_ok() {
                state.finish(id);
            }
        });

        Ok(true)
    }

    /// 停止当前输出并让所有未开始的延迟播放失效；没有输出时只推进 epoch
    pub fn stop(&self) {
        let mut slot = self.state.lock();
        slot.epoch += 1;
        if let Some(id) = slot.halt(&self.state.playing) {
            tracing::debug!(playback_id = id, "Playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        *self.state.playing.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.playing.subscribe()
    }

    pub fn device_state(&self) -> DeviceState {
        self.output.state()
    }

    /// 停止播放并释放设备
    pub fn shutdown(&self) {
        self.stop();
        self.output.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::adapters::ClockedAudioDevice;

    /// 24kHz 单声道，`millis` 毫秒静音
    fn clip(millis: u32) -> NarrationAudio {
        let samples = 24 * millis as usize;
        NarrationAudio::pcm16(24_000, 1, vec![0u8; samples * 2])
    }

    fn engine() -> (PlaybackEngine, Arc<ClockedAudioDevice>) {
        let device = Arc::new(ClockedAudioDevice::new(DeviceState::Suspended));
        (PlaybackEngine::new(device.clone()), device)
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_resumes_suspended_device() {
        let (engine, device) = engine();
        engine.play(&clip(500)).await.unwrap();

        assert_eq!(device.state(), DeviceState::Running);
        assert!(engine.is_playing());
        assert_eq!(device.active_outputs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_active_output() {
        let (engine, device) = engine();
        for _ in 0..3 {
            engine.play(&clip(500)).await.unwrap();
            assert_eq!(device.active_outputs(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (engine, device) = engine();
        engine.stop();
        assert!(!engine.is_playing());

        engine.play(&clip(500)).await.unwrap();
        engine.stop();
        engine.stop();
        assert!(!engine.is_playing());
        assert_eq!(device.active_outputs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_natural_end_clears_state() {
        let (engine, device) = engine();
        let mut playing = engine.subscribe();
        engine.play(&clip(200)).await.unwrap();
        assert!(*playing.borrow_and_update());

        tokio::time::sleep(Duration::from_millis(300)).await;
        playing.changed().await.unwrap();
        assert!(!*playing.borrow());
        assert_eq!(device.active_outputs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_device() {
        let (engine, device) = engine();
        engine.play(&clip(500)).await.unwrap();
        engine.shutdown();

        assert_eq!(device.state(), DeviceState::Closed);
        assert_eq!(
            engine.play(&clip(500)).await.unwrap_err(),
            PlaybackError::DeviceClosed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_does_not_start_output() {
        let (engine, device) = engine();
        let epoch = engine.epoch();
        engine.stop();

        assert!(!engine.play_if_current(&clip(500), epoch).await.unwrap());
        assert!(!engine.is_playing());
        assert_eq!(device.active_outputs(), 0);
        // 被丢弃的请求不会恢复设备
        assert_eq!(device.state(), DeviceState::Suspended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_epoch_starts_output_once() {
        let (engine, device) = engine();
        let epoch = engine.epoch();

        assert!(engine.play_if_current(&clip(500), epoch).await.unwrap());
        assert_eq!(device.active_outputs(), 1);
        // 成功的播放本身推进了 epoch
        assert!(!engine.play_if_current(&clip(500), epoch).await.unwrap());
        assert_eq!(device.active_outputs(), 1);
    }
}
