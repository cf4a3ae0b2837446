//! Audio Adapter - 旁白解码与输出设备

mod clocked_device;
mod decoder;
pub(crate) mod wav;

pub use clocked_device::{ClockedAudioDevice, ClockedDeviceProvider};
pub use decoder::{decode_narration, DecodedClip};
pub use wav::to_wav_bytes;
