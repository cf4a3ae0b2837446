//! WAV 封装
//!
//! 朗读音频统一以 WAV 输出给客户端；PCM16 加上 44 字节头，WAV 原样返回

use crate::domain::story::{AudioEncoding, NarrationAudio};

const BITS_PER_SAMPLE: u16 = 16;

pub fn to_wav_bytes(audio: &NarrationAudio) -> Vec<u8> {
    match audio.encoding() {
        AudioEncoding::Wav => audio.data().to_vec(),
        AudioEncoding::Pcm16 {
            sample_rate,
            channels,
        } => encode_pcm16(audio.data(), sample_rate, channels),
    }
}

fn encode_pcm16(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    // 头部字段是定长整数，异常的格式参数按上限截断
    let block_align = channels.saturating_mul(BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));
    // 奇数字节的尾巴不构成完整样本
    let data = &pcm[..pcm.len() - pcm.len() % 2];
    let data_size = u32::try_from(data.len()).unwrap_or(u32::MAX);

    let mut wav = Vec::with_capacity(44 + data.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&data_size.saturating_add(36).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(data);

    wav
}
