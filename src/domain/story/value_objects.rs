//! Story Context - Value Objects

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 语音合成服务默认采样率（L16 PCM 未携带 rate 参数时使用）
pub const DEFAULT_SPEECH_SAMPLE_RATE: u32 = 24000;

/// 可接受的 PCM 采样率与声道数上限
const MAX_PCM_SAMPLE_RATE: u32 = 384_000;
const MAX_PCM_CHANNELS: u16 = 8;

/// 故事唯一标识
///
/// 基于 UUID v7，按创建时间单调递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 旁白语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 印尼语
    Id,
    /// 英语
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Id => "id",
            Language::En => "en",
        }
    }

    /// 写进提示词里的语言名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Id => "Indonesian",
            Language::En => "English",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Language::Id),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

/// 学科类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Story,
    Math,
    History,
    Science,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Story => "story",
            Subject::Math => "math",
            Subject::History => "history",
            Subject::Science => "science",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "story" => Some(Subject::Story),
            "math" => Some(Subject::Math),
            "history" => Some(Subject::History),
            "science" => Some(Subject::Science),
            _ => None,
        }
    }

    /// 是否为数值类学科（小游戏出应用题而不是阅读理解题）
    pub fn is_numeric(&self) -> bool {
        matches!(self, Subject::Math)
    }
}

/// 小游戏题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// 知识问答
    Quiz,
    /// 数学挑战
    MathChallenge,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Quiz => "quiz",
            GameKind::MathChallenge => "math_challenge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "quiz" => Some(GameKind::Quiz),
            "math_challenge" => Some(GameKind::MathChallenge),
            _ => None,
        }
    }
}

/// 插图引用
///
/// 生成成功时内联为 data URI，失败时退化为由提示词派生的占位图地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Illustration {
    Generated { data_uri: String },
    Placeholder { url: String },
}

impl Illustration {
    pub fn generated(mime_type: &str, bytes: &[u8]) -> Self {
        Self::Generated {
            data_uri: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
        }
    }

    /// 占位图：同一提示词总是得到同一张图
    pub fn placeholder(base_url: &str, image_prompt: &str) -> Self {
        let digest = format!("{:x}", md5::compute(image_prompt.as_bytes()));
        Self::Placeholder {
            url: format!(
                "{}/seed/{}/800/800",
                base_url.trim_end_matches('/'),
                &digest[..12]
            ),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Illustration::Placeholder { .. })
    }

    /// 可直接用于 `<img src>` 的地址
    pub fn source(&self) -> &str {
        match self {
            Illustration::Generated { data_uri } => data_uri,
            Illustration::Placeholder { url } => url,
        }
    }
}

/// 旁白音频编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum AudioEncoding {
    /// 裸 PCM，16 位有符号小端
    Pcm16 { sample_rate: u32, channels: u16 },
    /// 带 RIFF 头的 WAV
    Wav,
}

/// 旁白音频
///
/// 保存服务返回的原始字节，播放时再解码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationAudio {
    encoding: AudioEncoding,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl NarrationAudio {
    pub fn pcm16(sample_rate: u32, channels: u16, data: Vec<u8>) -> Self {
        Self {
            encoding: AudioEncoding::Pcm16 {
                sample_rate,
                channels,
            },
            data,
        }
    }

    pub fn wav(data: Vec<u8>) -> Self {
        Self {
            encoding: AudioEncoding::Wav,
            data,
        }
    }

    /// 按服务返回的 MIME 类型构造
    ///
    /// 支持 `audio/L16;codec=pcm;rate=24000` 和 `audio/wav`，
    /// 其他类型、空数据或超出范围的采样率/声道数返回 None
    pub fn from_mime(mime_type: &str, data: Vec<u8>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let mut params = mime_type.split(';').map(str::trim);
        let essence = params.next()?.to_ascii_lowercase();

        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::wav(data)),
            "audio/l16" | "audio/pcm" => {
                let mut sample_rate = DEFAULT_SPEECH_SAMPLE_RATE;
                let mut channels = 1u16;
                for param in params {
                    if let Some((key, value)) = param.split_once('=') {
                        match key.trim().to_ascii_lowercase().as_str() {
                            "rate" => {
                                if let Ok(rate) = value.trim().parse() {
                                    sample_rate = rate;
                                }
                            }
                            "channels" => {
                                if let Ok(count) = value.trim().parse() {
                                    channels = count;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                if !(1..=MAX_PCM_SAMPLE_RATE).contains(&sample_rate)
                    || !(1..=MAX_PCM_CHANNELS).contains(&channels)
                {
                    return None;
                }
                Some(Self::pcm16(sample_rate, channels, data))
            }
            _ => None,
        }
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 二进制字段以 base64 字符串序列化
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
