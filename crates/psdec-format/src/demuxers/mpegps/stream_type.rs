//! 基本流类型与 stream_id 分类.

use std::fmt;

/// PSM 中的 stream_type 取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4Video,
    H264,
    H265,
    /// MPEG-1/2 音频 (0x03, 0x04)
    MpegAudio(u8),
    Aac,
    /// 私有类型 0x80 (SVAC / PCM)
    PrivateSvac,
    G711A,
    G711U,
    G7221,
    G7231,
    G729,
    Unknown(u8),
}

impl StreamType {
    /// 从 stream_type 字节转换
    pub fn from_u8(value: u8) -> Self {
        match value {
            // 视频
            0x01 => Self::Mpeg1Video,
            0x02 => Self::Mpeg2Video,
            0x10 => Self::Mpeg4Video,
            0x1B => Self::H264,
            0x24 => Self::H265,
            // 音频
            0x03 | 0x04 => Self::MpegAudio(value),
            0x0F => Self::Aac,
            0x80 => Self::PrivateSvac,
            0x90 => Self::G711A,
            0x91 => Self::G711U,
            0x92 => Self::G7221,
            0x93 => Self::G7231,
            0x99 => Self::G729,
            other => Self::Unknown(other),
        }
    }

    /// 还原为 stream_type 字节
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Mpeg1Video => 0x01,
            Self::Mpeg2Video => 0x02,
            Self::Mpeg4Video => 0x10,
            Self::H264 => 0x1B,
            Self::H265 => 0x24,
            Self::MpegAudio(v) | Self::Unknown(v) => v,
            Self::Aac => 0x0F,
            Self::PrivateSvac => 0x80,
            Self::G711A => 0x90,
            Self::G711U => 0x91,
            Self::G7221 => 0x92,
            Self::G7231 => 0x93,
            Self::G729 => 0x99,
        }
    }

    /// 名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Mpeg1Video => "mpeg1video",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4Video => "mpeg4",
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::MpegAudio(_) => "mp3",
            Self::Aac => "aac",
            Self::PrivateSvac => "svac",
            Self::G711A => "pcm_alaw",
            Self::G711U => "pcm_mulaw",
            Self::G7221 => "g722_1",
            Self::G7231 => "g723_1",
            Self::G729 => "g729",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.as_u8())
    }
}

/// 按 stream_id 区间划分的基本流类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsClass {
    /// 0xE0..=0xEF
    Video,
    /// 0xC0..=0xDF
    Audio,
    Other,
}

impl EsClass {
    pub fn from_stream_id(stream_id: u8) -> Self {
        match stream_id {
            0xE0..=0xEF => Self::Video,
            0xC0..=0xDF => Self::Audio,
            _ => Self::Other,
        }
    }
}
