//! MPEG-2 PS (Program Stream) 解析器.
//!
//! 节目流由一系列 pack 组成, 每个 pack 以 pack 头开始,
//! 其后是可选的系统头、节目流映射 (PSM) 和若干 PES 包.
//! 一个视频访问单元 (一帧) 可能横跨多个 PES 包甚至多个 pack.
//!
//! # Pack 结构
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ 0x000001BA + pack 头 (SCR, 复用码率)      │
//! │ [0x000001BB 系统头]                       │
//! │ [0x000001BC 节目流映射]     ← 关键帧标志  │
//! │ 0x000001E0 视频 PES         ← 载荷拷贝    │
//! │ 0x000001C0 音频 PES         ← 按长度跳过  │
//! │ ...                                       │
//! │ [0x000001B9 节目结束码]                   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! 所有解析器都基于 [`BitCursor`] 编写, 可同时用于内存切片和流式 I/O.

mod access_unit;
mod decoder;
mod demuxer;
mod pack;
mod pes;
mod psm;
mod stream_type;
mod system_header;
mod timestamp;

#[cfg(test)]
pub(crate) mod test_util;

pub use access_unit::{AccessUnit, AccessUnitInfo, DecodedAccessUnit, PayloadSink, Termination};
pub use decoder::PsDecoder;
pub use demuxer::PsDemuxer;
pub use pack::{PackHeader, parse_pack_header, read_pack};
pub use pes::{PesHeader, parse_pes_packet};
pub use psm::{EsMapEntry, ProgramStreamMap, parse_program_stream_map};
pub use stream_type::{EsClass, StreamType};
pub use system_header::{StreamBound, SystemHeader, parse_system_header};
pub use timestamp::{TimestampKind, read_timestamp};

use psdec_core::{BitCursor, PsError, PsResult};

use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX};

/// Pack 头起始码
pub const PACK_START_CODE: u32 = 0x0000_01BA;
/// 系统头起始码
pub const SYSTEM_HEADER_START_CODE: u32 = 0x0000_01BB;
/// 节目流映射起始码
pub const PROGRAM_STREAM_MAP_START_CODE: u32 = 0x0000_01BC;
/// 节目结束码
pub const PROGRAM_END_CODE: u32 = 0x0000_01B9;
/// 视频 PES 起始码 (低 4 位为流编号)
pub const VIDEO_STREAM_START_CODE: u32 = 0x0000_01E0;
/// 视频 PES 起始码掩码
pub const VIDEO_STREAM_MASK: u32 = 0xFFFF_FFF0;

/// 起始码前缀 (0x000001)
const START_CODE_PREFIX: u32 = 0x0000_01;

/// 起始码分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartCode {
    Pack,
    SystemHeader,
    StreamMap,
    ProgramEnd,
    /// 视频 PES, 携带 stream_id
    Video(u8),
    /// 其他带 16 位长度的段 (音频、填充、私有流等)
    LengthPrefixed(u8),
    Unknown,
}

impl StartCode {
    pub(crate) fn classify(code: u32) -> Self {
        if code >> 8 != START_CODE_PREFIX {
            return Self::Unknown;
        }
        match code {
            PACK_START_CODE => Self::Pack,
            SYSTEM_HEADER_START_CODE => Self::SystemHeader,
            PROGRAM_STREAM_MAP_START_CODE => Self::StreamMap,
            PROGRAM_END_CODE => Self::ProgramEnd,
            c if c & VIDEO_STREAM_MASK == VIDEO_STREAM_START_CODE => Self::Video(c as u8),
            c if (c as u8) >= 0xBC => Self::LengthPrefixed(c as u8),
            _ => Self::Unknown,
        }
    }
}

/// 读取固定值字段 (标记位、固定前缀)
///
/// 值不符时返回 [`PsError::MarkerBitViolation`], 游标停留在该字段起点.
pub(crate) fn read_marker<C: BitCursor + ?Sized>(
    cursor: &mut C,
    bits: u32,
    expected: u32,
    field: &'static str,
) -> PsResult<()> {
    let found = cursor.peek_uint(bits)? as u32;
    if found != expected {
        return Err(PsError::MarkerBitViolation {
            field,
            expected,
            found,
            bit_offset: cursor.bit_position(),
        });
    }
    cursor.skip_bits(u64::from(bits))
}

/// 从剩余长度中扣除, 不足时返回 [`PsError::FormatMismatch`]
pub(crate) fn deduct(section: &'static str, remaining: u64, amount: u64) -> PsResult<u64> {
    remaining
        .checked_sub(amount)
        .ok_or(PsError::FormatMismatch {
            section,
            expected: amount,
            actual: remaining,
        })
}

/// pack 头的前 5 字节是否合法 (起始码 + '01' 前缀)
fn is_pack_header(data: &[u8]) -> bool {
    data.len() >= 5 && data[..4] == [0x00, 0x00, 0x01, 0xBA] && data[4] & 0xC0 == 0x40
}

/// 节目流探测器
pub struct PsProbe;

/// 探测时搜索的最大字节数
const PROBE_SEARCH_LIMIT: usize = 2048;

impl FormatProbe for PsProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if is_pack_header(data) {
            return Some(SCORE_MAX);
        }

        // 前部有厂商填充或垃圾数据时, 在有限范围内搜索 pack 头
        let limit = data.len().min(PROBE_SEARCH_LIMIT);
        if (1..limit).any(|pos| is_pack_header(&data[pos..])) {
            return Some(SCORE_MAX - 25);
        }

        if let Some(name) = filename {
            if let Some(ext) = name.rsplit('.').next() {
                let ext_lower = ext.to_lowercase();
                if matches!(ext_lower.as_str(), "ps" | "mpg" | "mpeg" | "vob") {
                    return Some(SCORE_EXTENSION);
                }
            }
        }

        None
    }

    fn name(&self) -> &'static str {
        "mpegps"
    }
}
