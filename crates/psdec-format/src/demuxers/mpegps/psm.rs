//! 节目流映射 (PSM) 解析.
//!
//! ```text
//! map_length(16)
//! current_next(1) reserved(2) version(5) reserved(7) marker(1)
//! info_length(16) descriptor * info_length
//! es_map_length(16)
//!   { stream_type(8) es_id(8) es_info_length(16) descriptor * es_info_length } ...
//! CRC_32(32)
//! ```
//!
//! 长度记账: map_length 依次扣除各部分后, 剩余量必须恰好等于 CRC 的 4 字节.

use log::debug;
use psdec_core::{BitCursor, PsError, PsResult};

use super::deduct;
use super::stream_type::{EsClass, StreamType};

const SECTION: &str = "program_stream_map";
const CRC_BYTES: u64 = 4;

/// 节目流映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramStreamMap {
    pub version: u8,
    pub current_next: bool,
    /// 全部基本流条目 (包括未分类的)
    pub entries: Vec<EsMapEntry>,
    /// 最后一个视频条目的 stream_type
    pub video_stream_type: Option<u8>,
    /// 最后一个音频条目的 stream_type
    pub audio_stream_type: Option<u8>,
}

/// 基本流映射条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsMapEntry {
    pub stream_type: u8,
    pub stream_id: u8,
    /// 描述符长度
    pub info_length: u16,
}

impl EsMapEntry {
    pub fn class(&self) -> EsClass {
        EsClass::from_stream_id(self.stream_id)
    }

    pub fn kind(&self) -> StreamType {
        StreamType::from_u8(self.stream_type)
    }
}

/// 解析节目流映射 (起始码已被消耗)
pub fn parse_program_stream_map<C: BitCursor + ?Sized>(
    cursor: &mut C,
) -> PsResult<ProgramStreamMap> {
    let map_length = cursor.read_uint(16)?;

    let current_next = cursor.read_flag()?;
    cursor.skip_bits(2)?;
    let version = cursor.read_uint(5)? as u8;
    cursor.skip_bits(8)?;
    let mut outstanding = deduct(SECTION, map_length, 2)?;

    let info_length = cursor.read_uint(16)?;
    cursor.skip_bytes(info_length as usize)?;
    outstanding = deduct(SECTION, outstanding, info_length + 2)?;

    let es_map_length = cursor.read_uint(16)?;
    outstanding = deduct(SECTION, outstanding, es_map_length + 2)?;

    let mut map = ProgramStreamMap {
        version,
        current_next,
        ..Default::default()
    };

    let mut remaining = es_map_length;
    while remaining > 0 {
        remaining = deduct("es_map", remaining, 4)?;
        let stream_type = cursor.read_uint(8)? as u8;
        let stream_id = cursor.read_uint(8)? as u8;
        let info_length = cursor.read_uint(16)? as u16;
        remaining = deduct("es_map", remaining, u64::from(info_length))?;
        cursor.skip_bytes(usize::from(info_length))?;

        let entry = EsMapEntry {
            stream_type,
            stream_id,
            info_length,
        };
        match entry.class() {
            EsClass::Video => map.video_stream_type = Some(stream_type),
            EsClass::Audio => map.audio_stream_type = Some(stream_type),
            EsClass::Other => {}
        }
        debug!(
            "PS PSM: stream_id=0x{:02X}, stream_type={}",
            stream_id,
            entry.kind(),
        );
        map.entries.push(entry);
    }

    if outstanding != CRC_BYTES {
        return Err(PsError::FormatMismatch {
            section: SECTION,
            expected: CRC_BYTES,
            actual: outstanding,
        });
    }
    // CRC 不校验
    cursor.skip_bits(32)?;

    Ok(map)
}
