//! 系统头解析.
//!
//! 系统头只需被正确消耗, 使游标落在下一个起始码上; 其中的码率和缓冲区上限不参与解复用.

use log::debug;
use psdec_core::{BitCursor, PsError, PsResult};

/// 固定前导部分长度 (rate_bound .. reserved)
const PRELUDE_BYTES: u64 = 6;
/// 每个 stream-bound 条目的长度
const STREAM_BOUND_BYTES: u64 = 3;

/// 系统头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemHeader {
    /// 声明的段长度 (长度字段之后的字节数)
    pub header_length: u16,
    pub rate_bound: u32,
    pub audio_bound: u8,
    pub video_bound: u8,
    /// stream-bound 条目
    pub stream_bounds: Vec<StreamBound>,
}

/// stream-bound 条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamBound {
    pub stream_id: u8,
    /// false: 128 字节单位, true: 1024 字节单位
    pub buffer_bound_scale: bool,
    pub buffer_size_bound: u16,
}

/// 解析系统头 (起始码已被消耗)
pub fn parse_system_header<C: BitCursor + ?Sized>(cursor: &mut C) -> PsResult<SystemHeader> {
    let header_length = cursor.read_uint(16)? as u16;
    let mut remaining = u64::from(header_length)
        .checked_sub(PRELUDE_BYTES)
        .ok_or(PsError::FormatMismatch {
            section: "system_header",
            expected: PRELUDE_BYTES,
            actual: u64::from(header_length),
        })?;

    // 前导部分只做诊断用途, 标记位不校验
    cursor.skip_bits(1)?;
    let rate_bound = cursor.read_uint(22)? as u32;
    cursor.skip_bits(1)?;
    let audio_bound = cursor.read_uint(6)? as u8;
    cursor.skip_bits(5)?;
    let video_bound = cursor.read_uint(5)? as u8;
    cursor.skip_bits(8)?;

    let mut stream_bounds = Vec::new();
    while remaining >= STREAM_BOUND_BYTES && cursor.peek_uint(1)? == 0 {
        let stream_id = cursor.read_uint(8)? as u8;
        cursor.skip_bits(2)?;
        let buffer_bound_scale = cursor.read_flag()?;
        let buffer_size_bound = cursor.read_uint(13)? as u16;
        stream_bounds.push(StreamBound {
            stream_id,
            buffer_bound_scale,
            buffer_size_bound,
        });
        remaining -= STREAM_BOUND_BYTES;
    }

    if remaining > 0 {
        cursor.skip_bytes(remaining as usize)?;
    }

    debug!(
        "PS 系统头: rate_bound={}, audio_bound={}, video_bound={}, 条目={}, 跳过 {} 字节",
        rate_bound,
        audio_bound,
        video_bound,
        stream_bounds.len(),
        remaining,
    );

    Ok(SystemHeader {
        header_length,
        rate_bound,
        audio_bound,
        video_bound,
        stream_bounds,
    })
}
