//! Pack 头解析.
//!
//! ```text
//! '01'(2) SCR[32..30](3) marker SCR[29..15](15) marker SCR[14..0](15) marker
//! SCR_ext(9) marker program_mux_rate(22) marker marker
//! reserved(5) pack_stuffing_length(3) stuffing_byte * N
//! ```

use log::debug;
use psdec_core::{BitCursor, PsError, PsResult, SystemClockReference};

use super::{PACK_START_CODE, read_marker};

/// pack 头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    /// 系统时钟参考
    pub scr: SystemClockReference,
    /// 复用码率 (单位 50 字节/秒)
    pub program_mux_rate: u32,
    /// 填充字节数
    pub stuffing_len: u8,
}

/// 读取 pack 起始码及 pack 头
///
/// 若配置了厂商填充段起始码且首个起始码与之相同, 先按其 16 位长度跳过该段.
pub fn read_pack<C: BitCursor + ?Sized>(
    cursor: &mut C,
    vendor_padding_code: Option<u32>,
) -> PsResult<PackHeader> {
    if let Some(padding_code) = vendor_padding_code {
        if cursor.peek_uint(32)? as u32 == padding_code {
            cursor.skip_bits(32)?;
            let len = cursor.read_uint(16)? as usize;
            cursor.skip_bytes(len)?;
            debug!("PS: 跳过厂商填充段 0x{:08X}, {} 字节", padding_code, len);
        }
    }

    let bit_offset = cursor.bit_position();
    let code = cursor.read_uint(32)? as u32;
    if code != PACK_START_CODE {
        return Err(PsError::StartCodeNotFound {
            expected: Some(PACK_START_CODE),
            found: code,
            bit_offset,
        });
    }
    parse_pack_header(cursor)
}

/// 解析 pack 起始码之后的固定头部并跳过填充字节
pub fn parse_pack_header<C: BitCursor + ?Sized>(cursor: &mut C) -> PsResult<PackHeader> {
    read_marker(cursor, 2, 0b01, "pack_prefix")?;
    let high = cursor.read_uint(3)?;
    read_marker(cursor, 1, 1, "scr_marker_0")?;
    let mid = cursor.read_uint(15)?;
    read_marker(cursor, 1, 1, "scr_marker_1")?;
    let low = cursor.read_uint(15)?;
    read_marker(cursor, 1, 1, "scr_marker_2")?;
    let extension = cursor.read_uint(9)? as u16;
    read_marker(cursor, 1, 1, "scr_ext_marker")?;
    let program_mux_rate = cursor.read_uint(22)? as u32;
    read_marker(cursor, 1, 1, "mux_rate_marker_0")?;
    read_marker(cursor, 1, 1, "mux_rate_marker_1")?;
    cursor.skip_bits(5)?;
    let stuffing_len = cursor.read_uint(3)? as u8;
    cursor.skip_bytes(usize::from(stuffing_len))?;

    let scr = SystemClockReference::new((high << 30) | (mid << 15) | low, extension)?;
    debug!(
        "PS pack: scr={} ({}), mux_rate={}, stuffing={}",
        scr.base, scr, program_mux_rate, stuffing_len,
    );

    Ok(PackHeader {
        scr,
        program_mux_rate,
        stuffing_len,
    })
}
