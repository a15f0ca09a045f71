//! 视频 PES 包解析.
//!
//! ```text
//! PES_packet_length(16)
//! '10' scrambling(2) priority(1) alignment(1) copyright(1) original(1)
//! PTS_DTS_flags(2) 其他标志(6)
//! PES_header_data_length(8)
//! [PTS(40)] [DTS(40)] 其他可选字段/填充
//! payload
//! ```

use log::trace;
use psdec_core::{BitCursor, MpegTimestamp, PsError, PsResult};

use super::access_unit::PayloadSink;
use super::timestamp::{TIMESTAMP_BYTES, TimestampKind, read_timestamp};

/// packet_length 中长度字段之后的固定头部 (标志 2 字节 + header_data_length 1 字节)
const FIXED_HEADER_BYTES: u64 = 3;

/// 解析后的 PES 头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesHeader {
    pub stream_id: u8,
    pub packet_length: u16,
    pub pts: Option<MpegTimestamp>,
    pub dts: Option<MpegTimestamp>,
    pub header_data_length: u8,
    /// 拷贝到输出缓冲区的字节数
    pub payload_length: usize,
}

/// 解析一个 PES 包并把载荷追加到 `sink` (起始码已被消耗)
pub fn parse_pes_packet<C: BitCursor + ?Sized>(
    cursor: &mut C,
    stream_id: u8,
    sink: &mut PayloadSink<'_>,
) -> PsResult<PesHeader> {
    let packet_length = cursor.read_uint(16)? as u16;
    cursor.skip_bits(8)?;
    let flags = cursor.read_uint(2)?;
    cursor.skip_bits(6)?;
    let header_data_length = cursor.read_uint(8)? as u8;

    let overhead = FIXED_HEADER_BYTES + u64::from(header_data_length);
    let payload_length = u64::from(packet_length)
        .checked_sub(overhead)
        .ok_or(PsError::FormatMismatch {
            section: "pes_packet",
            expected: overhead,
            actual: u64::from(packet_length),
        })? as usize;

    let (pts, dts, timestamp_bytes) = match flags {
        0b10 if header_data_length >= TIMESTAMP_BYTES => {
            let pts = read_timestamp(cursor, TimestampKind::PresentationOnly)?;
            (Some(pts), None, TIMESTAMP_BYTES)
        }
        0b11 if header_data_length >= 2 * TIMESTAMP_BYTES => {
            let pts = read_timestamp(cursor, TimestampKind::PresentationThenDecode)?;
            let dts = read_timestamp(cursor, TimestampKind::DecodeAfterPresentation)?;
            (Some(pts), Some(dts), 2 * TIMESTAMP_BYTES)
        }
        _ => (None, None, 0),
    };
    cursor.skip_bytes(usize::from(header_data_length - timestamp_bytes))?;

    sink.append_from(cursor, payload_length)?;

    trace!(
        "PS PES: stream_id=0x{:02X}, len={}, pts={:?}, dts={:?}, payload={}",
        stream_id,
        packet_length,
        pts.map(|t| t.ticks()),
        dts.map(|t| t.ticks()),
        payload_length,
    );

    Ok(PesHeader {
        stream_id,
        packet_length,
        pts,
        dts,
        header_data_length,
        payload_length,
    })
}
