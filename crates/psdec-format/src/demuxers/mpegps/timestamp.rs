//! PES 头中的 PTS/DTS 字段解码.
//!
//! 5 字节布局:
//! ```text
//! tag(4) ts[32..30](3) marker(1)
//! ts[29..15](15) marker(1)
//! ts[14..0](15) marker(1)
//! ```

use psdec_core::{BitCursor, MpegTimestamp, PsError, PsResult};

use super::read_marker;

/// 时间戳字段的编码长度 (字节)
pub const TIMESTAMP_BYTES: u8 = 5;

/// 时间戳变体, 决定期望的 4 位标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// 仅有 PTS (标签 '0010')
    PresentationOnly,
    /// PTS 之后跟随 DTS (标签 '0011')
    PresentationThenDecode,
    /// 跟随在 PTS 之后的 DTS (标签 '0001')
    DecodeAfterPresentation,
}

impl TimestampKind {
    /// 期望的 4 位标签
    pub const fn tag(self) -> u8 {
        match self {
            Self::PresentationOnly => 0b0010,
            Self::PresentationThenDecode => 0b0011,
            Self::DecodeAfterPresentation => 0b0001,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::PresentationOnly => "pts",
            Self::PresentationThenDecode => "pts(dts)",
            Self::DecodeAfterPresentation => "dts",
        }
    }
}

/// 读取并校验一个 33 位时间戳, 消耗 40 位
///
/// 标签不符时返回 [`PsError::TimestampTagMismatch`], 游标不前进.
pub fn read_timestamp<C: BitCursor + ?Sized>(
    cursor: &mut C,
    kind: TimestampKind,
) -> PsResult<MpegTimestamp> {
    let tag = cursor.peek_uint(4)? as u8;
    if tag != kind.tag() {
        return Err(PsError::TimestampTagMismatch {
            kind: kind.name(),
            expected: kind.tag(),
            found: tag,
            bit_offset: cursor.bit_position(),
        });
    }
    cursor.skip_bits(4)?;

    let high = cursor.read_uint(3)?;
    read_marker(cursor, 1, 1, "timestamp_marker_0")?;
    let mid = cursor.read_uint(15)?;
    read_marker(cursor, 1, 1, "timestamp_marker_1")?;
    let low = cursor.read_uint(15)?;
    read_marker(cursor, 1, 1, "timestamp_marker_2")?;

    MpegTimestamp::new((high << 30) | (mid << 15) | low)
}
