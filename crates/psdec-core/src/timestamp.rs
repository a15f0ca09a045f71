//! MPEG 系统层时钟类型.
//!
//! - PTS/DTS: 33 位, 90 kHz 时钟
//! - SCR: 33 位 base (90 kHz) + 9 位 extension, 合成 27 MHz 系统时钟

use std::fmt;

use crate::{PsError, PsResult};

/// 90 kHz 时间戳时钟频率
pub const CLOCK_90KHZ: u64 = 90_000;

/// 27 MHz 系统时钟频率
pub const SYSTEM_CLOCK_HZ: u64 = 27_000_000;

/// 33 位时间戳掩码
pub const TIMESTAMP_MASK: u64 = (1 << 33) - 1;

/// SCR extension 上限 (不含)
pub const SCR_EXTENSION_LIMIT: u16 = 1 << 9;

/// 33 位 90 kHz 时间戳 (PTS/DTS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MpegTimestamp(u64);

impl MpegTimestamp {
    /// 创建时间戳, 超过 33 位时返回错误
    pub fn new(ticks: u64) -> PsResult<Self> {
        if ticks > TIMESTAMP_MASK {
            return Err(PsError::InvalidArgument(format!(
                "时间戳 {ticks} 超过 33 位"
            )));
        }
        Ok(Self(ticks))
    }

    /// 90 kHz 时钟刻度
    pub const fn ticks(&self) -> u64 {
        self.0
    }

    /// 转换为秒
    pub fn to_seconds(&self) -> f64 {
        self.0 as f64 / CLOCK_90KHZ as f64
    }

    /// 在 33 位环上计算 `self - earlier`
    ///
    /// 时间戳在约 26.5 小时后回绕, 回绕后的差值仍然正确.
    pub const fn wrapping_sub(&self, earlier: MpegTimestamp) -> u64 {
        self.0.wrapping_sub(earlier.0) & TIMESTAMP_MASK
    }
}

impl fmt::Display for MpegTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.to_seconds())
    }
}

/// 系统时钟参考 (SCR)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClockReference {
    /// 33 位 base, 90 kHz
    pub base: u64,
    /// 9 位 extension, 27 MHz 余数 (0..300)
    pub extension: u16,
}

impl SystemClockReference {
    /// 创建 SCR, 字段超出位宽时返回错误
    pub fn new(base: u64, extension: u16) -> PsResult<Self> {
        if base > TIMESTAMP_MASK || extension >= SCR_EXTENSION_LIMIT {
            return Err(PsError::InvalidArgument(format!(
                "SCR 超出位宽: base={base}, extension={extension}"
            )));
        }
        Ok(Self { base, extension })
    }

    /// 27 MHz 系统时钟值
    pub const fn to_27mhz(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }

    /// 转换为秒
    pub fn to_seconds(&self) -> f64 {
        self.to_27mhz() as f64 / SYSTEM_CLOCK_HZ as f64
    }
}

impl fmt::Display for SystemClockReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.to_seconds())
    }
}
