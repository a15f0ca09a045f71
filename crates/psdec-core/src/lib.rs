//! # psdec-core
//!
//! psdec 核心库, 提供错误类型、比特流读写和 MPEG 时钟类型.
//!
//! 上层的节目流解析器只依赖 [`BitCursor`] 这一读取契约,
//! 不关心数据来自内存切片还是流式 I/O.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod timestamp;

// 重导出常用类型
pub use bitreader::{BitCursor, BitReader};
pub use bitwriter::BitWriter;
pub use error::{PsError, PsResult};
pub use timestamp::{MpegTimestamp, SystemClockReference};
