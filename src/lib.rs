//! # psdec
//!
//! 纯 Rust 实现的 MPEG-2 节目流 (Program Stream) 解析库.
//!
//! 从节目流中恢复视频访问单元的载荷, 解析 SCR、PTS/DTS,
//! 并通过节目流映射识别关键帧与基本流类型.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use psdec::format::{DemuxConfig, IoContext, PsDemuxer};
//! use psdec::core::PsError;
//!
//! let mut io = IoContext::open_read("camera.ps")?;
//! let mut demuxer = PsDemuxer::new(DemuxConfig::default());
//! loop {
//!     match demuxer.read_access_unit(&mut io) {
//!         Ok(unit) => println!("pts={:?}, {} 字节", unit.pts(), unit.data.len()),
//!         Err(PsError::Eof) => break,
//!         Err(e) => return Err(e),
//!     }
//! }
//! # Ok::<(), PsError>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `psdec-core` | 错误类型、比特流读写、MPEG 时钟类型 |
//! | `psdec-format` | 字节源、PS 段解析、访问单元解复用、格式探测 |

/// 核心类型与工具
pub use psdec_core as core;

/// 节目流解析与解复用
pub use psdec_format as format;

/// 获取 psdec 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
