//! # psdec-format
//!
//! psdec 节目流解析库, 提供字节源抽象、PS 段解析器和访问单元解复用器.
//!
//! 解析器只依赖 [`psdec_core::BitCursor`], 可以直接作用于内存切片,
//! 也可以通过 [`IoBitReader`] 作用于文件或任意 `Read` 字节源.

pub mod config;
pub mod demuxers;
pub mod io;
pub mod probe;

// 重导出常用类型
pub use config::{DemuxConfig, EndCodePolicy, ResyncPolicy};
pub use demuxers::mpegps::{
    AccessUnit, AccessUnitInfo, DecodedAccessUnit, PsDecoder, PsDemuxer, PsProbe,
};
pub use io::{IoBitReader, IoContext, MemoryBackend};
pub use probe::{FormatProbe, ProbeScore};
