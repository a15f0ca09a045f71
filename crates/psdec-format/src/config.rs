//! 解复用配置.
//!
//! 所有字段都有默认值, 可以从部分 JSON/TOML 反序列化.

use serde::{Deserialize, Serialize};

/// 默认最大重同步字节数 (64 KB)
pub const DEFAULT_MAX_RESYNC_BYTES: usize = 64 * 1024;

/// 默认访问单元缓冲区容量 (2 MB)
pub const DEFAULT_UNIT_CAPACITY: usize = 2 * 1024 * 1024;

/// 遇到程序结束码 (0x000001B9) 时的行为
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCodePolicy {
    /// 结束码结束本次解析; 已有载荷后遇到新的 pack 头也结束本次解析 (pack 头留给下一次)
    #[default]
    Terminate,
    /// 吸收结束码并合并后续 pack, 直到数据源耗尽
    Continue,
}

/// 遇到无法识别的起始码时的行为
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// 逐字节丢弃, 直到找到可识别的起始码
    #[default]
    Resync,
    /// 立即返回 `StartCodeNotFound`
    Fail,
}

/// 节目流解复用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemuxConfig {
    /// 程序结束码策略
    #[serde(default)]
    pub end_code: EndCodePolicy,
    /// 未知起始码策略
    #[serde(default)]
    pub resync: ResyncPolicy,
    /// 单次重同步最多丢弃的字节数
    #[serde(default = "default_max_resync_bytes")]
    pub max_resync_bytes: usize,
    /// 厂商前置填充段的起始码 (出现在 pack 头之前, 后跟 16 位长度)
    #[serde(default)]
    pub vendor_padding_code: Option<u32>,
    /// [`PsDemuxer`](crate::demuxers::mpegps::PsDemuxer) 内部缓冲区容量
    #[serde(default = "default_unit_capacity")]
    pub unit_capacity: usize,
}

fn default_max_resync_bytes() -> usize {
    DEFAULT_MAX_RESYNC_BYTES
}

fn default_unit_capacity() -> usize {
    DEFAULT_UNIT_CAPACITY
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            end_code: EndCodePolicy::default(),
            resync: ResyncPolicy::default(),
            max_resync_bytes: DEFAULT_MAX_RESYNC_BYTES,
            vendor_padding_code: None,
            unit_capacity: DEFAULT_UNIT_CAPACITY,
        }
    }
}
