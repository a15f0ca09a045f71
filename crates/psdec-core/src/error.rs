//! 统一错误类型定义.
//!
//! 所有 psdec crate 共用的错误类型. 每个变体都携带定位信息
//! (比特偏移、期望值与实际值), 便于诊断损坏的码流.

use thiserror::Error;

/// psdec 统一错误类型
#[derive(Debug, Error)]
pub enum PsError {
    /// 期望的起始码缺失, 或遇到无法识别的起始码
    #[error("未找到起始码: 期望 {expected:?}, 实际 0x{found:08X} (比特偏移 {bit_offset})")]
    StartCodeNotFound {
        /// 期望的起始码, `None` 表示任意合法起始码
        expected: Option<u32>,
        /// 实际读到的 32 位值
        found: u32,
        /// 出错位置
        bit_offset: u64,
    },

    /// 结构性标记位不为 1 (或固定前缀不匹配)
    #[error("标记位错误: {field} 期望 {expected:#b}, 实际 {found:#b} (比特偏移 {bit_offset})")]
    MarkerBitViolation {
        /// 字段名称
        field: &'static str,
        /// 期望值
        expected: u32,
        /// 实际值
        found: u32,
        /// 出错位置
        bit_offset: u64,
    },

    /// 段长度记账未能到达期望的剩余量
    #[error("格式错误: {section} 期望剩余 {expected}, 实际 {actual}")]
    FormatMismatch {
        /// 段名称
        section: &'static str,
        /// 期望值
        expected: u64,
        /// 实际值
        actual: u64,
    },

    /// 时间戳标签与期望的变体不符
    #[error("时间戳标签错误: {kind} 期望 {expected:#06b}, 实际 {found:#06b} (比特偏移 {bit_offset})")]
    TimestampTagMismatch {
        /// 时间戳变体名称
        kind: &'static str,
        /// 期望标签
        expected: u8,
        /// 实际标签
        found: u8,
        /// 出错位置
        bit_offset: u64,
    },

    /// 数据源在满足声明长度之前耗尽
    #[error("数据不足: 需要 {needed_bits} 位, 仅剩 {available_bits} 位 (比特偏移 {bit_offset})")]
    ShortRead {
        /// 需要的位数
        needed_bits: u64,
        /// 实际可用的位数
        available_bits: u64,
        /// 出错位置
        bit_offset: u64,
    },

    /// 输出缓冲区容量不足
    #[error("输出缓冲区溢出: 容量 {capacity}, 需要 {required}")]
    BufferOverflow {
        /// 调用方提供的容量
        capacity: usize,
        /// 写入后所需的总长度
        required: usize,
    },

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,
}

impl PsError {
    /// 是否为数据不足类错误 (包括流末尾)
    pub fn is_short_read(&self) -> bool {
        matches!(self, Self::ShortRead { .. } | Self::Eof)
    }
}

/// psdec 统一 Result 类型
pub type PsResult<T> = Result<T, PsError>;
