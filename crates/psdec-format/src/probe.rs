//! 格式探测.
//!
//! 通过分析数据头部和文件扩展名, 判断输入是否为节目流.

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 最低探测分数 (仅根据扩展名)
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 最高探测分数 (魔数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据数据头部探测格式
    ///
    /// # 参数
    /// - `data`: 数据开头的若干字节 (通常 2KB ~ 32KB)
    /// - `filename`: 文件名 (可选, 用于扩展名匹配)
    ///
    /// # 返回
    /// - `Some(score)`: 探测成功, 返回置信度
    /// - `None`: 不是此格式
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;

    /// 格式名称
    fn name(&self) -> &'static str;
}
