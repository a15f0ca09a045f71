//! 比特流写入器.
//!
//! 与 [`BitReader`](crate::bitreader::BitReader) 位序相同, 用于构造节目流测试样本和基准数据.

/// 大端位序 (MSB first) 的比特写入器
///
/// # 示例
/// ```
/// use psdec_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b01, 2);
/// bw.write_bits(0b100, 3);
/// bw.write_bit(1);
/// bw.write_bits(0b11, 2);
/// assert_eq!(bw.finish(), vec![0b01100111]);
/// ```
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    /// 未凑满一字节的位, 右对齐
    pending: u8,
    pending_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预留 `capacity` 字节
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// 写入 `bit` 的最低位
    pub fn write_bit(&mut self, bit: u32) {
        self.pending = (self.pending << 1) | (bit & 1) as u8;
        self.pending_bits += 1;
        if self.pending_bits == 8 {
            self.data.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    /// 写入 `value` 的低 `n` 位 (n <= 32), 高位在前
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);
        for shift in (0..n).rev() {
            self.write_bit(value >> shift);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.pending_bits == 0 {
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }

    /// 结束写入, 不足一字节的尾部以 0 补齐
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending_bits > 0 {
            self.data.push(self.pending << (8 - self.pending_bits));
        }
        self.data
    }
}
