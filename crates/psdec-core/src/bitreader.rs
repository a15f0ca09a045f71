//! 比特流读取器.
//!
//! 定义节目流解析器使用的读取契约 [`BitCursor`], 并提供基于内存切片的实现 [`BitReader`].
//!
//! 按大端位序读取 (MSB first), MPEG 系统层的所有字段都按此位序打包.

use crate::{PsError, PsResult};

/// 比特游标
///
/// 顺序读取、可窥视、可跳过的比特读取契约.
/// 所有多位字段按大端位序 (MSB first) 解释.
pub trait BitCursor {
    /// 读取接下来的 `n` 位 (0..=64), 返回值的低 `n` 位有效
    ///
    /// 剩余位数不足时返回 [`PsError::ShortRead`], 且不移动位置.
    fn read_uint(&mut self, n: u32) -> PsResult<u64>;

    /// 窥视接下来的 `n` 位, 不移动位置
    fn peek_uint(&mut self, n: u32) -> PsResult<u64>;

    /// 跳过 `n` 位
    fn skip_bits(&mut self, n: u64) -> PsResult<()>;

    /// 按字节读取, 填满 `buf`
    ///
    /// 要求当前处于字节边界. 未能读满时返回 [`PsError::ShortRead`].
    fn read_bytes(&mut self, buf: &mut [u8]) -> PsResult<()>;

    /// 自创建以来已消费的总位数
    fn bit_position(&self) -> u64;

    /// 是否已没有任何可读的位
    fn is_exhausted(&mut self) -> PsResult<bool>;

    /// 读取 1 位布尔标志
    fn read_flag(&mut self) -> PsResult<bool> {
        Ok(self.read_uint(1)? == 1)
    }

    /// 当前是否位于字节边界
    fn is_byte_aligned(&self) -> bool {
        self.bit_position() % 8 == 0
    }

    /// 跳过 `n` 个字节
    fn skip_bytes(&mut self, n: usize) -> PsResult<()> {
        self.skip_bits(n as u64 * 8)
    }
}

/// 内存切片上的比特游标
///
/// # 示例
/// ```
/// use psdec_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(12).unwrap(), 0b0001_0101_0101);
/// assert!(br.is_eof());
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已消费的位数
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 剩余可读位数
    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    fn short_read(&self, needed_bits: u64) -> PsError {
        PsError::ShortRead {
            needed_bits,
            available_bits: self.bits_left() as u64,
            bit_offset: self.pos as u64,
        }
    }

    /// 读取 `n` 位 (0..=64)
    ///
    /// 失败时不移动位置.
    pub fn read_bits(&mut self, n: u32) -> PsResult<u64> {
        if n > 64 {
            return Err(PsError::InvalidArgument(format!(
                "read_bits: n={} 超过 64 位",
                n,
            )));
        }
        if n as usize > self.bits_left() {
            return Err(self.short_read(u64::from(n)));
        }

        let mut value = 0u64;
        let mut remaining = n;
        while remaining > 0 {
            let offset = (self.pos % 8) as u32;
            let take = remaining.min(8 - offset);
            let byte = u64::from(self.data[self.pos / 8]);
            let bits = (byte >> (8 - offset - take)) & ((1 << take) - 1);
            value = (value << take) | bits;
            self.pos += take as usize;
            remaining -= take;
        }
        Ok(value)
    }

    /// 从当前位置借出原始字节切片, 要求字节对齐
    pub fn read_slice(&mut self, n: usize) -> PsResult<&'a [u8]> {
        if self.pos % 8 != 0 {
            return Err(PsError::InvalidArgument("read_slice 需要字节对齐".into()));
        }
        if n * 8 > self.bits_left() {
            return Err(self.short_read(n as u64 * 8));
        }
        let start = self.pos / 8;
        self.pos += n * 8;
        Ok(&self.data[start..start + n])
    }
}

impl BitCursor for BitReader<'_> {
    fn read_uint(&mut self, n: u32) -> PsResult<u64> {
        self.read_bits(n)
    }

    fn peek_uint(&mut self, n: u32) -> PsResult<u64> {
        let saved = self.pos;
        let result = self.read_bits(n);
        self.pos = saved;
        result
    }

    fn skip_bits(&mut self, n: u64) -> PsResult<()> {
        if n > self.bits_left() as u64 {
            return Err(self.short_read(n));
        }
        self.pos += n as usize;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> PsResult<()> {
        let slice = self.read_slice(buf.len())?;
        buf.copy_from_slice(slice);
        Ok(())
    }

    fn bit_position(&self) -> u64 {
        self.pos as u64
    }

    fn is_exhausted(&mut self) -> PsResult<bool> {
        Ok(self.is_eof())
    }
}
