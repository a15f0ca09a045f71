//! I/O 抽象层.
//!
//! 提供带缓冲的统一读取接口, 支持文件、内存缓冲区和任意 `Read` 字节源.
//! [`IoBitReader`] 在其上实现 [`BitCursor`], 供节目流解析器按位读取.

use std::io::{self, Read, Seek};

use psdec_core::{BitCursor, PsError, PsResult};

/// I/O 上下文
///
/// 封装底层 I/O 操作, 为解复用器提供统一的数据读取接口.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
    /// 已交付给调用方的字节数 (含跳过的字节)
    consumed: u64,
}

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的 I/O 来源 (文件、内存、网络等).
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持 seek
    fn is_seekable(&self) -> bool;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
            consumed: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: &str) -> PsResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从任意字节源创建 (不可 seek, 如网络套接字)
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(Box::new(ReaderBackend::new(reader)))
    }

    fn short_read(&self, needed: usize, available: usize) -> PsError {
        PsError::ShortRead {
            needed_bits: needed as u64 * 8,
            available_bits: available as u64 * 8,
            bit_offset: self.consumed * 8,
        }
    }

    /// 缓冲区为空时从后端补充数据, 返回缓冲区中可用的字节数
    fn fill_buffer(&mut self) -> PsResult<usize> {
        if self.buf_pos >= self.buf_len {
            self.buf_pos = 0;
            self.buf_len = self.inner.read(&mut self.buffer)?;
        }
        Ok(self.buf_len - self.buf_pos)
    }

    // ========================
    // 读取方法
    // ========================

    /// 是否还有可读数据
    pub fn has_more(&mut self) -> PsResult<bool> {
        Ok(self.fill_buffer()? > 0)
    }

    /// 读取指定字节数
    ///
    /// 数据源提前耗尽时返回 [`PsError::ShortRead`].
    pub fn read_exact(&mut self, buf: &mut [u8]) -> PsResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.fill_buffer()?;
            if buffered == 0 {
                let err = self.short_read(buf.len(), total_read);
                self.consumed += total_read as u64;
                return Err(err);
            }
            let to_copy = buffered.min(buf.len() - total_read);
            buf[total_read..total_read + to_copy]
                .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
            self.buf_pos += to_copy;
            total_read += to_copy;
        }
        self.consumed += buf.len() as u64;
        Ok(())
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> PsResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> PsResult<()> {
        // 先尝试消耗缓冲区中的数据
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            self.consumed += count as u64;
            return Ok(());
        }

        // 跳过缓冲区中所有剩余数据
        let remaining = count - buffered;
        self.buf_pos = self.buf_len;
        self.consumed += buffered as u64;

        // 可 seek 且大小已知时直接跳过, 否则逐块丢弃
        if let (true, Some(size)) = (self.inner.is_seekable(), self.inner.size()) {
            let pos = self.inner.position()?;
            let available = size.saturating_sub(pos);
            if (remaining as u64) > available {
                let err = self.short_read(remaining, available as usize);
                self.inner.seek(io::SeekFrom::End(0))?;
                self.consumed += available;
                return Err(err);
            }
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
            self.consumed += remaining as u64;
        } else {
            let mut left = remaining;
            while left > 0 {
                let to_read = left.min(self.buffer.len());
                let n = self.inner.read(&mut self.buffer[..to_read])?;
                if n == 0 {
                    self.buf_pos = 0;
                    self.buf_len = 0;
                    return Err(self.short_read(left, 0));
                }
                left -= n;
                self.consumed += n as u64;
            }
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(())
    }

    /// 将已读取的字节退回缓冲区头部
    ///
    /// 下一次读取将首先返回这些字节.
    pub fn unread(&mut self, bytes: &[u8]) {
        let n = bytes.len();
        if n == 0 {
            return;
        }
        if n <= self.buf_pos {
            self.buf_pos -= n;
            self.buffer[self.buf_pos..self.buf_pos + n].copy_from_slice(bytes);
        } else {
            let mut merged = Vec::with_capacity(n + self.buf_len - self.buf_pos);
            merged.extend_from_slice(bytes);
            merged.extend_from_slice(&self.buffer[self.buf_pos..self.buf_len]);
            if merged.len() > self.buffer.len() {
                self.buffer.resize(merged.len(), 0);
            }
            self.buffer[..merged.len()].copy_from_slice(&merged);
            self.buf_pos = 0;
            self.buf_len = merged.len();
        }
        self.consumed = self.consumed.saturating_sub(n as u64);
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区.
    pub fn seek(&mut self, pos: io::SeekFrom) -> PsResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        let new_pos = self.inner.seek(pos)?;
        self.consumed = new_pos;
        Ok(new_pos)
    }

    /// 已交付给调用方的字节数
    ///
    /// 对可 seek 的后端, 等于从数据源开头算起的位置.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// 是否支持随机访问
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 通用字节源后端
///
/// 包装任意 `Read` 实现 (套接字、管道等), 不支持 seek.
/// 需要超时或取消时, 由调用方在 `Read` 实现中处理并以 I/O 错误返回.
pub struct ReaderBackend<R> {
    reader: R,
    pos: u64,
}

impl<R: Read + Send> ReaderBackend<R> {
    /// 包装字节源
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }
}

impl<R: Read + Send> IoBackend for ReaderBackend<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => {
                    self.pos += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "字节源不支持 seek",
        ))
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

// ========================
// 流式比特读取
// ========================

/// 基于 [`IoContext`] 的比特游标
///
/// 最多预读 8 字节用于窥视, 字节对齐后的批量读取和跳过直接转发给 I/O 上下文.
/// 销毁时把未消费的整字节退回 I/O 上下文, 下一个读取者可以从同一位置继续.
pub struct IoBitReader<'io> {
    io: &'io mut IoContext,
    /// 已从 I/O 取出但尚未消费的位, 右对齐
    window: u128,
    /// `window` 中有效位数
    window_bits: u32,
    /// 已消费的总位数
    consumed_bits: u64,
}

impl<'io> IoBitReader<'io> {
    /// 在 I/O 上下文上创建比特游标
    pub fn new(io: &'io mut IoContext) -> Self {
        Self {
            io,
            window: 0,
            window_bits: 0,
            consumed_bits: 0,
        }
    }

    fn short_read(&self, needed_bits: u64, available_bits: u64) -> PsError {
        PsError::ShortRead {
            needed_bits,
            available_bits,
            bit_offset: self.consumed_bits,
        }
    }

    /// 保证窗口中至少有 `n` 位 (n <= 64)
    fn ensure(&mut self, n: u32) -> PsResult<()> {
        while self.window_bits < n {
            let byte = match self.io.read_u8() {
                Ok(b) => b,
                Err(PsError::ShortRead { .. }) => {
                    return Err(self.short_read(u64::from(n), u64::from(self.window_bits)));
                }
                Err(e) => return Err(e),
            };
            self.window = (self.window << 8) | u128::from(byte);
            self.window_bits += 8;
        }
        Ok(())
    }

    fn check_width(n: u32) -> PsResult<()> {
        if n > 64 {
            return Err(PsError::InvalidArgument(format!(
                "read_uint: n={} 超过 64 位",
                n,
            )));
        }
        Ok(())
    }

    fn window_value(&self, n: u32) -> u64 {
        if n == 0 {
            return 0;
        }
        let shift = self.window_bits - n;
        ((self.window >> shift) & ((1u128 << n) - 1)) as u64
    }

    fn consume_window(&mut self, n: u32) {
        self.window_bits -= n;
        self.window &= (1u128 << self.window_bits) - 1;
        self.consumed_bits += u64::from(n);
    }
}

impl BitCursor for IoBitReader<'_> {
    fn read_uint(&mut self, n: u32) -> PsResult<u64> {
        Self::check_width(n)?;
        self.ensure(n)?;
        let value = self.window_value(n);
        self.consume_window(n);
        Ok(value)
    }

    fn peek_uint(&mut self, n: u32) -> PsResult<u64> {
        Self::check_width(n)?;
        self.ensure(n)?;
        Ok(self.window_value(n))
    }

    fn skip_bits(&mut self, n: u64) -> PsResult<()> {
        let from_window = n.min(u64::from(self.window_bits)) as u32;
        self.consume_window(from_window);
        let mut left = n - u64::from(from_window);
        if left == 0 {
            return Ok(());
        }

        // 窗口已空, I/O 位置处于字节边界
        let whole_bytes = (left / 8) as usize;
        if whole_bytes > 0 {
            let before = self.io.consumed();
            if let Err(e) = self.io.skip(whole_bytes) {
                let skipped = self.io.consumed() - before;
                self.consumed_bits += skipped * 8;
                return Err(match e {
                    PsError::ShortRead { .. } => self.short_read(left, 0),
                    other => other,
                });
            }
            self.consumed_bits += whole_bytes as u64 * 8;
            left -= whole_bytes as u64 * 8;
        }
        if left > 0 {
            self.read_uint(left as u32)?;
        }
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> PsResult<()> {
        if !self.is_byte_aligned() {
            return Err(PsError::InvalidArgument("read_bytes 需要字节对齐".into()));
        }

        // 先取出窗口中的整字节
        let mut filled = 0;
        while self.window_bits >= 8 && filled < buf.len() {
            buf[filled] = self.window_value(8) as u8;
            self.consume_window(8);
            filled += 1;
        }
        if filled == buf.len() {
            return Ok(());
        }

        let rest = &mut buf[filled..];
        match self.io.read_exact(rest) {
            Ok(()) => {
                self.consumed_bits += rest.len() as u64 * 8;
                Ok(())
            }
            Err(PsError::ShortRead { available_bits, .. }) => {
                let needed = rest.len() as u64 * 8;
                let err = self.short_read(needed, available_bits);
                self.consumed_bits += available_bits;
                Err(err)
            }
            Err(e) => Err(e),
        }
    }

    fn bit_position(&self) -> u64 {
        self.consumed_bits
    }

    fn is_exhausted(&mut self) -> PsResult<bool> {
        Ok(self.window_bits == 0 && !self.io.has_more()?)
    }
}

impl Drop for IoBitReader<'_> {
    fn drop(&mut self) {
        let whole = self.window_bits / 8;
        if whole == 0 {
            return;
        }
        let mut pending = Vec::with_capacity(whole as usize);
        for i in (0..whole).rev() {
            pending.push((self.window >> (i * 8)) as u8);
        }
        self.io.unread(&pending);
    }
}
