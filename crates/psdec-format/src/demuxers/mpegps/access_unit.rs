//! 访问单元: 一次解析过程的结果.
//!
//! [`DecodedAccessUnit`] 绑定调用方提供的输出缓冲区, 解析过程只在其容量内追加载荷,
//! 元数据 ([`AccessUnitInfo`]) 仅在解析成功结束时整体提交.

use bytes::Bytes;
use psdec_core::{BitCursor, MpegTimestamp, PsError, PsResult, SystemClockReference};

use super::pack::PackHeader;
use super::pes::PesHeader;
use super::psm::ProgramStreamMap;
use super::system_header::SystemHeader;

/// 本次解析的结束原因
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Termination {
    /// 遇到节目结束码
    EndCode,
    /// 已有载荷后遇到下一个 pack 头 (未消耗)
    NextPack,
    /// 数据源在段边界处耗尽
    #[default]
    EndOfSource,
}

/// 访问单元元数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessUnitInfo {
    /// 最近一个 pack 头的 SCR
    pub scr: SystemClockReference,
    /// 最近一个 pack 头的复用码率
    pub program_mux_rate: u32,
    /// 本次解析中是否出现节目流映射
    pub keyframe: bool,
    pub pts: Option<MpegTimestamp>,
    /// 只在 `pts` 存在时出现
    pub dts: Option<MpegTimestamp>,
    /// 本次解析中节目流映射给出的视频 stream_type
    pub video_stream_type: Option<u8>,
    /// 本次解析中节目流映射给出的音频 stream_type
    pub audio_stream_type: Option<u8>,
    /// 合并的 pack 数
    pub pack_count: u32,
    /// 合并的视频 PES 包数
    pub pes_count: u32,
    pub termination: Termination,
}

impl AccessUnitInfo {
    pub(crate) fn merge_pack(&mut self, pack: &PackHeader) {
        self.scr = pack.scr;
        self.program_mux_rate = pack.program_mux_rate;
        self.pack_count += 1;
    }

    pub(crate) fn merge_map(&mut self, map: &ProgramStreamMap) {
        self.keyframe = true;
        if map.video_stream_type.is_some() {
            self.video_stream_type = map.video_stream_type;
        }
        if map.audio_stream_type.is_some() {
            self.audio_stream_type = map.audio_stream_type;
        }
    }

    pub(crate) fn merge_pes(&mut self, pes: &PesHeader) {
        if pes.pts.is_some() {
            self.pts = pes.pts;
            self.dts = pes.dts;
        }
        self.pes_count += 1;
    }
}

/// 有界输出缓冲区
///
/// 只追加, 超出容量时返回 [`PsError::BufferOverflow`] 而不写入任何字节.
pub struct PayloadSink<'buf> {
    buf: &'buf mut [u8],
    len: usize,
}

impl<'buf> PayloadSink<'buf> {
    pub fn new(buf: &'buf mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// 从游标读取 `count` 字节追加到缓冲区末尾
    pub fn append_from<C: BitCursor + ?Sized>(&mut self, cursor: &mut C, count: usize) -> PsResult<()> {
        let required = self.len + count;
        if required > self.buf.len() {
            return Err(PsError::BufferOverflow {
                capacity: self.buf.len(),
                required,
            });
        }
        cursor.read_bytes(&mut self.buf[self.len..required])?;
        self.len = required;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

/// 一次解析过程的结果, 绑定调用方的输出缓冲区
pub struct DecodedAccessUnit<'buf> {
    sink: PayloadSink<'buf>,
    info: AccessUnitInfo,
    system_header: Option<SystemHeader>,
    stream_map: Option<ProgramStreamMap>,
}

impl<'buf> DecodedAccessUnit<'buf> {
    /// 绑定输出缓冲区, 缓冲区长度即为容量
    pub fn new(output: &'buf mut [u8]) -> Self {
        Self {
            sink: PayloadSink::new(output),
            info: AccessUnitInfo::default(),
            system_header: None,
            stream_map: None,
        }
    }

    /// 清空载荷和元数据, 以便复用缓冲区
    pub fn reset(&mut self) {
        self.sink.clear();
        self.info = AccessUnitInfo::default();
        self.system_header = None;
        self.stream_map = None;
    }

    /// 元数据
    pub fn info(&self) -> &AccessUnitInfo {
        &self.info
    }

    /// 已写入的载荷
    pub fn payload(&self) -> &[u8] {
        self.sink.as_slice()
    }

    pub fn len(&self) -> usize {
        self.sink.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sink.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.sink.capacity()
    }

    pub fn is_keyframe(&self) -> bool {
        self.info.keyframe
    }

    pub fn pts(&self) -> Option<MpegTimestamp> {
        self.info.pts
    }

    pub fn dts(&self) -> Option<MpegTimestamp> {
        self.info.dts
    }

    /// 本次解析中最后一个系统头
    pub fn system_header(&self) -> Option<&SystemHeader> {
        self.system_header.as_ref()
    }

    /// 本次解析中最后一个节目流映射
    pub fn stream_map(&self) -> Option<&ProgramStreamMap> {
        self.stream_map.as_ref()
    }

    pub(crate) fn sink_mut(&mut self) -> &mut PayloadSink<'buf> {
        &mut self.sink
    }

    /// 解析成功后一次性提交元数据与段结构
    pub(crate) fn commit(
        &mut self,
        info: AccessUnitInfo,
        system_header: Option<SystemHeader>,
        stream_map: Option<ProgramStreamMap>,
    ) {
        self.info = info;
        self.system_header = system_header;
        self.stream_map = stream_map;
    }
}

/// 解复用器输出的独立访问单元
#[derive(Debug, Clone)]
pub struct AccessUnit {
    pub info: AccessUnitInfo,
    pub data: Bytes,
}

impl AccessUnit {
    pub fn is_keyframe(&self) -> bool {
        self.info.keyframe
    }

    pub fn pts(&self) -> Option<MpegTimestamp> {
        self.info.pts
    }
}
