//! 基于 [`IoContext`] 的连续访问单元读取.

use bytes::Bytes;
use log::{debug, info, warn};
use psdec_core::{BitCursor, PsError, PsResult};

use super::access_unit::{AccessUnit, DecodedAccessUnit};
use super::decoder::PsDecoder;
use super::psm::EsMapEntry;
use crate::config::DemuxConfig;
use crate::io::{IoBitReader, IoContext};

/// 节目流解复用器
///
/// 反复调用 [`read_access_unit`](Self::read_access_unit) 依次取出访问单元,
/// 数据源在访问单元边界耗尽时返回 [`PsError::Eof`].
/// 末尾不足一个起始码的残余字节被丢弃, 同样返回 [`PsError::Eof`].
pub struct PsDemuxer {
    decoder: PsDecoder,
    /// 复用的输出缓冲区
    buffer: Vec<u8>,
    /// 最近一次节目流映射中的条目
    streams: Vec<EsMapEntry>,
    /// 已输出的访问单元数
    unit_count: u64,
}

impl PsDemuxer {
    pub fn new(config: DemuxConfig) -> Self {
        let buffer = vec![0u8; config.unit_capacity];
        Self {
            decoder: PsDecoder::new(config),
            buffer,
            streams: Vec::new(),
            unit_count: 0,
        }
    }

    /// 读取下一个访问单元
    pub fn read_access_unit(&mut self, io: &mut IoContext) -> PsResult<AccessUnit> {
        if !io.has_more()? {
            debug!("PS: 数据源结束, 共 {} 个访问单元", self.unit_count);
            return Err(PsError::Eof);
        }

        let mut cursor = IoBitReader::new(io);
        let mut unit = DecodedAccessUnit::new(&mut self.buffer);
        let data = match self.decoder.decode(&mut cursor, &mut unit) {
            Ok(payload) => Bytes::copy_from_slice(payload),
            // 首个起始码都读不全: 剩余不足 4 字节, 按数据源结束处理
            Err(PsError::ShortRead { available_bits, .. }) if cursor.bit_position() == 0 => {
                drop(cursor);
                io.skip((available_bits / 8) as usize)?;
                warn!(
                    "PS: 丢弃末尾 {} 字节残余数据, 共 {} 个访问单元",
                    available_bits / 8,
                    self.unit_count,
                );
                return Err(PsError::Eof);
            }
            Err(e) => return Err(e),
        };

        if let Some(map) = unit.stream_map() {
            if self.streams != map.entries {
                info!("PS: 节目流映射更新, {} 个基本流", map.entries.len());
                self.streams = map.entries.clone();
            }
        }
        self.unit_count += 1;

        Ok(AccessUnit {
            info: *unit.info(),
            data,
        })
    }

    /// 最近一次节目流映射中的基本流
    pub fn streams(&self) -> &[EsMapEntry] {
        &self.streams
    }

    pub fn unit_count(&self) -> u64 {
        self.unit_count
    }

    pub fn config(&self) -> &DemuxConfig {
        self.decoder.config()
    }
}

impl Default for PsDemuxer {
    fn default() -> Self {
        Self::new(DemuxConfig::default())
    }
}
