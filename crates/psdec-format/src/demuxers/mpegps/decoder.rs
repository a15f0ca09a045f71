//! 单次解析过程: pack 头 + 起始码分发循环.

use log::{debug, warn};
use psdec_core::{BitCursor, PsError, PsResult};

use super::access_unit::{AccessUnitInfo, DecodedAccessUnit, Termination};
use super::pack::{parse_pack_header, read_pack};
use super::pes::parse_pes_packet;
use super::psm::parse_program_stream_map;
use super::system_header::parse_system_header;
use super::StartCode;
use crate::config::{DemuxConfig, EndCodePolicy, ResyncPolicy};

/// 节目流访问单元解析器
///
/// 每次 [`decode`](Self::decode) 从 pack 头开始, 分发后续的段,
/// 直到结束条件成立, 把视频载荷写入调用方的缓冲区.
#[derive(Debug, Clone, Default)]
pub struct PsDecoder {
    config: DemuxConfig,
}

impl PsDecoder {
    pub fn new(config: DemuxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    /// 解析一个访问单元
    ///
    /// 成功时返回写入的载荷, 元数据通过 [`DecodedAccessUnit::info`] 获取.
    /// 任一段解析失败都会立即中止本次解析; 已写入的载荷不回滚,
    /// 元数据、系统头与节目流映射都不提交.
    pub fn decode<'u, C: BitCursor + ?Sized>(
        &self,
        cursor: &mut C,
        unit: &'u mut DecodedAccessUnit<'_>,
    ) -> PsResult<&'u [u8]> {
        unit.reset();
        let mut info = AccessUnitInfo::default();
        let mut system_header = None;
        let mut stream_map = None;

        let pack = read_pack(cursor, self.config.vendor_padding_code)?;
        info.merge_pack(&pack);

        info.termination = loop {
            if cursor.is_exhausted()? {
                break Termination::EndOfSource;
            }

            let code = cursor.peek_uint(32)? as u32;
            match StartCode::classify(code) {
                StartCode::Pack => {
                    if self.config.end_code == EndCodePolicy::Terminate && info.pes_count > 0 {
                        break Termination::NextPack;
                    }
                    cursor.skip_bits(32)?;
                    let pack = parse_pack_header(cursor)?;
                    info.merge_pack(&pack);
                }
                StartCode::SystemHeader => {
                    cursor.skip_bits(32)?;
                    system_header = Some(parse_system_header(cursor)?);
                }
                StartCode::StreamMap => {
                    cursor.skip_bits(32)?;
                    let map = parse_program_stream_map(cursor)?;
                    info.merge_map(&map);
                    stream_map = Some(map);
                }
                StartCode::ProgramEnd => {
                    cursor.skip_bits(32)?;
                    if self.config.end_code == EndCodePolicy::Terminate {
                        break Termination::EndCode;
                    }
                    debug!("PS: 吸收节目结束码");
                }
                StartCode::Video(stream_id) => {
                    cursor.skip_bits(32)?;
                    let pes = parse_pes_packet(cursor, stream_id, unit.sink_mut())?;
                    info.merge_pes(&pes);
                }
                StartCode::LengthPrefixed(stream_id) => {
                    cursor.skip_bits(32)?;
                    let len = cursor.read_uint(16)? as usize;
                    cursor.skip_bytes(len)?;
                    debug!("PS: 跳过 stream_id=0x{:02X}, {} 字节", stream_id, len);
                }
                StartCode::Unknown => self.resync(cursor, code)?,
            }
        };

        unit.commit(info, system_header, stream_map);
        Ok(unit.payload())
    }

    /// 逐字节丢弃, 直到下一个可识别的起始码或数据源耗尽
    fn resync<C: BitCursor + ?Sized>(&self, cursor: &mut C, found: u32) -> PsResult<()> {
        let bit_offset = cursor.bit_position();
        if self.config.resync == ResyncPolicy::Fail {
            return Err(PsError::StartCodeNotFound {
                expected: None,
                found,
                bit_offset,
            });
        }

        let mut discarded = 0usize;
        loop {
            if discarded >= self.config.max_resync_bytes {
                return Err(PsError::StartCodeNotFound {
                    expected: None,
                    found,
                    bit_offset,
                });
            }
            cursor.skip_bits(8)?;
            discarded += 1;

            if cursor.is_exhausted()? {
                break;
            }
            match cursor.peek_uint(32) {
                Ok(code) if StartCode::classify(code as u32) != StartCode::Unknown => break,
                Ok(_) | Err(PsError::ShortRead { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        warn!(
            "PS: 无法识别的起始码 0x{:08X} (比特偏移 {}), 丢弃 {} 字节后重新同步",
            found, bit_offset, discarded,
        );
        Ok(())
    }
}
