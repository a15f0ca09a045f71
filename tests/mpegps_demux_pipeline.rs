//! MPEG-PS 解析与解复用集成测试

use std::io::Write;

use psdec::core::{BitReader, BitWriter, PsError};
use psdec::format::demuxers::mpegps::Termination;
use psdec::format::io::{IoBitReader, IoContext, MemoryBackend};
use psdec::format::probe::{FormatProbe, SCORE_MAX};
use psdec::format::{
    DecodedAccessUnit, DemuxConfig, EndCodePolicy, PsDecoder, PsDemuxer, PsProbe, ResyncPolicy,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================
// 辅助函数: 构建 PS 段
// ============================================================

/// 构造 pack 头
fn build_pack(scr_base: u64, scr_ext: u16, mux_rate: u32) -> Vec<u8> {
    let mut bw = BitWriter::new();
    bw.write_bits(0x0000_01BA, 32);
    bw.write_bits(0b01, 2);
    bw.write_bits((scr_base >> 30) as u32 & 0x07, 3);
    bw.write_bit(1);
    bw.write_bits((scr_base >> 15) as u32 & 0x7FFF, 15);
    bw.write_bit(1);
    bw.write_bits(scr_base as u32 & 0x7FFF, 15);
    bw.write_bit(1);
    bw.write_bits(u32::from(scr_ext), 9);
    bw.write_bit(1);
    bw.write_bits(mux_rate, 22);
    bw.write_bits(0b11, 2);
    bw.write_bits(0x1F, 5);
    bw.write_bits(0, 3);
    bw.finish()
}

/// 构造 ISO 风格的系统头 (条目 stream_id >= 0x80)
fn build_system_header(stream_ids: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x01, 0xBB];
    let len = 6 + 3 * stream_ids.len();
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(&[0x80, 0x27, 0x11, 0x04, 0xE1, 0xFF]);
    for &id in stream_ids {
        out.extend_from_slice(&[id, 0xE0, 0xE8]);
    }
    out
}

/// 构造节目流映射, 条目为 (stream_type, stream_id)
fn build_psm(entries: &[(u8, u8)]) -> Vec<u8> {
    let es_map_len = 4 * entries.len();
    let map_len = 2 + 2 + 2 + es_map_len + 4;
    let mut out = vec![0x00, 0x00, 0x01, 0xBC];
    out.extend_from_slice(&(map_len as u16).to_be_bytes());
    out.extend_from_slice(&[0xE0, 0xFF]);
    out.extend_from_slice(&[0x00, 0x00]);
    out.extend_from_slice(&(es_map_len as u16).to_be_bytes());
    for &(stream_type, stream_id) in entries {
        out.extend_from_slice(&[stream_type, stream_id, 0x00, 0x00]);
    }
    out.extend_from_slice(&[0x12, 0x34, 0x56, 0x78]);
    out
}

/// 编码 33 位时间戳到 5 字节
fn encode_timestamp(tag: u8, ts: u64) -> [u8; 5] {
    [
        (tag << 4) | ((((ts >> 30) as u8) & 0x07) << 1) | 0x01,
        (ts >> 22) as u8,
        ((((ts >> 15) as u8) & 0x7F) << 1) | 0x01,
        (ts >> 7) as u8,
        (((ts as u8) & 0x7F) << 1) | 0x01,
    ]
}

/// 构造 PES 包
fn build_pes(stream_id: u8, pts: Option<u64>, dts: Option<u64>, data: &[u8]) -> Vec<u8> {
    let mut header = Vec::new();
    let flags = match (pts, dts) {
        (Some(p), Some(d)) => {
            header.extend_from_slice(&encode_timestamp(0b0011, p));
            header.extend_from_slice(&encode_timestamp(0b0001, d));
            0xC0
        }
        (Some(p), None) => {
            header.extend_from_slice(&encode_timestamp(0b0010, p));
            0x80
        }
        _ => 0x00,
    };

    let mut pes = vec![0x00, 0x00, 0x01, stream_id];
    let pes_len = 3 + header.len() + data.len();
    pes.extend_from_slice(&(pes_len as u16).to_be_bytes());
    pes.push(0x80);
    pes.push(flags);
    pes.push(header.len() as u8);
    pes.extend_from_slice(&header);
    pes.extend_from_slice(data);
    pes
}

fn end_code() -> Vec<u8> {
    vec![0x00, 0x00, 0x01, 0xB9]
}

/// 三帧码流: 关键帧 (PSM) + 两个普通帧, 夹杂音频 PES
fn build_three_frames() -> Vec<u8> {
    [
        build_pack(3600, 0, 6106),
        build_system_header(&[0xE0, 0xC0]),
        build_psm(&[(0x1B, 0xE0), (0x90, 0xC0)]),
        build_pes(0xE0, Some(3600), Some(0), &[0x11; 1200]),
        build_pes(0xE0, None, None, &[0x11; 800]),
        build_pes(0xC0, Some(3600), None, &[0x7F; 160]),
        build_pack(7200, 0, 6106),
        build_pes(0xE0, Some(7200), Some(3600), &[0x22; 300]),
        build_pes(0xC0, Some(7200), None, &[0x7F; 160]),
        build_pack(10_800, 0, 6106),
        build_pes(0xE0, Some(10_800), Some(7200), &[0x33; 200]),
        end_code(),
    ]
    .concat()
}

fn memory_io(data: Vec<u8>) -> IoContext {
    IoContext::new(Box::new(MemoryBackend::from_data(data)))
}

// ============================================================
// 单次解析
// ============================================================

#[test]
fn test_关键帧端到端() {
    init_logger();
    let data = [
        build_pack(1000, 5, 5000),
        build_psm(&[(0x1B, 0xE0)]),
        build_pes(0xE0, Some(9000), None, &[0xAB; 16]),
    ]
    .concat();

    let mut buf = [0u8; 256];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let payload = PsDecoder::default()
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap();
    assert_eq!(payload, &[0xAB; 16]);

    let info = unit.info();
    assert!(info.keyframe);
    assert_eq!(info.scr.base, 1000);
    assert_eq!(info.scr.extension, 5);
    assert_eq!(info.scr.to_27mhz(), 300_005);
    assert_eq!(info.program_mux_rate, 5000);
    assert_eq!(info.pts.map(|t| t.ticks()), Some(9000));
    assert!(info.dts.is_none());
    assert_eq!(info.video_stream_type, Some(0x1B));
    assert_eq!(info.audio_stream_type, None);
}

#[test]
fn test_payload_截断返回_short_read() {
    init_logger();
    let data = [
        build_pack(1000, 5, 5000),
        build_psm(&[(0x1B, 0xE0)]),
        build_pes(0xE0, Some(9000), None, &[0xAB; 16]),
    ]
    .concat();
    let truncated = &data[..data.len() - 6];

    let mut buf = [0u8; 256];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let err = PsDecoder::default()
        .decode(&mut BitReader::new(truncated), &mut unit)
        .unwrap_err();
    assert!(err.is_short_read(), "期望 ShortRead, 实际 {err}");

    let mut io = memory_io(truncated.to_vec());
    let err = PsDemuxer::default().read_access_unit(&mut io).unwrap_err();
    assert!(err.is_short_read(), "期望 ShortRead, 实际 {err}");
}

#[test]
fn test_输出缓冲区不足() {
    let data = [
        build_pack(0, 0, 1),
        build_pes(0xE0, None, None, &[0x01; 100]),
        build_pes(0xE0, None, None, &[0x02; 100]),
    ]
    .concat();

    let mut buf = [0u8; 150];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let err = PsDecoder::default()
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap_err();
    assert!(matches!(
        err,
        PsError::BufferOverflow {
            capacity: 150,
            required: 200,
        }
    ));
    // 第一个 PES 的载荷已写入, 不回滚
    assert_eq!(unit.len(), 100);
    assert!(buf[100..].iter().all(|&b| b == 0));
}

#[test]
fn test_音频_pes_不进入输出() {
    let data = build_three_frames();
    let mut buf = vec![0u8; 4096];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let payload = PsDecoder::default()
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap();
    assert_eq!(payload.len(), 2000);
    assert!(payload.iter().all(|&b| b == 0x11));
    assert_eq!(unit.info().audio_stream_type, Some(0x90));
    assert_eq!(unit.info().termination, Termination::NextPack);
    // ISO 条目首位为 1, 立即停止并按长度跳过
    assert_eq!(unit.system_header().map(|h| h.stream_bounds.len()), Some(0));
}

#[test]
fn test_重新同步与失败策略() {
    init_logger();
    let data = [
        build_pack(0, 0, 1),
        vec![0x47, 0x1F, 0xFF, 0x10, 0x00, 0x00],
        build_pes(0xE0, Some(90), None, &[0x42; 8]),
    ]
    .concat();

    let mut buf = [0u8; 64];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let payload = PsDecoder::default()
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap();
    assert_eq!(payload, &[0x42; 8]);

    let strict = PsDecoder::new(DemuxConfig {
        resync: ResyncPolicy::Fail,
        ..Default::default()
    });
    let err = strict
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap_err();
    assert!(matches!(
        err,
        PsError::StartCodeNotFound {
            expected: None,
            found: 0x471F_FF10,
            ..
        }
    ));
}

#[test]
fn test_continue_策略合并整个码流() {
    let data = build_three_frames();
    let config = DemuxConfig {
        end_code: EndCodePolicy::Continue,
        ..Default::default()
    };
    let mut buf = vec![0u8; 4096];
    let mut unit = DecodedAccessUnit::new(&mut buf);
    let payload = PsDecoder::new(config)
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap();
    assert_eq!(payload.len(), 2500);
    let info = unit.info();
    assert_eq!(info.pack_count, 3);
    assert_eq!(info.pts.map(|t| t.ticks()), Some(10_800));
    assert_eq!(info.dts.map(|t| t.ticks()), Some(7200));
    assert_eq!(info.scr.base, 10_800);
    assert!(info.keyframe);
}

#[test]
fn test_厂商填充段() {
    let data = [
        vec![0x00, 0x00, 0x01, 0xBD, 0x00, 0x02, 0xAA, 0xAA],
        build_pack(1, 0, 1),
        build_pes(0xE0, None, None, &[0x01; 4]),
    ]
    .concat();
    let mut buf = [0u8; 16];
    let mut unit = DecodedAccessUnit::new(&mut buf);

    let err = PsDecoder::default()
        .decode(&mut BitReader::new(&data), &mut unit)
        .unwrap_err();
    assert!(matches!(err, PsError::StartCodeNotFound { found: 0x0000_01BD, .. }));

    let decoder = PsDecoder::new(DemuxConfig {
        vendor_padding_code: Some(0x0000_01BD),
        ..Default::default()
    });
    let payload = decoder.decode(&mut BitReader::new(&data), &mut unit).unwrap();
    assert_eq!(payload, &[0x01; 4]);
}

// ============================================================
// 流式解复用
// ============================================================

#[test]
fn test_解复用逐帧输出() {
    init_logger();
    let mut io = memory_io(build_three_frames());
    let mut demuxer = PsDemuxer::default();

    let mut units = Vec::new();
    loop {
        match demuxer.read_access_unit(&mut io) {
            Ok(unit) => units.push(unit),
            Err(PsError::Eof) => break,
            Err(e) => panic!("解复用失败: {e}"),
        }
    }

    assert_eq!(units.len(), 3);
    assert!(units[0].is_keyframe());
    assert!(!units[1].is_keyframe());
    assert!(!units[2].is_keyframe());
    assert_eq!(units[0].data.len(), 2000);
    assert_eq!(units[1].data.len(), 300);
    assert_eq!(units[2].data.len(), 200);

    let pts: Vec<u64> = units
        .iter()
        .filter_map(|u| u.pts().map(|t| t.ticks()))
        .collect();
    assert_eq!(pts, vec![3600, 7200, 10_800]);
    assert_eq!(units[2].info.termination, Termination::EndCode);
    assert_eq!(demuxer.streams().len(), 2);
    assert_eq!(demuxer.unit_count(), 3);
}

#[test]
fn test_切片与流式游标结果一致() {
    let data = build_three_frames();
    let decoder = PsDecoder::default();

    let mut slice_results = Vec::new();
    let mut br = BitReader::new(&data);
    let mut buf = vec![0u8; 4096];
    while !br.is_eof() {
        let mut unit = DecodedAccessUnit::new(&mut buf);
        let payload = decoder.decode(&mut br, &mut unit).unwrap().to_vec();
        slice_results.push((payload, *unit.info()));
    }

    let mut stream_results = Vec::new();
    let mut io = memory_io(data);
    while io.has_more().unwrap() {
        let mut cursor = IoBitReader::new(&mut io);
        let mut unit = DecodedAccessUnit::new(&mut buf);
        let payload = decoder.decode(&mut cursor, &mut unit).unwrap().to_vec();
        stream_results.push((payload, *unit.info()));
    }

    assert_eq!(slice_results.len(), 3);
    assert_eq!(slice_results, stream_results);
}

#[test]
fn test_文件数据源() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&build_three_frames()).unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    let mut io = IoContext::open_read(path).unwrap();
    let mut demuxer = PsDemuxer::default();
    let mut total = 0;
    while let Ok(unit) = demuxer.read_access_unit(&mut io) {
        total += unit.data.len();
    }
    assert_eq!(total, 2500);
    assert_eq!(demuxer.unit_count(), 3);
}

#[test]
fn test_不可_seek_的字节源() {
    let data = build_three_frames();
    let mut io = IoContext::from_reader(std::io::Cursor::new(data));
    let mut demuxer = PsDemuxer::default();
    let first = demuxer.read_access_unit(&mut io).unwrap();
    assert_eq!(first.data.len(), 2000);
    let second = demuxer.read_access_unit(&mut io).unwrap();
    assert_eq!(second.pts().map(|t| t.ticks()), Some(7200));
}

// ============================================================
// 探测与配置
// ============================================================

#[test]
fn test_探测() {
    let data = build_three_frames();
    assert_eq!(PsProbe.probe(&data, None), Some(SCORE_MAX));
    let shifted = [vec![0xFF; 10], data.clone()].concat();
    assert_eq!(PsProbe.probe(&shifted, None), Some(SCORE_MAX - 25));
    assert_eq!(PsProbe.probe(&[0x47; 64], Some("a.ts")), None);
}

#[test]
fn test_配置序列化往返() {
    let config = DemuxConfig {
        end_code: EndCodePolicy::Continue,
        resync: ResyncPolicy::Fail,
        max_resync_bytes: 1024,
        vendor_padding_code: Some(0x0000_01BD),
        unit_capacity: 512 * 1024,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: DemuxConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let partial: DemuxConfig = serde_json::from_str(r#"{"max_resync_bytes": 8}"#).unwrap();
    assert_eq!(partial.max_resync_bytes, 8);
    assert_eq!(partial.end_code, EndCodePolicy::Terminate);
    assert_eq!(partial.unit_capacity, 2 * 1024 * 1024);
}

#[test]
fn test_版本号() {
    assert!(!psdec::version().is_empty());
}
