//! 单元测试用的节目流样本构造函数.

use psdec_core::BitWriter;

/// 写入 5 字节时间戳字段
pub(crate) fn write_timestamp(bw: &mut BitWriter, tag: u32, value: u64) {
    bw.write_bits(tag, 4);
    bw.write_bits((value >> 30) as u32 & 0x07, 3);
    bw.write_bit(1);
    bw.write_bits((value >> 15) as u32 & 0x7FFF, 15);
    bw.write_bit(1);
    bw.write_bits(value as u32 & 0x7FFF, 15);
    bw.write_bit(1);
}

/// pack 头 (含起始码)
pub(crate) fn pack_header(scr_base: u64, scr_ext: u16, mux_rate: u32, stuffing: u8) -> Vec<u8> {
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
    bw.write_bit(1);
    bw.write_bit(1);
    bw.write_bits(0x1F, 5);
    bw.write_bits(u32::from(stuffing), 3);
    for _ in 0..stuffing {
        bw.write_bits(0xFF, 8);
    }
    bw.finish()
}

/// 系统头 (含起始码), 条目为 (stream_id, scale, size_bound)
pub(crate) fn system_header(entries: &[(u8, bool, u16)]) -> Vec<u8> {
    let mut bw = BitWriter::new();
    bw.write_bits(0x0000_01BB, 32);
    bw.write_bits(6 + 3 * entries.len() as u32, 16);
    bw.write_bit(1);
    bw.write_bits(5000, 22);
    bw.write_bit(1);
    bw.write_bits(1, 6);
    bw.write_bits(0, 4);
    bw.write_bit(1);
    bw.write_bits(1, 5);
    bw.write_bit(0);
    bw.write_bits(0x7F, 7);
    for &(stream_id, scale, size) in entries {
        bw.write_bits(u32::from(stream_id), 8);
        bw.write_bits(0b11, 2);
        bw.write_bit(u32::from(scale));
        bw.write_bits(u32::from(size), 13);
    }
    bw.finish()
}

/// 节目流映射 (含起始码), 条目为 (stream_type, stream_id, 描述符长度)
pub(crate) fn program_stream_map(entries: &[(u8, u8, u16)]) -> Vec<u8> {
    program_stream_map_with_adjust(entries, 0)
}

/// 节目流映射, `adjust` 叠加到声明的 map 长度上 (用于构造长度错误的样本)
pub(crate) fn program_stream_map_with_adjust(entries: &[(u8, u8, u16)], adjust: i32) -> Vec<u8> {
    let info: &[u8] = &[0x0A, 0x04, 0x65, 0x6E, 0x67, 0x00];
    let es_map_len: usize = entries.iter().map(|&(_, _, d)| 4 + usize::from(d)).sum();
    let map_len = 2 + 2 + info.len() + 2 + es_map_len + 4;

    let mut bw = BitWriter::new();
    bw.write_bits(0x0000_01BC, 32);
    bw.write_bits((map_len as i32 + adjust) as u32, 16);
    bw.write_bit(1);
    bw.write_bits(0b11, 2);
    bw.write_bits(3, 5);
    bw.write_bits(0x7F, 7);
    bw.write_bit(1);
    bw.write_bits(info.len() as u32, 16);
    bw.write_bytes(info);
    bw.write_bits(es_map_len as u32, 16);
    for &(stream_type, stream_id, descriptor_len) in entries {
        bw.write_bits(u32::from(stream_type), 8);
        bw.write_bits(u32::from(stream_id), 8);
        bw.write_bits(u32::from(descriptor_len), 16);
        for _ in 0..descriptor_len {
            bw.write_bits(0xFF, 8);
        }
    }
    bw.write_bits(0xDEAD_BEEF, 32);
    bw.finish()
}

/// PES 包 (含起始码)
pub(crate) fn pes_packet(stream_id: u8, pts: Option<u64>, dts: Option<u64>, payload: &[u8]) -> Vec<u8> {
    let (flag, hdl) = match (pts, dts) {
        (Some(_), Some(_)) => (0b11, 10),
        (Some(_), None) => (0b10, 5),
        _ => (0b00, 0),
    };
    let packet_len = 3 + hdl + payload.len();

    let mut bw = BitWriter::new();
    bw.write_bits(0x0000_0100 | u32::from(stream_id), 32);
    bw.write_bits(packet_len as u32, 16);
    bw.write_bits(0x80, 8);
    bw.write_bits(flag, 2);
    bw.write_bits(0, 6);
    bw.write_bits(hdl as u32, 8);
    match (pts, dts) {
        (Some(p), Some(d)) => {
            write_timestamp(&mut bw, 0b0011, p);
            write_timestamp(&mut bw, 0b0001, d);
        }
        (Some(p), None) => write_timestamp(&mut bw, 0b0010, p),
        _ => {}
    }
    bw.write_bytes(payload);
    bw.finish()
}

/// 按 16 位长度前缀封装的段 (音频、填充等)
pub(crate) fn length_prefixed(code: u32, body: &[u8]) -> Vec<u8> {
    let mut out = code.to_be_bytes().to_vec();
    out.extend_from_slice(&(body.len() as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// 节目结束码
pub(crate) fn end_code() -> Vec<u8> {
    vec![0x00, 0x00, 0x01, 0xB9]
}
