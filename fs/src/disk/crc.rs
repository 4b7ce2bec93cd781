//! CRC-16/CCITT-FALSE checksums for on-flash records.

/// CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// CRC16 lookup table
fn crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];

    for i in 0..256 {
        let mut crc = (i as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
        table[i] = crc;
    }

    table
}

/// Compute the CRC16 of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    crc16_update(0xFFFF, data)
}

/// Update a running CRC16 with more data.
pub fn crc16_update(crc: u16, data: &[u8]) -> u16 {
    let table = crc16_table();
    let mut crc = crc;

    for &byte in data {
        let idx = (((crc >> 8) ^ byte as u16) & 0xFF) as usize;
        crc = (crc << 8) ^ table[idx];
    }

    crc
}
