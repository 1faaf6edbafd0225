//! CRC-8 over record bodies.
//!
//! Polynomial `0x1D`, initial value 0, bits processed MSB-first, no input
//! or output reflection, no final XOR. The lookup table is built at
//! compile time.

const POLYNOMIAL: u8 = 0x1d;

static TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Computes the checksum of `bytes`.
pub fn crc8(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |crc, &b| TABLE[usize::from(crc ^ b)])
}
