/// Checksum da Internet (RFC 1071) sobre um buffer qualquer, inclusive vazio.
pub fn checksum(data: &[u8]) -> u16 {
    let mut words = data.chunks_exact(2);
    let mut sum: u32 = words
        .by_ref()
        .map(|w| u16::from_be_bytes([w[0], w[1]]) as u32)
        .fold(0, u32::wrapping_add);

    // Byte solto no fim: byte alto de uma palavra completada com zero.
    if let [last] = words.remainder() {
        sum = sum.wrapping_add((*last as u32) << 8);
    }

    while sum > 0xFFFF {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}
