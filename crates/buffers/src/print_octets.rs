//! Debug utility for printing octets as hex strings.

/// Formats at most `max` bytes of `octets` as space separated hex.
///
/// # Example
///
/// ```
/// use binfmt_buffers::print_octets;
///
/// assert_eq!(print_octets(&[0x01, 0x02, 0x0a, 0xff], 16), "01 02 0a ff");
/// assert_eq!(print_octets(&[1, 2, 3], 2), "01 02... (1 more)");
/// assert_eq!(print_octets(&[], 16), "");
/// ```
pub fn print_octets(octets: &[u8], max: usize) -> String {
    let shown: Vec<String> = octets.iter().take(max).map(|b| format!("{:02x}", b)).collect();
    let mut result = shown.join(" ");
    if octets.len() > max {
        result.push_str(&format!("... ({} more)", octets.len() - max));
    }
    result
}

/// Formats the bytes surrounding `offset` for diagnostics.
///
/// Shows up to eight bytes before and after the offset, the byte at the offset
/// wrapped in brackets.
pub fn print_window(octets: &[u8], offset: usize) -> String {
    let start = offset.saturating_sub(8);
    let end = offset.saturating_add(9).min(octets.len());
    let mut parts = Vec::new();
    for (i, byte) in octets.iter().enumerate().take(end).skip(start) {
        if i == offset {
            parts.push(format!("[{:02x}]", byte));
        } else {
            parts.push(format!("{:02x}", byte));
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_marks_offset() {
        let data: Vec<u8> = (0..20).collect();
        assert_eq!(
            print_window(&data, 10),
            "02 03 04 05 06 07 08 09 [0a] 0b 0c 0d 0e 0f 10 11 12"
        );
        assert_eq!(print_window(&data[..3], 0), "[00] 01 02");
    }
}
