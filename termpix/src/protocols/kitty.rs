// ABOUTME: Kitty terminal graphics protocol escape emission
// ABOUTME: Transmits PNG data as base64 in 4096-byte chunks per the Kitty spec

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

// PNG transmission format identifier in the Kitty protocol.
const FORMAT_PNG: u32 = 100;

const CHUNK_SIZE: usize = 4096;

/// Wrap PNG image data in Kitty graphics escape sequences.
///
/// The data is transmitted with `a=T` (transmit and display) in chunks;
/// every chunk except the last carries `m=1`.
pub fn encode(png_data: &[u8]) -> Result<String> {
    let base64_data = STANDARD.encode(png_data);

    let chunks: Result<Vec<&str>, _> = base64_data
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .map(std::str::from_utf8)
        .collect();
    let chunks = chunks.map_err(|e| anyhow!("Failed to convert base64 chunk to UTF-8: {}", e))?;

    let mut output = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let is_last = i == chunks.len() - 1;
        let m_value = if is_last { 0 } else { 1 };

        if i == 0 {
            // First chunk carries the format and transmission action
            output.push_str(&format!(
                "\x1b_Ga=T,f={},m={};{}\x1b\\",
                FORMAT_PNG, m_value, chunk
            ));
        } else {
            // Continuation chunks
            output.push_str(&format!("\x1b_Gm={};{}\x1b\\", m_value, chunk));
        }
    }

    Ok(output)
}
