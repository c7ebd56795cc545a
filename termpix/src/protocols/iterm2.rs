// ABOUTME: iTerm2 inline image protocol escape emission
// ABOUTME: Wraps image data in the OSC 1337 File sequence with base64 payload

use base64::{engine::general_purpose::STANDARD, Engine};

/// Wrap image data in an iTerm2 inline image escape sequence.
///
/// `name` labels the transfer in the terminal; it is base64-encoded per
/// the protocol. A trailing newline keeps the cursor below the image.
pub fn encode(data: &[u8], name: &str) -> String {
    let base64_data = STANDARD.encode(data);
    let name_b64 = STANDARD.encode(name.as_bytes());

    // \x1b]1337;File=name=<name>;size=<bytes>;inline=1:<data>\x07
    format!(
        "\x1b]1337;File=name={};size={};inline=1:{}\x07\n",
        name_b64,
        data.len(),
        base64_data
    )
}
