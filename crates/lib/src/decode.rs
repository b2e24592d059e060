//! Transcoding of build-tool console output.
//!
//! The build tool writes in the console code page of its host. On Chinese
//! Windows locales that is GBK, which is not valid UTF-8. Output that already
//! decodes as UTF-8 is passed through; everything else is decoded as GBK.

use encoding_rs::GBK;
use tracing::debug;

/// Decode console bytes to text. Best effort: never fails, undecodable
/// sequences become U+FFFD.
pub fn decode_console_output(bytes: &[u8]) -> String {
  if let Ok(text) = std::str::from_utf8(bytes) {
    return text.to_string();
  }

  let (text, had_errors) = GBK.decode_without_bom_handling(bytes);
  if had_errors {
    debug!(len = bytes.len(), "console output contained undecodable sequences");
  }

  text.into_owned()
}
