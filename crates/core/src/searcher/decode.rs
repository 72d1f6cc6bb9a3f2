//! Text decoding for tracker pages that don't declare a usable charset.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// One step of a [`DecodeChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAttempt {
    /// Strict UTF-8.
    Utf8,
    /// A tracker's legacy single- or multi-byte encoding, strict.
    Legacy(&'static Encoding),
    /// ISO-8859-1; maps every byte, so it never fails.
    Latin1,
}

impl DecodeAttempt {
    pub fn label(&self) -> &'static str {
        match self {
            DecodeAttempt::Utf8 => "utf-8",
            DecodeAttempt::Legacy(encoding) => encoding.name(),
            DecodeAttempt::Latin1 => "iso-8859-1",
        }
    }
}

/// Strict UTF-8, then a strict legacy encoding, then Latin-1.
#[derive(Debug, Clone, Copy)]
pub struct DecodeChain {
    legacy: &'static Encoding,
}

impl DecodeChain {
    pub fn for_legacy(legacy: &'static Encoding) -> Self {
        Self { legacy }
    }

    /// Decode `bytes` with the first attempt that accepts them.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> (Cow<'a, str>, DecodeAttempt) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (Cow::Borrowed(text), DecodeAttempt::Utf8);
        }
        if let Some(text) = self
            .legacy
            .decode_without_bom_handling_and_without_replacement(bytes)
        {
            return (text, DecodeAttempt::Legacy(self.legacy));
        }
        (encoding_rs::mem::decode_latin1(bytes), DecodeAttempt::Latin1)
    }
}
