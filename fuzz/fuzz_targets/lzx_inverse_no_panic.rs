#![no_main]

//! `LzxCodec::inverse` must never panic on untrusted bytes: malformed
//! match descriptors, truncated extended lengths, or distances past
//! the bytes already produced must all surface as
//! `BxformError::CorruptInput`, never an out-of-bounds access.

use bxform_codecs::{LzWindow, LzxCodec};
use bxform_core::{Context, Span, Transform};
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    extra_window: bool,
    original_len: u16,
    bytes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let window = if input.extra_window { LzWindow::Extra } else { LzWindow::Standard };
    let mut codec = LzxCodec::new(window);
    let ctx = Context::new();

    let original_len = input.original_len as usize;
    let mut encoded = input.bytes.clone();
    let mut decoded = vec![0u8; original_len];
    let mut in_span = Span::new(&mut encoded);
    let mut out_span = Span::new(&mut decoded);
    let _ = codec.inverse(&mut in_span, &mut out_span, &ctx);
});
