#![no_main]

//! Every concrete transform must satisfy the roundtrip property: if
//! `forward` succeeds, `inverse` reconstructs the original bytes
//! exactly, and never reads or writes past either span.

use bxform_codecs::{LzWindow, LzpCodec, LzxCodec, Rlt, Sbrt, SbrtMode, Srt, X86Codec, Zrlt};
use bxform_core::{Context, NullTransform, Span, Transform};
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Debug, arbitrary::Arbitrary)]
enum Pick {
    Null,
    Rlt,
    Zrlt,
    Srt,
    Mtf,
    Rank,
    Timestamp,
    X86,
    LzStandard,
    LzExtra,
    Lzp,
}

fn roundtrip(mut transform: impl Transform, data: &[u8]) {
    let ctx = Context::new();
    let mut src = data.to_vec();
    let mut mid = vec![0u8; transform.max_encoded_length(data.len())];
    let mut input = Span::new(&mut src);
    let mut output = Span::new(&mut mid);

    let applied = match transform.forward(&mut input, &mut output, &ctx) {
        Ok(applied) => applied,
        Err(_) => return,
    };
    if !applied {
        return;
    }
    let encoded_len = output.cursor();
    assert!(encoded_len <= transform.max_encoded_length(data.len()));
    assert_eq!(input.cursor(), data.len());

    let mut mid2 = mid[..encoded_len].to_vec();
    let mut out = vec![0u8; data.len()];
    let mut input2 = Span::new(&mut mid2);
    let mut output2 = Span::new(&mut out);
    transform.inverse(&mut input2, &mut output2, &ctx).expect("inverse of our own forward output must succeed");
    assert_eq!(out, data);
}

fuzz_target!(|input: (Pick, Vec<u8>)| {
    let (pick, data) = input;
    match pick {
        Pick::Null => roundtrip(NullTransform, &data),
        Pick::Rlt => roundtrip(Rlt, &data),
        Pick::Zrlt => roundtrip(Zrlt, &data),
        Pick::Srt => roundtrip(Srt, &data),
        Pick::Mtf => roundtrip(Sbrt::new(SbrtMode::Mtf), &data),
        Pick::Rank => roundtrip(Sbrt::new(SbrtMode::Rank), &data),
        Pick::Timestamp => roundtrip(Sbrt::new(SbrtMode::Timestamp), &data),
        Pick::X86 => roundtrip(X86Codec, &data),
        Pick::LzStandard => roundtrip(LzxCodec::new(LzWindow::Standard), &data),
        Pick::LzExtra => roundtrip(LzxCodec::new(LzWindow::Extra), &data),
        Pick::Lzp => roundtrip(LzpCodec::new(), &data),
    }
});
