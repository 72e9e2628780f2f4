#![no_main]

//! Builds a pipeline from an arbitrary, but always-valid, spec string
//! drawn from the transform name vocabulary, then checks the same
//! roundtrip property as a single transform: whatever `forward` emits,
//! `inverse` (fed the recorded skip-flags byte) reconstructs exactly.

use bxform_core::{Context, Span};
use bxform_sequence::TransformFactory;
use libfuzzer_sys::{arbitrary, fuzz_target};

const NAMES: [&str; 8] = ["NONE", "LZX", "LZP", "RLT", "ZRLT", "RANK", "MTFT", "SRT"];

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    picks: Vec<u8>,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    if input.picks.is_empty() || input.data.len() > 1 << 20 {
        return;
    }
    let spec = input
        .picks
        .iter()
        .take(8)
        .map(|b| NAMES[*b as usize % NAMES.len()])
        .collect::<Vec<_>>()
        .join("+");

    let mut context = Context::new();
    let mut sequence = match TransformFactory::build_from_spec(&mut context, &spec) {
        Ok(sequence) => sequence,
        Err(_) => return,
    };

    let mut src = input.data.clone();
    let mut mid = vec![0u8; sequence.max_encoded_length(input.data.len())];
    let mut in_span = Span::new(&mut src);
    let mut out_span = Span::new(&mut mid);
    if sequence.forward(&mut in_span, &mut out_span, &context).is_err() {
        return;
    }
    let skip_flags = sequence.skip_flags();
    let encoded_len = out_span.cursor();

    let mut mid2 = mid[..encoded_len].to_vec();
    let mut out = vec![0u8; input.data.len()];
    let mut in_span2 = Span::new(&mut mid2);
    let mut out_span2 = Span::new(&mut out);
    sequence.set_skip_flags(skip_flags);
    sequence
        .inverse(&mut in_span2, &mut out_span2, &context)
        .expect("inverse of our own forward output must succeed");
    assert_eq!(out, input.data);
});
