#![no_main]

//! `TransformFactory::parse` takes an arbitrary, possibly hostile,
//! spec string (think: a CLI flag or a file header field an attacker
//! controls) and must only ever return `Ok` or `Err`, never panic.

use bxform_core::Context;
use bxform_sequence::TransformFactory;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|spec: String| {
    if let Ok(packed) = TransformFactory::parse(&spec) {
        let mut context = Context::new();
        let _ = TransformFactory::build(&mut context, packed);
        let _ = TransformFactory::spec_string(packed);
    }
});
