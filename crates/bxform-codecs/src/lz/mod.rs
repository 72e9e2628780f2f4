//! LZ-family match finders: a hash-chained LZ77 variant with a
//! two-slot repeat-offset cache ([`LzxCodec`], covering both the
//! short-window `LZ` and long-window `LZX` factory names), and a
//! single-context LZP predictor ([`LzpCodec`]).

mod lzp;
mod lzx;

pub use lzp::LzpCodec;
pub use lzx::{LzWindow, LzxCodec};

/// Context key recognized by [`LzxCodec`]: when `context.get_text("dataType", "")`
/// equals this value, the minimum match length widens from 5 to 9 bytes,
/// which pays off on four-letter-alphabet genomic data where short matches
/// are coincidental rather than structural.
pub const DATA_TYPE_DNA: &str = "DNA";
