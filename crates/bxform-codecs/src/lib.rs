#![warn(missing_docs)]

//! Concrete block transforms: the rank family (`Rlt`, `Zrlt`, `Srt`,
//! `Sbrt`), the `X86Codec` branch normalizer, the LZ family
//! (`LzxCodec`, `LzpCodec`), and honest stubs for the external
//! collaborators (`BWT`/`BWTS`/`TEXT`/`ROLZ`/`ROLZX`/`FSD`) that the
//! sequence engine can address but does not implement here.

mod external;
mod lz;
mod rlt;
mod sbrt;
mod srt;
mod varint;
mod x86;
mod zrlt;

pub use external::{Bwt, Bwts, Fsd, Rolz, Rolzx, Text};
pub use lz::{LzWindow, LzpCodec, LzxCodec};
pub use rlt::Rlt;
pub use sbrt::{Sbrt, SbrtMode};
pub use srt::Srt;
pub use x86::X86Codec;
pub use zrlt::Zrlt;
