/// Maximum number of transform stages a [`PackedTransformId`] can hold.
pub const MAX_STAGES: usize = 8;

const SLOT_BITS: u32 = 6;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;
/// Token 0 occupies bits `[63..58]`; each following token shifts down by
/// 6 bits, so token 7 occupies bits `[15..10]`. Bits `[9..0]` are unused.
const TOP_SHIFT: u32 = 58;

/// A single transform's frozen wire-format identity.
///
/// These numeric values are part of the on-disk contract between the
/// forward and inverse pipelines and must never change or be reused.
/// Id 4 is reserved (obsolete); ids 17..22 are reserved for future use
/// and have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransformId {
    /// No transform; the identity stage.
    None = 0,
    /// Burrows-Wheeler transform (external collaborator).
    Bwt = 1,
    /// BWT with an embedded suffix-array index (external collaborator).
    Bwts = 2,
    /// Standard-window LZ77 match finder.
    Lz = 3,
    /// General run-length transform.
    Rlt = 5,
    /// Zero run-length transform.
    Zrlt = 6,
    /// Self-balanced rank transform, move-to-front mode.
    Mtft = 7,
    /// Self-balanced rank transform, rank mode.
    Rank = 8,
    /// x86 `CALL`/`JMP` displacement normalizer.
    X86 = 9,
    /// Text dictionary transform (external collaborator).
    Text = 10,
    /// Reduced-offset LZ (external collaborator).
    Rolz = 11,
    /// Reduced-offset LZ, extra variant (external collaborator).
    Rolzx = 12,
    /// Sorted rank transform.
    Srt = 13,
    /// LZ + repeat-offset single-context predictor.
    Lzp = 14,
    /// Fixed symbol-dictionary transform (external collaborator).
    Fsd = 15,
    /// Extra/long-window LZ77 match finder.
    Lzx = 16,
}

impl TransformId {
    /// The canonical, case-insensitive name used by the factory's parser.
    pub fn name(self) -> &'static str {
        match self {
            TransformId::None => "NONE",
            TransformId::Bwt => "BWT",
            TransformId::Bwts => "BWTS",
            TransformId::Lz => "LZ",
            TransformId::Rlt => "RLT",
            TransformId::Zrlt => "ZRLT",
            TransformId::Mtft => "MTFT",
            TransformId::Rank => "RANK",
            TransformId::X86 => "X86",
            TransformId::Text => "TEXT",
            TransformId::Rolz => "ROLZ",
            TransformId::Rolzx => "ROLZX",
            TransformId::Srt => "SRT",
            TransformId::Lzp => "LZP",
            TransformId::Fsd => "FSD",
            TransformId::Lzx => "LZX",
        }
    }

    /// Parses a canonical name (case-insensitive) to its id.
    pub fn parse(name: &str) -> Option<TransformId> {
        let upper = name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "NONE" => TransformId::None,
            "BWT" => TransformId::Bwt,
            "BWTS" => TransformId::Bwts,
            "LZ" => TransformId::Lz,
            "RLT" => TransformId::Rlt,
            "ZRLT" => TransformId::Zrlt,
            "MTFT" => TransformId::Mtft,
            "RANK" => TransformId::Rank,
            "X86" => TransformId::X86,
            "TEXT" => TransformId::Text,
            "ROLZ" => TransformId::Rolz,
            "ROLZX" => TransformId::Rolzx,
            "SRT" => TransformId::Srt,
            "LZP" => TransformId::Lzp,
            "FSD" => TransformId::Fsd,
            "LZX" => TransformId::Lzx,
            _ => return None,
        })
    }

    fn from_slot_value(value: u64) -> Option<TransformId> {
        Some(match value {
            0 => TransformId::None,
            1 => TransformId::Bwt,
            2 => TransformId::Bwts,
            3 => TransformId::Lz,
            5 => TransformId::Rlt,
            6 => TransformId::Zrlt,
            7 => TransformId::Mtft,
            8 => TransformId::Rank,
            9 => TransformId::X86,
            10 => TransformId::Text,
            11 => TransformId::Rolz,
            12 => TransformId::Rolzx,
            13 => TransformId::Srt,
            14 => TransformId::Lzp,
            15 => TransformId::Fsd,
            16 => TransformId::Lzx,
            _ => return None,
        })
    }
}

/// A 64-bit word packing up to [`MAX_STAGES`] transform ids, 6 bits
/// each, MSB-first: slot 0 in bits `[63..58]`, slot 7 in bits
/// `[15..10]`. An unused slot holds [`TransformId::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedTransformId(u64);

impl PackedTransformId {
    /// The all-`NONE` packed id.
    pub const EMPTY: PackedTransformId = PackedTransformId(0);

    /// Packs `slots` (in order, slot 0 first) into a single word.
    ///
    /// `slots` may contain fewer than [`MAX_STAGES`] entries; the
    /// remaining trailing slots are filled with `NONE`.
    pub fn pack(slots: &[TransformId]) -> PackedTransformId {
        debug_assert!(slots.len() <= MAX_STAGES);
        let mut word = 0u64;
        for (i, id) in slots.iter().enumerate().take(MAX_STAGES) {
            let shift = TOP_SHIFT - SLOT_BITS * i as u32;
            word |= (*id as u64 & SLOT_MASK) << shift;
        }
        PackedTransformId(word)
    }

    /// The raw 64-bit word.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuilds a packed id from a raw 64-bit word.
    pub fn from_u64(word: u64) -> PackedTransformId {
        PackedTransformId(word)
    }

    /// The id occupying slot `index` (0-based, slot 0 first).
    ///
    /// Returns `None` if `index >= MAX_STAGES` or the slot holds a
    /// value outside the assigned id range.
    pub fn slot(self, index: usize) -> Option<TransformId> {
        if index >= MAX_STAGES {
            return None;
        }
        let shift = TOP_SHIFT - SLOT_BITS * index as u32;
        let value = (self.0 >> shift) & SLOT_MASK;
        TransformId::from_slot_value(value)
    }

    /// Iterates over all [`MAX_STAGES`] slots in order, slot 0 first.
    pub fn slots(self) -> impl Iterator<Item = TransformId> {
        (0..MAX_STAGES).map(move |i| self.slot(i).unwrap_or(TransformId::None))
    }
}
