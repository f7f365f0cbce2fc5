//! QR module matrix and function-pattern map.
//!
//! The symbol itself comes from `qirust`. The engine additionally needs to
//! know which modules are function patterns (finders, separators, timing,
//! alignment, format and version information), since those must stay solid
//! when only data modules may be altered.

use qirust::qrcode::{Mask, QrCode, QrCodeEcc, Version};

use super::EngineError;

/// Highest QR version.
pub const MAX_VERSION: u8 = 40;

/// Pattern XORed over the 15 format bits before they are drawn.
const FORMAT_XOR: u16 = 0x5412;

/// A QR symbol reduced to what the renderer reads.
#[derive(Debug, Clone)]
pub struct Symbol {
    version: u8,
    mask: u8,
    size: usize,
    dark: Vec<bool>,
    function: Vec<bool>,
}

impl Symbol {
    /// Encode `payload` at error correction level High.
    ///
    /// `version: None` picks the smallest version that fits and `mask: None`
    /// lets the encoder choose the mask with the lowest penalty.
    pub fn encode(
        payload: &str,
        version: Option<u8>,
        mask: Option<u8>,
    ) -> Result<Self, EngineError> {
        let (min_version, max_version) = match version {
            Some(v) => (Version::new(v), Version::new(v)),
            None => (Version::MIN, Version::MAX),
        };

        let mut outbuffer = vec![0u8; Version::MAX.buffer_len()];
        let mut tempbuffer = vec![0u8; Version::MAX.buffer_len()];
        let qr = QrCode::encode_text(
            payload,
            &mut tempbuffer,
            &mut outbuffer,
            QrCodeEcc::High,
            min_version,
            max_version,
            mask.map(Mask::new),
            false,
        )
        .map_err(|e| EngineError::CapacityExceeded(e.to_string()))?;

        let size = qr.size() as usize;
        let mut dark = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                dark.push(qr.get_module(x as i32, y as i32));
            }
        }
        let version = qr.version().value();

        // `QrCode::mask` reads the drawn bits without removing FORMAT_XOR
        let mask = mask.unwrap_or_else(|| format_mask(read_format_bits(&dark, size)));

        Ok(Self {
            version,
            mask,
            size,
            dark,
            function: function_pattern_map(version),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Modules per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the module at (x, y) is dark.
    #[inline]
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.size + x]
    }

    /// Whether the module at (x, y) belongs to a function pattern.
    #[inline]
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.function[y * self.size + x]
    }
}

/// Read the top-left copy of the format information, bit 0 first.
fn read_format_bits(dark: &[bool], size: usize) -> u16 {
    let at = |x: usize, y: usize| dark[y * size + x];
    let mut modules = Vec::with_capacity(15);
    modules.extend((0..6).map(|y| at(8, y)));
    modules.extend([at(8, 7), at(8, 8), at(7, 8)]);
    modules.extend((9..15).map(|i| at(14 - i, 8)));

    modules
        .iter()
        .enumerate()
        .fold(0, |bits, (i, &d)| bits | (u16::from(d) << i))
}

/// Mask pattern carried by raw format bits.
fn format_mask(bits: u16) -> u8 {
    (((bits ^ FORMAT_XOR) >> 10) & 0b111) as u8
}

/// Centre coordinates of the alignment patterns along one axis.
pub(crate) fn alignment_positions(version: u8) -> Vec<usize> {
    if version == 1 {
        return Vec::new();
    }
    let version = usize::from(version);
    let size = version * 4 + 17;
    let count = version / 7 + 2;
    let step = if version == 32 {
        26
    } else {
        (version * 4 + count * 2 + 1) / (count * 2 - 2) * 2
    };

    let mut positions: Vec<usize> = (0..count - 1).map(|i| size - 7 - i * step).collect();
    positions.push(6);
    positions.reverse();
    positions
}

/// Row-major map of function-pattern modules for `version`.
pub(crate) fn function_pattern_map(version: u8) -> Vec<bool> {
    let size = usize::from(version) * 4 + 17;
    let mut map = vec![false; size * size];
    let mut mark = |x: usize, y: usize| map[y * size + x] = true;

    for y in 0..size {
        for x in 0..size {
            // Finders with separators and format areas; the bottom-left block
            // also covers the dark module.
            let top_left = x < 9 && y < 9;
            let top_right = x >= size - 8 && y < 9;
            let bottom_left = x < 9 && y >= size - 8;
            let timing = x == 6 || y == 6;
            if top_left || top_right || bottom_left || timing {
                mark(x, y);
            }
        }
    }

    let positions = alignment_positions(version);
    let last = positions.len().saturating_sub(1);
    for (i, &cx) in positions.iter().enumerate() {
        for (j, &cy) in positions.iter().enumerate() {
            // These three collide with the finders
            if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                continue;
            }
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    mark(x, y);
                }
            }
        }
    }

    if version >= 7 {
        for a in size - 11..size - 8 {
            for b in 0..6 {
                mark(a, b);
                mark(b, a);
            }
        }
    }

    map
}
