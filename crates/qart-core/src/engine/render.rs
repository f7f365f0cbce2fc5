//! Cell painting, quiet zone and rotation.

use image::{imageops, GrayImage, Luma};
use rand::Rng;

use super::matrix::Symbol;
use super::reference::Halftone;
use super::EngineError;

/// Light modules of margin around the symbol.
pub const QUIET_ZONE: u32 = 4;

/// Largest allowed output edge in pixels.
pub const MAX_OUTPUT_EDGE: u32 = 4096;

/// Gray level marking function patterns in the control image.
pub const CONTROL_GRAY: u8 = 128;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Pixel geometry of one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    modules: u32,
    scale: u32,
}

impl Layout {
    pub fn new(modules: usize, scale: u32) -> Result<Self, EngineError> {
        let edge = (modules as u64 + 2 * u64::from(QUIET_ZONE)) * u64::from(scale);
        if edge > u64::from(MAX_OUTPUT_EDGE) {
            return Err(EngineError::OutputTooLarge {
                edge,
                max: MAX_OUTPUT_EDGE,
            });
        }
        Ok(Self {
            modules: modules as u32,
            scale,
        })
    }

    /// Full image edge including the quiet zone.
    pub fn edge(&self) -> u32 {
        (self.modules + 2 * QUIET_ZONE) * self.scale
    }

    /// Edge of the symbol area alone.
    pub fn symbol_edge(&self) -> u32 {
        self.modules * self.scale
    }

    /// Whether a pixel offset inside a cell lies in the cell's centre third.
    #[inline]
    fn in_centre(&self, dx: u32, dy: u32) -> bool {
        let lo = self.scale / 3;
        let hi = self.scale - lo;
        (lo..hi).contains(&dx) && (lo..hi).contains(&dy)
    }

    /// Cells must be at least 3 pixels wide to leave room around the centre.
    fn has_free_pixels(&self) -> bool {
        self.scale >= 3
    }
}

/// Flags that change how cells are painted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    pub only_data_bits: bool,
    pub randomize: bool,
}

/// Paint the symbol, blending `halftone` into the pixels around each
/// module's centre when given.
pub fn render<R: Rng>(
    symbol: &Symbol,
    layout: &Layout,
    halftone: Option<&Halftone>,
    style: Style,
    rng: &mut R,
) -> GrayImage {
    debug_assert!(halftone.map_or(true, |h| h.edge() == layout.symbol_edge()));
    let edge = layout.edge();
    let offset = QUIET_ZONE * layout.scale;
    let mut img = GrayImage::from_pixel(edge, edge, LIGHT);
    let free = layout.has_free_pixels();

    for my in 0..symbol.size() {
        for mx in 0..symbol.size() {
            let dark = symbol.is_dark(mx, my);
            let function = symbol.is_function(mx, my);
            let x0 = mx as u32 * layout.scale;
            let y0 = my as u32 * layout.scale;

            for dy in 0..layout.scale {
                for dx in 0..layout.scale {
                    let (sx, sy) = (x0 + dx, y0 + dy);
                    let fixed = !free || layout.in_centre(dx, dy);
                    let is_dark = match halftone {
                        _ if fixed => dark,
                        Some(_) if function && style.only_data_bits => dark,
                        Some(h) => h.is_dark(sx, sy),
                        None if style.randomize && !function => rng.gen(),
                        None => dark,
                    };
                    if is_dark {
                        img.put_pixel(offset + sx, offset + sy, DARK);
                    }
                }
            }
        }
    }
    img
}

/// Plain symbol with every function-pattern module painted [`CONTROL_GRAY`].
pub fn render_control(symbol: &Symbol, layout: &Layout) -> GrayImage {
    let offset = QUIET_ZONE * layout.scale;
    let mut img = GrayImage::from_pixel(layout.edge(), layout.edge(), LIGHT);

    for my in 0..symbol.size() {
        for mx in 0..symbol.size() {
            let color = if symbol.is_function(mx, my) {
                Luma([CONTROL_GRAY])
            } else if symbol.is_dark(mx, my) {
                DARK
            } else {
                continue;
            };
            let x0 = offset + mx as u32 * layout.scale;
            let y0 = offset + my as u32 * layout.scale;
            for y in y0..y0 + layout.scale {
                for x in x0..x0 + layout.scale {
                    img.put_pixel(x, y, color);
                }
            }
        }
    }
    img
}

/// Rotate by `quarter_turns` × 90° clockwise. Any integer is accepted.
pub fn rotate(img: GrayImage, quarter_turns: i32) -> GrayImage {
    match quarter_turns.rem_euclid(4) {
        1 => imageops::rotate90(&img),
        2 => imageops::rotate180(&img),
        3 => imageops::rotate270(&img),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reference::{binarize, Binarize};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn symbol() -> Symbol {
        Symbol::encode("render", None, Some(2)).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn halftone(edge: u32, value: u8) -> Halftone {
        let gray = GrayImage::from_pixel(edge, edge, Luma([value]));
        binarize(&gray, Binarize::Threshold, &mut rng())
    }

    fn pixel(img: &GrayImage, layout: &Layout, mx: usize, my: usize, dx: u32, dy: u32) -> u8 {
        let offset = QUIET_ZONE * layout.scale;
        img.get_pixel(
            offset + mx as u32 * layout.scale + dx,
            offset + my as u32 * layout.scale + dy,
        )
        .0[0]
    }

    #[test]
    fn test_layout() {
        let layout = Layout::new(21, 5).unwrap();
        assert_eq!(layout.edge(), (21 + 8) * 5);
        assert_eq!(layout.symbol_edge(), 105);
        assert!(Layout::new(177, 24).is_err());
    }

    #[test]
    fn test_centre_third() {
        let layout = Layout::new(21, 3).unwrap();
        assert!(layout.in_centre(1, 1));
        assert!(!layout.in_centre(0, 1));
        assert!(!layout.in_centre(2, 2));

        let layout = Layout::new(21, 1).unwrap();
        assert!(layout.in_centre(0, 0));
    }

    #[test]
    fn test_plain_render_matches_modules() {
        let symbol = symbol();
        let layout = Layout::new(symbol.size(), 2).unwrap();
        let img = render(&symbol, &layout, None, Style::default(), &mut rng());

        for my in 0..symbol.size() {
            for mx in 0..symbol.size() {
                let expected = if symbol.is_dark(mx, my) { 0 } else { 255 };
                assert_eq!(pixel(&img, &layout, mx, my, 1, 0), expected);
            }
        }
        // Quiet zone stays light
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_halftone_keeps_centres() {
        let symbol = symbol();
        let layout = Layout::new(symbol.size(), 3).unwrap();
        let black = halftone(layout.symbol_edge(), 0);
        let img = render(&symbol, &layout, Some(&black), Style::default(), &mut rng());

        for my in 0..symbol.size() {
            for mx in 0..symbol.size() {
                let expected = if symbol.is_dark(mx, my) { 0 } else { 255 };
                assert_eq!(pixel(&img, &layout, mx, my, 1, 1), expected);
                // Surroundings follow the reference
                assert_eq!(pixel(&img, &layout, mx, my, 0, 0), 0);
            }
        }
    }

    #[test]
    fn test_only_data_bits_keeps_function_patterns_solid() {
        let symbol = symbol();
        let layout = Layout::new(symbol.size(), 3).unwrap();
        let black = halftone(layout.symbol_edge(), 0);
        let style = Style {
            only_data_bits: true,
            randomize: false,
        };
        let img = render(&symbol, &layout, Some(&black), style, &mut rng());

        // (7, 0) is a light separator module
        assert!(symbol.is_function(7, 0) && !symbol.is_dark(7, 0));
        for d in 0..3 {
            assert_eq!(pixel(&img, &layout, 7, 0, d, d), 255);
        }
    }

    #[test]
    fn test_randomize_without_reference_leaves_functions_alone() {
        let symbol = symbol();
        let layout = Layout::new(symbol.size(), 3).unwrap();
        let style = Style {
            only_data_bits: false,
            randomize: true,
        };
        let img = render(&symbol, &layout, None, style, &mut rng());
        let plain = render(&symbol, &layout, None, Style::default(), &mut rng());

        assert_ne!(img, plain);
        for d in 0..3 {
            assert_eq!(pixel(&img, &layout, 0, 0, d, 0), 0);
            assert_eq!(pixel(&img, &layout, 7, 0, d, 0), 255);
        }
    }

    #[test]
    fn test_control_image() {
        let symbol = symbol();
        let layout = Layout::new(symbol.size(), 1).unwrap();
        let img = render_control(&symbol, &layout);
        assert_eq!(pixel(&img, &layout, 0, 0, 0, 0), CONTROL_GRAY);
        assert_eq!(pixel(&img, &layout, 7, 0, 0, 0), CONTROL_GRAY);
    }

    #[test]
    fn test_rotate() {
        let mut img = GrayImage::from_pixel(3, 2, LIGHT);
        img.put_pixel(0, 0, DARK);

        let once = rotate(img.clone(), 1);
        assert_eq!(once.dimensions(), (2, 3));
        assert_eq!(once.get_pixel(1, 0).0[0], 0);

        assert_eq!(rotate(img.clone(), 4), img);
        assert_eq!(rotate(img.clone(), -1), rotate(img.clone(), 3));
        assert_eq!(rotate(img.clone(), 2).get_pixel(2, 1).0[0], 0);
    }
}
