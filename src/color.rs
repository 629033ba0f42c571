/*!
 # Color conversion

 The bulb only accepts a full RGB value packed into a 24-bit integer, while
 the host works with independent hue and saturation. This module converts
 between the two.
*/

use palette::{encoding, FromColor, Srgb};

/// Floating point HSV in palette's 0-1 saturation/value scale
type Model = palette::Hsv<encoding::Srgb, f64>;

/// An 8-bit per channel RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A hue/saturation/value triple
///
/// `h` is in degrees (0-360), `s` and `v` are percentages (0-100). The
/// components are kept unrounded so that converting an [`Rgb`] to HSV and
/// back reproduces it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Decode a packed 0xRRGGBB value. Bits above the low 24 are ignored.
    pub const fn from_packed(color: u32) -> Self {
        Self {
            r: ((color >> 16) & 0xFF) as u8,
            g: ((color >> 8) & 0xFF) as u8,
            b: (color & 0xFF) as u8,
        }
    }

    /// Pack into the 0xRRGGBB integer expected by `set_rgb`
    pub const fn to_packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn to_hsv(self) -> Hsv {
        let rgb = Srgb::<u8>::new(self.r, self.g, self.b).into_format::<f64>();
        let hsv = Model::from_color(rgb);
        Hsv {
            h: hsv.hue.into_positive_degrees(),
            s: hsv.saturation * 100.0,
            v: hsv.value * 100.0,
        }
    }
}

impl Hsv {
    pub const fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Convert to RGB, rounding each channel to the nearest integer.
    ///
    /// Hue wraps around 360, saturation and value are clamped to 0-100.
    pub fn to_rgb(self) -> Rgb {
        let hsv = Model::new(
            self.h,
            (self.s / 100.0).clamp(0.0, 1.0),
            (self.v / 100.0).clamp(0.0, 1.0),
        );
        let rgb = Srgb::<f64>::from_color(hsv).into_format::<u8>();
        Rgb {
            r: rgb.red,
            g: rgb.green,
            b: rgb.blue,
        }
    }

    /// Same color with a different hue
    pub fn with_hue(self, h: f64) -> Self {
        Self { h, ..self }
    }

    /// Same color with a different saturation
    pub fn with_saturation(self, s: f64) -> Self {
        Self { s, ..self }
    }
}

impl From<Rgb> for Hsv {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hsv()
    }
}

impl From<Hsv> for Rgb {
    fn from(hsv: Hsv) -> Self {
        hsv.to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let rgb = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(rgb.to_packed(), 0x123456);
        assert_eq!(Rgb::from_packed(0x123456), rgb);
        assert_eq!(Rgb::from_packed(0xFF00_0000 | 0x00FF00), Rgb::new(0, 255, 0));
    }

    fn assert_close(actual: Hsv, expected: Hsv) {
        let close = (actual.h - expected.h).abs() < 1e-6
            && (actual.s - expected.s).abs() < 1e-6
            && (actual.v - expected.v).abs() < 1e-6;
        assert!(close, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_primaries() {
        assert_close(Rgb::new(255, 0, 0).to_hsv(), Hsv::new(0.0, 100.0, 100.0));
        assert_close(Rgb::new(0, 255, 0).to_hsv(), Hsv::new(120.0, 100.0, 100.0));
        assert_close(Rgb::new(0, 0, 255).to_hsv(), Hsv::new(240.0, 100.0, 100.0));
        assert_close(Rgb::new(0, 0, 0).to_hsv(), Hsv::new(0.0, 0.0, 0.0));
        assert_eq!(Hsv::new(60.0, 100.0, 100.0).to_rgb(), Rgb::new(255, 255, 0));
        assert_eq!(Hsv::new(300.0, 100.0, 100.0).to_rgb(), Rgb::new(255, 0, 255));
    }

    #[test]
    fn test_grey_has_no_saturation() {
        let hsv = Rgb::new(128, 128, 128).to_hsv();
        assert_close(hsv, Hsv::new(0.0, 0.0, 128.0 / 255.0 * 100.0));
    }

    #[test]
    fn test_hue_wraps() {
        assert_eq!(Hsv::new(360.0, 100.0, 100.0).to_rgb(), Rgb::new(255, 0, 0));
        assert_eq!(Hsv::new(-120.0, 100.0, 100.0).to_rgb(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(Hsv::new(0.0, 150.0, 200.0).to_rgb(), Rgb::new(255, 0, 0));
        assert_eq!(Hsv::new(0.0, -10.0, 100.0).to_rgb(), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_round_trip() {
        let steps = (0..=255u8).step_by(17).chain([1, 127, 128, 254]);
        let channels: Vec<u8> = steps.collect();
        for &r in &channels {
            for &g in &channels {
                for &b in &channels {
                    let rgb = Rgb::new(r, g, b);
                    assert_eq!(rgb.to_hsv().to_rgb(), rgb, "round trip of {rgb:?}");
                }
            }
        }
    }
}
