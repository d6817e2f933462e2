#![forbid(unsafe_code)]

//! Physical-to-scroll unit conversion.
//!
//! Experiment dimensions are specified in millimetres. The core never looks
//! inside the conversion; it only calls [`UnitScale::to_units`].

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Converts a physical length in millimetres into integer scroll/pixel units.
pub trait UnitScale {
    /// Convert `mm` millimetres. Rounds to the nearest unit.
    fn to_units(&self, mm: f64) -> i64;
}

impl<F> UnitScale for F
where
    F: Fn(f64) -> i64,
{
    fn to_units(&self, mm: f64) -> i64 {
        self(mm)
    }
}

/// Fixed pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelDensity {
    px_per_mm: f64,
}

impl PixelDensity {
    /// Density from pixels per millimetre.
    #[must_use]
    pub const fn from_px_per_mm(px_per_mm: f64) -> Self {
        Self { px_per_mm }
    }

    /// Density from dots per inch.
    #[must_use]
    pub fn from_dpi(dpi: f64) -> Self {
        Self::from_px_per_mm(dpi / MM_PER_INCH)
    }

    #[must_use]
    pub const fn px_per_mm(&self) -> f64 {
        self.px_per_mm
    }
}

impl Default for PixelDensity {
    /// 96 DPI.
    fn default() -> Self {
        Self::from_dpi(96.0)
    }
}

impl UnitScale for PixelDensity {
    fn to_units(&self, mm: f64) -> i64 {
        (mm * self.px_per_mm).round() as i64
    }
}
