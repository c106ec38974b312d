//! Look-up table (LUT) implementation for window-level transformations.
//!
//! This module contains the [`Lut`] data type, which maps stored pixel
//! sample values to 8-bit display values through a linear window.

use num_traits::NumCast;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// A window in pixel units: the center and span of the linear ramp
/// mapping stored values to display values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    /// the window center (level)
    pub center: f64,
    /// the window width
    pub width: f64,
}

/// The modality rescale transformation between stored pixel values
/// and display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    /// the rescale slope (0 is treated as 1)
    pub slope: f64,
    /// the rescale intercept
    pub intercept: f64,
}

impl Rescale {
    /// Create a new rescale transformation.
    pub fn new(slope: f64, intercept: f64) -> Self {
        let slope = if slope == 0. { 1. } else { slope };
        Rescale { slope, intercept }
    }

    /// Apply the transformation: stored value to display units.
    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }

    /// Convert a window given in display units to pixel units.
    pub fn window_to_pixel_units(&self, window: WindowLevel) -> WindowLevel {
        WindowLevel {
            center: (window.center - self.intercept) / self.slope,
            width: window.width / self.slope,
        }
    }
}

/// A look-up table mapping stored sample values to 8-bit display values.
///
/// The table has `2^bits_stored` entries. Values at or below
/// `center − width/2` map to 0, values at or above
/// `center − width/2 + width` map to 255, and values in between are
/// linearly interpolated. A zero-width window degenerates to a step
/// function at the center.
#[derive(Debug, Clone)]
pub struct Lut {
    table: Vec<u8>,
}

impl Lut {
    /// Create a LUT of the given size, populated by the provided
    /// function. The function may be called concurrently.
    pub fn new_with_fn(size: usize, f: impl Fn(f64) -> f64 + Sync) -> Self {
        debug_assert!(size.is_power_of_two());
        let table = (0..size)
            .into_par_iter()
            .map(|i| {
                let v = f(i as f64);
                <u8 as NumCast>::from(v.clamp(0., 255.)).unwrap_or(0)
            })
            .collect();
        Lut { table }
    }

    /// Create a window-level LUT for samples of `bits_stored` bits,
    /// with the window given in pixel units.
    /// When `inverted` is set the output ramp runs 255 → 0.
    pub fn new_window(bits_stored: u16, window: WindowLevel, inverted: bool) -> Self {
        let size = 1usize << bits_stored;
        let bottom = window.center - window.width / 2.;
        let top = bottom + window.width;
        Lut::new_with_fn(size, move |x| {
            let v = if x <= bottom || window.width == 0. {
                if window.width == 0. && x >= top {
                    255.
                } else {
                    0.
                }
            } else if x >= top {
                255.
            } else {
                (x - bottom) * 255. / window.width
            };
            if inverted {
                255. - v
            } else {
                v
            }
        })
    }

    /// The number of entries in the table.
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Zero the entries for the upper half of the index range,
    /// where the sign bit of signed sample values is set.
    pub fn zero_negative_entries(&mut self) {
        let half = self.table.len() / 2;
        for entry in &mut self.table[half..] {
            *entry = 0;
        }
    }

    /// Apply the transformation to a single sample value.
    /// Index bits above the table size are masked out.
    pub fn get(&self, sample: u16) -> u8 {
        let mask = self.table.len() - 1;
        self.table[sample as usize & mask]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_to_pixel_units() {
        let rescale = Rescale::new(2., -1024.);
        assert_eq!(rescale.apply(512.), -0.);
        let w = rescale.window_to_pixel_units(WindowLevel {
            center: 0.,
            width: 400.,
        });
        assert_eq!(w.center, 512.);
        assert_eq!(w.width, 200.);
        // a zero slope acts as identity
        let identity = Rescale::new(0., 0.);
        assert_eq!(identity.apply(7.), 7.);
    }

    #[test]
    fn window_endpoints_are_assigned() {
        let lut = Lut::new_window(
            8,
            WindowLevel {
                center: 128.,
                width: 100.,
            },
            false,
        );
        assert_eq!(lut.size(), 256);
        // bottom = 78, top = 178
        assert_eq!(lut.get(0), 0);
        assert_eq!(lut.get(78), 0);
        assert_eq!(lut.get(178), 255);
        assert_eq!(lut.get(255), 255);
        // midpoint of the ramp
        let mid = lut.get(128);
        assert!((126..=129).contains(&mid), "midpoint was {}", mid);
    }

    #[test]
    fn inverted_window() {
        let lut = Lut::new_window(
            8,
            WindowLevel {
                center: 128.,
                width: 100.,
            },
            true,
        );
        assert_eq!(lut.get(0), 255);
        assert_eq!(lut.get(255), 0);
    }

    #[test]
    fn signed_entries_are_zeroed() {
        let mut lut = Lut::new_window(
            8,
            WindowLevel {
                center: 64.,
                width: 1.,
            },
            false,
        );
        lut.zero_negative_entries();
        // the upper half of the index range holds "negative" samples
        assert_eq!(lut.get(200), 0);
        assert_eq!(lut.get(255), 0);
        assert_eq!(lut.get(100), 255);
    }

    #[test]
    fn zero_width_window_is_a_step() {
        let lut = Lut::new_window(
            8,
            WindowLevel {
                center: 100.,
                width: 0.,
            },
            false,
        );
        assert_eq!(lut.get(99), 0);
        assert_eq!(lut.get(101), 255);
    }

    #[test]
    fn out_of_range_indices_are_masked() {
        let lut = Lut::new_window(
            10,
            WindowLevel {
                center: 512.,
                width: 1024.,
            },
            false,
        );
        assert_eq!(lut.size(), 1024);
        // sample 1024 wraps to index 0
        assert_eq!(lut.get(1024), lut.get(0));
    }
}
