//! Extraction of the image description attributes used by the
//! window-level pipeline from a parsed object.

use crate::lut::{Rescale, WindowLevel};
use dcmgate_object::DicomFile;
use std::io::{Read, Seek};

/// The image description attributes relevant for display mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    /// _Rows_ (0028,0010)
    pub rows: u32,
    /// _Columns_ (0028,0011)
    pub columns: u32,
    /// _Samples per Pixel_ (0028,0002)
    pub samples_per_pixel: u16,
    /// _Planar Configuration_ (0028,0006)
    pub planar_configuration: u16,
    /// _Bits Stored_ (0028,0101)
    pub bits_stored: u16,
    /// _Pixel Representation_ (0028,0103): 1 for signed samples
    pub signed: bool,
    /// the modality rescale transformation
    pub rescale: Rescale,
    /// the window declared in the object, in display units, if any
    pub window: Option<WindowLevel>,
    /// whether _Presentation LUT Shape_ (2050,0020) requests inversion
    pub inverted: bool,
}

impl ImageAttributes {
    /// Gather the attributes from the data set,
    /// substituting standard defaults for missing elements.
    pub fn from_object<S>(obj: &DicomFile<S>) -> Self
    where
        S: Read + Seek,
    {
        let bits_stored = obj.element_int("BitsStored", 16) as u16;
        let window_center = obj.element_string("WindowCenter", "");
        let window_width = obj.element_string("WindowWidth", "");
        let window = if window_center.is_empty() || window_width.is_empty() {
            None
        } else {
            // multi-valued windows use the first value pair
            Some(WindowLevel {
                center: first_number(&window_center),
                width: first_number(&window_width),
            })
        };
        ImageAttributes {
            rows: obj.element_int("Rows", 0) as u32,
            columns: obj.element_int("Columns", 0) as u32,
            samples_per_pixel: obj.element_int("SamplesPerPixel", 1) as u16,
            planar_configuration: obj.element_int("PlanarConfiguration", 0) as u16,
            bits_stored,
            signed: obj.element_int("PixelRepresentation", 0) == 1,
            rescale: Rescale::new(
                obj.element_float("RescaleSlope", 1.),
                obj.element_float("RescaleIntercept", 0.),
            ),
            window,
            inverted: obj.element_string("PresentationLUTShape", "").trim() == "INVERSE",
        }
    }

    /// The window to apply, in display units: the declared one,
    /// or a full-range window derived from the sample depth.
    pub fn effective_window(&self) -> WindowLevel {
        match self.window {
            Some(w) => w,
            None => {
                let range = f64::from(1u32 << u32::from(self.bits_stored));
                let center = self.rescale.apply(range / 2.);
                let width = range * self.rescale.slope;
                WindowLevel { center, width }
            }
        }
    }
}

fn first_number(value: &str) -> f64 {
    value
        .split('\\')
        .next()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.)
}

#[cfg(test)]
mod tests {
    use super::first_number;

    #[test]
    fn first_of_multi_valued_numbers() {
        assert_eq!(first_number("40\\400"), 40.);
        assert_eq!(first_number(" -600 "), -600.);
        assert_eq!(first_number(""), 0.);
    }
}
