#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]
//! Window-level rendering of DICOM pixel data into 8-bit rasters.
//!
//! The heavy lifting of pixel decoding, raster scaling and JPEG encoding
//! is delegated to collaborators behind the [`FrameDecoder`],
//! [`ImageScaler`] and [`JpegEncoder`] traits. This crate owns the
//! display mapping in between: the window-level look-up table in pixel
//! units, overlay-bit clipping, signed-sample suppression, and the
//! choice of scaling mode.

pub mod attribute;
pub mod lut;

use dcmgate_object::DicomFile;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Seek};
use std::path::Path;

pub use crate::attribute::ImageAttributes;
pub use crate::lut::{Lut, Rescale, WindowLevel};

/// The error type produced by collaborator implementations.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The frame decoder collaborator failed.
    #[snafu(display("Could not decode frame {}", frame))]
    ImageRead {
        frame: usize,
        backtrace: Backtrace,
        source: CollaboratorError,
    },

    /// The image scaler collaborator failed.
    #[snafu(display("Could not scale image"))]
    Scale {
        backtrace: Backtrace,
        source: CollaboratorError,
    },

    /// The JPEG encoder collaborator failed.
    #[snafu(display("Could not encode image"))]
    Encode {
        backtrace: Backtrace,
        source: CollaboratorError,
    },

    /// The object is not bound to a file path the decoder could open.
    #[snafu(display("The object has no file path"))]
    MissingPath { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A decoded frame raster.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// Single-channel samples, up to 16 bits each.
    Gray16 {
        width: u32,
        height: u32,
        /// row-major samples, one per pixel
        samples: Vec<u16>,
    },
    /// Interleaved 8-bit RGB pixels.
    Rgb8 {
        width: u32,
        height: u32,
        /// row-major interleaved RGB bytes
        pixels: Vec<u8>,
    },
}

/// An 8-bit RGB raster, the output of the display mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Rgb8Raster {
    pub width: u32,
    pub height: u32,
    /// row-major interleaved RGB bytes
    pub pixels: Vec<u8>,
}

/// The color model reported by the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorModel {
    /// significant bits per sample
    pub bits_stored: u16,
    /// whether sample values are signed
    pub signed: bool,
    /// samples per pixel (1 for grayscale, 3 for color)
    pub samples_per_pixel: u16,
    /// whether color planes are stored separately
    pub planar: bool,
}

/// A frame decoder's output: the raster and its color model.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub raster: Raster,
    pub model: ColorModel,
}

/// The scaling filter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Bicubic interpolation.
    Bicubic,
}

/// Decodes a single frame of a DICOM file into a raster.
pub trait FrameDecoder {
    fn decode(
        &mut self,
        path: &Path,
        frame: usize,
    ) -> std::result::Result<DecodedFrame, CollaboratorError>;
}

/// Scales an 8-bit RGB raster by independent horizontal and vertical
/// factors.
pub trait ImageScaler {
    fn scale(
        &self,
        raster: &Rgb8Raster,
        scale_x: f64,
        scale_y: f64,
        mode: ScaleMode,
    ) -> std::result::Result<Rgb8Raster, CollaboratorError>;
}

/// Encodes an 8-bit RGB raster as JPEG. A negative quality selects
/// the encoder's default; valid qualities are 0 to 100.
pub trait JpegEncoder {
    fn encode(
        &self,
        raster: &Rgb8Raster,
        quality: i32,
    ) -> std::result::Result<Vec<u8>, CollaboratorError>;
}

/// Options for rendering a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// the frame index to render
    pub frame: usize,
    /// requested output width; the source width when absent
    pub width: Option<u32>,
    /// requested output height; the source height when absent
    pub height: Option<u32>,
    /// window in display units; the object's own window (or a
    /// full-range one) when absent
    pub window: Option<WindowLevel>,
    /// JPEG quality, 0 to 100; negative selects the encoder default
    pub quality: i32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            frame: 0,
            width: None,
            height: None,
            window: None,
            quality: -1,
        }
    }
}

/// Decode a frame, apply the window-level mapping, rescale, and encode
/// an 8-bit JPEG rendition.
pub fn render_frame<S, D, C, E>(
    obj: &DicomFile<S>,
    decoder: &mut D,
    scaler: &C,
    encoder: &E,
    options: &RenderOptions,
) -> Result<Vec<u8>>
where
    S: Read + Seek,
    D: FrameDecoder,
    C: ImageScaler,
    E: JpegEncoder,
{
    let path = obj.path().context(MissingPathSnafu)?;
    let frame = decoder
        .decode(path, options.frame)
        .context(ImageReadSnafu {
            frame: options.frame,
        })?;
    let attrs = ImageAttributes::from_object(obj);

    let rgb = paint_rgb(frame, &attrs, options);
    let (src_w, src_h) = (rgb.width, rgb.height);

    let target_w = options.width.unwrap_or(src_w);
    let target_h = options.height.unwrap_or(src_h);
    let rgb = if target_w != src_w || target_h != src_h {
        // small sample depths and very large frames take the cheap filter
        let mode = if attrs.bits_stored <= 8 || src_w > 1100 || src_h > 1100 {
            ScaleMode::Nearest
        } else {
            ScaleMode::Bicubic
        };
        let scale_x = f64::from(target_w) / f64::from(src_w);
        let scale_y = f64::from(target_h) / f64::from(src_h);
        scaler
            .scale(&rgb, scale_x, scale_y, mode)
            .context(ScaleSnafu)?
    } else {
        rgb
    };

    encoder.encode(&rgb, options.quality).context(EncodeSnafu)
}

/// As [`render_frame`], but treating a decoder failure as an absent
/// image: the error is logged and `None` is returned.
pub fn try_render_frame<S, D, C, E>(
    obj: &DicomFile<S>,
    decoder: &mut D,
    scaler: &C,
    encoder: &E,
    options: &RenderOptions,
) -> Option<Vec<u8>>
where
    S: Read + Seek,
    D: FrameDecoder,
    C: ImageScaler,
    E: JpegEncoder,
{
    match render_frame(obj, decoder, scaler, encoder, options) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!("Could not render frame: {}", e);
            None
        }
    }
}

/// Apply the display mapping and paint the frame to an RGB raster.
fn paint_rgb(frame: DecodedFrame, attrs: &ImageAttributes, options: &RenderOptions) -> Rgb8Raster {
    match frame.raster {
        Raster::Rgb8 {
            width,
            height,
            pixels,
        } => Rgb8Raster {
            width,
            height,
            pixels,
        },
        Raster::Gray16 {
            width,
            height,
            mut samples,
        } => {
            let bits = frame.model.bits_stored.clamp(1, 16);

            // overlay bits above the stored-sample window burn in
            // as the maximum value
            if frame.model.samples_per_pixel == 1
                && !frame.model.planar
                && bits > 8
                && bits < 16
            {
                let max = (1u16 << bits) - 1;
                for sample in &mut samples {
                    if *sample > max {
                        *sample = max;
                    }
                }
            }

            let window = options.window.unwrap_or_else(|| attrs.effective_window());
            let window = attrs.rescale.window_to_pixel_units(window);
            let mut lut = Lut::new_window(bits, window, attrs.inverted);
            if attrs.signed {
                lut.zero_negative_entries();
            }

            let mut pixels = Vec::with_capacity(samples.len() * 3);
            for sample in &samples {
                let g = lut.get(*sample);
                pixels.extend_from_slice(&[g, g, g]);
            }
            Rgb8Raster {
                width,
                height,
                pixels,
            }
        }
    }
}
