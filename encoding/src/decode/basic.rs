//! This module provides implementations for basic decoders: little endian
//! and big endian number reading, with a type-erased dispatching form.

use super::{ReadSnafu, Result};
use crate::transfer_syntax::Endianness;
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use snafu::ResultExt;
use std::io::Read;

/// Trait for reading numeric values in a transfer syntax' byte order.
pub trait BasicDecode {
    /// Retrieve the source's byte order.
    fn endianness(&self) -> Endianness;

    /// Decode an unsigned short value from the given source.
    fn decode_us<S>(&self, source: S) -> Result<u16>
    where
        S: Read;

    /// Decode an unsigned long value from the given source.
    fn decode_ul<S>(&self, source: S) -> Result<u32>
    where
        S: Read;

    /// Decode a signed short value from the given source.
    fn decode_ss<S>(&self, source: S) -> Result<i16>
    where
        S: Read;

    /// Decode a signed long value from the given source.
    fn decode_sl<S>(&self, source: S) -> Result<i32>
    where
        S: Read;

    /// Decode a single precision float value from the given source.
    fn decode_fl<S>(&self, source: S) -> Result<f32>
    where
        S: Read;

    /// Decode a double precision float value from the given source.
    fn decode_fd<S>(&self, source: S) -> Result<f64>
    where
        S: Read;
}

/// A basic decoder of DICOM primitive values in little endian.
#[derive(Debug, Default, Clone)]
pub struct LittleEndianBasicDecoder;

impl BasicDecode for LittleEndianBasicDecoder {
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    fn decode_us<S>(&self, mut source: S) -> Result<u16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn decode_ul<S>(&self, mut source: S) -> Result<u32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn decode_ss<S>(&self, mut source: S) -> Result<i16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_i16(&buf))
    }

    fn decode_sl<S>(&self, mut source: S) -> Result<i32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_i32(&buf))
    }

    fn decode_fl<S>(&self, mut source: S) -> Result<f32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_f32(&buf))
    }

    fn decode_fd<S>(&self, mut source: S) -> Result<f64>
    where
        S: Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(LittleEndian::read_f64(&buf))
    }
}

/// A basic decoder of DICOM primitive values in big endian.
#[derive(Debug, Default, Clone)]
pub struct BigEndianBasicDecoder;

impl BasicDecode for BigEndianBasicDecoder {
    fn endianness(&self) -> Endianness {
        Endianness::Big
    }

    fn decode_us<S>(&self, mut source: S) -> Result<u16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_u16(&buf))
    }

    fn decode_ul<S>(&self, mut source: S) -> Result<u32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_u32(&buf))
    }

    fn decode_ss<S>(&self, mut source: S) -> Result<i16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_i16(&buf))
    }

    fn decode_sl<S>(&self, mut source: S) -> Result<i32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_i32(&buf))
    }

    fn decode_fl<S>(&self, mut source: S) -> Result<f32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_f32(&buf))
    }

    fn decode_fd<S>(&self, mut source: S) -> Result<f64>
    where
        S: Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf).context(ReadSnafu)?;
        Ok(BigEndian::read_f64(&buf))
    }
}

/// A basic decoder with support for both byte orders,
/// decided at run time.
#[derive(Debug, Clone)]
pub enum BasicDecoder {
    /// little endian decoding
    LE(LittleEndianBasicDecoder),
    /// big endian decoding
    BE(BigEndianBasicDecoder),
}

impl From<Endianness> for BasicDecoder {
    fn from(endianness: Endianness) -> BasicDecoder {
        match endianness {
            Endianness::Little => BasicDecoder::LE(LittleEndianBasicDecoder),
            Endianness::Big => BasicDecoder::BE(BigEndianBasicDecoder),
        }
    }
}

macro_rules! for_both {
    ($s:expr, |$e:ident| $f:expr) => {
        match $s {
            BasicDecoder::LE($e) => $f,
            BasicDecoder::BE($e) => $f,
        }
    };
}

impl BasicDecode for BasicDecoder {
    fn endianness(&self) -> Endianness {
        for_both!(self, |d| d.endianness())
    }

    fn decode_us<S>(&self, source: S) -> Result<u16>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_us(source))
    }

    fn decode_ul<S>(&self, source: S) -> Result<u32>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_ul(source))
    }

    fn decode_ss<S>(&self, source: S) -> Result<i16>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_ss(source))
    }

    fn decode_sl<S>(&self, source: S) -> Result<i32>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_sl(source))
    }

    fn decode_fl<S>(&self, source: S) -> Result<f32>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_fl(source))
    }

    fn decode_fd<S>(&self, source: S) -> Result<f64>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_fd(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_round_trip() {
        let le = LittleEndianBasicDecoder;
        let be = BigEndianBasicDecoder;
        let data = [0x01u8, 0x02, 0x03, 0x04];
        assert_eq!(le.decode_us(&data[..]).unwrap(), 0x0201);
        assert_eq!(be.decode_us(&data[..]).unwrap(), 0x0102);
        assert_eq!(le.decode_ul(&data[..]).unwrap(), 0x0403_0201);
        assert_eq!(be.decode_ul(&data[..]).unwrap(), 0x0102_0304);
    }

    #[test]
    fn erased_decoder_dispatches() {
        let d = BasicDecoder::from(Endianness::Big);
        assert_eq!(d.endianness(), Endianness::Big);
        let data = [0x40u8, 0x49, 0x0F, 0xDB];
        let v = d.decode_fl(&data[..]).unwrap();
        assert!((v - std::f32::consts::PI).abs() < 1e-6);
    }
}
