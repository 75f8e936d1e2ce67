//! Fixed-width field readers shared by the ".shp", ".shx" and ".dbf" readers.
//!
//! Shapefiles mix byte orders within a single header, so nothing here assumes
//! a "file" byte order: each caller picks `BigEndian` or `LittleEndian` per
//! field.

use std::io;
use byteorder::{ByteOrder, LittleEndian};
use super::header::ShpBoundingBox;

pub const BOX_LENGTH: usize = 32;

/// Reads four consecutive little-endian doubles starting at `offset`.
///
/// There is no validation: NaN is passed through, and min may exceed max.
///
/// Panics if `buf` is shorter than `offset + 32`; callers size-check first.
pub fn read_box(buf: &[u8], offset: usize) -> ShpBoundingBox {
    ShpBoundingBox {
        min_x: LittleEndian::read_f64(&buf[offset .. offset + 8]),
        min_y: LittleEndian::read_f64(&buf[offset + 8 .. offset + 16]),
        max_x: LittleEndian::read_f64(&buf[offset + 16 .. offset + 24]),
        max_y: LittleEndian::read_f64(&buf[offset + 24 .. offset + 32]),
    }
}

pub fn read_u16_le(buf: &[u8]) -> u32 {
    LittleEndian::read_u16(buf) as u32
}

/// Widened so counts past 2^31 can't turn negative.
pub fn read_u32_le(buf: &[u8]) -> u64 {
    LittleEndian::read_u32(buf) as u64
}

/// Lengths and offsets in ".shp"/".shx" are counted in 16-bit words.
pub fn words_to_bytes(words: u32) -> usize {
    words as usize * 2
}

/// Fills `buf`, or returns `truncated()` if the stream ends first.
///
/// Any other I/O failure is passed to `io_error`.
pub fn read_exact_or<R, E, F, G>(file: &mut R, buf: &mut [u8], truncated: F, io_error: G) -> Result<(), E>
    where R: io::Read + ?Sized, F: FnOnce() -> E, G: FnOnce(io::Error) -> E
{
    match file.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(ref err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(truncated()),
        Err(err) => Err(io_error(err)),
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use byteorder::{LittleEndian, WriteBytesExt};
    use super::*;

    #[test]
    fn box_at_offset() {
        let mut buf: Vec<u8> = vec![ 0xff; 4 ];
        for v in &[ 1.5f64, -2.5, 3.5, -4.5 ] {
            buf.write_f64::<LittleEndian>(*v).unwrap();
        }
        let b = read_box(&buf, 4);
        assert_eq!(1.5, b.min_x);
        assert_eq!(-2.5, b.min_y);
        assert_eq!(3.5, b.max_x);
        assert_eq!(-4.5, b.max_y);
    }

    #[test]
    fn box_accepts_min_above_max() {
        let mut buf: Vec<u8> = vec![];
        for v in &[ 10f64, 10., 0., 0. ] {
            buf.write_f64::<LittleEndian>(*v).unwrap();
        }
        let b = read_box(&buf, 0);
        assert!(b.min_x > b.max_x);
    }

    #[test]
    fn u32_does_not_sign_corrupt() {
        assert_eq!(0x8000_0001u64, read_u32_le(&[ 0x01, 0x00, 0x00, 0x80 ]));
        assert_eq!(0xffffu32, read_u16_le(&[ 0xff, 0xff ]));
    }

    #[test]
    fn words() {
        assert_eq!(100, words_to_bytes(50));
    }

    #[test]
    fn read_exact_or_maps_eof() {
        let mut r = io::Cursor::new(vec![ 1u8, 2 ]);
        let mut buf = [ 0u8; 4 ];
        let ret: Result<(), &str> = read_exact_or(&mut r, &mut buf, || "truncated", |_| "io");
        assert_eq!(Err("truncated"), ret);
    }
}
