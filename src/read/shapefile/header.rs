//! The 100-byte header at the start of every ".shp" and ".shx" file, as per
//! https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf

use std::error;
use std::fmt;
use std::io;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use super::codec;
use super::shape_type::ShapeType;

pub const SHP_HEADER_LENGTH: usize = 100;
pub const SHP_MAGIC_NUMBER: u32 = 9994;

#[derive(Debug)]
pub enum ShpError {
    IOError(io::Error),
    /// The file code isn't 9994: this isn't a ".shp" or ".shx" file.
    BadMagic(u32),
    UnsupportedShapeType(i32),
    TruncatedHeader,
    TruncatedIndex { bytes_remaining: usize },
    TruncatedRecord { record_number: u32 },
    /// PolyLines with more than one part aren't assembled.
    UnsupportedMultiPart { record_number: u32, num_parts: usize },
    ParseError(String),
}

impl error::Error for ShpError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ShpError::IOError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ShpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShpError::IOError(ref err) => err.fmt(f),
            ShpError::BadMagic(found) => write!(f, "File has wrong magic number: found {}, expected {}", found, SHP_MAGIC_NUMBER),
            ShpError::UnsupportedShapeType(code) => write!(f, "File has nonexistent shape type {}", code),
            ShpError::TruncatedHeader => write!(f, "File ended before its {}-byte header", SHP_HEADER_LENGTH),
            ShpError::TruncatedIndex { bytes_remaining } => write!(f, "Index ended with {} bytes that do not form an 8-byte record", bytes_remaining),
            ShpError::TruncatedRecord { record_number } => write!(f, "Record number {} is cut short", record_number),
            ShpError::UnsupportedMultiPart { record_number, num_parts } => write!(f, "Record number {} has {} parts; only single-part PolyLines are supported", record_number, num_parts),
            ShpError::ParseError(ref description) => write!(f, "Parse error: {}", description),
        }
    }
}

impl From<io::Error> for ShpError {
    fn from(err: io::Error) -> ShpError {
        ShpError::IOError(err)
    }
}

/// A 2D axis-aligned bounding box. Never holds Z or M.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShpBoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Header shared by ".shp" and ".shx".
///
/// The Z range is `Some` iff `shape_type.has_z()`, and the M range is `Some`
/// iff `shape_type.has_m()`. An absent range is not the same as a `0.0`
/// range: writers fill the unused slots with zeroes, and we don't pass those
/// along.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FileHeader {
    /// Total length of the file, in bytes, header included.
    pub file_n_bytes: usize,
    pub version: i32,
    pub shape_type: ShapeType,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,
    pub min_m: Option<f64>,
    pub max_m: Option<f64>,
}

impl FileHeader {
    pub fn bounding_box(&self) -> ShpBoundingBox {
        ShpBoundingBox {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: self.max_x,
            max_y: self.max_y,
        }
    }

    pub fn z_range(&self) -> Option<(f64, f64)> {
        match (self.min_z, self.max_z) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    pub fn m_range(&self) -> Option<(f64, f64)> {
        match (self.min_m, self.max_m) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// Bytes after the header: the budget for the record loop.
    pub fn n_body_bytes(&self) -> usize {
        self.file_n_bytes - SHP_HEADER_LENGTH
    }
}

/// Decodes the 100-byte header from a buffer.
pub fn parse_file_header(buf: &[u8; SHP_HEADER_LENGTH]) -> Result<FileHeader, ShpError> {
    let magic_number = BigEndian::read_u32(&buf[0..4]);
    if magic_number != SHP_MAGIC_NUMBER {
        return Err(ShpError::BadMagic(magic_number));
    }

    // buf[4..24] is five unused big-endian integers
    let file_len_words = BigEndian::read_u32(&buf[24..28]);
    let version = LittleEndian::read_i32(&buf[28..32]);
    let shape_type_code = LittleEndian::read_i32(&buf[32..36]);

    let shape_type = match ShapeType::from_code(shape_type_code) {
        Some(shape_type) => shape_type,
        None => return Err(ShpError::UnsupportedShapeType(shape_type_code)),
    };

    let file_n_bytes = codec::words_to_bytes(file_len_words);
    if file_n_bytes < SHP_HEADER_LENGTH {
        return Err(ShpError::ParseError(format!("File header says the file is {} bytes long, but the header alone is {} bytes", file_n_bytes, SHP_HEADER_LENGTH)));
    }

    let bounding_box = codec::read_box(buf, 36);

    let (min_z, max_z) = if shape_type.has_z() {
        (Some(LittleEndian::read_f64(&buf[68..76])), Some(LittleEndian::read_f64(&buf[76..84])))
    } else {
        (None, None)
    };

    let (min_m, max_m) = if shape_type.has_m() {
        (Some(LittleEndian::read_f64(&buf[84..92])), Some(LittleEndian::read_f64(&buf[92..100])))
    } else {
        (None, None)
    };

    Ok(FileHeader {
        file_n_bytes: file_n_bytes,
        version: version,
        shape_type: shape_type,
        min_x: bounding_box.min_x,
        min_y: bounding_box.min_y,
        max_x: bounding_box.max_x,
        max_y: bounding_box.max_y,
        min_z: min_z,
        max_z: max_z,
        min_m: min_m,
        max_m: max_m,
    })
}

/// Reads the first 100 bytes of the file.
///
/// Side-effect: advances the file cursor 100 bytes.
pub fn read_file_header(file: &mut dyn io::Read) -> Result<FileHeader, ShpError> {
    let mut buf = [ 0u8; SHP_HEADER_LENGTH ];
    codec::read_exact_or(file, &mut buf, || ShpError::TruncatedHeader, ShpError::IOError)?;

    let header = parse_file_header(&buf)?;
    debug!("Read header: {} bytes, version {}, shape type {}", header.file_n_bytes, header.version, header.shape_type);
    Ok(header)
}
