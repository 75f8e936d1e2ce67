//! Reads ESRI ".shp" Shapefile, as per
//! https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf

use std::fs;
use std::io;
use std::path::Path;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use itertools::Itertools;
use geo::{LineString, Point};
use super::codec;
use super::header::{self, FileHeader, ShpBoundingBox, ShpError, SHP_HEADER_LENGTH};
use super::shape_type::ShapeType;

const SHP_RECORD_HEADER_LENGTH: usize = 8;
const SHP_SHAPE_TYPE_LENGTH: usize = 4;
const SHP_POINT_LENGTH: usize = 16;
const SHP_DOUBLE_LENGTH: usize = 8;
/// Bounding box, numParts, numPoints.
const SHP_POLYLINE_HEADER_LENGTH: usize = codec::BOX_LENGTH + 8;

/// A decoded PolyLine or PolyLineM record.
#[derive(Debug, Clone, PartialEq)]
pub struct ShpPolyLine {
    pub bounding_box: ShpBoundingBox,
    /// `(min, max)` for PolyLineM records; `None` for PolyLine.
    pub m_range: Option<(f64, f64)>,
    pub line_string: LineString,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShpGeometry {
    Null,
    Point(Point),
    PolyLine(ShpPolyLine),
    /// Polygon, MultiPoint, MultiPatch, PolyLineZ and the like: the record
    /// was skipped by its declared length, so what follows is still aligned,
    /// but its content isn't available.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShpRecord {
    /// 1-based, as written. Informational: nothing checks the sequence.
    pub record_number: u32,
    /// The record's own shape type. This wins over the file header's.
    pub shape_type: ShapeType,
    /// Bytes after the 8-byte record header, shape type included.
    pub content_length: usize,
    pub geometry: ShpGeometry,
}

fn truncated(record_number: u32) -> ShpError {
    ShpError::TruncatedRecord { record_number: record_number }
}

/// Reads `n` little-endian doubles from the start of `buf`.
fn read_f64s(buf: &[u8], n: usize, record_number: u32) -> Result<Vec<f64>, ShpError> {
    if buf.len() < n * SHP_DOUBLE_LENGTH {
        return Err(truncated(record_number));
    }

    Ok(buf[.. n * SHP_DOUBLE_LENGTH].chunks(SHP_DOUBLE_LENGTH)
        .map(LittleEndian::read_f64)
        .collect())
}

fn read_count(buf: &[u8], what: &str, record_number: u32) -> Result<usize, ShpError> {
    let n = LittleEndian::read_i32(buf);
    if n <= 0 {
        Err(ShpError::ParseError(format!("Record number {} has {} {}", record_number, n, what)))
    } else {
        Ok(n as usize)
    }
}

/// Parses a PolyLine (or, with `with_m`, PolyLineM) after its shape type.
///
/// Layout: box, numParts, numPoints, parts[numParts], points[numPoints];
/// then for M: mMin, mMax, m[numPoints].
fn parse_polyline(buf: &[u8], with_m: bool, record_number: u32) -> Result<ShpPolyLine, ShpError> {
    if buf.len() < SHP_POLYLINE_HEADER_LENGTH {
        return Err(truncated(record_number));
    }

    let bounding_box = codec::read_box(buf, 0);
    let num_parts = read_count(&buf[32..36], "parts", record_number)?;
    let num_points = read_count(&buf[36..40], "points", record_number)?;

    let parts_start = SHP_POLYLINE_HEADER_LENGTH;
    let points_start = parts_start + 4 * num_parts;
    let m_start = points_start + SHP_POINT_LENGTH * num_points;
    let needed_len = if with_m {
        m_start + SHP_DOUBLE_LENGTH * (2 + num_points)
    } else {
        m_start
    };
    if buf.len() < needed_len {
        return Err(truncated(record_number));
    }

    if num_parts > 1 {
        return Err(ShpError::UnsupportedMultiPart { record_number: record_number, num_parts: num_parts });
    }

    let part_start = LittleEndian::read_i32(&buf[parts_start .. parts_start + 4]);
    if part_start != 0 {
        warn!("Record number {} has its only part starting at point {}; reading all {} points", record_number, part_start, num_points);
    }

    let xys = buf[points_start .. m_start].chunks(SHP_POINT_LENGTH)
        .map(|b| Point::new(LittleEndian::read_f64(&b[0..8]), LittleEndian::read_f64(&b[8..16])));

    let (m_range, points): (Option<(f64, f64)>, Vec<Point>) = if with_m {
        let ms = read_f64s(&buf[m_start ..], 2 + num_points, record_number)?;
        let points: Vec<Point> = xys.zip_eq(ms[2..].iter()).map(|(p, &m)| p.with_m(m)).collect();
        (Some((ms[0], ms[1])), points)
    } else {
        (None, xys.collect())
    };

    let line_string = LineString::new(points)
        .map_err(|err| ShpError::ParseError(format!("Record number {}: {}", record_number, err)))?;

    Ok(ShpPolyLine {
        bounding_box: bounding_box,
        m_range: m_range,
        line_string: line_string,
    })
}

/// Parses one record's content: everything after the record header.
fn parse_record(buf: &[u8], record_number: u32, file_shape_type: ShapeType) -> Result<ShpRecord, ShpError> {
    let shape_type_code = LittleEndian::read_i32(&buf[0..4]);
    let shape_type = match ShapeType::from_code(shape_type_code) {
        Some(shape_type) => shape_type,
        None => return Err(ShpError::UnsupportedShapeType(shape_type_code)),
    };

    if shape_type != file_shape_type && shape_type != ShapeType::NullShape {
        warn!("Record number {} has shape type {}, but the file header says {}", record_number, shape_type, file_shape_type);
    }

    let body = &buf[SHP_SHAPE_TYPE_LENGTH ..];
    let geometry = match shape_type {
        ShapeType::NullShape => ShpGeometry::Null,
        ShapeType::Point => {
            let v = read_f64s(body, 2, record_number)?;
            ShpGeometry::Point(Point::new(v[0], v[1]))
        }
        ShapeType::PointM => {
            let v = read_f64s(body, 3, record_number)?;
            ShpGeometry::Point(Point::from_xym(v[0], v[1], v[2]))
        }
        // PointZ may omit M. Only the record length says whether it's there.
        ShapeType::PointZ if body.len() >= 4 * SHP_DOUBLE_LENGTH => {
            let v = read_f64s(body, 4, record_number)?;
            ShpGeometry::Point(Point::from_xyzm(v[0], v[1], v[2], v[3]))
        }
        ShapeType::PointZ => {
            let v = read_f64s(body, 3, record_number)?;
            ShpGeometry::Point(Point::from_xyz(v[0], v[1], v[2]))
        }
        ShapeType::PolyLine => ShpGeometry::PolyLine(parse_polyline(body, false, record_number)?),
        ShapeType::PolyLineM => ShpGeometry::PolyLine(parse_polyline(body, true, record_number)?),
        _ => {
            debug!("Record number {}: skipping {} bytes of {}", record_number, body.len(), shape_type);
            ShpGeometry::Unsupported
        }
    };

    Ok(ShpRecord {
        record_number: record_number,
        shape_type: shape_type,
        content_length: buf.len(),
        geometry: geometry,
    })
}

/// Streams records from an ESRI ".shp" Shapefile.
///
/// The reader stops once it has consumed as many bytes as the file header
/// declares. Errors are terminal: after the first `Err`, `next()` returns
/// `None`.
///
/// # Example
///
/// ```no_run
/// use std::fs;
/// use std::io;
/// use shpread::read::shapefile::shp::{ShpGeometry, ShpReader};
///
/// let f = fs::File::open("simplepoint.shp").unwrap();
/// let r = io::BufReader::new(f);
///
/// // builder returns Result<ShpReader, ShpError>
/// let shp_reader = ShpReader::new(r).unwrap();
///
/// for record in shp_reader {
///     // record is a Result<ShpRecord, ShpError>
///     if let ShpGeometry::Point(point) = record.unwrap().geometry {
///         println!("{}", point);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct ShpReader<R: io::Read> {
    file: R,
    pub n_bytes_already_read: usize,
    pub n_records_already_read: usize,
    pub header: FileHeader,
    failed: bool,
}

impl<R: io::Read> ShpReader<R> {
    pub fn new(mut file: R) -> Result<ShpReader<R>, ShpError> {
        let header = header::read_file_header(&mut file)?;

        Ok(ShpReader {
            file: file,
            n_bytes_already_read: SHP_HEADER_LENGTH,
            n_records_already_read: 0,
            header: header,
            failed: false,
        })
    }

    /// Reads the next record and returns it.
    ///
    /// Side effect: advances the file cursor past the record.
    fn read_record(&mut self) -> Result<ShpRecord, ShpError> {
        let bytes_remaining = self.header.file_n_bytes - self.n_bytes_already_read;
        let expected_record_number = self.n_records_already_read as u32 + 1;

        if bytes_remaining < SHP_RECORD_HEADER_LENGTH {
            return Err(truncated(expected_record_number));
        }

        let mut header_buf = [ 0u8; SHP_RECORD_HEADER_LENGTH ];
        codec::read_exact_or(&mut self.file, &mut header_buf, || truncated(expected_record_number), ShpError::IOError)?;

        let record_number = BigEndian::read_u32(&header_buf[0..4]);
        let content_length = codec::words_to_bytes(BigEndian::read_u32(&header_buf[4..8]));

        if SHP_RECORD_HEADER_LENGTH + content_length > bytes_remaining {
            return Err(truncated(record_number));
        }

        if content_length < SHP_SHAPE_TYPE_LENGTH {
            return Err(ShpError::ParseError(format!("Record number {} has {} bytes of content, which can't hold a shape type", record_number, content_length)));
        }

        let mut buf = vec![ 0u8; content_length ];
        codec::read_exact_or(&mut self.file, &mut buf, || truncated(record_number), ShpError::IOError)?;

        self.n_bytes_already_read += SHP_RECORD_HEADER_LENGTH + content_length;
        self.n_records_already_read += 1;

        let record = parse_record(&buf, record_number, self.header.shape_type)?;
        trace!("Read record number {}: {}, {} bytes", record.record_number, record.shape_type, record.content_length);
        Ok(record)
    }
}

impl<R: io::Read> Iterator for ShpReader<R> {
    type Item = Result<ShpRecord, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.n_bytes_already_read >= self.header.file_n_bytes {
            None
        } else {
            let ret = self.read_record();
            self.failed = ret.is_err();
            Some(ret)
        }
    }
}

/// A fully-read ".shp" file.
#[derive(Debug, Clone, PartialEq)]
pub struct Shapefile {
    header: FileHeader,
    records: Vec<ShpRecord>,
}

impl Shapefile {
    /// Reads the whole stream. Any error aborts the read.
    pub fn from_reader<R: io::Read>(r: R) -> Result<Shapefile, ShpError> {
        let reader = ShpReader::new(r)?;
        let header = reader.header;
        let records = reader.collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} records", records.len());

        Ok(Shapefile {
            header: header,
            records: records,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn records(&self) -> &[ShpRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ShpRecord> {
        self.records
    }
}

/// Opens an ESRI ".shp" Shapefile from the filesystem.
pub fn open(path: &Path) -> Result<ShpReader<io::BufReader<fs::File>>, ShpError> {
    let f = fs::File::open(path)?;
    ShpReader::new(io::BufReader::new(f))
}
