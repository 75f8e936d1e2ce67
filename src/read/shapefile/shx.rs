//! Reads ESRI ".shx" shape index files, as per
//! https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf

use std::fs;
use std::io;
use std::path::Path;
use byteorder::{BigEndian, ByteOrder};
use super::codec;
use super::header::{self, FileHeader, ShpError, SHP_HEADER_LENGTH};

const SHX_RECORD_LENGTH: usize = 8;

/// Where one ".shp" record lives.
///
/// Index record N describes ".shp" record N and ".dbf" row N. Nothing checks
/// that: the only link is position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    /// Byte offset of the record header within the ".shp" file.
    pub offset: usize,
    /// Bytes of record content, excluding the 8-byte record header.
    pub content_length: usize,
}

impl IndexRecord {
    /// The offset as stored on disk, in 16-bit words.
    pub fn offset_words(&self) -> usize {
        self.offset / 2
    }

    pub fn content_length_words(&self) -> usize {
        self.content_length / 2
    }
}

fn parse_index_record(buf: &[u8]) -> IndexRecord {
    IndexRecord {
        offset: codec::words_to_bytes(BigEndian::read_u32(&buf[0..4])),
        content_length: codec::words_to_bytes(BigEndian::read_u32(&buf[4..8])),
    }
}

/// Streams index records from a ".shx" file.
///
/// # Example
///
/// ```
/// use std::io;
/// use shpread::read::shapefile::shx::ShxReader;
///
/// # let bytes: Vec<u8> = vec![
/// #     0, 0, 0x27, 0x0a, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
/// #     0, 0, 0, 54, 0xe8, 0x03, 0, 0, 1, 0, 0, 0,
/// #     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
/// #     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
/// #     0, 0, 0, 50, 0, 0, 0, 10,
/// # ];
/// let mut shx_reader = ShxReader::new(io::Cursor::new(bytes)).unwrap();
///
/// assert_eq!(108, shx_reader.header.file_n_bytes);
///
/// let record = shx_reader.next().unwrap().unwrap();
/// assert_eq!(100, record.offset);
/// assert_eq!(20, record.content_length);
/// assert!(shx_reader.next().is_none());
/// ```
#[derive(Debug)]
pub struct ShxReader<R: io::Read> {
    file: R,
    pub n_bytes_already_read: usize,
    pub header: FileHeader,
    failed: bool,
}

impl<R: io::Read> ShxReader<R> {
    pub fn new(mut file: R) -> Result<ShxReader<R>, ShpError> {
        let header = header::read_file_header(&mut file)?;

        let n_body_bytes = header.n_body_bytes();
        if n_body_bytes % SHX_RECORD_LENGTH != 0 {
            return Err(ShpError::TruncatedIndex { bytes_remaining: n_body_bytes % SHX_RECORD_LENGTH });
        }

        Ok(ShxReader {
            file: file,
            n_bytes_already_read: SHP_HEADER_LENGTH,
            header: header,
            failed: false,
        })
    }

    fn read_index_record(&mut self) -> Result<IndexRecord, ShpError> {
        let mut buf = [ 0u8; SHX_RECORD_LENGTH ];
        let bytes_remaining = self.header.file_n_bytes - self.n_bytes_already_read;
        codec::read_exact_or(&mut self.file, &mut buf, || ShpError::TruncatedIndex { bytes_remaining: bytes_remaining }, ShpError::IOError)?;
        self.n_bytes_already_read += SHX_RECORD_LENGTH;
        Ok(parse_index_record(&buf))
    }
}

impl<R: io::Read> Iterator for ShxReader<R> {
    type Item = Result<IndexRecord, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.n_bytes_already_read >= self.header.file_n_bytes {
            None
        } else {
            let ret = self.read_index_record();
            self.failed = ret.is_err();
            Some(ret)
        }
    }
}

/// A fully-read ".shx" file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeIndex {
    header: FileHeader,
    index_records: Vec<IndexRecord>,
}

impl ShapeIndex {
    /// Reads the whole stream. Any error aborts the read.
    pub fn from_reader<R: io::Read>(r: R) -> Result<ShapeIndex, ShpError> {
        let reader = ShxReader::new(r)?;
        let header = reader.header;
        let index_records = reader.collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} index records", index_records.len());

        Ok(ShapeIndex {
            header: header,
            index_records: index_records,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn index_records(&self) -> &[IndexRecord] {
        &self.index_records
    }

    pub fn into_index_records(self) -> Vec<IndexRecord> {
        self.index_records
    }
}

/// Opens an ESRI ".shx" index from the filesystem.
pub fn open(path: &Path) -> Result<ShxReader<io::BufReader<fs::File>>, ShpError> {
    let f = fs::File::open(path)?;
    ShxReader::new(io::BufReader::new(f))
}
