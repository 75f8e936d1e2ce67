//! Reads xbase ".dbf" file, as per
//! https://www.clicketyclick.dk/databases/xbase/format/dbf.html

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use encoding;
use encoding::{DecoderTrap, EncodingRef};
use super::codec;

const DBF_HEADER_LENGTH: usize = 32;
const DBF_FIELD_DESCRIPTOR_LENGTH: usize = 32;
const DBF_HEADER_TERMINATOR: u8 = 0x0d;
const DBF_DELETED_FLAG: u8 = b'*';

#[derive(Debug)]
pub enum DbfError {
    IOError(io::Error),
    TruncatedHeader,
    TruncatedRecord { record_index: u64 },
    BadFieldType(u8),
    ParseError(String),
}

impl error::Error for DbfError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DbfError::IOError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DbfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DbfError::IOError(ref err) => err.fmt(f),
            DbfError::TruncatedHeader => write!(f, "File ended before the end of its header"),
            DbfError::TruncatedRecord { record_index } => write!(f, "File ended inside record {}", record_index),
            DbfError::BadFieldType(b) => write!(f, "Cannot parse 0x{:02x} as a field type", b),
            DbfError::ParseError(ref description) => write!(f, "Parse error: {}", description),
        }
    }
}

impl From<io::Error> for DbfError {
    fn from(err: io::Error) -> DbfError {
        DbfError::IOError(err)
    }
}

/// Column type, encoded on disk as one ASCII letter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DbfFieldType {
    Character,
    Date,
    Float,
    /// Usually integers.
    Numeric,
}

impl DbfFieldType {
    pub fn from_byte(b: u8) -> Result<DbfFieldType, DbfError> {
        match b {
            b'C' => Ok(DbfFieldType::Character),
            b'D' => Ok(DbfFieldType::Date),
            b'F' => Ok(DbfFieldType::Float),
            b'N' => Ok(DbfFieldType::Numeric),
            _ => Err(DbfError::BadFieldType(b)),
        }
    }

    pub fn encoded_value(&self) -> u8 {
        match *self {
            DbfFieldType::Character => b'C',
            DbfFieldType::Date => b'D',
            DbfFieldType::Float => b'F',
            DbfFieldType::Numeric => b'N',
        }
    }

    pub fn short_code(&self) -> char {
        self.encoded_value() as char
    }

    pub fn name(&self) -> &'static str {
        match *self {
            DbfFieldType::Character => "Character",
            DbfFieldType::Date => "Date",
            DbfFieldType::Float => "Float",
            DbfFieldType::Numeric => "Numeric",
        }
    }
}

/// One column, from the header's field descriptor array.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfField {
    pub name: String,
    pub field_type: DbfFieldType,
    /// Where this field's bytes start within a record (the deleted flag is
    /// byte 0).
    pub offset: usize,
    pub len: usize,
    pub decimal_count: u8,
}

impl DbfField {
    /// Decodes this field's bytes in `record` with the reader's encoding.
    ///
    /// Padding (spaces and NULs) is trimmed from both ends. There is no
    /// conversion to numbers or dates.
    pub fn read_string(&self, record: &DbfRecord) -> Result<String, DbfError> {
        let bytes = match record.bytes.get(self.offset .. self.offset + self.len) {
            Some(bytes) => bytes,
            None => return Err(DbfError::ParseError(format!("Field {} does not fit in a {}-byte record", self.name, record.bytes.len()))),
        };
        let encoding = record.meta.encoding;

        match encoding.decode(bytes, DecoderTrap::Strict) {
            Ok(s) => Ok(s.trim_matches(|c: char| c == ' ' || c == '\0').to_string()),
            Err(err) => Err(DbfError::ParseError(format!("Field {} is not valid {}: {}", self.name, encoding.name(), err))),
        }
    }
}

impl fmt::Display for DbfField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}) - {}, {}", self.name, self.field_type.short_code(), self.len, self.decimal_count)
    }
}

/// Last-update date. Not checked against the calendar: month 13 is allowed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DbfDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    pub file_type: u8,
    pub last_update: DbfDate,
    pub n_records: u64,
    pub n_header_bytes: usize,
    pub n_bytes_per_record: usize,
    pub table_flags: u8,
    /// Read, but never applied: text is decoded with the encoding the
    /// caller chooses.
    pub code_page_mark: u8,
}

pub struct DbfMeta {
    pub header: DbfHeader,
    pub fields: Box<[DbfField]>,
    encoding: EncodingRef,
}

// encoding::EncodingRef does not implement std::fmt::Debug
impl fmt::Debug for DbfMeta {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("DbfMeta")
            .field("header", &self.header)
            .field("fields", &self.fields)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

impl PartialEq for DbfMeta {
    fn eq(&self, other: &DbfMeta) -> bool {
        self.header == other.header
            && self.fields == other.fields
            && self.encoding.name() == other.encoding.name()
    }
}

impl DbfMeta {
    pub fn encoding(&self) -> EncodingRef {
        self.encoding
    }

    pub fn get_field(&self, name: &str) -> Option<&DbfField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One row. Deleted rows are returned like any other; check `is_deleted()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfRecord {
    meta: Arc<DbfMeta>,
    pub deleted_flag: u8,
    bytes: Box<[u8]>,
}

impl DbfRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_flag == DBF_DELETED_FLAG
    }

    /// Raw field payloads, in field-definition order.
    pub fn fields(&self) -> Vec<&[u8]> {
        self.meta.fields.iter()
            .map(|f| &self.bytes[f.offset .. f.offset + f.len])
            .collect()
    }

    pub fn field_bytes(&self, name: &str) -> Option<&[u8]> {
        self.meta.get_field(name).map(|f| &self.bytes[f.offset .. f.offset + f.len])
    }

    pub fn get_string(&self, name: &str) -> Option<Result<String, DbfError>> {
        self.meta.get_field(name).map(|f| f.read_string(self))
    }
}

/// Reads the first 32 bytes of the file.
///
/// Side-effect: advances the file cursor 32 bytes.
fn read_dbf_header(file: &mut dyn io::Read) -> Result<DbfHeader, DbfError> {
    let mut buf = [ 0u8; DBF_HEADER_LENGTH ];
    codec::read_exact_or(file, &mut buf, || DbfError::TruncatedHeader, DbfError::IOError)?;

    let header = DbfHeader {
        file_type: buf[0],
        last_update: DbfDate {
            year: 1900 + buf[1] as u16,
            month: buf[2],
            day: buf[3],
        },
        n_records: codec::read_u32_le(&buf[4..8]),
        n_header_bytes: codec::read_u16_le(&buf[8..10]) as usize,
        n_bytes_per_record: codec::read_u16_le(&buf[10..12]) as usize,
        table_flags: buf[28],
        code_page_mark: buf[29],
    };

    if header.n_header_bytes < DBF_HEADER_LENGTH + 1 {
        return Err(DbfError::ParseError(format!("Header claims to be {} bytes long, but it needs at least {}", header.n_header_bytes, DBF_HEADER_LENGTH + 1)));
    }

    debug!("Read DBF header: type 0x{:02x}, {} records, {} header bytes, {} bytes per record, code page 0x{:02x}",
           header.file_type, header.n_records, header.n_header_bytes, header.n_bytes_per_record, header.code_page_mark);
    Ok(header)
}

fn parse_dbf_field(buf: &[u8], offset: usize, encoding: EncodingRef) -> Result<DbfField, DbfError> {
    let name_bytes = match buf[0..11].iter().position(|&b| b == 0) {
        Some(end) => &buf[0..end],
        None => &buf[0..11],
    };
    let name = match encoding.decode(name_bytes, DecoderTrap::Replace) {
        Ok(name) => name.trim().to_string(),
        Err(err) => return Err(DbfError::ParseError(format!("Field name is not valid {}: {}", encoding.name(), err))),
    };

    Ok(DbfField {
        name: name,
        field_type: DbfFieldType::from_byte(buf[11])?,
        offset: offset,
        len: buf[16] as usize,
        decimal_count: buf[17],
    })
}

/// Reads all field definitions from the file.
///
/// Assumes exactly DBF_HEADER_LENGTH bytes of the file have been read already.
/// In other words, call this after read_dbf_header().
///
/// Side-effect: advances the file cursor to the first data record.
fn read_dbf_fields(file: &mut dyn io::Read, dbf_header: &DbfHeader, encoding: EncodingRef) -> Result<Box<[DbfField]>, DbfError> {
    let mut buf = vec![ 0u8; dbf_header.n_header_bytes - DBF_HEADER_LENGTH ];
    codec::read_exact_or(file, &mut buf, || DbfError::TruncatedHeader, DbfError::IOError)?;

    let n_fields = (dbf_header.n_header_bytes - DBF_HEADER_LENGTH - 1) / DBF_FIELD_DESCRIPTOR_LENGTH;
    let mut fields = Vec::with_capacity(n_fields);
    let mut offset = 1; // after the deleted flag

    for chunk in buf.chunks(DBF_FIELD_DESCRIPTOR_LENGTH).take(n_fields) {
        let field = parse_dbf_field(chunk, offset, encoding)?;
        debug!("Read field definition: {}", field);
        offset += field.len;
        fields.push(field);
    }

    let terminator = buf[n_fields * DBF_FIELD_DESCRIPTOR_LENGTH];
    if terminator != DBF_HEADER_TERMINATOR {
        warn!("Field descriptors end with 0x{:02x}, expected 0x{:02x}", terminator, DBF_HEADER_TERMINATOR);
    }

    if offset > dbf_header.n_bytes_per_record {
        return Err(DbfError::ParseError(format!("Fields need {} bytes per record, but the header says records are {} bytes", offset, dbf_header.n_bytes_per_record)));
    }

    Ok(fields.into_boxed_slice())
}

/// Reads the header, including field definitions, from a .dbf file.
///
/// Assumes the cursor is at the start of the file.
///
/// Side-effect: advances the file cursor to the first data record.
fn read_dbf_meta(file: &mut dyn io::Read, encoding: EncodingRef) -> Result<DbfMeta, DbfError> {
    let header = read_dbf_header(file)?;
    let fields = read_dbf_fields(file, &header, encoding)?;

    Ok(DbfMeta {
        header: header,
        fields: fields,
        encoding: encoding,
    })
}

/// Reads a single record from a .dbf file.
///
/// Assumes the cursor is at the start of the record and that the record
/// "should" exist (i.e., the header leads us to believe there's a record
/// here).
///
/// Side-effect: advances the file cursor to the next record.
fn read_dbf_record(file: &mut dyn io::Read, dbf_meta: Arc<DbfMeta>, record_index: u64) -> Result<DbfRecord, DbfError> {
    let mut buf = vec![ 0u8; dbf_meta.header.n_bytes_per_record ];
    codec::read_exact_or(file, &mut buf, || DbfError::TruncatedRecord { record_index: record_index }, DbfError::IOError)?;

    Ok(DbfRecord {
        meta: dbf_meta,
        deleted_flag: buf[0],
        bytes: buf.into_boxed_slice(),
    })
}

/// Reads an xBase ".dbf" file, following instructions at
/// https://www.clicketyclick.dk/databases/xbase/format/dbf.html
///
/// # Example
///
/// ```no_run
/// # extern crate encoding;
/// # extern crate shpread;
///
/// # fn main() {
/// use std::fs;
/// use std::io;
/// use shpread::read::shapefile::dbf::DbfReader;
///
/// let f = io::BufReader::new(fs::File::open("simplepoint.dbf").unwrap());
/// let dbf_reader = DbfReader::new(f, encoding::all::WINDOWS_1252).unwrap();
/// let fields = dbf_reader.dbf_fields();
///
/// for record in dbf_reader {
///     let record = record.unwrap();
///     for field in fields.iter() {
///         print!("{}: {}; ", field.name, field.read_string(&record).unwrap());
///     }
///     println!("");
/// }
/// # }
/// ```
pub struct DbfReader<R: io::Read> {
    file: R,
    n_records_already_iterated: u64,
    meta: Arc<DbfMeta>,
    failed: bool,
}

impl<R: io::Read> fmt::Debug for DbfReader<R> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("DbfReader")
            .field("n_records_already_iterated", &self.n_records_already_iterated)
            .field("meta", &self.meta)
            .finish()
    }
}

impl<R: io::Read> DbfReader<R> {
    pub fn new(mut file: R, encoding: EncodingRef) -> Result<DbfReader<R>, DbfError> {
        let meta = read_dbf_meta(&mut file, encoding)?;

        Ok(DbfReader {
            file: file,
            n_records_already_iterated: 0,
            meta: Arc::new(meta),
            failed: false,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.meta.header
    }

    pub fn dbf_fields(&self) -> Box<[DbfField]> {
        self.meta.fields.clone()
    }

    pub fn get_field(&self, name: &str) -> Option<DbfField> {
        self.meta.get_field(name).cloned()
    }
}

impl<R: io::Read> Iterator for DbfReader<R> {
    type Item = Result<DbfRecord, DbfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.n_records_already_iterated == self.meta.header.n_records {
            None
        } else {
            let ret = read_dbf_record(&mut self.file, self.meta.clone(), self.n_records_already_iterated);
            self.n_records_already_iterated += 1;
            self.failed = ret.is_err();
            Some(ret)
        }
    }
}

/// A fully-read ".dbf" file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBaseFile {
    meta: Arc<DbfMeta>,
    records: Vec<DbfRecord>,
}

impl DataBaseFile {
    /// Reads the whole stream. Any error aborts the read.
    pub fn from_reader<R: io::Read>(r: R, encoding: EncodingRef) -> Result<DataBaseFile, DbfError> {
        let reader = DbfReader::new(r, encoding)?;
        let meta = reader.meta.clone();
        let records = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(DataBaseFile {
            meta: meta,
            records: records,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.meta.header
    }

    pub fn last_update(&self) -> DbfDate {
        self.meta.header.last_update
    }

    pub fn field_definitions(&self) -> &[DbfField] {
        &self.meta.fields
    }

    pub fn records(&self) -> &[DbfRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DbfRecord> {
        self.records
    }
}

/// Opens an xBase ".dbf" file from the filesystem, following instructions at
/// https://www.clicketyclick.dk/databases/xbase/format/dbf.html
pub fn open(path: &Path, encoding: EncodingRef) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    let f = fs::File::open(path)?;
    DbfReader::new(io::BufReader::new(f), encoding)
}

pub fn open_ascii(path: &Path) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    open(path, encoding::all::ASCII)
}
