//! Reads ".shp", ".shx" and ".dbf" files.
//!
//! Each file is parsed on its own. Record N of the ".shp" file, index record
//! N of the ".shx" file and row N of the ".dbf" file describe the same
//! feature, but nothing here joins them: that's up to the caller.
//!
//! There are two pieces of information these files _don't_ contain:
//!
//! * The _projection_ isn't specified. Sometimes there's a ".prj" file that
//!   contains that information, but no file format can represent all the
//!   projections out there in the world. This library ignores the file and
//!   returns `f64` points.
//! * The ".dbf" _text encoding_ is only hinted at by a code-page byte. This
//!   library exposes that byte but makes the caller pick an encoding.
//!
//! # Examples
//!
//! Stream geometries:
//!
//! ```no_run
//! use std::path::Path;
//! use shpread::read::shapefile::shp;
//!
//! let reader = shp::open(Path::new("simplepoint.shp")).unwrap();
//!
//! for record in reader {
//!     // record is a Result<ShpRecord, ShpError>
//!     println!("{:?}", record.unwrap().geometry);
//! }
//! ```
//!
//! Read geometries and attributes from `io::Read` implementors (works best
//! with `io::BufReader`):
//!
//! ```no_run
//! # extern crate encoding;
//! # extern crate shpread;
//!
//! # fn main() {
//! use std::fs;
//! use std::io;
//! use shpread::read::shapefile::{DataBaseFile, Shapefile};
//!
//! let shp_r = io::BufReader::new(fs::File::open("simplepoint.shp").unwrap());
//! let dbf_r = io::BufReader::new(fs::File::open("simplepoint.dbf").unwrap());
//!
//! let shapefile = Shapefile::from_reader(shp_r).unwrap();
//! let dbf = DataBaseFile::from_reader(dbf_r, encoding::all::UTF_8).unwrap();
//!
//! for (shape, row) in shapefile.records().iter().zip(dbf.records()) {
//!     println!("{:?}: {:?}", shape.geometry, row.get_string("Name"));
//! }
//! # }
//! ```
//!
//! Dump DBF data:
//!
//! ```no_run
//! use std::path::Path;
//! use shpread::read::shapefile;
//!
//! let reader = shapefile::open_windows1252(Path::new("simplepoint.dbf")).unwrap();
//!
//! let fields = reader.dbf_fields();
//!
//! for record_result in reader {
//!     let record = record_result.unwrap();
//!
//!     for field in fields.iter() {
//!         let value_result = field.read_string(&record);
//!         print!("{}: {}; ", field.name, value_result.unwrap());
//!     }
//!     println!("");
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;
use encoding;

pub mod codec;
pub mod dbf;
pub mod header;
pub mod shape_type;
pub mod shp;
pub mod shx;

#[cfg(test)]
mod fixtures;

pub use self::dbf::{DataBaseFile, DbfError, DbfField, DbfFieldType, DbfReader, DbfRecord};
pub use self::header::{FileHeader, ShpBoundingBox, ShpError};
pub use self::shape_type::ShapeType;
pub use self::shp::{Shapefile, ShpGeometry, ShpPolyLine, ShpReader, ShpRecord};
pub use self::shx::{IndexRecord, ShapeIndex, ShxReader};

pub fn open_ascii(dbf_path: &Path) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    dbf::open(dbf_path, encoding::all::ASCII)
}

pub fn open_utf8(dbf_path: &Path) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    dbf::open(dbf_path, encoding::all::UTF_8)
}

pub fn open_windows1252(dbf_path: &Path) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    dbf::open(dbf_path, encoding::all::WINDOWS_1252)
}
