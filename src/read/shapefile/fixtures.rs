//! Byte-exact ".shp", ".shx" and ".dbf" files, built in memory for tests.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use super::header::ShpBoundingBox;
use super::shape_type::ShapeType;

pub const POINT_BBOX: ShpBoundingBox = ShpBoundingBox {
    min_x: 150.473999,
    min_y: -23.376772,
    max_x: 150.519745,
    max_y: -23.319978,
};

pub const LINE_BBOX: ShpBoundingBox = ShpBoundingBox {
    min_x: 150.790347,
    min_y: -23.183681,
    max_x: 150.938363,
    max_y: -23.158527,
};

fn write_box(buf: &mut Vec<u8>, bbox: ShpBoundingBox) {
    for v in &[ bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y ] {
        buf.write_f64::<LittleEndian>(*v).unwrap();
    }
}

/// `zm_fill` goes in all four Z/M slots, whether or not the type uses them.
pub fn file_header(shape_type: ShapeType, file_n_bytes: usize, bbox: ShpBoundingBox, zm_fill: f64) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::with_capacity(100);
    buf.write_u32::<BigEndian>(9994).unwrap();
    for _ in 0..5 {
        buf.write_u32::<BigEndian>(0).unwrap();
    }
    buf.write_u32::<BigEndian>((file_n_bytes / 2) as u32).unwrap();
    buf.write_i32::<LittleEndian>(1000).unwrap();
    buf.write_i32::<LittleEndian>(shape_type.code()).unwrap();
    write_box(&mut buf, bbox);
    for _ in 0..4 {
        buf.write_f64::<LittleEndian>(zm_fill).unwrap();
    }
    buf
}

pub fn point_content(shape_type: ShapeType, values: &[f64]) -> Vec<u8> {
    let mut buf: Vec<u8> = vec![];
    buf.write_i32::<LittleEndian>(shape_type.code()).unwrap();
    for v in values {
        buf.write_f64::<LittleEndian>(*v).unwrap();
    }
    buf
}

pub fn null_content() -> Vec<u8> {
    point_content(ShapeType::NullShape, &[])
}

/// PolyLine (or PolyLineM, when `m` is given as `(min, max, values)`).
pub fn polyline_content(shape_type: ShapeType, bbox: ShpBoundingBox, parts: &[i32], points: &[(f64, f64)], m: Option<(f64, f64, &[f64])>) -> Vec<u8> {
    let mut buf: Vec<u8> = vec![];
    buf.write_i32::<LittleEndian>(shape_type.code()).unwrap();
    write_box(&mut buf, bbox);
    buf.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
    buf.write_i32::<LittleEndian>(points.len() as i32).unwrap();
    for part in parts {
        buf.write_i32::<LittleEndian>(*part).unwrap();
    }
    for &(x, y) in points {
        buf.write_f64::<LittleEndian>(x).unwrap();
        buf.write_f64::<LittleEndian>(y).unwrap();
    }
    if let Some((min, max, values)) = m {
        buf.write_f64::<LittleEndian>(min).unwrap();
        buf.write_f64::<LittleEndian>(max).unwrap();
        for v in values {
            buf.write_f64::<LittleEndian>(*v).unwrap();
        }
    }
    buf
}

/// A whole ".shp" file. The header's file length is computed from `contents`.
pub fn shp_file(shape_type: ShapeType, bbox: ShpBoundingBox, zm_fill: f64, contents: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = contents.iter().map(|c| 8 + c.len()).sum();
    let mut buf = file_header(shape_type, 100 + body_len, bbox, zm_fill);
    for (i, content) in contents.iter().enumerate() {
        buf.write_u32::<BigEndian>(i as u32 + 1).unwrap();
        buf.write_u32::<BigEndian>((content.len() / 2) as u32).unwrap();
        buf.extend_from_slice(content);
    }
    buf
}

/// A whole ".shx" file; `records` are `(offset, content length)` in 16-bit
/// words, as stored.
pub fn shx_file(shape_type: ShapeType, bbox: ShpBoundingBox, records: &[(u32, u32)]) -> Vec<u8> {
    let mut buf = file_header(shape_type, 100 + 8 * records.len(), bbox, 0.);
    for &(offset, len) in records {
        buf.write_u32::<BigEndian>(offset).unwrap();
        buf.write_u32::<BigEndian>(len).unwrap();
    }
    buf
}

pub fn simplepoint_shp() -> Vec<u8> {
    shp_file(ShapeType::Point, POINT_BBOX, 0., &[
        point_content(ShapeType::Point, &[ 150.473999, -23.376772 ]),
        point_content(ShapeType::Point, &[ 150.519745, -23.319978 ]),
    ])
}

pub fn simplepoint_shx() -> Vec<u8> {
    shx_file(ShapeType::Point, POINT_BBOX, &[ (50, 10), (64, 10) ])
}

pub fn pointm_shp() -> Vec<u8> {
    shp_file(ShapeType::PointM, POINT_BBOX, 0., &[
        point_content(ShapeType::PointM, &[ 150.473999, -23.376772, 0. ]),
        point_content(ShapeType::PointM, &[ 150.519745, -23.319978, 0. ]),
    ])
}

/// One PointZ without M and one with.
pub fn pointz_shp() -> Vec<u8> {
    shp_file(ShapeType::PointZ, POINT_BBOX, 0., &[
        point_content(ShapeType::PointZ, &[ 150.473999, -23.376772, 0. ]),
        point_content(ShapeType::PointZ, &[ 150.519745, -23.319978, 0., 0. ]),
    ])
}

pub const LINE_POINTS: [(f64, f64); 3] = [
    (150.790347, -23.158527),
    (150.864355, -23.183681),
    (150.938363, -23.170104),
];

pub fn simplelinestring_shp() -> Vec<u8> {
    shp_file(ShapeType::PolyLine, LINE_BBOX, 0., &[
        polyline_content(ShapeType::PolyLine, LINE_BBOX, &[ 0 ], &LINE_POINTS, None),
    ])
}

pub fn linestringm_shp() -> Vec<u8> {
    shp_file(ShapeType::PolyLineM, LINE_BBOX, 0., &[
        polyline_content(ShapeType::PolyLineM, LINE_BBOX, &[ 0 ], &LINE_POINTS, Some((0., 0., &[ 0., 0., 0. ][..]))),
    ])
}

pub struct DbfFieldSpec<'a> {
    pub name: &'a str,
    pub field_type: u8,
    pub len: u8,
    pub decimal_count: u8,
}

/// A whole ".dbf" file. Each row is `(deleted flag, field payloads)`; each
/// payload is space-padded on the right to its field's length.
pub fn dbf_file(fields: &[DbfFieldSpec], rows: &[(u8, Vec<&[u8]>)]) -> Vec<u8> {
    let n_header_bytes = 32 + 32 * fields.len() + 1;
    let n_bytes_per_record = 1 + fields.iter().map(|f| f.len as usize).sum::<usize>();

    let mut buf: Vec<u8> = vec![];
    buf.write_u8(0x03).unwrap();
    buf.write_u8(123).unwrap(); // 2023
    buf.write_u8(4).unwrap();
    buf.write_u8(5).unwrap();
    buf.write_u32::<LittleEndian>(rows.len() as u32).unwrap();
    buf.write_u16::<LittleEndian>(n_header_bytes as u16).unwrap();
    buf.write_u16::<LittleEndian>(n_bytes_per_record as u16).unwrap();
    buf.extend_from_slice(&[ 0u8; 16 ]);
    buf.write_u8(0).unwrap(); // table flags
    buf.write_u8(0x57).unwrap(); // code page: ANSI
    buf.extend_from_slice(&[ 0u8; 2 ]);

    for field in fields {
        let mut name = [ 0u8; 11 ];
        name[.. field.name.len()].copy_from_slice(field.name.as_bytes());
        buf.extend_from_slice(&name);
        buf.write_u8(field.field_type).unwrap();
        buf.extend_from_slice(&[ 0u8; 4 ]);
        buf.write_u8(field.len).unwrap();
        buf.write_u8(field.decimal_count).unwrap();
        buf.extend_from_slice(&[ 0u8; 14 ]);
    }
    buf.write_u8(0x0d).unwrap();

    for &(deleted_flag, ref values) in rows {
        buf.write_u8(deleted_flag).unwrap();
        for (field, value) in fields.iter().zip(values.iter()) {
            let mut padded = vec![ b' '; field.len as usize ];
            padded[.. value.len()].copy_from_slice(value);
            buf.extend_from_slice(&padded);
        }
    }
    buf.write_u8(0x1a).unwrap();
    buf
}

pub fn simplepoint_dbf_fields() -> Vec<DbfFieldSpec<'static>> {
    vec![
        DbfFieldSpec { name: "id", field_type: b'N', len: 10, decimal_count: 0 },
        DbfFieldSpec { name: "Name", field_type: b'C', len: 20, decimal_count: 0 },
    ]
}

pub fn simplepoint_dbf() -> Vec<u8> {
    dbf_file(&simplepoint_dbf_fields(), &[
        (b' ', vec![ &b"         1"[..], &b"Rockhampton"[..] ]),
        (b'*', vec![ &b"         2"[..], &b"Yeppoon"[..] ]),
    ])
}
