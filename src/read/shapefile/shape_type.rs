use std::fmt;

/// The kind of geometry in a ".shp" file or record.
///
/// The set is fixed by the ESRI Shapefile Technical Description, and so are
/// the (sparse) integer codes.
///
/// `has_z()` types always carry Z and _may_ carry M. `has_m()`-only types
/// (the "M" family) always carry M.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeType {
    NullShape,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

pub const ALL_SHAPE_TYPES: [ShapeType; 14] = [
    ShapeType::NullShape,
    ShapeType::Point,
    ShapeType::PolyLine,
    ShapeType::Polygon,
    ShapeType::MultiPoint,
    ShapeType::PointZ,
    ShapeType::PolyLineZ,
    ShapeType::PolygonZ,
    ShapeType::MultiPointZ,
    ShapeType::PointM,
    ShapeType::PolyLineM,
    ShapeType::PolygonM,
    ShapeType::MultiPointM,
    ShapeType::MultiPatch,
];

impl ShapeType {
    /// Looks up a type by its on-disk code. Unknown codes are `None`, never a
    /// default.
    pub fn from_code(code: i32) -> Option<ShapeType> {
        ALL_SHAPE_TYPES.iter().cloned().find(|t| t.code() == code)
    }

    pub fn code(&self) -> i32 {
        match *self {
            ShapeType::NullShape => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            ShapeType::NullShape => "Null Shape",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        }
    }

    pub fn has_z(&self) -> bool {
        match *self {
            ShapeType::PointZ
                | ShapeType::PolyLineZ
                | ShapeType::PolygonZ
                | ShapeType::MultiPointZ
                | ShapeType::MultiPatch => true,
            _ => false,
        }
    }

    /// True for every type that has room for M values, including the Z types
    /// (where M is optional).
    pub fn has_m(&self) -> bool {
        match *self {
            ShapeType::PointM
                | ShapeType::PolyLineM
                | ShapeType::PolygonM
                | ShapeType::MultiPointM => true,
            t => t.has_z(),
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::{ShapeType, ALL_SHAPE_TYPES};

    #[test]
    fn every_code_round_trips() {
        for t in ALL_SHAPE_TYPES.iter() {
            assert_eq!(Some(*t), ShapeType::from_code(t.code()));
        }
    }

    #[test]
    fn unknown_codes_are_none() {
        for code in &[ -1, 2, 4, 10, 30, 32, 0x99 ] {
            assert_eq!(None, ShapeType::from_code(*code));
        }
    }

    #[test]
    fn codes_are_esri_codes() {
        let codes: Vec<i32> = ALL_SHAPE_TYPES.iter().map(|t| t.code()).collect();
        assert_eq!(vec![ 0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31 ], codes);
    }

    #[test]
    fn dimensions() {
        assert!(!ShapeType::Point.has_z());
        assert!(!ShapeType::Point.has_m());
        assert!(ShapeType::PointZ.has_z());
        assert!(ShapeType::PointZ.has_m());
        assert!(!ShapeType::PolyLineM.has_z());
        assert!(ShapeType::PolyLineM.has_m());
        assert!(ShapeType::MultiPatch.has_z());
        assert!(!ShapeType::NullShape.has_m());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!("Null Shape", format!("{}", ShapeType::NullShape));
        assert_eq!("PolyLineM", format!("{}", ShapeType::PolyLineM));
    }
}
