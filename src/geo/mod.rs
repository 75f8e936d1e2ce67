use std::error;
use std::fmt;
use itertools::Itertools;

/// A single location in coordinate space.
///
/// `x` and `y` are always present. `z` (usually elevation) and `m` (a
/// "measure", usually not a height) are optional, and `has_z()`/`has_m()`
/// only look at whether they're set. A `Point` never knows which shape type
/// it came from.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x: x, y: y, z: None, m: None }
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Point {
        Point { x: x, y: y, z: Some(z), m: None }
    }

    pub fn from_xym(x: f64, y: f64, m: f64) -> Point {
        Point { x: x, y: y, z: None, m: Some(m) }
    }

    pub fn from_xyzm(x: f64, y: f64, z: f64, m: f64) -> Point {
        Point { x: x, y: y, z: Some(z), m: Some(m) }
    }

    /// Returns a copy of this Point with `m` set (replacing any existing M).
    pub fn with_m(&self, m: f64) -> Point {
        Point { m: Some(m), ..*self }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn has_m(&self) -> bool {
        self.m.is_some()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut ret = write!(f, "({},{}", self.x, self.y);
        if let Some(z) = self.z {
            ret = ret.and_then(|_| write!(f, ",z={}", z));
        }
        if let Some(m) = self.m {
            ret = ret.and_then(|_| write!(f, ",m={}", m));
        }
        ret.and_then(|_| write!(f, ")"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStringError {
    Empty,
    MixedDimensions,
}

impl error::Error for LineStringError {}

impl fmt::Display for LineStringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LineStringError::Empty => write!(f, "A LineString needs at least one Point"),
            LineStringError::MixedDimensions => write!(f, "All Points in a LineString must agree on Z and M"),
        }
    }
}

/// An ordered path through one or more Points.
///
/// Every Point has the same `has_z()` and `has_m()`. The constructor enforces
/// that, so a LineString you're holding is never empty and never mixes 2D
/// and 3D Points.
#[derive(Clone, Debug, PartialEq)]
pub struct LineString(Box<[Point]>);

impl LineString {
    pub fn new(points: Vec<Point>) -> Result<LineString, LineStringError> {
        if points.is_empty() {
            return Err(LineStringError::Empty);
        }

        if !points.iter().map(|p| (p.has_z(), p.has_m())).all_equal() {
            return Err(LineStringError::MixedDimensions);
        }

        Ok(LineString(points.into_boxed_slice()))
    }

    pub fn num_points(&self) -> usize {
        self.0.len()
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn point_n(&self, n: usize) -> Option<&Point> {
        self.0.get(n)
    }

    pub fn has_z(&self) -> bool {
        self.0[0].has_z()
    }

    pub fn has_m(&self) -> bool {
        self.0[0].has_m()
    }

    pub fn into_points(self) -> Box<[Point]> {
        self.0
    }
}

impl fmt::Display for LineString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut ret = write!(f, "[");
        for (i, point) in self.0.iter().enumerate() {
            if i > 0 {
                ret = ret.and_then(|_| write!(f, ","));
            }
            ret = ret.and_then(|_| write!(f, "{}", point));
        }
        ret.and_then(|_| write!(f, "]"))
    }
}

#[cfg(test)]
mod test {
    use super::{LineString, LineStringError, Point};

    #[test]
    fn point_dimensions_follow_presence() {
        assert!(!Point::new(1., 2.).has_z());
        assert!(!Point::new(1., 2.).has_m());
        assert!(Point::from_xyz(1., 2., 0.).has_z());
        assert!(!Point::from_xyz(1., 2., 0.).has_m());
        assert!(Point::from_xym(1., 2., 0.).has_m());
        assert!(Point::from_xyzm(1., 2., 3., 4.).has_z());
    }

    #[test]
    fn with_m_keeps_xyz() {
        let p = Point::from_xyz(1., 2., 3.).with_m(4.);
        assert_eq!(Point::from_xyzm(1., 2., 3., 4.), p);
    }

    #[test]
    fn empty_line_string() {
        assert_eq!(Err(LineStringError::Empty), LineString::new(vec![]));
    }

    #[test]
    fn mixed_line_string() {
        assert_eq!(
            Err(LineStringError::MixedDimensions),
            LineString::new(vec![ Point::new(1., 1.), Point::from_xym(2., 2., 0.) ])
        );
    }

    #[test]
    fn line_string_accessors() {
        let line = LineString::new(vec![ Point::from_xym(1., 1., 5.), Point::from_xym(2., 2., 6.) ]).unwrap();
        assert_eq!(2, line.num_points());
        assert!(line.has_m());
        assert!(!line.has_z());
        assert_eq!(Some(&Point::from_xym(2., 2., 6.)), line.point_n(1));
        assert_eq!(None, line.point_n(2));
    }

    #[test]
    fn display() {
        let line = LineString::new(vec![ Point::new(1., 2.), Point::new(3., 4.) ]).unwrap();
        assert_eq!("[(1,2),(3,4)]", format!("{}", line));
        assert_eq!("(1,2,z=3,m=4)", format!("{}", Point::from_xyzm(1., 2., 3., 4.)));
    }
}
