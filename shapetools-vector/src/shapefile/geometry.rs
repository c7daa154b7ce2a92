/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 15/09/2022
License: MIT
*/

use super::error::ShapeError;
use shapetools_common::structures::{BoundingBox, Point2D};
use shapetools_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fmt;
use std::io::prelude::*;

/// The shape-type tag stored in the file header and inside every record
/// payload. All thirteen tags defined by the format are recognized; only
/// `Null`, `Point`, `PolyLine` and `Polygon` payloads can currently be
/// decoded or encoded. The MultiPoint family and the Z/M variants are
/// rejected with an explicit error when a record of that type is met.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeType {
    Null,
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
}

impl ShapeType {
    pub fn from_int(value: i32) -> Option<ShapeType> {
        match value {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            _ => None,
        }
    }

    pub fn to_int(&self) -> i32 {
        match *self {
            ShapeType::Null => 0,
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
        }
    }
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            ShapeType::Null => "Null",
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
        };
        write!(f, "{}", s)
    }
}

/// A polygon or polyline payload. The two share one layout on disk and are
/// told apart by the type tag, carried here as `is_polygon`.
///
/// `points` holds the vertices exactly as stored in the file; polygon ring
/// closure is applied by `part`, not by mutating the vertex list, so that a
/// decoded record re-encodes byte-for-byte.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct PolyGeometry {
    pub is_polygon: bool,
    pub bbox: BoundingBox,
    pub parts: Vec<i32>,
    pub points: Vec<Point2D>,
}

impl PolyGeometry {
    pub fn new(is_polygon: bool) -> PolyGeometry {
        PolyGeometry {
            is_polygon: is_polygon,
            bbox: BoundingBox::fresh(),
            parts: vec![],
            points: vec![],
        }
    }

    pub fn num_parts(&self) -> i32 {
        self.parts.len() as i32
    }

    pub fn num_points(&self) -> i32 {
        self.points.len() as i32
    }

    /// Appends a part, growing the bounding box to cover its vertices.
    pub fn add_part(&mut self, points: &[Point2D]) {
        self.parts.push(self.points.len() as i32);
        for p in points {
            self.points.push(*p);
            self.bbox.add_point(*p);
        }
    }

    /// Returns the vertex run of the i-th part. For polygons a closing
    /// vertex duplicating the part's first vertex is always appended, one
    /// more point than is stored in the file.
    pub fn part(&self, index: usize) -> Vec<Point2D> {
        let start = self.parts[index] as usize;
        let end = if index + 1 < self.parts.len() {
            self.parts[index + 1] as usize
        } else {
            self.points.len()
        };
        let mut pts = self.points[start..end].to_vec();
        if self.is_polygon && !pts.is_empty() {
            let first = pts[0];
            pts.push(first);
        }
        pts
    }
}

/// One record's geometry payload: a closed set of variants selected by the
/// shape-type tag.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeGeometry {
    Null,
    Point(Point2D),
    Poly(PolyGeometry),
}

impl ShapeGeometry {
    pub fn shape_type(&self) -> ShapeType {
        match *self {
            ShapeGeometry::Null => ShapeType::Null,
            ShapeGeometry::Point(_) => ShapeType::Point,
            ShapeGeometry::Poly(ref p) => {
                if p.is_polygon {
                    ShapeType::Polygon
                } else {
                    ShapeType::PolyLine
                }
            }
        }
    }

    /// The exact number of payload bytes `encode` will produce, including
    /// the leading type tag. Callers size their write buffers with this.
    pub fn get_length(&self) -> i32 {
        match *self {
            ShapeGeometry::Null => 4,
            ShapeGeometry::Point(_) => 20,
            ShapeGeometry::Poly(ref p) => 44 + 4 * p.num_parts() + 16 * p.num_points(),
        }
    }

    pub fn get_bounding_box(&self) -> BoundingBox {
        match *self {
            ShapeGeometry::Null => BoundingBox::default(),
            ShapeGeometry::Point(p) => BoundingBox::new(p.x, p.y, p.x, p.y),
            ShapeGeometry::Poly(ref p) => p.bbox,
        }
    }

    /// Decodes a record payload. The reader must be positioned at the
    /// payload start, i.e. just past the 8-byte record header, and
    /// `expected` is the file's established shape type.
    ///
    /// The type tag embedded in the payload is checked first: `Null` is
    /// accepted in any file, any other tag must equal `expected`.
    pub fn decode<R: Read + Seek>(
        bor: &mut ByteOrderReader<R>,
        expected: ShapeType,
    ) -> Result<ShapeGeometry, ShapeError> {
        bor.set_byte_order(Endianness::LittleEndian);
        let tag = bor.read_i32()?;
        let shape_type = match ShapeType::from_int(tag) {
            Some(st) => st,
            None => {
                return Err(ShapeError::Format(format!(
                    "unrecognized shape type tag {}",
                    tag
                )));
            }
        };
        if shape_type == ShapeType::Null {
            return Ok(ShapeGeometry::Null);
        }
        if shape_type != expected {
            return Err(ShapeError::Format(format!(
                "record of type {} in a file of type {}",
                shape_type, expected
            )));
        }

        match shape_type {
            ShapeType::Point => {
                let p = read_point(bor)?;
                Ok(ShapeGeometry::Point(p))
            }

            ShapeType::PolyLine | ShapeType::Polygon => {
                let bbox = read_bounding_box(bor)?;
                let num_parts = bor.read_i32()?;
                let num_points = bor.read_i32()?;
                if num_parts < 0 || num_points < 0 {
                    return Err(ShapeError::Format(format!(
                        "negative part or point count ({}, {})",
                        num_parts, num_points
                    )));
                }

                let mut sfg = PolyGeometry {
                    is_polygon: shape_type == ShapeType::Polygon,
                    bbox: bbox,
                    parts: Vec::with_capacity(num_parts as usize),
                    points: Vec::with_capacity(num_points as usize),
                };
                for _ in 0..num_parts {
                    sfg.parts.push(bor.read_i32()?);
                }
                for _ in 0..num_points {
                    sfg.points.push(read_point(bor)?);
                }
                Ok(ShapeGeometry::Poly(sfg))
            }

            _ => Err(ShapeError::Format(format!(
                "unsupported shape type {}",
                shape_type
            ))),
        }
    }

    /// The mirror of `decode`: writes the type tag and payload,
    /// `get_length()` bytes in all.
    pub fn encode<W: Write>(
        &self,
        bow: &mut ByteOrderWriter<W>,
    ) -> Result<(), std::io::Error> {
        bow.set_byte_order(Endianness::LittleEndian);
        bow.write_i32(self.shape_type().to_int())?;
        match *self {
            ShapeGeometry::Null => {}

            ShapeGeometry::Point(p) => {
                bow.write_f64(p.x)?;
                bow.write_f64(p.y)?;
            }

            ShapeGeometry::Poly(ref poly) => {
                write_bounding_box(bow, poly.bbox)?;
                bow.write_i32(poly.num_parts())?;
                bow.write_i32(poly.num_points())?;
                for part in &poly.parts {
                    bow.write_i32(*part)?;
                }
                for pt in &poly.points {
                    bow.write_f64(pt.x)?;
                    bow.write_f64(pt.y)?;
                }
            }
        }
        Ok(())
    }
}

/// Two consecutive little-endian doubles, x then y.
pub fn read_point<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<Point2D, std::io::Error> {
    Ok(Point2D {
        x: bor.read_f64()?,
        y: bor.read_f64()?,
    })
}

/// The 32-byte min/max corner pair: x_min, y_min, x_max, y_max.
pub fn read_bounding_box<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
) -> Result<BoundingBox, std::io::Error> {
    Ok(BoundingBox {
        x_min: bor.read_f64()?,
        y_min: bor.read_f64()?,
        x_max: bor.read_f64()?,
        y_max: bor.read_f64()?,
    })
}

pub fn write_bounding_box<W: Write>(
    bow: &mut ByteOrderWriter<W>,
    bbox: BoundingBox,
) -> Result<(), std::io::Error> {
    bow.write_f64(bbox.x_min)?;
    bow.write_f64(bbox.y_min)?;
    bow.write_f64(bbox.x_max)?;
    bow.write_f64(bbox.y_max)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{PolyGeometry, ShapeGeometry, ShapeType};
    use crate::shapefile::error::ShapeError;
    use shapetools_common::structures::{BoundingBox, Point2D};
    use shapetools_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
    use std::io::Cursor;

    fn encode_to_vec(geometry: &ShapeGeometry) -> Vec<u8> {
        let mut bow = ByteOrderWriter::new(vec![], Endianness::LittleEndian);
        geometry.encode(&mut bow).unwrap();
        bow.into_inner()
    }

    fn decode_from_vec(bytes: Vec<u8>, expected: ShapeType) -> Result<ShapeGeometry, ShapeError> {
        let mut bor = ByteOrderReader::new(Cursor::new(bytes), Endianness::LittleEndian).unwrap();
        ShapeGeometry::decode(&mut bor, expected)
    }

    #[test]
    fn test_shape_type_tags() {
        assert_eq!(ShapeType::from_int(5), Some(ShapeType::Polygon));
        assert_eq!(ShapeType::from_int(28), Some(ShapeType::MultiPointM));
        assert_eq!(ShapeType::from_int(2), None);
        for tag in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28].iter() {
            assert_eq!(ShapeType::from_int(*tag).unwrap().to_int(), *tag);
        }
    }

    #[test]
    fn test_point_round_trip() {
        let geometry = ShapeGeometry::Point(Point2D::new(-80.75, 43.53));
        let bytes = encode_to_vec(&geometry);
        assert_eq!(bytes.len(), geometry.get_length() as usize);
        assert_eq!(bytes.len(), 20);

        let decoded = decode_from_vec(bytes.clone(), ShapeType::Point).unwrap();
        assert_eq!(decoded, geometry);
        // and the re-encoding is byte-identical
        assert_eq!(encode_to_vec(&decoded), bytes);
    }

    #[test]
    fn test_polygon_round_trip() {
        let mut poly = PolyGeometry::new(true);
        poly.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ]);
        poly.add_part(&[
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 8.0),
            Point2D::new(8.0, 8.0),
        ]);
        let geometry = ShapeGeometry::Poly(poly);

        let bytes = encode_to_vec(&geometry);
        assert_eq!(bytes.len(), geometry.get_length() as usize);
        assert_eq!(bytes.len(), (44 + 4 * 2 + 16 * 7) as usize);

        let decoded = decode_from_vec(bytes.clone(), ShapeType::Polygon).unwrap();
        assert_eq!(decoded, geometry);
        assert_eq!(encode_to_vec(&decoded), bytes);
        assert_eq!(
            decoded.get_bounding_box(),
            BoundingBox::new(0.0, 0.0, 10.0, 10.0)
        );
    }

    #[test]
    fn test_polyline_round_trip() {
        let mut line = PolyGeometry::new(false);
        line.add_part(&[Point2D::new(-1.0, -1.0), Point2D::new(4.0, 2.5)]);
        let geometry = ShapeGeometry::Poly(line);

        let bytes = encode_to_vec(&geometry);
        let decoded = decode_from_vec(bytes, ShapeType::PolyLine).unwrap();
        assert_eq!(decoded, geometry);
        assert_eq!(decoded.shape_type(), ShapeType::PolyLine);
    }

    #[test]
    fn test_ring_closure_on_part_access() {
        let mut poly = PolyGeometry::new(true);
        poly.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        ]);
        // the stored vertex list is untouched...
        assert_eq!(poly.num_points(), 3);
        // ...but the part run carries the closing vertex
        let ring = poly.part(0);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);

        // polylines are left open
        let mut line = PolyGeometry::new(false);
        line.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        ]);
        assert_eq!(line.part(0).len(), 3);
    }

    #[test]
    fn test_null_tolerated_in_any_file() {
        let bytes = encode_to_vec(&ShapeGeometry::Null);
        assert_eq!(bytes.len(), 4);
        let decoded = decode_from_vec(bytes, ShapeType::Point).unwrap();
        assert_eq!(decoded, ShapeGeometry::Null);
    }

    #[test]
    fn test_type_mismatch_is_a_format_error() {
        let bytes = encode_to_vec(&ShapeGeometry::Point(Point2D::new(1.0, 2.0)));
        let err = decode_from_vec(bytes, ShapeType::Polygon).unwrap_err();
        assert!(matches!(err, ShapeError::Format(_)));
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        // a MultiPoint record in a MultiPoint file: tag is recognized but
        // the payload is not decodable
        let mut bow = ByteOrderWriter::new(vec![], Endianness::LittleEndian);
        bow.write_i32(ShapeType::MultiPoint.to_int()).unwrap();
        let err = decode_from_vec(bow.into_inner(), ShapeType::MultiPoint).unwrap_err();
        assert!(matches!(err, ShapeError::Format(_)));
    }

    #[test]
    fn test_unrecognized_tag_is_rejected() {
        let mut bow = ByteOrderWriter::new(vec![], Endianness::LittleEndian);
        bow.write_i32(99).unwrap();
        let err = decode_from_vec(bow.into_inner(), ShapeType::Point).unwrap_err();
        assert!(matches!(err, ShapeError::Format(_)));
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let mut bytes = encode_to_vec(&ShapeGeometry::Point(Point2D::new(1.0, 2.0)));
        bytes.truncate(12); // half the y coordinate is missing
        let err = decode_from_vec(bytes, ShapeType::Point).unwrap_err();
        assert!(matches!(err, ShapeError::Io(_)));
    }
}
