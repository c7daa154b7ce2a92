/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

use super::error::ShapeError;
use super::geometry::{ShapeGeometry, ShapeType};
use super::{Shapefile, VerifyReport};
use shapetools_common::structures::BoundingBox;

// A record passes when its bounding box holds all four corners of the crop
// rectangle. This is narrower than rectangle intersection: a record box
// straddling the crop box on one axis contains none of the corners and is
// excluded even though the rectangles overlap. Longstanding behavior,
// kept for compatibility with the files existing pipelines produce.
fn contains_all_corners(b: BoundingBox, crop_box: BoundingBox) -> bool {
    b.is_point_in_box(crop_box.x_min, crop_box.y_min)
        && b.is_point_in_box(crop_box.x_max, crop_box.y_min)
        && b.is_point_in_box(crop_box.x_min, crop_box.y_max)
        && b.is_point_in_box(crop_box.x_max, crop_box.y_max)
}

/// Copies the polygon/polyline records of `input_file` that pass the
/// four-corner test against `crop_box` into a fresh shapefile at
/// `output_file`, then repairs the output's header. Returns the repair
/// report; its `num_records` is the number of records copied.
pub fn crop_shapefile(
    input_file: &str,
    output_file: &str,
    crop_box: BoundingBox,
    verbose: bool,
) -> Result<VerifyReport, ShapeError> {
    let mut input = Shapefile::read(input_file)?;
    match input.header.shape_type {
        ShapeType::PolyLine | ShapeType::Polygon => {}
        _ => {
            return Err(ShapeError::InvalidState(format!(
                "cropping requires a PolyLine or Polygon file, not {}",
                input.header.shape_type
            )));
        }
    }

    let mut output = Shapefile::create(output_file)?;
    output.set_shape_type(input.header.shape_type)?;

    while let Some(record) = input.get_next_record()? {
        if let ShapeGeometry::Poly(ref poly) = record.geometry {
            if contains_all_corners(poly.bbox, crop_box) {
                output.add_record(&record.geometry)?;
            }
        }
    }

    output.verify(true, verbose)
}

#[cfg(test)]
mod test {
    use super::super::geometry::{PolyGeometry, ShapeGeometry, ShapeType};
    use super::super::{ShapeError, Shapefile};
    use super::{contains_all_corners, crop_shapefile};
    use shapetools_common::structures::{BoundingBox, Point2D};
    use std::fs;

    fn temp_path(name: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("shapetools_{}_{}", std::process::id(), name));
        p.to_str().unwrap().to_string()
    }

    fn box_geometry(bb: BoundingBox, is_polygon: bool) -> ShapeGeometry {
        let mut poly = PolyGeometry::new(is_polygon);
        poly.add_part(&[
            Point2D::new(bb.x_min, bb.y_min),
            Point2D::new(bb.x_max, bb.y_min),
            Point2D::new(bb.x_max, bb.y_max),
            Point2D::new(bb.x_min, bb.y_max),
        ]);
        ShapeGeometry::Poly(poly)
    }

    #[test]
    fn test_four_corner_predicate() {
        let crop_box = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        // encloses the crop window
        assert!(contains_all_corners(
            BoundingBox::new(-5.0, -5.0, 15.0, 15.0),
            crop_box
        ));
        // identical box: corners are on the edges, which are inclusive
        assert!(contains_all_corners(crop_box, crop_box));
        // straddles on x only: intersects the window but holds no corner
        assert!(!contains_all_corners(
            BoundingBox::new(-5.0, 2.0, 15.0, 8.0),
            crop_box
        ));
        // fully outside
        assert!(!contains_all_corners(
            BoundingBox::new(20.0, 20.0, 30.0, 30.0),
            crop_box
        ));
    }

    #[test]
    fn test_crop_copies_enclosing_records_only() {
        let input_path = temp_path("crop_in.shp");
        let output_path = temp_path("crop_out.shp");

        let mut input = Shapefile::create(&input_path).unwrap();
        input.set_shape_type(ShapeType::Polygon).unwrap();
        // encloses the crop window below
        input
            .add_record(&box_geometry(BoundingBox::new(-10.0, -10.0, 10.0, 10.0), true))
            .unwrap();
        // intersects it without holding all four corners
        input
            .add_record(&box_geometry(BoundingBox::new(-10.0, -1.0, 10.0, 1.0), true))
            .unwrap();
        // disjoint
        input
            .add_record(&box_geometry(BoundingBox::new(50.0, 50.0, 60.0, 60.0), true))
            .unwrap();
        // a Null record is never copied
        input.add_record(&ShapeGeometry::Null).unwrap();
        input.verify(true, false).unwrap();
        input.close();

        let crop_box = BoundingBox::new(-2.0, -2.0, 2.0, 2.0);
        let report = crop_shapefile(&input_path, &output_path, crop_box, false).unwrap();
        assert_eq!(report.num_records, 1);

        let mut output = Shapefile::read(&output_path).unwrap();
        assert_eq!(output.header.shape_type, ShapeType::Polygon);
        // the repair pass left the output header consistent
        assert_eq!(
            (output.header.x_min, output.header.y_min, output.header.x_max, output.header.y_max),
            (-10.0, -10.0, 10.0, 10.0)
        );
        let record = output.get_next_record().unwrap().unwrap();
        assert_eq!(record.record_number, 1);
        match record.geometry {
            ShapeGeometry::Poly(ref p) => {
                assert_eq!(p.bbox, BoundingBox::new(-10.0, -10.0, 10.0, 10.0))
            }
            _ => panic!("expected a polygon record"),
        }
        assert!(output.get_next_record().unwrap().is_none());

        let _ = fs::remove_file(&input_path);
        let _ = fs::remove_file(&output_path);
    }

    #[test]
    fn test_crop_preserves_polyline_type() {
        let input_path = temp_path("crop_line_in.shp");
        let output_path = temp_path("crop_line_out.shp");

        let mut input = Shapefile::create(&input_path).unwrap();
        input.set_shape_type(ShapeType::PolyLine).unwrap();
        input
            .add_record(&box_geometry(BoundingBox::new(-10.0, -10.0, 10.0, 10.0), false))
            .unwrap();
        input.verify(true, false).unwrap();
        input.close();

        crop_shapefile(
            &input_path,
            &output_path,
            BoundingBox::new(-1.0, -1.0, 1.0, 1.0),
            false,
        )
        .unwrap();
        let output = Shapefile::read(&output_path).unwrap();
        assert_eq!(output.header.shape_type, ShapeType::PolyLine);

        let _ = fs::remove_file(&input_path);
        let _ = fs::remove_file(&output_path);
    }

    #[test]
    fn test_crop_rejects_point_files() {
        let input_path = temp_path("crop_pts.shp");
        let output_path = temp_path("crop_pts_out.shp");

        let mut input = Shapefile::create(&input_path).unwrap();
        input.set_shape_type(ShapeType::Point).unwrap();
        input
            .add_record(&ShapeGeometry::Point(Point2D::new(0.0, 0.0)))
            .unwrap();
        input.verify(true, false).unwrap();
        input.close();

        let err = crop_shapefile(
            &input_path,
            &output_path,
            BoundingBox::new(-1.0, -1.0, 1.0, 1.0),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ShapeError::InvalidState(_)));

        let _ = fs::remove_file(&input_path);
        let _ = fs::remove_file(&output_path);
    }
}
