/*
This tool is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

use crate::tools::{resolve_file_name, ShapeTool};
use shapetools_common::structures::BoundingBox;
use shapetools_common::utils::get_formatted_elapsed_time;
use shapetools_vector::{crop_shapefile, ShapeError};
use std::io::{Error, ErrorKind};
use std::time::Instant;

/// Copies the records of a polygon or polyline shapefile that pass the
/// crop test against a rectangle given by its upper-left and lower-right
/// corners in decimal-degree lat,lon, then repairs the output header.
pub struct CropTool {
    name: String,
    description: String,
    example_usage: String,
}

impl CropTool {
    pub fn new() -> CropTool {
        // public constructor
        CropTool {
            name: "crop".to_string(),
            description: "Crops a polygon/polyline shapefile to a lat,lon rectangle.".to_string(),
            example_usage: "shapetools crop -ul 45.5,-81.0 -lr 43.0,-79.0 -i lakes.shp -o cropped.shp"
                .to_string(),
        }
    }
}

fn parse_lat_lon(value: &str) -> Result<(f64, f64), ShapeError> {
    let coords: Vec<&str> = value.split(",").collect();
    if coords.len() != 2 {
        return Err(ShapeError::Io(Error::new(
            ErrorKind::InvalidInput,
            format!("Expected lat,lon but found '{}'.", value),
        )));
    }
    let lat = coords[0].trim().parse::<f64>().map_err(|_| {
        ShapeError::Io(Error::new(
            ErrorKind::InvalidInput,
            format!("Could not parse latitude '{}'.", coords[0]),
        ))
    })?;
    let lon = coords[1].trim().parse::<f64>().map_err(|_| {
        ShapeError::Io(Error::new(
            ErrorKind::InvalidInput,
            format!("Could not parse longitude '{}'.", coords[1]),
        ))
    })?;
    Ok((lat, lon))
}

impl ShapeTool for CropTool {
    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn run(
        &self,
        args: Vec<String>,
        working_directory: &str,
        verbose: bool,
    ) -> Result<(), ShapeError> {
        let mut input_file = String::new();
        let mut output_file = String::new();
        let mut upper_left = String::new();
        let mut lower_right = String::new();

        if args.len() == 0 {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            )));
        }
        for i in 0..args.len() {
            let mut arg = args[i].replace("\"", "");
            arg = arg.replace("\'", "");
            let cmd = arg.split("="); // in case an equals sign was used
            let vec = cmd.collect::<Vec<&str>>();
            let mut keyval = false;
            if vec.len() > 1 {
                keyval = true;
            }
            let flag_val = vec[0].to_lowercase().replace("--", "-");
            if flag_val == "-i" || flag_val == "-input" {
                input_file = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-o" || flag_val == "-output" {
                output_file = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-ul" {
                upper_left = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-lr" {
                lower_right = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            }
        }

        if input_file.is_empty() || output_file.is_empty() {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "Both an input (-i) and an output (-o) file are required.",
            )));
        }
        if upper_left.is_empty() || lower_right.is_empty() {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "Both -ul lat,lon and -lr lat,lon are required.",
            )));
        }

        let input_file = resolve_file_name(&input_file, working_directory);
        let output_file = resolve_file_name(&output_file, working_directory);
        let (ul_lat, ul_lon) = parse_lat_lon(&upper_left)?;
        let (lr_lat, lr_lon) = parse_lat_lon(&lower_right)?;
        // x is longitude, y is latitude
        let crop_box = BoundingBox::new(ul_lon, lr_lat, lr_lon, ul_lat);

        let start = Instant::now();
        let report = crop_shapefile(&input_file, &output_file, crop_box, verbose)?;
        if verbose {
            println!(
                "Wrote {} records to {}.",
                report.num_records, output_file
            );
            println!(
                "Elapsed Time: {}",
                get_formatted_elapsed_time(start)
            );
        }
        Ok(())
    }
}
