/*
This tool is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

use crate::tools::{resolve_file_name, ShapeTool};
use shapetools_common::utils::get_formatted_elapsed_time;
use shapetools_vector::{FileIndex, ShapeError, SpatialIndex};
use std::io::{Error, ErrorKind};
use std::time::Instant;

/// Builds (`-c`) or dumps (`-d`, optionally with bounding boxes via `-b`)
/// the `.ssx` spatial index of a shapefile. Dumping works with or without
/// the sidecar present; a missing sidecar is served by the in-memory
/// fallback index.
pub struct IndexTool {
    name: String,
    description: String,
    example_usage: String,
}

impl IndexTool {
    pub fn new() -> IndexTool {
        // public constructor
        IndexTool {
            name: "index".to_string(),
            description: "Builds (-c) or dumps (-d [-b]) a shapefile's .ssx spatial index."
                .to_string(),
            example_usage: "shapetools index -c lakes.shp".to_string(),
        }
    }
}

impl ShapeTool for IndexTool {
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
        if args.len() == 0 {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            )));
        }

        let mut create_mode = false;
        let mut dump_mode = false;
        let mut show_boxes = false;
        let mut file = String::new();
        for i in 0..args.len() {
            let mut arg = args[i].replace("\"", "");
            arg = arg.replace("\'", "");
            let flag_val = arg.to_lowercase().replace("--", "-");
            if flag_val == "-c" {
                create_mode = true;
            } else if flag_val == "-d" {
                dump_mode = true;
            } else if flag_val == "-b" {
                show_boxes = true;
            } else if !arg.starts_with("-") {
                file = resolve_file_name(&arg, working_directory);
            } else {
                return Err(ShapeError::Io(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized flag '{}'.", arg),
                )));
            }
        }

        if file.is_empty() {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "A shapefile name is required.",
            )));
        }

        if create_mode {
            let start = Instant::now();
            let ssx_file = FileIndex::create(&file)?;
            if verbose {
                println!("Index written to {}.", ssx_file);
                println!("Elapsed Time: {}", get_formatted_elapsed_time(start));
            }
            Ok(())
        } else if dump_mode {
            let mut index = SpatialIndex::open(&file)?;
            let entries = index.entries()?;
            println!(
                "{} entries ({})",
                entries.len(),
                if index.is_persisted() {
                    "persisted index"
                } else {
                    "in-memory index"
                }
            );
            for (i, entry) in entries.iter().enumerate() {
                if show_boxes {
                    println!(
                        "{}: offset={} length_words={} box=({}, {}, {}, {})",
                        i + 1,
                        entry.byte_offset,
                        entry.content_words,
                        entry.bbox.x_min,
                        entry.bbox.y_min,
                        entry.bbox.x_max,
                        entry.bbox.y_max
                    );
                } else {
                    println!(
                        "{}: offset={} length_words={}",
                        i + 1,
                        entry.byte_offset,
                        entry.content_words
                    );
                }
            }
            Ok(())
        } else {
            Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                "One of -c (create) or -d (dump) is required.",
            )))
        }
    }
}
