/*
This tool is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

use crate::tools::{resolve_file_name, ShapeTool};
use shapetools_vector::{ShapeError, ShapeType, Shapefile};
use std::io::{Error, ErrorKind};

/// Prints a shapefile's header and record count, appends the records of
/// one shapefile onto another (`-a`), or verifies and repairs a file
/// (`-v`). Appending establishes the destination's shape type when the
/// destination is new; appending files of incompatible shape types is an
/// error.
pub struct ShapeFileTool {
    name: String,
    description: String,
    example_usage: String,
}

impl ShapeFileTool {
    pub fn new() -> ShapeFileTool {
        // public constructor
        ShapeFileTool {
            name: "shapefile".to_string(),
            description: "Prints a summary, appends records (-a dest src), or verifies/repairs (-v)."
                .to_string(),
            example_usage: "shapetools shapefile -a merged.shp lakes.shp".to_string(),
        }
    }

    fn print_summary(&self, file_name: &str) -> Result<(), ShapeError> {
        let mut sf = Shapefile::read(file_name)?;
        println!("{}", sf.header);
        let mut num_records = 0;
        while let Some(_) = sf.get_next_record()? {
            num_records += 1;
        }
        println!("num_records: {}", num_records);
        Ok(())
    }

    fn append(
        &self,
        dest_file: &str,
        src_file: &str,
        verbose: bool,
    ) -> Result<(), ShapeError> {
        let mut dest = Shapefile::open(dest_file)?;
        let mut src = Shapefile::read(src_file)?;

        if dest.header.shape_type == ShapeType::Null {
            // a fresh destination takes on the source's type
            dest.set_shape_type(src.header.shape_type)?;
        } else if src.header.shape_type != ShapeType::Null
            && src.header.shape_type != dest.header.shape_type
        {
            return Err(ShapeError::InvalidState(format!(
                "cannot append {} records onto a {} file",
                src.header.shape_type, dest.header.shape_type
            )));
        }

        let mut num_appended = 0;
        while let Some(record) = src.get_next_record()? {
            dest.add_record(&record.geometry)?;
            num_appended += 1;
        }
        let report = dest.verify(true, verbose)?;
        if verbose {
            println!(
                "Appended {} records; {} now holds {}.",
                num_appended, dest_file, report.num_records
            );
        }
        Ok(())
    }

    fn verify(&self, file_name: &str, verbose: bool) -> Result<(), ShapeError> {
        let mut sf = Shapefile::open(file_name)?;
        let report = sf.verify(true, true)?;
        if verbose || report.total_mismatches() > 0 {
            println!(
                "{} records checked, {} corrections made.",
                report.num_records,
                report.total_mismatches()
            );
        }
        Ok(())
    }
}

impl ShapeTool for ShapeFileTool {
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

        let mut append_mode = false;
        let mut verify_mode = false;
        let mut files: Vec<String> = vec![];
        for i in 0..args.len() {
            let mut arg = args[i].replace("\"", "");
            arg = arg.replace("\'", "");
            let flag_val = arg.to_lowercase().replace("--", "-");
            if flag_val == "-a" {
                append_mode = true;
            } else if flag_val == "-v" {
                verify_mode = true;
            } else if !arg.starts_with("-") {
                files.push(resolve_file_name(&arg, working_directory));
            } else {
                return Err(ShapeError::Io(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized flag '{}'.", arg),
                )));
            }
        }

        if append_mode {
            if files.len() != 2 {
                return Err(ShapeError::Io(Error::new(
                    ErrorKind::InvalidInput,
                    "Append requires a destination and a source file.",
                )));
            }
            self.append(&files[0], &files[1], verbose)
        } else if verify_mode {
            if files.len() != 1 {
                return Err(ShapeError::Io(Error::new(
                    ErrorKind::InvalidInput,
                    "Verify requires a single file.",
                )));
            }
            self.verify(&files[0], verbose)
        } else {
            if files.len() != 1 {
                return Err(ShapeError::Io(Error::new(
                    ErrorKind::InvalidInput,
                    "Expected a single shapefile name.",
                )));
            }
            self.print_summary(&files[0])
        }
    }
}
