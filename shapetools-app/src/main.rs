/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

/*!
ShapeTools is a command-line toolkit for working with ESRI Shapefiles and
their spatial index sidecars. It is run by naming a tool and its
arguments. The following commands are recognized:

| Command        | Description                                                          |
| -------------- | -------------------------------------------------------------------- |
| --cd, --wd     | Changes the working directory, e.g. --wd="/path/to/data/".           |
| -h, --help     | Prints help information.                                             |
| --listtools    | Lists all available tools, with tool descriptions.                   |
| --verbose      | Verbose mode, regardless of the settings.json verbose flag.          |
| --version      | Prints the version information.                                      |

*/

pub mod tools;

use shapetools_common::configs;
use shapetools_vector::ShapeError;
use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::process;

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}

fn run() -> Result<(), ShapeError> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        version();
        help();
        tools::list_tools();
        return Ok(());
    }

    let mut configs = configs::get_configs()?;
    let mut configs_modified = false;
    let mut verbose = configs.verbose_mode;
    let mut tool_name = String::new();
    let mut tool_args_vec: Vec<String> = vec![];

    for arg in &args[1..] {
        if !tool_name.is_empty() {
            // everything after the tool name belongs to the tool
            tool_args_vec.push(arg.clone());
            continue;
        }
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val == "-version" {
            version();
            return Ok(());
        } else if flag_val == "-listtools" {
            tools::list_tools();
            return Ok(());
        } else if flag_val == "-verbose" {
            verbose = true;
        } else if flag_val.starts_with("-cd") || flag_val.starts_with("-wd") {
            let mut v = arg
                .replace("--cd", "")
                .replace("--wd", "")
                .replace("-cd", "")
                .replace("-wd", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            if !v.is_empty() {
                let sep = path::MAIN_SEPARATOR;
                if !v.ends_with(sep) && !v.ends_with("/") {
                    v.push(sep);
                }
                if configs.working_directory != v {
                    configs.working_directory = v;
                    configs_modified = true;
                }
            }
        } else if !arg.starts_with("-") {
            tool_name = arg.clone();
        } else {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                format!("Unrecognized flag '{}'.", arg),
            )));
        }
    }

    if configs_modified {
        configs::save_configs(&configs)?;
    }

    if tool_name.is_empty() {
        return Err(ShapeError::Io(Error::new(
            ErrorKind::InvalidInput,
            "No tool specified. Run with --listtools to see what is available.",
        )));
    }

    let tool = match tools::get_tool(&tool_name) {
        Some(t) => t,
        None => {
            return Err(ShapeError::Io(Error::new(
                ErrorKind::InvalidInput,
                format!("Unrecognized tool name '{}'.", tool_name),
            )));
        }
    };
    tool.run(tool_args_vec, &configs.working_directory, verbose)
}

fn help() {
    let help = "shapetools Help

Usage: shapetools [flags] <tool> [tool args]

The following flags are recognized:
--cd, --wd       Changes the working directory, e.g. --wd=\"/path/to/data/\".
-h, --help       Prints help information.
--listtools      Lists all available tools, with tool descriptions.
--verbose        Verbose mode, regardless of the settings.json verbose flag.
--version        Prints the version information.

Example usage:
>> shapetools shapefile lakes.shp
>> shapetools shapefile -a merged.shp lakes.shp
>> shapetools shapefile -v lakes.shp
>> shapetools crop -ul 45.5,-81.0 -lr 43.0,-79.0 -i lakes.shp -o cropped.shp
>> shapetools index -c lakes.shp
>> shapetools index -d -b lakes.shp
";
    println!("{}", help);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "shapetools v{} by Dr. John B. Lindsay (c) 2019-2022",
        VERSION.unwrap_or("Unknown version")
    );
}
