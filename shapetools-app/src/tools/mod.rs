/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 19/03/2019
Last Modified: 15/09/2022
License: MIT
*/

// private sub-modules defined in other files
mod shape_crop;
mod shape_file;
mod shape_index;

// exports identifiers from private sub-modules in the current module namespace
pub use self::shape_crop::CropTool;
pub use self::shape_file::ShapeFileTool;
pub use self::shape_index::IndexTool;

use shapetools_vector::ShapeError;

/// One command-line tool: a name to dispatch on, a description for the
/// tool listing, and a `run` taking the tool's own arguments.
pub trait ShapeTool {
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn run(
        &self,
        args: Vec<String>,
        working_directory: &str,
        verbose: bool,
    ) -> Result<(), ShapeError>;
}

pub fn get_tool(tool_name: &str) -> Option<Box<dyn ShapeTool>> {
    match tool_name.to_lowercase().as_str() {
        "shapefile" => Some(Box::new(ShapeFileTool::new())),
        "crop" => Some(Box::new(CropTool::new())),
        "index" => Some(Box::new(IndexTool::new())),
        _ => None,
    }
}

pub fn list_tools() {
    let tools: Vec<Box<dyn ShapeTool>> = vec![
        Box::new(ShapeFileTool::new()),
        Box::new(CropTool::new()),
        Box::new(IndexTool::new()),
    ];
    println!("The following {} tools are available:", tools.len());
    for tool in &tools {
        println!("{:<12} {}", tool.get_tool_name(), tool.get_tool_description());
        println!("{:<12} e.g. {}", "", tool.get_example_usage());
    }
}

/// Prefixes the working directory onto bare file names, the same way every
/// tool resolves its inputs.
pub fn resolve_file_name(file_name: &str, working_directory: &str) -> String {
    if !file_name.contains(std::path::MAIN_SEPARATOR) && !file_name.contains("/") {
        return format!("{}{}", working_directory, file_name);
    }
    file_name.to_string()
}
