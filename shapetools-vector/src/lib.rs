/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 15/09/2022
License: MIT
*/

// private sub-module defined in other files
pub mod shapefile;

// exports identifiers from private sub-modules in the current module namespace
pub use crate::shapefile::crop::crop_shapefile;
pub use crate::shapefile::error::ShapeError;
pub use crate::shapefile::geometry::{PolyGeometry, ShapeGeometry, ShapeType};
pub use crate::shapefile::spatial_index::{
    FileIndex, MemoryIndex, SpatialIndex, SpatialIndexEntry,
};
pub use crate::shapefile::{ShapeRecord, Shapefile, ShapefileHeader, VerifyReport};
