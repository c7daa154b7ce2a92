/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 22/06/2021
License: MIT
*/

pub mod configs;
pub mod structures;
pub mod utils;
