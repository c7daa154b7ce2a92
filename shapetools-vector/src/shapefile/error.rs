/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 04/03/2019
License: MIT
*/

use std::error;
use std::fmt;
use std::io;

/// The failure taxonomy of the shapefile codec.
///
/// `Format` covers structural problems in the bytes themselves (bad magic
/// number or version, an unexpected or unsupported shape-type tag, corrupt
/// record sizes). `InvalidState` covers misuse of an otherwise healthy file
/// (changing an established shape type, appending a record of the wrong
/// type, writing through a read-only handle). `Io` wraps the underlying
/// read/write/seek failures, which are propagated and never retried.
#[derive(Debug)]
pub enum ShapeError {
    Io(io::Error),
    Format(String),
    InvalidState(String),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShapeError::Io(ref err) => err.fmt(f),
            ShapeError::Format(ref description) => write!(f, "Format error: {}", description),
            ShapeError::InvalidState(ref description) => {
                write!(f, "Invalid state: {}", description)
            }
        }
    }
}

impl error::Error for ShapeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ShapeError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ShapeError {
    fn from(err: io::Error) -> ShapeError {
        ShapeError::Io(err)
    }
}
