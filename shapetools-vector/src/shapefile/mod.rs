/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 15/09/2022
License: MIT

Notes: The logic behind working with the ESRI Shapefile format.
*/

pub mod crop;
pub mod error;
pub mod geometry;
pub mod spatial_index;

use self::error::ShapeError;
use self::geometry::{ShapeGeometry, ShapeType};
use byteorder::{BigEndian, WriteBytesExt};
use shapetools_common::structures::BoundingBox;
use shapetools_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::prelude::*;
use std::io::{Cursor, SeekFrom};

/// The file code every shapefile starts with.
const FILE_CODE: i32 = 9994;
/// The only version the format has ever had.
const VERSION: i32 = 1000;
/// Fixed size of the file header, in bytes.
pub const HEADER_SIZE: u64 = 100;

// Note: the shapefile format uses mixed endianness for whatever reason.
// The file header and the per-record headers are big-endian; the version,
// shape type, bounding boxes and coordinates are little-endian.

#[derive(Debug, Default, Clone)]
pub struct ShapefileHeader {
    file_code: i32,            // BigEndian; value is 9994
    pub file_length: i32,      // BigEndian; in 16-bit words
    pub version: i32,          // LittleEndian; value is 1000
    pub shape_type: ShapeType, // LittleEndian
    pub x_min: f64,            // LittleEndian
    pub y_min: f64,            // LittleEndian
    pub x_max: f64,            // LittleEndian
    pub y_max: f64,            // LittleEndian
    pub z_min: f64,            // LittleEndian; 0f64 unless shape type is z or measured
    pub z_max: f64,            // LittleEndian; 0f64 unless shape type is z or measured
    pub m_min: f64,            // LittleEndian; 0f64 unless shape type is z or measured
    pub m_max: f64,            // LittleEndian; 0f64 unless shape type is z or measured
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = format!(
            "file_code: {}
file_length: {}
version: {}
shape_type: {}
x_min: {}
x_max: {}
y_min: {}
y_max: {}
z_min: {}
z_max: {}
m_min: {}
m_max: {}",
            self.file_code,
            self.file_length,
            self.version,
            self.shape_type,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
            self.z_min,
            self.z_max,
            self.m_min,
            self.m_max
        );
        write!(f, "{}", s)
    }
}

/// One geometry record: its 1-based ordinal in the file and its payload.
#[derive(Clone, Debug)]
pub struct ShapeRecord {
    pub record_number: i32,
    pub geometry: ShapeGeometry,
}

/// The outcome of a `verify` pass. With `repair` the mismatch counts are
/// corrections that were written back; without it they are findings only.
#[derive(Default, Clone, Debug)]
pub struct VerifyReport {
    pub num_records: usize,
    pub record_number_mismatches: usize,
    pub file_length_mismatch: bool,
    pub bounds_mismatch: bool,
}

impl VerifyReport {
    pub fn total_mismatches(&self) -> usize {
        self.record_number_mismatches
            + self.file_length_mismatch as usize
            + self.bounds_mismatch as usize
    }
}

/// `Shapefile` is a random-access handle on an ESRI Shapefile (`.shp`).
///
/// Records are streamed, not loaded wholesale: a sequential cursor walks
/// the file through `get_next_record`, and `read_record_at` fetches one
/// record by byte offset for index-driven access. A single growable buffer
/// is reused across record reads.
///
/// The header is only ever rewritten at file creation, by the first
/// `set_shape_type`, or by `verify(repair = true)`. Appending records
/// leaves it untouched, so writers finish with a repair pass.
///
/// Examples:
///
/// ```no_run
/// # use shapetools_vector::{ShapeGeometry, ShapeType, Shapefile};
/// # use shapetools_common::structures::Point2D;
/// # fn example() -> Result<(), shapetools_vector::ShapeError> {
/// let mut output = Shapefile::create("cities.shp")?;
/// output.set_shape_type(ShapeType::Point)?;
/// output.add_record(&ShapeGeometry::Point(Point2D::new(-80.5, 43.5)))?;
/// output.verify(true, false)?;
///
/// let mut input = Shapefile::read("cities.shp")?;
/// while let Some(record) = input.get_next_record()? {
///     println!("{}: {:?}", record.record_number, record.geometry);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Shapefile {
    pub file_name: String,
    pub file_mode: String,
    pub header: ShapefileHeader,
    f: File,
    pos: u64,
    end: u64,
    buf: Vec<u8>,
    next_rec_num: Option<i32>,
}

impl Shapefile {
    /// Opens an existing shapefile read-only. The header is validated and
    /// a bad file code, version or shape-type tag aborts the open.
    pub fn read(file_name: &str) -> Result<Shapefile, ShapeError> {
        let mut f = File::open(file_name)?;
        let end = f.metadata()?.len();
        if end < HEADER_SIZE {
            return Err(ShapeError::Format(format!(
                "file is too short ({} bytes) to hold a shapefile header",
                end
            )));
        }
        let header = read_header(&mut f)?;
        Ok(Shapefile {
            file_name: file_name.to_string(),
            file_mode: "r".to_string(),
            header: header,
            f: f,
            pos: HEADER_SIZE,
            end: end,
            buf: vec![],
            next_rec_num: None,
        })
    }

    /// Opens a shapefile read/write, creating it with a blank header
    /// (file code 9994, version 1000, shape type Null, zero bounds) if it
    /// does not yet exist or is empty.
    pub fn open(file_name: &str) -> Result<Shapefile, ShapeError> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(file_name)?;
        let mut end = f.metadata()?.len();
        if end == 0 {
            write_header(&mut f, &blank_header())?;
            end = HEADER_SIZE;
        } else if end < HEADER_SIZE {
            return Err(ShapeError::Format(format!(
                "file is too short ({} bytes) to hold a shapefile header",
                end
            )));
        }
        // read the header back from disk rather than trusting what was
        // just assembled in memory
        let header = read_header(&mut f)?;
        Ok(Shapefile {
            file_name: file_name.to_string(),
            file_mode: "rw".to_string(),
            header: header,
            f: f,
            pos: HEADER_SIZE,
            end: end,
            buf: vec![],
            next_rec_num: None,
        })
    }

    /// Like `open`, but any existing content is discarded first.
    pub fn create(file_name: &str) -> Result<Shapefile, ShapeError> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(file_name)?;
        write_header(&mut f, &blank_header())?;
        let header = read_header(&mut f)?;
        Ok(Shapefile {
            file_name: file_name.to_string(),
            file_mode: "rw".to_string(),
            header: header,
            f: f,
            pos: HEADER_SIZE,
            end: HEADER_SIZE,
            buf: vec![],
            next_rec_num: Some(1),
        })
    }

    /// Establishes the file's shape type. Legal exactly once: the type may
    /// be set while it is Null (and re-set to the same value), never
    /// changed afterwards. The header is rewritten immediately.
    pub fn set_shape_type(&mut self, shape_type: ShapeType) -> Result<(), ShapeError> {
        if self.file_mode == "r" {
            return Err(ShapeError::InvalidState(
                "the file was opened in read-only mode".to_string(),
            ));
        }
        if self.header.shape_type == shape_type {
            return Ok(());
        }
        if self.header.shape_type != ShapeType::Null {
            return Err(ShapeError::InvalidState(format!(
                "the file's shape type is already {} and cannot be changed to {}",
                self.header.shape_type, shape_type
            )));
        }
        self.header.shape_type = shape_type;
        write_header(&mut self.f, &self.header)
    }

    /// The byte offset the sequential cursor will read next.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Resets the sequential cursor to the first record.
    pub fn rewind(&mut self) {
        self.pos = HEADER_SIZE;
    }

    /// Reads the record under the sequential cursor and advances past it.
    /// `Ok(None)` means the end of the file was reached cleanly; malformed
    /// input is always an `Err`, never the end-of-file sentinel.
    pub fn get_next_record(&mut self) -> Result<Option<ShapeRecord>, ShapeError> {
        if self.pos >= self.end {
            return Ok(None);
        }
        let (record, advance) = self.read_record(self.pos)?;
        self.pos += advance;
        Ok(Some(record))
    }

    /// Reads exactly one record starting at `offset`. The sequential
    /// cursor is unaffected.
    pub fn read_record_at(&mut self, offset: u64) -> Result<ShapeRecord, ShapeError> {
        let (record, _) = self.read_record(offset)?;
        Ok(record)
    }

    /// Appends a record at the end of the file with the next 1-based
    /// record number, which is returned. The geometry's type must match
    /// the file's established type; Null geometries are always accepted.
    /// The header is not updated (see `verify`).
    pub fn add_record(&mut self, geometry: &ShapeGeometry) -> Result<i32, ShapeError> {
        if self.file_mode == "r" {
            return Err(ShapeError::InvalidState(
                "the file was opened in read-only mode".to_string(),
            ));
        }
        let gt = geometry.shape_type();
        if gt != ShapeType::Null && gt != self.header.shape_type {
            return Err(ShapeError::InvalidState(format!(
                "attempt to add a record of type {} to a file of type {}",
                gt, self.header.shape_type
            )));
        }

        let record_number = match self.next_rec_num {
            Some(n) => n,
            None => self.count_records()? as i32 + 1,
        };

        let content_len = geometry.get_length();
        let mut bow = ByteOrderWriter::new(
            Vec::with_capacity(8 + content_len as usize),
            Endianness::BigEndian,
        );
        bow.write_i32(record_number)?;
        bow.write_i32(content_len / 2)?; // content length in 16-bit words
        geometry.encode(&mut bow)?;
        let bytes = bow.into_inner();

        self.f.seek(SeekFrom::Start(self.end))?;
        self.f.write_all(&bytes)?;
        self.end += bytes.len() as u64;
        self.next_rec_num = Some(record_number + 1);
        Ok(record_number)
    }

    /// Re-derives the file length, the sequential record numbering and the
    /// global bounding box in a full second pass. With `repair`, header
    /// fields and record numbers found inconsistent are rewritten in
    /// place; this is the only mutation path for already-written records.
    ///
    /// Content-length corruption and records whose type disagrees with the
    /// file's cannot be repaired and abort the pass with an error.
    pub fn verify(&mut self, repair: bool, verbose: bool) -> Result<VerifyReport, ShapeError> {
        if repair && self.file_mode == "r" {
            return Err(ShapeError::InvalidState(
                "the file was opened in read-only mode".to_string(),
            ));
        }

        let mut report = VerifyReport::default();
        let mut bounds = BoundingBox::fresh();
        let mut offset = HEADER_SIZE;
        let mut expected_num = 1i32;
        while offset < self.end {
            let (record, advance) = self.read_record(offset)?;
            if record.record_number != expected_num {
                report.record_number_mismatches += 1;
                if verbose {
                    println!(
                        "Record at byte {}: number {} should be {}{}",
                        offset,
                        record.record_number,
                        expected_num,
                        if repair { " (corrected)" } else { "" }
                    );
                }
                if repair {
                    self.f.seek(SeekFrom::Start(offset))?;
                    self.f.write_i32::<BigEndian>(expected_num)?;
                }
            }
            if record.geometry.shape_type() != ShapeType::Null {
                bounds.expand_to(record.geometry.get_bounding_box());
            }
            report.num_records += 1;
            offset += advance;
            expected_num += 1;
        }

        let derived_length = (self.end / 2) as i32;
        if self.header.file_length != derived_length {
            report.file_length_mismatch = true;
            if verbose {
                println!(
                    "File length {} should be {} (16-bit words){}",
                    self.header.file_length,
                    derived_length,
                    if repair { " (corrected)" } else { "" }
                );
            }
        }

        // a file of nothing but Null records keeps the zero bounds of a
        // blank header
        let derived_bounds = if bounds.is_fresh() {
            BoundingBox::default()
        } else {
            bounds
        };
        if self.header.x_min != derived_bounds.x_min
            || self.header.y_min != derived_bounds.y_min
            || self.header.x_max != derived_bounds.x_max
            || self.header.y_max != derived_bounds.y_max
        {
            report.bounds_mismatch = true;
            if verbose {
                println!(
                    "Bounding box ({}, {}, {}, {}) should be ({}, {}, {}, {}){}",
                    self.header.x_min,
                    self.header.y_min,
                    self.header.x_max,
                    self.header.y_max,
                    derived_bounds.x_min,
                    derived_bounds.y_min,
                    derived_bounds.x_max,
                    derived_bounds.y_max,
                    if repair { " (corrected)" } else { "" }
                );
            }
        }

        if repair && (report.file_length_mismatch || report.bounds_mismatch) {
            self.header.file_length = derived_length;
            self.header.x_min = derived_bounds.x_min;
            self.header.y_min = derived_bounds.y_min;
            self.header.x_max = derived_bounds.x_max;
            self.header.y_max = derived_bounds.y_max;
            write_header(&mut self.f, &self.header)?;
        }

        Ok(report)
    }

    /// Releases the underlying file handle. Consuming the value is what
    /// makes any further operation on a closed file impossible.
    pub fn close(self) {}

    fn read_record(&mut self, offset: u64) -> Result<(ShapeRecord, u64), ShapeError> {
        self.f.seek(SeekFrom::Start(offset))?;
        let mut hdr = [0u8; 8];
        self.f.read_exact(&mut hdr)?;
        let mut hb = ByteOrderReader::new(Cursor::new(&hdr[..]), Endianness::BigEndian)?;
        let record_number = hb.read_i32()?;
        let content_words = hb.read_i32()?;
        if content_words < 2 {
            return Err(ShapeError::Format(format!(
                "corrupt content length {} at byte {}",
                content_words, offset
            )));
        }
        let content_bytes = content_words as u64 * 2;
        if offset + 8 + content_bytes > self.end {
            return Err(ShapeError::Format(format!(
                "record at byte {} overruns the end of the file",
                offset
            )));
        }

        let n = content_bytes as usize;
        if self.buf.len() < n {
            self.buf.resize(n, 0u8);
        }
        self.f.read_exact(&mut self.buf[0..n])?;

        let expected = self.header.shape_type;
        let mut bor =
            ByteOrderReader::new(Cursor::new(&self.buf[0..n]), Endianness::LittleEndian)?;
        let geometry = ShapeGeometry::decode(&mut bor, expected)?;
        if geometry.get_length() as u64 != content_bytes {
            return Err(ShapeError::Format(format!(
                "record {} declares {} content bytes but its payload is {}",
                record_number,
                content_bytes,
                geometry.get_length()
            )));
        }

        Ok((
            ShapeRecord {
                record_number: record_number,
                geometry: geometry,
            },
            8 + content_bytes,
        ))
    }

    // Walks the record headers without decoding payloads.
    fn count_records(&mut self) -> Result<usize, ShapeError> {
        let mut count = 0usize;
        let mut offset = HEADER_SIZE;
        while offset < self.end {
            self.f.seek(SeekFrom::Start(offset + 4))?;
            let mut word = [0u8; 4];
            self.f.read_exact(&mut word)?;
            let content_words = i32::from_be_bytes(word);
            if content_words < 2 {
                return Err(ShapeError::Format(format!(
                    "corrupt content length {} at byte {}",
                    content_words, offset
                )));
            }
            offset += 8 + content_words as u64 * 2;
            count += 1;
        }
        Ok(count)
    }
}

fn blank_header() -> ShapefileHeader {
    ShapefileHeader {
        file_code: FILE_CODE,
        file_length: (HEADER_SIZE / 2) as i32,
        version: VERSION,
        ..Default::default()
    }
}

fn read_header(f: &mut File) -> Result<ShapefileHeader, ShapeError> {
    let mut buf = [0u8; HEADER_SIZE as usize];
    f.seek(SeekFrom::Start(0))?;
    f.read_exact(&mut buf)?;

    let mut bor = ByteOrderReader::new(Cursor::new(&buf[..]), Endianness::BigEndian)?;
    let mut header = ShapefileHeader::default();
    header.file_code = bor.read_i32()?;
    if header.file_code != FILE_CODE {
        return Err(ShapeError::Format(format!(
            "bad file code {} (expected {})",
            header.file_code, FILE_CODE
        )));
    }
    bor.seek(24)?;
    header.file_length = bor.read_i32()?;

    // the rest of the header is in LittleEndian format
    bor.set_byte_order(Endianness::LittleEndian);
    header.version = bor.read_i32()?;
    if header.version != VERSION {
        return Err(ShapeError::Format(format!(
            "bad version {} (expected {})",
            header.version, VERSION
        )));
    }
    let st = bor.read_i32()?;
    header.shape_type = match ShapeType::from_int(st) {
        Some(t) => t,
        None => {
            return Err(ShapeError::Format(format!(
                "unrecognized shape type tag {} in file header",
                st
            )));
        }
    };

    // bounding box
    header.x_min = bor.read_f64()?;
    header.y_min = bor.read_f64()?;
    header.x_max = bor.read_f64()?;
    header.y_max = bor.read_f64()?;
    header.z_min = bor.read_f64()?;
    header.z_max = bor.read_f64()?;
    header.m_min = bor.read_f64()?;
    header.m_max = bor.read_f64()?;
    Ok(header)
}

fn write_header(f: &mut File, header: &ShapefileHeader) -> Result<(), ShapeError> {
    let mut bow = ByteOrderWriter::new(
        Vec::with_capacity(HEADER_SIZE as usize),
        Endianness::BigEndian,
    );
    bow.write_i32(FILE_CODE)?;
    // unused header bytes
    for _ in 0..5 {
        bow.write_i32(0i32)?;
    }
    bow.write_i32(header.file_length)?;

    bow.set_byte_order(Endianness::LittleEndian);
    bow.write_i32(VERSION)?;
    bow.write_i32(header.shape_type.to_int())?;
    bow.write_f64(header.x_min)?;
    bow.write_f64(header.y_min)?;
    bow.write_f64(header.x_max)?;
    bow.write_f64(header.y_max)?;
    bow.write_f64(header.z_min)?;
    bow.write_f64(header.z_max)?;
    bow.write_f64(header.m_min)?;
    bow.write_f64(header.m_max)?;

    f.seek(SeekFrom::Start(0))?;
    f.write_all(&bow.into_inner())?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::geometry::{PolyGeometry, ShapeGeometry, ShapeType};
    use super::{ShapeError, Shapefile, HEADER_SIZE};
    use shapetools_common::structures::Point2D;
    use std::fs;
    use std::io::prelude::*;
    use std::io::SeekFrom;

    fn temp_path(name: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("shapetools_{}_{}", std::process::id(), name));
        p.to_str().unwrap().to_string()
    }

    fn square(x: f64, y: f64, size: f64) -> ShapeGeometry {
        let mut poly = PolyGeometry::new(true);
        poly.add_part(&[
            Point2D::new(x, y),
            Point2D::new(x + size, y),
            Point2D::new(x + size, y + size),
            Point2D::new(x, y + size),
        ]);
        ShapeGeometry::Poly(poly)
    }

    #[test]
    fn test_blank_header_round_trip() {
        let path = temp_path("blank_header.shp");
        let sf = Shapefile::create(&path).unwrap();
        assert_eq!(sf.header.shape_type, ShapeType::Null);
        assert_eq!(sf.header.file_length, (HEADER_SIZE / 2) as i32);
        assert_eq!(sf.header.version, 1000);
        assert_eq!(
            (sf.header.x_min, sf.header.y_min, sf.header.x_max, sf.header.y_max),
            (0.0, 0.0, 0.0, 0.0)
        );
        sf.close();

        // and the on-disk bytes parse back the same way
        let sf = Shapefile::read(&path).unwrap();
        assert_eq!(sf.header.shape_type, ShapeType::Null);
        assert_eq!(sf.header.file_length, 50);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_shape_type_lock() {
        let path = temp_path("type_lock.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Polygon).unwrap();
        // setting the same value again is a no-op
        sf.set_shape_type(ShapeType::Polygon).unwrap();
        // changing it is not
        let err = sf.set_shape_type(ShapeType::Point).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidState(_)));
        assert_eq!(sf.header.shape_type, ShapeType::Polygon);
        sf.close();

        // the first set persisted
        let sf = Shapefile::read(&path).unwrap();
        assert_eq!(sf.header.shape_type, ShapeType::Polygon);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_add_and_read_back() {
        let path = temp_path("add_read.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        assert_eq!(
            sf.add_record(&ShapeGeometry::Point(Point2D::new(1.0, 2.0))).unwrap(),
            1
        );
        assert_eq!(
            sf.add_record(&ShapeGeometry::Point(Point2D::new(3.0, 4.0))).unwrap(),
            2
        );
        // Null records are always permitted
        assert_eq!(sf.add_record(&ShapeGeometry::Null).unwrap(), 3);
        sf.close();

        let mut sf = Shapefile::read(&path).unwrap();
        let r1 = sf.get_next_record().unwrap().unwrap();
        assert_eq!(r1.record_number, 1);
        assert_eq!(r1.geometry, ShapeGeometry::Point(Point2D::new(1.0, 2.0)));
        let r2 = sf.get_next_record().unwrap().unwrap();
        assert_eq!(r2.geometry, ShapeGeometry::Point(Point2D::new(3.0, 4.0)));
        let r3 = sf.get_next_record().unwrap().unwrap();
        assert_eq!(r3.geometry, ShapeGeometry::Null);
        // clean end of file, repeatedly
        assert!(sf.get_next_record().unwrap().is_none());
        assert!(sf.get_next_record().unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_add_wrong_type_rejected() {
        let path = temp_path("wrong_type.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        let err = sf.add_record(&square(0.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidState(_)));
        sf.close();
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_read_only_mode_rejects_writes() {
        let path = temp_path("read_only.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(1.0, 1.0))).unwrap();
        sf.close();

        let mut sf = Shapefile::read(&path).unwrap();
        assert!(matches!(
            sf.add_record(&ShapeGeometry::Point(Point2D::new(2.0, 2.0))),
            Err(ShapeError::InvalidState(_))
        ));
        assert!(matches!(
            sf.set_shape_type(ShapeType::Polygon),
            Err(ShapeError::InvalidState(_))
        ));
        assert!(matches!(sf.verify(true, false), Err(ShapeError::InvalidState(_))));
        // a non-repairing verify is fine on a read-only handle
        let report = sf.verify(false, false).unwrap();
        assert_eq!(report.num_records, 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_file_code_rejected() {
        let path = temp_path("bad_code.shp");
        fs::write(&path, vec![0u8; 100]).unwrap();
        let err = Shapefile::read(&path).unwrap_err();
        assert!(matches!(err, ShapeError::Format(_)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_decode_error_is_not_eof() {
        let path = temp_path("corrupt_tag.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(1.0, 2.0))).unwrap();
        sf.close();

        // overwrite the first record's embedded type tag with garbage
        let mut f = fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::Start(HEADER_SIZE + 8)).unwrap();
        f.write_all(&99i32.to_le_bytes()).unwrap();
        drop(f);

        let mut sf = Shapefile::read(&path).unwrap();
        // corruption is an error, not a quiet end-of-file
        assert!(matches!(sf.get_next_record(), Err(ShapeError::Format(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_verify_repair_is_idempotent() {
        let path = temp_path("verify_repair.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Polygon).unwrap();
        sf.add_record(&square(-10.0, -10.0, 20.0)).unwrap();
        sf.add_record(&square(20.0, 20.0, 10.0)).unwrap();

        // appends never touch the header, so the blank length and bounds
        // are now stale
        let report = sf.verify(true, false).unwrap();
        assert_eq!(report.num_records, 2);
        assert!(report.file_length_mismatch);
        assert!(report.bounds_mismatch);
        assert_eq!(report.record_number_mismatches, 0);

        // the second pass finds nothing left to fix
        let report = sf.verify(true, false).unwrap();
        assert_eq!(report.total_mismatches(), 0);
        assert_eq!(report.num_records, 2);
        sf.close();

        let sf = Shapefile::read(&path).unwrap();
        assert_eq!(
            (sf.header.x_min, sf.header.y_min, sf.header.x_max, sf.header.y_max),
            (-10.0, -10.0, 30.0, 30.0)
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_repair_fixes_record_numbers() {
        let path = temp_path("renumber.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(1.0, 1.0))).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(2.0, 2.0))).unwrap();
        sf.close();

        // clobber the second record's number (BE i32 at its header)
        let second_offset = HEADER_SIZE + 8 + 20;
        let mut f = fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::Start(second_offset)).unwrap();
        f.write_all(&7i32.to_be_bytes()).unwrap();
        drop(f);

        let mut sf = Shapefile::open(&path).unwrap();
        let report = sf.verify(true, false).unwrap();
        assert_eq!(report.record_number_mismatches, 1);
        sf.close();

        let mut sf = Shapefile::read(&path).unwrap();
        sf.get_next_record().unwrap();
        let r2 = sf.get_next_record().unwrap().unwrap();
        assert_eq!(r2.record_number, 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_append_to_reopened_file() {
        let path = temp_path("reopen_append.shp");
        let mut sf = Shapefile::create(&path).unwrap();
        sf.set_shape_type(ShapeType::Point).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(1.0, 1.0))).unwrap();
        sf.add_record(&ShapeGeometry::Point(Point2D::new(2.0, 2.0))).unwrap();
        sf.close();

        // numbering continues across a fresh handle
        let mut sf = Shapefile::open(&path).unwrap();
        assert_eq!(
            sf.add_record(&ShapeGeometry::Point(Point2D::new(3.0, 3.0))).unwrap(),
            3
        );
        let report = sf.verify(true, false).unwrap();
        assert_eq!(report.num_records, 3);
        assert_eq!(report.record_number_mismatches, 0);
        sf.close();
        let _ = fs::remove_file(&path);
    }
}
