/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 12/03/2019
Last Modified: 15/09/2022
License: MIT

Notes: The bounding-box spatial index (.ssx) that lets range queries seek
straight to intersecting records instead of scanning the whole shapefile.
*/

use super::error::ShapeError;
use super::{ShapeRecord, Shapefile, HEADER_SIZE};
use shapetools_common::structures::BoundingBox;
use shapetools_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fs::File;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::Path;

/// Size of one on-disk index record: two big-endian i32s (byte offset and
/// content length, both in 16-bit words) followed by the record's bounding
/// box as four little-endian doubles.
const ENTRY_SIZE: u64 = 40;

/// One index entry, held in byte units in memory; the on-disk form stores
/// the offset and length in 16-bit words.
#[derive(Clone, Copy, Debug)]
pub struct SpatialIndexEntry {
    pub bbox: BoundingBox,
    pub byte_offset: u64,
    pub content_words: i32,
}

/// Derives the sidecar path from a shapefile path, e.g. `roads.shp` ->
/// `roads.ssx`.
pub fn index_path(shp_file: &str) -> String {
    Path::new(shp_file)
        .with_extension("ssx")
        .into_os_string()
        .into_string()
        .unwrap()
}

fn entry_for(record: &ShapeRecord, byte_offset: u64) -> SpatialIndexEntry {
    // Null records carry a degenerate zero-area box
    SpatialIndexEntry {
        bbox: record.geometry.get_bounding_box(),
        byte_offset: byte_offset,
        content_words: record.geometry.get_length() / 2,
    }
}

/// The persisted index strategy: a `.ssx` sidecar holding a verbatim copy
/// of the shapefile's 100-byte header followed by one fixed 40-byte entry
/// per record, in file order.
pub struct FileIndex {
    pub file_name: String,
    bor: ByteOrderReader<File>,
}

impl FileIndex {
    /// Streams `shp_file` once from start to end and writes its sidecar,
    /// returning the sidecar path.
    pub fn create(shp_file: &str) -> Result<String, ShapeError> {
        let mut sf = Shapefile::read(shp_file)?;

        // the sidecar leads with an exact copy of the shapefile header
        let mut hdr = [0u8; HEADER_SIZE as usize];
        {
            let mut f = File::open(shp_file)?;
            f.read_exact(&mut hdr)?;
        }

        let ssx_file = index_path(shp_file);
        let f = File::create(&ssx_file)?;
        let mut bow = ByteOrderWriter::new(BufWriter::new(f), Endianness::BigEndian);
        bow.write_bytes(&hdr)?;

        loop {
            let offset = sf.pos();
            match sf.get_next_record()? {
                Some(record) => {
                    let entry = entry_for(&record, offset);
                    bow.set_byte_order(Endianness::BigEndian);
                    bow.write_i32((entry.byte_offset / 2) as i32)?;
                    bow.write_i32(entry.content_words)?;
                    bow.set_byte_order(Endianness::LittleEndian);
                    bow.write_f64(entry.bbox.x_min)?;
                    bow.write_f64(entry.bbox.y_min)?;
                    bow.write_f64(entry.bbox.x_max)?;
                    bow.write_f64(entry.bbox.y_max)?;
                }
                None => break,
            }
        }

        let mut inner = bow.into_inner();
        inner.flush()?;
        Ok(ssx_file)
    }

    /// Opens an existing sidecar, validating the copied header and that the
    /// body is a whole number of entries.
    pub fn open(ssx_file: &str) -> Result<FileIndex, ShapeError> {
        let f = File::open(ssx_file)?;
        let mut bor = ByteOrderReader::new(f, Endianness::BigEndian)?;
        if (bor.len() as u64) < HEADER_SIZE {
            return Err(ShapeError::Format(format!(
                "index file is too short ({} bytes) to hold a header",
                bor.len()
            )));
        }
        if (bor.len() as u64 - HEADER_SIZE) % ENTRY_SIZE != 0 {
            return Err(ShapeError::Format(
                "index file body is not a whole number of 40-byte entries".to_string(),
            ));
        }
        let file_code = bor.read_i32()?;
        if file_code != 9994 {
            return Err(ShapeError::Format(format!(
                "bad file code {} in index header",
                file_code
            )));
        }
        bor.seek(28)?;
        bor.set_byte_order(Endianness::LittleEndian);
        let version = bor.read_i32()?;
        if version != 1000 {
            return Err(ShapeError::Format(format!(
                "bad version {} in index header",
                version
            )));
        }
        let mut fi = FileIndex {
            file_name: ssx_file.to_string(),
            bor: bor,
        };
        fi.reset()?;
        Ok(fi)
    }

    pub fn num_entries(&self) -> usize {
        ((self.bor.len() as u64 - HEADER_SIZE) / ENTRY_SIZE) as usize
    }

    /// Rewinds the entry cursor to the first entry.
    pub fn reset(&mut self) -> Result<(), ShapeError> {
        self.bor.seek(HEADER_SIZE as usize)?;
        Ok(())
    }

    /// Reads the next entry, or `Ok(None)` past the last one.
    pub fn next_entry(&mut self) -> Result<Option<SpatialIndexEntry>, ShapeError> {
        if self.bor.pos() >= self.bor.len() {
            return Ok(None);
        }
        self.bor.set_byte_order(Endianness::BigEndian);
        let offset_words = self.bor.read_i32()?;
        let content_words = self.bor.read_i32()?;
        if offset_words < 0 || content_words < 0 {
            return Err(ShapeError::Format(format!(
                "corrupt index entry ({}, {})",
                offset_words, content_words
            )));
        }
        self.bor.set_byte_order(Endianness::LittleEndian);
        let bbox = BoundingBox {
            x_min: self.bor.read_f64()?,
            y_min: self.bor.read_f64()?,
            x_max: self.bor.read_f64()?,
            y_max: self.bor.read_f64()?,
        };
        Ok(Some(SpatialIndexEntry {
            bbox: bbox,
            byte_offset: offset_words as u64 * 2, // stored in 16-bit words
            content_words: content_words,
        }))
    }
}

/// The transient index strategy: the same streaming pass as `FileIndex`,
/// accumulated into a list instead of a sidecar. Used automatically when
/// no `.ssx` exists.
pub struct MemoryIndex {
    pub entries: Vec<SpatialIndexEntry>,
}

impl MemoryIndex {
    pub fn create(sf: &mut Shapefile) -> Result<MemoryIndex, ShapeError> {
        sf.rewind();
        let mut entries = vec![];
        loop {
            let offset = sf.pos();
            match sf.get_next_record()? {
                Some(record) => entries.push(entry_for(&record, offset)),
                None => break,
            }
        }
        Ok(MemoryIndex { entries: entries })
    }
}

enum IndexSource {
    File(FileIndex),
    Memory(MemoryIndex),
}

/// A queryable spatial index over one shapefile. On open, an existing
/// `.ssx` sidecar is used; a missing sidecar silently falls back to an
/// in-memory index built from one pass over the shapefile, so queries
/// never require a separate build step.
///
/// The value carries its own shapefile handle (one seek cursor); callers
/// wanting concurrent queries open one `SpatialIndex` each.
pub struct SpatialIndex {
    pub file_name: String,
    shapefile: Shapefile,
    source: IndexSource,
    bounds: Option<BoundingBox>,
}

impl SpatialIndex {
    pub fn open(shp_file: &str) -> Result<SpatialIndex, ShapeError> {
        let mut shapefile = Shapefile::read(shp_file)?;
        let ssx_file = index_path(shp_file);
        let source = if Path::new(&ssx_file).exists() {
            IndexSource::File(FileIndex::open(&ssx_file)?)
        } else {
            IndexSource::Memory(MemoryIndex::create(&mut shapefile)?)
        };
        Ok(SpatialIndex {
            file_name: shp_file.to_string(),
            shapefile: shapefile,
            source: source,
            bounds: None,
        })
    }

    /// True when the sidecar file is backing this index.
    pub fn is_persisted(&self) -> bool {
        matches!(self.source, IndexSource::File(_))
    }

    pub fn num_entries(&self) -> usize {
        match self.source {
            IndexSource::File(ref fi) => fi.num_entries(),
            IndexSource::Memory(ref mi) => mi.entries.len(),
        }
    }

    /// Returns every record whose bounding box strictly intersects the
    /// query box; boxes that touch only along an edge are not reported.
    /// Only intersecting records are read from the shapefile.
    ///
    /// The first scan also accumulates the global bounding box as a side
    /// effect; it is then reused until `reset_bounds`.
    pub fn locate_records(
        &mut self,
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    ) -> Result<Vec<ShapeRecord>, ShapeError> {
        let query = BoundingBox::new(x_min, y_min, x_max, y_max);
        let accumulate = self.bounds.is_none();
        let mut acc = BoundingBox::fresh();
        let mut hits = vec![];

        match self.source {
            IndexSource::File(ref mut fi) => {
                fi.reset()?;
                while let Some(entry) = fi.next_entry()? {
                    if accumulate {
                        acc.expand_to(entry.bbox);
                    }
                    if query.intersects(entry.bbox) {
                        hits.push(self.shapefile.read_record_at(entry.byte_offset)?);
                    }
                }
            }
            IndexSource::Memory(ref mi) => {
                for entry in &mi.entries {
                    if accumulate {
                        acc.expand_to(entry.bbox);
                    }
                    if query.intersects(entry.bbox) {
                        hits.push(self.shapefile.read_record_at(entry.byte_offset)?);
                    }
                }
            }
        }

        if accumulate {
            self.bounds = Some(if acc.is_fresh() {
                BoundingBox::default()
            } else {
                acc
            });
        }
        Ok(hits)
    }

    /// The global bounding box accumulated by the last full scan, if one
    /// has happened.
    pub fn get_bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Forgets the cached global bounding box; the next `locate_records`
    /// recomputes it.
    pub fn reset_bounds(&mut self) {
        self.bounds = None;
    }

    /// All index entries in file order, for inspection and dumping.
    pub fn entries(&mut self) -> Result<Vec<SpatialIndexEntry>, ShapeError> {
        match self.source {
            IndexSource::File(ref mut fi) => {
                fi.reset()?;
                let mut entries = Vec::with_capacity(fi.num_entries());
                while let Some(entry) = fi.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
            IndexSource::Memory(ref mi) => Ok(mi.entries.clone()),
        }
    }
}
