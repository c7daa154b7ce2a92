/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 15/09/2022
License: MIT
*/
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::prelude::*;
use std::io::{Result, SeekFrom};

/// A positional reader with a switchable byte order. Several of the binary
/// formats this library handles interleave big-endian and little-endian
/// fields within a single file, so the byte order can be flipped
/// mid-stream with `set_byte_order`.
///
/// Each reader owns its source and its cursor; there is no shared scratch
/// state between readers, so independent instances may be used from
/// different threads.
pub struct ByteOrderReader<R: Read + Seek> {
    is_le: bool,
    reader: R,
    pos: usize,
    len: usize,
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(reader: R, byte_order: Endianness) -> Result<ByteOrderReader<R>> {
        let is_le = byte_order == Endianness::LittleEndian;
        let mut bor = ByteOrderReader {
            reader: reader,
            is_le: is_le,
            pos: 0usize,
            len: 0, // don't know the length yet
        };
        // now get the length
        let len = bor.reader.seek(SeekFrom::End(0))? as usize;
        bor.len = len;
        bor.seek(0)?; // return the cursor to the start.
        Ok(bor)
    }

    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.is_le = byte_order == Endianness::LittleEndian;
    }

    pub fn get_byte_order(&self) -> Endianness {
        if self.is_le {
            return Endianness::LittleEndian;
        }
        Endianness::BigEndian
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.pos = position;
        self.reader.seek(SeekFrom::Start(self.pos as u64))?;
        Ok(())
    }

    pub fn inc_pos(&mut self, skip: usize) -> Result<()> {
        self.pos += skip;
        self.reader.seek(SeekFrom::Start(self.pos as u64))?;
        Ok(())
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.pos += buf.len();
        self.reader.read_exact(buf)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.pos += 4;
        if self.is_le {
            return self.reader.read_i32::<LittleEndian>();
        }
        self.reader.read_i32::<BigEndian>()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.pos += 8;
        if self.is_le {
            return self.reader.read_f64::<LittleEndian>();
        }
        self.reader.read_f64::<BigEndian>()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

impl Default for Endianness {
    fn default() -> Endianness {
        Endianness::LittleEndian
    }
}

#[cfg(test)]
mod test {
    use super::{ByteOrderReader, Endianness};
    use std::io::Cursor;

    #[test]
    fn test_reader_mixed_endianness() {
        // 9994 big-endian followed by 1000 little-endian
        let bytes = vec![0x00, 0x00, 0x27, 0x0A, 0xE8, 0x03, 0x00, 0x00];
        let mut bor =
            ByteOrderReader::new(Cursor::new(bytes), Endianness::BigEndian).unwrap();
        assert_eq!(bor.read_i32().unwrap(), 9994);
        bor.set_byte_order(Endianness::LittleEndian);
        assert_eq!(bor.read_i32().unwrap(), 1000);
        assert_eq!(bor.pos(), 8);
        assert_eq!(bor.len(), 8);
    }

    #[test]
    fn test_reader_f64() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&(-123.25f64).to_le_bytes());
        let mut bor =
            ByteOrderReader::new(Cursor::new(bytes), Endianness::LittleEndian).unwrap();
        assert_eq!(bor.read_f64().unwrap(), -123.25);
    }

    #[test]
    fn test_reader_seek_and_eof() {
        let bytes = vec![0u8; 4];
        let mut bor =
            ByteOrderReader::new(Cursor::new(bytes), Endianness::BigEndian).unwrap();
        bor.seek(2).unwrap();
        // only two bytes remain; a four-byte read must fail, not truncate
        assert!(bor.read_i32().is_err());
    }
}
