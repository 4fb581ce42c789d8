/*
 * Copyright (C) 2022-2025 by Christian Fischer
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

//! A byte-oriented container carrying the core's save-state format.
//!
//! A [Parcel] is written and read strictly in order: every component's
//! `save_state`/`load_state` pair must walk the same fields in the same
//! sequence, since there is no field naming, only position. In debug builds
//! each primitive is prefixed with a 1-byte type tag so a desynchronised
//! read/write pair is caught immediately instead of silently reading garbage.

#[cfg(feature = "dyn_alloc")]
use alloc::vec::Vec;

use crate::utils::ioerr::{Error, ErrorCode, Source};

/// The version written at the start of every save-state parcel.
/// Bump this whenever the fixed field layout of any component changes.
pub const SAVE_STATE_VERSION: u32 = 1;

#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum Tag {
    Bool   = 0,
    Uint8  = 1,
    Uint16 = 2,
    Uint32 = 3,
    Uint64 = 4,
    Int8   = 5,
    Int16  = 6,
    Int32  = 7,
    Int64  = 8,
    Bytes  = 11,
}

/// A growable byte buffer with a read cursor, used both to write a fresh
/// save state and to read one back. Analogous to the `Parcel` class used by
/// the hardware-accurate C++ original this core draws its tick semantics from.
#[derive(Clone, Default)]
pub struct Parcel {
    data: Vec<u8>,
    cursor: usize,
}

impl Parcel {
    /// Creates an empty parcel ready for writing.
    pub fn new() -> Self {
        Self { data: Vec::new(), cursor: 0 }
    }

    /// Wraps existing bytes for reading.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    /// Consumes this parcel, returning its backing bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Number of bytes not yet consumed by a read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// True if every byte written has been read back.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn write_tag(&mut self, tag: Tag) {
        #[cfg(debug_assertions)]
        self.data.push(tag as u8);
        #[cfg(not(debug_assertions))]
        let _ = tag;
    }

    fn read_tag(&mut self, expected: Tag) -> crate::utils::ioerr::Result<()> {
        #[cfg(debug_assertions)]
        {
            let actual = self.read_raw_u8()?;
            if actual != expected as u8 {
                return Err(corrupt());
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = expected;

        Ok(())
    }

    fn read_raw_u8(&mut self) -> crate::utils::ioerr::Result<u8> {
        if self.cursor >= self.data.len() {
            return Err(corrupt());
        }
        let value = self.data[self.cursor];
        self.cursor += 1;
        Ok(value)
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_tag(Tag::Bool);
        self.data.push(if value { 1 } else { 0 });
    }

    pub fn read_bool(&mut self) -> crate::utils::ioerr::Result<bool> {
        self.read_tag(Tag::Bool)?;
        Ok(self.read_raw_u8()? != 0)
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_tag(Tag::Uint8);
        self.data.push(value);
    }

    pub fn read_u8(&mut self) -> crate::utils::ioerr::Result<u8> {
        self.read_tag(Tag::Uint8)?;
        self.read_raw_u8()
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_tag(Tag::Uint16);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn read_u16(&mut self) -> crate::utils::ioerr::Result<u16> {
        self.read_tag(Tag::Uint16)?;
        let lo = self.read_raw_u8()?;
        let hi = self.read_raw_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_tag(Tag::Uint32);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn read_u32(&mut self) -> crate::utils::ioerr::Result<u32> {
        self.read_tag(Tag::Uint32)?;
        let mut bytes = [0u8; 4];
        for b in bytes.iter_mut() {
            *b = self.read_raw_u8()?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_tag(Tag::Uint64);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn read_u64(&mut self) -> crate::utils::ioerr::Result<u64> {
        self.read_tag(Tag::Uint64)?;
        let mut bytes = [0u8; 8];
        for b in bytes.iter_mut() {
            *b = self.read_raw_u8()?;
        }
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_tag(Tag::Int8);
        self.data.push(value as u8);
    }

    pub fn read_i8(&mut self) -> crate::utils::ioerr::Result<i8> {
        self.read_tag(Tag::Int8)?;
        Ok(self.read_raw_u8()? as i8)
    }

    /// Writes a variable-length byte blob, prefixed with its length.
    /// Used for cartridge RAM and other size-varying component state, so
    /// the shell can preallocate a buffer of the right size on load.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_tag(Tag::Bytes);
        self.write_u32_raw(bytes.len() as u32);
        self.data.extend_from_slice(bytes);
    }

    pub fn read_bytes(&mut self) -> crate::utils::ioerr::Result<Vec<u8>> {
        self.read_tag(Tag::Bytes)?;
        let len = self.read_u32_raw()? as usize;
        if self.remaining() < len {
            return Err(corrupt());
        }
        let bytes = self.data[self.cursor..self.cursor + len].to_vec();
        self.cursor += len;
        Ok(bytes)
    }

    fn write_u32_raw(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn read_u32_raw(&mut self) -> crate::utils::ioerr::Result<u32> {
        let mut bytes = [0u8; 4];
        for b in bytes.iter_mut() {
            *b = self.read_raw_u8()?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    /// Writes the save-state version header. Must be the very first call
    /// made against a freshly created parcel.
    pub fn write_version(&mut self) {
        self.write_u32_raw(SAVE_STATE_VERSION);
    }

    /// Reads and validates the save-state version header. Must be the very
    /// first call made against a freshly loaded parcel.
    pub fn read_version(&mut self) -> crate::utils::ioerr::Result<()> {
        let version = self.read_u32_raw()?;
        if version != SAVE_STATE_VERSION {
            return Err(Error {
                error_code: ErrorCode::VersionMismatch { expected: SAVE_STATE_VERSION, actual: version },
                source: Source::SaveState,
            });
        }
        Ok(())
    }

    /// Checks that every byte of the parcel was consumed. Call this after
    /// loading the last component; residue indicates a corrupt or
    /// version-mismatched state that slipped past the version check.
    pub fn finish_read(&self) -> crate::utils::ioerr::Result<()> {
        if !self.is_exhausted() {
            return Err(corrupt());
        }
        Ok(())
    }
}

fn corrupt() -> Error {
    Error { error_code: ErrorCode::CorruptParcel, source: Source::SaveState }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let mut p = Parcel::new();
        p.write_version();
        p.write_bool(true);
        p.write_u8(0x42);
        p.write_u16(0xbeef);
        p.write_u32(0xdead_beef);
        p.write_u64(0x0123_4567_89ab_cdef);
        p.write_i8(-5);
        p.write_bytes(&[1, 2, 3, 4]);

        let mut r = Parcel::from_bytes(p.into_bytes());
        r.read_version().unwrap();
        assert_eq!(r.read_bool().unwrap(), true);
        assert_eq!(r.read_u8().unwrap(), 0x42);
        assert_eq!(r.read_u16().unwrap(), 0xbeef);
        assert_eq!(r.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(r.read_u64().unwrap(), 0x0123_4567_89ab_cdef);
        assert_eq!(r.read_i8().unwrap(), -5);
        assert_eq!(r.read_bytes().unwrap(), vec![1, 2, 3, 4]);
        r.finish_read().unwrap();
    }

    #[test]
    fn detects_version_mismatch() {
        let mut p = Parcel::new();
        p.write_version();
        p.write_u8(1);

        let mut bytes = p.into_bytes();
        bytes[0] = 0xff;

        let mut r = Parcel::from_bytes(bytes);
        assert!(r.read_version().is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn detects_tag_mismatch() {
        let mut p = Parcel::new();
        p.write_u16(0x1234);

        let mut r = Parcel::from_bytes(p.into_bytes());
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn detects_residual_bytes() {
        let mut p = Parcel::new();
        p.write_u8(1);
        p.write_u8(2);

        let mut r = Parcel::from_bytes(p.into_bytes());
        let _ = r.read_u8().unwrap();
        assert!(r.finish_read().is_err());
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any arbitrary mix of primitives and a byte blob, written once and
        /// read back in the same order, must come back unchanged with
        /// nothing left over.
        #[test]
        fn arbitrary_field_sequence_round_trips(
            a: bool, b: u8, c: u16, d: u32, e: u64, f: i8, bytes in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut p = Parcel::new();
            p.write_version();
            p.write_bool(a);
            p.write_u8(b);
            p.write_u16(c);
            p.write_u32(d);
            p.write_u64(e);
            p.write_i8(f);
            p.write_bytes(&bytes);

            let mut r = Parcel::from_bytes(p.into_bytes());
            r.read_version().unwrap();
            prop_assert_eq!(r.read_bool().unwrap(), a);
            prop_assert_eq!(r.read_u8().unwrap(), b);
            prop_assert_eq!(r.read_u16().unwrap(), c);
            prop_assert_eq!(r.read_u32().unwrap(), d);
            prop_assert_eq!(r.read_u64().unwrap(), e);
            prop_assert_eq!(r.read_i8().unwrap(), f);
            prop_assert_eq!(r.read_bytes().unwrap(), bytes);
            prop_assert!(r.finish_read().is_ok());
        }
    }
}
