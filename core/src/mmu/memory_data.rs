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

#[cfg(feature = "dyn_alloc")]
use alloc::vec::Vec;

use crate::utils::ioerr;


/// Any kind of addressable byte storage: VRAM, WRAM, OAM, HRAM, ROM or
/// cartridge RAM. Buses hold non-owning references into these blocks;
/// the block itself is always owned by exactly one component.
pub trait MemoryData {
    fn size(&self) -> usize;
    fn get_at(&self, address: usize) -> u8;
    fn set_at(&mut self, address: usize, value: u8);
    fn as_slice(&self) -> &[u8];
    fn as_slice_mut(&mut self) -> &mut [u8];

    /// Reads this block's content from a byte slice of exactly matching size.
    fn read_from_bytes(&mut self, bytes: &[u8]) -> ioerr::Result<()> {
        if bytes.len() != self.size() {
            return Err(ioerr::Error {
                error_code: ioerr::ErrorCode::InvalidFileSize(ioerr::InvalidFileSizeError {
                    actual: bytes.len(),
                    expected: self.size(),
                }),
                source: ioerr::Source::RamImage,
            });
        }

        self.as_slice_mut().copy_from_slice(bytes);
        Ok(())
    }
}


/// A fixed-size block of memory, sized at compile time. Used for the small,
/// hardware-fixed regions: VRAM, the two WRAM banks, OAM and HRAM.
///
/// Save states serialize these blocks through [MemoryData::as_slice] into a
/// `Parcel` via `write_bytes`/`read_bytes` rather than through `serde`
/// directly, since `serde`'s derive has no blanket support for arrays this
/// large.
#[derive(Clone)]
pub struct MemoryDataFixedSize<const SIZE: usize> {
    data: [u8; SIZE],
}


impl<const SIZE: usize> MemoryDataFixedSize<SIZE> {
    pub fn new() -> Self {
        Self { data: [0x00; SIZE] }
    }
}


impl<const SIZE: usize> Default for MemoryDataFixedSize<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}


impl<const SIZE: usize> MemoryData for MemoryDataFixedSize<SIZE> {
    fn size(&self) -> usize {
        SIZE
    }

    fn get_at(&self, address: usize) -> u8 {
        self.data[address]
    }

    fn set_at(&mut self, address: usize, value: u8) {
        self.data[address] = value;
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}


impl<const SIZE: usize> core::ops::Index<usize> for MemoryDataFixedSize<SIZE> {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}


impl<const SIZE: usize> core::ops::IndexMut<usize> for MemoryDataFixedSize<SIZE> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}


/// A block of memory whose size is only known at runtime: the cartridge ROM
/// (32 KiB through 8 MiB, chosen by the header's `rom_size` byte) and
/// optional cartridge RAM (0 through 128 KiB, chosen by `ram_size`).
///
/// The original source models this split by ROM/RAM size class as a
/// compile-time type parameter per cartridge subclass; that only bloats the
/// binary with near-identical monomorphized code paths, so this core keeps
/// a single runtime-sized `Vec` instead.
#[cfg(feature = "dyn_alloc")]
#[derive(Clone)]
pub struct MemoryDataDynamic {
    data: Vec<u8>,
}


#[cfg(feature = "dyn_alloc")]
impl MemoryDataDynamic {
    /// Allocates a block filled with `0xff`, matching the bus-float value an
    /// unconnected line reads back as.
    pub fn alloc(size: usize) -> Self {
        Self { data: alloc::vec![0xff; size] }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }
}


#[cfg(feature = "dyn_alloc")]
impl MemoryData for MemoryDataDynamic {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn get_at(&self, address: usize) -> u8 {
        self.data[address]
    }

    fn set_at(&mut self, address: usize, value: u8) {
        self.data[address] = value;
    }

    fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn as_slice_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }
}


#[cfg(feature = "dyn_alloc")]
impl core::ops::Index<usize> for MemoryDataDynamic {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}


#[cfg(feature = "dyn_alloc")]
impl core::ops::IndexMut<usize> for MemoryDataDynamic {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}
