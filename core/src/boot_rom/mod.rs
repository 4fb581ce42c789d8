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

//! The 256 byte DMG boot ROM overlay and the BOOT register latch that
//! unmaps it.

#[cfg(feature = "dyn_alloc")]
use alloc::boxed::Box;

#[cfg(feature = "file_io")]
use std::{fs::File, io, io::Read, path::Path};

use crate::utils::ioerr;

pub const BOOT_ROM_SIZE: usize = 256;

/// A 256 byte DMG boot ROM image.
#[cfg(feature = "dyn_alloc")]
pub struct BootRom {
    rom: Box<[u8; BOOT_ROM_SIZE]>,
}

#[cfg(feature = "dyn_alloc")]
impl BootRom {
    pub fn new(data: [u8; BOOT_ROM_SIZE]) -> Self {
        Self { rom: Box::new(data) }
    }

    #[cfg(feature = "file_io")]
    pub fn load_file(filepath: &Path) -> io::Result<Self> {
        let mut file = File::open(filepath)?;
        let metadata = file.metadata()?;
        let file_size = metadata.len();

        if file_size != BOOT_ROM_SIZE as u64 {
            let error = ioerr::Error {
                source: ioerr::Source::BootRomImage,
                error_code: ioerr::ErrorCode::InvalidFileSize(ioerr::InvalidFileSizeError {
                    expected: BOOT_ROM_SIZE,
                    actual: file_size as usize,
                }),
            };

            return Err(error.into());
        }

        let mut buffer = [0u8; BOOT_ROM_SIZE];
        file.read_exact(&mut buffer)?;

        Ok(Self::new(buffer))
    }

    pub fn read(&self, address: u16) -> u8 {
        self.rom[address as usize]
    }
}


/// The `BOOT_ROM_DISABLE` register (0xff50). Bit 0 starts low, meaning
/// reads to 0x0000-0x00ff are redirected to the boot ROM; the first write
/// with bit 0 set latches it permanently for the rest of the session, at
/// which point those addresses go to the cartridge instead. Real hardware
/// ignores every subsequent write once latched.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct BootRomLatch {
    unmapped: bool,
}

impl BootRomLatch {
    pub fn new() -> Self {
        Self { unmapped: false }
    }

    pub fn is_active(&self) -> bool {
        !self.unmapped
    }

    pub fn read(&self) -> u8 {
        0xfe | if self.unmapped { 1 } else { 0 }
    }

    pub fn write(&mut self, value: u8) {
        if value & 0x01 != 0 {
            self.unmapped = true;
        }
    }

    pub fn save_state(&self, parcel: &mut crate::utils::parcel::Parcel) {
        parcel.write_bool(self.unmapped);
    }

    pub fn load_state(&mut self, parcel: &mut crate::utils::parcel::Parcel) -> ioerr::Result<()> {
        self.unmapped = parcel.read_bool()?;
        Ok(())
    }
}

impl Default for BootRomLatch {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_stays_active_until_first_bit0_write() {
        let mut latch = BootRomLatch::new();
        assert!(latch.is_active());
        latch.write(0x00);
        assert!(latch.is_active());
        latch.write(0x01);
        assert!(!latch.is_active());
    }

    #[test]
    fn latch_ignores_further_writes_once_unmapped() {
        let mut latch = BootRomLatch::new();
        latch.write(0x01);
        latch.write(0x00);
        assert!(!latch.is_active());
    }

    #[cfg(feature = "dyn_alloc")]
    #[test]
    fn boot_rom_reads_its_bytes() {
        let mut data = [0u8; BOOT_ROM_SIZE];
        data[0] = 0x31;
        let rom = BootRom::new(data);
        assert_eq!(rom.read(0), 0x31);
    }
}
