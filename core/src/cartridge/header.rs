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

//! Parsing of the in-ROM header at 0x0100-0x014F.
//!
//! The Nintendo logo at 0x0104-0x0133 is validated by the boot ROM, not by
//! this core; nothing here rejects a ROM for a bad logo checksum.

use crate::utils::ioerr::{Error, ErrorCode, Source};

const HEADER_CARTRIDGE_TYPE:   usize = 0x0147;
const HEADER_ROM_SIZE:         usize = 0x0148;
const HEADER_RAM_SIZE:         usize = 0x0149;
const HEADER_MIN_LEN:          usize = 0x0150;

/// The family of memory bank controller declared by the cartridge header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MbcKind {
    NoMbc { has_ram: bool, has_battery: bool },
    Mbc1  { has_ram: bool, has_battery: bool, multicart: bool },
    Mbc5  { has_ram: bool, has_battery: bool, has_rumble: bool },
}

/// Header fields this core actually consumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CartridgeHeader {
    pub mbc_kind: MbcKind,
    pub rom_size: usize,
    pub ram_size: usize,
}

impl CartridgeHeader {
    /// Parses the header out of a full ROM image. Fails if the image is
    /// too short to contain a header, the `cartridge_type` byte names an
    /// MBC this core has no implementation for, or the image is shorter
    /// than the size the header itself declares.
    pub fn parse(rom: &[u8]) -> crate::utils::ioerr::Result<Self> {
        if rom.len() < HEADER_MIN_LEN {
            return Err(Error {
                error_code: ErrorCode::InvalidFileSize(crate::utils::ioerr::InvalidFileSizeError {
                    actual: rom.len(),
                    expected: HEADER_MIN_LEN,
                }),
                source: Source::RomImage,
            });
        }

        let cartridge_type = rom[HEADER_CARTRIDGE_TYPE];
        let mbc_kind = mbc_kind_from_byte(cartridge_type).ok_or(Error {
            error_code: ErrorCode::UnknownCartridgeType(cartridge_type),
            source: Source::RomImage,
        })?;

        let rom_size = rom_size_from_byte(rom[HEADER_ROM_SIZE]);
        let ram_size = ram_size_from_byte(rom[HEADER_RAM_SIZE], &mbc_kind);

        if rom.len() < rom_size {
            return Err(Error {
                error_code: ErrorCode::RomTooSmall { declared: rom_size, actual: rom.len() },
                source: Source::RomImage,
            });
        }

        Ok(Self { mbc_kind, rom_size, ram_size })
    }
}

/// Only the cartridge type IDs this core implements an MBC for are mapped;
/// everything else is a configuration error (`UnknownCartridgeType`).
///
/// MBC1 multicart ROMs (e.g. compilation carts) declare the same type byte
/// as a regular MBC1 cartridge; whether a ROM is a multicart is detected
/// from its physical size, not the header, and is applied by the caller
/// that builds the cartridge rather than here.
fn mbc_kind_from_byte(byte: u8) -> Option<MbcKind> {
    match byte {
        0x00 => Some(MbcKind::NoMbc { has_ram: false, has_battery: false }),
        0x08 => Some(MbcKind::NoMbc { has_ram: true,  has_battery: false }),
        0x09 => Some(MbcKind::NoMbc { has_ram: true,  has_battery: true  }),

        0x01 => Some(MbcKind::Mbc1 { has_ram: false, has_battery: false, multicart: false }),
        0x02 => Some(MbcKind::Mbc1 { has_ram: true,  has_battery: false, multicart: false }),
        0x03 => Some(MbcKind::Mbc1 { has_ram: true,  has_battery: true,  multicart: false }),

        0x19 => Some(MbcKind::Mbc5 { has_ram: false, has_battery: false, has_rumble: false }),
        0x1a => Some(MbcKind::Mbc5 { has_ram: true,  has_battery: false, has_rumble: false }),
        0x1b => Some(MbcKind::Mbc5 { has_ram: true,  has_battery: true,  has_rumble: false }),
        0x1c => Some(MbcKind::Mbc5 { has_ram: false, has_battery: false, has_rumble: true  }),
        0x1d => Some(MbcKind::Mbc5 { has_ram: true,  has_battery: false, has_rumble: true  }),
        0x1e => Some(MbcKind::Mbc5 { has_ram: true,  has_battery: true,  has_rumble: true  }),

        _ => None,
    }
}

/// `rom_size` is encoded as a log2 bank count: 0 -> 32 KiB (no banking),
/// 1 -> 64 KiB, ... each step doubling.
fn rom_size_from_byte(byte: u8) -> usize {
    0x8000usize << (byte as u32)
}

/// `ram_size` uses a small fixed table rather than a clean log2 scale.
/// No-MBC and MBC1 only ever see 0/2/3 in practice; MBC5 can use up to
/// 4 (128 KiB, 16 banks of 8 KiB).
fn ram_size_from_byte(byte: u8, mbc_kind: &MbcKind) -> usize {
    let has_ram = matches!(
        mbc_kind,
        MbcKind::NoMbc { has_ram: true, .. }
            | MbcKind::Mbc1 { has_ram: true, .. }
            | MbcKind::Mbc5 { has_ram: true, .. }
    );

    if !has_ram {
        return 0;
    }

    match byte {
        0x00 => 0,
        0x01 => 0x800,   // 2 KiB, only ever seen on unlicensed carts
        0x02 => 0x2000,  // 8 KiB
        0x03 => 0x8000,  // 32 KiB, 4 banks
        0x04 => 0x20000, // 128 KiB, 16 banks
        0x05 => 0x10000, // 64 KiB, 8 banks
        _    => 0x2000,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "dyn_alloc")]
    fn make_rom(cartridge_type: u8, rom_size_byte: u8, ram_size_byte: u8) -> alloc::vec::Vec<u8> {
        let mut rom = alloc::vec![0u8; HEADER_MIN_LEN];
        rom[HEADER_CARTRIDGE_TYPE] = cartridge_type;
        rom[HEADER_ROM_SIZE] = rom_size_byte;
        rom[HEADER_RAM_SIZE] = ram_size_byte;
        rom
    }

    #[cfg(feature = "dyn_alloc")]
    #[test]
    fn parses_no_mbc() {
        let rom = make_rom(0x00, 0x00, 0x00);
        let header = CartridgeHeader::parse(&rom).unwrap();
        assert_eq!(header.mbc_kind, MbcKind::NoMbc { has_ram: false, has_battery: false });
        assert_eq!(header.rom_size, 0x8000);
        assert_eq!(header.ram_size, 0);
    }

    #[cfg(feature = "dyn_alloc")]
    #[test]
    fn parses_mbc1_with_ram_and_battery() {
        let rom = make_rom(0x03, 0x02, 0x03);
        let header = CartridgeHeader::parse(&rom).unwrap();
        assert_eq!(header.mbc_kind, MbcKind::Mbc1 { has_ram: true, has_battery: true, multicart: false });
        assert_eq!(header.rom_size, 0x20000);
        assert_eq!(header.ram_size, 0x8000);
    }

    #[cfg(feature = "dyn_alloc")]
    #[test]
    fn rejects_unknown_cartridge_type() {
        let rom = make_rom(0xff, 0x00, 0x00);
        assert!(matches!(
            CartridgeHeader::parse(&rom).unwrap_err().error_code,
            ErrorCode::UnknownCartridgeType(0xff)
        ));
    }

    #[cfg(feature = "dyn_alloc")]
    #[test]
    fn rejects_rom_too_small() {
        let rom = make_rom(0x00, 0x01, 0x00); // declares 64 KiB, only has HEADER_MIN_LEN
        assert!(matches!(
            CartridgeHeader::parse(&rom).unwrap_err().error_code,
            ErrorCode::RomTooSmall { .. }
        ));
    }
}
