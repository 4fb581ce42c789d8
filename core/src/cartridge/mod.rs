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

//! Cartridge ROM/RAM and the memory bank controller that maps them onto
//! the CPU's address space.
//!
//! The source this core's tick semantics are drawn from models each MBC as
//! its own virtual-dispatch subclass, further parameterized at compile
//! time by ROM/RAM size class. That produces one monomorphized type per
//! (MBC family x size class) combination for no behavioural benefit here,
//! so this core uses one tagged union - [Mbc] - with runtime-sized ROM/RAM
//! blocks shared by every variant.

pub mod header;
pub mod mbc1;
pub mod mbc5;
pub mod nombc;

#[cfg(feature = "dyn_alloc")]
use alloc::vec::Vec;

use crate::mmu::memory_data::{MemoryData, MemoryDataDynamic};
use crate::utils::ioerr;
use crate::utils::parcel::Parcel;
use header::{CartridgeHeader, MbcKind};
use mbc1::Mbc1;
use mbc5::Mbc5;
use nombc::NoMbc;

/// ROMs at or below this size with an MBC1 `cartridge_type` byte are only
/// ever multicart compilations in practice; regular MBC1 games with this
/// little content just don't bank at all. 1 MiB is the standard multicart
/// size (four 256 KiB sub-ROMs).
const MBC1_MULTICART_SIZE: usize = 0x100000;

#[derive(Clone)]
enum Mbc {
    NoMbc(NoMbc),
    Mbc1(Mbc1),
    Mbc5(Mbc5),
}

/// A loaded cartridge: its ROM and (optional) battery-backed RAM, plus the
/// bank controller that decodes CPU addresses onto them.
#[derive(Clone)]
pub struct Cartridge {
    rom: MemoryDataDynamic,
    ram: MemoryDataDynamic,
    mbc: Mbc,
    has_battery: bool,
}

impl Cartridge {
    /// Parses `data` as a ROM image and constructs the cartridge it
    /// describes. Fails on an unknown MBC id or a ROM shorter than its own
    /// header declares; see [ioerr::ErrorCode].
    pub fn create(data: Vec<u8>) -> ioerr::Result<Self> {
        let header = CartridgeHeader::parse(&data)?;

        let (mbc, has_battery) = match header.mbc_kind {
            MbcKind::NoMbc { has_battery, .. } => {
                (Mbc::NoMbc(NoMbc::new()), has_battery)
            }
            MbcKind::Mbc1 { has_battery, .. } => {
                let multicart = data.len() <= MBC1_MULTICART_SIZE && data.len() > 0x8000;
                (Mbc::Mbc1(Mbc1::new(multicart)), has_battery)
            }
            MbcKind::Mbc5 { has_battery, has_rumble, .. } => {
                (Mbc::Mbc5(Mbc5::new(has_rumble)), has_battery)
            }
        };

        let ram = MemoryDataDynamic::alloc(header.ram_size);

        Ok(Self {
            rom: MemoryDataDynamic::from_vec(data),
            ram,
            mbc,
            has_battery,
        })
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    /// Advances any cartridge-internal state clocked independently of the
    /// CPU. None of the currently supported MBCs need this (no RTC), but
    /// the core driver still calls it every tick's T0 phase so a future
    /// MBC3-with-RTC addition only needs to fill this in.
    pub fn tick(&mut self, _t_cycles: u32) {}

    pub fn read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x7fff => match &self.mbc {
                Mbc::NoMbc(m) => m.read_rom(self.rom.as_slice(), address),
                Mbc::Mbc1(m)  => m.read_rom(self.rom.as_slice(), address),
                Mbc::Mbc5(m)  => m.read_rom(self.rom.as_slice(), address),
            },
            0xa000..=0xbfff => {
                let offset = address - 0xa000;
                match &self.mbc {
                    Mbc::NoMbc(m) => m.read_ram(self.ram.as_slice(), offset),
                    Mbc::Mbc1(m)  => m.read_ram(self.ram.as_slice(), offset),
                    Mbc::Mbc5(m)  => m.read_ram(self.ram.as_slice(), offset),
                }
            }
            _ => 0xff,
        }
    }

    pub fn write(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x7fff => match &mut self.mbc {
                Mbc::NoMbc(m) => m.write_register(address, value),
                Mbc::Mbc1(m)  => m.write_register(address, value),
                Mbc::Mbc5(m)  => m.write_register(address, value),
            },
            0xa000..=0xbfff => {
                let offset = address - 0xa000;
                match &mut self.mbc {
                    Mbc::NoMbc(m) => m.write_ram(self.ram.as_slice_mut(), offset, value),
                    Mbc::Mbc1(m)  => m.write_ram(self.ram.as_slice_mut(), offset, value),
                    Mbc::Mbc5(m)  => m.write_ram(self.ram.as_slice_mut(), offset, value),
                }
            }
            _ => {}
        }
    }

    /// Copies the battery-backed RAM content out, for the shell to persist
    /// to disk between sessions. Empty if this cartridge has no RAM.
    pub fn save_ram(&self) -> Vec<u8> {
        self.ram.to_vec()
    }

    /// Restores battery-backed RAM content. Fails if `data`'s length does
    /// not match this cartridge's configured RAM size.
    pub fn load_ram(&mut self, data: &[u8]) -> ioerr::Result<()> {
        self.ram.read_from_bytes(data)
    }

    pub fn save_state(&self, parcel: &mut Parcel) {
        parcel.write_bytes(self.rom.as_slice());
        parcel.write_bytes(self.ram.as_slice());

        match &self.mbc {
            Mbc::NoMbc(_)  => {}
            Mbc::Mbc1(mbc) => mbc.save_state(parcel),
            Mbc::Mbc5(mbc) => mbc.save_state(parcel),
        }
    }

    pub fn load_state(&mut self, parcel: &mut Parcel) -> ioerr::Result<()> {
        let rom_bytes = parcel.read_bytes()?;
        let ram_bytes = parcel.read_bytes()?;

        self.rom = MemoryDataDynamic::from_vec(rom_bytes);
        self.ram = MemoryDataDynamic::from_vec(ram_bytes);

        match &mut self.mbc {
            Mbc::NoMbc(_)  => {}
            Mbc::Mbc1(mbc) => mbc.load_state(parcel)?,
            Mbc::Mbc5(mbc) => mbc.load_state(parcel)?,
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(cartridge_type: u8, rom_size_byte: u8, ram_size_byte: u8, total_len: usize) -> Vec<u8> {
        let mut rom = alloc::vec![0u8; total_len];
        rom[0x0147] = cartridge_type;
        rom[0x0148] = rom_size_byte;
        rom[0x0149] = ram_size_byte;
        rom
    }

    #[test]
    fn rom_passthrough_for_small_no_mbc_image() {
        let mut rom = rom_with_header(0x00, 0x00, 0x00, 0x8000);
        rom[0x0042] = 0x7a;
        let cartridge = Cartridge::create(rom).unwrap();
        assert_eq!(cartridge.read(0x0042), 0x7a);
    }

    #[test]
    fn mbc1_cartridge_banks_through_high_window() {
        let mut rom = rom_with_header(0x01, 0x03, 0x00, 0x20000); // 128 KiB, 8 banks
        for (bank, chunk) in rom.chunks_mut(0x4000).enumerate() {
            chunk[0] = bank as u8;
        }
        let mut cartridge = Cartridge::create(rom).unwrap();
        cartridge.write(0x2000, 3);
        assert_eq!(cartridge.read(0x4000), 3);
    }

    #[test]
    fn unknown_cartridge_type_is_rejected() {
        let rom = rom_with_header(0xff, 0x00, 0x00, 0x8000);
        assert!(Cartridge::create(rom).is_err());
    }

    #[test]
    fn ram_round_trips_through_save_and_load() {
        let rom = rom_with_header(0x03, 0x00, 0x02, 0x8000); // MBC1 + battery + 8 KiB RAM
        let mut cartridge = Cartridge::create(rom).unwrap();
        cartridge.write(0x0000, 0x0a); // enable RAM
        cartridge.write(0xa010, 0x99);
        assert_eq!(cartridge.read(0xa010), 0x99);

        let saved = cartridge.save_ram();
        let mut fresh = Cartridge::create(rom_with_header(0x03, 0x00, 0x02, 0x8000)).unwrap();
        fresh.load_ram(&saved).unwrap();
        fresh.write(0x0000, 0x0a);
        assert_eq!(fresh.read(0xa010), 0x99);
    }
}
