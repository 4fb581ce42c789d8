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

//! MBC5: up to 8 MiB ROM / 128 KiB RAM. Unlike MBC1, bank 0 is directly
//! addressable through the high window - no "writing 0 selects 1" rewrite.

use crate::utils::mask_to_bits;

#[derive(Clone)]
pub struct Mbc5 {
    has_rumble: bool,

    ram_enabled: bool,
    rom_bank_low:  u8,
    rom_bank_high: u8,
    ram_bank: u8,
}

impl Mbc5 {
    pub fn new(has_rumble: bool) -> Self {
        Self {
            has_rumble,
            ram_enabled: false,
            rom_bank_low: 1,
            rom_bank_high: 0,
            ram_bank: 0,
        }
    }

    fn rom_bank_index(&self) -> u32 {
        ((self.rom_bank_high as u32) << 8) | self.rom_bank_low as u32
    }

    pub fn read_rom(&self, rom: &[u8], address: u16) -> u8 {
        let physical = if address < 0x4000 {
            address as usize
        }
        else {
            (self.rom_bank_index() as usize) * 0x4000 + (address as usize - 0x4000)
        };

        rom.get(physical % rom.len().max(1)).copied().unwrap_or(0xff)
    }

    pub fn write_register(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x1fff => {
                self.ram_enabled = (value & 0x0f) == 0x0a;
            }
            0x2000..=0x2fff => {
                self.rom_bank_low = value;
            }
            0x3000..=0x3fff => {
                self.rom_bank_high = value & 0x01;
            }
            0x4000..=0x5fff => {
                self.ram_bank = mask_to_bits(value, 4);
            }
            _ => {}
        }
    }

    /// True while the rumble motor bit (bit 3 of the RAM bank register) is
    /// set. MBC5 cartridges with rumble steal this bit from the RAM bank
    /// selector, leaving only the low 3 bits for actual RAM banking.
    pub fn rumble_active(&self) -> bool {
        self.has_rumble && (self.ram_bank & 0x08) != 0
    }

    fn effective_ram_bank(&self) -> u8 {
        if self.has_rumble { self.ram_bank & 0x07 } else { self.ram_bank }
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn read_ram(&self, ram: &[u8], address: u16) -> u8 {
        if !self.ram_enabled || ram.is_empty() {
            return 0xff;
        }

        let bank_size = 0x2000usize;
        let num_banks = (ram.len() / bank_size).max(1);
        let bank = (self.effective_ram_bank() as usize) % num_banks;
        let offset = bank * bank_size + address as usize;

        ram.get(offset).copied().unwrap_or(0xff)
    }

    pub fn write_ram(&mut self, ram: &mut [u8], address: u16, value: u8) {
        if !self.ram_enabled || ram.is_empty() {
            return;
        }

        let bank_size = 0x2000usize;
        let num_banks = (ram.len() / bank_size).max(1);
        let bank = (self.effective_ram_bank() as usize) % num_banks;
        let offset = bank * bank_size + address as usize;

        if let Some(slot) = ram.get_mut(offset) {
            *slot = value;
        }
    }

    pub fn save_state(&self, parcel: &mut crate::utils::parcel::Parcel) {
        parcel.write_bool(self.ram_enabled);
        parcel.write_u8(self.rom_bank_low);
        parcel.write_u8(self.rom_bank_high);
        parcel.write_u8(self.ram_bank);
    }

    pub fn load_state(&mut self, parcel: &mut crate::utils::parcel::Parcel) -> crate::utils::ioerr::Result<()> {
        self.ram_enabled = parcel.read_bool()?;
        self.rom_bank_low = parcel.read_u8()?;
        self.rom_bank_high = parcel.read_u8()?;
        self.ram_bank = parcel.read_u8()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn make_rom(banks: usize) -> alloc::vec::Vec<u8> {
        let mut rom = alloc::vec![0u8; banks * 0x4000];
        for (bank, chunk) in rom.chunks_mut(0x4000).enumerate() {
            chunk[0] = bank as u8;
        }
        rom
    }

    #[test]
    fn bank_zero_is_selectable_through_high_window() {
        let mut mbc = Mbc5::new(false);
        let rom = make_rom(4);
        mbc.write_register(0x2000, 0x00);
        assert_eq!(mbc.read_rom(&rom, 0x4000), 0);
    }

    #[test]
    fn nine_bit_bank_selector() {
        let mut mbc = Mbc5::new(false);
        let rom = make_rom(600);
        mbc.write_register(0x2000, 0xff);
        mbc.write_register(0x3000, 0x01);
        assert_eq!(mbc.read_rom(&rom, 0x4000), (0x1ff % 600) as u8);
    }

    #[test]
    fn rumble_bit_is_masked_out_of_ram_bank() {
        let mut mbc = Mbc5::new(true);
        let mut ram = alloc::vec![0u8; 0x8000]; // 4 banks
        mbc.write_register(0x0000, 0x0a);
        mbc.write_register(0x4000, 0x0b); // bank 3, rumble bit set
        assert!(mbc.rumble_active());
        mbc.write_ram(&mut ram, 0, 0x77);
        assert_eq!(mbc.read_ram(&ram, 0), 0x77);
    }
}
