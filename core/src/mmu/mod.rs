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

//! The memory management unit: working RAM, high RAM and the bus
//! arbitration primitives shared by VRAM and OAM.
//!
//! The full 16 bit address decode table - which region an address falls
//! into, and which owning component answers for it - lives on
//! [crate::device::Peripherals], since only that struct can see every
//! component at once. This module only owns what is exclusively its own:
//! the two 4 KiB work RAM banks and the 127 byte high RAM block, plus the
//! [bus] primitives the PPU/cartridge/OAM DMA share.

pub mod bus;
pub mod locations;
pub mod memory_data;

use memory_data::MemoryDataFixedSize;

pub const WRAM_BANK_SIZE: usize = 0x1000;
pub const HRAM_SIZE:      usize = 0x7f;

/// Work RAM and high RAM. The DMG never banks WRAM, so bank 1 (0xc000-0xcfff)
/// and bank 2 (0xd000-0xdfff, mirrored by the echo region 0xe000-0xfdff) are
/// both always mapped; there is no `SVBK` switch here, unlike Color hardware.
#[derive(Clone)]
pub struct Mmu {
    wram1: MemoryDataFixedSize<WRAM_BANK_SIZE>,
    wram2: MemoryDataFixedSize<WRAM_BANK_SIZE>,
    hram:  MemoryDataFixedSize<HRAM_SIZE>,
}

impl Mmu {
    pub fn new() -> Self {
        Self {
            wram1: MemoryDataFixedSize::new(),
            wram2: MemoryDataFixedSize::new(),
            hram:  MemoryDataFixedSize::new(),
        }
    }

    pub fn read_wram1(&self, offset: u16) -> u8 {
        self.wram1.get_at(offset as usize)
    }

    pub fn write_wram1(&mut self, offset: u16, value: u8) {
        self.wram1.set_at(offset as usize, value);
    }

    pub fn read_wram2(&self, offset: u16) -> u8 {
        self.wram2.get_at(offset as usize)
    }

    pub fn write_wram2(&mut self, offset: u16, value: u8) {
        self.wram2.set_at(offset as usize, value);
    }

    pub fn read_hram(&self, offset: u16) -> u8 {
        self.hram.get_at(offset as usize)
    }

    pub fn write_hram(&mut self, offset: u16, value: u8) {
        self.hram.set_at(offset as usize, value);
    }

    pub fn wram1(&self) -> &MemoryDataFixedSize<WRAM_BANK_SIZE> {
        &self.wram1
    }

    pub fn wram1_mut(&mut self) -> &mut MemoryDataFixedSize<WRAM_BANK_SIZE> {
        &mut self.wram1
    }

    pub fn wram2(&self) -> &MemoryDataFixedSize<WRAM_BANK_SIZE> {
        &self.wram2
    }

    pub fn wram2_mut(&mut self) -> &mut MemoryDataFixedSize<WRAM_BANK_SIZE> {
        &mut self.wram2
    }

    pub fn hram(&self) -> &MemoryDataFixedSize<HRAM_SIZE> {
        &self.hram
    }

    pub fn hram_mut(&mut self) -> &mut MemoryDataFixedSize<HRAM_SIZE> {
        &mut self.hram
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wram_banks_are_independent() {
        let mut mmu = Mmu::new();
        mmu.write_wram1(0x10, 0xaa);
        mmu.write_wram2(0x10, 0xbb);
        assert_eq!(mmu.read_wram1(0x10), 0xaa);
        assert_eq!(mmu.read_wram2(0x10), 0xbb);
    }

    #[test]
    fn hram_round_trips() {
        let mut mmu = Mmu::new();
        mmu.write_hram(0x00, 0x42);
        mmu.write_hram(0x7e, 0x24);
        assert_eq!(mmu.read_hram(0x00), 0x42);
        assert_eq!(mmu.read_hram(0x7e), 0x24);
    }
}
