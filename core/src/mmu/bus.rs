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

//! Bus arbitration.
//!
//! A [TrivialBus] is a plain byte array with no contention: WRAM, HRAM and
//! the cartridge RAM window behave this way, since nothing but the CPU (via
//! the MMU) and DMA ever reach them, and DMA always wins outright.
//!
//! A [VideoBus] additionally tracks which masters currently hold it. VRAM
//! and OAM are each backed by one; the PPU acquires a bus while it is
//! actively fetching from it and releases it once the scanline's rendering
//! work for that memory is done, so the CPU only sees a closed bus during
//! the windows real hardware also closes it.

use flagset::{flagset, FlagSet};


flagset! {
    /// The set of components which may hold a [VideoBus] at once. Multiple
    /// masters can acquire a bus simultaneously; reads/writes are only
    /// blocked for a requester that is *not* in the current holder set.
    pub enum BusMaster: u8 {
        Cpu,
        Ppu,
        Dma,
    }
}

/// Outcome of a bus access request issued at T0 of a tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusAccess {
    /// The byte actually stored at the requested address.
    Value(u8),

    /// The bus is held by another master; real hardware returns `0xff` and
    /// silently drops writes while this is the case.
    Blocked,
}

impl BusAccess {
    /// The value observed at the end of the tick, applying the "blocked
    /// reads return 0xff" rule uniformly.
    pub fn resolve(self) -> u8 {
        match self {
            BusAccess::Value(v) => v,
            BusAccess::Blocked => 0xff,
        }
    }
}


/// A plain, uncontended byte array addressed with a base offset subtracted
/// from the incoming 16 bit CPU address.
#[derive(Clone)]
pub struct TrivialBus<D> {
    data: D,
}

impl<D: crate::mmu::memory_data::MemoryData> TrivialBus<D> {
    pub fn new(data: D) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    pub fn read(&self, address: usize) -> u8 {
        if address < self.data.size() {
            self.data.get_at(address)
        }
        else {
            0xff
        }
    }

    pub fn write(&mut self, address: usize, value: u8) {
        if address < self.data.size() {
            self.data.set_at(address, value);
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }
}


/// A byte array whose access may be blocked for a given requester, depending
/// on which masters currently hold it. Models VRAM and OAM.
#[derive(Clone)]
pub struct VideoBus<D> {
    data: D,
    holders: FlagSet<BusMaster>,

    /// Pending access requests issued at T0, resolved and applied at T2/T3.
    read_request:  Option<(usize, BusMaster)>,
    write_request: Option<(usize, u8, BusMaster)>,
}

impl<D: crate::mmu::memory_data::MemoryData> VideoBus<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            holders: FlagSet::default(),
            read_request: None,
            write_request: None,
        }
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Grants `master` access to this bus. Called by the PPU when it begins
    /// fetching from this memory for the current scanline.
    pub fn acquire(&mut self, master: BusMaster) {
        self.holders |= master;
    }

    /// Revokes `master`'s access. Called once the PPU is done with this
    /// memory for the current mode.
    pub fn release(&mut self, master: BusMaster) {
        self.holders -= master;
    }

    /// True while any master besides `requester` holds this bus, meaning
    /// `requester` is blocked.
    fn is_blocked_for(&self, requester: BusMaster) -> bool {
        !self.holders.is_empty() && !self.holders.contains(requester)
    }

    /// T0: a master asks to read `address`. The actual byte is not observed
    /// until [Self::flush_read_request] is called at T2.
    pub fn read_request(&mut self, address: usize, requester: BusMaster) {
        self.read_request = Some((address, requester));
    }

    /// T0: a master asks to write `value` to `address`, applied at T2.
    pub fn write_request(&mut self, address: usize, value: u8, requester: BusMaster) {
        self.write_request = Some((address, value, requester));
    }

    /// T2: resolves the outstanding read request, honoring bus contention.
    pub fn flush_read_request(&mut self) -> Option<BusAccess> {
        let (address, requester) = self.read_request.take()?;

        let access = if self.is_blocked_for(requester) {
            BusAccess::Blocked
        }
        else if address < self.data.size() {
            BusAccess::Value(self.data.get_at(address))
        }
        else {
            BusAccess::Value(0xff)
        };

        Some(access)
    }

    /// T2: resolves the outstanding write request, honoring bus contention.
    /// Blocked writes are silently dropped, matching real hardware.
    pub fn flush_write_request(&mut self) {
        let Some((address, value, requester)) = self.write_request.take() else {
            return;
        };

        if self.is_blocked_for(requester) {
            return;
        }

        if address < self.data.size() {
            self.data.set_at(address, value);
        }
    }

    /// Direct access bypassing the request queue and contention check,
    /// reserved for DMA and for components like the debugger that must be
    /// able to read/write memory outside of the phased tick cycle.
    pub fn read_direct(&self, address: usize) -> u8 {
        if address < self.data.size() {
            self.data.get_at(address)
        }
        else {
            0xff
        }
    }

    pub fn write_direct(&mut self, address: usize, value: u8) {
        if address < self.data.size() {
            self.data.set_at(address, value);
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::memory_data::MemoryDataFixedSize;

    #[test]
    fn trivial_bus_reads_and_writes() {
        let mut bus = TrivialBus::new(MemoryDataFixedSize::<16>::new());
        bus.write(4, 0x42);
        assert_eq!(bus.read(4), 0x42);
        assert_eq!(bus.read(100), 0xff);
    }

    #[test]
    fn video_bus_blocks_non_holders() {
        let mut bus = VideoBus::new(MemoryDataFixedSize::<16>::new());
        bus.write_direct(0, 0x11);

        bus.acquire(BusMaster::Ppu);

        bus.read_request(0, BusMaster::Cpu);
        assert_eq!(bus.flush_read_request(), Some(BusAccess::Blocked));

        bus.read_request(0, BusMaster::Ppu);
        assert_eq!(bus.flush_read_request(), Some(BusAccess::Value(0x11)));

        bus.release(BusMaster::Ppu);
        bus.read_request(0, BusMaster::Cpu);
        assert_eq!(bus.flush_read_request(), Some(BusAccess::Value(0x11)));
    }

    #[test]
    fn video_bus_drops_blocked_writes() {
        let mut bus = VideoBus::new(MemoryDataFixedSize::<16>::new());
        bus.acquire(BusMaster::Ppu);

        bus.write_request(0, 0x99, BusMaster::Cpu);
        bus.flush_write_request();

        assert_eq!(bus.read_direct(0), 0x00);
    }
}
