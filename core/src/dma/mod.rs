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

//! OAM DMA: a 160 byte copy from an arbitrary source page into OAM, with a
//! 4 T-cycle start delay and one byte transferred per M-cycle.
//!
//! While a transfer is in flight the CPU can only reach HRAM; everything
//! else reads 0xff, since DMA itself owns the external bus for the
//! duration. This module only tracks the controller's own state machine -
//! the driver is responsible for actually routing CPU reads through HRAM
//! only, and for handing DMA the byte it reads from the source address.

use crate::utils::parcel::Parcel;

const OAM_SIZE: usize = 160;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum State {
    Idle,

    /// Counts down the 4 T-cycle delay before the first byte is copied.
    Starting { ticks_remaining: u8 },

    /// Copying is in progress; `index` is the next OAM offset to fill,
    /// `source` the base address of the 160 byte source window, and
    /// `ticks_remaining` counts down the 4 T-cycles (one M-cycle) spent on
    /// the byte currently in flight.
    Copying { source: u16, index: u8, ticks_remaining: u8 },
}

/// What the driver should do on this tick, resolved from the controller's
/// internal state machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DmaAction {
    /// Nothing to do this tick.
    None,

    /// Read `source_address` (after echo-RAM masking) and copy it to
    /// `oam_index`. Check [Dma::just_finished] to know whether the OAM bus
    /// should be released right after this copy.
    CopyByte { source_address: u16, oam_index: u8 },
}

pub struct Dma {
    state: State,

    /// Latched value of the last write to the DMA register, re-read on
    /// state transitions to reproduce the source address.
    last_written: u8,
}

impl Dma {
    pub fn new() -> Self {
        Self { state: State::Idle, last_written: 0 }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Writing the DMA register (re)starts a transfer: a fresh 4 tick
    /// countdown begins immediately, even if one was already in progress.
    pub fn write_dma(&mut self, value: u8) {
        self.last_written = value;
        self.state = State::Starting { ticks_remaining: 4 };
    }

    pub fn read_dma(&self) -> u8 {
        self.last_written
    }

    /// Masks a DMA source address the way the controller's address latch
    /// does: anything at or above 0xe000 (echo RAM) reads through its
    /// 0xc000-0xdfff mirror instead.
    fn mask_source(source: u16) -> u16 {
        if source >= 0xe000 { source & 0xdfff } else { source }
    }

    /// Advances the controller by one T-cycle. Called at T1 of every tick;
    /// a byte is actually moved only once every four calls (one M-cycle),
    /// matching the one-byte-per-M-cycle transfer rate.
    pub fn tick(&mut self) -> DmaAction {
        match self.state {
            State::Idle => DmaAction::None,

            State::Starting { ticks_remaining } => {
                if ticks_remaining <= 1 {
                    let source = Self::mask_source((self.last_written as u16) << 8);
                    self.state = State::Copying { source, index: 0, ticks_remaining: 4 };
                }
                else {
                    self.state = State::Starting { ticks_remaining: ticks_remaining - 1 };
                }
                DmaAction::None
            }

            State::Copying { source, index, ticks_remaining } => {
                if ticks_remaining > 1 {
                    self.state = State::Copying { source, index, ticks_remaining: ticks_remaining - 1 };
                    return DmaAction::None;
                }

                let source_address = source.wrapping_add(index as u16);
                let action = DmaAction::CopyByte { source_address, oam_index: index };

                if index + 1 >= OAM_SIZE as u8 {
                    self.state = State::Idle;
                }
                else {
                    self.state = State::Copying { source, index: index + 1, ticks_remaining: 4 };
                }

                action
            }
        }
    }

    /// True exactly on the tick immediately following the 160th byte copy,
    /// letting the driver release the OAM bus.
    pub fn just_finished(&self, action: DmaAction) -> bool {
        matches!(action, DmaAction::CopyByte { oam_index, .. } if oam_index + 1 == OAM_SIZE as u8)
    }

    pub fn save_state(&self, parcel: &mut Parcel) {
        parcel.write_u8(self.last_written);
        match self.state {
            State::Idle => parcel.write_u8(0),
            State::Starting { ticks_remaining } => {
                parcel.write_u8(1);
                parcel.write_u8(ticks_remaining);
            }
            State::Copying { source, index, ticks_remaining } => {
                parcel.write_u8(2);
                parcel.write_u16(source);
                parcel.write_u8(index);
                parcel.write_u8(ticks_remaining);
            }
        }
    }

    pub fn load_state(&mut self, parcel: &mut Parcel) -> crate::utils::ioerr::Result<()> {
        self.last_written = parcel.read_u8()?;
        self.state = match parcel.read_u8()? {
            0 => State::Idle,
            1 => State::Starting { ticks_remaining: parcel.read_u8()? },
            _ => {
                let source = parcel.read_u16()?;
                let index = parcel.read_u8()?;
                let ticks_remaining = parcel.read_u8()?;
                State::Copying { source, index, ticks_remaining }
            }
        };
        Ok(())
    }
}

impl Default for Dma {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_tick_start_delay_before_first_copy() {
        let mut dma = Dma::new();
        dma.write_dma(0xc0);

        // 4 ticks of start delay, then 3 more ticks of the first M-cycle
        // before the byte is actually copied on the 8th tick.
        for _ in 0..7 {
            assert_eq!(dma.tick(), DmaAction::None);
        }

        match dma.tick() {
            DmaAction::CopyByte { source_address, oam_index } => {
                assert_eq!(source_address, 0xc000);
                assert_eq!(oam_index, 0);
            }
            other => panic!("expected first copy, got {:?}", other),
        }
    }

    #[test]
    fn copies_exactly_one_hundred_sixty_bytes_one_per_m_cycle() {
        let mut dma = Dma::new();
        dma.write_dma(0xc0);
        for _ in 0..8 {
            dma.tick();
        }

        let mut copies = 1;
        for i in 1..OAM_SIZE {
            for _ in 0..3 {
                assert_eq!(dma.tick(), DmaAction::None);
            }
            match dma.tick() {
                DmaAction::CopyByte { oam_index, .. } => {
                    assert_eq!(oam_index as usize, i);
                    copies += 1;
                }
                other => panic!("expected copy at index {i}, got {:?}", other),
            }
        }
        assert_eq!(copies, OAM_SIZE);
        assert!(!dma.is_active());
    }

    #[test]
    fn echo_ram_source_is_masked_to_wram_mirror() {
        let mut dma = Dma::new();
        dma.write_dma(0xe0); // source would be 0xe000, mirrors to 0xc000
        for _ in 0..8 {
            dma.tick();
        }
        match dma.tick() {
            DmaAction::CopyByte { source_address, .. } => assert_eq!(source_address, 0xc000),
            other => panic!("expected copy, got {:?}", other),
        }
    }
}
