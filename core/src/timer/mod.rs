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

//! DIV/TIMA/TMA/TAC, including the falling-edge TIMA clock and the
//! four-tick reload delay after overflow.

use crate::utils::parcel::Parcel;

/// The DIV16 bit TIMA is clocked from, selected by TAC bits 0-1.
const TIMA_CLOCK_BIT: [u8; 4] = [9, 3, 5, 7];

/// What stage of the overflow-reload sequence TIMA is in. The falling edge
/// that causes an overflow is detected at T1 of some tick; the reload and
/// interrupt do not happen until four ticks later, and a write to TIMA
/// during the intervening window cancels the whole sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ReloadState {
    Idle,
    /// `ticks_remaining` counts down from 4 to 0; at 0 the reload commits.
    Pending { ticks_remaining: u8 },
}

#[derive(Clone)]
pub struct Timer {
    div16: u16,
    tima: u8,
    tma: u8,
    tac: u8,

    reload: ReloadState,

    /// The TIMA clock input (AND of the selected DIV16 bit and TAC's
    /// enable bit) as observed on the previous tick, used to detect the
    /// falling edge that increments TIMA.
    last_clock_input: bool,
}

/// Side effects a single tick of the timer may produce, consumed by the
/// driver to update the shared interrupt-flag register.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct TimerEvent {
    pub timer_interrupt: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div16: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            reload: ReloadState::Idle,
            last_clock_input: false,
        }
    }

    fn clock_input(&self) -> bool {
        let enabled = (self.tac & 0b100) != 0;
        let bit = TIMA_CLOCK_BIT[(self.tac & 0b011) as usize];
        enabled && ((self.div16 >> bit) & 1) != 0
    }

    /// Advances DIV16 by one T-cycle and runs the falling-edge TIMA clock
    /// and pending reload sequence. Called once per tick, at T1.
    pub fn tick(&mut self) -> TimerEvent {
        self.div16 = self.div16.wrapping_add(1);
        self.step_tima_clock()
    }

    fn step_tima_clock(&mut self) -> TimerEvent {
        let mut event = TimerEvent::default();

        // The reload countdown runs regardless of the clock-input edge.
        if let ReloadState::Pending { ticks_remaining } = &mut self.reload {
            if *ticks_remaining == 0 {
                self.tima = self.tma;
                self.reload = ReloadState::Idle;
                event.timer_interrupt = true;
            }
            else {
                *ticks_remaining -= 1;
            }
        }

        let clock_input = self.clock_input();
        if self.last_clock_input && !clock_input {
            self.increment_tima();
        }
        self.last_clock_input = clock_input;

        event
    }

    fn increment_tima(&mut self) {
        let (result, overflow) = self.tima.overflowing_add(1);
        self.tima = result;

        if overflow {
            // Three more ticks will read TIMA as 0 before the fourth tick
            // after the overflow commits the reload (see tick_tima_clock).
            self.reload = ReloadState::Pending { ticks_remaining: 3 };
        }
    }

    pub fn read_div(&self) -> u8 {
        (self.div16 >> 8) as u8
    }

    /// DIV16 bit 7, the clock the serial port's shift register is driven
    /// from. Exposed separately since only the timer owns DIV16 itself.
    pub fn div16_bit7(&self) -> bool {
        (self.div16 >> 7) & 1 != 0
    }

    /// Directly seeds DIV16 to an arbitrary value, bypassing the falling-edge
    /// re-evaluation a normal [Self::write_div] would run. Only meant for a
    /// driver placing the timer straight into its post-boot state, skipping
    /// the boot ROM's own DIV-driven timing.
    pub fn seed_div16(&mut self, value: u16) {
        self.div16 = value;
        self.last_clock_input = self.clock_input();
    }

    /// A write to DIV (any value) resets the internal 16 bit counter to 0.
    /// Since this can flip the TIMA clock's selected bit from 1 to 0, it
    /// can spuriously trigger a TIMA increment exactly like a falling edge
    /// from normal counting would.
    pub fn write_div(&mut self) {
        self.div16 = 0;
        let clock_input = self.clock_input();
        if self.last_clock_input && !clock_input {
            self.increment_tima();
        }
        self.last_clock_input = clock_input;
    }

    pub fn read_tima(&self) -> u8 {
        self.tima
    }

    /// A write during the four-tick reload delay cancels the reload; the
    /// write value is kept as-is. A write on the very reload tick itself
    /// (`ticks_remaining == 0`, about to commit) is ignored, since real
    /// hardware's internal reload mux has already latched TMA by then.
    pub fn write_tima(&mut self, value: u8) {
        if let ReloadState::Pending { ticks_remaining } = self.reload {
            if ticks_remaining == 0 {
                return;
            }
            self.reload = ReloadState::Idle;
        }
        self.tima = value;
    }

    pub fn read_tma(&self) -> u8 {
        self.tma
    }

    pub fn write_tma(&mut self, value: u8) {
        self.tma = value;
    }

    pub fn read_tac(&self) -> u8 {
        0b1111_1000 | self.tac
    }

    /// A write to TAC can change both the enable bit and the clock-select
    /// bits, either of which can flip the AND-output from 1 to 0 and so
    /// spuriously clock TIMA, exactly as a DIV write can.
    pub fn write_tac(&mut self, value: u8) {
        self.tac = value & 0b111;
        let clock_input = self.clock_input();
        if self.last_clock_input && !clock_input {
            self.increment_tima();
        }
        self.last_clock_input = clock_input;
    }

    pub fn save_state(&self, parcel: &mut Parcel) {
        parcel.write_u16(self.div16);
        parcel.write_u8(self.tima);
        parcel.write_u8(self.tma);
        parcel.write_u8(self.tac);
        match self.reload {
            ReloadState::Idle => parcel.write_bool(false),
            ReloadState::Pending { ticks_remaining } => {
                parcel.write_bool(true);
                parcel.write_u8(ticks_remaining);
            }
        }
        parcel.write_bool(self.last_clock_input);
    }

    pub fn load_state(&mut self, parcel: &mut Parcel) -> crate::utils::ioerr::Result<()> {
        self.div16 = parcel.read_u16()?;
        self.tima = parcel.read_u8()?;
        self.tma = parcel.read_u8()?;
        self.tac = parcel.read_u8()?;
        self.reload = if parcel.read_bool()? {
            ReloadState::Pending { ticks_remaining: parcel.read_u8()? }
        }
        else {
            ReloadState::Idle
        };
        self.last_clock_input = parcel.read_bool()?;
        Ok(())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_is_the_high_byte_of_div16() {
        let mut timer = Timer::new();
        for _ in 0..256 {
            timer.tick();
        }
        assert_eq!(timer.read_div(), 1);
    }

    #[test]
    fn div_write_resets_counter() {
        let mut timer = Timer::new();
        for _ in 0..300 {
            timer.tick();
        }
        timer.write_div();
        assert_eq!(timer.read_div(), 0);
    }

    #[test]
    fn tima_overflow_interrupt_fires_twenty_ticks_after_overflow() {
        // TAC=0x05 -> enabled, clock bit 3 (divide by 16)
        let mut timer = Timer::new();
        timer.write_tac(0x05);
        timer.write_tima(0xff);
        timer.write_tma(0x42);

        let mut interrupt_tick = None;
        for i in 1..=32 {
            let event = timer.tick();
            if event.timer_interrupt {
                interrupt_tick = Some(i);
                break;
            }
        }

        // 16 ticks to overflow the selected bit + 4 ticks reload delay = tick 20
        assert_eq!(interrupt_tick, Some(20));
        assert_eq!(timer.read_tima(), 0x42);
    }

    #[test]
    fn write_during_reload_window_cancels_it() {
        let mut timer = Timer::new();
        timer.write_tac(0x05);
        timer.write_tima(0xff);
        timer.write_tma(0x42);

        for _ in 0..16 {
            timer.tick();
        }
        assert_eq!(timer.read_tima(), 0x00);

        // cancel the pending reload
        timer.write_tima(0x10);

        let mut interrupt_seen = false;
        for _ in 0..8 {
            if timer.tick().timer_interrupt {
                interrupt_seen = true;
            }
        }
        assert!(!interrupt_seen);
        assert_eq!(timer.read_tima(), 0x10);
    }

    #[test]
    fn div16_bit7_toggles_every_128_ticks() {
        let mut timer = Timer::new();
        assert!(!timer.div16_bit7());
        for _ in 0..128 {
            timer.tick();
        }
        assert!(timer.div16_bit7());
    }

    #[test]
    fn seed_div16_sets_counter_without_clocking_tima() {
        let mut timer = Timer::new();
        timer.write_tac(0x05); // enabled, clocked from bit 3
        timer.seed_div16(0xabf0);
        assert_eq!(timer.read_div(), 0xab);
        assert_eq!(timer.read_tima(), 0x00);
    }

    #[test]
    fn tac_upper_bits_always_read_as_one() {
        let mut timer = Timer::new();
        timer.write_tac(0x00);
        assert_eq!(timer.read_tac(), 0b1111_1000);
    }
}
