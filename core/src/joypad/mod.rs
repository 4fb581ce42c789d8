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

//! The joypad: a P1 register view over pressed-key state.
//!
//! The register is active-low on every bit: a 0 means "selected" or
//! "pressed", a 1 means "not selected" or "released". Unselected groups and
//! unused upper bits always read back as 1.

use crate::utils::parcel::Parcel;

/// The eight physical keys, in the bit order `set_key` and the internal
/// state byte use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Key {
    Right  = 0,
    Left   = 1,
    Up     = 2,
    Down   = 3,
    A      = 4,
    B      = 5,
    Select = 6,
    Start  = 7,
}

const DIRECTIONAL_MASK: u8 = 0b0000_1111; // Right, Left, Up, Down
const ACTION_MASK:      u8 = 0b1111_0000; // A, B, Select, Start

/// Joypad interrupt request raised on a key's release-to-pressed edge,
/// while its group is currently selected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct JoypadEvent {
    pub interrupt: bool,
}

#[derive(Clone)]
pub struct Joypad {
    /// Bit N set means key N is currently pressed (active-high, internal
    /// representation only - the P1 register itself is active-low).
    pressed: u8,

    /// P1 bits 4-5 as last written by the CPU (0 = group selected).
    select: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self { pressed: 0x00, select: 0b0011_0000 }
    }

    /// Updates the pressed/released state of a single key. Returns an
    /// event carrying whether this transition raises the JOYPAD interrupt:
    /// a release-to-pressed edge while the key's group (directional keys
    /// selected by P1 bit 4, action keys by P1 bit 5) is currently active.
    pub fn set_key(&mut self, key: Key, pressed: bool) -> JoypadEvent {
        let bit = key as u8;
        let was_pressed = (self.pressed & (1 << bit)) != 0;

        if pressed {
            self.pressed |= 1 << bit;
        }
        else {
            self.pressed &= !(1 << bit);
        }

        let group_mask = if (bit as usize) < 4 { DIRECTIONAL_MASK } else { ACTION_MASK };
        let group_selected = (self.select & self.group_select_bit(group_mask)) == 0;

        let edge_to_pressed = pressed && !was_pressed;

        JoypadEvent { interrupt: edge_to_pressed && group_selected }
    }

    fn group_select_bit(&self, group_mask: u8) -> u8 {
        if group_mask == DIRECTIONAL_MASK { 0b0001_0000 } else { 0b0010_0000 }
    }

    /// Reads the P1 register as the CPU would observe it.
    pub fn read_p1(&self) -> u8 {
        let directional_selected = (self.select & 0b0001_0000) == 0;
        let action_selected      = (self.select & 0b0010_0000) == 0;

        let mut lower = 0b0000_1111u8;

        if directional_selected {
            lower &= !(self.pressed & DIRECTIONAL_MASK);
        }
        if action_selected {
            lower &= !((self.pressed & ACTION_MASK) >> 4);
        }

        0b1100_0000 | (self.select & 0b0011_0000) | (lower & 0b0000_1111)
    }

    /// Writes the P1 register. Only bits 4-5 (group selection) are
    /// writable; the pressed-key bits are read-only from the CPU's view.
    pub fn write_p1(&mut self, value: u8) {
        self.select = value & 0b0011_0000;
    }

    pub fn save_state(&self, parcel: &mut Parcel) {
        parcel.write_u8(self.pressed);
        parcel.write_u8(self.select);
    }

    pub fn load_state(&mut self, parcel: &mut Parcel) -> crate::utils::ioerr::Result<()> {
        self.pressed = parcel.read_u8()?;
        self.select = parcel.read_u8()?;
        Ok(())
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unselected_group_reads_all_ones() {
        let mut joypad = Joypad::new();
        joypad.set_key(Key::A, true);
        // select is 0b0011_0000 (both groups deselected) by default
        assert_eq!(joypad.read_p1() & 0x0f, 0x0f);
    }

    #[test]
    fn selected_action_group_reports_pressed_key() {
        let mut joypad = Joypad::new();
        joypad.write_p1(0b0001_0000); // select action group (bit 5 low)
        joypad.set_key(Key::A, true);
        assert_eq!(joypad.read_p1() & 0x01, 0x00);
        assert_eq!(joypad.read_p1() & 0x02, 0x02);
    }

    #[test]
    fn edge_to_pressed_raises_interrupt_only_when_group_selected() {
        let mut joypad = Joypad::new();

        // directional group not selected: no interrupt
        let ev = joypad.set_key(Key::Up, true);
        assert!(!ev.interrupt);
        joypad.set_key(Key::Up, false);

        // select directional group (bit 4 low), then press again
        joypad.write_p1(0b0010_0000);
        let ev = joypad.set_key(Key::Up, true);
        assert!(ev.interrupt);
    }

    #[test]
    fn holding_a_key_does_not_repeat_the_interrupt() {
        let mut joypad = Joypad::new();
        joypad.write_p1(0b0010_0000);
        assert!(joypad.set_key(Key::Down, true).interrupt);
        assert!(!joypad.set_key(Key::Down, true).interrupt);
    }
}
