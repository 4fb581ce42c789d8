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

//! An optional observer a debugger frontend can pass in at construction
//! time, instead of the core reaching out to one through a global or a
//! side channel.

#[cfg(feature = "dyn_alloc")]
use alloc::boxed::Box;

/// Hooks a frontend can install on a [crate::device::GameBoy] through
/// [crate::device::Builder::set_debug_hooks]. Kept to a single callback
/// deliberately: a step-by-step debugger only needs to know a tick just
/// happened and how many have happened so far, and can read back whatever
/// CPU/PPU/memory state it cares about through the device's own accessors
/// in response.
#[cfg(feature = "dyn_alloc")]
pub struct DebugHooks {
    on_tick: Box<dyn FnMut(u64)>,
}

#[cfg(feature = "dyn_alloc")]
impl DebugHooks {
    pub fn new(on_tick: impl FnMut(u64) + 'static) -> Self {
        Self { on_tick: Box::new(on_tick) }
    }

    pub(crate) fn notify_tick(&mut self, tick_count: u64) {
        (self.on_tick)(tick_count);
    }
}

#[cfg(not(feature = "dyn_alloc"))]
pub struct DebugHooks {
    _private: (),
}

#[cfg(not(feature = "dyn_alloc"))]
impl DebugHooks {
    pub(crate) fn notify_tick(&mut self, _tick_count: u64) {}
}


#[cfg(all(test, feature = "dyn_alloc"))]
mod tests {
    use super::*;

    #[test]
    fn on_tick_receives_the_running_count() {
        let seen = alloc::rc::Rc::new(core::cell::RefCell::new(0u64));
        let seen_clone = seen.clone();
        let mut hooks = DebugHooks::new(move |count| *seen_clone.borrow_mut() = count);

        hooks.notify_tick(1);
        hooks.notify_tick(2);

        assert_eq!(*seen.borrow(), 2);
    }
}
