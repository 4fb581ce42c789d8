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

//! A convenience layer over the canonical [crate::device::GameBoy::save_state]
//! format, for a shell that wants a single copyable string rather than
//! driving the byte-oriented save/load calls itself.
//!
//! This wraps the very same [crate::utils::parcel::Parcel] bytes [bincode]
//! encodes into a small envelope, [zstd] compresses, and [base64] prints.
//! The canonical format stays the one source of truth for what gets saved;
//! this module only changes how those bytes travel.

#[cfg(feature = "snapshots")]
use alloc::string::String;
#[cfg(feature = "snapshots")]
use alloc::vec::Vec;

#[cfg(feature = "snapshots")]
use base64::Engine;
#[cfg(feature = "snapshots")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "snapshots")]
use crate::device::GameBoy;
#[cfg(feature = "snapshots")]
use crate::utils::ioerr;

#[cfg(feature = "snapshots")]
#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    state: Vec<u8>,
    ram: Vec<u8>,
}

#[cfg(feature = "snapshots")]
fn wrap_error(source: ioerr::Source) -> ioerr::Error {
    ioerr::Error { error_code: ioerr::ErrorCode::CorruptParcel, source }
}

/// Packs a device's save-state and battery RAM into one base64 string.
#[cfg(feature = "snapshots")]
pub fn encode(gb: &GameBoy) -> ioerr::Result<String> {
    let payload = SnapshotPayload { state: gb.save_state(), ram: gb.save_ram() };

    let encoded = bincode::serde::encode_to_vec(&payload, bincode::config::standard())
        .map_err(|_| wrap_error(ioerr::Source::SaveState))?;

    let compressed = zstd::stream::encode_all(encoded.as_slice(), 0)
        .map_err(|_| wrap_error(ioerr::Source::SaveState))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
}

/// Restores a device from a string produced by [encode]. The cartridge
/// must already be loaded through [GameBoy::load_rom], exactly as with the
/// canonical [GameBoy::load_state] this builds on.
#[cfg(feature = "snapshots")]
pub fn decode(gb: &mut GameBoy, blob: &str) -> ioerr::Result<()> {
    let compressed = base64::engine::general_purpose::STANDARD
        .decode(blob)
        .map_err(|_| wrap_error(ioerr::Source::SaveState))?;

    let encoded = zstd::stream::decode_all(compressed.as_slice())
        .map_err(|_| wrap_error(ioerr::Source::SaveState))?;

    let (payload, _): (SnapshotPayload, usize) =
        bincode::serde::decode_from_slice(&encoded, bincode::config::standard())
            .map_err(|_| wrap_error(ioerr::Source::SaveState))?;

    gb.load_state(payload.state)?;
    if !payload.ram.is_empty() {
        gb.load_ram(&payload.ram)?;
    }
    Ok(())
}


#[cfg(all(test, feature = "snapshots"))]
mod tests {
    use super::*;
    use crate::device::GameBoy;

    fn minimal_rom() -> Vec<u8> {
        let mut rom = alloc::vec![0u8; 0x8000];
        rom[0x0147] = 0x00; // plain ROM, no MBC
        rom
    }

    #[test]
    fn encode_decode_round_trips_a_running_device() {
        let mut gb = GameBoy::builder().build();
        gb.load_rom(minimal_rom()).unwrap();
        for _ in 0..100 {
            gb.tick();
        }

        let blob = encode(&gb).unwrap();

        let mut restored = GameBoy::builder().build();
        restored.load_rom(minimal_rom()).unwrap();
        decode(&mut restored, &blob).unwrap();

        assert_eq!(gb.cpu().get_instruction_pointer(), restored.cpu().get_instruction_pointer());
    }

    #[test]
    fn garbage_input_is_rejected_without_panicking() {
        let mut gb = GameBoy::builder().build();
        gb.load_rom(minimal_rom()).unwrap();
        assert!(decode(&mut gb, "not a valid snapshot").is_err());
    }
}
