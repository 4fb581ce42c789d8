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

#[cfg(feature = "std")]
use std::fmt::{Display, Formatter};

use core::result;


/// Information about a configuration error with the error source attached.
/// Covers everything in the "configuration errors" category: failures which are
/// rejected before the core starts running and leave no partially-built state behind.
pub struct Error {
    /// An error code which describes the actual error.
    pub error_code: ErrorCode,

    /// The source type of where the error is related to.
    pub source: Source,
}


/// A source type which describes the module where an error is related to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Source {
    BootRomImage,
    RomImage,
    RamImage,
    SaveState,
}


/// An error code describing an actual configuration error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorCode {
    /// An unknown error occurred on loading data.
    UnknownError,

    /// A file to be loaded had an unexpected size.
    /// This may be the case, for example, when loading a RAM image,
    /// which has a different size than the actual RAM.
    InvalidFileSize(InvalidFileSizeError),

    /// The ROM declares a `cartridge_type` byte this core has no MBC for.
    UnknownCartridgeType(u8),

    /// The ROM image is shorter than the size its own header declares.
    RomTooSmall { declared: usize, actual: usize },

    /// A save state parcel declared a version this build does not understand.
    VersionMismatch { expected: u32, actual: u32 },

    /// A save state parcel's primitive type tags did not match the expected
    /// layout, or the parcel had residual bytes left after the last field
    /// was consumed.
    CorruptParcel,

    /// Not supported to use a specific feature here.
    NotSupported,
}


/// Additional attributes for [ErrorCode::InvalidFileSize].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidFileSizeError {
    /// The actual size of the file being loaded.
    pub actual: usize,

    /// The expected size of the file.
    pub expected: usize,
}


/// An alias type for [result::Result<T, Error>].
pub type Result<T> = result::Result<T, Error>;


#[cfg(feature = "std")]
impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::BootRomImage => write!(f, "Boot ROM"),
            Source::RomImage     => write!(f, "ROM"),
            Source::RamImage     => write!(f, "RAM"),
            Source::SaveState    => write!(f, "Save state"),
        }
    }
}


#[cfg(feature = "std")]
impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error_code)
    }
}


#[cfg(feature = "std")]
impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UnknownError => {
                write!(f, "Unknown error")
            }

            ErrorCode::InvalidFileSize(err) => {
                write!(f, "Invalid file size: {} (expected: {})", err.actual, err.expected)
            }

            ErrorCode::UnknownCartridgeType(id) => {
                write!(f, "Unknown cartridge type: {:#04x}", id)
            }

            ErrorCode::RomTooSmall { declared, actual } => {
                write!(f, "ROM image too small: header declares {} bytes, got {}", declared, actual)
            }

            ErrorCode::VersionMismatch { expected, actual } => {
                write!(f, "Save state version mismatch: expected {}, got {}", expected, actual)
            }

            ErrorCode::CorruptParcel => {
                write!(f, "Save state parcel is corrupt or was written by an incompatible build")
            }

            ErrorCode::NotSupported => {
                write!(f, "Not supported")
            }
        }
    }
}


#[cfg(feature = "std")]
impl std::error::Error for Error {}


#[cfg(feature = "file_io")]
impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    }
}
