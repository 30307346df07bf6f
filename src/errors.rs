/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::fmt::{Debug, Display, Formatter};

use crate::bytestream::SourceError;
use crate::constants::{ColorModes, PSD_IDENTIFIER_BE};

/// Errors that can occur during PSD decoding
pub enum PsdDecodeErrors {
    /// The file does not start with `8BPS`
    WrongMagicBytes(u32),
    /// File version other than 1
    UnsupportedFileType(u16),
    /// Channel count outside 1..=56
    UnsupportedChannelCount(u16),
    /// Bit depth other than 8, 16 or 32, including
    /// depth 1 bitmap files
    UnsupportedBitDepth(u16),
    /// Color mode we cannot reconstruct, either bitmap
    /// mode or an undefined mode code
    UnsupportedColorFormat(Option<ColorModes>),
    /// ZIP compressed channel data, or a compression code
    /// the format does not define
    UnsupportedCompression(u16),
    /// An image-resource block whose signature is not `8BIM`
    BadResourceBlock(u32),
    /// Indexed image whose color-mode data cannot hold
    /// three 256-entry bands, expected and found lengths
    PaletteTooSmall(usize, usize),
    /// Width or height of zero
    ZeroDimensions,
    /// Dimensions larger than the configured or format limit,
    /// arguments are the limit and the value found
    LargeDimensions(usize, usize),
    /// The output buffer handed to `decode_into` is too small,
    /// arguments are expected and found lengths
    TooSmallBuffer(usize, usize),
    /// A size calculation overflowed
    OverFlowOccurred,
    /// The stream ended before a required byte count was
    /// available, arguments are requested and available bytes
    TruncatedInput(usize, usize),
    /// Underlying I/O error
    IoErrors(std::io::Error),
    /// Generic message
    Generic(&'static str)
}

impl Debug for PsdDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PsdDecodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
            PsdDecodeErrors::WrongMagicBytes(bytes) => {
                writeln!(
                    f,
                    "Expected {:?} but found  {:?}, not a PSD image",
                    PSD_IDENTIFIER_BE.to_be_bytes(),
                    bytes.to_be_bytes()
                )
            }
            PsdDecodeErrors::UnsupportedFileType(version) => {
                writeln!(
                    f,
                    "Unsupported file version {version:?}, known versions are 1",
                )
            }
            PsdDecodeErrors::UnsupportedChannelCount(channels) => {
                writeln!(f, "Unsupported channel count {channels:?}, must be in 1..=56")
            }
            PsdDecodeErrors::UnsupportedBitDepth(depth) => {
                writeln!(
                    f,
                    "Unsupported bit depth {depth:?}, supported depths are 8, 16 and 32",
                )
            }
            PsdDecodeErrors::UnsupportedColorFormat(color) => {
                if let Some(color) = color {
                    writeln!(f, "Unsupported color format {color:?}")
                } else {
                    writeln!(f, "Unknown color format")
                }
            }
            PsdDecodeErrors::UnsupportedCompression(method) => {
                writeln!(
                    f,
                    "Unsupported compression method {method}, only raw and RLE channel data is supported",
                )
            }
            PsdDecodeErrors::BadResourceBlock(signature) => {
                writeln!(
                    f,
                    "Invalid image resource block signature {:?}, expected 8BIM",
                    signature.to_be_bytes()
                )
            }
            PsdDecodeErrors::PaletteTooSmall(expected, found) => {
                writeln!(
                    f,
                    "Indexed color-mode data too small, expected at least {expected} bytes but found {found}",
                )
            }
            PsdDecodeErrors::ZeroDimensions => {
                writeln!(f, "Zero found where not expected")
            }
            PsdDecodeErrors::LargeDimensions(supported, found) => {
                writeln!(
                    f,
                    "Too large dimensions, supported {supported} but found {found}",
                )
            }
            PsdDecodeErrors::TooSmallBuffer(expected, found) => {
                writeln!(
                    f,
                    "Too small buffer, expected at least {expected} bytes but found {found}",
                )
            }
            PsdDecodeErrors::OverFlowOccurred => {
                writeln!(f, "A size calculation overflowed")
            }
            PsdDecodeErrors::TruncatedInput(requested, available) => {
                writeln!(
                    f,
                    "Stream ended early, requested {requested} bytes but only {available} are available",
                )
            }
            PsdDecodeErrors::IoErrors(e) => {
                writeln!(f, "I/O error :{:?}", e)
            }
        }
    }
}

impl Display for PsdDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for PsdDecodeErrors {}

impl From<&'static str> for PsdDecodeErrors {
    fn from(r: &'static str) -> Self {
        Self::Generic(r)
    }
}

impl From<SourceError> for PsdDecodeErrors {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Truncated(requested, available) => {
                Self::TruncatedInput(requested, available)
            }
            SourceError::Io(err) => Self::IoErrors(err)
        }
    }
}

impl From<std::io::Error> for PsdDecodeErrors {
    fn from(e: std::io::Error) -> Self {
        Self::IoErrors(e)
    }
}
