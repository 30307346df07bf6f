/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(clippy::upper_case_acronyms)]

/// `8BPS`, the file magic, in big endian.
pub const PSD_IDENTIFIER_BE: u32 = 0x38425053;

/// `8BIM`, the signature of every image-resource block, in big endian.
pub const RESOURCE_BLOCK_IDENTIFIER_BE: u32 = 0x3842_494D;

/// Resource id of the ResolutionInfo block carrying DPI.
pub const RESOURCE_RESOLUTION_INFO: u16 = 1005;

/// Resource id of the transparency-index block for indexed images.
pub const RESOURCE_TRANSPARENCY_INDEX: u16 = 1047;

/// The format's own ceiling on width and height (version 1 files).
pub const PSD_MAX_DIMENSIONS: usize = 30_000;

/// The format's ceiling on the channel count.
pub const PSD_MAX_CHANNELS: usize = 56;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorModes {
    Bitmap = 0,
    Grayscale = 1,
    IndexedColor = 2,
    RGB = 3,
    CMYK = 4,
    MultiChannel = 7,
    DuoTone = 8,
    LabColor = 9
}

impl ColorModes {
    pub fn from_int(int: u16) -> Option<ColorModes> {
        use crate::constants::ColorModes::{
            Bitmap, CMYK, DuoTone, Grayscale, IndexedColor, LabColor, MultiChannel, RGB
        };

        match int {
            0 => Some(Bitmap),
            1 => Some(Grayscale),
            2 => Some(IndexedColor),
            3 => Some(RGB),
            4 => Some(CMYK),
            7 => Some(MultiChannel),
            8 => Some(DuoTone),
            9 => Some(LabColor),
            _ => None
        }
    }

    /// Index of the channel carrying alpha for this mode at the given
    /// channel count, `None` when every channel is color.
    ///
    /// Indexed images answer `None` here, their transparency comes from
    /// the palette and not from a dedicated channel.
    pub(crate) fn alpha_channel(self, channels: usize) -> Option<usize> {
        use crate::constants::ColorModes::{
            CMYK, DuoTone, Grayscale, LabColor, MultiChannel, RGB
        };

        match self {
            Grayscale | DuoTone if channels >= 2 => Some(1),
            RGB | LabColor if channels >= 4 => Some(3),
            CMYK | MultiChannel if channels >= 5 => Some(4),
            _ => None
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompressionMethod {
    NoCompression = 0,
    RLE = 1,
    ZipWithoutPrediction = 2,
    ZipWithPrediction = 3
}

impl CompressionMethod {
    pub fn from_int(int: u16) -> Option<CompressionMethod> {
        match int {
            0 => Some(Self::NoCompression),
            1 => Some(Self::RLE),
            2 => Some(Self::ZipWithoutPrediction),
            3 => Some(Self::ZipWithPrediction),
            _ => None
        }
    }
}

/// Sample precision of one channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BitDepth {
    Eight,
    Sixteen,
    ThirtyTwo
}

impl BitDepth {
    /// Depth 1 (bitmap files) and anything undefined answer `None`.
    pub fn from_int(int: u16) -> Option<BitDepth> {
        match int {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None
        }
    }

    /// Bytes occupied by a single sample at this depth.
    pub const fn size_of(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
            BitDepth::ThirtyTwo => 4
        }
    }
}
