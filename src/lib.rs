/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A Photoshop PSD composite decoder
//!
//! This crate reads the flattened composite stored in `.PSD` files and
//! hands it back as an 8-bit `B,G,R(,A)` raster with 4-byte aligned
//! rows, the layout display and imaging pipelines expect.
//!
//! ## What it reads
//! Photoshop is a complicated format, probably one of the most
//! complicated ones, this library deliberately reads the composite
//! only. Layers, masks, adjustment data and the rest of the layer
//! section are skipped, not flattened.
//!
//! - Grayscale, duotone, indexed, RGB, CMYK, multichannel and Lab
//!   color modes, all converted to `BGR(A)`
//! - 8, 16 and 32 bit channels, folded down to 8 bits
//! - Raw and PackBits (RLE) channel data
//! - DPI and palette-transparency image resources
//!
//! Bitmap (1-bit) files, version 2 (`PSB`) files and zip compressed
//! channels are rejected with descriptive errors.
//!
//! # Example
//! - Decode a file into a raster
//! ```no_run
//! use zune_psd::errors::PsdDecodeErrors;
//! use zune_psd::PsdDecoder;
//!
//! fn main() -> Result<(), PsdDecodeErrors> {
//!     let mut decoder = PsdDecoder::from_file("composite.psd")?;
//!     let raster = decoder.decode()?;
//!
//!     println!(
//!         "{}x{} {:?}, {} bytes per row",
//!         raster.width(),
//!         raster.height(),
//!         raster.format(),
//!         raster.stride()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! In-memory buffers decode through [`ByteCursor`](bytestream::ByteCursor),
//! anything implementing [`ByteSource`](bytestream::ByteSource) works as
//! a stream.
#![forbid(unsafe_code)]

pub use constants::{BitDepth, ColorModes, CompressionMethod};
pub use decoder::{probe_psd, PsdDecoder};
pub use options::DecoderOptions;
pub use raster::{Raster, RasterFormat};

pub mod bytestream;
mod color;
mod constants;
mod decoder;
pub mod errors;
mod options;
mod raster;
