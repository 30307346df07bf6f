/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A PSD composite decoder.
//!
//! Parses the container sequentially, header, color-mode data, image
//! resources, layer/mask section (skipped), then channel data, and
//! reconstructs the composite into a stride-aware BGR(A) raster.
use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{trace, warn};

use crate::bytestream::{ByteReader, ByteSource};
use crate::color::{transparent_triple, PixelReconstructor};
use crate::constants::{
    BitDepth, ColorModes, CompressionMethod, PSD_IDENTIFIER_BE, PSD_MAX_CHANNELS,
    PSD_MAX_DIMENSIONS, RESOURCE_BLOCK_IDENTIFIER_BE, RESOURCE_RESOLUTION_INFO,
    RESOURCE_TRANSPARENCY_INDEX
};
use crate::errors::PsdDecodeErrors;
use crate::options::DecoderOptions;
use crate::raster::{PixelWriter, Raster, RasterFormat};

/// Probe some bytes to see
/// if they consist of a PSD image
///
/// # Returns
/// - true: Probable PSD
/// - false: Not a PSD
pub fn probe_psd(bytes: &[u8]) -> bool {
    if let Some(magic_bytes) = bytes.get(0..4) {
        if magic_bytes == b"8BPS" {
            // version, always 1 for files this decoder reads
            if let Some(version) = bytes.get(4..6) {
                return version == [0, 1];
            }
        }
    }
    false
}

/// A Photoshop PSD composite reader.
///
/// Decodes the flattened composite stored at the end of the file,
/// layers and masks are skipped, not flattened. Indexed, grayscale,
/// duotone, RGB, CMYK, multichannel and Lab images come out as 8-bit
/// B,G,R(,A) pixels regardless of their stored depth.
pub struct PsdDecoder<T>
where
    T: ByteSource
{
    stream:             ByteReader<T>,
    options:            DecoderOptions,
    width:              usize,
    height:             usize,
    channel_count:      usize,
    depth:              BitDepth,
    color_mode:         Option<ColorModes>,
    compression:        CompressionMethod,
    palette:            Vec<u8>,
    dpi:                Option<(u16, u16)>,
    transparency_index: i16,
    decoded_headers:    bool
}

impl PsdDecoder<BufReader<File>> {
    /// Open `path` and create a decoder reading from it through a
    /// buffered reader.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PsdDecoder<BufReader<File>>, PsdDecodeErrors> {
        let file = File::open(path)?;

        Ok(PsdDecoder::new(BufReader::new(file)))
    }
}

impl<T> PsdDecoder<T>
where
    T: ByteSource
{
    /// Create a new decoder that reads a photoshop encoded file
    /// from `T` and returns pixels
    ///
    /// # Arguments
    /// - data: Data source, it has to implement the `ByteSource` trait
    pub fn new(data: T) -> PsdDecoder<T> {
        Self::new_with_options(data, DecoderOptions::default())
    }

    /// Creates a new decoder with options that influence decoding routines
    ///
    /// # Arguments
    /// - data: Data source
    /// - options: Custom options for the decoder
    pub fn new_with_options(data: T, options: DecoderOptions) -> PsdDecoder<T> {
        PsdDecoder {
            stream: ByteReader::new(data),
            options,
            width: 0,
            height: 0,
            channel_count: 0,
            depth: BitDepth::Eight,
            color_mode: None,
            compression: CompressionMethod::NoCompression,
            palette: Vec::new(),
            dpi: None,
            transparency_index: -1,
            decoded_headers: false
        }
    }

    /// Decode headers from the encoded image
    ///
    /// This confirms the image is a photoshop image and extracts
    /// everything up to the channel data: geometry, depth, color mode,
    /// the palette, DPI and transparency resources and the compression
    /// method. Safe to call more than once, later calls are no-ops.
    pub fn decode_headers(&mut self) -> Result<(), PsdDecodeErrors> {
        if self.decoded_headers {
            return Ok(());
        }
        // Check identifier
        let magic = self.stream.get_u32_be()?;

        if magic != PSD_IDENTIFIER_BE {
            return Err(PsdDecodeErrors::WrongMagicBytes(magic));
        }

        // file version
        let version = self.stream.get_u16_be()?;

        if version != 1 {
            return Err(PsdDecodeErrors::UnsupportedFileType(version));
        }
        // Skip 6 reserved bytes
        self.stream.skip(6)?;
        // Number of channels (R, G, B, A, etc), alpha included
        let channel_count = self.stream.get_u16_be()?;

        if !(1..=PSD_MAX_CHANNELS as u16).contains(&channel_count) {
            return Err(PsdDecodeErrors::UnsupportedChannelCount(channel_count));
        }

        self.channel_count = usize::from(channel_count);

        let height = self.stream.get_u32_be()? as usize;
        let width = self.stream.get_u32_be()? as usize;

        if width > self.options.get_max_width() {
            return Err(PsdDecodeErrors::LargeDimensions(
                self.options.get_max_width(),
                width
            ));
        }

        if height > self.options.get_max_height() {
            return Err(PsdDecodeErrors::LargeDimensions(
                self.options.get_max_height(),
                height
            ));
        }
        // the format itself stops at 30000 either way
        if width > PSD_MAX_DIMENSIONS || height > PSD_MAX_DIMENSIONS {
            return Err(PsdDecodeErrors::LargeDimensions(
                PSD_MAX_DIMENSIONS,
                width.max(height)
            ));
        }

        self.width = width;
        self.height = height;

        if self.width == 0 || self.height == 0 {
            return Err(PsdDecodeErrors::ZeroDimensions);
        }

        let depth = self.stream.get_u16_be()?;

        self.depth = match BitDepth::from_int(depth) {
            Some(depth) => depth,
            None => return Err(PsdDecodeErrors::UnsupportedBitDepth(depth))
        };

        let color_mode = self.stream.get_u16_be()?;
        let color_enum = ColorModes::from_int(color_mode);

        match color_enum {
            Some(ColorModes::Bitmap) | None => {
                return Err(PsdDecodeErrors::UnsupportedColorFormat(color_enum));
            }
            Some(color) => {
                // reconstruction reads a fixed set of leading channels
                // per mode, make sure they exist before touching pixels
                let min_channels = match color {
                    ColorModes::RGB | ColorModes::LabColor => 3,
                    ColorModes::CMYK => 4,
                    _ => 1
                };

                if self.channel_count < min_channels {
                    return Err(PsdDecodeErrors::UnsupportedChannelCount(channel_count));
                }
            }
        }
        self.color_mode = color_enum;

        trace!("Image width: {}", self.width);
        trace!("Image height: {}", self.height);
        trace!("Channels: {}", self.channel_count);
        trace!("Bit depth: {:?}", self.depth);
        trace!("Color mode: {:?}", self.color_mode);

        // color mode data section, the palette for indexed and
        // duotone images
        self.decode_palette()?;
        // tagged image resource blocks, dpi and transparency live here
        self.decode_image_resources()?;
        // layer and mask section, structurally present but never
        // interpreted by the composite decoder
        let layer_section = self.stream.get_u32_be()? as usize;
        trace!("Skipping layer/mask section: {} bytes", layer_section);
        self.stream.skip(layer_section)?;

        // find out how channel data is stored
        let compression = self.stream.get_u16_be()?;

        self.compression = match CompressionMethod::from_int(compression) {
            Some(CompressionMethod::NoCompression) => CompressionMethod::NoCompression,
            Some(CompressionMethod::RLE) => CompressionMethod::RLE,
            // zip modes are defined by the format but not decodable here
            _ => return Err(PsdDecodeErrors::UnsupportedCompression(compression))
        };
        trace!("Compression: {:?}", self.compression);

        self.decoded_headers = true;

        Ok(())
    }

    /// Read the color-mode data section.
    fn decode_palette(&mut self) -> Result<(), PsdDecodeErrors> {
        let length = self.stream.get_u32_be()? as usize;

        if length > 0 {
            trace!("Color mode data: {} bytes", length);

            if !matches!(
                self.color_mode,
                Some(ColorModes::IndexedColor | ColorModes::DuoTone)
            ) {
                warn!("Color mode data present but the color mode does not use it");
            }
            // read in steps so a forged length fails at the stream's
            // real end instead of reserving the declared size up front
            let mut palette = Vec::new();
            let mut chunk = [0_u8; 1024];
            let mut remaining = length;

            while remaining > 0 {
                let take = remaining.min(chunk.len());

                self.stream.read_exact(&mut chunk[..take])?;
                palette.extend_from_slice(&chunk[..take]);
                remaining -= take;
            }
            self.palette = palette;
        }
        Ok(())
    }

    /// Walk the image-resources section, keeping DPI and the
    /// transparency index and skipping every other block.
    fn decode_image_resources(&mut self) -> Result<(), PsdDecodeErrors> {
        let section_length = self.stream.get_u32_be()?;
        let section_end = self.stream.position()? + u64::from(section_length);

        while self.stream.position()? < section_end {
            let signature = self.stream.get_u32_be()?;

            if signature != RESOURCE_BLOCK_IDENTIFIER_BE {
                return Err(PsdDecodeErrors::BadResourceBlock(signature));
            }
            let id = self.stream.get_u16_be()?;

            // Pascal-style name. A nonzero odd length byte is followed
            // by one extra length byte keeping the field 2-byte
            // aligned, and one padding byte always trails the name.
            let name_length = usize::from(self.stream.get_u8()?);

            if name_length != 0 && name_length % 2 == 1 {
                self.stream.get_u8()?;
            }
            self.stream.skip(name_length)?;
            self.stream.skip(1)?;

            let mut data_length = self.stream.get_u32_be()? as usize;
            // blocks are padded to even sizes
            data_length += data_length & 1;

            match id {
                RESOURCE_RESOLUTION_INFO => {
                    // resolutions are 16.16 fixed point, the integer
                    // part is all we keep
                    let dpi_x = self.stream.get_u16_be()?;
                    self.stream.skip(6)?;
                    let dpi_y = self.stream.get_u16_be()?;
                    self.stream.skip(6)?;

                    self.dpi = Some((dpi_x, dpi_y));
                    trace!("Resolution: {} x {} dpi", dpi_x, dpi_y);
                }
                RESOURCE_TRANSPARENCY_INDEX => {
                    self.transparency_index = self.stream.get_i16_be()?;
                    trace!("Transparency index: {}", self.transparency_index);
                }
                _ => {
                    self.stream.skip(data_length)?;
                }
            }
        }

        let position = self.stream.position()?;

        if position != section_end {
            if self.options.get_strict_mode() {
                return Err(PsdDecodeErrors::Generic(
                    "image resources section overran its declared length"
                ));
            }
            warn!("image resources section overran its declared length, skipping to the next section");
            self.stream.seek_to(section_end)?;
        }
        Ok(())
    }

    /// Read every channel into its own planar buffer, decompressing
    /// when the file is RLE packed.
    fn read_channels(&mut self) -> Result<Vec<Vec<u8>>, PsdDecodeErrors> {
        let plane_length = self
            .channel_buf_size()
            .ok_or(PsdDecodeErrors::OverFlowOccurred)?;
        let mut channels = Vec::with_capacity(self.channel_count);

        match self.compression {
            CompressionMethod::NoCompression => {
                for channel in 0..self.channel_count {
                    let mut plane = vec![0; plane_length];
                    self.stream.read_exact(&mut plane)?;
                    channels.push(plane);
                    trace!("Read channel {} ({} bytes)", channel, plane_length);
                }
            }
            CompressionMethod::RLE => {
                // two byte packed-length per row per channel, the
                // decoder walks runs directly and never needs them
                self.stream.skip(self.height * self.channel_count * 2)?;

                for channel in 0..self.channel_count {
                    let mut plane = vec![0; plane_length];
                    self.unpack_rle(&mut plane)?;
                    channels.push(plane);
                    trace!("Unpacked channel {} ({} bytes)", channel, plane_length);
                }
            }
            // rejected while decoding headers
            CompressionMethod::ZipWithoutPrediction | CompressionMethod::ZipWithPrediction => {
                return Err(PsdDecodeErrors::UnsupportedCompression(
                    self.compression as u16
                ));
            }
        }
        Ok(channels)
    }

    /// PackBits decompression of one channel plane.
    ///
    /// Control bytes 0..=127 copy that many plus one literal bytes,
    /// 129..=255 replicate the following byte 257 minus the control
    /// value times, and 128 does nothing at all. Unpacking stops the
    /// moment the plane is full, runs crossing the end are clipped.
    fn unpack_rle(&mut self, plane: &mut [u8]) -> Result<(), PsdDecodeErrors> {
        let mut position = 0;

        while position < plane.len() {
            let control = usize::from(self.stream.get_u8()?);

            match control.cmp(&128) {
                Ordering::Less => {
                    let run = (control + 1).min(plane.len() - position);

                    self.stream
                        .read_exact(&mut plane[position..position + run])?;
                    position += run;
                }
                Ordering::Equal => (),
                Ordering::Greater => {
                    let run = (257 - control).min(plane.len() - position);
                    let value = self.stream.get_u8()?;

                    plane[position..position + run].fill(value);
                    position += run;
                }
            }
        }
        Ok(())
    }

    /// Decode the composite into a fresh [`Raster`].
    ///
    /// The raster's pixel format follows
    /// [`raster_format`](Self::raster_format) and rows are laid out
    /// with the raster's stride.
    pub fn decode(&mut self) -> Result<Raster, PsdDecodeErrors> {
        self.decode_headers()?;

        let format = match self.raster_format() {
            Some(format) => format,
            None => return Err(PsdDecodeErrors::Generic("headers carry no color mode"))
        };
        // also proves stride * height cannot overflow
        self.output_buf_size()
            .ok_or(PsdDecodeErrors::OverFlowOccurred)?;

        let mut raster = Raster::new(self.width, self.height, format);
        raster.set_dpi(self.dpi);

        self.decode_into(raster.data_mut())?;

        Ok(raster)
    }

    /// Decode the composite into a caller provided buffer.
    ///
    /// The buffer must hold at least
    /// [`output_buf_size`](Self::output_buf_size) bytes and receives
    /// rows spaced by the raster stride of
    /// [`raster_format`](Self::raster_format).
    ///
    /// Also see [`decode`](Self::decode) which allocates and decodes
    /// into the buffer
    pub fn decode_into(&mut self, output: &mut [u8]) -> Result<(), PsdDecodeErrors> {
        self.decode_headers()?;

        let mode = match self.color_mode {
            Some(mode) => mode,
            None => return Err(PsdDecodeErrors::Generic("headers carry no color mode"))
        };
        let format = match self.raster_format() {
            Some(format) => format,
            None => return Err(PsdDecodeErrors::Generic("headers carry no color mode"))
        };

        let expected = self
            .output_buf_size()
            .ok_or(PsdDecodeErrors::OverFlowOccurred)?;

        if output.len() < expected {
            return Err(PsdDecodeErrors::TooSmallBuffer(expected, output.len()));
        }

        let channels = self.read_channels()?;

        // indexed lookups need all three palette bands up front
        let transparent = if mode == ColorModes::IndexedColor {
            if self.palette.len() < 768 {
                return Err(PsdDecodeErrors::PaletteTooSmall(768, self.palette.len()));
            }
            transparent_triple(&self.palette, self.transparency_index)
        } else {
            None
        };

        let reconstructor = PixelReconstructor {
            channels: &channels,
            depth: self.depth,
            mode,
            palette: &self.palette,
            transparent
        };
        let mut writer = PixelWriter::new(output, format, self.width);

        for y in 0..self.height {
            for x in 0..self.width {
                let pixel = y * self.width + x;

                writer.put_pixel(x, y, reconstructor.reconstruct(pixel));
            }
        }
        trace!(
            "Decoded a {}x{} {:?} composite",
            self.width,
            self.height,
            format
        );

        Ok(())
    }

    /// Bytes one decoded channel plane occupies.
    fn channel_buf_size(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.depth.size_of())
    }

    /// Output buffer size in bytes, rows padded per the raster format,
    /// or `None` if the headers haven't been decoded
    pub fn output_buf_size(&self) -> Option<usize> {
        if !self.decoded_headers {
            return None;
        }
        self.raster_format()?
            .stride_for(self.width)
            .checked_mul(self.height)
    }

    /// Pixel format the composite decodes to, decided once from the
    /// color mode and channel count, or `None` if the headers haven't
    /// been decoded.
    ///
    /// Indexed images always decode with alpha, whether any pixel is
    /// transparent depends on the palette's transparency entry.
    pub fn raster_format(&self) -> Option<RasterFormat> {
        let mode = self.color_mode?;

        let format = if mode == ColorModes::IndexedColor
            || mode.alpha_channel(self.channel_count).is_some()
        {
            RasterFormat::RGBA32
        } else {
            RasterFormat::RGB24
        };
        Some(format)
    }

    /// Get image bit depth or None if the headers haven't been decoded
    pub const fn bit_depth(&self) -> Option<BitDepth> {
        if self.decoded_headers {
            return Some(self.depth);
        }
        None
    }

    /// Get image width and height respectively or None if the
    /// headers haven't been decoded
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        if self.decoded_headers {
            return Some((self.width, self.height));
        }
        None
    }

    /// Get the image color mode or None if the headers haven't
    /// been decoded
    pub fn color_mode(&self) -> Option<ColorModes> {
        self.color_mode
    }

    /// Horizontal and vertical resolution from the file's
    /// ResolutionInfo resource, `None` when absent or when the headers
    /// haven't been decoded.
    pub const fn dpi(&self) -> Option<(u16, u16)> {
        self.dpi
    }
}
