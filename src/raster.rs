/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! The decoded output raster.

/// Pixel layout of a decoded raster.
///
/// Bytes within a pixel are ordered B,G,R with alpha last, the layout
/// DIB-style consumers expect.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RasterFormat {
    /// Three bytes per pixel, B,G,R, every row padded to a four-byte
    /// boundary.
    RGB24,
    /// Four bytes per pixel, B,G,R,A, rows are naturally aligned.
    RGBA32
}

impl RasterFormat {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            RasterFormat::RGB24 => 3,
            RasterFormat::RGBA32 => 4
        }
    }

    /// Bytes per row including alignment padding.
    pub const fn stride_for(self, width: usize) -> usize {
        match self {
            RasterFormat::RGB24 => (width * 3 + 3) & !3,
            RasterFormat::RGBA32 => width * 4
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, RasterFormat::RGBA32)
    }
}

/// An owned pixel buffer produced by a successful decode.
///
/// Rows are `stride()` bytes apart, which for [`RasterFormat::RGB24`]
/// may exceed `width * 3`, so row-wise consumers must honour the
/// stride rather than assume tightly packed rows.
#[derive(Debug)]
pub struct Raster {
    width:  usize,
    height: usize,
    format: RasterFormat,
    stride: usize,
    dpi:    Option<(u16, u16)>,
    data:   Vec<u8>
}

impl Raster {
    /// Allocate a zeroed raster.
    ///
    /// Callers validated `width * height` against their limits, so the
    /// buffer size cannot overflow here.
    pub(crate) fn new(width: usize, height: usize, format: RasterFormat) -> Raster {
        let stride = format.stride_for(width);

        Raster {
            width,
            height,
            format,
            stride,
            dpi: None,
            data: vec![0; stride * height]
        }
    }

    pub(crate) fn set_dpi(&mut self, dpi: Option<(u16, u16)>) {
        self.dpi = dpi;
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn format(&self) -> RasterFormat {
        self.format
    }

    /// Bytes between the start of consecutive rows.
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Horizontal and vertical resolution, when the file carried a
    /// ResolutionInfo resource.
    pub const fn dpi(&self) -> Option<(u16, u16)> {
        self.dpi
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Index-based pixel writer over a borrowed output buffer.
///
/// Centralizes the stride arithmetic and the B,G,R(,A) byte order so
/// the reconstruction loop never touches raw offsets.
pub(crate) struct PixelWriter<'a> {
    output: &'a mut [u8],
    format: RasterFormat,
    stride: usize
}

impl<'a> PixelWriter<'a> {
    pub fn new(output: &'a mut [u8], format: RasterFormat, width: usize) -> PixelWriter<'a> {
        PixelWriter {
            output,
            format,
            stride: format.stride_for(width)
        }
    }

    /// Write one pixel, `rgba` in R,G,B,A order.
    #[inline(always)]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let [r, g, b, a] = rgba;
        let offset = y * self.stride + x * self.format.bytes_per_pixel();

        match self.format {
            RasterFormat::RGB24 => {
                self.output[offset..offset + 3].copy_from_slice(&[b, g, r]);
            }
            RasterFormat::RGBA32 => {
                self.output[offset..offset + 4].copy_from_slice(&[b, g, r, a]);
            }
        }
    }
}
