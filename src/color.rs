/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Per-pixel color reconstruction.
//!
//! Channel data arrives as planar sample buffers, one per channel.
//! This module folds samples down to 8 bits (16-bit integers and
//! 32-bit floats included) and assembles RGBA quads per color mode:
//! grayscale/duotone broadcast, indexed palette lookup with a
//! transparency entry, plain RGB, CMYK and multichannel ink math, and
//! Lab through CIEXYZ to gamma-encoded sRGB.
use crate::bytestream::{be_uint, f32_reversed};
use crate::constants::{BitDepth, ColorModes};

/// Fixed exponent folding linear 32-bit float samples down to 8 bits.
///
/// Kept verbatim, output is meant to be bit-identical across versions.
const FLOAT_SAMPLE_GAMMA: f32 = 0.454_706_93;

/// D65 reference white, the Lab encoding's assumed illuminant.
const D65_X: f32 = 0.95047;
const D65_Z: f32 = 1.08883;

/// Reconstructs final RGBA pixels out of decoded channel planes.
///
/// Borrowed state only, the decoder owns the planes and palette and
/// resolves the transparent palette triple before the pixel loop.
pub(crate) struct PixelReconstructor<'a> {
    pub channels:    &'a [Vec<u8>],
    pub depth:       BitDepth,
    pub mode:        ColorModes,
    pub palette:     &'a [u8],
    /// Palette triple flagged transparent, `None` when the image
    /// carries no usable transparency index.
    pub transparent: Option<[u8; 3]>
}

impl PixelReconstructor<'_> {
    /// Assemble the pixel at `pixel` as R,G,B,A.
    pub fn reconstruct(&self, pixel: usize) -> [u8; 4] {
        use crate::constants::ColorModes::{
            Bitmap, CMYK, DuoTone, Grayscale, IndexedColor, LabColor, MultiChannel, RGB
        };

        match self.mode {
            Grayscale | DuoTone => {
                let gray = self.sample(0, pixel);
                [gray, gray, gray, self.channel_alpha(pixel)]
            }
            IndexedColor => self.indexed(pixel),
            RGB => {
                let r = self.sample(0, pixel);
                let g = self.sample(1, pixel);
                let b = self.sample(2, pixel);
                [r, g, b, self.channel_alpha(pixel)]
            }
            CMYK | MultiChannel => {
                // multichannel images may omit trailing inks, a missing
                // sample of 255 contributes no ink at all
                let c = self.sample(0, pixel);
                let m = self.sample_or(1, pixel, 255);
                let y = self.sample_or(2, pixel, 255);
                let k = self.sample_or(3, pixel, 255);

                let [r, g, b] = cmyk_to_rgb(c, m, y, k);
                [r, g, b, self.channel_alpha(pixel)]
            }
            LabColor => {
                let l = self.sample(0, pixel);
                let a = self.sample(1, pixel);
                let b = self.sample(2, pixel);

                let [r, g, b] = lab_to_rgb(l, a, b);
                [r, g, b, self.channel_alpha(pixel)]
            }
            // rejected during header parsing, never reaches the loop
            Bitmap => [0, 0, 0, 255]
        }
    }

    /// Normalized sample of `channel` at `pixel`, always 0..=255.
    fn sample(&self, channel: usize, pixel: usize) -> u8 {
        let plane = &self.channels[channel];

        match self.depth {
            BitDepth::Eight => plane[pixel],
            BitDepth::Sixteen => {
                // round(v / 257), 257 maps 0..=65535 onto 0..=255
                ((be_uint(plane, pixel * 2, 2) + 128) / 257) as u8
            }
            BitDepth::ThirtyTwo => {
                let linear = f32_reversed(plane, pixel * 4);
                (255.0 * linear.powf(FLOAT_SAMPLE_GAMMA))
                    .round()
                    .clamp(0.0, 255.0) as u8
            }
        }
    }

    fn sample_or(&self, channel: usize, pixel: usize, missing: u8) -> u8 {
        if channel < self.channels.len() {
            self.sample(channel, pixel)
        } else {
            missing
        }
    }

    /// First byte of the stored sample, indexed images address the
    /// palette with it directly, skipping normalization.
    fn raw(&self, channel: usize, pixel: usize) -> u8 {
        self.channels[channel][pixel * self.depth.size_of()]
    }

    /// Alpha from the mode's alpha channel, 255 when there is none.
    fn channel_alpha(&self, pixel: usize) -> u8 {
        match self.mode.alpha_channel(self.channels.len()) {
            Some(channel) => self.sample(channel, pixel),
            None => 255
        }
    }

    fn indexed(&self, pixel: usize) -> [u8; 4] {
        let index = usize::from(self.raw(0, pixel));
        let rgb = [
            self.palette[index],
            self.palette[index + 256],
            self.palette[index + 512]
        ];
        // transparency matches on the looked-up triple, so palette
        // duplicates of the transparent color are transparent too
        let alpha = match self.transparent {
            Some(transparent) if transparent == rgb => 0,
            _ => 255
        };

        [rgb[0], rgb[1], rgb[2], alpha]
    }
}

/// Resolve which palette triple is transparent.
///
/// Indices outside the palette's 256 entries mean no transparency.
/// Callers verified the palette holds the three full bands.
pub(crate) fn transparent_triple(palette: &[u8], index: i16) -> Option<[u8; 3]> {
    if (0..256).contains(&index) {
        let index = index as usize;
        Some([palette[index], palette[index + 256], palette[index + 512]])
    } else {
        None
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    // stored samples are inverted ink coverage, 255 means no ink
    let c = 1.0 - f32::from(c) / 255.0;
    let m = 1.0 - f32::from(m) / 255.0;
    let y = 1.0 - f32::from(y) / 255.0;
    let k = 1.0 - f32::from(k) / 255.0;

    let r = 255.0 * (1.0 - c) * (1.0 - k);
    let g = 255.0 * (1.0 - m) * (1.0 - k);
    let b = 255.0 * (1.0 - y) * (1.0 - k);

    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8
    ]
}

fn lab_to_rgb(l: u8, a: u8, b: u8) -> [u8; 3] {
    let l = f32::from(l) / 255.0 * 100.0;
    let a = f32::from(a) - 128.0;
    let b = f32::from(b) - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = D65_X * lab_inverse(fx);
    let y = lab_inverse(fy);
    let z = D65_Z * lab_inverse(fz);

    let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let b = 0.0557 * x - 0.2040 * y + 1.0570 * z;

    [srgb_encode(r), srgb_encode(g), srgb_encode(b)]
}

/// Inverse of the Lab `f` function, cube above the 6/29 knee and
/// linear below it.
fn lab_inverse(f: f32) -> f32 {
    const T: f32 = 6.0 / 29.0;

    if f > T {
        f * f * f
    } else {
        3.0 * T * T * (f - 4.0 / 29.0)
    }
}

/// Gamma-encode one linear sRGB component and scale to a byte.
fn srgb_encode(linear: f32) -> u8 {
    let encoded = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };

    (encoded * 256.0).clamp(0.0, 255.0) as u8
}
