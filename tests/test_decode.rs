/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::io::BufReader;

use zune_psd::bytestream::ByteCursor;
use zune_psd::{probe_psd, PsdDecoder, Raster, RasterFormat};

/// Assemble a version-1 stream out of the five sections the decoder
/// walks: header, color-mode data, image resources, an empty
/// layer/mask section and channel data.
fn psd_stream(
    channels: u16, width: u32, height: u32, depth: u16, mode: u16, palette: &[u8],
    resources: &[u8], compression: u16, channel_data: &[u8]
) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(b"8BPS");
    out.extend_from_slice(&1_u16.to_be_bytes());
    out.extend_from_slice(&[0; 6]);
    out.extend_from_slice(&channels.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&depth.to_be_bytes());
    out.extend_from_slice(&mode.to_be_bytes());

    out.extend_from_slice(&(palette.len() as u32).to_be_bytes());
    out.extend_from_slice(palette);
    out.extend_from_slice(&(resources.len() as u32).to_be_bytes());
    out.extend_from_slice(resources);
    out.extend_from_slice(&0_u32.to_be_bytes());
    out.extend_from_slice(&compression.to_be_bytes());
    out.extend_from_slice(channel_data);

    out
}

/// One image-resource block with an empty name, data padded to an
/// even length.
fn resource_block(id: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(&id.to_be_bytes());
    // empty Pascal name is a zero length byte plus one padding byte
    out.push(0);
    out.push(0);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);

    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn decode(data: &[u8]) -> Raster {
    PsdDecoder::new(ByteCursor::new(data)).decode().unwrap()
}

#[test]
fn probe_recognizes_version_one_only() {
    let image = psd_stream(1, 1, 1, 8, 1, &[], &[], 0, &[0]);
    assert!(probe_psd(&image));

    assert!(!probe_psd(b"8BPS\x00\x02rest"));
    assert!(!probe_psd(b"8BPT\x00\x01rest"));
    assert!(!probe_psd(b"8BPS"));
    assert!(!probe_psd(&[]));
}

#[test]
fn grayscale_eight_bit() {
    let image = psd_stream(1, 2, 2, 8, 1, &[], &[], 0, &[10, 20, 30, 40]);
    let raster = decode(&image);

    assert_eq!((raster.width(), raster.height()), (2, 2));
    assert_eq!(raster.format(), RasterFormat::RGB24);
    assert_eq!(raster.stride(), 8);
    assert_eq!(
        raster.data(),
        [10, 10, 10, 20, 20, 20, 0, 0, 30, 30, 30, 40, 40, 40, 0, 0]
    );
}

#[test]
fn grayscale_second_channel_is_alpha() {
    let image = psd_stream(2, 1, 1, 8, 1, &[], &[], 0, &[100, 200]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGBA32);
    assert_eq!(raster.data(), [100, 100, 100, 200]);
}

#[test]
fn rgb_rows_are_bgr_and_padded() {
    // planar R, G, B for a 2x1 image
    let image = psd_stream(3, 2, 1, 8, 3, &[], &[], 0, &[255, 1, 2, 3, 4, 5]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGB24);
    // 2 * 3 bytes of pixels rounded up to the next multiple of four
    assert_eq!(raster.stride(), 8);
    assert_eq!(raster.data(), [4, 2, 255, 5, 3, 1, 0, 0]);
}

#[test]
fn rgb_fourth_channel_is_alpha() {
    let image = psd_stream(4, 1, 1, 8, 3, &[], &[], 0, &[1, 2, 3, 4]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGBA32);
    assert_eq!(raster.stride(), 4);
    assert_eq!(raster.data(), [3, 2, 1, 4]);
}

#[test]
fn sixteen_bit_samples_round_to_eight() {
    // 0x0000 -> 0 and 0x8080 -> 128, the exact midpoint
    let image = psd_stream(1, 1, 2, 16, 1, &[], &[], 0, &[0x00, 0x00, 0x80, 0x80]);
    let raster = decode(&image);

    assert_eq!(raster.stride(), 4);
    assert_eq!(raster.data(), [0, 0, 0, 0, 128, 128, 128, 0]);
}

#[test]
fn thirty_two_bit_floats_read_reversed() {
    // 1.0_f32 is 3F 80 00 00 big endian, the stream stores it reversed
    let image = psd_stream(
        1,
        1,
        2,
        32,
        1,
        &[],
        &[],
        0,
        &[0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x00]
    );
    let raster = decode(&image);

    assert_eq!(raster.data(), [255, 255, 255, 0, 0, 0, 0, 0]);
}

#[test]
fn cmyk_corners_decode() {
    // two pixels: no ink at all, then full black ink
    let image = psd_stream(
        4,
        2,
        1,
        8,
        4,
        &[],
        &[],
        0,
        &[255, 255, 255, 255, 255, 255, 255, 0]
    );
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGB24);
    assert_eq!(raster.data(), [255, 255, 255, 0, 0, 0, 0, 0]);
}

#[test]
fn cmyk_fifth_channel_is_alpha() {
    let image = psd_stream(5, 1, 1, 8, 4, &[], &[], 0, &[255, 255, 255, 255, 77]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGBA32);
    assert_eq!(raster.data(), [255, 255, 255, 77]);
}

#[test]
fn multichannel_defaults_missing_planes_to_no_ink() {
    // cyan and magenta planes only, yellow and black default to none
    let image = psd_stream(2, 1, 1, 8, 7, &[], &[], 0, &[0, 255]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGB24);
    // full cyan ink, so red drops out entirely
    assert_eq!(raster.data(), [255, 255, 0, 0]);
}

#[test]
fn duotone_decodes_like_grayscale() {
    // the duotone ink description sits in the color-mode data and is
    // carried around but never interpreted
    let curve = [7_u8; 20];
    let image = psd_stream(1, 1, 1, 8, 8, &curve, &[], 0, &[99]);
    let raster = decode(&image);

    assert_eq!(raster.format(), RasterFormat::RGB24);
    assert_eq!(raster.data(), [99, 99, 99, 0]);
}

#[test]
fn lab_black_and_white_endpoints() {
    // L, a, b planes for two pixels: white on top, black below
    let image = psd_stream(
        3,
        1,
        2,
        8,
        9,
        &[],
        &[],
        0,
        &[255, 0, 128, 128, 128, 128]
    );
    let raster = decode(&image);

    assert_eq!(raster.stride(), 4);
    for byte in &raster.data()[0..3] {
        assert!(*byte >= 254, "expected near-white, got {:?}", raster.data());
    }
    assert_eq!(&raster.data()[4..8], [0, 0, 0, 0]);
}

#[test]
fn indexed_images_look_up_the_palette() {
    let mut palette = vec![0_u8; 768];
    // entry 5 red, entry 6 green
    palette[5] = 255;
    palette[6 + 256] = 255;

    let transparency = resource_block(1047, &5_i16.to_be_bytes());
    let image = psd_stream(1, 3, 1, 8, 2, &palette, &transparency, 0, &[5, 6, 5]);
    let raster = decode(&image);

    // indexed images always decode with alpha
    assert_eq!(raster.format(), RasterFormat::RGBA32);
    assert_eq!(
        raster.data(),
        [0, 0, 255, 0, 0, 255, 0, 255, 0, 0, 255, 0]
    );
}

#[test]
fn indexed_without_transparency_resource_is_opaque() {
    let mut palette = vec![0_u8; 768];
    palette[5] = 255;

    let image = psd_stream(1, 1, 1, 8, 2, &palette, &[], 0, &[5]);
    let raster = decode(&image);

    assert_eq!(raster.data(), [0, 0, 255, 255]);
}

#[test]
fn indexed_out_of_range_transparency_is_opaque() {
    let mut palette = vec![0_u8; 768];
    palette[5] = 255;

    let transparency = resource_block(1047, &300_i16.to_be_bytes());
    let image = psd_stream(1, 1, 1, 8, 2, &palette, &transparency, 0, &[5]);
    let raster = decode(&image);

    assert_eq!(raster.data(), [0, 0, 255, 255]);
}

#[test]
fn resolution_resource_sets_dpi() {
    let mut info = Vec::new();
    info.extend_from_slice(&300_u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);
    info.extend_from_slice(&150_u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);

    let resources = resource_block(1005, &info);
    let image = psd_stream(1, 1, 1, 8, 1, &[], &resources, 0, &[0]);

    let mut decoder = PsdDecoder::new(ByteCursor::new(&image));
    let raster = decoder.decode().unwrap();

    assert_eq!(decoder.dpi(), Some((300, 150)));
    assert_eq!(raster.dpi(), Some((300, 150)));
}

#[test]
fn missing_resolution_resource_means_no_dpi() {
    let image = psd_stream(1, 1, 1, 8, 1, &[], &[], 0, &[0]);
    let raster = decode(&image);

    assert_eq!(raster.dpi(), None);
}

#[test]
fn odd_resource_names_carry_an_extra_length_byte() {
    // a named block in the on-disk form this reader understands:
    // odd length byte, one extra length byte, the name, one pad byte
    let mut named = Vec::new();
    named.extend_from_slice(b"8BIM");
    named.extend_from_slice(&9999_u16.to_be_bytes());
    named.push(3);
    named.push(0);
    named.extend_from_slice(b"abc");
    named.push(0);
    named.extend_from_slice(&4_u32.to_be_bytes());
    named.extend_from_slice(&[1, 2, 3, 4]);

    let mut info = Vec::new();
    info.extend_from_slice(&72_u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);
    info.extend_from_slice(&72_u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);
    named.extend_from_slice(&resource_block(1005, &info));

    let image = psd_stream(1, 1, 1, 8, 1, &[], &named, 0, &[0]);
    let mut decoder = PsdDecoder::new(ByteCursor::new(&image));
    decoder.decode().unwrap();

    // the block after the named one parsed at the right offset
    assert_eq!(decoder.dpi(), Some((72, 72)));
}

#[test]
fn accessors_are_none_before_headers() {
    let image = psd_stream(1, 2, 2, 8, 1, &[], &[], 0, &[1, 2, 3, 4]);
    let mut decoder = PsdDecoder::new(ByteCursor::new(&image));

    assert_eq!(decoder.dimensions(), None);
    assert_eq!(decoder.bit_depth(), None);
    assert_eq!(decoder.color_mode(), None);
    assert_eq!(decoder.raster_format(), None);
    assert_eq!(decoder.output_buf_size(), None);

    decoder.decode_headers().unwrap();

    assert_eq!(decoder.dimensions(), Some((2, 2)));
    assert_eq!(decoder.raster_format(), Some(RasterFormat::RGB24));
    assert_eq!(decoder.output_buf_size(), Some(16));
}

#[test]
fn decode_headers_is_idempotent() {
    let image = psd_stream(1, 1, 1, 8, 1, &[], &[], 0, &[42]);
    let mut decoder = PsdDecoder::new(ByteCursor::new(&image));

    decoder.decode_headers().unwrap();
    decoder.decode_headers().unwrap();

    let raster = decoder.decode().unwrap();
    assert_eq!(raster.data(), [42, 42, 42, 0]);
}

#[test]
fn decode_into_caller_buffer() {
    let image = psd_stream(1, 2, 1, 8, 1, &[], &[], 0, &[1, 2]);
    let mut decoder = PsdDecoder::new(ByteCursor::new(&image));

    decoder.decode_headers().unwrap();

    let mut output = vec![0; decoder.output_buf_size().unwrap()];
    decoder.decode_into(&mut output).unwrap();

    assert_eq!(output, [1, 1, 1, 2, 2, 2, 0, 0]);
}

#[test]
fn from_file_decodes_like_memory() {
    let image = psd_stream(1, 1, 1, 8, 1, &[], &[], 0, &[42]);
    let path = std::env::temp_dir().join(format!("zune-psd-test-{}.psd", std::process::id()));

    std::fs::write(&path, &image).unwrap();
    let raster = PsdDecoder::from_file(&path).unwrap().decode().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(raster.data(), [42, 42, 42, 0]);
}

#[test]
fn buffered_readers_are_valid_sources() {
    let image = psd_stream(1, 2, 2, 8, 1, &[], &[], 0, &[10, 20, 30, 40]);

    let reader = BufReader::new(std::io::Cursor::new(image.clone()));
    let from_reader = PsdDecoder::new(reader).decode().unwrap();
    let from_bytes = decode(&image);

    assert_eq!(from_reader.data(), from_bytes.data());
}
