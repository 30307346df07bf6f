#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // fuzzed code goes here

    use zune_psd::bytestream::ByteCursor;
    use zune_psd::DecoderOptions;

    // cap dimensions so a fuzzed header cannot demand huge buffers
    let options = DecoderOptions::default()
        .set_max_width(1 << 10)
        .set_max_height(1 << 10);

    let mut decoder = zune_psd::PsdDecoder::new_with_options(ByteCursor::new(data), options);
    let _ = decoder.decode();
});
