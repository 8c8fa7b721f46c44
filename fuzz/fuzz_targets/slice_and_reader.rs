#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

// Raw bytes through the slice and reader entry points, with a small read
// chunk so multibyte characters get split. Both must agree on success.
fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 { return; }

    let from_slice = asdf_yaml::from_slice(data);
    let options = asdf_yaml::options! { read_chunk_size: 7 };
    let from_reader = asdf_yaml::from_reader_with_options(Cursor::new(data.to_vec()), options);
    assert_eq!(from_slice.is_ok(), from_reader.is_ok());

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = asdf_yaml::from_str(text);
    }
});
