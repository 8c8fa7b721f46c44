#![no_main]

use libfuzzer_sys::fuzz_target;

// Wraps the input into flow collections and ordered maps.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 { return; }

    let s = String::from_utf8_lossy(data);

    let inputs = [
        format!("[{s}]"),
        format!("{{{s}}}"),
        format!("root: {{{s}}}\narray: [{s}]\n"),
        format!("!!omap [{s}]"),
        format!("!!omap\n- {s}\n"),
    ];

    for yaml in &inputs {
        if let Ok(doc) = asdf_yaml::from_str(yaml) {
            // Ordered maps only ever hold single-entry pairs from the source.
            let _ = doc.root_ref().entries().count();
        }
    }
});
