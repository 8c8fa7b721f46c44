#![no_main]

use asdf_yaml::DuplicateKeyPolicy;
use libfuzzer_sys::fuzz_target;

// Builds mappings with repeated keys and runs every duplicate-key policy.
// Whatever wins, a key may appear only once in the result.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 { return; }

    let s = String::from_utf8_lossy(data);

    let inputs = [
        format!("a: 1\na: {s}\n"),
        format!("{{{s}: 1, {s}: 2}}"),
        format!("outer:\n  inner: {{x: 1, x: {s}}}\n  arr: [{{k: a, k: {s}}}]\n"),
        format!("!!omap [{s}: 1, {s}: 2]"),
    ];

    for policy in [
        DuplicateKeyPolicy::Error,
        DuplicateKeyPolicy::FirstWins,
        DuplicateKeyPolicy::LastWins,
    ] {
        let options = asdf_yaml::options! { duplicate_keys: policy };
        for yaml in &inputs {
            let Ok(doc) = asdf_yaml::from_str_with_options(yaml, options.clone()) else {
                continue;
            };
            let mut seen = std::collections::HashSet::new();
            for (key, _) in doc.root_ref().entries() {
                if key.tag().is_some() {
                    continue;
                }
                if let Some(text) = key.as_str() {
                    assert!(seen.insert(text), "{text:?} kept twice");
                }
            }
        }
    }
});
