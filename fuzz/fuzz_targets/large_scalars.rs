#![no_main]

use libfuzzer_sys::fuzz_target;

// Stresses large plain and block scalars. Generated content is capped.
fuzz_target!(|data: &[u8]| {
    if data.len() < 256 {
        return;
    }
    // Cap to 1 MiB generated content.
    let cap: usize = 1 << 20;

    let chunk = String::from_utf8_lossy(data);
    let mut plain = String::new();
    while plain.len() + chunk.len() <= cap {
        plain.push_str(&chunk);
    }

    let yaml_plain = format!("{plain}\n");
    let yaml_block = format!("|\n  {plain}\n  {plain}\n");

    let tight = asdf_yaml::options! {
        budget: asdf_yaml::budget! { max_total_scalar_bytes: cap / 2 },
    };
    for y in [&yaml_plain, &yaml_block] {
        let _ = asdf_yaml::from_str(y);
        let _ = asdf_yaml::from_str_with_options(y, tight.clone());
    }
});
