#![no_main]

use ia_downloader::config::ConfigLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();

        // Any outcome is fine as long as it does not panic, and an accepted
        // configuration must satisfy the concurrency rules.
        if let Ok(result) = loader.load_from_str(yaml_str) {
            let config = &result.config;
            assert!(!config.identifiers.is_empty());
            assert!(config.split.get() == 1 || config.threads.get() == 1);
        }
    }
});
