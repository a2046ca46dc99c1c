#![no_main]

use libfuzzer_sys::fuzz_target;

use respcache::cache::{DiskSnapshot, LruCache};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let Ok(snapshot) = DiskSnapshot::parse(&text) else {
        return;
    };

    let capacity = data.len().max(1);
    let cache = LruCache::new(capacity);
    cache.read_snapshot(snapshot);
    assert!(cache.total_size() <= capacity);

    let written = cache.write_snapshot();
    if let Ok(json) = written.to_json() {
        let reparsed = DiskSnapshot::parse(&json).expect("written snapshot parses");
        assert_eq!(reparsed.len(), written.len());
    }
});
