#![no_main]

use libfuzzer_sys::fuzz_target;

use respcache::base64;
use respcache::cache::{CacheRecord, CacheStrategy, HeaderCacheStrategy};
use respcache::http::{HttpResponse, RequestOptions};

fuzz_target!(|data: &[u8]| {
    let decoded = base64::decode(data);
    assert!(decoded.len() <= data.len());

    let response = HttpResponse {
        raw_header: String::from_utf8_lossy(data).into_owned(),
        response_code: 200,
        ..HttpResponse::default()
    };
    let record = CacheRecord::encode(&response);
    let mut restored = record.decode();
    assert_eq!(restored.raw_header, response.raw_header);
    restored.parse_headers();

    let strategy = HeaderCacheStrategy::new();
    let request = RequestOptions::get("http://fuzz.test/");
    let _ = strategy.is_cacheable(&request, &restored);
    let _ = strategy.run_strategy(&request, &restored);
});
