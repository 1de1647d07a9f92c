//! Caches stay bounded and never change answers.

use std::sync::Arc;
use std::thread;

use url_mappings::params;
use url_mappings::routing::RequestContext;

mod common;

const SMALL_CACHE: &str = r#"
[cache]
max_weighted_capacity = 8
url_creator_max_weighted_capacity = 64

[[mappings]]
pattern = "/$controller/$action?/$id?"

[[mappings]]
pattern = "/books/$id"
controller = "book"
action = "show"

[[mappings]]
pattern = "/books/featured"
controller = "book"
action = "featured"
"#;

fn expected_pattern(i: usize) -> &'static str {
    match i % 3 {
        0 => "/books/featured",
        1 => "/books/$id",
        _ => "/$controller/$action?/$id?",
    }
}

fn path(i: usize) -> String {
    match i % 3 {
        0 => "/books/featured".to_string(),
        1 => format!("/books/{}", i),
        _ => format!("/authors/show/{}", i),
    }
}

#[test]
fn test_eviction_never_changes_matches() {
    let holder = common::holder(SMALL_CACHE);
    for round in 0..3 {
        for i in 0..300 {
            let info = holder.match_path(&path(i)).unwrap();
            assert_eq!(info.pattern(), expected_pattern(i), "round {} path {}", round, path(i));
            let (single, list, _) = holder.cache_sizes();
            assert!(single <= 8);
            assert!(list <= 8);
        }
    }
}

#[test]
fn test_concurrent_matching_under_pressure() {
    let holder = Arc::new(common::holder(SMALL_CACHE));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let holder = Arc::clone(&holder);
            thread::spawn(move || {
                for i in 0..500 {
                    let i = i * 4 + t;
                    let info = holder.match_path(&path(i)).unwrap();
                    assert_eq!(info.pattern(), expected_pattern(i));
                    let all = holder.match_all(&path(i), None);
                    assert_eq!(all[0].pattern(), expected_pattern(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let (single, list, _) = holder.cache_sizes();
    assert!(single <= 8);
    assert!(list <= 8);
}

#[test]
fn test_creator_cache_bounded_and_correct() {
    let holder = common::holder(SMALL_CACHE);
    let ctx = RequestContext::default();
    for i in 0..200 {
        let mut params = params! { "id" => i };
        let creator = holder.reverse_mapping(Some("book"), Some("show"), None, &mut params);
        let url = creator
            .create_url_for(&ctx, Some("book"), Some("show"), &params, None, None)
            .unwrap();
        assert_eq!(url, format!("/books/{}", i));
        assert!(holder.cache_sizes().2 <= 64);
    }
}

#[test]
fn test_repeated_match_returns_cached_instance() {
    let holder = common::holder(SMALL_CACHE);
    let first = holder.match_path("/books/1").unwrap();
    let second = holder.match_path("/books/1").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
