//! Fetcher tests against a mock HTTP server using the real blocking transport.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use catsync_fetch::{BlockingHttp, CacheStore, Fetcher, SourceSync, TargetSync};
use catsync_recon::catalog::source::{WikiItem, WikiVehicle, WikiVehicleSummary, WIKI_ITEMS, WIKI_VEHICLES};
use catsync_recon::catalog::target::{UexItem, UexVehicle, ITEMS, VEHICLES};

fn fetcher(cache: Option<CacheStore>) -> Fetcher {
    let http = BlockingHttp::new(Duration::from_secs(5)).unwrap();
    Fetcher::new(Box::new(http), cache)
}

fn wiki_item(n: u32) -> serde_json::Value {
    json!({
        "uuid": format!("uuid-{n}"),
        "name": format!("Item {n}"),
        "link": format!("https://wiki.test/api/v2/items/uuid-{n}")
    })
}

fn page(server: &MockServer, data: Vec<serde_json::Value>, current: u32, next: Option<u32>) -> serde_json::Value {
    json!({
        "data": data,
        "links": {
            "first": server.url("/v2/items?limit=2&page=1"),
            "last": server.url("/v2/items?limit=2&page=3"),
            "prev": null,
            "next": next.map(|n| server.url(format!("/v2/items?limit=2&page={n}"))),
        },
        "meta": {"current_page": current, "from": 1, "last_page": 3, "path": "", "per_page": 2, "to": 2, "total": 5}
    })
}

// ── Source ──────────────────────────────────────────────────────────

#[test]
fn three_pages_three_requests() {
    let server = MockServer::start();

    let page1 = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param("limit", "2").query_param_missing("page");
        then.status(200).json_body(page(&server, vec![wiki_item(1), wiki_item(2)], 1, Some(2)));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param("page", "2");
        then.status(200).json_body(page(&server, vec![wiki_item(3), wiki_item(4)], 2, Some(3)));
    });
    let page3 = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param("page", "3");
        then.status(200).json_body(page(&server, vec![wiki_item(5)], 3, None));
    });

    let fetcher = fetcher(None);
    let items: Vec<WikiItem> = SourceSync::new(&fetcher, &server.base_url(), 2, None).list(&WIKI_ITEMS);

    page1.assert_calls(1);
    page2.assert_calls(1);
    page3.assert_calls(1);
    let names: Vec<_> = items.iter().filter_map(|i| i.name.as_deref()).collect();
    assert_eq!(names, vec!["Item 1", "Item 2", "Item 3", "Item 4", "Item 5"]);
}

#[test]
fn failed_page_keeps_earlier_entries() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param_missing("page");
        then.status(200).json_body(page(&server, vec![wiki_item(1), json!({"name": "no link"})], 1, Some(2)));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param("page", "2");
        then.status(500);
    });

    let fetcher = fetcher(None);
    let items: Vec<WikiItem> = SourceSync::new(&fetcher, &server.base_url(), 2, None).list(&WIKI_ITEMS);

    page2.assert();
    // The row without a link fails to parse and is dropped.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].uuid.as_deref(), Some("uuid-1"));
}

#[test]
fn vehicle_details_merge_over_summaries() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v3/vehicles").query_param("locale", "en_EN");
        then.status(200).json_body(json!({
            "data": [
                {"uuid": "abc-123", "name": "Aurora", "link": server.url("/v3/vehicles/Aurora")},
                {"uuid": "def-456", "name": "Mustang", "link": server.url("/v3/vehicles/Mustang")}
            ],
            "links": {"next": null},
            "meta": {"current_page": 1, "last_page": 1}
        }));
    });
    let aurora = server.mock(|when, then| {
        when.method(GET).path("/v3/vehicles/Aurora");
        then.status(200).json_body(json!({"data": {
            "uuid": null, "name": "Aurora", "cargo_capacity": 3.0,
            "sizes": {"length": 18.0, "beam": 8.0, "height": 4.0}
        }}));
    });
    let mustang = server.mock(|when, then| {
        when.method(GET).path("/v3/vehicles/Mustang");
        then.status(404);
    });

    let fetcher = fetcher(None);
    let vehicles: Vec<WikiVehicle> = SourceSync::new(&fetcher, &server.base_url(), 500, Some("en_EN".into()))
        .list_detailed::<WikiVehicleSummary, WikiVehicle>(&WIKI_VEHICLES);

    aurora.assert();
    mustang.assert();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].uuid.as_deref(), Some("abc-123"));
    assert_eq!(vehicles[0].cargo_capacity, Some(3.0));
    assert_eq!(vehicles[0].sizes.as_ref().and_then(|s| s.beam), Some(8.0));
}

#[test]
fn next_link_back_to_earlier_page_stops_pagination() {
    let server = MockServer::start();

    let first = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param_missing("page");
        then.status(200).json_body(json!({
            "data": [wiki_item(1), wiki_item(2)],
            "links": {"next": server.url("/v2/items?limit=2&page=2")},
            "meta": {"current_page": 1, "last_page": 2}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/v2/items").query_param("page", "2");
        then.status(200).json_body(json!({
            "data": [wiki_item(3)],
            "links": {"next": server.url("/v2/items?limit=2")},
            "meta": {"current_page": 2, "last_page": 2}
        }));
    });

    let fetcher = fetcher(None);
    let items: Vec<WikiItem> = SourceSync::new(&fetcher, &server.base_url(), 2, None).list(&WIKI_ITEMS);

    first.assert_calls(1);
    second.assert_calls(1);
    assert_eq!(items.len(), 3);
}

#[test]
fn self_referencing_next_link_with_cache_terminates() {
    let server = MockServer::start();

    let page = server.mock(|when, then| {
        when.method(GET).path("/v2/items");
        then.status(200).json_body(json!({
            "data": [wiki_item(1)],
            "links": {"next": server.url("/v2/items?limit=2")},
            "meta": {"current_page": 1, "last_page": 1}
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let fetcher = fetcher(Some(CacheStore::new(dir.path())));
    let items: Vec<WikiItem> = SourceSync::new(&fetcher, &server.base_url(), 2, None).list(&WIKI_ITEMS);

    page.assert_calls(1);
    assert_eq!(items.len(), 1);
}

// ── Target ──────────────────────────────────────────────────────────

#[test]
fn items_fan_out_once_per_category() {
    let server = MockServer::start();

    let categories = server.mock(|when, then| {
        when.method(GET).path("/categories");
        then.status(200).json_body(json!({"status": "ok", "data": [
            {"id": 1, "type": "item", "section": "Armor", "name": "Helmets"},
            {"id": 2, "type": "item", "section": "Armor", "name": "Torso"},
            {"type": "item", "name": "No id"},
            {"id": 3, "type": "item", "section": "Systems", "name": "Coolers"}
        ]}));
    });
    let cat1 = server.mock(|when, then| {
        when.method(GET).path("/items").query_param("id_category", "1");
        then.status(200).json_body(json!({"status": "ok", "data": [
            {"id": 10, "id_category": 1, "name": "Helmet A", "is_exclusive_pledge": 0},
            {"id": 11, "id_category": 1, "name": "Helmet B", "is_exclusive_pledge": 1}
        ]}));
    });
    let cat2 = server.mock(|when, then| {
        when.method(GET).path("/items").query_param("id_category", "2");
        then.status(200).json_body(json!({"status": "ok", "data": null}));
    });
    let cat3 = server.mock(|when, then| {
        when.method(GET).path("/items").query_param("id_category", "3");
        then.status(200).json_body(json!({"status": "ok", "data": [{"id": 30, "name": "Cooler"}]}));
    });

    let fetcher = fetcher(None);
    let items: Vec<UexItem> = TargetSync::new(&fetcher, &server.base_url()).list(&ITEMS);

    categories.assert_calls(1);
    cat1.assert_calls(1);
    cat2.assert_calls(1);
    cat3.assert_calls(1);
    let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![10, 11, 30]);
    assert!(items[1].is_exclusive_pledge);
}

#[test]
fn non_ok_envelope_contributes_nothing() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/vehicles");
        then.status(200).json_body(json!({"status": "requests_limit_reached", "data": [
            {"id": 1, "name": "Aurora"}
        ]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let fetcher = fetcher(Some(CacheStore::new(dir.path())));
    let vehicles: Vec<UexVehicle> = TargetSync::new(&fetcher, &server.base_url()).list(&VEHICLES);

    assert!(vehicles.is_empty());
    // Rejected bodies are never cached.
    assert!(!dir.path().join("uex_vehicles").exists());
}

// ── Cache ───────────────────────────────────────────────────────────

#[test]
fn cached_response_short_circuits_fetch() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/vehicles");
        then.status(200).json_body(json!({"status": "ok", "data": [
            {"id": 42, "name": "Aurora", "scu": 0}
        ]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let fetcher = fetcher(Some(CacheStore::new(dir.path())));
    let sync = TargetSync::new(&fetcher, &server.base_url());

    let first: Vec<UexVehicle> = sync.list(&VEHICLES);
    let second: Vec<UexVehicle> = sync.list(&VEHICLES);

    mock.assert_calls(1);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, 42);
}

#[test]
fn corrupt_cache_entry_falls_back_to_live_fetch() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/vehicles");
        then.status(200).json_body(json!({"status": "ok", "data": [{"id": 7, "name": "Mustang"}]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let key = catsync_fetch::key_for_url(&format!("{}/vehicles", server.base_url()));
    cache.put("uex_vehicles", &key, b"{\"status\": \"ok\", \"data\": [").unwrap();

    let fetcher = fetcher(Some(cache.clone()));
    let vehicles: Vec<UexVehicle> = TargetSync::new(&fetcher, &server.base_url()).list(&VEHICLES);

    mock.assert_calls(1);
    assert_eq!(vehicles.len(), 1);
    // Replaced by the fresh response.
    assert!(cache.get_json("uex_vehicles", &key).unwrap().is_some());
}

#[test]
fn disabled_cache_always_fetches() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/vehicles");
        then.status(200).json_body(json!({"status": "ok", "data": []}));
    });

    let fetcher = fetcher(None);
    let sync = TargetSync::new(&fetcher, &server.base_url());
    let _: Vec<UexVehicle> = sync.list(&VEHICLES);
    let _: Vec<UexVehicle> = sync.list(&VEHICLES);

    mock.assert_calls(2);
}
