use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;
use serde_json::json;

use super::*;
use crate::foundation::error::PreloadError;
use crate::manifest::{Category, work_queue_from_value};
use crate::surface::Surface;

/// Test host: surfaces are sync-ready unless listed in `pending`.
#[derive(Default)]
struct FakeHost {
    pending: HashMap<String, SurfaceHandle>,
    fetched: Vec<String>,
}

fn router_for(host: &Rc<RefCell<FakeHost>>) -> FetchRouter {
    let mut router = FetchRouter::new();
    for category in Category::ALL {
        let host = Rc::clone(host);
        router.register(category, move |name, _hue| {
            let mut h = host.borrow_mut();
            let key = format!("{category}/{name}");
            h.fetched.push(key.clone());
            Ok(match h.pending.get(&key) {
                Some(s) => Rc::clone(s),
                None => Surface::decoded(key.clone(), RgbaImage::new(1, 1)),
            })
        });
    }
    router
}

fn opts(interval: u32) -> PreloadOpts {
    PreloadOpts {
        load_interval_ticks: interval,
        ..Default::default()
    }
}

fn preloader(manifest: serde_json::Value, interval: u32) -> (Preloader, Rc<RefCell<FakeHost>>) {
    let host = Rc::new(RefCell::new(FakeHost::default()));
    let p = Preloader::new(
        work_queue_from_value(&manifest),
        router_for(&host),
        &opts(interval),
    );
    (p, host)
}

fn pend(host: &Rc<RefCell<FakeHost>>, key: &str) -> SurfaceHandle {
    let s = Surface::loading(key);
    host.borrow_mut()
        .pending
        .insert(key.to_string(), Rc::clone(&s));
    s
}

#[test]
fn unthrottled_sync_manifest_drains_in_one_tick_in_order() {
    let (mut p, host) = preloader(
        json!({
            "system": ["Window", "IconSet"],
            "characters": ["Actor1"],
            "faces": ["Actor1", "Actor2"]
        }),
        0,
    );
    p.on_frame_tick().unwrap();
    assert!(p.is_complete());
    assert_eq!(
        host.borrow().fetched,
        vec![
            "system/Window",
            "system/IconSet",
            "characters/Actor1",
            "faces/Actor1",
            "faces/Actor2",
        ]
    );
    let st = p.stats();
    assert_eq!(st.dispatched, 5);
    assert_eq!(st.ready_now, 5);
    assert_eq!(st.ticks, 1);
}

#[test]
fn empty_or_malformed_manifest_completes_on_first_tick() {
    for manifest in [json!({}), json!({ "pictures": 7 }), json!(null)] {
        let (mut p, host) = preloader(manifest, 3);
        assert!(!p.is_complete());
        p.on_frame_tick().unwrap();
        assert!(p.is_complete());
        assert!(host.borrow().fetched.is_empty());
    }
}

#[test]
fn unknown_category_is_skipped_without_stalling() {
    let (mut p, host) = preloader(json!({ "ghosts": ["a"], "pictures": ["b"] }), 0);
    p.on_frame_tick().unwrap();
    assert!(p.is_complete());
    assert_eq!(host.borrow().fetched, vec!["pictures/b"]);
    assert_eq!(p.stats().skipped, 1);
    assert_eq!(p.stats().dispatched, 1);
}

#[test]
fn pending_fetch_blocks_until_listener_fires() {
    let (mut p, host) = preloader(json!({ "pictures": ["a", "b", "c"] }), 0);
    let a = pend(&host, "pictures/a");

    for _ in 0..50 {
        p.on_frame_tick().unwrap();
    }
    assert_eq!(host.borrow().fetched, vec!["pictures/a"]);
    assert_eq!(p.countdown(), Countdown::AwaitingCompletion);
    assert!(p.awaiting().is_some_and(|s| Rc::ptr_eq(s, &a)));
    assert!(!p.is_complete());

    a.complete_load(RgbaImage::new(2, 2));
    assert_eq!(p.countdown(), Countdown::Ticks(0));
    assert!(p.awaiting().is_none());

    p.on_frame_tick().unwrap();
    assert_eq!(
        host.borrow().fetched,
        vec!["pictures/a", "pictures/b", "pictures/c"]
    );
    assert!(p.is_complete());
}

#[test]
fn completed_latch_stops_all_fetching() {
    let (mut p, host) = preloader(json!({ "tilesets": ["A1"] }), 0);
    p.on_frame_tick().unwrap();
    assert!(p.is_complete());
    let before = host.borrow().fetched.len();
    for _ in 0..10 {
        p.on_frame_tick().unwrap();
    }
    assert!(p.is_complete());
    assert_eq!(host.borrow().fetched.len(), before);
    assert_eq!(p.stats().ticks, 1);
}

#[test]
fn interval_two_trace_with_sync_then_async_item() {
    let (mut p, host) = preloader(json!({ "pictures": ["p1", "p2"] }), 2);
    let p2 = pend(&host, "pictures/p2");
    let fetched = |host: &Rc<RefCell<FakeHost>>| host.borrow().fetched.len();

    // tick 1: p1 is ready, countdown 2 then advanced to 1.
    p.on_frame_tick().unwrap();
    assert_eq!(fetched(&host), 1);
    assert_eq!(p.countdown(), Countdown::Ticks(1));

    // tick 2: waits.
    p.on_frame_tick().unwrap();
    assert_eq!(fetched(&host), 1);
    assert_eq!(p.countdown(), Countdown::Ticks(0));

    // tick 3: dispatches p2, which is still decoding.
    p.on_frame_tick().unwrap();
    assert_eq!(fetched(&host), 2);
    assert_eq!(p.countdown(), Countdown::AwaitingCompletion);

    // ticks 4..10: blocked.
    for _ in 4..=10 {
        p.on_frame_tick().unwrap();
        assert_eq!(p.countdown(), Countdown::AwaitingCompletion);
    }

    p2.complete_load(RgbaImage::new(1, 1));
    assert_eq!(p.countdown(), Countdown::Ticks(2));

    p.on_frame_tick().unwrap();
    assert_eq!(p.countdown(), Countdown::Ticks(1));
    p.on_frame_tick().unwrap();
    assert_eq!(p.countdown(), Countdown::Ticks(0));
    assert!(!p.is_complete());

    p.on_frame_tick().unwrap();
    assert!(p.is_complete());
    assert_eq!(fetched(&host), 2);
    assert_eq!(p.stats().ready_now, 1);
    assert_eq!(p.stats().pending, 1);
}

#[test]
fn without_await_decode_pending_fetch_waits_interval_only() {
    let host = Rc::new(RefCell::new(FakeHost::default()));
    pend(&host, "faces/a");
    let mut p = Preloader::new(
        work_queue_from_value(&json!({ "faces": ["a", "b"] })),
        router_for(&host),
        &PreloadOpts {
            load_interval_ticks: 1,
            await_decode: false,
            ..Default::default()
        },
    );
    p.on_frame_tick().unwrap();
    assert_eq!(p.countdown(), Countdown::Ticks(0));
    p.on_frame_tick().unwrap();
    assert_eq!(host.borrow().fetched, vec!["faces/a", "faces/b"]);
}

#[test]
fn fetch_error_propagates_and_consumes_item() {
    let calls = Rc::new(RefCell::new(0u32));
    let c = Rc::clone(&calls);
    let router = FetchRouter::new().with(Category::Enemies, move |name, _| {
        *c.borrow_mut() += 1;
        if name == "bad" {
            return Err(PreloadError::fetch("primitive failed"));
        }
        Ok(Surface::decoded(name, RgbaImage::new(1, 1)))
    });
    let mut p = Preloader::new(
        work_queue_from_value(&json!({ "enemies": ["bad", "Bat"] })),
        router,
        &opts(0),
    );
    assert!(p.on_frame_tick().is_err());
    assert_eq!(p.remaining(), 1);
    p.on_frame_tick().unwrap();
    assert!(p.is_complete());
    assert_eq!(*calls.borrow(), 2);
}
