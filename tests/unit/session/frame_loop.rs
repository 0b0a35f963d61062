use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::config::PreloadOpts;
use crate::fetch::FetchRouter;
use crate::foundation::error::PreloadError;
use crate::manifest::work_queue_from_value;

#[test]
fn steps_run_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let mut frame_loop = FrameLoop::new();
    for name in ["scene", "preload", "render"] {
        let log = Rc::clone(&log);
        frame_loop.add_step(move || -> PreloadResult<()> {
            log.borrow_mut().push(name);
            Ok(())
        });
    }
    frame_loop.tick().unwrap();
    frame_loop.tick().unwrap();
    assert_eq!(frame_loop.frames(), 2);
    assert_eq!(frame_loop.step_count(), 3);
    assert_eq!(
        *log.borrow(),
        vec!["scene", "preload", "render", "scene", "preload", "render"]
    );
}

#[test]
fn failing_step_aborts_rest_of_frame() {
    let ran = Rc::new(Cell::new(0u32));
    let mut frame_loop = FrameLoop::new();
    frame_loop.add_step(|| -> PreloadResult<()> { Err(PreloadError::fetch("nope")) });
    let r = Rc::clone(&ran);
    frame_loop.add_step(move || -> PreloadResult<()> {
        r.set(r.get() + 1);
        Ok(())
    });
    assert!(frame_loop.tick().is_err());
    assert_eq!(ran.get(), 0);
    assert_eq!(frame_loop.frames(), 1);
}

#[test]
fn shared_preloader_is_ticked_and_queryable() {
    let preloader = Rc::new(RefCell::new(Preloader::new(
        work_queue_from_value(&json!({ "ghosts": ["a"] })),
        FetchRouter::new(),
        &PreloadOpts::default(),
    )));
    let mut frame_loop = FrameLoop::new();
    let step = Rc::clone(&preloader);
    frame_loop.add_step(move || step.borrow_mut().on_frame_tick());
    assert!(!preloader.borrow().is_complete());
    frame_loop.tick().unwrap();
    assert!(preloader.borrow().is_complete());
    assert_eq!(preloader.borrow().stats().skipped, 1);
}

#[test]
fn preloader_is_a_frame_step() {
    let mut frame_loop = FrameLoop::new();
    frame_loop.add_step(Preloader::new(
        work_queue_from_value(&json!({})),
        FetchRouter::new(),
        &PreloadOpts::default(),
    ));
    for _ in 0..3 {
        frame_loop.tick().unwrap();
    }
    assert_eq!(frame_loop.frames(), 3);
}
