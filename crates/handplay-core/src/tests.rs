use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use handplay_platform::PlatformEvent;
use handplay_platform::headless::DrawCall;
use handplay_types::{Color, HandplayConfig, HandplayError, Key, KeyBits, KeyCode, Result};

use crate::context::Ui;
use crate::panel::{Panel, PanelId};
use crate::test_utils::Harness;
use crate::wakeup::WakeReason;

// ---------------------------------------------------------------------------
// Trace panels
// ---------------------------------------------------------------------------

type Trace = Rc<RefCell<Vec<String>>>;

struct TraceInit {
    trace: Trace,
    value: u32,
    fail: bool,
}

fn init(trace: &Trace, value: u32) -> TraceInit {
    TraceInit {
        trace: Rc::clone(trace),
        value,
        fail: false,
    }
}

/// Panel that logs every callback. `N` only makes distinct panel types.
struct TracePanel<const N: usize> {
    trace: Trace,
    value: u32,
    pop_on_key: bool,
}

impl<const N: usize> TracePanel<N> {
    fn log(&self, event: &str) {
        self.trace.borrow_mut().push(format!("{event} {N}"));
    }
}

impl<const N: usize> Panel for TracePanel<N> {
    type Init = TraceInit;

    fn init(_ui: &mut Ui, init: TraceInit) -> Result<Self> {
        init.trace.borrow_mut().push(format!("init {N}"));
        if init.fail {
            return Err(HandplayError::Panel("refused".into()));
        }
        Ok(Self {
            trace: init.trace,
            value: init.value,
            pop_on_key: false,
        })
    }

    fn uninit(&mut self, _ui: &mut Ui) {
        self.log("uninit");
    }

    fn on_show(&mut self, _ui: &mut Ui) {
        self.log("show");
    }

    fn on_hide(&mut self, _ui: &mut Ui) {
        self.log("hide");
    }

    fn on_draw(&mut self, ui: &mut Ui) -> Result<()> {
        self.log("draw");
        if let Some(font) = ui.font() {
            ui.render()
                .draw_text(font, 20, Color::WHITE, 0.0, 20.0, &format!("panel {N}"))?;
        }
        Ok(())
    }

    fn on_poll(&mut self, _ui: &mut Ui) {
        self.log("poll");
    }

    fn on_key(&mut self, ui: &mut Ui, key: Key) {
        self.log(&format!("key {:?} {:?}", key.code, key.state));
        if self.pop_on_key {
            ui.pop();
        }
    }
}

type A = TracePanel<0>;
type B = TracePanel<1>;
type C = TracePanel<2>;

fn count(trace: &Trace, event: &str) -> usize {
    trace.borrow().iter().filter(|e| e.as_str() == event).count()
}

fn lifecycle(trace: &Trace) -> Vec<String> {
    trace
        .borrow()
        .iter()
        .filter(|e| !e.starts_with("poll") && !e.starts_with("draw"))
        .cloned()
        .collect()
}

fn harness() -> Harness {
    Harness::new("/media")
}

// ---------------------------------------------------------------------------
// Panel stack
// ---------------------------------------------------------------------------

#[test]
fn initial_push_inits_and_shows() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    assert_eq!(h.ctx.current(), Some(PanelId::of::<A>()));
    assert_eq!(lifecycle(&trace), vec!["init 0", "show 0"]);
    assert!(h.ctx.ui().redraw_pending());
}

#[test]
fn duplicate_push_is_ignored() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.step();
    assert!(!h.ctx.ui().redraw_pending());

    h.ctx.ui_mut().push::<A>(init(&trace, 2));
    h.ctx.apply_navigation();

    assert_eq!(count(&trace, "init 0"), 1);
    assert_eq!(h.ctx.panel_mut::<A>().map(|p| p.value), Some(1));
    assert_eq!(h.ctx.depth(), 1);
    // A no-op push still requests a redraw.
    assert!(h.ctx.ui().redraw_pending());
}

#[test]
fn duplicate_guard_covers_suspended_panels() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui_mut().push::<B>(init(&trace, 2));
    h.ctx.apply_navigation();
    h.ctx.ui_mut().push::<A>(init(&trace, 3));
    h.ctx.apply_navigation();
    assert_eq!(h.ctx.current(), Some(PanelId::of::<B>()));
    assert_eq!(h.ctx.depth(), 2);
    assert_eq!(count(&trace, "init 0"), 1);
}

#[test]
fn stack_is_lifo() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui_mut().push::<B>(init(&trace, 2));
    h.ctx.ui_mut().push::<C>(init(&trace, 3));
    h.ctx.apply_navigation();
    assert_eq!(h.ctx.depth(), 3);

    h.ctx.ui_mut().pop();
    h.ctx.ui_mut().pop();
    h.ctx.apply_navigation();

    assert_eq!(h.ctx.current(), Some(PanelId::of::<A>()));
    assert_eq!(
        lifecycle(&trace),
        vec![
            "init 0", "show 0", "hide 0", "init 1", "show 1", "hide 1", "init 2", "show 2",
            "uninit 2", "show 1", "uninit 1", "show 0",
        ]
    );
    assert_eq!(count(&trace, "show 0"), count(&trace, "hide 0") + 1);
}

#[test]
fn failed_init_restores_previous_panel() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui_mut().push::<B>(TraceInit {
        trace: Rc::clone(&trace),
        value: 2,
        fail: true,
    });
    h.ctx.apply_navigation();

    assert_eq!(h.ctx.current(), Some(PanelId::of::<A>()));
    assert_eq!(h.ctx.depth(), 1);
    assert_eq!(
        lifecycle(&trace),
        vec!["init 0", "show 0", "hide 0", "init 1", "show 0"]
    );
    // B never initialized, so it is not on the stack and may be pushed again.
    h.ctx.ui_mut().push::<B>(init(&trace, 3));
    h.ctx.apply_navigation();
    assert_eq!(h.ctx.current(), Some(PanelId::of::<B>()));
}

#[test]
fn failed_initial_push_is_an_error() {
    let trace = Trace::default();
    let mut h = harness();
    let err = h
        .ctx
        .push_initial::<A>(TraceInit {
            trace: Rc::clone(&trace),
            value: 0,
            fail: true,
        })
        .unwrap_err();
    assert!(matches!(err, HandplayError::PanelInit { .. }));
    assert!(h.ctx.current().is_none());
}

#[test]
fn pop_on_empty_stack_is_noop() {
    let mut h = harness();
    h.ctx.ui_mut().pop();
    h.ctx.apply_navigation();
    assert!(h.ctx.current().is_none());
}

#[test]
fn get_priv_checks_panel_type() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 7)).unwrap();
    assert!(h.ctx.panel_mut::<B>().is_none());
    h.ctx.ui_mut().push::<B>(init(&trace, 8));
    h.ctx.apply_navigation();
    // A is suspended now; only the current panel is reachable.
    assert!(h.ctx.panel_mut::<A>().is_none());
    assert_eq!(h.ctx.panel_mut::<B>().map(|p| p.value), Some(8));
}

#[test]
fn panel_id_uses_short_name() {
    assert_eq!(PanelId::of::<A>().name(), "TracePanel");
    assert_ne!(PanelId::of::<A>(), PanelId::of::<B>());
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

#[test]
fn poll_runs_every_iteration() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.idle();
    h.idle();
    h.step();
    assert_eq!(count(&trace, "poll 0"), 3);
}

#[test]
fn redraw_only_on_frame_boundary_when_requested() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();

    assert!(!h.idle());
    assert_eq!(count(&trace, "draw 0"), 0);

    assert!(h.step());
    assert_eq!(count(&trace, "draw 0"), 1);
    assert_eq!(h.render.frames(), 1);
    assert!(h.render.has_text("panel 0"));

    // Nothing invalidated since.
    h.step();
    assert_eq!(count(&trace, "draw 0"), 1);

    h.ctx.invalidate();
    h.step();
    assert_eq!(count(&trace, "draw 0"), 2);
}

#[test]
fn failed_frame_start_keeps_redraw_request() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();

    h.render.fail_next_frame();
    assert!(h.step());
    assert_eq!(count(&trace, "draw 0"), 0);
    assert_eq!(h.render.frames(), 0);
    assert!(h.ctx.ui().redraw_pending());

    h.step();
    assert_eq!(count(&trace, "draw 0"), 1);
    assert_eq!(h.render.frames(), 1);
    assert!(!h.ctx.ui().redraw_pending());
}

#[test]
fn key_transitions_reach_current_panel() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.press(KeyCode::Cross);
    h.press(KeyCode::DpadUp);
    h.release(KeyCode::Cross);
    h.step();
    assert_eq!(
        lifecycle(&trace)[2..],
        [
            "key Cross Down 0",
            "key DpadUp Down 0",
            "key Cross Up 0",
        ]
    );
}

#[test]
fn keys_are_not_polled_without_frame_advance() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.platform.set_keys(KeyBits::of(&[KeyCode::Start]));
    h.idle();
    assert_eq!(h.platform.key_polls(), 0);
    assert_eq!(count(&trace, "key Start Down 0"), 0);
    h.step();
    assert_eq!(count(&trace, "key Start Down 0"), 1);
}

#[test]
fn check_pressed_keys_sees_held_mask() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.press(KeyCode::TriggerL);
    h.press(KeyCode::TriggerR);
    let both = KeyBits::of(&[KeyCode::TriggerL, KeyCode::TriggerR]);
    assert!(h.ctx.ui().check_pressed_keys(both));
    h.release(KeyCode::TriggerL);
    assert!(!h.ctx.ui().check_pressed_keys(both));
}

#[test]
fn navigation_from_key_handler_applies_after_callback() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui_mut().push::<B>(init(&trace, 2));
    h.ctx.apply_navigation();
    if let Some(b) = h.ctx.panel_mut::<B>() {
        b.pop_on_key = true;
    }
    h.tap(KeyCode::Circle);
    assert_eq!(h.ctx.current(), Some(PanelId::of::<A>()));
    // The release went to A, which was current by then.
    assert_eq!(count(&trace, "key Circle Up 0"), 1);
    assert_eq!(count(&trace, "key Circle Up 1"), 0);
}

#[test]
fn quit_event_pops_everything() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui_mut().push::<B>(init(&trace, 2));
    h.ctx.apply_navigation();
    h.platform.push_event(PlatformEvent::Quit);
    h.step();
    assert!(h.ctx.current().is_none());
    assert_eq!(count(&trace, "uninit 1"), 1);
    assert_eq!(count(&trace, "uninit 0"), 1);
}

#[test]
fn dispatched_task_reaches_current_panel() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui().run_post(|ctx| {
        ctx.with_panel::<A, _>(|panel, ui| {
            panel.value = 99;
            ui.invalidate();
        });
    });
    h.idle();
    assert_eq!(h.ctx.panel_mut::<A>().map(|p| p.value), Some(99));
}

#[test]
fn cancelled_post_never_runs() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    let handle = h.ctx.ui().run_post(|ctx| {
        if let Some(panel) = ctx.panel_mut::<A>() {
            panel.value = 5;
        }
    });
    assert!(h.ctx.ui().run_cancel(handle));
    h.idle();
    assert_eq!(h.ctx.panel_mut::<A>().map(|p| p.value), Some(1));
}

#[test]
fn post_steal_hands_data_to_task() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.ctx.ui().run_post_steal(vec![4u32, 5, 6], |ctx, data| {
        if let Some(panel) = ctx.panel_mut::<A>() {
            panel.value = data.iter().sum();
        }
    });
    h.idle();
    assert_eq!(h.ctx.panel_mut::<A>().map(|p| p.value), Some(15));
}

#[test]
fn font_is_loaded_once() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.step();
    h.ctx.invalidate();
    h.step();
    assert_eq!(h.render.fonts_loaded(), 1);
}

#[test]
fn font_failure_is_remembered() {
    let trace = Trace::default();
    let mut h = harness();
    h.render.fail_fonts();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    h.step();
    assert!(h.ctx.ui_mut().font().is_none());
    assert_eq!(count(&trace, "draw 0"), 1);
    assert!(!h
        .render
        .calls()
        .iter()
        .any(|c| matches!(c, DrawCall::Text { .. })));
}

#[test]
fn wakeup_interrupts_frame_wait() {
    let mut config = HandplayConfig::default();
    config.frame_rate = 1;
    let h = Harness::with_config("/media", config);
    let waker = h.ctx.ui().waker();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        waker.wake();
    });
    assert_eq!(h.ctx.wait_next_frame(), WakeReason::Signaled);
    t.join().unwrap();
}

#[test]
fn main_loop_exits_when_worker_pops_everything() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    let dispatch = h.ctx.ui().dispatch();
    let done = Arc::new(AtomicBool::new(false));
    let done2 = Arc::clone(&done);
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        let depth = dispatch
            .run_sync(|ctx| {
                let depth = ctx.depth();
                ctx.ui_mut().pop_all();
                depth
            })
            .unwrap();
        done2.store(true, Ordering::SeqCst);
        depth
    });
    h.ctx.main_loop();
    assert_eq!(worker.join().unwrap(), 1);
    assert!(done.load(Ordering::SeqCst));
    assert!(h.ctx.current().is_none());
    assert_eq!(count(&trace, "uninit 0"), 1);
}

#[test]
fn dropping_context_releases_drivers() {
    let trace = Trace::default();
    let mut h = harness();
    h.ctx.push_initial::<A>(init(&trace, 1)).unwrap();
    let platform = h.platform.clone();
    assert!(platform.is_initialized());
    drop(h);
    assert!(platform.is_uninitialized());
    assert_eq!(count(&trace, "uninit 0"), 1);
}
