//! The UI context: drivers, pacing state and the panel stack.
//!
//! [`Ui`] is what panels see. It owns the drivers and the per-loop state and
//! records navigation requests. [`UiContext`] pairs it with the
//! [`PanelStack`] and applies those requests after every panel callback and
//! every dispatched task. Neither type is `Send`; the only ways in from
//! other threads are the [`UiDispatch`] queue and the [`Waker`].

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use handplay_platform::{AudioDriver, FontId, PlatformDriver, RenderDriver, SCREEN_HEIGHT, SCREEN_WIDTH};
use handplay_types::{HandplayConfig, KeyBits, Result};

use crate::dispatch::{DispatchQueue, PostHandle};
use crate::frame_clock::FrameClock;
use crate::panel::{self, Panel, PanelFactory, PanelId};
use crate::stack::PanelStack;
use crate::wakeup::{WakeupGate, Waker};

/// Work queue whose tasks run on the UI thread against the whole context.
pub type UiDispatch = DispatchQueue<UiContext>;

/// The device drivers a context runs on.
pub struct Drivers {
    pub platform: Box<dyn PlatformDriver>,
    pub render: Box<dyn RenderDriver>,
    pub audio: Option<Box<dyn AudioDriver>>,
}

enum FontSlot {
    Unloaded,
    Loaded(FontId),
    Failed,
}

pub(crate) enum NavRequest {
    Push { id: PanelId, factory: PanelFactory },
    Pop,
    PopAll,
}

/// Services available to panels.
pub struct Ui {
    platform: Box<dyn PlatformDriver>,
    render: Box<dyn RenderDriver>,
    audio: Option<Box<dyn AudioDriver>>,
    config: HandplayConfig,
    pub(crate) clock: FrameClock,
    pub(crate) gate: Arc<WakeupGate>,
    dispatch: UiDispatch,
    pub(crate) want_redraw: bool,
    pub(crate) key_bits: KeyBits,
    font: FontSlot,
    nav: VecDeque<NavRequest>,
}

impl Ui {
    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Push panel `P` once the current callback returns. Ignored when a `P`
    /// is already on the stack.
    pub fn push<P: Panel>(&mut self, init: P::Init) {
        self.nav.push_back(NavRequest::Push {
            id: PanelId::of::<P>(),
            factory: panel::factory::<P>(init),
        });
    }

    /// Pop the current panel once the current callback returns.
    pub fn pop(&mut self) {
        self.nav.push_back(NavRequest::Pop);
    }

    pub fn pop_all(&mut self) {
        self.nav.push_back(NavRequest::PopAll);
    }

    // -----------------------------------------------------------------------
    // Frame state
    // -----------------------------------------------------------------------

    /// Request a redraw at the next frame boundary.
    pub fn invalidate(&mut self) {
        self.want_redraw = true;
    }

    pub fn redraw_pending(&self) -> bool {
        self.want_redraw
    }

    /// Start of the current frame. Use this instead of the wall clock for
    /// timers so every callback of one iteration agrees on "now".
    pub fn frame_time(&self) -> Instant {
        self.clock.time()
    }

    /// Keys held at the last poll.
    pub fn key_bits(&self) -> KeyBits {
        self.key_bits
    }

    /// True when every key in `mask` was held at the last poll.
    pub fn check_pressed_keys(&self, mask: KeyBits) -> bool {
        self.key_bits.contains_all(mask)
    }

    // -----------------------------------------------------------------------
    // Drivers
    // -----------------------------------------------------------------------

    pub fn render(&mut self) -> &mut (dyn RenderDriver + 'static) {
        &mut *self.render
    }

    pub fn platform(&self) -> &dyn PlatformDriver {
        self.platform.as_ref()
    }

    pub(crate) fn platform_mut(&mut self) -> &mut (dyn PlatformDriver + 'static) {
        &mut *self.platform
    }

    pub fn audio(&mut self) -> Option<&mut (dyn AudioDriver + 'static)> {
        self.audio.as_deref_mut()
    }

    pub fn config(&self) -> &HandplayConfig {
        &self.config
    }

    /// The shared default font, loaded on first use. A failed load is
    /// remembered and not retried.
    pub fn font(&mut self) -> Option<FontId> {
        match self.font {
            FontSlot::Loaded(id) => Some(id),
            FontSlot::Failed => None,
            FontSlot::Unloaded => {
                let path: Option<PathBuf> = self
                    .config
                    .font_path
                    .clone()
                    .or_else(|| self.platform.font_path());
                match self.render.font_init(path.as_deref()) {
                    Ok(id) => {
                        log::debug!("Loaded default font {path:?}");
                        self.font = FontSlot::Loaded(id);
                        Some(id)
                    }
                    Err(e) => {
                        log::warn!("Default font unavailable: {e}");
                        self.font = FontSlot::Failed;
                        None
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Cross-thread work
    // -----------------------------------------------------------------------

    /// Clone of the UI work queue, for handing to other threads.
    pub fn dispatch(&self) -> UiDispatch {
        self.dispatch.clone()
    }

    pub fn waker(&self) -> Waker {
        Waker::new(Arc::clone(&self.gate))
    }

    pub fn wakeup(&self) {
        self.gate.signal();
    }

    pub fn run_post<F>(&self, f: F) -> PostHandle
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.dispatch.post(f)
    }

    pub fn run_post_steal<D, F>(&self, data: D, f: F) -> PostHandle
    where
        D: Send + 'static,
        F: FnOnce(&mut UiContext, D) + Send + 'static,
    {
        self.dispatch.post_steal(data, f)
    }

    pub fn run_cancel(&self, handle: PostHandle) -> bool {
        self.dispatch.cancel(handle)
    }
}

/// The UI context: [`Ui`] plus the panel stack.
pub struct UiContext {
    pub(crate) ui: Ui,
    pub(crate) stack: PanelStack,
}

impl UiContext {
    /// Initialize the drivers and bind the calling thread as the UI thread.
    /// Nothing is left initialized when this fails.
    pub fn new(drivers: Drivers, config: HandplayConfig) -> Result<Self> {
        config.validate()?;
        let Drivers {
            mut platform,
            mut render,
            audio,
        } = drivers;

        platform.init()?;
        if let Err(e) = render.init(SCREEN_WIDTH, SCREEN_HEIGHT) {
            platform.uninit();
            return Err(e);
        }
        log::info!("UI context initialized ({SCREEN_WIDTH}x{SCREEN_HEIGHT})");

        let gate = Arc::new(WakeupGate::new());
        let dispatch = DispatchQueue::new(Some(Waker::new(Arc::clone(&gate))));
        dispatch.bind_owner_thread();

        Ok(Self {
            ui: Ui {
                platform,
                render,
                audio,
                clock: FrameClock::new(config.frame_interval()),
                config,
                gate,
                dispatch,
                want_redraw: false,
                key_bits: KeyBits::NONE,
                font: FontSlot::Unloaded,
                nav: VecDeque::new(),
            },
            stack: PanelStack::new(),
        })
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut Ui {
        &mut self.ui
    }

    /// Push the first panel. Unlike later pushes, a failure here is fatal
    /// to the caller.
    pub fn push_initial<P: Panel>(&mut self, init: P::Init) -> Result<()> {
        let pushed = self
            .stack
            .push(&mut self.ui, PanelId::of::<P>(), panel::factory::<P>(init))?;
        if !pushed {
            log::warn!("Initial panel {} was already present", PanelId::of::<P>());
        }
        self.apply_navigation();
        Ok(())
    }

    pub fn current(&self) -> Option<PanelId> {
        self.stack.current()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// State of the current panel, if it is a `P`.
    pub fn panel_mut<P: Panel>(&mut self) -> Option<&mut P> {
        self.stack.get_priv::<P>()
    }

    /// Run `f` with the current panel's state and the services, if the
    /// current panel is a `P`. Navigation requested by `f` is applied before
    /// returning.
    pub fn with_panel<P: Panel, R>(&mut self, f: impl FnOnce(&mut P, &mut Ui) -> R) -> Option<R> {
        let panel = self.stack.get_priv::<P>()?;
        let result = f(panel, &mut self.ui);
        self.apply_navigation();
        Some(result)
    }

    pub fn invalidate(&mut self) {
        self.ui.invalidate();
    }

    /// Carry out navigation requested since the last call, including
    /// requests made by the callbacks that navigation itself triggers.
    pub(crate) fn apply_navigation(&mut self) {
        while let Some(request) = self.ui.nav.pop_front() {
            match request {
                NavRequest::Push { id, factory } => {
                    // A failed init is logged by the stack and leaves the
                    // previous panel current.
                    let _ = self.stack.push(&mut self.ui, id, factory);
                }
                NavRequest::Pop => self.stack.pop(&mut self.ui),
                NavRequest::PopAll => self.stack.pop_all(&mut self.ui),
            }
        }
    }
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.stack.pop_all(&mut self.ui);
        self.ui.nav.clear();
        self.ui.dispatch.close();
        if let FontSlot::Loaded(font) = self.ui.font {
            self.ui.render.font_uninit(font);
        }
        if let Some(audio) = self.ui.audio.as_mut() {
            audio.close();
        }
        self.ui.render.uninit();
        self.ui.platform.uninit();
        self.ui.platform.exit();
        log::info!("UI context shut down");
    }
}
