//! Navigation stack of panels.
//!
//! The current panel lives in its own slot; panels it covers wait in
//! `suspended`, most recent last. A panel moves current → suspended when
//! something is pushed over it, and back when that panel is popped.

use handplay_types::{HandplayError, Key, Result};

use crate::context::Ui;
use crate::panel::{Panel, PanelFactory, PanelId, PanelObject};

struct Entry {
    id: PanelId,
    panel: Box<dyn PanelObject>,
}

#[derive(Default)]
pub struct PanelStack {
    active: Option<Entry>,
    suspended: Vec<Entry>,
}

impl PanelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the current panel.
    pub fn current(&self) -> Option<PanelId> {
        self.active.as_ref().map(|e| e.id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }

    /// Current panel plus suspended ones.
    pub fn depth(&self) -> usize {
        self.suspended.len() + usize::from(self.active.is_some())
    }

    pub fn contains(&self, id: PanelId) -> bool {
        self.current() == Some(id) || self.suspended.iter().any(|e| e.id == id)
    }

    /// State of the current panel, if it is a `P`.
    pub fn get_priv<P: Panel>(&mut self) -> Option<&mut P> {
        let entry = self.active.as_mut()?;
        if entry.id != PanelId::of::<P>() {
            return None;
        }
        entry.panel.as_any_mut().downcast_mut::<P>()
    }

    /// Push a new panel. Returns `Ok(false)` when a panel of the same type
    /// is already on the stack; the factory is dropped unrun.
    ///
    /// When the new panel fails to initialize, the previous panel becomes
    /// current again and receives a fresh `on_show`.
    pub(crate) fn push(&mut self, ui: &mut Ui, id: PanelId, factory: PanelFactory) -> Result<bool> {
        ui.invalidate();
        if self.contains(id) {
            log::warn!("Panel {id} is already on the stack, ignoring push");
            return Ok(false);
        }

        if let Some(mut top) = self.active.take() {
            top.panel.on_hide(ui);
            self.suspended.push(top);
        }

        match factory(ui) {
            Ok(panel) => {
                log::info!("Pushed panel {id} (depth {})", self.suspended.len() + 1);
                let entry = self.active.insert(Entry { id, panel });
                entry.panel.on_show(ui);
                Ok(true)
            }
            Err(e) => {
                log::warn!("Panel {id} failed to initialize: {e}");
                if let Some(prev) = self.suspended.pop() {
                    let entry = self.active.insert(prev);
                    entry.panel.on_show(ui);
                }
                Err(HandplayError::PanelInit {
                    panel: id.name(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Uninit and drop the current panel, uncovering the one below.
    pub(crate) fn pop(&mut self, ui: &mut Ui) {
        ui.invalidate();
        self.pop_one(ui);
    }

    fn pop_one(&mut self, ui: &mut Ui) {
        let Some(mut top) = self.active.take() else {
            return;
        };
        top.panel.uninit(ui);
        log::info!("Popped panel {}", top.id);
        drop(top);

        if let Some(prev) = self.suspended.pop() {
            let entry = self.active.insert(prev);
            entry.panel.on_show(ui);
        }
    }

    pub(crate) fn pop_all(&mut self, ui: &mut Ui) {
        ui.invalidate();
        while self.active.is_some() {
            self.pop_one(ui);
        }
    }

    pub(crate) fn poll(&mut self, ui: &mut Ui) {
        if let Some(entry) = self.active.as_mut() {
            entry.panel.on_poll(ui);
        }
    }

    pub(crate) fn key(&mut self, ui: &mut Ui, key: Key) {
        if let Some(entry) = self.active.as_mut() {
            entry.panel.on_key(ui, key);
        }
    }

    pub(crate) fn draw(&mut self, ui: &mut Ui) -> Result<()> {
        match self.active.as_mut() {
            Some(entry) => entry.panel.on_draw(ui),
            None => Ok(()),
        }
    }
}
