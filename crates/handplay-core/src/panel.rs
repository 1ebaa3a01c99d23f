//! The panel contract.
//!
//! A panel is one full screen of UI: the file browser, the player. Exactly
//! one panel is current at a time; the rest wait suspended on the
//! [`PanelStack`](crate::stack::PanelStack). Panels are identified by type,
//! so a panel type can be on the stack at most once.

use std::any::{Any, TypeId};
use std::fmt;

use handplay_types::{Key, Result};

use crate::context::Ui;

/// Lifecycle of one screen.
///
/// Only `init` and `on_draw` are required. Every callback runs on the UI
/// thread and must not block; navigation requested from a callback
/// (`ui.push`, `ui.pop`) takes effect as soon as the callback returns.
pub trait Panel: Any {
    /// Data handed to `init` by whoever pushes the panel.
    type Init: 'static;

    /// Build the panel's state. An error aborts the push and leaves the
    /// previous panel current.
    fn init(ui: &mut Ui, init: Self::Init) -> Result<Self>
    where
        Self: Sized;

    /// Called once before the panel's state is dropped.
    fn uninit(&mut self, _ui: &mut Ui) {}

    /// The panel became current, either freshly pushed or uncovered by a pop.
    fn on_show(&mut self, _ui: &mut Ui) {}

    /// Another panel was pushed on top of this one.
    fn on_hide(&mut self, _ui: &mut Ui) {}

    /// Draw one frame. Only called between render start and end, and only
    /// when a redraw was requested.
    fn on_draw(&mut self, ui: &mut Ui) -> Result<()>;

    /// Called once per loop iteration, whether or not a frame advanced.
    fn on_poll(&mut self, _ui: &mut Ui) {}

    /// Called once per key transition.
    fn on_key(&mut self, _ui: &mut Ui, _key: Key) {}
}

/// Stable identity of a panel type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId {
    type_id: TypeId,
    name: &'static str,
}

impl PanelId {
    pub fn of<P: Panel>() -> Self {
        let full = std::any::type_name::<P>();
        let name = full
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full);
        Self {
            type_id: TypeId::of::<P>(),
            name,
        }
    }

    /// Short type name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PanelId({})", self.name)
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view of a [`Panel`] used by the stack.
pub(crate) trait PanelObject {
    fn uninit(&mut self, ui: &mut Ui);
    fn on_show(&mut self, ui: &mut Ui);
    fn on_hide(&mut self, ui: &mut Ui);
    fn on_draw(&mut self, ui: &mut Ui) -> Result<()>;
    fn on_poll(&mut self, ui: &mut Ui);
    fn on_key(&mut self, ui: &mut Ui, key: Key);
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<P: Panel> PanelObject for P {
    fn uninit(&mut self, ui: &mut Ui) {
        Panel::uninit(self, ui);
    }

    fn on_show(&mut self, ui: &mut Ui) {
        Panel::on_show(self, ui);
    }

    fn on_hide(&mut self, ui: &mut Ui) {
        Panel::on_hide(self, ui);
    }

    fn on_draw(&mut self, ui: &mut Ui) -> Result<()> {
        Panel::on_draw(self, ui)
    }

    fn on_poll(&mut self, ui: &mut Ui) {
        Panel::on_poll(self, ui);
    }

    fn on_key(&mut self, ui: &mut Ui, key: Key) {
        Panel::on_key(self, ui, key);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Deferred construction of a panel, run by the stack once the duplicate
/// check has passed.
pub(crate) type PanelFactory = Box<dyn FnOnce(&mut Ui) -> Result<Box<dyn PanelObject>>>;

pub(crate) fn factory<P: Panel>(init: P::Init) -> PanelFactory {
    Box::new(move |ui| {
        let panel = P::init(ui, init)?;
        Ok(Box::new(panel) as Box<dyn PanelObject>)
    })
}
