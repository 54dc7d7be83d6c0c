//! Interaction delegates: objects that take over mouse input while the
//! interact tool is active and their target is under the cursor.

/// Viewport mouse events.
pub mod event;

use std::cell::RefCell;
use std::rc::Weak;

pub use event::{Modifiers, MouseButton, MouseEventKind, ViewportMouseEvent};

/// Something that can be manipulated with the mouse (a gizmo, an
/// interactive marker control, ...).
pub trait InteractiveObject {
    /// Whether the object currently accepts interaction.
    fn is_interactive(&self) -> bool;

    /// Called when the interact tool is activated or deactivated.
    fn enable_interaction(&mut self, enable: bool);

    /// Handle one mouse event.
    fn handle_mouse_event(&mut self, event: &ViewportMouseEvent);
}

/// Non-owning reference to an interaction delegate.
///
/// The delegate's visual lifetime belongs to whoever created it; holders
/// upgrade only for the duration of a single call.
pub type InteractiveObjectWeak = Weak<RefCell<dyn InteractiveObject>>;

/// Forward `event` to the delegate if it is still alive and interactive.
/// Returns whether the event was delivered.
pub fn dispatch_mouse_event(
    delegate: &InteractiveObjectWeak,
    event: &ViewportMouseEvent,
) -> bool {
    let Some(object) = delegate.upgrade() else {
        return false;
    };
    let Ok(mut object) = object.try_borrow_mut() else {
        log::warn!("interactive object busy, dropping mouse event");
        return false;
    };
    if !object.is_interactive() {
        return false;
    }
    object.handle_mouse_event(event);
    true
}

/// Toggle interaction on the delegate if it is still alive.
pub fn set_interaction_enabled(
    delegate: &InteractiveObjectWeak,
    enable: bool,
) -> bool {
    let Some(object) = delegate.upgrade() else {
        return false;
    };
    let Ok(mut object) = object.try_borrow_mut() else {
        return false;
    };
    object.enable_interaction(enable);
    true
}
