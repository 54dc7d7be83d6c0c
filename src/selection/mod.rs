//! Selection handlers and the manager that drives them.
//!
//! A handler owns one pick handle. It tracks the scene objects that make up
//! its target, draws wireframe highlight boxes around them, projects the
//! target into the property panel and optionally hands mouse input to an
//! interaction delegate. The [`SelectionManager`] allocates handles, keeps
//! the current selection and calls the handler hooks.
//!
//! Ownership: callers own handlers as `Rc<RefCell<H>>`. The manager and each
//! handler's [`ObjectTracker`] only hold weak references back, and the scene
//! holds a weak reference to the tracker, so dropping a handler is enough to
//! tear everything down.

mod handler;
mod highlight;
mod manager;
mod tracker;

#[cfg(test)]
mod fixtures;

pub use handler::{
    BasicSelectionHandler, HandlerCore, HandlerRegistry, SelectionHandler,
    SelectionHandlerPtr, SelectionHandlerWeak,
};
pub use highlight::{BoxRegistry, HighlightBox};
pub use manager::SelectionManager;
pub use tracker::ObjectTracker;
