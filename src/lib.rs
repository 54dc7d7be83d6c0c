// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Selection handlers for an interactive 3D viewer.
//!
//! A selection handler owns one pick handle and everything that hangs off
//! it: the scene objects that make up its target, the wireframe boxes that
//! highlight the target when it is selected, the rows it adds to the
//! selection panel and an optional interaction delegate.
//!
//! # Key entry points
//!
//! - [`selection::SelectionManager`] - allocates handles and drives handlers
//!   through selection changes, render passes and property refreshes
//! - [`selection::SelectionHandler`] - the handler trait; implementors embed
//!   a [`selection::HandlerCore`]
//! - [`scene::SceneGraph`] - the scene boundary handlers talk to, with a
//!   headless [`scene::Scene`] implementation
//! - [`options::SelectionOptions`] - highlight, property refresh and
//!   render-pass settings, loadable from TOML
//!
//! # Lifecycle
//!
//! Tracked objects report moves and destruction synchronously through a
//! per-handler [`selection::ObjectTracker`], so highlight boxes follow their
//! targets and never outlive them. Dropping a handler detaches its
//! listeners, releases its boxes, removes its properties and frees its
//! handle.

pub mod bounds;
pub mod context;
pub mod error;
pub mod interaction;
pub mod options;
pub mod picked;
pub mod property;
pub mod scene;
pub mod selection;
