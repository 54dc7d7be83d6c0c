//! Shared display context handed to every selection handler.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SelectionError;
use crate::options::SelectionOptions;
use crate::property::PropertyTree;
use crate::scene::SceneGraph;

/// Scene access, property tree and options shared by the selection manager
/// and all of its handlers.
pub struct DisplayContext {
    scene: Rc<dyn SceneGraph>,
    properties: Rc<RefCell<PropertyTree>>,
    options: SelectionOptions,
}

impl DisplayContext {
    /// Create a context with an empty property tree.
    pub fn new(scene: Rc<dyn SceneGraph>, options: SelectionOptions) -> Self {
        Self {
            scene,
            properties: Rc::new(RefCell::new(PropertyTree::new())),
            options,
        }
    }

    /// The scene graph.
    #[must_use]
    pub fn scene(&self) -> &dyn SceneGraph {
        self.scene.as_ref()
    }

    /// The property tree backing the selection panel.
    #[must_use]
    pub fn property_tree(&self) -> &Rc<RefCell<PropertyTree>> {
        &self.properties
    }

    /// Selection options.
    #[must_use]
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Check that handlers can be built on this context.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidContext`] if the highlight material
    /// is empty or unknown to the scene.
    pub fn validate(&self) -> Result<(), SelectionError> {
        let material = &self.options.highlight.material;
        if material.is_empty() {
            return Err(SelectionError::InvalidContext(
                "highlight material name is empty".to_owned(),
            ));
        }
        if !self.scene.has_material(material) {
            return Err(SelectionError::InvalidContext(format!(
                "highlight material '{material}' is not loaded"
            )));
        }
        Ok(())
    }
}
