use glam::Vec2;

/// Platform-agnostic mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

/// Modifier key state at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub control: bool,
    /// Alt held.
    pub alt: bool,
}

/// What happened to the mouse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseEventKind {
    /// Cursor moved.
    Move,
    /// Button pressed.
    Press(MouseButton),
    /// Button released.
    Release(MouseButton),
    /// Button double-clicked.
    DoubleClick(MouseButton),
    /// Scroll wheel (positive = away from the user).
    Wheel {
        /// Scroll amount.
        delta: f32,
    },
}

/// A mouse event in viewport pixel coordinates, forwarded to interactive
/// objects while the interact tool is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMouseEvent {
    /// What happened.
    pub kind: MouseEventKind,
    /// Cursor position in physical pixels.
    pub position: Vec2,
    /// Cursor position of the previous event.
    pub last_position: Vec2,
    /// Modifier state.
    pub modifiers: Modifiers,
}

impl ViewportMouseEvent {
    /// Create an event with no modifiers and no movement.
    #[must_use]
    pub fn new(kind: MouseEventKind, x: f32, y: f32) -> Self {
        let position = Vec2::new(x, y);
        Self {
            kind,
            position,
            last_position: position,
            modifiers: Modifiers::default(),
        }
    }

    /// Cursor movement since the previous event.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.position - self.last_position
    }

    /// Whether this event pressed `button`.
    #[must_use]
    pub fn is_press(&self, button: MouseButton) -> bool {
        self.kind == MouseEventKind::Press(button)
    }
}
