//! Pointer input types consumed by the layout surface.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

/// Keyboard modifier keys held during a pointer event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether a press should add to the selection instead of replacing it.
    #[must_use]
    pub fn is_additive(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left button; the only one that drags, resizes or selects.
    #[default]
    Primary,
    Middle,
    /// Right button; the host opens its context menu.
    Secondary,
}
