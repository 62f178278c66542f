use serde::{Deserialize, Serialize};

/// Keyboard modifiers held while a pointer gesture runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierKeys {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Options shared by hover and drag gestures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseOptions {
    /// Pointer position relative to the element. `None` means the element
    /// center, filled in per target by the inspector's geometry helper.
    pub offset: Option<(i32, i32)>,
    pub modifiers: ModifierKeys,
}

/// Options for click-family gestures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickOptions {
    pub offset: Option<(i32, i32)>,
    /// Caret position to set after the click lands in a typeable element.
    pub caret_pos: Option<u32>,
    pub modifiers: ModifierKeys,
}

/// Options for the type gesture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeOptions {
    pub caret_pos: Option<u32>,
    /// Replace the current value instead of appending to it.
    pub replace: bool,
    pub modifiers: ModifierKeys,
}

/// Character span handed to the text-selection automation. Produced from the
/// positional arguments of a select call after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionSpan {
    /// The whole content.
    All,
    /// From the start of the content to `0..offset`.
    Offset(u32),
    /// Between two character positions.
    Positions { start: u32, end: u32 },
    /// Between two line/column pairs of a multiline input.
    LinePositions {
        start_line: u32,
        start_pos: u32,
        end_line: u32,
        end_pos: u32,
    },
}
