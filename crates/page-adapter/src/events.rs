use serde_json::Value;

/// Native-dialog activity reported by the page-side dialog handler.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogEvent {
    /// A native dialog appeared that no handler was armed for.
    Unexpected { dialog: String, message: String },
    /// An armed handler gave up waiting for its dialog.
    ExpectedMissing { dialog: String },
    /// The handler replaced its bookkeeping blob; mirrored to the embedder
    /// and across frames.
    InfoChanged { info: Value },
}

/// Page lifecycle signals the runner reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum PageEvent {
    UncaughtJsError {
        message: String,
        page_url: String,
        /// Set when the error was raised inside a child frame document.
        in_iframe: bool,
    },
    /// The page entered its beforeunload phase; a navigation or download may
    /// follow.
    BeforeUnload,
    /// The page is gone.
    Unload,
}
