/// Which filter value a prompt is collecting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Package,
    Tag,
    Level,
    Text,
}

impl PromptKind {
    /// Prompt label shown in the filter bar
    pub fn label(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Tag => "tag",
            Self::Level => "level",
            Self::Text => "text",
        }
    }

    /// Input hint shown next to the prompt
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Package => "application id, empty clears",
            Self::Tag => "substring, \"quoted\" for exact, empty clears",
            Self::Level => "W, E, I+ or VDI, empty clears",
            Self::Text => "substring, \"quoted\" for exact, empty clears",
        }
    }
}

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // View state
    TogglePause,
    ToggleHelp,
    ToggleFollow,

    // Filter mutation
    TogglePackageFilter,
    OpenPrompt(PromptKind),
    ClearFilters,
    ClearAllFilters,

    // Prompt input mode
    PromptInput(char),
    PromptBackspace,
    PromptClear,
    PromptAccept,
    PromptCancel,

    // Log pane navigation
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
}
