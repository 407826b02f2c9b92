use std::time::Duration;

use ratatui_image::picker::{Capability, Picker, ProtocolType, cap_parser::QueryStdioOptions};

/// Terminal environment facts that decide how cover images are drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TerminalHints {
    pub kitty_window: bool,
    pub term_is_kitty: bool,
    pub tmux: bool,
    pub iterm: bool,
}

impl TerminalHints {
    pub(crate) fn from_env() -> Self {
        let non_empty = |key: &str| {
            std::env::var(key)
                .ok()
                .is_some_and(|value| !value.trim().is_empty())
        };
        let contains = |key: &str, needle: &str| {
            std::env::var(key)
                .ok()
                .is_some_and(|value| value.contains(needle))
        };
        Self {
            kitty_window: non_empty("KITTY_WINDOW_ID"),
            term_is_kitty: std::env::var("TERM")
                .ok()
                .is_some_and(|term| term.trim().starts_with("xterm-kitty")),
            tmux: std::env::var_os("TMUX").is_some(),
            iterm: non_empty("ITERM_SESSION_ID")
                || contains("TERM_PROGRAM", "iTerm")
                || contains("LC_TERMINAL", "iTerm"),
        }
    }

    /// Whether probing the terminal over stdio is worth the startup delay.
    pub(crate) fn should_query(&self) -> bool {
        self.kitty_window || self.term_is_kitty || self.iterm || self.tmux
    }

    pub(crate) fn query_timeout(&self) -> Duration {
        if self.kitty_window || self.term_is_kitty || self.iterm {
            Duration::from_millis(1500)
        } else if self.tmux {
            // Without passthrough tmux never answers; keep startup snappy.
            Duration::from_millis(300)
        } else {
            Duration::ZERO
        }
    }

    pub(crate) fn kitty_supported(&self, picker: &Picker) -> bool {
        if self.iterm {
            return false;
        }
        self.kitty_window
            || picker
                .capabilities()
                .iter()
                .any(|cap| matches!(cap, Capability::Kitty))
    }
}

/// Builds the picker used for cover previews, falling back to halfblocks.
pub(crate) fn build_picker(hints: &TerminalHints) -> Picker {
    if hints.tmux {
        allow_tmux_passthrough();
    }
    if !hints.should_query() {
        return Picker::halfblocks();
    }
    let options = QueryStdioOptions {
        timeout: hints.query_timeout(),
        text_sizing_protocol: false,
    };
    let mut picker =
        Picker::from_query_stdio_with_options(options).unwrap_or_else(|_| Picker::halfblocks());
    if hints.kitty_supported(&picker) {
        picker.set_protocol_type(ProtocolType::Kitty);
    }
    picker
}

fn allow_tmux_passthrough() {
    // Failure only means covers fall back to halfblocks.
    let _ = std::process::Command::new("tmux")
        .args(["set-option", "-g", "allow-passthrough", "on"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
}

pub(crate) fn protocol_label(picker: &Picker) -> &'static str {
    match picker.protocol_type() {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}
