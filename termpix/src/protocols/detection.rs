// ABOUTME: Terminal capability detection for image protocol support
// ABOUTME: Decides which display encodings the current terminal understands

use std::env;

use super::DisplayTarget;

/// What the active terminal can display, probed from the environment.
#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub supports_kitty: bool,
    pub supports_iterm2: bool,
    pub supports_sixel: bool,
    pub terminal_name: String,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        // Check for user override first
        if let Ok(forced_protocol) = env::var("TERMPIX_FORCE_PROTOCOL") {
            return Self::from_forced_protocol(&forced_protocol);
        }

        Self::detect_without_override()
    }

    /// Create capabilities from forced protocol override
    fn from_forced_protocol(protocol: &str) -> Self {
        let terminal_name = format!("forced-{}", protocol);

        match protocol.to_lowercase().as_str() {
            "kitty" => Self {
                supports_kitty: true,
                supports_iterm2: false,
                supports_sixel: false,
                terminal_name,
            },
            "iterm" | "iterm2" => Self {
                supports_kitty: false,
                supports_iterm2: true,
                supports_sixel: false,
                terminal_name,
            },
            "sixel" => Self {
                supports_kitty: false,
                supports_iterm2: false,
                supports_sixel: true,
                terminal_name,
            },
            "none" | "disable" | "disabled" => Self {
                supports_kitty: false,
                supports_iterm2: false,
                supports_sixel: false,
                terminal_name,
            },
            _ => {
                eprintln!(
                    "Warning: Unknown protocol '{}' in TERMPIX_FORCE_PROTOCOL. Valid values: kitty, iterm2, sixel, none",
                    protocol
                );
                Self::detect_without_override()
            }
        }
    }

    fn detect_without_override() -> Self {
        let term_program = env::var("TERM_PROGRAM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let wezterm_exe = env::var("WEZTERM_EXECUTABLE").ok();
        let kitty_window_id = env::var("KITTY_WINDOW_ID").ok();

        let supports_kitty =
            detect_kitty_support(&term_program, &term, &wezterm_exe, &kitty_window_id);
        let supports_iterm2 = detect_iterm2_support(&term_program, &term);
        let supports_sixel = detect_sixel_support(&term_program, &term);
        let terminal_name = determine_terminal_name(&term_program, &term);

        Self {
            supports_kitty,
            supports_iterm2,
            supports_sixel,
            terminal_name,
        }
    }

    pub fn supports_inline_images(&self) -> bool {
        self.supports_kitty || self.supports_iterm2 || self.supports_sixel
    }

    /// Pick the best supported target, in fixed priority order. The ANSI
    /// glyph renderer is the universal text fallback and always wins
    /// when nothing better is available.
    pub fn preferred_target(&self) -> DisplayTarget {
        if self.supports_kitty {
            DisplayTarget::Kitty
        } else if self.supports_iterm2 {
            DisplayTarget::Iterm2
        } else if self.supports_sixel {
            DisplayTarget::Sixel
        } else {
            DisplayTarget::Ansi
        }
    }
}

fn detect_kitty_support(
    term_program: &str,
    term: &str,
    wezterm_exe: &Option<String>,
    kitty_window_id: &Option<String>,
) -> bool {
    // Direct Kitty terminal
    if term_program == "kitty" || kitty_window_id.is_some() {
        return true;
    }

    // WezTerm has good Kitty protocol support
    if term_program == "WezTerm" || wezterm_exe.is_some() {
        return true;
    }

    // Ghostty supports Kitty graphics protocol
    if term_program == "ghostty" {
        return true;
    }

    if term.contains("kitty") || term.contains("ghostty") {
        return true;
    }

    false
}

fn detect_iterm2_support(term_program: &str, term: &str) -> bool {
    if term_program == "iTerm.app" {
        return true;
    }

    // Terminals that support iTerm2 protocol
    if matches!(
        term_program,
        "WezTerm" |     // WezTerm supports both Kitty and iTerm2
        "mintty" |      // Windows terminal
        "Hyper" |       // Electron-based terminal
        "Warp" |        // Modern terminal with iTerm2 support
        "Tabby" |       // Cross-platform terminal
        "Terminus" // Another modern terminal
    ) {
        return true;
    }

    if term.contains("iterm") || term.contains("iterm2") {
        return true;
    }

    false
}

fn detect_sixel_support(term_program: &str, term: &str) -> bool {
    // mlterm and foot enable sixel unconditionally
    if matches!(term_program, "mlterm" | "foot") {
        return true;
    }

    // TERM values that advertise sixel directly or name a sixel terminal
    if term.contains("sixel") || term.contains("mlterm") || term.contains("yaft") {
        return true;
    }

    // xterm only supports sixel when built with it; be conservative and
    // require the -sixel TERM variant handled above.
    false
}

fn determine_terminal_name(term_program: &str, term: &str) -> String {
    if !term_program.is_empty() {
        term_program.to_string()
    } else if !term.is_empty() {
        term.to_string()
    } else {
        "unknown".to_string()
    }
}
