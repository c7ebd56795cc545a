// ABOUTME: Terminal image output encodings and capability detection
// ABOUTME: Declares the closed set of display targets the pipeline can select

use std::fmt;
use std::str::FromStr;

pub mod detection;
pub mod iterm2;
pub mod kitty;
pub mod sixel;

pub use detection::TerminalCapabilities;

/// Where a render call sends its output. Exactly one target is active
/// per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTarget {
    /// Kitty graphics protocol (also WezTerm, Ghostty).
    Kitty,
    /// iTerm2 inline image protocol.
    Iterm2,
    /// Sixel indexed-color raster protocol.
    Sixel,
    /// ANSI 256-color glyph art, understood by any color terminal.
    Ansi,
    /// Direct write to a Linux framebuffer device.
    Framebuffer,
}

impl DisplayTarget {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayTarget::Kitty => "kitty",
            DisplayTarget::Iterm2 => "iterm2",
            DisplayTarget::Sixel => "sixel",
            DisplayTarget::Ansi => "ansi",
            DisplayTarget::Framebuffer => "framebuffer",
        }
    }
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisplayTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kitty" => Ok(DisplayTarget::Kitty),
            "iterm" | "iterm2" => Ok(DisplayTarget::Iterm2),
            "sixel" => Ok(DisplayTarget::Sixel),
            "ansi" => Ok(DisplayTarget::Ansi),
            "fb" | "framebuffer" => Ok(DisplayTarget::Framebuffer),
            other => Err(format!(
                "unknown encoding '{other}'; valid values: kitty, iterm2, sixel, ansi, framebuffer"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!("kitty".parse::<DisplayTarget>(), Ok(DisplayTarget::Kitty));
        assert_eq!("iterm".parse::<DisplayTarget>(), Ok(DisplayTarget::Iterm2));
        assert_eq!("ITerm2".parse::<DisplayTarget>(), Ok(DisplayTarget::Iterm2));
        assert_eq!("sixel".parse::<DisplayTarget>(), Ok(DisplayTarget::Sixel));
        assert_eq!("ansi".parse::<DisplayTarget>(), Ok(DisplayTarget::Ansi));
        assert_eq!(
            "framebuffer".parse::<DisplayTarget>(),
            Ok(DisplayTarget::Framebuffer)
        );
        assert_eq!("fb".parse::<DisplayTarget>(), Ok(DisplayTarget::Framebuffer));
        assert!("svg".parse::<DisplayTarget>().is_err());
    }

    #[test]
    fn test_target_names_round_trip() {
        for target in [
            DisplayTarget::Kitty,
            DisplayTarget::Iterm2,
            DisplayTarget::Sixel,
            DisplayTarget::Ansi,
            DisplayTarget::Framebuffer,
        ] {
            assert_eq!(target.name().parse::<DisplayTarget>(), Ok(target));
        }
    }
}
