use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::app::NoticeKind;

/// Follows the system's dark/light preference where it can be read.
pub fn resolve_theme() -> Theme {
    let palette = if detect_system_dark_mode() {
        dark_palette()
    } else {
        light_palette()
    };
    Theme::custom("FaceFinder", palette)
}

pub fn notice_color(theme: &Theme, kind: NoticeKind) -> Color {
    let palette = theme.palette();
    match kind {
        NoticeKind::Info => palette.success,
        NoticeKind::Warning => palette.warning,
        NoticeKind::Error => palette.danger,
    }
}

/// Secondary text, e.g. hints and captions.
pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.6,
        ..theme.palette().text
    }
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1c, 0x1c, 0x1e),
        text: color!(0xcc, 0xcc, 0xcc),
        primary: color!(0x5e, 0x9f, 0xf5),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf5, 0xf5, 0xf7),
        text: color!(0x1d, 0x1d, 0x1f),
        primary: color!(0x34, 0x78, 0xf6),
        success: color!(0x24, 0x8a, 0x3d),
        warning: color!(0xb2, 0x5c, 0x00),
        danger: color!(0xff, 0x3b, 0x30),
    }
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(true)
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
