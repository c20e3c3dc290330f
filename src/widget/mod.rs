//! Widget presentation.
//!
//! This module renders stats snapshots as an embeddable HTML widget and
//! generates the script-tag loader that injects it into third-party pages.

pub mod render;

pub use render::{generate_embed_script, generate_widget_html, WidgetOptions};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colour scheme of the widget.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background (default)
    #[default]
    Light,
    /// Dark background
    Dark,
}

/// Colours used by a theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#ffffff",
                surface: "#f6f8fa",
                border: "#d0d7de",
                text: "#1f2328",
                muted: "#656d76",
                accent: "#2775ca",
            },
            Theme::Dark => Palette {
                background: "#0d1117",
                surface: "#161b22",
                border: "#30363d",
                text: "#e6edf3",
                muted: "#8d96a0",
                accent: "#58a6ff",
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}
