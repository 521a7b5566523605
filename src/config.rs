use crate::image_loader::Slot;
use crate::layout::ReferenceMode;
use anyhow::{anyhow, Context as _, Result};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

pub struct AppConfig {
    pub window_width: f32,
    pub window_height: f32,
    pub reference_mode: ReferenceMode,
    pub reveal_delay: Duration,
    pub light: Option<PathBuf>,
    pub dark: Option<PathBuf>,
    pub background: Option<PathBuf>,
}

impl AppConfig {
    /// Images given on the command line, in slot order.
    pub fn preloads(&self) -> Vec<(Slot, PathBuf)> {
        [
            (Slot::Light, &self.light),
            (Slot::Dark, &self.dark),
            (Slot::Background, &self.background),
        ]
        .into_iter()
        .filter_map(|(slot, path)| path.clone().map(|path| (slot, path)))
        .collect()
    }
}

pub fn parse_window_size(size: &str) -> Result<(f32, f32)> {
    let pattern = Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*[xX]\s*(\d+(?:\.\d+)?)\s*$")?;
    let captures = pattern
        .captures(size)
        .ok_or_else(|| anyhow!("Invalid window size '{}'. Use WIDTHxHEIGHT", size))?;
    let width = captures[1]
        .parse::<f32>()
        .with_context(|| format!("Invalid width in '{}'", size))?;
    let height = captures[2]
        .parse::<f32>()
        .with_context(|| format!("Invalid height in '{}'", size))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(anyhow!("Window size '{}' must be positive", size));
    }
    Ok((width, height))
}

pub fn parse_reference_mode(value: &str) -> Result<ReferenceMode> {
    match value.to_ascii_lowercase().as_str() {
        "viewport" | "window" => Ok(ReferenceMode::Viewport),
        "container" | "frame" => Ok(ReferenceMode::Container),
        other => Err(anyhow!(
            "Unknown reference mode '{}'. Use viewport or container",
            other
        )),
    }
}
