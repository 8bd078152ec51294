use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::engine::input::Modifiers;
use crate::model::geometry::RulerAlignment;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub interaction: InteractionConfig,
    pub auto_scroll: AutoScrollConfig,
    pub drag_drop: DragDropConfig,
    pub modifiers: ModifierBindings,
    pub viewport: ViewportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Half-size of the box the pointer must leave before a drag or auto-scroll starts.
    pub drag_threshold: i32,
    pub selection_observe_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    pub base_interval_ms: u64,
    pub neutral_interval_ms: u64,
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDropConfig {
    /// Columns scrolled per tick when the pointer sits in a side edge band.
    pub edge_scroll_columns: i32,
    /// Minimum edge band width; the band is never thinner than half a line or one character.
    pub edge_margin: i32,
    pub scroll_interval_ms: u64,
    pub rectangular_scroll_interval_ms: u64,
}

/// Which modifiers select each alternative gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierBindings {
    pub word: Modifiers,
    pub rectangle: Modifiers,
    pub keep_anchor: Modifiers,
    pub copy: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub gutter_width: u16,
    pub line_numbers: bool,
    pub text_padding: u16,
    pub ruler_alignment: RulerAlignment,
    pub double_click_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 2,
            selection_observe_ms: 100,
        }
    }
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 500,
            neutral_interval_ms: 300,
            min_interval_ms: 16,
        }
    }
}

impl Default for DragDropConfig {
    fn default() -> Self {
        Self {
            edge_scroll_columns: 1,
            edge_margin: 0,
            scroll_interval_ms: 50,
            rectangular_scroll_interval_ms: 100,
        }
    }
}

impl Default for ModifierBindings {
    fn default() -> Self {
        Self {
            word: Modifiers::CONTROL,
            rectangle: Modifiers::ALT,
            keep_anchor: Modifiers::SHIFT,
            copy: Modifiers::CONTROL,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            gutter_width: 1,
            line_numbers: true,
            text_padding: 1,
            ruler_alignment: RulerAlignment::Left,
            double_click_ms: 400,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "caretline=info".into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            auto_scroll: AutoScrollConfig::default(),
            drag_drop: DragDropConfig::default(),
            modifiers: ModifierBindings::default(),
            viewport: ViewportConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// A user file may name only the sections and keys it overrides.
#[derive(Debug, Default, Deserialize)]
struct UserOverrides {
    interaction: Option<toml::Table>,
    auto_scroll: Option<toml::Table>,
    drag_drop: Option<toml::Table>,
    modifiers: Option<toml::Table>,
    viewport: Option<toml::Table>,
    log: Option<toml::Table>,
}

impl EngineConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut config = Self::defaults()?;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "caretline") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                config = config.overlay_file(&config_path)?;
            }
        }

        Ok(config)
    }

    /// Load the embedded defaults overlaid with the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::defaults()?.overlay_file(path)
    }

    fn defaults() -> Result<Self> {
        toml::from_str(DEFAULTS).context("embedded default configuration is invalid")
    }

    fn overlay_file(self, path: &Path) -> Result<Self> {
        let user_str = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        self.overlay(&user_str)
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// Merges the keys present in `user_str` over `self`, key by key.
    fn overlay(self, user_str: &str) -> Result<Self> {
        let user: UserOverrides = toml::from_str(user_str)?;
        let toml::Value::Table(mut merged) = toml::Value::try_from(&self)? else {
            anyhow::bail!("configuration did not serialize to a table");
        };
        for (section, table) in [
            ("interaction", user.interaction),
            ("auto_scroll", user.auto_scroll),
            ("drag_drop", user.drag_drop),
            ("modifiers", user.modifiers),
            ("viewport", user.viewport),
            ("log", user.log),
        ] {
            let Some(table) = table else { continue };
            if let Some(toml::Value::Table(base)) = merged.get_mut(section) {
                base.extend(table);
            }
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    pub fn drag_threshold(&self) -> i32 {
        self.interaction.drag_threshold.max(0)
    }

    pub fn selection_observe_interval(&self) -> Duration {
        Duration::from_millis(self.interaction.selection_observe_ms)
    }

    pub fn drag_scroll_interval(&self, rectangular: bool) -> Duration {
        Duration::from_millis(if rectangular {
            self.drag_drop.rectangular_scroll_interval_ms
        } else {
            self.drag_drop.scroll_interval_ms
        })
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.viewport.double_click_ms)
    }
}
