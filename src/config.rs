// src/config.rs
//! Names the rewriter injects into shader source, and where the host binds
//! the print buffer.

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Bind group slot of the print buffer block.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSlot {
    pub group: u32,
    pub binding: u32,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintfConfig {
    /// Call name rewritten into buffer writes.
    pub function_name: String,
    /// Storage block name the host binds by.
    pub block_name: String,
    /// Runtime-sized `uint[]` member of the block.
    pub buffer_identifier: String,
    /// Local holding the record's write cursor.
    pub cursor_identifier: String,
    pub enable_flag_name: String,
    pub enable_fn_name: String,
    pub disable_fn_name: String,
    /// Initial value of the enable flag.
    pub enabled_by_default: bool,
    /// When set, the block is declared with an explicit
    /// `layout(std430, set = G, binding = B)` qualifier; otherwise only
    /// `layout(std430)` and the shader compiler assigns the slot.
    pub binding: Option<BindingSlot>,
}

impl Default for PrintfConfig {
    fn default() -> Self {
        Self {
            function_name: "printf".into(),
            block_name: "printBuffer".into(),
            buffer_identifier: "printData".into(),
            cursor_identifier: "_printfCursor".into(),
            enable_flag_name: "printfWriter".into(),
            enable_fn_name: "enablePrintf".into(),
            disable_fn_name: "disablePrintf".into(),
            enabled_by_default: false,
            binding: None,
        }
    }
}

impl PrintfConfig {
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).context("failed to parse printf config JSON")
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading printf config from {}", path.display());
        let data =
            fs::read(path).with_context(|| format!("read printf config {}", path.display()))?;
        Self::from_json_bytes(&data)
            .with_context(|| format!("in printf config {}", path.display()))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = fs::File::create(path)
            .with_context(|| format!("create printf config {}", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    /// Defaults, then `SHADERPRINTF_CONFIG` (a JSON file), then
    /// `SHADERPRINTF_FUNCTION` for the call name.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var("SHADERPRINTF_CONFIG") {
            Ok(path) if !path.is_empty() => Self::load_json(path)?,
            _ => Self::default(),
        };
        if let Ok(name) = std::env::var("SHADERPRINTF_FUNCTION") {
            if !name.is_empty() {
                cfg.function_name = name;
            }
        }
        Ok(cfg)
    }

    /// GLSL layout qualifier for the block, including a trailing space, or "".
    pub fn layout_qualifier(&self) -> String {
        match self.binding {
            Some(BindingSlot { group, binding }) => {
                format!("layout(std430, set = {group}, binding = {binding}) ")
            }
            None => "layout(std430) ".to_string(),
        }
    }
}
