use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::error::{PreloadError, PreloadResult};

/// Manifest document name used when none is configured.
pub const DEFAULT_MANIFEST_NAME: &str = "MV_Project";

/// Preloader options.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreloadOpts {
    /// Manifest document name, resolved as `<data_dir>/<name>.json`.
    #[serde(alias = "MaterialListData")]
    pub manifest_resource_name: String,
    /// Ticks to wait after each settled fetch. `0` loads everything as fast as completions
    /// allow.
    #[serde(alias = "LoadInterval")]
    pub load_interval_ticks: u32,
    /// Wait for the completion listener of a pending fetch. When `false`, a pending fetch only
    /// waits the configured interval.
    pub await_decode: bool,
    /// Log every dispatch (host debug/test flag).
    pub log_dispatches: bool,
}

impl Default for PreloadOpts {
    fn default() -> Self {
        Self {
            manifest_resource_name: DEFAULT_MANIFEST_NAME.to_string(),
            load_interval_ticks: 0,
            await_decode: true,
            log_dispatches: false,
        }
    }
}

impl PreloadOpts {
    /// Parse options from a JSON reader. Missing fields keep their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> PreloadResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PreloadError::config(format!("parse preload options JSON: {e}")))
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PreloadResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PreloadError::config(format!("open preload options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Build options from string plugin parameters.
    ///
    /// Blank values fall back to defaults. The interval is read as a leading integer; anything
    /// unparsable becomes `0` and negative values clamp to `0`.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut opts = Self::default();
        if let Some(name) = params.get("MaterialListData").map(|s| s.trim())
            && !name.is_empty()
        {
            opts.manifest_resource_name = name.to_string();
        }
        if let Some(raw) = params.get("LoadInterval") {
            opts.load_interval_ticks = parse_leading_int(raw);
        }
        if let Some(raw) = params.get("AwaitDecode") {
            opts.await_decode = !matches!(raw.trim(), "false" | "off" | "0");
        }
        if let Some(raw) = params.get("LogDispatches") {
            opts.log_dispatches = matches!(raw.trim(), "true" | "on" | "1");
        }
        opts
    }

    /// Reject option combinations the preloader cannot honor.
    pub fn validate(&self) -> PreloadResult<()> {
        let name = self.manifest_resource_name.as_str();
        if name.trim().is_empty() {
            return Err(PreloadError::config("manifest_resource_name must be non-empty"));
        }
        if name.contains(['/', '\\']) || name == ".." {
            return Err(PreloadError::config(
                "manifest_resource_name must be a bare document name",
            ));
        }
        Ok(())
    }

    /// Manifest path inside `data_dir`.
    pub fn manifest_path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir
            .as_ref()
            .join(format!("{}.json", self.manifest_resource_name))
    }
}

fn parse_leading_int(raw: &str) -> u32 {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
