use crate::controller::SegmentationParams;
use crate::types::SegmentationMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct SegmentDemoConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(default = "default_mode")]
    pub mode: SegmentationMode,
    #[serde(default)]
    pub params: SegmentationParams,
    /// Log every controller event through the `log` facade.
    #[serde(default)]
    pub verbose_events: bool,
    pub output: SegmentDemoOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct SegmentDemoOutputConfig {
    /// Rendered label image; `{mode}` is replaced by the pass name.
    #[serde(rename = "label_image")]
    pub label_image: PathBuf,
    #[serde(rename = "result_json")]
    pub result_json: PathBuf,
}

impl SegmentDemoOutputConfig {
    /// Label image path for one pass.
    pub fn label_image_for(&self, mode: SegmentationMode) -> PathBuf {
        let raw = self.label_image.to_string_lossy();
        if raw.contains("{mode}") {
            PathBuf::from(raw.replace("{mode}", &mode.to_string()))
        } else {
            self.label_image.clone()
        }
    }
}

fn default_mode() -> SegmentationMode {
    SegmentationMode::Quick
}

pub fn load_config(path: &Path) -> Result<SegmentDemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: SegmentDemoConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .params
        .validate()
        .map_err(|e| format!("Invalid parameters in {}: {e}", path.display()))?;
    Ok(config)
}
