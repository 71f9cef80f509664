#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetLogConfig {
    pub enabled: bool,

    /// Directory the log file is written to.
    pub dir: PathBuf,

    pub file: String,
}

impl Default for NetLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("netlog"),
            file: "gridload-netlog.log".into(),
        }
    }
}

impl NetLogConfig {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}
