//! Export configuration.

use std::path::PathBuf;

use glam::IVec2;

/// Offset added to authored positions so that (0,0) in the editor lands
/// inside the target's sprite plane.
pub const DEFAULT_SPRITE_BORDER: IVec2 = IVec2::new(128, 128);

/// Bytes reserved for an entity's debug name, terminator included.
pub const DEFAULT_DEBUG_NAME_LEN: usize = 16;

/// Settings shared by every exporter in one export pass.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory output files are written to.
    pub out_dir: PathBuf,
    pub sprite_border: IVec2,
    pub debug_name_len: usize,
    /// Emit the `IFND FINAL` debug-name block in front of spawn records.
    pub debug_names: bool,
}

impl ExportConfig {
    /// Create a config writing into `out_dir` with the default layout.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            sprite_border: DEFAULT_SPRITE_BORDER,
            debug_name_len: DEFAULT_DEBUG_NAME_LEN,
            debug_names: true,
        }
    }

    #[must_use]
    pub fn with_sprite_border(mut self, border: IVec2) -> Self {
        self.sprite_border = border;
        self
    }

    #[must_use]
    pub fn with_debug_name_len(mut self, len: usize) -> Self {
        self.debug_name_len = len;
        self
    }

    /// Drop the debug-name blocks from every record.
    #[must_use]
    pub fn without_debug_names(mut self) -> Self {
        self.debug_names = false;
        self
    }

    /// Path of `file_name` inside the output directory.
    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::new("out");
        assert_eq!(config.sprite_border, IVec2::new(128, 128));
        assert_eq!(config.debug_name_len, 16);
        assert!(config.debug_names);
        assert_eq!(config.output_path("scene.asm"), PathBuf::from("out/scene.asm"));
    }

    #[test]
    fn test_builder() {
        let config = ExportConfig::new("out")
            .with_sprite_border(IVec2::ZERO)
            .with_debug_name_len(8)
            .without_debug_names();
        assert_eq!(config.sprite_border, IVec2::ZERO);
        assert_eq!(config.debug_name_len, 8);
        assert!(!config.debug_names);
    }
}
