use std::path::{Path, PathBuf};

/// Directory conventions shared by every operation.
///
/// Everything hangs off a single root:
/// - `products/<slug>/config.yaml` and `products/<slug>/photos/{product,logo}/`
/// - `config/regions.yaml`, `config/audiences.yaml`
/// - `outputs/<campaign_id>/...` for generated assets and manifests
/// - `.env` for the persisted API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn products_dir(&self) -> PathBuf {
        self.root.join("products")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    pub fn campaign_dir(&self, campaign_id: &str) -> PathBuf {
        self.outputs_dir().join(campaign_id)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.outputs_dir().join("campaigns")
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
