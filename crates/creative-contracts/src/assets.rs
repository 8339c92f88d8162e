use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::catalog::{null_as_default, read_yaml};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif", "svg", "bmp"];
const IGNORED_FILES: &[&str] = &[".gitkeep", ".ds_store"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Product,
    Logo,
}

impl ImageKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            ImageKind::Product => "product",
            ImageKind::Logo => "logo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub slug: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductFile {
    #[serde(deserialize_with = "null_as_default")]
    product: ProductSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductSection {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    description: String,
}

/// Read-only view over `products/<slug>/...`.
///
/// Absence is a normal state here: an unknown slug or a product whose photo
/// folders do not exist yet simply has no images.
#[derive(Debug, Clone)]
pub struct AssetLocator {
    products_dir: PathBuf,
}

impl AssetLocator {
    pub fn new(products_dir: impl Into<PathBuf>) -> Self {
        Self {
            products_dir: products_dir.into(),
        }
    }

    pub fn products_dir(&self) -> &Path {
        &self.products_dir
    }

    pub fn list_products(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.products_dir) else {
            return Vec::new();
        };
        let mut slugs = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect::<Vec<String>>();
        slugs.sort();
        slugs
    }

    pub fn list_images(&self, slug: &str, kind: ImageKind) -> Vec<PathBuf> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Vec::new();
        }
        let image_dir = self
            .products_dir
            .join(slug)
            .join("photos")
            .join(kind.dir_name());
        let Ok(entries) = std::fs::read_dir(&image_dir) else {
            return Vec::new();
        };
        let mut images = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| is_listed_image(path))
            .collect::<Vec<PathBuf>>();
        images.sort();
        images
    }

    /// Photos and logos of every slug, concatenated in slug order.
    pub fn load_products(&self, slugs: &[String]) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut photos = Vec::new();
        let mut logos = Vec::new();
        for slug in slugs {
            photos.extend(self.list_images(slug, ImageKind::Product));
            logos.extend(self.list_images(slug, ImageKind::Logo));
        }
        (photos, logos)
    }

    /// Product metadata from `config.yaml`; `None` when the product has no config.
    pub fn load_product(&self, slug: &str) -> Result<Option<Product>> {
        let path = self.products_dir.join(slug).join("config.yaml");
        let Some(file) = read_yaml::<ProductFile>(&path)? else {
            return Ok(None);
        };
        let name = if file.product.name.trim().is_empty() {
            slug.to_string()
        } else {
            file.product.name
        };
        Ok(Some(Product {
            slug: slug.to_string(),
            name,
            description: file.product.description,
        }))
    }
}

fn is_listed_image(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let lowered = file_name.to_ascii_lowercase();
    if file_name.starts_with('.') || IGNORED_FILES.contains(&lowered.as_str()) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn seed_product(root: &Path, slug: &str, files: &[&str]) -> anyhow::Result<PathBuf> {
        let dir = root.join(slug).join("photos").join("product");
        fs::create_dir_all(&dir)?;
        for file in files {
            fs::write(dir.join(file), b"x")?;
        }
        Ok(dir)
    }

    #[test]
    fn missing_products_dir_lists_nothing() {
        let locator = AssetLocator::new("/definitely/not/here");
        assert!(locator.list_products().is_empty());
        assert!(locator.list_images("acme", ImageKind::Product).is_empty());
    }

    #[test]
    fn list_products_skips_hidden_and_files() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("zeta"))?;
        fs::create_dir_all(temp.path().join("acme-soap"))?;
        fs::create_dir_all(temp.path().join(".cache"))?;
        fs::write(temp.path().join("README.md"), b"x")?;

        let locator = AssetLocator::new(temp.path());
        assert_eq!(locator.list_products(), vec!["acme-soap", "zeta"]);
        Ok(())
    }

    #[test]
    fn list_images_filters_extensions_and_placeholders() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = seed_product(
            temp.path(),
            "acme-soap",
            &["b.PNG", "a.jpg", "notes.txt", ".gitkeep", ".DS_Store", "c.webp"],
        )?;
        fs::create_dir_all(dir.join("nested.png"))?;

        let locator = AssetLocator::new(temp.path());
        let images = locator.list_images("acme-soap", ImageKind::Product);
        let names: Vec<String> = images
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.webp"]);
        for image in &images {
            assert!(image.is_file());
            let ext = image
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();
            assert!(IMAGE_EXTENSIONS.contains(&ext.as_str()));
        }
        assert!(locator.list_images("acme-soap", ImageKind::Logo).is_empty());
        assert!(locator.list_images("", ImageKind::Product).is_empty());
        Ok(())
    }

    #[test]
    fn list_images_skips_hidden_files() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let logo_dir = temp.path().join("acme").join("photos").join("logo");
        fs::create_dir_all(&logo_dir)?;
        for name in ["logo.png", "._logo.png", ".hidden.jpg"] {
            fs::write(logo_dir.join(name), b"x")?;
        }

        let locator = AssetLocator::new(temp.path());
        let logos = locator.list_images("acme", ImageKind::Logo);
        assert_eq!(logos, vec![logo_dir.join("logo.png")]);
        let (_, loaded_logos) = locator.load_products(&["acme".to_string()]);
        assert_eq!(loaded_logos.first(), Some(&logo_dir.join("logo.png")));
        Ok(())
    }

    #[test]
    fn load_products_concatenates_in_slug_order() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        seed_product(temp.path(), "one", &["1.png"])?;
        seed_product(temp.path(), "two", &["2.png", "3.png"])?;
        let logo_dir = temp.path().join("two").join("photos").join("logo");
        fs::create_dir_all(&logo_dir)?;
        fs::write(logo_dir.join("logo.svg"), b"<svg/>")?;

        let locator = AssetLocator::new(temp.path());
        let (photos, logos) = locator.load_products(&["two".to_string(), "one".to_string()]);
        assert_eq!(photos.len(), 3);
        assert!(photos[0].ends_with("two/photos/product/2.png"));
        assert!(photos[2].ends_with("one/photos/product/1.png"));
        assert_eq!(logos.len(), 1);
        Ok(())
    }

    #[test]
    fn load_product_reads_config_with_defaults() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().join("acme-soap");
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("config.yaml"),
            "product:\n  name: Acme Soap\n  description: Plant-based bar soap\n",
        )?;
        fs::create_dir_all(temp.path().join("bare"))?;
        fs::write(temp.path().join("bare").join("config.yaml"), "product: {}\n")?;

        let locator = AssetLocator::new(temp.path());
        let product = locator.load_product("acme-soap")?;
        assert_eq!(
            product.map(|product| (product.name, product.description)),
            Some(("Acme Soap".to_string(), "Plant-based bar soap".to_string()))
        );
        let bare = locator.load_product("bare")?;
        assert_eq!(bare.map(|product| product.name), Some("bare".to_string()));
        assert_eq!(locator.load_product("missing")?, None);
        Ok(())
    }
}
