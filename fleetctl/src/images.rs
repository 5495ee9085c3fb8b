//! Image upload storage and public URL resolution.
//!
//! Uploads land under `{uploads.dir}/{category}/{uuid}.{ext}`; the stored path returned to
//! clients is the part after `uploads.dir`, e.g. `vehicles/0b6a….png`. Records keep that path and
//! responses turn it into an absolute URL with [`resolve_image_url`].

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::UploadsConfig;
use crate::errors::Error;

/// File extensions accepted for image uploads
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Drivers,
    Vehicles,
    Items,
    General,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Drivers => "drivers",
            ImageCategory::Vehicles => "vehicles",
            ImageCategory::Items => "items",
            ImageCategory::General => "general",
        }
    }
}

impl FromStr for ImageCategory {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drivers" => Ok(ImageCategory::Drivers),
            "vehicles" => Ok(ImageCategory::Vehicles),
            "items" => Ok(ImageCategory::Items),
            "general" | "" => Ok(ImageCategory::General),
            other => Err(ImageError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unknown image category '{0}'")]
    UnknownCategory(String),

    #[error("Unsupported file type; allowed: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType,

    #[error("File is empty")]
    Empty,

    #[error("File exceeds the maximum size of {max} bytes")]
    TooLarge { max: u64 },

    #[error("Invalid file path")]
    InvalidPath,

    #[error("Image {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ImageError> for Error {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::TooLarge { .. } => Error::PayloadTooLarge { message: err.to_string() },
            ImageError::NotFound(name) => Error::NotFound {
                resource: "Image".to_string(),
                id: name,
            },
            ImageError::Io(e) => Error::Other(anyhow::Error::from(e).context("image storage")),
            other => Error::bad_request(other.to_string()),
        }
    }
}

/// Lower-cased extension of `filename` if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Turn a stored image path into a URL clients can fetch.
///
/// Blank paths give `None`; absolute `http(s)` URLs pass through; anything else is joined onto
/// `public_base_url` after dropping leading slashes and a legacy `uploads/` prefix.
pub fn resolve_image_url(path: Option<&str>, public_base_url: &str) -> Option<String> {
    let path = path?.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }

    let relative = path.trim_start_matches('/');
    let relative = relative.strip_prefix("uploads/").unwrap_or(relative);
    let relative = relative.trim_start_matches('/');
    Some(format!("{}/{}", public_base_url.trim_end_matches('/'), relative))
}

/// Reject anything but a single plain file name.
fn safe_file_name(name: &str) -> Result<&str, ImageError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('\\') => Ok(name),
        _ => Err(ImageError::InvalidPath),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path relative to the upload directory, e.g. `drivers/<uuid>.jpg`
    pub path: String,
    pub url: String,
}

/// Reads and writes uploaded images on local disk.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
    max_file_size: u64,
}

impl ImageStore {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_base_url: config.public_base_url.clone(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate and write an upload, returning its stored path and URL.
    #[instrument(skip(self, bytes), fields(size = bytes.len()), err)]
    pub async fn save(&self, category: ImageCategory, original_name: &str, bytes: &[u8]) -> Result<StoredImage, ImageError> {
        let ext = image_extension(original_name).ok_or(ImageError::UnsupportedType)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() as u64 > self.max_file_size {
            return Err(ImageError::TooLarge { max: self.max_file_size });
        }

        let category_dir = self.dir.join(category.as_str());
        tokio::fs::create_dir_all(&category_dir).await?;

        let file_name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(category_dir.join(&file_name), bytes).await?;

        let path = format!("{}/{file_name}", category.as_str());
        debug!(%path, "Stored uploaded image");
        let url = resolve_image_url(Some(&path), &self.public_base_url).unwrap_or_default();
        Ok(StoredImage { path, url })
    }

    /// Read a stored image, refusing anything that could escape the upload directory.
    #[instrument(skip(self), err)]
    pub async fn load(&self, category: &str, filename: &str) -> Result<Vec<u8>, ImageError> {
        let category: ImageCategory = category.parse().map_err(|_| ImageError::InvalidPath)?;
        let filename = safe_file_name(filename)?;

        match tokio::fs::read(self.dir.join(category.as_str()).join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ImageError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, max_file_size: u64) -> ImageStore {
        ImageStore::new(&UploadsConfig {
            dir: dir.to_path_buf(),
            public_base_url: "http://localhost:3001/files/images".to_string(),
            max_file_size,
        })
    }

    #[test]
    fn test_resolve_image_url() {
        let base = "https://fleet.example.com/files/images/";
        assert_eq!(resolve_image_url(None, base), None);
        assert_eq!(resolve_image_url(Some("   "), base), None);
        assert_eq!(
            resolve_image_url(Some("https://cdn.example.com/a.png"), base).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(
            resolve_image_url(Some("drivers/a.png"), base).as_deref(),
            Some("https://fleet.example.com/files/images/drivers/a.png")
        );
        assert_eq!(
            resolve_image_url(Some("/uploads/vehicles/b.jpg"), base).as_deref(),
            Some("https://fleet.example.com/files/images/vehicles/b.jpg")
        );
        assert_eq!(
            resolve_image_url(Some("//items/c.webp"), base).as_deref(),
            Some("https://fleet.example.com/files/images/items/c.webp")
        );
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("truck.PNG").as_deref(), Some("png"));
        assert_eq!(image_extension("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(image_extension("notes.pdf"), None);
        assert_eq!(image_extension("no_extension"), None);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Vehicles".parse::<ImageCategory>().unwrap(), ImageCategory::Vehicles);
        assert_eq!("".parse::<ImageCategory>().unwrap(), ImageCategory::General);
        assert!("../etc".parse::<ImageCategory>().is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);

        let stored = store.save(ImageCategory::Drivers, "me.jpg", b"not really a jpeg").await.unwrap();
        assert!(stored.path.starts_with("drivers/"));
        assert!(stored.path.ends_with(".jpg"));
        assert_eq!(stored.url, format!("http://localhost:3001/files/images/{}", stored.path));

        let filename = stored.path.trim_start_matches("drivers/");
        assert_eq!(store.load("drivers", filename).await.unwrap(), b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 4);

        assert!(matches!(
            store.save(ImageCategory::General, "script.sh", b"ls").await,
            Err(ImageError::UnsupportedType)
        ));
        assert!(matches!(store.save(ImageCategory::General, "a.png", b"").await, Err(ImageError::Empty)));
        assert!(matches!(
            store.save(ImageCategory::General, "a.png", b"12345").await,
            Err(ImageError::TooLarge { max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);

        assert!(matches!(store.load("drivers", "../secret.png").await, Err(ImageError::InvalidPath)));
        assert!(matches!(store.load("drivers", "a/b.png").await, Err(ImageError::InvalidPath)));
        assert!(matches!(store.load("drivers", "..").await, Err(ImageError::InvalidPath)));
        assert!(matches!(store.load("..", "x.png").await, Err(ImageError::InvalidPath)));
        assert!(matches!(store.load("drivers", "missing.png").await, Err(ImageError::NotFound(_))));
    }
}
