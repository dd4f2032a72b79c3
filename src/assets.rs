use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

pub fn provider_supports_image_mime(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/png" | "image/jpeg" | "image/webp" | "image/heic" | "image/heif"
    )
}

/// Declared type first, sniffed bytes second, PNG as the last resort.
fn resolve_image_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    let mut candidates = Vec::new();
    if let Some(declared) = declared.filter(|value| !value.trim().is_empty()) {
        candidates.push(declared.to_string());
    }
    if let Some(detected) = detect_mime_type(bytes) {
        candidates.push(detected);
    }

    for candidate in candidates {
        let normalized = normalize_image_mime_type(&candidate);
        if provider_supports_image_mime(&normalized) {
            return normalized;
        }
    }

    "image/png".to_string()
}

/// Releases a preview handle created by the UI layer.
pub trait PreviewRevoker: Send + Sync {
    fn revoke(&self, handle: &str);
}

/// A UI preview (for example an object URL). Revoked when the last owner drops it.
pub struct PreviewHandle {
    handle: String,
    revoker: Arc<dyn PreviewRevoker>,
}

impl PreviewHandle {
    pub fn new(handle: impl Into<String>, revoker: Arc<dyn PreviewRevoker>) -> Self {
        PreviewHandle {
            handle: handle.into(),
            revoker,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.handle
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        debug!(handle = %self.handle, "Releasing image preview");
        self.revoker.revoke(&self.handle);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.handle).finish()
    }
}

/// An uploaded image. Cheap to clone; snapshots share the bytes and the preview.
#[derive(Clone)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    mime_type: String,
    display_name: Option<String>,
    preview: Option<Arc<PreviewHandle>>,
}

impl ImageAsset {
    pub fn new(bytes: Vec<u8>, declared_mime: Option<&str>) -> Self {
        let mime_type = resolve_image_mime(declared_mime, &bytes);
        ImageAsset {
            bytes: Arc::from(bytes),
            mime_type,
            display_name: None,
            preview: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_preview(mut self, preview: PreviewHandle) -> Self {
        self.preview = Some(Arc::new(preview));
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref().map(PreviewHandle::as_str)
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn same_bytes(&self, other: &ImageAsset) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("display_name", &self.display_name)
            .field("preview", &self.preview())
            .finish()
    }
}

/// An image returned by the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
