//! Image attachments, sent inline as `data:` URIs.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::ClientError;

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads an image file and encodes it as a data URI.
pub async fn load_image(path: &Path) -> Result<String, ClientError> {
    let mime = mime_for(path).ok_or_else(|| {
        ClientError::Image(format!(
            "{} is not a png, jpeg, gif or webp image",
            path.display()
        ))
    })?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Image(format!("cannot read {}: {e}", path.display())))?;
    Ok(to_data_uri(mime, &bytes))
}
