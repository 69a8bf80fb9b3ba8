use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::{Bitmap, MAX_CANVAS_DIM, WHITE};

const DATA_URL_PREFIX: &str = "data:";
const PNG_DATA_URL_HEADER: &str = "data:image/png;base64,";

// ============================================================================
// ERRORS
// ============================================================================

/// Malformed or unsupported template input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    /// A `data:` URL without a `;base64,` payload.
    InvalidDataUrl(String),
    /// Bad character or length in a base64 payload.
    Base64(String),
    /// The image decoder rejected the bytes.
    Image(String),
    /// Zero-sized, or larger than [`MAX_CANVAS_DIM`] on an axis.
    Dimensions { width: u32, height: u32 },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "Empty input"),
            DecodeError::InvalidDataUrl(e) => write!(f, "Invalid data URL: {}", e),
            DecodeError::Base64(e) => write!(f, "Base64 error: {}", e),
            DecodeError::Image(e) => write!(f, "Image decode error: {}", e),
            DecodeError::Dimensions { width, height } => {
                write!(f, "Unsupported dimensions {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<ImageError> for DecodeError {
    fn from(e: ImageError) -> Self {
        DecodeError::Image(e.to_string())
    }
}

/// Encoder failure. Unreachable for well-formed bitmaps, handled anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    Image(String),
    BufferSize { expected: usize, actual: usize },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Image(e) => write!(f, "Image encode error: {}", e),
            EncodeError::BufferSize { expected, actual } => {
                write!(f, "Pixel buffer is {} bytes, expected {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<ImageError> for EncodeError {
    fn from(e: ImageError) -> Self {
        EncodeError::Image(e.to_string())
    }
}

// ============================================================================
// BITMAP CODEC
// ============================================================================

/// Decode raw image bytes (PNG, JPEG, BMP, WEBP) or a base64 `data:` URL.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    let trimmed = bytes.trim_ascii();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    let raw;
    let payload = if trimmed.starts_with(DATA_URL_PREFIX.as_bytes()) {
        raw = decode_data_url(trimmed)?;
        raw.as_slice()
    } else {
        trimmed
    };

    let img = image::load_from_memory(payload)?.to_rgba8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(DecodeError::Dimensions { width, height });
    }
    Ok(Bitmap::from_rgba_image(img))
}

/// Encode a bitmap as an RGBA8 PNG.
pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>, EncodeError> {
    let expected = bitmap.pixel_count() * 4;
    if bitmap.as_raw().len() != expected {
        return Err(EncodeError::BufferSize {
            expected,
            actual: bitmap.as_raw().len(),
        });
    }

    let mut out = Vec::with_capacity(expected / 4 + 64);
    PngEncoder::new(&mut out).write_image(
        bitmap.as_raw(),
        bitmap.width(),
        bitmap.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out)
}

/// Wrap encoded PNG bytes as a self-describing `data:image/png;base64,` URL.
pub fn to_data_url(png: &[u8]) -> String {
    let mut url = String::with_capacity(PNG_DATA_URL_HEADER.len() + png.len().div_ceil(3) * 4);
    url.push_str(PNG_DATA_URL_HEADER);
    STANDARD.encode_string(png, &mut url);
    url
}

/// Payload bytes of a base64 `data:` URL. Whitespace inside the payload
/// (line-wrapped URLs) is ignored.
pub fn decode_data_url(url: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let text = std::str::from_utf8(url)
        .map_err(|_| DecodeError::InvalidDataUrl("not valid UTF-8".into()))?;
    let (header, payload) = text
        .split_once(',')
        .ok_or_else(|| DecodeError::InvalidDataUrl("missing ','".into()))?;
    if !header.ends_with(";base64") {
        return Err(DecodeError::InvalidDataUrl(format!(
            "unsupported encoding in '{}'",
            header
        )));
    }
    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(&compact)
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

/// Placeholder shown when the live image cannot be encoded: a 1×1 white PNG.
pub fn placeholder_image() -> Vec<u8> {
    encode_png(&Bitmap::new_filled(1, 1, WHITE)).unwrap_or_else(|_| {
        STANDARD.decode(PLACEHOLDER_PNG_B64).unwrap_or_default()
    })
}

/// Last-resort 1×1 PNG used if even the placeholder bitmap fails to encode.
const PLACEHOLDER_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

// ============================================================================
// IFP PROJECT FILE FORMAT
// ============================================================================

/// Magic header for the project format
const IFP_MAGIC_V1: &str = "IFP1";

/// Serializable coloring project: the untouched template plus the edited image.
#[derive(Serialize, Deserialize)]
pub struct ProjectFileV1 {
    magic: String,
    width: u32,
    height: u32,
    template: Vec<u8>,
    current: Vec<u8>,
}

/// Error type for project file operations
#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Serialize(e) => write!(f, "Serialization error: {}", e),
            ProjectError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for ProjectError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectError::Serialize(e.to_string())
    }
}

impl ProjectFileV1 {
    /// Build the serializable project from a template and its edited copy.
    pub fn new(template: &Bitmap, current: &Bitmap) -> Result<Self, ProjectError> {
        if !template.same_size(current) {
            return Err(ProjectError::InvalidFormat(
                "template and image sizes differ".into(),
            ));
        }
        Ok(Self {
            magic: IFP_MAGIC_V1.to_string(),
            width: current.width(),
            height: current.height(),
            template: template.as_raw().to_vec(),
            current: current.as_raw().to_vec(),
        })
    }

    /// Split back into `(template, current)`, validating every size.
    pub fn into_bitmaps(self) -> Result<(Bitmap, Bitmap), ProjectError> {
        if self.magic != IFP_MAGIC_V1 {
            return Err(ProjectError::InvalidFormat(format!(
                "Unknown magic '{}'",
                self.magic
            )));
        }
        if self.width == 0
            || self.height == 0
            || self.width > MAX_CANVAS_DIM
            || self.height > MAX_CANVAS_DIM
        {
            return Err(ProjectError::InvalidFormat(format!(
                "Canvas dimensions {}x{} out of range",
                self.width, self.height
            )));
        }
        let template = Bitmap::from_raw(self.width, self.height, self.template)
            .ok_or_else(|| ProjectError::InvalidFormat("template buffer size mismatch".into()))?;
        let current = Bitmap::from_raw(self.width, self.height, self.current)
            .ok_or_else(|| ProjectError::InvalidFormat("image buffer size mismatch".into()))?;
        Ok((template, current))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProjectError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, ProjectError> {
        // bincode encodes a String as: 8-byte length prefix + UTF-8 data.
        // The magic string is 4 chars, so bytes 8..12 hold it.
        if raw.len() < 12 {
            return Err(ProjectError::InvalidFormat("File too small".into()));
        }
        let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
        if magic != IFP_MAGIC_V1 {
            return Err(ProjectError::InvalidFormat(format!(
                "Unknown magic '{}'",
                magic
            )));
        }
        Ok(bincode::deserialize(raw)?)
    }
}

/// Serialize + write a project to disk.
pub fn write_project(project: &ProjectFileV1, path: &Path) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, project)?;
    Ok(())
}

/// Read a project from disk.
pub fn read_project(path: &Path) -> Result<ProjectFileV1, ProjectError> {
    let raw = std::fs::read(path)?;
    ProjectFileV1::from_bytes(&raw)
}
