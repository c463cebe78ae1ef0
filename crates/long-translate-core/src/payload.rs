//! Turning a picked file into the string the translation service accepts.
//!
//! Plain text travels verbatim. PDF and DOCX travel as base64 data URLs
//! (`data:application/<ext>;base64,...`) which the service unpacks and
//! extracts text from on its side.

use base64::{Engine as _, engine::general_purpose};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::util::lowercase_extension;

/// Declared type of a source file, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
    Docx,
    /// Lowercased extension, empty when the name has none
    Unknown(String),
}

impl FileKind {
    pub fn from_name(name: impl AsRef<Path>) -> Self {
        match lowercase_extension(name).as_str() {
            "txt" => Self::Text,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Unknown(ext) => ext,
        }
    }
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

/// A file the user picked for translation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    origin: Origin,
    kind: FileKind,
}

impl SourceFile {
    /// A file on disk. Nothing is read until encoding.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::from_name(&path);
        Self {
            origin: Origin::Path(path),
            kind,
        }
    }

    /// File content the host already holds in memory, e.g. an upload.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = FileKind::from_name(&name);
        Self {
            origin: Origin::Memory { name, bytes },
            kind,
        }
    }

    pub const fn kind(&self) -> &FileKind {
        &self.kind
    }

    /// Display name: the file name component for disk files.
    pub fn name(&self) -> Cow<'_, str> {
        match &self.origin {
            Origin::Path(path) => path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy()),
            Origin::Memory { name, .. } => Cow::Borrowed(name),
        }
    }

    fn location(&self) -> PathBuf {
        match &self.origin {
            Origin::Path(path) => path.clone(),
            Origin::Memory { name, .. } => PathBuf::from(name),
        }
    }

    fn read_error(&self, cause: std::io::Error) -> Error {
        Error::ReadError {
            path: self.location(),
            cause,
        }
    }

    async fn read_text(&self) -> Result<String> {
        match &self.origin {
            Origin::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| self.read_error(e)),
            Origin::Memory { bytes, .. } => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| self.read_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))),
        }
    }

    async fn read_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.origin {
            Origin::Path(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(|e| self.read_error(e)),
            Origin::Memory { bytes, .. } => Ok(Cow::Borrowed(bytes)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    DataUrl,
}

/// Transport-ready file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub kind: PayloadKind,
    pub content: String,
}

impl EncodedPayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Text,
            content: content.into(),
        }
    }

    /// Wrap raw bytes as `data:application/<extension>;base64,<data>`.
    pub fn data_url(extension: &str, bytes: &[u8]) -> Self {
        let data = general_purpose::STANDARD.encode(bytes);
        Self {
            kind: PayloadKind::DataUrl,
            content: format!("data:application/{extension};base64,{data}"),
        }
    }

    /// MD5 of the content, for correlating log lines.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", md5::compute(self.content.as_bytes()))
    }
}

/// Encode a source file according to its type.
///
/// Unsupported extensions are rejected before the file is touched.
pub async fn encode(file: &SourceFile) -> Result<EncodedPayload> {
    let payload = match file.kind() {
        FileKind::Text => EncodedPayload::text(file.read_text().await?),
        kind @ (FileKind::Pdf | FileKind::Docx) => {
            let bytes = file.read_bytes().await?;
            EncodedPayload::data_url(kind.extension(), &bytes)
        }
        FileKind::Unknown(ext) => {
            return Err(Error::UnsupportedFileType {
                extension: ext.clone(),
            });
        }
    };

    debug!(
        "Encoded {} as {:?} ({} chars, md5 {})",
        file.name(),
        payload.kind,
        payload.content.len(),
        payload.fingerprint()
    );

    Ok(payload)
}
