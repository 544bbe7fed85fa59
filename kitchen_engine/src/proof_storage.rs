//! Storage for proof-of-payment uploads.
//!
//! The order flow treats storage as an external collaborator: it hands over the uploaded file and gets back an opaque
//! reference, or an error. The payment record is only updated once a reference exists.
//!
//! [`LocalProofStorage`] keeps the files in a local directory. File names are derived from the payment id and a hash
//! of the contents, so the customer-supplied name never reaches the file system.
use std::path::{Path, PathBuf};

use log::*;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Error)]
pub enum ProofStorageError {
    #[error("Invalid proof of payment file. {0}")]
    InvalidFile(String),
    #[error("The file is {size} bytes, but uploads are limited to {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Proof of payment {0} was not found")]
    NotFound(String),
    #[error("I/O error. {0}")]
    IoError(String),
}

impl From<std::io::Error> for ProofStorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ProofStorageError::NotFound(e.to_string()),
            _ => ProofStorageError::IoError(e.to_string()),
        }
    }
}

/// A file as received from the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl ProofUpload {
    pub fn new<S: Into<String>>(filename: S, content: Vec<u8>) -> Self {
        Self { filename: filename.into(), content }
    }
}

#[allow(async_fn_in_trait)]
pub trait ProofStorage {
    /// Stores the proof for the given payment and returns a reference to it.
    async fn store_proof(&self, payment_id: i64, upload: ProofUpload) -> Result<String, ProofStorageError>;

    /// Reads back a proof that was previously stored.
    async fn fetch_proof(&self, proof_ref: &str) -> Result<Vec<u8>, ProofStorageError>;

    /// Deletes a stored proof. Removing a proof that does not exist is not an error.
    async fn remove_proof(&self, proof_ref: &str) -> Result<(), ProofStorageError>;
}

#[derive(Debug, Clone)]
pub struct LocalProofStorage {
    root: PathBuf,
    max_bytes: usize,
    unsafe_chars: Regex,
    reference_format: Regex,
}

impl LocalProofStorage {
    pub fn new<P: AsRef<Path>>(root: P, max_bytes: usize) -> Result<Self, ProofStorageError> {
        let unsafe_chars =
            Regex::new(r"[^A-Za-z0-9._-]+").map_err(|e| ProofStorageError::InvalidFile(e.to_string()))?;
        let reference_format = Regex::new(r"^payment_\d+_[0-9a-f]{16}\.(png|jpg|jpeg|gif|webp)$")
            .map_err(|e| ProofStorageError::InvalidFile(e.to_string()))?;
        Ok(Self { root: root.as_ref().to_path_buf(), max_bytes, unsafe_chars, reference_format })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Strips everything but letters, digits, dots, dashes and underscores from a customer-supplied file name.
    pub fn sanitize_filename(&self, name: &str) -> String {
        let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
        self.unsafe_chars.replace_all(base, "_").trim_matches('.').to_string()
    }

    /// Checks the upload and returns the (lower-case) extension it will be stored under.
    pub fn validate(&self, upload: &ProofUpload) -> Result<String, ProofStorageError> {
        if upload.content.is_empty() {
            return Err(ProofStorageError::InvalidFile("The file is empty".into()));
        }
        if upload.content.len() > self.max_bytes {
            return Err(ProofStorageError::TooLarge { size: upload.content.len(), max: self.max_bytes });
        }
        let name = self.sanitize_filename(&upload.filename);
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ProofStorageError::InvalidFile(format!(
                "'{name}' is not an accepted file type. Use one of {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        Ok(extension)
    }

    fn path_for(&self, proof_ref: &str) -> Result<PathBuf, ProofStorageError> {
        if !self.reference_format.is_match(proof_ref) {
            return Err(ProofStorageError::NotFound(proof_ref.to_string()));
        }
        Ok(self.root.join(proof_ref))
    }
}

impl ProofStorage for LocalProofStorage {
    async fn store_proof(&self, payment_id: i64, upload: ProofUpload) -> Result<String, ProofStorageError> {
        let extension = self.validate(&upload)?;
        let digest = Sha256::digest(&upload.content);
        let hash = digest.iter().take(8).map(|b| format!("{b:02x}")).collect::<String>();
        let proof_ref = format!("payment_{payment_id}_{hash}.{extension}");
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&proof_ref);
        tokio::fs::write(&path, &upload.content).await?;
        debug!(
            "🧾️ Stored {} bytes of proof for payment #{payment_id} ({}) as {proof_ref}",
            upload.content.len(),
            self.sanitize_filename(&upload.filename)
        );
        Ok(proof_ref)
    }

    async fn fetch_proof(&self, proof_ref: &str) -> Result<Vec<u8>, ProofStorageError> {
        let path = self.path_for(proof_ref)?;
        let content = tokio::fs::read(path).await?;
        Ok(content)
    }

    async fn remove_proof(&self, proof_ref: &str) -> Result<(), ProofStorageError> {
        let path = self.path_for(proof_ref)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("🧾️ Removed proof {proof_ref}");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The MIME type to serve a stored proof with.
pub fn content_type_for(proof_ref: &str) -> &'static str {
    match proof_ref.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
