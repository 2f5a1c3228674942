//! The per-client owner identifier, generated once and kept on disk.

use std::{fs, path::Path};

use uuid::Uuid;

use crate::{client::ClientError, owner::OwnerId};

/// The identity a client sends as `userId` with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    owner: OwnerId,
}

impl ClientIdentity {
    /// Read the identifier stored at `path`, or generate a v4 UUID and store
    /// it there if the file is missing or does not hold a UUID.
    ///
    /// # Errors
    /// Returns [ClientError::Io] if the file cannot be read or written.
    pub fn load_or_create(path: &Path) -> Result<Self, ClientError> {
        if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| {
                ClientError::Io(format!("Failed to read client identity file: {}", e))
            })?;

            match Uuid::parse_str(contents.trim()) {
                Ok(id) => return Ok(Self::from_uuid(id)),
                Err(error) => {
                    tracing::warn!("Replacing invalid client identity in {path:?}: {error}");
                }
            }
        }

        let id = Uuid::new_v4();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Io(format!("Failed to create client identity directory: {}", e))
            })?;
        }

        fs::write(path, id.to_string()).map_err(|e| {
            ClientError::Io(format!("Failed to write client identity file: {}", e))
        })?;
        tracing::info!("Created client identity {id} in {path:?}");

        Ok(Self::from_uuid(id))
    }

    fn from_uuid(id: Uuid) -> Self {
        Self {
            owner: OwnerId::new_unchecked(&id.to_string()),
        }
    }

    /// The owner identifier for API requests.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }
}
