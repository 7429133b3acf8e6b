use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::PathBuf,
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{errors::AuthError, warning};

/// A credential persisted as pretty-printed JSON in a single file.
///
/// A file that is missing, unreadable or does not deserialize into `T` is
/// treated as absent.
pub struct TokenCache<T> {
    path: PathBuf,
    _credential: PhantomData<T>,
}

impl<T> TokenCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenCache {
            path: path.into(),
            _credential: PhantomData,
        }
    }

    pub async fn load(&self) -> Option<T> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warning!(
                    "Cannot read credential file {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warning!(
                    "Ignoring unreadable credential file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Writes the credential, overwriting any previous file.
    pub async fn persist(&self, credential: &T) -> Result<(), AuthError> {
        let persist_err = |reason: String| AuthError::Persist {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| persist_err(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(credential).map_err(|e| persist_err(e.to_string()))?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| persist_err(e.to_string()))
    }
}
