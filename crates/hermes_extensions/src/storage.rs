use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use crate::error::ExtensionError;

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, ExtensionError> {
    let read_error = |source| ExtensionError::Read {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(read_error)?;
    Ok(buffer)
}

pub(crate) fn write_bytes(bytes: &[u8], path: &Path) -> Result<(), ExtensionError> {
    let write_error = |source| ExtensionError::Write {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(bytes).map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    Ok(())
}

pub(crate) fn binary_file_path(directory: &Path, filename: &str) -> PathBuf {
    directory.join(format!("{filename}.bin"))
}

/// Serializes any archivable store next to the others in `directory`.
macro_rules! impl_file_storage {
    ($type:ty, $file_name:expr) => {
        impl $type {
            pub const FILE_NAME: &'static str = $file_name;

            pub fn save_to_file(
                &self,
                directory: &std::path::Path,
            ) -> Result<(), crate::error::ExtensionError> {
                let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
                    .map_err(|_| crate::error::ExtensionError::Serialize($file_name.to_string()))?;
                let path = crate::storage::binary_file_path(directory, $file_name);
                crate::storage::write_bytes(&bytes[..], &path)?;
                tracing::debug!("Saved {} to {}", $file_name, path.display());
                Ok(())
            }

            pub fn from_file(
                directory: &std::path::Path,
            ) -> Result<Self, crate::error::ExtensionError> {
                let path = crate::storage::binary_file_path(directory, $file_name);
                let bytes = crate::storage::read_bytes(&path)?;
                tracing::debug!("Read from path {}, size {}", path.display(), bytes.len());
                let data = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes[..])
                    .map_err(|_| crate::error::ExtensionError::Deserialize($file_name.to_string()))?;
                tracing::info!("Deserialized {} from buffer", $file_name);
                Ok(data)
            }
        }
    };
}

pub(crate) use impl_file_storage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_bytes() {
        let directory = std::env::temp_dir().join("hermes_extensions_storage_test");
        std::fs::create_dir_all(&directory).unwrap();
        let path = binary_file_path(&directory, "bytes");

        write_bytes(&[1, 2, 3], &path).unwrap();
        assert_eq!(read_bytes(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let path = std::env::temp_dir().join("hermes_extensions_does_not_exist.bin");
        assert!(matches!(
            read_bytes(&path),
            Err(ExtensionError::Read { .. })
        ));
    }
}
