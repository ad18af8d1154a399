//! File-based loading.

use std::path::Path;

use super::ConfigError;

/// Reads the whole config file as UTF-8 text.
///
/// A missing file is [`ConfigError::FileNotFound`]; any other failure,
/// including invalid UTF-8, is [`ConfigError::ReadError`].
pub(crate) fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!(path = %path.display(), bytes = contents.len(), "read config file");
            Ok(contents)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"key\": \"value\"}}").unwrap();

        let contents = read_config_file(file.path()).unwrap();
        assert_eq!(contents, "{\"key\": \"value\"}\n");
    }

    #[test]
    fn test_missing_file() {
        let result = read_config_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_non_utf8_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();

        let result = read_config_file(file.path());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
