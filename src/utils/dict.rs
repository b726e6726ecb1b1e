//! Character dictionary loading.

use crate::core::OCRError;
use std::path::Path;

/// Reads a character dictionary file and returns a vector of strings.
///
/// Each line in the file becomes one entry in the resulting vector.
/// Empty lines are preserved.
///
/// # Errors
///
/// Returns an `OCRError::InvalidInput` if the file cannot be read.
///
/// # Example
///
/// ```rust,no_run
/// use line_ocr::utils::read_character_dict;
/// use std::path::Path;
///
/// let dict = read_character_dict(Path::new("path/to/dict.txt"))?;
/// # Ok::<(), line_ocr::core::OCRError>(())
/// ```
pub fn read_character_dict(path: &Path) -> Result<Vec<String>, OCRError> {
    let content = std::fs::read_to_string(path).map_err(|e| OCRError::InvalidInput {
        message: format!(
            "Failed to read character dictionary from '{}': {}",
            path.display(),
            e
        ),
    })?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_character_dict() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a").unwrap();
        writeln!(file).unwrap();
        writeln!(file, " ").unwrap();

        let dict = read_character_dict(file.path()).unwrap();
        assert_eq!(dict, vec!["a", "", " "]);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let err = read_character_dict(Path::new("/nonexistent/path/dict.txt")).unwrap_err();
        assert!(err.is_input_error());
    }
}
