use std::error::Error;

use weblocation::errors::{Result, WeblocationError};

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_download_error() {
        let error = WeblocationError::download("HTTP 503");

        assert!(matches!(error, WeblocationError::Download(_)));
        assert!(error.to_string().contains("Download Error"));
        assert!(error.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_malformed_row_error() {
        let error = WeblocationError::malformed_row("not-a-network");

        assert!(matches!(error, WeblocationError::MalformedRow(_)));
        assert_eq!(error.message(), "not-a-network");
    }

    #[test]
    fn test_empty_dataset_error() {
        let error = WeblocationError::empty_dataset("City");

        assert!(matches!(error, WeblocationError::EmptyDataset(_)));
        assert!(error.to_string().contains("Empty Dataset"));
    }
}

#[cfg(test)]
mod error_code_tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let cases = [
            (WeblocationError::unknown_category("x"), "E001"),
            (WeblocationError::download("x"), "E002"),
            (WeblocationError::empty_dataset("x"), "E003"),
            (WeblocationError::malformed_row("x"), "E004"),
            (WeblocationError::lookup_miss("x"), "E005"),
            (WeblocationError::enrichment_transport("x"), "E006"),
            (WeblocationError::store_connection("x"), "E007"),
            (WeblocationError::store_operation("x"), "E008"),
            (WeblocationError::store_plugin_not_found("x"), "E009"),
            (WeblocationError::file_operation("x"), "E010"),
            (WeblocationError::serialization("x"), "E011"),
            (WeblocationError::config("x"), "E012"),
        ];
        for (error, code) in cases {
            assert_eq!(error.code(), code, "{}", error.error_type());
        }
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(WeblocationError::malformed_row("x").is_recoverable());
        assert!(WeblocationError::lookup_miss("x").is_recoverable());
        assert!(WeblocationError::enrichment_transport("x").is_recoverable());

        assert!(!WeblocationError::download("x").is_recoverable());
        assert!(!WeblocationError::empty_dataset("x").is_recoverable());
        assert!(!WeblocationError::store_connection("x").is_recoverable());
    }

    #[test]
    fn test_format_colored_contains_code_and_message() {
        let output = WeblocationError::store_plugin_not_found("mongo").format_colored();
        assert!(output.contains("E009"));
        assert!(output.contains("mongo"));
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "scratch missing");
        let error: WeblocationError = io.into();

        assert!(matches!(error, WeblocationError::FileOperation(_)));
        assert!(error.message().contains("scratch missing"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: WeblocationError = json.into();

        assert!(matches!(error, WeblocationError::Serialization(_)));
    }

    #[test]
    fn test_from_zip_error() {
        let error: WeblocationError = zip::result::ZipError::FileNotFound.into();

        assert!(matches!(error, WeblocationError::Download(_)));
        assert!(error.message().contains("archive is broken"));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.csv")?)
        }

        let error = read_missing().unwrap_err();
        assert_eq!(error.code(), "E010");
        assert!(error.source().is_none());
    }
}
