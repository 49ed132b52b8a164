//! Best-effort classification of external process failures.
//!
//! Captured output is matched, case-insensitively, against an ordered table
//! of substrings. The first category with a hit wins; anything unmatched is
//! [`ErrorCategory::Unknown`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    OutOfMemory,
    Gpu,
    Network,
    FileSystem,
    Permission,
    Python,
    Validation,
    Unknown,
}

const CATEGORY_TABLE: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::OutOfMemory,
        &["out of memory", "outofmemoryerror", "cannot allocate memory", "memoryerror"],
    ),
    (
        ErrorCategory::Gpu,
        &["cuda", "cudnn", "gpu", "mps backend", "no kernel image"],
    ),
    (
        ErrorCategory::Network,
        &["network", "connection", "timeout", "dns", "econnrefused", "enotfound"],
    ),
    (
        ErrorCategory::FileSystem,
        &[
            "enoent",
            "file not found",
            "no such file",
            "directory",
            "path",
            "cannot find",
        ],
    ),
    (
        ErrorCategory::Permission,
        &["permission", "eacces", "access denied", "unauthorized"],
    ),
    (
        ErrorCategory::Python,
        &["python", "module", "import", "syntax error", "traceback", "process exited"],
    ),
    (
        ErrorCategory::Validation,
        &["invalid", "validation", "required", "missing"],
    ),
];

/// Classify captured process output.
pub fn classify_output(output: &str) -> ErrorCategory {
    let lower = output.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| lower.contains(needle)))
        .map(|(category, _)| *category)
        .unwrap_or(ErrorCategory::Unknown)
}

impl ErrorCategory {
    /// Targeted advice for the user; `None` for unknown failures.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ErrorCategory::OutOfMemory => {
                Some("Ran out of memory. Try a smaller batch size or image size.")
            }
            ErrorCategory::Gpu => {
                Some("GPU or device error. Check the driver installation or train on CPU.")
            }
            ErrorCategory::Network => {
                Some("Network error. Please check your internet connection and try again.")
            }
            ErrorCategory::FileSystem => {
                Some("File or folder not found. Please check the path and try again.")
            }
            ErrorCategory::Permission => {
                Some("Permission denied. Please check file permissions and try again.")
            }
            ErrorCategory::Python => {
                Some("Python script failed. Check that the required packages are installed.")
            }
            ErrorCategory::Validation => Some("The script rejected its input."),
            ErrorCategory::Unknown => None,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::OutOfMemory => "out of memory",
            ErrorCategory::Gpu => "gpu",
            ErrorCategory::Network => "network",
            ErrorCategory::FileSystem => "file system",
            ErrorCategory::Permission => "permission",
            ErrorCategory::Python => "python",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// User-facing failure message: the category hint, or the generic
/// "failed with code N" fallback.
pub fn failure_message(tool: &str, code: Option<i32>, category: ErrorCategory) -> String {
    let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
    match category.hint() {
        Some(hint) => format!("{tool} failed with code {code}. {hint}"),
        None => format!("{tool} failed with code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_beats_gpu() {
        assert_eq!(
            classify_output("RuntimeError: CUDA out of memory. Tried to allocate 2.00 GiB"),
            ErrorCategory::OutOfMemory
        );
    }

    #[test]
    fn test_gpu() {
        assert_eq!(
            classify_output("AssertionError: Torch not compiled with CUDA enabled"),
            ErrorCategory::Gpu
        );
    }

    #[test]
    fn test_network() {
        assert_eq!(
            classify_output("requests.exceptions.ConnectionError: Max retries exceeded"),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_file_system() {
        assert_eq!(
            classify_output("FileNotFoundError: [Errno 2] No such file or directory: 'x.yaml'"),
            ErrorCategory::FileSystem
        );
    }

    #[test]
    fn test_python_module() {
        assert_eq!(
            classify_output("ModuleNotFoundError: No module named 'ultralytics'"),
            ErrorCategory::Python
        );
    }

    #[test]
    fn test_permission() {
        assert_eq!(
            classify_output("PermissionError: [Errno 13] Permission denied"),
            ErrorCategory::Permission
        );
    }

    #[test]
    fn test_unknown_falls_through() {
        assert_eq!(classify_output("segfault at 0x0"), ErrorCategory::Unknown);
        assert_eq!(classify_output(""), ErrorCategory::Unknown);
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(
            failure_message("Training", Some(1), ErrorCategory::Unknown),
            "Training failed with code 1"
        );
        assert!(failure_message("Training", Some(1), ErrorCategory::OutOfMemory)
            .contains("smaller batch size"));
        assert_eq!(
            failure_message("Download", None, ErrorCategory::Unknown),
            "Download failed with code signal"
        );
    }
}
