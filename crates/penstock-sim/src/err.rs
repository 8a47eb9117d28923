// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

/// Backend error codes above this value are unrecoverable: the project
/// could not be loaded or the solver state is corrupt.
pub const FATAL_CODE_THRESHOLD: i32 = 100;

/// A failed call into the hydraulic engine.
///
/// Every engine call reports success or a positive integer code in the
/// backend's own convention. Codes above [`FATAL_CODE_THRESHOLD`] abort the
/// search run and become the process exit code; anything else abandons the
/// current branch and the search continues at the next sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    code: i32,
    operation: &'static str,
    detail: String,
}

impl EngineError {
    /// Creates a new engine error.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `code` is not positive; zero is the
    /// backend's success value.
    #[inline]
    pub fn new(code: i32, operation: &'static str, detail: impl Into<String>) -> Self {
        debug_assert!(
            code > 0,
            "called `EngineError::new` with non-positive code: {}",
            code
        );
        Self {
            code,
            operation,
            detail: detail.into(),
        }
    }

    /// Returns the backend's integer error code.
    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the name of the failed engine operation.
    #[inline]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the backend-specific detail message.
    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns `true` if this failure is unrecoverable for the current run.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.code > FATAL_CODE_THRESHOLD
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "engine error [{}] in {}: {}",
            self.code, self.operation, self.detail
        )
    }
}

impl std::error::Error for EngineError {}

/// Convenience alias for engine call results.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let err = EngineError::new(10, "node_value", "unknown node handle");
        assert_eq!(err.code(), 10);
        assert_eq!(err.operation(), "node_value");
        assert_eq!(err.detail(), "unknown node handle");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_threshold() {
        assert!(!EngineError::new(100, "load", "warning").is_fatal());
        assert!(EngineError::new(101, "load", "invalid project").is_fatal());
        assert!(EngineError::new(302, "load", "missing file").is_fatal());
    }

    #[test]
    fn test_display_includes_code_and_operation() {
        let err = EngineError::new(102, "load", "parse failure");
        let shown = format!("{}", err);
        assert!(shown.contains("[102]"));
        assert!(shown.contains("load"));
        assert!(shown.contains("parse failure"));
    }
}
