//! An in-process sandbox backend for tests and the default build: no real
//! process isolation, just enough behavior (happy path, syntax-error path)
//! to exercise `code_review` without an external executor.

use async_trait::async_trait;

use super::{SandboxBackend, SandboxError};
use crate::records::{ExecutionResult, Language};

#[derive(Debug, Default)]
pub struct MockSandboxBackend;

#[async_trait]
impl SandboxBackend for MockSandboxBackend {
    async fn execute(&self, code: &str, language: Language) -> Result<ExecutionResult, SandboxError> {
        let looks_unbalanced = match language {
            Language::Python => code.matches('(').count() != code.matches(')').count(),
            Language::Javascript => code.matches('{').count() != code.matches('}').count(),
        };

        if looks_unbalanced {
            return Ok(ExecutionResult {
                stdout: String::new(),
                stderr: "SyntaxError: unexpected EOF".to_string(),
                exit_code: 1,
                elapsed_ms: 4,
                timed_out: false,
                stdout_truncated: false,
                stderr_truncated: false,
                unavailable: false,
            });
        }

        Ok(ExecutionResult {
            stdout: "ok\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            elapsed_ms: 12,
            timed_out: false,
            stdout_truncated: false,
            stderr_truncated: false,
            unavailable: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn balanced_code_runs_clean() {
        let backend = MockSandboxBackend;
        let result = backend.execute("print('hi')", Language::Python).await.unwrap();
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn unbalanced_parens_report_syntax_error() {
        let backend = MockSandboxBackend;
        let result = backend.execute("def f(:\n pass", Language::Python).await.unwrap();
        assert_eq!(result.exit_code, 1);
    }
}
