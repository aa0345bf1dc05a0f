//! External compiler adapter.
//!
//! The host-side compiler is an external collaborator: this module invokes
//! it, validates its exit status, and loads the produced image. The compiler
//! itself is never reimplemented here.

use std::path::Path;
use std::process::Output;

#[cfg(test)]
use mockall::automock;

use crate::error::{LinkError, LinkResult};
use crate::image::BinaryImage;

/// Abstraction over external command execution (the blink compiler).
/// This allows mocking the compiler invocation in tests.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Execute an external command with the given arguments.
    fn execute(&self, program: &str, args: Vec<String>) -> Result<Output, String>;
}

/// Real implementation that delegates to std::process::Command.
#[derive(Default)]
pub struct RealCommandExecutor;

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, program: &str, args: Vec<String>) -> Result<Output, String> {
        std::process::Command::new(program)
            .args(&args)
            .output()
            .map_err(|e| format!("Failed to execute {}: {}", program, e))
    }
}

/// Compile a source file and load the resulting binary image.
///
/// Runs `compiler -o <output> <source>`, fails with `CompilerFailed` on a
/// non-zero exit status (capturing stderr in the diagnostic), then reads the
/// output file into a [`BinaryImage`].
pub fn compile_source<E: CommandExecutor>(
    executor: &E,
    compiler: &str,
    source: &Path,
    output: &Path,
) -> LinkResult<BinaryImage> {
    let args = vec![
        "-o".to_string(),
        output.display().to_string(),
        source.display().to_string(),
    ];

    let result = executor
        .execute(compiler, args)
        .map_err(|detail| LinkError::CompilerFailed { detail })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let detail = if stderr.trim().is_empty() {
            format!("compiler exited with {}", result.status)
        } else {
            stderr.trim().to_string()
        };
        return Err(LinkError::CompilerFailed { detail });
    }

    BinaryImage::from_file(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(code: i32, stderr: &[u8]) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.to_vec(),
        }
    }

    #[test]
    fn test_compile_success_loads_image() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("app.blink.bin");
        let mut file = std::fs::File::create(&out_path).unwrap();
        file.write_all(&[0x01, 0x02, 0x03, 0x04]).unwrap();

        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|program, args| program == "blinkc" && args[0] == "-o")
            .returning(|_, _| Ok(output(0, b"")));

        let image =
            compile_source(&executor, "blinkc", Path::new("app.rb"), &out_path).unwrap();
        assert_eq!(image.len(), 4);
        assert_eq!(image.crc16(), 0x0121);
    }

    #[test]
    fn test_compile_failure_captures_stderr() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .returning(|_, _| Ok(output(1, b"app.rb:3: syntax error\n")));

        let result = compile_source(
            &executor,
            "blinkc",
            Path::new("app.rb"),
            Path::new("/tmp/out.bin"),
        );
        assert!(matches!(
            result,
            Err(LinkError::CompilerFailed { detail }) if detail.contains("syntax error")
        ));
    }

    #[test]
    fn test_compile_spawn_failure() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .returning(|_, _| Err("Failed to execute blinkc: not found".to_string()));

        let result = compile_source(
            &executor,
            "blinkc",
            Path::new("app.rb"),
            Path::new("/tmp/out.bin"),
        );
        assert!(matches!(result, Err(LinkError::CompilerFailed { .. })));
    }
}
