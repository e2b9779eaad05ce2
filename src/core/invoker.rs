use crate::core::{TransformOutcome, Transformer};
use crate::utils::error::{Result, WorkerError};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_TRANSFORM_PROGRAM: &str = "python3";
pub const DEFAULT_TRANSFORM_ARGS: [&str; 1] = ["main.py"];

/// 外部圖片處理程式
///
/// 以 `<program> [args...] <input> <output>` 呼叫，每筆只呼叫一次、不重試。
#[derive(Debug, Clone)]
pub struct ProcessTransformer {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessTransformer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<Output> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(input)
            .arg(output)
            .kill_on_drop(true);
        let child = command.output();

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
                WorkerError::TransformTimeout {
                    program: self.program.clone(),
                    seconds: limit.as_secs(),
                }
            })?,
            None => child.await,
        };

        result.map_err(|source| WorkerError::TransformSpawnError {
            program: self.program.clone(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl Transformer for ProcessTransformer {
    async fn transform(&self, input: &Path, output: &Path) -> Result<TransformOutcome> {
        tracing::debug!(
            "Running {} {:?} {} {}",
            self.program,
            self.args,
            input.display(),
            output.display()
        );

        let result = self.run(input, output).await?;
        let output_exists = tokio::fs::try_exists(output).await.unwrap_or(false);

        if result.status.success() && !output_exists {
            tracing::warn!(
                "Transform exited successfully but did not create {}",
                output.display()
            );
        }

        Ok(TransformOutcome {
            succeeded: result.status.success() && output_exists,
            output_path: output.to_path_buf(),
            log: combined_log(&result),
        })
    }
}

/// stdout 接 stderr，去除頭尾空白
fn combined_log(output: &Output) -> String {
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    log.push_str(&String::from_utf8_lossy(&output.stderr));
    log.trim().to_string()
}
