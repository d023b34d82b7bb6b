// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processors backed by an external command.
//!
//! The configured argv is run with `{input}` replaced by the downloaded file
//! and `{output_dir}` by the message's scratch directory. Output is read from
//! stdout, or from `<input stem>.txt` / `.md` in the scratch directory for
//! tools that write files. A nonzero exit, a timeout or empty output fails
//! the message.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use siphon_core::{
    AdapterType, ContentProcessor, ContentType, ExtractedContent, HealthStatus, PluginAdapter,
    ProcessorInput, SiphonError,
};
use tokio::process::Command;
use tracing::{debug, info};

use crate::text::title_from_content;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct CommandProcessor {
    name: String,
    content_types: Vec<ContentType>,
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandProcessor {
    pub fn new(
        name: impl Into<String>,
        content_types: impl IntoIterator<Item = ContentType>,
        argv: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, SiphonError> {
        let name = name.into();
        if argv.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(SiphonError::Config(format!(
                "{name} command must name a program"
            )));
        }
        Ok(Self {
            name,
            content_types: content_types.into_iter().collect(),
            argv,
            timeout,
        })
    }

    /// The argv with placeholders substituted.
    pub fn render_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output_dir = output_dir.to_string_lossy();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir)
            })
            .collect()
    }

    async fn run(&self, args: &[String], work_dir: &Path) -> Result<String, SiphonError> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| SiphonError::processor(&self.name, "empty command"))?;

        let mut cmd = Command::new(program);
        cmd.args(rest)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(processor = %self.name, program = %program, "running external tool");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SiphonError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| SiphonError::Processor {
                processor: self.name.clone(),
                message: format!("failed to execute {program}: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(SiphonError::processor(
                &self.name,
                format!("{program} failed ({}): {excerpt}", output.status),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn read_output_file(&self, input: &Path, work_dir: &Path) -> Option<String> {
        let stem = input.file_stem()?.to_string_lossy();
        for ext in ["txt", "md"] {
            let candidate: PathBuf = work_dir.join(format!("{stem}.{ext}"));
            if candidate == input {
                continue;
            }
            if let Ok(text) = tokio::fs::read_to_string(&candidate).await
                && !text.trim().is_empty()
            {
                return Some(text);
            }
        }
        None
    }

    fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

/// Whether `program` resolves to a file, directly or through `PATH`.
fn program_exists(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[async_trait]
impl PluginAdapter for CommandProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Processor
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        if program_exists(self.program()) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(format!(
                "{} not found on PATH",
                self.program()
            )))
        }
    }
}

#[async_trait]
impl ContentProcessor for CommandProcessor {
    fn handles(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }

    async fn process(&self, input: ProcessorInput<'_>) -> Result<ExtractedContent, SiphonError> {
        let file = input.file.ok_or_else(|| {
            SiphonError::processor(&self.name, "no downloaded file for this message")
        })?;
        let args = self.render_args(file, input.work_dir);
        let stdout = self.run(&args, input.work_dir).await?;

        let content = if stdout.trim().is_empty() {
            self.read_output_file(file, input.work_dir)
                .await
                .unwrap_or_default()
        } else {
            stdout
        };
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(SiphonError::processor(&self.name, "tool produced no output"));
        }
        info!(processor = %self.name, chars = content.len(), "content extracted");

        let title = title_from_content(&content)
            .or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Untitled".to_string());
        Ok(ExtractedContent { content, title })
    }
}
