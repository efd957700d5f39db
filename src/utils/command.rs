/// External command execution
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Result from command execution with captured output
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }

    /// Return the combined output if successful, otherwise error with it
    pub fn into_result(self) -> Result<String> {
        let combined = self.combined();
        if self.success {
            Ok(combined)
        } else {
            anyhow::bail!("{}", combined.trim())
        }
    }
}

/// Builder for executing external commands
pub struct CommandBuilder {
    command: Command,
    context_msg: Option<String>,
}

impl CommandBuilder {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut command = Command::new(program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Self {
            command,
            context_msg: None,
        }
    }

    /// Run a command line through `bash -c`
    pub fn shell(command_line: &str) -> Self {
        Self::new("bash").args(["-c", command_line])
    }

    /// Like `shell`, with stderr sent into the stdout pipe so both streams
    /// keep the order they were written in
    pub fn shell_interleaved(command_line: &str) -> Self {
        Self::shell(&format!("{{ {}\n}} 2>&1", command_line))
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set an environment variable on the child only
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.command.env(key, val);
        self
    }

    /// Point the child's KUBECONFIG at `path`
    pub fn kubeconfig(self, path: &Path) -> Self {
        self.env("KUBECONFIG", path)
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput> {
        let output = match &self.context_msg {
            Some(ctx) => self.command.output().await.context(ctx.clone())?,
            None => self.command.output().await?,
        };
        Ok(CommandOutput::from_output(output))
    }

    /// Execute and return combined output on success, error on failure
    pub async fn run(self) -> Result<String> {
        let context_msg = self.context_msg.clone();
        let result = self.output().await?.into_result();
        match context_msg {
            Some(ctx) => result.context(ctx),
            None => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_combines_output() {
        let output = CommandBuilder::shell("echo out; echo err >&2")
            .output()
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[tokio::test]
    async fn test_kubeconfig_env_is_scoped_to_child() {
        let output = CommandBuilder::shell("echo $KUBECONFIG")
            .kubeconfig(Path::new("/tmp/reaper/.kube/config"))
            .run()
            .await
            .unwrap();

        assert_eq!(output.trim(), "/tmp/reaper/.kube/config");
        assert_ne!(
            std::env::var("KUBECONFIG").ok().as_deref(),
            Some("/tmp/reaper/.kube/config")
        );
    }

    #[tokio::test]
    async fn test_run_failure_carries_output_and_context() {
        let result = CommandBuilder::shell("echo boom >&2; exit 3")
            .context("Bootstrap failed")
            .run()
            .await;

        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("Bootstrap failed"));
        assert!(err_msg.contains("boom"));
    }

    #[tokio::test]
    async fn test_interleaved_keeps_write_order() {
        let output = CommandBuilder::shell_interleaved(
            "echo 1; sleep 0.1; echo 2 >&2; sleep 0.1; echo 3",
        )
        .run()
        .await
        .unwrap();

        assert_eq!(output, "1\n2\n3\n");
    }

    #[tokio::test]
    async fn test_interleaved_keeps_exit_status() {
        let result = CommandBuilder::shell_interleaved("echo denied >&2; exit 4")
            .run()
            .await;

        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("denied"));
    }

    #[test]
    fn test_combined_without_trailing_newline() {
        let output = CommandOutput {
            stdout: "a".to_string(),
            stderr: "b".to_string(),
            success: true,
        };
        assert_eq!(output.combined(), "a\nb");
    }
}
