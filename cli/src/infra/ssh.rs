//! Remote shell adapter over the OpenSSH client binary.
//!
//! Sessions authenticate with the deployment's pre-shared key. The OpenSSH
//! client reserves exit status 255 for its own failures (unreachable host,
//! dropped transport); that maps to [`ShellError::Connect`] so the connect
//! retry layer re-establishes the session. Any other non-zero status is the
//! remote command's own exit code.

use std::process::Output;

use anyhow::Result;

use crate::application::ports::{RemoteShell, ShellSession};
use crate::domain::{DeployConfig, ShellError};
use crate::infra::command_runner::{CommandRunner, DEFAULT_EXEC_TIMEOUT, TokioCommandRunner};

const SSH_EXIT_TRANSPORT: i32 = 255;

pub struct OpenSshShell<R: CommandRunner + Clone> {
    runner: R,
    username: String,
    identity_file: String,
}

impl<R: CommandRunner + Clone> OpenSshShell<R> {
    pub fn new(runner: R, cfg: &DeployConfig) -> Self {
        Self {
            runner,
            username: cfg.ssh_username.clone(),
            identity_file: cfg.identity_file.to_string_lossy().into_owned(),
        }
    }
}

impl OpenSshShell<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(cfg: &DeployConfig) -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT), cfg)
    }
}

impl<R: CommandRunner + Clone> RemoteShell for OpenSshShell<R> {
    type Session = OpenSshSession<R>;

    async fn connect(&self, address: &str) -> Result<Self::Session> {
        let session = OpenSshSession {
            runner: self.runner.clone(),
            address: address.to_owned(),
            target: format!("{}@{address}", self.username),
            identity_file: self.identity_file.clone(),
        };
        // Probe with a no-op command; any failure here means the session
        // cannot be established yet.
        let output = session.run_remote("true").await?;
        if output.status.success() {
            Ok(session)
        } else {
            Err(ShellError::Connect {
                address: address.to_owned(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }
            .into())
        }
    }
}

#[derive(Debug)]
pub struct OpenSshSession<R: CommandRunner> {
    runner: R,
    address: String,
    target: String,
    identity_file: String,
}

impl<R: CommandRunner> OpenSshSession<R> {
    fn ssh_args<'a>(&'a self, command: &'a str) -> Vec<&'a str> {
        vec![
            "-i",
            &self.identity_file,
            "-o",
            "BatchMode=yes",
            "-o",
            "StrictHostKeyChecking=accept-new",
            "-o",
            "ConnectTimeout=10",
            &self.target,
            command,
        ]
    }

    async fn run_remote(&self, command: &str) -> Result<Output> {
        self.runner
            .run("ssh", &self.ssh_args(command))
            .await
            .map_err(|err| self.connect_error(&err.to_string()))
    }

    fn connect_error(&self, reason: &str) -> anyhow::Error {
        ShellError::Connect {
            address: self.address.clone(),
            reason: reason.to_owned(),
        }
        .into()
    }
}

impl<R: CommandRunner> ShellSession for OpenSshSession<R> {
    async fn upload(&self, bytes: &[u8], remote_path: &str) -> Result<()> {
        let command = format!("cat > {remote_path}");
        let output = self
            .runner
            .run_with_stdin("ssh", &self.ssh_args(&command), bytes)
            .await
            .map_err(|err| self.connect_error(&err.to_string()))?;
        match output.status.code() {
            Some(0) => Ok(()),
            Some(SSH_EXIT_TRANSPORT) => Err(self.connect_error(
                String::from_utf8_lossy(&output.stderr).trim(),
            )),
            _ => Err(ShellError::Transfer {
                remote_path: remote_path.to_owned(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }
            .into()),
        }
    }

    async fn exec(&self, command: &str) -> Result<()> {
        let output = self.run_remote(command).await?;
        match output.status.code() {
            Some(0) => Ok(()),
            Some(SSH_EXIT_TRANSPORT) => Err(self.connect_error(
                String::from_utf8_lossy(&output.stderr).trim(),
            )),
            Some(status) => Err(ShellError::Exec { status }.into()),
            // Killed by a signal; re-running the sequence is the safe default.
            None => Err(ShellError::Exec { status: -1 }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use anyhow::Result;

    use super::*;
    use crate::application::services::test_support::{fail_output, ok_output};

    #[derive(Debug, Default)]
    struct RunnerLog {
        calls: RefCell<Vec<(String, Vec<String>, Option<Vec<u8>>)>>,
        responses: RefCell<VecDeque<Output>>,
    }

    #[derive(Clone, Debug)]
    struct ScriptedRunner(std::rc::Rc<RunnerLog>);

    impl ScriptedRunner {
        fn with_responses(responses: Vec<Output>) -> Self {
            let log = RunnerLog {
                calls: RefCell::new(Vec::new()),
                responses: RefCell::new(responses.into()),
            };
            Self(std::rc::Rc::new(log))
        }
        fn record(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) -> Result<Output> {
            self.0.calls.borrow_mut().push((
                program.to_owned(),
                args.iter().map(|a| (*a).to_owned()).collect(),
                stdin.map(<[u8]>::to_vec),
            ));
            self.0
                .responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted response"))
        }
    }

    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
            self.record(program, args, None)
        }
        async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
            self.record(program, args, Some(input))
        }
    }

    fn shell(runner: ScriptedRunner) -> OpenSshShell<ScriptedRunner> {
        OpenSshShell::new(runner, &DeployConfig::default())
    }

    #[tokio::test]
    async fn connect_probes_with_a_noop_command() {
        let shell = shell(ScriptedRunner::with_responses(vec![ok_output(b"")]));
        let session = shell.connect("52.1.2.3").await.expect("connect");
        let calls = session.runner.0.calls.borrow();
        let (program, args, _) = &calls[0];
        assert_eq!(program, "ssh");
        assert!(args.contains(&"BatchMode=yes".to_owned()));
        assert!(args.contains(&"ubuntu@52.1.2.3".to_owned()));
        assert_eq!(args.last().map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn transport_failure_classifies_as_connect_error() {
        let shell = shell(ScriptedRunner::with_responses(vec![fail_output(
            255,
            b"ssh: connect to host 52.1.2.3 port 22: Connection refused",
        )]));
        let err = shell.connect("52.1.2.3").await.expect_err("expected Err");
        let shell_err = err.downcast_ref::<ShellError>().expect("ShellError");
        assert!(shell_err.is_connect());
    }

    #[tokio::test]
    async fn upload_pipes_bytes_through_stdin() {
        let runner = ScriptedRunner::with_responses(vec![ok_output(b""), ok_output(b"")]);
        let session = shell(runner).connect("52.1.2.3").await.expect("connect");
        session
            .upload(b"#!/bin/sh\n", "stratus-0001.sh")
            .await
            .expect("upload");
        let calls = session.runner.0.calls.borrow();
        let (_, args, stdin) = &calls[1];
        assert_eq!(args.last().map(String::as_str), Some("cat > stratus-0001.sh"));
        assert_eq!(stdin.as_deref(), Some(b"#!/bin/sh\n".as_slice()));
    }

    #[tokio::test]
    async fn nonzero_remote_exit_is_an_execution_error() {
        let runner = ScriptedRunner::with_responses(vec![ok_output(b""), fail_output(2, b"boom")]);
        let session = shell(runner).connect("52.1.2.3").await.expect("connect");
        let err = session.exec("sudo ./x.sh").await.expect_err("expected Err");
        let shell_err = err.downcast_ref::<ShellError>().expect("ShellError");
        assert!(shell_err.is_execution());
        assert!(matches!(shell_err, ShellError::Exec { status: 2 }));
    }
}
