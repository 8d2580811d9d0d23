//! Capture permission probe
//!
//! A short, bounded capture attempt run before the live capture so that
//! a permission problem is reported up front instead of as a silent hang.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub ok: bool,
    pub message: String,
}

impl ProbeOutcome {
    pub fn ready() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// What happened when the probe ran.
#[derive(Debug)]
pub enum ProbeRun {
    NotFound,
    TimedOut,
    Exited { success: bool, stderr: String },
    Failed(io::Error),
}

/// Map a probe run to a verdict. A timeout counts as success: the engine
/// opened the interface and simply saw no traffic.
pub fn classify(run: ProbeRun, program: &str) -> ProbeOutcome {
    match run {
        ProbeRun::NotFound => ProbeOutcome::failed(format!("{} not found", program)),
        ProbeRun::TimedOut => ProbeOutcome::ready(),
        ProbeRun::Failed(err) => ProbeOutcome::failed(err.to_string()),
        ProbeRun::Exited { success, stderr } => {
            let diagnostic = stderr.trim();
            let denied = diagnostic.to_lowercase().contains("permission");
            if denied || (!success && !diagnostic.is_empty()) {
                ProbeOutcome::failed(diagnostic)
            } else {
                ProbeOutcome::ready()
            }
        }
    }
}

pub async fn run_probe(program: &str, args: &[String], limit: Duration) -> ProbeRun {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        // Keep terminal Ctrl-C away from the probe: a probe killed by
        // SIGINT would look like a clean, quiet capture.
        .process_group(0)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return ProbeRun::NotFound,
        Err(e) => return ProbeRun::Failed(e),
    };

    // Dropping the child on timeout kills it.
    match timeout(limit, child.wait_with_output()).await {
        Err(_) => ProbeRun::TimedOut,
        Ok(Err(e)) => ProbeRun::Failed(e),
        Ok(Ok(output)) => ProbeRun::Exited {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
    }
}

/// True when `<program> --version` runs at all.
pub async fn engine_responds(program: &str, limit: Duration) -> bool {
    let mut command = Command::new(program);
    command
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(limit, command.status()).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!(program, error = %e, "capture engine did not start");
            false
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_classify_permission_denied() {
        let stderr = "Capturing on 'val01'\ntshark: You don't have permission to capture on that device\n";
        let outcome = classify(
            ProbeRun::Exited {
                success: false,
                stderr: stderr.to_string(),
            },
            "tshark",
        );
        assert!(!outcome.ok);
        assert!(outcome.message.contains("You don't have permission"));
        assert!(!outcome.message.ends_with('\n'));
    }

    #[test]
    fn test_classify_permission_even_on_success() {
        let outcome = classify(
            ProbeRun::Exited {
                success: true,
                stderr: "Permission denied".to_string(),
            },
            "tshark",
        );
        assert_eq!(outcome, ProbeOutcome::failed("Permission denied"));
    }

    #[test]
    fn test_classify_other_failure() {
        let outcome = classify(
            ProbeRun::Exited {
                success: false,
                stderr: "tshark: The capture session could not be initiated (No such device)".to_string(),
            },
            "tshark",
        );
        assert!(!outcome.ok);
        assert!(outcome.message.contains("No such device"));
    }

    #[test]
    fn test_classify_quiet_outcomes_are_ok() {
        assert!(classify(ProbeRun::TimedOut, "tshark").ok);
        assert!(
            classify(
                ProbeRun::Exited {
                    success: true,
                    stderr: "Capturing on 'val01'\n0 packets captured\n".to_string(),
                },
                "tshark",
            )
            .ok
        );
        // Non-zero exit with nothing on stderr is not treated as a failure.
        assert!(
            classify(
                ProbeRun::Exited {
                    success: false,
                    stderr: String::new(),
                },
                "tshark",
            )
            .ok
        );
    }

    #[test]
    fn test_classify_not_found() {
        let outcome = classify(ProbeRun::NotFound, "tshark");
        assert_eq!(outcome, ProbeOutcome::failed("tshark not found"));
    }

    #[tokio::test]
    async fn test_run_probe_missing_program() {
        let run = run_probe("ue-monitor-no-such-engine", &[], Duration::from_secs(1)).await;
        assert!(matches!(run, ProbeRun::NotFound));
    }

    #[tokio::test]
    async fn test_run_probe_times_out() {
        let run = run_probe("sh", &sh("sleep 5"), Duration::from_millis(100)).await;
        assert!(matches!(run, ProbeRun::TimedOut));
        assert!(classify(run, "sh").ok);
    }

    #[tokio::test]
    async fn test_run_probe_reads_stderr() {
        let run = run_probe(
            "sh",
            &sh("echo \"you don't have permission to capture\" >&2; exit 2"),
            Duration::from_secs(2),
        )
        .await;
        let outcome = classify(run, "sh");
        assert!(!outcome.ok);
        assert_eq!(outcome.message, "you don't have permission to capture");
    }

    #[tokio::test]
    async fn test_engine_responds() {
        assert!(engine_responds("sh", Duration::from_secs(2)).await);
        assert!(!engine_responds("ue-monitor-no-such-engine", Duration::from_secs(1)).await);
    }
}
