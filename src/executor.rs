//! Side-effect executors
//!
//! Everything that touches the machine goes through `ActionExecutor`:
//! spawning apps, running CLI tools, sending signals, and talking to the
//! window manager. `SystemExecutor` shells out (wmctrl, pkill, ...); tests
//! swap in a recording fake.

use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::ActionError;

/// A top-level window as reported by the window manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: String,
    pub title: String,
}

pub trait ActionExecutor {
    /// Whether `bin` resolves to an executable
    fn have_cmd(&self, bin: &str) -> bool;

    /// Run a program to completion; non-zero exit is an error
    fn run(&self, program: &str, args: &[&str]) -> Result<(), ActionError>;

    /// Start a command line in the background, returning its pid when known
    fn launch(&self, command_line: &str) -> Result<Option<u32>, ActionError>;

    /// SIGTERM
    fn terminate_graceful(&self, pid: u32) -> Result<(), ActionError>;

    /// SIGKILL
    fn terminate_forced(&self, pid: u32) -> Result<(), ActionError>;

    /// Whether `pid` still exists
    fn is_alive(&self, pid: u32) -> bool;

    /// Kill the newest process by name (`exact`) or full command line
    fn kill_by_name(&self, name: &str, exact: bool) -> Result<(), ActionError>;

    fn list_windows(&self) -> Result<Vec<WindowInfo>, ActionError>;

    fn focus_window(&self, id: &str) -> Result<(), ActionError>;

    fn close_window(&self, id: &str) -> Result<(), ActionError>;
}

/// Real executor: spawns processes and shells out to wmctrl/pkill
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }

    fn require(&self, tool: &str) -> Result<(), ActionError> {
        if self.have_cmd(tool) {
            Ok(())
        } else {
            Err(ActionError::tool_missing(tool))
        }
    }
}

impl ActionExecutor for SystemExecutor {
    fn have_cmd(&self, bin: &str) -> bool {
        !bin.is_empty() && which::which(bin).is_ok()
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<(), ActionError> {
        let line = display_command(program, args);
        info!("run `{}`", line);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| ActionError::Spawn {
                command: line.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::CommandFailed {
                command: line,
                status: status.to_string(),
            })
        }
    }

    fn launch(&self, command_line: &str) -> Result<Option<u32>, ActionError> {
        let command_line = command_line.trim();
        info!("run `{}`", command_line);

        // Plain "prog arg arg" runs directly so the pid is the app's own;
        // anything with shell syntax goes through sh and reports sh's pid.
        let mut cmd = if has_shell_syntax(command_line) {
            let mut c = Command::new("sh");
            c.args(["-c", command_line]);
            c
        } else {
            let mut parts = command_line.split_whitespace();
            let program = parts.next().unwrap_or_default();
            let mut c = Command::new(program);
            c.args(parts);
            c
        };

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ActionError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        let pid = child.id();
        let label = command_line.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => debug!("`{}` exited with {}", label, status),
            Ok(_) => {}
            Err(e) => warn!("error waiting on `{}`: {}", label, e),
        });

        Ok(Some(pid))
    }

    fn terminate_graceful(&self, pid: u32) -> Result<(), ActionError> {
        send_signal(pid, libc::SIGTERM, "SIGTERM")
    }

    fn terminate_forced(&self, pid: u32) -> Result<(), ActionError> {
        send_signal(pid, libc::SIGKILL, "SIGKILL")
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // SAFETY: signal 0 only checks for existence and permission.
        let rc = unsafe { libc::kill(raw, 0) };
        rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    fn kill_by_name(&self, name: &str, exact: bool) -> Result<(), ActionError> {
        self.require("pkill")?;
        let mode = if exact { "-x" } else { "-f" };
        self.run("pkill", &["-n", mode, name])
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>, ActionError> {
        self.require("wmctrl")?;
        let output = Command::new("wmctrl")
            .arg("-l")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ActionError::Spawn {
                command: "wmctrl -l".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(ActionError::CommandFailed {
                command: "wmctrl -l".to_string(),
                status: output.status.to_string(),
            });
        }
        Ok(parse_wmctrl_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn focus_window(&self, id: &str) -> Result<(), ActionError> {
        self.require("wmctrl")?;
        self.run("wmctrl", &["-i", "-a", id])
    }

    fn close_window(&self, id: &str) -> Result<(), ActionError> {
        self.require("wmctrl")?;
        self.run("wmctrl", &["-i", "-c", id])
    }
}

fn send_signal(pid: u32, signal: libc::c_int, name: &'static str) -> Result<(), ActionError> {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return Err(ActionError::Signal {
            pid,
            signal: name,
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        });
    };
    info!("kill -{} {}", name, pid);
    // SAFETY: kill(2) takes plain integers and has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(ActionError::Signal {
            pid,
            signal: name,
            source: std::io::Error::last_os_error(),
        })
    }
}

fn has_shell_syntax(s: &str) -> bool {
    s.contains(['|', '&', ';', '>', '<', '$', '`', '(', ')', '\'', '"', '*', '~'])
}

/// Single-quote `s` for `sh -c`
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `wmctrl -l`: `<id> <desktop> <host> <title...>`
pub fn parse_wmctrl_list(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let _desktop = fields.next()?;
            let _host = fields.next();
            let title = fields.collect::<Vec<_>>().join(" ");
            Some(WindowInfo {
                id: id.to_string(),
                title,
            })
        })
        .collect()
}

/// Last window whose title contains `query` (case-insensitive)
pub fn find_window_by_title<'a>(windows: &'a [WindowInfo], query: &str) -> Option<&'a WindowInfo> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return None;
    }
    windows.iter().rev().find(|w| w.title.to_lowercase().contains(&q))
}
