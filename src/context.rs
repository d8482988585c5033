//! Context memory: what "it" and "the last one" refer to
//!
//! Two independent facts are tracked, the last launched app and the last
//! touched window. Each update takes a fresh number from one shared counter,
//! which gives a total order across both facts. `close_last` uses that order
//! to decide whether "close it" means the window or the app.

use std::time::Duration;
use tracing::{debug, info};

use crate::error::ActionError;
use crate::executor::{ActionExecutor, find_window_by_title};
use crate::lookups::app_to_window_query;

/// How long a process gets to exit after SIGTERM before SIGKILL
const KILL_GRACE_CHECKS: usize = 10;
const KILL_GRACE_STEP: Duration = Duration::from_millis(50);

/// A value plus the sequence number it was recorded under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyFact<T> {
    pub value: T,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRef {
    pub name: String,
    pub pid: Option<u32>,
}

#[derive(Debug, Default)]
pub struct ContextMemory {
    seq: u64,
    last_app: Option<RecencyFact<AppRef>>,
    last_window: Option<RecencyFact<String>>,
    last_url: Option<String>,
}

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_app(&mut self, name: &str, pid: Option<u32>) {
        let seq = self.next_seq();
        debug!("remember app {} (pid {:?}, seq {})", name, pid, seq);
        self.last_app = Some(RecencyFact {
            value: AppRef {
                name: name.to_string(),
                pid,
            },
            seq,
        });
    }

    pub fn remember_window(&mut self, id: &str) {
        let seq = self.next_seq();
        debug!("remember window {} (seq {})", id, seq);
        self.last_window = Some(RecencyFact {
            value: id.to_string(),
            seq,
        });
    }

    pub fn remember_url(&mut self, url: &str) {
        self.last_url = Some(url.to_string());
    }

    pub fn last_app(&self) -> Option<&RecencyFact<AppRef>> {
        self.last_app.as_ref()
    }

    pub fn last_window(&self) -> Option<&RecencyFact<String>> {
        self.last_window.as_ref()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Ordered attempts for "close the last thing"
    ///
    /// Window-level steps come first, newest fact first (ties go to the
    /// window); the remembered process is the last resort.
    pub fn close_last_plan(&self) -> Vec<CloseStep> {
        let window = self.last_window.as_ref();
        let app = self.last_app.as_ref();

        let by_id = window.map(|w| CloseStep::WindowById(w.value.clone()));
        let by_title = app.map(|a| CloseStep::WindowByTitle(app_to_window_query(&a.value.name)));

        let window_is_newer = match (window, app) {
            (Some(w), Some(a)) => w.seq >= a.seq,
            (Some(_), None) => true,
            _ => false,
        };

        let mut steps = Vec::with_capacity(3);
        if window_is_newer {
            steps.extend(by_id);
            steps.extend(by_title);
        } else {
            steps.extend(by_title);
            steps.extend(by_id);
        }
        if let Some(a) = app {
            steps.push(CloseStep::Process(a.value.clone()));
        }
        steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseStep {
    WindowById(String),
    WindowByTitle(String),
    Process(AppRef),
}

/// Close the most recently touched window or app, degrading step by step
pub fn close_last(memory: &mut ContextMemory, exec: &dyn ActionExecutor) -> Result<CloseStep, ActionError> {
    let plan = memory.close_last_plan();
    if plan.is_empty() {
        return Err(ActionError::NothingRemembered);
    }

    for step in plan {
        let attempt = match &step {
            CloseStep::WindowById(id) => {
                memory.remember_window(id);
                exec.close_window(id)
            }
            CloseStep::WindowByTitle(query) => close_window_by_title(memory, exec, query).map(|_| ()),
            CloseStep::Process(app) => close_app_instance(exec, app),
        };
        match attempt {
            Ok(()) => {
                info!("closed last via {:?}", step);
                return Ok(step);
            }
            Err(e) => debug!("close step {:?} failed: {}", step, e),
        }
    }

    Err(ActionError::CloseFailed)
}

/// Bring the remembered window back to the front
pub fn focus_last(memory: &mut ContextMemory, exec: &dyn ActionExecutor) -> Result<String, ActionError> {
    let id = memory
        .last_window()
        .map(|w| w.value.clone())
        .ok_or(ActionError::NothingRemembered)?;
    memory.remember_window(&id);
    exec.focus_window(&id)?;
    Ok(id)
}

/// Close the last window whose title contains `query`; returns its id
pub fn close_window_by_title(
    memory: &mut ContextMemory,
    exec: &dyn ActionExecutor,
    query: &str,
) -> Result<String, ActionError> {
    let windows = exec.list_windows()?;
    let id = find_window_by_title(&windows, query)
        .map(|w| w.id.clone())
        .ok_or_else(|| ActionError::NoWindow(query.to_string()))?;
    memory.remember_window(&id);
    exec.close_window(&id)?;
    Ok(id)
}

/// Stop an app process: pid (TERM, then KILL), else newest process by name
pub fn close_app_instance(exec: &dyn ActionExecutor, app: &AppRef) -> Result<(), ActionError> {
    if let Some(pid) = app.pid {
        if exec.terminate_graceful(pid).is_ok() {
            if !exited_within_grace(exec, pid) {
                debug!("pid {} ignored SIGTERM", pid);
                let _ = exec.terminate_forced(pid);
            }
            return Ok(());
        }
    }
    if app.name.is_empty() {
        return Err(ActionError::CloseFailed);
    }
    exec.kill_by_name(&app.name, true)
        .or_else(|_| exec.kill_by_name(&app.name, false))
}

fn exited_within_grace(exec: &dyn ActionExecutor, pid: u32) -> bool {
    for _ in 0..KILL_GRACE_CHECKS {
        if !exec.is_alive(pid) {
            return true;
        }
        std::thread::sleep(KILL_GRACE_STEP);
    }
    !exec.is_alive(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::RecordingExecutor;

    #[test]
    fn test_sequence_is_shared_and_monotonic() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("firefox", Some(100));
        ctx.remember_window("0x123");
        ctx.remember_app("spotify", None);
        assert_eq!(ctx.last_app().unwrap().seq, 3);
        assert_eq!(ctx.last_window().unwrap().seq, 2);
        assert_eq!(ctx.last_app().unwrap().value.name, "spotify");
    }

    #[test]
    fn test_url_is_not_sequenced() {
        let mut ctx = ContextMemory::new();
        ctx.remember_url("https://youtube.com");
        ctx.remember_window("0x1");
        assert_eq!(ctx.last_url(), Some("https://youtube.com"));
        assert_eq!(ctx.last_window().unwrap().seq, 1);
    }

    #[test]
    fn test_plan_window_newer() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("firefox", Some(100));
        ctx.remember_window("0x123");
        assert_eq!(
            ctx.close_last_plan(),
            vec![
                CloseStep::WindowById("0x123".to_string()),
                CloseStep::WindowByTitle("firefox".to_string()),
                CloseStep::Process(AppRef {
                    name: "firefox".to_string(),
                    pid: Some(100)
                }),
            ]
        );
    }

    #[test]
    fn test_plan_app_newer() {
        let mut ctx = ContextMemory::new();
        ctx.remember_window("0x123");
        ctx.remember_app("firefox", Some(100));
        let plan = ctx.close_last_plan();
        assert_eq!(plan[0], CloseStep::WindowByTitle("firefox".to_string()));
        assert_eq!(plan[1], CloseStep::WindowById("0x123".to_string()));
    }

    #[test]
    fn test_plan_single_facts() {
        let mut ctx = ContextMemory::new();
        assert!(ctx.close_last_plan().is_empty());

        ctx.remember_window("0x9");
        assert_eq!(ctx.close_last_plan(), vec![CloseStep::WindowById("0x9".to_string())]);

        let mut ctx = ContextMemory::new();
        ctx.remember_app("code", None);
        assert_eq!(
            ctx.close_last_plan(),
            vec![
                CloseStep::WindowByTitle("visual studio code".to_string()),
                CloseStep::Process(AppRef {
                    name: "code".to_string(),
                    pid: None
                }),
            ]
        );
    }

    #[test]
    fn test_focus_last_bumps_window() {
        let mut ctx = ContextMemory::new();
        let exec = RecordingExecutor::new();
        assert!(matches!(focus_last(&mut ctx, &exec), Err(ActionError::NothingRemembered)));

        ctx.remember_window("0x5");
        ctx.remember_app("code", None);
        assert_eq!(focus_last(&mut ctx, &exec).unwrap(), "0x5");
        assert_eq!(exec.calls(), vec!["focus 0x5"]);
        assert_eq!(ctx.last_window().unwrap().seq, 3);
    }

    #[test]
    fn test_close_last_nothing_remembered() {
        let mut ctx = ContextMemory::new();
        let exec = RecordingExecutor::new();
        assert!(matches!(close_last(&mut ctx, &exec), Err(ActionError::NothingRemembered)));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_close_last_tries_window_id_first_when_window_newer() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("firefox", Some(100));
        ctx.remember_window("0x123");
        let exec = RecordingExecutor::new().with_window("0x777", "Mozilla Firefox");

        let step = close_last(&mut ctx, &exec).unwrap();
        assert_eq!(step, CloseStep::WindowById("0x123".to_string()));
        assert_eq!(exec.calls(), vec!["close 0x123"]);
    }

    #[test]
    fn test_close_last_tries_title_first_when_app_newer() {
        let mut ctx = ContextMemory::new();
        ctx.remember_window("0x123");
        ctx.remember_app("firefox", Some(100));
        let exec = RecordingExecutor::new().with_window("0x777", "Mozilla Firefox");

        let step = close_last(&mut ctx, &exec).unwrap();
        assert_eq!(step, CloseStep::WindowByTitle("firefox".to_string()));
        assert_eq!(exec.calls(), vec!["list_windows", "close 0x777"]);
        // The matched window becomes the newest fact
        assert_eq!(ctx.last_window().unwrap().value, "0x777");
    }

    #[test]
    fn test_close_last_falls_back_to_title_then_process() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("spotify", Some(321));
        ctx.remember_window("0xdead");
        let mut exec = RecordingExecutor::new();
        exec.failing_windows.insert("0xdead".to_string());

        let step = close_last(&mut ctx, &exec).unwrap();
        assert!(matches!(step, CloseStep::Process(_)));
        assert_eq!(
            exec.calls(),
            vec!["close 0xdead", "list_windows", "sigterm 321", "alive 321"]
        );
    }

    #[test]
    fn test_sigkill_only_after_grace_period() {
        let mut exec = RecordingExecutor::new();
        exec.stubborn_pids.insert(77);
        let app = AppRef {
            name: "steam".to_string(),
            pid: Some(77),
        };

        close_app_instance(&exec, &app).unwrap();
        let calls = exec.calls();
        assert_eq!(calls.first().map(String::as_str), Some("sigterm 77"));
        assert_eq!(calls.last().map(String::as_str), Some("sigkill 77"));
        assert_eq!(calls.iter().filter(|c| *c == "alive 77").count(), KILL_GRACE_CHECKS + 1);
    }

    #[test]
    fn test_close_last_falls_back_to_pkill() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("steam", Some(55));
        let mut exec = RecordingExecutor::new();
        exec.dead_pids.insert(55);

        close_last(&mut ctx, &exec).unwrap();
        assert_eq!(exec.calls(), vec!["list_windows", "sigterm 55", "pkill exact steam"]);
    }

    #[test]
    fn test_close_last_reports_failure_when_everything_fails() {
        let mut ctx = ContextMemory::new();
        ctx.remember_app("ghost", None);
        let mut exec = RecordingExecutor::new();
        exec.failing_names.insert("ghost".to_string());

        assert!(matches!(close_last(&mut ctx, &exec), Err(ActionError::CloseFailed)));
        assert_eq!(
            exec.calls(),
            vec!["list_windows", "pkill exact ghost", "pkill full ghost"]
        );
    }
}
