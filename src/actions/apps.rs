//! open_url, open_app, close_app, open_terminal

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::required_arg;
use crate::command::{Command, CommandKind};
use crate::config::Config;
use crate::dispatcher::ActionContext;
use crate::error::ActionError;
use crate::executor::shell_quote;
use crate::lookups::{TERMINAL_CANDIDATES, expand_url_alias, normalize_app_name, terminal_exec_flag};

const SPOTIFY_WEB: &str = "https://open.spotify.com/";

pub fn open_url(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    let url = required_arg(cmd, CommandKind::OpenUrl, "url")?;
    open_url_with_browser(url, ctx)
}

pub fn open_app(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    let name = required_arg(cmd, CommandKind::OpenApp, "name")?;
    open_named_app(name, cmd, ctx)
}

pub fn close_app(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    let name = required_arg(cmd, CommandKind::CloseApp, "name")?;
    let app = normalize_app_name(name);
    ctx.exec
        .kill_by_name(&app, true)
        .or_else(|_| ctx.exec.kill_by_name(&app, false))
        .with_context(|| format!("could not close {}", app))
}

pub fn open_terminal(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    launch_terminal(cmd.arg("command"), ctx)
}

/// Launch an app by spoken or canonical name; "terminal" goes to the terminal launcher
pub fn open_named_app(name: &str, cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    let (app, command_line) = resolve_app(&ctx.config, name);
    if app == "terminal" {
        return launch_terminal(cmd.arg("command"), ctx);
    }

    match ctx.exec.launch(&command_line) {
        Ok(pid) => {
            ctx.memory.remember_app(&app, pid);
            Ok(())
        }
        Err(e) if app == "spotify" => {
            warn!("spotify failed to start ({}), opening web player", e);
            open_url_with_browser(SPOTIFY_WEB, ctx)
        }
        Err(e) => Err(e.into()),
    }
}

/// Canonical app name plus the command line that starts it
fn resolve_app(config: &Config, name: &str) -> (String, String) {
    let app = normalize_app_name(name);
    let key = name.trim().to_lowercase();
    let command_line = if config.apps.contains_key(&key) {
        config.app_command(&key)
    } else {
        config.app_command(&app)
    };
    (app, command_line)
}

fn open_url_with_browser(raw: &str, ctx: &mut ActionContext<'_>) -> Result<()> {
    let url = normalize_url(raw);
    let browser = pick_browser(ctx)?;

    ctx.memory.remember_url(&url);
    ctx.exec.launch(&format!("{} {}", browser, shell_quote(&url)))?;
    Ok(())
}

fn normalize_url(raw: &str) -> String {
    let url = expand_url_alias(raw).map(str::to_string).unwrap_or_else(|| raw.trim().to_string());
    let lower = url.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url
    } else {
        format!("https://{}", url)
    }
}

fn pick_browser(ctx: &ActionContext<'_>) -> Result<String, ActionError> {
    let browser = ctx.config.browser();
    if ctx.exec.have_cmd(&browser) {
        return Ok(browser);
    }
    if browser != "firefox" && ctx.exec.have_cmd("firefox") {
        warn!("browser '{}' not found, using firefox", browser);
        return Ok("firefox".to_string());
    }
    Err(ActionError::ToolMissing {
        tool: browser,
        hint: "set default_browser in the config or $JARVIS_BROWSER",
    })
}

fn launch_terminal(command: Option<&str>, ctx: &mut ActionContext<'_>) -> Result<()> {
    let term = find_terminal(ctx).ok_or(ActionError::ToolMissing {
        tool: "terminal emulator".to_string(),
        hint: "set $JARVIS_TERMINAL or default_terminal in the config",
    })?;

    let line = match command {
        Some(c) => format!(
            "{} {} bash -lc {}",
            term,
            terminal_exec_flag(&term),
            shell_quote(&format!("{}; exec bash", c))
        ),
        None => term.clone(),
    };

    ctx.exec.launch(&line)?;
    ctx.memory.remember_app(&term, None);
    Ok(())
}

/// $JARVIS_TERMINAL, default_terminal, gnome-terminal, then the usual suspects
fn find_terminal(ctx: &ActionContext<'_>) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();
    let preferred = [
        std::env::var("JARVIS_TERMINAL").ok(),
        Some(ctx.config.default_terminal.clone()),
        Some("gnome-terminal".to_string()),
    ];
    for cand in preferred
        .into_iter()
        .flatten()
        .chain(TERMINAL_CANDIDATES.iter().map(|t| t.to_string()))
    {
        let cand = cand.trim().to_string();
        if !cand.is_empty() && !candidates.contains(&cand) {
            candidates.push(cand);
        }
    }

    candidates.into_iter().find(|term| {
        if !ctx.exec.have_cmd(term) {
            return false;
        }
        // Some installs are broken wrappers; require --version to succeed
        let ok = ctx.exec.run(term, &["--version"]).is_ok();
        if !ok {
            info!("terminal '{}' failed sanity check, skipping", term);
        }
        ok
    })
}
