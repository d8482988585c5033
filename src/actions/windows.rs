//! Window focus/close/inspect through wmctrl

use anyhow::Result;
use tracing::info;

use crate::command::{Command, CommandKind};
use crate::context;
use crate::dispatcher::ActionContext;
use crate::error::ActionError;
use crate::executor::find_window_by_title;

pub fn focus(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    if let Some(id) = cmd.arg("id") {
        ctx.memory.remember_window(id);
        ctx.exec.focus_window(id)?;
        return Ok(());
    }
    let name = cmd.arg("name").ok_or(ActionError::MissingArg {
        command: CommandKind::WindowFocus.as_str(),
        arg: "name or id",
    })?;

    let windows = ctx.exec.list_windows()?;
    let id = find_window_by_title(&windows, name)
        .map(|w| w.id.clone())
        .ok_or_else(|| ActionError::NoWindow(name.to_string()))?;
    ctx.memory.remember_window(&id);
    ctx.exec.focus_window(&id)?;
    Ok(())
}

pub fn close(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    if let Some(id) = cmd.arg("id") {
        ctx.memory.remember_window(id);
        ctx.exec.close_window(id)?;
        return Ok(());
    }
    let name = cmd.arg("name").ok_or(ActionError::MissingArg {
        command: CommandKind::WindowClose.as_str(),
        arg: "name or id",
    })?;
    context::close_window_by_title(ctx.memory, ctx.exec, name)?;
    Ok(())
}

pub fn focus_last(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    context::focus_last(ctx.memory, ctx.exec)?;
    Ok(())
}

pub fn close_last(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    context::close_last(ctx.memory, ctx.exec)?;
    Ok(())
}

/// Log every window; with a name, remember the first match
pub fn inspect(cmd: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    let windows = ctx.exec.list_windows()?;
    if windows.is_empty() {
        info!("no windows found via wmctrl");
        return Ok(());
    }

    info!("open windows:");
    for w in &windows {
        info!("  id={} | {}", w.id, w.title);
    }

    let Some(query) = cmd.arg("name") else {
        return Ok(());
    };
    let q = query.to_lowercase();
    match windows.iter().find(|w| w.title.to_lowercase().contains(&q)) {
        Some(best) => {
            ctx.memory.remember_window(&best.id);
            info!("best match for '{}': id={} | {}", query, best.id, best.title);
        }
        None => info!("no window matching '{}'", query),
    }
    Ok(())
}
