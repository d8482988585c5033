//! Media player control through playerctl (MPRIS)

use anyhow::Result;

use crate::command::Command;
use crate::dispatcher::ActionContext;
use crate::error::ActionError;

fn playerctl(ctx: &ActionContext<'_>, args: &[&str]) -> Result<()> {
    if !ctx.exec.have_cmd("playerctl") {
        return Err(ActionError::tool_missing("playerctl").into());
    }
    ctx.exec.run("playerctl", args)?;
    Ok(())
}

pub fn play_pause(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["play-pause"])
}

pub fn next(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["next"])
}

pub fn prev(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["previous"])
}

pub fn volume_up(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["volume", "0.05+"])
}

pub fn volume_down(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["volume", "0.05-"])
}

pub fn seek_forward(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["position", "10+"])
}

pub fn seek_backward(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    playerctl(ctx, &["position", "10-"])
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;
    use crate::context::ContextMemory;
    use crate::executor::testing::RecordingExecutor;

    #[test]
    fn test_playerctl_subcommands() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new().with_tools(&["playerctl"]);
        let cmd = Command::new("media_next", "next track");

        next(&cmd, &mut ctx(&mut memory, &exec)).unwrap();
        prev(&cmd, &mut ctx(&mut memory, &exec)).unwrap();
        seek_backward(&cmd, &mut ctx(&mut memory, &exec)).unwrap();
        volume_up(&cmd, &mut ctx(&mut memory, &exec)).unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "run playerctl next",
                "run playerctl previous",
                "run playerctl position 10-",
                "run playerctl volume 0.05+",
            ]
        );
    }

    #[test]
    fn test_missing_playerctl_reports_hint() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new();
        let err = play_pause(&Command::new("media_play_pause", ""), &mut ctx(&mut memory, &exec)).unwrap_err();
        assert!(err.to_string().contains("sudo apt install playerctl"));
        assert!(exec.calls().is_empty());
    }
}
