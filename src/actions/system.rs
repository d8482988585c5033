//! Volume, brightness, radios, session and power

use anyhow::Result;
use tracing::debug;

use crate::command::Command;
use crate::dispatcher::ActionContext;
use crate::error::ActionError;

const SINK_WPCTL: &str = "@DEFAULT_AUDIO_SINK@";
const SINK_PACTL: &str = "@DEFAULT_SINK@";

/// Run the first installed tool that succeeds; `None` if none is installed
fn first_available(ctx: &ActionContext<'_>, chain: &[(&str, Vec<String>)]) -> Option<Result<(), ActionError>> {
    let mut last = None;
    for (tool, args) in chain {
        if !ctx.exec.have_cmd(tool) {
            continue;
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match ctx.exec.run(tool, &args) {
            Ok(()) => return Some(Ok(())),
            Err(e) => {
                debug!("{} failed: {}, trying next", tool, e);
                last = Some(Err(e));
            }
        }
    }
    last
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn system_volume(ctx: &ActionContext<'_>, chain: &[(&str, Vec<String>)]) -> Result<()> {
    match first_available(ctx, chain) {
        Some(result) => Ok(result?),
        None => Err(ActionError::ToolMissing {
            tool: "wpctl, pactl or amixer".to_string(),
            hint: "sudo apt install wireplumber, pulseaudio-utils or alsa-utils",
        }
        .into()),
    }
}

fn volume_step(ctx: &ActionContext<'_>, up: bool) -> Result<()> {
    let step = ctx.config.volume_step();
    let sign = if up { "+" } else { "-" };
    let suffixed = format!("{}%{}", step, sign);
    let prefixed = format!("{}{}%", sign, step);
    system_volume(
        ctx,
        &[
            ("wpctl", args(&["set-volume", SINK_WPCTL, suffixed.as_str()])),
            ("pactl", args(&["set-sink-volume", SINK_PACTL, prefixed.as_str()])),
            ("amixer", args(&["-q", "-D", "pulse", "sset", "Master", suffixed.as_str()])),
        ],
    )
}

fn set_mute(ctx: &ActionContext<'_>, mute: bool) -> Result<()> {
    let flag = if mute { "1" } else { "0" };
    let word = if mute { "mute" } else { "unmute" };
    system_volume(
        ctx,
        &[
            ("wpctl", args(&["set-mute", SINK_WPCTL, flag])),
            ("pactl", args(&["set-sink-mute", SINK_PACTL, flag])),
            ("amixer", args(&["-q", "-D", "pulse", "sset", "Master", word])),
        ],
    )
}

fn brightness_step(ctx: &ActionContext<'_>, up: bool) -> Result<()> {
    let step = ctx.config.brightness_step();
    let delta = if up { format!("+{}%", step) } else { format!("{}%-", step) };
    let amount = step.to_string();
    let xbacklight = if up { "-inc" } else { "-dec" };
    let chain = [
        ("brightnessctl", args(&["set", delta.as_str()])),
        ("xbacklight", args(&[xbacklight, amount.as_str()])),
    ];
    match first_available(ctx, &chain) {
        Some(result) => Ok(result?),
        None => Err(ActionError::tool_missing("brightnessctl").into()),
    }
}

fn require_and_run(ctx: &ActionContext<'_>, tool: &str, args: &[&str]) -> Result<()> {
    if !ctx.exec.have_cmd(tool) {
        return Err(ActionError::tool_missing(tool).into());
    }
    ctx.exec.run(tool, args)?;
    Ok(())
}

pub fn volume_up(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    volume_step(ctx, true)
}

pub fn volume_down(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    volume_step(ctx, false)
}

pub fn volume_mute(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    set_mute(ctx, true)
}

pub fn volume_unmute(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    set_mute(ctx, false)
}

pub fn brightness_up(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    brightness_step(ctx, true)
}

pub fn brightness_down(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    brightness_step(ctx, false)
}

pub fn wifi_on(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    require_and_run(ctx, "nmcli", &["radio", "wifi", "on"])
}

pub fn wifi_off(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    require_and_run(ctx, "nmcli", &["radio", "wifi", "off"])
}

pub fn bluetooth_on(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    require_and_run(ctx, "bluetoothctl", &["power", "on"])
}

pub fn bluetooth_off(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    require_and_run(ctx, "bluetoothctl", &["power", "off"])
}

pub fn lock(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.exec.run("loginctl", &["lock-session"])?;
    Ok(())
}

pub fn shutdown(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.exec.run("systemctl", &["poweroff"])?;
    Ok(())
}

pub fn reboot(_: &Command, ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.exec.run("systemctl", &["reboot"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;
    use crate::config::Config;
    use crate::context::ContextMemory;
    use crate::executor::testing::RecordingExecutor;
    use std::sync::Arc;

    fn cmd() -> Command {
        Command::new("x", "")
    }

    #[test]
    fn test_volume_prefers_wpctl() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new().with_tools(&["wpctl", "pactl", "amixer"]);
        volume_up(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        volume_down(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "run wpctl set-volume @DEFAULT_AUDIO_SINK@ 5%+",
                "run wpctl set-volume @DEFAULT_AUDIO_SINK@ 5%-",
            ]
        );
    }

    #[test]
    fn test_volume_falls_through_chain() {
        let mut memory = ContextMemory::new();
        let mut exec = RecordingExecutor::new().with_tools(&["wpctl", "pactl"]);
        exec.failing_runs.insert("wpctl set-mute @DEFAULT_AUDIO_SINK@ 1".to_string());
        volume_mute(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "run wpctl set-mute @DEFAULT_AUDIO_SINK@ 1",
                "run pactl set-sink-mute @DEFAULT_SINK@ 1",
            ]
        );
    }

    #[test]
    fn test_volume_step_from_config() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new().with_tools(&["amixer"]);
        let mut context = ctx(&mut memory, &exec);
        context.config = Arc::new(Config {
            volume_step_percent: 10,
            ..Config::default()
        });
        volume_down(&cmd(), &mut context).unwrap();
        assert_eq!(exec.calls(), vec!["run amixer -q -D pulse sset Master 10%-"]);
    }

    #[test]
    fn test_no_volume_tool() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new();
        let err = volume_unmute(&cmd(), &mut ctx(&mut memory, &exec)).unwrap_err();
        assert!(err.to_string().contains("wpctl, pactl or amixer"));
    }

    #[test]
    fn test_brightness() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new().with_tools(&["xbacklight"]);
        brightness_up(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();

        let exec2 = RecordingExecutor::new().with_tools(&["brightnessctl"]);
        brightness_down(&cmd(), &mut ctx(&mut memory, &exec2)).unwrap();

        assert_eq!(exec.calls(), vec!["run xbacklight -inc 5"]);
        assert_eq!(exec2.calls(), vec!["run brightnessctl set 5%-"]);
    }

    #[test]
    fn test_radios_need_their_tools() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new().with_tools(&["nmcli"]);
        wifi_off(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        assert!(bluetooth_on(&cmd(), &mut ctx(&mut memory, &exec)).is_err());
        assert_eq!(exec.calls(), vec!["run nmcli radio wifi off"]);
    }

    #[test]
    fn test_session_commands() {
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new();
        lock(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        reboot(&cmd(), &mut ctx(&mut memory, &exec)).unwrap();
        assert_eq!(exec.calls(), vec!["run loginctl lock-session", "run systemctl reboot"]);
    }
}
