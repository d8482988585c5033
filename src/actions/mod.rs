//! Command handlers
//!
//! Every grammar command gets a handler through `handler_for`, which matches
//! exhaustively so a new `CommandKind` cannot be left unwired. The quick
//! keyword intents are registered on top as aliases for `open_app`.

mod apps;
mod media;
mod system;
mod windows;

use crate::command::{Command, CommandKind};
use crate::dispatcher::{ActionContext, CommandDispatcher};
use crate::error::ActionError;
use crate::lookups::{QUICK_LAUNCH_INTENTS, quick_launch_app};

type HandlerFn = fn(&Command, &mut ActionContext<'_>) -> anyhow::Result<()>;

pub fn handler_for(kind: CommandKind) -> HandlerFn {
    match kind {
        CommandKind::OpenUrl => apps::open_url,
        CommandKind::OpenApp => apps::open_app,
        CommandKind::CloseApp => apps::close_app,
        CommandKind::OpenTerminal => apps::open_terminal,

        CommandKind::MediaPlayPause => media::play_pause,
        CommandKind::MediaNext => media::next,
        CommandKind::MediaPrev => media::prev,
        CommandKind::MediaVolumeUp => media::volume_up,
        CommandKind::MediaVolumeDown => media::volume_down,
        CommandKind::MediaVolumeMute => system::volume_mute,
        CommandKind::MediaVolumeUnmute => system::volume_unmute,
        CommandKind::MediaSeekForward => media::seek_forward,
        CommandKind::MediaSeekBackward => media::seek_backward,

        CommandKind::SystemVolumeUp => system::volume_up,
        CommandKind::SystemVolumeDown => system::volume_down,
        CommandKind::SystemVolumeMute => system::volume_mute,
        CommandKind::SystemVolumeUnmute => system::volume_unmute,
        CommandKind::SystemBrightnessUp => system::brightness_up,
        CommandKind::SystemBrightnessDown => system::brightness_down,
        CommandKind::WifiOn => system::wifi_on,
        CommandKind::WifiOff => system::wifi_off,
        CommandKind::BluetoothOn => system::bluetooth_on,
        CommandKind::BluetoothOff => system::bluetooth_off,
        CommandKind::SystemLock => system::lock,
        CommandKind::SystemShutdown => system::shutdown,
        CommandKind::SystemReboot => system::reboot,

        CommandKind::WindowFocus => windows::focus,
        CommandKind::WindowClose => windows::close,
        CommandKind::WindowFocusLast => windows::focus_last,
        CommandKind::WindowCloseLast => windows::close_last,
        CommandKind::WindowInspect => windows::inspect,
    }
}

/// Wire the whole grammar plus the quick-launch aliases
pub fn register_all(dispatcher: &mut CommandDispatcher) {
    for kind in CommandKind::ALL {
        dispatcher.register_handler(kind.as_str(), Box::new(handler_for(kind)));
    }

    for &intent in QUICK_LAUNCH_INTENTS {
        let Some(app) = quick_launch_app(intent) else {
            continue;
        };
        dispatcher.register_handler(
            intent,
            Box::new(move |cmd: &Command, ctx: &mut ActionContext<'_>| apps::open_named_app(app, cmd, ctx)),
        );
    }
}

fn required_arg<'c>(cmd: &'c Command, kind: CommandKind, arg: &'static str) -> Result<&'c str, ActionError> {
    cmd.arg(arg).ok_or(ActionError::MissingArg {
        command: kind.as_str(),
        arg,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::context::ContextMemory;
    use crate::dispatcher::ActionContext;
    use crate::executor::testing::RecordingExecutor;
    use std::sync::Arc;

    pub fn ctx<'a>(memory: &'a mut ContextMemory, exec: &'a RecordingExecutor) -> ActionContext<'a> {
        ActionContext {
            memory,
            exec,
            config: Arc::new(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ctx;
    use super::*;
    use crate::context::ContextMemory;
    use crate::dispatcher::DispatchOutcome;
    use crate::executor::testing::RecordingExecutor;

    #[test]
    fn test_every_kind_and_quick_intent_is_registered() {
        let mut dispatcher = CommandDispatcher::new();
        register_all(&mut dispatcher);
        for kind in CommandKind::ALL {
            assert!(dispatcher.has_handler(kind.as_str()), "{} unwired", kind);
        }
        for intent in QUICK_LAUNCH_INTENTS {
            assert!(dispatcher.has_handler(intent), "{} unwired", intent);
        }
    }

    #[test]
    fn test_quick_intent_launches_fixed_app() {
        let mut dispatcher = CommandDispatcher::new();
        register_all(&mut dispatcher);
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new();

        let outcome = dispatcher.dispatch(&Command::new("open_telegram", "открой телегу"), &mut ctx(&mut memory, &exec));
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(exec.calls(), vec!["launch telegram-desktop"]);
        assert_eq!(memory.last_app().unwrap().value.name, "telegram-desktop");
    }

    #[test]
    fn test_missing_required_arg_fails() {
        let mut dispatcher = CommandDispatcher::new();
        register_all(&mut dispatcher);
        let mut memory = ContextMemory::new();
        let exec = RecordingExecutor::new();

        let outcome = dispatcher.dispatch(&Command::new("open_url", "open"), &mut ctx(&mut memory, &exec));
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert!(exec.calls().is_empty());
    }
}
