use std::io::IsTerminal;

use inquire::ui::{Attributes, RenderConfig, StyleSheet, Styled};

/// Set to `1` to never prompt, e.g. in scripts that can't answer.
pub const LIBRARY_NO_PROMPT_VAR: &str = "LIBRARY_NO_PROMPT";

#[derive(Debug, Clone)]
pub struct Confirm {
    pub default: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Dialog<'a, Type> {
    pub message: &'a str,
    pub help_message: Option<&'a str>,
    pub typed: Type,
}

impl Dialog<'_, Confirm> {
    pub async fn prompt(self) -> inquire::error::InquireResult<bool> {
        let message = self.message.to_owned();
        let help_message: Option<String> = self.help_message.map(ToOwned::to_owned);
        let default = self.typed.default;

        tokio::task::spawn_blocking(move || {
            let mut dialog = inquire::Confirm::new(&message).with_render_config(library_theme());

            if let Some(default) = default {
                dialog = dialog.with_default(default);
            }

            if let Some(ref help_message) = help_message {
                dialog = dialog.with_help_message(help_message);
            }

            dialog.prompt()
        })
        .await
        .map_err(|join_error| inquire::InquireError::Custom(join_error.into()))?
    }
}

impl<T> Dialog<'_, T> {
    /// Whether a user is there to answer a prompt.
    pub fn can_prompt() -> bool {
        if std::env::var(LIBRARY_NO_PROMPT_VAR).is_ok_and(|v| v == "1") {
            return false;
        }
        std::io::stderr().is_terminal() && std::io::stdin().is_terminal()
    }
}

pub fn library_theme() -> RenderConfig<'static> {
    let mut render_config = RenderConfig::default_colored();
    render_config.answered_prompt_prefix = Styled::new(">");
    render_config.highlighted_option_prefix = Styled::new(">");
    render_config.prompt_prefix = Styled::new("!");
    render_config.prompt = StyleSheet::new().with_attr(Attributes::BOLD);
    render_config
}
