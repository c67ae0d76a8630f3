use super::BackendKind;

const ANTHROPIC_ALIASES: &[(&str, &str)] = &[
    ("claude-3-5-sonnet", "claude-3-5-sonnet-latest"),
    ("claude-3-5-haiku", "claude-3-5-haiku-latest"),
    ("claude-3-opus", "claude-3-opus-latest"),
];

pub fn default_model(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::OpenAi => "gpt-4o-mini",
        BackendKind::Anthropic => "claude-3-5-sonnet",
    }
}

/// Maps a short model name to the id the backend expects. Unknown names pass through.
pub fn resolve_model(backend: BackendKind, name: &str) -> String {
    let aliases: &[(&str, &str)] = match backend {
        BackendKind::OpenAi => &[],
        BackendKind::Anthropic => ANTHROPIC_ALIASES,
    };

    aliases
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, resolved)| resolved)
        .to_string()
}
