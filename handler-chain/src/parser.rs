//! Command token extraction from raw message text.

/// Case and addressing policy for command tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Lowercase tokens before lookup. Arguments keep their case.
    pub case_insensitive: bool,
    /// When set, `/cmd@other_bot` is ignored and only `/cmd@<bot_username>` (or a bare `/cmd`)
    /// is accepted. When unset any `@suffix` is stripped.
    pub bot_username: Option<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            bot_username: None,
        }
    }
}

/// Command found at the start of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Normalized token without the `/` prefix or `@botname` suffix.
    pub token: String,
    /// Remaining text, trimmed. Empty when the command was sent alone.
    pub argument: &'a str,
}

/// Extracts `/token[@bot] argument...` from message text. Performs no I/O and never fails.
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    options: ParserOptions,
}

impl CommandParser {
    pub const PREFIX: char = '/';

    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Applies the case policy to a token (used for both parsing and registration).
    pub fn normalize(&self, token: &str) -> String {
        let token = token.trim_start_matches(Self::PREFIX);
        if self.options.case_insensitive {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    }

    /// Returns the command at the start of `text`, or `None` if there is none (no prefix,
    /// empty token, or addressed to another bot).
    pub fn parse<'a>(&self, text: &'a str) -> Option<ParsedCommand<'a>> {
        let rest = text.strip_prefix(Self::PREFIX)?;

        let (head, tail) = match rest.find(char::is_whitespace) {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };

        if name.is_empty() {
            return None;
        }

        if let (Some(target), Some(me)) = (target, self.options.bot_username.as_deref()) {
            let me = me.trim_start_matches('@');
            if !target.is_empty() && !target.eq_ignore_ascii_case(me) {
                return None;
            }
        }

        Some(ParsedCommand {
            token: self.normalize(name),
            argument: tail.trim(),
        })
    }
}
