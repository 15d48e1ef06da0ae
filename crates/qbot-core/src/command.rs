//! Text command parsing.
//!
//! Telegram may send `/cmd@botname arg1 ...`; the mention is stripped from
//! the command word only.

/// Marker every command starts with.
pub const COMMAND_MARKER: char = '/';

pub const START: &str = "/start";
pub const HELP: &str = "/help";
pub const QUEUE: &str = "/queue";
pub const CREATE_QUEUE: &str = "/createqueue";
pub const ENQUEUE: &str = "/enqueue";
pub const DEQUEUE: &str = "/dequeue";
pub const REMOVE_QUEUE: &str = "/removequeue";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased, including the leading `/`.
    pub name: String,
    pub params: Vec<String>,
    /// Bot name from a `/cmd@botname` suffix.
    pub addressed_to: Option<String>,
}

impl ParsedCommand {
    /// Parameters joined back with single spaces (queue names may contain spaces).
    pub fn joined_params(&self) -> String {
        self.params.join(" ")
    }

    /// `false` when the command names a different bot.
    pub fn is_for(&self, bot_username: &str) -> bool {
        self.addressed_to
            .as_deref()
            .map_or(true, |name| name.eq_ignore_ascii_case(bot_username))
    }
}

/// Parse a message text. Returns `None` when the text is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let text = text.trim_start();
    if !text.starts_with(COMMAND_MARKER) {
        return None;
    }

    let mut words = text.split_whitespace();
    let first = words.next()?;
    let (word, addressed_to) = match first.split_once('@') {
        Some((word, bot)) if !bot.is_empty() => (word, Some(bot.to_string())),
        Some((word, _)) => (word, None),
        None => (first, None),
    };
    if word.len() <= COMMAND_MARKER.len_utf8() {
        return None;
    }

    Some(ParsedCommand {
        name: word.to_lowercase(),
        params: words.map(str::to_string).collect(),
        addressed_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mention_from_command_word() {
        let cmd = parse_command("/createqueue@mybot Friday").unwrap();
        assert_eq!(cmd.name, "/createqueue");
        assert_eq!(cmd.params, vec!["Friday".to_string()]);
        assert_eq!(cmd.addressed_to.as_deref(), Some("mybot"));
        assert!(cmd.is_for("MyBot"));
        assert!(!cmd.is_for("otherbot"));
    }

    #[test]
    fn mention_on_a_parameter_is_kept() {
        let cmd = parse_command("/createqueue Friday Movie Night@mybot").unwrap();
        assert_eq!(cmd.name, "/createqueue");
        assert_eq!(cmd.params, vec!["Friday", "Movie", "Night@mybot"]);
        assert_eq!(cmd.joined_params(), "Friday Movie Night@mybot");
    }

    #[test]
    fn splits_on_any_whitespace_and_drops_empties() {
        let cmd = parse_command("/Enqueue   Snacks\t 3 \n").unwrap();
        assert_eq!(cmd.name, "/enqueue");
        assert_eq!(cmd.params, vec!["Snacks", "3"]);
        assert!(cmd.is_for("anybot"));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("hello /start"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/@mybot"), None);
    }
}
