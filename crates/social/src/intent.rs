use std::{ops::BitOr, sync::LazyLock};

use {
    regex::Regex,
    serde::{Deserialize, Serialize},
};

#[allow(clippy::expect_used)]
static ACTION_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(like|retweet|quote|reply)\]").expect("valid action token regex")
});

/// Engagement actions a model asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFlags {
    pub like: bool,
    pub retweet: bool,
    pub quote: bool,
    pub reply: bool,
}

impl ActionFlags {
    #[must_use]
    pub fn any(self) -> bool {
        self.like || self.retweet || self.quote || self.reply
    }

    fn set(&mut self, token: &str) {
        match token.to_ascii_lowercase().as_str() {
            "like" => self.like = true,
            "retweet" => self.retweet = true,
            "quote" => self.quote = true,
            "reply" => self.reply = true,
            _ => {},
        }
    }
}

impl BitOr for ActionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            like: self.like || rhs.like,
            retweet: self.retweet || rhs.retweet,
            quote: self.quote || rhs.quote,
            reply: self.reply || rhs.reply,
        }
    }
}

/// Bracketed tokens anywhere in the text, any case.
fn scan_tokens(text: &str) -> ActionFlags {
    let mut flags = ActionFlags::default();
    for caps in ACTION_TOKEN_RE.captures_iter(text) {
        flags.set(&caps[1]);
    }
    flags
}

/// Lines that consist of exactly one token once trimmed.
fn scan_lines(text: &str) -> ActionFlags {
    let mut flags = ActionFlags::default();
    for line in text.lines().map(str::trim) {
        match line {
            "[LIKE]" => flags.like = true,
            "[RETWEET]" => flags.retweet = true,
            "[QUOTE]" => flags.quote = true,
            "[REPLY]" => flags.reply = true,
            _ => {},
        }
    }
    flags
}

/// Read `[LIKE]`, `[RETWEET]`, `[QUOTE]` and `[REPLY]` markers out of model
/// output. Unrecognized text is ignored, so this never fails.
#[must_use]
pub fn parse_action_response(text: &str) -> ActionFlags {
    scan_tokens(text) | scan_lines(text)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn flags(like: bool, retweet: bool, quote: bool, reply: bool) -> ActionFlags {
        ActionFlags {
            like,
            retweet,
            quote,
            reply,
        }
    }

    #[rstest]
    #[case("[LIKE]\nsome text\n[REPLY]", flags(true, false, false, true))]
    #[case("I'd [like] this and [Retweet] it", flags(true, true, false, false))]
    #[case("  [QUOTE]  ", flags(false, false, true, false))]
    #[case("[LIKE][RETWEET][QUOTE][REPLY]", flags(true, true, true, true))]
    #[case("nothing to do here", ActionFlags::default())]
    #[case("[LIKES] [re tweet] LIKE", ActionFlags::default())]
    #[case("", ActionFlags::default())]
    fn parses_actions(#[case] input: &str, #[case] expected: ActionFlags) {
        assert_eq!(parse_action_response(input), expected);
    }

    #[test]
    fn passes_are_merged() {
        let text = "[REPLY]\nthen [like]";
        assert_eq!(scan_lines(text), flags(false, false, false, true));
        assert_eq!(scan_tokens(text), flags(true, false, false, true));
        assert_eq!(parse_action_response(text), flags(true, false, false, true));
    }

    #[test]
    fn any_reports_requested_actions() {
        assert!(!ActionFlags::default().any());
        assert!(flags(false, false, true, false).any());
    }

    #[test]
    fn serializes_as_object() {
        let json = serde_json::to_value(flags(true, false, false, true)).unwrap_or_default();
        assert_eq!(json["like"], true);
        assert_eq!(json["reply"], true);
        assert_eq!(json["quote"], false);
    }
}
