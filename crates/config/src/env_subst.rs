/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders.
///
/// Unresolvable variables without a default are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with a custom lookup, so tests never touch the
/// process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated, emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let expr = &after[..end];
        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };

        match (name.is_empty(), lookup(name), default) {
            (false, Some(value), _) => result.push_str(&value),
            (false, None, Some(default)) => result.push_str(default),
            _ => {
                result.push_str("${");
                result.push_str(expr);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn lookup(name: &str) -> Option<String> {
        match name {
            "THREADLINE_USER" => Some("bot".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[rstest]
    #[case("username = \"${THREADLINE_USER}\"", "username = \"bot\"")]
    #[case("${MISSING}", "${MISSING}")]
    #[case("${MISSING:-fallback}", "fallback")]
    #[case("${THREADLINE_USER:-fallback}", "bot")]
    #[case("${EMPTY:-fallback}", "")]
    #[case("a ${THREADLINE_USER} b ${THREADLINE_USER}", "a bot b bot")]
    #[case("${}", "${}")]
    #[case("tail ${UNCLOSED", "tail ${UNCLOSED")]
    #[case("no placeholders", "no placeholders")]
    fn substitution(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(substitute_env_with(input, lookup), expected);
    }
}
