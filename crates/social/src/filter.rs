/// Spam heuristic for inbound messages: at most one hashtag, two mentions
/// and one cashtag, with no more than three of those markers overall.
#[must_use]
pub fn is_valid_message(text: &str) -> bool {
    let count = |marker: char| text.chars().filter(|&c| c == marker).count();
    let hashtags = count('#');
    let mentions = count('@');
    let cashtags = count('$');

    hashtags <= 1 && mentions <= 2 && cashtags <= 1 && hashtags + mentions + cashtags <= 3
}
