/// Turns the free-text mentions field of a rule into Discord mention syntax.
///
/// Tokens are separated by whitespace or commas. Purely numeric tokens become
/// role mentions (`<@&id>`), `@here` and `@everyone` pass through, anything
/// else is dropped. Returns `None` when nothing usable remains.
pub fn parse_mentions(raw: &str) -> Option<String> {
    let mut mentions: Vec<String> = Vec::new();
    for token in raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let mention = match token {
            "@here" | "@everyone" => token.to_string(),
            t if t.bytes().all(|b| b.is_ascii_digit()) => format!("<@&{t}>"),
            _ => continue,
        };
        if !mentions.contains(&mention) {
            mentions.push(mention);
        }
    }

    if mentions.is_empty() {
        None
    } else {
        Some(mentions.join(" "))
    }
}
