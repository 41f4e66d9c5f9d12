//! Minimal PGN reader.
//!
//! Splits a collection into games, reads the tag pairs and flattens the
//! movetext into short algebraic tokens. Comments, variations, NAGs, move
//! numbers and the result marker are dropped, not interpreted.

/// One game of a collection, before any token is checked against a board
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PgnGame {
    /// Tag pairs in file order
    pub tags: Vec<(String, String)>,
    /// Main-line tokens such as `e4`, `Nf3`, `O-O`
    pub moves: Vec<String>,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Split a PGN collection into games.
///
/// A game starts at its first tag line, or at movetext when no tags precede
/// it. Games without tags or moves are skipped.
pub fn parse_collection(text: &str) -> Vec<PgnGame> {
    let mut games = Vec::new();
    let mut tags = Vec::new();
    let mut movetext = String::new();

    let mut flush = |tags: &mut Vec<(String, String)>, movetext: &mut String| {
        let game = PgnGame {
            tags: std::mem::take(tags),
            moves: split_movetext(movetext),
        };
        movetext.clear();
        if !game.tags.is_empty() || !game.moves.is_empty() {
            games.push(game);
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('%') {
            continue;
        }
        match parse_tag(line) {
            Some(tag) => {
                if !movetext.trim().is_empty() {
                    flush(&mut tags, &mut movetext);
                }
                tags.push(tag);
            }
            None => {
                movetext.push_str(line);
                movetext.push('\n');
                if ends_with_result(line) {
                    flush(&mut tags, &mut movetext);
                }
            }
        }
    }
    flush(&mut tags, &mut movetext);
    games
}

/// `[Name "value"]`, with `\"` and `\\` escapes inside the value
fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    let (name, rest) = inner.split_once(char::is_whitespace)?;
    let quoted = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.extend(chars.next()),
            c => value.push(c),
        }
    }
    Some((name.to_string(), value))
}

fn ends_with_result(line: &str) -> bool {
    line.split_whitespace()
        .last()
        .is_some_and(|last| RESULTS.contains(&last))
}

/// Main-line tokens of a movetext section
pub fn split_movetext(movetext: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = movetext.chars();

    let push = |current: &mut String, tokens: &mut Vec<String>| {
        if let Some(token) = clean_token(current) {
            tokens.push(token);
        }
        current.clear();
    };

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                push(&mut current, &mut tokens);
                chars.by_ref().find(|&c| c == '}');
            }
            ';' => {
                push(&mut current, &mut tokens);
                chars.by_ref().find(|&c| c == '\n');
            }
            '(' => {
                push(&mut current, &mut tokens);
                depth += 1;
            }
            ')' => {
                current.clear();
                depth = depth.saturating_sub(1);
            }
            _ if depth > 0 => {}
            c if c.is_whitespace() => push(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    push(&mut current, &mut tokens);
    tokens
}

/// Strip move numbers and glyphs; `None` for tokens that are not moves
fn clean_token(raw: &str) -> Option<String> {
    if raw.is_empty() || raw.starts_with('$') || RESULTS.contains(&raw) {
        return None;
    }
    // "12." "12..." and "12.e4"
    let token = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(i) if i > 0 && raw[i..].starts_with('.') => raw[i..].trim_start_matches('.'),
        None => return None,
        _ => raw,
    };
    let token = token.trim_end_matches(['!', '?']);
    if token.is_empty() || RESULTS.contains(&token) {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GAMES: &str = r#"[Event "Casual"]
[Site "Berlin"]
[White "Anderssen, A."]
[Black "Dufresne, J."]
[Result "1-0"]

1. e4 e5 2. Nf3 {the usual} Nc6 (2... d6 3. d4) 3. Bb5 $1 a6 1-0

[Event "Second"]
[Result "*"]

1.d4 d5 2.c4?! ; queen's gambit
dxc4 *
"#;

    #[test]
    fn test_split_collection() {
        let games = parse_collection(TWO_GAMES);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tag("White"), Some("Anderssen, A."));
        assert_eq!(games[0].tag("Result"), Some("1-0"));
        assert_eq!(games[0].moves, ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(games[1].tag("Event"), Some("Second"));
        assert_eq!(games[1].moves, ["d4", "d5", "c4", "dxc4"]);
    }

    #[test]
    fn test_movetext_only() {
        let games = parse_collection("1. e4 c5 2. Nf3 *");
        assert_eq!(games.len(), 1);
        assert!(games[0].tags.is_empty());
        assert_eq!(games[0].moves, ["e4", "c5", "Nf3"]);
    }

    #[test]
    fn test_black_move_numbers_and_nested_variations() {
        let moves =
            split_movetext("12... Qxe7+ (12... Kf8 (12... Kd8 13. Qd1) 13. Bh6) 13. O-O-O#");
        assert_eq!(moves, ["Qxe7+", "O-O-O#"]);
    }

    #[test]
    fn test_tag_escapes() {
        assert_eq!(
            parse_tag(r#"[Annotator "A \"quoted\" name"]"#),
            Some(("Annotator".to_string(), "A \"quoted\" name".to_string()))
        );
        assert_eq!(parse_tag("1. e4"), None);
    }
}
