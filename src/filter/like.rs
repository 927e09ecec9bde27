// LIKE Pattern Matching
//
// SQL-style wildcards: `%` matches any run of characters and `_` matches
// exactly one character. Every other character, backslash included, is literal.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Literal(char),
}

fn compile(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for c in pattern.chars() {
        let token = match c {
            '%' => Token::Any,
            '_' => Token::One,
            other => Token::Literal(other),
        };
        // collapse runs of `%`
        if token == Token::Any && tokens.last() == Some(&Token::Any) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    }
}

/// Match `text` against a LIKE pattern
pub fn like_matches(pattern: &str, text: &str, case_sensitive: bool) -> bool {
    let pattern = compile(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // last `%` seen and the text position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Token::One) => {
                p += 1;
                t += 1;
            }
            Some(Token::Literal(c)) if chars_equal(*c, text[t], case_sensitive) => {
                p += 1;
                t += 1;
            }
            Some(Token::Any) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p.min(pattern.len())..]
        .iter()
        .all(|token| *token == Token::Any)
}
