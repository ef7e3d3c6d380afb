//! Resource pattern matching.
//!
//! Patterns follow CDN signed-cookie wildcard rules: `*` matches zero or
//! more characters and `?` matches exactly one. There is no escaping.
//!
//! The resource being requested may itself be a pattern (a gateway may ask
//! "is `/api/v1/*` allowed?"). [`covers`] answers that question
//! conservatively: it returns `true` only if every concrete resource the
//! requested pattern can match is also matched by the policy pattern.

/// One unit of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyMany,
}

impl Token {
    /// Whether a single-width pattern token can stand in for `other`.
    ///
    /// `AnyMany` is handled by the matcher, not here.
    fn absorbs(self, other: Token) -> bool {
        match (self, other) {
            (Token::Literal(a), Token::Literal(b)) => a == b,
            (Token::AnyOne, Token::Literal(_) | Token::AnyOne) => true,
            _ => false,
        }
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    pattern
        .chars()
        .map(|c| match c {
            '*' => Token::AnyMany,
            '?' => Token::AnyOne,
            other => Token::Literal(other),
        })
        .collect()
}

/// Returns `true` if `pattern` covers `required`.
///
/// # Examples
///
/// ```
/// use cookiegate_authn::resource::covers;
///
/// assert!(covers("/api/*", "/api/chat"));
/// assert!(covers("/api/*", "/api/v1/*"));
/// assert!(covers("wss://agent.example.com/dev*", "wss://agent.example.com/dev"));
/// assert!(!covers("/api/*", "/admin/*"));
/// assert!(!covers("/api/?", "/api/*"));
/// ```
#[must_use]
pub fn covers(pattern: &str, required: &str) -> bool {
    let pattern = tokenize(pattern);
    let required = tokenize(required);

    let mut p = 0;
    let mut r = 0;
    // Most recent `*` in the pattern and the required position it resumes from.
    let mut backtrack: Option<(usize, usize)> = None;

    while r < required.len() {
        match pattern.get(p) {
            Some(Token::AnyMany) => {
                backtrack = Some((p, r));
                p += 1;
            },
            Some(token) if token.absorbs(required[r]) => {
                p += 1;
                r += 1;
            },
            _ => match backtrack {
                Some((star, resume)) => {
                    p = star + 1;
                    r = resume + 1;
                    backtrack = Some((star, resume + 1));
                },
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|token| *token == Token::AnyMany)
}
