use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords; the parser tells them apart
    Word(String),
    /// Quoted or backtick string literal (content without quotes, escapes resolved)
    Str(String),
    /// Integer literal
    Int(i64),
    /// Non-integral or out-of-range numeric literal
    Float(f64),
    /// Regular expression literal, kept verbatim
    Regex { pattern: String, flags: String },
    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semi,
    Comma,
    Dot,
    QuestionDot, // ?.
    Question,
    Arrow, // =>
    // Operators (only meaningful inside refinement bodies)
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Lte,
    Gt,
    Gte,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Nullish, // ??
    // End of input
    Eof,
}

impl Token {
    /// True when the token can end an operand, which makes a following `/`
    /// a division rather than the start of a regex literal.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Word(_)
                | Token::Str(_)
                | Token::Int(_)
                | Token::Float(_)
                | Token::Regex { .. }
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
        )
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let mut tokens: Vec<Spanned> = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];
        let next = chars.get(pos + 1).copied();

        // Line comment
        if c == '/' && next == Some('/') {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && next == Some('*') {
            pos += 2;
            loop {
                if pos >= chars.len() {
                    return Err(EvalError::syntax(line, "unterminated block comment"));
                }
                if chars[pos] == '\n' {
                    line += 1;
                }
                if chars[pos] == '*' && chars.get(pos + 1) == Some(&'/') {
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            continue;
        }

        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;

        // String literals
        if c == '"' || c == '\'' || c == '`' {
            let (s, end) = lex_string(&chars, pos, c, tok_line)?;
            line += chars[pos..end].iter().filter(|ch| **ch == '\n').count() as u32;
            pos = end;
            tokens.push(Spanned {
                token: Token::Str(s),
                line: tok_line,
            });
            continue;
        }

        // Number
        if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            let (token, end) = lex_number(&chars, pos, tok_line)?;
            pos = end;
            tokens.push(Spanned {
                token,
                line: tok_line,
            });
            continue;
        }

        // Regex literal, only where an operand is expected
        if c == '/' && !tokens.last().is_some_and(|t| t.token.ends_operand()) {
            let (token, end) = lex_regex(&chars, pos, tok_line)?;
            pos = end;
            tokens.push(Spanned {
                token,
                line: tok_line,
            });
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Word(word),
                line: tok_line,
            });
            continue;
        }

        let next2 = chars.get(pos + 2).copied();
        let (token, width) = match (c, next, next2) {
            ('.', Some('.'), Some('.')) => {
                return Err(EvalError::syntax(tok_line, "spread syntax is not supported"));
            }
            ('=', Some('='), Some('=')) => (Token::EqEq, 3),
            ('!', Some('='), Some('=')) => (Token::NotEq, 3),
            ('=', Some('='), _) => (Token::EqEq, 2),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('=', Some('>'), _) => (Token::Arrow, 2),
            ('=', _, _) => {
                return Err(EvalError::syntax(tok_line, "assignment is not allowed"));
            }
            ('?', Some('.'), n) if !n.is_some_and(|d| d.is_ascii_digit()) => {
                (Token::QuestionDot, 2)
            }
            ('?', Some('?'), _) => (Token::Nullish, 2),
            ('?', _, _) => (Token::Question, 1),
            ('&', Some('&'), _) => (Token::AndAnd, 2),
            ('|', Some('|'), _) => (Token::OrOr, 2),
            ('<', Some('='), _) => (Token::Lte, 2),
            ('>', Some('='), _) => (Token::Gte, 2),
            ('+', Some('+'), _) | ('-', Some('-'), _) => {
                return Err(EvalError::syntax(
                    tok_line,
                    "increment and decrement operators are not allowed",
                ));
            }
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            ('!', _, _) => (Token::Bang, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('{', _, _) => (Token::LBrace, 1),
            ('}', _, _) => (Token::RBrace, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            (':', _, _) => (Token::Colon, 1),
            (';', _, _) => (Token::Semi, 1),
            (',', _, _) => (Token::Comma, 1),
            ('.', _, _) => (Token::Dot, 1),
            _ => {
                return Err(EvalError::syntax(
                    tok_line,
                    format!("unexpected character '{}'", c),
                ));
            }
        };
        tokens.push(Spanned {
            token,
            line: tok_line,
        });
        pos += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

/// Lex a quoted string starting at `start` (the opening quote). Returns the
/// unescaped content and the position just past the closing quote.
fn lex_string(
    chars: &[char],
    start: usize,
    quote: char,
    line: u32,
) -> Result<(String, usize), EvalError> {
    let mut pos = start + 1;
    let mut s = String::new();
    loop {
        let Some(&sc) = chars.get(pos) else {
            return Err(EvalError::syntax(line, "unterminated string literal"));
        };
        if sc == quote {
            return Ok((s, pos + 1));
        }
        if sc == '\n' && quote != '`' {
            return Err(EvalError::syntax(line, "unterminated string literal"));
        }
        if quote == '`' && sc == '$' && chars.get(pos + 1) == Some(&'{') {
            return Err(EvalError::syntax(
                line,
                "template literal interpolation is not supported",
            ));
        }
        if sc == '\\' {
            pos += 1;
            let Some(&esc) = chars.get(pos) else {
                return Err(EvalError::syntax(line, "unterminated escape in string"));
            };
            match esc {
                'n' => s.push('\n'),
                't' => s.push('\t'),
                'r' => s.push('\r'),
                'b' => s.push('\u{8}'),
                'f' => s.push('\u{c}'),
                'v' => s.push('\u{b}'),
                '0' => s.push('\0'),
                'u' => {
                    let hex: String = chars.get(pos + 1..pos + 5).unwrap_or(&[]).iter().collect();
                    let ch = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| EvalError::syntax(line, "invalid unicode escape"))?;
                    s.push(ch);
                    pos += 4;
                }
                '\n' => {}
                other => s.push(other),
            }
            pos += 1;
            continue;
        }
        s.push(sc);
        pos += 1;
    }
}

fn lex_number(chars: &[char], start: usize, line: u32) -> Result<(Token, usize), EvalError> {
    let mut pos = start;
    let digits = |pos: &mut usize| {
        while *pos < chars.len() && (chars[*pos].is_ascii_digit() || chars[*pos] == '_') {
            *pos += 1;
        }
    };
    digits(&mut pos);
    let mut integral = true;
    if chars.get(pos) == Some(&'.') && chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit()) {
        integral = false;
        pos += 1;
        digits(&mut pos);
    }
    if matches!(chars.get(pos), Some('e') | Some('E')) {
        let mut p = pos + 1;
        if matches!(chars.get(p), Some('+') | Some('-')) {
            p += 1;
        }
        if chars.get(p).is_some_and(|c| c.is_ascii_digit()) {
            integral = false;
            pos = p;
            digits(&mut pos);
        }
    }
    if chars.get(pos).is_some_and(|c| c.is_alphabetic()) {
        return Err(EvalError::syntax(line, "invalid numeric literal"));
    }
    let text: String = chars[start..pos].iter().filter(|c| **c != '_').collect();
    if integral {
        if let Ok(n) = text.parse::<i64>() {
            return Ok((Token::Int(n), pos));
        }
    }
    let f: f64 = text
        .parse()
        .map_err(|_| EvalError::syntax(line, format!("invalid number '{}'", text)))?;
    Ok((Token::Float(f), pos))
}

fn lex_regex(chars: &[char], start: usize, line: u32) -> Result<(Token, usize), EvalError> {
    let mut pos = start + 1;
    let mut pattern = String::new();
    let mut in_class = false;
    loop {
        let Some(&c) = chars.get(pos) else {
            return Err(EvalError::syntax(line, "unterminated regular expression"));
        };
        match c {
            '\n' => return Err(EvalError::syntax(line, "unterminated regular expression")),
            '\\' => {
                pattern.push(c);
                pos += 1;
                if let Some(&escaped) = chars.get(pos) {
                    pattern.push(escaped);
                }
            }
            '[' => {
                in_class = true;
                pattern.push(c);
            }
            ']' => {
                in_class = false;
                pattern.push(c);
            }
            '/' if !in_class => break,
            _ => pattern.push(c),
        }
        pos += 1;
    }
    pos += 1;
    let flags_start = pos;
    while pos < chars.len() && chars[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    let flags: String = chars[flags_start..pos].iter().collect();
    Ok((Token::Regex { pattern, flags }, pos))
}
