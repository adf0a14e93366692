/// Recursive-descent parser for schema DSL text.
///
/// Accepts a single expression (optionally followed by `;`) drawn from a
/// small JavaScript subset: literals, array and object literals, member
/// access, calls, expression-bodied arrows and the usual operators. No
/// statements, assignments or `new`. Nesting is bounded by `max_depth`.
use crate::ast::Expr;
use crate::error::EvalError;
use crate::lexer::{Spanned, Token};

mod expressions;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], max_depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn cur_line(&self) -> u32 {
        self.cur().line
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: Token, shown: &str) -> Result<(), EvalError> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}', got {}", shown, describe(self.peek()))))
        }
    }

    fn err(&self, msg: impl Into<String>) -> EvalError {
        EvalError::syntax(self.cur_line(), msg)
    }

    fn take_word(&mut self) -> Result<String, EvalError> {
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!("expected identifier, got {}", describe(self.peek()))))
        }
    }

    /// Enter one nesting level; fails once the ceiling is passed.
    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::ComplexityExceeded {
                detail: format!("nesting deeper than {} levels", self.max_depth),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(w) => format!("'{}'", w),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Float(f) => format!("number {}", f),
        Token::Regex { pattern, .. } => format!("regex /{}/", pattern),
        Token::Eof => "end of input".to_owned(),
        other => format!("{:?}", other),
    }
}

/// Parse a token stream into one expression.
pub fn parse(tokens: &[Spanned], max_depth: usize) -> Result<Expr, EvalError> {
    let mut p = Parser::new(tokens, max_depth);
    if p.peek() == &Token::Eof {
        return Err(p.err("schema text is empty"));
    }
    let expr = p.parse_expr()?;
    while p.peek() == &Token::Semi {
        p.advance();
    }
    if p.peek() != &Token::Eof {
        return Err(p.err(format!(
            "unexpected {} after expression",
            describe(p.peek())
        )));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, ExprKind};
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Result<Expr, EvalError> {
        parse(&lex(src)?, 64)
    }

    #[test]
    fn parses_member_call_chain() {
        let e = parse_src("z.string().optional()").unwrap();
        let ExprKind::Call { callee, args } = e.kind else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        let ExprKind::Member { property, .. } = callee.kind else {
            panic!("expected member");
        };
        assert_eq!(property, "optional");
    }

    #[test]
    fn object_literal_accepts_commas_and_semicolons() {
        let e = parse_src("{ a: 1; b: 'x', 'c-d': true, }").unwrap();
        let ExprKind::Object(props) = e.kind else {
            panic!("expected object");
        };
        let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c-d"]);
    }

    #[test]
    fn arrow_with_parenthesized_and_bare_params() {
        let e = parse_src("(a, b) => a > b").unwrap();
        let ExprKind::Arrow { params, body } = e.kind else {
            panic!("expected arrow");
        };
        assert_eq!(params, vec!["a", "b"]);
        assert!(matches!(body.kind, ExprKind::Binary { op: BinaryOp::Gt, .. }));

        let e = parse_src("val => val.length").unwrap();
        assert!(matches!(e.kind, ExprKind::Arrow { .. }));
    }

    #[test]
    fn block_bodied_arrow_is_rejected() {
        let err = parse_src("(v) => { return v }").unwrap_err();
        assert!(err.to_string().contains("block-bodied"));
    }

    #[test]
    fn operator_precedence() {
        let e = parse_src("a || b && c").unwrap();
        let ExprKind::Binary { op, right, .. } = e.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let err = parse_src("z.string() z.number()").unwrap_err();
        assert!(err.to_string().contains("after expression"));
        assert!(parse_src("z.string();").is_ok());
    }

    #[test]
    fn new_and_function_keywords_are_unsafe() {
        let err = parse_src("new Function('x')").unwrap_err();
        assert_eq!(
            err,
            EvalError::UnsafeOperation {
                line: 1,
                name: "new".into()
            }
        );
        assert!(parse_src("function () { }").is_err());
    }

    #[test]
    fn nesting_beyond_limit_is_complexity_error() {
        let src = format!("{}1{}", "[".repeat(100), "]".repeat(100));
        let err = parse_src(&src).unwrap_err();
        assert!(matches!(err, EvalError::ComplexityExceeded { .. }));
    }

    #[test]
    fn empty_input_is_syntax_error() {
        assert!(matches!(
            parse_src("  // nothing\n").unwrap_err(),
            EvalError::Syntax { .. }
        ));
    }
}
