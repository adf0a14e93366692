use super::{describe, Parser};
use crate::ast::{BinaryOp, Expr, ExprKind, Property, UnaryOp};
use crate::error::EvalError;
use crate::lexer::Token;

/// Keywords that introduce constructs the DSL never accepts.
const REJECTED_KEYWORDS: &[&str] = &[
    "new", "function", "class", "import", "async", "await", "yield", "delete", "void",
];

impl<'a> Parser<'a> {
    // -- Entry ----------------------------------------------------

    pub(super) fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let e = if self.arrow_ahead() {
            self.parse_arrow()
        } else {
            self.parse_conditional()
        };
        self.leave();
        e
    }

    /// True if the tokens at the cursor begin an arrow function.
    fn arrow_ahead(&self) -> bool {
        match self.peek() {
            Token::Word(_) => self.peek_at(1) == &Token::Arrow,
            Token::LParen => {
                let mut depth = 0usize;
                let mut offset = 0usize;
                loop {
                    match self.peek_at(offset) {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_at(offset + 1) == &Token::Arrow;
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> Result<Expr, EvalError> {
        let line = self.cur_line();
        let mut params = Vec::new();
        if self.peek() == &Token::LParen {
            self.advance();
            while self.peek() != &Token::RParen {
                params.push(self.take_word()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(Token::RParen, ")")?;
        } else {
            params.push(self.take_word()?);
        }
        self.expect(Token::Arrow, "=>")?;
        if self.peek() == &Token::LBrace {
            return Err(self.err("block-bodied arrow functions are not supported"));
        }
        let body = self.parse_expr()?;
        Ok(Expr::new(
            ExprKind::Arrow {
                params,
                body: Box::new(body),
            },
            line,
        ))
    }

    // -- Operators --------------------------------------------------

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        let test = self.parse_binary(0)?;
        if self.peek() != &Token::Question {
            return Ok(test);
        }
        let line = self.cur_line();
        self.advance();
        let consequent = self.parse_expr()?;
        self.expect(Token::Colon, ":")?;
        let alternate = self.parse_expr()?;
        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            line,
        ))
    }

    /// Precedence climbing over the binary operator table. Each operator
    /// in a left-associative run deepens the tree by one, so each one
    /// takes a nesting level until the run ends.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, EvalError> {
        let left = self.parse_unary()?;
        let mut links = 0;
        let result = self.parse_binary_run(left, min_prec, &mut links);
        self.depth -= links;
        result
    }

    fn parse_binary_run(
        &mut self,
        mut left: Expr,
        min_prec: u8,
        links: &mut usize,
    ) -> Result<Expr, EvalError> {
        while let Some((op, prec)) = binary_op(self.peek()) {
            if prec < min_prec {
                break;
            }
            *links += 1;
            self.enter()?;
            let line = self.cur_line();
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Bang => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Neg),
            Token::Plus => Some(UnaryOp::Plus),
            Token::Word(w) if w == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        let line = self.cur_line();
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand?),
            },
            line,
        ))
    }

    // -- Member access and calls --------------------------------------

    /// Member, index and call chains are built in a loop, one tree level
    /// per link; every link holds a nesting level until the chain ends.
    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let head = self.parse_primary()?;
        let mut links = 0;
        let result = self.parse_chain(head, &mut links);
        self.depth -= links;
        result
    }

    fn parse_chain(&mut self, mut e: Expr, links: &mut usize) -> Result<Expr, EvalError> {
        loop {
            let line = self.cur_line();
            if !matches!(
                self.peek(),
                Token::Dot | Token::QuestionDot | Token::LBracket | Token::LParen
            ) {
                return Ok(e);
            }
            *links += 1;
            self.enter()?;
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let property = self.take_word()?;
                    e = member(e, property, false, line);
                }
                Token::QuestionDot => {
                    self.advance();
                    match self.peek() {
                        Token::LBracket => {
                            self.advance();
                            let index = self.parse_expr()?;
                            self.expect(Token::RBracket, "]")?;
                            e = index_of(e, index, true, line);
                        }
                        Token::LParen => {
                            let args = self.parse_args()?;
                            e = call(e, args, line);
                        }
                        _ => {
                            let property = self.take_word()?;
                            e = member(e, property, true, line);
                        }
                    }
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket, "]")?;
                    e = index_of(e, index, false, line);
                }
                Token::LParen => {
                    let args = self.parse_args()?;
                    e = call(e, args, line);
                }
                _ => return Ok(e),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        self.expect(Token::LParen, "(")?;
        let mut args = Vec::new();
        while self.peek() != &Token::RParen {
            args.push(self.parse_expr()?);
            if self.peek() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(args)
    }

    // -- Primary expressions ------------------------------------------

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let line = self.cur_line();
        let kind = match self.peek().clone() {
            Token::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            Token::Float(f) => {
                self.advance();
                ExprKind::Float(f)
            }
            Token::Str(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            Token::Regex { pattern, flags } => {
                self.advance();
                ExprKind::Regex { pattern, flags }
            }
            Token::Word(w) => {
                if REJECTED_KEYWORDS.contains(&w.as_str()) {
                    return Err(EvalError::unsafe_operation(line, w));
                }
                self.advance();
                match w.as_str() {
                    "true" => ExprKind::Bool(true),
                    "false" => ExprKind::Bool(false),
                    "null" => ExprKind::Null,
                    _ => ExprKind::Ident(w),
                }
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, ")")?;
                return Ok(inner);
            }
            Token::LBracket => return self.parse_array_literal(),
            Token::LBrace => return self.parse_object_literal(),
            other => {
                return Err(self.err(format!("unexpected {}", describe(&other))));
            }
        };
        Ok(Expr::new(kind, line))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, EvalError> {
        let line = self.cur_line();
        self.expect(Token::LBracket, "[")?;
        let mut items = Vec::new();
        while self.peek() != &Token::RBracket {
            items.push(self.parse_expr()?);
            if self.peek() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RBracket, "]")?;
        Ok(Expr::new(ExprKind::Array(items), line))
    }

    /// Object literal. Entries may be separated by `,` or `;` and a trailing
    /// separator is allowed. Keys are identifiers, strings or integers.
    fn parse_object_literal(&mut self) -> Result<Expr, EvalError> {
        let line = self.cur_line();
        self.expect(Token::LBrace, "{")?;
        let mut props = Vec::new();
        while self.peek() != &Token::RBrace {
            let key_line = self.cur_line();
            let key = match self.peek().clone() {
                Token::Word(w) => w,
                Token::Str(s) => s,
                Token::Int(n) => n.to_string(),
                Token::LBracket => {
                    return Err(self.err("computed object keys are not supported"));
                }
                other => {
                    return Err(self.err(format!(
                        "expected property name, got {}",
                        describe(&other)
                    )));
                }
            };
            self.advance();
            self.expect(Token::Colon, ":")?;
            let value = self.parse_expr()?;
            props.push(Property {
                key,
                value,
                line: key_line,
            });
            if matches!(self.peek(), Token::Comma | Token::Semi) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RBrace, "}")?;
        Ok(Expr::new(ExprKind::Object(props), line))
    }
}

/// Binary operators with their binding power; higher binds tighter.
fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    let entry = match token {
        Token::Nullish => (BinaryOp::Nullish, 1),
        Token::OrOr => (BinaryOp::Or, 2),
        Token::AndAnd => (BinaryOp::And, 3),
        Token::EqEq => (BinaryOp::Eq, 4),
        Token::NotEq => (BinaryOp::NotEq, 4),
        Token::Lt => (BinaryOp::Lt, 5),
        Token::Lte => (BinaryOp::Lte, 5),
        Token::Gt => (BinaryOp::Gt, 5),
        Token::Gte => (BinaryOp::Gte, 5),
        Token::Plus => (BinaryOp::Add, 6),
        Token::Minus => (BinaryOp::Sub, 6),
        Token::Star => (BinaryOp::Mul, 7),
        Token::Slash => (BinaryOp::Div, 7),
        Token::Percent => (BinaryOp::Rem, 7),
        _ => return None,
    };
    Some(entry)
}

fn member(object: Expr, property: String, optional: bool, line: u32) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        line,
    )
}

fn index_of(object: Expr, index: Expr, optional: bool, line: u32) -> Expr {
    Expr::new(
        ExprKind::Index {
            object: Box::new(object),
            index: Box::new(index),
            optional,
        },
        line,
    )
}

fn call(callee: Expr, args: Vec<Expr>, line: u32) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
        },
        line,
    )
}
