//! Recursive-descent parser and AST for expressions.

use crate::error::{ExprError, Location, RestrictionRule};

use super::lexer::{syntax_error, Token, TokenKind};

/// Expression AST node with the byte span it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Byte offset of the first token.
    pub pos: usize,
    /// Byte offset just past the last token.
    pub end: usize,
    height: usize,
}

impl Expr {
    /// Source location of this node within `source`.
    pub fn location(&self, source: &str) -> Location {
        Location::at(source, self.pos)
    }

    /// Number of nodes on the longest path from this node to a leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Direct sub-expressions in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Identifier(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => vec![test.as_ref(), consequent.as_ref(), alternate.as_ref()],
            ExprKind::Call { callee, args } => {
                let mut out = vec![callee.as_ref()];
                out.extend(args.iter());
                out
            }
            ExprKind::Member { object, property } => match property {
                Property::Named(_) => vec![object.as_ref()],
                Property::Computed(p) => vec![object.as_ref(), p.as_ref()],
            },
            ExprKind::Array(items) => items.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number literal.
    Number(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Bool(bool),
    /// Null literal.
    Null,
    /// Bare identifier (`foo`, `$`, `$days`).
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Short-circuiting `&&` / `||`.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `test ? consequent : alternate`.
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.name` or `object[expr]`.
    Member {
        object: Box<Expr>,
        property: Property,
    },
    /// `[a, b, c]`.
    Array(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `.name`
    Named(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

impl Property {
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
    /// `typeof x`; parsed only so it can be rejected.
    TypeOf,
    /// `void x`; parsed only so it can be rejected.
    Void,
    /// `delete x`; parsed only so it can be rejected.
    Delete,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "~",
            Self::TypeOf => "typeof ",
            Self::Void => "void ",
            Self::Delete => "delete ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    /// `in`; parsed only so it can be rejected.
    In,
    /// `instanceof`; parsed only so it can be rejected.
    InstanceOf,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::UShr => ">>>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::In => "in",
            Self::InstanceOf => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Parses a token stream into exactly one expression.
pub fn parse(input: &str, tokens: &[Token], max_depth: usize) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.parse_expression()?;
    match parser.current().kind {
        TokenKind::Eof => Ok(expr),
        TokenKind::Comma => Err(parser.syntax_error_here(
            "only a single expression is allowed; found ',' after expression",
        )),
        TokenKind::Semicolon => {
            Err(parser.syntax_error_here("statements are not allowed; found ';'"))
        }
        _ => Err(parser.unexpected("after expression")),
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        self.nested(|p| p.parse_conditional())
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let start = self.current().pos;
        let test = self.parse_binary(1)?;
        if self
            .consume_if(|k| matches!(k, TokenKind::Question))
            .is_none()
        {
            return Ok(test);
        }

        let consequent = self.parse_expression()?;
        self.expect(
            |k| matches!(k, TokenKind::Colon),
            "expected ':' in conditional expression",
        )?;
        let alternate = self.parse_expression()?;
        self.node(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            start,
        )
    }

    /// Precedence climbing over all binary and logical operator levels.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ExprError> {
        let start = self.current().pos;
        let mut left = self.parse_unary()?;
        while let Some((prec, infix)) = self.peek_infix() {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(prec + 1)?;
            let kind = match infix {
                Infix::Binary(op) => ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Infix::Logical(op) => ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
            left = self.node(kind, start)?;
        }
        Ok(left)
    }

    fn peek_infix(&self) -> Option<(u8, Infix)> {
        use BinaryOp as B;
        let infix = match &self.current().kind {
            TokenKind::OrOr => (1, Infix::Logical(LogicalOp::Or)),
            TokenKind::AndAnd => (2, Infix::Logical(LogicalOp::And)),
            TokenKind::Pipe => (3, Infix::Binary(B::BitOr)),
            TokenKind::Caret => (4, Infix::Binary(B::BitXor)),
            TokenKind::Amp => (5, Infix::Binary(B::BitAnd)),
            TokenKind::EqEq => (6, Infix::Binary(B::Eq)),
            TokenKind::NotEq => (6, Infix::Binary(B::NotEq)),
            TokenKind::EqEqEq => (6, Infix::Binary(B::StrictEq)),
            TokenKind::NotEqEq => (6, Infix::Binary(B::StrictNotEq)),
            TokenKind::Lt => (7, Infix::Binary(B::Lt)),
            TokenKind::Lte => (7, Infix::Binary(B::Lte)),
            TokenKind::Gt => (7, Infix::Binary(B::Gt)),
            TokenKind::Gte => (7, Infix::Binary(B::Gte)),
            TokenKind::Ident(name) if name == "in" => (7, Infix::Binary(B::In)),
            TokenKind::Ident(name) if name == "instanceof" => (7, Infix::Binary(B::InstanceOf)),
            TokenKind::Shl => (8, Infix::Binary(B::Shl)),
            TokenKind::Shr => (8, Infix::Binary(B::Shr)),
            TokenKind::UShr => (8, Infix::Binary(B::UShr)),
            TokenKind::Plus => (9, Infix::Binary(B::Add)),
            TokenKind::Minus => (9, Infix::Binary(B::Sub)),
            TokenKind::Star => (10, Infix::Binary(B::Mul)),
            TokenKind::Slash => (10, Infix::Binary(B::Div)),
            TokenKind::Percent => (10, Infix::Binary(B::Mod)),
            _ => return None,
        };
        Some(infix)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let start = self.current().pos;
        let op = match &self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Ident(name) if name == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Ident(name) if name == "void" => Some(UnaryOp::Void),
            TokenKind::Ident(name) if name == "delete" => Some(UnaryOp::Delete),
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                return Err(self.unexpected("at start of operand"));
            }
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.pos += 1;
        let operand = self.nested(|p| p.parse_unary())?;
        self.node(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            start,
        )
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let start = self.current().pos;
        let mut expr = self.parse_primary()?;
        loop {
            if self.consume_if(|k| matches!(k, TokenKind::Dot)).is_some() {
                let name = match &self.current().kind {
                    TokenKind::Ident(v) => v.clone(),
                    TokenKind::Bool(v) => v.to_string(),
                    TokenKind::Null => "null".to_string(),
                    _ => return Err(self.unexpected("after '.'; expected property name")),
                };
                self.pos += 1;
                expr = self.node(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: Property::Named(name),
                    },
                    start,
                )?;
            } else if self
                .consume_if(|k| matches!(k, TokenKind::LBracket))
                .is_some()
            {
                let property = self.parse_expression()?;
                self.expect(
                    |k| matches!(k, TokenKind::RBracket),
                    "expected ']' after computed property",
                )?;
                expr = self.node(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: Property::Computed(Box::new(property)),
                    },
                    start,
                )?;
            } else if self
                .consume_if(|k| matches!(k, TokenKind::LParen))
                .is_some()
            {
                let args = self.parse_list(
                    |k| matches!(k, TokenKind::RParen),
                    "expected ')' after call arguments",
                )?;
                expr = self.node(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    start,
                )?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Number(n) => ExprKind::Number(n),
            TokenKind::String(ref s) => ExprKind::String(s.clone()),
            TokenKind::Bool(v) => ExprKind::Bool(v),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(ref name) if name == "new" => {
                return Err(self.restriction(
                    &token,
                    RestrictionRule::New,
                    "constructor calls with 'new' are not allowed",
                ));
            }
            TokenKind::Ident(ref name) => ExprKind::Identifier(name.clone()),
            TokenKind::LParen => {
                self.pos += 1;
                let mut expr = self.parse_expression()?;
                self.expect(
                    |k| matches!(k, TokenKind::RParen),
                    "expected ')' after expression",
                )?;
                expr.pos = token.pos;
                expr.end = self.previous_end();
                return Ok(expr);
            }
            TokenKind::LBracket => {
                self.pos += 1;
                let elements = self.parse_list(
                    |k| matches!(k, TokenKind::RBracket),
                    "expected ']' after array elements",
                )?;
                return self.node(ExprKind::Array(elements), token.pos);
            }
            TokenKind::Eof => {
                return Err(self.syntax_error_here("unexpected end of expression"));
            }
            _ => return Err(self.unexpected("where an operand was expected")),
        };
        self.pos += 1;
        self.node(kind, token.pos)
    }

    /// Parses comma-separated expressions up to and including the closing token.
    fn parse_list(
        &mut self,
        close: fn(&TokenKind) -> bool,
        message: &str,
    ) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        loop {
            if self.consume_if(close).is_some() {
                return Ok(items);
            }
            items.push(self.parse_expression()?);
            if self.consume_if(|k| matches!(k, TokenKind::Comma)).is_some() {
                continue;
            }
            self.expect(close, message)?;
            return Ok(items);
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            let token = self.current();
            let err = self.depth_error(token.pos, token.end);
            self.depth -= 1;
            return Err(err);
        }
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// Builds a node, rejecting it when the tree would exceed `max_depth`.
    /// Operator and member chains grow the tree without recursing in the
    /// parser, so height is checked here rather than in [`Self::nested`].
    fn node(&self, kind: ExprKind, start: usize) -> Result<Expr, ExprError> {
        let mut expr = Expr {
            kind,
            pos: start,
            end: self.previous_end(),
            height: 1,
        };
        let height = 1 + expr.children().iter().map(|c| c.height).max().unwrap_or(0);
        if height > self.max_depth {
            let last = self.pos.saturating_sub(1);
            let token = &self.tokens[last];
            return Err(self.depth_error(token.pos, token.end));
        }
        expr.height = height;
        Ok(expr)
    }

    fn depth_error(&self, start: usize, end: usize) -> ExprError {
        syntax_error(
            self.input,
            start,
            end,
            format!(
                "expression nesting exceeds maximum depth of {}",
                self.max_depth
            ),
        )
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map(|i| self.tokens[i].end)
            .unwrap_or(0)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn consume_if(&mut self, predicate: fn(&TokenKind) -> bool) -> Option<&Token> {
        if predicate(&self.current().kind) {
            let current = &self.tokens[self.pos];
            self.pos += 1;
            Some(current)
        } else {
            None
        }
    }

    fn expect(
        &mut self,
        predicate: fn(&TokenKind) -> bool,
        message: &str,
    ) -> Result<(), ExprError> {
        if self.consume_if(predicate).is_some() {
            Ok(())
        } else {
            Err(self.unexpected_or(message))
        }
    }

    fn unexpected(&self, context: &str) -> ExprError {
        let token = self.current();
        if matches!(token.kind, TokenKind::Eof) {
            return self.syntax_error_here(format!("unexpected end of expression {context}"));
        }
        self.unexpected_or(&format!(
            "unexpected '{}' {context}",
            &self.input[token.pos..token.end]
        ))
    }

    /// Maps tokens that start a forbidden construct to a restriction error,
    /// anything else to a syntax error with `message`.
    fn unexpected_or(&self, message: &str) -> ExprError {
        let token = self.current();
        let restricted = match &token.kind {
            TokenKind::LBrace => Some((
                RestrictionRule::ObjectLiteral,
                "object literals are not allowed",
            )),
            TokenKind::Ellipsis => Some((RestrictionRule::Spread, "spread syntax is not allowed")),
            TokenKind::Assign(_) => Some((RestrictionRule::Assignment, "assignment is not allowed")),
            TokenKind::PlusPlus | TokenKind::MinusMinus => Some((
                RestrictionRule::Update,
                "increment and decrement are not allowed",
            )),
            TokenKind::Arrow => Some((
                RestrictionRule::ArrowFunction,
                "arrow functions are not allowed",
            )),
            _ => None,
        };
        match restricted {
            Some((rule, text)) => self.restriction(token, rule, text),
            None => self.syntax_error_here(message),
        }
    }

    fn restriction(&self, token: &Token, rule: RestrictionRule, message: &str) -> ExprError {
        ExprError::SyntaxRestriction {
            rule,
            message: message.to_string(),
            location: Location::at(self.input, token.pos),
        }
    }

    fn syntax_error_here(&self, message: impl Into<String>) -> ExprError {
        let token = self.current();
        syntax_error(self.input, token.pos, token.end, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lexer::tokenize;

    fn parse_src(src: &str) -> Result<Expr, ExprError> {
        let tokens = tokenize(src)?;
        parse(src, &tokens, 64)
    }

    fn shape(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Number(n) => n.to_string(),
            ExprKind::String(s) => format!("{s:?}"),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Null => "null".into(),
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::Unary { op, operand } => format!("({}{})", op.symbol(), shape(operand)),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", shape(left), op.symbol(), shape(right))
            }
            ExprKind::Logical { op, left, right } => {
                format!("({} {} {})", shape(left), op.symbol(), shape(right))
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => format!(
                "({} ? {} : {})",
                shape(test),
                shape(consequent),
                shape(alternate)
            ),
            ExprKind::Call { callee, args } => format!(
                "{}({})",
                shape(callee),
                args.iter().map(shape).collect::<Vec<_>>().join(", ")
            ),
            ExprKind::Member { object, property } => match property {
                Property::Named(name) => format!("{}.{name}", shape(object)),
                Property::Computed(p) => format!("{}[{}]", shape(object), shape(p)),
            },
            ExprKind::Array(items) => format!(
                "[{}]",
                items.iter().map(shape).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        assert_eq!(shape(&parse_src("1 + 2 * 3").unwrap()), "(1 + (2 * 3))");
        assert_eq!(
            shape(&parse_src("a || b && c | d ^ e & f").unwrap()),
            "(a || (b && (c | (d ^ (e & f)))))"
        );
        assert_eq!(
            shape(&parse_src("1 << 2 + 3 < 4 == true").unwrap()),
            "(((1 << (2 + 3)) < 4) == true)"
        );
        assert_eq!(shape(&parse_src("-a * !b").unwrap()), "((-a) * (!b))");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(shape(&parse_src("a - b - c").unwrap()), "((a - b) - c)");
    }

    #[test]
    fn conditional_is_right_associative() {
        assert_eq!(
            shape(&parse_src("a ? b : c ? d : e").unwrap()),
            "(a ? b : (c ? d : e))"
        );
    }

    #[test]
    fn parses_call_member_chains() {
        assert_eq!(
            shape(&parse_src("$days($now, $.expiryDate).toFixed(2)").unwrap()),
            "$days($now, $.expiryDate).toFixed(2)"
        );
        assert_eq!(shape(&parse_src("a[b + 1].c()").unwrap()), "a[(b + 1)].c()");
        assert_eq!(shape(&parse_src("[1, 'x', [],]").unwrap()), "[1, \"x\", []]");
    }

    #[test]
    fn node_spans_cover_their_source() {
        let src = "x + (y * 2)";
        let expr = parse_src(src).unwrap();
        let ExprKind::Binary { right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(&src[right.pos..right.end], "(y * 2)");
        assert_eq!((expr.pos, expr.end), (0, src.len()));
    }

    #[test]
    fn parses_disallowed_operators_for_later_rejection() {
        assert!(matches!(
            parse_src("a in b").unwrap().kind,
            ExprKind::Binary {
                op: BinaryOp::In,
                ..
            }
        ));
        assert!(matches!(
            parse_src("typeof a").unwrap().kind,
            ExprKind::Unary {
                op: UnaryOp::TypeOf,
                ..
            }
        ));
    }

    #[test]
    fn rejects_multiple_expressions() {
        let err = parse_src("a, b").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { .. }));
        let err = parse_src("a; b").unwrap_err();
        assert!(err.to_string().contains("statements are not allowed"));
        let err = parse_src("a b").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { ref fragment, .. } if fragment == "b"));
    }

    #[test]
    fn rejects_forbidden_constructs_with_rules() {
        let cases = [
            ("{a: 1}", RestrictionRule::ObjectLiteral),
            ("f({})", RestrictionRule::ObjectLiteral),
            ("f(...xs)", RestrictionRule::Spread),
            ("a = 1", RestrictionRule::Assignment),
            ("a += 1", RestrictionRule::Assignment),
            ("a++", RestrictionRule::Update),
            ("--a", RestrictionRule::Update),
            ("(a) => a", RestrictionRule::ArrowFunction),
            ("new Date()", RestrictionRule::New),
        ];
        for (src, expected) in cases {
            match parse_src(src) {
                Err(ExprError::SyntaxRestriction { rule, .. }) => {
                    assert_eq!(rule, expected, "source {src}")
                }
                other => panic!("{src}: expected restriction, got {other:?}"),
            }
        }
    }

    #[test]
    fn reports_incomplete_input() {
        let err = parse_src("1 +").unwrap_err();
        assert!(err.to_string().contains("unexpected end of expression"));
        let err = parse_src("f(1, 2").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { .. }));
        let err = parse_src("").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { .. }));
    }

    #[test]
    fn enforces_nesting_limit() {
        let src = format!("{}1{}", "(".repeat(80), ")".repeat(80));
        let err = parse_src(&src).unwrap_err();
        assert!(err.to_string().contains("maximum depth"));
        let ok = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_src(&ok).is_ok());
    }

    #[test]
    fn operator_and_member_chains_count_toward_depth() {
        for src in [
            format!("{}1", "1+".repeat(100)),
            format!("a{}", ".b".repeat(100)),
            format!("f{}", "()".repeat(100)),
            format!("x{}", "[0]".repeat(100)),
        ] {
            let err = parse_src(&src).unwrap_err();
            assert!(
                err.to_string().contains("maximum depth"),
                "{}: {err}",
                &src[..10]
            );
        }

        let tokens = tokenize("1+1+1+1+1").unwrap();
        assert!(parse("1+1+1+1+1", &tokens, 4).is_err());
        assert!(parse("1+1+1+1+1", &tokens, 5).is_ok());
    }

    #[test]
    fn tracks_tree_height() {
        assert_eq!(parse_src("1").unwrap().height(), 1);
        assert_eq!(parse_src("(((1)))").unwrap().height(), 1);
        assert_eq!(parse_src("a.b.c").unwrap().height(), 3);
        assert_eq!(parse_src("1 + 2 * -3").unwrap().height(), 4);
    }
}
