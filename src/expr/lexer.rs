use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ExprError, Location};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Ellipsis,
    Question,
    Colon,
    Semicolon,
    Bang,
    Tilde,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Shl,
    Shr,
    UShr,
    Amp,
    Pipe,
    Caret,
    AndAnd,
    OrOr,
    /// `=` or any compound assignment such as `+=`.
    Assign(&'static str),
    Arrow,
    PlusPlus,
    MinusMinus,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
    pub end: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut chars = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some((idx, ch)) = chars.peek().copied() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match ch {
            '0'..='9' => lex_number(input, &mut chars)?,
            '.' => {
                if input[idx + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                    lex_number(input, &mut chars)?
                } else if input[idx..].starts_with("...") {
                    advance(&mut chars, 3);
                    TokenKind::Ellipsis
                } else {
                    chars.next();
                    TokenKind::Dot
                }
            }
            '"' | '\'' => lex_string(input, &mut chars)?,
            c if is_ident_start(c) => {
                let start = idx;
                let mut end = idx + c.len_utf8();
                chars.next();
                while let Some((i, cc)) = chars.peek().copied() {
                    if is_ident_continue(cc) {
                        end = i + cc.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                match &input[start..end] {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    "null" => TokenKind::Null,
                    raw => TokenKind::Ident(raw.to_string()),
                }
            }
            _ => {
                let (kind, len) = punctuator(&input[idx..]).ok_or_else(|| {
                    syntax_error(
                        input,
                        idx,
                        idx + ch.len_utf8(),
                        format!("unexpected character '{ch}'"),
                    )
                })?;
                advance(&mut chars, len);
                kind
            }
        };

        let end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
        tokens.push(Token {
            kind,
            pos: idx,
            end,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        pos: input.len(),
        end: input.len(),
    });
    Ok(tokens)
}

/// Builds a syntax error pointing at `input[start..end]`.
pub(crate) fn syntax_error(
    input: &str,
    start: usize,
    end: usize,
    message: impl Into<String>,
) -> ExprError {
    let start = start.min(input.len());
    let end = end.clamp(start, input.len());
    let fragment = if start == end {
        "<end of input>".to_string()
    } else {
        input[start..end].to_string()
    };
    ExprError::Syntax {
        message: message.into(),
        fragment,
        location: Location::at(input, start),
    }
}

fn advance(chars: &mut Peekable<CharIndices<'_>>, n: usize) {
    for _ in 0..n {
        chars.next();
    }
}

/// Longest-match punctuator table; ASCII only, so lengths are byte and char counts.
fn punctuator(rest: &str) -> Option<(TokenKind, usize)> {
    const TABLE: &[(&str, TokenKind)] = &[
        (">>>=", TokenKind::Assign(">>>=")),
        ("===", TokenKind::EqEqEq),
        ("!==", TokenKind::NotEqEq),
        (">>>", TokenKind::UShr),
        ("<<=", TokenKind::Assign("<<=")),
        (">>=", TokenKind::Assign(">>=")),
        ("&&=", TokenKind::Assign("&&=")),
        ("||=", TokenKind::Assign("||=")),
        ("=>", TokenKind::Arrow),
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("<=", TokenKind::Lte),
        (">=", TokenKind::Gte),
        ("<<", TokenKind::Shl),
        (">>", TokenKind::Shr),
        ("&&", TokenKind::AndAnd),
        ("||", TokenKind::OrOr),
        ("++", TokenKind::PlusPlus),
        ("--", TokenKind::MinusMinus),
        ("+=", TokenKind::Assign("+=")),
        ("-=", TokenKind::Assign("-=")),
        ("*=", TokenKind::Assign("*=")),
        ("/=", TokenKind::Assign("/=")),
        ("%=", TokenKind::Assign("%=")),
        ("&=", TokenKind::Assign("&=")),
        ("|=", TokenKind::Assign("|=")),
        ("^=", TokenKind::Assign("^=")),
        ("=", TokenKind::Assign("=")),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
        (",", TokenKind::Comma),
        ("?", TokenKind::Question),
        (":", TokenKind::Colon),
        (";", TokenKind::Semicolon),
        ("!", TokenKind::Bang),
        ("~", TokenKind::Tilde),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
        ("&", TokenKind::Amp),
        ("|", TokenKind::Pipe),
        ("^", TokenKind::Caret),
    ];

    TABLE
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, kind)| (kind.clone(), text.len()))
}

fn lex_number(
    input: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<TokenKind, ExprError> {
    let start = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());

    if input[start..].starts_with("0x") || input[start..].starts_with("0X") {
        advance(chars, 2);
        let digits_start = start + 2;
        let mut end = digits_start;
        while let Some((i, c)) = chars.peek().copied() {
            if c.is_ascii_hexdigit() {
                end = i + 1;
                chars.next();
            } else {
                break;
            }
        }
        let raw = &input[digits_start..end];
        if raw.is_empty() {
            return Err(syntax_error(
                input,
                start,
                digits_start,
                "hex literal '0x' has no digits",
            ));
        }
        // Literals past u64::MAX are folded into a lossy f64, like any number
        // beyond 2^53.
        let value = u64::from_str_radix(raw, 16)
            .map(|v| v as f64)
            .unwrap_or_else(|_| {
                raw.chars()
                    .filter_map(|c| c.to_digit(16))
                    .fold(0.0, |acc, d| acc * 16.0 + f64::from(d))
            });
        return Ok(TokenKind::Number(value));
    }

    let mut end = start;
    let mut seen_dot = false;
    let mut seen_exp = false;
    while let Some((i, c)) = chars.peek().copied() {
        if c.is_ascii_digit() {
            end = i + 1;
            chars.next();
        } else if c == '.' && !seen_dot && !seen_exp {
            seen_dot = true;
            end = i + 1;
            chars.next();
        } else if (c == 'e' || c == 'E') && !seen_exp {
            seen_exp = true;
            end = i + 1;
            chars.next();
            if let Some((j, sign)) = chars.peek().copied() {
                if sign == '+' || sign == '-' {
                    end = j + 1;
                    chars.next();
                }
            }
        } else {
            break;
        }
    }

    let raw = &input[start..end];
    let n: f64 = raw.parse().map_err(|e| {
        syntax_error(
            input,
            start,
            end,
            format!("invalid number literal '{raw}': {e}"),
        )
    })?;

    if let Some((i, c)) = chars.peek().copied() {
        if is_ident_start(c) {
            return Err(syntax_error(
                input,
                start,
                i + c.len_utf8(),
                "identifier starts immediately after numeric literal",
            ));
        }
    }

    Ok(TokenKind::Number(n))
}

fn lex_string(
    input: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<TokenKind, ExprError> {
    let Some((start, quote)) = chars.next() else {
        return Err(syntax_error(input, input.len(), input.len(), "expected string"));
    };
    let mut out = String::new();

    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok(TokenKind::String(out));
        }
        if c == '\\' {
            let Some((_, esc)) = chars.next() else {
                return Err(syntax_error(
                    input,
                    i,
                    input.len(),
                    "unterminated escape sequence",
                ));
            };
            match esc {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        let digit = chars
                            .next()
                            .and_then(|(_, h)| h.to_digit(16))
                            .ok_or_else(|| {
                                syntax_error(input, i, i + 2, "invalid unicode escape")
                            })?;
                        code = code * 16 + digit;
                    }
                    let decoded = char::from_u32(code).ok_or_else(|| {
                        syntax_error(input, i, i + 2, "invalid unicode code point")
                    })?;
                    out.push(decoded);
                }
                '\n' => {}
                other => out.push(other),
            }
        } else if c == '\n' {
            return Err(syntax_error(
                input,
                start,
                i,
                "newline inside string literal",
            ));
        } else {
            out.push(c);
        }
    }

    Err(syntax_error(
        input,
        start,
        input.len(),
        format!("unterminated string literal starting at {start}"),
    ))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_sigil_identifiers_and_members() {
        assert_eq!(
            kinds("$days($.x)"),
            vec![
                TokenKind::Ident("$days".into()),
                TokenKind::LParen,
                TokenKind::Ident("$".into()),
                TokenKind::Dot,
                TokenKind::Ident("x".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prefers_longest_operator() {
        assert_eq!(
            kinds("a >>> b !== c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::UShr,
                TokenKind::Ident("b".into()),
                TokenKind::NotEqEq,
                TokenKind::Ident("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers_in_several_forms() {
        assert_eq!(
            kinds("1.5e2 .5 0x1F"),
            vec![
                TokenKind::Number(150.0),
                TokenKind::Number(0.5),
                TokenKind::Number(31.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn oversized_hex_literals_become_lossy_numbers() {
        assert_eq!(
            kinds("0x10000000000000000"),
            vec![TokenKind::Number(18_446_744_073_709_551_616.0), TokenKind::Eof]
        );
        let err = tokenize("0x").unwrap_err();
        assert!(err.to_string().contains("has no digits"));
    }

    #[test]
    fn decodes_string_escapes_in_both_quote_styles() {
        assert_eq!(
            kinds(r#"'it\'s' "aA\n""#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("aA\n".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reports_unterminated_string_position() {
        let err = tokenize("1 + 'abc").unwrap_err();
        match err {
            ExprError::Syntax {
                location, fragment, ..
            } => {
                assert_eq!(location.column, 5);
                assert_eq!(fragment, "'abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("a # b").unwrap_err();
        assert!(err.to_string().contains("unexpected character '#'"));
    }

    #[test]
    fn token_spans_cover_source() {
        let tokens = tokenize("abc  === 12").unwrap();
        assert_eq!((tokens[0].pos, tokens[0].end), (0, 3));
        assert_eq!((tokens[1].pos, tokens[1].end), (5, 8));
        assert_eq!((tokens[2].pos, tokens[2].end), (9, 11));
    }
}
