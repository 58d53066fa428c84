//! S-expression reader for building terms, signatures and contexts in tests.
//!
//! ```text
//! Type                 the sort Type
//! 42                   natural-number constant
//! ?m_0                 meta-variable
//! c                    constant if `c` is declared in the signature, else variable
//! (lam x A b)          \x : A. b
//! (pi x A B)           (x : A) -> B
//! (-> A B C)           A -> B -> C
//! (f a b)              f a b
//! ```

use crate::ast::{Ast, Constant, MetaVariable, Variable};
use crate::context::{Ctx, Env, Sig};
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Unexpected EOF")]
    UnexpectedEof,
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Expected {0}")]
    Expected(String),
    #[error("Numeral out of range: {0}")]
    NumeralOutOfRange(String),
    #[error("Trailing input after term")]
    TrailingInput,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
    Int(u64),
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, ReadError>> {
        self.skip_whitespace();
        let c = self.chars.next()?;
        match c {
            '(' => Some(Ok(Token::LParen)),
            ')' => Some(Ok(Token::RParen)),
            c if c.is_ascii_digit() => {
                let mut s = String::from(c);
                while let Some(&c) = self.chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                Some(
                    s.parse()
                        .map(Token::Int)
                        .map_err(|_| ReadError::NumeralOutOfRange(s)),
                )
            }
            c => {
                let mut s = String::from(c);
                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                Some(Ok(Token::Symbol(s)))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}

pub struct Reader<'a> {
    lexer: Lexer<'a>,
    sig: &'a Sig,
}

impl<'a> Reader<'a> {
    /// Symbols declared in `sig` read as constants.
    pub fn new(input: &'a str, sig: &'a Sig) -> Self {
        Reader {
            lexer: Lexer::new(input),
            sig,
        }
    }

    pub fn read_term(&mut self) -> Result<Arc<Ast>, ReadError> {
        match self.lexer.next_token() {
            Some(Ok(Token::Int(n))) => Ok(Ast::natural_number(n)),
            Some(Ok(Token::Symbol(s))) => Ok(self.atom(&s)),
            Some(Ok(Token::LParen)) => self.read_compound(),
            Some(Ok(Token::RParen)) => Err(ReadError::UnexpectedToken(")".to_string())),
            Some(Err(e)) => Err(e),
            None => Err(ReadError::UnexpectedEof),
        }
    }

    /// Reads one term and requires the input to end after it.
    pub fn read_to_end(&mut self) -> Result<Arc<Ast>, ReadError> {
        let term = self.read_term()?;
        match self.lexer.next_token() {
            None => Ok(term),
            Some(_) => Err(ReadError::TrailingInput),
        }
    }

    fn atom(&self, symbol: &str) -> Arc<Ast> {
        if symbol == "Type" {
            Ast::type_kind()
        } else if let Some(meta) = symbol.strip_prefix('?') {
            Ast::meta(MetaVariable::parse(meta))
        } else if self.sig.contains(&Constant::new(symbol)) {
            Ast::constant(symbol)
        } else {
            Ast::var(Variable::parse(symbol))
        }
    }

    fn read_compound(&mut self) -> Result<Arc<Ast>, ReadError> {
        let head = match self.lexer.next_token() {
            Some(Ok(Token::Symbol(s))) if matches!(s.as_str(), "lam" | "pi" | "->") => s,
            Some(Ok(Token::Symbol(s))) => {
                let head = self.atom(&s);
                return self.read_application(head);
            }
            Some(Ok(Token::Int(n))) => return self.read_application(Ast::natural_number(n)),
            Some(Ok(Token::LParen)) => {
                let head = self.read_compound()?;
                return self.read_application(head);
            }
            Some(Ok(Token::RParen)) => return Err(ReadError::Expected("term".to_string())),
            Some(Err(e)) => return Err(e),
            None => return Err(ReadError::UnexpectedEof),
        };
        match head.as_str() {
            "lam" | "pi" => {
                let bound = Variable::parse(&self.expect_symbol()?);
                let ty = self.read_term()?;
                let scope = self.read_term()?;
                self.expect_rparen()?;
                Ok(if head == "lam" {
                    Ast::lambda(bound, ty, scope)
                } else {
                    Ast::pi(bound, ty, scope)
                })
            }
            _ => {
                let mut parts = vec![self.read_term()?, self.read_term()?];
                while let Some(part) = self.read_optional_term()? {
                    parts.push(part);
                }
                let mut parts = parts.into_iter().rev();
                let last = parts.next().ok_or(ReadError::UnexpectedEof)?;
                Ok(parts.fold(last, |to, from| Ast::arrow(from, to)))
            }
        }
    }

    /// `(head a1 .. an)` with at least one argument; the opening parenthesis
    /// and `head` are already consumed.
    fn read_application(&mut self, head: Arc<Ast>) -> Result<Arc<Ast>, ReadError> {
        let mut arguments = vec![self.read_term()?];
        while let Some(argument) = self.read_optional_term()? {
            arguments.push(argument);
        }
        Ok(Ast::apply_all(head, arguments))
    }

    /// The next term, or `None` after consuming a closing parenthesis.
    fn read_optional_term(&mut self) -> Result<Option<Arc<Ast>>, ReadError> {
        match self.lexer.next_token() {
            Some(Ok(Token::RParen)) => Ok(None),
            Some(Ok(Token::Int(n))) => Ok(Some(Ast::natural_number(n))),
            Some(Ok(Token::Symbol(s))) => Ok(Some(self.atom(&s))),
            Some(Ok(Token::LParen)) => self.read_compound().map(Some),
            Some(Err(e)) => Err(e),
            None => Err(ReadError::UnexpectedEof),
        }
    }

    fn expect_symbol(&mut self) -> Result<String, ReadError> {
        match self.lexer.next_token() {
            Some(Ok(Token::Symbol(s))) => Ok(s),
            _ => Err(ReadError::Expected("symbol".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ReadError> {
        match self.lexer.next_token() {
            Some(Ok(Token::RParen)) => Ok(()),
            _ => Err(ReadError::Expected(")".to_string())),
        }
    }
}

pub fn read_ast(input: &str, sig: &Sig) -> Result<Arc<Ast>, ReadError> {
    Reader::new(input, sig).read_to_end()
}

/// Builds a signature from `(name, sort)` pairs, oldest first. Each sort is
/// read against the entries before it.
pub fn read_sig(entries: &[(&str, &str)]) -> Result<Sig, ReadError> {
    entries.iter().try_fold(Sig::new(), |sig, (name, sort)| {
        let sort = read_ast(sort, &sig)?;
        Ok(sig.add(Constant::new(name), sort))
    })
}

/// Builds a context from `(name, sort)` pairs, oldest first.
pub fn read_ctx(sig: &Sig, entries: &[(&str, &str)]) -> Result<Ctx, ReadError> {
    entries.iter().try_fold(Ctx::new(), |ctx, (name, sort)| {
        Ok(ctx.add(Variable::parse(name), read_ast(sort, sig)?))
    })
}

pub fn read_env(sig: &[(&str, &str)], ctx: &[(&str, &str)]) -> Result<Env, ReadError> {
    let sig = read_sig(sig)?;
    let ctx = read_ctx(&sig, ctx)?;
    Ok(Env::from_sig(sig).with_ctx(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_binders_and_application() {
        let sig = read_sig(&[("a", "Type"), ("f", "(-> a a)")]).expect("sig");
        let term = read_ast("(lam x a (f x))", &sig).expect("term");
        assert_eq!(
            term,
            Ast::lambda(
                Variable::new("x"),
                Ast::constant("a"),
                Ast::app(Ast::constant("f"), Ast::variable("x")),
            )
        );
    }

    #[test]
    fn test_read_atoms() {
        let sig = Sig::new();
        assert_eq!(read_ast("Type", &sig), Ok(Ast::type_kind()));
        assert_eq!(read_ast("7", &sig), Ok(Ast::natural_number(7)));
        assert_eq!(read_ast("?m_2", &sig), Ok(Ast::meta(MetaVariable::indexed(2))));
        assert_eq!(read_ast("$x_1", &sig), Ok(Ast::var(Variable::generated("x", 1))));
    }

    #[test]
    fn test_read_application_spine() {
        let sig = Sig::new();
        let term = read_ast("((f a) b c)", &sig).expect("term");
        let (head, arguments) = term.head_and_arguments();
        assert_eq!(head, Ast::variable("f"));
        assert_eq!(arguments.len(), 3);
    }

    #[test]
    fn test_read_errors() {
        let sig = Sig::new();
        assert_eq!(read_ast("(f", &sig), Err(ReadError::UnexpectedEof));
        assert_eq!(read_ast("a b", &sig), Err(ReadError::TrailingInput));
        assert_eq!(read_ast(")", &sig), Err(ReadError::UnexpectedToken(")".to_string())));
        assert!(matches!(
            read_ast("99999999999999999999999", &sig),
            Err(ReadError::NumeralOutOfRange(_))
        ));
    }
}
