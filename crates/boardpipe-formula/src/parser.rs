//! Formula parser
//!
//! Parsing runs in two passes: the lexer flattens formula text into a token
//! list, then a precedence-climbing parser folds the tokens into an AST.
//! Formulas are bare expressions, not prefixed with '='.

use std::iter::Peekable;
use std::str::Chars;

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use boardpipe_formula::parse_formula;
///
/// let ast = parse_formula("1+2").unwrap();
/// let ast = parse_formula("IF(3>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let tokens = tokenize(formula.trim())?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };

    let expr = parser.parse_binary(0)?;

    if let Some(extra) = parser.tokens.next() {
        return Err(FormulaError::Parse(format!(
            "Unexpected token after expression: {:?}",
            extra
        )));
    }

    Ok(expr)
}

/// Lexed token
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Function name, case preserved
    Name(String),
    Op(BinaryOperator),
    Comma,
    OpenParen,
    CloseParen,
}

type CharStream<'a> = Peekable<Chars<'a>>;

/// Split formula text into tokens
///
/// Both '=' and '==' lex as the equality operator, and '<>' is accepted as a
/// spelling of '!='. Anything outside the formula alphabet is a parse error.
fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut chars = input.chars().peekable();
    let mut tokens = Vec::new();

    while let Some(c) = chars.next() {
        match c {
            '+' => tokens.push(Token::Op(BinaryOperator::Add)),
            '-' => tokens.push(Token::Op(BinaryOperator::Subtract)),
            '*' => tokens.push(Token::Op(BinaryOperator::Multiply)),
            '/' => tokens.push(Token::Op(BinaryOperator::Divide)),
            '^' => tokens.push(Token::Op(BinaryOperator::Power)),
            ',' => tokens.push(Token::Comma),
            '(' => tokens.push(Token::OpenParen),
            ')' => tokens.push(Token::CloseParen),

            '<' => match chars.peek() {
                Some('=') => {
                    chars.next();
                    tokens.push(Token::Op(BinaryOperator::LessEqual));
                }
                Some('>') => {
                    chars.next();
                    tokens.push(Token::Op(BinaryOperator::NotEqual));
                }
                _ => tokens.push(Token::Op(BinaryOperator::LessThan)),
            },

            '>' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOperator::GreaterEqual));
                } else {
                    tokens.push(Token::Op(BinaryOperator::GreaterThan));
                }
            }

            '=' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Op(BinaryOperator::Equal));
            }

            '!' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOperator::NotEqual));
                } else {
                    return Err(FormulaError::Parse("Unexpected character: '!'".into()));
                }
            }

            '"' => tokens.push(scan_double_quoted(&mut chars)?),
            '\'' => tokens.push(scan_single_quoted(&mut chars)?),

            '.' => {
                if chars.peek().map_or(false, |c| c.is_ascii_digit()) {
                    tokens.push(scan_number('.', &mut chars));
                } else {
                    return Err(FormulaError::Parse("Unexpected character: '.'".into()));
                }
            }

            c if c.is_ascii_digit() => tokens.push(scan_number(c, &mut chars)),

            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = scan_word(c, &mut chars);
                // TRUE and FALSE are literals unless a '(' follows directly,
                // which makes them function names. Case sensitive, so only
                // the uppercase spellings count.
                if chars.peek() != Some(&'(') && (word == "TRUE" || word == "FALSE") {
                    tokens.push(Token::Bool(word == "TRUE"));
                } else {
                    tokens.push(Token::Name(word));
                }
            }

            c if c.is_whitespace() => {}

            other => {
                return Err(FormulaError::Parse(format!(
                    "Unexpected character: '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

/// Double-quoted string, with "" standing for a literal quote
fn scan_double_quoted(chars: &mut CharStream) -> FormulaResult<Token> {
    let mut text = String::new();

    loop {
        match chars.next() {
            Some('"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    text.push('"');
                } else {
                    return Ok(Token::Text(text));
                }
            }
            Some(c) => text.push(c),
            None => return Err(FormulaError::Parse("Unterminated string literal".into())),
        }
    }
}

/// Single-quoted string, with backslash escapes for quote and backslash
fn scan_single_quoted(chars: &mut CharStream) -> FormulaResult<Token> {
    let mut text = String::new();

    loop {
        match chars.next() {
            Some('\'') => return Ok(Token::Text(text)),
            Some('\\') => match chars.next() {
                Some('\'') => text.push('\''),
                Some('\\') => text.push('\\'),
                Some(c) => {
                    text.push('\\');
                    text.push(c);
                }
                None => {
                    return Err(FormulaError::Parse("Unterminated string literal".into()));
                }
            },
            Some(c) => text.push(c),
            None => return Err(FormulaError::Parse("Unterminated string literal".into())),
        }
    }
}

/// Number with optional fraction and exponent. `first` is the already
/// consumed leading character, a digit or the dot of a bare ".5" style
/// fraction.
fn scan_number(first: char, chars: &mut CharStream) -> Token {
    let mut digits = String::from(first);
    push_digits(&mut digits, chars);

    if first != '.' && chars.peek() == Some(&'.') {
        chars.next();
        digits.push('.');
        push_digits(&mut digits, chars);
    }

    if let Some(&e) = chars.peek() {
        if e == 'e' || e == 'E' {
            chars.next();
            digits.push(e);
            if let Some(&sign) = chars.peek() {
                if sign == '+' || sign == '-' {
                    chars.next();
                    digits.push(sign);
                }
            }
            push_digits(&mut digits, chars);
        }
    }

    Token::Number(digits.parse().unwrap_or_default())
}

fn push_digits(buf: &mut String, chars: &mut CharStream) {
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        buf.push(c);
        chars.next();
    }
}

fn scan_word(first: char, chars: &mut CharStream) -> String {
    let mut word = String::from(first);
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

/// Left and right binding powers per operator. A left-associative operator
/// binds its right side tighter than its left; the power operator is the
/// other way around.
fn binding_power(op: BinaryOperator) -> (u8, u8) {
    match op {
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => (1, 2),
        BinaryOperator::Add | BinaryOperator::Subtract => (3, 4),
        BinaryOperator::Multiply | BinaryOperator::Divide => (5, 6),
        BinaryOperator::Power => (8, 7),
    }
}

/// Token cursor with the precedence-climbing grammar
struct Parser {
    tokens: Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    /// Fold a run of binary operators at or above `min_bp` into the AST
    fn parse_binary(&mut self, min_bp: u8) -> FormulaResult<FormulaExpr> {
        let mut lhs = self.parse_unary()?;

        while let Some(&Token::Op(op)) = self.tokens.peek() {
            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.tokens.next();

            let rhs = self.parse_binary(right_bp)?;
            lhs = FormulaExpr::BinaryOp {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.tokens.peek() {
            // Prefix minus
            Some(Token::Op(BinaryOperator::Subtract)) => {
                self.tokens.next();
                let operand = self.parse_unary()?;
                Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            // Prefix plus is a no-op
            Some(Token::Op(BinaryOperator::Add)) => {
                self.tokens.next();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.tokens.next() {
            Some(Token::Number(n)) => Ok(FormulaExpr::Number(n)),
            Some(Token::Text(s)) => Ok(FormulaExpr::String(s)),
            Some(Token::Bool(b)) => Ok(FormulaExpr::Boolean(b)),

            Some(Token::OpenParen) => {
                let inner = self.parse_binary(0)?;
                self.expect_close_paren()?;
                Ok(inner)
            }

            Some(Token::Name(name)) => self.parse_call(name),

            Some(token) => Err(FormulaError::Parse(format!(
                "Unexpected token: {:?}",
                token
            ))),
            None => Err(FormulaError::Parse("Unexpected end of formula".into())),
        }
    }

    fn parse_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        if !matches!(self.tokens.next(), Some(Token::OpenParen)) {
            return Err(FormulaError::Parse(format!(
                "Unexpected identifier: '{}'",
                name
            )));
        }

        let mut args = Vec::new();
        if !matches!(self.tokens.peek(), Some(Token::CloseParen)) {
            loop {
                args.push(self.parse_binary(0)?);
                if matches!(self.tokens.peek(), Some(Token::Comma)) {
                    self.tokens.next();
                } else {
                    break;
                }
            }
        }
        self.expect_close_paren()?;

        // Lookup during evaluation is case sensitive, so the name keeps
        // whatever case it was written in
        Ok(FormulaExpr::Function { name, args })
    }

    fn expect_close_paren(&mut self) -> FormulaResult<()> {
        match self.tokens.next() {
            Some(Token::CloseParen) => Ok(()),
            other => Err(FormulaError::Parse(format!(
                "Expected closing parenthesis, got {:?}",
                other
            ))),
        }
    }
}
