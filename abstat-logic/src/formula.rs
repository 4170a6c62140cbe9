//! Restricted arithmetic expressions over KPI columns.
//!
//! Identifiers follow `[a-zA-Z][0-9a-zA-Z_]*`. Evaluation is element-wise
//! over equal-length `f64` columns; missing values (NaN) propagate through
//! every operator.

use fxhash::FxHashMap;
use thiserror::Error;

/// Errors from parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected character `{0}` in formula")]
    UnexpectedChar(char),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("formula ended unexpectedly")]
    UnexpectedEnd,

    #[error("invalid numeric literal `{0}`")]
    BadNumber(String),

    #[error("formula references unknown column `{0}`")]
    UnknownColumn(String),
}

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

/// Parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a KPI column by name
    Column(String),
    /// Numeric literal
    Literal(f64),
    /// Unary negation
    Neg(Box<Expr>),
    /// Binary operation
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Column names referenced by this expression, in appearance order,
    /// de-duplicated.
    pub fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<String>) {
        match self {
            Expr::Column(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Expr::Literal(_) => {}
            Expr::Neg(inner) => inner.collect_identifiers(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
        }
    }

    /// The reference KPI of a ratio-shaped formula.
    ///
    /// A formula whose top level is a division with a bare column on the left
    /// (`numerator/denominator`) designates that column as the reference KPI
    /// used for per-row weighting. Any other shape has no reference.
    pub fn reference_kpi(&self) -> Option<&str> {
        match self {
            Expr::Binary {
                op: BinOp::Div,
                lhs,
                ..
            } => match lhs.as_ref() {
                Expr::Column(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Evaluate the expression row-wise against the given columns.
    ///
    /// Every referenced column must be present with length `len`. NaN inputs
    /// produce NaN outputs; division by zero follows IEEE semantics.
    pub fn eval(
        &self,
        columns: &FxHashMap<String, Vec<f64>>,
        len: usize,
    ) -> Result<Vec<f64>, FormulaError> {
        match self {
            Expr::Column(name) => columns
                .get(name)
                .map(|c| c.clone())
                .ok_or_else(|| FormulaError::UnknownColumn(name.clone())),
            Expr::Literal(v) => Ok(vec![*v; len]),
            Expr::Neg(inner) => {
                let mut vals = inner.eval(columns, len)?;
                for v in &mut vals {
                    *v = -*v;
                }
                Ok(vals)
            }
            Expr::Binary { op, lhs, rhs } => {
                let mut left = lhs.eval(columns, len)?;
                let right = rhs.eval(columns, len)?;
                for (l, r) in left.iter_mut().zip(right.iter()) {
                    *l = op.apply(*l, *r);
                }
                Ok(left)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Number(v) => write!(f, "{}", v),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            'a'..='z' | 'A'..='Z' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = num
                    .parse()
                    .map_err(|_| FormulaError::BadNumber(num.clone()))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(FormulaError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // factor := '-' factor | ident | number | '(' expr ')'
    fn factor(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::Number(value)) => Ok(Expr::Literal(value)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(t) => Err(FormulaError::UnexpectedToken(t.to_string())),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(t) => Err(FormulaError::UnexpectedToken(t.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// Parse a formula string into an expression tree.
pub fn parse_formula(input: &str) -> Result<Expr, FormulaError> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.next() {
        None => Ok(expr),
        Some(t) => Err(FormulaError::UnexpectedToken(t.to_string())),
    }
}
