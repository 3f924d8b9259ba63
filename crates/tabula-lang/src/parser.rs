use tabula_solver::Scalar;
use thiserror::Error;

use crate::ast::{Constraint, Direction, Program, Relation};
use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid element: {0}")]
    InvalidElement(String),
    #[error("Constraint {constraint} has no relation")]
    MissingRelation { constraint: usize },
    #[error("Constraint {constraint} has more than one relation")]
    ExtraRelation { constraint: usize },
    #[error("Constraint {constraint} has no right-hand side")]
    MissingRhs { constraint: usize },
    #[error("Constraint {constraint} has {found} coefficients, expected {expected}")]
    CoefficientCount {
        constraint: usize,
        expected: usize,
        found: usize,
    },
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse<T: Scalar>(source: &str) -> Result<Program<T>, ParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            Some(t) if t.kind != TokenKind::Eof => Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", kind),
                found: format!("{:?}", t.kind),
                span: t.span,
            }),
            _ => Err(ParseError::UnexpectedEof),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?}", t.kind),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn parse_program<T: Scalar>(&mut self) -> Result<Program<T>, ParseError> {
        self.skip_newlines();
        let direction = match self.peek_kind() {
            TokenKind::Min => {
                self.advance();
                Direction::Minimize
            }
            TokenKind::Max => {
                self.advance();
                Direction::Maximize
            }
            _ => return Err(self.unexpected("min or max")),
        };
        self.expect(TokenKind::Newline)?;
        self.skip_newlines();

        let objective = self.parse_element_row()?;
        if objective.is_empty() {
            return Err(self.unexpected("objective coefficients"));
        }
        let vars = objective.len() - 1;
        self.skip_newlines();
        self.expect(TokenKind::Subject)?;
        self.expect(TokenKind::To)?;

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek_kind() == TokenKind::Eof {
                // End of file is the normal end of the constraint section.
                break;
            }
            let index = constraints.len() + 1;
            constraints.push(self.parse_constraint(vars, index)?);
        }

        Ok(Program {
            direction,
            objective,
            constraints,
        })
    }

    /// One comma-separated row of elements, stopping before the newline.
    fn parse_element_row<T: Scalar>(&mut self) -> Result<Vec<T>, ParseError> {
        let mut values = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Newline | TokenKind::Eof => break,
                TokenKind::Element => values.push(self.parse_element()?),
                _ => return Err(self.unexpected("element")),
            }
        }
        Ok(values)
    }

    fn parse_element<T: Scalar>(&mut self) -> Result<T, ParseError> {
        let token = self.expect(TokenKind::Element)?;
        token
            .text
            .parse::<T>()
            .map_err(|_| ParseError::InvalidElement(token.text.clone()))
    }

    /// One constraint line: coefficients, exactly one relation, then the
    /// right-hand side.
    fn parse_constraint<T: Scalar>(
        &mut self,
        vars: usize,
        index: usize,
    ) -> Result<Constraint<T>, ParseError> {
        let mut coefficients = Vec::new();
        let mut relation: Option<Relation> = None;
        let mut rhs: Option<T> = None;
        loop {
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Newline | TokenKind::Eof => break,
                TokenKind::Le | TokenKind::Ge | TokenKind::Eq => {
                    if relation.is_some() {
                        return Err(ParseError::ExtraRelation { constraint: index });
                    }
                    relation = Some(match self.peek_kind() {
                        TokenKind::Le => Relation::Le,
                        TokenKind::Ge => Relation::Ge,
                        _ => Relation::Eq,
                    });
                    self.advance();
                }
                TokenKind::Element => {
                    let value = self.parse_element()?;
                    if relation.is_none() {
                        coefficients.push(value);
                    } else if rhs.is_none() {
                        rhs = Some(value);
                    } else {
                        return Err(self.unexpected("end of line"));
                    }
                }
                _ => return Err(self.unexpected("element, relation, or end of line")),
            }
        }
        let relation = relation.ok_or(ParseError::MissingRelation { constraint: index })?;
        let rhs = rhs.ok_or(ParseError::MissingRhs { constraint: index })?;
        if coefficients.len() != vars {
            return Err(ParseError::CoefficientCount {
                constraint: index,
                expected: vars,
                found: coefficients.len(),
            });
        }
        Ok(Constraint {
            coefficients,
            relation,
            rhs,
        })
    }
}
