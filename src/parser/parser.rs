use super::ast::{
    BinaryOp, Expression, FunctionDef, GuardedExpression, Literal, Parameter, Program, Type,
    UnaryOp,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use std::rc::Rc;

/// Deepest nesting of expressions and blocks accepted before a syntax error
pub const MAX_NESTING_DEPTH: usize = 2_000;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 2 * 1024 * 1024;

/// Recursive-descent parser for VeLa
///
/// Precedence, loosest first: `or`, `and`, `xor`, relational (`= <> < > <= >= =~ in`),
/// shift (`<< >>`), additive, multiplicative, unary (`-`, `not`), `^` (right
/// associative), postfix call, primary.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Creates a new parser over a scanned token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses the tokens into a program
    pub fn parse(&mut self) -> Result<Program> {
        let mut expressions = Vec::new();

        while !self.is_at_end() {
            expressions.push(self.parse_form()?);
        }

        Ok(Program { expressions })
    }

    /// A form is anything allowed in a sequence: bindings, loops and named
    /// function definitions as well as plain expressions
    fn parse_form(&mut self) -> Result<Expression> {
        match self.peek().kind {
            TokenKind::Identifier(_) => match self.peek_at(1) {
                TokenKind::Bind => self.parse_binding(false),
                TokenKind::Is => self.parse_binding(true),
                TokenKind::LeftParen if self.at_function_definition() => {
                    let name = self.expect_identifier()?;
                    self.parse_function_rest(Some(name))
                }
                _ => self.parse_expression(),
            },
            TokenKind::While => self.parse_while(),
            _ => self.parse_expression(),
        }
    }

    fn parse_binding(&mut self, constant: bool) -> Result<Expression> {
        let name = self.expect_identifier()?;
        self.advance(); // `<-` or `is`
        let value = self.parse_expression()?;
        Ok(Expression::Binding {
            name,
            value: Box::new(value),
            constant,
        })
    }

    fn parse_while(&mut self) -> Result<Expression> {
        self.consume(TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Expression::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    /// `name(p:type ...)` or `name() :`/`name() {` starts a definition rather than a call
    fn at_function_definition(&self) -> bool {
        match (self.peek_at(2), self.peek_at(3)) {
            (TokenKind::Identifier(_), TokenKind::Colon) => true,
            (TokenKind::RightParen, TokenKind::Colon | TokenKind::LeftBrace) => true,
            _ => false,
        }
    }

    /// Parses `(params) [: type] { body }` after the name or `function` keyword
    fn parse_function_rest(&mut self, name: Option<String>) -> Result<Expression> {
        self.consume(TokenKind::LeftParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            let param_name = self.expect_identifier()?;
            self.consume(TokenKind::Colon)?;
            let type_name = self.parse_type()?;
            params.push(Parameter {
                name: param_name,
                type_name,
            });
            self.match_token(&TokenKind::Comma);
        }
        self.consume(TokenKind::RightParen)?;

        let return_type = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        Ok(Expression::FunctionDef(Rc::new(FunctionDef {
            name,
            params,
            return_type,
            body: Rc::new(body),
        })))
    }

    fn parse_type(&mut self) -> Result<Type> {
        let found = match &self.peek().kind {
            TokenKind::Function => Some(Type::Function),
            TokenKind::Identifier(name) => Type::from_name(name),
            _ => None,
        };
        match found {
            Some(t) => {
                self.advance();
                Ok(t)
            }
            None => Err(self.expected_error("a type (integer, real, string, boolean, list, function)")),
        }
    }

    fn parse_block(&mut self) -> Result<Expression> {
        self.nested(Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Expression> {
        self.consume(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(self.expected_error("`}`"));
            }
            body.push(self.parse_form()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(Expression::Block(body))
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_expression_inner)
    }

    /// Runs one level of recursive descent, growing the native stack when it
    /// runs low and bounding the total depth
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.syntax_error(format!(
                "expression nested more than {} levels deep",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || parse(self));
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self) -> Result<Expression> {
        match self.peek().kind {
            TokenKind::When => self.parse_selection(),
            TokenKind::If => self.parse_if(),
            _ => self.parse_or(),
        }
    }

    fn parse_selection(&mut self) -> Result<Expression> {
        self.consume(TokenKind::When)?;

        let mut arms = Vec::new();
        let guard = self.parse_or()?;
        arms.push(self.parse_consequent(guard)?);

        // Another arm follows only if `expr ->` parses from here
        while let Some(guard) = self.speculate_guard() {
            arms.push(self.parse_consequent(guard)?);
        }

        Ok(Expression::Selection(arms))
    }

    fn parse_consequent(&mut self, guard: Expression) -> Result<GuardedExpression> {
        self.consume(TokenKind::Arrow)?;
        let consequent = self.parse_expression()?;
        Ok(GuardedExpression { guard, consequent })
    }

    fn speculate_guard(&mut self) -> Option<Expression> {
        if self.is_at_end() {
            return None;
        }
        let checkpoint = self.current;
        match self.parse_or() {
            Ok(guard) if self.check(&TokenKind::Arrow) => Some(guard),
            _ => {
                self.current = checkpoint;
                None
            }
        }
    }

    fn parse_if(&mut self) -> Result<Expression> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Then)?;
        let consequent = self.parse_expression()?;
        let alternative = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expression::If {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternative,
        })
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut expr = self.parse_and()?;
        while self.match_token(&TokenKind::Or) {
            let right = self.parse_and()?;
            expr = binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut expr = self.parse_xor()?;
        while self.match_token(&TokenKind::And) {
            let right = self.parse_xor()?;
            expr = binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_xor(&mut self) -> Result<Expression> {
        let mut expr = self.parse_relational()?;
        while self.match_token(&TokenKind::Xor) {
            let right = self.parse_relational()?;
            expr = binary(BinaryOp::Xor, expr, right);
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut expr = self.parse_shift()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Equal => BinaryOp::Eq,
                TokenKind::NotEqual => BinaryOp::NotEq,
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::LessEqual => BinaryOp::LtEq,
                TokenKind::GreaterEqual => BinaryOp::GtEq,
                TokenKind::Match => BinaryOp::Match,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            self.advance();
            let right = self.parse_shift()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> Result<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::ShiftLeft => BinaryOp::ShiftLeft,
                TokenKind::ShiftRight => BinaryOp::ShiftRight,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(fold_unary(op, operand))
    }

    fn parse_power(&mut self) -> Result<Expression> {
        let base = self.parse_postfix()?;
        if self.match_token(&TokenKind::Caret) {
            // Right associative: the exponent may itself contain `^`
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        while self.check(&TokenKind::LeftParen) && self.call_may_follow(&expr) {
            let args = self.parse_arguments()?;
            expr = Expression::Call {
                callee: Box::new(expr),
                args,
            };
        }

        Ok(expr)
    }

    /// A `(` continues the previous expression as a call only on the same line
    /// and only after something that can evaluate to a function
    fn call_may_follow(&self, expr: &Expression) -> bool {
        let previous = self.previous();
        if previous.line != self.peek().line {
            return false;
        }
        match previous.kind {
            TokenKind::Identifier(_) | TokenKind::RightParen => true,
            TokenKind::RightBrace => matches!(expr, Expression::FunctionDef(_)),
            _ => false,
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.consume(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            if self.is_at_end() {
                return Err(self.expected_error("`)`"));
            }
            args.push(self.parse_expression()?);
            self.match_token(&TokenKind::Comma);
        }
        self.consume(TokenKind::RightParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Integer(n) => Expression::Literal(Literal::Integer(n)),
            TokenKind::Real(x) => Expression::Literal(Literal::Real(x)),
            TokenKind::String(s) => Expression::Literal(Literal::String(s)),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Identifier(name) => Expression::Variable(name),
            TokenKind::LeftBracket => return self.parse_list(),
            TokenKind::LeftBrace => return self.parse_block(),
            TokenKind::When => return self.parse_selection(),
            TokenKind::If => return self.parse_if(),
            TokenKind::Function => {
                self.advance();
                return self.parse_function_rest(None);
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::Eof => return Err(self.syntax_error("unexpected end of input")),
            _ => {
                return Err(self.syntax_error(format!(
                    "no viable alternative at input '{}'",
                    token.lexeme
                )))
            }
        };
        self.advance();
        Ok(expr)
    }

    fn parse_list(&mut self) -> Result<Expression> {
        self.consume(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            if self.is_at_end() {
                return Err(self.expected_error("`]`"));
            }
            elements.push(self.parse_expression()?);
            self.match_token(&TokenKind::Comma);
        }
        self.consume(TokenKind::RightBracket)?;
        Ok(Expression::List(elements))
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.expected_error(&format!("`{}`", kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected_error("identifier")),
        }
    }

    /// Helper to create a syntax error at current position
    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    /// Helper to create a syntax error with expected/got pattern
    fn expected_error(&self, expected: &str) -> Error {
        let token = self.peek();
        let got = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.lexeme),
        };
        self.syntax_error(format!("Expected {}, found {}", expected, got))
    }
}

fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Folds unary operators applied directly to literals
fn fold_unary(op: UnaryOp, operand: Expression) -> Expression {
    match (op, operand) {
        (UnaryOp::Neg, Expression::Literal(Literal::Integer(n))) => {
            Expression::Literal(Literal::Integer(n.wrapping_neg()))
        }
        (UnaryOp::Neg, Expression::Literal(Literal::Real(x))) => {
            Expression::Literal(Literal::Real(-x))
        }
        (UnaryOp::Not, Expression::Literal(Literal::Boolean(b))) => {
            Expression::Literal(Literal::Boolean(!b))
        }
        (op, operand) => Expression::Unary {
            op,
            operand: Box::new(operand),
        },
    }
}
