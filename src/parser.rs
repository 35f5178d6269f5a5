use crate::ast::{Expression, Program, Statement};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};

#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
enum Precedence {
    Lowest,
    Equals,      // ==
    LessGreater, // > <
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[0]
}

fn precedence_of(token: TokenType) -> Option<Precedence> {
    match token {
        TokenType::Eq | TokenType::NotEq => Some(Precedence::Equals),
        TokenType::Lt | TokenType::Gt => Some(Precedence::LessGreater),
        TokenType::Plus | TokenType::Minus => Some(Precedence::Sum),
        TokenType::Asterisk | TokenType::Slash => Some(Precedence::Product),
        TokenType::Lparen => Some(Precedence::Call),
        TokenType::Lbracket => Some(Precedence::Index),
        _ => None,
    }
}

pub struct Parser {
    l: Lexer,
    errors: Vec<String>,

    cur_token: Option<Token>,
    peek_token: Option<Token>,
}

impl Parser {
    pub fn new(l: Lexer) -> Self {
        let mut p = Parser {
            l,
            errors: Vec::new(),
            cur_token: None,
            peek_token: None,
        };

        // fill cur_token and peek_token
        p.next_token();
        p.next_token();

        p
    }

    fn next_token(&mut self) {
        self.cur_token = self.peek_token.take();
        self.peek_token = Some(self.l.next_token());
    }

    fn cur_token_is(&self, t: TokenType) -> bool {
        matches!(&self.cur_token, Some(ct) if ct.token_type == t)
    }

    fn peek_token_is(&self, t: TokenType) -> bool {
        matches!(&self.peek_token, Some(pt) if pt.token_type == t)
    }

    fn expect_peek(&mut self, t: TokenType) -> bool {
        if self.peek_token_is(t) {
            self.next_token();
            true
        } else {
            self.peek_error(t);
            false
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }

    fn peek_error(&mut self, t: TokenType) {
        let got = match &self.peek_token {
            None => "<none>".to_string(),
            Some(pt) => pt.token_type.to_string(),
        };
        self.errors
            .push(format!("expected next token to be {}, got {} instead", t, got));
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program {
            statements: Vec::new(),
        };

        while !self.cur_token_is(TokenType::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match &self.cur_token {
            None => None,
            Some(ct) => match ct.token_type {
                TokenType::Let => self.parse_let_statement(),
                TokenType::Return => self.parse_return_statement(),
                _ => self.parse_expression_statement(),
            },
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenType::Ident) {
            return None;
        }

        let name = self.cur_token.as_ref()?.literal.clone();

        if !self.expect_peek(TokenType::Assign) {
            return None;
        }
        self.next_token();

        let mut value = self.parse_expression(Precedence::Lowest)?;

        // hand the binding name to function literals so they can refer
        // to themselves
        if let Expression::Function {
            name: fn_name, ..
        } = &mut value
        {
            *fn_name = name.clone();
        }

        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }

        Some(Statement::LetStatement {
            identifier: Expression::Identifier(name),
            value,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }
        Some(Statement::ReturnStatement(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }
        Some(Statement::ExpressionStatement(expression))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = match self.cur_token.as_ref()?.token_type {
            TokenType::Ident => self.parse_identifier(),
            TokenType::Int => self.parse_integer_literal(),
            TokenType::String => self.parse_string_literal(),
            TokenType::Minus | TokenType::Bang => self.parse_prefix_expression(),
            TokenType::Lbracket => self.parse_array_literal(),
            TokenType::Lparen => self.parse_grouped_expression(),
            TokenType::Lbrace => self.parse_hash_literal(),
            TokenType::True | TokenType::False => self.parse_boolean(),
            TokenType::If => self.parse_if_expression(),
            TokenType::Function => self.parse_function_literal(),
            TokenType::Macro => self.parse_macro_literal(),
            other => {
                self.errors
                    .push(format!("no prefix parse function for {} found", other));
                None
            }
        }?;

        while !self.peek_token_is(TokenType::Semicolon) && precedence < self.peek_precedence() {
            left = match self.peek_token.as_ref()?.token_type {
                TokenType::Plus
                | TokenType::Minus
                | TokenType::Asterisk
                | TokenType::Slash
                | TokenType::Eq
                | TokenType::NotEq
                | TokenType::Lt
                | TokenType::Gt => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                TokenType::Lparen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                TokenType::Lbracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                _ => return Some(left),
            }
        }
        Some(left)
    }

    fn peek_precedence(&self) -> Precedence {
        self.peek_token
            .as_ref()
            .and_then(|pt| precedence_of(pt.token_type))
            .unwrap_or(Precedence::Lowest)
    }

    fn cur_precedence(&self) -> Precedence {
        self.cur_token
            .as_ref()
            .and_then(|ct| precedence_of(ct.token_type))
            .unwrap_or(Precedence::Lowest)
    }

    fn parse_identifier(&self) -> Option<Expression> {
        Some(Expression::Identifier(
            self.cur_token.as_ref()?.literal.clone(),
        ))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let lit = self.cur_token.as_ref()?.literal.clone();
        match lit.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                self.errors
                    .push(format!("could not parse {} as integer", lit));
                None
            }
        }
    }

    fn parse_string_literal(&self) -> Option<Expression> {
        Some(Expression::String(self.cur_token.as_ref()?.literal.clone()))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.cur_token.as_ref()?.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::PrefixExpression {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.cur_token.as_ref()?.literal.clone();

        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::InfixExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_boolean(&self) -> Option<Expression> {
        self.cur_token.as_ref()?;
        Some(Expression::Boolean(self.cur_token_is(TokenType::True)))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let exp = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::Rparen) {
            return None;
        }
        Some(exp)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenType::Lparen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenType::Lbrace) {
            return None;
        }

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token_is(TokenType::Else) {
            self.next_token();
            if !self.expect_peek(TokenType::Lbrace) {
                return None;
            }
            Some(Box::new(self.parse_block_statement()?))
        } else {
            None
        };

        Some(Expression::IfExpression {
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative,
        })
    }

    fn parse_block_statement(&mut self) -> Option<Statement> {
        let mut stmts = Vec::new();
        self.next_token();
        while !self.cur_token_is(TokenType::Rbrace) && !self.cur_token_is(TokenType::Eof) {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            self.next_token();
        }
        Some(Statement::BlockStatement(stmts))
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenType::Lparen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenType::Lbrace) {
            return None;
        }

        let body = self.parse_block_statement()?;

        Some(Expression::Function {
            name: String::new(),
            parameters,
            body: Box::new(body),
        })
    }

    fn parse_macro_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenType::Lparen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenType::Lbrace) {
            return None;
        }

        let body = self.parse_block_statement()?;

        Some(Expression::Macro {
            parameters,
            body: Box::new(body),
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Expression>> {
        let mut params = Vec::new();
        if self.peek_token_is(TokenType::Rparen) {
            self.next_token();
            return Some(params);
        }
        self.next_token();

        params.push(Expression::Identifier(
            self.cur_token.as_ref()?.literal.clone(),
        ));

        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            params.push(Expression::Identifier(
                self.cur_token.as_ref()?.literal.clone(),
            ));
        }

        if !self.expect_peek(TokenType::Rparen) {
            return None;
        }
        Some(params)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenType::Rparen)?;
        Some(Expression::CallExpression {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenType::Rbracket)?;
        Some(Expression::Array(elements))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::Rbracket) {
            return None;
        }

        Some(Expression::IndexExpression {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_token_is(TokenType::Rbrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenType::Colon) {
                return None;
            }

            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            if !self.peek_token_is(TokenType::Rbrace) && !self.expect_peek(TokenType::Comma) {
                return None;
            }

            pairs.push((key, value));
        }

        if !self.expect_peek(TokenType::Rbrace) {
            return None;
        }
        Some(Expression::Hash(pairs))
    }
}
