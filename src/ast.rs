use std::fmt;
use std::fmt::Formatter;

pub enum Node {
    Program(Program),
    Statement(Statement),
    Expression(Expression),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in self.statements.iter() {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Statement {
    LetStatement {
        identifier: Expression,
        value: Expression,
    },
    ReturnStatement(Expression),
    ExpressionStatement(Expression),
    BlockStatement(Vec<Statement>),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::LetStatement { identifier, value } => {
                write!(f, "let {} = {}", identifier, value)
            }
            Statement::ReturnStatement(ret) => write!(f, "return {}", ret),
            Statement::ExpressionStatement(exp) => write!(f, "{}", exp),
            Statement::BlockStatement(block) => {
                for stmt in block.iter() {
                    write!(f, "{}", stmt)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Expression {
    Identifier(String),
    Boolean(bool),
    Integer(i64),
    String(String),
    Array(Vec<Expression>),
    Hash(Vec<(Expression, Expression)>),
    PrefixExpression {
        operator: String,
        right: Box<Expression>,
    },
    InfixExpression {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    IfExpression {
        condition: Box<Expression>,
        consequence: Box<Statement>,
        alternative: Option<Box<Statement>>,
    },
    Function {
        // set by the parser when the literal is the value of a `let`,
        // so the compiler can resolve the function's own name
        name: String,
        parameters: Vec<Expression>,
        body: Box<Statement>,
    },
    Macro {
        parameters: Vec<Expression>,
        body: Box<Statement>,
    },
    CallExpression {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    IndexExpression {
        left: Box<Expression>,
        index: Box<Expression>,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::Integer(int) => write!(f, "{}", int),
            Expression::String(st) => write!(f, "{}", st),
            Expression::Array(elements) => {
                write!(
                    f,
                    "[{}]",
                    elements
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Expression::Hash(pairs) => {
                write!(
                    f,
                    "{{{}}}",
                    pairs
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Expression::PrefixExpression { operator, right } => {
                write!(f, "({}{})", operator, right)
            }
            Expression::InfixExpression {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::IfExpression {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {{{}}}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {{{}}}", alt)?;
                }
                Ok(())
            }
            Expression::Function {
                name,
                parameters,
                body,
            } => {
                let params = parameters
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                if name.is_empty() {
                    write!(f, "fn({}) {{{}}}", params, body)
                } else {
                    write!(f, "fn<{}>({}) {{{}}}", name, params, body)
                }
            }
            Expression::Macro { parameters, body } => {
                write!(
                    f,
                    "macro({}) {{{}}}",
                    parameters
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    body
                )
            }
            Expression::CallExpression {
                function,
                arguments,
            } => {
                write!(
                    f,
                    "{}({})",
                    function,
                    arguments
                        .iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Expression::IndexExpression { left, index } => write!(f, "({}[{}])", left, index),
        }
    }
}

/// Rewrites every expression in the program bottom-up with `modifier`.
/// Used by macro expansion to splice expanded bodies back into the tree.
pub fn modify_program(program: Program, modifier: &dyn Fn(Expression) -> Expression) -> Program {
    Program {
        statements: program
            .statements
            .into_iter()
            .map(|s| modify_statement(s, modifier))
            .collect(),
    }
}

pub fn modify_statement(stmt: Statement, modifier: &dyn Fn(Expression) -> Expression) -> Statement {
    match stmt {
        Statement::LetStatement { identifier, value } => Statement::LetStatement {
            identifier,
            value: modify_expression(value, modifier),
        },
        Statement::ReturnStatement(exp) => {
            Statement::ReturnStatement(modify_expression(exp, modifier))
        }
        Statement::ExpressionStatement(exp) => {
            Statement::ExpressionStatement(modify_expression(exp, modifier))
        }
        Statement::BlockStatement(stmts) => Statement::BlockStatement(
            stmts
                .into_iter()
                .map(|s| modify_statement(s, modifier))
                .collect(),
        ),
    }
}

pub fn modify_expression(
    exp: Expression,
    modifier: &dyn Fn(Expression) -> Expression,
) -> Expression {
    let exp = match exp {
        Expression::PrefixExpression { operator, right } => Expression::PrefixExpression {
            operator,
            right: Box::new(modify_expression(*right, modifier)),
        },
        Expression::InfixExpression {
            operator,
            left,
            right,
        } => Expression::InfixExpression {
            operator,
            left: Box::new(modify_expression(*left, modifier)),
            right: Box::new(modify_expression(*right, modifier)),
        },
        Expression::IfExpression {
            condition,
            consequence,
            alternative,
        } => Expression::IfExpression {
            condition: Box::new(modify_expression(*condition, modifier)),
            consequence: Box::new(modify_statement(*consequence, modifier)),
            alternative: alternative.map(|alt| Box::new(modify_statement(*alt, modifier))),
        },
        Expression::Function {
            name,
            parameters,
            body,
        } => Expression::Function {
            name,
            parameters,
            body: Box::new(modify_statement(*body, modifier)),
        },
        Expression::Array(elements) => Expression::Array(
            elements
                .into_iter()
                .map(|e| modify_expression(e, modifier))
                .collect(),
        ),
        Expression::Hash(pairs) => Expression::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| {
                    (
                        modify_expression(k, modifier),
                        modify_expression(v, modifier),
                    )
                })
                .collect(),
        ),
        Expression::IndexExpression { left, index } => Expression::IndexExpression {
            left: Box::new(modify_expression(*left, modifier)),
            index: Box::new(modify_expression(*index, modifier)),
        },
        Expression::CallExpression {
            function,
            arguments,
        } => Expression::CallExpression {
            function: Box::new(modify_expression(*function, modifier)),
            arguments: arguments
                .into_iter()
                .map(|a| modify_expression(a, modifier))
                .collect(),
        },
        other => other,
    };
    modifier(exp)
}

#[cfg(test)]
mod test {
    use crate::ast::{modify_program, Expression, Program, Statement};

    #[test]
    fn test_string() {
        let program = Program {
            statements: vec![Statement::LetStatement {
                identifier: Expression::Identifier("myVar".to_string()),
                value: Expression::Identifier("anotherVar".to_string()),
            }],
        };

        assert_eq!(format!("{}", program), "let myVar = anotherVar");
    }

    #[test]
    fn test_modify() {
        let one = || Expression::Integer(1);
        let two = || Expression::Integer(2);

        let turn_one_into_two = |exp: Expression| -> Expression {
            match exp {
                Expression::Integer(1) => Expression::Integer(2),
                other => other,
            }
        };

        struct Test {
            input: Program,
            expected: Program,
        }
        let tests = vec![
            Test {
                input: Program {
                    statements: vec![Statement::ExpressionStatement(one())],
                },
                expected: Program {
                    statements: vec![Statement::ExpressionStatement(two())],
                },
            },
            Test {
                input: Program {
                    statements: vec![Statement::ExpressionStatement(
                        Expression::InfixExpression {
                            operator: "+".to_string(),
                            left: Box::new(one()),
                            right: Box::new(two()),
                        },
                    )],
                },
                expected: Program {
                    statements: vec![Statement::ExpressionStatement(
                        Expression::InfixExpression {
                            operator: "+".to_string(),
                            left: Box::new(two()),
                            right: Box::new(two()),
                        },
                    )],
                },
            },
            Test {
                input: Program {
                    statements: vec![Statement::ExpressionStatement(Expression::IndexExpression {
                        left: Box::new(Expression::Array(vec![one()])),
                        index: Box::new(one()),
                    })],
                },
                expected: Program {
                    statements: vec![Statement::ExpressionStatement(Expression::IndexExpression {
                        left: Box::new(Expression::Array(vec![two()])),
                        index: Box::new(two()),
                    })],
                },
            },
            Test {
                input: Program {
                    statements: vec![Statement::ReturnStatement(Expression::IfExpression {
                        condition: Box::new(one()),
                        consequence: Box::new(Statement::BlockStatement(vec![
                            Statement::ExpressionStatement(one()),
                        ])),
                        alternative: Some(Box::new(Statement::BlockStatement(vec![
                            Statement::ExpressionStatement(one()),
                        ]))),
                    })],
                },
                expected: Program {
                    statements: vec![Statement::ReturnStatement(Expression::IfExpression {
                        condition: Box::new(two()),
                        consequence: Box::new(Statement::BlockStatement(vec![
                            Statement::ExpressionStatement(two()),
                        ])),
                        alternative: Some(Box::new(Statement::BlockStatement(vec![
                            Statement::ExpressionStatement(two()),
                        ]))),
                    })],
                },
            },
            Test {
                input: Program {
                    statements: vec![Statement::ExpressionStatement(Expression::Hash(vec![(
                        one(),
                        one(),
                    )]))],
                },
                expected: Program {
                    statements: vec![Statement::ExpressionStatement(Expression::Hash(vec![(
                        two(),
                        two(),
                    )]))],
                },
            },
        ];

        for tt in tests {
            let modified = modify_program(tt.input, &turn_one_into_two);
            assert_eq!(modified, tt.expected);
        }
    }
}
