use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{modify_program, Expression, Node, Program, Statement};
use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::object::Object;

/// Collects `let name = macro(...) {...}` definitions into `env` and
/// removes them from the program. Indices are gathered walking forward
/// and deleted in reverse so later positions stay valid.
pub fn define_macros(program: &mut Program, env: &Rc<RefCell<Environment>>) {
    let mut definitions = Vec::new();
    for (i, stmt) in program.statements.iter().enumerate() {
        if is_macro_definition(stmt) {
            definitions.push(i);
        }
    }

    for i in definitions.iter().rev() {
        let stmt = program.statements.remove(*i);
        add_macro(stmt, env);
    }
}

fn is_macro_definition(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::LetStatement {
            value: Expression::Macro { .. },
            ..
        }
    )
}

fn add_macro(stmt: Statement, env: &Rc<RefCell<Environment>>) {
    if let Statement::LetStatement {
        identifier: Expression::Identifier(name),
        value: Expression::Macro { parameters, body },
    } = stmt
    {
        let macro_obj = Object::Macro {
            parameters,
            body: *body,
            env: Rc::clone(env),
        };
        env.borrow_mut().set(name, macro_obj);
    }
}

/// Rewrites every call of a defined macro: arguments are handed to the
/// macro body as quoted expressions and the resulting quote replaces the
/// call site.
pub fn expand_macros(program: Program, env: &Rc<RefCell<Environment>>) -> Program {
    let env = Rc::clone(env);
    modify_program(program, &move |exp| {
        let (function, arguments) = match &exp {
            Expression::CallExpression {
                function,
                arguments,
            } => (function, arguments),
            _ => return exp,
        };

        let name = match function.as_ref() {
            Expression::Identifier(name) => name,
            _ => return exp,
        };

        let (parameters, body, macro_env) = match env.borrow().get(name) {
            Some(Object::Macro {
                parameters,
                body,
                env: macro_env,
            }) => (parameters, body, macro_env),
            _ => return exp,
        };

        let mut call_env = Environment::new_enclosed(macro_env);
        for (param, arg) in parameters.iter().zip(arguments.iter()) {
            if let Expression::Identifier(param) = param {
                call_env.set(param.clone(), Object::Quote(arg.clone()));
            }
        }

        let mut evaluator = Evaluator::from_env(Rc::new(RefCell::new(call_env)));
        match evaluator.eval(Node::Statement(body)) {
            Some(Object::Quote(node)) => node,
            _ => panic!("we only support returning AST-nodes from macros"),
        }
    })
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::ast::{Expression, Program, Statement};
    use crate::environment::Environment;
    use crate::lexer::Lexer;
    use crate::macro_expansion::{define_macros, expand_macros};
    use crate::object::Object;
    use crate::parser::Parser;

    fn parse(input: &str) -> Program {
        let l = Lexer::new(input);
        let mut p = Parser::new(l);
        let program = p.parse_program();
        assert_eq!(p.errors().len(), 0, "parser errors: {:?}", p.errors());
        program
    }

    #[test]
    fn test_define_macros() {
        let input = r#"
        let number = 1;
        let function = fn(x, y) { x + y };
        let mymacro = macro(x, y) { x + y; };
        "#;

        let env = Rc::new(RefCell::new(Environment::new()));
        let mut program = parse(input);
        define_macros(&mut program, &env);

        // only the macro definition is removed
        assert_eq!(program.statements.len(), 2);
        assert_eq!(env.borrow().get("number"), None);
        assert_eq!(env.borrow().get("function"), None);

        match env.borrow().get("mymacro") {
            Some(Object::Macro {
                parameters, body, ..
            }) => {
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[0], Expression::Identifier("x".to_string()));
                assert_eq!(parameters[1], Expression::Identifier("y".to_string()));
                assert_eq!(format!("{}", body), "(x + y)");
            }
            other => panic!("mymacro is not a macro: {:?}", other),
        };
    }

    #[test]
    fn test_define_macros_removes_every_definition() {
        let input = r#"
        let one = macro() { quote(1) };
        let number = 1;
        let two = macro() { quote(2) };
        let three = macro() { quote(3) };
        "#;

        let env = Rc::new(RefCell::new(Environment::new()));
        let mut program = parse(input);
        define_macros(&mut program, &env);

        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::LetStatement { identifier, .. } => {
                assert_eq!(identifier, &Expression::Identifier("number".to_string()));
            }
            other => panic!("unexpected surviving statement: {}", other),
        }
        for name in ["one", "two", "three"] {
            assert!(env.borrow().get(name).is_some(), "{} not defined", name);
        }
    }

    #[test]
    fn test_expand_macros() {
        struct Test<'a> {
            input: &'a str,
            expected: &'a str,
        }
        let tests = vec![
            Test {
                input: "let infixExpression = macro() { quote(1 + 2); }; infixExpression();",
                expected: "(1 + 2)",
            },
            Test {
                input: "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); }; reverse(2 + 2, 10 - 5);",
                expected: "((10 - 5) - (2 + 2))",
            },
            Test {
                input: r#"
                let unless = macro(condition, consequence, alternative) {
                    quote(if (!(unquote(condition))) {
                        unquote(consequence);
                    } else {
                        unquote(alternative);
                    });
                };
                unless(10 > 5, puts("not greater"), puts("greater"));
                "#,
                expected: r#"if (!(10 > 5)) {puts(not greater)} else {puts(greater)}"#,
            },
        ];

        for tt in tests {
            let env = Rc::new(RefCell::new(Environment::new()));
            let mut program = parse(tt.input);
            define_macros(&mut program, &env);
            let expanded = expand_macros(program, &env);
            assert_eq!(format!("{}", expanded), tt.expected, "input: {}", tt.input);
        }
    }
}
