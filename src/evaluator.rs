use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::{modify_expression, Expression, Node, Program, Statement};
use crate::builtin::BuiltinFunction;
use crate::environment::Environment;
use crate::object::{HashKey, HashPair, Object};

/// The tree-walking back-end. Runtime failures are `Object::Error`
/// values that short-circuit evaluation rather than a separate error
/// channel.
#[derive(Clone)]
pub struct Evaluator {
    env: Rc<RefCell<Environment>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            env: Rc::new(RefCell::new(Environment::new())),
        }
    }

    pub fn from_env(env: Rc<RefCell<Environment>>) -> Self {
        Self { env }
    }

    pub fn env(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.env)
    }

    fn get(&self, name: &str) -> Option<Object> {
        self.env.borrow().get(name)
    }

    fn set(&mut self, name: String, value: Object) {
        self.env.borrow_mut().set(name, value)
    }

    pub fn eval(&mut self, node: Node) -> Option<Object> {
        match node {
            Node::Program(program) => self.eval_program(program),
            Node::Statement(stmt) => match stmt {
                Statement::BlockStatement(block) => self.eval_block_statement(block),
                Statement::ExpressionStatement(exp) => self.eval(Node::Expression(exp)),
                Statement::ReturnStatement(exp) => {
                    let value = self.eval(Node::Expression(exp))?;
                    if is_error(&value) {
                        return Some(value);
                    }
                    Some(Object::ReturnValue(Box::new(value)))
                }
                Statement::LetStatement { identifier, value } => {
                    let value = self.eval(Node::Expression(value))?;
                    if is_error(&value) {
                        return Some(value);
                    }
                    match identifier {
                        Expression::Identifier(name) => {
                            self.set(name, value.clone());
                            Some(value)
                        }
                        _ => None,
                    }
                }
            },
            Node::Expression(exp) => match exp {
                Expression::Integer(i) => Some(Object::Integer(i)),
                Expression::String(s) => Some(Object::String(s)),
                Expression::Boolean(b) => Some(Object::Boolean(b)),
                Expression::PrefixExpression { operator, right } => {
                    let right = self.eval(Node::Expression(*right))?;
                    if is_error(&right) {
                        return Some(right);
                    }
                    Some(eval_prefix_expression(&operator, right))
                }
                Expression::InfixExpression {
                    operator,
                    left,
                    right,
                } => {
                    let left = self.eval(Node::Expression(*left))?;
                    if is_error(&left) {
                        return Some(left);
                    }
                    let right = self.eval(Node::Expression(*right))?;
                    if is_error(&right) {
                        return Some(right);
                    }
                    Some(eval_infix_expression(&operator, left, right))
                }
                Expression::IfExpression { .. } => self.eval_if_expression(exp),
                Expression::Identifier(name) => self.eval_identifier(name),
                Expression::Function {
                    parameters, body, ..
                } => Some(Object::Function {
                    parameters,
                    body: *body,
                    env: Rc::clone(&self.env),
                }),
                Expression::Macro { parameters, body } => Some(Object::Macro {
                    parameters,
                    body: *body,
                    env: Rc::clone(&self.env),
                }),
                Expression::CallExpression {
                    function,
                    arguments,
                } => {
                    if let Expression::Identifier(name) = function.as_ref() {
                        if name == "quote" {
                            let arg = arguments.into_iter().next()?;
                            return Some(self.quote(arg));
                        }
                    }

                    let function = self.eval(Node::Expression(*function))?;
                    if is_error(&function) {
                        return Some(function);
                    }
                    let args = self.eval_expressions(arguments)?;
                    if args.len() == 1 && is_error(&args[0]) {
                        return Some(args[0].clone());
                    }
                    apply_function(function, args)
                }
                Expression::Array(elements) => {
                    let elements = self.eval_expressions(elements)?;
                    if elements.len() == 1 && is_error(&elements[0]) {
                        return Some(elements[0].clone());
                    }
                    Some(Object::Array(elements))
                }
                Expression::IndexExpression { left, index } => {
                    let left = self.eval(Node::Expression(*left))?;
                    if is_error(&left) {
                        return Some(left);
                    }
                    let index = self.eval(Node::Expression(*index))?;
                    if is_error(&index) {
                        return Some(index);
                    }
                    Some(eval_index_expression(left, index))
                }
                Expression::Hash(pairs) => self.eval_hash_literal(pairs),
            },
        }
    }

    fn eval_program(&mut self, program: Program) -> Option<Object> {
        let mut result = Object::Null;

        for stmt in program.statements {
            result = self.eval(Node::Statement(stmt))?;

            match result {
                Object::ReturnValue(value) => return Some(*value),
                Object::Error(_) => return Some(result),
                _ => {}
            }
        }
        Some(result)
    }

    fn eval_block_statement(&mut self, block: Vec<Statement>) -> Option<Object> {
        let mut result = Object::Null;

        for stmt in block {
            result = self.eval(Node::Statement(stmt))?;

            // bubbles up unchanged; the function boundary unwraps it
            if let Object::ReturnValue(_) | Object::Error(_) = result {
                return Some(result);
            }
        }

        Some(result)
    }

    fn eval_if_expression(&mut self, expression: Expression) -> Option<Object> {
        if let Expression::IfExpression {
            condition,
            consequence,
            alternative,
        } = expression
        {
            let condition = self.eval(Node::Expression(*condition))?;
            if is_error(&condition) {
                return Some(condition);
            }

            if is_truthy(&condition) {
                self.eval(Node::Statement(*consequence))
            } else {
                match alternative {
                    None => Some(Object::Null),
                    Some(alt) => self.eval(Node::Statement(*alt)),
                }
            }
        } else {
            None
        }
    }

    fn eval_identifier(&mut self, name: String) -> Option<Object> {
        match self.get(&name) {
            Some(obj) => Some(obj),
            None => match BuiltinFunction::look_up(&name) {
                Some(builtin) => Some(Object::Builtin(builtin)),
                None => Some(new_error(format!("identifier not found: {}", name))),
            },
        }
    }

    fn eval_expressions(&mut self, expressions: Vec<Expression>) -> Option<Vec<Object>> {
        let mut result = Vec::new();

        for exp in expressions {
            let evaluated = self.eval(Node::Expression(exp))?;
            if is_error(&evaluated) {
                return Some(vec![evaluated]);
            }
            result.push(evaluated);
        }
        Some(result)
    }

    fn eval_hash_literal(&mut self, pairs: Vec<(Expression, Expression)>) -> Option<Object> {
        let mut hash = BTreeMap::new();

        for (key_exp, value_exp) in pairs {
            let key = self.eval(Node::Expression(key_exp))?;
            if is_error(&key) {
                return Some(key);
            }

            let hash_key = match HashKey::from_object(&key) {
                Ok(hash_key) => hash_key,
                Err(msg) => return Some(new_error(msg)),
            };

            let value = self.eval(Node::Expression(value_exp))?;
            if is_error(&value) {
                return Some(value);
            }

            hash.insert(hash_key, HashPair { key, value });
        }
        Some(Object::Hash(hash))
    }

    /// `quote(exp)` returns the expression unevaluated, except that
    /// nested `unquote(...)` calls are evaluated and spliced back in as
    /// literals.
    fn quote(&mut self, exp: Expression) -> Object {
        let env = self.env();
        let unquoted = modify_expression(exp, &move |exp| {
            if !is_unquote_call(&exp) {
                return exp;
            }
            if let Expression::CallExpression { arguments, .. } = &exp {
                if arguments.len() != 1 {
                    return exp;
                }
                let mut evaluator = Evaluator::from_env(Rc::clone(&env));
                match evaluator.eval(Node::Expression(arguments[0].clone())) {
                    Some(obj) => convert_object_to_expression(obj, &exp),
                    None => exp,
                }
            } else {
                exp
            }
        });
        Object::Quote(unquoted)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_unquote_call(exp: &Expression) -> bool {
    if let Expression::CallExpression { function, .. } = exp {
        matches!(function.as_ref(), Expression::Identifier(name) if name == "unquote")
    } else {
        false
    }
}

fn convert_object_to_expression(obj: Object, original: &Expression) -> Expression {
    match obj {
        Object::Integer(i) => Expression::Integer(i),
        Object::Boolean(b) => Expression::Boolean(b),
        Object::Quote(exp) => exp,
        _ => original.clone(),
    }
}

pub fn is_error(obj: &Object) -> bool {
    matches!(obj, Object::Error(_))
}

pub fn new_error(msg: String) -> Object {
    Object::Error(msg)
}

fn native_bool_to_object(value: bool) -> Object {
    Object::Boolean(value)
}

fn is_truthy(obj: &Object) -> bool {
    match obj {
        Object::Null => false,
        Object::Boolean(b) => *b,
        _ => true,
    }
}

fn eval_prefix_expression(operator: &str, right: Object) -> Object {
    match operator {
        "!" => eval_bang_expression(right),
        "-" => eval_minus_prefix_expression(right),
        _ => new_error(format!(
            "unknown operator: {}{}",
            operator,
            right.type_name()
        )),
    }
}

fn eval_bang_expression(right: Object) -> Object {
    match right {
        Object::Boolean(b) => Object::Boolean(!b),
        Object::Null => Object::Boolean(true),
        _ => Object::Boolean(false),
    }
}

fn eval_minus_prefix_expression(right: Object) -> Object {
    match right {
        Object::Integer(i) => Object::Integer(i.wrapping_neg()),
        other => new_error(format!("unknown operator: -{}", other.type_name())),
    }
}

fn eval_infix_expression(operator: &str, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(operator, *l, *r)
        }
        (Object::String(l), Object::String(r)) => eval_string_infix_expression(operator, l, r),
        _ => match operator {
            "==" => native_bool_to_object(left == right),
            "!=" => native_bool_to_object(left != right),
            _ if left.type_name() != right.type_name() => new_error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            _ => new_error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        },
    }
}

fn eval_integer_infix_expression(operator: &str, left: i64, right: i64) -> Object {
    match operator {
        "+" => Object::Integer(left.wrapping_add(right)),
        "-" => Object::Integer(left.wrapping_sub(right)),
        "*" => Object::Integer(left.wrapping_mul(right)),
        "/" => {
            if right == 0 {
                new_error("division by zero".to_string())
            } else {
                Object::Integer(left.wrapping_div(right))
            }
        }
        "<" => Object::Boolean(left < right),
        ">" => Object::Boolean(left > right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => new_error(format!("unknown operator: INTEGER {} INTEGER", operator)),
    }
}

fn eval_string_infix_expression(operator: &str, left: &str, right: &str) -> Object {
    match operator {
        "+" => Object::String(left.to_string() + right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => new_error(format!("unknown operator: STRING {} STRING", operator)),
    }
}

fn apply_function(function: Object, args: Vec<Object>) -> Option<Object> {
    match function {
        Object::Function {
            parameters,
            body,
            env,
        } => {
            if args.len() != parameters.len() {
                return Some(new_error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    parameters.len()
                )));
            }

            // a fresh scope per call, enclosing the captured environment
            let mut call_env = Environment::new_enclosed(env);
            for (param, arg) in parameters.iter().zip(args) {
                if let Expression::Identifier(name) = param {
                    call_env.set(name.clone(), arg);
                }
            }

            let mut evaluator = Evaluator::from_env(Rc::new(RefCell::new(call_env)));
            let evaluated = evaluator.eval(Node::Statement(body))?;
            Some(unwrap_return_value(evaluated))
        }
        Object::Builtin(builtin) => Some(builtin.call(args).unwrap_or(Object::Null)),
        other => Some(new_error(format!("not a function: {}", other.type_name()))),
    }
}

fn unwrap_return_value(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(value) => *value,
        other => other,
    }
}

fn eval_index_expression(left: Object, index: Object) -> Object {
    match (left, index) {
        (Object::Array(elements), Object::Integer(i)) => {
            if i < 0 || i >= elements.len() as i64 {
                Object::Null
            } else {
                elements[i as usize].clone()
            }
        }
        (Object::Hash(pairs), index) => match HashKey::from_object(&index) {
            Ok(key) => match pairs.get(&key) {
                Some(pair) => pair.value.clone(),
                None => Object::Null,
            },
            Err(msg) => new_error(msg),
        },
        (left, _) => new_error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

#[cfg(test)]
mod test {
    use crate::ast::Node;
    use crate::evaluator::Evaluator;
    use crate::lexer::Lexer;
    use crate::object::Object;
    use crate::parser::Parser;

    fn test_eval(input: &str) -> Option<Object> {
        let l = Lexer::new(input);
        let mut p = Parser::new(l);
        let program = p.parse_program();
        assert_eq!(p.errors().len(), 0, "parser errors: {:?}", p.errors());
        let mut evaluator = Evaluator::new();
        evaluator.eval(Node::Program(program))
    }

    fn test_integer(input: &str, expected: i64) {
        match test_eval(input) {
            Some(Object::Integer(value)) => assert_eq!(value, expected, "input: {}", input),
            other => panic!("input: {}: expected integer, got {:?}", input, other),
        }
    }

    fn test_boolean(input: &str, expected: bool) {
        match test_eval(input) {
            Some(Object::Boolean(value)) => assert_eq!(value, expected, "input: {}", input),
            other => panic!("input: {}: expected boolean, got {:?}", input, other),
        }
    }

    fn test_error(input: &str, expected: &str) {
        match test_eval(input) {
            Some(Object::Error(msg)) => assert_eq!(msg, expected, "input: {}", input),
            other => panic!("input: {}: expected error, got {:?}", input, other),
        }
    }

    #[test]
    fn test_eval_integer_expressions() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: "5",
                expected: 5,
            },
            Test {
                input: "-5",
                expected: -5,
            },
            Test {
                input: "5 + 5 + 5 - 7",
                expected: 8,
            },
            Test {
                input: "5 + 5 * 5",
                expected: 30,
            },
            Test {
                input: "2 * (5 + 10)",
                expected: 30,
            },
            Test {
                input: "(5 + 10 * 2 + 15 / 3) * 2 + -10",
                expected: 50,
            },
        ];

        for tt in tests {
            test_integer(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_eval_boolean_expressions() {
        struct Test<'a> {
            input: &'a str,
            expected: bool,
        }
        let tests = vec![
            Test {
                input: "true",
                expected: true,
            },
            Test {
                input: "1 < 2",
                expected: true,
            },
            Test {
                input: "1 > 2",
                expected: false,
            },
            Test {
                input: "1 == 2",
                expected: false,
            },
            Test {
                input: "1 != 2",
                expected: true,
            },
            Test {
                input: "true == true",
                expected: true,
            },
            Test {
                input: "true != true",
                expected: false,
            },
            Test {
                input: "(1 < 2) == true",
                expected: true,
            },
            Test {
                input: r#""abc" == "abc""#,
                expected: true,
            },
            Test {
                input: r#""abc" != "abd""#,
                expected: true,
            },
        ];

        for tt in tests {
            test_boolean(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_bang_operator() {
        struct Test<'a> {
            input: &'a str,
            expected: bool,
        }
        let tests = vec![
            Test {
                input: "!true",
                expected: false,
            },
            Test {
                input: "!false",
                expected: true,
            },
            Test {
                input: "!5",
                expected: false,
            },
            Test {
                input: "!!true",
                expected: true,
            },
            Test {
                input: "!!5",
                expected: true,
            },
        ];

        for tt in tests {
            test_boolean(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_if_else_expressions() {
        struct Test<'a> {
            input: &'a str,
            expected: Option<i64>,
        }
        let tests = vec![
            Test {
                input: "if (true) { 10 }",
                expected: Some(10),
            },
            Test {
                input: "if (false) { 10 }",
                expected: None,
            },
            Test {
                input: "if (1) { 10 }",
                expected: Some(10),
            },
            Test {
                input: "if (1 < 2) { 10 }",
                expected: Some(10),
            },
            Test {
                input: "if (1 > 2) { 10 } else { 20 }",
                expected: Some(20),
            },
        ];

        for tt in tests {
            match (test_eval(tt.input), tt.expected) {
                (Some(Object::Integer(value)), Some(expected)) => assert_eq!(value, expected),
                (Some(Object::Null), None) => {}
                (other, _) => panic!("input: {}: unexpected result {:?}", tt.input, other),
            }
        }
    }

    #[test]
    fn test_return_statements() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: "return 10;",
                expected: 10,
            },
            Test {
                input: "return 10; 9;",
                expected: 10,
            },
            Test {
                input: "return 2 * 5; 9;",
                expected: 10,
            },
            Test {
                input: "9; return 2 * 5; 9;",
                expected: 10,
            },
            Test {
                input: r#"
                if (10 > 1) {
                    if (10 > 1) {
                        return 10;
                    }
                    return 1;
                }
                "#,
                expected: 10,
            },
        ];

        for tt in tests {
            test_integer(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_let_statements() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: "let a = 5; a;",
                expected: 5,
            },
            Test {
                input: "let a = 5 * 5; a;",
                expected: 25,
            },
            Test {
                input: "let a = 5; let b = a; b;",
                expected: 5,
            },
            Test {
                input: "let a = 5; let b = a; let c = a + b + 5; c;",
                expected: 15,
            },
        ];

        for tt in tests {
            test_integer(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_function_application() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: "let identity = fn(x) { x; }; identity(5);",
                expected: 5,
            },
            Test {
                input: "let identity = fn(x) { return x; }; identity(5);",
                expected: 5,
            },
            Test {
                input: "let double = fn(x) { x * 2; }; double(5);",
                expected: 10,
            },
            Test {
                input: "let add = fn(x, y) { x + y; }; add(5, 5);",
                expected: 10,
            },
            Test {
                input: "let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));",
                expected: 20,
            },
            Test {
                input: "fn(x) { x; }(5)",
                expected: 5,
            },
        ];

        for tt in tests {
            test_integer(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_closures() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: r#"
                let newAdder = fn(x) { fn(y) { x + y }; };
                let addTwo = newAdder(2);
                addTwo(2);
                "#,
                expected: 4,
            },
            Test {
                input: "let f = fn(x){ fn(y){ x + y } }; f(2)(3)",
                expected: 5,
            },
            Test {
                input: "let newAdder = fn(a){ fn(b){ a + b } }; let addTwo = newAdder(2); addTwo(7)",
                expected: 9,
            },
            // a fresh scope per call: local bindings do not leak between calls
            Test {
                input: r#"
                let counter = fn(x) { let n = x + 1; n };
                counter(1) + counter(1);
                "#,
                expected: 4,
            },
            Test {
                input: "let f = fn(n){ if (n < 1) { 0 } else { f(n - 1) + n } }; f(5)",
                expected: 15,
            },
        ];

        for tt in tests {
            test_integer(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_fibonacci() {
        let input = r#"
        let fibonacci = fn(x) {
            if (x == 0) {
                0
            } else {
                if (x == 1) {
                    return 1;
                } else {
                    fibonacci(x - 1) + fibonacci(x - 2);
                }
            }
        };
        fibonacci(15);
        "#;
        test_integer(input, 610);
    }

    #[test]
    fn test_string_expressions() {
        match test_eval(r#""hello" + " " + "world""#) {
            Some(Object::String(s)) => assert_eq!(s, "hello world"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_array_literals_and_index() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: "[1, 2 * 2, 3 + 3][1]",
                expected: 4,
            },
            Test {
                input: "let myArray = [1, 2, 3]; myArray[2];",
                expected: 3,
            },
            Test {
                input: "let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];",
                expected: 6,
            },
        ];
        for tt in tests {
            test_integer(tt.input, tt.expected);
        }

        for input in ["[1, 2, 3][3]", "[1, 2, 3][-1]"] {
            match test_eval(input) {
                Some(Object::Null) => {}
                other => panic!("input: {}: expected null, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_hash_literals_and_index() {
        struct Test<'a> {
            input: &'a str,
            expected: i64,
        }
        let tests = vec![
            Test {
                input: r#"{"one": 1, "two": 2}["two"]"#,
                expected: 2,
            },
            Test {
                input: r#"let key = "foo"; {"foo": 5}[key]"#,
                expected: 5,
            },
            Test {
                input: "{1: 1, 2: 2}[2]",
                expected: 2,
            },
            Test {
                input: "{true: 5}[true]",
                expected: 5,
            },
        ];
        for tt in tests {
            test_integer(tt.input, tt.expected);
        }

        match test_eval(r#"{"foo": 5}["bar"]"#) {
            Some(Object::Null) => {}
            other => panic!("expected null, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_functions() {
        test_integer(r#"len("")"#, 0);
        test_integer(r#"len("four")"#, 4);
        test_integer("len([1, 2, 3])", 3);
        test_integer("first([1, 2, 3])", 1);
        test_integer("last([1, 2, 3])", 3);
        test_integer("len(rest([1, 2, 3]))", 2);
        test_integer("len(push([1], 2))", 2);

        test_error("len(1)", "argument to `len` not supported, got INTEGER");
        test_error(
            r#"len("one", "two")"#,
            "wrong number of arguments. got=2, want=1",
        );
    }

    #[test]
    fn test_error_handling() {
        struct Test<'a> {
            input: &'a str,
            expected: &'a str,
        }
        let tests = vec![
            Test {
                input: "5 + true;",
                expected: "type mismatch: INTEGER + BOOLEAN",
            },
            Test {
                input: "5 + true; 5;",
                expected: "type mismatch: INTEGER + BOOLEAN",
            },
            Test {
                input: "1 + true",
                expected: "type mismatch: INTEGER + BOOLEAN",
            },
            Test {
                input: "-true",
                expected: "unknown operator: -BOOLEAN",
            },
            Test {
                input: "true + false;",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            Test {
                input: "5; true + false; 5",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            Test {
                input: "if (10 > 1) { true + false; }",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            Test {
                input: r#"
                if (10 > 1) {
                    if (10 > 1) {
                        return true + false;
                    }
                    return 1;
                }
                "#,
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            Test {
                input: "foobar",
                expected: "identifier not found: foobar",
            },
            Test {
                input: r#""Hello" - "World""#,
                expected: "unknown operator: STRING - STRING",
            },
            Test {
                input: r#"{"name": "gibbon"}[fn(x) { x }];"#,
                expected: "unusable as hash key: FUNCTION",
            },
            Test {
                input: "{fn(x) { x }: 5};",
                expected: "unusable as hash key: FUNCTION",
            },
            Test {
                input: "5[0]",
                expected: "index operator not supported: INTEGER",
            },
            Test {
                input: "1 / 0",
                expected: "division by zero",
            },
            Test {
                input: "5()",
                expected: "not a function: INTEGER",
            },
        ];

        for tt in tests {
            test_error(tt.input, tt.expected);
        }
    }

    #[test]
    fn test_quote() {
        struct Test<'a> {
            input: &'a str,
            expected: &'a str,
        }
        let tests = vec![
            Test {
                input: "quote(5)",
                expected: "5",
            },
            Test {
                input: "quote(5 + 8)",
                expected: "(5 + 8)",
            },
            Test {
                input: "quote(foobar)",
                expected: "foobar",
            },
            Test {
                input: "quote(foobar + barfoo)",
                expected: "(foobar + barfoo)",
            },
        ];

        for tt in tests {
            match test_eval(tt.input) {
                Some(Object::Quote(exp)) => {
                    assert_eq!(format!("{}", exp), tt.expected, "input: {}", tt.input)
                }
                other => panic!("input: {}: expected quote, got {:?}", tt.input, other),
            }
        }
    }

    #[test]
    fn test_quote_unquote() {
        struct Test<'a> {
            input: &'a str,
            expected: &'a str,
        }
        let tests = vec![
            Test {
                input: "quote(unquote(4))",
                expected: "4",
            },
            Test {
                input: "quote(unquote(4 + 4))",
                expected: "8",
            },
            Test {
                input: "quote(8 + unquote(4 + 4))",
                expected: "(8 + 8)",
            },
            Test {
                input: "quote(unquote(4 + 4) + 8)",
                expected: "(8 + 8)",
            },
            Test {
                input: "let foobar = 8; quote(unquote(foobar))",
                expected: "8",
            },
            Test {
                input: "quote(unquote(true))",
                expected: "true",
            },
            Test {
                input: "quote(unquote(true == false))",
                expected: "false",
            },
            Test {
                input: "quote(unquote(quote(4 + 4)))",
                expected: "(4 + 4)",
            },
            Test {
                input: r#"
                let quotedInfixExpression = quote(4 + 4);
                quote(unquote(4 + 4) + unquote(quotedInfixExpression))
                "#,
                expected: "(8 + (4 + 4))",
            },
        ];

        for tt in tests {
            match test_eval(tt.input) {
                Some(Object::Quote(exp)) => {
                    assert_eq!(format!("{}", exp), tt.expected, "input: {}", tt.input)
                }
                other => panic!("input: {}: expected quote, got {:?}", tt.input, other),
            }
        }
    }
}
