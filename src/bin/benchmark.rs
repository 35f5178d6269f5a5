use std::env;
use std::time::Instant;

use gibbon::ast::Node;
use gibbon::compiler::Compiler;
use gibbon::evaluator::Evaluator;
use gibbon::lexer::Lexer;
use gibbon::object::Object;
use gibbon::parser::Parser;
use gibbon::vm::VM;

const INPUT: &str = r#"
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

fn main() {
    let engine = env::args()
        .find_map(|arg| arg.strip_prefix("--engine=").map(str::to_string))
        .unwrap_or_else(|| "vm".to_string());

    let l = Lexer::new(INPUT);
    let mut p = Parser::new(l);
    let program = p.parse_program();

    let (result, duration) = match engine.as_str() {
        "vm" => {
            let mut comp = Compiler::new();
            if let Err(err) = comp.compile(Node::Program(program)) {
                eprintln!("compiler error: {}", err);
                return;
            }

            let mut machine = VM::new(comp.byte_code());
            let start = Instant::now();
            if let Err(err) = machine.run() {
                eprintln!("vm error: {}", err);
                return;
            }
            (machine.last_popped_stack_elem(), start.elapsed())
        }
        "eval" => {
            let mut evaluator = Evaluator::new();
            let start = Instant::now();
            let result = evaluator
                .eval(Node::Program(program))
                .unwrap_or(Object::Null);
            (result, start.elapsed())
        }
        other => {
            eprintln!("unknown engine {}; use --engine=vm or --engine=eval", other);
            return;
        }
    };

    println!(
        "engine={}, result={}, duration={:?}",
        engine, result, duration
    );
}
