use std::cell::RefCell;
use std::io::{BufRead, BufReader, Read, Write};
use std::rc::Rc;

use crate::ast::Node;
use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::macro_expansion::{define_macros, expand_macros};
use crate::parser::Parser;

const PROMPT: &str = ">> ";

const GIBBON_FACE: &str = r#"
      .-"-.
    _/_-.-_\_
   / __> <__ \
  / //  ~  \\ \
 / / \__.__/ \ \
 \ \   ~ ~   / /
"#;

/// The tree-walking line loop: macros are defined and expanded before
/// each evaluation, and the environment persists across lines.
pub fn start<R: Read, W: Write>(reader: R, mut writer: W) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut evaluator = Evaluator::new();
    let macro_env = Rc::new(RefCell::new(Environment::new()));

    loop {
        write!(writer, "{}", PROMPT)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let l = Lexer::new(&line);
        let mut p = Parser::new(l);
        let mut program = p.parse_program();
        if !p.errors().is_empty() {
            print_parser_errors(&mut writer, p.errors())?;
            continue;
        }

        define_macros(&mut program, &macro_env);
        let expanded = expand_macros(program, &macro_env);

        match evaluator.eval(Node::Program(expanded)) {
            None => writeln!(writer, "evaluation produced no value")?,
            Some(obj) => writeln!(writer, "{}", obj)?,
        }
    }
}

fn print_parser_errors<W: Write>(mut writer: W, errors: Vec<String>) -> std::io::Result<()> {
    write!(writer, "{}", GIBBON_FACE)?;
    writeln!(writer, "Woops! Parsing failed:")?;
    for msg in errors {
        writeln!(writer, "    {}", msg)?;
    }
    writer.flush()
}
