use std::io::{BufRead, BufReader, Read, Write};
use std::mem;

use crate::ast::Node;
use crate::builtin::BUILTINS;
use crate::compiler::Compiler;
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::Parser;
use crate::symbol_table::SymbolTable;
use crate::vm::{GLOBALS_SIZE, VM};

const PROMPT: &str = ">> ";

/// The VM-backed line loop. Symbol table, constant pool, and globals
/// survive across lines, so `let` bindings stay visible.
pub fn start<R: Read, W: Write>(reader: R, mut writer: W) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);

    let mut symbol_table = SymbolTable::new();
    for (i, builtin) in BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(i, builtin.name);
    }
    let mut constants: Vec<Object> = Vec::new();
    let mut globals = vec![Object::Null; GLOBALS_SIZE];

    loop {
        write!(writer, "{}", PROMPT)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let l = Lexer::new(&line);
        let mut p = Parser::new(l);
        let program = p.parse_program();
        if !p.errors().is_empty() {
            print_parser_errors(&mut writer, p.errors())?;
            continue;
        }

        let mut comp =
            Compiler::new_with_state(mem::take(&mut symbol_table), mem::take(&mut constants));
        let compiled = comp.compile(Node::Program(program));

        // a compile error inside a function body leaves the table in an
        // enclosed scope; unwind before carrying it to the next line
        let mut restored = comp.symbol_table();
        while restored.is_enclosed() {
            restored = restored.into_outer().expect("enclosed table has an outer");
        }
        symbol_table = restored;

        let code = comp.byte_code();
        constants = code.constants.clone();

        if let Err(msg) = compiled {
            writeln!(writer, "compile error occurred: {}", msg)?;
            continue;
        }

        let mut machine = VM::new_with_globals_store(code, mem::take(&mut globals));
        let out = match machine.run() {
            Err(err) => format!("runtime error occurred: {}", err),
            Ok(_) => format!("{}", machine.last_popped_stack_elem()),
        };
        globals = machine.into_globals();

        writeln!(writer, "{}", out)?;
    }
}

fn print_parser_errors<W: Write>(mut writer: W, errors: Vec<String>) -> std::io::Result<()> {
    writeln!(writer, "Woops! Parsing failed:")?;
    for msg in errors {
        writeln!(writer, "    {}", msg)?;
    }
    writer.flush()
}
