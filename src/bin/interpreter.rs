use std::io::{stdin, stdout};

use gibbon::interpreter;

fn main() -> std::io::Result<()> {
    println!("gibbon REPL (tree-walking interpreter); Ctrl-D exits");
    interpreter::start(stdin(), stdout())
}
