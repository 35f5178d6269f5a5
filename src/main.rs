use std::io::{stdin, stdout};

use gibbon::repl;

fn main() -> std::io::Result<()> {
    println!("gibbon REPL (bytecode VM); Ctrl-D exits");
    repl::start(stdin(), stdout())
}
