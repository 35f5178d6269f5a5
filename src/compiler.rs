use std::mem;
use std::rc::Rc;

use crate::ast::{Expression, Node, Statement};
use crate::builtin::BUILTINS;
use crate::code::{make, Instructions, Operation};
use crate::object::{CompiledFunction, Object};
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Operation,
    position: usize,
}

struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl CompilationScope {
    fn new() -> Self {
        CompilationScope {
            instructions: Instructions::new(vec![]),
            last_instruction: None,
            previous_instruction: None,
        }
    }
}

pub struct Compiler {
    constants: Vec<Object>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, builtin.name);
        }

        Self::new_with_state(symbol_table, vec![])
    }

    /// Continues compiling against an existing symbol table and constant
    /// pool; the REPL uses this to carry definitions across lines.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Object>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
        }
    }

    pub fn compile(&mut self, node: Node) -> Result<(), String> {
        match node {
            Node::Program(program) => {
                for stmt in program.statements {
                    self.compile(Node::Statement(stmt))?;
                }
                Ok(())
            }
            Node::Statement(stmt) => match stmt {
                Statement::ExpressionStatement(exp) => {
                    self.compile(Node::Expression(exp))?;
                    self.emit(Operation::OpPop, &[]);
                    Ok(())
                }
                Statement::BlockStatement(stmts) => {
                    for stmt in stmts {
                        self.compile(Node::Statement(stmt))?;
                    }
                    Ok(())
                }
                Statement::LetStatement { identifier, value } => {
                    let name = match identifier {
                        Expression::Identifier(name) => name,
                        other => return Err(format!("invalid let binding target: {}", other)),
                    };
                    // defined before the value is compiled, so a function
                    // literal can resolve its own name
                    let symbol = self.symbol_table.define(&name);
                    self.compile(Node::Expression(value))?;
                    match symbol.scope {
                        SymbolScope::Global => {
                            self.emit(Operation::OpSetGlobal, &[symbol.index as i32])
                        }
                        _ => self.emit(Operation::OpSetLocal, &[symbol.index as i32]),
                    };
                    Ok(())
                }
                Statement::ReturnStatement(value) => {
                    self.compile(Node::Expression(value))?;
                    self.emit(Operation::OpReturnValue, &[]);
                    Ok(())
                }
            },
            Node::Expression(exp) => match exp {
                Expression::InfixExpression {
                    operator,
                    left,
                    right,
                } => {
                    if operator == "<" {
                        self.compile(Node::Expression(*right))?;
                        self.compile(Node::Expression(*left))?;
                        self.emit(Operation::OpGreaterThan, &[]);
                        return Ok(());
                    }

                    self.compile(Node::Expression(*left))?;
                    self.compile(Node::Expression(*right))?;

                    match operator.as_str() {
                        "+" => self.emit(Operation::OpAdd, &[]),
                        "-" => self.emit(Operation::OpSub, &[]),
                        "*" => self.emit(Operation::OpMul, &[]),
                        "/" => self.emit(Operation::OpDiv, &[]),
                        ">" => self.emit(Operation::OpGreaterThan, &[]),
                        "==" => self.emit(Operation::OpEqual, &[]),
                        "!=" => self.emit(Operation::OpNotEqual, &[]),
                        _ => return Err(format!("unknown operator {}", operator)),
                    };
                    Ok(())
                }
                Expression::PrefixExpression { operator, right } => {
                    self.compile(Node::Expression(*right))?;

                    match operator.as_str() {
                        "!" => self.emit(Operation::OpBang, &[]),
                        "-" => self.emit(Operation::OpMinus, &[]),
                        _ => return Err(format!("unknown operator {}", operator)),
                    };
                    Ok(())
                }
                Expression::Integer(value) => {
                    let pos = self.add_constant(Object::Integer(value));
                    self.emit(Operation::OpConstant, &[pos as i32]);
                    Ok(())
                }
                Expression::String(value) => {
                    let pos = self.add_constant(Object::String(value));
                    self.emit(Operation::OpConstant, &[pos as i32]);
                    Ok(())
                }
                Expression::Boolean(value) => {
                    if value {
                        self.emit(Operation::OpTrue, &[]);
                    } else {
                        self.emit(Operation::OpFalse, &[]);
                    }
                    Ok(())
                }
                Expression::Identifier(name) => {
                    let symbol = match self.symbol_table.resolve(&name) {
                        Some(symbol) => symbol,
                        None => return Err(format!("undefined variable {}", name)),
                    };
                    self.load_symbol(&symbol);
                    Ok(())
                }
                Expression::IfExpression {
                    condition,
                    consequence,
                    alternative,
                } => {
                    self.compile(Node::Expression(*condition))?;

                    // placeholder operand, patched once the consequence
                    // length is known
                    let jump_not_truthy_pos = self.emit(Operation::OpJumpNotTruthy, &[9999]);

                    self.compile(Node::Statement(*consequence))?;
                    if self.last_instruction_is(Operation::OpPop) {
                        self.remove_last_instruction();
                    }

                    let jump_pos = self.emit(Operation::OpJump, &[9999]);

                    let after_consequence = self.current_instructions().len();
                    self.change_operand(jump_not_truthy_pos, after_consequence as i32);

                    match alternative {
                        None => {
                            self.emit(Operation::OpNull, &[]);
                        }
                        Some(alt) => {
                            self.compile(Node::Statement(*alt))?;
                            if self.last_instruction_is(Operation::OpPop) {
                                self.remove_last_instruction();
                            }
                        }
                    }

                    let after_alternative = self.current_instructions().len();
                    self.change_operand(jump_pos, after_alternative as i32);
                    Ok(())
                }
                Expression::Function {
                    name,
                    parameters,
                    body,
                } => {
                    self.enter_scope();

                    if !name.is_empty() {
                        self.symbol_table.define_function_name(&name);
                    }
                    for param in &parameters {
                        if let Expression::Identifier(param) = param {
                            self.symbol_table.define(param);
                        }
                    }

                    self.compile(Node::Statement(*body))?;

                    // the body's last expression becomes the return value;
                    // an empty body returns null
                    if self.last_instruction_is(Operation::OpPop) {
                        self.replace_last_pop_with_return();
                    }
                    if !self.last_instruction_is(Operation::OpReturnValue) {
                        self.emit(Operation::OpReturn, &[]);
                    }

                    let free_symbols = self.symbol_table.free_symbols().to_vec();
                    let num_locals = self.symbol_table.num_definitions();
                    let instructions = self.leave_scope();

                    for symbol in &free_symbols {
                        self.load_symbol(symbol);
                    }

                    let compiled = CompiledFunction {
                        instructions,
                        num_locals,
                        num_parameters: parameters.len(),
                    };
                    let const_index = self.add_constant(Object::CompiledFunction(Rc::new(compiled)));
                    self.emit(
                        Operation::OpClosure,
                        &[const_index as i32, free_symbols.len() as i32],
                    );
                    Ok(())
                }
                Expression::Macro { .. } => {
                    Err("macro literals are only supported by the interpreter".to_string())
                }
                Expression::CallExpression {
                    function,
                    arguments,
                } => {
                    self.compile(Node::Expression(*function))?;
                    let num_args = arguments.len();
                    for arg in arguments {
                        self.compile(Node::Expression(arg))?;
                    }
                    self.emit(Operation::OpCall, &[num_args as i32]);
                    Ok(())
                }
                Expression::Array(elements) => {
                    let n = elements.len();
                    for element in elements {
                        self.compile(Node::Expression(element))?;
                    }
                    self.emit(Operation::OpArray, &[n as i32]);
                    Ok(())
                }
                Expression::Hash(mut pairs) => {
                    // deterministic constant pool: keys in stringified order
                    pairs.sort_by_key(|(key, _)| key.to_string());
                    let n = pairs.len();
                    for (key, value) in pairs {
                        self.compile(Node::Expression(key))?;
                        self.compile(Node::Expression(value))?;
                    }
                    self.emit(Operation::OpHash, &[(n * 2) as i32]);
                    Ok(())
                }
                Expression::IndexExpression { left, index } => {
                    self.compile(Node::Expression(*left))?;
                    self.compile(Node::Expression(*index))?;
                    self.emit(Operation::OpIndex, &[]);
                    Ok(())
                }
            },
        }
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }

    fn add_constant(&mut self, obj: Object) -> usize {
        self.constants.push(obj);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: Operation, operands: &[i32]) -> usize {
        let ins = make(op.as_byte(), operands).expect("operands must match the opcode definition");
        let pos = self.add_instruction(ins);

        let scope = &mut self.scopes[self.scope_index];
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position: pos,
        });

        pos
    }

    fn add_instruction(&mut self, mut ins: Vec<u8>) -> usize {
        let instructions = &mut self.scopes[self.scope_index].instructions;
        let pos_new_instruction = instructions.len();
        instructions.append_vec(&mut ins);
        pos_new_instruction
    }

    fn last_instruction_is(&self, op: Operation) -> bool {
        matches!(
            self.scopes[self.scope_index].last_instruction,
            Some(last) if last.opcode == op
        )
    }

    fn remove_last_instruction(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
        }
    }

    fn replace_last_pop_with_return(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        let last = scope
            .last_instruction
            .as_mut()
            .expect("no instruction to replace");

        let new_instruction =
            make(Operation::OpReturnValue.as_byte(), &[]).expect("OpReturnValue takes no operands");
        scope
            .instructions
            .replace_at(last.position, &new_instruction);
        last.opcode = Operation::OpReturnValue;
    }

    // rewrites a placeholder jump operand in place; the patched
    // instruction keeps its byte length
    fn change_operand(&mut self, pos: usize, operand: i32) {
        let op = Operation::from_byte(self.current_instructions()[pos])
            .expect("patch position must hold a valid opcode");
        let new_instruction =
            make(op.as_byte(), &[operand]).expect("operand must match the opcode definition");

        self.scopes[self.scope_index]
            .instructions
            .replace_at(pos, &new_instruction);
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        self.scope_index += 1;

        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("leaving a scope that was never entered");
        self.scope_index -= 1;

        let table = mem::take(&mut self.symbol_table);
        self.symbol_table = table
            .into_outer()
            .expect("leaving a scope without an enclosing symbol table");

        scope.instructions
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Operation::OpGetGlobal, &[symbol.index as i32]),
            SymbolScope::Local => self.emit(Operation::OpGetLocal, &[symbol.index as i32]),
            SymbolScope::Builtin => self.emit(Operation::OpGetBuiltin, &[symbol.index as i32]),
            SymbolScope::Free => self.emit(Operation::OpGetFree, &[symbol.index as i32]),
            SymbolScope::Function => self.emit(Operation::OpCurrentClosure, &[]),
        };
    }

    /// Snapshot of the symbol table for callers that keep state across
    /// compilations.
    pub fn symbol_table(&self) -> SymbolTable {
        self.symbol_table.clone()
    }

    pub fn byte_code(self) -> ByteCode {
        let mut scopes = self.scopes;
        ByteCode {
            instructions: scopes.swap_remove(0).instructions,
            constants: self.constants,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ByteCode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}
