use std::collections::BTreeMap;
use std::rc::Rc;

use crate::builtin::BuiltinFunction;
use crate::code::{read_u16, read_u8, Operation};
use crate::compiler::ByteCode;
use crate::frame::Frame;
use crate::object::{Closure, CompiledFunction, HashKey, HashPair, Object};

pub const STACK_SIZE: usize = 1024;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

const TRUE: Object = Object::Boolean(true);
const FALSE: Object = Object::Boolean(false);
const NULL: Object = Object::Null;

pub struct VM {
    constants: Vec<Object>,

    stack: Vec<Object>,
    sp: usize, // next free slot; the top of the stack is stack[sp-1]

    globals: Vec<Object>,
    frames: Vec<Frame>,
}

impl VM {
    pub fn new(byte_code: ByteCode) -> Self {
        let main_fn = CompiledFunction {
            instructions: byte_code.instructions,
            num_locals: 0,
            num_parameters: 0,
        };
        let main_closure = Closure {
            func: Rc::new(main_fn),
            free: vec![],
        };

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(Rc::new(main_closure), 0));

        Self {
            constants: byte_code.constants,
            stack: vec![NULL; STACK_SIZE],
            sp: 0,
            globals: vec![NULL; GLOBALS_SIZE],
            frames,
        }
    }

    /// Reuses an existing globals vector; the REPL threads one through
    /// all its lines.
    pub fn new_with_globals_store(byte_code: ByteCode, globals: Vec<Object>) -> Self {
        let mut vm = Self::new(byte_code);
        vm.globals = globals;
        vm
    }

    pub fn into_globals(self) -> Vec<Object> {
        self.globals
    }

    /// The slot most recently vacated by OpPop: the value of the last
    /// expression statement after a successful run.
    pub fn last_popped_stack_elem(&self) -> Object {
        self.stack[self.sp].clone()
    }

    pub fn run(&mut self) -> Result<(), String> {
        while self.current_frame().ip < self.current_frame().instructions().len() as i64 - 1 {
            self.current_frame_mut().ip += 1;

            let (op_byte, ip) = {
                let frame = self.current_frame();
                let ip = frame.ip as usize;
                (frame.instructions()[ip], ip)
            };
            let op = Operation::from_byte(op_byte)
                .ok_or_else(|| format!("invalid opcode {} at position {}", op_byte, ip))?;

            match op {
                Operation::OpConstant => {
                    let const_index = self.read_u16_operand() as usize;
                    let constant = self.constants[const_index].clone();
                    self.push(constant)?;
                }
                Operation::OpPop => {
                    self.pop()?;
                }
                Operation::OpAdd | Operation::OpSub | Operation::OpMul | Operation::OpDiv => {
                    self.execute_binary_operation(op)?;
                }
                Operation::OpEqual | Operation::OpNotEqual | Operation::OpGreaterThan => {
                    self.execute_comparison(op)?;
                }
                Operation::OpBang => {
                    let operand = self.pop()?;
                    let negated = match operand {
                        Object::Boolean(b) => bool_to_object(!b),
                        Object::Null => TRUE,
                        _ => FALSE,
                    };
                    self.push(negated)?;
                }
                Operation::OpMinus => {
                    let operand = self.pop()?;
                    match operand {
                        Object::Integer(value) => self.push(Object::Integer(value.wrapping_neg()))?,
                        other => {
                            return Err(format!(
                                "unsupported type for negation: {}",
                                other.type_name()
                            ))
                        }
                    }
                }
                Operation::OpTrue => self.push(TRUE)?,
                Operation::OpFalse => self.push(FALSE)?,
                Operation::OpNull => self.push(NULL)?,
                Operation::OpJump => {
                    let pos = {
                        let frame = self.current_frame();
                        let ip = frame.ip as usize;
                        i64::from(read_u16(&frame.instructions()[ip + 1..]))
                    };
                    // the loop pre-increments, so land one short
                    self.current_frame_mut().ip = pos - 1;
                }
                Operation::OpJumpNotTruthy => {
                    let pos = i64::from(self.read_u16_operand());
                    let condition = self.pop()?;
                    if !is_truthy(&condition) {
                        self.current_frame_mut().ip = pos - 1;
                    }
                }
                Operation::OpSetGlobal => {
                    let global_index = self.read_u16_operand() as usize;
                    let value = self.pop()?;
                    self.globals[global_index] = value;
                }
                Operation::OpGetGlobal => {
                    let global_index = self.read_u16_operand() as usize;
                    let value = self.globals[global_index].clone();
                    self.push(value)?;
                }
                Operation::OpSetLocal => {
                    let local_index = self.read_u8_operand() as usize;
                    let value = self.pop()?;
                    let base_pointer = self.current_frame().base_pointer;
                    self.stack[base_pointer + local_index] = value;
                }
                Operation::OpGetLocal => {
                    let local_index = self.read_u8_operand() as usize;
                    let base_pointer = self.current_frame().base_pointer;
                    let value = self.stack[base_pointer + local_index].clone();
                    self.push(value)?;
                }
                Operation::OpGetBuiltin => {
                    let builtin_index = self.read_u8_operand() as usize;
                    let builtin = BuiltinFunction::by_index(builtin_index)
                        .ok_or_else(|| format!("undefined builtin index {}", builtin_index))?;
                    self.push(Object::Builtin(builtin))?;
                }
                Operation::OpGetFree => {
                    let free_index = self.read_u8_operand() as usize;
                    let value = self.current_frame().cl.free[free_index].clone();
                    self.push(value)?;
                }
                Operation::OpCurrentClosure => {
                    let cl = Rc::clone(&self.current_frame().cl);
                    self.push(Object::Closure(cl))?;
                }
                Operation::OpClosure => {
                    let const_index = self.read_u16_operand() as usize;
                    let num_free = self.read_u8_operand() as usize;
                    self.push_closure(const_index, num_free)?;
                }
                Operation::OpCall => {
                    let num_args = self.read_u8_operand() as usize;
                    self.execute_call(num_args)?;
                }
                Operation::OpReturnValue => {
                    let return_value = self.pop()?;
                    let frame = self.pop_frame()?;
                    if self.frames.is_empty() {
                        // a top-level return ends the program; its value is
                        // the final result
                        self.push(return_value)?;
                        self.pop()?;
                        return Ok(());
                    }
                    // discards the callee and its arguments in one step
                    self.sp = frame.base_pointer - 1;
                    self.push(return_value)?;
                }
                Operation::OpReturn => {
                    let frame = self.pop_frame()?;
                    if self.frames.is_empty() {
                        self.push(NULL)?;
                        self.pop()?;
                        return Ok(());
                    }
                    self.sp = frame.base_pointer - 1;
                    self.push(NULL)?;
                }
                Operation::OpArray => {
                    let num_elements = self.read_u16_operand() as usize;
                    let elements = self.stack[self.sp - num_elements..self.sp].to_vec();
                    self.sp -= num_elements;
                    self.push(Object::Array(elements))?;
                }
                Operation::OpHash => {
                    let num_elements = self.read_u16_operand() as usize;
                    let hash = self.build_hash(self.sp - num_elements, self.sp)?;
                    self.sp -= num_elements;
                    self.push(hash)?;
                }
                Operation::OpIndex => {
                    let index = self.pop()?;
                    let left = self.pop()?;
                    self.execute_index_expression(left, index)?;
                }
            }
        }
        Ok(())
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    fn pop_frame(&mut self) -> Result<Frame, String> {
        self.frames.pop().ok_or_else(|| "frame stack underflow".to_string())
    }

    fn read_u16_operand(&mut self) -> u16 {
        let frame = self.current_frame_mut();
        let ip = frame.ip as usize;
        let value = read_u16(&frame.instructions()[ip + 1..]);
        frame.ip += 2;
        value
    }

    fn read_u8_operand(&mut self) -> u8 {
        let frame = self.current_frame_mut();
        let ip = frame.ip as usize;
        let value = read_u8(&frame.instructions()[ip + 1..]);
        frame.ip += 1;
        value
    }

    fn push(&mut self, obj: Object) -> Result<(), String> {
        if self.sp >= STACK_SIZE {
            return Err("stack overflow".to_string());
        }
        self.stack[self.sp] = obj;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Object, String> {
        if self.sp == 0 {
            return Err("stack underflow".to_string());
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    fn execute_binary_operation(&mut self, op: Operation) -> Result<(), String> {
        let right = self.pop()?;
        let left = self.pop()?;

        match (&left, &right) {
            (Object::Integer(l), Object::Integer(r)) => {
                self.execute_binary_integer_operation(op, *l, *r)
            }
            (Object::String(l), Object::String(r)) if op == Operation::OpAdd => {
                self.push(Object::String(l.clone() + r))
            }
            _ => Err(format!(
                "unsupported types for binary operation: {} {}",
                left.type_name(),
                right.type_name()
            )),
        }
    }

    fn execute_binary_integer_operation(
        &mut self,
        op: Operation,
        left: i64,
        right: i64,
    ) -> Result<(), String> {
        let result = match op {
            Operation::OpAdd => left.wrapping_add(right),
            Operation::OpSub => left.wrapping_sub(right),
            Operation::OpMul => left.wrapping_mul(right),
            Operation::OpDiv => {
                if right == 0 {
                    return Err("division by zero".to_string());
                }
                left.wrapping_div(right)
            }
            _ => return Err(format!("unknown integer operator: {}", op.symbol())),
        };
        self.push(Object::Integer(result))
    }

    fn execute_comparison(&mut self, op: Operation) -> Result<(), String> {
        let right = self.pop()?;
        let left = self.pop()?;

        if let (Object::Integer(l), Object::Integer(r)) = (&left, &right) {
            return match op {
                Operation::OpEqual => self.push(bool_to_object(l == r)),
                Operation::OpNotEqual => self.push(bool_to_object(l != r)),
                Operation::OpGreaterThan => self.push(bool_to_object(l > r)),
                _ => Err(format!("unknown operator: {}", op.symbol())),
            };
        }

        match op {
            Operation::OpEqual => self.push(bool_to_object(left == right)),
            Operation::OpNotEqual => self.push(bool_to_object(left != right)),
            _ => Err(format!(
                "unknown operator: {} ({} {})",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )),
        }
    }

    fn build_hash(&self, start: usize, end: usize) -> Result<Object, String> {
        let mut pairs = BTreeMap::new();

        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();

            let hash_key = HashKey::from_object(&key)?;
            pairs.insert(hash_key, HashPair { key, value });

            i += 2;
        }

        Ok(Object::Hash(pairs))
    }

    fn execute_index_expression(&mut self, left: Object, index: Object) -> Result<(), String> {
        match (left, index) {
            (Object::Array(elements), Object::Integer(i)) => {
                let max = elements.len() as i64 - 1;
                if i < 0 || i > max {
                    self.push(NULL)
                } else {
                    self.push(elements[i as usize].clone())
                }
            }
            (Object::Hash(pairs), index) => {
                let key = HashKey::from_object(&index)?;
                match pairs.get(&key) {
                    Some(pair) => self.push(pair.value.clone()),
                    None => self.push(NULL),
                }
            }
            (left, _) => Err(format!(
                "index operator not supported: {}",
                left.type_name()
            )),
        }
    }

    fn execute_call(&mut self, num_args: usize) -> Result<(), String> {
        let callee = self.stack[self.sp - 1 - num_args].clone();
        match callee {
            Object::Closure(cl) => self.call_closure(cl, num_args),
            Object::Builtin(builtin) => self.call_builtin(builtin, num_args),
            _ => Err("calling non-closure and non-built-in".to_string()),
        }
    }

    fn call_closure(&mut self, cl: Rc<Closure>, num_args: usize) -> Result<(), String> {
        if num_args != cl.func.num_parameters {
            return Err(format!(
                "wrong number of arguments: want={}, got={}",
                cl.func.num_parameters, num_args
            ));
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err("stack overflow".to_string());
        }

        // the arguments already sit in the first num_args local slots
        let base_pointer = self.sp - num_args;
        let num_locals = cl.func.num_locals;
        if base_pointer + num_locals > STACK_SIZE {
            return Err("stack overflow".to_string());
        }

        self.frames.push(Frame::new(cl, base_pointer));
        self.sp = base_pointer + num_locals;
        Ok(())
    }

    fn call_builtin(&mut self, builtin: BuiltinFunction, num_args: usize) -> Result<(), String> {
        let args = self.stack[self.sp - num_args..self.sp].to_vec();

        let result = builtin.call(args);
        self.sp = self.sp - num_args - 1;

        match result {
            Some(obj) => self.push(obj),
            None => self.push(NULL),
        }
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> Result<(), String> {
        let constant = self.constants[const_index].clone();
        let function = match constant {
            Object::CompiledFunction(func) => func,
            other => return Err(format!("not a function: {}", other)),
        };

        // captured bottom-up: free[0] is the deepest of the num_free slots
        let free = self.stack[self.sp - num_free..self.sp].to_vec();
        self.sp -= num_free;

        self.push(Object::Closure(Rc::new(Closure {
            func: function,
            free,
        })))
    }
}

fn bool_to_object(value: bool) -> Object {
    if value {
        TRUE
    } else {
        FALSE
    }
}

fn is_truthy(obj: &Object) -> bool {
    match obj {
        Object::Boolean(b) => *b,
        Object::Null => false,
        _ => true,
    }
}
