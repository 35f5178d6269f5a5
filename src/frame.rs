use std::rc::Rc;

use crate::code::Instructions;
use crate::object::Closure;

/// One activation of a closure. `ip` starts at -1 so the fetch loop can
/// pre-increment; `base_pointer` marks where the frame's locals begin on
/// the value stack.
pub struct Frame {
    pub cl: Rc<Closure>,
    pub ip: i64,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(cl: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            cl,
            ip: -1,
            base_pointer,
        }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.cl.func.instructions
    }
}
