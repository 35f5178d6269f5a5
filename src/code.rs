use std::fmt::Formatter;
use std::ops::Range;
use std::{fmt, ops};

use byteorder::{BigEndian, ByteOrder};

/// A raw instruction stream: opcodes with their encoded operands.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    pub fn new(vec: Vec<u8>) -> Self {
        Instructions(vec)
    }

    fn format_instruction(def: &Definition, operands: &[i32]) -> Result<String, String> {
        let operand_count = def.operand_widths.len();

        if operands.len() != operand_count {
            return Err(format!(
                "operand len {} does not match defined {}",
                operands.len(),
                operand_count
            ));
        }

        match operand_count {
            0 => Ok(def.name.to_string()),
            1 => Ok(format!("{} {}", def.name, operands[0])),
            2 => Ok(format!("{} {} {}", def.name, operands[0], operands[1])),
            _ => Err(format!("unhandled operand count for {}", def.name)),
        }
    }

    /// Renders the stream as a `pos: OPNAME operands` listing.
    pub fn to_string(&self) -> Result<String, String> {
        let mut out = String::new();

        let mut pos = 0;
        while pos < self.0.len() {
            let def = match DEFINITIONS.get(self.0[pos] as usize) {
                None => {
                    return Err(format!(
                        "invalid opcode appeared: pos {}, value {}",
                        pos, self.0[pos]
                    ))
                }
                Some(def) => def,
            };

            let (operands, read) = read_operands(def, &self.0[(pos + 1)..])?;

            out += format!("{:0>4} {}\n", pos, Self::format_instruction(def, &operands)?).as_str();
            pos += 1 + read;
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append_vec(&mut self, other: &mut Vec<u8>) {
        self.0.append(other)
    }

    /// Drops everything at and after `pos`. Used to erase the most
    /// recently emitted instruction.
    pub fn truncate(&mut self, pos: usize) {
        self.0.truncate(pos);
    }

    /// Overwrites the bytes at `pos`; the replacement must be the same
    /// length as the instruction it patches.
    pub fn replace_at(&mut self, pos: usize, bytes: &[u8]) {
        self.0[pos..pos + bytes.len()].copy_from_slice(bytes);
    }
}

impl ops::Index<usize> for Instructions {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl ops::Index<Range<usize>> for Instructions {
    type Output = [u8];

    fn index(&self, index: Range<usize>) -> &Self::Output {
        &self.0[index]
    }
}

impl ops::Index<ops::RangeFrom<usize>> for Instructions {
    type Output = [u8];

    fn index(&self, index: ops::RangeFrom<usize>) -> &Self::Output {
        &self.0[index]
    }
}

pub type Opcode = u8;

#[derive(Eq, PartialEq)]
pub struct Definition<'a> {
    name: &'a str,
    operand_widths: &'a [usize],
}

// indexed by opcode byte; must stay in sync with Operation
pub const DEFINITIONS: &[Definition] = &[
    Definition {
        name: "OpConstant",
        operand_widths: &[2],
    },
    Definition {
        name: "OpPop",
        operand_widths: &[],
    },
    Definition {
        name: "OpAdd",
        operand_widths: &[],
    },
    Definition {
        name: "OpSub",
        operand_widths: &[],
    },
    Definition {
        name: "OpMul",
        operand_widths: &[],
    },
    Definition {
        name: "OpDiv",
        operand_widths: &[],
    },
    Definition {
        name: "OpEqual",
        operand_widths: &[],
    },
    Definition {
        name: "OpNotEqual",
        operand_widths: &[],
    },
    Definition {
        name: "OpGreaterThan",
        operand_widths: &[],
    },
    Definition {
        name: "OpMinus",
        operand_widths: &[],
    },
    Definition {
        name: "OpBang",
        operand_widths: &[],
    },
    Definition {
        name: "OpTrue",
        operand_widths: &[],
    },
    Definition {
        name: "OpFalse",
        operand_widths: &[],
    },
    Definition {
        name: "OpNull",
        operand_widths: &[],
    },
    Definition {
        name: "OpJump",
        operand_widths: &[2],
    },
    Definition {
        name: "OpJumpNotTruthy",
        operand_widths: &[2],
    },
    Definition {
        name: "OpSetGlobal",
        operand_widths: &[2],
    },
    Definition {
        name: "OpGetGlobal",
        operand_widths: &[2],
    },
    Definition {
        name: "OpSetLocal",
        operand_widths: &[1],
    },
    Definition {
        name: "OpGetLocal",
        operand_widths: &[1],
    },
    Definition {
        name: "OpGetBuiltin",
        operand_widths: &[1],
    },
    Definition {
        name: "OpGetFree",
        operand_widths: &[1],
    },
    Definition {
        name: "OpCurrentClosure",
        operand_widths: &[],
    },
    Definition {
        name: "OpClosure",
        operand_widths: &[2, 1],
    },
    Definition {
        name: "OpCall",
        operand_widths: &[1],
    },
    Definition {
        name: "OpReturnValue",
        operand_widths: &[],
    },
    Definition {
        name: "OpReturn",
        operand_widths: &[],
    },
    Definition {
        name: "OpArray",
        operand_widths: &[2],
    },
    Definition {
        name: "OpHash",
        operand_widths: &[2],
    },
    Definition {
        name: "OpIndex",
        operand_widths: &[],
    },
];

pub fn lookup(op: &Operation) -> &'static Definition<'static> {
    &DEFINITIONS[op.as_byte() as usize]
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Operation {
    OpConstant,
    OpPop,
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpEqual,
    OpNotEqual,
    OpGreaterThan,
    OpMinus,
    OpBang,
    OpTrue,
    OpFalse,
    OpNull,
    OpJump,
    OpJumpNotTruthy,
    OpSetGlobal,
    OpGetGlobal,
    OpSetLocal,
    OpGetLocal,
    OpGetBuiltin,
    OpGetFree,
    OpCurrentClosure,
    OpClosure,
    OpCall,
    OpReturnValue,
    OpReturn,
    OpArray,
    OpHash,
    OpIndex,
}

impl Operation {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Operation::OpConstant),
            1 => Some(Operation::OpPop),
            2 => Some(Operation::OpAdd),
            3 => Some(Operation::OpSub),
            4 => Some(Operation::OpMul),
            5 => Some(Operation::OpDiv),
            6 => Some(Operation::OpEqual),
            7 => Some(Operation::OpNotEqual),
            8 => Some(Operation::OpGreaterThan),
            9 => Some(Operation::OpMinus),
            10 => Some(Operation::OpBang),
            11 => Some(Operation::OpTrue),
            12 => Some(Operation::OpFalse),
            13 => Some(Operation::OpNull),
            14 => Some(Operation::OpJump),
            15 => Some(Operation::OpJumpNotTruthy),
            16 => Some(Operation::OpSetGlobal),
            17 => Some(Operation::OpGetGlobal),
            18 => Some(Operation::OpSetLocal),
            19 => Some(Operation::OpGetLocal),
            20 => Some(Operation::OpGetBuiltin),
            21 => Some(Operation::OpGetFree),
            22 => Some(Operation::OpCurrentClosure),
            23 => Some(Operation::OpClosure),
            24 => Some(Operation::OpCall),
            25 => Some(Operation::OpReturnValue),
            26 => Some(Operation::OpReturn),
            27 => Some(Operation::OpArray),
            28 => Some(Operation::OpHash),
            29 => Some(Operation::OpIndex),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Opcode {
        *self as Opcode
    }

    /// The source operator this opcode implements, as it appears in
    /// diagnostics. Opcodes without an operator fall back to their name.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::OpAdd => "+",
            Operation::OpSub => "-",
            Operation::OpMul => "*",
            Operation::OpDiv => "/",
            Operation::OpEqual => "==",
            Operation::OpNotEqual => "!=",
            Operation::OpGreaterThan => ">",
            Operation::OpMinus => "-",
            Operation::OpBang => "!",
            other => DEFINITIONS[other.as_byte() as usize].name,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DEFINITIONS[self.as_byte() as usize].name)
    }
}

pub fn make(op: Opcode, operands: &[i32]) -> Option<Vec<u8>> {
    let def = DEFINITIONS.get(op as usize)?;

    let mut instruction_len = 1;
    for w in def.operand_widths {
        instruction_len += *w;
    }

    let mut instruction = Vec::with_capacity(instruction_len);
    instruction.push(op);

    for (i, operand) in operands.iter().enumerate() {
        match def.operand_widths[i] {
            2 => {
                let mut buf = [0u8; 2];
                BigEndian::write_u16(&mut buf, *operand as u16);
                instruction.extend_from_slice(&buf);
            }
            1 => {
                instruction.push(*operand as u8);
            }
            _ => unreachable!(),
        }
    }

    Some(instruction)
}

/// Decodes the operands following an opcode; returns them together with
/// the number of bytes read.
pub fn read_operands(def: &Definition, ins: &[u8]) -> Result<(Vec<i32>, usize), String> {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for width in def.operand_widths {
        match width {
            2 => operands.push(i32::from(read_u16(&ins[offset..]))),
            1 => operands.push(i32::from(read_u8(&ins[offset..]))),
            other => return Err(format!("unsupported operand width: {}", other)),
        }
        offset += *width;
    }

    Ok((operands, offset))
}

pub fn read_u16(ins: &[u8]) -> u16 {
    BigEndian::read_u16(ins)
}

pub fn read_u8(ins: &[u8]) -> u8 {
    ins[0]
}
