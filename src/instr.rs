use crate::error::Error;
use std::fmt;

/// A machine register. Only the named constants below are ever emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(u8);

pub const ZERO: Reg = Reg(0);
/// Accumulator: every lowered expression leaves its value here.
pub const RESULT: Reg = Reg(2);
/// Holds the popped left operand of a binary operation.
pub const SCRATCH: Reg = Reg(8);
pub const SP: Reg = Reg(29);
pub const FP: Reg = Reg(30);

impl Reg {
    #[cfg(test)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funct {
    Add,
    And,
    Div,
    Mult,
    Nor,
    Or,
    Slt,
    Sll,
    Sra,
    Srl,
    Sub,
    Xor,
}

impl Funct {
    pub fn code(self) -> u32 {
        match self {
            Funct::Add => 0b100000,
            Funct::And => 0b100100,
            Funct::Div => 0b011010,
            Funct::Mult => 0b011000,
            Funct::Nor => 0b100111,
            Funct::Or => 0b100101,
            Funct::Slt => 0b101010,
            Funct::Sll => 0b000000,
            Funct::Sra => 0b000011,
            Funct::Srl => 0b000010,
            Funct::Sub => 0b100010,
            Funct::Xor => 0b100110,
        }
    }
}

const OPCODES: &[(&str, u32)] = &[
    ("ADDI", 0b001000),
    ("ANDI", 0b001100),
    ("ORI", 0b001101),
    ("XORI", 0b001110),
    ("LHI", 0b011001),
    ("LLO", 0b011000),
    ("SLTI", 0b001010),
    ("BEQ", 0b000100),
    ("BGTZ", 0b000111),
    ("BLEZ", 0b000110),
    ("BNE", 0b000101),
    ("J", 0b000010),
    ("JR", 0b001000),
    ("LW", 0b100011),
    ("SW", 0b101011),
];

pub const JUMP_OPCODE: u32 = 0b000010;

/// Reserved word the executor reads as "print the accumulator".
pub const PRINT_WORD: u32 = 0xFFFF_FFFF;

pub const IMM_BITS: u32 = 16;
pub const JUMP_BITS: u32 = 26;

pub fn opcode(mnemonic: &str) -> Result<u32, Error> {
    let upper = mnemonic.to_uppercase();
    OPCODES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, code)| *code)
        .ok_or_else(|| Error::UnknownOpcode(mnemonic.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    RegisterOp {
        name: &'static str,
        rs: Reg,
        rt: Reg,
        rd: Reg,
        shamt: u8,
        funct: Funct,
    },
    /// `imm` is the raw 16-bit field; signed quantities are stored in
    /// two's complement.
    ImmediateOp {
        name: &'static str,
        rs: Reg,
        rt: Reg,
        imm: u16,
    },
    /// Offset in instructions, relative to the instruction that follows.
    JumpOp { addr: i32 },
    PrintOp,
}

impl Instruction {
    pub fn register(name: &'static str, rs: Reg, rt: Reg, rd: Reg, funct: Funct) -> Instruction {
        Instruction::RegisterOp {
            name,
            rs,
            rt,
            rd,
            shamt: 0,
            funct,
        }
    }

    pub fn immediate(name: &'static str, rs: Reg, rt: Reg, imm: u16) -> Instruction {
        Instruction::ImmediateOp { name, rs, rt, imm }
    }
}

/// Encodes one instruction as a 32-bit word.
pub fn encode(instr: &Instruction) -> Result<u32, Error> {
    match instr {
        Instruction::RegisterOp {
            rs,
            rt,
            rd,
            shamt,
            funct,
            ..
        } => Ok(reg_field(*rs, 21)
            | reg_field(*rt, 16)
            | reg_field(*rd, 11)
            | (u32::from(*shamt) & 0x1f) << 6
            | funct.code()),
        Instruction::ImmediateOp { name, rs, rt, imm } => {
            let op = opcode(name)?;
            Ok(op << 26 | reg_field(*rs, 21) | reg_field(*rt, 16) | u32::from(*imm))
        }
        Instruction::JumpOp { addr } => {
            Ok(JUMP_OPCODE << 26 | (*addr as u32) & ((1 << JUMP_BITS) - 1))
        }
        Instruction::PrintOp => Ok(PRINT_WORD),
    }
}

fn reg_field(r: Reg, shift: u32) -> u32 {
    (u32::from(r.0) & 0x1f) << shift
}

pub fn to_bit_string(word: u32) -> String {
    format!("{:032b}", word)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::RegisterOp {
                name, rs, rt, rd, ..
            } => write!(f, "{} {}, {}, {}", name, rd, rs, rt),
            Instruction::ImmediateOp { name, rs, rt, imm } => match *name {
                "lw" | "sw" => write!(f, "{} {}, {}({})", name, rt, *imm as i16, rs),
                "lhi" | "llo" => write!(f, "{} {}, {}", name, rt, imm),
                "beq" | "bne" => write!(f, "{} {}, {}, {}", name, rs, rt, *imm as i16),
                _ => write!(f, "{} {}, {}, {}", name, rt, rs, *imm as i16),
            },
            Instruction::JumpOp { addr } => write!(f, "j {}", addr),
            Instruction::PrintOp => f.write_str("print"),
        }
    }
}
