//! Word-level executor for tests. Understands the subset of the
//! instruction set that the code generator emits.

use crate::instr::{Reg, FP, JUMP_OPCODE, PRINT_WORD, SP};
use std::collections::HashMap;

const STEP_LIMIT: usize = 1_000_000;

pub struct Machine {
    registers: [i32; 32],
    memory: HashMap<u32, i32>,
    pub output: Vec<i32>,
}

impl Machine {
    pub fn new() -> Machine {
        let mut m = Machine {
            registers: [0; 32],
            memory: HashMap::new(),
            output: Vec::new(),
        };
        // Variables live above FP, the push/pop stack grows down from SP.
        m.set(SP, 0x8000);
        m.set(FP, 0x1_0000);
        m
    }

    pub fn get(&self, r: Reg) -> i32 {
        self.registers[r.index()]
    }

    pub fn set(&mut self, r: Reg, v: i32) {
        self.write(r.index(), v)
    }

    fn write(&mut self, r: usize, v: i32) {
        if r != 0 {
            self.registers[r] = v;
        }
    }

    pub fn execute(&mut self, words: &[u32]) -> Result<(), String> {
        let mut pc: i64 = 0;
        let mut steps = 0;
        while pc != words.len() as i64 {
            if pc < 0 || pc > words.len() as i64 {
                return Err(format!("pc {} out of bounds", pc));
            }
            steps += 1;
            if steps > STEP_LIMIT {
                return Err("step limit exceeded".to_string());
            }
            let word = words[pc as usize];
            pc += 1;
            if word == PRINT_WORD {
                let v = self.registers[2];
                self.output.push(v);
                continue;
            }
            let rs = ((word >> 21) & 0x1f) as usize;
            let rt = ((word >> 16) & 0x1f) as usize;
            let rd = ((word >> 11) & 0x1f) as usize;
            let imm = word & 0xffff;
            let simm = i64::from(imm as u16 as i16);
            let a = self.registers[rs];
            let b = self.registers[rt];
            match word >> 26 {
                0 => {
                    let v = match word & 0x3f {
                        0b100000 => a.wrapping_add(b),
                        0b100010 => a.wrapping_sub(b),
                        0b100100 => a & b,
                        0b100101 => a | b,
                        0b100111 => !(a | b),
                        0b101010 => (a < b) as i32,
                        f => return Err(format!("unsupported funct {:06b}", f)),
                    };
                    self.write(rd, v);
                }
                0b001000 => self.write(rt, a.wrapping_add(simm as i32)),
                0b011001 => self.write(rt, ((imm << 16) | (b as u32 & 0xffff)) as i32),
                0b011000 => self.write(rt, ((b as u32 & 0xffff_0000) | imm) as i32),
                0b000100 => {
                    if a == b {
                        pc += simm;
                    }
                }
                op if op == JUMP_OPCODE => pc += i64::from(((word << 6) as i32) >> 6),
                0b100011 => {
                    let addr = a.wrapping_add(simm as i32) as u32;
                    let v = *self.memory.get(&addr).unwrap_or(&0);
                    self.write(rt, v);
                }
                0b101011 => {
                    let addr = a.wrapping_add(simm as i32) as u32;
                    self.memory.insert(addr, b);
                }
                op => return Err(format!("unsupported opcode {:06b}", op)),
            }
        }
        Ok(())
    }
}

/// Runs a program from scratch and returns what it printed.
pub fn run(words: &[u32]) -> Result<Vec<i32>, String> {
    let mut m = Machine::new();
    m.execute(words)?;
    Ok(m.output)
}
