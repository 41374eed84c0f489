use crate::error::Error;
use crate::instr::{Funct, Instruction, Reg, FP, IMM_BITS, JUMP_BITS, RESULT, SCRATCH, SP, ZERO};
use crate::symtab::SymbolTable;
use crate::syntax::{Block, Expr, Op2, Program, Stmt};
use tracing::{debug, info};

type R = Result<Vec<Instruction>, Error>;

/// Lowers a whole program. The symbol table lives only for this call.
pub fn compile(program: &Program) -> R {
    let mut symbols = SymbolTable::new();
    let code = lower_block(&mut symbols, &program.block)?;
    for (name, offset) in symbols.iter() {
        debug!(name, offset, "frame slot");
    }
    info!(
        statements = program.block.len(),
        variables = symbols.len(),
        instructions = code.len(),
        "lowered program"
    );
    Ok(code)
}

fn lower_block(symbols: &mut SymbolTable, block: &Block) -> R {
    let mut code = Vec::new();
    for stmt in block {
        let lowered = lower_stmt(symbols, stmt)?;
        debug!(kind = stmt_kind(stmt), instructions = lowered.len(), "lowered statement");
        code.extend(lowered);
    }
    Ok(code)
}

fn lower_stmt(symbols: &mut SymbolTable, stmt: &Stmt) -> R {
    match stmt {
        Stmt::Declaration(name) => {
            let offset = symbols.declare(name)?;
            frame_offset(offset)?;
            Ok(push(ZERO))
        }
        Stmt::Assignment(name, e) => {
            let offset = frame_offset(symbols.lookup(name)?)?;
            let mut code = lower_expr(symbols, e)?;
            code.push(Instruction::immediate("sw", FP, RESULT, offset));
            Ok(code)
        }
        Stmt::Print(e) => {
            let mut code = lower_expr(symbols, e)?;
            code.push(Instruction::PrintOp);
            Ok(code)
        }
        Stmt::If(cond, true_part, false_part) => {
            let mut code = lower_expr(symbols, cond)?;
            let mut true_code = lower_block(symbols, true_part)?;
            let false_code = match false_part {
                Some(block) => lower_block(symbols, block)?,
                None => Vec::new(),
            };
            code.push(branch_if_zero(true_code.len() as i64 + 1)?);
            true_code.push(jump(false_code.len() as i64)?);
            code.extend(true_code);
            code.extend(false_code);
            Ok(code)
        }
        Stmt::While(cond, body) => {
            let mut code = lower_expr(symbols, cond)?;
            let body_code = lower_block(symbols, body)?;
            // Lands on the first instruction of the condition.
            let back = -(code.len() as i64 + body_code.len() as i64 + 2);
            code.push(branch_if_zero(body_code.len() as i64 + 1)?);
            code.extend(body_code);
            code.push(jump(back)?);
            Ok(code)
        }
    }
}

/// Leaves the value of `expr` in `RESULT`. `SP` and `SCRATCH` hold their
/// entry values again once the sequence falls through.
fn lower_expr(symbols: &SymbolTable, expr: &Expr) -> R {
    match expr {
        Expr::Int(n) => {
            let bits = *n as u32;
            Ok(vec![
                Instruction::immediate("lhi", ZERO, RESULT, (bits >> 16) as u16),
                Instruction::immediate("llo", ZERO, RESULT, bits as u16),
            ])
        }
        Expr::Var(name) => {
            let offset = frame_offset(symbols.lookup(name)?)?;
            Ok(vec![Instruction::immediate("lw", FP, RESULT, offset)])
        }
        Expr::Additive(lhs, op, rhs) => {
            let combine = match op {
                Op2::Add => Instruction::register("add", RESULT, SCRATCH, RESULT, Funct::Add),
                Op2::Sub => Instruction::register("sub", SCRATCH, RESULT, RESULT, Funct::Sub),
                _ => return Err(unknown_operator("additive", *op)),
            };
            binary(symbols, lhs, rhs, vec![combine])
        }
        Expr::Logical(lhs, op, rhs) => {
            let combine = match op {
                Op2::And => Instruction::register("and", RESULT, SCRATCH, RESULT, Funct::And),
                Op2::Or => Instruction::register("or", RESULT, SCRATCH, RESULT, Funct::Or),
                _ => return Err(unknown_operator("logical", *op)),
            };
            binary(symbols, lhs, rhs, vec![combine])
        }
        Expr::Relational(lhs, op, rhs) => {
            let tail = match op {
                Op2::Eq => equality(),
                Op2::LT => vec![Instruction::register("slt", SCRATCH, RESULT, RESULT, Funct::Slt)],
                Op2::GT => vec![Instruction::register("slt", RESULT, SCRATCH, RESULT, Funct::Slt)],
                _ => return Err(unknown_operator("relational", *op)),
            };
            binary(symbols, lhs, rhs, tail)
        }
        Expr::Multiplicative(_, op, _) => match op {
            Op2::Mul | Op2::Div => Err(Error::Unimplemented(format!(
                "operator '{}' cannot be lowered to the accumulator",
                op.symbol()
            ))),
            _ => Err(unknown_operator("multiplicative", *op)),
        },
        Expr::Not(e) => {
            let mut code = lower_expr(symbols, e)?;
            code.push(Instruction::register("nor", RESULT, ZERO, RESULT, Funct::Nor));
            Ok(code)
        }
    }
}

/// Evaluates `lhs` then `rhs`, with the left value popped into `SCRATCH`
/// and the right value in `RESULT` when `tail` runs.
fn binary(symbols: &SymbolTable, lhs: &Expr, rhs: &Expr, tail: Vec<Instruction>) -> R {
    let mut code = lower_expr(symbols, lhs)?;
    code.extend(push(RESULT));
    code.extend(lower_expr(symbols, rhs)?);
    code.extend(pop(SCRATCH));
    code.extend(tail);
    Ok(code)
}

/// Sets `RESULT` to 1 when `SCRATCH == RESULT`, 0 otherwise.
fn equality() -> Vec<Instruction> {
    vec![
        Instruction::immediate("beq", SCRATCH, RESULT, 2),
        Instruction::register("or", ZERO, ZERO, RESULT, Funct::Or),
        Instruction::JumpOp { addr: 2 },
        Instruction::immediate("lhi", ZERO, RESULT, 0),
        Instruction::immediate("llo", ZERO, RESULT, 1),
    ]
}

fn push(r: Reg) -> Vec<Instruction> {
    vec![
        Instruction::immediate("addi", SP, SP, (-4i16) as u16),
        Instruction::immediate("sw", SP, r, 0),
    ]
}

fn pop(r: Reg) -> Vec<Instruction> {
    vec![
        Instruction::immediate("lw", SP, r, 0),
        Instruction::immediate("addi", SP, SP, 4),
    ]
}

fn branch_if_zero(skip: i64) -> Result<Instruction, Error> {
    let imm = signed_field(skip, IMM_BITS)? as u16;
    Ok(Instruction::immediate("beq", RESULT, ZERO, imm))
}

fn jump(offset: i64) -> Result<Instruction, Error> {
    let addr = signed_field(offset, JUMP_BITS)? as i32;
    Ok(Instruction::JumpOp { addr })
}

fn signed_field(value: i64, bits: u32) -> Result<i64, Error> {
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    if value < min || value > max {
        return Err(Error::RangeOverflow { value, bits });
    }
    Ok(value)
}

// The load/store immediate is sign-extended, so offsets stop at i16::MAX.
fn frame_offset(offset: u32) -> Result<u16, Error> {
    if offset > i16::max_value() as u32 {
        return Err(Error::RangeOverflow {
            value: i64::from(offset),
            bits: IMM_BITS,
        });
    }
    Ok(offset as u16)
}

fn unknown_operator(kind: &str, op: Op2) -> Error {
    Error::UnknownOperator(format!("'{}' in {} expression", op.symbol(), kind))
}

fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Declaration(_) => "declaration",
        Stmt::Assignment(_, _) => "assignment",
        Stmt::Print(_) => "print",
        Stmt::If(_, _, _) => "if",
        Stmt::While(_, _) => "while",
    }
}
