use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    IO(#[from] io::Error),
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Parse(String),
    #[error("variable '{0}' is declared more than once")]
    DuplicateDeclaration(String),
    #[error("variable '{0}' is used before declaration")]
    UndeclaredVariable(String),
    #[error("unknown operator {0}")]
    UnknownOperator(String),
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),
    #[error("not implemented: {0}")]
    Unimplemented(String),
    #[error("{value} does not fit in a {bits}-bit field")]
    RangeOverflow { value: i64, bits: u32 },
}
