// Clone is needed to tokenize.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Op2 {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    LT,
    GT,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Int(i32),
    Var(String),
    Additive(Box<Expr>, Op2, Box<Expr>),
    Multiplicative(Box<Expr>, Op2, Box<Expr>),
    Logical(Box<Expr>, Op2, Box<Expr>),
    Relational(Box<Expr>, Op2, Box<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Declaration(String),
    Assignment(String, Expr),
    Print(Expr),
    If(Expr, Block, Option<Block>),
    While(Expr, Block),
}

pub type Block = Vec<Stmt>;

#[derive(Debug, PartialEq)]
pub struct Program {
    pub block: Block,
}

impl Op2 {
    pub fn symbol(self) -> &'static str {
        match self {
            Op2::Add => "+",
            Op2::Sub => "-",
            Op2::Mul => "*",
            Op2::Div => "/",
            Op2::And => "and",
            Op2::Or => "or",
            Op2::Eq => "==",
            Op2::LT => "<",
            Op2::GT => ">",
        }
    }
}
