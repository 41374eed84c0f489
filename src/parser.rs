use crate::error::Error;
use crate::syntax::*;

use combine::error::ParseError;
use combine::parser::char::{alpha_num, char, digit, letter, spaces, string};
use combine::stream::easy;
use combine::stream::Stream;
use combine::{
    attempt, between, eof, many, many1, optional, satisfy, satisfy_map, sep_end_by, skip_many,
    token, Parser,
};
use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Tok {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Assign,
    Var,
    Print,
    If,
    Else,
    While,
    Not,
    Op2(Op2),
    Int(i32),
    Id(String),
    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn word(w: String) -> Tok {
    match w.as_str() {
        "var" => Tok::Var,
        "print" => Tok::Print,
        "if" => Tok::If,
        "else" => Tok::Else,
        "while" => Tok::While,
        "not" => Tok::Not,
        "and" => Tok::Op2(Op2::And),
        "or" => Tok::Op2(Op2::Or),
        _ => Tok::Id(w),
    }
}

// Whitespace and `//` comments.
fn trivia<I>() -> impl Parser<Input = I, Output = ()>
where
    I: Stream<Item = char>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    let comment = attempt(string("//")).with(skip_many(satisfy(|c: char| c != '\n')));
    spaces().with(skip_many(comment.skip(spaces())))
}

fn lex(s: &str) -> Result<Vec<Tok>, easy::ParseError<&str>> {
    let tok = char('{')
        .map(|_x| Tok::LBrace)
        .or(char('}').map(|_x| Tok::RBrace))
        .or(char('(').map(|_x| Tok::LParen))
        .or(char(')').map(|_x| Tok::RParen))
        .or(char(';').map(|_x| Tok::Semi))
        .or(string(":=").map(|_x| Tok::Assign))
        .or(string("==").map(|_x| Tok::Op2(Op2::Eq)))
        .or(char('<').map(|_x| Tok::Op2(Op2::LT)))
        .or(char('>').map(|_x| Tok::Op2(Op2::GT)))
        .or(char('+').map(|_x| Tok::Op2(Op2::Add)))
        .or(char('-').map(|_x| Tok::Op2(Op2::Sub)))
        .or(char('*').map(|_x| Tok::Op2(Op2::Mul)))
        .or(char('/').map(|_x| Tok::Op2(Op2::Div)))
        .or(many1(digit()).and_then(|digits: String| digits.parse::<i32>().map(Tok::Int)))
        .or((letter().or(char('_')), many(alpha_num().or(char('_')))).map(
            |(first, rest): (char, String)| {
                let mut w = first.to_string();
                w.push_str(&rest);
                word(w)
            },
        ));

    let mut toks = trivia().with(sep_end_by(tok, trivia())).skip(eof()).map(
        |mut tokens: Vec<Tok>| {
            tokens.push(Tok::Eof);
            tokens
        },
    );
    toks.easy_parse(s).map(|tuple| tuple.0)
}

fn ident<I>() -> impl Parser<Input = I, Output = String>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    satisfy_map(|t| match t {
        Tok::Id(s) => Option::Some(s),
        _ => Option::None,
    })
}

fn int<I>() -> impl Parser<Input = I, Output = i32>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    satisfy_map(|t| match t {
        Tok::Int(n) => Option::Some(n),
        _ => Option::None,
    })
}

fn op2<I>(ops: &'static [Op2]) -> impl Parser<Input = I, Output = Op2>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    satisfy_map(move |t| match t {
        Tok::Op2(op) if ops.contains(&op) => Option::Some(op),
        _ => Option::None,
    })
}

// Left-associative chain of `first op operand op operand ...`.
fn fold(first: Expr, rest: Vec<(Op2, Expr)>, node: fn(Box<Expr>, Op2, Box<Expr>) -> Expr) -> Expr {
    rest.into_iter()
        .fold(first, |lhs, (op, rhs)| node(Box::new(lhs), op, Box::new(rhs)))
}

fn atom<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    int()
        .map(|n| Expr::Int(n))
        .or(ident().map(|x| Expr::Var(x)))
        .or(between(token(Tok::LParen), token(Tok::RParen), expr()))
}

fn unary_<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    token(Tok::Not)
        .with(unary())
        .map(|e| Expr::Not(Box::new(e)))
        .or(atom())
}

parser!{
    fn unary[I]()(I) -> Expr
    where [I: Stream<Item = Tok>]
    {
        unary_()
    }
}

fn multiplicative<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    (unary(), many((op2(&[Op2::Mul, Op2::Div]), unary())))
        .map(|(first, rest): (Expr, Vec<(Op2, Expr)>)| fold(first, rest, Expr::Multiplicative))
}

fn additive<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    (multiplicative(), many((op2(&[Op2::Add, Op2::Sub]), multiplicative())))
        .map(|(first, rest): (Expr, Vec<(Op2, Expr)>)| fold(first, rest, Expr::Additive))
}

fn relational<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    (additive(), many((op2(&[Op2::Eq, Op2::LT, Op2::GT]), additive())))
        .map(|(first, rest): (Expr, Vec<(Op2, Expr)>)| fold(first, rest, Expr::Relational))
}

fn logical<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    (relational(), many((op2(&[Op2::And, Op2::Or]), relational())))
        .map(|(first, rest): (Expr, Vec<(Op2, Expr)>)| fold(first, rest, Expr::Logical))
}

parser!{
    fn expr[I]()(I) -> Expr
    where [I: Stream<Item = Tok>]
    {
        logical()
    }
}

fn statements<I>() -> impl Parser<Input = I, Output = Block>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    many(stmt()).map(|groups: Vec<Vec<Stmt>>| groups.into_iter().flatten().collect::<Block>())
}

fn block<I>() -> impl Parser<Input = I, Output = Block>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    between(token(Tok::LBrace), token(Tok::RBrace), statements())
}

fn condition<I>() -> impl Parser<Input = I, Output = Expr>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    between(token(Tok::LParen), token(Tok::RParen), expr())
}

// A statement may desugar into several (`var x := e;`).
fn stmt_<I>() -> impl Parser<Input = I, Output = Vec<Stmt>>
where
    I: Stream<Item = Tok>,
    I::Error: ParseError<I::Item, I::Range, I::Position>,
{
    let declaration = token(Tok::Var)
        .with(ident())
        .and(optional(token(Tok::Assign).with(expr())))
        .skip(token(Tok::Semi))
        .map(|(name, init)| match init {
            None => vec![Stmt::Declaration(name)],
            Some(e) => vec![Stmt::Declaration(name.clone()), Stmt::Assignment(name, e)],
        });

    let assignment = ident()
        .skip(token(Tok::Assign))
        .and(expr())
        .skip(token(Tok::Semi))
        .map(|(name, e)| vec![Stmt::Assignment(name, e)]);

    let print = token(Tok::Print)
        .with(expr())
        .skip(token(Tok::Semi))
        .map(|e| vec![Stmt::Print(e)]);

    let if_ = token(Tok::If)
        .with(condition())
        .and(block())
        .and(optional(token(Tok::Else).with(block())))
        .map(|((c, tru), fls)| vec![Stmt::If(c, tru, fls)]);

    let while_ = token(Tok::While)
        .with(condition())
        .and(block())
        .map(|(c, body)| vec![Stmt::While(c, body)]);

    declaration.or(assignment).or(print).or(if_).or(while_)
}

parser!{
    fn stmt[I]()(I) -> Vec<Stmt>
    where [I: Stream<Item = Tok>]
    {
        stmt_()
    }
}

pub fn parse(input: &str) -> Result<Program, Error> {
    match lex(input) {
        Result::Err(e) => Result::Err(Error::Parse(format!("{:?}", e))),
        Result::Ok(tokens) => {
            let mut ast = statements().skip(token(Tok::Eof));
            match ast.easy_parse(&tokens[..]) {
                Result::Err(e) => Result::Err(Error::Parse(format!("{:?}", e))),
                Result::Ok(tuple) => Result::Ok(Program { block: tuple.0 }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i32) -> Box<Expr> {
        Box::new(Expr::Int(n))
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    #[test]
    fn test_lex_keywords_and_identifiers() {
        let toks = lex("var variable := printer; // not a token\n while_").unwrap();
        assert_eq!(
            toks,
            vec![
                Tok::Var,
                Tok::Id("variable".to_string()),
                Tok::Assign,
                Tok::Id("printer".to_string()),
                Tok::Semi,
                Tok::Id("while_".to_string()),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_operators() {
        let toks = lex("a==b<c>d+e-f*g/h").unwrap();
        let ops: Vec<Op2> = toks
            .into_iter()
            .filter_map(|t| match t {
                Tok::Op2(op) => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![Op2::Eq, Op2::LT, Op2::GT, Op2::Add, Op2::Sub, Op2::Mul, Op2::Div]
        );
    }

    #[test]
    fn test_literal_out_of_range() {
        assert!(lex("print 2147483647;").is_ok());
        assert!(parse("print 2147483648;").is_err());
    }

    #[test]
    fn test_var_with_initializer() {
        let program = parse("var x := 5; print x;").unwrap();
        assert_eq!(
            program.block,
            vec![
                Stmt::Declaration("x".to_string()),
                Stmt::Assignment("x".to_string(), Expr::Int(5)),
                Stmt::Print(Expr::Var("x".to_string())),
            ]
        );
    }

    #[test]
    fn test_precedence() {
        let program = parse("print not a + 1 < b and c == 2;").unwrap();
        let lhs = Expr::Relational(
            Box::new(Expr::Additive(Box::new(Expr::Not(var("a"))), Op2::Add, int(1))),
            Op2::LT,
            var("b"),
        );
        let rhs = Expr::Relational(var("c"), Op2::Eq, int(2));
        assert_eq!(
            program.block,
            vec![Stmt::Print(Expr::Logical(Box::new(lhs), Op2::And, Box::new(rhs)))]
        );
    }

    #[test]
    fn test_left_associative() {
        let program = parse("print 10 - 3 - 2;").unwrap();
        let expected = Expr::Additive(
            Box::new(Expr::Additive(int(10), Op2::Sub, int(3))),
            Op2::Sub,
            int(2),
        );
        assert_eq!(program.block, vec![Stmt::Print(expected)]);
    }

    #[test]
    fn test_control_flow() {
        let program = parse(
            r#"
            var x;
            while (x > 0) {
                if (x == 1) { print x; } else { x := (x - 1); }
            }
            if (1) { }"#,
        )
        .unwrap();
        let body = vec![Stmt::If(
            Expr::Relational(var("x"), Op2::Eq, int(1)),
            vec![Stmt::Print(Expr::Var("x".to_string()))],
            Some(vec![Stmt::Assignment(
                "x".to_string(),
                Expr::Additive(var("x"), Op2::Sub, int(1)),
            )]),
        )];
        assert_eq!(
            program.block,
            vec![
                Stmt::Declaration("x".to_string()),
                Stmt::While(Expr::Relational(var("x"), Op2::GT, int(0)), body),
                Stmt::If(Expr::Int(1), vec![], None),
            ]
        );
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse("  // nothing\n").unwrap().block, vec![]);
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse("print 1; }").is_err());
        assert!(parse("print 1; $").is_err());
    }

    #[test]
    fn test_keyword_is_not_identifier() {
        assert!(parse("var while;").is_err());
    }
}
