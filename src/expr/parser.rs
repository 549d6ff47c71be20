//! Expression Parser
//!
//! Parses formula strings such as `"$A + $B * 2"` into [`ExprNode`] trees.
//!
//! # Supported Syntax
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := cmp ( "&&" cmp )*
//! cmp     := add ( ("==" | "!=" | ">=" | "<=" | ">" | "<") add )*
//! add     := mul ( ("+" | "-") mul )*
//! mul     := unary ( ("*" | "/" | "%") unary )*
//! unary   := ("!" | "-") unary | pow
//! pow     := primary ( "**" unary )?        (right associative)
//! primary := number | 'string' | $name | name(args) | ( expr )
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::expr::ast::{BinaryOp, ExprNode, UnaryOp};
use crate::expr::error::{ExprError, ExprResult};

/// Parse an expression string into a tree
pub fn parse_expression(input: &str) -> ExprResult<ExprNode> {
    match delimited(multispace0, or_expr, multispace0)(input) {
        Ok((remaining, node)) => {
            if remaining.is_empty() {
                Ok(node)
            } else {
                Err(ExprError::Parse(format!(
                    "unexpected input after expression: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(e) => Err(ExprError::Parse(format!("invalid expression: {:?}", e))),
    }
}

fn binary_fold(first: ExprNode, rest: Vec<(BinaryOp, ExprNode)>) -> ExprNode {
    rest.into_iter().fold(first, |lhs, (op, rhs)| ExprNode::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn or_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(pair(
        value(BinaryOp::Or, ws(tag("||"))),
        and_expr,
    ))(input)?;
    Ok((input, binary_fold(first, rest)))
}

fn and_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, first) = cmp_expr(input)?;
    let (input, rest) = many0(pair(
        value(BinaryOp::And, ws(tag("&&"))),
        cmp_expr,
    ))(input)?;
    Ok((input, binary_fold(first, rest)))
}

fn cmp_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, first) = add_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Eq, tag("==")),
            value(BinaryOp::Neq, tag("!=")),
            value(BinaryOp::Gte, tag(">=")),
            value(BinaryOp::Lte, tag("<=")),
            value(BinaryOp::Gt, tag(">")),
            value(BinaryOp::Lt, tag("<")),
        ))),
        add_expr,
    ))(input)?;
    Ok((input, binary_fold(first, rest)))
}

fn add_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, first) = mul_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, tag("+")),
            value(BinaryOp::Sub, tag("-")),
        ))),
        mul_expr,
    ))(input)?;
    Ok((input, binary_fold(first, rest)))
}

fn mul_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, first) = unary_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, tag("*")),
            value(BinaryOp::Div, tag("/")),
            value(BinaryOp::Mod, tag("%")),
        ))),
        unary_expr,
    ))(input)?;
    Ok((input, binary_fold(first, rest)))
}

fn unary_expr(input: &str) -> IResult<&str, ExprNode> {
    alt((
        map(
            pair(
                ws(alt((
                    value(UnaryOp::Not, char('!')),
                    value(UnaryOp::Neg, char('-')),
                ))),
                unary_expr,
            ),
            |(op, arg)| ExprNode::Unary {
                op,
                arg: Box::new(arg),
            },
        ),
        pow_expr,
    ))(input)
}

// Exponentiation binds tighter than unary minus and associates to the
// right, so -2 ** 2 is -(2 ** 2) and 2 ** 3 ** 2 is 2 ** (3 ** 2).
fn pow_expr(input: &str) -> IResult<&str, ExprNode> {
    let (input, base) = primary(input)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), unary_expr))(input)?;
    Ok((
        input,
        match exponent {
            Some(rhs) => ExprNode::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(rhs),
            },
            None => base,
        },
    ))
}

fn primary(input: &str) -> IResult<&str, ExprNode> {
    ws(alt((
        parse_paren,
        parse_func,
        parse_var,
        parse_string,
        parse_number,
    )))(input)
}

fn parse_paren(input: &str) -> IResult<&str, ExprNode> {
    delimited(ws(char('(')), or_expr, ws(char(')')))(input)
}

fn parse_func(input: &str) -> IResult<&str, ExprNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), or_expr),
        ws(char(')')),
    )(input)?;
    Ok((
        input,
        ExprNode::Func {
            name: name.to_string(),
            args,
        },
    ))
}

fn parse_var(input: &str) -> IResult<&str, ExprNode> {
    let (input, name) = preceded(
        char('$'),
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
    )(input)?;
    Ok((input, ExprNode::Var(name.to_string())))
}

fn parse_string(input: &str) -> IResult<&str, ExprNode> {
    let (input, content) = delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)?;
    Ok((input, ExprNode::String(content.to_string())))
}

fn parse_number(input: &str) -> IResult<&str, ExprNode> {
    map(double, ExprNode::Scalar)(input)
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, lhs: ExprNode, rhs: ExprNode) -> ExprNode {
        ExprNode::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_expression("1").unwrap(), ExprNode::Scalar(1.0));
        assert_eq!(parse_expression("  2.5 ").unwrap(), ExprNode::Scalar(2.5));
        assert_eq!(parse_expression("1e3").unwrap(), ExprNode::Scalar(1000.0));
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_expression("$GA").unwrap(),
            ExprNode::Var("GA".to_string())
        );
        assert_eq!(
            parse_expression("$series_2").unwrap(),
            ExprNode::Var("series_2".to_string())
        );
    }

    #[test]
    fn test_parse_string_literal() {
        assert_eq!(
            parse_expression("'hello'").unwrap(),
            ExprNode::String("hello".to_string())
        );
    }

    #[test]
    fn test_parse_precedence() {
        // * binds tighter than +
        assert_eq!(
            parse_expression("1 + 2 * 3").unwrap(),
            bin(
                BinaryOp::Add,
                ExprNode::Scalar(1.0),
                bin(BinaryOp::Mul, ExprNode::Scalar(2.0), ExprNode::Scalar(3.0)),
            )
        );
        // comparison binds looser than +
        assert_eq!(
            parse_expression("1 + 1 == 2").unwrap(),
            bin(
                BinaryOp::Eq,
                bin(BinaryOp::Add, ExprNode::Scalar(1.0), ExprNode::Scalar(1.0)),
                ExprNode::Scalar(2.0),
            )
        );
        // && binds looser than comparison
        assert_eq!(
            parse_expression("1 > 0 && 2 > 1").unwrap(),
            bin(
                BinaryOp::And,
                bin(BinaryOp::Gt, ExprNode::Scalar(1.0), ExprNode::Scalar(0.0)),
                bin(BinaryOp::Gt, ExprNode::Scalar(2.0), ExprNode::Scalar(1.0)),
            )
        );
    }

    #[test]
    fn test_parse_pow_right_associative() {
        assert_eq!(
            parse_expression("2 ** 3 ** 2").unwrap(),
            bin(
                BinaryOp::Pow,
                ExprNode::Scalar(2.0),
                bin(BinaryOp::Pow, ExprNode::Scalar(3.0), ExprNode::Scalar(2.0)),
            )
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_expression("! $A").unwrap(),
            ExprNode::Unary {
                op: UnaryOp::Not,
                arg: Box::new(ExprNode::Var("A".to_string())),
            }
        );
        assert_eq!(
            parse_expression("! ! 1").unwrap(),
            ExprNode::Unary {
                op: UnaryOp::Not,
                arg: Box::new(ExprNode::Unary {
                    op: UnaryOp::Not,
                    arg: Box::new(ExprNode::Scalar(1.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_parens_override_precedence() {
        assert_eq!(
            parse_expression("(1 + 2) * 3").unwrap(),
            bin(
                BinaryOp::Mul,
                bin(BinaryOp::Add, ExprNode::Scalar(1.0), ExprNode::Scalar(2.0)),
                ExprNode::Scalar(3.0),
            )
        );
    }

    #[test]
    fn test_parse_func_call() {
        assert_eq!(
            parse_expression("abs($A)").unwrap(),
            ExprNode::Func {
                name: "abs".to_string(),
                args: vec![ExprNode::Var("A".to_string())],
            }
        );
        assert_eq!(
            parse_expression("null()").unwrap(),
            ExprNode::Func {
                name: "null".to_string(),
                args: vec![],
            }
        );
        // Arguments are full expressions.
        assert_eq!(
            parse_expression("log($A + 1)").unwrap(),
            ExprNode::Func {
                name: "log".to_string(),
                args: vec![bin(
                    BinaryOp::Add,
                    ExprNode::Var("A".to_string()),
                    ExprNode::Scalar(1.0),
                )],
            }
        );
    }

    #[test]
    fn test_parse_trailing_input_rejected() {
        assert!(matches!(
            parse_expression("1 + 2 )"),
            Err(ExprError::Parse(_))
        ));
        assert!(matches!(parse_expression("$"), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression(""), Err(ExprError::Parse(_))));
    }

    #[test]
    fn test_parse_mixed_formula() {
        // The shape of a realistic formula round-trips into the
        // expected tree without error.
        let expr = parse_expression("$A * 2 + abs($B) > 10 || ! $C").unwrap();
        match expr {
            ExprNode::Binary { op: BinaryOp::Or, .. } => {}
            other => panic!("expected top-level ||, got {:?}", other),
        }
    }
}
