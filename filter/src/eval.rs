//! The two-stack expression evaluator.
//!
//! Operators are shunted onto an operator stack guarded by a `?`
//! sentinel, operand values onto a value stack. An incoming binary
//! operator first applies any stacked operator of equal or higher
//! precedence (left associativity); the prefix `!` stacks directly.
//! Both operands of a binary operator are always evaluated — operand
//! evaluation happened in the lexing pass, so there is nothing to
//! short-circuit.

use crate::token::{precedence, Token};
use crate::{MalformedExpressionSnafu, ScriptError, UnbalancedGroupSnafu};

/// Evaluate a token stream produced by the lexer.
pub fn evaluate(tokens: &[Token]) -> Result<bool, ScriptError> {
    let mut operators: Vec<char> = vec!['?'];
    let mut operands: Vec<bool> = Vec::new();

    for token in tokens {
        match *token {
            Token::Operand(value) => operands.push(value),
            Token::Operator('!') => operators.push('!'),
            Token::Operator(op) => {
                while reducible(&operators, op) {
                    reduce(&mut operators, &mut operands)?;
                }
                operators.push(op);
            }
            Token::OpenGroup => operators.push('('),
            Token::CloseGroup => {
                loop {
                    match operators.last() {
                        Some('(') => break,
                        Some('?') | None => return UnbalancedGroupSnafu.fail(),
                        _ => reduce(&mut operators, &mut operands)?,
                    }
                }
                operators.pop();
            }
            Token::End => {
                loop {
                    match operators.last() {
                        Some('?') => break,
                        Some('(') => return UnbalancedGroupSnafu.fail(),
                        Some(_) => reduce(&mut operators, &mut operands)?,
                        None => return MalformedExpressionSnafu.fail(),
                    }
                }
            }
        }
    }

    if operands.len() != 1 {
        return MalformedExpressionSnafu.fail();
    }
    Ok(operands[0])
}

/// Whether the stacked operator should apply before the incoming one.
fn reducible(operators: &[char], incoming: char) -> bool {
    match operators.last() {
        Some('?') | Some('(') | None => false,
        Some(&top) => precedence(top) >= precedence(incoming),
    }
}

/// Pop one operator and apply it to the value stack.
fn reduce(operators: &mut Vec<char>, operands: &mut Vec<bool>) -> Result<(), ScriptError> {
    let op = operators.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
    match op {
        '!' => {
            let a = operands.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
            operands.push(!a);
        }
        '*' => {
            let b = operands.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
            let a = operands.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
            operands.push(a && b);
        }
        '+' => {
            let b = operands.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
            let a = operands.pop().ok_or_else(|| MalformedExpressionSnafu.build())?;
            operands.push(a || b);
        }
        _ => return MalformedExpressionSnafu.fail(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::testing::MapSource;

    fn eval(script: &str) -> bool {
        let tokens = tokenize(script, &MapSource::empty()).expect("should tokenize");
        evaluate(&tokens).expect("should evaluate")
    }

    #[test]
    fn literals_and_operators() {
        assert!(eval("true"));
        assert!(!eval("false"));
        assert!(!eval("!true"));
        assert!(eval("true * true"));
        assert!(!eval("true * false"));
        assert!(eval("false + true"));
        assert!(!eval("false + false"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // parsed as true + (false * false)
        assert!(eval("true + false * false"));
        // parsed as (false * false) + true
        assert!(eval("false * false + true"));
        assert!(!eval("false * (false + true)"));
    }

    #[test]
    fn not_binds_tightest() {
        assert!(eval("!false * true"));
        assert!(!eval("!(false * true) * false"));
        assert!(eval("!!true"));
    }

    #[test]
    fn de_morgan_holds() {
        for a in [false, true] {
            for b in [false, true] {
                let lhs = format!("!({} + {})", a, b);
                let rhs = format!("!{} * !{}", a, b);
                assert_eq!(eval(&lhs), eval(&rhs), "!(a+b) == !a*!b for {} {}", a, b);
                let lhs = format!("!({} * {})", a, b);
                let rhs = format!("!{} + !{}", a, b);
                assert_eq!(eval(&lhs), eval(&rhs), "!(a*b) == !a+!b for {} {}", a, b);
            }
        }
    }

    #[test]
    fn malformed_expressions() {
        let source = MapSource::empty();
        let cases = ["true +", "* true", "(true", "true)", "true false"];
        for script in &cases {
            let outcome = tokenize(script, &source).and_then(|t| evaluate(&t));
            assert!(outcome.is_err(), "`{}` should fail", script);
        }
    }
}
