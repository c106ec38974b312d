//! The filter script tokenizer.
//!
//! The lexer skips whitespace and `//` line comments, and turns the
//! script into operator, group and operand tokens. Operands are
//! evaluated here: an `identifier.method("literal")` call reads the
//! element value from the queried object and applies the match method,
//! producing an [`Token::Operand`] carrying the outcome.

use crate::token::Token;
use crate::{ElementSource, ScriptError, UnexpectedCharacterSnafu, UnterminatedLiteralSnafu};
use regex::Regex;

/// Characters that may appear in an element address identifier:
/// keywords, hexadecimal forms, and `::` path separators.
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '[' | ']' | ':')
}

/// Tokenize a script, evaluating each operand against the given object.
pub fn tokenize<T>(script: &str, obj: &T) -> Result<Vec<Token>, ScriptError>
where
    T: ElementSource + ?Sized,
{
    let chars: Vec<char> = script.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => {
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                // line comment
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '!' | '*' | '+' => {
                tokens.push(Token::Operator(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenGroup);
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseGroup);
                i += 1;
            }
            _ if is_identifier_char(c) => {
                let (token, next) = read_operand(&chars, i, obj)?;
                tokens.push(token);
                i = next;
            }
            _ => {
                return UnexpectedCharacterSnafu { position: i }.fail();
            }
        }
    }
    tokens.push(Token::End);
    Ok(tokens)
}

/// Read one operand starting at `start`: a `true`/`false` literal or an
/// `identifier.method("literal")` call, which is evaluated immediately.
fn read_operand<T>(
    chars: &[char],
    start: usize,
    obj: &T,
) -> Result<(Token, usize), ScriptError>
where
    T: ElementSource + ?Sized,
{
    let mut i = start;
    while i < chars.len() && is_identifier_char(chars[i]) {
        i += 1;
    }
    let identifier: String = chars[start..i].iter().collect();

    if chars.get(i) != Some(&'.') {
        // bareword: only the boolean literals are allowed
        return match identifier.as_str() {
            "true" => Ok((Token::Operand(true), i)),
            "false" => Ok((Token::Operand(false), i)),
            _ => UnexpectedCharacterSnafu { position: start }.fail(),
        };
    }
    i += 1; // consume '.'

    let method_start = i;
    while i < chars.len() && chars[i].is_ascii_alphanumeric() {
        i += 1;
    }
    let method: String = chars[method_start..i].iter().collect();

    if chars.get(i) != Some(&'(') {
        return UnexpectedCharacterSnafu { position: i }.fail();
    }
    i += 1;

    // optional quoted literal; anything except a quote may appear inside
    let mut literal = String::new();
    if chars.get(i) == Some(&'"') {
        i += 1;
        let literal_start = i;
        while i < chars.len() && chars[i] != '"' {
            i += 1;
        }
        if i >= chars.len() {
            return UnterminatedLiteralSnafu {
                position: literal_start,
            }
            .fail();
        }
        literal = chars[literal_start..i].iter().collect();
        i += 1;
    }

    if chars.get(i) != Some(&')') {
        return UnexpectedCharacterSnafu { position: i }.fail();
    }
    i += 1;

    let value = obj.element_text(&identifier);
    Ok((Token::Operand(apply_method(&value, &method, &literal)), i))
}

/// Apply a match method to an element value and a literal.
/// Comparisons are literal: no trimming or padding normalization
/// is applied to either side. Unknown methods are logged and yield false.
fn apply_method(value: &str, method: &str, literal: &str) -> bool {
    match method {
        "equals" => value == literal,
        "equalsIgnoreCase" => value.eq_ignore_ascii_case(literal),
        "matches" => match Regex::new(&format!("^(?:{})$", literal)) {
            // a full match, as in java.lang.String#matches
            Ok(re) => re.is_match(value),
            Err(e) => {
                tracing::warn!("Bad match pattern `{}`: {}", literal, e);
                false
            }
        },
        "contains" => value.contains(literal),
        "containsIgnoreCase" => value.to_lowercase().contains(&literal.to_lowercase()),
        "startsWith" => value.starts_with(literal),
        "startsWithIgnoreCase" => value.to_lowercase().starts_with(&literal.to_lowercase()),
        "endsWith" => value.ends_with(literal),
        "endsWithIgnoreCase" => value.to_lowercase().ends_with(&literal.to_lowercase()),
        _ => {
            tracing::warn!("Unknown match method `{}`", method);
            false
        }
    }
}
