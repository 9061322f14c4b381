//! Tokenizer: raw source text to a flat `Vec<Rc<Word>>`.
//!
//! Each character class gets its own `once_cell::sync::Lazy<Regex>` matched
//! against a `Vec<char>` cursor, since every token kind here is known up
//! front rather than assembled from caller-supplied lexeme objects.

use crate::config::ParserConfig;
use crate::dictionary::Dictionary;
use crate::error::CompileError;
use crate::word::{new_double_cell, Word};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static HEX_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9a-f]$").unwrap());
static IDENT_START: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z_]$").unwrap());
static IDENT_CONT: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z_0-9]$").unwrap());

/// Single-char operators with no digraph form.
const SINGLE_CHAR_OPERATORS: &[char] = &['+', '-', '^', '/', '\\', '*', '%', '~'];

pub fn tokenize(
    source: &str,
    config: &ParserConfig,
    dict: &mut Dictionary,
) -> Result<Vec<Rc<Word>>, CompileError> {
    let text: Vec<char> = source.trim().to_lowercase().chars().collect();
    let hex_char = config.hex_char as char;
    let decimal_sep = config.decimal_sep as char;
    let arg_separator = config.arg_separator as char;

    let mut tokens = Vec::new();
    let mut i = 0;
    let len = text.len();

    while i < len {
        let c = text[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == hex_char {
            let mut j = i + 1;
            while j < len && HEX_DIGIT.is_match(&text[j].to_string()) {
                j += 1;
            }
            if j > i + 1 {
                let digits: String = text[i + 1..j].iter().collect();
                let value = i64::from_str_radix(&digits, 16).map_err(|_| {
                    CompileError::Syntax(format!("invalid hex literal '{}{}'", hex_char, digits))
                })? as f64;
                tokens.push(Rc::new(Word::DoubleConstant {
                    name: (value as i64).to_string(),
                    value,
                }));
                i = j;
                continue;
            }
            // Fall back to an identifier that includes the prefix character.
            let mut k = i + 1;
            while k < len && IDENT_CONT.is_match(&text[k].to_string()) {
                k += 1;
            }
            let name: String = text[i..k].iter().collect();
            tokens.push(resolve_identifier(&name, dict));
            i = k;
            continue;
        }

        if c == decimal_sep {
            let end = scan_number(&text, i, decimal_sep);
            tokens.push(make_number_token(&text[i..end], decimal_sep)?);
            i = end;
            continue;
        }

        if c == '\'' {
            let mut j = i + 1;
            while j < len && text[j] != '\'' {
                j += 1;
            }
            if j >= len {
                return Err(CompileError::Syntax("unterminated string literal".into()));
            }
            let value: String = text[i + 1..j].iter().collect();
            let name: String = text[i..=j].iter().collect();
            tokens.push(Rc::new(Word::StringConstant { name, value }));
            i = j + 1;
            continue;
        }

        if IDENT_START.is_match(&c.to_string()) {
            let mut j = i + 1;
            while j < len && IDENT_CONT.is_match(&text[j].to_string()) {
                j += 1;
            }
            let name: String = text[i..j].iter().collect();
            tokens.push(resolve_identifier(&name, dict));
            i = j;
            continue;
        }

        if let Some((span, end)) = scan_digraph(&text, i) {
            let word = dict
                .search(&span)
                .ok_or_else(|| CompileError::Syntax(format!("unknown operator '{}'", span)))?;
            tokens.push(word);
            i = end;
            continue;
        }

        if c == arg_separator {
            tokens.push(Rc::new(Word::Comma));
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Rc::new(Word::LeftBracket));
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Rc::new(Word::RightBracket));
            i += 1;
            continue;
        }
        if SINGLE_CHAR_OPERATORS.contains(&c) {
            let span = c.to_string();
            let word = dict
                .search(&span)
                .ok_or_else(|| CompileError::Syntax(format!("unknown operator '{}'", span)))?;
            tokens.push(word);
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let end = scan_number(&text, i, decimal_sep);
            tokens.push(make_number_token(&text[i..end], decimal_sep)?);
            i = end;
            continue;
        }

        return Err(CompileError::Syntax(format!("unexpected character '{}'", c)));
    }

    Ok(tokens)
}

/// Look the name up in the dictionary; synthesize and register a
/// `GeneratedVariable` on first sight.
fn resolve_identifier(name: &str, dict: &mut Dictionary) -> Rc<Word> {
    if let Some(word) = dict.search(name) {
        return word;
    }
    let word = Rc::new(Word::GeneratedVariable {
        name: name.to_string(),
        cell: new_double_cell(0.0),
    });
    dict.add(name, word.clone());
    word
}

/// Scan a run of digits, an optional `decimal_sep`-fraction, and an
/// optional `e[+-]digits` exponent, starting at `start`. Works whether
/// `start` points at a digit or directly at `decimal_sep` (a leading-dot
/// literal like `.5`).
fn scan_number(chars: &[char], start: usize, decimal_sep: char) -> usize {
    let len = chars.len();
    let mut j = start;
    while j < len && chars[j].is_ascii_digit() {
        j += 1;
    }
    if j < len && chars[j] == decimal_sep {
        j += 1;
        while j < len && chars[j].is_ascii_digit() {
            j += 1;
        }
    }
    if j < len && chars[j] == 'e' {
        let mut k = j + 1;
        if k < len && (chars[k] == '+' || chars[k] == '-') {
            k += 1;
        }
        if k < len && chars[k].is_ascii_digit() {
            while k < len && chars[k].is_ascii_digit() {
                k += 1;
            }
            j = k;
        }
    }
    j
}

fn make_number_token(span: &[char], decimal_sep: char) -> Result<Rc<Word>, CompileError> {
    let text: String = span.iter().collect();
    let normalized = text.replace(decimal_sep, ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| CompileError::Syntax(format!("invalid numeric literal '{}'", text)))?;
    Ok(Rc::new(Word::DoubleConstant { name: text, value }))
}

/// Recognize the multi-char operator spellings: after `<`/`>`/`=`/`&`/`|`/
/// `:`/`!`, consume a second character if it forms a known digraph.
fn scan_digraph(chars: &[char], i: usize) -> Option<(String, usize)> {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    let (span, width): (&str, usize) = match (c, next) {
        ('<', Some('=')) => ("<=", 2),
        ('<', Some('<')) => ("<<", 2),
        ('<', Some('>')) => ("<>", 2),
        ('<', _) => ("<", 1),
        ('>', Some('=')) => (">=", 2),
        ('>', Some('>')) => (">>", 2),
        ('>', _) => (">", 1),
        ('=', Some('=')) => ("==", 2),
        ('=', _) => ("=", 1),
        (':', Some('=')) => (":=", 2),
        ('!', Some('=')) => ("!=", 2),
        ('!', _) => ("!", 1),
        ('&', Some('&')) => ("&&", 2),
        ('|', Some('|')) => ("||", 2),
        _ => return None,
    };
    Some((span.to_string(), i + width))
}
