//! Expression Tokenizer
//!
//! Turns raw expression text into a validated token stream. The pipeline runs
//! four stages in order and stops at the first failure:
//!
//! 1. **`tokenize`**: character scan into numbers, operators and brackets.
//! 2. **`validate_brackets`**: running bracket balance.
//! 3. **`validate_token_sequence`**: operator/operand placement.
//! 4. **`preprocess_tokens`**: folds unary minuses into the following number.

use super::errors::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Operator,
    OpenBracket,
    CloseBracket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn is_minus(&self) -> bool {
        self.kind == TokenKind::Operator && self.value == "-"
    }
}

enum Symbol {
    Digit,
    DecimalPoint,
    Operator,
    OpenBracket,
    CloseBracket,
}

impl Symbol {
    fn classify(character: char) -> Option<Self> {
        match character {
            '0'..='9' => Some(Self::Digit),
            '.' => Some(Self::DecimalPoint),
            '+' | '-' | '*' | '/' => Some(Self::Operator),
            '(' => Some(Self::OpenBracket),
            ')' => Some(Self::CloseBracket),
            _ => None,
        }
    }
}

/// A minus is unary when nothing that could be its left operand precedes it.
fn is_unary_position(previous: Option<TokenKind>) -> bool {
    matches!(
        previous,
        None | Some(TokenKind::Operator) | Some(TokenKind::OpenBracket)
    )
}

/// Scans the text left to right. Digits and the decimal point extend the
/// current number token; whitespace may separate tokens but never split a number.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, ParseError> {
    if expression.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut number_has_decimal_point = false;
    let mut whitespace_after_last_token = false;

    for (position, character) in expression.chars().enumerate() {
        if character.is_whitespace() {
            whitespace_after_last_token = true;
            continue;
        }

        let symbol = Symbol::classify(character)
            .ok_or(ParseError::InvalidCharacter { position, character })?;

        let last_is_number = tokens
            .last()
            .is_some_and(|token| token.kind == TokenKind::Number);

        if matches!(symbol, Symbol::Digit | Symbol::DecimalPoint)
            && whitespace_after_last_token
            && last_is_number
        {
            return Err(ParseError::UnexpectedWhitespace { position });
        }
        whitespace_after_last_token = false;

        match symbol {
            Symbol::Digit => {
                if last_is_number {
                    if let Some(last) = tokens.last_mut() {
                        last.value.push(character);
                    }
                } else {
                    number_has_decimal_point = false;
                    tokens.push(Token::new(TokenKind::Number, character));
                }
            }
            Symbol::DecimalPoint => {
                if !last_is_number || number_has_decimal_point {
                    return Err(ParseError::MalformedNumber { position });
                }
                number_has_decimal_point = true;
                if let Some(last) = tokens.last_mut() {
                    last.value.push(character);
                }
            }
            Symbol::Operator => tokens.push(Token::new(TokenKind::Operator, character)),
            Symbol::OpenBracket => tokens.push(Token::new(TokenKind::OpenBracket, character)),
            Symbol::CloseBracket => tokens.push(Token::new(TokenKind::CloseBracket, character)),
        }
    }

    Ok(tokens)
}

/// Checks that brackets pair up: the balance never drops below zero and ends at zero.
pub fn validate_brackets(tokens: &[Token]) -> Result<(), ParseError> {
    let mut balance: usize = 0;

    for token in tokens {
        match token.kind {
            TokenKind::OpenBracket => balance += 1,
            TokenKind::CloseBracket => {
                balance = balance
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedBrackets("unexpected closing bracket"))?;
            }
            _ => {}
        }
    }

    if balance != 0 {
        return Err(ParseError::UnbalancedBrackets("unclosed opening bracket"));
    }

    Ok(())
}

/// Checks operator and operand placement.
///
/// A minus in operand position (start, after an operator, after an opening
/// bracket) is unary and must be followed by a number or another unary minus.
pub fn validate_token_sequence(tokens: &[Token]) -> Result<(), ParseError> {
    use ParseError::InvalidOperatorPlacement as Misplaced;

    let mut previous: Option<TokenKind> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Number => match previous {
                Some(TokenKind::Number) => return Err(Misplaced("no operator between numbers")),
                Some(TokenKind::CloseBracket) => {
                    return Err(Misplaced("no operator after closing bracket"));
                }
                _ => {}
            },
            TokenKind::OpenBracket => match previous {
                Some(TokenKind::Number) => {
                    return Err(Misplaced("no operator before opening bracket"));
                }
                Some(TokenKind::CloseBracket) => {
                    return Err(Misplaced("no operator between brackets"));
                }
                _ => {}
            },
            TokenKind::CloseBracket => {
                if matches!(
                    previous,
                    Some(TokenKind::Operator) | Some(TokenKind::OpenBracket)
                ) {
                    return Err(Misplaced("operator or opening bracket before closing bracket"));
                }
            }
            TokenKind::Operator => {
                if is_unary_position(previous) {
                    if !token.is_minus() {
                        return Err(Misplaced("operator has no left operand"));
                    }
                    let operand_follows = tokens
                        .get(index + 1)
                        .is_some_and(|next| next.kind == TokenKind::Number || next.is_minus());
                    if !operand_follows {
                        return Err(Misplaced("unary minus must precede a number"));
                    }
                }
            }
        }

        previous = Some(token.kind);
    }

    if previous == Some(TokenKind::Operator) {
        return Err(Misplaced("expression ends with an operator"));
    }

    Ok(())
}

/// Folds every unary minus into the number that follows it.
///
/// Consecutive unary minuses cancel pairwise, so `--2` yields `2`.
pub fn preprocess_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut previous: Option<TokenKind> = None;
    let mut negative = false;

    for mut token in tokens {
        let unary = token.is_minus() && is_unary_position(previous);
        previous = Some(token.kind);

        if unary {
            negative = !negative;
            continue;
        }

        if token.kind == TokenKind::Number && negative {
            token.value.insert(0, '-');
        }
        negative = false;

        result.push(token);
    }

    result
}

/// Runs the whole pipeline, short-circuiting on the first error.
pub fn parse_tokens(expression: &str) -> Result<Vec<Token>, ParseError> {
    let tokens = tokenize(expression)?;
    validate_brackets(&tokens)?;
    validate_token_sequence(&tokens)?;
    Ok(preprocess_tokens(tokens))
}
