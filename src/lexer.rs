//! The tokenizer.
//!
//! Splits an expression string into [`Token`]s, resolving operator and
//! function names against the configured dictionaries as it goes. Whether an
//! operator is read as prefix, postfix or infix depends only on the kind of
//! the previous token; operator text is matched greedily, backing off to the
//! longest registered match.
//!
//! Positions are 1-based character offsets into the source text.

use crate::config::Configuration;
use crate::error::ParseError;
use crate::operator::OperatorKind;
use crate::token::{Token, TokenKind};

/// Tokenizes the whole source, failing on the first lexical error.
pub fn tokenize(source: &str, configuration: &Configuration) -> Result<Vec<Token>, ParseError> {
    Tokenizer::new(source, configuration).run()
}

struct Tokenizer<'a> {
    configuration: &'a Configuration,
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    brace_balance: usize,
    array_balance: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &str, configuration: &'a Configuration) -> Self {
        Tokenizer {
            configuration,
            chars: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            brace_balance: 0,
            array_balance: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let position = self.pos + 1;
            match c {
                '(' => self.scan_brace_open(position)?,
                ')' => self.scan_brace_close(position)?,
                '[' => self.scan_array_open(position)?,
                ']' => self.scan_array_close(position)?,
                ',' => {
                    self.pos += 1;
                    self.push(Token::new(position, ",", TokenKind::Comma))?;
                }
                '"' => self.scan_string(position, '"')?,
                '\'' if self.configuration.single_quote_strings_allowed() => {
                    self.scan_string(position, '\'')?
                }
                '.' => self.scan_dot(position)?,
                c if c.is_ascii_digit() => self.scan_number(position)?,
                c if self.is_identifier_start(c) => self.scan_identifier(position)?,
                _ => self.scan_operator(position)?,
            }
        }
        if self.brace_balance > 0 {
            return Err(ParseError::UnbalancedBrace {
                position: self.chars.len(),
            });
        }
        if self.array_balance > 0 {
            return Err(ParseError::UnbalancedArray {
                position: self.chars.len(),
            });
        }
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(Token::kind)
    }

    fn is_identifier_start(&self, c: char) -> bool {
        c.is_alphabetic()
            || c == '_'
            || self.configuration.additional_identifier_chars().contains(&c)
    }

    fn is_identifier_char(&self, c: char) -> bool {
        c.is_alphanumeric()
            || c == '_'
            || self.configuration.additional_identifier_chars().contains(&c)
    }

    /// Pushes a token, first inserting an implicit multiplication where two
    /// operands touch (`2a`, `2(`, `2SQRT(4)`, `)(`).
    fn push(&mut self, token: Token) -> Result<(), ParseError> {
        let implicit = matches!(
            (self.previous_kind(), token.kind()),
            (Some(TokenKind::Number), TokenKind::VariableOrConstant)
                | (Some(TokenKind::Number), TokenKind::Function)
                | (Some(TokenKind::Number), TokenKind::BraceOpen)
                | (Some(TokenKind::BraceClose), TokenKind::BraceOpen)
        );
        if implicit {
            if !self.configuration.implicit_multiplication_allowed() {
                return Err(ParseError::MisplacedToken {
                    position: token.position(),
                    text: token.text().to_string(),
                });
            }
            let Some(multiply) = self.configuration.operator(OperatorKind::Infix, "*") else {
                return Err(ParseError::MisplacedToken {
                    position: token.position(),
                    text: token.text().to_string(),
                });
            };
            self.tokens.push(Token::operator(
                token.position(),
                "*",
                TokenKind::InfixOperator,
                multiply,
            ));
        }
        self.tokens.push(token);
        Ok(())
    }

    fn scan_brace_open(&mut self, position: usize) -> Result<(), ParseError> {
        self.pos += 1;
        self.brace_balance += 1;
        self.push(Token::new(position, "(", TokenKind::BraceOpen))
    }

    fn scan_brace_close(&mut self, position: usize) -> Result<(), ParseError> {
        if self.brace_balance == 0 {
            return Err(ParseError::UnbalancedBrace { position });
        }
        self.pos += 1;
        self.brace_balance -= 1;
        self.push(Token::new(position, ")", TokenKind::BraceClose))
    }

    fn scan_array_open(&mut self, position: usize) -> Result<(), ParseError> {
        if !self.configuration.arrays_allowed() {
            return Err(ParseError::UnbalancedArray { position });
        }
        // an index needs something to index
        match self.previous_kind() {
            Some(
                TokenKind::VariableOrConstant
                | TokenKind::BraceClose
                | TokenKind::ArrayClose
                | TokenKind::StringLiteral,
            ) => {}
            _ => {
                return Err(ParseError::MisplacedToken {
                    position,
                    text: "[".to_string(),
                });
            }
        }
        self.pos += 1;
        self.array_balance += 1;
        self.push(Token::new(position, "[", TokenKind::ArrayOpen))
    }

    fn scan_array_close(&mut self, position: usize) -> Result<(), ParseError> {
        if !self.configuration.arrays_allowed() || self.array_balance == 0 {
            return Err(ParseError::UnbalancedArray { position });
        }
        self.pos += 1;
        self.array_balance -= 1;
        self.push(Token::new(position, "]", TokenKind::ArrayClose))
    }

    fn scan_string(&mut self, position: usize, quote: char) -> Result<(), ParseError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ParseError::UnterminatedString { position });
            };
            self.pos += 1;
            match c {
                c if c == quote => break,
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(ParseError::UnterminatedString { position });
                    };
                    self.pos += 1;
                    text.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'b' => '\u{0008}',
                        'f' => '\u{000C}',
                        other => other,
                    });
                }
                other => text.push(other),
            }
        }
        self.push(Token::new(position, text, TokenKind::StringLiteral))
    }

    /// `.` is either the start of a fractional number literal or a structure
    /// separator, decided by what precedes it.
    fn scan_dot(&mut self, position: usize) -> Result<(), ParseError> {
        let separator_legal = matches!(
            self.previous_kind(),
            Some(
                TokenKind::VariableOrConstant
                    | TokenKind::BraceClose
                    | TokenKind::ArrayClose
                    | TokenKind::StringLiteral,
            )
        );
        if separator_legal {
            if !self.configuration.structures_allowed() {
                return Err(ParseError::MisplacedToken {
                    position,
                    text: ".".to_string(),
                });
            }
            self.pos += 1;
            return self.push(Token::new(position, ".", TokenKind::StructureSeparator));
        }
        if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            return self.scan_number(position);
        }
        Err(ParseError::MisplacedToken {
            position,
            text: ".".to_string(),
        })
    }

    fn scan_number(&mut self, position: usize) -> Result<(), ParseError> {
        let mut text = String::new();
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            text.push('0');
            text.push(self.peek_at(1).unwrap_or('x'));
            self.pos += 2;
            let mut digits = 0;
            while let Some(c) = self.peek() {
                if !c.is_ascii_hexdigit() {
                    break;
                }
                text.push(c);
                self.pos += 1;
                digits += 1;
            }
            if digits == 0 {
                return Err(ParseError::MalformedNumber { position, text });
            }
            return self.push(Token::new(position, text, TokenKind::Number));
        }

        let mut dots = 0;
        while let Some(c) = self.peek() {
            match c {
                c if c.is_ascii_digit() => text.push(c),
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    dots += 1;
                    text.push('.');
                }
                'e' | 'E' => {
                    text.push(c);
                    if matches!(self.peek_at(1), Some('+' | '-')) {
                        self.pos += 1;
                        text.push(self.chars[self.pos]);
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        let malformed = dots > 1
            || text
                .chars()
                .last()
                .is_some_and(|c| matches!(c, 'e' | 'E' | '+' | '-'));
        if malformed {
            return Err(ParseError::MalformedNumber { position, text });
        }
        self.push(Token::new(position, text, TokenKind::Number))
    }

    fn scan_identifier(&mut self, position: usize) -> Result<(), ParseError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !self.is_identifier_char(c) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }

        if self.peek() == Some('(') {
            let Some(definition) = self.configuration.function(&name) else {
                return Err(ParseError::UndefinedFunction { position, name });
            };
            return self.push(Token::function(position, name, definition));
        }

        // alphabetic operator names, e.g. a custom `MOD`
        for kind in self.allowed_operator_kinds() {
            if let Some(definition) = self.configuration.operator(kind, &name) {
                return self.push(Token::operator(
                    position,
                    name,
                    token_kind_for(kind),
                    definition,
                ));
            }
        }

        self.push(Token::new(position, name, TokenKind::VariableOrConstant))
    }

    /// Which operator kinds may start at the current position, in match
    /// preference order, based on the previous token alone.
    fn allowed_operator_kinds(&self) -> Vec<OperatorKind> {
        let mut kinds = Vec::with_capacity(2);
        match self.previous_kind() {
            None
            | Some(
                TokenKind::BraceOpen
                | TokenKind::InfixOperator
                | TokenKind::PrefixOperator
                | TokenKind::Comma
                | TokenKind::ArrayOpen,
            ) => kinds.push(OperatorKind::Prefix),
            Some(
                TokenKind::Number
                | TokenKind::VariableOrConstant
                | TokenKind::StringLiteral
                | TokenKind::BraceClose
                | TokenKind::ArrayClose,
            ) => {
                kinds.push(OperatorKind::Postfix);
                kinds.push(OperatorKind::Infix);
            }
            Some(TokenKind::PostfixOperator) => kinds.push(OperatorKind::Infix),
            _ => {}
        }
        kinds
    }

    /// Greedy operator matching: extend the candidate while a longer
    /// registered operator could still match, then back off to the longest
    /// exact match among the kinds legal at this position.
    fn scan_operator(&mut self, position: usize) -> Result<(), ParseError> {
        let kinds = self.allowed_operator_kinds();
        let mut candidate = String::new();
        while let Some(c) = self.peek() {
            let mut extended = candidate.clone();
            extended.push(c);
            let viable = kinds
                .iter()
                .any(|&kind| self.configuration.operator_starts_with(kind, &extended));
            if !viable && !candidate.is_empty() {
                break;
            }
            if !viable {
                return Err(ParseError::UndefinedOperator {
                    position,
                    text: extended,
                });
            }
            candidate = extended;
            self.pos += 1;
        }

        for length in (1..=candidate.chars().count()).rev() {
            let text: String = candidate.chars().take(length).collect();
            for &kind in &kinds {
                if let Some(definition) = self.configuration.operator(kind, &text) {
                    self.pos -= candidate.chars().count() - length;
                    return self.push(Token::operator(
                        position,
                        text,
                        token_kind_for(kind),
                        definition,
                    ));
                }
            }
        }
        Err(ParseError::UndefinedOperator {
            position,
            text: candidate,
        })
    }
}

fn token_kind_for(kind: OperatorKind) -> TokenKind {
    match kind {
        OperatorKind::Prefix => TokenKind::PrefixOperator,
        OperatorKind::Postfix => TokenKind::PostfixOperator,
        OperatorKind::Infix => TokenKind::InfixOperator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let configuration = Configuration::default();
        tokenize(source, &configuration)
            .unwrap()
            .iter()
            .map(Token::kind)
            .collect()
    }

    #[test]
    fn five_tokens_with_one_based_positions() {
        let configuration = Configuration::default();
        let tokens = tokenize("a+123+c", &configuration).unwrap();
        assert_eq!(tokens.len(), 5);
        let positions: Vec<usize> = tokens.iter().map(Token::position).collect();
        assert_eq!(positions, vec![1, 2, 3, 6, 7]);
        assert_eq!(tokens[2].text(), "123");
    }

    #[test]
    fn minus_is_prefix_after_infix_and_infix_after_operand() {
        assert_eq!(
            kinds("2*-3"),
            vec![
                TokenKind::Number,
                TokenKind::InfixOperator,
                TokenKind::PrefixOperator,
                TokenKind::Number,
            ]
        );
        assert_eq!(
            kinds("2-3"),
            vec![
                TokenKind::Number,
                TokenKind::InfixOperator,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn greedy_match_prefers_longest_operator() {
        assert_eq!(
            kinds("a!=b"),
            vec![
                TokenKind::VariableOrConstant,
                TokenKind::InfixOperator,
                TokenKind::VariableOrConstant,
            ]
        );
        assert_eq!(
            kinds("3!"),
            vec![TokenKind::Number, TokenKind::PostfixOperator]
        );
    }

    #[test]
    fn unknown_operator_is_reported_with_position() {
        let configuration = Configuration::default();
        let error = tokenize("2 # 3", &configuration).unwrap_err();
        assert_eq!(
            error,
            ParseError::UndefinedOperator {
                position: 3,
                text: "#".to_string()
            }
        );
    }

    #[test]
    fn unknown_function_is_rejected_at_lex_time() {
        let configuration = Configuration::default();
        let error = tokenize("NOPE(1)", &configuration).unwrap_err();
        assert!(matches!(error, ParseError::UndefinedFunction { position: 1, .. }));
    }

    #[test]
    fn number_formats() {
        let configuration = Configuration::default();
        for source in ["123", "12.5", ".5", "2e10", "2.5e-3", "0x1F"] {
            let tokens = tokenize(source, &configuration).unwrap();
            assert_eq!(tokens.len(), 1, "{}", source);
            assert_eq!(tokens[0].kind(), TokenKind::Number);
        }
        for source in ["2e", "2e+", "0x"] {
            let error = tokenize(source, &configuration).unwrap_err();
            assert!(
                matches!(error, ParseError::MalformedNumber { .. }),
                "{}",
                source
            );
        }
    }

    #[test]
    fn string_escapes_are_resolved() {
        let configuration = Configuration::default();
        let tokens = tokenize(r#""a\"b\n""#, &configuration).unwrap();
        assert_eq!(tokens[0].text(), "a\"b\n");
        assert!(matches!(
            tokenize(r#""open"#, &configuration),
            Err(ParseError::UnterminatedString { position: 1 })
        ));
    }

    #[test]
    fn single_quote_strings_are_opt_in() {
        let off = Configuration::default();
        assert!(tokenize("'hi'", &off).is_err());
        let on = Configuration::builder()
            .single_quote_strings_allowed(true)
            .build();
        let tokens = tokenize("'hi'", &on).unwrap();
        assert_eq!(tokens[0].kind(), TokenKind::StringLiteral);
        assert_eq!(tokens[0].text(), "hi");
    }

    #[test]
    fn structure_separator_versus_fraction() {
        assert_eq!(
            kinds("a.b"),
            vec![
                TokenKind::VariableOrConstant,
                TokenKind::StructureSeparator,
                TokenKind::VariableOrConstant,
            ]
        );
        assert_eq!(
            kinds("2+.5"),
            vec![
                TokenKind::Number,
                TokenKind::InfixOperator,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn implicit_multiplication_inserts_synthetic_star() {
        assert_eq!(
            kinds("2a"),
            vec![
                TokenKind::Number,
                TokenKind::InfixOperator,
                TokenKind::VariableOrConstant,
            ]
        );
        assert_eq!(
            kinds("(1)(2)"),
            vec![
                TokenKind::BraceOpen,
                TokenKind::Number,
                TokenKind::BraceClose,
                TokenKind::InfixOperator,
                TokenKind::BraceOpen,
                TokenKind::Number,
                TokenKind::BraceClose,
            ]
        );
        let off = Configuration::builder()
            .implicit_multiplication_allowed(false)
            .build();
        assert!(matches!(
            tokenize("2a", &off),
            Err(ParseError::MisplacedToken { position: 2, .. })
        ));
    }

    #[test]
    fn brace_and_array_balance_is_checked() {
        let configuration = Configuration::default();
        assert!(matches!(
            tokenize("(1+2", &configuration),
            Err(ParseError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            tokenize("1+2)", &configuration),
            Err(ParseError::UnbalancedBrace { position: 4 })
        ));
        assert!(matches!(
            tokenize("a[1", &configuration),
            Err(ParseError::UnbalancedArray { .. })
        ));
        let no_arrays = Configuration::builder().arrays_allowed(false).build();
        assert!(matches!(
            tokenize("a[1]", &no_arrays),
            Err(ParseError::UnbalancedArray { position: 2 })
        ));
    }
}
