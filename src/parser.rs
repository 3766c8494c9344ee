//! The shunting-yard parser.
//!
//! Converts the token stream into an [`AstNode`] tree with the configured
//! precedences and associativities. Function calls, array indexing and
//! structure access are folded into the same two-stack algorithm:
//!
//! - a function's `(` pushes a parameter-start marker on the operand stack,
//!   so zero-argument calls are distinguishable from one-argument calls;
//! - `value[index]` reduces to a synthetic two-child array-index node;
//! - the structure separator behaves like an infix operator of infinite
//!   precedence.

use crate::ast::AstNode;
use crate::error::ParseError;
use crate::function::Function;
use crate::token::{Token, TokenKind};

/// Parses a lexed token stream into a single expression tree.
pub fn parse(tokens: &[Token]) -> Result<AstNode, ParseError> {
    ShuntingYard::default().run(tokens)
}

#[derive(Default)]
struct ShuntingYard {
    operator_stack: Vec<Token>,
    operand_stack: Vec<AstNode>,
}

impl ShuntingYard {
    fn run(mut self, tokens: &[Token]) -> Result<AstNode, ParseError> {
        for (index, token) in tokens.iter().enumerate() {
            match token.kind() {
                TokenKind::Number | TokenKind::StringLiteral | TokenKind::VariableOrConstant => {
                    self.operand_stack.push(AstNode::leaf(token.clone()));
                }
                TokenKind::Function => self.operator_stack.push(token.clone()),
                TokenKind::BraceOpen => {
                    self.operator_stack.push(token.clone());
                    let after_function = index
                        .checked_sub(1)
                        .is_some_and(|i| tokens[i].kind() == TokenKind::Function);
                    if after_function {
                        self.operand_stack.push(AstNode::leaf(Token::new(
                            token.position(),
                            "(",
                            TokenKind::FunctionParamStart,
                        )));
                    }
                }
                TokenKind::Comma => self.reduce_to_brace_open(token)?,
                TokenKind::BraceClose => self.close_brace(token)?,
                TokenKind::ArrayOpen => {
                    self.flush_structure_separators()?;
                    self.operator_stack.push(token.clone());
                }
                TokenKind::ArrayClose => self.close_array(token)?,
                TokenKind::StructureSeparator => {
                    self.flush_structure_separators()?;
                    self.operator_stack.push(token.clone());
                }
                TokenKind::PrefixOperator
                | TokenKind::PostfixOperator
                | TokenKind::InfixOperator => {
                    self.reduce_tighter_operators(token)?;
                    self.operator_stack.push(token.clone());
                }
                // synthesized by the parser itself, never present in input
                TokenKind::ArrayIndex | TokenKind::FunctionParamStart => {
                    return Err(ParseError::MisplacedToken {
                        position: token.position(),
                        text: token.text().to_string(),
                    });
                }
            }
        }

        while let Some(token) = self.operator_stack.pop() {
            match token.kind() {
                TokenKind::BraceOpen | TokenKind::Function => {
                    return Err(ParseError::UnbalancedBrace {
                        position: token.position(),
                    });
                }
                TokenKind::ArrayOpen => {
                    return Err(ParseError::UnbalancedArray {
                        position: token.position(),
                    });
                }
                _ => self.reduce(&token)?,
            }
        }

        let Some(root) = self.operand_stack.pop() else {
            return Err(ParseError::EmptyExpression { position: 1 });
        };
        if root.token().kind() == TokenKind::FunctionParamStart {
            return Err(ParseError::EmptyExpression { position: 1 });
        }
        if let Some(extra) = self.operand_stack.pop() {
            return Err(ParseError::TooManyOperands {
                position: extra.token().position(),
            });
        }
        Ok(root)
    }

    /// Pops an operand, refusing to cross a function parameter marker.
    fn pop_operand(&mut self) -> Option<AstNode> {
        match self.operand_stack.last() {
            Some(node) if node.token().kind() != TokenKind::FunctionParamStart => {
                self.operand_stack.pop()
            }
            _ => None,
        }
    }

    /// Builds the AST node for one operator pulled off the operator stack.
    fn reduce(&mut self, token: &Token) -> Result<(), ParseError> {
        let node = match token.kind() {
            TokenKind::PrefixOperator | TokenKind::PostfixOperator => {
                let operand = self.pop_operand().ok_or(ParseError::MissingOperand {
                    position: token.position(),
                    operator: token.text().to_string(),
                })?;
                AstNode::new(token.clone(), vec![operand])
            }
            TokenKind::InfixOperator | TokenKind::StructureSeparator => {
                let right = self.pop_operand().ok_or(ParseError::MissingOperand {
                    position: token.position(),
                    operator: token.text().to_string(),
                })?;
                let left = self.pop_operand().ok_or(ParseError::MissingSecondOperand {
                    position: token.position(),
                    operator: token.text().to_string(),
                })?;
                if token.kind() == TokenKind::StructureSeparator
                    && right.token().kind() != TokenKind::VariableOrConstant
                {
                    return Err(ParseError::MisplacedToken {
                        position: right.token().position(),
                        text: right.token().text().to_string(),
                    });
                }
                AstNode::new(token.clone(), vec![left, right])
            }
            _ => {
                return Err(ParseError::MisplacedToken {
                    position: token.position(),
                    text: token.text().to_string(),
                });
            }
        };
        self.operand_stack.push(node);
        Ok(())
    }

    /// Reduces everything down to the nearest `(` without popping it.
    /// Used by the argument separator.
    fn reduce_to_brace_open(&mut self, comma: &Token) -> Result<(), ParseError> {
        loop {
            match self.operator_stack.last() {
                Some(top) if top.kind() == TokenKind::BraceOpen => return Ok(()),
                Some(_) => {
                    if let Some(top) = self.operator_stack.pop() {
                        self.reduce(&top)?;
                    }
                }
                None => {
                    return Err(ParseError::MisplacedToken {
                        position: comma.position(),
                        text: ",".to_string(),
                    });
                }
            }
        }
    }

    fn close_brace(&mut self, brace: &Token) -> Result<(), ParseError> {
        loop {
            match self.operator_stack.pop() {
                Some(top) if top.kind() == TokenKind::BraceOpen => break,
                Some(top) => self.reduce(&top)?,
                None => {
                    return Err(ParseError::UnbalancedBrace {
                        position: brace.position(),
                    });
                }
            }
        }
        let is_call = self
            .operator_stack
            .last()
            .is_some_and(|top| top.kind() == TokenKind::Function);
        if !is_call {
            return Ok(());
        }
        let function = self.operator_stack.pop().ok_or(ParseError::UnbalancedBrace {
            position: brace.position(),
        })?;

        let mut arguments = Vec::new();
        loop {
            let Some(top) = self.operand_stack.pop() else {
                return Err(ParseError::UnbalancedBrace {
                    position: function.position(),
                });
            };
            if top.token().kind() == TokenKind::FunctionParamStart {
                break;
            }
            arguments.push(top);
        }
        arguments.reverse();

        if let Some(definition) = function.function_definition() {
            validate_argument_count(&function, definition, arguments.len())?;
        }
        self.operand_stack.push(AstNode::new(function, arguments));
        Ok(())
    }

    fn close_array(&mut self, bracket: &Token) -> Result<(), ParseError> {
        let open = loop {
            match self.operator_stack.pop() {
                Some(top) if top.kind() == TokenKind::ArrayOpen => break top,
                Some(top) => self.reduce(&top)?,
                None => {
                    return Err(ParseError::UnbalancedArray {
                        position: bracket.position(),
                    });
                }
            }
        };
        let index = self.pop_operand().ok_or(ParseError::MissingOperand {
            position: open.position(),
            operator: "[]".to_string(),
        })?;
        let array = self.pop_operand().ok_or(ParseError::MissingSecondOperand {
            position: open.position(),
            operator: "[]".to_string(),
        })?;
        self.operand_stack.push(AstNode::new(
            Token::new(open.position(), "[]", TokenKind::ArrayIndex),
            vec![array, index],
        ));
        Ok(())
    }

    fn flush_structure_separators(&mut self) -> Result<(), ParseError> {
        while let Some(top) = self.operator_stack.last() {
            if top.kind() != TokenKind::StructureSeparator {
                break;
            }
            let top = self.operator_stack.pop().ok_or(ParseError::EmptyExpression {
                position: 1,
            })?;
            self.reduce(&top)?;
        }
        Ok(())
    }

    /// Standard shunting-yard reduction before pushing `current`: pop while
    /// the stack top binds at least as tightly. A structure separator on top
    /// always binds tighter.
    fn reduce_tighter_operators(&mut self, current: &Token) -> Result<(), ParseError> {
        let Some(definition) = current.operator_definition().cloned() else {
            return Err(ParseError::MisplacedToken {
                position: current.position(),
                text: current.text().to_string(),
            });
        };
        loop {
            let reduce_top = match self.operator_stack.last() {
                None => false,
                Some(top) => match top.kind() {
                    TokenKind::BraceOpen | TokenKind::ArrayOpen | TokenKind::Function => false,
                    TokenKind::StructureSeparator => true,
                    _ => {
                        let top_precedence = top
                            .operator_definition()
                            .map(|d| d.precedence())
                            .unwrap_or(0);
                        if definition.is_left_associative() {
                            definition.precedence() <= top_precedence
                        } else {
                            definition.precedence() < top_precedence
                        }
                    }
                },
            };
            if !reduce_top {
                return Ok(());
            }
            let top = self.operator_stack.pop().ok_or(ParseError::EmptyExpression {
                position: current.position(),
            })?;
            self.reduce(&top)?;
        }
    }
}

fn validate_argument_count(
    token: &Token,
    definition: &std::sync::Arc<dyn Function>,
    found: usize,
) -> Result<(), ParseError> {
    let parameters = definition.parameters();
    let has_var_arg = parameters.last().is_some_and(|p| p.is_var_arg());
    let required = parameters.len() - usize::from(has_var_arg);
    let acceptable = if has_var_arg {
        found >= required
    } else {
        found == required
    };
    if acceptable {
        return Ok(());
    }
    Err(ParseError::WrongNumberOfArguments {
        position: token.position(),
        name: token.text().to_string(),
        expected: if has_var_arg {
            format!("at least {}", required)
        } else {
            required.to_string()
        },
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<AstNode, ParseError> {
        let configuration = Configuration::default();
        parse(&tokenize(source, &configuration)?)
    }

    fn render(node: &AstNode) -> String {
        if node.children().is_empty() {
            return node.token().text().to_string();
        }
        let children: Vec<String> = node.children().iter().map(render).collect();
        format!("({} {})", node.token().text(), children.join(" "))
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(render(&parse_source("1+2*3").unwrap()), "(+ 1 (* 2 3))");
        assert_eq!(render(&parse_source("1-2-3").unwrap()), "(- (- 1 2) 3)");
        assert_eq!(render(&parse_source("2^3^4").unwrap()), "(^ 2 (^ 3 4))");
        assert_eq!(render(&parse_source("(1+2)*3").unwrap()), "(* (+ 1 2) 3)");
    }

    #[test]
    fn unary_minus_binds_tighter_than_power_by_default() {
        assert_eq!(render(&parse_source("-2^2").unwrap()), "(^ (- 2) 2)");
        let higher = Configuration::builder().power_higher_precedence(true).build();
        let tokens = tokenize("-2^2", &higher).unwrap();
        assert_eq!(render(&parse(&tokens).unwrap()), "(- (^ 2 2))");
    }

    #[test]
    fn function_calls_collect_arguments_in_order() {
        let node = parse_source("MAX(1,2+3,4)").unwrap();
        assert_eq!(render(&node), "(MAX 1 (+ 2 3) 4)");
        let empty = parse_source("RANDOM()").unwrap();
        assert_eq!(empty.children().len(), 0);
    }

    #[test]
    fn wrong_argument_count_is_a_parse_error() {
        assert!(matches!(
            parse_source("ROUND(1)"),
            Err(ParseError::WrongNumberOfArguments { found: 1, .. })
        ));
        assert!(matches!(
            parse_source("RANDOM(1)"),
            Err(ParseError::WrongNumberOfArguments { found: 1, .. })
        ));
    }

    #[test]
    fn array_index_is_a_synthetic_two_child_node() {
        assert_eq!(render(&parse_source("a[1]").unwrap()), "([] a 1)");
        assert_eq!(render(&parse_source("a[1][0]").unwrap()), "([] ([] a 1) 0)");
        assert_eq!(render(&parse_source("a.b[0]").unwrap()), "([] (. a b) 0)");
    }

    #[test]
    fn structure_separator_chains_left() {
        assert_eq!(render(&parse_source("a.b.c").unwrap()), "(. (. a b) c)");
        assert_eq!(render(&parse_source("a.b+1").unwrap()), "(+ (. a b) 1)");
    }

    #[test]
    fn structure_field_must_be_an_identifier() {
        assert!(matches!(
            parse_source("a.\"b\""),
            Err(ParseError::MisplacedToken { .. })
        ));
    }

    #[test]
    fn missing_operands_are_reported() {
        // an infix operator with a single operand reports the second missing
        assert!(matches!(
            parse_source("1+"),
            Err(ParseError::MissingSecondOperand { .. })
        ));
        assert!(matches!(
            parse_source("*2"),
            Err(ParseError::UndefinedOperator { .. })
        ));
        assert!(matches!(
            parse_source(""),
            Err(ParseError::EmptyExpression { .. })
        ));
    }

    #[test]
    fn prefix_operators_nest() {
        assert_eq!(render(&parse_source("--5").unwrap()), "(- (- 5))");
        assert_eq!(render(&parse_source("!TRUE").unwrap()), "(! TRUE)");
    }
}
