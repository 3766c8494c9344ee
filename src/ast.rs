//! The abstract syntax tree.
//!
//! An [`AstNode`] is a token plus its ordered children. Arity is fixed by the
//! token kind: zero for literals and variables, one for prefix and postfix
//! operators, two for infix operators, the array index and the structure
//! separator, and N for function calls.

use serde_json::json;

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    token: Token,
    children: Vec<AstNode>,
}

impl AstNode {
    pub fn leaf(token: Token) -> Self {
        AstNode {
            token,
            children: Vec::new(),
        }
    }

    pub fn new(token: Token, children: Vec<AstNode>) -> Self {
        AstNode { token, children }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    /// All distinct variable names referenced in the tree, in first-seen
    /// order. Field names right of a structure separator are not variables.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variable_names(&mut names);
        names
    }

    fn collect_variable_names(&self, names: &mut Vec<String>) {
        if self.token.kind() == TokenKind::VariableOrConstant {
            let name = self.token.text().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let children = match self.token.kind() {
            // only the left side holds variables; the right is a field name
            TokenKind::StructureSeparator => self.children.get(..1).unwrap_or(&[]),
            _ => &self.children[..],
        };
        for child in children {
            child.collect_variable_names(names);
        }
    }

    /// JSON rendering of the tree, for diagnostics and the CLI's AST dump.
    pub fn to_json(&self) -> serde_json::Value {
        let children: Vec<serde_json::Value> =
            self.children.iter().map(AstNode::to_json).collect();
        json!({
            "type": format!("{:?}", self.token.kind()),
            "value": self.token.text(),
            "children": children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str, kind: TokenKind) -> AstNode {
        AstNode::leaf(Token::new(1, text, kind))
    }

    #[test]
    fn variable_names_skip_duplicates_and_field_names() {
        let field_access = AstNode::new(
            Token::new(2, ".", TokenKind::StructureSeparator),
            vec![
                leaf("order", TokenKind::VariableOrConstant),
                leaf("total", TokenKind::VariableOrConstant),
            ],
        );
        let sum = AstNode::new(
            Token::new(1, "+", TokenKind::InfixOperator),
            vec![
                field_access,
                AstNode::new(
                    Token::new(3, "+", TokenKind::InfixOperator),
                    vec![
                        leaf("order", TokenKind::VariableOrConstant),
                        leaf("tax", TokenKind::VariableOrConstant),
                    ],
                ),
            ],
        );
        assert_eq!(sum.variable_names(), vec!["order", "tax"]);
    }

    #[test]
    fn variable_names_tolerate_a_childless_separator_node() {
        let node = AstNode::leaf(Token::new(1, ".", TokenKind::StructureSeparator));
        assert!(node.variable_names().is_empty());
    }

    #[test]
    fn json_dump_carries_kind_text_and_children() {
        let node = AstNode::new(
            Token::new(2, "+", TokenKind::InfixOperator),
            vec![
                leaf("1", TokenKind::Number),
                leaf("2", TokenKind::Number),
            ],
        );
        let dump = node.to_json();
        assert_eq!(dump["type"], "InfixOperator");
        assert_eq!(dump["value"], "+");
        assert_eq!(dump["children"].as_array().map(Vec::len), Some(2));
    }
}
