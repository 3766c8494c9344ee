//! The AST-to-closure compiler.
//!
//! Each AST node compiles into a [`Solvable`]: either a pre-computed constant
//! or a closure over its compiled children. Constant folding happens here:
//! when every child of a foldable node is constant, the node is evaluated
//! once against an empty context and replaced by its result. Folding failures
//! are swallowed and the node stays dynamic, so folded and unfolded
//! evaluation are observably identical.
//!
//! Intermediate rounding is applied in [`Solvable::solve`], which makes it
//! take effect at every node boundary, folded or not.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::ast::AstNode;
use crate::config::Configuration;
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, ParseError};
use crate::function::Function;
use crate::operator::Operator;
use crate::token::{Token, TokenKind};
use crate::value::Value;

type Thunk = Box<dyn Fn(&EvaluationContext) -> Result<Value, EvaluationError> + Send + Sync>;

enum SolvableKind {
    Constant(Value),
    Dynamic(Thunk),
}

/// A directly executable expression node.
pub struct Solvable {
    token: Token,
    kind: SolvableKind,
}

impl Solvable {
    fn constant(token: Token, value: Value) -> Self {
        Solvable {
            token,
            kind: SolvableKind::Constant(value),
        }
    }

    fn dynamic(token: Token, thunk: Thunk) -> Self {
        Solvable {
            token,
            kind: SolvableKind::Dynamic(thunk),
        }
    }

    /// The source token this node was compiled from.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Whether this node folded to a constant at compile time.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, SolvableKind::Constant(_))
    }

    /// Evaluates the node. Numeric results pass through the configured
    /// intermediate rounding.
    pub fn solve(&self, context: &EvaluationContext) -> Result<Value, EvaluationError> {
        let value = match &self.kind {
            SolvableKind::Constant(value) => return Ok(value.clone()),
            SolvableKind::Dynamic(thunk) => thunk(context)?,
        };
        Ok(match value {
            Value::Number(n) => Value::Number(context.configuration().round_intermediate(n)),
            other => other,
        })
    }
}

impl fmt::Debug for Solvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solvable")
            .field("token", &self.token)
            .field("constant", &self.is_constant())
            .finish()
    }
}

/// Compiles an AST into a tree of solvables under the given configuration.
pub fn compile(
    node: &AstNode,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    let token = node.token().clone();
    match token.kind() {
        TokenKind::Number => {
            let value = parse_number_literal(&token)?;
            Ok(Arc::new(Solvable::constant(token, Value::Number(value))))
        }
        TokenKind::StringLiteral => {
            let value = Value::String(token.text().to_string());
            Ok(Arc::new(Solvable::constant(token, value)))
        }
        TokenKind::VariableOrConstant => compile_variable(token, configuration),
        TokenKind::PrefixOperator | TokenKind::PostfixOperator | TokenKind::InfixOperator => {
            compile_operator(node, token, configuration)
        }
        TokenKind::Function => compile_function(node, token, configuration),
        TokenKind::ArrayIndex => compile_array_index(node, token, configuration),
        TokenKind::StructureSeparator => compile_structure_access(node, token, configuration),
        _ => Err(ParseError::MisplacedToken {
            position: token.position(),
            text: token.text().to_string(),
        }),
    }
}

fn parse_number_literal(token: &Token) -> Result<Decimal, ParseError> {
    let text = token.text();
    let malformed = || ParseError::MalformedNumber {
        position: token.position(),
        text: text.to_string(),
    };
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let value = i128::from_str_radix(hex, 16).map_err(|_| malformed())?;
        return Ok(Decimal::from_i128_with_scale(value, 0));
    }
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| malformed())
}

fn compile_variable(
    token: Token,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    // with overwriting disabled, constants bind at compile time and fold
    if !configuration.allow_overwrite_constants() {
        if let Some(value) = configuration.constant(token.text()) {
            let value = value.clone();
            return Ok(Arc::new(Solvable::constant(token, value)));
        }
    }
    let name = token.text().to_string();
    let lookup = token.clone();
    Ok(Arc::new(Solvable::dynamic(
        token,
        Box::new(move |context| {
            context
                .resolve(&name, &lookup)
                .ok_or_else(|| EvaluationError::VariableNotFound {
                    position: lookup.position(),
                    name: name.clone(),
                })
        }),
    )))
}

fn compile_children(
    node: &AstNode,
    configuration: &Arc<Configuration>,
) -> Result<Vec<Arc<Solvable>>, ParseError> {
    node.children()
        .iter()
        .map(|child| compile(child, configuration))
        .collect()
}

/// Tries to fold a freshly compiled dynamic node to a constant. The node
/// stays dynamic when evaluation fails; folding never surfaces errors.
fn fold(
    solvable: Solvable,
    foldable: bool,
    children_constant: bool,
    configuration: &Arc<Configuration>,
) -> Arc<Solvable> {
    if !foldable || !children_constant {
        return Arc::new(solvable);
    }
    let empty = EvaluationContext::new(configuration.clone());
    match solvable.solve(&empty) {
        Ok(value) => Arc::new(Solvable::constant(solvable.token.clone(), value)),
        Err(_) => Arc::new(solvable),
    }
}

fn compile_operator(
    node: &AstNode,
    token: Token,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    let Some(definition) = token.operator_definition().cloned() else {
        return Err(ParseError::MisplacedToken {
            position: token.position(),
            text: token.text().to_string(),
        });
    };
    let children = compile_children(node, configuration)?;
    let children_constant = children.iter().all(|child| child.is_constant());
    let foldable = definition.is_foldable();

    let call_token = token.clone();
    let call_children = children;
    let call_definition: Arc<dyn Operator> = definition.clone();
    let solvable = Solvable::dynamic(
        token,
        Box::new(move |context| {
            let mut operands = Vec::with_capacity(call_children.len());
            for child in &call_children {
                if call_definition.is_lazy() {
                    operands.push(Value::Lazy(child.clone()));
                } else {
                    operands.push(child.solve(context)?);
                }
            }
            call_definition.evaluate(context, &call_token, &operands)
        }),
    );
    Ok(fold(solvable, foldable, children_constant, configuration))
}

fn compile_function(
    node: &AstNode,
    token: Token,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    let Some(definition) = token.function_definition().cloned() else {
        return Err(ParseError::UndefinedFunction {
            position: token.position(),
            name: token.text().to_string(),
        });
    };
    let children = compile_children(node, configuration)?;
    let children_constant = children.iter().all(|child| child.is_constant());
    let foldable = definition.is_foldable()
        && (!children.is_empty() || definition.fold_without_arguments());

    let call_token = token.clone();
    let call_children = children;
    let call_definition: Arc<dyn Function> = definition;
    let solvable = Solvable::dynamic(
        token,
        Box::new(move |context| {
            let mut arguments = Vec::with_capacity(call_children.len());
            for (index, child) in call_children.iter().enumerate() {
                let lazy = call_definition
                    .parameter_for(index)
                    .is_some_and(|parameter| parameter.is_lazy());
                if lazy {
                    arguments.push(Value::Lazy(child.clone()));
                } else {
                    arguments.push(child.solve(context)?);
                }
            }
            call_definition.validate(&call_token, &arguments)?;
            call_definition.evaluate(context, &call_token, &arguments)
        }),
    );
    Ok(fold(solvable, foldable, children_constant, configuration))
}

fn compile_array_index(
    node: &AstNode,
    token: Token,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    let children = compile_children(node, configuration)?;
    let children_constant = children.iter().all(|child| child.is_constant());
    let [array, index] = match <[Arc<Solvable>; 2]>::try_from(children) {
        Ok(pair) => pair,
        Err(_) => {
            return Err(ParseError::MissingOperand {
                position: token.position(),
                operator: "[]".to_string(),
            });
        }
    };

    let call_token = token.clone();
    let solvable = Solvable::dynamic(
        token,
        Box::new(move |context| {
            let container = array.solve(context)?;
            let index_value = index.solve(context)?;
            let position = call_token.position();
            let Some(accessor) = container.indexed_accessor() else {
                return Err(EvaluationError::UnsupportedDataType {
                    position,
                    message: format!("{} cannot be indexed", container.type_name()),
                });
            };
            let index_number = index_value
                .as_number()
                .and_then(|n| rust_decimal::prelude::ToPrimitive::to_i64(&n))
                .ok_or_else(|| EvaluationError::UnsupportedDataType {
                    position,
                    message: format!("{} is not a valid index", index_value.type_name()),
                })?;
            accessor
                .get_index(index_number)
                .ok_or_else(|| EvaluationError::IndexOutOfBounds {
                    position,
                    index: index_number.to_string(),
                    container: container.type_name().to_string(),
                })
        }),
    );
    Ok(fold(solvable, true, children_constant, configuration))
}

fn compile_structure_access(
    node: &AstNode,
    token: Token,
    configuration: &Arc<Configuration>,
) -> Result<Arc<Solvable>, ParseError> {
    let [structure_node, field_node] = match node.children() {
        [s, f] => [s, f],
        _ => {
            return Err(ParseError::MissingOperand {
                position: token.position(),
                operator: ".".to_string(),
            });
        }
    };
    // the field is a bare identifier, not an evaluated child
    let field = field_node.token().text().to_string();
    let structure = compile(structure_node, configuration)?;
    let children_constant = structure.is_constant();

    let call_token = token.clone();
    let solvable = Solvable::dynamic(
        token,
        Box::new(move |context| {
            let container = structure.solve(context)?;
            let position = call_token.position();
            let Some(accessor) = container.keyed_accessor() else {
                return Err(EvaluationError::UnsupportedDataType {
                    position,
                    message: format!("{} has no fields to access", container.type_name()),
                });
            };
            accessor
                .get_key(&field)
                .ok_or_else(|| EvaluationError::FieldNotFound {
                    position,
                    field: field.clone(),
                    container: container.type_name().to_string(),
                })
        }),
    );
    Ok(fold(solvable, true, children_constant, configuration))
}
