//! Expression Tree
//!
//! Binary operator tree stored as an arena of nodes addressed by `NodeId`.
//! Parent links are plain indices, so splicing a computed value into the
//! tree never chases a pointer through shared mutable state.
//!
//! ## Reduction
//! A ready operator node (both children are numbers) is handed out once,
//! flagged `processing`. When its value arrives, a fresh number leaf is
//! pushed into the arena and the parent's child index is rewired to it.
//! Reducing the root moves the root index itself to the leaf, so a fully
//! evaluated tree is a single number read through `root_value`.

use super::errors::{CalcError, ComputeError, ParseError};
use super::tokenizer::{self, Token, TokenKind};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }

    /// Fails on division by zero and on results that overflow to a
    /// non-finite value.
    pub fn apply(self, left: f64, right: f64) -> Result<f64, ComputeError> {
        let value = match self {
            Self::Add => left + right,
            Self::Subtract => left - right,
            Self::Multiply => left * right,
            Self::Divide => {
                if right == 0.0 {
                    return Err(ComputeError::DivisionByZero);
                }
                left / right
            }
        };

        if !value.is_finite() {
            return Err(ComputeError::NonFinite);
        }
        Ok(value)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub operator: Operator,
    pub left: NodeId,
    pub right: NodeId,
    /// Index of the enclosing operator; `None` for the root.
    pub parent: Option<NodeId>,
    pub processing: bool,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Operator(OperatorNode),
}

/// Infix tokens to postfix (RPN). Operators of equal precedence are
/// left-associative: the stack top is popped while its precedence is `>=`.
pub fn shunting_yard(tokens: &[Token]) -> Vec<Token> {
    fn precedence(token: &Token) -> u8 {
        Operator::from_symbol(&token.value)
            .map(Operator::precedence)
            .unwrap_or(0)
    }

    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<&Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Number => output.push(token.clone()),
            TokenKind::Operator => {
                let incoming = precedence(token);
                while let Some(top) = operators.last() {
                    if top.kind != TokenKind::Operator || precedence(top) < incoming {
                        break;
                    }
                    output.push((*top).clone());
                    operators.pop();
                }
                operators.push(token);
            }
            TokenKind::OpenBracket => operators.push(token),
            TokenKind::CloseBracket => {
                while let Some(top) = operators.pop() {
                    if top.kind == TokenKind::OpenBracket {
                        break;
                    }
                    output.push(top.clone());
                }
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top.kind == TokenKind::Operator {
            output.push(top.clone());
        }
    }

    output
}

#[derive(Debug, Clone)]
pub struct ExpressionTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ExpressionTree {
    /// Tokenizes, validates and builds the tree for `expression`.
    pub fn parse(expression: &str) -> Result<Self, ParseError> {
        let tokens = tokenizer::parse_tokens(expression)?;
        let postfix = shunting_yard(&tokens);
        Self::from_postfix(&postfix)
    }

    /// Stack machine over postfix tokens: numbers push a leaf, operators pop
    /// the right operand, then the left one, and push a new operator node.
    pub fn from_postfix(postfix: &[Token]) -> Result<Self, ParseError> {
        let mut tree = Self {
            nodes: Vec::with_capacity(postfix.len()),
            root: NodeId(0),
        };
        let mut stack: Vec<NodeId> = Vec::new();

        for token in postfix {
            match token.kind {
                TokenKind::Number => {
                    let value: f64 = token
                        .value
                        .parse()
                        .ok()
                        .filter(|value: &f64| value.is_finite())
                        .ok_or_else(|| ParseError::InvalidNumber(token.value.clone()))?;
                    stack.push(tree.push(Node::Number(value)));
                }
                TokenKind::Operator => {
                    let operator = Operator::from_symbol(&token.value).ok_or(
                        ParseError::InvalidOperatorPlacement("unknown operator"),
                    )?;
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(ParseError::InvalidOperatorPlacement(
                            "operator is missing an operand",
                        ));
                    };
                    stack.push(tree.push(Node::Operator(OperatorNode {
                        operator,
                        left,
                        right,
                        parent: None,
                        processing: false,
                        processed: false,
                    })));
                }
                TokenKind::OpenBracket | TokenKind::CloseBracket => {
                    return Err(ParseError::UnbalancedBrackets("bracket in postfix sequence"));
                }
            }
        }

        tree.root = match stack.as_slice() {
            [root] => *root,
            [] => return Err(ParseError::Empty),
            _ => {
                return Err(ParseError::InvalidOperatorPlacement(
                    "operands without an operator",
                ));
            }
        };
        tree.link_parents();

        Ok(tree)
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Assigns parent indices top-down in a single pass.
    fn link_parents(&mut self) {
        let mut pending = vec![self.root];

        while let Some(id) = pending.pop() {
            let Node::Operator(op) = &self.nodes[id.0] else {
                continue;
            };
            let children = [op.left, op.right];

            for child in children {
                if let Node::Operator(child_op) = &mut self.nodes[child.0] {
                    child_op.parent = Some(id);
                    pending.push(child);
                }
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn is_number(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Node::Number(_)))
    }

    /// The final value, once the root has been reduced to a number.
    pub fn root_value(&self) -> Option<f64> {
        match self.nodes.get(self.root.0) {
            Some(Node::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn is_reduced(&self) -> bool {
        self.root_value().is_some()
    }

    /// Number of operator nodes still reachable from the root.
    pub fn pending_operations(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self.root];

        while let Some(id) = pending.pop() {
            if let Some(Node::Operator(op)) = self.nodes.get(id.0) {
                count += 1;
                pending.push(op.left);
                pending.push(op.right);
            }
        }

        count
    }

    /// Depth-first, left before right: returns the first operator node that is
    /// neither processing nor processed and whose children are both numbers,
    /// marking it `processing` before returning.
    pub fn find_next_ready_node(&mut self) -> Option<NodeId> {
        self.find_ready_from(self.root)
    }

    fn find_ready_from(&mut self, id: NodeId) -> Option<NodeId> {
        let (left, right) = match self.nodes.get(id.0) {
            Some(Node::Operator(op)) if !op.processing && !op.processed => (op.left, op.right),
            _ => return None,
        };

        if self.is_number(left) && self.is_number(right) {
            if let Some(Node::Operator(op)) = self.nodes.get_mut(id.0) {
                op.processing = true;
            }
            return Some(id);
        }

        self.find_ready_from(left)
            .or_else(|| self.find_ready_from(right))
    }

    /// Operator and operand values of a ready node.
    pub fn operands(&self, id: NodeId) -> Option<(Operator, f64, f64)> {
        let Some(Node::Operator(op)) = self.nodes.get(id.0) else {
            return None;
        };

        match (self.nodes.get(op.left.0), self.nodes.get(op.right.0)) {
            (Some(Node::Number(left)), Some(Node::Number(right))) => {
                Some((op.operator, *left, *right))
            }
            _ => None,
        }
    }

    /// Splices `value` in place of the operator node `id`.
    ///
    /// Returns `false` when `id` is not an unprocessed operator node.
    pub fn reduce(&mut self, id: NodeId, value: f64) -> bool {
        let parent = match self.nodes.get_mut(id.0) {
            Some(Node::Operator(op)) if !op.processed => {
                op.processing = false;
                op.processed = true;
                op.parent
            }
            _ => return false,
        };

        let leaf = self.push(Node::Number(value));

        match parent {
            Some(parent) => {
                if let Some(Node::Operator(parent_op)) = self.nodes.get_mut(parent.0) {
                    if parent_op.left == id {
                        parent_op.left = leaf;
                    } else if parent_op.right == id {
                        parent_op.right = leaf;
                    }
                }
            }
            None => self.root = leaf,
        }

        true
    }

    /// Makes a leased node discoverable again.
    pub fn release(&mut self, id: NodeId) {
        if let Some(Node::Operator(op)) = self.nodes.get_mut(id.0)
            && !op.processed
        {
            op.processing = false;
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes.get(id.0) {
            Some(Node::Number(value)) => write!(f, "{}", value),
            Some(Node::Operator(op)) => {
                f.write_str("(")?;
                self.fmt_node(op.left, f)?;
                write!(f, " {} ", op.operator)?;
                self.fmt_node(op.right, f)?;
                f.write_str(")")
            }
            None => f.write_str("?"),
        }
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

/// Evaluates `expression` in-process by repeatedly reducing the next ready node.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut tree = ExpressionTree::parse(expression)?;

    while let Some(id) = tree.find_next_ready_node() {
        let Some((operator, left, right)) = tree.operands(id) else {
            break;
        };
        let value = operator.apply(left, right)?;
        tree.reduce(id, value);
    }

    tree.root_value().ok_or(CalcError::NotEvaluated)
}
