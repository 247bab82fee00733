use serde::{Deserialize, Serialize};

use std::fmt;

/// The role a node plays in a genome's network graph.
///
/// Input and output node counts are fixed at genome creation
/// and identical across a whole population; hidden nodes only
/// ever appear through node-addition mutations.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NodeType {
    Input,
    Output,
    Hidden,
}

/// A node of a genome's graph.
///
/// Nodes carry no weights themselves; they exist so that genes
/// have stable endpoints to refer to. Identity is the integer
/// `index`, which never changes for the life of the genome.
///
/// # Examples
/// ```
/// use magnate::genomics::{Node, NodeType};
///
/// let node = Node::new(NodeType::Hidden, 135);
///
/// assert_eq!(node.index(), 135);
/// assert_eq!(node.node_type(), NodeType::Hidden);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    node_type: NodeType,
    index: usize,
}

impl Node {
    /// Returns a new node with the given role and index.
    pub fn new(node_type: NodeType, index: usize) -> Node {
        Node { node_type, index }
    }

    /// Returns the node's index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the node's role.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Input => write!(f, "Input"),
            NodeType::Output => write!(f, "Output"),
            NodeType::Hidden => write!(f, "Hidden"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node_type, self.index)
    }
}
