//! Abstract material node graph.
//!
//! Renderer-neutral: node kinds and sockets are abstract names that a host
//! adapter maps onto its own shading system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::channel::Channel;

/// Unique identifier for a node within one graph
pub type NodeId = usize;

/// Abstract node types a material graph is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind
{
    /// The root shader every channel plugs into
    UniversalMaterial,
    MaterialOutput,
    /// Shared UV/3D transform feeding every texture
    #[serde(rename = "transform_3d")]
    Transform3D,
    ImageTexture,
    MultiplyTexture,
    TextureEmission,
    TextureDisplacement,
}

/// Named sockets on abstract nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Socket
{
    /// Output of the transform node
    TransformOut,
    /// Transform input of a texture node
    Transform,
    /// Generic texture input (emission/displacement wrappers)
    Texture,
    /// First and second multiply operands
    Texture1,
    Texture2,
    TextureOut,
    EmissionOut,
    DisplacementOut,
    MaterialOut,
    /// Surface input of the material output node
    Surface,
    /// Root material input for a channel
    Input(Channel),
}

/// Literal parameter value stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue
{
    Bool(bool),
    Float(f32),
    Text(String),
}

/// 2D layout position in node-editor units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position
{
    pub x: f32,
    pub y: f32,
}

impl Position
{
    pub const fn new(
        x: f32,
        y: f32,
    ) -> Self
    {
        Self { x, y }
    }

    pub fn offset(
        self,
        dx: f32,
        dy: f32,
    ) -> Self
    {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node
{
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub position: Position,
    pub params: BTreeMap<String, ParamValue>,
}

impl Node
{
    pub fn new(
        kind: NodeKind,
        label: impl Into<String>,
        position: Position,
    ) -> Self
    {
        Self {
            id: 0,
            kind,
            label: label.into(),
            position,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(
        mut self,
        name: &str,
        value: ParamValue,
    ) -> Self
    {
        self.params
            .insert(name.to_string(), value);
        self
    }

    pub fn param(
        &self,
        name: &str,
    ) -> Option<&ParamValue>
    {
        self.params.get(name)
    }
}

/// Directed link between two sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection
{
    pub from_node: NodeId,
    pub from_socket: Socket,
    pub to_node: NodeId,
    pub to_socket: Socket,
}

impl Connection
{
    pub fn new(
        from_node: NodeId,
        from_socket: Socket,
        to_node: NodeId,
        to_socket: Socket,
    ) -> Self
    {
        Self {
            from_node,
            from_socket,
            to_node,
            to_socket,
        }
    }
}

/// Errors raised while wiring a graph.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError
{
    #[error("cannot connect node {0} to itself")]
    SelfLoop(NodeId),
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
}

/// One material's nodes and connections. Node ids are dense and follow
/// insertion order, so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGraph
{
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl NodeGraph
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Adds a node and returns its id
    pub fn add_node(
        &mut self,
        mut node: Node,
    ) -> NodeId
    {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> Option<&Node>
    {
        self.nodes.get(id)
    }

    /// Adds a connection after checking both ends exist
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: Socket,
        to_node: NodeId,
        to_socket: Socket,
    ) -> Result<(), GraphError>
    {
        if from_node == to_node
        {
            return Err(GraphError::SelfLoop(from_node));
        }
        for id in [from_node, to_node]
        {
            if id >= self.nodes.len()
            {
                return Err(GraphError::MissingNode(id));
            }
        }

        self.connections
            .push(Connection::new(from_node, from_socket, to_node, to_socket));
        Ok(())
    }

    /// Removes every connection into `(to_node, to_socket)`, returning how many went.
    pub fn disconnect_input(
        &mut self,
        to_node: NodeId,
        to_socket: Socket,
    ) -> usize
    {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.to_node == to_node && c.to_socket == to_socket));
        before - self.connections.len()
    }

    /// The connection feeding `(to_node, to_socket)`, if any.
    pub fn input_link(
        &self,
        to_node: NodeId,
        to_socket: Socket,
    ) -> Option<&Connection>
    {
        self.connections
            .iter()
            .find(|c| c.to_node == to_node && c.to_socket == to_socket)
    }

    pub fn nodes_of_kind(
        &self,
        kind: NodeKind,
    ) -> impl Iterator<Item = &Node>
    {
        self.nodes
            .iter()
            .filter(move |n| n.kind == kind)
    }
}
