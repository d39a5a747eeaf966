//! State node - the single value type forming the state tree

use crate::ops;
use crate::{Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A node in the state tree
///
/// Nodes are plain data: the id doubles as a type tag ("all counters share
/// the id `Counter`"), the payload is opaque serialized data (JSON text by
/// convention) and children are ordered. Identity for matching and merging
/// is always the `id`, never the address of a node.
///
/// Equality is structural, see [`ops::is_equal`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateNode {
    /// Stable semantic identifier and type tag
    pub id: String,

    /// Serialized data carried by this node; `None` for grouping/marker nodes
    #[serde(default, skip_serializing_if = "Option::is_none", with = "payload_serde")]
    pub payload: Option<Bytes>,

    /// Ordered child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StateNode>,

    /// True only for the tree root held by a store
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_root: bool,
}

impl StateNode {
    /// Id of the sentinel returned where "no usable state" must be expressed
    /// as a node rather than an `Option`
    pub const EMPTY_ID: &'static str = "EmptyState";

    /// Create a marker node with the given id
    pub fn new(id: impl Into<String>) -> Self {
        StateNode {
            id: id.into(),
            payload: None,
            children: Vec::new(),
            is_root: false,
        }
    }

    /// Create a root node
    pub fn root(id: impl Into<String>) -> Self {
        StateNode {
            is_root: true,
            ..StateNode::new(id)
        }
    }

    /// The `EmptyState` sentinel node
    pub fn empty() -> Self {
        StateNode::new(Self::EMPTY_ID)
    }

    /// Set the raw payload
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the payload to the JSON encoding of `model`
    pub fn with_model<T: Serialize>(mut self, model: &T) -> Result<Self> {
        self.set_model(model)?;
        Ok(self)
    }

    /// Append a child
    pub fn with_child(mut self, child: StateNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = StateNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check whether this is the `EmptyState` sentinel
    pub fn is_empty_state(&self) -> bool {
        self.id == Self::EMPTY_ID && self.payload.is_none() && self.children.is_empty()
    }

    /// The payload as UTF-8 text, if present and valid
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Decode the payload into a model type
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self
            .payload
            .as_deref()
            .ok_or_else(|| Error::MissingPayload(self.id.clone()))?;
        serde_json::from_slice(payload).map_err(Error::Decode)
    }

    /// Decode the payload, recovering any failure as `None`
    pub fn payload_as<T: DeserializeOwned>(&self) -> Option<T> {
        match self.decode_payload() {
            Ok(model) => Some(model),
            Err(err) => {
                tracing::debug!(id = %self.id, error = %err, "payload decode failed");
                None
            }
        }
    }

    /// Replace the payload with the JSON encoding of `model`
    pub fn set_model<T: Serialize>(&mut self, model: &T) -> Result<()> {
        let data = serde_json::to_vec(model).map_err(Error::Encode)?;
        self.payload = Some(Bytes::from(data));
        Ok(())
    }

    /// First direct child with the given id
    pub fn child(&self, id: &str) -> Option<&StateNode> {
        self.children.iter().find(|c| c.id == id)
    }

    /// First direct child with the given id, mutably
    pub fn child_mut(&mut self, id: &str) -> Option<&mut StateNode> {
        self.children.iter_mut().find(|c| c.id == id)
    }

    /// Depth-first search for the first node with the given id (self included)
    pub fn find(&self, id: &str) -> Option<&StateNode> {
        ops::find(self, id)
    }

    /// Depth-first search for the first node with the given id, mutably
    pub fn find_mut(&mut self, id: &str) -> Option<&mut StateNode> {
        ops::find_mut(self, id)
    }

    /// Total number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(StateNode::node_count).sum::<usize>()
    }
}

impl Default for StateNode {
    fn default() -> Self {
        StateNode::empty()
    }
}

impl PartialEq for StateNode {
    fn eq(&self, other: &Self) -> bool {
        ops::is_equal(self, other)
    }
}

impl Eq for StateNode {}

/// Payloads are written as text when they hold UTF-8, and as a byte array
/// otherwise. Both forms are accepted when reading.
mod payload_serde {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        payload: &Option<Bytes>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match payload {
            None => serializer.serialize_none(),
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_some(text),
                Err(_) => serializer.serialize_some(bytes.as_ref()),
            },
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Raw(Vec<u8>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Bytes>, D::Error> {
        Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
            Repr::Text(text) => Bytes::from(text),
            Repr::Raw(raw) => Bytes::from(raw),
        }))
    }
}
