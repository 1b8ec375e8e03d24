//! Shared types for a HowNet-style sememe dictionary.
//!
//! A *sememe* is the smallest unit of meaning, labeled bilingually as
//! `english|chinese`. A *sense* is one dictionary entry: a word form in two
//! languages plus a definition written in KDML, the bracketed markup that
//! describes the sense in terms of sememes and semantic roles.
//!
//! This crate only carries data shapes. Parsing lives in `hownet-kdml`,
//! storage and queries in `hownet-kb`. Sememes and senses are addressed by
//! `u32` index newtypes ([`SememeId`], [`SenseId`]) into the registry that
//! owns them; definition trees are index arenas ([`DefTree`]) so nodes can
//! reference parents and children without ownership cycles.
//!
//! ```rust
//! use hownet_types::{DefTree, Marker, NodePayload, SenseId};
//!
//! let mut tree = DefTree::new(SenseId(0));
//! let root = tree.root();
//! let leaf = tree.push(NodePayload::Marker(Marker::Wildcard), None, root);
//! assert_eq!(tree.node(leaf).parent, Some(root));
//! ```

use std::collections::HashMap;
use std::fmt;

/// Search language selector for the bilingual indices.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Language {
    En,
    Zh,
}

impl Language {
    /// Parse the two-letter code used in queries (`en`, `zh`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Index of a sememe within the registry that owns it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SememeId(pub u32);

/// Index of a sense within the knowledge base, in dataset load order.
///
/// External sense identity is the dictionary-assigned numeric-string
/// [`Sense::no`]; this handle is only valid against the base that issued it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SenseId(pub u32);

/// Index of a node within one [`DefTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub u32);

/// Split a combined `english|chinese` label into its halves.
///
/// A label without a separator keeps the whole text on the English side and
/// leaves the Chinese half empty.
pub fn split_label(label: &str) -> (&str, &str) {
    match label.split_once('|') {
        Some((en, zh)) => (en, zh),
        None => (label, ""),
    }
}

/// One sememe with its taxonomy edges and back-references.
///
/// `forward` holds edges where this sememe is the triple head, keyed by
/// relation name; `backward` the symmetric tail-side map. Both hold a single
/// target per relation: re-applying a relation overwrites the earlier target
/// (last-write-wins, by taxonomy-load policy). `senses` lists every sense
/// whose flattened definition mentions this sememe, in discovery order.
#[derive(Clone, Debug)]
pub struct Sememe {
    pub en: String,
    pub zh: String,
    /// Combined `en|zh` label, the registry key.
    pub label: String,
    pub freq: u32,
    pub forward: HashMap<String, SememeId>,
    pub backward: HashMap<String, SememeId>,
    pub senses: Vec<SenseId>,
}

impl Sememe {
    pub fn new(label: impl Into<String>, freq: u32) -> Self {
        let label = label.into();
        let (en, zh) = split_label(&label);
        Sememe {
            en: en.to_string(),
            zh: zh.to_string(),
            label,
            freq,
            forward: HashMap::new(),
            backward: HashMap::new(),
            senses: Vec::new(),
        }
    }
}

impl fmt::Display for Sememe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Raw dataset record for one sense, as supplied by the acquisition layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SenseRecord {
    pub no: String,
    pub en_word: String,
    pub en_grammar: String,
    pub zh_word: String,
    pub zh_grammar: String,
    pub def: String,
}

/// One loaded sense. Immutable after load.
#[derive(Clone, Debug)]
pub struct Sense {
    pub id: SenseId,
    /// Dictionary-assigned numeric-string identifier, unique across the base.
    pub no: String,
    pub en_word: String,
    pub en_grammar: String,
    pub zh_word: String,
    pub zh_grammar: String,
    /// Raw KDML definition text.
    pub def: String,
    /// Flattened sememe references from the whole definition, in text order.
    pub sememes: Vec<SememeId>,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.no)
    }
}

/// Anaphora marker characters appearing in KDML definitions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Marker {
    /// `~`: refers back to the enclosing entity; collapsed away during
    /// parsing, so it never survives into a finished tree.
    Reuse,
    /// `?`: unspecified filler, kept as a leaf.
    Wildcard,
    /// `$`: bound variable, kept as a leaf.
    Variable,
}

impl Marker {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '~' => Some(Marker::Reuse),
            '?' => Some(Marker::Wildcard),
            '$' => Some(Marker::Variable),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Marker::Reuse => '~',
            Marker::Wildcard => '?',
            Marker::Variable => '$',
        }
    }
}

/// Payload of one definition-tree node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodePayload {
    /// The owning sense; only ever the root.
    Sense(SenseId),
    Sememe(SememeId),
    Marker(Marker),
}

/// One node of a [`DefTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefNode {
    pub payload: NodePayload,
    /// Semantic role on the edge to the parent; `None` when unresolved.
    pub role: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An attributed definition tree stored as an index arena.
///
/// Node 0 is always the root and carries the owning sense. Child lists
/// preserve the left-to-right order of the definition text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefTree {
    pub nodes: Vec<DefNode>,
}

impl DefTree {
    /// Create a tree holding only the root node for `owner`.
    pub fn new(owner: SenseId) -> Self {
        DefTree {
            nodes: vec![DefNode {
                payload: NodePayload::Sense(owner),
                role: Some("sense".to_string()),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DefNode {
        &self.nodes[id.0 as usize]
    }

    /// Append a node under `parent` and return its id.
    pub fn push(&mut self, payload: NodePayload, role: Option<String>, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DefNode {
            payload,
            role,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bilingual_labels() {
        assert_eq!(split_label("human|人"), ("human", "人"));
        assert_eq!(split_label("FormValue|形状值"), ("FormValue", "形状值"));
        assert_eq!(split_label("bare"), ("bare", ""));
        assert_eq!(split_label("|只有中文"), ("", "只有中文"));
    }

    #[test]
    fn marker_chars_round_trip() {
        for c in ['~', '?', '$'] {
            assert_eq!(Marker::from_char(c).unwrap().to_char(), c);
        }
        assert_eq!(Marker::from_char('x'), None);
    }

    #[test]
    fn trees_compare_structurally() {
        let build = || {
            let mut tree = DefTree::new(SenseId(1));
            let root = tree.root();
            tree.push(NodePayload::Sememe(SememeId(0)), Some("scope".into()), root);
            tree
        };
        let mut other = build();
        assert_eq!(build(), build());
        other.push(NodePayload::Marker(Marker::Wildcard), None, other.root());
        assert_ne!(build(), other);
    }

    #[test]
    fn push_links_parent_and_children() {
        let mut tree = DefTree::new(SenseId(7));
        let root = tree.root();
        let a = tree.push(NodePayload::Sememe(SememeId(1)), None, root);
        let b = tree.push(NodePayload::Sememe(SememeId(2)), Some("agent".into()), a);
        assert_eq!(tree.node(root).children, vec![a]);
        assert_eq!(tree.node(a).children, vec![b]);
        assert_eq!(tree.node(b).parent, Some(a));
        assert_eq!(tree.node(root).payload, NodePayload::Sense(SenseId(7)));
        assert_eq!(tree.len(), 3);
    }
}
