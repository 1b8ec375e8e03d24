//! In-memory knowledge base over a HowNet-style sememe dictionary.
//!
//! The base is built once from three dataset resources (sememe frequencies,
//! taxonomy triples, and sense records) and is read-only afterwards, so it
//! can be shared freely across threads. Loading runs in a fixed order:
//! register every sememe, apply the taxonomy triples, construct each sense
//! while flattening its KDML definition into a sememe list, back-link the
//! discovered sememes to their senses, then build the English and Chinese
//! surface-form indices in dataset order.
//!
//! Definition trees are *not* cached: [`HowNet::sememe_tree`] reparses on
//! demand, which keeps the stored senses immutable and the parser stateless.
//!
//! # Example
//! ```no_run
//! use hownet_kb::{HowNet, LoadMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = HowNet::load_with_mode("/path/to/hownet", LoadMode::Mmap)?;
//! for sense in dict.get("苹果", None) {
//!     let tree = dict.sememe_tree(sense)?;
//!     println!("{}: {:?}", sense.no, dict.expand_tree(&tree, -1));
//! }
//! # Ok(()) }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hownet_kdml::{ParseError, list_sememes, parse_definition};
use hownet_types::{
    DefTree, Language, NodeId, NodePayload, Sememe, SememeId, Sense, SenseId, SenseRecord,
};

const SEMEME_FILE: &str = "sememe_all.txt";
const TRIPLES_FILE: &str = "sememe_triples_taxonomy.txt";
const DICT_FILE: &str = "hownet_dict.tsv";

/// Strategy for reading dataset files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each file (fast, no copies before parsing).
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Errors from registry mutation and knowledge-base construction.
///
/// All variants are fatal during load: the loader never exposes a partially
/// built base. During ad hoc queries only [`KbError::Definition`] occurs,
/// and batch queries degrade by skipping the failing sense.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KbError {
    /// Re-registration of a sememe label, or a sense `No` collision.
    #[error("{0:?} is already registered")]
    DuplicateKey(String),
    /// Reference to a sememe label the registry does not hold.
    #[error("unknown sememe {0:?}")]
    UnknownSememe(String),
    /// A sense definition that does not parse.
    #[error("definition of sense {no} does not parse")]
    Definition {
        no: String,
        #[source]
        source: ParseError,
    },
    /// A required external resource is absent.
    #[error("missing resource: {0}")]
    MissingResource(String),
}

/// Registry of every sememe, keyed by the combined `en|zh` label.
#[derive(Debug, Default)]
pub struct SememeRegistry {
    items: Vec<Sememe>,
    by_label: HashMap<String, SememeId>,
}

impl SememeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sememe under its combined label.
    pub fn register(&mut self, label: &str, freq: u32) -> Result<SememeId, KbError> {
        if self.by_label.contains_key(label) {
            return Err(KbError::DuplicateKey(label.to_string()));
        }
        let id = SememeId(self.items.len() as u32);
        self.items.push(Sememe::new(label, freq));
        self.by_label.insert(label.to_string(), id);
        Ok(id)
    }

    /// Record a taxonomy triple on both endpoints.
    ///
    /// The edge lands in the head's forward map and the tail's backward map
    /// under the relation name. A repeated `(head, relation)` overwrites the
    /// earlier tail: last-write-wins is the taxonomy-load policy, not an
    /// error.
    pub fn add_relation(&mut self, head: &str, relation: &str, tail: &str) -> Result<(), KbError> {
        let head_id = self.lookup(head)?;
        let tail_id = self.lookup(tail)?;
        self.items[head_id.0 as usize]
            .forward
            .insert(relation.to_string(), tail_id);
        self.items[tail_id.0 as usize]
            .backward
            .insert(relation.to_string(), head_id);
        Ok(())
    }

    pub fn lookup(&self, label: &str) -> Result<SememeId, KbError> {
        self.find(label)
            .ok_or_else(|| KbError::UnknownSememe(label.to_string()))
    }

    pub fn find(&self, label: &str) -> Option<SememeId> {
        self.by_label.get(label).copied()
    }

    pub fn get(&self, id: SememeId) -> &Sememe {
        &self.items[id.0 as usize]
    }

    pub fn all(&self) -> impl Iterator<Item = &Sememe> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn record_usage(&mut self, id: SememeId, sense: SenseId) {
        self.items[id.0 as usize].senses.push(sense);
    }
}

/// Exported form of a definition tree: plain nested records, serializable
/// for transport. `name` is the sememe label, the marker character, or the
/// owning sense `No` at the root; unresolved roles export as `"None"`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeRecord {
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeRecord>,
}

/// Pluggable scorer for the external similarity subsystem.
///
/// The subsystem owns its precomputed tables; the base only hands it parsed
/// definition trees. Injected explicitly through [`HowNet::set_similarity`].
pub trait SenseSimilarity {
    fn score(&self, a: &DefTree, b: &DefTree) -> f64;
}

/// The loaded knowledge base: sememe registry, senses in dataset order, and
/// bilingual surface-form indices.
pub struct HowNet {
    sememes: SememeRegistry,
    senses: Vec<Sense>,
    by_no: HashMap<String, SenseId>,
    en_map: HashMap<String, Vec<SenseId>>,
    zh_map: HashMap<String, Vec<SenseId>>,
    similarity: Option<Box<dyn SenseSimilarity + Send + Sync>>,
}

// Not derivable: the similarity scorer is an opaque trait object.
impl std::fmt::Debug for HowNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HowNet")
            .field("sememes", &self.sememes.len())
            .field("senses", &self.senses.len())
            .field("similarity", &self.similarity.is_some())
            .finish_non_exhaustive()
    }
}

impl HowNet {
    /// Load from a directory holding the three dataset files, memory-mapped.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(dir, LoadMode::Mmap)
    }

    /// Load choosing between mmap and owned buffers at runtime.
    pub fn load_with_mode(dir: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let dir = dir.as_ref();
        for name in [SEMEME_FILE, TRIPLES_FILE, DICT_FILE] {
            let path = dir.join(name);
            if !path.exists() {
                return Err(KbError::MissingResource(path.display().to_string()).into());
            }
        }

        let sememe_buf = load_file(dir.join(SEMEME_FILE), mode)?;
        let triples_buf = load_file(dir.join(TRIPLES_FILE), mode)?;
        let dict_buf = load_file(dir.join(DICT_FILE), mode)?;

        let frequencies = parse_frequencies(sememe_buf.as_slice())?;
        let triples = parse_triples(triples_buf.as_slice())?;
        let records = parse_records(dict_buf.as_slice())?;

        let base = Self::from_parts(frequencies, triples, records)
            .with_context(|| format!("building knowledge base from {}", dir.display()))?;
        Ok(base)
    }

    /// Build a base from already-acquired dataset parts.
    ///
    /// Sequencing is load-order-sensitive: sememes, then triples, then
    /// senses (flattened immediately), then back-references, then the
    /// surface-form indices. Any unregistered reference aborts the build.
    pub fn from_parts(
        frequencies: impl IntoIterator<Item = (String, u32)>,
        triples: impl IntoIterator<Item = (String, String, String)>,
        records: impl IntoIterator<Item = SenseRecord>,
    ) -> Result<Self, KbError> {
        let mut sememes = SememeRegistry::new();
        for (label, freq) in frequencies {
            sememes.register(&label, freq)?;
        }
        for (head, relation, tail) in triples {
            sememes.add_relation(&head, &relation, &tail)?;
        }

        let mut senses = Vec::new();
        let mut by_no = HashMap::new();
        for record in records {
            let id = SenseId(senses.len() as u32);
            let refs =
                list_sememes(&record.def, |label| sememes.find(label)).map_err(|err| match err {
                    ParseError::UnknownSememe { label } => KbError::UnknownSememe(label),
                    other => KbError::Definition {
                        no: record.no.clone(),
                        source: other,
                    },
                })?;
            if by_no.insert(record.no.clone(), id).is_some() {
                return Err(KbError::DuplicateKey(record.no));
            }
            senses.push(Sense {
                id,
                no: record.no,
                en_word: record.en_word,
                en_grammar: record.en_grammar,
                zh_word: record.zh_word,
                zh_grammar: record.zh_grammar,
                def: record.def,
                sememes: refs,
            });
        }

        for sense in &senses {
            for &sid in &sense.sememes {
                sememes.record_usage(sid, sense.id);
            }
        }

        let mut en_map: HashMap<String, Vec<SenseId>> = HashMap::new();
        let mut zh_map: HashMap<String, Vec<SenseId>> = HashMap::new();
        for sense in &senses {
            en_map
                .entry(sense.en_word.trim().to_string())
                .or_default()
                .push(sense.id);
            zh_map
                .entry(sense.zh_word.trim().to_string())
                .or_default()
                .push(sense.id);
        }

        info!(
            "knowledge base ready: {} sememes, {} senses, {} en / {} zh forms",
            sememes.len(),
            senses.len(),
            en_map.len(),
            zh_map.len()
        );
        Ok(HowNet {
            sememes,
            senses,
            by_no,
            en_map,
            zh_map,
            similarity: None,
        })
    }

    /// Senses matching a surface form, or a sense `No` when no language is
    /// given.
    ///
    /// Without a language the result concatenates the English matches, the
    /// Chinese matches, then a direct `No` match, in that order and without
    /// de-duplication: a sense reachable through two paths appears twice.
    /// An absent word yields an empty list, never an error.
    pub fn get(&self, word: &str, language: Option<Language>) -> Vec<&Sense> {
        match language {
            Some(Language::En) => self.map_hits(&self.en_map, word),
            Some(Language::Zh) => self.map_hits(&self.zh_map, word),
            None => {
                let mut out = self.map_hits(&self.en_map, word);
                out.extend(self.map_hits(&self.zh_map, word));
                if let Some(&id) = self.by_no.get(word) {
                    out.push(self.sense(id));
                }
                out
            }
        }
    }

    /// Exact-match existence check; case-sensitive like the annotation.
    pub fn has(&self, word: &str, language: Option<Language>) -> bool {
        match language {
            Some(Language::En) => self.en_map.contains_key(word),
            Some(Language::Zh) => self.zh_map.contains_key(word),
            None => {
                self.en_map.contains_key(word)
                    || self.zh_map.contains_key(word)
                    || self.by_no.contains_key(word)
            }
        }
    }

    pub fn sense_by_no(&self, no: &str) -> Option<&Sense> {
        self.by_no.get(no).map(|&id| self.sense(id))
    }

    /// Senses in dataset load order.
    pub fn iter_senses(&self) -> impl Iterator<Item = &Sense> {
        self.senses.iter()
    }

    pub fn sense_count(&self) -> usize {
        self.senses.len()
    }

    pub fn sememe_count(&self) -> usize {
        self.sememes.len()
    }

    pub fn registry(&self) -> &SememeRegistry {
        &self.sememes
    }

    pub fn all_sememes(&self) -> impl Iterator<Item = &Sememe> {
        self.sememes.all()
    }

    pub fn sememe(&self, label: &str) -> Option<&Sememe> {
        self.sememes.find(label).map(|id| self.sememes.get(id))
    }

    pub fn en_words(&self) -> Vec<&str> {
        self.en_map.keys().map(String::as_str).collect()
    }

    pub fn zh_words(&self) -> Vec<&str> {
        self.zh_map.keys().map(String::as_str).collect()
    }

    /// Parse one sense's definition into its attributed tree.
    ///
    /// Reparses on every call; the error surfaces to the caller here, while
    /// the batch methods below catch and skip instead.
    pub fn sememe_tree(&self, sense: &Sense) -> Result<DefTree, KbError> {
        parse_definition(sense.id, &sense.def, |label| self.sememes.find(label)).map_err(
            |source| KbError::Definition {
                no: sense.no.clone(),
                source,
            },
        )
    }

    /// Export a tree as plain nested records.
    pub fn tree_record(&self, tree: &DefTree) -> TreeRecord {
        self.record_node(tree, tree.root())
    }

    /// Collect sememe labels from the tree down to `depth` generations.
    ///
    /// The budget counts from the root generation: depth 2 yields exactly
    /// the root's children, 0 nothing, -1 the whole tree. Wildcard and
    /// variable leaves never contribute.
    pub fn expand_tree(&self, tree: &DefTree, depth: i32) -> HashSet<String> {
        let mut out = HashSet::new();
        if depth != 0 {
            self.expand_level(tree, &tree.node(tree.root()).children, depth - 1, &mut out);
        }
        out
    }

    /// Trees for every sense of `word`, ordered by ascending numeric `No`.
    /// Senses whose definition fails to parse are logged and skipped.
    pub fn sememe_trees(&self, word: &str) -> Vec<(&Sense, DefTree)> {
        let mut out = Vec::new();
        for sense in self.candidates(word) {
            match self.sememe_tree(sense) {
                Ok(tree) => out.push((sense, tree)),
                Err(err) => warn!("skipping sense {}: {err}", sense.no),
            }
        }
        out
    }

    /// Exported records for every sense of `word`; failures are skipped.
    pub fn sememe_records(&self, word: &str) -> Vec<(&Sense, TreeRecord)> {
        self.sememe_trees(word)
            .into_iter()
            .map(|(sense, tree)| (sense, self.tree_record(&tree)))
            .collect()
    }

    /// Per-sense expanded sememe sets for `word`; failures are skipped.
    pub fn sememe_lists(&self, word: &str, depth: i32) -> Vec<(&Sense, HashSet<String>)> {
        self.sememe_trees(word)
            .into_iter()
            .map(|(sense, tree)| (sense, self.expand_tree(&tree, depth)))
            .collect()
    }

    /// Union of the expanded sememe sets over every sense of `word`.
    pub fn merged_sememes(&self, word: &str, depth: i32) -> HashSet<String> {
        let mut out = HashSet::new();
        for (_, set) in self.sememe_lists(word, depth) {
            out.extend(set);
        }
        out
    }

    /// Human-readable dump of one tree, `[role]name` per node.
    pub fn render_tree(&self, tree: &DefTree) -> String {
        let mut out = String::new();
        let root = tree.node(tree.root());
        out.push_str(&format!(
            "[{}]{}\n",
            root.role.as_deref().unwrap_or("None"),
            self.payload_name(root.payload)
        ));
        for (i, &c) in root.children.iter().enumerate() {
            self.render_node(tree, c, "", i + 1 == root.children.len(), &mut out);
        }
        out
    }

    /// Dump the trees of every sense of `word`, capped to the first `limit`
    /// candidates (ordered by ascending `No`) when `limit` is at least one.
    pub fn render_word(&self, word: &str, limit: Option<usize>) -> String {
        let candidates = self.candidates(word);
        let mut out = format!("Found {} result(s)\n", candidates.len());
        let shown = match limit {
            Some(k) if k >= 1 => k,
            _ => candidates.len(),
        };
        for (i, sense) in candidates.iter().take(shown).enumerate() {
            out.push_str(&format!("Display #{i} sememe tree\n"));
            match self.sememe_tree(sense) {
                Ok(tree) => out.push_str(&self.render_tree(&tree)),
                Err(err) => warn!("skipping sense {}: {err}", sense.no),
            }
        }
        out
    }

    /// Relation name of the forward taxonomy edge from `head` to `tail`.
    pub fn relation_between(&self, head: &str, tail: &str) -> Option<&str> {
        let head = self.sememe(head)?;
        let tail_id = self.sememes.find(tail)?;
        head.forward
            .iter()
            .find(|(_, id)| **id == tail_id)
            .map(|(relation, _)| relation.as_str())
    }

    /// Forward taxonomy target of `head` under `relation`.
    pub fn related_by(&self, head: &str, relation: &str) -> Option<&Sememe> {
        self.sememe(head)?
            .forward
            .get(relation)
            .map(|&id| self.sememes.get(id))
    }

    /// Every taxonomy neighbor of `label`, forward edges first.
    pub fn related_sememes(&self, label: &str) -> Vec<(&str, &Sememe)> {
        let Some(sememe) = self.sememe(label) else {
            return Vec::new();
        };
        sememe
            .forward
            .iter()
            .chain(sememe.backward.iter())
            .map(|(relation, &id)| (relation.as_str(), self.sememes.get(id)))
            .collect()
    }

    /// Senses whose flattened definition mentions `label`, in discovery
    /// order; a definition mentioning it twice lists the sense twice.
    pub fn senses_by_sememe(&self, label: &str) -> Vec<&Sense> {
        self.sememe(label)
            .map(|s| s.senses.iter().map(|&id| self.sense(id)).collect())
            .unwrap_or_default()
    }

    /// Inject the external similarity scorer.
    pub fn set_similarity(&mut self, scorer: Box<dyn SenseSimilarity + Send + Sync>) {
        self.similarity = Some(scorer);
    }

    pub fn has_similarity(&self) -> bool {
        self.similarity.is_some()
    }

    /// Best similarity score over all sense pairs of the two words.
    ///
    /// Requires an injected scorer; words absent from the annotation score
    /// 0.0, as do senses whose definitions fail to parse.
    pub fn word_similarity(&self, word0: &str, word1: &str) -> Result<f64, KbError> {
        let Some(scorer) = self.similarity.as_ref() else {
            return Err(KbError::MissingResource(
                "similarity context is not attached".to_string(),
            ));
        };
        let left: Vec<DefTree> = self
            .sememe_trees(word0)
            .into_iter()
            .map(|(_, tree)| tree)
            .collect();
        let right: Vec<DefTree> = self
            .sememe_trees(word1)
            .into_iter()
            .map(|(_, tree)| tree)
            .collect();
        let mut best = 0.0f64;
        for a in &left {
            for b in &right {
                best = best.max(scorer.score(a, b));
            }
        }
        Ok(best)
    }

    fn sense(&self, id: SenseId) -> &Sense {
        &self.senses[id.0 as usize]
    }

    fn map_hits(&self, map: &HashMap<String, Vec<SenseId>>, word: &str) -> Vec<&Sense> {
        map.get(word)
            .map(|ids| ids.iter().map(|&id| self.sense(id)).collect())
            .unwrap_or_default()
    }

    fn candidates(&self, word: &str) -> Vec<&Sense> {
        let mut senses = self.get(word, None);
        senses.sort_by_key(|s| numeric_no(&s.no));
        senses
    }

    fn payload_name(&self, payload: NodePayload) -> String {
        match payload {
            NodePayload::Sense(id) => self.sense(id).no.clone(),
            NodePayload::Sememe(id) => self.sememes.get(id).label.clone(),
            NodePayload::Marker(m) => m.to_char().to_string(),
        }
    }

    fn record_node(&self, tree: &DefTree, id: NodeId) -> TreeRecord {
        let node = tree.node(id);
        TreeRecord {
            name: self.payload_name(node.payload),
            role: node.role.clone().unwrap_or_else(|| "None".to_string()),
            children: node
                .children
                .iter()
                .map(|&c| self.record_node(tree, c))
                .collect(),
        }
    }

    fn expand_level(
        &self,
        tree: &DefTree,
        level: &[NodeId],
        budget: i32,
        out: &mut HashSet<String>,
    ) {
        if budget == 0 {
            return;
        }
        for &id in level {
            let node = tree.node(id);
            if let NodePayload::Sememe(s) = node.payload {
                out.insert(self.sememes.get(s).label.clone());
            }
            self.expand_level(tree, &node.children, budget - 1, out);
        }
    }

    fn render_node(&self, tree: &DefTree, id: NodeId, prefix: &str, last: bool, out: &mut String) {
        let node = tree.node(id);
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&format!(
            "[{}]{}\n",
            node.role.as_deref().unwrap_or("None"),
            self.payload_name(node.payload)
        ));
        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        for (i, &c) in node.children.iter().enumerate() {
            self.render_node(tree, c, &child_prefix, i + 1 == node.children.len(), out);
        }
    }
}

fn numeric_no(no: &str) -> u64 {
    no.parse().unwrap_or(u64::MAX)
}

fn load_file(path: PathBuf, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn parse_frequencies(bytes: &[u8]) -> Result<Vec<(String, u32)>> {
    let mut out = Vec::new();
    for (lineno, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = strip_cr(raw_line);
        if line.is_empty() {
            continue;
        }
        let line_str = std::str::from_utf8(line)
            .with_context(|| format!("{SEMEME_FILE}:{} is not utf-8", lineno + 1))?;
        let mut tokens = line_str.split_whitespace();
        let label = match tokens.next() {
            Some(t) => t,
            None => continue,
        };
        let freq: u32 = tokens
            .next()
            .with_context(|| format!("{SEMEME_FILE}:{} missing frequency", lineno + 1))?
            .parse()
            .with_context(|| format!("{SEMEME_FILE}:{} invalid frequency", lineno + 1))?;
        out.push((label.to_string(), freq));
    }
    Ok(out)
}

fn parse_triples(bytes: &[u8]) -> Result<Vec<(String, String, String)>> {
    let mut out = Vec::new();
    for (lineno, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = strip_cr(raw_line);
        if line.is_empty() {
            continue;
        }
        let line_str = std::str::from_utf8(line)
            .with_context(|| format!("{TRIPLES_FILE}:{} is not utf-8", lineno + 1))?;
        let tokens: Vec<&str> = line_str.split_whitespace().collect();
        if tokens.len() != 3 {
            anyhow::bail!(
                "{TRIPLES_FILE}:{} expected `head relation tail`, got {} tokens",
                lineno + 1,
                tokens.len()
            );
        }
        out.push((
            tokens[0].to_string(),
            tokens[1].to_string(),
            tokens[2].to_string(),
        ));
    }
    Ok(out)
}

fn parse_records(bytes: &[u8]) -> Result<Vec<SenseRecord>> {
    let mut out = Vec::new();
    for (lineno, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = strip_cr(raw_line);
        if line.is_empty() {
            continue;
        }
        let line_str = std::str::from_utf8(line)
            .with_context(|| format!("{DICT_FILE}:{} is not utf-8", lineno + 1))?;
        let fields: Vec<&str> = line_str.split('\t').collect();
        if fields.len() != 6 {
            anyhow::bail!(
                "{DICT_FILE}:{} expected 6 tab-separated fields, got {}",
                lineno + 1,
                fields.len()
            );
        }
        out.push(SenseRecord {
            no: fields[0].to_string(),
            en_word: fields[1].to_string(),
            en_grammar: fields[2].to_string(),
            zh_word: fields[3].to_string(),
            zh_grammar: fields[4].to_string(),
            def: fields[5].to_string(),
        });
    }
    Ok(out)
}

fn strip_cr(line: &[u8]) -> &[u8] {
    if line.ends_with(b"\r") {
        &line[..line.len() - 1]
    } else {
        line
    }
}
