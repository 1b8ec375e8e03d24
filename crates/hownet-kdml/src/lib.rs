//! Parser for KDML, the bracketed markup HowNet-style dictionaries use to
//! define a sense in terms of sememes.
//!
//! A definition is one or more `;`-separated clauses, optionally followed by
//! a `RMK=` remark. Within a clause, sememe references are written
//! `{english|chinese}` (or quoted, `"english|chinese"`), attribute groups
//! attach children through `role={...}` pairs, and three single-character
//! markers stand in for non-sememe leaves: `~` (refer back to the enclosing
//! entity), `?` (unspecified filler), `$` (bound variable).
//!
//! The crate is intentionally decoupled from any registry: sememe references
//! resolve through a caller-supplied lookup closure, so the same parser runs
//! against a full knowledge base or a test fixture.
//!
//! Two entry points mirror the two derivations a knowledge base needs:
//!
//! - [`parse_definition`] builds the attributed tree for the *first* clause
//!   only, the way published sememe dictionaries are annotated.
//! - [`list_sememes`] is a flat single pass over the *whole* raw string,
//!   remark and later clauses included, collecting every reference in text
//!   order and ignoring markers and nesting.
//!
//! The two passes deliberately do not share clause handling; the asymmetry
//! is long-standing observable behavior and callers rely on it.
//!
//! # Example
//! ```rust
//! use hownet_kdml::parse_definition;
//! use hownet_types::{NodePayload, SememeId, SenseId};
//!
//! let lookup = |label: &str| (label == "die|死").then_some(SememeId(0));
//! let tree = parse_definition(SenseId(0), "{die|死}", lookup).unwrap();
//! let child = tree.node(tree.root()).children[0];
//! assert_eq!(tree.node(child).payload, NodePayload::Sememe(SememeId(0)));
//! ```

use hownet_types::{DefTree, Marker, NodeId, NodePayload, SememeId, SenseId};
use thiserror::Error;

/// Introduces the remark segment stripped before tree parsing.
pub const REMARK_MARKER: &str = "RMK=";

/// Separates clauses; only the first clause is turned into a tree.
pub const CLAUSE_DELIMITER: char = ';';

/// Failure to turn a definition into a tree or reference list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The clause contains no sememe references or markers at all.
    #[error("definition clause contains no entities")]
    Empty,
    /// A `|` reference anchor with no enclosing `{`/`"` on the left or no
    /// closing `}`/`:`/`"` on the right.
    #[error("unterminated sememe reference at character {at}")]
    Unterminated { at: usize },
    /// A reference resolved to a label the registry does not know.
    #[error("unknown sememe {label:?}")]
    UnknownSememe { label: String },
}

/// One scanned entity: its character span in the clause plus the node data
/// accumulated during parent/role resolution.
struct Entity {
    start: usize,
    end: usize,
    payload: NodePayload,
    role: Option<String>,
    parent: Option<usize>,
}

/// Parse the first clause of `def` into an attributed tree rooted at `owner`.
///
/// Deterministic and read-only with respect to the registry behind `lookup`.
/// The returned arena always has the owning sense at node 0; the first
/// entity of the clause hangs directly under it regardless of what the
/// structural parent search found.
///
/// A `~` marker whose parent search fails (a trailing `~` outside any
/// attribute group) is dropped without annotating anything, so the rest of
/// the clause still parses.
pub fn parse_definition<F>(owner: SenseId, def: &str, lookup: F) -> Result<DefTree, ParseError>
where
    F: Fn(&str) -> Option<SememeId>,
{
    let stripped = match def.find(REMARK_MARKER) {
        Some(pos) => &def[..pos],
        None => def,
    };
    let clause = stripped.split(CLAUSE_DELIMITER).next().unwrap_or("");
    let chars: Vec<char> = clause.chars().collect();

    let (mut entities, reuse) = scan_entities(&chars, &lookup)?;
    if entities.is_empty() {
        return Err(ParseError::Empty);
    }

    resolve_parents(&chars, &mut entities);
    resolve_roles(&chars, &mut entities);

    // Collapse `~` markers: the marker's role annotates its parent, the
    // marker itself never becomes a tree node. A marker whose parent search
    // failed is dropped without annotating anything.
    let mut removed = vec![false; entities.len()];
    for &m in &reuse {
        if let Some(p) = entities[m].parent {
            entities[p].role = entities[m].role.clone();
        }
        removed[m] = true;
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); entities.len()];
    for i in 1..entities.len() {
        if let Some(p) = entities[i].parent {
            children[p].push(i);
        }
    }

    let mut tree = DefTree::new(owner);
    if !removed[0] {
        let root = tree.root();
        attach(&mut tree, &entities, &children, &removed, 0, root);
    }
    Ok(tree)
}

/// Collect every sememe reference in the raw definition, in text order.
///
/// Scans the entire string: later clauses and the `RMK=` remark are
/// included, markers and nesting are ignored, and a reference appearing
/// twice is collected twice. Reference text is looked up verbatim.
pub fn list_sememes<F>(def: &str, lookup: F) -> Result<Vec<SememeId>, ParseError>
where
    F: Fn(&str) -> Option<SememeId>,
{
    let chars: Vec<char> = def.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        if chars[i] != '|' {
            continue;
        }
        let (start, end) = reference_span(&chars, i)?;
        let label: String = chars[start + 1..end].iter().collect();
        match lookup(&label) {
            Some(id) => out.push(id),
            None => return Err(ParseError::UnknownSememe { label }),
        }
    }
    Ok(out)
}

/// Single left-to-right pass over the clause recording markers and sememe
/// references together with their character spans.
fn scan_entities<F>(chars: &[char], lookup: &F) -> Result<(Vec<Entity>, Vec<usize>), ParseError>
where
    F: Fn(&str) -> Option<SememeId>,
{
    let mut entities = Vec::new();
    let mut reuse = Vec::new();
    for i in 0..chars.len() {
        if let Some(marker) = Marker::from_char(chars[i]) {
            if marker == Marker::Reuse {
                reuse.push(entities.len());
            }
            entities.push(Entity {
                start: i,
                end: i + 1,
                payload: NodePayload::Marker(marker),
                role: None,
                parent: None,
            });
        } else if chars[i] == '|' {
            let (start, end) = reference_span(chars, i)?;
            // Annotations write multiword labels with spaces; the registry
            // keys them with underscores.
            let label: String = chars[start + 1..end]
                .iter()
                .collect::<String>()
                .replace(' ', "_");
            let id = match lookup(&label) {
                Some(id) => id,
                None => return Err(ParseError::UnknownSememe { label }),
            };
            entities.push(Entity {
                start: start + 1,
                end,
                payload: NodePayload::Sememe(id),
                role: None,
                parent: None,
            });
        }
    }
    Ok((entities, reuse))
}

/// Find the `{`/`"` opening a reference and the `}`/`:`/`"` closing it,
/// anchored at the `|` separator.
fn reference_span(chars: &[char], pipe: usize) -> Result<(usize, usize), ParseError> {
    let mut start = pipe;
    while !matches!(chars[start], '{' | '"') {
        if start == 0 {
            return Err(ParseError::Unterminated { at: pipe });
        }
        start -= 1;
    }
    let mut end = pipe;
    while !matches!(chars[end], '}' | ':' | '"') {
        end += 1;
        if end == chars.len() {
            return Err(ParseError::Unterminated { at: pipe });
        }
    }
    Ok((start, end))
}

/// For each entity, scan backward for the colon closing the immediately
/// enclosing attribute group, then attach the nearest earlier entity whose
/// span ends exactly there.
///
/// The colon qualifies when the running open-brace count is one above the
/// close count outside a quoted context, or balanced inside one. Both scans
/// strictly decrease in position, so termination is structural.
fn resolve_parents(chars: &[char], entities: &mut [Entity]) {
    for i in 0..entities.len() {
        let mut cursor = entities[i].start;
        let mut left_brace = 0u32;
        let mut right_brace = 0u32;
        let mut quotation = 0u32;
        loop {
            let boundary = chars[cursor] == ':'
                && ((quotation % 2 == 0 && left_brace == right_brace + 1)
                    || (quotation % 2 == 1 && left_brace == right_brace));
            if boundary || cursor == 0 {
                break;
            }
            match chars[cursor] {
                '{' => left_brace += 1,
                '}' => right_brace += 1,
                '"' => quotation += 1,
                _ => {}
            }
            cursor -= 1;
        }
        for j in (0..i).rev() {
            if entities[j].end == cursor {
                entities[i].parent = Some(j);
                break;
            }
        }
    }
}

/// Resolve role labels from the text window between each entity and its
/// parent (or the previous entity when no parent matched).
///
/// Scanning right-to-left, `=` closes a role label and the nearest `,`/`:`
/// before it opens one. With no `=` in the window, or an `=` with no
/// opening separator, the role stays unresolved.
fn resolve_roles(chars: &[char], entities: &mut [Entity]) {
    for i in 1..entities.len() {
        let right_range = match entities[i].parent {
            Some(p) => entities[p].end - 1,
            None => entities[i - 1].end - 1,
        };
        if entities[i].start <= right_range + 1 {
            continue;
        }
        let mut role_begin = None;
        let mut role_end = None;
        for j in ((right_range + 1)..entities[i].start).rev() {
            match chars[j] {
                '=' => role_end = Some(j),
                ',' | ':' => {
                    role_begin = Some(j);
                    break;
                }
                _ => {}
            }
        }
        if let (Some(begin), Some(end)) = (role_begin, role_end) {
            entities[i].role = Some(chars[begin + 1..end].iter().collect());
        }
    }
}

/// Copy the surviving entity forest into a compact arena under `parent`.
fn attach(
    tree: &mut DefTree,
    entities: &[Entity],
    children: &[Vec<usize>],
    removed: &[bool],
    idx: usize,
    parent: NodeId,
) {
    if removed[idx] {
        return;
    }
    let id = tree.push(entities[idx].payload, entities[idx].role.clone(), parent);
    for &c in &children[idx] {
        attach(tree, entities, children, removed, c, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hownet_types::DefNode;

    fn registry(labels: &'static [&'static str]) -> impl Fn(&str) -> Option<SememeId> {
        move |label| {
            labels
                .iter()
                .position(|l| *l == label)
                .map(|i| SememeId(i as u32))
        }
    }

    fn child<'a>(tree: &'a DefTree, of: NodeId, nth: usize) -> (&'a DefNode, NodeId) {
        let id = tree.node(of).children[nth];
        (tree.node(id), id)
    }

    #[test]
    fn single_sememe_definition() {
        let lookup = registry(&["die|死"]);
        let tree = parse_definition(SenseId(0), "{die|死}", lookup).unwrap();
        assert_eq!(tree.node(tree.root()).children.len(), 1);
        let (node, _) = child(&tree, tree.root(), 0);
        assert_eq!(node.payload, NodePayload::Sememe(SememeId(0)));
        assert_eq!(node.role, None);
    }

    #[test]
    fn roles_attach_to_nested_entities() {
        let lookup = registry(&["able|能", "succeed|成功"]);
        let tree = parse_definition(SenseId(0), "{able|能:scope={succeed|成功}}", lookup).unwrap();
        let (able, able_id) = child(&tree, tree.root(), 0);
        assert_eq!(able.payload, NodePayload::Sememe(SememeId(0)));
        assert_eq!(able.role, None);
        let (succeed, _) = child(&tree, able_id, 0);
        assert_eq!(succeed.payload, NodePayload::Sememe(SememeId(1)));
        assert_eq!(succeed.role.as_deref(), Some("scope"));
    }

    #[test]
    fn reuse_marker_collapses_onto_parent() {
        let lookup = registry(&["tree|树", "reproduce|生殖", "fruit|水果"]);
        let def = "{tree|树:{reproduce|生殖:PatientProduct={fruit|水果},agent={~}}}";
        let tree = parse_definition(SenseId(0), def, lookup).unwrap();

        let (top, top_id) = child(&tree, tree.root(), 0);
        assert_eq!(top.payload, NodePayload::Sememe(SememeId(0)));
        let (reproduce, reproduce_id) = child(&tree, top_id, 0);
        assert_eq!(reproduce.payload, NodePayload::Sememe(SememeId(1)));
        // The marker's resolved role lands on its parent, the marker is gone.
        assert_eq!(reproduce.role.as_deref(), Some("agent"));
        assert_eq!(tree.node(reproduce_id).children.len(), 1);
        let (fruit, _) = child(&tree, reproduce_id, 0);
        assert_eq!(fruit.payload, NodePayload::Sememe(SememeId(2)));
        assert_eq!(fruit.role.as_deref(), Some("PatientProduct"));
        assert!(
            tree.nodes
                .iter()
                .all(|n| n.payload != NodePayload::Marker(Marker::Reuse))
        );
    }

    #[test]
    fn wildcard_and_variable_stay_as_leaves() {
        let lookup = registry(&["compare|比较"]);
        let def = "{compare|比较:content={$},contrast={?}}";
        let tree = parse_definition(SenseId(0), def, lookup).unwrap();
        let (_, compare_id) = child(&tree, tree.root(), 0);
        assert_eq!(tree.node(compare_id).children.len(), 2);
        let (variable, _) = child(&tree, compare_id, 0);
        assert_eq!(variable.payload, NodePayload::Marker(Marker::Variable));
        assert_eq!(variable.role.as_deref(), Some("content"));
        let (wildcard, _) = child(&tree, compare_id, 1);
        assert_eq!(wildcard.payload, NodePayload::Marker(Marker::Wildcard));
        assert_eq!(wildcard.role.as_deref(), Some("contrast"));
    }

    #[test]
    fn trailing_reuse_without_parent_is_dropped() {
        let lookup = registry(&["belong|属于", "human|人"]);
        let tree = parse_definition(SenseId(0), "{belong|属于:{human|人}~}", lookup).unwrap();
        let (belong, belong_id) = child(&tree, tree.root(), 0);
        assert_eq!(belong.payload, NodePayload::Sememe(SememeId(0)));
        let (human, human_id) = child(&tree, belong_id, 0);
        assert_eq!(human.payload, NodePayload::Sememe(SememeId(1)));
        assert!(tree.node(human_id).children.is_empty());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn only_first_clause_reaches_the_tree() {
        let lookup = registry(&["alive|活着", "die|死"]);
        let tree = parse_definition(SenseId(0), "{alive|活着};{die|死}", lookup).unwrap();
        assert_eq!(tree.node(tree.root()).children.len(), 1);
        let (only, _) = child(&tree, tree.root(), 0);
        assert_eq!(only.payload, NodePayload::Sememe(SememeId(0)));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn flatten_spans_clauses_the_tree_ignores() {
        let lookup = registry(&["alive|活着", "die|死"]);
        let refs = list_sememes("{alive|活着};{die|死}", lookup).unwrap();
        assert_eq!(refs, vec![SememeId(0), SememeId(1)]);
    }

    #[test]
    fn remark_is_stripped_from_the_tree_but_not_the_list() {
        let lookup = registry(&["die|死", "vanish|消失"]);
        let def = "{die|死}RMK={vanish|消失}";
        let tree = parse_definition(SenseId(0), def, &lookup).unwrap();
        assert_eq!(tree.len(), 2);
        let refs = list_sememes(def, &lookup).unwrap();
        assert_eq!(refs, vec![SememeId(0), SememeId(1)]);
    }

    #[test]
    fn quoted_references_parse() {
        let lookup = registry(&["aspiration|意愿"]);
        let tree = parse_definition(SenseId(0), "{\"aspiration|意愿\"}", lookup).unwrap();
        let (node, _) = child(&tree, tree.root(), 0);
        assert_eq!(node.payload, NodePayload::Sememe(SememeId(0)));
    }

    #[test]
    fn multiword_labels_underscore_in_the_tree_pass_only() {
        let lookup = registry(&["go_through|经历"]);
        let def = "{go through|经历}";
        let tree = parse_definition(SenseId(0), def, &lookup).unwrap();
        assert_eq!(tree.len(), 2);
        // The flat pass looks labels up verbatim, so the spaced form misses.
        assert_eq!(
            list_sememes(def, &lookup),
            Err(ParseError::UnknownSememe {
                label: "go through|经历".to_string()
            })
        );
    }

    #[test]
    fn unknown_sememe_is_reported() {
        let lookup = registry(&[]);
        assert_eq!(
            parse_definition(SenseId(0), "{missing|不在}", lookup),
            Err(ParseError::UnknownSememe {
                label: "missing|不在".to_string()
            })
        );
    }

    #[test]
    fn unterminated_reference_errors_instead_of_hanging() {
        let lookup = registry(&["die|死"]);
        assert!(matches!(
            parse_definition(SenseId(0), "{die|死", &lookup),
            Err(ParseError::Unterminated { .. })
        ));
        assert!(matches!(
            parse_definition(SenseId(0), "die|死}", &lookup),
            Err(ParseError::Unterminated { .. })
        ));
        assert!(matches!(
            list_sememes("{die|死", &lookup),
            Err(ParseError::Unterminated { .. })
        ));
    }

    #[test]
    fn missing_role_separator_degrades_to_no_role() {
        let lookup = registry(&["die|死", "alive|活着"]);
        // No comma or colon opens the would-be role label, so it stays None.
        let tree = parse_definition(SenseId(0), "{die|死}cause={alive|活着}", lookup).unwrap();
        let (die, _) = child(&tree, tree.root(), 0);
        assert_eq!(die.payload, NodePayload::Sememe(SememeId(0)));
        // The second entity found no structural parent; it dangles and is
        // absent from the finished tree rather than aborting the parse.
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn empty_definition_is_an_error() {
        let lookup = registry(&[]);
        assert_eq!(parse_definition(SenseId(0), "", &lookup), Err(ParseError::Empty));
        assert_eq!(
            parse_definition(SenseId(0), "RMK=nothing", &lookup),
            Err(ParseError::Empty)
        );
        assert_eq!(list_sememes("", &lookup), Ok(Vec::new()));
    }
}
