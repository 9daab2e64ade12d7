//! # Compiler Module
//!
//! Lowers a parsed [`Sequence`] into a flat [`Program`]: a list of
//! [`Instr`]uctions run by a small interpreter loop. A pattern is compiled
//! once and then evaluated for every song it renders, so all structural
//! work (walking the tree, parsing queries, expanding literal text) happens
//! here and evaluation only fetches values and appends fragments.
//!
//! ## Accessor Modes
//! Each pattern is compiled twice:
//! - [`Accessor::Comma`] fetches every tag as one comma-joined string and
//!   backs `Formatter::format`
//! - [`Accessor::ListSeparate`] fetches every tag as its list of
//!   `(display, sort)` pairs and backs `Formatter::format_list`
//!
//! ## Lookup Reuse
//! A tag or query used more than once on one path through the pattern is
//! fetched once and kept in a slot. The name-to-slot maps are cloned for
//! every condition branch and disjunction alternative, so a branch sees
//! what its ancestors fetched but never what a sibling fetched.
//!
//! ## Control Flow
//! ```text
//! <q|A|B>         JumpUnless q -> else; A; Jump -> end; else: B; end:
//! <<a>||<b>>      Mark m; a; KeepOrRetract m -> end; b; KeepOrRetract m -> end; end:
//! ```
//! A condition with two empty branches emits nothing at all. All jumps go
//! forward, so evaluation always terminates.

use crate::ast::{tag_split, Node, Sequence};
use crate::policy::FormatPolicy;
use crate::query::{Matcher, QueryParser};
use crate::song::Song;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// How a program fetches tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    Comma,
    ListSeparate,
}

/// One piece of a program's output
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    /// All values of a multi-valued tag as `(display, sort)` pairs.
    Values(Vec<(String, String)>),
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        match self {
            Fragment::Text(s) => s.is_empty(),
            Fragment::Values(v) => v.is_empty(),
        }
    }
}

/// The values a program reads while it runs, already passed through the
/// policy's per-value hook.
pub trait FieldSource {
    fn comma(&self, key: &str) -> String;
    fn list_separate(&self, key: &str) -> Vec<(String, String)>;
    /// The underlying song, for query matchers.
    fn song(&self) -> &dyn Song;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Append a literal.
    Emit(String),
    /// Fetch a tag with the program's accessor into a slot.
    Fetch { key: String, slot: usize },
    /// Evaluate a query from the program's query table into a slot.
    Query { query: usize, slot: usize },
    /// Append the value held by a slot.
    EmitSlot(usize),
    JumpUnless { slot: usize, target: usize },
    JumpIf { slot: usize, target: usize },
    Jump(usize),
    /// Remember the current output length.
    Mark(usize),
    /// If the output grew since the mark, keep a non-empty last fragment
    /// and jump to `exit`, or drop an empty one and fall through.
    KeepOrRetract { mark: usize, exit: usize },
}

impl Instr {
    fn shifted(self, offset: usize) -> Self {
        match self {
            Instr::JumpUnless { slot, target } => Instr::JumpUnless {
                slot,
                target: target + offset,
            },
            Instr::JumpIf { slot, target } => Instr::JumpIf {
                slot,
                target: target + offset,
            },
            Instr::Jump(target) => Instr::Jump(target + offset),
            Instr::KeepOrRetract { mark, exit } => Instr::KeepOrRetract {
                mark,
                exit: exit + offset,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Unset,
    Text(String),
    Values(Vec<(String, String)>),
    Flag(bool),
}

impl Slot {
    fn is_truthy(&self) -> bool {
        match self {
            Slot::Unset => false,
            Slot::Text(s) => !s.is_empty(),
            Slot::Values(v) => !v.is_empty(),
            Slot::Flag(b) => *b,
        }
    }
}

/// A compiled evaluator for one accessor mode
#[derive(Debug, Clone)]
pub struct Program {
    accessor: Accessor,
    code: Vec<Instr>,
    queries: Vec<Arc<dyn Matcher>>,
    slots: usize,
    marks: usize,
}

impl Program {
    pub fn accessor(&self) -> Accessor {
        self.accessor
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    /// Evaluate against one song.
    pub fn run(&self, source: &dyn FieldSource) -> Vec<Fragment> {
        let mut out: Vec<Fragment> = Vec::new();
        let mut slots = vec![Slot::Unset; self.slots];
        let mut marks = vec![0usize; self.marks];
        let mut pc = 0;

        while let Some(instr) = self.code.get(pc) {
            pc += 1;
            match instr {
                Instr::Emit(text) => out.push(Fragment::Text(text.clone())),
                Instr::Fetch { key, slot } => {
                    slots[*slot] = match self.accessor {
                        Accessor::Comma => Slot::Text(source.comma(key)),
                        Accessor::ListSeparate => Slot::Values(source.list_separate(key)),
                    };
                }
                Instr::Query { query, slot } => {
                    slots[*slot] = Slot::Flag(self.queries[*query].matches(source.song()));
                }
                Instr::EmitSlot(slot) => match &slots[*slot] {
                    Slot::Text(s) => out.push(Fragment::Text(s.clone())),
                    Slot::Values(v) => out.push(Fragment::Values(v.clone())),
                    Slot::Flag(_) | Slot::Unset => {}
                },
                Instr::JumpUnless { slot, target } => {
                    if !slots[*slot].is_truthy() {
                        pc = *target;
                    }
                }
                Instr::JumpIf { slot, target } => {
                    if slots[*slot].is_truthy() {
                        pc = *target;
                    }
                }
                Instr::Jump(target) => pc = *target,
                Instr::Mark(mark) => marks[*mark] = out.len(),
                Instr::KeepOrRetract { mark, exit } => {
                    if out.len() > marks[*mark] {
                        if out.last().is_some_and(|f| !f.is_empty()) {
                            pc = *exit;
                        } else {
                            out.pop();
                        }
                    }
                }
            }
        }

        out
    }
}

/// Both programs of a pattern plus the tags it references
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub scalar: Program,
    pub list: Program,
    /// Distinct atomic tags referenced, in first-use order.
    pub tags: Vec<String>,
}

impl CompiledPattern {
    pub fn compile(root: &Sequence, policy: &dyn FormatPolicy, queries: &dyn QueryParser) -> Self {
        let (scalar, tags) = compile(root, Accessor::Comma, policy, queries);
        let (list, _) = compile(root, Accessor::ListSeparate, policy, queries);
        debug!(
            instructions = scalar.code.len(),
            tags = tags.len(),
            "compiled pattern"
        );
        Self { scalar, list, tags }
    }
}

/// Compile `root` for one accessor mode. Returns the program and the
/// distinct atomic tags it references.
pub fn compile(
    root: &Sequence,
    accessor: Accessor,
    policy: &dyn FormatPolicy,
    queries: &dyn QueryParser,
) -> (Program, Vec<String>) {
    let mut compiler = Compiler {
        policy,
        parser: queries,
        matchers: Vec::new(),
        matcher_index: HashMap::new(),
        not_queries: HashSet::new(),
        slots: 0,
        marks: 0,
        tags: Vec::new(),
    };
    let code = compiler.sequence(root, &mut Scope::default());

    let program = Program {
        accessor,
        code,
        queries: compiler.matchers,
        slots: compiler.slots,
        marks: compiler.marks,
    };
    (program, compiler.tags)
}

/// Slots already filled on the current path
#[derive(Debug, Clone, Default)]
struct Scope {
    values: HashMap<String, usize>,
    queries: HashMap<String, usize>,
}

struct Compiler<'a> {
    policy: &'a dyn FormatPolicy,
    parser: &'a dyn QueryParser,
    matchers: Vec<Arc<dyn Matcher>>,
    matcher_index: HashMap<String, usize>,
    not_queries: HashSet<String>,
    slots: usize,
    marks: usize,
    tags: Vec<String>,
}

/// Append `block` to `code`, relocating its jump targets.
fn append(code: &mut Vec<Instr>, block: Vec<Instr>) {
    let offset = code.len();
    code.extend(block.into_iter().map(|i| i.shifted(offset)));
}

impl Compiler<'_> {
    fn new_slot(&mut self) -> usize {
        self.slots += 1;
        self.slots - 1
    }

    /// Every block starts at index 0; `append` places it.
    fn sequence(&mut self, seq: &Sequence, scope: &mut Scope) -> Vec<Instr> {
        let mut code = Vec::new();
        for node in &seq.children {
            let block = self.node(node, scope);
            append(&mut code, block);
        }
        code
    }

    fn node(&mut self, node: &Node, scope: &mut Scope) -> Vec<Instr> {
        match node {
            Node::Text(text) => vec![Instr::Emit(self.policy.text(text))],
            Node::Tag(name) => {
                for tag in tag_split(name) {
                    if !self.tags.contains(&tag) {
                        self.tags.push(tag);
                    }
                }
                let mut code = Vec::new();
                let slot = self.value_slot(name, scope, &mut code);
                code.push(Instr::EmitSlot(slot));
                code
            }
            Node::Condition {
                predicate,
                if_branch,
                else_branch,
            } => self.condition(predicate, if_branch, else_branch.as_ref(), scope),
            Node::Disjunction(alternatives) => self.disjunction(alternatives, scope),
        }
    }

    fn value_slot(&mut self, key: &str, scope: &mut Scope, code: &mut Vec<Instr>) -> usize {
        if let Some(&slot) = scope.values.get(key) {
            return slot;
        }
        let slot = self.new_slot();
        code.push(Instr::Fetch {
            key: key.to_string(),
            slot,
        });
        scope.values.insert(key.to_string(), slot);
        slot
    }

    /// The slot holding a condition's truth value: a strict query result if
    /// the predicate parses as one, the tag it names otherwise.
    fn predicate_slot(
        &mut self,
        predicate: &str,
        scope: &mut Scope,
        code: &mut Vec<Instr>,
    ) -> usize {
        if let Some(&slot) = scope.queries.get(predicate) {
            return slot;
        }

        let query = match self.matcher_index.get(predicate) {
            Some(&index) => Some(index),
            None if self.not_queries.contains(predicate) => None,
            None => match self.parser.parse_strict(predicate) {
                Some(matcher) => {
                    self.matchers.push(matcher);
                    let index = self.matchers.len() - 1;
                    self.matcher_index.insert(predicate.to_string(), index);
                    Some(index)
                }
                None => {
                    self.not_queries.insert(predicate.to_string());
                    None
                }
            },
        };

        match query {
            Some(query) => {
                let slot = self.new_slot();
                code.push(Instr::Query { query, slot });
                scope.queries.insert(predicate.to_string(), slot);
                slot
            }
            None => self.value_slot(predicate, scope, code),
        }
    }

    fn condition(
        &mut self,
        predicate: &str,
        if_branch: &Sequence,
        else_branch: Option<&Sequence>,
        scope: &mut Scope,
    ) -> Vec<Instr> {
        let before = scope.clone();
        let mut code = Vec::new();
        let slot = self.predicate_slot(predicate, scope, &mut code);

        let if_code = self.sequence(if_branch, &mut scope.clone());
        let else_code = match else_branch {
            Some(branch) => self.sequence(branch, &mut scope.clone()),
            None => Vec::new(),
        };

        match (if_code.is_empty(), else_code.is_empty()) {
            (true, true) => {
                // nothing to choose between, so the predicate is never needed
                *scope = before;
                return Vec::new();
            }
            (false, true) => {
                let target = code.len() + 1 + if_code.len();
                code.push(Instr::JumpUnless { slot, target });
                append(&mut code, if_code);
            }
            (true, false) => {
                let target = code.len() + 1 + else_code.len();
                code.push(Instr::JumpIf { slot, target });
                append(&mut code, else_code);
            }
            (false, false) => {
                let else_start = code.len() + 1 + if_code.len() + 1;
                code.push(Instr::JumpUnless {
                    slot,
                    target: else_start,
                });
                append(&mut code, if_code);
                let end = else_start + else_code.len();
                code.push(Instr::Jump(end));
                append(&mut code, else_code);
            }
        }
        code
    }

    fn disjunction(&mut self, alternatives: &[Sequence], scope: &Scope) -> Vec<Instr> {
        let mark = self.marks;
        self.marks += 1;

        let mut code = vec![Instr::Mark(mark)];
        let mut checks = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let block = self.sequence(alternative, &mut scope.clone());
            append(&mut code, block);
            checks.push(code.len());
            code.push(Instr::KeepOrRetract { mark, exit: 0 });
        }

        let end = code.len();
        for index in checks {
            code[index] = Instr::KeepOrRetract { mark, exit: end };
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::policy::PlainText;
    use crate::query::StrictQueryParser;
    use crate::song::TagMap;

    /// Reads a TagMap directly, without any policy.
    struct Direct<'a>(&'a TagMap);

    impl FieldSource for Direct<'_> {
        fn comma(&self, key: &str) -> String {
            self.0.comma(key).decode()
        }

        fn list_separate(&self, key: &str) -> Vec<(String, String)> {
            self.0.list_separate(key)
        }

        fn song(&self) -> &dyn Song {
            self.0
        }
    }

    fn program(pattern: &str) -> Program {
        compile(&parse(pattern).unwrap(), Accessor::Comma, &PlainText, &StrictQueryParser).0
    }

    fn render(pattern: &str, song: &TagMap) -> String {
        program(pattern)
            .run(&Direct(song))
            .into_iter()
            .map(|f| match f {
                Fragment::Text(s) => s,
                Fragment::Values(_) => panic!("comma program emitted values"),
            })
            .collect()
    }

    fn fetches(program: &Program) -> usize {
        program
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instr::Fetch { .. }))
            .count()
    }

    #[test]
    fn test_text_and_tags() {
        let song = TagMap::from_iter([("artist", "A"), ("title", "T")]);
        assert_eq!(render("<artist> - <title>", &song), "A - T");
    }

    #[test]
    fn test_condition() {
        let with = TagMap::from_iter([("album", "Bar"), ("title", "Song")]);
        let without = TagMap::from_iter([("title", "Song")]);
        assert_eq!(render("<album|<album> - ><title>", &with), "Bar - Song");
        assert_eq!(render("<album|<album> - ><title>", &without), "Song");
    }

    #[test]
    fn test_condition_else_only() {
        // the if branch holds only a pruned condition
        let pattern = "<album|<x|>|none>";
        assert_eq!(render(pattern, &TagMap::new()), "none");
        assert_eq!(render(pattern, &TagMap::from_iter([("album", "A")])), "");
        assert!(program(pattern)
            .instructions()
            .iter()
            .any(|i| matches!(i, Instr::JumpIf { .. })));
    }

    #[test]
    fn test_repeated_tag_fetched_once() {
        let p = program("<album|<album> <album>|<title>>");
        assert_eq!(fetches(&p), 2);
    }

    #[test]
    fn test_sibling_branches_do_not_share_fetches() {
        // each branch fetches `title` itself
        let p = program("<album|<title>|<title>>");
        assert_eq!(fetches(&p), 3);
    }

    #[test]
    fn test_empty_condition_is_pruned() {
        let p = program("<album|>");
        assert!(p.instructions().is_empty());
    }

    #[test]
    fn test_pruned_condition_does_not_hide_later_fetch() {
        let song = TagMap::from_iter([("a", "x")]);
        assert_eq!(render("<a|><a>", &song), "x");
    }

    #[test]
    fn test_query_condition() {
        let foo = TagMap::from_iter([("artist", "Foo")]);
        let bar = TagMap::from_iter([("artist", "Bar")]);
        assert_eq!(render("<artist=foo|yes|no>", &foo), "yes");
        assert_eq!(render("<artist=foo|yes|no>", &bar), "no");
        let p = program("<artist=foo|yes|no>");
        assert!(p.instructions().iter().any(|i| matches!(i, Instr::Query { .. })));
    }

    #[test]
    fn test_disjunction_first_non_empty() {
        let song = TagMap::from_iter([("c", "X")]);
        assert_eq!(render("<<a>||<b>||<c>>", &song), "X");
        let both = TagMap::from_iter([("a", "1"), ("c", "X")]);
        assert_eq!(render("<<a>||<b>||<c>>", &both), "1");
    }

    #[test]
    fn test_disjunction_all_empty() {
        assert_eq!(render("x<<a>||<b>>y", &TagMap::new()), "xy");
    }

    #[test]
    fn test_nested_disjunction() {
        let song = TagMap::from_iter([("c", "C")]);
        assert_eq!(render("<<<a>||<b>>||<c>>", &song), "C");
    }

    #[test]
    fn test_tags_split_and_unique() {
        let (_, tags) = compile(
            &parse("<foo|<~bar~fuu> - <fa>|<bar>>").unwrap(),
            Accessor::Comma,
            &PlainText,
            &StrictQueryParser,
        );
        assert_eq!(tags, vec!["bar", "fuu", "fa"]);
    }

    #[test]
    fn test_list_program_fetches_values() {
        let song = TagMap::from_iter([("artist", "a\nb")]);
        let (p, _) = compile(
            &parse("<artist>!").unwrap(),
            Accessor::ListSeparate,
            &PlainText,
            &StrictQueryParser,
        );
        let out = p.run(&Direct(&song));
        assert_eq!(
            out,
            vec![
                Fragment::Values(vec![
                    ("a".to_string(), "a".to_string()),
                    ("b".to_string(), "b".to_string()),
                ]),
                Fragment::Text("!".to_string()),
            ]
        );
    }
}
