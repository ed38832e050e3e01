//! Priority ordering of `next` alternatives
//!
//! The runtime tries a node's `next` entries in order, so entries must go
//! from the most specific to the least specific. Each entry is classified by
//! the first matching [`PriorityRule`] in a [`RuleSet`]; a list whose ranks
//! ever decrease is reported with a suggested stable-sorted order.
//!
//! Default ranks (lower runs first):
//!
//! | Rank | Rule |
//! |------|------|
//! | 1 | exception handler (the catch-all error node) |
//! | 2 | conditional self-loop |
//! | 3 | conditional node |
//! | 4 | unconditional node |
//! | 999 | unknown (target does not resolve) |

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::issue::{Issue, IssueCode};
use super::node::{Node, DEFAULT_UNCONDITIONAL_TYPE};
use super::reference::{NodeRef, RefField};
use super::registry::NodeRegistry;

/// Conventional name of the catch-all error node
pub const DEFAULT_EXCEPTION_HANDLER: &str = "意外处理";

/// Rank given to entries no rule matches
pub const UNKNOWN_RANK: u32 = 999;

pub const UNKNOWN_RULE: &str = "unknown";

/// Settings the default rules are built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritySettings {
    pub exception_handler: String,
    pub unconditional_type: String,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self {
            exception_handler: DEFAULT_EXCEPTION_HANDLER.to_string(),
            unconditional_type: DEFAULT_UNCONDITIONAL_TYPE.to_string(),
        }
    }
}

/// What a rule gets to look at
pub struct RuleContext<'a> {
    /// Node whose `next` list is being checked
    pub node: &'a Node,
    /// The entry being classified
    pub candidate: &'a NodeRef,
    pub nodes: &'a NodeRegistry,
}

impl<'a> RuleContext<'a> {
    pub fn node_name(&self) -> &'a str {
        self.node.name()
    }

    pub fn candidate_name(&self) -> &'a str {
        &self.candidate.name
    }

    /// The node the candidate resolves to, if it is a known node reference
    pub fn target(&self) -> Option<&'a Node> {
        if self.candidate.is_node() {
            self.nodes.get(&self.candidate.name)
        } else {
            None
        }
    }
}

type Matcher = Box<dyn Fn(&RuleContext<'_>) -> bool + Send + Sync>;

/// A named rank with the predicate that assigns it
pub struct PriorityRule {
    name: String,
    rank: u32,
    matcher: Matcher,
}

impl PriorityRule {
    pub fn new(
        name: impl Into<String>,
        rank: u32,
        matcher: impl Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            rank,
            matcher: Box::new(matcher),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        (self.matcher)(ctx)
    }
}

impl fmt::Debug for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityRule")
            .field("name", &self.name)
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

/// One classified `next` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub name: String,
    pub rank: u32,
    pub rule: String,
}

impl fmt::Display for Classified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.rule)
    }
}

/// A `next` list found out of order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityViolation {
    pub node: String,
    pub file: PathBuf,
    pub observed: Vec<Classified>,
    pub suggested: Vec<Classified>,
}

impl PriorityViolation {
    pub fn suggested_names(&self) -> Vec<&str> {
        self.suggested.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn into_issue(self) -> Issue {
        Issue::warn(
            IssueCode::PriorityOrder,
            format!(
                "next alternatives are not ordered by priority: {}; suggested: {}",
                join(&self.observed),
                join(&self.suggested)
            ),
        )
        .in_file(&self.file)
        .at_node(self.node)
        .at_field(RefField::Next.as_str())
    }
}

fn join(entries: &[Classified]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Ordered, open table of priority rules
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<PriorityRule>,
}

impl RuleSet {
    /// Creates an empty rule set; every entry ranks as unknown
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard four-rule table
    pub fn with_defaults(settings: &PrioritySettings) -> Self {
        let handler = settings.exception_handler.clone();
        let self_loop_marker = settings.unconditional_type.clone();
        let conditional_marker = settings.unconditional_type.clone();
        let unconditional_marker = settings.unconditional_type.clone();

        let mut rules = Self::new();
        rules.insert(PriorityRule::new("exception handler", 1, move |ctx| {
            ctx.candidate.is_node() && ctx.candidate_name() == handler
        }));
        rules.insert(PriorityRule::new("conditional self-loop", 2, move |ctx| {
            ctx.candidate.is_node()
                && ctx.candidate_name() == ctx.node_name()
                && ctx.node.is_conditional(&self_loop_marker)
        }));
        rules.insert(PriorityRule::new("conditional node", 3, move |ctx| {
            ctx.target()
                .is_some_and(|t| t.is_conditional(&conditional_marker))
        }));
        rules.insert(PriorityRule::new("unconditional node", 4, move |ctx| {
            ctx.target()
                .is_some_and(|t| !t.is_conditional(&unconditional_marker))
        }));
        rules
    }

    /// Inserts a rule after every rule of equal or lower rank
    pub fn insert(&mut self, rule: PriorityRule) {
        let pos = self.rules.partition_point(|r| r.rank <= rule.rank);
        self.rules.insert(pos, rule);
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[PriorityRule] {
        &self.rules
    }

    /// Classifies one entry by the first matching rule
    pub fn classify(&self, ctx: &RuleContext<'_>) -> Classified {
        let (rank, rule) = self
            .rules
            .iter()
            .find(|r| r.matches(ctx))
            .map(|r| (r.rank, r.name.clone()))
            .unwrap_or_else(|| (UNKNOWN_RANK, UNKNOWN_RULE.to_string()));

        Classified {
            name: ctx.candidate.name.clone(),
            rank,
            rule,
        }
    }

    /// Checks the `next` list of one node
    pub fn check_node(&self, node: &Node, nodes: &NodeRegistry) -> Option<PriorityViolation> {
        let refs = node.refs(RefField::Next).refs;

        let observed: Vec<Classified> = refs
            .iter()
            .filter(|r| !r.is_blank())
            .map(|candidate| {
                self.classify(&RuleContext {
                    node,
                    candidate,
                    nodes,
                })
            })
            .collect();

        if observed.len() < 2 {
            return None;
        }

        let in_order = observed.windows(2).all(|pair| pair[0].rank <= pair[1].rank);
        if in_order {
            return None;
        }

        let mut suggested = observed.clone();
        suggested.sort_by_key(|c| c.rank);

        Some(PriorityViolation {
            node: node.name().to_string(),
            file: node.file().to_path_buf(),
            observed,
            suggested,
        })
    }

    /// Checks every canonical node
    pub fn check_all(&self, nodes: &NodeRegistry) -> Vec<PriorityViolation> {
        nodes
            .nodes()
            .filter_map(|node| self.check_node(node, nodes))
            .collect()
    }
}
