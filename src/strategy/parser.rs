#![allow(dead_code)]
use indexmap::IndexSet;
use tracing::debug;

use crate::types::{FolderNode, Node, ParamMap, StrategyNode};

const FOLDER_BEGIN: &str = "#Begin_Folder";
const FOLDER_END: &str = "#End_Folder";
const STRATEGY_BEGIN: &str = "##Begin_Strategy";
const STRATEGY_END: &str = "##End_Strategy";
const COMMENT_PREFIX: &str = "//";

/// Result of one parse pass: the node tree plus the union of all parameter
/// names seen, sorted lexicographically.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub nodes: Vec<Node>,
    pub catalogue: Vec<String>,
}

impl ParseOutcome {
    /// True when the input contained no recognizable markers. Callers are
    /// responsible for surfacing "nothing parsed" to the operator.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Parse a strategy export into folder and strategy nodes. Never fails:
/// malformed input simply yields an empty outcome.
pub fn parse(text: &str) -> ParseOutcome {
    let mut parser = Parser::default();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    nodes: Vec<Node>,
    catalogue: IndexSet<String>,
    folder: Option<FolderNode>,
    /// `Some` while inside a `##Begin_Strategy` block.
    strategy_lines: Option<Vec<String>>,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if line == STRATEGY_BEGIN {
            self.flush_strategy();
            self.strategy_lines = Some(Vec::new());
        } else if line == STRATEGY_END {
            self.flush_strategy();
        } else if line == FOLDER_END {
            self.flush_strategy();
            if let Some(folder) = self.folder.take() {
                self.nodes.push(Node::Folder(folder));
            }
        } else if let Some(name) = line.strip_prefix(FOLDER_BEGIN) {
            self.flush_strategy();
            // Reopening before #End_Folder abandons the previous folder and
            // everything flushed into it. Only end-of-input emits a folder
            // without its closing marker.
            if let Some(abandoned) = self.folder.take() {
                debug!(
                    "abandoning unterminated folder '{}' ({} strategies)",
                    abandoned.name,
                    abandoned.strategies.len()
                );
            }
            self.folder = Some(FolderNode {
                name: name.trim().to_string(),
                strategies: Vec::new(),
            });
        } else if let Some(lines) = self.strategy_lines.as_mut() {
            lines.push(line.to_string());
        }
    }

    /// Turn the buffered strategy body into a node and attach it to the
    /// current folder, or to the top level when no folder is open.
    fn flush_strategy(&mut self) {
        let Some(lines) = self.strategy_lines.take() else {
            return;
        };
        let mut params = ParamMap::new();
        for line in &lines {
            if line.starts_with(COMMENT_PREFIX) {
                continue;
            }
            // Lines without '=' are skipped, not rejected.
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            self.catalogue.insert(key.to_string());
            // Duplicate keys: last occurrence wins, first position kept.
            params.insert(key.to_string(), value.to_string());
        }

        let mut node = StrategyNode::from_params(params);
        match self.folder.as_mut() {
            Some(folder) => {
                node.command_target = folder.name.clone();
                folder.strategies.push(node);
            }
            None => self.nodes.push(Node::Strategy(node)),
        }
    }

    fn finish(mut self) -> ParseOutcome {
        self.flush_strategy();
        // Unterminated folders at end of input are emitted as-is, with
        // whatever strategies were flushed into them.
        if let Some(folder) = self.folder.take() {
            self.nodes.push(Node::Folder(folder));
        }
        let mut catalogue: Vec<String> = self.catalogue.into_iter().collect();
        catalogue.sort();
        ParseOutcome {
            nodes: self.nodes,
            catalogue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOLDER_DOC: &str = "#Begin_Folder F1\n\
                              ##Begin_Strategy\n\
                              StrategyName=S1\n\
                              AutoBuy=0\n\
                              ##End_Strategy\n\
                              #End_Folder";

    fn folder(node: &Node) -> &FolderNode {
        match node {
            Node::Folder(folder) => folder,
            Node::Strategy(_) => panic!("expected folder node"),
        }
    }

    fn strategy(node: &Node) -> &StrategyNode {
        match node {
            Node::Strategy(strategy) => strategy,
            Node::Folder(_) => panic!("expected strategy node"),
        }
    }

    #[test]
    fn test_folder_with_single_strategy() {
        let outcome = parse(FOLDER_DOC);

        assert_eq!(outcome.nodes.len(), 1);
        let f1 = folder(&outcome.nodes[0]);
        assert_eq!(f1.name, "F1");
        assert_eq!(f1.strategies.len(), 1);

        let s1 = &f1.strategies[0];
        assert_eq!(s1.name, "S1");
        assert_eq!(s1.params.get("StrategyName").unwrap(), "S1");
        assert_eq!(s1.params.get("AutoBuy").unwrap(), "0");
        assert_eq!(s1.baseline.get("AutoBuy").unwrap(), "0");
        assert_eq!(s1.command_target, "F1");
    }

    #[test]
    fn test_no_markers_yields_empty_outcome() {
        let outcome = parse("just some text\nAutoBuy=1\n\n// comment");
        assert!(outcome.is_empty());
        assert!(outcome.catalogue.is_empty());
    }

    #[test]
    fn test_top_level_strategy() {
        let outcome = parse("##Begin_Strategy\nStrategyName=Solo\nRisk=5\n##End_Strategy");

        assert_eq!(outcome.nodes.len(), 1);
        let solo = strategy(&outcome.nodes[0]);
        assert_eq!(solo.name, "Solo");
        assert_eq!(solo.command_target, "Solo");
    }

    #[test]
    fn test_duplicate_param_last_occurrence_wins() {
        let outcome = parse("##Begin_Strategy\nAutoBuy=0\nStrategyName=S\nAutoBuy=1\n##End_Strategy");

        let node = strategy(&outcome.nodes[0]);
        assert_eq!(node.params.get("AutoBuy").unwrap(), "1");
        // First-seen position is kept.
        assert_eq!(node.params.get_index(0).unwrap().0, "AutoBuy");
        assert_eq!(node.params.len(), 2);
    }

    #[test]
    fn test_comments_and_lines_without_equals_skipped() {
        let outcome = parse(
            "##Begin_Strategy\n// AutoBuy=9\nnot a parameter\nStrategyName=S\n##End_Strategy",
        );

        let node = strategy(&outcome.nodes[0]);
        assert_eq!(node.params.len(), 1);
        assert!(node.params.get("AutoBuy").is_none());
    }

    #[test]
    fn test_value_may_be_empty() {
        let outcome = parse("##Begin_Strategy\nStopLoss=\n##End_Strategy");

        let node = strategy(&outcome.nodes[0]);
        assert_eq!(node.params.get("StopLoss").unwrap(), "");
    }

    #[test]
    fn test_missing_strategy_name_defaults_to_empty() {
        let outcome = parse("##Begin_Strategy\nAutoBuy=1\n##End_Strategy");

        let node = strategy(&outcome.nodes[0]);
        assert_eq!(node.name, "");
        assert_eq!(node.command_target, "");
    }

    #[test]
    fn test_unterminated_strategy_flushed_at_eof() {
        let outcome = parse("##Begin_Strategy\nStrategyName=Open\nAutoBuy=1");

        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(strategy(&outcome.nodes[0]).name, "Open");
    }

    #[test]
    fn test_unterminated_folder_emitted_at_eof() {
        let outcome = parse("#Begin_Folder F1\n##Begin_Strategy\nStrategyName=S1\n##End_Strategy");

        assert_eq!(outcome.nodes.len(), 1);
        let f1 = folder(&outcome.nodes[0]);
        assert_eq!(f1.name, "F1");
        assert_eq!(f1.strategies.len(), 1);
    }

    #[test]
    fn test_reopened_folder_abandons_previous() {
        // Strategy under A is lost because B reopens before A closes.
        let outcome = parse(
            "#Begin_Folder A\n\
             ##Begin_Strategy\n\
             StrategyName=Lost\n\
             ##End_Strategy\n\
             #Begin_Folder B\n\
             ##Begin_Strategy\n\
             StrategyName=Kept\n\
             ##End_Strategy\n\
             #End_Folder",
        );

        assert_eq!(outcome.nodes.len(), 1);
        let b = folder(&outcome.nodes[0]);
        assert_eq!(b.name, "B");
        assert_eq!(b.strategies.len(), 1);
        assert_eq!(b.strategies[0].name, "Kept");
    }

    #[test]
    fn test_reopened_strategy_flushes_previous() {
        let outcome = parse(
            "##Begin_Strategy\nStrategyName=First\n##Begin_Strategy\nStrategyName=Second\n##End_Strategy",
        );

        assert_eq!(outcome.nodes.len(), 2);
        assert_eq!(strategy(&outcome.nodes[0]).name, "First");
        assert_eq!(strategy(&outcome.nodes[1]).name, "Second");
    }

    #[test]
    fn test_catalogue_sorted_and_deduplicated() {
        let outcome = parse(
            "##Begin_Strategy\nZeta=1\nAlpha=2\n##End_Strategy\n\
             ##Begin_Strategy\nAlpha=3\nMid=4\n##End_Strategy",
        );

        assert_eq!(outcome.catalogue, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_catalogue_is_case_sensitive() {
        let outcome = parse("##Begin_Strategy\nautobuy=0\nAutoBuy=1\n##End_Strategy");

        assert_eq!(outcome.catalogue, vec!["AutoBuy", "autobuy"]);
    }

    #[test]
    fn test_mixed_folders_and_top_level_strategies() {
        let outcome = parse(
            "##Begin_Strategy\nStrategyName=Solo\n##End_Strategy\n\
             #Begin_Folder F1\n\
             ##Begin_Strategy\nStrategyName=S1\n##End_Strategy\n\
             ##Begin_Strategy\nStrategyName=S2\n##End_Strategy\n\
             #End_Folder",
        );

        assert_eq!(outcome.nodes.len(), 2);
        assert_eq!(strategy(&outcome.nodes[0]).name, "Solo");
        assert_eq!(folder(&outcome.nodes[1]).strategies.len(), 2);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let outcome = parse("  #Begin_Folder   F1  \n ##Begin_Strategy \n  Key  =  v  \n##End_Strategy\n#End_Folder");

        let f1 = folder(&outcome.nodes[0]);
        assert_eq!(f1.name, "F1");
        assert_eq!(f1.strategies[0].params.get("Key").unwrap(), "v");
    }
}