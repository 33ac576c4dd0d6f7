use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One comment row after the agent-name join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    /// `None` marks a thread root.
    pub parent_id: Option<String>,
    pub agent_id: String,
    pub agent_name: String,
}

impl CommentRecord {
    pub fn new(
        comment_id: impl Into<String>,
        parent_id: Option<&str>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        CommentRecord {
            comment_id: comment_id.into(),
            parent_id: parent_id.map(str::to_owned),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
        }
    }

    /// Grouping key for the discussion graph: the parent if there is one,
    /// otherwise the comment itself.
    pub fn thread_root(&self) -> &str {
        self.parent_id.as_deref().unwrap_or(&self.comment_id)
    }
}

/// Reads comment records from a CSV file with the headers
/// `comment_id,parent_id,agent_id,agent_name`.
pub fn read_comments(path: impl AsRef<Path>) -> Result<Vec<CommentRecord>> {
    let file = std::fs::File::open(path)?;
    read_comments_from(file)
}

/// Rows with an empty agent name are dropped; any row that fails to
/// deserialize aborts the read.
pub fn read_comments_from<R: Read>(reader: R) -> Result<Vec<CommentRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let mut records = Vec::new();
    let mut unnamed = 0usize;
    for row in reader.deserialize::<CommentRecord>() {
        let mut record = row?;
        if record.agent_name.is_empty() {
            unnamed += 1;
            continue;
        }
        if record.parent_id.as_deref() == Some("") {
            record.parent_id = None;
        }
        records.push(record);
    }

    if unnamed > 0 {
        debug!(unnamed, "dropped rows without an agent name");
    }
    info!(rows = records.len(), "loaded comment records");
    Ok(records)
}

/// Read-only lookups shared by every graph builder.
#[derive(Debug, Default)]
pub struct RecordIndex {
    comment_to_agent: HashMap<String, String>,
    comment_to_name: HashMap<String, String>,
    agent_to_name: HashMap<String, String>,
}

impl RecordIndex {
    /// Duplicate comment or agent ids resolve to the last record seen.
    pub fn new(records: &[CommentRecord]) -> Self {
        let mut index = RecordIndex {
            comment_to_agent: HashMap::with_capacity(records.len()),
            comment_to_name: HashMap::with_capacity(records.len()),
            agent_to_name: HashMap::new(),
        };
        for record in records {
            index
                .comment_to_agent
                .insert(record.comment_id.clone(), record.agent_id.clone());
            index
                .comment_to_name
                .insert(record.comment_id.clone(), record.agent_name.clone());
            index
                .agent_to_name
                .insert(record.agent_id.clone(), record.agent_name.clone());
        }
        index
    }

    /// Display name of the agent who wrote `comment_id`.
    pub fn comment_author(&self, comment_id: &str) -> Option<&str> {
        self.comment_to_name.get(comment_id).map(String::as_str)
    }

    /// Identifier of the agent who wrote `comment_id`.
    pub fn comment_agent(&self, comment_id: &str) -> Option<&str> {
        self.comment_to_agent.get(comment_id).map(String::as_str)
    }

    pub fn agent_name(&self, agent_id: &str) -> Option<&str> {
        self.agent_to_name.get(agent_id).map(String::as_str)
    }

    pub fn comment_count(&self) -> usize {
        self.comment_to_agent.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agent_to_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_resolve_authors_and_names() {
        let records = vec![
            CommentRecord::new("c1", None, "a1", "alice"),
            CommentRecord::new("c2", Some("c1"), "b1", "bob"),
        ];
        let index = RecordIndex::new(&records);

        assert_eq!(index.comment_author("c1"), Some("alice"));
        assert_eq!(index.comment_agent("c2"), Some("b1"));
        assert_eq!(index.agent_name("b1"), Some("bob"));
        assert_eq!(index.comment_author("missing"), None);
        assert_eq!(index.agent_name("missing"), None);
        assert_eq!(index.comment_count(), 2);
        assert_eq!(index.agent_count(), 2);
    }

    #[test]
    fn duplicate_comment_ids_are_last_write_wins() {
        let records = vec![
            CommentRecord::new("c1", None, "a1", "alice"),
            CommentRecord::new("c1", None, "b1", "bob"),
        ];
        let index = RecordIndex::new(&records);
        assert_eq!(index.comment_author("c1"), Some("bob"));
        assert_eq!(index.comment_agent("c1"), Some("b1"));
    }

    #[test]
    fn thread_root_falls_back_to_own_id() {
        let root = CommentRecord::new("c1", None, "a1", "alice");
        let reply = CommentRecord::new("c2", Some("c1"), "b1", "bob");
        assert_eq!(root.thread_root(), "c1");
        assert_eq!(reply.thread_root(), "c1");
    }

    #[test]
    fn csv_reader_handles_null_parents_and_unnamed_rows() {
        let data = "\
comment_id,parent_id,agent_id,agent_name
c1,,a1,alice
c2,c1,b1,bob
c3,c1,x1,
";
        let records = read_comments_from(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].parent_id, None);
        assert_eq!(records[1].parent_id.as_deref(), Some("c1"));
    }

    #[test]
    fn csv_reader_rejects_short_rows() {
        let data = "comment_id,parent_id,agent_id,agent_name\nc1,,a1\n";
        assert!(read_comments_from(data.as_bytes()).is_err());
    }
}
