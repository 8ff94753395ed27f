//! Wire commands of the table store
//!
//! Commands are plain text, `METHOD /api/param[/param]`, with no line
//! terminator. The harness only sends `Add` and `Query`; the other forms are
//! understood so the in-process store can answer the whole command set.

use std::fmt;

pub use crate::core_types::{ItemId, TableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `POST /add/{table}/{item}`
    Add { table: TableId, item: ItemId },
    /// `GET /query/{table}`
    Query { table: TableId },
    /// `GET /query/{table}/{item}`
    QueryOne { table: TableId, item: ItemId },
    /// `DELETE /remove/{table}/{item}`
    Remove { table: TableId, item: ItemId },
}

impl Command {
    /// Wire bytes for this command.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Parse a request line. Returns `None` for anything outside the grammar,
    /// including non-numeric ids and wrong parameter counts.
    pub fn parse(req: &str) -> Option<Command> {
        let mut parts = req.trim().split(' ');
        let method = parts.next()?;
        let path = parts.next()?;

        let mut segments = path.split('/');
        // Paths are absolute: the first segment is the empty string.
        if !segments.next()?.is_empty() {
            return None;
        }
        let api = segments.next()?;
        let params = segments
            .map(|s| s.parse::<u32>().ok())
            .collect::<Option<Vec<u32>>>()?;

        match (method, api, params.as_slice()) {
            ("POST", "add", [table, item]) => Some(Command::Add {
                table: *table,
                item: *item,
            }),
            ("GET", "query", [table]) => Some(Command::Query { table: *table }),
            ("GET", "query", [table, item]) => Some(Command::QueryOne {
                table: *table,
                item: *item,
            }),
            ("DELETE", "remove", [table, item]) => Some(Command::Remove {
                table: *table,
                item: *item,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Add { table, item } => write!(f, "POST /add/{}/{}", table, item),
            Command::Query { table } => write!(f, "GET /query/{}", table),
            Command::QueryOne { table, item } => write!(f, "GET /query/{}/{}", table, item),
            Command::Remove { table, item } => write!(f, "DELETE /remove/{}/{}", table, item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        assert_eq!(
            Command::Add { table: 3, item: 17 }.to_string(),
            "POST /add/3/17"
        );
        assert_eq!(Command::Query { table: 99 }.to_string(), "GET /query/99");
        assert_eq!(Command::Query { table: 0 }.to_bytes(), b"GET /query/0".to_vec());
    }

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(
            Command::parse("POST /add/1/2"),
            Some(Command::Add { table: 1, item: 2 })
        );
        assert_eq!(
            Command::parse("GET /query/7"),
            Some(Command::Query { table: 7 })
        );
        assert_eq!(
            Command::parse("GET /query/7/8"),
            Some(Command::QueryOne { table: 7, item: 8 })
        );
        assert_eq!(
            Command::parse("DELETE /remove/4/5"),
            Some(Command::Remove { table: 4, item: 5 })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("GET"), None);
        assert_eq!(Command::parse("GET query/1"), None);
        assert_eq!(Command::parse("GET /query/abc"), None);
        assert_eq!(Command::parse("GET /query/1/"), None);
        assert_eq!(Command::parse("POST /add/1"), None);
        assert_eq!(Command::parse("PUT /add/1/2"), None);
        assert_eq!(Command::parse("GET /unknown/1"), None);
    }

    #[test]
    fn test_parse_roundtrips_display() {
        let cmd = Command::Add {
            table: 99,
            item: 199,
        };
        assert_eq!(Command::parse(&cmd.to_string()), Some(cmd));
    }
}
