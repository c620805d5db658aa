use serde::{Deserialize, Serialize};

/// A single forum post as delivered by the crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Permalink of the post
    pub source_id: String,

    /// Forum nick of the author
    pub author: String,

    /// Plain text body, one forum line per text line
    pub body: String,
}

impl Post {
    pub fn new(
        source_id: impl Into<String>,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            author: author.into(),
            body: body.into(),
        }
    }

    /// Body lines, accepting `\r\n`, `\r` and `\n` breaks
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body
            .split("\r\n")
            .flat_map(|chunk| chunk.split(['\r', '\n']))
    }
}
