use serde::Serialize;

/// Newline-delimited JSON payload: one serialized object per line, no
/// trailing newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdjsonBatch {
    body: String,
    rows: usize,
}

impl NdjsonBatch {
    /// Serialize each item independently and join the lines with `\n`.
    pub fn from_rows<T: Serialize>(items: &[T]) -> Result<Self, serde_json::Error> {
        let lines = items
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rows: lines.len(),
            body: lines.join("\n"),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn len_bytes(&self) -> usize {
        self.body.len()
    }

    pub fn into_body(self) -> String {
        self.body
    }
}
