//! [`TreePath`] — dot/bracket-qualified location of a value inside an
//! object graph, carried by every value-level error.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Path from the root object down to the value an error refers to, e.g.
/// `config.servers[3].port` or `tags["release"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with a struct field segment.
    pub fn field(&self, name: &str) -> Self {
        self.push(Segment::Field(name.to_string()))
    }

    /// Extend with a collection index segment.
    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    /// Extend with a map key segment.
    pub fn key(&self, key: &str) -> Self {
        self.push(Segment::Key(key.to_string()))
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}
