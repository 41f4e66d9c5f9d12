//! Arrows, marked squares and comments attached to a diagram.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Position;

/// Highlight color for arrows and marked squares
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    #[default]
    Green,
    Red,
    Yellow,
    Blue,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Arrow {
    pub from: Position,
    pub to: Position,
    pub color: Highlight,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkedField {
    pub position: Position,
    pub color: Highlight,
}

/// Everything a user drew or wrote on one diagram.
///
/// Each collection keeps insertion order and never holds the same entry twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Annotations {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    arrows: Vec<Arrow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<MarkedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    comments: Vec<String>,
}

impl Annotations {
    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn fields(&self) -> &[MarkedField] {
        &self.fields
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.fields.is_empty() && self.comments.is_empty()
    }

    /// Returns false when the arrow was already there
    pub fn add_arrow(&mut self, arrow: Arrow) -> bool {
        push_unique(&mut self.arrows, arrow)
    }

    pub fn remove_arrow(&mut self, arrow: &Arrow) -> bool {
        remove(&mut self.arrows, arrow)
    }

    /// Mark a square, returning the highlight it replaced
    pub fn mark_field(&mut self, field: MarkedField) -> Option<Highlight> {
        let previous = self
            .fields
            .iter()
            .position(|f| f.position == field.position)
            .map(|i| self.fields.remove(i).color);
        self.fields.push(field);
        previous
    }

    pub fn unmark_field(&mut self, position: Position) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.position != position);
        before != self.fields.len()
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> bool {
        push_unique(&mut self.comments, comment.into())
    }

    pub fn remove_comment(&mut self, comment: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c != comment);
        before != self.comments.len()
    }

    /// Add everything from `other` that is not here yet.
    ///
    /// A square marked on both sides keeps the highlight it already had.
    pub fn union(&mut self, other: &Annotations) {
        for arrow in &other.arrows {
            push_unique(&mut self.arrows, *arrow);
        }
        for field in &other.fields {
            if !self.fields.iter().any(|f| f.position == field.position) {
                self.fields.push(*field);
            }
        }
        for comment in &other.comments {
            push_unique(&mut self.comments, comment.clone());
        }
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        false
    } else {
        items.push(item);
        true
    }
}

fn remove<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
    let before = items.len();
    items.retain(|i| i != item);
    before != items.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_no_duplicates() {
        let mut a = Annotations::default();
        let arrow = Arrow {
            from: sq("e2"),
            to: sq("e4"),
            color: Highlight::Green,
        };
        assert!(a.add_arrow(arrow));
        assert!(!a.add_arrow(arrow));
        assert!(a.add_comment("main line"));
        assert!(!a.add_comment("main line"));
        assert_eq!(a.arrows().len(), 1);
        assert!(a.remove_arrow(&arrow));
        assert!(!a.is_empty());
    }

    #[test]
    fn test_marked_field_replaces_color() {
        let mut a = Annotations::default();
        a.mark_field(MarkedField {
            position: sq("d5"),
            color: Highlight::Red,
        });
        let replaced = a.mark_field(MarkedField {
            position: sq("d5"),
            color: Highlight::Blue,
        });
        assert_eq!(replaced, Some(Highlight::Red));
        assert_eq!(a.fields().len(), 1);
        assert_eq!(a.fields()[0].color, Highlight::Blue);
        assert!(a.unmark_field(sq("d5")));
        assert!(a.is_empty());
    }

    #[test]
    fn test_union() {
        let mut a = Annotations::default();
        a.add_comment("first");
        a.mark_field(MarkedField {
            position: sq("e4"),
            color: Highlight::Red,
        });
        let mut b = Annotations::default();
        b.add_comment("first");
        b.add_comment("second");
        b.mark_field(MarkedField {
            position: sq("e4"),
            color: Highlight::Green,
        });
        a.union(&b);
        assert_eq!(a.comments(), ["first", "second"]);
        assert_eq!(a.fields()[0].color, Highlight::Red);
    }

    #[test]
    fn test_json_shape() {
        let mut a = Annotations::default();
        a.add_comment("x");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"comments":["x"]}"#);
        let back: Annotations = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
