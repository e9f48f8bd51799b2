//! Attribute values and attribute-name handling
//!
//! Rule attributes are heterogeneous: a scalar, a sequence, or a mapping,
//! nested arbitrarily deep depending on the rule type. The engine never
//! interprets them beyond a depth-first walk over this shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The coerced value of a rule attribute.
///
/// Sequences and mappings are containers to recurse into; only scalars are
/// leaf values with a textual representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// String scalar
    String(String),
    /// Integer scalar
    Integer(i64),
    /// Boolean scalar
    Bool(bool),
    /// Ordered sequence of nested values
    List(Vec<AttrValue>),
    /// String-keyed mapping of nested values
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// True for sequences and mappings
    pub fn is_container(&self) -> bool {
        matches!(self, AttrValue::List(_) | AttrValue::Map(_))
    }

    /// Textual representation of a scalar; `None` for containers
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttrValue::String(s) => Some(s.clone()),
            AttrValue::Integer(i) => Some(i.to_string()),
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::List(_) | AttrValue::Map(_) => None,
        }
    }

    /// Visit this value and every nested sub-value, depth first.
    ///
    /// Containers are visited before their contents; mapping keys are not
    /// visited, only mapping values.
    pub fn walk(&self, visit: &mut dyn FnMut(&AttrValue)) {
        visit(self);
        match self {
            AttrValue::List(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            AttrValue::Map(entries) => {
                for value in entries.values() {
                    value.walk(visit);
                }
            }
            _ => {}
        }
    }

    /// Collect every sub-value accepted by `predicate`
    pub fn filter_contents(&self, predicate: &dyn Fn(&AttrValue) -> bool) -> Vec<AttrValue> {
        let mut matches = Vec::new();
        self.walk(&mut |value| {
            if predicate(value) {
                matches.push(value.clone());
            }
        });
        matches
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

/// Convert an external attribute name to the internal attribute key.
///
/// Query text spells attribute names in lower hyphen/underscore form
/// (`compiler_flags`, `compiler-flags`); rule descriptions key them in
/// lower camel case (`compilerFlags`). The transform splits on either
/// separator and upper-cases the first letter of each following segment.
/// Input that carries no separator passes through unchanged.
pub fn internal_attr_name(external: &str) -> String {
    let mut internal = String::with_capacity(external.len());
    let mut upper_next = false;
    for c in external.chars() {
        if c == '_' || c == '-' {
            upper_next = true;
        } else if upper_next {
            internal.extend(c.to_uppercase());
            upper_next = false;
        } else {
            internal.push(c);
        }
    }
    internal
}
