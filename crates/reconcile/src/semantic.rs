//! Semantic equality for identifier attributes
//!
//! An identifier attribute may be written by the caller as a bare leaf id
//! (`B1`) and read back from the remote as a full path
//! (`F1/nodes/N1/breakouts/B1`). Both denote the same resource.

use crate::attr::Attr;
use crate::error::{Error, Result};
use crate::id::leaf_id;
use crate::value::Value;

/// Whether two identifier values denote the same resource.
///
/// Compares the leaf ids byte for byte. Operands that are not `Known`
/// compare as `false`; known operands that are not strings are an
/// [`Error::IncomparableOperand`].
pub fn semantic_equals(a: &Attr<Value>, b: &Attr<Value>) -> Result<bool> {
    let (Attr::Known(a), Attr::Known(b)) = (a, b) else {
        for operand in [a, b] {
            if let Attr::Known(v) = operand {
                identifier(v)?;
            }
        }
        return Ok(false);
    };
    Ok(leaf_id(identifier(a)?) == leaf_id(identifier(b)?))
}

fn identifier(value: &Value) -> Result<&str> {
    value.as_str().ok_or(Error::IncomparableOperand {
        expected: "string identifier",
        found: value.describe(),
    })
}
