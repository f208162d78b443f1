use std::collections::HashMap;

use crate::token::TokenHandle;

use super::typeinfo::TypeInfo;

/// A single occurrence of a name being bound or referenced.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub token: TokenHandle,
    pub type_info: TypeInfo,
    pub is_declaration: bool,
}

/// One name visible in a frame, together with every assignment/reference
/// to it in source order. `SPEC_FULL.md` §3 ("SourceIdentifier & Assignments").
#[derive(Debug, Clone)]
pub struct SourceIdentifier {
    pub name: String,
    pub assignments: Vec<Assignment>,
}

impl SourceIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        SourceIdentifier { name: name.into(), assignments: Vec::new() }
    }

    /// The type of the most recent assignment, i.e. "the type right now".
    pub fn current_type(&self) -> TypeInfo {
        self.assignments.last().map(|a| a.type_info).unwrap_or(TypeInfo::Unknown)
    }

    pub fn push(&mut self, token: TokenHandle, type_info: TypeInfo, is_declaration: bool) {
        self.assignments.push(Assignment { token, type_info, is_declaration });
    }
}

/// Per-frame name table. Re-scanning a line clears and rebuilds the
/// identifiers whose assignments fall on that line, per §4.2's incremental
/// update rule.
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    by_name: HashMap<String, SourceIdentifier>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        IdentifierTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&SourceIdentifier> {
        self.by_name.get(name)
    }

    pub fn entry(&mut self, name: &str) -> &mut SourceIdentifier {
        self.by_name.entry(name.to_string()).or_insert_with(|| SourceIdentifier::new(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Remove every assignment whose token is in `tokens` from every
    /// identifier, dropping identifiers left with no assignments.
    pub fn clear_tokens(&mut self, tokens: &[TokenHandle]) {
        self.by_name.retain(|_, ident| {
            ident.assignments.retain(|a| !tokens.contains(&a.token));
            !ident.assignments.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::arena::Handle;

    #[test]
    fn current_type_reflects_most_recent_assignment() {
        let mut ident = SourceIdentifier::new("x");
        ident.push(Handle::default(), TypeInfo::Int, true);
        assert_eq!(ident.current_type(), TypeInfo::Int);
        ident.push(Handle::default(), TypeInfo::Str, false);
        assert_eq!(ident.current_type(), TypeInfo::Str);
    }

    #[test]
    fn clear_tokens_drops_empty_identifiers() {
        let mut table = IdentifierTable::new();
        let tok = Handle::default();
        table.entry("x").push(tok, TypeInfo::Int, true);
        table.clear_tokens(&[tok]);
        assert!(table.get("x").is_none());
    }
}
