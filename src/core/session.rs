// This module provides arena-backed name generation using the bumpalo crate. NameContext owns
// a reference to an arena and hands out generated names as arena slices that live as long as
// the arena, so a lowering pass can keep kernel function names, group names and value names
// around without cloning them. Two naming schemes are supported: hint-based names, where the
// first request for a hint returns the hint itself and later requests append _0, _1, ...; and
// keyed pretty names, where each distinct key gets the next prefix-numbered name and repeated
// requests for the same key return the same name.

//! Arena-based unique name generation.

use bumpalo::Bump;
use hashbrown::HashMap;
use std::cell::RefCell;

/// Unique-name generator backed by an arena.
pub struct NameContext<'arena> {
    arena: &'arena Bump,

    /// Last suffix handed out per hint, `None` when only the bare hint was used.
    hint_suffixes: RefCell<HashMap<String, Option<usize>>>,

    /// Names already assigned to (prefix, key) pairs.
    pretty_names: RefCell<HashMap<(String, usize), &'arena str>>,

    /// Next number per pretty-name prefix.
    prefix_counters: RefCell<HashMap<String, usize>>,
}

impl<'arena> NameContext<'arena> {
    /// Create a name context allocating from the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            hint_suffixes: RefCell::new(HashMap::new()),
            pretty_names: RefCell::new(HashMap::new()),
            prefix_counters: RefCell::new(HashMap::new()),
        }
    }

    /// Fresh name derived from `hint`: the hint itself on first use, then
    /// `hint_0`, `hint_1`, ...
    pub fn new_name(&self, hint: &str) -> &'arena str {
        let mut suffixes = self.hint_suffixes.borrow_mut();
        match suffixes.get_mut(hint) {
            None => {
                suffixes.insert(hint.to_string(), None);
                self.arena.alloc_str(hint)
            }
            Some(slot) => {
                let next = slot.map_or(0, |n| n + 1);
                *slot = Some(next);
                bumpalo::format!(in self.arena, "{}_{}", hint, next).into_bump_str()
            }
        }
    }

    /// Stable name for `key` under `prefix`: `prefix0`, `prefix1`, ... in
    /// first-request order; the same key always yields the same name.
    pub fn pretty_unique_name(&self, key: usize, prefix: &str) -> &'arena str {
        let lookup = (prefix.to_string(), key);
        if let Some(&name) = self.pretty_names.borrow().get(&lookup) {
            return name;
        }

        let mut counters = self.prefix_counters.borrow_mut();
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        let name = bumpalo::format!(in self.arena, "{}{}", prefix, *counter).into_bump_str();
        *counter += 1;

        self.pretty_names.borrow_mut().insert(lookup, name);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_name_suffixes() {
        let arena = Bump::new();
        let ctx = NameContext::new(&arena);

        assert_eq!(ctx.new_name("fn_exp"), "fn_exp");
        assert_eq!(ctx.new_name("fn_exp"), "fn_exp_0");
        assert_eq!(ctx.new_name("fn_exp"), "fn_exp_1");
        assert_eq!(ctx.new_name("fn_abs"), "fn_abs");
    }

    #[test]
    fn test_pretty_unique_name_is_stable() {
        let arena = Bump::new();
        let ctx = NameContext::new(&arena);

        assert_eq!(ctx.pretty_unique_name(42, "var_"), "var_0");
        assert_eq!(ctx.pretty_unique_name(7, "var_"), "var_1");
        assert_eq!(ctx.pretty_unique_name(42, "var_"), "var_0");
        assert_eq!(ctx.pretty_unique_name(42, "tmp_"), "tmp_0");
    }

    #[test]
    fn test_names_outlive_context() {
        let arena = Bump::new();
        let names = {
            let ctx = NameContext::new(&arena);
            [ctx.new_name("fn_relu"), ctx.new_name("fn_relu"), ctx.pretty_unique_name(3, "var_")]
        };
        assert_eq!(names, ["fn_relu", "fn_relu_0", "var_0"]);
    }
}
