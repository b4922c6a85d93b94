use bson::Bson;

/// Determines whether the default check for a pattern field is overridden.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchAction {
    /// The visitor handled the field; skip the default check.
    Skip,
    /// A match error occurred; stop checking.
    Abort,
    /// Use the default check.
    Continue,
}

/// Called for every key in the pattern before the default comparison. The
/// document value is `None` when the key was not found.
pub type MatchVisitor<'a> = dyn FnMut(&str, &Bson, Option<&Bson>) -> MatchAction + 'a;

/// Configuration and scratch state for one match call. Never shared across
/// matches; build a fresh context per invocation.
pub struct MatchContext<'a> {
    /// if false, int32/int64/double compare equal across kinds by value
    pub strict_numeric_types: bool,

    /// if true, a key containing dots is matched verbatim instead of
    /// indicating a path into sub documents
    pub retain_dots_in_keys: bool,

    /// if true, treats 42 and "42" as placeholders, i.e. comparing 42 to
    /// any number is ok
    pub allow_placeholders: bool,

    /// if true, the first key is compared case-insensitively
    pub is_command: bool,

    /// overrides the default match behavior per pattern field
    pub visitor: Option<Box<MatchVisitor<'a>>>,

    /// dot separated breadcrumb trail of the keys compared so far
    pub path: String,

    /// description of the first mismatch
    pub errmsg: String,
}

impl<'a> MatchContext<'a> {
    pub fn new() -> MatchContext<'a> {
        MatchContext {
            strict_numeric_types: false,
            retain_dots_in_keys: false,
            allow_placeholders: false,
            is_command: false,
            visitor: None,
            path: String::new(),
            errmsg: String::new(),
        }
    }

    pub(crate) fn push_path(&mut self, key: &str) -> usize {
        let saved = self.path.len();
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(key);
        saved
    }

    pub(crate) fn truncate_path(&mut self, saved: usize) {
        self.path.truncate(saved);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.errmsg = format!("{}: {}", self.path, message);
    }
}

impl<'a> Default for MatchContext<'a> {
    fn default() -> MatchContext<'a> {
        MatchContext::new()
    }
}
