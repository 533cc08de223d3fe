//! Tree-sitter query strings used by the Python submission checks.

/// Tree-sitter query that returns every name a module binds.
/// * `name`: the bound identifier (assignment or loop target, function,
///   class, import or alias)
/// * `target`: a destructuring target whose identifiers are all bound
pub const BOUND_NAMES_QUERY: &str = include_str!("bound_names.scm");
