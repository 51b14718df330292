//! Session capacities.

/// Fixed capacities of the stores owned by a [`Session`](crate::Session).
///
/// Each store is allocated once at these sizes and never grows; running out
/// of any of them aborts the statement that needed more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Symbol-table slots.
    pub var_slots: usize,
    /// Bytes of function-definition text, terminators included.
    pub fundef_bytes: usize,
    /// AST nodes live at once, across all nested calls of one statement.
    pub tree_nodes: usize,
    /// Parser stack entries.
    pub parser_stack: usize,
}

impl Config {
    pub const DEFAULT_VAR_SLOTS: usize = 128;
    pub const DEFAULT_FUNDEF_BYTES: usize = 2048;
    pub const DEFAULT_TREE_NODES: usize = 2048;
    pub const DEFAULT_PARSER_STACK: usize = 1024;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            var_slots: Self::DEFAULT_VAR_SLOTS,
            fundef_bytes: Self::DEFAULT_FUNDEF_BYTES,
            tree_nodes: Self::DEFAULT_TREE_NODES,
            parser_stack: Self::DEFAULT_PARSER_STACK,
        }
    }
}
