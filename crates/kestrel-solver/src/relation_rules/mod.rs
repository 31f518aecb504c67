//! Rule sets of the relation engine, one `impl TypeRelation` block per file.

mod assign;
mod cast;
mod identity;
mod subtype;
