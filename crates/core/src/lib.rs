/*!
Walk-path engine for querying and reshaping JSON trees.

A walk-path is a small program of bracketed lexemes — offsets like
`[Relation][0]` and searches like `<John Smith>` or `<^J>R` — compiled by
[`WalkPath::parse`] and executed by [`Walker`], a lazy iterator yielding
[`Position`]s into the tree. Multiple walks can be fed through
[`interleave::deliver`] to group relevant results, and positions drive the
mutation algebra in [`mutate`] (insert, update, purge, swap, compare) and
the interpolator in [`template`].
*/

pub mod interleave;
pub mod lexeme;
pub mod mutate;
pub mod node;
pub mod parse;
pub mod path;
pub mod template;
pub mod walker;

pub use lexeme::{Lexeme, WalkPath, WalkPathError};
pub use node::{Json, Map, Number, Step};
pub use parse::{parse_json, parse_stream, to_text, ParseError, PrintStyle};
pub use path::{Anchor, MutationLog, Namespace, Position};
pub use walker::Walker;
