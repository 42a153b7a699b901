//! Source positions and spans for the pegkit parser toolkit.
//!
//! This crate provides the foundational location types shared by every other
//! pegkit crate:
//!
//! - [`TextPos`]: a 1-based line/column pair, advanced column-wise as symbols
//!   are consumed and line-wise by an explicit newline step.
//! - [`Pos`]: a position in a symbol sequence, a symbol index paired with a
//!   [`TextPos`]. Token-stream parsing uses the index only; the line/column
//!   part is simply never advanced line-wise there.
//! - [`Span`]: a half-open `[begin, end)` pair of positions with slicing and
//!   set-style helpers.
//!
//! Positions index *symbols*, not bytes: a character source is a `&[char]`
//! and a token source is a `&[Token]`, so an index is always a valid element
//! boundary. Conversions to display coordinates go through the carried
//! line/column pair.

mod pos;
mod span;
mod text_pos;

pub use pos::Pos;
pub use span::Span;
pub use text_pos::TextPos;
