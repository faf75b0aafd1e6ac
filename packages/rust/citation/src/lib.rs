//! Citation grammar, parsing, and detection for circex.
//!
//! Everything that turns free text into structured [`Citation`]s lives
//! here:
//! - [`grammar`] — the compiled citation regexes (versioned)
//! - [`parser`] — citation string → [`Citation`]
//! - [`department`] — department name + year → URL path code
//! - [`normalize`] — citation string → comparison key
//! - [`detect`] — full-text scan for citations, self-reference filtering
//!
//! [`Citation`]: circex_shared::Citation

pub mod department;
pub mod detect;
pub mod grammar;
pub mod normalize;
pub mod parser;

pub use department::department_code;
pub use detect::{DetectedReference, detect_references};
pub use normalize::normalize_title;
pub use parser::parse_reference_title;
