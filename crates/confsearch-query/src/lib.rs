//! confsearch-query
//!
//! Request construction for keyword, vector and hybrid retrieval, plus the
//! strategy that decides where query vectors come from.

pub mod body;
pub mod builder;
pub mod source;

pub use body::SearchBody;
pub use builder::{QueryBuilder, QueryVector, KEYWORD_FIELDS};
pub use source::QueryVectorSource;
