pub mod corpus;
pub mod error;
pub mod index;
pub mod postings;
pub mod query;
pub mod score;
pub mod tokenizer;

pub use error::IndexError;
pub use index::{Index, IndexBuilder};
pub use postings::{DocId, Posting, PostingsList};
pub use query::{execute_and_query, run_query, AndQueryReport, QueryReport};
