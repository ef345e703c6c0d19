pub mod answer_oracle;
pub mod field_filler;
pub mod listing_scanner;
pub mod llm_service;
pub mod matcher;
pub mod outcome_writer;
pub mod selectors;
pub mod vocabulary;

pub use answer_oracle::{AnswerOracle, CompletionBackend, ProfileOracle};
pub use field_filler::FieldFiller;
pub use listing_scanner::ListingScanner;
pub use llm_service::LlmService;
pub use matcher::{ElementMatcher, MatcherChain, Matchers, NavAction, NavTarget};
pub use outcome_writer::OutcomeWriter;
