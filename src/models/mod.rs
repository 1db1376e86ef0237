//! Domain models shared across the pipeline
//!
//! Request parameters, suggestions and the response contract, plus the
//! display models used for CLI table output.

pub mod display;
pub mod request;
pub mod suggestion;

pub use request::{ActivityDuration, RawRequest, RequestParameters, Situation};
pub use suggestion::{
    Category, ResponseMetadata, SUGGESTION_COUNT, Source, Suggestion, SuggestionResponse,
};

pub use display::{KeyDisplay, SuggestionDisplay};
