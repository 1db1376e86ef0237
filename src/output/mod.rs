//! Output formatting for CLI results

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::models::{SuggestionDisplay, SuggestionResponse};

pub mod json;
pub mod pretty;
pub mod table;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable + ?Sized>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

impl Formattable for [SuggestionResponse] {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            // A single response is emitted exactly as the response contract
            OutputFormat::Json => match self {
                [single] => Ok(serde_json::to_string_pretty(single)?),
                many => Ok(serde_json::to_string_pretty(many)?),
            },
            OutputFormat::Table => {
                let rows: Vec<SuggestionDisplay> = self
                    .iter()
                    .flat_map(|response| {
                        let source = response.metadata.source.as_str();
                        response
                            .suggestions
                            .iter()
                            .enumerate()
                            .map(move |(i, s)| SuggestionDisplay::new(i + 1, s, source))
                    })
                    .collect();
                Ok(table::format_table(&rows))
            }
            OutputFormat::Pretty => Ok(self
                .iter()
                .map(pretty::render_response)
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}
