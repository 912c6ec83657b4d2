mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{ParsedCatalog, ParsedPopup};

/// Parse catalog text into a [`ParsedCatalog`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid catalog syntax or a popup
/// lists the same condition twice.
pub fn parse(input: &str) -> Result<ParsedCatalog, ParseError> {
    use winnow::Parser;
    let raw = grammar::parse_catalog.parse(input).map_err(|e| {
        let message = e.inner().to_string();
        let message = if message.is_empty() {
            "unexpected input".to_owned()
        } else {
            message
        };
        ParseError::at(input, e.offset(), message)
    })?;
    ParsedCatalog::build(input, raw)
}
