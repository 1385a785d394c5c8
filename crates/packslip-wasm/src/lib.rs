//! WASM bindings for supplier delivery document extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! Text extraction from PDFs happens on the JavaScript side; these bindings
//! take the extracted text.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use packslip_core::format::amounts;
use packslip_core::{
    builtin_ids, DecimalConvention, DocumentParser as _, FormatSpec, LineItemParser,
    ParseSessionResult, SessionError,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Identifiers of the built-in supplier formats.
#[wasm_bindgen]
pub fn list_formats() -> js_sys::Array {
    builtin_ids().into_iter().map(JsValue::from_str).collect()
}

/// Parse document text with a built-in format.
///
/// Returns the parse result; a document with no recognizable line items
/// rejects with an object carrying `message` and `sample`.
#[wasm_bindgen]
pub fn parse_document(text: &str, format_id: &str) -> Result<JsValue, JsValue> {
    let parser = LineItemParser::for_format(format_id, None).map_err(to_js_error)?;
    to_js(parser.parse_text(text))
}

/// Parse document text with a format spec given as JSON.
#[wasm_bindgen]
pub fn parse_with_spec(text: &str, spec_json: &str) -> Result<JsValue, JsValue> {
    let spec = FormatSpec::from_json(spec_json).map_err(to_js_error)?;
    let parser = LineItemParser::from_spec(&spec).map_err(to_js_error)?;
    to_js(parser.parse_text(text))
}

/// Parse an amount ("1.234,56", "60,00€") with a decimal convention
/// (`comma`, `period` or `auto`).
#[wasm_bindgen]
pub fn parse_amount(amount: &str, convention: &str) -> Option<f64> {
    let convention: DecimalConvention = convention.parse().ok()?;
    amounts::parse_amount(amount, convention).and_then(|d| d.to_f64())
}

/// Format an amount with two decimals in a decimal convention.
#[wasm_bindgen]
pub fn format_amount(amount: f64, convention: &str) -> Option<String> {
    let convention: DecimalConvention = convention.parse().ok()?;
    let amount = Decimal::try_from(amount).ok()?;
    Some(amounts::format_amount(amount, convention))
}

/// Document parser class holding one compiled format.
#[wasm_bindgen]
pub struct DocumentParser {
    parser: LineItemParser,
}

#[wasm_bindgen]
impl DocumentParser {
    /// Create a parser for a built-in format.
    #[wasm_bindgen(constructor)]
    pub fn new(format_id: &str) -> Result<DocumentParser, JsValue> {
        let parser = LineItemParser::for_format(format_id, None).map_err(to_js_error)?;
        Ok(Self { parser })
    }

    /// Create a parser from a format spec JSON string.
    #[wasm_bindgen(js_name = fromSpec)]
    pub fn from_spec(spec_json: &str) -> Result<DocumentParser, JsValue> {
        let spec = FormatSpec::from_json(spec_json).map_err(to_js_error)?;
        let parser = LineItemParser::from_spec(&spec).map_err(to_js_error)?;
        Ok(Self { parser })
    }

    /// Identifier of the format in use.
    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.parser.format().id().to_string()
    }

    /// Set how many unmatched lines are quoted when nothing is recognized.
    #[wasm_bindgen(js_name = setDiagnosticSample)]
    pub fn set_diagnostic_sample(&mut self, lines: usize) {
        self.parser = self.parser.clone().with_diagnostic_sample(lines);
    }

    /// Parse document text.
    #[wasm_bindgen]
    pub fn parse(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(self.parser.parse_text(text))
    }

    /// Parse document text and return flat rows for table display.
    #[wasm_bindgen]
    pub fn rows(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = self
            .parser
            .parse_text(text)
            .map_err(|e| session_error(&e))?;

        serde_wasm_bindgen::to_value(&result.rows()).map_err(to_js_error)
    }
}

/// Error object handed to JavaScript for fatal parse failures.
#[derive(Serialize)]
struct JsSessionError<'a> {
    message: String,
    sample: &'a [String],
}

fn session_error(e: &SessionError) -> JsValue {
    let sample: &[String] = match e {
        SessionError::NoRecognizedFormat { sample, .. } => sample,
        SessionError::EmptyDocument => &[],
    };

    let error = JsSessionError {
        message: e.to_string(),
        sample,
    };
    serde_wasm_bindgen::to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.message))
}

fn to_js(result: Result<ParseSessionResult, SessionError>) -> Result<JsValue, JsValue> {
    let result = result.map_err(|e| session_error(&e))?;
    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
