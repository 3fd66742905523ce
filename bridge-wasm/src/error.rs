//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A browser API is missing (no `window`, no `localStorage`, ...)
    #[error("Browser API not available: {0}")]
    NotAvailable(String),

    /// The media element rejected an operation
    #[error("Media element error: {0}")]
    Element(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request did not finish in time
    #[error("Timed out after {0} ms")]
    Timeout(u32),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAvailable(api) => BridgeError::NotAvailable(api),
            WasmError::Element(message) => BridgeError::Element(message),
            WasmError::Serialization(e) => BridgeError::Serialization(e),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

/// Best-effort message of a thrown JavaScript value.
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        message
    } else if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        error.message().into()
    } else {
        format!("{value:?}")
    }
}

/// Wrap a thrown JavaScript value with the operation it came from.
pub(crate) fn js_error(context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("{context}: {}", js_message(&err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn not_available_maps_to_bridge_variant() {
        let err: BridgeError = WasmError::NotAvailable("localStorage".into()).into();
        assert!(err.is_not_available());

        let err: BridgeError = WasmError::Timeout(500).into();
        assert!(matches!(err, BridgeError::OperationFailed(msg) if msg.contains("500")));
    }

    #[wasm_bindgen_test]
    fn js_string_becomes_message() {
        let err = WasmError::from(JsValue::from_str("NotAllowedError"));
        assert_eq!(err.to_string(), "JavaScript error: NotAllowedError");
    }
}
