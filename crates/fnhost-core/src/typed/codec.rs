//! Wire codecs for typed functions.
//!
//! `RequestClass` / `ResponseClass` describe the request and response types
//! of a typed function together with their wire capabilities. A class built
//! with `of::<T>()` can decode (or encode) JSON; an `opaque` class cannot and
//! is rejected when the function is defined.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{FunctionError, Value};
use crate::function::Function;

type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<Value, FunctionError> + Send + Sync>;
type EncodeFn = Arc<dyn Fn(&Value) -> Result<Vec<u8>, FunctionError> + Send + Sync>;

#[derive(Clone)]
pub struct RequestClass {
    name: String,
    decode: Option<DecodeFn>,
}

impl RequestClass {
    /// JSON-decodable request type.
    pub fn of<T: DeserializeOwned + Send + Sync + 'static>() -> Self {
        let name = std::any::type_name::<T>();
        Self::with_decoder(name, move |bytes| {
            serde_json::from_slice::<T>(bytes)
                .map(Value::new)
                .map_err(|e| FunctionError::codec(name, e))
        })
    }

    /// Custom wire decoding.
    pub fn with_decoder<F>(name: impl Into<String>, decode: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            decode: Some(Arc::new(decode)),
        }
    }

    /// A class with no wire capability.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decode: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_decode(&self) -> bool {
        self.decode.is_some()
    }

    pub fn decode(&self, body: &[u8]) -> Result<Value, FunctionError> {
        match &self.decode {
            Some(decode) => decode(body),
            None => Err(FunctionError::codec(&self.name, "class cannot decode")),
        }
    }
}

impl fmt::Debug for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClass")
            .field("name", &self.name)
            .field("can_decode", &self.can_decode())
            .finish()
    }
}

#[derive(Clone)]
pub struct ResponseClass {
    name: String,
    encode: Option<EncodeFn>,
}

impl ResponseClass {
    /// JSON-encodable response type.
    pub fn of<T: Serialize + Any + Send + Sync>() -> Self {
        let name = std::any::type_name::<T>();
        Self::with_encoder(name, move |value| {
            let typed = value
                .downcast_ref::<T>()
                .ok_or_else(|| FunctionError::TypeMismatch {
                    what: "typed response".to_string(),
                    expected: name,
                    found: value.type_name(),
                })?;
            serde_json::to_vec(typed).map_err(|e| FunctionError::codec(name, e))
        })
    }

    pub fn with_encoder<F>(name: impl Into<String>, encode: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<u8>, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            encode: Some(Arc::new(encode)),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encode: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_encode(&self) -> bool {
        self.encode.is_some()
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, FunctionError> {
        match &self.encode {
            Some(encode) => encode(value),
            None => Err(FunctionError::codec(&self.name, "class cannot encode")),
        }
    }
}

impl fmt::Debug for ResponseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseClass")
            .field("name", &self.name)
            .field("can_encode", &self.can_encode())
            .finish()
    }
}

/// What a server adapter uses to move a typed function's request and
/// response across the wire.
///
/// Without classes JSON passes through: the request becomes a
/// `serde_json::Value`; the response must be a `serde_json::Value` or a
/// string.
#[derive(Debug, Clone, Default)]
pub struct WireCodec {
    request: Option<RequestClass>,
    response: Option<ResponseClass>,
}

const PASS_THROUGH: &str = "json";

impl WireCodec {
    pub fn for_function(function: &Function) -> Self {
        Self {
            request: function.request_class().cloned(),
            response: function.response_class().cloned(),
        }
    }

    pub fn decode_request(&self, body: &[u8]) -> Result<Value, FunctionError> {
        match &self.request {
            Some(class) => class.decode(body),
            None => serde_json::from_slice::<serde_json::Value>(body)
                .map(Value::new)
                .map_err(|e| FunctionError::codec(PASS_THROUGH, e)),
        }
    }

    pub fn encode_response(&self, response: &Value) -> Result<Vec<u8>, FunctionError> {
        if let Some(class) = &self.response {
            return class.encode(response);
        }
        if let Some(json) = response.downcast_ref::<serde_json::Value>() {
            return serde_json::to_vec(json).map_err(|e| FunctionError::codec(PASS_THROUGH, e));
        }
        if let Some(s) = response.as_str() {
            return serde_json::to_vec(s).map_err(|e| FunctionError::codec(PASS_THROUGH, e));
        }
        Err(FunctionError::TypeMismatch {
            what: "pass-through response".to_string(),
            expected: "serde_json::Value or String",
            found: response.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn request_class_decodes_json() {
        let class = RequestClass::of::<Point>();
        assert!(class.can_decode());
        let v = class.decode(br#"{"x":1,"y":2}"#).unwrap();
        assert_eq!(v.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
    }

    #[test]
    fn bad_body_is_a_codec_error() {
        let err = RequestClass::of::<Point>().decode(b"{").unwrap_err();
        assert!(matches!(err, FunctionError::Codec { ref class, .. } if class.ends_with("Point")));
    }

    #[test]
    fn opaque_classes_have_no_capability() {
        assert!(!RequestClass::opaque("R").can_decode());
        assert!(!ResponseClass::opaque("S").can_encode());
        assert!(ResponseClass::opaque("S").encode(&Value::nil()).is_err());
    }

    #[test]
    fn response_class_encodes_matching_type_only() {
        let class = ResponseClass::of::<Point>();
        let bytes = class.encode(&Value::new(Point { x: 3, y: 4 })).unwrap();
        assert_eq!(bytes, br#"{"x":3,"y":4}"#);

        let err = class.encode(&Value::from("nope")).unwrap_err();
        assert!(matches!(err, FunctionError::TypeMismatch { .. }));
    }

    #[test]
    fn pass_through_codec() {
        let codec = WireCodec::default();
        let req = codec.decode_request(br#"{"a":1}"#).unwrap();
        assert_eq!(
            req.downcast_ref::<serde_json::Value>(),
            Some(&serde_json::json!({"a": 1}))
        );

        let out = codec.encode_response(&Value::from("hi")).unwrap();
        assert_eq!(out, br#""hi""#);
        assert!(codec.encode_response(&Value::new(7u8)).is_err());
    }
}
