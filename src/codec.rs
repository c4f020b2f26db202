//! Surface formats and the codec boundary.
//!
//! Every file is decoded into an order-preserving `serde_json::Value` first and
//! then into the typed entity, so both formats reach the model through the same
//! path. YAML scalar keys (`200:` under `responses`) become strings on the way.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// A supported surface format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    #[default]
    Yaml,
}

/// Decode/encode pair for one surface format.
pub trait Codec {
    /// Parse bytes into an order-preserving JSON value.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the bytes are not valid in this format.
    fn decode_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String>;

    /// Render a JSON value in this format.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value cannot be rendered.
    fn encode_value(&self, value: &serde_json::Value) -> Result<Vec<u8>, String>;
}

/// The codec used for each surface format. Injectable so hosts can swap in
/// their own emitter; `Default` uses the built-in serde codecs.
pub struct Codecs {
    /// Codec for `.json` files.
    json: Box<dyn Codec + Send + Sync>,
    /// Codec for `.yaml` and `.yml` files.
    yaml: Box<dyn Codec + Send + Sync>,
}

/// JSON via `serde_json`: pretty-printed with a trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Format {
    /// Map a file path to its format by extension.
    /// Returns `None` for anything that is not `.json`, `.yaml`, or `.yml`.
    pub fn for_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map_or("", |(_, ext)| return ext);
        return match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        };
    }

    /// The extension written for newly created files, without the dot.
    pub const fn extension(self) -> &'static str {
        return match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        };
    }

    /// The other supported format, tried when the preferred one fails.
    pub const fn other(self) -> Self {
        return match self {
            Self::Json => Self::Yaml,
            Self::Yaml => Self::Json,
        };
    }
}

impl Codecs {
    /// Build a registry from explicit codecs.
    pub fn new(json: Box<dyn Codec + Send + Sync>, yaml: Box<dyn Codec + Send + Sync>) -> Self {
        return Self { json, yaml };
    }

    /// The codec registered for a format.
    pub fn codec(&self, format: Format) -> &(dyn Codec + Send + Sync) {
        return match format {
            Format::Json => self.json.as_ref(),
            Format::Yaml => self.yaml.as_ref(),
        };
    }

    /// Decode bytes as `T` in one format.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the bytes do not parse or do not match `T`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        format: Format,
        path: &str,
        bytes: &[u8],
    ) -> Result<T, Error> {
        let value = self.codec(format).decode_value(bytes).map_err(|reason| {
            return Error::Decode { path: path.to_string(), reason };
        })?;
        return serde_json::from_value(value).map_err(|err| {
            return Error::Decode { path: path.to_string(), reason: err.to_string() };
        });
    }

    /// Decode bytes as `T`, trying `preferred` first and then the other format.
    ///
    /// # Errors
    ///
    /// Returns the `Error::Decode` of the second attempt when both fail.
    pub fn decode_any<T: DeserializeOwned>(
        &self,
        preferred: Format,
        path: &str,
        bytes: &[u8],
    ) -> Result<(T, Format), Error> {
        if let Ok(value) = self.decode(preferred, path, bytes) {
            return Ok((value, preferred));
        }
        let fallback = preferred.other();
        let value = self.decode(fallback, path, bytes)?;
        return Ok((value, fallback));
    }

    /// Encode `value` in one format.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if the value cannot be represented.
    pub fn encode<T: Serialize>(
        &self,
        format: Format,
        path: &str,
        value: &T,
    ) -> Result<Vec<u8>, Error> {
        let json = serde_json::to_value(value).map_err(|err| {
            return Error::Encode { path: path.to_string(), reason: err.to_string() };
        })?;
        return self.codec(format).encode_value(&json).map_err(|reason| {
            return Error::Encode { path: path.to_string(), reason };
        });
    }
}

impl Default for Codecs {
    fn default() -> Self {
        return Self::new(Box::new(JsonCodec), Box::new(YamlCodec));
    }
}

impl std::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_struct("Codecs").finish_non_exhaustive();
    }
}

impl Codec for JsonCodec {
    fn decode_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        return serde_json::from_slice(bytes).map_err(|err| return err.to_string());
    }

    fn encode_value(&self, value: &serde_json::Value) -> Result<Vec<u8>, String> {
        let mut out = serde_json::to_vec_pretty(value).map_err(|err| return err.to_string())?;
        out.push(b'\n');
        return Ok(out);
    }
}

impl Codec for YamlCodec {
    fn decode_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        let value: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|err| return err.to_string())?;
        return yaml_to_json(value);
    }

    fn encode_value(&self, value: &serde_json::Value) -> Result<Vec<u8>, String> {
        let text = serde_yaml::to_string(value).map_err(|err| return err.to_string())?;
        return Ok(text.into_bytes());
    }
}

/// Render a YAML mapping key as a JSON object key.
///
/// # Errors
///
/// Returns a reason for keys that are collections.
fn yaml_key_to_string(key: serde_yaml::Value) -> Result<String, String> {
    return match key {
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Tagged(tagged) => yaml_key_to_string(tagged.value),
        serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_) => {
            Err("mapping keys must be scalars".to_string())
        },
    };
}

/// Convert a YAML value into an order-preserving JSON value.
///
/// # Errors
///
/// Returns a reason for non-scalar keys or non-finite floats.
fn yaml_to_json(value: serde_yaml::Value) -> Result<serde_json::Value, String> {
    return match value {
        serde_yaml::Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, entry) in mapping {
                object.insert(yaml_key_to_string(key)?, yaml_to_json(entry)?);
            }
            Ok(serde_json::Value::Object(object))
        },
        serde_yaml::Value::Null => Ok(serde_json::Value::Null),
        serde_yaml::Value::Number(n) => yaml_number_to_json(&n),
        serde_yaml::Value::Sequence(items) => {
            let converted = items.into_iter().map(yaml_to_json).collect::<Result<Vec<_>, _>>()?;
            Ok(serde_json::Value::Array(converted))
        },
        serde_yaml::Value::String(s) => Ok(serde_json::Value::String(s)),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    };
}

/// Convert a YAML number, keeping integers exact.
///
/// # Errors
///
/// Returns a reason for `.nan` and `.inf`, which JSON cannot represent.
fn yaml_number_to_json(n: &serde_yaml::Number) -> Result<serde_json::Value, String> {
    if let Some(i) = n.as_i64() {
        return Ok(serde_json::Value::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(serde_json::Value::from(u));
    }
    let float = n.as_f64().unwrap_or(f64::NAN);
    return serde_json::Number::from_f64(float)
        .map(serde_json::Value::Number)
        .ok_or_else(|| return format!("non-finite number `{n}`"));
}
