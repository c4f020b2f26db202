//! Typed OpenAPI entities.
//!
//! Field order in these structs is the key order written on encode, so most of
//! them opt out of alphabetical field ordering. Every object keeps unknown keys
//! (`x-*` extensions, Swagger 2 keys) in a flattened `extensions` map so they
//! survive a decode/encode cycle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reference::RefOr;
use crate::types::HttpMethod;

/// Unknown keys preserved verbatim, in source order.
pub type Extensions = IndexMap<String, serde_json::Value>;

/// Security requirement: scheme name to required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A set of callback expressions, each mapping to a path item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    /// Expression (e.g. `{$request.body#/callbackUrl}`) to path item.
    #[serde(flatten)]
    pub expressions: IndexMap<String, RefOr<PathItem>>,
}

/// Contact details for the exposed API.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A named example value.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Embedded literal example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// URL of an externally hosted example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Pointer to additional external documentation.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    /// Description of the target documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL of the target documentation.
    #[serde(default)]
    pub url: String,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A response or encoding header.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Description of the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the header is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Whether the header is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Schema of the header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Unknown keys (`style`, `explode`, `content`, `x-*`).
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// API metadata.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL of the terms of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    /// Contact details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// API version (not the OpenAPI version).
    #[serde(default)]
    pub version: String,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// License for the exposed API.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    #[serde(default)]
    pub name: String,
    /// SPDX identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A design-time link between a response and another operation.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Relative or absolute reference to the target operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    /// `operationId` of the target operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameter name to runtime expression or constant.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, serde_json::Value>,
    /// Request body expression or constant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    /// Description of the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server override for the target operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Schema and examples for one media type.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Single example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    /// Named examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Unknown keys (`encoding`, `x-*`).
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A single API operation on a path.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Tags for logical grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Additional external documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Unique operation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Operation-level parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBody>>,
    /// Status code (or `default`) to response.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOr<Response>>,
    /// Out-of-band callbacks.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    /// Whether the operation is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Security override for this operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Server override for this operation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A single operation parameter.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    #[serde(default)]
    pub name: String,
    /// Location: `query`, `header`, `path`, or `cookie`.
    #[serde(default, rename = "in")]
    pub location: String,
    /// Description of the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Whether the parameter is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Schema of the parameter value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Single example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    /// Named examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Unknown keys (`style`, `explode`, `content`, `x-*`).
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// The operations available on a single path.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Short summary applying to all operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description applying to all operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `GET` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// `PUT` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// `POST` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// `DELETE` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// `OPTIONS` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// `HEAD` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// `PATCH` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// `TRACE` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Server override for all operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Parameters shared by all operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A single request body.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media type to content description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Whether the body is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A single response from an operation.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description of the response.
    #[serde(default)]
    pub description: String,
    /// Header name to header.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    /// Media type to content description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Link name to link.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A JSON Schema, kept as an opaque order-preserving value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(
    /// The schema object (or boolean schema).
    pub serde_json::Value,
);

/// A security scheme usable by operations.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    /// `apiKey`, `http`, `mutualTLS`, `oauth2`, or `openIdConnect`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Description of the scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Header, query, or cookie parameter name (`apiKey`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location of the API key (`apiKey`).
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// HTTP authorization scheme (`http`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Bearer token format hint (`http`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// OAuth flows (`oauth2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<serde_json::Value>,
    /// Discovery URL (`openIdConnect`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A server the API is reachable at.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL, possibly templated.
    #[serde(default)]
    pub url: String,
    /// Description of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Template variables.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, serde_json::Value>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Metadata for a tag used by operations.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name.
    #[serde(default)]
    pub name: String,
    /// Description of the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Additional external documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// Whether any HTTP method has an operation.
    pub fn has_operations(&self) -> bool {
        return HttpMethod::ALL.into_iter().any(|method| return self.operation(method).is_some());
    }

    /// The operation for one method.
    pub const fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        return match method {
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        };
    }

    /// Mutable slot for one method.
    pub const fn operation_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        return match method {
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Get => &mut self.get,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Trace => &mut self.trace,
        };
    }

    /// Defined operations, in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        return HttpMethod::ALL
            .into_iter()
            .filter_map(|method| return self.operation(method).map(|op| return (method, op)));
    }

    /// Set or clear the operation for one method. Returns the previous operation.
    pub fn set_operation(&mut self, method: HttpMethod, operation: Option<Operation>) -> Option<Operation> {
        return std::mem::replace(self.operation_mut(method), operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codecs, Format};

    #[test]
    fn unknown_keys_round_trip_in_order() {
        let codecs = Codecs::default();
        let source = "get:\n  summary: s\nx-zeta: 1\nx-alpha: 2\n";
        let item: PathItem = codecs.decode(Format::Yaml, "p.yaml", source.as_bytes()).unwrap();
        let keys: Vec<&String> = item.extensions.keys().collect();
        assert_eq!(keys, ["x-zeta", "x-alpha"]);

        let encoded = codecs.encode(Format::Yaml, "p.yaml", &item).unwrap();
        assert_eq!(String::from_utf8(encoded).unwrap(), source);
    }

    #[test]
    fn operations_iterate_in_declaration_order() {
        let mut item = PathItem::default();
        item.set_operation(HttpMethod::Delete, Some(Operation::default()));
        item.set_operation(HttpMethod::Get, Some(Operation::default()));

        let methods: Vec<HttpMethod> = item.operations().map(|(method, _)| return method).collect();
        assert_eq!(methods, [HttpMethod::Get, HttpMethod::Delete]);
        assert!(item.has_operations());

        item.set_operation(HttpMethod::Get, None);
        item.set_operation(HttpMethod::Delete, None);
        assert!(!item.has_operations());
    }

    #[test]
    fn response_codes_decode_from_yaml_integers() {
        let codecs = Codecs::default();
        let source = "responses:\n  200:\n    description: ok\n  default:\n    description: error\n";
        let op: Operation = codecs.decode(Format::Yaml, "op.yaml", source.as_bytes()).unwrap();
        let codes: Vec<&String> = op.responses.keys().collect();
        assert_eq!(codes, ["200", "default"]);
    }
}
