//! Specification-document normalization.
//!
//! Fetches a JSON or YAML API specification and walks it into the normalized
//! shape. Parsing is deliberately lenient: JSON is a YAML subset, so one
//! parse path covers both, and documents that are not strictly conforming
//! (Swagger 2, OpenAPI 3.1, partial documents) still normalize as far as
//! their structure allows.

use crate::error::{Result, SourceError};
use serde_json::Value;
use std::collections::BTreeMap;
use toolforge_types::{AuthMethod, Endpoint, EndpointParameter, NormalizedSource};
use tracing::debug;

/// Methods walked per path entry.
const METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Cap on fetched specification documents.
pub const SPEC_DOC_LIMIT: usize = 2 * 1024 * 1024;

/// Fetches and normalizes a specification document.
///
/// # Errors
///
/// [`SourceError::Fetch`]/[`SourceError::FetchStatus`] for transport
/// failures, [`SourceError::SpecParse`] when the body is neither JSON nor
/// YAML or has no `paths`.
pub async fn normalize_spec(client: &reqwest::Client, url: &str) -> Result<NormalizedSource> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::fetch(url, &e))?;
    if !response.status().is_success() {
        return Err(SourceError::FetchStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let body = toolforge_fetch::read_text_limited(response, SPEC_DOC_LIMIT)
        .await
        .map_err(|e| SourceError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let source = parse_spec_document(&body)?;
    debug!(url, endpoints = source.endpoints.len(), "specification normalized");
    Ok(source)
}

/// Parses a specification document body into the normalized shape.
///
/// # Errors
///
/// [`SourceError::SpecParse`] when the body does not parse or describes no
/// operations.
pub fn parse_spec_document(body: &str) -> Result<NormalizedSource> {
    let doc: Value = serde_yaml::from_str(body)
        .map_err(|e| SourceError::SpecParse(e.to_string()))?;

    let info = &doc["info"];
    let name = info["title"]
        .as_str()
        .unwrap_or("Unnamed API")
        .trim()
        .to_string();
    let description = info["description"].as_str().unwrap_or("").trim().to_string();
    let base_url = doc["servers"][0]["url"]
        .as_str()
        .map(str::to_string)
        .or_else(|| swagger2_base_url(&doc));

    let endpoints = walk_paths(&doc["paths"]);
    if endpoints.is_empty() {
        return Err(SourceError::SpecParse(
            "document describes no operations under `paths`".to_string(),
        ));
    }

    Ok(NormalizedSource {
        name,
        description,
        base_url,
        auth_method: detect_auth(&doc),
        endpoints,
        schemas: collect_schemas(&doc),
        prebuilt: None,
    })
}

fn walk_paths(paths: &Value) -> Vec<Endpoint> {
    let Some(paths) = paths.as_object() else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let shared_params = parameters_of(&item["parameters"]);
        for method in METHODS {
            let op = &item[*method];
            if !op.is_object() {
                continue;
            }
            let mut parameters = shared_params.clone();
            parameters.extend(parameters_of(&op["parameters"]));

            endpoints.push(Endpoint {
                path: path.clone(),
                method: (*method).to_string(),
                operation_id: op["operationId"].as_str().map(str::to_string),
                summary: op["summary"].as_str().map(str::to_string),
                description: op["description"].as_str().map(str::to_string),
                parameters,
                request_body: json_schema_of(&op["requestBody"]),
                response_hint: success_response_of(&op["responses"]),
            });
        }
    }
    endpoints
}

fn parameters_of(value: &Value) -> Vec<EndpointParameter> {
    let Some(list) = value.as_array() else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|p| {
            Some(EndpointParameter {
                name: p["name"].as_str()?.to_string(),
                location: p["in"].as_str().unwrap_or("query").to_string(),
                required: p["required"].as_bool().unwrap_or(false),
                schema: non_null(&p["schema"]),
                description: p["description"].as_str().map(str::to_string),
            })
        })
        .collect()
}

/// `requestBody.content.application/json.schema`, or the first content type's
/// schema when JSON is absent.
fn json_schema_of(request_body: &Value) -> Option<Value> {
    let content = request_body.get("content")?.as_object()?;
    if let Some(json) = content.get("application/json") {
        return non_null(&json["schema"]);
    }
    content.values().next().and_then(|v| non_null(&v["schema"]))
}

/// First 2xx response's JSON schema.
fn success_response_of(responses: &Value) -> Option<Value> {
    let responses = responses.as_object()?;
    let mut codes: Vec<&String> = responses.keys().filter(|c| c.starts_with('2')).collect();
    codes.sort();
    let first = codes.first()?;
    json_schema_of(&responses[first.as_str()])
}

fn collect_schemas(doc: &Value) -> BTreeMap<String, Value> {
    let named = doc["components"]["schemas"]
        .as_object()
        .or_else(|| doc["definitions"].as_object());
    named
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn detect_auth(doc: &Value) -> AuthMethod {
    let schemes = doc["components"]["securitySchemes"]
        .as_object()
        .or_else(|| doc["securityDefinitions"].as_object());
    let Some(schemes) = schemes else {
        return AuthMethod::None;
    };

    for scheme in schemes.values() {
        match scheme["type"].as_str() {
            Some("http") => {
                return match scheme["scheme"].as_str() {
                    Some("bearer") => AuthMethod::Bearer,
                    Some("basic") => AuthMethod::Basic,
                    _ => AuthMethod::Unknown,
                };
            }
            Some("apiKey") => return AuthMethod::ApiKey,
            Some("oauth2") => return AuthMethod::Bearer,
            Some("basic") => return AuthMethod::Basic,
            _ => {}
        }
    }
    AuthMethod::Unknown
}

/// Swagger 2 `host` + `basePath` + first `schemes` entry.
fn swagger2_base_url(doc: &Value) -> Option<String> {
    let host = doc["host"].as_str()?;
    let scheme = doc["schemes"][0].as_str().unwrap_or("https");
    let base_path = doc["basePath"].as_str().unwrap_or("");
    Some(format!("{scheme}://{host}{base_path}"))
}

fn non_null(value: &Value) -> Option<Value> {
    if value.is_null() { None } else { Some(value.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS_SPEC: &str = r##"
openapi: 3.0.0
info:
  title: Items API
  description: Manage items.
servers:
  - url: https://items.example.com/v1
components:
  securitySchemes:
    bearer:
      type: http
      scheme: bearer
  schemas:
    Item:
      type: object
      properties:
        name: { type: string }
paths:
  /items:
    get:
      operationId: listItems
      summary: List items
      parameters:
        - name: limit
          in: query
          schema: { type: integer }
      responses:
        "200":
          content:
            application/json:
              schema: { $ref: "#/components/schemas/Item" }
    post:
      operationId: createItem
      requestBody:
        content:
          application/json:
            schema: { $ref: "#/components/schemas/Item" }
      responses:
        "201": { description: created }
"##;

    #[test]
    fn items_spec_normalizes_to_two_endpoints() {
        let source = parse_spec_document(ITEMS_SPEC).expect("parse");
        assert_eq!(source.name, "Items API");
        assert_eq!(source.base_url.as_deref(), Some("https://items.example.com/v1"));
        assert_eq!(source.auth_method, AuthMethod::Bearer);
        assert_eq!(source.endpoints.len(), 2);

        let get = &source.endpoints[0];
        assert_eq!((get.path.as_str(), get.method.as_str()), ("/items", "get"));
        assert_eq!(get.operation_id.as_deref(), Some("listItems"));
        assert_eq!(get.parameters[0].name, "limit");
        assert!(get.response_hint.is_some());

        let post = &source.endpoints[1];
        assert_eq!(post.method, "post");
        assert!(post.request_body.is_some());

        assert!(source.schemas.contains_key("Item"));
    }

    #[test]
    fn json_documents_parse_through_the_yaml_path() {
        let json = r#"{"info": {"title": "J"}, "paths": {"/a": {"get": {}}}}"#;
        let source = parse_spec_document(json).expect("parse");
        assert_eq!(source.name, "J");
        assert_eq!(source.endpoints.len(), 1);
    }

    #[test]
    fn swagger2_host_and_definitions_are_honored() {
        let doc = r#"
swagger: "2.0"
info: { title: Legacy }
host: legacy.example.com
basePath: /api
schemes: [https]
securityDefinitions:
  key:
    type: apiKey
definitions:
  Thing: { type: object }
paths:
  /things:
    get: {}
"#;
        let source = parse_spec_document(doc).expect("parse");
        assert_eq!(source.base_url.as_deref(), Some("https://legacy.example.com/api"));
        assert_eq!(source.auth_method, AuthMethod::ApiKey);
        assert!(source.schemas.contains_key("Thing"));
    }

    #[test]
    fn path_level_parameters_apply_to_every_method() {
        let doc = r#"
info: { title: P }
paths:
  /users/{id}:
    parameters:
      - name: id
        in: path
        required: true
    get: {}
    delete: {}
"#;
        let source = parse_spec_document(doc).expect("parse");
        assert_eq!(source.endpoints.len(), 2);
        for endpoint in &source.endpoints {
            assert_eq!(endpoint.parameters[0].name, "id");
            assert!(endpoint.parameters[0].required);
        }
    }

    #[test]
    fn pathless_documents_fail_with_a_parse_error() {
        let err = parse_spec_document(r#"{"info": {"title": "empty"}}"#).unwrap_err();
        assert!(matches!(err, SourceError::SpecParse(_)));

        let err = parse_spec_document("<html>not a spec</html>").unwrap_err();
        assert!(matches!(err, SourceError::SpecParse(_)));
    }
}
