use api::{AppState, ErrorResponse, HttpRequest, process_request_async, status_for_code};
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

#[derive(Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    // For API Gateway and Function URL responses
    ApiGateway {
        #[serde(rename = "statusCode")]
        status_code: i32,
        headers: Value,
        body: String,
    },
    // For direct invocation
    Direct {
        #[serde(rename = "statusCode")]
        status_code: i32,
        headers: Value,
        body: String,
    },
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a raw `application/x-www-form-urlencoded` query string
fn parse_raw_query(raw: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring undecodable query string {}: {}", raw, e);
        HashMap::new()
    })
}

fn decode_body(payload: &Value) -> Result<Option<String>, Error> {
    let Some(body) = payload.get("body") else {
        return Ok(None);
    };
    let body_str = body.as_str().unwrap_or_default();

    let is_base64 = payload
        .get("isBase64Encoded")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !is_base64 {
        return Ok(Some(body_str.to_string()));
    }

    debug!("Body is base64 encoded");
    use base64::{Engine as _, engine::general_purpose};
    let decoded = general_purpose::STANDARD.decode(body_str).map_err(|e| {
        error!("Failed to decode base64: {}", e);
        Error::from(format!("Failed to decode base64: {}", e))
    })?;
    String::from_utf8(decoded).map(Some).map_err(|e| {
        error!("Failed to convert to UTF-8: {}", e);
        Error::from(format!("Failed to convert to UTF-8: {}", e))
    })
}

pub async fn function_handler(state: &AppState, event: LambdaEvent<Value>) -> Result<OutgoingMessage, Error> {
    let payload = &event.payload;

    // Determine invocation type
    let is_api_gateway = payload.get("httpMethod").is_some();
    let is_function_url = payload
        .get("requestContext")
        .and_then(|rc| rc.get("http"))
        .is_some();
    let is_direct = !is_api_gateway && !is_function_url;

    let request_id = payload
        .get("requestContext")
        .and_then(|rc| rc.get("requestId"))
        .and_then(|id| id.as_str())
        .unwrap_or(&event.context.request_id);

    let path = payload
        .get("rawPath")
        .or_else(|| payload.get("path"))
        .and_then(|p| p.as_str())
        .unwrap_or("/");

    let body = decode_body(payload)?;

    // Direct invocations may omit the method: a body means POST
    let method = payload
        .get("httpMethod")
        .or_else(|| {
            payload
                .get("requestContext")
                .and_then(|rc| rc.get("http"))
                .and_then(|http| http.get("method"))
        })
        .or_else(|| payload.get("method"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| if body.is_some() { "POST" } else { "GET" }.to_string());

    let mut query = string_map(payload.get("queryStringParameters"));
    if query.is_empty() {
        if let Some(raw) = payload.get("rawQueryString").and_then(|q| q.as_str()) {
            query = parse_raw_query(raw);
        }
    }

    let source_ip = payload
        .get("requestContext")
        .and_then(|rc| rc.get("identity"))
        .and_then(|id| id.get("sourceIp"))
        .or_else(|| {
            payload
                .get("requestContext")
                .and_then(|rc| rc.get("http"))
                .and_then(|http| http.get("sourceIp"))
        })
        .and_then(|ip| ip.as_str())
        .unwrap_or("unknown");

    info!("Incoming {} request {} to {} from {}", method, request_id, path, source_ip);

    let mut http = HttpRequest::new(&method, path).with_body(body.unwrap_or_default());
    http.query = query;
    for (name, value) in string_map(payload.get("headers")) {
        http = http.with_header(&name, &value);
    }

    let (status_code, body) = match process_request_async(state, &http).await {
        Ok(response_body) => {
            info!("Successfully processed {} request", path);
            (200, response_body)
        }
        Err(err) => {
            let error_response: ErrorResponse = err.into();
            let status_code = status_for_code(&error_response.code);
            error!("Request to {} failed with {}: {}", path, status_code, error_response.error);
            (status_code, serde_json::to_string(&error_response)?)
        }
    };

    let headers = serde_json::json!({
        "Content-Type": "application/json",
    });
    let status_code = i32::from(status_code);
    if is_direct {
        Ok(OutgoingMessage::Direct {
            status_code,
            headers,
            body,
        })
    } else {
        Ok(OutgoingMessage::ApiGateway {
            status_code,
            headers,
            body,
        })
    }
}
