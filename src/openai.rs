use crate::generation::GenerationError;

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

pub fn request_body(model: &str, input: &str, temperature: f32) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "input": input,
        "text": { "format": { "type": "text" } },
        "store": false,
    });

    // NOTE: Some GPT-5 models reject sampling params like `temperature`.
    // Keep compatibility by omitting it for the GPT-5 family by default.
    if !model.starts_with("gpt-5")
        && let Some(obj) = body.as_object_mut()
    {
        obj.insert("temperature".to_owned(), serde_json::json!(temperature));
    }
    body
}

/// Posts a Responses API request and returns the raw JSON body.
pub async fn post_responses(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, GenerationError> {
    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|err| GenerationError::transport(format!("POST {endpoint}: {err}")))?;

    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|err| GenerationError::transport(format!("read response body: {err}")))?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or(raw);
        return Err(GenerationError::transport(format!(
            "provider error ({status}): {message}"
        )));
    }

    serde_json::from_str(&raw)
        .map_err(|err| GenerationError::transport(format!("parse provider response: {err}")))
}

pub async fn responses_text(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    input: &str,
    temperature: f32,
) -> Result<String, GenerationError> {
    let body = request_body(model, input, temperature);
    let value = post_responses(client, endpoint, api_key, &body).await?;
    extract_output_text(&value)
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

/// Pulls the concatenated `output_text` parts out of a response, detecting rejections.
pub fn extract_output_text(value: &serde_json::Value) -> Result<String, GenerationError> {
    if value.get("status").and_then(|v| v.as_str()) == Some("incomplete") {
        let reason = value
            .pointer("/incomplete_details/reason")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        if reason == "content_filter" {
            return Err(GenerationError::Rejected {
                reason: reason.to_owned(),
            });
        }
    }

    let output = value
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| GenerationError::transport("missing `output` array in response"))?;

    let mut text = String::new();
    for item in output {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let content = match item.get("content").and_then(|v| v.as_array()) {
            Some(content) => content,
            None => continue,
        };
        for part in content {
            match part.get("type").and_then(|v| v.as_str()) {
                Some("output_text") => {
                    if let Some(part_text) = part.get("text").and_then(|v| v.as_str()) {
                        text.push_str(part_text);
                    }
                }
                Some("refusal") => {
                    let reason = part
                        .get("refusal")
                        .and_then(|v| v.as_str())
                        .unwrap_or("refused")
                        .to_owned();
                    return Err(GenerationError::Rejected { reason });
                }
                _ => {}
            }
        }
    }

    if text.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text)
}
