//! Fetch-based REST client for the editor backend: node catalog, workflow
//! execution and project/workflow persistence.
//!
//! Typed endpoints decode the JS response value with `serde_wasm_bindgen`;
//! errors carry the HTTP status or the server's error message.

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::api_url;
use crate::models::{
    ExecuteResponse, ExecutionPayload, GraphSnapshot, NodeTypeDef, ProjectInfo,
};

/// Decode a fetched JS value into a model type.
pub(crate) fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

pub struct ApiClient;

impl ApiClient {
    // ---------------- Catalog ----------------

    pub async fn fetch_catalog() -> Result<Vec<NodeTypeDef>, JsValue> {
        decode(Self::fetch_value(&api_url("/nodes"), "GET", None).await?)
    }

    // ---------------- Execution ----------------

    pub async fn execute_workflow(payload: &ExecutionPayload) -> Result<ExecuteResponse, JsValue> {
        let body =
            serde_json::to_string(payload).map_err(|e| JsValue::from_str(&e.to_string()))?;
        decode(Self::fetch_value(&api_url("/execute"), "POST", Some(&body)).await?)
    }

    // ---------------- Projects ----------------

    pub async fn fetch_projects() -> Result<Vec<ProjectInfo>, JsValue> {
        decode(Self::fetch_value(&api_url("/projects"), "GET", None).await?)
    }

    pub async fn create_project(name: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({ "name": name }).to_string();
        Self::fetch_response(&api_url("/projects"), "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn duplicate_project(source: &str, target: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({
            "sourceProject": source,
            "targetProject": target,
        })
        .to_string();
        Self::fetch_response(&api_url("/projects/duplicate"), "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn delete_project(project: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({ "project": project }).to_string();
        Self::fetch_response(&api_url("/projects/delete"), "DELETE", Some(&body)).await?;
        Ok(())
    }

    pub async fn rename_project(old_name: &str, new_name: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({
            "oldName": old_name,
            "newName": new_name,
        })
        .to_string();
        Self::fetch_response(&api_url("/projects/rename"), "PUT", Some(&body)).await?;
        Ok(())
    }

    // ---------------- Workflows ----------------

    pub async fn create_workflow(project: &str, name: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({ "project": project, "name": name }).to_string();
        Self::fetch_response(&api_url("/workflows"), "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn save_workflow(
        project: &str,
        workflow: &str,
        data: &GraphSnapshot,
    ) -> Result<(), JsValue> {
        let body = serde_json::json!({
            "project": project,
            "workflow": workflow,
            "data": data,
        })
        .to_string();
        Self::fetch_response(&api_url("/workflows/save"), "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn load_workflow(project: &str, workflow: &str) -> Result<GraphSnapshot, JsValue> {
        let url = api_url(&format!("/workflows/{}/{}", project, workflow));
        decode(Self::fetch_value(&url, "GET", None).await?)
    }

    pub async fn duplicate_workflow(
        project: &str,
        source: &str,
        target: &str,
    ) -> Result<(), JsValue> {
        let body = serde_json::json!({
            "project": project,
            "sourceWorkflow": source,
            "targetWorkflow": target,
        })
        .to_string();
        Self::fetch_response(&api_url("/workflows/duplicate"), "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn delete_workflow(project: &str, workflow: &str) -> Result<(), JsValue> {
        let body = serde_json::json!({ "project": project, "workflow": workflow }).to_string();
        Self::fetch_response(&api_url("/workflows/delete"), "DELETE", Some(&body)).await?;
        Ok(())
    }

    pub async fn rename_workflow(
        project: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), JsValue> {
        let body = serde_json::json!({
            "project": project,
            "oldName": old_name,
            "newName": new_name,
        })
        .to_string();
        Self::fetch_response(&api_url("/workflows/rename"), "PUT", Some(&body)).await?;
        Ok(())
    }

    // ---------------- Shared fetch helpers ----------------

    async fn fetch_value(url: &str, method: &str, body: Option<&str>) -> Result<JsValue, JsValue> {
        let resp = Self::fetch_response(url, method, body).await?;
        JsFuture::from(resp.json()?).await
    }

    async fn fetch_response(
        url: &str,
        method: &str,
        body: Option<&str>,
    ) -> Result<Response, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::SameOrigin);

        let headers = Headers::new()?;
        if let Some(data) = body {
            opts.set_body(&JsValue::from_str(data));
            headers.append("Content-Type", "application/json")?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &opts)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            // Servers answer errors as {"error": "..."}; surface the message.
            let text = JsFuture::from(resp.text()?).await?;
            let text = text.as_string().unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| format!("{} {}", resp.status(), resp.status_text()));
            return Err(JsValue::from_str(&detail));
        }
        Ok(resp)
    }
}
