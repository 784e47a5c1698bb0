//! localStorage memory of the last opened project/workflow, restored on the
//! next page load.

use wasm_bindgen::JsValue;
use web_sys::Storage;

const LAST_PROJECT_KEY: &str = "lastProject";
const LAST_WORKFLOW_KEY: &str = "lastWorkflow";

fn local_storage() -> Result<Storage, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no global window exists"))?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("no local storage exists"))
}

pub fn remember_last_workflow(project: &str, workflow: &str) -> Result<(), JsValue> {
    let storage = local_storage()?;
    storage.set_item(LAST_PROJECT_KEY, project)?;
    storage.set_item(LAST_WORKFLOW_KEY, workflow)?;
    Ok(())
}

/// The `(project, workflow)` pair remembered by a previous session, if any.
pub fn last_workflow() -> Option<(String, String)> {
    let storage = local_storage().ok()?;
    let project = storage.get_item(LAST_PROJECT_KEY).ok()??;
    let workflow = storage.get_item(LAST_WORKFLOW_KEY).ok()??;
    Some((project, workflow))
}

pub fn forget_last_workflow() {
    if let Ok(storage) = local_storage() {
        let _ = storage.remove_item(LAST_PROJECT_KEY);
        let _ = storage.remove_item(LAST_WORKFLOW_KEY);
    }
}
