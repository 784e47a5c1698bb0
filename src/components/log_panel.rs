//! Scrollable diagnostics drawer fed by the `/api/logs` stream.

use web_sys::Element;

use crate::dom_utils;

const MAX_LINES: u32 = 200;

fn panel() -> Option<Element> {
    dom_utils::get_element("log-panel").ok()
}

pub fn append_line(line: &str) {
    let panel = match panel() {
        Some(el) => el,
        None => return,
    };
    let document = match dom_utils::document() {
        Ok(d) => d,
        Err(_) => return,
    };
    if let Ok(entry) = dom_utils::create_in(&document, &panel, "div", "log-line") {
        // Backend lines carry no timestamp; stamp them on arrival.
        let stamp = String::from(js_sys::Date::new_0().to_locale_time_string("en-US"));
        entry.set_text_content(Some(&format!("[{}] {}", stamp, line)));
    }
    // Keep the panel bounded.
    while panel.child_element_count() > MAX_LINES {
        if let Some(first) = panel.first_element_child() {
            dom_utils::remove_element(&first);
        } else {
            break;
        }
    }
    panel.set_scroll_top(panel.scroll_height());
}
