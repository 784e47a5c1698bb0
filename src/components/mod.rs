pub mod canvas_editor;
pub mod context_menu;
pub mod library;
pub mod log_panel;
pub mod node_view;
pub mod project_browser;
pub mod wire_view;
