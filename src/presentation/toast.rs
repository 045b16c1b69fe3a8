use askama::Template;

#[derive(Clone)]
pub struct ToastItem {
    pub id: String,
    pub kind: &'static str,
    pub text: String,
    pub ttl_ms: u64,
    pub background: &'static str,
    pub color: &'static str,
    pub hiding: bool,
}

#[derive(Template)]
#[template(path = "toast_stack.html")]
pub struct ToastStackTemplate {
    pub toasts: Vec<ToastItem>,
}
