/// Placeholder in the bridge page replaced with the session token when served.
const SESSION_TOKEN_PLACEHOLDER: &str = "__DPAY_SESSION_TOKEN__";

const INDEX_HTML: &str = include_str!("app/index.html");

pub(crate) fn render_index(session_token: &str) -> String {
    INDEX_HTML.replace(SESSION_TOKEN_PLACEHOLDER, session_token)
}
