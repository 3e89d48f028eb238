#[cfg(test)]
mod tests {
    use crate::services::auth_service::{parse_api_key, resolve_auth};

    #[test]
    fn test_parse_api_key() {
        assert_eq!(parse_api_key("Bearer balahbalah"), "balahbalah");
        assert_eq!(parse_api_key("  bearer   abc  "), "abc");
        assert_eq!(parse_api_key("sk-plain"), "sk-plain");
    }

    #[test]
    fn test_resolve_auth_prefers_header() {
        let auth = resolve_auth(Some("Bearer client-key"), Some("server-key"));
        assert_eq!(auth.as_deref(), Some("client-key"));
    }

    #[test]
    fn test_resolve_auth_falls_back_to_server_key() {
        assert_eq!(
            resolve_auth(Some("Bearer "), Some("server-key")).as_deref(),
            Some("server-key")
        );
        assert_eq!(resolve_auth(None, Some("server-key")).as_deref(), Some("server-key"));
        assert_eq!(resolve_auth(None, None), None);
    }
}
