//! services/auth_service.rs
//! Extracción de la API key del header Authorization.

/// "Bearer abc" -> "abc". Sin prefijo se usa el valor tal cual.
pub fn parse_api_key(authorization: &str) -> String {
    let trimmed = authorization.trim();
    match trimmed.split_once(' ') {
        Some((scheme, key)) if scheme.eq_ignore_ascii_case("bearer") => key.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Key del cliente si vino en el header; si no, la del servidor (OPENAI_API_KEY).
pub fn resolve_auth(authorization: Option<&str>, server_key: Option<&str>) -> Option<String> {
    authorization
        .map(parse_api_key)
        .filter(|key| !key.is_empty())
        .or_else(|| server_key.map(str::to_string))
}
