/// Environment variable consulted when no key is entered by the user.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Picks the API credential: a non-blank user-entered key wins over the
/// environment.
pub fn resolve_api_key(user_input: Option<&str>) -> Option<String> {
    pick_api_key(user_input, std::env::var(API_KEY_ENV).ok().as_deref())
}

pub fn pick_api_key(user_input: Option<&str>, env_value: Option<&str>) -> Option<String> {
    [user_input, env_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}
