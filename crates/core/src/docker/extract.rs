const FENCE: &str = "```";

/// Strip a markdown code fence wrapped around a model response.
///
/// Only a response that *starts* with a fence is touched: the body runs from
/// the first line break after the opening fence to the last fence in the
/// text. Anything that does not have both boundaries in that order is
/// returned unchanged.
pub fn strip_code_fence(response: &str) -> String {
    if !response.starts_with(FENCE) || !response[FENCE.len()..].contains(FENCE) {
        return response.to_string();
    }

    let Some(body_start) = response[FENCE.len()..]
        .find('\n')
        .map(|pos| pos + FENCE.len() + 1)
    else {
        return response.to_string();
    };

    match response.rfind(FENCE) {
        Some(body_end) if body_end >= body_start => response[body_start..body_end].trim().to_string(),
        _ => response.to_string(),
    }
}
