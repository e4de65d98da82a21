use anyhow::{bail, Context, Result};
use reqwest::Url;

pub const GIST_QUERY_PARAM: &str = "gist";

/// Extracts a gist id from a bare id, a page URL carrying `?gist=<id>`, or a
/// `gist.github.com/<user>/<id>` link.
pub fn gist_id_from_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("gist reference must not be empty");
    }

    if !trimmed.contains("://") {
        if let Some(query) = trimmed.strip_prefix('?') {
            return id_from_query(query)
                .ok_or_else(|| anyhow::anyhow!("query '{trimmed}' has no gist parameter"));
        }
        if trimmed.contains('/') {
            bail!("unable to extract gist id from '{trimmed}'");
        }
        return Ok(trimmed.to_string());
    }

    let url = Url::parse(trimmed).with_context(|| format!("parsing gist url '{trimmed}'"))?;
    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == GIST_QUERY_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
    {
        return Ok(id);
    }

    if url.host_str() == Some("gist.github.com") {
        let id_candidate = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .map(|segment| segment.to_string());
        if let Some(id) = id_candidate {
            return Ok(id);
        }
    }

    bail!("unable to extract gist id from url '{trimmed}'")
}

fn id_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == GIST_QUERY_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Page URL that reopens the given gist on entry.
pub fn share_url(base: &str, gist_id: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("parsing share base '{base}'"))?;
    url.query_pairs_mut()
        .clear()
        .append_pair(GIST_QUERY_PARAM, gist_id);
    Ok(url)
}
