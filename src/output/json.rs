use anyhow::Result;
use serde::Serialize;

use crate::allocation::Banner;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Serialize)]
struct WithBanner<'a, T: ?Sized> {
    data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<&'a str>,
}

pub fn render_json_with_banner<T>(value: &T, banner: &Banner) -> Result<String>
where
    T: Serialize + ?Sized,
{
    render_json(&WithBanner {
        data: value,
        error: banner.error.as_deref(),
        success: banner.success.as_deref(),
    })
}
