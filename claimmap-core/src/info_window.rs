//! Info window markup shown when a claim marker is clicked.

use crate::config::InfoWindowConfig;
use std::borrow::Cow;

/// Formatter for the marker description.
pub struct InfoWindow;

impl InfoWindow {
    /// Render the description of a claim owned by `owner`.
    ///
    /// Non-admin claims embed the owner's avatar. The URL is only emitted,
    /// never fetched.
    pub fn render(owner: &str, is_admin: bool, config: &InfoWindowConfig) -> String {
        let header = if config.escape_owner {
            escape_html(owner)
        } else {
            Cow::Borrowed(owner)
        };

        let mut html = String::with_capacity(160 + owner.len() * 2);
        html.push_str("<div class=\"regioninfo\"><center><div class=\"infowindow\">");
        html.push_str("<span style=\"font-weight:bold;\">");
        html.push_str(&header);
        html.push_str("'s claim</span><br/>");
        if !is_admin {
            html.push_str("<img src='");
            html.push_str(&Self::avatar_url(owner, config));
            html.push_str("' />");
        }
        html.push_str("</div></center></div>");
        html
    }

    pub fn avatar_url(owner: &str, config: &InfoWindowConfig) -> String {
        let owner = if config.escape_owner {
            urlencoding::encode(owner)
        } else {
            Cow::Borrowed(owner)
        };
        config.avatar_url_template.replace("{owner}", &owner)
    }
}

fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
