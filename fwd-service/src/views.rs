//! HTML pages and JSON bodies served for namespace entities.

use fwd_core::{Entity, EntityKind, ForwardingEntry};
use serde_json::{json, Value};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        head,
        body
    )
}

fn description(entry: &ForwardingEntry) -> String {
    entry
        .description
        .as_deref()
        .map(|d| format!("<p class=\"description\">{}</p>\n", escape(d)))
        .unwrap_or_default()
}

/// Interstitial that follows through to `target_url` after `delay_secs`.
pub fn interstitial(entry: &ForwardingEntry, target_url: &str, delay_secs: u64) -> String {
    let url = escape(target_url);
    let target = escape(entry.target_name.as_deref().unwrap_or_default());
    let head = format!("<meta http-equiv=\"refresh\" content=\"{delay_secs}; url={url}\">\n");
    let body = format!(
        "<h1>{}</h1>\n{}<p>This item forwards to <b>{}</b>.</p>\n<p>You will be redirected in {} seconds. <a id=\"forward\" href=\"{}\">Continue now</a>.</p>\n",
        escape(&entry.display_name()),
        description(entry),
        target,
        delay_secs,
        url
    );
    page(&entry.display_name(), &head, &body)
}

/// Prompt shown while the entry has no usable target.
pub fn not_configured(entry: &ForwardingEntry, target_exists: bool) -> String {
    let status = match entry.target_name.as_deref() {
        None => "This forwarder has not been configured yet.".to_string(),
        Some(target) if !target_exists => format!(
            "The forwarded item <b>{}</b> no longer exists.",
            escape(target)
        ),
        Some(target) => format!(
            "The forwarding chain starting at <b>{}</b> does not end at an existing item.",
            escape(target)
        ),
    };
    let body = format!(
        "<h1>{}</h1>\n{}<p>{}</p>\n<p>Submit a configuration to <code>configSubmit</code> to choose a target.</p>\n",
        escape(&entry.display_name()),
        description(entry),
        status
    );
    page(&entry.display_name(), "", &body)
}

/// Confirmation form for renaming an entry.
pub fn rename_confirmation(entry: &ForwardingEntry, new_name: &str) -> String {
    let body = format!(
        "<h1>Rename {}</h1>\n<p>Rename <b>{}</b> to <b>{}</b>?</p>\n<form method=\"post\" action=\"doRename\">\n<input type=\"hidden\" name=\"newName\" value=\"{}\">\n<button type=\"submit\">Rename</button>\n</form>\n",
        escape(&entry.display_name()),
        escape(&entry.name),
        escape(new_name),
        escape(new_name)
    );
    page(&format!("Rename {}", entry.display_name()), "", &body)
}

/// JSON description of an entity.
pub fn entity_json(entity: &Entity, target_exists: Option<bool>) -> Value {
    let mut value = json!({
        "name": entity.name(),
        "fullName": entity.full_name,
        "url": entity.url,
        "kind": entity.kind_label(),
    });
    if let EntityKind::Forwarding(entry) = &entity.kind {
        value["displayName"] = json!(entry.display_name());
        value["referredItemName"] = json!(entry.target_name);
        value["forwardImmediately"] = json!(entry.forward_immediately);
        value["description"] = json!(entry.description);
        if let Some(exists) = target_exists {
            value["referredItemExists"] = json!(exists);
        }
    }
    value
}

/// JSON listing of a group and its children.
pub fn group_json(group: &Entity, children: &[Entity]) -> Value {
    let mut value = entity_json(group, None);
    value["items"] = children.iter().map(|child| entity_json(child, None)).collect();
    value
}
