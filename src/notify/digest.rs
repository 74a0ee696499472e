// src/notify/digest.rs
// Plain-text digest rendering: one greeting, one block per source in
// processing order, one bullet per newly discovered title.

use super::RecipientDigest;

pub fn render_digest(digest: &RecipientDigest, signoff: &str) -> String {
    let mut body = format!(
        "Hi {},\n\nHere are your new job opportunities:\n",
        digest.name
    );

    for (source_name, items) in &digest.sources {
        body.push_str(&format!("\n{} ({}):\n", source_name, items.url));
        for title in &items.titles {
            body.push_str(&format!("  - {title}\n"));
        }
    }

    body.push('\n');
    body.push_str(signoff);
    body.push('\n');
    body
}
