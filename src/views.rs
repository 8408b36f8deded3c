use std::fmt::Write;

use crate::{
    entry::{Entry, Player},
    services::Totals,
};

pub const TITLE: &str = "Ramin Gin Count";

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn score_cell(entry: &Entry, player: Player) -> String {
    let points = match player {
        Player::Kaille => entry.kaille,
        Player::Francis => entry.francis,
    };
    if entry.scorer() == Some(player) {
        format!("<td class=\"scorer\">{points}</td>")
    } else {
        "<td></td>".to_string()
    }
}

/// Full index page: totals, add form, rounds newest first.
pub fn render_index(entries: &[Entry], totals: &Totals, token: &str, warning: Option<&str>) -> String {
    let token = escape(token);
    let mut rows = String::new();
    for entry in entries.iter().rev() {
        let delete = match &entry.id {
            Some(id) => format!(
                r#"<button type="button" class="delete" data-id="{}">✕</button>"#,
                escape(id)
            ),
            None => String::new(),
        };
        let _ = writeln!(
            rows,
            "<tr><td>{}</td>{}{}<td>{}</td></tr>",
            entry.timestamp.format("%d/%m/%Y"),
            score_cell(entry, Player::Kaille),
            score_cell(entry, Player::Francis),
            delete
        );
    }
    if entries.is_empty() {
        rows.push_str("<tr><td colspan=\"4\">No rounds yet</td></tr>\n");
    }

    let banner = warning
        .map(|w| format!("<p class=\"warning\">{}</p>\n", escape(w)))
        .unwrap_or_default();
    let leader = match totals.leader() {
        Some(p) => format!("{} leads", p.name()),
        None => "Tied".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="csrf-token" content="{token}">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
{banner}<table class="totals">
<tr><th>Kaille</th><th>Francis</th></tr>
<tr><td>{kaille}</td><td>{francis}</td></tr>
</table>
<p class="leader">{leader}</p>
<form method="post" action="/add">
<input type="hidden" name="_csrf" value="{token}">
<select name="player"><option value="Kaille">Kaille</option><option value="Francis">Francis</option></select>
<input type="number" name="points" min="0" required>
<button type="submit">Add</button>
</form>
<table class="rounds">
<tr><th>Date</th><th>Kaille</th><th>Francis</th><th></th></tr>
{rows}</table>
<form method="post" action="/wipe" onsubmit="return confirm('Wipe every round?');">
<input type="hidden" name="_csrf" value="{token}">
<button type="submit">Wipe</button>
</form>
<script>
document.querySelectorAll('button.delete').forEach(function (b) {{
  b.addEventListener('click', function () {{
    fetch('/api/delete/' + encodeURIComponent(b.dataset.id), {{
      method: 'DELETE',
      headers: {{ 'X-CSRF-Token': '{token}' }}
    }}).then(function () {{ location.reload(); }});
  }});
}});
</script>
</body>
</html>
"#,
        title = TITLE,
        kaille = totals.kaille,
        francis = totals.francis,
    )
}
