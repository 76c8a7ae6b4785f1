//! Server-rendered HTML views
//!
//! Plain string templates; every user-supplied value goes through
//! [`escape`] before interpolation.

use trk_auth::StashedTokens;
use trk_db::{CommentWithAuthor, IssueWithAuthor, TeamMembership};
use trk_models::IssueStatus;

/// HTML-escape a user-supplied value
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{} - Tracker</title>
</head>
<body>
<main>
{}
</main>
</body>
</html>"#,
        escape(title),
        body
    )
}

fn flash(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(r#"<p class="flash">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

pub fn login_page(message: Option<&str>) -> String {
    let body = format!(
        r#"{}
<h1>Sign in</h1>
<form method="post" action="/">
  <input type="email" name="email" placeholder="Email" required>
  <input type="password" name="password" placeholder="Password" required>
  <button type="submit">Sign in</button>
</form>
<p><a href="/login/google">Sign in with Google</a></p>
<p><a href="/register">Create an account</a></p>"#,
        flash(message)
    );
    layout("Sign in", &body)
}

pub fn register_page(message: Option<&str>) -> String {
    let body = format!(
        r#"{}
<h1>Create an account</h1>
<form method="post" action="/register">
  <input type="text" name="username" placeholder="Username" required>
  <input type="email" name="email" placeholder="Email" required>
  <input type="password" name="password" placeholder="Password" required>
  <button type="submit">Register</button>
</form>
<p><a href="/">Back to sign in</a></p>"#,
        flash(message)
    );
    layout("Register", &body)
}

pub fn teams_page(
    teams: &[TeamMembership],
    api_tokens: Option<&StashedTokens>,
    message: Option<&str>,
) -> String {
    let mut rows = String::new();
    for team in teams {
        rows.push_str(&format!(
            r#"<li><a href="/teams/{}/dashboard">{}</a> ({}) - invite code: <code>{}</code></li>
"#,
            team.team_id,
            escape(&team.name),
            escape(&team.role),
            escape(&team.invite_code),
        ));
    }
    if rows.is_empty() {
        rows.push_str("<li>No teams yet.</li>\n");
    }

    // development convenience: the pair minted on the OAuth path
    let tokens_section = match api_tokens {
        Some(tokens) => format!(
            r#"<section>
<h2>API tokens (development)</h2>
<p>Issued for this session; treat them as secrets.</p>
<p>Access: <code>{}</code></p>
<p>Refresh: <code>{}</code></p>
</section>
"#,
            escape(&tokens.access_token),
            escape(&tokens.refresh_token),
        ),
        None => String::new(),
    };

    let body = format!(
        r#"{}
<h1>Your teams</h1>
<ul>
{}</ul>
{}<p><a href="/team/create">Create a team</a> | <a href="/team/join">Join a team</a> | <a href="/logout">Sign out</a></p>"#,
        flash(message),
        rows,
        tokens_section
    );
    layout("Teams", &body)
}

pub fn team_create_page(message: Option<&str>) -> String {
    let body = format!(
        r#"{}
<h1>Create a team</h1>
<form method="post" action="/team/create">
  <input type="text" name="name" placeholder="Team name" required>
  <button type="submit">Create</button>
</form>
<p><a href="/teams">Back to teams</a></p>"#,
        flash(message)
    );
    layout("Create team", &body)
}

pub fn team_join_page(message: Option<&str>) -> String {
    let body = format!(
        r#"{}
<h1>Join a team</h1>
<form method="post" action="/team/join">
  <input type="text" name="invite_code" placeholder="Invite code" required>
  <button type="submit">Join</button>
</form>
<p><a href="/teams">Back to teams</a></p>"#,
        flash(message)
    );
    layout("Join team", &body)
}

pub fn dashboard_page(team_name: &str, issues: &[IssueWithAuthor]) -> String {
    let mut rows = String::new();
    for issue in issues {
        rows.push_str(&format!(
            r#"<tr>
  <td><a href="/issue/{}">{}</a></td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
</tr>
"#,
            issue.id,
            escape(&issue.title),
            escape(&issue.status),
            escape(issue.username.as_deref().unwrap_or("unknown")),
            issue.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="4">No issues yet.</td></tr>"#);
    }

    let body = format!(
        r#"<h1>{}</h1>
<p><a href="/issue/create">New issue</a> | <a href="/teams">All teams</a></p>
<table>
<tr><th>Title</th><th>Status</th><th>Author</th><th>Created</th></tr>
{}</table>"#,
        escape(team_name),
        rows
    );
    layout(team_name, &body)
}

pub fn issue_detail_page(issue: &IssueWithAuthor, comments: &[CommentWithAuthor]) -> String {
    let status = IssueStatus::parse(&issue.status);
    let mut comment_rows = String::new();
    for comment in comments {
        comment_rows.push_str(&format!(
            r#"<li><strong>{}</strong>: {} <em>({})</em></li>
"#,
            escape(comment.username.as_deref().unwrap_or("unknown")),
            escape(&comment.content),
            comment.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    if comment_rows.is_empty() {
        comment_rows.push_str("<li>No comments yet.</li>\n");
    }

    let body = format!(
        r#"<h1>{}</h1>
<p>Status: {} | Author: {}</p>
<p>{}</p>
<form method="post" action="/issue/{}/toggle">
  <button type="submit">Mark as {}</button>
</form>
<h2>Comments</h2>
<ul>
{}</ul>
<form method="post" action="/issue/{}/comment">
  <textarea name="content" placeholder="Add a comment" required></textarea>
  <button type="submit">Comment</button>
</form>
<p><a href="/teams/{}/dashboard">Back to dashboard</a></p>"#,
        escape(&issue.title),
        escape(&issue.status),
        escape(issue.username.as_deref().unwrap_or("unknown")),
        escape(&issue.description),
        issue.id,
        status.next().as_str(),
        comment_rows,
        issue.id,
        issue.team_id,
    );
    layout(&issue.title, &body)
}

pub fn issue_create_page(message: Option<&str>) -> String {
    let body = format!(
        r#"{}
<h1>New issue</h1>
<form method="post" action="/issue/create">
  <input type="text" name="title" placeholder="Title" required>
  <textarea name="description" placeholder="Description"></textarea>
  <button type="submit">Create</button>
</form>
<p><a href="/teams">Back to teams</a></p>"#,
        flash(message)
    );
    layout("New issue", &body)
}

pub fn error_page(status: u16, message: &str) -> String {
    let body = format!(
        r#"<h1>{}</h1>
<p>{}</p>
<p><a href="/">Home</a></p>"#,
        status,
        escape(message)
    );
    layout("Error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_teams_page_shows_stashed_tokens() {
        let tokens = StashedTokens {
            access_token: "access.jwt".into(),
            refresh_token: "refresh.jwt".into(),
        };
        let html = teams_page(&[], Some(&tokens), None);
        assert!(html.contains("API tokens"));
        assert!(html.contains("access.jwt"));
        assert!(html.contains("refresh.jwt"));

        let html = teams_page(&[], None, None);
        assert!(!html.contains("API tokens"));
    }

    #[test]
    fn test_user_content_is_escaped_in_dashboard() {
        let issues = vec![IssueWithAuthor {
            id: 1,
            title: "<img src=x>".into(),
            description: String::new(),
            status: "open".into(),
            user_id: 1,
            team_id: 1,
            username: Some("mallory".into()),
            created_at: chrono::Utc::now(),
        }];
        let html = dashboard_page("Team", &issues);
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("&lt;img src=x&gt;"));
    }
}
