//! Email bodies. HTML is authoritative; the plain-text part is derived from it.

use html_escape::encode_text;

use super::email::EmailMessage;
use crate::constants::email::DESCRIPTION_EXCERPT_CHARS;
use crate::models::{Issue, User};

const TEXT_WIDTH: usize = 78;

fn render(to: &str, subject: String, html: String) -> EmailMessage {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH).unwrap_or_else(|_| html.clone());
    EmailMessage {
        to: to.to_string(),
        subject,
        text,
        html,
    }
}

/// First `DESCRIPTION_EXCERPT_CHARS` characters, with an ellipsis when cut.
#[must_use]
pub fn excerpt(description: &str) -> String {
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[must_use]
pub fn issue_link(base_url: &str, issue: &Issue) -> String {
    format!("{}/issues/{}", base_url.trim_end_matches('/'), issue.id)
}

/// `action` is the human-readable change, e.g. "created" or "status changed to DONE".
#[must_use]
pub fn issue_notification(to: &str, issue: &Issue, action: &str, base_url: &str) -> EmailMessage {
    let subject = format!("Issue {}: {}", capitalize(action), issue.title);
    let link = issue_link(base_url, issue);

    let html = format!(
        "<h2>Issue {action}</h2>\
         <p><strong>{title}</strong></p>\
         <p>Severity: {severity}<br>Status: {status}<br>Reported by: {reporter}</p>\
         <p>{description}</p>\
         <p><a href=\"{link}\">{link}</a></p>",
        action = encode_text(action),
        title = encode_text(&issue.title),
        severity = issue.severity,
        status = issue.status,
        reporter = encode_text(&issue.reporter.name),
        description = encode_text(&excerpt(&issue.description)),
        link = encode_text(&link),
    );

    render(to, subject, html)
}

#[must_use]
pub fn welcome(user: &User, base_url: &str) -> EmailMessage {
    let html = format!(
        "<h2>Welcome, {name}</h2>\
         <p>Your account has been created with the role {role}.</p>\
         <p><a href=\"{base}\">{base}</a></p>",
        name = encode_text(&user.name),
        role = user.role,
        base = encode_text(base_url),
    );

    render(&user.email, "Welcome to Bugdesk".to_string(), html)
}

/// Uses `html` verbatim when given; otherwise paragraphs of `body` are escaped.
#[must_use]
pub fn bulk(to: &str, subject: &str, body: &str, html: Option<&str>) -> EmailMessage {
    if let Some(html) = html {
        return EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            text: body.to_string(),
            html: html.to_string(),
        };
    }

    let paragraphs: String = body
        .split("\n\n")
        .map(|p| format!("<p>{}</p>", encode_text(p)))
        .collect();

    render(to, subject.to_string(), paragraphs)
}

#[must_use]
pub fn test_message(to: &str) -> EmailMessage {
    render(
        to,
        "Bugdesk test email".to_string(),
        "<p>Email delivery is configured correctly.</p>".to_string(),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueId, IssueStatus, Role, Severity, UserId};

    fn sample_issue(description: &str) -> Issue {
        let reporter = User {
            id: UserId::new(1),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            role: Role::Reporter,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        };
        Issue {
            id: IssueId::new(42),
            title: "Login <broken>".to_string(),
            description: description.to_string(),
            severity: Severity::High,
            status: IssueStatus::Done,
            reporter_id: reporter.id,
            assignee_id: None,
            tags: vec![],
            created_at: String::new(),
            updated_at: String::new(),
            reporter,
            assignee: None,
            files: vec![],
        }
    }

    #[test]
    fn subject_and_link_follow_the_issue() {
        let issue = sample_issue("short");
        let msg = issue_notification(
            "bob@example.com",
            &issue,
            "status changed to DONE",
            "https://bugs.example.com/",
        );

        assert_eq!(msg.subject, "Issue Status changed to DONE: Login <broken>");
        assert!(msg.html.contains("https://bugs.example.com/issues/42"));
        assert!(msg.html.contains("Login &lt;broken&gt;"));
        assert_eq!(msg.to, "bob@example.com");
    }

    #[test]
    fn long_descriptions_are_cut() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), DESCRIPTION_EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn plain_text_part_is_present() {
        let msg = bulk("a@example.com", "Maintenance", "Tonight.\n\nSorry.", None);
        assert!(msg.text.contains("Tonight."));
        assert_eq!(msg.html, "<p>Tonight.</p><p>Sorry.</p>");

        let custom = bulk("a@example.com", "Maintenance", "plain", Some("<b>rich</b>"));
        assert_eq!(custom.text, "plain");
        assert_eq!(custom.html, "<b>rich</b>");
    }
}
