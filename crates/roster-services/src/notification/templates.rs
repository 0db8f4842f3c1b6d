//! Message bodies for applicant and member notifications.

use super::Notification;

/// Everything the credential notification carries.
pub struct CredentialNotice<'a> {
    pub organization: &'a str,
    pub portal_url: Option<&'a str>,
    pub name: &'a str,
    pub email: &'a str,
    pub member_id: &'a str,
    pub unique_id: &'a str,
    pub password: &'a str,
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn credentials_email(notice: &CredentialNotice<'_>) -> Notification {
    let login_line = notice
        .portal_url
        .map(|url| format!("Sign in at: {}\n", url))
        .unwrap_or_default();

    let text = format!(
        "Dear {name},\n\n\
         Your {org} membership has been approved.\n\n\
         Member ID: {member_id}\n\
         Unique ID: {unique_id}\n\
         Username: {email}\n\
         Password: {password}\n\n\
         {login_line}\
         Please change your password after your first login.\n\n\
         {org}",
        name = notice.name,
        org = notice.organization,
        member_id = notice.member_id,
        unique_id = notice.unique_id,
        email = notice.email,
        password = notice.password,
        login_line = login_line,
    );

    let login_html = notice
        .portal_url
        .map(|url| {
            format!(
                "<p><a href=\"{url}\">Sign in to the member portal</a></p>",
                url = escape_html(url)
            )
        })
        .unwrap_or_default();

    let html = format!(
        "<p>Dear {name},</p>\
         <p>Your {org} membership has been approved.</p>\
         <table>\
         <tr><td>Member ID</td><td><strong>{member_id}</strong></td></tr>\
         <tr><td>Unique ID</td><td><strong>{unique_id}</strong></td></tr>\
         <tr><td>Username</td><td>{email}</td></tr>\
         <tr><td>Password</td><td><code>{password}</code></td></tr>\
         </table>\
         {login_html}\
         <p>Please change your password after your first login.</p>",
        name = escape_html(notice.name),
        org = escape_html(notice.organization),
        member_id = escape_html(notice.member_id),
        unique_id = escape_html(notice.unique_id),
        email = escape_html(notice.email),
        password = escape_html(notice.password),
        login_html = login_html,
    );

    Notification {
        to: notice.email.to_string(),
        subject: format!("Your {} Membership Credentials", notice.organization),
        text,
        html: Some(html),
    }
}

pub fn thank_you_email(organization: &str, name: &str, email: &str) -> Notification {
    let text = format!(
        "Dear {name},\n\n\
         Thank you for applying for {org} membership. \
         We have received your registration and will review it shortly.\n\n\
         {org}",
        name = name,
        org = organization,
    );
    let html = format!(
        "<p>Dear {name},</p>\
         <p>Thank you for applying for {org} membership. \
         We have received your registration and will review it shortly.</p>",
        name = escape_html(name),
        org = escape_html(organization),
    );

    Notification {
        to: email.to_string(),
        subject: format!("Thank you for registering with {}", organization),
        text,
        html: Some(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_email_carries_identifiers_and_password() {
        let notification = credentials_email(&CredentialNotice {
            organization: "Roster",
            portal_url: Some("https://members.example.com/login"),
            name: "Ada <script>",
            email: "ada@x.com",
            member_id: "I10000",
            unique_id: "10001",
            password: "Abc123XyZ9",
        });

        assert_eq!(notification.to, "ada@x.com");
        assert_eq!(notification.subject, "Your Roster Membership Credentials");
        for part in ["I10000", "10001", "ada@x.com", "Abc123XyZ9", "change your password"] {
            assert!(notification.text.contains(part), "text missing {}", part);
        }
        let html = notification.html.unwrap();
        assert!(html.contains("Ada &lt;script&gt;"));
        assert!(html.contains("https://members.example.com/login"));
    }

    #[test]
    fn test_thank_you_email() {
        let notification = thank_you_email("Roster", "Ada", "ada@x.com");
        assert_eq!(notification.to, "ada@x.com");
        assert!(notification.text.contains("Dear Ada"));
    }
}
