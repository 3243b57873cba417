//! Operator-written messages.

use super::Template;
use super::html::escape_multiline;
use super::layout::{document, or_na, present};
use crate::domain::ManualMessage;

pub(crate) const DEFAULT_SUBJECT: &str = "Notification";

impl Template for ManualMessage {
    fn subject(&self) -> String {
        present(&self.subject).unwrap_or(DEFAULT_SUBJECT).to_string()
    }

    fn html(&self) -> String {
        let body = match present(&self.content) {
            Some(content) => format!("<p>{}</p>", escape_multiline(content)),
            None => templated_body(self),
        };
        document(&self.subject(), &body)
    }
}

fn templated_body(message: &ManualMessage) -> String {
    let e = &message.employee;
    if present(&e.employee_name).is_none()
        && present(&e.position).is_none()
        && present(&e.department).is_none()
    {
        return "<p>No message content was provided.</p>".to_string();
    }
    format!(
        "<p>This notification concerns {} ({}, {}).</p>\n\
         <p>Please contact HR for details.</p>",
        or_na(e.employee_name.as_deref()),
        or_na(e.position.as_deref()),
        or_na(e.department.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmployeeFields;

    #[test]
    fn passes_subject_and_content_through() {
        let message = ManualMessage {
            subject: Some("Office closed Friday".into()),
            content: Some("The office is closed.\nEnjoy the long weekend.".into()),
            ..Default::default()
        };
        let email = message.render();
        assert_eq!(email.subject, "Office closed Friday");
        assert!(email.text.contains("The office is closed.\nEnjoy the long weekend."));
    }

    #[test]
    fn defaults_subject_and_builds_body_from_employee() {
        let message = ManualMessage {
            employee: EmployeeFields {
                employee_name: Some("Ana".into()),
                position: None,
                department: Some("Sales".into()),
            },
            ..Default::default()
        };
        let email = message.render();
        assert_eq!(email.subject, DEFAULT_SUBJECT);
        assert!(email.text.contains("concerns Ana (N/A, Sales)"));
    }

    #[test]
    fn empty_message_still_has_a_body() {
        let email = ManualMessage::default().render();
        assert!(email.text.contains("No message content was provided."));
    }
}
