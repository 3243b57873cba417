//! New-hire notice.

use super::Template;
use super::html::escape_multiline;
use super::layout::{date_or_na, document, fields_table, or_na, present};
use crate::domain::OnboardingNotice;

impl Template for OnboardingNotice {
    fn subject(&self) -> String {
        match present(&self.employee.employee_name) {
            Some(name) => format!("New employee: {name}"),
            None => "New employee onboarding".to_string(),
        }
    }

    fn html(&self) -> String {
        let e = &self.employee;
        let mut body = String::from(
            "<p>A new colleague is joining the company. Please prepare their onboarding.</p>\n",
        );
        body.push_str(&fields_table(&[
            ("Name", or_na(e.employee_name.as_deref())),
            ("Position", or_na(e.position.as_deref())),
            ("Department", or_na(e.department.as_deref())),
            ("Start date", date_or_na(self.start_date)),
        ]));
        if let Some(content) = present(&self.content) {
            body.push_str(&format!("\n<p>{}</p>", escape_multiline(content)));
        }
        document("New employee onboarding", &body)
    }
}
