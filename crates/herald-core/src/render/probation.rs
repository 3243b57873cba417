//! Probation deadline templates: the HR warning and the employee reminder
//! share one payload but differ in audience and tone.

use super::Template;
use super::layout::{date_or_na, document, fields_table, number_or_na, or_na, present};
use crate::domain::ProbationNotice;

pub(crate) struct Warning<'a>(pub &'a ProbationNotice);

pub(crate) struct Reminder<'a>(pub &'a ProbationNotice);

impl Template for Warning<'_> {
    fn subject(&self) -> String {
        let n = self.0;
        match (present(&n.employee.employee_name), n.days_remaining) {
            (Some(name), Some(days)) => {
                format!("Probation ending: {name} ({days} days remaining)")
            }
            (Some(name), None) => format!("Probation ending: {name}"),
            (None, _) => "Probation period ending".to_string(),
        }
    }

    fn html(&self) -> String {
        let n = self.0;
        let mut body = String::from(
            "<p>The probation period of the following employee is coming to an end.</p>\n",
        );
        body.push_str(&fields_table(&[
            ("Name", or_na(n.employee.employee_name.as_deref())),
            ("Position", or_na(n.employee.position.as_deref())),
            ("Department", or_na(n.employee.department.as_deref())),
            ("Days remaining", number_or_na(n.days_remaining)),
            ("Probation ends", date_or_na(n.probation_end_date)),
        ]));
        body.push_str(
            "\n<p>Before the deadline:</p>\n<ul>\
             <li>Schedule the probation review meeting</li>\
             <li>Collect feedback from the team lead</li>\
             <li>Prepare the decision on continued employment</li>\
             </ul>",
        );
        document("Probation period ending", &body)
    }
}

impl Template for Reminder<'_> {
    fn subject(&self) -> String {
        match self.0.days_remaining {
            Some(days) => format!("Reminder: your probation period ends in {days} days"),
            None => "Reminder: your probation period is ending".to_string(),
        }
    }

    fn html(&self) -> String {
        let n = self.0;
        let greeting = match present(&n.employee.employee_name) {
            Some(_) => format!("Dear {},", or_na(n.employee.employee_name.as_deref())),
            None => "Hello,".to_string(),
        };
        let body = format!(
            "<p>{greeting}</p>\n\
             <p>Your probation period as {position} in {department} ends on {date}, \
             in {days} days.</p>\n\
             <p>Your manager will contact you to arrange the review meeting. \
             If you have questions in the meantime, please reach out to HR.</p>",
            position = or_na(n.employee.position.as_deref()),
            department = or_na(n.employee.department.as_deref()),
            date = date_or_na(n.probation_end_date),
            days = number_or_na(n.days_remaining),
        );
        document("Your probation period", &body)
    }
}
