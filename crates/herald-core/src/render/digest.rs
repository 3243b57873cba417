//! Monthly arrivals/departures digest for HR.

use chrono::Month;

use super::Template;
use super::html::escape;
use super::layout::{date_or_na, document, or_na};
use crate::domain::{EmployeeSummary, MonthlyDigest};

pub(crate) const NO_RECORDS: &str = "No records";

impl MonthlyDigest {
    fn period(&self) -> Option<String> {
        let month = self
            .month
            .and_then(|m| u8::try_from(m).ok())
            .and_then(|m| Month::try_from(m).ok());
        match (month, self.year) {
            (Some(m), Some(y)) => Some(format!("{} {y}", m.name())),
            (Some(m), None) => Some(m.name().to_string()),
            (None, Some(y)) => Some(y.to_string()),
            (None, None) => None,
        }
    }
}

impl Template for MonthlyDigest {
    fn subject(&self) -> String {
        match self.period() {
            Some(period) => format!("Monthly HR digest: {period}"),
            None => "Monthly HR digest".to_string(),
        }
    }

    fn html(&self) -> String {
        let mut body = String::new();
        if let Some(period) = self.period() {
            body.push_str(&format!("<p>Staff changes for {}.</p>\n", escape(&period)));
        }
        body.push_str("<h2>Arrivals</h2>\n");
        body.push_str(&employee_table(&self.arrivals));
        body.push_str("\n<h2>Departures</h2>\n");
        body.push_str(&employee_table(&self.departures));
        if self.include_previously_sent {
            body.push_str(
                "\n<p><em>This digest also includes entries reported in earlier digests.</em></p>",
            );
        }
        document("Monthly HR digest", &body)
    }
}

fn employee_table(rows: &[EmployeeSummary]) -> String {
    if rows.is_empty() {
        return format!("<p>{NO_RECORDS}</p>");
    }
    let mut out = String::from(
        "<table>\n<tr><th>Name</th><th>Position</th><th>Department</th><th>Date</th></tr>\n",
    );
    for row in rows {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            or_na(row.name.as_deref()),
            or_na(row.position.as_deref()),
            or_na(row.department.as_deref()),
            date_or_na(row.date),
        ));
    }
    out.push_str("</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leaver(name: &str, day: u32) -> EmployeeSummary {
        EmployeeSummary {
            name: Some(name.into()),
            position: Some("Engineer".into()),
            department: Some("R&D".into()),
            date: NaiveDate::from_ymd_opt(2025, 3, day),
        }
    }

    #[test]
    fn empty_arrivals_and_two_departures() {
        let digest = MonthlyDigest {
            month: Some(3),
            year: Some(2025),
            departures: vec![leaver("Ivo", 14), leaver("Mia", 31)],
            ..Default::default()
        };
        let email = digest.render();

        assert_eq!(email.subject, "Monthly HR digest: March 2025");
        assert_eq!(email.html.matches(NO_RECORDS).count(), 1);
        assert_eq!(email.html.matches("<tr><td>").count(), 2);
        assert!(email.html.contains("R&amp;D"));

        let arrivals = email.text.find("Arrivals").unwrap();
        let departures = email.text.find("Departures").unwrap();
        let marker = email.text.find(NO_RECORDS).unwrap();
        assert!(arrivals < marker && marker < departures);
        assert!(email.text.contains("Ivo | Engineer | R&D | 14.03.2025"));
        assert!(email.text.contains("Mia | Engineer | R&D | 31.03.2025"));
    }

    #[test]
    fn disclaimer_when_repeating_entries() {
        let digest = MonthlyDigest {
            include_previously_sent: true,
            ..Default::default()
        };
        assert!(digest.render().text.contains("reported in earlier digests"));
    }

    #[test]
    fn invalid_month_is_ignored() {
        let digest = MonthlyDigest {
            month: Some(13),
            year: Some(2025),
            ..Default::default()
        };
        assert_eq!(digest.subject(), "Monthly HR digest: 2025");
    }
}
