//! Fills a company template with one candidate's data

use crate::config::{CompanyProfile, ScheduleConfig};
use crate::docx::{Document, DocxPackage};
use crate::error::{OfferError, Result};
use crate::services::placeholder::{find_placeholders, substitute_document, PlaceholderMap};
use offer_types::CandidateData;
use std::path::Path;

pub const CANDIDATE_NAME: &str = "{{Candidate Name}}";
pub const INTERVIEW_DATE: &str = "{{Interview Date}}";
pub const JOB_TITLE: &str = "{{Job Title}}";
pub const JOINING_DATE: &str = "{{Joining Date}}";
pub const OFFER_VALIDITY_DAYS: &str = "{{Offer Validity Days}}";
pub const PROBATION_MONTHLY_SALARY: &str = "{{Probation Monthly Salary}}";
pub const PROBATION_PERIOD_MONTHS: &str = "{{Probation Period Months}}";
pub const ACCEPTANCE_DATE: &str = "{{Acceptance Date}}";

/// Token map for a candidate under a profile. Profile extras are applied last.
pub fn build_placeholders(candidate: &CandidateData, profile: &CompanyProfile) -> PlaceholderMap {
    let mut map = PlaceholderMap::new();
    map.insert(CANDIDATE_NAME, candidate.name.as_str());
    map.insert(INTERVIEW_DATE, candidate.test_date.clone().unwrap_or_default());
    map.insert(JOB_TITLE, candidate.position.as_str());
    map.insert(JOINING_DATE, candidate.start_date.as_str());
    map.insert(OFFER_VALIDITY_DAYS, profile.offer_validity_days.to_string());
    map.insert(PROBATION_MONTHLY_SALARY, candidate.salary.as_str());
    map.insert(PROBATION_PERIOD_MONTHS, profile.probation_months.to_string());
    // left blank for the candidate to fill in
    map.insert(ACCEPTANCE_DATE, "");

    for (token, value) in &profile.extra_placeholders {
        map.insert(token.as_str(), value.as_str());
    }
    map
}

/// Parse a salary string such as `"13,000-15,000/-"`.
/// Ranges resolve to the lower bound or the midpoint; garbage yields 0.
pub fn parse_salary(raw: &str, use_lower_bound: bool) -> f64 {
    let cleaned = raw.replace("/-", "").replace(',', "");
    let cleaned = cleaned.trim();

    let parse = |s: &str| s.trim().parse::<f64>().ok();

    // Anything past the second bound is ignored
    let mut bounds = cleaned.split('-');
    let low = bounds.next().unwrap_or_default();
    let value = match bounds.next() {
        Some(_) if use_lower_bound => parse(low),
        Some(high) => parse(low).zip(parse(high)).map(|(l, h)| (l + h) / 2.0),
        None => parse(cleaned),
    };

    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Round to whole units (halves to even) and group thousands with commas
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round_ties_even() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Fill the compensation schedule table. Returns the number of rows written.
pub fn fill_schedule(document: &mut Document, schedule: &ScheduleConfig, salary: &str) -> usize {
    if !schedule.all_same_value {
        log::warn!("Schedule table fill skipped: only uniform amounts are supported");
        return 0;
    }

    let Some(table) = document.table_mut(schedule.table_index) else {
        log::debug!("No schedule table at index {}", schedule.table_index);
        return 0;
    };

    let amount = format_amount(parse_salary(salary, schedule.use_lower_bound));
    let mut filled = 0;

    for row in table.rows_mut().into_iter().skip(1) {
        let mut cells = row.cells_mut();
        if cells.len() < 2 {
            continue;
        }
        let label = cells[0].text();
        if schedule.fill_rows.iter().any(|r| r == label.trim()) {
            cells[1].set_text(&amount);
            filled += 1;
        }
    }

    log::debug!("Filled {} schedule rows with {}", filled, amount);
    filled
}

/// Check the candidate record carries what every template needs
pub fn validate_candidate(candidate: &CandidateData) -> Result<()> {
    if candidate.name.trim().is_empty() {
        return Err(OfferError::CandidateData("name is required".to_string()));
    }
    Ok(())
}

/// Fill a loaded template in place
pub fn fill_document(document: &mut Document, candidate: &CandidateData, profile: &CompanyProfile) {
    let placeholders = build_placeholders(candidate, profile);
    let found = substitute_document(document, &placeholders);
    log::debug!("Substituted {} placeholder occurrences", found);

    if let Some(schedule) = &profile.schedule {
        fill_schedule(document, schedule, &candidate.salary);
    }

    let leftover = find_placeholders(&document.full_text());
    if !leftover.is_empty() {
        log::warn!("Unfilled placeholders remain: {}", leftover.join(", "));
    }
}

/// Open `template`, fill it and return the edited package
pub fn fill_offer_letter(
    template: &Path,
    candidate: &CandidateData,
    profile: &CompanyProfile,
) -> Result<DocxPackage> {
    validate_candidate(candidate)?;

    if !template.is_file() {
        return Err(OfferError::TemplateNotFound(template.display().to_string()));
    }

    let mut package = DocxPackage::open(template)?;
    let mut document = package.document()?;
    fill_document(&mut document, candidate, profile);
    package.set_document(&document);
    Ok(package)
}
