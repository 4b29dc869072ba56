//! Guest list CSV export

use std::io;

use chrono::{Local, NaiveDate, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{Error, Result};
use crate::models::{Guest, YesNo};

pub const CSV_HEADERS: [&str; 11] = [
    "Name",
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "Do Not Call",
    "Agency Agreement",
    "Broker Name",
    "Company Name",
    "Notes",
    "Registration Date",
];

/// `openhouse-guests-YYYY-MM-DD.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("openhouse-guests-{}.csv", date.format("%Y-%m-%d"))
}

/// Export with registration dates in the machine's local time
pub fn guests_to_csv(guests: &[Guest]) -> Result<String> {
    guests_to_csv_in(guests, &Local)
}

/// Every field is double-quoted; missing yes/no answers read "N/A"
pub fn guests_to_csv_in<Tz: TimeZone>(guests: &[Guest], tz: &Tz) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(io::Error::from)?;

    for guest in guests {
        let registered = guest
            .timestamp
            .with_timezone(tz)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string();

        writer
            .write_record([
                guest.name.as_str(),
                guest.first_name.as_str(),
                guest.last_name.as_str(),
                guest.email.as_str(),
                guest.phone.as_str(),
                answer(guest.do_not_call),
                answer(guest.has_agency_agreement),
                guest.broker_name.as_str(),
                guest.company_name.as_str(),
                guest.notes.as_str(),
                registered.as_str(),
            ])
            .map_err(io::Error::from)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn answer(value: Option<YesNo>) -> &'static str {
    value.map(|v| v.as_str()).unwrap_or("N/A")
}
