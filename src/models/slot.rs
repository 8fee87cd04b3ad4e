use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A recurring daily time window a resource can be booked in.
///
/// `days` restricts the slot to specific weekdays (`mon`..`sun`);
/// `None` means every day. The slot id is derived from the window
/// (`"06:00-08:00"`), which is what the UI shows anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotTemplate {
    pub id: String,
    pub resource_id: String,
    pub start: String,
    pub end: String,
    pub days: Option<Vec<String>>,
}

impl SlotTemplate {
    pub fn new(
        resource_id: &str,
        start: &str,
        end: &str,
        days: Option<Vec<String>>,
    ) -> anyhow::Result<Self> {
        parse_time(start)?;
        parse_time(end)?;
        if start >= end {
            return Err(anyhow::anyhow!("slot start must be before end: {start}-{end}"));
        }
        if let Some(ref days) = days {
            if days.is_empty() {
                return Err(anyhow::anyhow!("weekday list must not be empty"));
            }
            for day in days {
                parse_weekday(day)?;
            }
        }
        Ok(Self {
            id: format!("{start}-{end}"),
            resource_id: resource_id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            days: days.map(|d| d.iter().map(|s| s.to_lowercase()).collect()),
        })
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match &self.days {
            None => true,
            Some(days) => {
                let weekday = date.weekday().to_string().to_lowercase();
                days.iter().any(|d| *d == weekday)
            }
        }
    }

    /// Window overlap, ignoring weekday applicability. Two slots sharing
    /// only a boundary ("06:00-08:00" and "08:00-10:00") do not overlap.
    pub fn overlaps(&self, other: &SlotTemplate) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn days_csv(&self) -> Option<String> {
        self.days.as_ref().map(|d| d.join(","))
    }

    pub fn days_from_csv(csv: Option<String>) -> Option<Vec<String>> {
        csv.map(|s| s.split(',').map(|d| d.to_string()).collect())
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    match s.to_lowercase().as_str() {
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" => Ok(()),
        _ => Err(anyhow::anyhow!("invalid weekday: {s}")),
    }
}

fn parse_time(s: &str) -> anyhow::Result<()> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 || parts[0].len() != 2 || parts[1].len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(())
}
