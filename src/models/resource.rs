use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bookable facility (gym, clubhouse, party hall...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}
