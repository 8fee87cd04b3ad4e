use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Reservation, ReservationStatus, Resource, SlotTemplate};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Resources ──

pub fn create_resource(conn: &Connection, id: &str, name: &str) -> anyhow::Result<Resource> {
    conn.execute(
        "INSERT INTO resources (id, name, active) VALUES (?1, ?2, 1)",
        params![id, name],
    )?;
    get_resource(conn, id)?.ok_or_else(|| anyhow::anyhow!("resource vanished after insert: {id}"))
}

pub fn get_resource(conn: &Connection, id: &str) -> anyhow::Result<Option<Resource>> {
    let result = conn.query_row(
        "SELECT id, name, active, created_at FROM resources WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, name, active, created_at)) => Ok(Some(Resource {
            id,
            name,
            active: active != 0,
            created_at: parse_datetime(&created_at),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_resources(conn: &Connection) -> anyhow::Result<Vec<Resource>> {
    let mut stmt =
        conn.prepare("SELECT id, name, active, created_at FROM resources ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i32>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut resources = vec![];
    for row in rows {
        let (id, name, active, created_at) = row?;
        resources.push(Resource {
            id,
            name,
            active: active != 0,
            created_at: parse_datetime(&created_at),
        });
    }
    Ok(resources)
}

pub fn set_resource_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE resources SET active = ?1 WHERE id = ?2",
        params![active as i32, id],
    )?;
    Ok(count > 0)
}

// ── Slot templates ──

pub fn insert_slot(conn: &Connection, slot: &SlotTemplate) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO slot_templates (id, resource_id, start_time, end_time, days)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            slot.id,
            slot.resource_id,
            slot.start,
            slot.end,
            slot.days_csv(),
        ],
    )?;
    Ok(())
}

pub fn get_slots_for_resource(
    conn: &Connection,
    resource_id: &str,
) -> anyhow::Result<Vec<SlotTemplate>> {
    let mut stmt = conn.prepare(
        "SELECT id, resource_id, start_time, end_time, days
         FROM slot_templates WHERE resource_id = ?1 ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![resource_id], |row| {
        Ok(SlotTemplate {
            id: row.get(0)?,
            resource_id: row.get(1)?,
            start: row.get(2)?,
            end: row.get(3)?,
            days: SlotTemplate::days_from_csv(row.get(4)?),
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

pub fn get_slot(
    conn: &Connection,
    resource_id: &str,
    slot_id: &str,
) -> anyhow::Result<Option<SlotTemplate>> {
    let result = conn.query_row(
        "SELECT id, resource_id, start_time, end_time, days
         FROM slot_templates WHERE resource_id = ?1 AND id = ?2",
        params![resource_id, slot_id],
        |row| {
            Ok(SlotTemplate {
                id: row.get(0)?,
                resource_id: row.get(1)?,
                start: row.get(2)?,
                end: row.get(3)?,
                days: SlotTemplate::days_from_csv(row.get(4)?),
            })
        },
    );

    match result {
        Ok(slot) => Ok(Some(slot)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Reservations ──

pub fn insert_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations (id, resource_id, date, slot_id, requester_id, status, hold_expires_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reservation.id,
            reservation.resource_id,
            reservation.date.format(DATE_FMT).to_string(),
            reservation.slot_id,
            reservation.requester_id,
            reservation.status.as_str(),
            reservation
                .hold_expires_at
                .map(|t| t.format(DATETIME_FMT).to_string()),
            reservation.created_at.format(DATETIME_FMT).to_string(),
            reservation.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_reservation(conn: &Connection, id: &str) -> anyhow::Result<Option<Reservation>> {
    let result = conn.query_row(
        "SELECT id, resource_id, date, slot_id, requester_id, status, hold_expires_at, created_at, updated_at
         FROM reservations WHERE id = ?1",
        params![id],
        |row| Ok(parse_reservation_row(row)),
    );

    match result {
        Ok(reservation) => Ok(Some(reservation?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Id of the reservation currently blocking the triple, if any:
/// confirmed, or held with an unexpired hold.
pub fn find_live_conflict(
    conn: &Connection,
    resource_id: &str,
    date: NaiveDate,
    slot_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT id FROM reservations
         WHERE resource_id = ?1 AND date = ?2 AND slot_id = ?3
           AND (status = 'confirmed' OR (status = 'held' AND hold_expires_at > ?4))
         LIMIT 1",
        params![
            resource_id,
            date.format(DATE_FMT).to_string(),
            slot_id,
            now.format(DATETIME_FMT).to_string(),
        ],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn list_by_resource_and_date(
    conn: &Connection,
    resource_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.resource_id, r.date, r.slot_id, r.requester_id, r.status, r.hold_expires_at, r.created_at, r.updated_at
         FROM reservations r
         LEFT JOIN slot_templates s ON s.resource_id = r.resource_id AND s.id = r.slot_id
         WHERE r.resource_id = ?1 AND r.date = ?2
         ORDER BY s.start_time ASC, r.slot_id ASC",
    )?;

    let rows = stmt.query_map(
        params![resource_id, date.format(DATE_FMT).to_string()],
        |row| Ok(parse_reservation_row(row)),
    )?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn list_by_requester(conn: &Connection, requester_id: &str) -> anyhow::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT id, resource_id, date, slot_id, requester_id, status, hold_expires_at, created_at, updated_at
         FROM reservations WHERE requester_id = ?1 AND status != 'cancelled'
         ORDER BY date ASC, slot_id ASC",
    )?;

    let rows = stmt.query_map(params![requester_id], |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn list_all_reservations(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Reservation>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, resource_id, date, slot_id, requester_id, status, hold_expires_at, created_at, updated_at \
             FROM reservations WHERE status = ?1 ORDER BY date DESC, slot_id ASC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, resource_id, date, slot_id, requester_id, status, hold_expires_at, created_at, updated_at \
             FROM reservations ORDER BY date DESC, slot_id ASC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

/// Cancels every confirmed or live held reservation for a resource.
pub fn cancel_all_for_resource(
    conn: &Connection,
    resource_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let now_str = now.format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE reservations SET status = 'cancelled', updated_at = ?1
         WHERE resource_id = ?2
           AND (status = 'confirmed' OR (status = 'held' AND hold_expires_at > ?1))",
        params![now_str, resource_id],
    )?;
    Ok(count)
}

pub fn expire_stale_holds(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<usize> {
    let now_str = now.format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE reservations SET status = 'cancelled', updated_at = ?1
         WHERE status = 'held' AND hold_expires_at <= ?1",
        params![now_str],
    )?;
    Ok(count)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub resource_count: i64,
    pub upcoming_confirmed_count: i64,
    pub live_hold_count: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let now = Utc::now().naive_utc();
    let today = now.date().format(DATE_FMT).to_string();
    let now_str = now.format(DATETIME_FMT).to_string();

    let resource_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM resources WHERE active = 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    let upcoming_confirmed_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'confirmed' AND date >= ?1",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let live_hold_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'held' AND hold_expires_at > ?1",
            params![now_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        resource_count,
        upcoming_confirmed_count,
        live_hold_count,
    })
}

// ── Row parsing ──

fn parse_reservation_row(row: &rusqlite::Row) -> anyhow::Result<Reservation> {
    let id: String = row.get(0)?;
    let resource_id: String = row.get(1)?;
    let date_str: String = row.get(2)?;
    let slot_id: String = row.get(3)?;
    let requester_id: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let hold_expires_at_str: Option<String> = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Reservation {
        id,
        resource_id,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .unwrap_or_else(|_| Utc::now().date_naive()),
        slot_id,
        requester_id,
        status: ReservationStatus::parse(&status_str),
        hold_expires_at: hold_expires_at_str.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}
