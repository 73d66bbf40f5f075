//! Human-readable rendering of API records.

use anyhow::Result;
use gcapi_core::models::{GeocacheLogModel, GeocacheModel, ListModel, UserModel};
use serde::Serialize;

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn geocache_line(cache: &GeocacheModel) -> String {
    let kind = cache
        .geocache_type
        .as_ref()
        .and_then(|t| t.name.as_deref());
    format!(
        "{:<10} {:<40} D{:<3} T{:<3} {}",
        or_dash(cache.reference_code.as_deref()),
        or_dash(cache.name.as_deref()),
        cache.difficulty.map(|d| d.to_string()).unwrap_or_default(),
        cache.terrain.map(|t| t.to_string()).unwrap_or_default(),
        or_dash(kind),
    )
}

pub fn geocache_details(cache: &GeocacheModel) -> String {
    let mut out = geocache_line(cache);
    if let Some(coords) = &cache.posted_coordinates {
        out.push_str(&format!(
            "\n  Coordinates: {:.6}, {:.6}",
            coords.latitude, coords.longitude
        ));
    }
    if let Some(owner) = &cache.owner_alias {
        out.push_str(&format!("\n  Owner: {}", owner));
    }
    if let Some(placed) = &cache.placed_date {
        out.push_str(&format!("\n  Placed: {}", placed.0.format("%Y-%m-%d")));
    }
    if let Some(points) = cache.favorite_points {
        out.push_str(&format!("\n  Favorite points: {}", points));
    }
    if let Some(hints) = cache.hints.as_deref().filter(|h| !h.is_empty()) {
        out.push_str(&format!("\n  Hint: {}", hints));
    }
    for log in cache.geocache_logs.iter().flatten() {
        out.push_str(&format!("\n  {}", log_line(log)));
    }
    out
}

pub fn log_line(log: &GeocacheLogModel) -> String {
    let kind = log
        .geocache_log_type
        .as_ref()
        .and_then(|t| t.name.clone())
        .or_else(|| {
            log.geocache_log_type
                .as_ref()
                .and_then(|t| t.id)
                .map(|id| format!("type {}", id.code()))
        });
    let text = log.text.as_deref().unwrap_or("");
    let first_line = text.lines().next().unwrap_or("");
    format!(
        "{} {:<16} {:<20} {}",
        log.logged_date
            .map(|d| d.0.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string()),
        or_dash(log.owner.as_ref().and_then(|o| o.username.as_deref())),
        kind.unwrap_or_else(|| "-".to_string()),
        first_line,
    )
}

pub fn user_details(user: &UserModel) -> String {
    let mut out = format!(
        "{} ({})",
        or_dash(user.username.as_deref()),
        or_dash(user.reference_code.as_deref())
    );
    if let Some(level) = user.membership_level_id {
        out.push_str(&format!("\n  Membership: {:?}", level));
    }
    out.push_str(&format!(
        "\n  Finds: {}  Hides: {}",
        user.find_count.unwrap_or(0),
        user.hide_count.unwrap_or(0)
    ));
    if let Some(limits) = &user.geocache_limits {
        out.push_str(&format!(
            "\n  Full calls remaining: {}",
            limits
                .full_calls_remaining
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
    }
    out
}

pub fn list_line(list: &ListModel) -> String {
    format!(
        "{:<10} {:<12} {:>5}  {}",
        or_dash(list.reference_code.as_deref()),
        list.type_id.map(|t| format!("{:?}", t)).unwrap_or_default(),
        list.count.unwrap_or(0),
        or_dash(list.title.as_deref()),
    )
}
