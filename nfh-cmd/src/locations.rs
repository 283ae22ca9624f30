//! Gazetteer lookups.

use nfh_geo::{gazetteer::PlaceKind, Gazetteer};

/// Lines printed by `search`: one name per match.
pub fn search_lines(gazetteer: &Gazetteer, query: &str) -> Vec<String> {
    let matches = gazetteer.search(query);
    if matches.is_empty() {
        return vec!["No matching locations found".to_string()];
    }
    matches
        .into_iter()
        .filter_map(|name| {
            gazetteer
                .coords(name)
                .map(|c| format!("{name} ({:.4}°N, {:.4}°E)", c.lat, c.lon))
        })
        .collect()
}

/// Lines printed by `locations`: every entry with kind and coordinates.
pub fn location_lines(gazetteer: &Gazetteer) -> Vec<String> {
    gazetteer
        .places()
        .map(|place| {
            let kind = match place.kind {
                PlaceKind::District => "district",
                PlaceKind::CommunityForest => "forest",
            };
            format!(
                "{:<48} {:>8} {:>9.4} {:>9.4}",
                place.name, kind, place.coordinate.lat, place.coordinate.lon
            )
        })
        .collect()
}

pub fn run_search(query: &str) -> anyhow::Result<()> {
    let gazetteer = Gazetteer::nepal()?;
    for line in search_lines(&gazetteer, query) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_locations() -> anyhow::Result<()> {
    let gazetteer = Gazetteer::nepal()?;
    for line in location_lines(&gazetteer) {
        println!("{line}");
    }
    println!("{} locations", gazetteer.len());
    Ok(())
}
