//! CSV ingestion of activity pools.
//!
//! The host exchanges a header-driven CSV with one row per activity
//! variant, carrying exactly the fields of [`Activity`]. Booleans are
//! written as 0/1 the way the original host process emits them.

use crate::activity::{ActId, Activity, ChargeMode, Group, Time};
use crate::{validate_pool, Result};
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ActivityRow {
    id: ActId,
    x: f64,
    y: f64,
    group: Group,
    earliest_start: Time,
    latest_start: Time,
    min_duration: Time,
    max_duration: Time,
    des_start_time: Time,
    des_duration: Time,
    charge_mode: ChargeMode,
    is_charging: u8,
    is_service_station: u8,
}

impl From<ActivityRow> for Activity {
    fn from(r: ActivityRow) -> Activity {
        Activity {
            id: r.id,
            x: r.x,
            y: r.y,
            group: r.group,
            earliest_start: r.earliest_start,
            latest_start: r.latest_start,
            min_duration: r.min_duration,
            max_duration: r.max_duration,
            des_start_time: r.des_start_time,
            des_duration: r.des_duration,
            charge_mode: r.charge_mode,
            is_charging: r.is_charging != 0,
            is_service_station: r.is_service_station != 0,
        }
    }
}

pub fn read_activities_from(reader: impl Read) -> Result<Vec<Activity>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut pool = Vec::new();
    for (line, row) in rdr.deserialize().enumerate() {
        let row: ActivityRow = row.with_context(|| format!("activity record {}", line + 1))?;
        pool.push(Activity::from(row));
    }
    validate_pool(&pool)?;
    Ok(pool)
}

pub fn read_activities(path: impl AsRef<Path>) -> Result<Vec<Activity>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open activity pool {:?}", path))?;
    read_activities_from(std::io::BufReader::new(file))
        .with_context(|| format!("failed to parse activity pool {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "\
id,x,y,group,earliest_start,latest_start,min_duration,max_duration,des_start_time,des_duration,charge_mode,is_charging,is_service_station
0,454070,382249,0,0,0,1,286,0,0,none,0,0
1,474270,381532,6,60,276,10,144,98,80,slow,1,0
2,454070,382249,0,0,287,1,288,0,0,none,0,0
";

    #[test]
    fn parses_a_pool() {
        let pool = read_activities_from(POOL.as_bytes()).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[1].charge_mode, ChargeMode::Slow);
        assert!(pool[1].is_charging);
        assert_eq!(pool[2].latest_start, 287);
    }

    #[test]
    fn rejects_invalid_pools() {
        let bad = POOL.replace("1,474270,381532,6,60,276", "1,474270,381532,6,280,276");
        assert!(read_activities_from(bad.as_bytes()).is_err());
    }
}
